//! KeyManagementClient trait - abstract interface to a cloud KMS.

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPublicKeyRequest {
    /// Full `CryptoKeyVersion` resource name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyResponse {
    /// Resource name the service acted on.
    pub name: String,
    /// `SubjectPublicKeyInfo` in PEM armor.
    pub pem: Option<String>,
    /// CRC32C of the PEM text.
    pub pem_crc32c: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricSignRequest {
    pub name: String,
    /// SHA-256 digest of the message.
    pub digest: [u8; 32],
    /// CRC32C of `digest`, checked by the service before signing.
    pub digest_crc32c: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricSignResponse {
    pub name: String,
    /// DER `ECDSA-Sig-Value`.
    pub signature: Vec<u8>,
    pub signature_crc32c: Option<u32>,
    /// Whether the service's checksum of the received digest matched `digest_crc32c`.
    pub verified_digest_crc32c: bool,
}

/// Abstract interface for the remote key-management service.
///
/// Implementations own transport, authentication and any retry policy.
/// Responses are returned as received; integrity checking happens in the
/// caller.
#[async_trait]
pub trait KeyManagementClient: Send + Sync {
    /// Fetch the public half of an asymmetric key version.
    async fn fetch_public_key(&self, request: GetPublicKeyRequest) -> Result<PublicKeyResponse>;

    /// Sign a precomputed digest with an asymmetric key version.
    async fn sign_digest(&self, request: AsymmetricSignRequest) -> Result<AsymmetricSignResponse>;
}

#[async_trait]
impl<T: KeyManagementClient + ?Sized> KeyManagementClient for std::sync::Arc<T> {
    async fn fetch_public_key(&self, request: GetPublicKeyRequest) -> Result<PublicKeyResponse> {
        (**self).fetch_public_key(request).await
    }

    async fn sign_digest(&self, request: AsymmetricSignRequest) -> Result<AsymmetricSignResponse> {
        (**self).sign_digest(request).await
    }
}
