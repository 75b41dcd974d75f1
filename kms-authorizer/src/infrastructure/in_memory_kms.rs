use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::rand_core::OsRng;
use p256::pkcs8::{EncodePublicKey, LineEnding};
use p256::PublicKey;

use crate::domain::integrity::checksum;
use crate::port::key_management::{
    AsymmetricSignRequest, AsymmetricSignResponse, GetPublicKeyRequest, KeyManagementClient,
    PublicKeyResponse,
};

/// In-process key management backed by a local P-256 key.
///
/// - Answers with the same shapes a cloud KMS does: PKCS#8 PEM, DER
///   signatures, CRC32C checksums and the echoed resource name.
/// - Nothing is persisted; the key lives as long as the value.
/// - Intended for local development and tests.
#[derive(Clone)]
pub struct InMemoryKeyManagement {
    resource_id: String,
    signing_key: SigningKey,
}

impl InMemoryKeyManagement {
    pub fn generate(resource_id: impl Into<String>) -> Self {
        Self::from_signing_key(resource_id, SigningKey::random(&mut OsRng))
    }

    pub fn from_signing_key(resource_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            resource_id: resource_id.into(),
            signing_key,
        }
    }

    /// Builds the key from a 32-byte hex-encoded secret scalar.
    pub fn from_secret_hex(resource_id: impl Into<String>, secret_hex: &str) -> Result<Self> {
        let secret = hex::decode(secret_hex.trim()).context("secret key is not valid hex")?;
        let signing_key =
            SigningKey::from_slice(&secret).map_err(|e| anyhow!("invalid P-256 secret key: {e}"))?;
        Ok(Self::from_signing_key(resource_id, signing_key))
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    fn check_resource(&self, name: &str) -> Result<()> {
        if name != self.resource_id {
            return Err(anyhow!("NOT_FOUND: no key version named {name}"));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyManagementClient for InMemoryKeyManagement {
    async fn fetch_public_key(&self, request: GetPublicKeyRequest) -> Result<PublicKeyResponse> {
        self.check_resource(&request.name)?;

        let pem = PublicKey::from(self.signing_key.verifying_key())
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| anyhow!("failed to encode public key: {e}"))?;
        let pem_crc32c = checksum(pem.as_bytes());

        tracing::debug!(resource = %request.name, "served public key");
        Ok(PublicKeyResponse {
            name: request.name,
            pem: Some(pem),
            pem_crc32c: Some(pem_crc32c),
        })
    }

    async fn sign_digest(&self, request: AsymmetricSignRequest) -> Result<AsymmetricSignResponse> {
        self.check_resource(&request.name)?;

        // A cloud KMS refuses to sign a digest whose checksum does not match
        // and reports verified_digest_crc32c = false instead.
        if checksum(&request.digest) != request.digest_crc32c {
            tracing::warn!(resource = %request.name, "digest checksum mismatch");
            return Ok(AsymmetricSignResponse {
                name: request.name,
                signature: Vec::new(),
                signature_crc32c: None,
                verified_digest_crc32c: false,
            });
        }

        let signature: Signature = self
            .signing_key
            .sign_prehash(&request.digest)
            .map_err(|e| anyhow!("signing failed: {e}"))?;
        let signature = signature.to_der().as_bytes().to_vec();
        let signature_crc32c = checksum(&signature);

        tracing::debug!(resource = %request.name, len = signature.len(), "signed digest");
        Ok(AsymmetricSignResponse {
            name: request.name,
            signature,
            signature_crc32c: Some(signature_crc32c),
            verified_digest_crc32c: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use sha2::{Digest, Sha256};

    const RESOURCE_ID: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1";

    #[tokio::test]
    async fn fetch_public_key_has_valid_checksum() {
        let kms = InMemoryKeyManagement::generate(RESOURCE_ID);
        let response = kms
            .fetch_public_key(GetPublicKeyRequest {
                name: RESOURCE_ID.to_string(),
            })
            .await
            .unwrap();

        let pem = response.pem.expect("pem should be present");
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(response.pem_crc32c, Some(checksum(pem.as_bytes())));
        assert_eq!(response.name, RESOURCE_ID);
    }

    #[tokio::test]
    async fn sign_digest_returns_verifiable_der() {
        let kms = InMemoryKeyManagement::generate(RESOURCE_ID);
        let digest: [u8; 32] = Sha256::digest(b"message").into();

        let response = kms
            .sign_digest(AsymmetricSignRequest {
                name: RESOURCE_ID.to_string(),
                digest,
                digest_crc32c: checksum(&digest),
            })
            .await
            .unwrap();

        assert!(response.verified_digest_crc32c);
        assert_eq!(
            response.signature_crc32c,
            Some(checksum(&response.signature))
        );
        let signature = Signature::from_der(&response.signature).unwrap();
        kms.signing_key()
            .verifying_key()
            .verify_prehash(&digest, &signature)
            .expect("signature should verify");
    }

    #[tokio::test]
    async fn sign_digest_flags_bad_digest_checksum() {
        let kms = InMemoryKeyManagement::generate(RESOURCE_ID);
        let digest = [7u8; 32];

        let response = kms
            .sign_digest(AsymmetricSignRequest {
                name: RESOURCE_ID.to_string(),
                digest,
                digest_crc32c: checksum(&digest) ^ 1,
            })
            .await
            .unwrap();

        assert!(!response.verified_digest_crc32c);
        assert!(response.signature.is_empty());
    }

    #[tokio::test]
    async fn unknown_resource_is_rejected() {
        let kms = InMemoryKeyManagement::generate(RESOURCE_ID);
        let result = kms
            .fetch_public_key(GetPublicKeyRequest {
                name: "projects/other".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn from_secret_hex_validates_input() {
        let secret = "e912bb5b687eba739da2a36dc8d121746c5809ae0fcab7e42f2562045fdad181";
        let kms = InMemoryKeyManagement::from_secret_hex(RESOURCE_ID, secret).unwrap();
        assert_eq!(hex::encode(kms.signing_key().to_bytes()), secret);

        assert!(InMemoryKeyManagement::from_secret_hex(RESOURCE_ID, "zz").is_err());
        assert!(InMemoryKeyManagement::from_secret_hex(RESOURCE_ID, &"00".repeat(32)).is_err());
    }
}
