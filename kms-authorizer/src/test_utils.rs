//! Test utilities and mock implementations for unit testing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::integrity::checksum;
use crate::port::key_management::{
    AsymmetricSignRequest, AsymmetricSignResponse, GetPublicKeyRequest, KeyManagementClient,
    PublicKeyResponse,
};

pub const RESOURCE_ID: &str =
    "projects/your-project-id/locations/global/keyRings/flow/cryptoKeys/flow-minter-key/cryptoKeyVersions/1";

/// `SubjectPublicKeyInfo` header for a P-256 uncompressed point.
const SPKI_P256_PREFIX: &str = "3059301306072a8648ce3d020106082a8648ce3d030107034200";

/// PEM armor around the SPKI of `04 ‖ raw_hex`, wrapped at 64 columns.
pub fn spki_pem(raw_hex: &str) -> String {
    let der = hex::decode(format!("{SPKI_P256_PREFIX}04{raw_hex}")).unwrap();
    pem_rfc7468::encode_string("PUBLIC KEY", pem_rfc7468::LineEnding::LF, &der).unwrap()
}

/// DER `SEQUENCE { INTEGER r, INTEGER s }` with the integer bytes as given.
pub fn der_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for value in [r, s] {
        body.push(0x02);
        body.push(value.len() as u8);
        body.extend_from_slice(value);
    }
    let mut out = vec![0x30, body.len() as u8];
    out.extend_from_slice(&body);
    out
}

/// Type alias for recorded sign requests.
pub type SignRequests = Arc<Mutex<Vec<AsymmetricSignRequest>>>;

/// Mock implementation of KeyManagementClient returning scripted responses.
#[derive(Default)]
pub struct MockKeyManagement {
    pub public_key_response: Option<PublicKeyResponse>,
    pub sign_response: Option<AsymmetricSignResponse>,
    pub failure: Option<String>,
    pub sign_requests: SignRequests,
}

impl MockKeyManagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_public_key_pem(self, pem: &str) -> Self {
        self.with_public_key_response(PublicKeyResponse {
            name: RESOURCE_ID.to_string(),
            pem: Some(pem.to_string()),
            pem_crc32c: Some(checksum(pem.as_bytes())),
        })
    }

    pub fn with_public_key_response(self, response: PublicKeyResponse) -> Self {
        Self {
            public_key_response: Some(response),
            ..self
        }
    }

    pub fn with_sign_response(self, response: AsymmetricSignResponse) -> Self {
        Self {
            sign_response: Some(response),
            ..self
        }
    }

    pub fn failing(self, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..self
        }
    }
}

#[async_trait]
impl KeyManagementClient for MockKeyManagement {
    async fn fetch_public_key(&self, _request: GetPublicKeyRequest) -> Result<PublicKeyResponse> {
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        self.public_key_response
            .clone()
            .ok_or_else(|| anyhow!("no public key response scripted"))
    }

    async fn sign_digest(&self, request: AsymmetricSignRequest) -> Result<AsymmetricSignResponse> {
        self.sign_requests.lock().await.push(request);
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        self.sign_response
            .clone()
            .ok_or_else(|| anyhow!("no sign response scripted"))
    }
}
