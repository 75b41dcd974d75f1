//! Signer - fetches keys from and signs through a remote KMS.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::der;
use crate::domain::integrity::{self, checksum, KmsOperation};
use crate::domain::key_descriptor::KeyDescriptor;
use crate::domain::pem::decode_public_key_pem;
use crate::domain::public_key::{extract_public_key, RawPublicKey};
use crate::domain::signature::{extract_signature, SignatureComponents};
use crate::error::{AuthorizerError, Result};
use crate::infrastructure::config::{AuthorizerConfig, KeyDescriptorConfig};
use crate::port::key_management::{
    AsymmetricSignRequest, GetPublicKeyRequest, KeyManagementClient,
};

/// Progress of a single signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    Hashing,
    Requesting,
    Verifying,
    Decoding,
    Normalizing,
    Done,
}

impl fmt::Display for SigningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SigningStage::Hashing => "hashing",
            SigningStage::Requesting => "requesting",
            SigningStage::Verifying => "verifying",
            SigningStage::Decoding => "decoding",
            SigningStage::Normalizing => "normalizing",
            SigningStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Stages of a public-key fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFetchStage {
    Requesting,
    Verifying,
    Decoding,
    Extracting,
}

impl fmt::Display for KeyFetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyFetchStage::Requesting => "requesting",
            KeyFetchStage::Verifying => "verifying",
            KeyFetchStage::Decoding => "decoding",
            KeyFetchStage::Extracting => "extracting",
        };
        f.write_str(name)
    }
}

/// Translates between a remote KMS key version and ledger encodings.
///
/// Holds the client handle and configuration only; every call is
/// independent and may run concurrently with others.
pub struct KmsSigner<C> {
    client: C,
    resource_id: String,
    key_descriptor: KeyDescriptorConfig,
}

impl<C: KeyManagementClient> KmsSigner<C> {
    pub fn new(client: C, config: AuthorizerConfig) -> Self {
        tracing::info!(resource = %config.resource_id, "initialized KMS signer");
        Self {
            client,
            resource_id: config.resource_id,
            key_descriptor: config.key_descriptor,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Fetches, verifies and decodes the public key.
    pub async fn public_key(&self) -> Result<RawPublicKey> {
        let mut stage = KeyFetchStage::Requesting;
        let result = self.fetch_public_key(&mut stage).await;
        if let Err(e) = &result {
            tracing::warn!(resource = %self.resource_id, %stage, error = %e, "public key fetch failed");
        }
        result
    }

    async fn fetch_public_key(&self, stage: &mut KeyFetchStage) -> Result<RawPublicKey> {
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let response = self
            .client
            .fetch_public_key(GetPublicKeyRequest {
                name: self.resource_id.clone(),
            })
            .await
            .map_err(|e| AuthorizerError::Remote(format!("{e:#}")))?;

        *stage = KeyFetchStage::Verifying;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let pem = response
            .pem
            .as_deref()
            .ok_or(AuthorizerError::MissingKeyMaterial("public key"))?;
        integrity::verify(
            KmsOperation::GetPublicKey,
            &response.name,
            &self.resource_id,
            pem.as_bytes(),
            response.pem_crc32c,
        )?;

        *stage = KeyFetchStage::Decoding;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let der = decode_public_key_pem(pem)?;
        let tree = der::parse(&der)?;

        *stage = KeyFetchStage::Extracting;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        extract_public_key(&tree)
    }

    /// Raw public key as 128 lowercase hex characters.
    pub async fn public_key_hex(&self) -> Result<String> {
        Ok(self.public_key().await?.to_hex())
    }

    /// The public key wrapped in an on-chain key record.
    pub async fn key_descriptor(&self) -> Result<KeyDescriptor> {
        let public_key = self.public_key().await?;
        Ok(KeyDescriptor::new(public_key)
            .with_hash_algorithm(self.key_descriptor.hash_algorithm))
    }

    /// RLP-encoded key record, hex-encoded.
    pub async fn key_descriptor_hex(&self) -> Result<String> {
        Ok(self.key_descriptor().await?.to_hex())
    }

    /// Signs a hex-encoded message; returns `r ‖ s` as 128 hex characters.
    pub async fn sign(&self, message_hex: &str) -> Result<String> {
        let message = hex::decode(message_hex).map_err(|e| {
            tracing::warn!(resource = %self.resource_id, stage = %SigningStage::Hashing, error = %e, "signing failed");
            AuthorizerError::InvalidEncoding(format!("message: {e}"))
        })?;
        Ok(self.sign_message(&message).await?.to_hex())
    }

    /// Signs raw message bytes.
    pub async fn sign_message(&self, message: &[u8]) -> Result<SignatureComponents> {
        let mut stage = SigningStage::Hashing;
        let result = self.run_signing(message, &mut stage).await;
        match &result {
            Ok(_) => tracing::debug!(resource = %self.resource_id, stage = %SigningStage::Done),
            Err(e) => {
                tracing::warn!(resource = %self.resource_id, %stage, error = %e, "signing failed")
            }
        }
        result
    }

    async fn run_signing(
        &self,
        message: &[u8],
        stage: &mut SigningStage,
    ) -> Result<SignatureComponents> {
        tracing::debug!(resource = %self.resource_id, stage = %stage, len = message.len());
        let digest: [u8; 32] = Sha256::digest(message).into();

        *stage = SigningStage::Requesting;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let response = self
            .client
            .sign_digest(AsymmetricSignRequest {
                name: self.resource_id.clone(),
                digest,
                digest_crc32c: checksum(&digest),
            })
            .await
            .map_err(|e| AuthorizerError::Remote(format!("{e:#}")))?;

        *stage = SigningStage::Verifying;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let operation = KmsOperation::AsymmetricSign;
        integrity::verify_resource_name(operation, &response.name, &self.resource_id)?;
        integrity::verify_digest_acknowledged(operation, response.verified_digest_crc32c)?;
        integrity::verify_checksum(operation, &response.signature, response.signature_crc32c)?;
        if response.signature.is_empty() {
            return Err(AuthorizerError::MissingKeyMaterial("signature"));
        }

        *stage = SigningStage::Decoding;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        let tree = der::parse(&response.signature)?;

        *stage = SigningStage::Normalizing;
        tracing::debug!(resource = %self.resource_id, stage = %stage);
        extract_signature(&tree)
    }
}
