use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application_service::signer::KmsSigner;
use crate::error::{AuthorizerError, Result};
use crate::infrastructure::config::AuthorizerConfig;
use crate::port::key_management::KeyManagementClient;

const ADDRESS_PREFIX: &str = "0x";

/// What the transaction builder receives back from a signing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningResult {
    /// Account address with `0x` prefix.
    pub address: String,
    pub key_index: u32,
    /// `r ‖ s`, 128 hex characters.
    pub signature_hex: String,
}

/// Authorization functions backed by a KMS key version.
pub struct KmsAuthorizer<C> {
    signer: Arc<KmsSigner<C>>,
}

impl<C> Clone for KmsAuthorizer<C> {
    fn clone(&self) -> Self {
        Self {
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<C: KeyManagementClient> KmsAuthorizer<C> {
    pub fn new(client: C, config: AuthorizerConfig) -> Self {
        Self {
            signer: Arc::new(KmsSigner::new(client, config)),
        }
    }

    pub fn signer(&self) -> &KmsSigner<C> {
        &self.signer
    }

    /// Raw hex public key.
    pub async fn public_key(&self) -> Result<String> {
        self.signer.public_key_hex().await
    }

    /// Hex of the RLP key record used to register the key on an account.
    pub async fn flow_public_key(&self) -> Result<String> {
        self.signer.key_descriptor_hex().await
    }

    /// Binds the signer to an account key.
    pub fn authorize(&self, address: &str, key_index: u32) -> Result<Authorization<C>> {
        let address = sans_prefix(address);
        if address.is_empty() || !address.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AuthorizerError::InvalidEncoding(format!(
                "account address: {address:?}"
            )));
        }

        Ok(Authorization {
            temp_id: format!("{address}-{key_index}"),
            address: address.to_string(),
            key_index,
            signer: Arc::clone(&self.signer),
        })
    }
}

/// A signing capability for one `(address, key_index)` pair.
pub struct Authorization<C> {
    temp_id: String,
    address: String,
    key_index: u32,
    signer: Arc<KmsSigner<C>>,
}

impl<C> Clone for Authorization<C> {
    fn clone(&self) -> Self {
        Self {
            temp_id: self.temp_id.clone(),
            address: self.address.clone(),
            key_index: self.key_index,
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<C: KeyManagementClient> Authorization<C> {
    /// `"<address>-<key_index>"`, address without prefix.
    pub fn temp_id(&self) -> &str {
        &self.temp_id
    }

    /// Address without `0x` prefix.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn key_index(&self) -> u32 {
        self.key_index
    }

    /// Signs `message_hex` for this account key.
    pub async fn sign(&self, message_hex: &str) -> Result<SigningResult> {
        let signature_hex = self.signer.sign(message_hex).await?;
        Ok(SigningResult {
            address: with_prefix(&self.address),
            key_index: self.key_index,
            signature_hex,
        })
    }
}

pub fn sans_prefix(address: &str) -> &str {
    address.strip_prefix(ADDRESS_PREFIX).unwrap_or(address)
}

pub fn with_prefix(address: &str) -> String {
    format!("{ADDRESS_PREFIX}{}", sans_prefix(address))
}
