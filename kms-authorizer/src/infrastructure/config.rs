//! Configuration for the authorizer

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::key_descriptor::HashAlgorithm;

pub const ENV_RESOURCE_ID: &str = "KMS_RESOURCE_ID";
pub const ENV_HASH_ALGORITHM: &str = "KMS_KEY_HASH_ALGORITHM";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// Full KMS key version name, e.g.
    /// `projects/P/locations/L/keyRings/R/cryptoKeys/K/cryptoKeyVersions/1`.
    pub resource_id: String,

    /// Metadata written into the on-chain key record
    #[serde(default)]
    pub key_descriptor: KeyDescriptorConfig,
}

/// Key record settings. Algorithm id and weight are fixed by the protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyDescriptorConfig {
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl AuthorizerConfig {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            key_descriptor: KeyDescriptorConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Load configuration from `KMS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthorizerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resource_id = lookup(ENV_RESOURCE_ID).ok_or(ConfigError::Missing(ENV_RESOURCE_ID))?;
        let mut config = Self::new(resource_id);

        if let Some(value) = lookup(ENV_HASH_ALGORITHM) {
            config.key_descriptor.hash_algorithm = value
                .parse()
                .map_err(|e: String| ConfigError::Invalid(format!("{ENV_HASH_ALGORITHM}: {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_id.trim().is_empty() {
            return Err(ConfigError::Missing("resource_id"));
        }
        Ok(())
    }
}
