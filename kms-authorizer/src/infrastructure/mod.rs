pub mod config;
pub mod in_memory_kms;

pub use config::{AuthorizerConfig, ConfigError, KeyDescriptorConfig};
pub use in_memory_kms::InMemoryKeyManagement;
