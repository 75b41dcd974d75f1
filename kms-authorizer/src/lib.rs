//! Delegates ledger transaction signing to a cloud KMS key.
//!
//! Public keys and signatures come back from the KMS DER-encoded; this crate
//! verifies their transport checksums and turns them into the raw and RLP
//! encodings the ledger expects.

pub mod application_service;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(test)]
mod test_utils;

pub use application_service::{Authorization, KmsAuthorizer, KmsSigner, SigningResult};
pub use domain::{HashAlgorithm, KeyDescriptor, RawPublicKey, SignatureComponents};
pub use error::{AuthorizerError, Result};
pub use infrastructure::{AuthorizerConfig, InMemoryKeyManagement};
pub use port::KeyManagementClient;
