//! Byte-level translation between key-management responses and ledger formats.

pub mod der;
pub mod integrity;
pub mod key_descriptor;
pub mod pem;
pub mod public_key;
pub mod signature;

pub use key_descriptor::{HashAlgorithm, KeyDescriptor};
pub use public_key::RawPublicKey;
pub use signature::SignatureComponents;
