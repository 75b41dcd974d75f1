//! Port layer - interfaces to collaborators outside this crate.

pub mod key_management;

pub use key_management::{
    AsymmetricSignRequest, AsymmetricSignResponse, GetPublicKeyRequest, KeyManagementClient,
    PublicKeyResponse,
};
