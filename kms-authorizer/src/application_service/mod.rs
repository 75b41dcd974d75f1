pub mod authorizer;
pub mod signer;

pub use authorizer::{Authorization, KmsAuthorizer, SigningResult};
pub use signer::{KeyFetchStage, KmsSigner, SigningStage};
