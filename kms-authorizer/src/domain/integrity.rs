//! End-to-end integrity checks for key-management round trips.
//!
//! The service echoes the resource name it acted on and attaches a CRC32C
//! checksum to every payload it returns. For signing it also reports whether
//! the digest checksum we sent matched the digest it received.

use std::fmt;

use thiserror::Error;

/// Remote call an integrity check belongs to, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KmsOperation {
    GetPublicKey,
    AsymmetricSign,
}

impl fmt::Display for KmsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KmsOperation::GetPublicKey => write!(f, "GetPublicKey"),
            KmsOperation::AsymmetricSign => write!(f, "AsymmetricSign"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("{operation}: request corrupted in-transit (expected resource {expected}, service answered for {actual})")]
    ResourceNameMismatch {
        operation: KmsOperation,
        expected: String,
        actual: String,
    },
    #[error("{operation}: request corrupted in-transit (digest checksum not verified by the service)")]
    DigestNotVerified { operation: KmsOperation },
    #[error("{operation}: response corrupted in-transit (claimed checksum {claimed:?}, computed {computed})")]
    ChecksumMismatch {
        operation: KmsOperation,
        claimed: Option<u32>,
        computed: u32,
    },
}

/// CRC32C (Castagnoli) over `payload`.
pub fn checksum(payload: &[u8]) -> u32 {
    crc32c::crc32c(payload)
}

pub fn verify_resource_name(
    operation: KmsOperation,
    claimed_name: &str,
    expected_name: &str,
) -> Result<(), IntegrityError> {
    if claimed_name != expected_name {
        return Err(IntegrityError::ResourceNameMismatch {
            operation,
            expected: expected_name.to_string(),
            actual: claimed_name.to_string(),
        });
    }
    Ok(())
}

pub fn verify_digest_acknowledged(
    operation: KmsOperation,
    verified: bool,
) -> Result<(), IntegrityError> {
    if !verified {
        return Err(IntegrityError::DigestNotVerified { operation });
    }
    Ok(())
}

/// A missing checksum never verifies.
pub fn verify_checksum(
    operation: KmsOperation,
    payload: &[u8],
    claimed_checksum: Option<u32>,
) -> Result<(), IntegrityError> {
    let computed = checksum(payload);
    if claimed_checksum != Some(computed) {
        return Err(IntegrityError::ChecksumMismatch {
            operation,
            claimed: claimed_checksum,
            computed,
        });
    }
    Ok(())
}

/// Checks the echoed resource name, then the payload checksum.
pub fn verify(
    operation: KmsOperation,
    claimed_name: &str,
    expected_name: &str,
    payload: &[u8],
    claimed_checksum: Option<u32>,
) -> Result<(), IntegrityError> {
    verify_resource_name(operation, claimed_name, expected_name)?;
    verify_checksum(operation, payload, claimed_checksum)
}
