use std::fmt;

use crate::domain::der::{self, DerNode};
use crate::error::{AuthorizerError, Result};

/// Width of each signature scalar for P-256.
pub const SCALAR_LEN: usize = 32;

/// An ECDSA signature as fixed-width `r` and `s` scalars.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureComponents {
    r: [u8; SCALAR_LEN],
    s: [u8; SCALAR_LEN],
}

impl SignatureComponents {
    pub fn new(r: [u8; SCALAR_LEN], s: [u8; SCALAR_LEN]) -> Self {
        Self { r, s }
    }

    /// Decodes a DER `ECDSA-Sig-Value` as returned by the signing call.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let tree = der::parse(der)?;
        extract_signature(&tree)
    }

    pub fn r(&self) -> &[u8; SCALAR_LEN] {
        &self.r
    }

    pub fn s(&self) -> &[u8; SCALAR_LEN] {
        &self.s
    }

    /// `r ‖ s`.
    pub fn to_bytes(&self) -> [u8; 2 * SCALAR_LEN] {
        let mut out = [0u8; 2 * SCALAR_LEN];
        out[..SCALAR_LEN].copy_from_slice(&self.r);
        out[SCALAR_LEN..].copy_from_slice(&self.s);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for SignatureComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureComponents")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .finish()
    }
}

/// Reads `SEQUENCE { INTEGER r, INTEGER s }` and normalizes both scalars.
pub fn extract_signature(tree: &DerNode<'_>) -> Result<SignatureComponents> {
    let items = tree.as_sequence().ok_or_else(|| {
        AuthorizerError::UnexpectedStructure(format!(
            "signature record is {}, expected SEQUENCE",
            tree.kind()
        ))
    })?;

    let [r, s] = items else {
        return Err(AuthorizerError::UnexpectedStructure(format!(
            "signature record has {} elements, expected 2",
            items.len()
        )));
    };

    Ok(SignatureComponents {
        r: normalize_scalar(integer(r, "r")?),
        s: normalize_scalar(integer(s, "s")?),
    })
}

fn integer<'a>(node: &DerNode<'a>, field: &str) -> Result<&'a [u8]> {
    node.as_integer().ok_or_else(|| {
        AuthorizerError::UnexpectedStructure(format!(
            "signature {field} is {}, expected INTEGER",
            node.kind()
        ))
    })
}

/// Keeps the trailing 32 bytes, then left-pads with zeros to 32.
///
/// Covers both the DER sign byte on values with the top bit set and values
/// whose leading zero bytes were omitted.
pub fn normalize_scalar(value: &[u8]) -> [u8; SCALAR_LEN] {
    let tail = &value[value.len().saturating_sub(SCALAR_LEN)..];
    let mut out = [0u8; SCALAR_LEN];
    out[SCALAR_LEN - tail.len()..].copy_from_slice(tail);
    out
}
