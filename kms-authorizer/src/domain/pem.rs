use crate::error::{AuthorizerError, Result};

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Strips the `PUBLIC KEY` armor and returns the DER `SubjectPublicKeyInfo`.
///
/// The body must follow the RFC 7468 strict grammar (64-column lines).
pub fn decode_public_key_pem(pem: &str) -> Result<Vec<u8>> {
    let (label, der) = pem_rfc7468::decode_vec(pem.trim().as_bytes())
        .map_err(|e| AuthorizerError::MalformedEncoding(format!("invalid PEM: {e}")))?;

    if label != PUBLIC_KEY_LABEL {
        return Err(AuthorizerError::MalformedEncoding(format!(
            "PEM label is {label:?}, expected {PUBLIC_KEY_LABEL:?}"
        )));
    }
    if der.is_empty() {
        return Err(AuthorizerError::MalformedEncoding(
            "empty PEM body".to_string(),
        ));
    }
    Ok(der)
}
