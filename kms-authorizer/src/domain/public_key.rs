use std::fmt;

use crate::domain::der::{self, DerNode};
use crate::domain::pem::decode_public_key_pem;
use crate::error::{AuthorizerError, Result};

/// Length of an uncompressed P-256 point without its SEC1 format byte.
pub const RAW_PUBLIC_KEY_LEN: usize = 64;

const UNCOMPRESSED_POINT: u8 = 0x04;

/// Public key as the ledger expects it: `X ‖ Y`, 32 bytes each.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPublicKey([u8; RAW_PUBLIC_KEY_LEN]);

impl RawPublicKey {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = decode_public_key_pem(pem)?;
        Self::from_spki_der(&der)
    }

    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let tree = der::parse(der)?;
        extract_public_key(&tree)
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value)
            .map_err(|e| AuthorizerError::InvalidEncoding(format!("public key: {e}")))?;
        Self::try_from(bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; RAW_PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<&[u8]> for RawPublicKey {
    type Error = AuthorizerError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; RAW_PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            AuthorizerError::InvalidEncoding(format!(
                "public key must be {RAW_PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }
}

impl fmt::Display for RawPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RawPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPublicKey").field(&self.to_hex()).finish()
    }
}

/// Pulls the EC point out of a `SubjectPublicKeyInfo` tree.
///
/// Expects `SEQUENCE { SEQUENCE AlgorithmIdentifier, BIT STRING }` where the
/// BIT STRING carries `0x04 ‖ X ‖ Y`; the format byte is dropped.
pub fn extract_public_key(tree: &DerNode<'_>) -> Result<RawPublicKey> {
    let items = tree.as_sequence().ok_or_else(|| {
        unexpected(format!(
            "public key record is {}, expected SEQUENCE",
            tree.kind()
        ))
    })?;

    let [algorithm, subject_public_key] = items else {
        return Err(unexpected(format!(
            "public key record has {} elements, expected 2",
            items.len()
        )));
    };

    if algorithm.as_sequence().is_none() {
        return Err(unexpected(format!(
            "algorithm identifier is {}, expected SEQUENCE",
            algorithm.kind()
        )));
    }

    let DerNode::BitString { unused_bits, bytes } = subject_public_key else {
        return Err(unexpected(format!(
            "subject public key is {}, expected BIT STRING",
            subject_public_key.kind()
        )));
    };

    if *unused_bits != 0 {
        return Err(unexpected(format!(
            "subject public key has {unused_bits} unused bits"
        )));
    }

    match bytes.split_first() {
        Some((&UNCOMPRESSED_POINT, point)) if point.len() == RAW_PUBLIC_KEY_LEN => {
            RawPublicKey::try_from(point)
        }
        Some((&UNCOMPRESSED_POINT, point)) => Err(unexpected(format!(
            "uncompressed point has {} coordinate bytes, expected {RAW_PUBLIC_KEY_LEN}",
            point.len()
        ))),
        Some((format, _)) => Err(unexpected(format!(
            "unsupported point format 0x{format:02x}"
        ))),
        None => Err(unexpected("empty subject public key".to_string())),
    }
}

fn unexpected(message: String) -> AuthorizerError {
    AuthorizerError::UnexpectedStructure(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;
    use p256::elliptic_curve::rand_core::OsRng;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use p256::pkcs8::{EncodePublicKey, LineEnding};
    use p256::PublicKey;

    const RAW_HEX: &str = "8adf5d29ec027b64c1737e2cb1206143328c7792b98eb5a25203da20d34f5fa67848ccad9be5e2bc57ea5df3801a9ced02dd2faaa7a6ae902f18fde0d8aaef8a";
    const SPKI_PREFIX: &str = "3059301306072a8648ce3d020106082a8648ce3d030107034200";

    fn spki_der(point_hex: &str) -> Vec<u8> {
        hex::decode(format!("{SPKI_PREFIX}04{point_hex}")).unwrap()
    }

    #[test]
    fn extract_known_point() {
        let key = RawPublicKey::from_spki_der(&spki_der(RAW_HEX)).unwrap();
        assert_eq!(key.as_bytes().len(), RAW_PUBLIC_KEY_LEN);
        assert_eq!(key.to_hex(), RAW_HEX);
        assert_eq!(key.to_string(), RAW_HEX);
    }

    #[test]
    fn extract_from_generated_pem() {
        let secret_key = SigningKey::random(&mut OsRng);
        let public_key = PublicKey::from(secret_key.verifying_key());
        let pem = public_key.to_public_key_pem(LineEnding::LF).unwrap();

        let key = RawPublicKey::from_pem(&pem).unwrap();

        let encoded = public_key.to_encoded_point(false);
        assert_eq!(&key.as_bytes()[..], &encoded.as_bytes()[1..]);
    }

    #[test]
    fn reject_signature_shaped_record() {
        let der = hex::decode("3006020101020102").unwrap();
        assert!(matches!(
            RawPublicKey::from_spki_der(&der),
            Err(AuthorizerError::UnexpectedStructure(_))
        ));
    }

    #[test]
    fn reject_compressed_point() {
        let mut der = hex::decode("3039301306072a8648ce3d020106082a8648ce3d030107032200").unwrap();
        der.push(0x02);
        der.extend_from_slice(&[0x11; 32]);
        let err = RawPublicKey::from_spki_der(&der).unwrap_err();
        assert_eq!(
            err,
            AuthorizerError::UnexpectedStructure("unsupported point format 0x02".to_string())
        );
    }

    #[test]
    fn reject_short_point() {
        let mut der = hex::decode("3038301306072a8648ce3d020106082a8648ce3d030107032100").unwrap();
        der.push(0x04);
        der.extend_from_slice(&[0x11; 31]);
        assert!(matches!(
            RawPublicKey::from_spki_der(&der),
            Err(AuthorizerError::UnexpectedStructure(_))
        ));
    }

    #[test]
    fn truncated_der_is_malformed() {
        let der = spki_der(RAW_HEX);
        assert!(matches!(
            RawPublicKey::from_spki_der(&der[..der.len() - 1]),
            Err(AuthorizerError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn from_hex_checks_length() {
        assert_eq!(RawPublicKey::from_hex(RAW_HEX).unwrap().to_hex(), RAW_HEX);
        assert!(matches!(
            RawPublicKey::from_hex(&RAW_HEX[..126]),
            Err(AuthorizerError::InvalidEncoding(_))
        ));
        assert!(matches!(
            RawPublicKey::from_hex("zz"),
            Err(AuthorizerError::InvalidEncoding(_))
        ));
    }
}
