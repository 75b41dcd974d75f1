//! Account key record as registered on-chain.
//!
//! The record is the RLP list `[public_key, signature_algorithm,
//! hash_algorithm, weight]`.
//! Ref: https://github.com/onflow/flow/blob/master/docs/content/concepts/accounts-and-keys.md#supported-signature--hash-algorithms

use std::fmt;
use std::str::FromStr;

use rlp::RlpStream;
use serde::{Deserialize, Serialize};

use crate::domain::public_key::RawPublicKey;
use crate::error::Result;

/// ECDSA over NIST P-256.
pub const SIGNATURE_ALGORITHM_ECDSA_P256: u64 = 2;
pub const HASH_ALGORITHM_SHA2_256: u64 = 1;
pub const HASH_ALGORITHM_SHA3_256: u64 = 3;
/// Full signing weight; a single key at this weight can authorize alone.
pub const KEY_WEIGHT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashAlgorithm {
    #[default]
    Sha2_256,
    Sha3_256,
}

impl HashAlgorithm {
    pub fn id(self) -> u64 {
        match self {
            HashAlgorithm::Sha2_256 => HASH_ALGORITHM_SHA2_256,
            HashAlgorithm::Sha3_256 => HASH_ALGORITHM_SHA3_256,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha2_256 => write!(f, "SHA2_256"),
            HashAlgorithm::Sha3_256 => write!(f, "SHA3_256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SHA2_256" => Ok(HashAlgorithm::Sha2_256),
            "SHA3_256" => Ok(HashAlgorithm::Sha3_256),
            other => Err(format!("unsupported hash algorithm: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDescriptor {
    public_key: RawPublicKey,
    hash_algorithm: HashAlgorithm,
}

impl KeyDescriptor {
    pub fn new(public_key: RawPublicKey) -> Self {
        Self {
            public_key,
            hash_algorithm: HashAlgorithm::default(),
        }
    }

    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    pub fn public_key(&self) -> &RawPublicKey {
        &self.public_key
    }

    pub fn signature_algorithm_id(&self) -> u64 {
        SIGNATURE_ALGORITHM_ECDSA_P256
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn weight(&self) -> u32 {
        KEY_WEIGHT
    }

    pub fn encode(&self) -> Vec<u8> {
        let public_key: &[u8] = self.public_key.as_bytes();
        let mut stream = RlpStream::new_list(4);
        stream
            .append(&public_key)
            .append(&self.signature_algorithm_id())
            .append(&self.hash_algorithm.id())
            .append(&self.weight());
        stream.out().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }
}

/// Encodes raw key bytes with the default hash algorithm.
///
/// Fails with `InvalidEncoding` unless `public_key` is exactly 64 bytes.
pub fn encode_key_descriptor(public_key: &[u8]) -> Result<Vec<u8>> {
    let public_key = RawPublicKey::try_from(public_key)?;
    Ok(KeyDescriptor::new(public_key).encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthorizerError;

    const RAW_HEX: &str = "8adf5d29ec027b64c1737e2cb1206143328c7792b98eb5a25203da20d34f5fa67848ccad9be5e2bc57ea5df3801a9ced02dd2faaa7a6ae902f18fde0d8aaef8a";

    fn raw_key() -> RawPublicKey {
        RawPublicKey::from_hex(RAW_HEX).unwrap()
    }

    #[test]
    fn encode_default_descriptor() {
        let encoded = KeyDescriptor::new(raw_key()).to_hex();
        assert_eq!(encoded, format!("f847b840{RAW_HEX}02018203e8"));
    }

    #[test]
    fn encode_sha3_descriptor() {
        let encoded = KeyDescriptor::new(raw_key())
            .with_hash_algorithm(HashAlgorithm::Sha3_256)
            .to_hex();
        assert_eq!(encoded, format!("f847b840{RAW_HEX}02038203e8"));
    }

    #[test]
    fn generic_decoder_reads_back_fields() {
        let encoded = encode_key_descriptor(&hex::decode(RAW_HEX).unwrap()).unwrap();

        let decoded = rlp::Rlp::new(&encoded);
        assert!(decoded.is_list());
        assert_eq!(decoded.item_count().unwrap(), 4);
        assert_eq!(decoded.at(0).unwrap().data().unwrap(), &raw_key().as_bytes()[..]);
        assert_eq!(decoded.val_at::<u64>(1).unwrap(), SIGNATURE_ALGORITHM_ECDSA_P256);
        assert_eq!(decoded.val_at::<u64>(2).unwrap(), HASH_ALGORITHM_SHA2_256);
        assert_eq!(decoded.val_at::<u64>(3).unwrap(), u64::from(KEY_WEIGHT));
    }

    #[test]
    fn weight_is_fixed() {
        let descriptor = KeyDescriptor::new(raw_key()).with_hash_algorithm(HashAlgorithm::Sha3_256);
        let encoded = descriptor.encode();
        assert_eq!(descriptor.weight(), 1000);
        assert_eq!(encoded[encoded.len() - 3..], [0x82, 0x03, 0xe8]);
    }

    #[test]
    fn reject_wrong_key_length() {
        assert!(matches!(
            encode_key_descriptor(&[0u8; 65]),
            Err(AuthorizerError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn parse_hash_algorithm_names() {
        assert_eq!("sha3_256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha3_256));
        assert_eq!("SHA2_256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha2_256));
        assert!("KECCAK_256".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::Sha3_256.to_string(), "SHA3_256");
    }
}
