//! ASN.1 DER tree reader.
//!
//! Decodes the subset of DER that key-management responses use: SEQUENCE,
//! INTEGER, BIT STRING, plus the OBJECT IDENTIFIER, NULL and OCTET STRING
//! primitives found inside an `AlgorithmIdentifier`. Tag/length framing and
//! primitive validation come from the `der` crate; this module only builds
//! the tree and knows nothing about keys or signatures.

use der::asn1::{AnyRef, BitStringRef, IntRef, Null, ObjectIdentifier, OctetStringRef};
use der::{ErrorKind, Length, Reader, SliceReader, Tag, Tagged};
use thiserror::Error;

/// Nesting limit for constructed values.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerError {
    #[error("{kind} at offset {offset}")]
    Malformed { kind: ErrorKind, offset: usize },
    #[error("unexpected tag 0x{tag:02x} at offset {offset}")]
    UnexpectedTag { tag: u8, offset: usize },
    #[error("constructed values nested too deeply")]
    TooDeep,
}

impl DerError {
    fn at(error: der::Error, base: usize) -> Self {
        DerError::Malformed {
            kind: error.kind(),
            offset: base + error.position().map(to_usize).unwrap_or(0),
        }
    }
}

/// A decoded DER value. Primitive payloads borrow from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerNode<'a> {
    Sequence(Vec<DerNode<'a>>),
    /// Two's-complement big-endian content octets, exactly as encoded.
    Integer(&'a [u8]),
    BitString {
        unused_bits: u8,
        bytes: &'a [u8],
    },
    OctetString(&'a [u8]),
    Null,
    /// Encoded arcs, without tag and length.
    ObjectIdentifier(&'a [u8]),
}

impl<'a> DerNode<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            DerNode::Sequence(_) => "SEQUENCE",
            DerNode::Integer(_) => "INTEGER",
            DerNode::BitString { .. } => "BIT STRING",
            DerNode::OctetString(_) => "OCTET STRING",
            DerNode::Null => "NULL",
            DerNode::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
        }
    }

    pub fn as_sequence(&self) -> Option<&[DerNode<'a>]> {
        match self {
            DerNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&'a [u8]> {
        match self {
            DerNode::Integer(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Parses exactly one DER value spanning the whole input.
pub fn parse(input: &[u8]) -> Result<DerNode<'_>, DerError> {
    let mut reader = SliceReader::new(input).map_err(|e| DerError::at(e, 0))?;
    let node = read_node(&mut reader, 0, 0)?;
    reader.finish(node).map_err(|e| DerError::at(e, 0))
}

/// Reads one value from `reader`, whose input starts at `base` in the
/// top-level buffer.
fn read_node<'a>(
    reader: &mut SliceReader<'a>,
    base: usize,
    depth: usize,
) -> Result<DerNode<'a>, DerError> {
    let offset = base + to_usize(reader.position());
    let any: AnyRef<'a> = reader.decode().map_err(|e| DerError::at(e, base))?;
    let value = any.value();
    let value_offset = base + to_usize(reader.position()) - value.len();
    let invalid = |e: der::Error| DerError::at(e, value_offset);

    match any.tag() {
        Tag::Sequence => {
            if depth >= MAX_DEPTH {
                return Err(DerError::TooDeep);
            }
            let mut items_reader = SliceReader::new(value).map_err(invalid)?;
            let mut items = Vec::new();
            while !items_reader.is_finished() {
                items.push(read_node(&mut items_reader, value_offset, depth + 1)?);
            }
            Ok(DerNode::Sequence(items))
        }
        Tag::Integer => {
            // Canonical form is checked; the content octets are kept verbatim.
            IntRef::try_from(any).map_err(invalid)?;
            Ok(DerNode::Integer(value))
        }
        Tag::BitString => {
            let bits: BitStringRef<'a> = BitStringRef::try_from(any).map_err(invalid)?;
            Ok(DerNode::BitString {
                unused_bits: bits.unused_bits(),
                bytes: bits.raw_bytes(),
            })
        }
        Tag::OctetString => {
            let octets: OctetStringRef<'a> = OctetStringRef::try_from(any).map_err(invalid)?;
            Ok(DerNode::OctetString(octets.as_bytes()))
        }
        Tag::Null => {
            Null::try_from(any).map_err(invalid)?;
            Ok(DerNode::Null)
        }
        Tag::ObjectIdentifier => {
            ObjectIdentifier::try_from(any).map_err(invalid)?;
            Ok(DerNode::ObjectIdentifier(value))
        }
        tag => Err(DerError::UnexpectedTag {
            tag: tag.into(),
            offset,
        }),
    }
}

fn to_usize(length: Length) -> usize {
    u32::from(length) as usize
}
