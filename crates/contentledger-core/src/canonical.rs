//! Canonical CBOR encoding for deterministic ledger digests.
//!
//! This module implements RFC 8949 Core Deterministic Encoding for the
//! subset of CBOR the ledger needs:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! Two ledgers holding the same entries produce identical bytes, whatever
//! storage backend they run on.

use ciborium::value::Value;

use crate::content::{ContentEntry, RevenueRecord};
use crate::error::CoreError;
use crate::types::ContentId;

/// Entry field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const ID: u64 = 0;
    pub const CREATOR: u64 = 1;
    pub const OWNER: u64 = 2;
    pub const TITLE: u64 = 3;
    pub const DESCRIPTION: u64 = 4;
    pub const CONTENT_HASH: u64 = 5;
    pub const PRICE: u64 = 6;
    pub const ROYALTY: u64 = 7;
    pub const TOTAL_REVENUE: u64 = 8;
}

/// Encode a content entry to canonical CBOR bytes.
pub fn canonical_entry_bytes(entry: &ContentEntry) -> Result<Vec<u8>, CoreError> {
    encode_cbor_value_canonical(&entry_to_cbor_value(entry))
}

/// Encode a revenue record, keyed by its content id, to canonical CBOR bytes.
pub fn canonical_revenue_bytes(
    content_id: ContentId,
    record: &RevenueRecord,
) -> Result<Vec<u8>, CoreError> {
    let value = Value::Map(vec![
        (uint(keys::ID), uint(content_id.0)),
        (uint(keys::TOTAL_REVENUE), uint(record.total_revenue)),
    ]);
    encode_cbor_value_canonical(&value)
}

fn uint(n: u64) -> Value {
    Value::Integer(n.into())
}

/// Convert an entry to a CBOR Value (map with integer keys).
fn entry_to_cbor_value(entry: &ContentEntry) -> Value {
    Value::Map(vec![
        (uint(keys::ID), uint(entry.id.0)),
        (uint(keys::CREATOR), Value::Text(entry.creator.to_string())),
        (uint(keys::OWNER), Value::Text(entry.owner.to_string())),
        (uint(keys::TITLE), Value::Text(entry.title.clone())),
        (uint(keys::DESCRIPTION), Value::Text(entry.description.clone())),
        (uint(keys::CONTENT_HASH), Value::Text(entry.content_hash.clone())),
        (uint(keys::PRICE), uint(entry.price)),
        (uint(keys::ROYALTY), uint(entry.royalty_percentage.into())),
        (uint(keys::TOTAL_REVENUE), uint(entry.total_revenue)),
    ])
}

fn encode_cbor_value_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        other => {
            return Err(CoreError::EncodingError(format!(
                "unsupported CBOR value in canonical encoding: {:?}",
                other
            )))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentMetadata;
    use crate::types::Principal;

    fn sample_entry() -> ContentEntry {
        let meta = ContentMetadata::new("Test Content", "Description", "QmHash", 100, 10).unwrap();
        ContentEntry::new(ContentId(0), Principal::new("creator").unwrap(), meta)
    }

    #[test]
    fn test_encode_uint_smallest_form() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 0x18]);

        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 1000);
        assert_eq!(buf, vec![0x19, 0x03, 0xe8]);
    }

    #[test]
    fn test_entry_encoding_is_deterministic() {
        let a = canonical_entry_bytes(&sample_entry()).unwrap();
        let b = canonical_entry_bytes(&sample_entry()).unwrap();
        assert_eq!(a, b);
        // Map header: major type 5 with 9 entries.
        assert_eq!(a[0], 0xa9);
    }

    #[test]
    fn test_map_keys_sorted_regardless_of_input_order() {
        let forward = Value::Map(vec![(uint(0), uint(1)), (uint(1), uint(2))]);
        let reversed = Value::Map(vec![(uint(1), uint(2)), (uint(0), uint(1))]);

        assert_eq!(
            encode_cbor_value_canonical(&forward).unwrap(),
            encode_cbor_value_canonical(&reversed).unwrap()
        );
    }

    #[test]
    fn test_owner_change_changes_encoding() {
        let original = sample_entry();
        let mut transferred = sample_entry();
        transferred.transfer_to(Principal::new("buyer").unwrap());

        assert_ne!(
            canonical_entry_bytes(&original).unwrap(),
            canonical_entry_bytes(&transferred).unwrap()
        );
    }

    #[test]
    fn test_revenue_bytes() {
        let bytes = canonical_revenue_bytes(ContentId(0), &RevenueRecord::new(100)).unwrap();
        // {0: 0, 8: 100}
        assert_eq!(bytes, vec![0xa2, 0x00, 0x00, 0x08, 0x18, 0x64]);
    }
}
