//! # Worldstore Codec
//!
//! Deterministic CBOR encoding/decoding for worldstore.
//!
//! Every blob the engine persists - component payloads, active-entity
//! lists, the archetype mapping - goes through this crate, so that the
//! wire representation is defined in exactly one place.
//!
//! Encoding is deterministic for a given input value: the same value
//! always produces the same bytes. Callers that persist map-shaped data
//! are expected to hand over ordered structures (`BTreeMap`, sorted
//! `Vec`) when byte-level determinism across runs matters; the codec does
//! not reorder entries on their behalf.
//!
//! ## Usage
//!
//! ```
//! let ids: Vec<u64> = vec![3, 1, 4];
//! let bytes = worldstore_codec::encode(&ids).unwrap();
//! let decoded: Vec<u64> = worldstore_codec::decode(&bytes).unwrap();
//! assert_eq!(ids, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;

pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if the value cannot be
/// serialized.
pub fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes a value from CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the bytes are not valid
/// CBOR or do not match the target type.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn roundtrip_integer() {
        let bytes = encode(&42u64).unwrap();
        let decoded: u64 = decode(&bytes).unwrap();
        assert_eq!(decoded, 42);
    }

    #[test]
    fn roundtrip_id_list() {
        let ids: Vec<u64> = vec![0, 1, 5, 99];
        let bytes = encode(&ids).unwrap();
        let decoded: Vec<u64> = decode(&bytes).unwrap();
        assert_eq!(ids, decoded);
    }

    #[test]
    fn roundtrip_empty_list() {
        let ids: Vec<u64> = Vec::new();
        let bytes = encode(&ids).unwrap();
        let decoded: Vec<u64> = decode(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn roundtrip_integer_keyed_map() {
        let mut map: BTreeMap<i64, Vec<u32>> = BTreeMap::new();
        map.insert(0, vec![1, 2]);
        map.insert(1, vec![3]);
        let bytes = encode(&map).unwrap();
        let decoded: BTreeMap<i64, Vec<u32>> = decode(&bytes).unwrap();
        assert_eq!(map, decoded);
    }

    #[test]
    fn roundtrip_struct() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Position {
            x: i64,
            y: i64,
        }

        let pos = Position { x: -3, y: 17 };
        let bytes = encode(&pos).unwrap();
        let decoded: Position = decode(&bytes).unwrap();
        assert_eq!(pos, decoded);
    }

    #[test]
    fn identical_values_encode_identically() {
        let mut a: BTreeMap<i64, Vec<u32>> = BTreeMap::new();
        a.insert(2, vec![9]);
        a.insert(7, vec![1, 4]);
        let b = a.clone();
        assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
    }

    #[test]
    fn decode_garbage_fails() {
        let result: CodecResult<Vec<u64>> = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn decode_wrong_type_fails() {
        let bytes = encode(&"text").unwrap();
        let result: CodecResult<u64> = decode(&bytes);
        assert!(result.is_err());
    }
}
