//! Deterministic hashing and ids for canonical artifacts.
//!
//! - `sha256_canonical(..)` hashes JSON values/structs through canonical JSON.
//! - `sha256_hex(..)` hashes raw bytes.
//! - `RES:<hex>` ids derive from canonical bytes; hex is lowercase.

#![forbid(unsafe_code)]

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes_of;
use crate::IoError;

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    let bytes = to_canonical_bytes_of(value)?;
    Ok(sha256_hex(&bytes))
}

/// `RES:<hex>` id of a result document derived from its canonical bytes.
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(format!("RES:{}", sha256_canonical(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn canonical_hashing_ignores_field_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn res_id_prefix() {
        let id = res_id_from_canonical(&json!({"x": 1})).unwrap();
        assert!(id.starts_with("RES:"));
        assert_eq!(id.len(), 4 + 64);
    }
}
