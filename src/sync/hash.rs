//! Content hashing for conflict detection.
//!
//! Documents are serialized with RFC 8785 canonicalization so that key
//! order in the source file never affects the hash, then digested with
//! SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while canonicalizing a document.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("JCS canonicalization error: {0}")]
    Canonicalize(String),
}

/// RFC 8785 canonical JSON bytes of `value`.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_json_canonicalizer::to_vec(value).map_err(|e| HashError::Canonicalize(e.to_string()))
}

/// Hex SHA-256 of the canonical form of `value`.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
