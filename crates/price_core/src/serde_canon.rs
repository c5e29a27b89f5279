//! Canonical JSON for artifact hashing
//!
//! Values pass through `serde_json::Value` before printing. Without the
//! `preserve_order` feature its object map is a `BTreeMap`, so every object's
//! keys come out sorted regardless of struct field order, and the output has
//! no whitespace. The pipeline hash is the Blake3 digest of that text.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Blake3 hex digest of the canonical JSON of `value`
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}
