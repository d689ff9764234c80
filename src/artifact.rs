//! JSON persistence for intermediate artifacts.

use crate::error::{RedactorError, RedactorResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Reads and deserializes a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> RedactorResult<T> {
    let bytes = std::fs::read(path).map_err(|e| RedactorError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RedactorError::artifact(format!("'{}' is not a valid artifact: {}", path.display(), e))
    })
}

/// Serializes an artifact as pretty-printed JSON.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> RedactorResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    std::fs::write(path, bytes).map_err(|e| RedactorError::io(path, e))
}
