//! JSON file helpers shared by the parameter and board-info codecs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{fs, path::Path};

/// Errors produced while reading or writing persisted JSON.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Schema(String),
}

impl PersistError {
    /// True when the failure is in the content rather than in file access.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, PersistError::Io(_))
    }
}

/// Read and decode a JSON document from disk.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, PersistError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a value to disk as pretty JSON.
///
/// Map-backed values are written in their iteration order, so callers that
/// need stable output serialise through a `BTreeMap`.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
) -> Result<(), PersistError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}
