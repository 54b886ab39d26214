use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::StorageError;

fn io<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Io(e.to_string())
}

fn parse<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Parse(e.to_string())
}

/// Read and decode a JSON file. A missing file is `Ok(None)`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io(err)),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(parse)
}

/// Encode and write a JSON file, replacing any previous content.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(parse)?;
    tokio::fs::write(path, bytes).await.map_err(io)
}
