//! Atomic file helpers shared by the store, notifier, and scheduler
//!
//! All JSON configuration and snapshot files are written with the
//! write-to-temp-then-rename pattern so a concurrent reader never observes
//! a partially written file.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Read a JSON file, returning `None` when it does not exist
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::persistence(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let value = serde_json::from_str(&content).map_err(|e| {
        Error::persistence(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    Ok(Some(value))
}

/// Serialize a value as pretty JSON and write it atomically
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::persistence(format!("Failed to serialize {}: {}", path.display(), e)))?;

    write_text_atomic(path, &json).await
}

/// Write text content atomically (temp file + rename)
pub(crate) async fn write_text_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let temp_path = temp_path(path);
    {
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(contents.as_bytes()).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::persistence(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
    }

    // Atomic rename (temp -> actual)
    fs::rename(&temp_path, path).await.map_err(|e| {
        Error::persistence(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Path of the temporary file used for atomic writes
fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    temp.set_extension("tmp");
    temp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_roundtrip_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");

        let missing: Option<Vec<u32>> = read_json(&path).await.unwrap();
        assert!(missing.is_none());

        write_json_atomic(&path, &vec![1u32, 2, 3]).await.unwrap();
        let loaded: Option<Vec<u32>> = read_json(&path).await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        // No temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");
        fs::write(&path, b"not json").await.unwrap();

        let result: Result<Option<Vec<u32>>> = read_json(&path).await;
        assert!(matches!(result, Err(Error::Persistence(_))));
    }
}
