// # Change Store
//
// File-backed persistence for the last-known IP snapshot and the
// append-only change log.
//
// ## Files
//
// - `last_ip.json`: `{ "ip": "...", "last_updated": "<RFC3339>" }`
// - `ip_changes.log`: one line per change,
//   `YYYY-MM-DD HH:MM:SS - IP changed to: {ip}`
//
// ## Crash Safety
//
// - The JSON snapshot is written with write-then-rename for atomicity
// - Log lines are appended with a single write each, so a reader never
//   sees a torn line
//
// The store is the sole owner of both files. Callers decide whether a
// persistence failure is fatal; during monitoring it never is.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::persist;

/// Timestamp format used in change-log lines
const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker present in every change-log entry
const CHANGE_MARKER: &str = "IP changed to";

/// Last known IP snapshot (last_ip.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRecord {
    /// The last known public IP
    pub ip: IpAddr,

    /// When the snapshot was written
    pub last_updated: DateTime<Utc>,
}

impl IpRecord {
    fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            last_updated: Utc::now(),
        }
    }
}

/// File-backed store for the IP snapshot and the change log
#[derive(Debug, Clone)]
pub struct ChangeStore {
    data_dir: PathBuf,
}

impl ChangeStore {
    /// Create a store rooted at `data_dir`
    ///
    /// The directory is created lazily on first write; a missing directory
    /// on read simply means "no state yet".
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("last_ip.json")
    }

    fn log_path(&self) -> PathBuf {
        self.data_dir.join("ip_changes.log")
    }

    /// Load the full persisted snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(IpRecord))`: A snapshot exists and parsed cleanly
    /// - `Ok(None)`: First run, no snapshot yet
    /// - `Err(Error)`: Read or parse failure (callers log and treat as None)
    pub async fn load_record(&self) -> Result<Option<IpRecord>> {
        persist::read_json(&self.snapshot_path()).await
    }

    /// Load just the last known IP
    pub async fn load_last_ip(&self) -> Result<Option<IpAddr>> {
        Ok(self.load_record().await?.map(|record| record.ip))
    }

    /// Overwrite the snapshot with `ip` and the current timestamp
    pub async fn save_ip(&self, ip: IpAddr) -> Result<()> {
        persist::write_json_atomic(&self.snapshot_path(), &IpRecord::new(ip)).await
    }

    /// Append one change entry to the log
    pub async fn append_change(&self, ip: IpAddr) -> Result<()> {
        self.ensure_data_dir().await?;

        let line = format!(
            "{} - {}: {}\n",
            Local::now().format(LOG_TIMESTAMP_FORMAT),
            CHANGE_MARKER,
            ip
        );

        let path = self.log_path();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                Error::persistence(format!("Failed to open {}: {}", path.display(), e))
            })?;

        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::persistence(format!("Failed to append to {}: {}", path.display(), e))
        })?;

        file.flush().await.map_err(|e| {
            Error::persistence(format!("Failed to flush {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Timestamp of the most recent change entry
    ///
    /// Scans the log backward for the newest line carrying the change
    /// marker and parses its timestamp. An empty, missing, or unparsable
    /// log yields `None`; parse problems are logged, never raised.
    pub async fn last_change_time(&self) -> Result<Option<NaiveDateTime>> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            Error::persistence(format!("Failed to read {}: {}", path.display(), e))
        })?;

        for line in content.lines().rev() {
            if !line.contains(CHANGE_MARKER) {
                continue;
            }

            let Some((timestamp, _)) = line.split_once(" - ") else {
                tracing::warn!("Malformed change log line: {}", line);
                return Ok(None);
            };

            return match NaiveDateTime::parse_from_str(timestamp, LOG_TIMESTAMP_FORMAT) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(e) => {
                    tracing::warn!("Unparsable change log timestamp '{}': {}", timestamp, e);
                    Ok(None)
                }
            };
        }

        Ok(None)
    }

    /// All change entries, oldest first
    pub async fn history(&self) -> Result<Vec<String>> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            Error::persistence(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(content
            .lines()
            .filter(|line| line.contains(CHANGE_MARKER))
            .map(|line| line.trim().to_string())
            .collect())
    }

    /// Truncate the change log to empty
    ///
    /// Part of the explicit reset path; normal change detection never
    /// removes entries.
    pub async fn clear_log(&self) -> Result<()> {
        persist::write_text_atomic(&self.log_path(), "").await
    }

    async fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create data directory {}: {}",
                    self.data_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ChangeStore::new(dir.path());

        // First run: nothing persisted
        assert_eq!(store.load_last_ip().await.unwrap(), None);

        store.save_ip(ip("1.2.3.4")).await.unwrap();
        assert_eq!(store.load_last_ip().await.unwrap(), Some(ip("1.2.3.4")));

        // Overwrite
        store.save_ip(ip("5.6.7.8")).await.unwrap();
        let record = store.load_record().await.unwrap().unwrap();
        assert_eq!(record.ip, ip("5.6.7.8"));
    }

    #[tokio::test]
    async fn test_append_and_scan_backward() {
        let dir = tempdir().unwrap();
        let store = ChangeStore::new(dir.path());

        assert_eq!(store.last_change_time().await.unwrap(), None);

        store.append_change(ip("1.1.1.1")).await.unwrap();
        store.append_change(ip("2.2.2.2")).await.unwrap();

        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].contains("1.1.1.1"));
        assert!(history[1].contains("2.2.2.2"));

        // Newest entry wins
        let last = store.last_change_time().await.unwrap();
        assert!(last.is_some());
    }

    #[tokio::test]
    async fn test_clear_log_empties_history() {
        let dir = tempdir().unwrap();
        let store = ChangeStore::new(dir.path());

        store.append_change(ip("1.1.1.1")).await.unwrap();
        store.clear_log().await.unwrap();

        assert!(store.history().await.unwrap().is_empty());
        assert_eq!(store.last_change_time().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error_not_a_panic() {
        let dir = tempdir().unwrap();
        let store = ChangeStore::new(dir.path());

        fs::write(dir.path().join("last_ip.json"), b"garbage")
            .await
            .unwrap();

        assert!(store.load_last_ip().await.is_err());
    }

    #[tokio::test]
    async fn test_unparsable_log_timestamp_yields_none() {
        let dir = tempdir().unwrap();
        let store = ChangeStore::new(dir.path());

        fs::write(
            dir.path().join("ip_changes.log"),
            b"nonsense - IP changed to: 1.1.1.1\n",
        )
        .await
        .unwrap();

        assert_eq!(store.last_change_time().await.unwrap(), None);
    }
}
