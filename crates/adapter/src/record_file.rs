//! Persistence of the top record as a small JSON document
//!
//! Layout: `{"record": {"name": ..., "score": ..., "timestamp": ...}}`, or
//! `{"record": null}` when nothing has been saved yet.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::LeaderboardRecord;
use crate::protocol::RecordSnapshot;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(default)]
    record: Option<RecordSnapshot>,
}

#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record. A missing or unreadable file yields `None`.
    pub fn load(&self) -> Option<LeaderboardRecord> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    eprintln!(
                        "[Records] Failed to read {}: {}",
                        self.path.display(),
                        err
                    );
                }
                return None;
            }
        };
        match serde_json::from_slice::<RecordDocument>(&bytes) {
            Ok(doc) => doc.record.map(LeaderboardRecord::from),
            Err(err) => {
                eprintln!(
                    "[Records] Ignoring malformed {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    /// Write `record`, replacing the previous file atomically
    pub fn save(&self, record: Option<&LeaderboardRecord>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let doc = RecordDocument {
            record: record.map(RecordSnapshot::from),
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let tmp = self.staging_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    /// Sibling of the target, unique per process and per write
    fn staging_path(&self) -> PathBuf {
        static WRITES: AtomicU64 = AtomicU64::new(0);
        let n = WRITES.fetch_add(1, Ordering::Relaxed);
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.{}.tmp", std::process::id(), n));
        PathBuf::from(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("block_puzzle_{tag}_{nanos}.json"))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let file = RecordFile::new(temp_path("missing"));
        assert_eq!(file.load(), None);
    }

    #[test]
    fn saved_record_is_loaded_back() {
        let path = temp_path("saved");
        let file = RecordFile::new(&path);
        let record = LeaderboardRecord {
            name: "ada".to_string(),
            score: 321,
            timestamp_ms: 1_700_000_000_000,
        };
        file.save(Some(&record)).unwrap();
        assert_eq!(file.load(), Some(record));

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["record"]["score"], 321);
        assert_eq!(raw["record"]["timestamp"], 1_700_000_000_000u64);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn staging_paths_are_unique_per_write() {
        let file = RecordFile::new(temp_path("tmpname"));
        assert_ne!(file.staging_path(), file.staging_path());
    }

    #[test]
    fn malformed_file_loads_as_none() {
        let path = temp_path("malformed");
        fs::write(&path, b"{not json").unwrap();
        assert_eq!(RecordFile::new(&path).load(), None);
        let _ = fs::remove_file(&path);
    }
}
