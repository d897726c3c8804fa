// Backup System Types - Core data structures and errors

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Result type for backup operations
pub type Result<T> = std::result::Result<T, BackupError>;

/// Persisted metadata describing one managed backup.
///
/// Field order is the on-disk order; see [`crate::backup::codec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub name: String,
    pub source_path: PathBuf,
    pub storage_location: PathBuf,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub last_modified: DateTime<Utc>,
}

impl BackupRecord {
    /// A record that has not been assigned a storage location yet.
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        let now = now();
        Self {
            name: name.into(),
            source_path: source_path.into(),
            storage_location: PathBuf::new(),
            created_at: now,
            last_modified: now,
        }
    }

    pub fn with_storage_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.storage_location = location.into();
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn storage_location(&self) -> &Path {
        &self.storage_location
    }

    /// Mark the record as refreshed now.
    pub fn touch(&mut self) {
        self.last_modified = now();
    }
}

/// Current time at the precision records persist.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Where a restore should write its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    /// Restore into the record's original source directory
    OriginalSource,
    /// Restore into an arbitrary directory
    Path(PathBuf),
}

impl RestoreTarget {
    /// Token the shell accepts in place of a path to mean the original source.
    pub const SOURCE_SENTINEL: &'static str = "$src";

    pub fn parse(input: &str) -> Self {
        if input == Self::SOURCE_SENTINEL {
            RestoreTarget::OriginalSource
        } else {
            RestoreTarget::Path(PathBuf::from(input))
        }
    }

    pub fn resolve(&self, record: &BackupRecord) -> PathBuf {
        match self {
            RestoreTarget::OriginalSource => record.source_path.clone(),
            RestoreTarget::Path(path) => path.clone(),
        }
    }
}

impl From<PathBuf> for RestoreTarget {
    fn from(path: PathBuf) -> Self {
        RestoreTarget::Path(path)
    }
}

/// Outcome of one tree mirror pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub files_skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Corrupt record {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },
    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("Backup {0} already exists")]
    DuplicateName(String),
    #[error("Invalid backup name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("Location {} is outside the storage root", .0.display())]
    OutsideRoot(PathBuf),
    #[error("Refusing to mirror {} into {}: the trees overlap", .from.display(), .to.display())]
    Overlap { from: PathBuf, to: PathBuf },
    #[error("Backup {0} is locked by another operation")]
    Locked(String),
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackupError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BackupError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error reports a missing record or path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackupError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_target_sentinel() {
        let record = BackupRecord::new("docs", "/home/u/docs");

        assert_eq!(RestoreTarget::parse("$src"), RestoreTarget::OriginalSource);
        assert_eq!(
            RestoreTarget::parse("$src").resolve(&record),
            PathBuf::from("/home/u/docs")
        );
        assert_eq!(
            RestoreTarget::parse("/tmp/out").resolve(&record),
            PathBuf::from("/tmp/out")
        );
    }

    #[test]
    fn test_new_record_timestamps_match() {
        let record = BackupRecord::new("docs", "/home/u/docs");
        assert_eq!(record.created_at, record.last_modified);
        assert!(record.storage_location().as_os_str().is_empty());
    }

    #[test]
    fn test_io_error_keeps_source_message() {
        let err = BackupError::io(
            "copying a.txt",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("copying a.txt"));
        assert!(msg.contains("disk full"));
    }
}
