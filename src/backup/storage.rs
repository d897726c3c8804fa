// Backup Record Storage - One record file per backup under the storage root

use super::codec::{decode_record, encode_record};
use super::sync::walk_error;
use super::types::{BackupError, BackupRecord, Result};
use crate::config::StoreConfig;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Prefix of every record file name
pub const RECORD_FILE_PREFIX: &str = "__mrk_";

pub trait RecordStorage: Send + Sync {
    /// Directory under which all backup storage lives
    fn root(&self) -> &Path;

    /// Extension of record files, without the dot
    fn record_extension(&self) -> &str;

    /// Every record file under the root, recursively. Creates the root when
    /// it is missing. Order follows the filesystem. Directories that cannot
    /// be walked show up as `Err` items.
    fn list_record_files(&self) -> Result<Box<dyn Iterator<Item = Result<PathBuf>> + '_>>;

    fn read_record(&self, path: &Path) -> Result<BackupRecord>;

    /// Replace the record file inside `record.storage_location`. The
    /// directory must already exist.
    fn write_record(&self, record: &BackupRecord) -> Result<PathBuf>;

    /// File name of the record for backup `name`
    fn record_file_name(&self, name: &str) -> String {
        format!("{}{}.{}", RECORD_FILE_PREFIX, name, self.record_extension())
    }

    /// Deterministic path of a record's file
    fn record_path(&self, record: &BackupRecord) -> PathBuf {
        record.storage_location.join(self.record_file_name(&record.name))
    }

    /// Every record under the root. Corrupt record files, and files that
    /// vanish between listing and reading, are skipped with a warning.
    /// Any other failure is passed on.
    fn list_all_records(&self) -> Result<Box<dyn Iterator<Item = Result<BackupRecord>> + '_>> {
        let files = self.list_record_files()?;
        Ok(Box::new(files.filter_map(move |path| {
            let path = match path {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };
            match self.read_record(&path) {
                Ok(record) => Some(Ok(record)),
                Err(e @ (BackupError::Corrupt { .. } | BackupError::NotFound(_))) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable backup record");
                    None
                }
                Err(e) => Some(Err(e)),
            }
        })))
    }

    /// First record carrying `name`. Fails if the listing hits an error
    /// before a match is found.
    fn find_record_by_name(&self, name: &str) -> Result<Option<BackupRecord>> {
        for record in self.list_all_records()? {
            let record = record?;
            if record.name == name {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Record storage on the local filesystem
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
    record_extension: String,
}

impl FileRecordStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            root: config.root.clone(),
            record_extension: config.record_extension.clone(),
        }
    }

    fn ensure_root_exists(&self) -> Result<()> {
        if !self.root.is_dir() {
            fs::create_dir_all(&self.root).map_err(|e| {
                BackupError::io(format!("creating storage root {}", self.root.display()), e)
            })?;
        }
        Ok(())
    }

    fn is_record_file(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.record_extension))
    }
}

impl RecordStorage for FileRecordStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn record_extension(&self) -> &str {
        &self.record_extension
    }

    fn list_record_files(&self) -> Result<Box<dyn Iterator<Item = Result<PathBuf>> + '_>> {
        self.ensure_root_exists()?;

        let files = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() && self.is_record_file(entry.path()) => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(walk_error(e, &self.root))),
            });

        Ok(Box::new(files))
    }

    fn read_record(&self, path: &Path) -> Result<BackupRecord> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                BackupError::NotFound(format!("record file {}", path.display()))
            }
            _ => BackupError::io(format!("reading record {}", path.display()), e),
        })?;

        decode_record(&bytes).map_err(|e| BackupError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn write_record(&self, record: &BackupRecord) -> Result<PathBuf> {
        let path = self.record_path(record);
        let bytes = encode_record(record)?;

        fs::write(&path, bytes)
            .map_err(|e| BackupError::io(format!("writing record {}", path.display()), e))?;

        debug!(backup = %record.name, path = %path.display(), "Record written");
        Ok(path)
    }
}
