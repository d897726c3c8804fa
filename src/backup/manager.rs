// Backup Manager - Create, update, delete, restore and look up named backups

use super::location::{contained_location, derive_location, LocationMode};
use super::lock::{BackupLock, LOCK_FILE_NAME};
use super::storage::{FileRecordStore, RecordStorage};
use super::sync::{ensure_disjoint, TreeSynchronizer};
use super::types::{BackupError, BackupRecord, RestoreTarget, Result, SyncReport};
use crate::config::StoreConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub struct BackupManager {
    storage: Box<dyn RecordStorage>,
}

impl BackupManager {
    pub fn new(storage: Box<dyn RecordStorage>) -> Self {
        Self { storage }
    }

    /// Manager over the filesystem store described by `config`
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(Box::new(FileRecordStore::new(config))))
    }

    pub fn storage(&self) -> &dyn RecordStorage {
        self.storage.as_ref()
    }

    /// Register a new backup of `source` and populate it. The record keeps
    /// the canonical absolute form of `source`.
    pub fn create_backup(&self, name: &str, source: &Path) -> Result<BackupRecord> {
        validate_name(name)?;

        if self.storage.find_record_by_name(name)?.is_some() {
            return Err(BackupError::DuplicateName(name.to_string()));
        }
        if !source.is_dir() {
            return Err(BackupError::NotFound(format!(
                "source directory {}",
                source.display()
            )));
        }
        let source = source.canonicalize().map_err(|e| {
            BackupError::io(format!("resolving source directory {}", source.display()), e)
        })?;
        ensure_disjoint(&source, self.storage.root())?;

        info!(backup = name, source = %source.display(), "Creating backup");

        let mut record = BackupRecord::new(name, source);
        let location = derive_location(self.storage.root(), &mut record, LocationMode::Fresh)?;
        let _lock = BackupLock::acquire(&location, name)?;

        self.storage.write_record(&record)?;
        let report = self
            .populate(&record, &location)
            .map_err(|e| log_failure(name, "create", e))?;

        info!(
            backup = name,
            location = %location.display(),
            files = report.files_copied,
            bytes = report.bytes_copied,
            "Backup created"
        );
        Ok(record)
    }

    /// Re-mirror the source into the backup and refresh its record.
    pub fn update_backup(&self, record: &BackupRecord) -> Result<BackupRecord> {
        let mut record = record.clone();
        let location = derive_location(self.storage.root(), &mut record, LocationMode::Assigned)?;
        let _lock = BackupLock::acquire(&location, &record.name)?;

        info!(backup = %record.name, source = %record.source_path.display(), "Updating backup");

        let report = self
            .populate(&record, &location)
            .map_err(|e| log_failure(&record.name, "update", e))?;

        record.touch();
        derive_location(self.storage.root(), &mut record, LocationMode::Assigned)?;
        self.storage.write_record(&record)?;

        info!(
            backup = %record.name,
            files = report.files_copied,
            bytes = report.bytes_copied,
            "Backup updated"
        );
        Ok(record)
    }

    /// Remove the backup's whole storage subtree, record included.
    pub fn delete_backup(&self, record: &BackupRecord) -> Result<()> {
        let location = contained_location(self.storage.root(), &record.storage_location)?;
        if !location.is_dir() {
            return Err(BackupError::NotFound(format!(
                "storage for backup {} at {}",
                record.name,
                location.display()
            )));
        }

        let _lock = BackupLock::acquire(&location, &record.name)?;
        fs::remove_dir_all(&location).map_err(|e| {
            log_failure(
                &record.name,
                "delete",
                BackupError::io(format!("removing {}", location.display()), e),
            )
        })?;

        info!(backup = %record.name, location = %location.display(), "Backup deleted");
        Ok(())
    }

    /// Replace `target` with the backup's files. Record files never reach
    /// the target.
    pub fn restore_backup(
        &self,
        record: &BackupRecord,
        target: &RestoreTarget,
    ) -> Result<SyncReport> {
        let location = contained_location(self.storage.root(), &record.storage_location)?;
        if !location.is_dir() {
            return Err(BackupError::NotFound(format!(
                "storage for backup {} at {}",
                record.name,
                location.display()
            )));
        }
        let target = target.resolve(record);

        let _lock = BackupLock::acquire(&location, &record.name)?;
        info!(backup = %record.name, target = %target.display(), "Restoring backup");

        let report = TreeSynchronizer::new()
            .exclude_extension(self.storage.record_extension())
            .exclude_file_name(LOCK_FILE_NAME)
            .restore(&location, &target)
            .map_err(|e| log_failure(&record.name, "restore", e))?;

        info!(
            backup = %record.name,
            target = %target.display(),
            files = report.files_copied,
            bytes = report.bytes_copied,
            "Backup restored"
        );
        Ok(report)
    }

    /// Every readable backup record, in filesystem order.
    pub fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        self.storage.list_all_records()?.collect()
    }

    pub fn find_backup(&self, name: &str) -> Result<Option<BackupRecord>> {
        self.storage.find_record_by_name(name)
    }

    /// Mirror the source into `location`. Source files that would land on
    /// the backup's own record or lock file are left out.
    fn populate(&self, record: &BackupRecord, location: &Path) -> Result<SyncReport> {
        TreeSynchronizer::new()
            .exclude_file_name(self.storage.record_file_name(&record.name))
            .exclude_file_name(LOCK_FILE_NAME)
            .mirror(record.source_path(), location)
    }
}

fn log_failure(backup: &str, operation: &'static str, e: BackupError) -> BackupError {
    error!(backup, operation, error = %e, "Backup operation failed");
    e
}

/// Names become part of a file name inside the storage location.
fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name cannot be empty")
    } else if name.contains(['/', '\\']) {
        Some("name cannot contain path separators")
    } else if name == "." || name == ".." {
        Some("name cannot be a relative directory")
    } else if name.contains('\0') {
        Some("name cannot contain NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BackupError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
