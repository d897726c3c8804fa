//! # MRK Backup Manager
//!
//! A local file-tree backup manager. It snapshots a source directory into a
//! managed storage area, tracks named backups through small record files,
//! and re-mirrors or restores those trees on demand.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mrkbackup::backup::{BackupManager, RestoreTarget};
//! use mrkbackup::config::StoreConfig;
//! use std::path::Path;
//!
//! # fn example() -> mrkbackup::backup::Result<()> {
//! let manager = BackupManager::from_config(&StoreConfig::new("/srv/backups"))?;
//!
//! let record = manager.create_backup("docs", Path::new("/home/u/docs"))?;
//! manager.update_backup(&record)?;
//! manager.restore_backup(&record, &RestoreTarget::Path("/tmp/out".into()))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage layout
//!
//! Each backup owns one directory directly under the storage root, named by
//! a random 20–24 letter suffix. It holds the mirrored files and a record
//! file `__mrk_<name>.<ext>` listing the name, source path, storage
//! location, and creation and modification times.
//!
//! ## Modules
//!
//! - [`backup`]: record storage, location derivation, tree mirroring, and
//!   the [`backup::BackupManager`] facade
//! - [`config`]: storage root and record extension
//! - [`shell`]: the interactive command shell used by the binary

/// Backup records, storage and tree synchronization
pub mod backup;

/// Storage configuration
pub mod config;

/// Interactive command shell
pub mod shell;

pub use backup::{BackupError, BackupManager, BackupRecord, RestoreTarget, Result};
pub use config::StoreConfig;
