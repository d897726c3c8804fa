// Backup storage and tree synchronization
//
// A backup is a directory under the storage root holding a mirror of its
// source tree plus one record file describing it.

pub mod codec;
pub mod location;
pub mod lock;
pub mod manager;
pub mod storage;
pub mod sync;
pub mod types;

pub use location::{derive_location, LocationMode};
pub use lock::{BackupLock, LOCK_FILE_NAME};
pub use manager::BackupManager;
pub use storage::{FileRecordStore, RecordStorage, RECORD_FILE_PREFIX};
pub use sync::{create_dir_recursive, TreeSynchronizer};
pub use types::{BackupError, BackupRecord, RestoreTarget, Result, SyncReport};
