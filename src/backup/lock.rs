// Backup Lock - One mutating operation per backup at a time

use super::types::{BackupError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the lock file inside a backup's storage location
pub const LOCK_FILE_NAME: &str = ".__mrk_lock";

/// Held while a backup's storage is being changed or read for restore.
/// The lock file is removed on drop.
#[derive(Debug)]
pub struct BackupLock {
    path: PathBuf,
}

impl BackupLock {
    /// Take the lock for the backup stored in `location`.
    pub fn acquire(location: &Path, backup: &str) -> Result<Self> {
        let path = location.join(LOCK_FILE_NAME);

        for _ in 0..3 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id()).map_err(|e| {
                        BackupError::io(format!("writing lock {}", path.display()), e)
                    })?;
                    debug!(backup, lock = %path.display(), "Lock acquired");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !holder_is_gone(&path) {
                        return Err(BackupError::Locked(backup.to_string()));
                    }
                    warn!(backup, lock = %path.display(), "Removing stale lock");
                    match fs::remove_file(&path) {
                        Ok(()) => continue,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                        Err(e) => {
                            return Err(BackupError::io(
                                format!("removing stale lock {}", path.display()),
                                e,
                            ))
                        }
                    }
                }
                Err(e) => {
                    return Err(BackupError::io(format!("creating lock {}", path.display()), e))
                }
            }
        }

        Err(BackupError::Locked(backup.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BackupLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            // Deleting a backup removes its lock along with everything else
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(lock = %self.path.display(), error = %e, "Failed to release lock"),
        }
    }
}

/// A lock is stale when the pid it records no longer runs. Only Linux can
/// tell; elsewhere a lock is always treated as held.
#[cfg(target_os = "linux")]
fn holder_is_gone(path: &Path) -> bool {
    let pid = match fs::read_to_string(path) {
        Ok(text) => text.trim().parse::<u32>().ok(),
        Err(e) => return e.kind() == io::ErrorKind::NotFound,
    };
    match pid {
        Some(pid) => !Path::new("/proc").join(pid.to_string()).exists(),
        None => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn holder_is_gone(_path: &Path) -> bool {
    false
}
