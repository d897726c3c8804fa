// Tree Synchronizer - Full-tree mirroring between a source and a destination
//
// Every regular file under the source is copied to the same relative path
// under the destination, overwriting what is there. Nothing is ever deleted
// from the destination by a mirror; restore pre-cleans its target instead.
// Entries are visited in file name order. The first failing copy aborts the
// pass and files already copied stay.

use super::types::{BackupError, Result, SyncReport};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Create `dir` and each missing ancestor, one segment at a time, left to
/// right. Segments that already exist are left alone.
pub fn create_dir_recursive(dir: &Path) -> Result<()> {
    let mut current = PathBuf::new();

    for component in dir.components() {
        current.push(component);
        if !matches!(component, Component::Normal(_)) || current.is_dir() {
            continue;
        }

        match fs::create_dir(&current) {
            Ok(()) => debug!(dir = %current.display(), "Created directory"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && current.is_dir() => {}
            Err(e) => {
                return Err(BackupError::io(
                    format!("creating directory {}", current.display()),
                    e,
                ))
            }
        }
    }

    Ok(())
}

/// Mirrors file trees, optionally leaving out files by extension or name.
#[derive(Debug, Clone, Default)]
pub struct TreeSynchronizer {
    excluded_extensions: Vec<OsString>,
    excluded_names: Vec<OsString>,
}

impl TreeSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip files whose extension is `extension` (no leading dot)
    pub fn exclude_extension(mut self, extension: impl Into<OsString>) -> Self {
        self.excluded_extensions.push(extension.into());
        self
    }

    /// Skip files named exactly `name`
    pub fn exclude_file_name(mut self, name: impl Into<OsString>) -> Self {
        self.excluded_names.push(name.into());
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let by_extension = path
            .extension()
            .map_or(false, |ext| self.excluded_extensions.iter().any(|e| e.as_os_str() == ext));
        let by_name = path
            .file_name()
            .map_or(false, |name| self.excluded_names.iter().any(|n| n.as_os_str() == name));
        by_extension || by_name
    }

    /// Copy every regular file under `source` into `destination`.
    pub fn mirror(&self, source: &Path, destination: &Path) -> Result<SyncReport> {
        if !source.is_dir() {
            return Err(BackupError::NotFound(format!(
                "source directory {}",
                source.display()
            )));
        }
        ensure_disjoint(source, destination)?;

        info!(
            source = %source.display(),
            destination = %destination.display(),
            "Starting tree mirror"
        );

        let mut report = SyncReport::default();

        for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_error(e, source))?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                debug!(path = %entry.path().display(), "Skipping non-regular file");
                report.files_skipped += 1;
                continue;
            }
            if self.is_excluded(entry.path()) {
                debug!(path = %entry.path().display(), "Skipping excluded file");
                report.files_skipped += 1;
                continue;
            }

            report.bytes_copied += self.copy_entry(source, destination, entry.path())?;
            report.files_copied += 1;
        }

        info!(
            source = %source.display(),
            destination = %destination.display(),
            files_copied = report.files_copied,
            bytes_copied = report.bytes_copied,
            files_skipped = report.files_skipped,
            "Tree mirror completed"
        );

        Ok(report)
    }

    /// Wipe `target` if it exists, then mirror `source` into it.
    pub fn restore(&self, source: &Path, target: &Path) -> Result<SyncReport> {
        if !source.is_dir() {
            return Err(BackupError::NotFound(format!(
                "backup directory {}",
                source.display()
            )));
        }
        ensure_disjoint(source, target)?;

        if target.exists() {
            info!(target = %target.display(), "Removing existing restore target");
            fs::remove_dir_all(target).map_err(|e| {
                BackupError::io(format!("removing restore target {}", target.display()), e)
            })?;
        }
        create_dir_recursive(target)?;

        self.mirror(source, target)
    }

    fn copy_entry(&self, source: &Path, destination: &Path, file: &Path) -> Result<u64> {
        let relative = file.strip_prefix(source).map_err(|_| {
            BackupError::io(
                format!("resolving {}", file.display()),
                io::Error::new(io::ErrorKind::InvalidInput, "path escapes the source tree"),
            )
        })?;
        let (relative_dir, file_name) = split_relative(relative)?;

        let target_dir = destination.join(relative_dir);
        if !target_dir.is_dir() {
            create_dir_recursive(&target_dir)?;
        }

        let target = target_dir.join(file_name);
        debug!(from = %file.display(), to = %target.display(), "Copying file");
        fs::copy(file, &target).map_err(|e| {
            BackupError::io(
                format!("copying {} to {}", file.display(), target.display()),
                e,
            )
        })
    }
}

/// I/O error for a failed directory walk, naming the entry that failed.
pub(crate) fn walk_error(e: walkdir::Error, root: &Path) -> BackupError {
    let context = match e.path() {
        Some(path) => format!("walking {}", path.display()),
        None => format!("walking {}", root.display()),
    };
    BackupError::io(context, io::Error::from(e))
}

/// Split a relative file path into (relative directory, file name).
fn split_relative(relative: &Path) -> Result<(&Path, &OsStr)> {
    let file_name = relative.file_name().ok_or_else(|| {
        BackupError::io(
            format!("resolving {}", relative.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let dir = relative.parent().unwrap_or_else(|| Path::new(""));
    Ok((dir, file_name))
}

/// Refuse to mirror when one tree contains the other: copying into the tree
/// being walked never terminates, and a restore would wipe its own source.
pub(crate) fn ensure_disjoint(source: &Path, destination: &Path) -> Result<()> {
    let source_abs = canonical_or_absolute(source)?;
    let destination_abs = canonical_or_absolute(destination)?;

    if destination_abs.starts_with(&source_abs) || source_abs.starts_with(&destination_abs) {
        return Err(BackupError::Overlap {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn canonical_or_absolute(path: &Path) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut existing = path;

    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                resolved.extend(missing.iter().rev());
                return Ok(resolved);
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = if parent.as_os_str().is_empty() {
                        Path::new(".")
                    } else {
                        parent
                    };
                }
                _ => {
                    let cwd = std::env::current_dir()
                        .map_err(|e| BackupError::io("resolving the working directory", e))?;
                    let mut resolved = cwd.join(existing);
                    resolved.extend(missing.iter().rev());
                    return Ok(resolved);
                }
            },
        }
    }
}
