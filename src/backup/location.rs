// Storage Location Derivation - Maps a backup to its directory under the storage root

use super::types::{BackupError, BackupRecord, Result};
use rand::Rng;
use std::fs;
use std::path::{Component, Path, PathBuf};

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const SUFFIX_MIN_LEN: usize = 20;
pub const SUFFIX_MAX_LEN: usize = 24;

/// How to resolve a record's storage location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMode {
    /// New backup: append a random suffix to the requested location
    Fresh,
    /// Existing backup: keep the persisted location
    Assigned,
}

/// Random ASCII-letter suffix, 20 to 24 characters long
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(SUFFIX_MIN_LEN..=SUFFIX_MAX_LEN);
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Resolve `record.storage_location` under `root`, create the directory,
/// and store the resolved path back into the record.
pub fn derive_location(
    root: &Path,
    record: &mut BackupRecord,
    mode: LocationMode,
) -> Result<PathBuf> {
    derive_location_with(root, record, mode, &mut rand::thread_rng())
}

pub fn derive_location_with<R: Rng + ?Sized>(
    root: &Path,
    record: &mut BackupRecord,
    mode: LocationMode,
    rng: &mut R,
) -> Result<PathBuf> {
    let relative = relative_to_root(root, &record.storage_location)?;

    let resolved = match mode {
        LocationMode::Fresh => loop {
            let mut candidate = relative.clone().into_os_string();
            candidate.push(random_suffix(rng));
            let candidate = root.join(candidate);
            if !candidate.exists() {
                break candidate;
            }
        },
        LocationMode::Assigned => {
            if relative.as_os_str().is_empty() {
                return Err(BackupError::OutsideRoot(record.storage_location.clone()));
            }
            root.join(relative)
        }
    };

    fs::create_dir_all(&resolved).map_err(|e| {
        BackupError::io(format!("creating storage location {}", resolved.display()), e)
    })?;

    record.storage_location = resolved.clone();
    Ok(resolved)
}

/// A persisted location, checked to be a strict descendant of `root`.
/// Nothing is created.
pub fn contained_location(root: &Path, location: &Path) -> Result<PathBuf> {
    let relative = relative_to_root(root, location)?;
    if relative.as_os_str().is_empty() {
        return Err(BackupError::OutsideRoot(location.to_path_buf()));
    }
    Ok(root.join(relative))
}

fn relative_to_root(root: &Path, location: &Path) -> Result<PathBuf> {
    let relative = match location.strip_prefix(root) {
        Ok(rest) => rest,
        Err(_) if location.is_absolute() => {
            return Err(BackupError::OutsideRoot(location.to_path_buf()))
        }
        Err(_) => location,
    };

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(BackupError::OutsideRoot(location.to_path_buf()));
    }

    Ok(relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    proptest! {
        #[test]
        fn prop_suffix_shape(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let suffix = random_suffix(&mut rng);
            prop_assert!((SUFFIX_MIN_LEN..=SUFFIX_MAX_LEN).contains(&suffix.len()));
            prop_assert!(suffix.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_fresh_location_under_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        let mut record = BackupRecord::new("docs", "/home/u/docs");

        let location = derive_location(&root, &mut record, LocationMode::Fresh).unwrap();

        assert!(location.is_dir());
        assert_eq!(location.parent(), Some(root.as_path()));
        assert_eq!(record.storage_location, location);
        let name = location.file_name().unwrap().to_str().unwrap();
        assert!((SUFFIX_MIN_LEN..=SUFFIX_MAX_LEN).contains(&name.len()));
    }

    #[test]
    fn test_fresh_locations_differ() {
        let dir = TempDir::new().unwrap();
        let mut a = BackupRecord::new("docs", "/home/u/docs");
        let mut b = BackupRecord::new("docs", "/home/u/docs");

        let first = derive_location(dir.path(), &mut a, LocationMode::Fresh).unwrap();
        let second = derive_location(dir.path(), &mut b, LocationMode::Fresh).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_fresh_appends_to_hint() {
        let dir = TempDir::new().unwrap();
        let mut record = BackupRecord::new("docs", "/home/u/docs").with_storage_location("docs-");
        let mut rng = StdRng::seed_from_u64(7);

        let location =
            derive_location_with(dir.path(), &mut record, LocationMode::Fresh, &mut rng).unwrap();
        let name = location.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("docs-"));
        assert!(name.len() >= "docs-".len() + SUFFIX_MIN_LEN);
    }

    #[test]
    fn test_assigned_location_is_stable() {
        let dir = TempDir::new().unwrap();
        let mut record = BackupRecord::new("docs", "/home/u/docs");
        let first = derive_location(dir.path(), &mut record, LocationMode::Fresh).unwrap();

        fs::remove_dir(&first).unwrap();
        let second = derive_location(dir.path(), &mut record, LocationMode::Assigned).unwrap();

        assert_eq!(first, second);
        assert!(second.is_dir());
    }

    #[test]
    fn test_location_outside_root_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        let mut record = BackupRecord::new("docs", "/home/u/docs")
            .with_storage_location(dir.path().join("elsewhere"));

        let err = derive_location(&root, &mut record, LocationMode::Assigned).unwrap_err();
        assert!(matches!(err, BackupError::OutsideRoot(_)));
    }

    #[test]
    fn test_parent_components_rejected() {
        let root = Path::new("/srv/backups");
        assert!(contained_location(root, Path::new("/srv/backups/../etc")).is_err());
        assert!(contained_location(root, Path::new("../escape")).is_err());
        assert!(contained_location(root, root).is_err());
        assert_eq!(
            contained_location(root, Path::new("/srv/backups/abc")).unwrap(),
            PathBuf::from("/srv/backups/abc")
        );
    }
}
