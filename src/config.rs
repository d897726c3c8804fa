//! Storage configuration
//!
//! Priority order (highest to lowest):
//! 1. Command-line flags (applied by the binary through the `with_*` builders)
//! 2. Environment variables (`MRKBACKUP_ROOT`)
//! 3. JSON config file
//! 4. Built-in defaults

use crate::backup::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the storage root
pub const ROOT_ENV: &str = "MRKBACKUP_ROOT";

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "MRKBACKUP_CONFIG";

const DEFAULT_ROOT_DIR: &str = ".mrkbackupmanager";
const DEFAULT_RECORD_EXTENSION: &str = "mrkbkp";

/// Where backups live and how their record files are named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory under which every backup's storage subtree lives
    pub root: PathBuf,

    /// Extension of record files, without the leading dot
    pub record_extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            record_extension: DEFAULT_RECORD_EXTENSION.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::default().with_root(root)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_record_extension(mut self, extension: impl Into<String>) -> Self {
        self.record_extension = extension.into();
        self
    }

    /// Read a JSON config file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BackupError::io(format!("reading config {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| BackupError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file (`explicit`, else `MRKBACKUP_CONFIG`) and apply
    /// the `MRKBACKUP_ROOT` override on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_file = std::env::var_os(CONFIG_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(env_file) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(root) = std::env::var_os(ROOT_ENV).filter(|r| !r.is_empty()) {
            config.root = PathBuf::from(root);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(BackupError::Config("storage root cannot be empty".to_string()));
        }
        let ext = &self.record_extension;
        if ext.is_empty() {
            return Err(BackupError::Config("record extension cannot be empty".to_string()));
        }
        if ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(BackupError::Config(format!(
                "record extension {:?} must be a bare extension",
                ext
            )));
        }
        Ok(())
    }
}

fn default_root() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty());
    match home {
        Some(home) => PathBuf::from(home).join(DEFAULT_ROOT_DIR),
        None => PathBuf::from(DEFAULT_ROOT_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_extension() {
        let config = StoreConfig::default();
        assert_eq!(config.record_extension, "mrkbkp");
        assert!(config.root.ends_with(DEFAULT_ROOT_DIR));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("/srv/backups").with_record_extension("bkp");
        assert_eq!(config.root, PathBuf::from("/srv/backups"));
        assert_eq!(config.record_extension, "bkp");
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let config = StoreConfig::new("/srv/backups").with_record_extension(".bkp");
        assert!(matches!(config.validate(), Err(BackupError::Config(_))));
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"root": "/srv/backups"}}"#).unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/backups"));
        assert_eq!(config.record_extension, "mrkbkp");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"record_extension": "bkp"}"#).unwrap();

        let config = StoreConfig::load(Some(&path)).unwrap();
        assert_eq!(config.record_extension, "bkp");
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"root": "/srv", "compression": true}"#).unwrap();

        assert!(matches!(
            StoreConfig::from_file(&path),
            Err(BackupError::Config(_))
        ));
    }
}
