//! Locating the data directory and config file, and opening the store

use anyhow::{bail, Context, Result};
use gallery_core::comment::CommentManager;
use gallery_core::config::Config;
use gallery_core::events::TracingSink;
use gallery_storage::{Catalog, FileSystemStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const CONFIG_FILE: &str = "config.toml";

/// Paths given on the command line
#[derive(Debug, Clone)]
pub struct Paths {
    data_dir: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl Paths {
    pub fn resolve(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        Self { data_dir, config }
    }

    /// `--config`, else `config.toml` in `--data-dir` or the default directory
    pub fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => self
                .data_dir
                .clone()
                .unwrap_or_else(FileSystemStorage::default_dir)
                .join(CONFIG_FILE),
        }
    }

    /// Load the config file; a missing implicit file yields defaults
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        if self.config.is_none() && !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        Config::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// `--data-dir`, else `storage.data_dir`, else the platform default
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| config.storage.data_dir.clone())
            .unwrap_or_else(FileSystemStorage::default_dir)
    }

    /// Open an initialised store
    pub fn open(&self) -> Result<Store> {
        let config = self.load_config()?;
        let data_dir = self.data_dir(&config);

        if !Catalog::exists_in(&data_dir) {
            bail!(
                "No gallery data in {}. Run 'gallery-comments init' first.",
                data_dir.display()
            );
        }

        Store::open(&data_dir, config)
    }
}

/// Opened comment store with its catalog
pub struct Store {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub manager: CommentManager,
}

impl Store {
    fn open(data_dir: &Path, config: Config) -> Result<Self> {
        let comments = FileSystemStorage::new(data_dir)
            .with_context(|| format!("Failed to open storage in {}", data_dir.display()))?;
        let catalog = Arc::new(Catalog::open(data_dir)?);

        let manager = CommentManager::new(Arc::new(comments), catalog.clone(), catalog.clone())
            .with_config(&config)
            .with_event_sink(Arc::new(TracingSink));

        Ok(Self {
            config,
            catalog,
            manager,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_config_path_defaults_to_data_dir() {
        let paths = Paths::resolve(Some(PathBuf::from("/srv/gallery")), None);
        assert_eq!(paths.config_path(), PathBuf::from("/srv/gallery/config.toml"));

        let paths = Paths::resolve(None, Some(PathBuf::from("custom.toml")));
        assert_eq!(paths.config_path(), PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_data_dir_precedence() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("from-config"));

        let paths = Paths::resolve(Some(PathBuf::from("from-flag")), None);
        assert_eq!(paths.data_dir(&config), PathBuf::from("from-flag"));

        let paths = Paths::resolve(None, None);
        assert_eq!(paths.data_dir(&config), PathBuf::from("from-config"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let paths = Paths::resolve(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.toml")),
        );
        assert!(paths.load_config().is_err());

        let paths = Paths::resolve(Some(temp.path().to_path_buf()), None);
        assert!(paths.load_config().is_ok());
    }

    #[test]
    fn test_open_requires_init() {
        let temp = tempfile::tempdir().unwrap();
        let paths = Paths::resolve(Some(temp.path().to_path_buf()), None);

        let err = paths.open().err().unwrap();
        assert!(err.to_string().contains("gallery-comments init"));

        Catalog::seed_default(temp.path()).unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[rest]\nbase_url = \"https://photos.example.com\"\n")
            .unwrap();
        let store = paths.open().unwrap();
        assert_eq!(store.config.rest.base_url, "https://photos.example.com");
    }
}
