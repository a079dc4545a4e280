//! Configuration management for gallery-comments

use crate::error::{GalleryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment validation settings
    pub comments: CommentConfig,
    /// REST representation settings
    pub rest: RestConfig,
    /// Storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| GalleryError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GalleryError::from(e).with_context(format!("Failed to read {}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GalleryError::Toml(e.to_string()))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.rest.base_url).map_err(|e| {
            GalleryError::Config(format!("rest.base_url '{}': {}", self.rest.base_url, e))
        })?;
        Ok(())
    }
}

/// Comment validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Reject guest comments that leave the email address empty
    pub require_guest_email: bool,
}

/// REST representation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Base URL that REST resource paths are appended to
    pub base_url: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/gallery3/index.php".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; the platform default is used when unset
    pub data_dir: Option<PathBuf>,
}
