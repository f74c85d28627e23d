//! Templating configuration persistence.
//!
//! Stores the configuration in the platform-specific config directory unless
//! an explicit path is given:
//! - Linux: ~/.config/tessera/config.json
//! - macOS: ~/Library/Application Support/tessera/config.json
//! - Windows: %APPDATA%/tessera/config.json

use std::path::PathBuf;

use tessera_domain::{DomainError, TemplatingConfig};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The stored configuration is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DomainError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for the templating configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigRepository {
    path: Option<PathBuf>,
}

impl ConfigRepository {
    /// Creates a repository using the platform config directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { path: None }
    }

    /// Creates a repository reading and writing `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tessera").join("config.json"))
    }

    /// Returns the file this repository uses.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(Self::default_path)
    }

    /// Loads and validates the configuration.
    ///
    /// Returns the default configuration if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub async fn load(&self) -> Result<TemplatingConfig, ConfigError> {
        let Some(path) = self.path() else {
            return Ok(TemplatingConfig::default());
        };
        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(TemplatingConfig::default());
        }

        let content = fs::read(&path).await?;
        let config: TemplatingConfig = from_json_bytes(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded templating config");
        Ok(config)
    }

    /// Validates and saves the configuration, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or cannot be written.
    pub async fn save(&self, config: &TemplatingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let path = self.path().ok_or(ConfigError::NoConfigDir)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, to_json_stable_bytes(config)?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn default_path_is_valid() {
        if let Some(p) = ConfigRepository::default_path() {
            assert!(p.ends_with("tessera/config.json"));
        }
    }

    #[tokio::test]
    async fn load_returns_default_when_no_file() {
        let dir = TempDir::new().unwrap();
        let repo = ConfigRepository::at(dir.path().join("config.json"));
        assert_eq!(repo.load().await.unwrap(), TemplatingConfig::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = ConfigRepository::at(dir.path().join("nested").join("config.json"));
        let config = TemplatingConfig {
            ignored_plugins: vec!["tessera-plugin-cookie".to_string()],
            max_render_depth: 3,
            ..TemplatingConfig::default()
        };

        repo.save(&config).await.unwrap();
        let text = std::fs::read_to_string(repo.path().unwrap()).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(repo.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_render_depth": 2}"#).unwrap();
        let config = ConfigRepository::at(&path).load().await.unwrap();
        assert_eq!(config.max_render_depth, 2);
        assert_eq!(config.ignored_plugins.len(), 3);
    }

    #[tokio::test]
    async fn invalid_syntax_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"syntax": {"variable_start": ""}}"#).unwrap();
        assert!(matches!(
            ConfigRepository::at(&path).load().await,
            Err(ConfigError::Invalid(_))
        ));
    }
}
