//! Configuration for the catalog.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::tally::WritePolicy;

/// Catalog configuration, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root directory of the document store.
    pub data_dir: PathBuf,

    /// Tools shown per page of a listing.
    pub page_size: usize,

    /// How read-modify-write updates are written back.
    pub write_policy: WritePolicy,

    /// User acting when none is given on the command line.
    pub user: Option<String>,
}

impl CatalogConfig {
    /// Create a configuration storing data under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            page_size: 20,
            write_policy: WritePolicy::default(),
            user: None,
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the write policy.
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Set the default user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))?;
        config.page_size = config.page_size.max(1);
        Ok(config)
    }

    /// Load from `path`, falling back to defaults if the file is missing.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CatalogError::Config(format!("{}: {e}", path.display()))),
        }
    }

    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("wairehouse/config.toml")
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(dirs::data_dir().unwrap_or_default().join("wairehouse"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CatalogConfig::from_toml(
            r#"
            data_dir = "/srv/wairehouse"
            write_policy = "check_version"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/wairehouse"));
        assert_eq!(config.write_policy, WritePolicy::CheckVersion);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.user, None);
    }

    #[test]
    fn test_builders() {
        let config = CatalogConfig::new("/tmp/wairehouse")
            .with_page_size(0)
            .with_write_policy(WritePolicy::CheckVersion)
            .with_user("u1");

        assert_eq!(config.page_size, 1);
        assert_eq!(config.write_policy, WritePolicy::CheckVersion);
        assert_eq!(config.user.as_deref(), Some("u1"));

        let reparsed = CatalogConfig::from_toml(&toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_invalid_toml() {
        let result = CatalogConfig::from_toml("page_size = \"many\"");
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = CatalogConfig::load(temp_dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[tokio::test]
    async fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        tokio::fs::write(&path, "page_size = 5\nuser = \"u1\"\n")
            .await
            .unwrap();

        let config = CatalogConfig::load(&path).await.unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.user.as_deref(), Some("u1"));
    }
}
