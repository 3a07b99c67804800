//! Configuration loading and management.

use crate::types::{DEFAULT_PAGE_SIZE, SortBy, SortOrder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = "quadrant-tasks/config.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub listing: ListingConfig,
}

/// Storage and HTTP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP API listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("quadrant-tasks/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    31995
}

/// Defaults applied to task listings when the request leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration: explicit path, then project file, then user
    /// file, then defaults. Environment overrides are applied on top.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::candidate_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(Self::load)
                .transpose()?
                .unwrap_or_default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Config files searched when no explicit path is given, highest priority first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_CONFIG_PATH)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".quadrant-tasks").join("config.yaml"));
        }
        paths
    }

    /// Apply `QUADRANT_TASKS_*` overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("QUADRANT_TASKS_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(port) = lookup("QUADRANT_TASKS_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(size) = lookup("QUADRANT_TASKS_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            self.listing.page_size = size;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.db_path, default_db_path());
        assert_eq!(config.listing.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn listing_sort_parses_from_yaml() {
        let yaml = "listing:\n  sort_by: dueDate\n  sort_order: desc\n  page_size: 10\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listing.sort_by, SortBy::DueDate);
        assert_eq!(config.listing.sort_order, SortOrder::Desc);
        assert_eq!(config.listing.page_size, 10);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("QUADRANT_TASKS_DB_PATH", "/tmp/x.db"),
            ("QUADRANT_TASKS_PORT", "9000"),
            ("QUADRANT_TASKS_PAGE_SIZE", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.listing.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  db_path: data/tasks.db\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.db_path, PathBuf::from("data/tasks.db"));
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.db_path = dir.path().join("nested").join("tasks.db");
        config.ensure_db_dir().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
