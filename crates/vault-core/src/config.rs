//! Vault configuration
//!
//! Read once at startup from `VAULT_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use vault_model::{clamp_rows, DEFAULT_TITLE, MAX_ROWS};
use vault_storage::{BackendKind, Database};

use crate::error::VaultError;
use crate::Result;

pub const ENV_BACKEND: &str = "VAULT_BACKEND";
pub const ENV_DATABASE_PATH: &str = "VAULT_DATABASE_PATH";
pub const ENV_DATABASE_URL: &str = "VAULT_DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "VAULT_MAX_CONNECTIONS";
pub const ENV_DEFAULT_ROWS: &str = "VAULT_DEFAULT_ROWS";
pub const ENV_DEFAULT_TITLE: &str = "VAULT_DEFAULT_TITLE";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which SQL engine holds the vaults
    pub backend: BackendKind,
    /// Path to the embedded database file
    pub database_path: PathBuf,
    /// Connection URL for the MySQL / PostgreSQL backends
    pub database_url: Option<String>,
    /// Pool size for the client/server backends
    pub max_connections: u32,
    /// Rows used when a player has no stored vault yet
    pub default_rows: u8,
    /// Title used when none is stored
    pub default_title: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            backend: BackendKind::default(),
            database_path: data_dir.join("vault.db"),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            default_rows: MAX_ROWS,
            default_title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source; missing or unusable values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(data_dir(&lookup));

        config.backend = BackendKind::select(lookup(ENV_BACKEND).as_deref());

        if let Some(path) = non_blank(lookup(ENV_DATABASE_PATH)) {
            config.database_path = PathBuf::from(path);
        }

        config.database_url = non_blank(lookup(ENV_DATABASE_URL));

        if let Some(raw) = non_blank(lookup(ENV_MAX_CONNECTIONS)) {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_MAX_CONNECTIONS),
            }
        }

        if let Some(raw) = non_blank(lookup(ENV_DEFAULT_ROWS)) {
            match raw.parse::<i64>() {
                Ok(rows) => config.default_rows = clamp_rows(rows),
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_DEFAULT_ROWS),
            }
        }

        if let Some(title) = non_blank(lookup(ENV_DEFAULT_TITLE)) {
            config.default_title = title;
        }

        config
    }

    /// Open the configured backend. The embedded file's directory is created if needed.
    pub fn open_database(&self) -> Result<Database> {
        match self.backend {
            BackendKind::Sqlite => {
                if let Some(parent) = self.database_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                tracing::info!(path = %self.database_path.display(), "Opening embedded vault database");
                Ok(Database::open(&self.database_path)?)
            }
            backend => {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    VaultError::Config(format!("{} is required for the {} backend", ENV_DATABASE_URL, backend))
                })?;
                Ok(Database::connect(backend, url, self.max_connections)?)
            }
        }
    }

    pub fn database_dir(&self) -> Option<&Path> {
        self.database_path.parent()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(data_dir(&|key: &str| std::env::var(key).ok()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// XDG data directory, then `~/.local/share`, then a local fallback
fn data_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .or_else(|| non_blank(lookup("HOME")).map(|h| PathBuf::from(h).join(".local/share")))
        .map(|d| d.join("vault"))
        .unwrap_or_else(|| PathBuf::from(".vault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.default_rows, 6);
        assert_eq!(config.default_title, "Vault");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.database_path, PathBuf::from(".vault/vault.db"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_data_dir_follows_xdg_then_home() {
        let config = config_from(&[("HOME", "/home/steve")]);
        assert_eq!(
            config.database_path,
            PathBuf::from("/home/steve/.local/share/vault/vault.db")
        );

        let config = config_from(&[("HOME", "/home/steve"), ("XDG_DATA_HOME", "/data")]);
        assert_eq!(config.database_path, PathBuf::from("/data/vault/vault.db"));
    }

    #[test]
    fn test_backend_is_case_insensitive() {
        assert_eq!(config_from(&[("VAULT_BACKEND", "MySQL")]).backend, BackendKind::MySql);
        assert_eq!(
            config_from(&[("VAULT_BACKEND", " postgres ")]).backend,
            BackendKind::PostgreSql
        );
    }

    #[test]
    fn test_unknown_backend_falls_back_to_sqlite() {
        let config = config_from(&[("VAULT_BACKEND", "oracle")]);
        assert_eq!(config.backend, BackendKind::Sqlite);
    }

    #[test]
    fn test_rows_and_title_overrides() {
        let config = config_from(&[("VAULT_DEFAULT_ROWS", "12"), ("VAULT_DEFAULT_TITLE", "Stash")]);
        assert_eq!(config.default_rows, 6);
        assert_eq!(config.default_title, "Stash");

        let config = config_from(&[("VAULT_DEFAULT_ROWS", "0"), ("VAULT_DEFAULT_TITLE", "   ")]);
        assert_eq!(config.default_rows, 1);
        assert_eq!(config.default_title, "Vault");

        let config = config_from(&[("VAULT_DEFAULT_ROWS", "many")]);
        assert_eq!(config.default_rows, 6);
    }

    #[test]
    fn test_invalid_pool_size_is_ignored() {
        assert_eq!(config_from(&[("VAULT_MAX_CONNECTIONS", "0")]).max_connections, 5);
        assert_eq!(config_from(&[("VAULT_MAX_CONNECTIONS", "16")]).max_connections, 16);
    }

    #[test]
    fn test_server_backend_requires_url() {
        let config = config_from(&[("VAULT_BACKEND", "postgresql")]);
        let err = config.open_database().unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_open_embedded_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/dir");
        let config = config_from(&[(
            "VAULT_DATABASE_PATH",
            nested.join("vault.db").to_str().unwrap(),
        )]);

        let db = config.open_database().unwrap();
        assert_eq!(db.backend(), BackendKind::Sqlite);
        assert!(nested.exists());
        assert_eq!(config.database_dir(), Some(nested.as_path()));
    }
}
