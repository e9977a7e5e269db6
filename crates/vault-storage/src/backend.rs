//! Backend selection
//!
//! The backend is picked once at startup from a configuration string.
//! Anything unrecognized falls back to the embedded SQLite file.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded single-file database
    #[default]
    Sqlite,
    MySql,
    #[serde(alias = "postgres")]
    PostgreSql,
}

impl BackendKind {
    /// Resolve a configured backend name, never failing
    pub fn select(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => BackendKind::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    requested = %raw,
                    fallback = %BackendKind::default(),
                    "Unknown database backend, falling back"
                );
                BackendKind::default()
            }),
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            BackendKind::Sqlite => Dialect::Sqlite,
            BackendKind::MySql => Dialect::MySql,
            BackendKind::PostgreSql => Dialect::PostgreSql,
        }
    }

    /// Whether this backend runs in-process
    pub fn is_embedded(&self) -> bool {
        matches!(self, BackendKind::Sqlite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::MySql => "mysql",
            BackendKind::PostgreSql => "postgresql",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "mysql" => Ok(BackendKind::MySql),
            "postgresql" | "postgres" => Ok(BackendKind::PostgreSql),
            _ => Err(format!("Unknown database backend: {}", s)),
        }
    }
}
