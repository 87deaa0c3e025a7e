// ABOUTME: Database configuration types for SQLite file and in-memory connections
// ABOUTME: Parses DATABASE_URL and pool sizing settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::env_config;
use crate::errors::{AppError, AppResult};

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for URL schemes other than `sqlite:`
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let trimmed = s.trim();
        if let Some(path_str) = trimmed.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str.is_empty() {
                return Err(AppError::config_invalid("DATABASE_URL has an empty path"));
            }
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if trimmed.contains("://") {
            Err(AppError::config_invalid(format!(
                "Unsupported DATABASE_URL scheme: {trimmed}"
            )))
        } else if trimmed.is_empty() {
            Err(AppError::config_invalid("DATABASE_URL is empty"))
        } else {
            // Bare paths are treated as SQLite files
            Ok(Self::SQLite {
                path: PathBuf::from(trimmed),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/levelup.db"),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Pool size for file-backed databases (memory databases always use one)
    pub max_connections: u32,
    /// Attempts for transactions that hit lock contention
    pub max_retries: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: env_config::DEFAULT_MAX_CONNECTIONS,
            max_retries: env_config::DEFAULT_MAX_RETRIES,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for an in-memory database
    #[must_use]
    pub fn memory() -> Self {
        Self {
            url: DatabaseUrl::Memory,
            ..Self::default()
        }
    }

    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a variable is present but malformed
    pub fn from_env() -> AppResult<Self> {
        let url = DatabaseUrl::parse_url(&env_var_or(
            "DATABASE_URL",
            env_config::DEFAULT_DATABASE_URL,
        ))?;
        let max_connections: u32 = parse_env(
            "DATABASE_MAX_CONNECTIONS",
            env_config::DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(AppError::config_invalid(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }
        Ok(Self {
            url,
            max_connections,
            max_retries: parse_env("DATABASE_MAX_RETRIES", env_config::DEFAULT_MAX_RETRIES)?,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config_invalid(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_urls() {
        assert_eq!(
            DatabaseUrl::parse_url("sqlite::memory:").unwrap(),
            DatabaseUrl::Memory
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/levelup.db").unwrap(),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/levelup.db")
            }
        );
        assert_eq!(
            DatabaseUrl::parse_url("levelup.db").unwrap().to_connection_string(),
            "sqlite:levelup.db"
        );
    }

    #[test]
    fn test_reject_foreign_schemes() {
        let err = DatabaseUrl::parse_url("postgres://localhost/levelup").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::ConfigInvalid);
    }
}
