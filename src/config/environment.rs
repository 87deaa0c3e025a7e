// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads server, auth and ledger policy settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management

use std::env;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::FixedOffset;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::database::DatabaseConfig;
use crate::constants::env_config;
use crate::errors::{AppError, AppResult};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational (default)
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(level)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
}

impl AuthConfig {
    /// Load auth configuration
    ///
    /// `JWT_SECRET` is mandatory in production. Other environments fall back
    /// to a random per-process secret, so tokens do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing production secret and
    /// `ConfigInvalid` for a short secret or a non-positive expiry
    pub fn from_env(environment: Environment) -> AppResult<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= env_config::MIN_JWT_SECRET_LEN => secret,
            Ok(_) => {
                return Err(AppError::config_invalid(format!(
                    "JWT_SECRET must be at least {} characters",
                    env_config::MIN_JWT_SECRET_LEN
                )))
            }
            Err(_) if environment.is_production() => {
                return Err(AppError::config("JWT_SECRET is required in production"))
            }
            Err(_) => {
                warn!("JWT_SECRET not set, generating an ephemeral development secret");
                generate_secret()
            }
        };

        let jwt_expiry_hours: i64 =
            parse_env("JWT_EXPIRY_HOURS", env_config::DEFAULT_JWT_EXPIRY_HOURS)?;
        if jwt_expiry_hours <= 0 {
            return Err(AppError::config_invalid(
                "JWT_EXPIRY_HOURS must be positive",
            ));
        }

        Ok(Self {
            jwt_secret,
            jwt_expiry_hours,
        })
    }
}

fn generate_secret() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Administrator created at startup when `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBootstrap {
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Initial password
    #[serde(skip_serializing)]
    pub password: String,
}

impl AdminBootstrap {
    /// Read the bootstrap administrator, `None` unless both email and password are set
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty())?;
        let password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            username: env_var_or("ADMIN_USERNAME", "admin"),
            email,
            password,
        })
    }
}

/// Progression ledger policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Offset from UTC, in minutes, that defines the calendar day boundary
    pub day_offset_minutes: i32,
    /// Credit the debited points back when a redemption is rejected
    pub refund_on_reject: bool,
    /// Restart the streak at 1 when the previous day's quest was missed
    pub streak_reset_on_missed_day: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            day_offset_minutes: 0,
            refund_on_reject: false,
            streak_reset_on_missed_day: false,
        }
    }
}

impl LedgerConfig {
    /// Load ledger policy from environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for malformed values or an offset beyond +/-14h
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        let day_offset_minutes: i32 =
            parse_env("LEDGER_DAY_OFFSET_MINUTES", defaults.day_offset_minutes)?;
        let config = Self {
            day_offset_minutes,
            refund_on_reject: parse_env("REDEMPTION_REFUND_ON_REJECT", defaults.refund_on_reject)?,
            streak_reset_on_missed_day: parse_env(
                "STREAK_RESET_ON_MISSED_DAY",
                defaults.streak_reset_on_missed_day,
            )?,
        };
        config.day_offset()?;
        Ok(config)
    }

    /// Timezone offset used to derive calendar days
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the offset is out of range
    pub fn day_offset(&self) -> AppResult<FixedOffset> {
        if self.day_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::config_invalid(format!(
                "LEDGER_DAY_OFFSET_MINUTES out of range: {}",
                self.day_offset_minutes
            )));
        }
        FixedOffset::east_opt(self.day_offset_minutes * 60).ok_or_else(|| {
            AppError::config_invalid(format!(
                "LEDGER_DAY_OFFSET_MINUTES out of range: {}",
                self.day_offset_minutes
            ))
        })
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Database settings
    pub database: DatabaseConfig,
    /// Token settings
    pub auth: AuthConfig,
    /// Ledger policy
    pub ledger: LedgerConfig,
    /// Startup administrator
    pub admin_bootstrap: Option<AdminBootstrap>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when any section fails to parse
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let environment = Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));
        let config = Self {
            http_port: parse_env("HTTP_PORT", env_config::DEFAULT_HTTP_PORT)?,
            environment,
            log_level: LogLevel::from_str_or_default(&env_var_or("RUST_LOG", "info")),
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env(environment)?,
            ledger: LedgerConfig::from_env()?,
            admin_bootstrap: AdminBootstrap::from_env(),
        };

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Level Up Fitness Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Token Expiry: {}h\n\
             - Day Offset: {} min\n\
             - Refund On Reject: {}\n\
             - Streak Reset On Missed Day: {}\n\
             - Admin Bootstrap: {}",
            self.http_port,
            self.environment,
            self.log_level,
            if self.database.url.is_memory() {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            self.auth.jwt_expiry_hours,
            self.ledger.day_offset_minutes,
            self.ledger.refund_on_reject,
            self.ledger.streak_reset_on_missed_day,
            self.admin_bootstrap
                .as_ref()
                .map_or("disabled", |admin| admin.email.as_str()),
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
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
