// ABOUTME: Logging configuration and structured logging setup for the ledger service
// ABOUTME: Configures EnvFilter directives, output format and the startup banner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging configuration

use std::env;
use std::io;

use anyhow::Result;
use serde_json::json;
use tracing::{info, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::constants::service;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Base filter directive, e.g. `info` or `level_up_fitness=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include file and line numbers
    pub include_location: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Service name in the startup banner
    pub service_name: String,
    /// Service version in the startup banner
    pub service_version: String,
    /// Deployment environment name
    pub environment: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human readable multi-field output
    Pretty,
    /// Single-line output
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            service_name: service::SERVICE_NAME.into(),
            service_version: service::SERVICE_VERSION.into(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Build configuration from `RUST_LOG`, `LOG_FORMAT` and `ENVIRONMENT`
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| service::SERVICE_NAME.into()),
            service_version: service::SERVICE_VERSION.into(),
            environment,
        }
    }

    /// Build the filter with noise reduction for HTTP and database internals
    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(&self.level);
        for directive in ["hyper=warn", "hyper::proto=warn", "sqlx=warn", "tower_http=info"] {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
        filter
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Build the formatting layer for the configured format
    ///
    /// All formats honor the location and span settings.
    fn fmt_layer<S, W>(&self, writer: W) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_writer(writer)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Json => layer.with_target(true).json().boxed(),
            LogFormat::Pretty => layer.with_target(true).boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.fmt_layer(io::stdout))
            .try_init()?;

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Level Up Fitness server starting up"
        );

        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "spans": self.include_spans
            }
        });
        info!("Logging configured: {summary}");
    }
}

/// Initialize logging from environment variables
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.service_name, "level-up-fitness");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(config: &LoggingConfig) -> Vec<String> {
        let out = Captured::default();
        let subscriber = tracing_subscriber::registry().with(config.fmt_layer(out.clone()));
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("quest_award");
            let _entered = span.enter();
            info!("points credited");
        });
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_compact_format_honors_location_and_spans() {
        let quiet = LoggingConfig {
            format: LogFormat::Compact,
            ..LoggingConfig::default()
        };
        let lines = capture(&quiet);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains("logging.rs"));

        let verbose = LoggingConfig {
            format: LogFormat::Compact,
            include_location: true,
            include_spans: true,
            ..LoggingConfig::default()
        };
        let lines = capture(&verbose);
        // span open, the event itself, span close
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.contains("logging.rs")));
        assert!(lines.iter().any(|line| line.contains("points credited")));
    }

    #[test]
    fn test_every_format_honors_span_setting() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            let config = LoggingConfig {
                format,
                include_spans: true,
                ..LoggingConfig::default()
            };
            assert_eq!(config.span_events(), FmtSpan::NEW | FmtSpan::CLOSE);
            let joined = capture(&config).join("\n");
            assert!(joined.contains("quest_award"), "{format:?} dropped span events");
        }
    }
}
