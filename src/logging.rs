// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels and output formats from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Production-ready logging configuration with structured output

use anyhow::Result;
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter directive (e.g. `info`, `marketscope_server=debug`)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            service_name: "marketscope-server".into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        Self {
            level,
            format,
            ..Self::default()
        }
    }

    /// Initialize the global tracing subscriber from this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a subscriber has already been installed or the
    /// filter directive cannot be parsed.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.level)?;

        match self.format {
            LogFormat::Json => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_current_span(false)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))?;
            }
            LogFormat::Pretty => {
                fmt()
                    .with_env_filter(filter)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))?;
            }
            LogFormat::Compact => {
                fmt()
                    .compact()
                    .with_env_filter(filter)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))?;
            }
        }

        Ok(())
    }
}

/// Initialize logging from environment variables (`RUST_LOG`, `LOG_FORMAT`)
///
/// # Errors
///
/// Returns an error if subscriber installation fails.
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
