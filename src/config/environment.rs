// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, ports, data paths, and LLM provider settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Environment-based configuration management for production deployment

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default HTTP port when `HTTP_PORT` is unset
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default pending-question store capacity when `QUESTION_STORE_CAPACITY` is unset
const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// Default data directory when `MARKET_DATA_DIR` is unset
const DEFAULT_DATA_DIR: &str = "data";

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the completion provider
    pub api_key: String,
    /// Optional organization identifier sent alongside the key
    pub organization: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Default model for completions
    pub model: String,
    /// Sampling temperature for completions
    pub temperature: f32,
    /// Token generation limit per completion
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Load LLM settings from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            AppError::new(
                crate::errors::ErrorCode::ConfigMissing,
                "Missing OPENAI_API_KEY environment variable",
            )
        })?;

        Ok(Self {
            api_key,
            organization: env::var("OPENAI_API_ORG").ok(),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_owned()),
            temperature: parse_env_or("OPENAI_TEMPERATURE", 0.3),
            max_tokens: parse_env_or("OPENAI_MAX_TOKENS", 2000),
        })
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the API
    pub http_port: u16,
    /// Allowed CORS origin (`*` when unset, matching the original deployment)
    pub cors_origin: Option<String>,
    /// Directory holding the market CSV datasets and region document folders
    pub data_dir: PathBuf,
    /// Maximum number of pending questions retained before LRU eviction
    pub store_capacity: usize,
    /// LLM provider settings
    pub llm: LlmConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or unparsable.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            http_port: parse_env_or("HTTP_PORT", DEFAULT_HTTP_PORT),
            cors_origin: env::var("FRONT_URL").ok(),
            data_dir: env::var("MARKET_DATA_DIR")
                .map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            store_capacity: parse_env_or("QUESTION_STORE_CAPACITY", DEFAULT_STORE_CAPACITY),
            llm: LlmConfig::from_env()?,
        })
    }

    /// One-line configuration summary for startup logging (secrets excluded)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} data_dir={} store_capacity={} model={} base_url={}",
            self.http_port,
            self.data_dir.display(),
            self.store_capacity,
            self.llm.model,
            self.llm.base_url,
        )
    }
}

/// Parse an environment variable, falling back to a default on absence or parse failure
fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_or_default() {
        assert_eq!(parse_env_or("MARKETSCOPE_UNSET_VAR", 42_u16), 42);
    }

    #[test]
    fn test_summary_excludes_secrets() {
        let config = ServerConfig {
            http_port: 8080,
            cors_origin: None,
            data_dir: PathBuf::from("data"),
            store_capacity: 100,
            llm: LlmConfig {
                api_key: "sk-secret".to_owned(),
                organization: None,
                base_url: "https://api.openai.com/v1".to_owned(),
                model: "gpt-4o-mini".to_owned(),
                temperature: 0.3,
                max_tokens: 2000,
            },
        };
        assert!(!config.summary().contains("sk-secret"));
    }
}
