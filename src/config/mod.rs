// ABOUTME: Configuration module root re-exporting environment-based settings
// ABOUTME: All configuration is sourced from environment variables, never files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Configuration management

/// Environment-based configuration for production deployment
pub mod environment;

pub use environment::{LlmConfig, ServerConfig};
