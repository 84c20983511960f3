// ABOUTME: Main library entry point for the MarketScope market-intelligence chat API
// ABOUTME: Wires the answer-streaming pipeline, data corpus, and HTTP routes together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

#![deny(unsafe_code)]

//! # MarketScope Server
//!
//! A chat backend for home-appliance market intelligence. Natural-language
//! questions are enriched with context drawn from in-memory market datasets
//! and document corpora, dispatched to an LLM completion provider, and the
//! answer is returned once or streamed as typed events alongside extracted
//! chart configurations.
//!
//! ## Architecture
//!
//! - **`llm`**: Provider abstraction and the OpenAI-compatible client with
//!   retrying single-shot and streaming completion calls
//! - **`chat`**: The answer pipeline core - pending-question store, stream
//!   demultiplexer, and orchestrator
//! - **`data`**: Market datasets, chart configuration builders, and the
//!   region document library
//! - **`routes`**: Axum HTTP handlers for the chat and data surfaces
//! - **`server`**: Resource container and router assembly
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marketscope_server::config::environment::ServerConfig;
//! use marketscope_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!(
//!         "MarketScope server configured with port: HTTP={}",
//!         config.http_port
//!     );
//!     Ok(())
//! }
//! ```

/// Answer pipeline core: pending-question store, stream demultiplexer, orchestrator
pub mod chat;

/// Configuration management (environment-only)
pub mod config;

/// Context retrieval over the market corpus for prompt enrichment
pub mod context;

/// Market datasets, chart builders, and document corpora
pub mod data;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction and completion client
pub mod llm;

/// Logging configuration and structured logging setup
pub mod logging;

/// HTTP route handlers
pub mod routes;

/// Server resource container and router assembly
pub mod server;

/// Web search supplement for additional market intelligence
pub mod websearch;
