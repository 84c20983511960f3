// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the market-analyst system prompt for answer generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

/// Market intelligence analyst system prompt
///
/// Contains instructions for the assistant including:
/// - Role and communication style
/// - Available datasets and their metrics
/// - Response structure guidelines
/// - Chart configuration format requirements
pub const MARKET_SYSTEM_PROMPT: &str = include_str!("market_analyst.md");

/// Get the system prompt for the market intelligence assistant
///
/// This prompt is prepended to every completion dispatch, ahead of the
/// retrieved data context.
#[must_use]
pub const fn get_market_system_prompt() -> &'static str {
    MARKET_SYSTEM_PROMPT
}
