// ABOUTME: HTTP route handlers grouped by surface area
// ABOUTME: Chat pipeline endpoints, data lookup endpoints, and health checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! HTTP route handlers

/// Chat question/answer endpoints including the SSE stream
pub mod chat;

/// Non-LLM data lookup and chart endpoints
pub mod data;

/// Health check endpoints
pub mod health;
