// ABOUTME: Shared test utilities - stub completion providers and fixture resources
// ABOUTME: Provides corpus fixtures and orchestrator/router construction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `marketscope_server`

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use marketscope_server::chat::{AnswerOrchestrator, QuestionStore};
use marketscope_server::config::{LlmConfig, ServerConfig};
use marketscope_server::context::ContextRetriever;
use marketscope_server::data::{
    DocumentLibrary, IntelligenceRecord, MarketCorpus, TimeseriesRecord, TrendRecord,
};
use marketscope_server::errors::AppError;
use marketscope_server::llm::sse_parser::RetryConfig;
use marketscope_server::llm::{
    ChatRequest, ChatResponse, ChatStream, CompletionClient, LlmCapabilities, LlmProvider,
    StreamChunk,
};
use marketscope_server::server::ServerResources;

// ============================================================================
// Stub Providers
// ============================================================================

/// Echoes the dispatched conversation back as the answer
pub struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn display_name(&self) -> &'static str {
        "Echo Stub"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "echo-1"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["echo-1"]
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let content = request
            .messages
            .iter()
            .map(|m| format!("[{}] {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ChatResponse {
            content,
            model: "echo-1".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let content = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(fragment_stream(vec![content]))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Streams a fixed fragment script
pub struct ScriptedProvider {
    pub fragments: Vec<String>,
}

impl ScriptedProvider {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Stub"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["scripted-1"]
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Ok(ChatResponse {
            content: self.fragments.concat(),
            model: "scripted-1".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn complete_stream(&self, _request: &ChatRequest) -> Result<ChatStream, AppError> {
        Ok(fragment_stream(self.fragments.clone()))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Streams some fragments, then fails mid-stream
pub struct BrokenStreamProvider {
    pub fragments: Vec<String>,
}

impl BrokenStreamProvider {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

#[async_trait]
impl LlmProvider for BrokenStreamProvider {
    fn name(&self) -> &'static str {
        "broken-stream"
    }

    fn display_name(&self) -> &'static str {
        "Broken Stream Stub"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "broken-1"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["broken-1"]
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Err(AppError::external_service("stub", "complete not supported"))
    }

    async fn complete_stream(&self, _request: &ChatRequest) -> Result<ChatStream, AppError> {
        let mut items: Vec<Result<StreamChunk, AppError>> = self
            .fragments
            .iter()
            .map(|f| Ok(chunk(f)))
            .collect();
        items.push(Err(AppError::external_service("stub", "connection reset")));
        Ok(Box::pin(stream::iter(items)))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Fails every completion call; counts attempts
pub struct FailingProvider {
    pub attempts: AtomicU32,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self {
            attempts: AtomicU32::new(0),
        }
    }
}

impl Default for FailingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn display_name(&self) -> &'static str {
        "Failing Stub"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "failing-1"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["failing-1"]
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        Err(AppError::external_service(
            "stub",
            format!("simulated failure #{n}"),
        ))
    }

    async fn complete_stream(&self, _request: &ChatRequest) -> Result<ChatStream, AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::external_service("stub", "simulated stream failure"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

fn chunk(delta: &str) -> StreamChunk {
    StreamChunk {
        delta: delta.to_owned(),
        is_final: false,
        finish_reason: None,
    }
}

fn fragment_stream(fragments: Vec<String>) -> ChatStream {
    let items: Vec<Result<StreamChunk, AppError>> =
        fragments.iter().map(|f| Ok(chunk(f))).collect();
    Box::pin(stream::iter(items))
}

// ============================================================================
// Fixtures
// ============================================================================

/// A small corpus with one row per dataset
pub fn sample_corpus() -> MarketCorpus {
    MarketCorpus::from_records(
        vec![IntelligenceRecord {
            region: "Germany".to_owned(),
            year: 2024,
            consumer_affinity_score: 7.2,
            online_search_index: 148.0,
            ecommerce_ad_effectiveness: 11.4,
            social_media_sentiment: 64.0,
        }],
        vec![TrendRecord {
            region: "Germany".to_owned(),
            category: "Refrigerators".to_owned(),
            sub_category: "300-400L".to_owned(),
            year: 2024,
            market_size_units_millions: 3.4,
            market_value_usd_billions: 2.1,
            yoy_growth_pct: 4.5,
            cagr_5y_forecast_pct: 3.8,
            key_drivers: "Energy efficiency, smart features".to_owned(),
        }],
        vec![TimeseriesRecord {
            region: "Germany".to_owned(),
            category: "Refrigerators".to_owned(),
            sub_category: "300-400L".to_owned(),
            year: 2024,
            units_sold_millions: 3.1,
            average_selling_price_usd: 618.0,
        }],
    )
}

/// Retry policy with millisecond delays to keep tests fast
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 5,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Build an orchestrator over the sample corpus and the given provider
pub fn build_orchestrator(provider: Arc<dyn LlmProvider>) -> AnswerOrchestrator {
    let corpus = Arc::new(sample_corpus());
    let retriever = Arc::new(ContextRetriever::new(corpus));
    let completion = CompletionClient::new(provider, retriever).with_retry(fast_retry());
    let store = Arc::new(QuestionStore::new(64));
    AnswerOrchestrator::new(store, Arc::new(completion))
}

/// Configuration fixture that never reads the environment
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        cors_origin: None,
        data_dir: PathBuf::from("data"),
        store_capacity: 64,
        llm: LlmConfig {
            api_key: "test-key".to_owned(),
            organization: None,
            base_url: "http://localhost:9".to_owned(),
            model: "echo-1".to_owned(),
            temperature: 0.3,
            max_tokens: 2000,
        },
    }
}

/// Full resource container backed by stubs, for router tests
pub fn test_resources(provider: Arc<dyn LlmProvider>) -> Arc<ServerResources> {
    Arc::new(
        ServerResources::new(
            test_config(),
            sample_corpus(),
            DocumentLibrary::empty(),
            provider,
        )
        .unwrap(),
    )
}
