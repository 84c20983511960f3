// ABOUTME: Completion client wrapping a provider with context enrichment and retries
// ABOUTME: Prepends the system prompt plus retrieved data context before every dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Completion Client
//!
//! The completion client sits between the answer orchestrator and the raw
//! `LlmProvider`. Every dispatch - single-shot or streaming - gets the fixed
//! market-analyst system instruction plus a data-context excerpt built from
//! the most recent user message.
//!
//! The single-shot path is retried with randomized exponential backoff;
//! exhausting retries surfaces the last provider error. The streaming path is
//! never retried past the initial request: once tokens flow, the consumer may
//! have already seen partial output.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::sse_parser::RetryConfig;
use super::{get_market_system_prompt, ChatMessage, ChatRequest, ChatStream, LlmProvider};
use crate::context::ContextRetriever;
use crate::errors::AppError;

/// Completion client with context enrichment and retry policy
pub struct CompletionClient {
    provider: Arc<dyn LlmProvider>,
    retriever: Arc<ContextRetriever>,
    retry: RetryConfig,
    model: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    /// Create a new completion client
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, retriever: Arc<ContextRetriever>) -> Self {
        Self {
            provider,
            retriever,
            retry: RetryConfig::default_config(),
            model: None,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    /// Override the model used for completions
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the sampling parameters
    #[must_use]
    pub const fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Build the full message list: system prompt + data context + conversation
    ///
    /// The data context is derived from the most recent user message. Context
    /// retrieval cannot fail - the retriever degrades to a diagnostic string -
    /// so enrichment never blocks a completion.
    fn enrich(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut system = get_market_system_prompt().to_owned();

        if let Some(last) = messages.last() {
            if last.role == super::MessageRole::User {
                let context = self.retriever.build_context(&last.content);
                system.push_str("\n\n## Current Data Context:\n");
                system.push_str(&context);
            }
        }

        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(ChatMessage::system(system));
        full.extend_from_slice(messages);
        full
    }

    /// Build the provider request for the given conversation
    fn build_request(&self, messages: &[ChatMessage]) -> ChatRequest {
        let mut request = ChatRequest::new(self.enrich(messages))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        request
    }

    /// Perform a single-shot completion with retries
    ///
    /// # Errors
    ///
    /// Returns the last provider error after exhausting all attempts.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let request = self.build_request(messages);

        let mut last_error = None;
        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for_attempt(attempt - 1);
                debug!(
                    "Retrying completion (attempt {}/{}) after {:?}",
                    attempt + 1,
                    self.retry.max_attempts,
                    delay
                );
                sleep(delay).await;
            }

            match self.provider.complete(&request).await {
                Ok(response) => return Ok(response.content),
                Err(e) => {
                    warn!(
                        "Completion attempt {}/{} failed: {}",
                        attempt + 1,
                        self.retry.max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::external_service("completion", "no attempts were made")))
    }

    /// Start a streaming completion
    ///
    /// # Errors
    ///
    /// Returns an error if the initial streaming request fails.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<ChatStream, AppError> {
        let request = self.build_request(messages).with_streaming();
        self.provider.complete_stream(&request).await
    }
}
