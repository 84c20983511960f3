// ABOUTME: OpenAI chat-completions provider implementation with streaming support
// ABOUTME: Single-shot and SSE streaming calls against the OpenAI-compatible API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # OpenAI Provider
//!
//! Implementation of the `LlmProvider` trait for the OpenAI chat-completions
//! API. Any OpenAI-compatible endpoint works by overriding the base URL
//! (`OPENAI_BASE_URL`), which covers Ollama, vLLM, and similar gateways.
//!
//! ## Configuration
//!
//! - `OPENAI_API_KEY`: API key (required)
//! - `OPENAI_API_ORG`: organization id (optional)
//! - `OPENAI_BASE_URL`: API endpoint (default `https://api.openai.com/v1`)
//! - `OPENAI_MODEL`: default model (default `gpt-4o-mini`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::sse_parser::create_sse_stream;
use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider, StreamChunk,
    TokenUsage,
};
use crate::config::LlmConfig;
use crate::errors::AppError;

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Models known to work with the chat pipeline
const AVAILABLE_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "gpt-4.1"];

/// Default base URL for the OpenAI API
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Chat completion request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Message structure for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// Chat completion response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

/// Choice in a completion response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in a completion response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Usage statistics in a completion response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Streaming chunk structure
#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

/// Choice in a streaming chunk
#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

/// API error response
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: String,
    /// Optional organization id sent as `OpenAI-Organization`
    pub organization: Option<String>,
    /// Base URL of the API
    pub base_url: String,
    /// Default model
    pub default_model: String,
}

impl OpenAiConfig {
    /// Build provider configuration from the server's LLM settings
    #[must_use]
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            organization: config.organization.clone(),
            base_url: config.base_url.clone(),
            default_model: config.model.clone(),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new provider with the given configuration
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a provider from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AppError::config(
                "Missing OPENAI_API_KEY environment variable. \
                 Get your API key from https://platform.openai.com/api-keys",
            )
        })?;

        Ok(Self::new(OpenAiConfig {
            api_key,
            organization: std::env::var("OPENAI_API_ORG").ok(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
            default_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_owned()),
        }))
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    /// Convert internal messages to API format
    fn convert_messages(messages: &[ChatMessage]) -> Vec<OpenAiMessage> {
        messages.iter().map(OpenAiMessage::from).collect()
    }

    /// Apply auth headers to a request builder
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Authorization", format!("Bearer {}", self.config.api_key));
        match &self.config.organization {
            Some(org) => builder.header("OpenAI-Organization", org),
            None => builder,
        }
    }

    /// Parse an error response body into an `AppError`
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());

            match status.as_u16() {
                401 => AppError::external_service(
                    "OpenAI",
                    format!("authentication failed: {}", error_response.error.message),
                ),
                429 => AppError::external_service(
                    "OpenAI",
                    format!("rate limit exceeded: {}", error_response.error.message),
                ),
                400 => AppError::invalid_input(format!(
                    "OpenAI API validation error: {}",
                    error_response.error.message
                )),
                _ => AppError::external_service(
                    "OpenAI",
                    format!("{} - {}", error_type, error_response.error.message),
                ),
            }
        } else {
            AppError::external_service(
                "OpenAI",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }

    /// Parse a single streaming JSON payload into a `StreamChunk`
    fn parse_stream_data(json_str: &str) -> Option<Result<StreamChunk, AppError>> {
        match serde_json::from_str::<OpenAiStreamChunk>(json_str) {
            Ok(chunk) => {
                let choice = chunk.choices.into_iter().next()?;
                Some(Ok(StreamChunk {
                    delta: choice.delta.content.unwrap_or_default(),
                    is_final: choice.finish_reason.is_some(),
                    finish_reason: choice.finish_reason,
                }))
            }
            Err(e) => {
                warn!("Failed to parse OpenAI stream chunk: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::STREAMING | LlmCapabilities::SYSTEM_MESSAGES | LlmCapabilities::JSON_MODE
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn available_models(&self) -> &'static [&'static str] {
        AVAILABLE_MODELS
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        debug!("Sending chat completion request to OpenAI");

        let api_request = OpenAiRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: Some(false),
        };

        let response = self
            .authorize(self.client.post(self.api_url("chat/completions")))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to OpenAI API: {}", e);
                AppError::external_service("OpenAI", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read OpenAI API response: {}", e);
            AppError::external_service("OpenAI", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse OpenAI API response: {}", e);
            AppError::external_service("OpenAI", format!("Failed to parse response: {e}"))
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("OpenAI", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from OpenAI: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: api_response.model,
            usage: api_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        debug!("Sending streaming chat completion request to OpenAI");

        let api_request = OpenAiRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: Some(true),
        };

        let response = self
            .authorize(self.client.post(self.api_url("chat/completions")))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send streaming request to OpenAI API: {}", e);
                AppError::external_service("OpenAI", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        Ok(create_sse_stream(
            response.bytes_stream(),
            Self::parse_stream_data,
            "OpenAI",
        ))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        debug!("Performing OpenAI API health check");

        // The models endpoint is a lightweight authenticated call
        let response = self
            .authorize(self.client.get(self.api_url("models")))
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI health check failed: {}", e);
                AppError::external_service("OpenAI", format!("Health check failed: {e}"))
            })?;

        let healthy = response.status().is_success();

        if !healthy {
            warn!(
                "OpenAI API health check failed with status: {}",
                response.status()
            );
        }

        Ok(healthy)
    }
}
