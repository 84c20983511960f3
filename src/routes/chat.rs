// ABOUTME: Chat route handlers for question submission and answer generation
// ABOUTME: REST endpoints plus the SSE answer stream with typed event frames
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Chat routes
//!
//! Question submission returns an opaque id; the answer is generated on a
//! later call, once or as a Server-Sent-Events stream. Each SSE frame carries
//! one JSON-encoded stream event; a final `end` frame is appended by this
//! transport layer after the pipeline's own terminal event.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::info;
use uuid::Uuid;

use crate::chat::ConversationMessage;
use crate::errors::AppError;
use crate::server::ServerResources;

/// Pacing delay between SSE frames to smooth downstream consumption
const STREAM_PACING: Duration = Duration::from_millis(10);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to submit a question
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    /// The question text
    pub message: String,
    /// Prior conversation turns
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
}

/// Response for a submitted question
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionResponse {
    /// Opaque identifier for the stored question
    pub message_id: String,
    /// Submission status
    pub status: String,
    /// Human-readable confirmation
    pub message: String,
}

/// Request to generate the answer for a stored question
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Identifier returned at submission
    pub message_id: String,
}

/// Response with the generated answer
#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Identifier of the answered question
    pub message_id: String,
    /// The generated answer
    pub answer: String,
    /// Completion status
    pub status: String,
    /// Completion timestamp
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/question", post(Self::submit_question))
            .route("/api/chat/answer", post(Self::get_answer))
            .route("/api/chat/answer/stream", post(Self::get_answer_stream))
            .with_state(resources)
    }

    /// Parse a client-supplied message id
    ///
    /// An unparsable id is indistinguishable from an unknown one - both are
    /// identifiers that do not name a stored question.
    fn parse_message_id(raw: &str) -> Result<Uuid, AppError> {
        Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("Question {raw}")))
    }

    /// Submit a chat question for later answer generation
    async fn submit_question(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<QuestionRequest>,
    ) -> Result<Response, AppError> {
        if request.message.trim().is_empty() {
            return Err(AppError::invalid_input("message must not be empty"));
        }

        let id = resources
            .orchestrator
            .submit(request.message, request.conversation_history)
            .await;

        let response = QuestionResponse {
            message_id: id.to_string(),
            status: "received".to_owned(),
            message: "Question received successfully".to_owned(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Generate the answer for a previously submitted question
    async fn get_answer(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<AnswerRequest>,
    ) -> Result<Response, AppError> {
        let id = Self::parse_message_id(&request.message_id)?;

        let generated = resources.orchestrator.answer(id).await?;

        let response = AnswerResponse {
            message_id: request.message_id,
            answer: generated.answer,
            status: "completed".to_owned(),
            timestamp: generated.timestamp,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Stream the answer for a previously submitted question via SSE
    async fn get_answer_stream(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<AnswerRequest>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
        let id = Self::parse_message_id(&request.message_id)?;

        let mut events = resources.orchestrator.answer_stream(id).await?;
        info!("Streaming answer for question {id}");

        let stream = async_stream::stream! {
            while let Some(event) = events.next().await {
                match serde_json::to_string(&event) {
                    Ok(json) => yield Ok(Event::default().data(json)),
                    Err(e) => {
                        let fallback = serde_json::json!({
                            "type": "error",
                            "data": format!("event serialization failed: {e}"),
                        });
                        yield Ok(Event::default().data(fallback.to_string()));
                        break;
                    }
                }
                tokio::time::sleep(STREAM_PACING).await;
            }

            // Transport-level end frame, after the pipeline's terminal event
            yield Ok(Event::default().data(r#"{"type":"end","data":""}"#));
        };

        Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
    }
}
