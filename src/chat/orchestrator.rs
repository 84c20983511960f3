// ABOUTME: Answer orchestrator composing store, context retrieval, and completion calls
// ABOUTME: Drives the submit-question / answer / stream-answer workflow end to end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Answer Orchestrator
//!
//! The end-to-end workflow: a question is submitted and stored under a fresh
//! id; the answer is later generated - once or streamed - by reconstructing
//! the conversation, dispatching the enriched completion, and finalizing the
//! store with the produced text.
//!
//! Failure semantics: an unknown id surfaces as `ResourceNotFound`, a failed
//! provider as an external-service error - the boundary maps them to distinct
//! statuses. On the streaming path an upstream error leaves the question
//! unfinalized (no answer was actually produced) and terminates the event
//! sequence with a single `error`.

use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::demux::{demux, StreamEvent};
use super::store::QuestionStore;
use super::ConversationMessage;
use crate::errors::AppResult;
use crate::llm::{ChatMessage, CompletionClient};

/// A finalized answer with its completion timestamp
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    /// The answer text
    pub answer: String,
    /// When the answer was recorded
    pub timestamp: DateTime<Utc>,
}

/// Orchestrates the submit-question / stream-answer workflow
pub struct AnswerOrchestrator {
    store: Arc<QuestionStore>,
    completion: Arc<CompletionClient>,
}

impl AnswerOrchestrator {
    /// Create an orchestrator owning the given store and completion client
    #[must_use]
    pub fn new(store: Arc<QuestionStore>, completion: Arc<CompletionClient>) -> Self {
        Self { store, completion }
    }

    /// Access the underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<QuestionStore> {
        &self.store
    }

    /// Submit a question for later answer generation
    pub async fn submit(&self, question: String, history: Vec<ConversationMessage>) -> Uuid {
        let id = self.store.create(question, history).await;
        debug!("Stored pending question {id}");
        id
    }

    /// Rebuild the provider message list: history plus the stored question as
    /// the final user turn
    fn build_messages(question: &str, history: &[ConversationMessage]) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> =
            history.iter().map(ConversationMessage::to_chat_message).collect();
        messages.push(ChatMessage::user(question));
        messages
    }

    /// Generate the answer for a previously submitted question (non-streaming)
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown id; an external-service error when
    /// the completion provider fails after exhausting retries.
    pub async fn answer(&self, id: Uuid) -> AppResult<GeneratedAnswer> {
        let pending = self.store.get(id).await?;
        let messages = Self::build_messages(&pending.question, &pending.history);

        let answer = self.completion.complete(&messages).await?;

        self.store.finalize(id, &answer).await?;
        Ok(GeneratedAnswer {
            answer,
            timestamp: Utc::now(),
        })
    }

    /// Generate the answer as a lazy event stream
    ///
    /// Content text is accumulated while events are forwarded; on normal
    /// exhaustion the store is finalized with the accumulated answer before
    /// the terminal `complete` is yielded. On an upstream error the store is
    /// left untouched. Abandoning the stream before a terminal event drops the
    /// provider connection and leaves the question pending.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown id; an external-service error when
    /// the initial streaming request fails.
    pub async fn answer_stream(
        &self,
        id: Uuid,
    ) -> AppResult<Pin<Box<dyn Stream<Item = StreamEvent> + Send>>> {
        let pending = self.store.get(id).await?;
        let messages = Self::build_messages(&pending.question, &pending.history);

        let token_stream = self.completion.stream(&messages).await?;
        let mut events = demux(token_stream);

        let store = Arc::clone(&self.store);
        let stream = async_stream::stream! {
            let mut full_answer = String::new();

            while let Some(event) = events.next().await {
                match event {
                    StreamEvent::Content(text) => {
                        full_answer.push_str(&text);
                        yield StreamEvent::Content(text);
                    }
                    StreamEvent::Error(detail) => {
                        // No answer was produced - the question stays pending
                        warn!("Stream for question {id} failed: {detail}");
                        yield StreamEvent::Error(detail);
                        return;
                    }
                    StreamEvent::Complete(_) => {
                        if let Err(e) = store.finalize(id, &full_answer).await {
                            // Evicted mid-stream; the answer still reaches the caller
                            warn!("Could not finalize question {id}: {e}");
                        }
                        yield StreamEvent::complete();
                        return;
                    }
                    other => yield other,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
