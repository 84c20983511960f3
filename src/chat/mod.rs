// ABOUTME: Answer pipeline core - pending-question store, stream demultiplexer, orchestrator
// ABOUTME: Holds the conversation types shared across the pipeline stages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Chat Pipeline Core
//!
//! The answer-streaming orchestration pipeline:
//!
//! - [`store`]: in-process pending-question table keyed by opaque ids
//! - [`demux`]: splits the raw token stream into narrative, chart, and status channels
//! - [`orchestrator`]: composes store, context, and completion into the
//!   submit-question / stream-answer workflow

pub mod demux;
pub mod orchestrator;
pub mod store;

pub use demux::{demux, ChartExtractor, StreamEvent};
pub use orchestrator::AnswerOrchestrator;
pub use store::{PendingQuestion, QuestionStatus, QuestionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, MessageRole};

/// A single turn of conversation history as received at the boundary
///
/// Immutable once created; an ordered sequence forms a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// Client-side timestamp, if supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationMessage {
    /// Convert to the provider-facing message type (timestamp dropped)
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}
