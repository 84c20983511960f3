// ABOUTME: In-process pending-question store keyed by generated opaque identifiers
// ABOUTME: LRU-bounded table supporting concurrent create, get, and finalize operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Pending-Question Store
//!
//! Maps opaque request identifiers to submitted questions and, once generated,
//! their final answers. Explicitly constructed and injectable - no module-level
//! state - and owned by the orchestrator for the process lifetime.
//!
//! The table is bounded: entries beyond the configured capacity are evicted
//! least-recently-used. The submit/answer pattern is single-use, so recency is
//! the right eviction key.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ConversationMessage;
use crate::errors::{AppError, AppResult};

/// Default capacity when none is configured
const DEFAULT_CAPACITY: usize = 10_000;

/// Lifecycle state of a pending question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// Submitted, no answer generated yet
    Pending,
    /// Answer generated and recorded
    Completed,
}

/// A submitted question awaiting (or holding) its answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingQuestion {
    /// The question text
    pub question: String,
    /// Conversation history received at submission time
    pub history: Vec<ConversationMessage>,
    /// Lifecycle status
    pub status: QuestionStatus,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// Final answer text, set by finalize
    pub answer: Option<String>,
    /// Completion timestamp, set by finalize
    pub answered_at: Option<DateTime<Utc>>,
}

/// LRU-bounded in-process store for pending questions
///
/// Safe for concurrent `create`/`get`/`finalize` calls from independent tasks.
/// `LruCache::get` updates recency and therefore requires the write lock, so a
/// single `RwLock` guards all access.
pub struct QuestionStore {
    entries: RwLock<LruCache<Uuid, PendingQuestion>>,
}

impl QuestionStore {
    /// Create a store with the given capacity bound
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Insert a new pending question, returning its fresh identifier
    ///
    /// Identifiers are 128-bit random UUIDs; collision with an existing entry
    /// is not a practical concern.
    pub async fn create(&self, question: String, history: Vec<ConversationMessage>) -> Uuid {
        let id = Uuid::new_v4();
        let entry = PendingQuestion {
            question,
            history,
            status: QuestionStatus::Pending,
            submitted_at: Utc::now(),
            answer: None,
            answered_at: None,
        };

        self.entries.write().await.push(id, entry);
        id
    }

    /// Look up a question by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the identifier is absent (never
    /// submitted, or evicted).
    pub async fn get(&self, id: Uuid) -> AppResult<PendingQuestion> {
        self.entries
            .write()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Question {id}")))
    }

    /// Record the answer for a question, marking it completed
    ///
    /// Last write wins: a second finalize overwrites the answer and timestamp
    /// without corrupting the entry.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the identifier is absent.
    pub async fn finalize(&self, id: Uuid, answer: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Question {id}")))?;

        entry.answer = Some(answer.to_owned());
        entry.answered_at = Some(Utc::now());
        entry.status = QuestionStatus::Completed;
        Ok(())
    }

    /// Number of questions currently retained
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
