// ABOUTME: Integration tests for the pending-question store
// ABOUTME: Covers id uniqueness, concurrent creates, and finalize semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use marketscope_server::chat::{QuestionStatus, QuestionStore};
use marketscope_server::errors::ErrorCode;

#[tokio::test]
async fn test_identical_submissions_get_distinct_ids() {
    let store = QuestionStore::new(64);

    let mut ids = HashSet::new();
    for _ in 0..20 {
        let id = store.create("same question".to_owned(), vec![]).await;
        ids.insert(id);
    }

    assert_eq!(ids.len(), 20);
    assert_eq!(store.len().await, 20);
}

#[tokio::test]
async fn test_concurrent_creates_are_all_retrievable() {
    let store = Arc::new(QuestionStore::new(256));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create(format!("question {i}"), vec![]).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    assert_eq!(store.len().await, 32);
    for (i, id) in ids.iter().enumerate() {
        let entry = store.get(*id).await.unwrap();
        assert_eq!(entry.question, format!("question {i}"));
        assert_eq!(entry.status, QuestionStatus::Pending);
    }
}

#[tokio::test]
async fn test_concurrent_finalize_does_not_corrupt_entries() {
    let store = Arc::new(QuestionStore::new(64));
    let id = store.create("q".to_owned(), vec![]).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.finalize(id, &format!("answer {i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entry = store.get(id).await.unwrap();
    assert_eq!(entry.status, QuestionStatus::Completed);
    let answer = entry.answer.unwrap();
    assert!(answer.starts_with("answer "));
    assert!(entry.answered_at.unwrap() >= entry.submitted_at);
}

#[tokio::test]
async fn test_finalize_unknown_id_is_not_found() {
    let store = QuestionStore::new(16);
    let err = store.finalize(uuid::Uuid::new_v4(), "a").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
