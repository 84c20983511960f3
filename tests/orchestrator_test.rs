// ABOUTME: Integration tests for the answer orchestrator workflow
// ABOUTME: Round-trip, not-found, streaming accumulation, and failure semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{build_orchestrator, BrokenStreamProvider, EchoProvider, FailingProvider, ScriptedProvider};
use futures_util::StreamExt;
use marketscope_server::chat::{ConversationMessage, QuestionStatus, StreamEvent};
use marketscope_server::errors::ErrorCode;
use marketscope_server::llm::MessageRole;
use uuid::Uuid;

fn history_turn(role: MessageRole, content: &str) -> ConversationMessage {
    ConversationMessage {
        role,
        content: content.to_owned(),
        timestamp: None,
    }
}

#[tokio::test]
async fn test_round_trip_includes_question_and_history() {
    let orchestrator = build_orchestrator(Arc::new(EchoProvider));

    let history = vec![
        history_turn(MessageRole::User, "earlier question"),
        history_turn(MessageRole::Assistant, "earlier answer"),
    ];
    let id = orchestrator
        .submit("what about Germany?".to_owned(), history)
        .await;

    let generated = orchestrator.answer(id).await.unwrap();

    // The echo stub reflects the dispatched conversation: system prompt with
    // data context first, then history, then the question as final user turn
    assert!(generated.answer.contains("[system]"));
    assert!(generated.answer.contains("## Current Data Context:"));
    assert!(generated.answer.contains("[user] earlier question"));
    assert!(generated.answer.contains("[assistant] earlier answer"));
    assert!(generated.answer.ends_with("[user] what about Germany?"));

    let stored = orchestrator.store().get(id).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Completed);
    assert_eq!(stored.answer.as_deref(), Some(generated.answer.as_str()));
}

#[tokio::test]
async fn test_repeated_submissions_yield_unique_ids() {
    let orchestrator = build_orchestrator(Arc::new(EchoProvider));

    let mut ids = HashSet::new();
    for _ in 0..10 {
        ids.insert(orchestrator.submit("same".to_owned(), vec![]).await);
    }
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_unknown_id_fails_with_not_found_only() {
    let orchestrator = build_orchestrator(Arc::new(EchoProvider));

    let err = orchestrator.answer(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = orchestrator.answer_stream(Uuid::new_v4()).await.err().unwrap();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_provider_error() {
    let provider = Arc::new(FailingProvider::new());
    let orchestrator = build_orchestrator(provider.clone());

    let id = orchestrator.submit("q".to_owned(), vec![]).await;
    let err = orchestrator.answer(id).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert!(err.message.contains("simulated failure #5"));
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 5);

    // The question was never answered
    let stored = orchestrator.store().get(id).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Pending);
}

#[tokio::test]
async fn test_answer_stream_accumulates_and_finalizes() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "The market ",
        "grew. ```json\n{\"chartConfig\":{\"series\":[]}}\n```",
        " Overall positive.",
    ]));
    let orchestrator = build_orchestrator(provider);

    let id = orchestrator.submit("trend?".to_owned(), vec![]).await;
    let events: Vec<StreamEvent> = orchestrator.answer_stream(id).await.unwrap().collect().await;

    let terminals: Vec<&StreamEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminals.len(), 1);
    assert_eq!(events.last().unwrap(), &StreamEvent::complete());

    let charts: Vec<&StreamEvent> = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Chart(_)))
        .collect();
    assert_eq!(charts.len(), 1);

    // The store holds the narrative with the chart markup elided
    let stored = orchestrator.store().get(id).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Completed);
    assert_eq!(
        stored.answer.as_deref(),
        Some("The market grew.  Overall positive.")
    );
}

#[tokio::test]
async fn test_stream_error_leaves_question_pending() {
    let provider = Arc::new(BrokenStreamProvider::new(&["partial "]));
    let orchestrator = build_orchestrator(provider);

    let id = orchestrator.submit("q".to_owned(), vec![]).await;
    let events: Vec<StreamEvent> = orchestrator.answer_stream(id).await.unwrap().collect().await;

    assert!(matches!(events.last().unwrap(), StreamEvent::Error(_)));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let stored = orchestrator.store().get(id).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Pending);
    assert!(stored.answer.is_none());
}

#[tokio::test]
async fn test_abandoned_stream_leaves_question_pending() {
    let provider = Arc::new(ScriptedProvider::new(&["a", "b", "c"]));
    let orchestrator = build_orchestrator(provider);

    let id = orchestrator.submit("q".to_owned(), vec![]).await;
    {
        let mut events = orchestrator.answer_stream(id).await.unwrap();
        // Consume a single event, then drop the stream
        let first = events.next().await.unwrap();
        assert_eq!(first, StreamEvent::status("connecting"));
    }

    let stored = orchestrator.store().get(id).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Pending);
}
