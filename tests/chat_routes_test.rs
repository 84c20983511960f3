// ABOUTME: Integration tests for the HTTP chat and data route handlers
// ABOUTME: Exercises question/answer endpoints, SSE framing, and facet lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{test_resources, EchoProvider, ScriptedProvider};
use marketscope_server::routes::chat::{AnswerResponse, QuestionResponse};
use marketscope_server::server::ChatServer;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(provider: Arc<dyn marketscope_server::llm::LlmProvider>) -> Router {
    ChatServer::new(test_resources(provider)).router()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = router(Arc::new(EchoProvider));

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "chat-api");
}

// ============================================================================
// Question / Answer
// ============================================================================

#[tokio::test]
async fn test_submit_question_returns_id() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(post_json(
            "/api/chat/question",
            &json!({"message": "How big is the German market?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: QuestionResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(body.status, "received");
    assert!(!body.message_id.is_empty());
}

#[tokio::test]
async fn test_submit_empty_question_is_rejected() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(post_json("/api/chat/question", &json!({"message": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_round_trip() {
    let router = router(Arc::new(EchoProvider));

    let submit = router
        .clone()
        .oneshot(post_json(
            "/api/chat/question",
            &json!({
                "message": "trend for refrigerators?",
                "conversation_history": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi, how can I help?"}
                ]
            }),
        ))
        .await
        .unwrap();
    let submitted: QuestionResponse = serde_json::from_value(body_json(submit).await).unwrap();

    let answer = router
        .oneshot(post_json(
            "/api/chat/answer",
            &json!({"message_id": submitted.message_id}),
        ))
        .await
        .unwrap();

    assert_eq!(answer.status(), StatusCode::OK);
    let body: AnswerResponse = serde_json::from_value(body_json(answer).await).unwrap();
    assert_eq!(body.status, "completed");
    assert!(body.answer.contains("trend for refrigerators?"));
    assert!(body.answer.contains("[assistant] hi, how can I help?"));
}

#[tokio::test]
async fn test_answer_unknown_id_is_404() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(post_json(
            "/api/chat/answer",
            &json!({"message_id": "nonexistent-id"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}

// ============================================================================
// SSE Stream
// ============================================================================

#[tokio::test]
async fn test_answer_stream_frames_and_end_marker() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Growth ",
        "continues. ```json\n{\"chartConfig\":{\"k\":1}}\n```",
    ]));
    let router = router(provider);

    let submit = router
        .clone()
        .oneshot(post_json(
            "/api/chat/question",
            &json!({"message": "stream it"}),
        ))
        .await
        .unwrap();
    let submitted: QuestionResponse = serde_json::from_value(body_json(submit).await).unwrap();

    let response = router
        .oneshot(post_json(
            "/api/chat/answer/stream",
            &json!({"message_id": submitted.message_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = body_text(response).await;
    let frames: Vec<Value> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();

    // First frame is the connecting status, last is the transport end marker
    assert_eq!(frames.first().unwrap()["type"], "status");
    assert_eq!(frames.last().unwrap()["type"], "end");

    let types: Vec<&str> = frames
        .iter()
        .map(|f| f["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"content"));
    assert!(types.contains(&"chart"));

    // Exactly one pipeline terminal, directly before the end marker
    let terminals = types
        .iter()
        .filter(|t| **t == "complete" || **t == "error")
        .count();
    assert_eq!(terminals, 1);
    assert_eq!(types[types.len() - 2], "complete");
}

// ============================================================================
// Data Endpoints
// ============================================================================

#[tokio::test]
async fn test_data_categories_endpoint() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(get("/api/chat/data/categories"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["categories"], json!(["Refrigerators"]));
}

#[tokio::test]
async fn test_data_analyze_endpoint_filters_by_region() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(get("/api/chat/data/analyze?region=Germany"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["summary"]["total_trend_records"], 1);
    assert_eq!(body["summary"]["total_intelligence_records"], 1);
    assert_eq!(body["trend_data"][0]["region"], "Germany");
}

#[tokio::test]
async fn test_data_chart_endpoint_returns_chart_config() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(get("/api/chat/data/chart?product_category=Refrigerators"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("chartConfig").is_some());
}

#[tokio::test]
async fn test_data_direct_result_requires_selection() {
    let router = router(Arc::new(EchoProvider));

    // Missing required query parameters is a client error
    let response = router
        .clone()
        .oneshot(get("/api/chat/data/direct-result"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(get(
            "/api/chat/data/direct-result?category=Refrigerators&subcategory=300-400L&country=Germany",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("chartConfig").is_some());
    assert_eq!(body["data"][0]["year"], 2024);
}

#[tokio::test]
async fn test_competitive_analysis_lists_regions_without_filter() {
    let router = router(Arc::new(EchoProvider));

    let response = router
        .oneshot(get("/api/chat/data/competitive-analysis"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("available_regions").is_some());
}
