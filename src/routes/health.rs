// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Provides liveness endpoints for load balancers and the frontend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Health check routes for service monitoring

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    #[must_use]
    pub fn routes() -> axum::Router {
        use axum::{routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "service": "chat-api"
            }))
        }

        Router::new()
            .route("/health", get(health_handler))
            .route("/api/chat/health", get(health_handler))
    }
}
