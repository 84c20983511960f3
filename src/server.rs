// ABOUTME: Centralized resource container and HTTP server assembly
// ABOUTME: Wires config, corpus, documents, orchestrator, and routes into one axum app
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Server Resources and Assembly
//!
//! `ServerResources` is the dependency-injection container: every expensive
//! shared object (corpus, document library, orchestrator) is constructed once
//! at startup and shared via `Arc`. Route handlers receive the container as
//! axum state - no module-level singletons anywhere.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::chat::{AnswerOrchestrator, QuestionStore};
use crate::config::ServerConfig;
use crate::context::ContextRetriever;
use crate::data::{DocumentLibrary, MarketCorpus};
use crate::errors::AppResult;
use crate::llm::{CompletionClient, LlmProvider};
use crate::routes::chat::ChatRoutes;
use crate::routes::data::DataRoutes;
use crate::routes::health::HealthRoutes;
use crate::websearch::WebSearchClient;

/// Centralized resource container for dependency injection
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Loaded market datasets
    pub corpus: Arc<MarketCorpus>,
    /// Region document library
    pub documents: Arc<DocumentLibrary>,
    /// Web search client
    pub web_search: Arc<WebSearchClient>,
    /// The answer pipeline
    pub orchestrator: Arc<AnswerOrchestrator>,
}

impl ServerResources {
    /// Create server resources with proper Arc sharing
    ///
    /// # Errors
    ///
    /// Returns an error if a subsystem cannot be constructed.
    pub fn new(
        config: ServerConfig,
        corpus: MarketCorpus,
        documents: DocumentLibrary,
        provider: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        let config = Arc::new(config);
        let corpus = Arc::new(corpus);
        let documents = Arc::new(documents);

        let retriever = Arc::new(ContextRetriever::new(Arc::clone(&corpus)));
        let completion = CompletionClient::new(provider, retriever)
            .with_model(config.llm.model.clone())
            .with_sampling(config.llm.temperature, config.llm.max_tokens);

        let store = Arc::new(QuestionStore::new(config.store_capacity));
        let orchestrator = Arc::new(AnswerOrchestrator::new(store, Arc::new(completion)));

        Ok(Self {
            config,
            corpus,
            documents,
            web_search: Arc::new(WebSearchClient::new()?),
            orchestrator,
        })
    }
}

/// The assembled HTTP server
pub struct ChatServer {
    resources: Arc<ServerResources>,
}

impl ChatServer {
    /// Create a server over the given resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the full router with middleware layers
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(ChatRoutes::routes(Arc::clone(&self.resources)))
            .merge(DataRoutes::routes(Arc::clone(&self.resources)))
            .merge(HealthRoutes::routes())
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
    }

    /// CORS policy: a configured frontend origin, or permissive when unset
    fn cors_layer(&self) -> CorsLayer {
        match self.resources.config.cors_origin.as_deref() {
            Some(origin) => match origin.parse::<HeaderValue>() {
                Ok(value) => CorsLayer::new()
                    .allow_origin(value)
                    .allow_methods(Any)
                    .allow_headers(Any),
                Err(e) => {
                    warn!("Invalid FRONT_URL '{origin}': {e}; falling back to permissive CORS");
                    CorsLayer::permissive()
                }
            },
            None => CorsLayer::permissive(),
        }
    }

    /// Bind the listener and serve until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn run(self, port: u16) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        info!("MarketScope chat API listening on port {port}");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
