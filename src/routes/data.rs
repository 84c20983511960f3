// ABOUTME: Non-LLM data lookup endpoints - facets, charts, analysis, web search
// ABOUTME: Thin read paths over the market corpus and document library
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Data routes
//!
//! Direct read paths over the market corpus: facet enumerations, filtered
//! analysis payloads, chart configurations, and the web-search supplement.
//! None of these touch the completion provider.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::data::charts::{self, ChartType};
use crate::server::ServerResources;
use crate::websearch::WebSearchClient;

/// Default chart title when none is supplied
const DEFAULT_CHART_TITLE: &str = "Home Appliances Market Analysis";

/// Result cap for web searches
const WEB_SEARCH_RESULTS: usize = 5;

// ============================================================================
// Query Types
// ============================================================================

/// Region/category filter pair shared by several endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    /// Region to analyze
    pub region: Option<String>,
    /// Product category to analyze
    pub product_category: Option<String>,
}

/// Parameters for the chart endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// Product category for the chart
    pub product_category: Option<String>,
    /// Chart title
    pub title: Option<String>,
    /// Chart type: `stacked_bar`, `line`, `grouped_bar`, `percentage_stacked`
    pub chart_type: Option<String>,
}

/// Category filter for the subcategory listing
#[derive(Debug, Default, Deserialize)]
pub struct SubcategoryQuery {
    /// Product category to list subcategories for
    pub category: Option<String>,
}

/// Selection for the direct-result endpoint
#[derive(Debug, Deserialize)]
pub struct DirectResultQuery {
    /// Product category
    pub category: String,
    /// Product subcategory
    pub subcategory: String,
    /// Country/region
    pub country: String,
}

/// Parameters for the web-search endpoint
#[derive(Debug, Deserialize)]
pub struct WebSearchQuery {
    /// Search query for market data
    pub query: String,
    /// Region to search for
    pub region: Option<String>,
    /// Product category to search for
    pub product_category: Option<String>,
}

/// Region filter for the competitive-analysis endpoint
#[derive(Debug, Default, Deserialize)]
pub struct CompetitiveQuery {
    /// Region to analyze
    pub region: Option<String>,
}

// ============================================================================
// Data Routes
// ============================================================================

/// Data routes handler
pub struct DataRoutes;

impl DataRoutes {
    /// Create all data lookup routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/data/summary", get(Self::get_summary))
            .route("/api/chat/data/analyze", get(Self::analyze_market_trend))
            .route("/api/chat/data/chart", get(Self::get_chart))
            .route("/api/chat/data/categories", get(Self::get_categories))
            .route("/api/chat/data/subcategories", get(Self::get_subcategories))
            .route("/api/chat/data/regions", get(Self::get_regions))
            .route("/api/chat/data/countries", get(Self::get_countries))
            .route(
                "/api/chat/data/category-mapping",
                get(Self::get_category_mapping),
            )
            .route("/api/chat/data/direct-result", get(Self::get_direct_result))
            .route(
                "/api/chat/data/competitive-analysis",
                get(Self::get_competitive_analysis),
            )
            .route("/api/chat/data/web-search", get(Self::search_web_data))
            .with_state(resources)
    }

    /// Summary of all available market data
    async fn get_summary(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(resources.corpus.summary())
    }

    /// Filtered trend/timeseries/intelligence rows with record counts
    async fn analyze_market_trend(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<AnalysisQuery>,
    ) -> Json<Value> {
        let region = query.region.as_deref();
        let category = query.product_category.as_deref();

        let trend = resources.corpus.market_trend(region, category, None, None);
        let timeseries = resources.corpus.timeseries(region, category, None, None);
        let intelligence = resources.corpus.market_intelligence(region, None);
        let counts = (trend.len(), timeseries.len(), intelligence.len());

        Json(json!({
            "trend_data": trend,
            "timeseries_data": timeseries,
            "intelligence_data": intelligence,
            "summary": {
                "total_trend_records": counts.0,
                "total_timeseries_records": counts.1,
                "total_intelligence_records": counts.2,
            },
        }))
    }

    /// ECharts configuration for the requested selection
    async fn get_chart(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ChartQuery>,
    ) -> Json<Value> {
        let chart_type = ChartType::parse(query.chart_type.as_deref().unwrap_or_default());
        Json(charts::echarts_config(
            &resources.corpus,
            query.product_category.as_deref(),
            query.title.as_deref().unwrap_or(DEFAULT_CHART_TITLE),
            chart_type,
        ))
    }

    /// All available product categories
    async fn get_categories(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({ "categories": resources.corpus.categories() }))
    }

    /// Subcategories, optionally narrowed to one category
    async fn get_subcategories(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<SubcategoryQuery>,
    ) -> Json<Value> {
        let subcategories = match query.category.as_deref() {
            Some(category) => resources.corpus.subcategories_for(category),
            None => resources.corpus.subcategories(),
        };
        Json(json!({ "subcategories": subcategories }))
    }

    /// All available regions
    async fn get_regions(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({ "regions": resources.corpus.regions() }))
    }

    /// All available countries for selection
    async fn get_countries(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({ "countries": resources.corpus.countries() }))
    }

    /// Mapping of categories to their subcategories
    async fn get_category_mapping(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({ "mapping": resources.corpus.category_mapping() }))
    }

    /// Chart config and data for a selection - no LLM processing
    async fn get_direct_result(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<DirectResultQuery>,
    ) -> Json<Value> {
        Json(charts::direct_result(
            &resources.corpus,
            &query.category,
            &query.subcategory,
            &query.country,
        ))
    }

    /// Competitive portfolio analysis from the region document library
    async fn get_competitive_analysis(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<CompetitiveQuery>,
    ) -> Json<Value> {
        let library = &resources.documents;
        let available = library.regions();

        let Some(region) = query.region else {
            return Json(json!({
                "available_regions": available,
                "message": "Specify a region to retrieve its competitive analysis documents",
            }));
        };

        match library.documents_for(&region) {
            Some(docs) => {
                let documents: Vec<Value> = docs
                    .iter()
                    .map(|(name, text)| {
                        json!({
                            "document": name,
                            "content": text,
                        })
                    })
                    .collect();
                Json(json!({
                    "region": region,
                    "document_count": documents.len(),
                    "documents": documents,
                }))
            }
            None => Json(json!({
                "region": region,
                "document_count": 0,
                "documents": [],
                "available_regions": available,
            })),
        }
    }

    /// Web search for additional market data
    ///
    /// Search failures degrade to a diagnostic payload; this endpoint never
    /// surfaces a server error for an upstream search problem.
    async fn search_web_data(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<WebSearchQuery>,
    ) -> Json<Value> {
        let result = resources
            .web_search
            .search_market_data(
                &query.query,
                query.region.as_deref(),
                query.product_category.as_deref(),
                WEB_SEARCH_RESULTS,
            )
            .await;

        match result {
            Ok(report) => {
                let content = WebSearchClient::generate_report_content(&report);
                Json(json!({
                    "report": report,
                    "content": content,
                }))
            }
            Err(e) => {
                warn!("Web search failed: {e}");
                Json(json!({ "error": format!("Web search failed: {e}") }))
            }
        }
    }
}
