// ABOUTME: Context retriever building prompt excerpts from the market corpus
// ABOUTME: Facet enumeration plus keyword search, degrading to a diagnostic string on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Context Retriever
//!
//! Before a completion is dispatched, the most recent user message is turned
//! into a bounded data-context excerpt: the known facets (regions, product
//! categories) plus the first rows of each dataset matching the message.
//!
//! Retrieval must never abort a question. Any failure while preparing context
//! degrades to an inline diagnostic string the model simply sees as text.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

use crate::data::corpus::{MarketCorpus, SearchResults};
use crate::errors::AppResult;

/// Facet caps shown in the excerpt before eliding with `...`
const FACET_PREVIEW: usize = 10;

/// Rows per dataset included in the excerpt
const EXCERPT_ROWS: usize = 3;

/// Search hit cap per dataset
const SEARCH_LIMIT: usize = 5;

/// Enumerable dimensions of the data corpus
#[derive(Debug, Clone, Serialize)]
pub struct Facets {
    /// Known regions
    pub regions: Vec<String>,
    /// Known product categories
    pub categories: Vec<String>,
}

/// Builds prompt context from the market corpus
pub struct ContextRetriever {
    corpus: Arc<MarketCorpus>,
}

impl ContextRetriever {
    /// Create a retriever over the given corpus
    #[must_use]
    pub fn new(corpus: Arc<MarketCorpus>) -> Self {
        Self { corpus }
    }

    /// Enumerate the known facets
    #[must_use]
    pub fn facets(&self) -> Facets {
        Facets {
            regions: self.corpus.regions(),
            categories: self.corpus.categories(),
        }
    }

    /// Keyword search over the corpus
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> SearchResults {
        self.corpus.search(query, limit)
    }

    /// Build the data-context excerpt for a user message
    ///
    /// Infallible by contract: internal failures produce a diagnostic string
    /// instead of an error.
    #[must_use]
    pub fn build_context(&self, user_message: &str) -> String {
        self.try_build_context(user_message)
            .unwrap_or_else(|e| format!("Data context preparation error: {e}"))
    }

    /// Fallible context assembly - the seam the degrade path wraps
    fn try_build_context(&self, user_message: &str) -> AppResult<String> {
        let facets = self.facets();
        let results = self.search(user_message, SEARCH_LIMIT);

        let mut context = String::from("## Available Data Options:\n");
        let _ = writeln!(
            context,
            "**Regions**: {}",
            preview_list(&facets.regions, FACET_PREVIEW)
        );
        let _ = writeln!(
            context,
            "**Product Categories**: {}",
            preview_list(&facets.categories, FACET_PREVIEW)
        );

        context.push_str("\n## Relevant Data Found:\n");
        context.push_str(&format_results(&results));

        Ok(context)
    }
}

/// Comma-joined preview of a facet list, elided past the cap
fn preview_list(values: &[String], cap: usize) -> String {
    let shown = values
        .iter()
        .take(cap)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > cap {
        format!("{shown}...")
    } else {
        shown
    }
}

/// Format the first rows of each matching dataset for the prompt
fn format_results(results: &SearchResults) -> String {
    let mut text = String::new();

    if !results.market_intelligence.is_empty() {
        text.push_str("\n**Market Intelligence**:\n");
        for row in results.market_intelligence.iter().take(EXCERPT_ROWS) {
            let _ = writeln!(
                text,
                "{} {}: affinity={:.1} search_index={:.1} ad_effectiveness={:.1}% sentiment={:.1}%",
                row.region,
                row.year,
                row.consumer_affinity_score,
                row.online_search_index,
                row.ecommerce_ad_effectiveness,
                row.social_media_sentiment,
            );
        }
    }

    if !results.market_trend.is_empty() {
        text.push_str("\n**Market Trend**:\n");
        for row in results.market_trend.iter().take(EXCERPT_ROWS) {
            let _ = writeln!(
                text,
                "{} {} {} {}: {:.1}M units, US${:.2}B, yoy={:.1}% cagr={:.1}% drivers={}",
                row.region,
                row.category,
                row.sub_category,
                row.year,
                row.market_size_units_millions,
                row.market_value_usd_billions,
                row.yoy_growth_pct,
                row.cagr_5y_forecast_pct,
                row.key_drivers,
            );
        }
    }

    if !results.timeseries.is_empty() {
        text.push_str("\n**Timeseries**:\n");
        for row in results.timeseries.iter().take(EXCERPT_ROWS) {
            let _ = writeln!(
                text,
                "{} {} {} {}: {:.2}M units sold, ASP=US${:.0}",
                row.region,
                row.category,
                row.sub_category,
                row.year,
                row.units_sold_millions,
                row.average_selling_price_usd,
            );
        }
    }

    if text.is_empty() {
        text.push_str("(no matching records)\n");
    }

    text
}
