// ABOUTME: Web search supplement gathering additional market intelligence from the open web
// ABOUTME: Query construction, result scraping, relevance scoring, and report generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Web Search
//!
//! A best-effort supplement to the structured datasets: a market-focused web
//! search whose results are scored for relevance, tagged with keywords, and
//! classified into report categories. Failures never abort a request - the
//! endpoint degrades to a diagnostic payload.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// Search endpoint queried for results
const SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Request timeout for search fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser-like user agent; bare client UAs get empty result pages
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Report categories results are classified into
const REPORT_CATEGORIES: [(&str, &[&str]); 4] = [
    (
        "Population & Households",
        &["population", "household", "demographic", "family", "urban", "rural"],
    ),
    (
        "Society & Economy",
        &["economy", "society", "social", "economic", "gdp", "income", "employment"],
    ),
    (
        "Science & Technology",
        &["technology", "innovation", "digital", "smart", "iot", "ai", "research"],
    ),
    (
        "City & Nature",
        &["city", "nature", "environment", "sustainability", "green", "climate"],
    ),
];

/// A processed search result
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    /// Result title
    pub title: String,
    /// Result URL
    pub url: String,
    /// Snippet text
    pub snippet: String,
    /// Source engine
    pub source: String,
    /// Relevance score in 0-1
    pub relevance_score: f64,
    /// Keywords extracted from the snippet
    pub extracted_keywords: Vec<String>,
    /// Report category classification
    pub category_classification: String,
}

/// A complete search report
#[derive(Debug, Clone, Serialize)]
pub struct WebSearchReport {
    /// The constructed search query
    pub query: String,
    /// Region filter, if any
    pub region: Option<String>,
    /// Product category filter, if any
    pub product_category: Option<String>,
    /// Scored and classified results, most relevant first
    pub results: Vec<SearchResultItem>,
    /// Number of results
    pub total_results: usize,
}

/// Web search client for gathering additional market intelligence
pub struct WebSearchClient {
    http: Client,
}

impl WebSearchClient {
    /// Create a client with a browser user agent and bounded timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> AppResult<Self> {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Search for market data related to the query, region, and product category
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails; callers are expected to
    /// degrade rather than propagate.
    pub async fn search_market_data(
        &self,
        query: &str,
        region: Option<&str>,
        product_category: Option<&str>,
        max_results: usize,
    ) -> AppResult<WebSearchReport> {
        let search_query = construct_search_query(query, region, product_category);
        debug!("Performing web search: {search_query}");

        let url = format!("{SEARCH_URL}{}", search_query.replace(' ', "+"));
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::external_service("web search", format!("request failed: {e}")))?
            .text()
            .await
            .map_err(|e| {
                AppError::external_service("web search", format!("reading body failed: {e}"))
            })?;

        let mut results = extract_results(&body, max_results);
        for item in &mut results {
            item.relevance_score = relevance_score(&item.title, &item.snippet);
            item.extracted_keywords = extract_keywords(&item.snippet);
            item.category_classification = classify_content(&item.title, &item.snippet);
        }
        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(WebSearchReport {
            query: search_query,
            region: region.map(str::to_owned),
            product_category: product_category.map(str::to_owned),
            total_results: results.len(),
            results,
        })
    }

    /// Render a report as markdown suitable for document-style consumption
    #[must_use]
    pub fn generate_report_content(report: &WebSearchReport) -> String {
        let mut content = String::from("# Market Intelligence Report\n\n");
        content.push_str(&format!("**Search Query**: {}\n", report.query));
        content.push_str(&format!(
            "**Region**: {}\n",
            report.region.as_deref().unwrap_or("Global")
        ));
        content.push_str(&format!(
            "**Product Category**: {}\n\n",
            report.product_category.as_deref().unwrap_or("All Categories")
        ));

        content.push_str("## Executive Summary\n\n");
        content.push_str(&format!(
            "Based on web search analysis, {} relevant sources were identified for {} market analysis.\n\n",
            report.total_results,
            report.region.as_deref().unwrap_or("global")
        ));

        for (category, _) in REPORT_CATEGORIES {
            let in_category: Vec<&SearchResultItem> = report
                .results
                .iter()
                .filter(|r| r.category_classification == category)
                .take(3)
                .collect();
            if in_category.is_empty() {
                continue;
            }

            content.push_str(&format!("## {category}\n\n"));
            for (i, result) in in_category.iter().enumerate() {
                content.push_str(&format!("### {}. {}\n", i + 1, result.title));
                content.push_str(&format!("**URL**: {}\n", result.url));
                content.push_str(&format!("**Summary**: {}\n", result.snippet));
                content.push_str(&format!(
                    "**Relevance Score**: {:.2}\n",
                    result.relevance_score
                ));
                content.push_str(&format!(
                    "**Keywords**: {}\n\n",
                    result.extracted_keywords.join(", ")
                ));
            }
        }

        content
    }
}

/// Construct a comprehensive search query from the filters
fn construct_search_query(
    query: &str,
    region: Option<&str>,
    product_category: Option<&str>,
) -> String {
    let mut terms = vec![query.to_owned()];

    if let Some(region) = region {
        terms.push(format!("market {region}"));
    }
    if let Some(category) = product_category {
        terms.push(format!("{category} appliances"));
    }

    terms.push("market analysis market trends market size market forecast".to_owned());
    terms.join(" ")
}

/// Extract raw results from the search result page
///
/// Parsing happens synchronously on the fetched body; the parsed document is
/// dropped before returning so the surrounding future stays `Send`.
fn extract_results(body: &str, max_results: usize) -> Vec<SearchResultItem> {
    let document = Html::parse_document(body);

    let Ok(result_selector) = Selector::parse("div.g") else {
        return Vec::new();
    };
    let Ok(title_selector) = Selector::parse("h3") else {
        return Vec::new();
    };
    let Ok(link_selector) = Selector::parse("a") else {
        return Vec::new();
    };
    let Ok(snippet_selector) = Selector::parse("span.aCOpRe, div.VwiC3b") else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for element in document.select(&result_selector).take(max_results) {
        let Some(title) = element
            .select(&title_selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_owned())
        else {
            continue;
        };
        let Some(url) = element
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_owned)
        else {
            continue;
        };
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_owned())
            .unwrap_or_default();

        results.push(SearchResultItem {
            title,
            url,
            snippet,
            source: "Google Search".to_owned(),
            relevance_score: 0.0,
            extracted_keywords: Vec::new(),
            category_classification: String::new(),
        });
    }

    if results.is_empty() {
        warn!("Web search returned no parseable results");
    }
    results
}

/// Score a result by market-intelligence keyword presence, capped at 1.0
fn relevance_score(title: &str, snippet: &str) -> f64 {
    const MARKET_KEYWORDS: [&str; 12] = [
        "market", "analysis", "report", "trend", "forecast", "growth", "size", "value",
        "demand", "supply", "competition", "industry",
    ];
    const DOMAIN_KEYWORDS: [&str; 7] = [
        "home appliances",
        "consumer electronics",
        "smart home",
        "iot",
        "innovation",
        "technology",
        "sustainability",
    ];

    let content = format!("{title} {snippet}").to_lowercase();
    let mut score: f64 = 0.0;
    for keyword in MARKET_KEYWORDS {
        if content.contains(keyword) {
            score += 0.1;
        }
    }
    for keyword in DOMAIN_KEYWORDS {
        if content.contains(keyword) {
            score += 0.2;
        }
    }
    score.min(1.0)
}

/// Extract known keyword terms present in the text
fn extract_keywords(text: &str) -> Vec<String> {
    const TERMS: [&str; 20] = [
        "market", "analysis", "report", "trend", "forecast", "appliance", "electronics",
        "home", "consumer", "smart", "asia", "europe", "america", "global", "regional",
        "growth", "revenue", "profit", "investment", "economy",
    ];

    let lower = text.to_lowercase();
    TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| (*term).to_owned())
        .collect()
}

/// Classify content into the report category with the most keyword hits
fn classify_content(title: &str, snippet: &str) -> String {
    let content = format!("{title} {snippet}").to_lowercase();

    REPORT_CATEGORIES
        .iter()
        .map(|(category, keywords)| {
            let score = keywords.iter().filter(|k| content.contains(*k)).count();
            (*category, score)
        })
        .max_by_key(|(_, score)| *score)
        .filter(|(_, score)| *score > 0)
        .map_or_else(|| "Society & Economy".to_owned(), |(c, _)| c.to_owned())
}
