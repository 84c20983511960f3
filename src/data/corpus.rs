// ABOUTME: In-memory market datasets loaded from CSV files at startup
// ABOUTME: Provides filtered views, facet enumerations, keyword search, and summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Market Data Corpus
//!
//! Three datasets back the chat pipeline and the direct lookup endpoints:
//!
//! - **Market intelligence** (2015-2028): consumer behavior and sentiment metrics per region
//! - **Market trend** (2015-2028): market size/value and growth per region, category, subcategory
//! - **Time series** (2015-2035): units sold and average selling price, historical and forecast
//!
//! All records live in memory for the process lifetime; every read path is a
//! filter over the loaded vectors.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, AppResult};

/// CSV file holding the market intelligence dataset
const INTELLIGENCE_FILE: &str = "market_intelligence_2015_2028.csv";

/// CSV file holding the market trend dataset
const TREND_FILE: &str = "market_trend_product_country_2015_2028.csv";

/// CSV file holding the time series dataset
const TIMESERIES_FILE: &str = "timeseries_subcategory_region_2015_2035.csv";

// ============================================================================
// Records
// ============================================================================

/// Consumer behavior and sentiment metrics for one region-year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceRecord {
    /// Region name
    pub region: String,
    /// Calendar year
    pub year: i32,
    /// Consumer affinity score (1-10)
    pub consumer_affinity_score: f64,
    /// Online search index (100 = 2015 baseline)
    pub online_search_index: f64,
    /// E-commerce ad spend effectiveness (%)
    pub ecommerce_ad_effectiveness: f64,
    /// Social media sentiment, positive share (%)
    pub social_media_sentiment: f64,
}

/// Market size, value, and growth for one region-category-year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRecord {
    /// Region or country name
    pub region: String,
    /// Product category
    pub category: String,
    /// Product subcategory (may be empty)
    pub sub_category: String,
    /// Calendar year
    pub year: i32,
    /// Market size in millions of units
    pub market_size_units_millions: f64,
    /// Market value in USD billions
    pub market_value_usd_billions: f64,
    /// Year-over-year growth rate (%)
    pub yoy_growth_pct: f64,
    /// Five-year CAGR forecast (%)
    pub cagr_5y_forecast_pct: f64,
    /// Key market drivers, free text
    pub key_drivers: String,
}

/// Units sold and pricing for one region-subcategory-year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    /// Region or country name
    pub region: String,
    /// Product category
    pub category: String,
    /// Product subcategory (may be empty)
    pub sub_category: String,
    /// Calendar year
    pub year: i32,
    /// Units sold in millions (actual through 2024, forecast after)
    pub units_sold_millions: f64,
    /// Average selling price in USD
    pub average_selling_price_usd: f64,
}

/// Per-dataset results of a keyword search
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// Matches in the market intelligence dataset
    pub market_intelligence: Vec<IntelligenceRecord>,
    /// Matches in the market trend dataset
    pub market_trend: Vec<TrendRecord>,
    /// Matches in the time series dataset
    pub timeseries: Vec<TimeseriesRecord>,
}

impl SearchResults {
    /// Whether no dataset matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.market_intelligence.is_empty()
            && self.market_trend.is_empty()
            && self.timeseries.is_empty()
    }
}

// ============================================================================
// Corpus
// ============================================================================

/// The loaded market datasets
pub struct MarketCorpus {
    intelligence: Vec<IntelligenceRecord>,
    trend: Vec<TrendRecord>,
    timeseries: Vec<TimeseriesRecord>,
}

impl MarketCorpus {
    /// Load all three datasets from CSV files in the given directory
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or a row cannot be parsed.
    pub fn load(data_dir: &Path) -> AppResult<Self> {
        let intelligence = load_intelligence(&data_dir.join(INTELLIGENCE_FILE))?;
        let trend = load_trend(&data_dir.join(TREND_FILE))?;
        let timeseries = load_timeseries(&data_dir.join(TIMESERIES_FILE))?;

        info!(
            "Market data loaded: {} intelligence, {} trend, {} timeseries records",
            intelligence.len(),
            trend.len(),
            timeseries.len()
        );

        Ok(Self::from_records(intelligence, trend, timeseries))
    }

    /// Build a corpus from already-materialized records (fixtures, tests)
    #[must_use]
    pub fn from_records(
        intelligence: Vec<IntelligenceRecord>,
        trend: Vec<TrendRecord>,
        timeseries: Vec<TimeseriesRecord>,
    ) -> Self {
        Self {
            intelligence,
            trend,
            timeseries,
        }
    }

    // ------------------------------------------------------------------
    // Facets
    // ------------------------------------------------------------------

    /// All regions appearing in any dataset, sorted
    #[must_use]
    pub fn regions(&self) -> Vec<String> {
        let mut regions: BTreeSet<&str> = BTreeSet::new();
        regions.extend(self.intelligence.iter().map(|r| r.region.as_str()));
        regions.extend(self.trend.iter().map(|r| r.region.as_str()));
        regions.extend(self.timeseries.iter().map(|r| r.region.as_str()));
        regions.into_iter().map(str::to_owned).collect()
    }

    /// All product categories, sorted
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: BTreeSet<&str> = BTreeSet::new();
        categories.extend(self.trend.iter().map(|r| r.category.as_str()));
        categories.extend(self.timeseries.iter().map(|r| r.category.as_str()));
        categories.into_iter().map(str::to_owned).collect()
    }

    /// All product subcategories, sorted, empty values excluded
    #[must_use]
    pub fn subcategories(&self) -> Vec<String> {
        let mut subcategories: BTreeSet<&str> = BTreeSet::new();
        subcategories.extend(self.trend.iter().map(|r| r.sub_category.as_str()));
        subcategories.extend(self.timeseries.iter().map(|r| r.sub_category.as_str()));
        subcategories.remove("");
        subcategories.into_iter().map(str::to_owned).collect()
    }

    /// Subcategories observed for one category, sorted
    #[must_use]
    pub fn subcategories_for(&self, category: &str) -> Vec<String> {
        let mut subcategories: BTreeSet<&str> = BTreeSet::new();
        subcategories.extend(
            self.trend
                .iter()
                .filter(|r| r.category == category)
                .map(|r| r.sub_category.as_str()),
        );
        subcategories.extend(
            self.timeseries
                .iter()
                .filter(|r| r.category == category)
                .map(|r| r.sub_category.as_str()),
        );
        subcategories.remove("");
        subcategories.into_iter().map(str::to_owned).collect()
    }

    /// Countries available for selection (time-series regions minus the Global aggregate)
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        let mut countries: BTreeSet<&str> = BTreeSet::new();
        countries.extend(self.timeseries.iter().map(|r| r.region.as_str()));
        countries.extend(self.trend.iter().map(|r| r.region.as_str()));
        countries.remove("Global");
        countries.into_iter().map(str::to_owned).collect()
    }

    /// Category to subcategory mapping across both product datasets
    #[must_use]
    pub fn category_mapping(&self) -> BTreeMap<String, Vec<String>> {
        let mut mapping: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (category, sub) in self
            .trend
            .iter()
            .map(|r| (&r.category, &r.sub_category))
            .chain(self.timeseries.iter().map(|r| (&r.category, &r.sub_category)))
        {
            if !sub.is_empty() {
                mapping
                    .entry(category.clone())
                    .or_default()
                    .insert(sub.clone());
            }
        }
        mapping
            .into_iter()
            .map(|(category, subs)| (category, subs.into_iter().collect()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Filtered views
    // ------------------------------------------------------------------

    /// Market intelligence rows filtered by region and/or year
    #[must_use]
    pub fn market_intelligence(
        &self,
        region: Option<&str>,
        year: Option<i32>,
    ) -> Vec<IntelligenceRecord> {
        self.intelligence
            .iter()
            .filter(|r| region.map_or(true, |v| r.region == v))
            .filter(|r| year.map_or(true, |v| r.year == v))
            .cloned()
            .collect()
    }

    /// Market trend rows filtered by region, category, subcategory, and/or year
    #[must_use]
    pub fn market_trend(
        &self,
        region: Option<&str>,
        category: Option<&str>,
        sub_category: Option<&str>,
        year: Option<i32>,
    ) -> Vec<TrendRecord> {
        self.trend
            .iter()
            .filter(|r| region.map_or(true, |v| r.region == v))
            .filter(|r| category.map_or(true, |v| r.category == v))
            .filter(|r| sub_category.map_or(true, |v| r.sub_category == v))
            .filter(|r| year.map_or(true, |v| r.year == v))
            .cloned()
            .collect()
    }

    /// Time series rows filtered by region, category, subcategory, and/or year
    #[must_use]
    pub fn timeseries(
        &self,
        region: Option<&str>,
        category: Option<&str>,
        sub_category: Option<&str>,
        year: Option<i32>,
    ) -> Vec<TimeseriesRecord> {
        self.timeseries
            .iter()
            .filter(|r| region.map_or(true, |v| r.region == v))
            .filter(|r| category.map_or(true, |v| r.category == v))
            .filter(|r| sub_category.map_or(true, |v| r.sub_category == v))
            .filter(|r| year.map_or(true, |v| r.year == v))
            .cloned()
            .collect()
    }

    /// All trend rows (used by the chart builders)
    #[must_use]
    pub fn trend_rows(&self) -> &[TrendRecord] {
        &self.trend
    }

    /// All time-series rows (used by the chart builders)
    #[must_use]
    pub fn timeseries_rows(&self) -> &[TimeseriesRecord] {
        &self.timeseries
    }

    // ------------------------------------------------------------------
    // Search and summary
    // ------------------------------------------------------------------

    /// Keyword search across all datasets, case-insensitive, capped per dataset
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> SearchResults {
        let needle = query.to_lowercase();
        let matches = |field: &str| field.to_lowercase().contains(&needle);

        SearchResults {
            market_intelligence: self
                .intelligence
                .iter()
                .filter(|r| matches(&r.region))
                .take(limit)
                .cloned()
                .collect(),
            market_trend: self
                .trend
                .iter()
                .filter(|r| {
                    matches(&r.region) || matches(&r.category) || matches(&r.sub_category)
                })
                .take(limit)
                .cloned()
                .collect(),
            timeseries: self
                .timeseries
                .iter()
                .filter(|r| {
                    matches(&r.region) || matches(&r.category) || matches(&r.sub_category)
                })
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    /// Summary of all datasets: record counts, year spans, facet lists
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        let years = |it: &mut dyn Iterator<Item = i32>| {
            let set: BTreeSet<i32> = it.collect();
            set.into_iter().collect::<Vec<_>>()
        };

        serde_json::json!({
            "market_intelligence": {
                "total_records": self.intelligence.len(),
                "years": years(&mut self.intelligence.iter().map(|r| r.year)),
                "regions": self.intelligence.iter().map(|r| r.region.as_str())
                    .collect::<BTreeSet<_>>(),
            },
            "market_trend": {
                "total_records": self.trend.len(),
                "years": years(&mut self.trend.iter().map(|r| r.year)),
                "regions": self.trend.iter().map(|r| r.region.as_str())
                    .collect::<BTreeSet<_>>(),
                "product_categories": self.trend.iter().map(|r| r.category.as_str())
                    .collect::<BTreeSet<_>>(),
                "subcategories": self.trend.iter().map(|r| r.sub_category.as_str())
                    .filter(|s| !s.is_empty()).collect::<BTreeSet<_>>(),
            },
            "timeseries": {
                "total_records": self.timeseries.len(),
                "years": years(&mut self.timeseries.iter().map(|r| r.year)),
                "regions": self.timeseries.iter().map(|r| r.region.as_str())
                    .collect::<BTreeSet<_>>(),
                "product_categories": self.timeseries.iter().map(|r| r.category.as_str())
                    .collect::<BTreeSet<_>>(),
                "subcategories": self.timeseries.iter().map(|r| r.sub_category.as_str())
                    .filter(|s| !s.is_empty()).collect::<BTreeSet<_>>(),
            },
        })
    }
}

// ============================================================================
// CSV loading
// ============================================================================

/// Column name to index lookup built from a CSV header row
struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(header: &[String]) -> Self {
        Self {
            indices: header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_owned(), i))
                .collect(),
        }
    }

    fn text(&self, row: &[String], column: &str) -> AppResult<String> {
        let index = self
            .indices
            .get(column)
            .ok_or_else(|| AppError::invalid_input(format!("missing CSV column '{column}'")))?;
        Ok(row.get(*index).cloned().unwrap_or_default())
    }

    fn number(&self, row: &[String], column: &str) -> AppResult<f64> {
        let raw = self.text(row, column)?;
        if raw.trim().is_empty() {
            return Ok(0.0);
        }
        raw.trim()
            .parse()
            .map_err(|_| AppError::invalid_input(format!("non-numeric value '{raw}' in '{column}'")))
    }

    fn year(&self, row: &[String], column: &str) -> AppResult<i32> {
        let raw = self.text(row, column)?;
        raw.trim()
            .parse()
            .map_err(|_| AppError::invalid_input(format!("non-numeric year '{raw}' in '{column}'")))
    }
}

/// Split one CSV line into fields, honoring double-quoted values
///
/// Quoted fields may contain commas and doubled quotes (`""` escapes `"`).
/// This covers the dataset files; it is not a general CSV implementation.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Read a CSV file into a column map and data rows
fn read_csv(path: &Path) -> AppResult<(ColumnMap, Vec<Vec<String>>)> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("cannot read data file {}: {e}", path.display()))
    })?;

    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .map(split_csv_line)
        .ok_or_else(|| AppError::config(format!("empty data file {}", path.display())))?;

    let columns = ColumnMap::new(&header);
    let rows = lines.map(split_csv_line).collect();
    Ok((columns, rows))
}

fn load_intelligence(path: &Path) -> AppResult<Vec<IntelligenceRecord>> {
    let (columns, rows) = read_csv(path)?;
    rows.iter()
        .map(|row| {
            Ok(IntelligenceRecord {
                region: columns.text(row, "region")?,
                year: columns.year(row, "year")?,
                consumer_affinity_score: columns.number(row, "consumer_affinity_score")?,
                online_search_index: columns.number(row, "online_search_index")?,
                ecommerce_ad_effectiveness: columns.number(row, "ecommerce_ad_effectiveness")?,
                social_media_sentiment: columns.number(row, "social_media_sentiment")?,
            })
        })
        .collect()
}

fn load_trend(path: &Path) -> AppResult<Vec<TrendRecord>> {
    let (columns, rows) = read_csv(path)?;
    rows.iter()
        .map(|row| {
            Ok(TrendRecord {
                region: columns.text(row, "region")?,
                category: columns.text(row, "category")?,
                sub_category: columns.text(row, "sub_category")?,
                year: columns.year(row, "year")?,
                market_size_units_millions: columns.number(row, "market_size_units_millions")?,
                market_value_usd_billions: columns.number(row, "market_value_usd_billions")?,
                yoy_growth_pct: columns.number(row, "yoy_growth_pct")?,
                cagr_5y_forecast_pct: columns.number(row, "cagr_5y_forecast_pct")?,
                key_drivers: columns.text(row, "key_drivers")?,
            })
        })
        .collect()
}

fn load_timeseries(path: &Path) -> AppResult<Vec<TimeseriesRecord>> {
    let (columns, rows) = read_csv(path)?;
    rows.iter()
        .map(|row| {
            Ok(TimeseriesRecord {
                region: columns.text(row, "region")?,
                category: columns.text(row, "category")?,
                sub_category: columns.text(row, "sub_category")?,
                year: columns.year(row, "year")?,
                units_sold_millions: columns.number(row, "units_sold_millions")?,
                average_selling_price_usd: columns.number(row, "average_selling_price_usd")?,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_line_plain() {
        assert_eq!(
            split_csv_line("Germany,2024,7.2"),
            vec!["Germany", "2024", "7.2"]
        );
    }

    #[test]
    fn test_split_csv_line_quoted_comma() {
        assert_eq!(
            split_csv_line(r#"Germany,"Smart home, energy efficiency",1.5"#),
            vec!["Germany", "Smart home, energy efficiency", "1.5"]
        );
    }

    #[test]
    fn test_split_csv_line_escaped_quote() {
        assert_eq!(
            split_csv_line(r#""say ""hi""",2"#),
            vec![r#"say "hi""#, "2"]
        );
    }

    #[test]
    fn test_split_csv_line_trailing_empty_field() {
        assert_eq!(split_csv_line("a,b,"), vec!["a", "b", ""]);
    }
}
