// ABOUTME: ECharts configuration builders for market visualizations
// ABOUTME: Aggregates trend data into stacked/line/grouped/percentage chart configs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Chart Configuration Builders
//!
//! Produces the ECharts configuration JSON served by the direct chart
//! endpoints and referenced by the assistant's answers. The exact visual
//! fields are presentation glue; the data aggregation (country to standard
//! region, year range, per-region sums) is what the endpoints contract on.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::corpus::MarketCorpus;

/// Default year range for chart aggregation
const DEFAULT_YEAR_RANGE: (i32, i32) = (2018, 2030);

/// The five standard reporting regions, in display order
pub const STANDARD_REGIONS: [&str; 5] = [
    "North America",
    "Europe",
    "Asia Pacific",
    "Latin America",
    "MEA",
];

/// Fixed per-region palette
const REGION_COLORS: [(&str, &str); 5] = [
    ("North America", "#4A90E2"),
    ("Europe", "#7ED321"),
    ("Asia Pacific", "#F5A623"),
    ("Latin America", "#D0021B"),
    ("MEA", "#9013FE"),
];

/// Supported chart types for the `/data/chart` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartType {
    /// Stacked bar chart (default)
    #[default]
    StackedBar,
    /// Line chart per region
    Line,
    /// Side-by-side bars per region
    GroupedBar,
    /// Stacked bars normalized to 100% per year
    PercentageStacked,
}

impl ChartType {
    /// Parse from the query-string value, defaulting to stacked bar
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "line" => Self::Line,
            "grouped_bar" => Self::GroupedBar,
            "percentage_stacked" => Self::PercentageStacked,
            _ => Self::StackedBar,
        }
    }
}

/// Map a country to its standard reporting region
#[must_use]
pub fn standard_region(country: &str) -> &'static str {
    match country {
        "USA" | "Canada" | "North America" => "North America",
        "Germany" | "France" | "United Kingdom" | "Italy" | "Spain" | "Netherlands"
        | "Sweden" | "Norway" | "Denmark" | "Finland" | "Austria" | "Belgium"
        | "Switzerland" | "Poland" | "Czech Republic" | "Hungary" | "Greece" | "Portugal"
        | "Ireland" | "Luxembourg" | "Europe" => "Europe",
        "China" | "Japan" | "South Korea" | "India" | "Australia" | "Singapore"
        | "Thailand" | "Malaysia" | "Indonesia" | "Philippines" | "Vietnam" | "Taiwan"
        | "Asia Pacific" => "Asia Pacific",
        "Brazil" | "Mexico" | "Argentina" | "Chile" | "Colombia" | "Peru"
        | "Latin America" => "Latin America",
        "UAE" | "Saudi Arabia" | "South Africa" | "Egypt" | "Turkey" | "Israel" | "MEA" => "MEA",
        _ => "Other",
    }
}

fn region_color(region: &str) -> &'static str {
    REGION_COLORS
        .iter()
        .find(|(name, _)| *name == region)
        .map_or("#999999", |(_, color)| color)
}

/// Aggregated chart-ready data: market value per standard region per year
#[derive(Debug, Clone)]
pub struct StackedChartData {
    /// Years on the x-axis, as strings
    pub years: Vec<String>,
    /// Market value sums keyed by standard region, aligned with `years`
    pub series: BTreeMap<&'static str, Vec<f64>>,
    /// Total market value per year
    pub totals: Vec<f64>,
}

/// Aggregate trend data into per-region market value sums over the year range
#[must_use]
pub fn prepare_stacked_data(corpus: &MarketCorpus, category: Option<&str>) -> StackedChartData {
    let (from, to) = DEFAULT_YEAR_RANGE;

    // year -> standard region -> summed market value
    let mut sums: BTreeMap<i32, BTreeMap<&'static str, f64>> = BTreeMap::new();
    for record in corpus.trend_rows() {
        if record.year < from || record.year > to {
            continue;
        }
        if category.map_or(false, |c| record.category != c) {
            continue;
        }
        let region = standard_region(&record.region);
        if region == "Other" {
            continue;
        }
        *sums
            .entry(record.year)
            .or_default()
            .entry(region)
            .or_default() += record.market_value_usd_billions;
    }

    let years: Vec<i32> = sums.keys().copied().collect();
    let mut series: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
    for region in STANDARD_REGIONS {
        let values = years
            .iter()
            .map(|year| {
                sums.get(year)
                    .and_then(|by_region| by_region.get(region))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        series.insert(region, values);
    }

    let totals = years
        .iter()
        .map(|year| {
            sums.get(year)
                .map_or(0.0, |by_region| by_region.values().sum())
        })
        .collect();

    StackedChartData {
        years: years.iter().map(ToString::to_string).collect(),
        series,
        totals,
    }
}

/// Build a full ECharts configuration for the aggregated trend data
#[must_use]
pub fn echarts_config(
    corpus: &MarketCorpus,
    category: Option<&str>,
    title: &str,
    chart_type: ChartType,
) -> Value {
    let data = prepare_stacked_data(corpus, category);

    if data.years.is_empty() {
        return json!({
            "error": "No data available for the requested selection"
        });
    }

    let subtext = format!(
        "Market Size by Region, {}-{}",
        data.years[0],
        data.years[data.years.len() - 1]
    );

    let series: Vec<Value> = STANDARD_REGIONS
        .iter()
        .map(|region| {
            let values = data.series.get(region).cloned().unwrap_or_default();
            build_series(region, values, &data.totals, chart_type)
        })
        .collect();

    let y_axis = match chart_type {
        ChartType::PercentageStacked => json!({
            "type": "value",
            "name": "Market Share (%)",
            "max": 100,
            "axisLabel": {"formatter": "{value}%"},
        }),
        _ => json!({
            "type": "value",
            "name": "Market Size (US$B)",
            "axisLabel": {"formatter": "${value}B"},
        }),
    };

    json!({
        "chartConfig": {
            "title": {"text": title, "subtext": subtext, "left": "center"},
            "tooltip": {"trigger": "axis", "axisPointer": {"type": "shadow"}},
            "legend": {"data": STANDARD_REGIONS, "bottom": "0%"},
            "grid": {"left": "3%", "right": "4%", "bottom": "15%", "top": "15%", "containLabel": true},
            "xAxis": {"type": "category", "data": data.years},
            "yAxis": y_axis,
            "series": series,
        }
    })
}

/// Build one series entry for the requested chart type
fn build_series(
    region: &'static str,
    values: Vec<f64>,
    totals: &[f64],
    chart_type: ChartType,
) -> Value {
    let color = region_color(region);
    match chart_type {
        ChartType::StackedBar => json!({
            "name": region, "type": "bar", "stack": "total",
            "data": values, "itemStyle": {"color": color},
        }),
        ChartType::Line => json!({
            "name": region, "type": "line", "smooth": true,
            "data": values, "itemStyle": {"color": color},
        }),
        ChartType::GroupedBar => json!({
            "name": region, "type": "bar",
            "data": values, "itemStyle": {"color": color},
        }),
        ChartType::PercentageStacked => {
            let shares: Vec<f64> = values
                .iter()
                .zip(totals)
                .map(|(value, total)| {
                    if *total > 0.0 {
                        (value / total * 1000.0).round() / 10.0
                    } else {
                        0.0
                    }
                })
                .collect();
            json!({
                "name": region, "type": "bar", "stack": "total",
                "data": shares, "itemStyle": {"color": color},
            })
        }
    }
}

/// Build the direct-result payload for one category/subcategory/country selection
///
/// Returns the time-series rows for the selection plus a line chart of units
/// sold over time - no LLM involved.
#[must_use]
pub fn direct_result(
    corpus: &MarketCorpus,
    category: &str,
    subcategory: &str,
    country: &str,
) -> Value {
    let rows = corpus.timeseries(Some(country), Some(category), Some(subcategory), None);

    if rows.is_empty() {
        return json!({
            "error": format!(
                "No data available for {category} / {subcategory} in {country}"
            )
        });
    }

    let years: Vec<String> = rows.iter().map(|r| r.year.to_string()).collect();
    let units: Vec<f64> = rows.iter().map(|r| r.units_sold_millions).collect();
    let prices: Vec<f64> = rows.iter().map(|r| r.average_selling_price_usd).collect();

    json!({
        "category": category,
        "subcategory": subcategory,
        "country": country,
        "data": rows,
        "chartConfig": {
            "title": {
                "text": format!("{category} ({subcategory}) - {country}"),
                "subtext": "Units Sold and Average Selling Price",
                "left": "center",
            },
            "tooltip": {"trigger": "axis"},
            "legend": {"data": ["Units Sold (M)", "ASP (US$)"], "bottom": "0%"},
            "xAxis": {"type": "category", "data": years},
            "yAxis": [
                {"type": "value", "name": "Units (M)"},
                {"type": "value", "name": "ASP (US$)"},
            ],
            "series": [
                {"name": "Units Sold (M)", "type": "bar", "data": units},
                {"name": "ASP (US$)", "type": "line", "yAxisIndex": 1, "data": prices},
            ],
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data::corpus::TrendRecord;

    fn trend(region: &str, category: &str, year: i32, value: f64) -> TrendRecord {
        TrendRecord {
            region: region.to_owned(),
            category: category.to_owned(),
            sub_category: String::new(),
            year,
            market_size_units_millions: 1.0,
            market_value_usd_billions: value,
            yoy_growth_pct: 2.0,
            cagr_5y_forecast_pct: 3.0,
            key_drivers: String::new(),
        }
    }

    fn corpus() -> MarketCorpus {
        MarketCorpus::from_records(
            vec![],
            vec![
                trend("Germany", "Refrigerators", 2020, 1.5),
                trend("France", "Refrigerators", 2020, 0.5),
                trend("USA", "Refrigerators", 2020, 3.0),
                trend("Germany", "Refrigerators", 2021, 2.0),
                // Outside the default year range, must be excluded
                trend("Germany", "Refrigerators", 2015, 9.0),
            ],
            vec![],
        )
    }

    #[test]
    fn test_country_to_standard_region() {
        assert_eq!(standard_region("Germany"), "Europe");
        assert_eq!(standard_region("USA"), "North America");
        assert_eq!(standard_region("Vietnam"), "Asia Pacific");
        assert_eq!(standard_region("Atlantis"), "Other");
    }

    #[test]
    fn test_prepare_stacked_data_sums_by_region() {
        let data = prepare_stacked_data(&corpus(), Some("Refrigerators"));
        assert_eq!(data.years, vec!["2020", "2021"]);
        assert_eq!(data.series.get("Europe").unwrap(), &vec![2.0, 2.0]);
        assert_eq!(data.series.get("North America").unwrap(), &vec![3.0, 0.0]);
        assert_eq!(data.totals, vec![5.0, 2.0]);
    }

    #[test]
    fn test_echarts_config_has_chart_config_key() {
        let config = echarts_config(&corpus(), None, "Market Analysis", ChartType::StackedBar);
        assert!(config.get("chartConfig").is_some());
        let series = &config["chartConfig"]["series"];
        assert_eq!(series.as_array().unwrap().len(), STANDARD_REGIONS.len());
    }

    #[test]
    fn test_percentage_stacked_normalizes_to_share() {
        let config = echarts_config(&corpus(), None, "t", ChartType::PercentageStacked);
        let series = config["chartConfig"]["series"].as_array().unwrap();
        let europe = series
            .iter()
            .find(|s| s["name"] == "Europe")
            .unwrap();
        assert_eq!(europe["data"][0], 40.0);
        assert_eq!(europe["data"][1], 100.0);
    }

    #[test]
    fn test_empty_selection_reports_error() {
        let config = echarts_config(
            &corpus(),
            Some("Toasters"),
            "t",
            ChartType::StackedBar,
        );
        assert!(config.get("error").is_some());
    }

    #[test]
    fn test_chart_type_parse() {
        assert_eq!(ChartType::parse("line"), ChartType::Line);
        assert_eq!(ChartType::parse("anything"), ChartType::StackedBar);
    }
}
