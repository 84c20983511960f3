// ABOUTME: Market data layer - CSV-backed datasets, chart builders, document corpora
// ABOUTME: Thin filtering and formatting glue over in-memory records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! Market data layer

/// ECharts configuration builders
pub mod charts;

/// In-memory market datasets with filtering, facets, and search
pub mod corpus;

/// Region document library
pub mod documents;

pub use corpus::{
    IntelligenceRecord, MarketCorpus, SearchResults, TimeseriesRecord, TrendRecord,
};
pub use documents::DocumentLibrary;
