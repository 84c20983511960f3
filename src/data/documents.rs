// ABOUTME: Region document library backing the competitive-analysis endpoints
// ABOUTME: Loads per-region text corpora from dataset folders and serves keyword search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # Document Library
//!
//! Region-specific market reports live as plain text/markdown files under
//! `<data_dir>/<region>_dataset/` folders. The library loads them once at
//! startup and serves the document text and keyword search to the
//! competitive-analysis read paths. A missing or unreadable folder degrades to
//! an empty region rather than failing startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

/// Folder suffix marking a region document directory
const DATASET_SUFFIX: &str = "_dataset";

/// Characters of surrounding text included in a search excerpt
const EXCERPT_RADIUS: usize = 120;

/// A search hit inside one region document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentExcerpt {
    /// Region the document belongs to
    pub region: String,
    /// Document file name
    pub document: String,
    /// Text surrounding the match
    pub excerpt: String,
}

/// In-memory library of per-region market documents
#[derive(Debug, Default)]
pub struct DocumentLibrary {
    /// region name -> file name -> extracted text
    documents: BTreeMap<String, BTreeMap<String, String>>,
}

impl DocumentLibrary {
    /// Create an empty library
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all region document folders found under the data directory
    ///
    /// Folders named `<region>_dataset` are scanned for `.md` and `.txt`
    /// files. Unreadable entries are skipped with a warning.
    #[must_use]
    pub fn load(data_dir: &Path) -> Self {
        let mut documents = BTreeMap::new();

        let Ok(entries) = std::fs::read_dir(data_dir) else {
            warn!(
                "Document directory {} not readable; library is empty",
                data_dir.display()
            );
            return Self::default();
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_dir() || !name.ends_with(DATASET_SUFFIX) {
                continue;
            }

            let region = region_display_name(name);
            let region_docs = load_region_documents(&path);
            if !region_docs.is_empty() {
                documents.insert(region, region_docs);
            }
        }

        let total: usize = documents.values().map(BTreeMap::len).sum();
        info!(
            "Document library loaded: {} documents across {} regions",
            total,
            documents.len()
        );

        Self { documents }
    }

    /// Regions with at least one document, sorted
    #[must_use]
    pub fn regions(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Documents for one region (file name -> text)
    #[must_use]
    pub fn documents_for(&self, region: &str) -> Option<&BTreeMap<String, String>> {
        self.documents.get(region)
    }

    /// Whether the library holds no documents
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Keyword search across all documents, ASCII-case-insensitive, capped
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<DocumentExcerpt> {
        // ASCII lowercasing preserves byte offsets, so a match position in the
        // lowered text indexes the original safely
        let needle = query.to_ascii_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for (region, docs) in &self.documents {
            for (name, text) in docs {
                if let Some(at) = text.to_ascii_lowercase().find(&needle) {
                    hits.push(DocumentExcerpt {
                        region: region.clone(),
                        document: name.clone(),
                        excerpt: excerpt_around(text, at, needle.len()),
                    });
                    if hits.len() >= limit {
                        return hits;
                    }
                }
            }
        }
        hits
    }
}

/// Turn `india_dataset` into `India`
fn region_display_name(folder: &str) -> String {
    let base = folder.trim_end_matches(DATASET_SUFFIX);
    let mut chars = base.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Read all text documents in one region folder
fn load_region_documents(dir: &Path) -> BTreeMap<String, String> {
    let mut docs = BTreeMap::new();

    let Ok(entries) = std::fs::read_dir(dir) else {
        warn!("Cannot read region folder {}", dir.display());
        return docs;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "md" || e == "txt");
        if !is_text {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("document")
                    .to_owned();
                docs.insert(name, normalize_paragraphs(&content));
            }
            Err(e) => warn!("Skipping unreadable document {}: {e}", path.display()),
        }
    }

    docs
}

/// Collapse the document to non-empty paragraph lines
fn normalize_paragraphs(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut an excerpt around a match position, aligned to char boundaries
fn excerpt_around(text: &str, at: usize, match_len: usize) -> String {
    let mut start = at.saturating_sub(EXCERPT_RADIUS);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (at + match_len + EXCERPT_RADIUS).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }

    text[start..end].trim().replace('\n', " ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_region_display_name() {
        assert_eq!(region_display_name("india_dataset"), "India");
        assert_eq!(region_display_name("vietnam_dataset"), "Vietnam");
    }

    #[test]
    fn test_normalize_paragraphs_drops_blanks() {
        let text = "Line one\n\n   \nLine two  \n";
        assert_eq!(normalize_paragraphs(text), "Line one\nLine two");
    }

    #[test]
    fn test_search_finds_excerpt() {
        let mut docs = BTreeMap::new();
        let mut india = BTreeMap::new();
        india.insert(
            "market.md".to_owned(),
            "The washing machine segment grew strongly in urban areas.".to_owned(),
        );
        docs.insert("India".to_owned(), india);
        let library = DocumentLibrary { documents: docs };

        let hits = library.search("washing machine", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].region, "India");
        assert!(hits[0].excerpt.contains("washing machine"));
    }

    #[test]
    fn test_search_empty_query_returns_nothing() {
        let library = DocumentLibrary::empty();
        assert!(library.search("", 5).is_empty());
    }
}
