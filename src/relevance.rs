// src/relevance.rs
//! Include/exclude keyword gate.
//!
//! Matching is a plain case-insensitive substring test with no word boundaries,
//! so short keywords over-match (`"ai"` is found inside `"said"`, `"pm"` inside
//! `"npm"`). That trade favours recall and is kept as-is.

use serde::{Deserialize, Serialize};

use crate::ingest::types::Item;

/// Keyword lists as configured. Case is irrelevant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Lower-cased view of a `FilterConfig`, built once per run.
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

// Keywords keep their surrounding whitespace: `" ai "` is the only way to ask
// for a whole word under substring matching. Empty strings would match every
// text and are dropped.
fn lowered(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

impl RelevanceFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            include: lowered(&config.include),
            exclude: lowered(&config.exclude),
        }
    }

    pub fn is_relevant_text(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        // Empty include list = no positive filter.
        let has_include =
            self.include.is_empty() || self.include.iter().any(|k| text.contains(k.as_str()));
        let has_exclude = self.exclude.iter().any(|k| text.contains(k.as_str()));
        has_include && !has_exclude
    }

    pub fn is_relevant(&self, item: &Item) -> bool {
        self.is_relevant_text(&item.text)
    }

    /// First include keyword found in `text`, for logging.
    pub fn matched_include(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.include
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }

    /// First exclude keyword found in `text`, for logging.
    pub fn matched_exclude(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.exclude
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }
}

pub fn is_relevant(item: &Item, config: &FilterConfig) -> bool {
    RelevanceFilter::new(config).is_relevant(item)
}

/// Keep relevant items, preserving fetch order.
pub fn filter_relevant(items: Vec<Item>, config: &FilterConfig) -> Vec<Item> {
    let filter = RelevanceFilter::new(config);
    items.into_iter().filter(|it| filter.is_relevant(it)).collect()
}
