// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceUnavailable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,     // display name
    pub username: String, // handle, without '@'
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Engagement {
    pub likes: u64,
    pub reposts: u64,
}

/// A candidate post. Never mutated after the source hands it over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<Author>,
    pub metrics: Engagement,
    pub url: Option<String>,
}

impl Item {
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map_or("Unknown", |a| a.name.as_str())
    }

    pub fn author_username(&self) -> &str {
        self.author.as_ref().map_or("unknown", |a| a.username.as_str())
    }
}

/// Permalink for a post; only resolvable when the author handle is known.
pub fn permalink(author: Option<&Author>, id: &str) -> Option<String> {
    author.map(|a| format!("https://twitter.com/{}/status/{}", a.username, id))
}

#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    /// Terms are OR-combined. An empty result is `Ok(vec![])`, never an error.
    async fn fetch(
        &self,
        query_terms: &[String],
        max_results: u32,
    ) -> Result<Vec<Item>, SourceUnavailable>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permalink_needs_author() {
        let a = Author {
            name: "Ada".into(),
            username: "ada".into(),
        };
        assert_eq!(
            permalink(Some(&a), "42").as_deref(),
            Some("https://twitter.com/ada/status/42")
        );
        assert_eq!(permalink(None, "42"), None);
    }

    #[test]
    fn missing_author_falls_back() {
        let it = Item {
            id: "1".into(),
            text: "x".into(),
            created_at: Utc::now(),
            author: None,
            metrics: Engagement::default(),
            url: None,
        };
        assert_eq!(it.author_name(), "Unknown");
        assert_eq!(it.author_username(), "unknown");
    }
}
