// src/ingest/providers/twitter.rs
//! X (Twitter) v2 recent-search provider.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;

use crate::error::SourceUnavailable;
use crate::ingest::build_query;
use crate::ingest::normalize_text;
use crate::ingest::types::{permalink, Author, Engagement, Item, ItemSource};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Recent search only looks this far back.
pub const LOOKBACK_HOURS: i64 = 24;

// Recent search accepts 10..=100 results per page.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<Tweet>>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
    author_id: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    name: String,
    username: String,
}

pub struct TwitterSearchProvider {
    base_url: String,
    bearer_token: String,
    client: Client,
    timeout: Duration,
}

impl TwitterSearchProvider {
    pub fn new(bearer_token: String) -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            bearer_token,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Point at another host (stub servers in tests, API proxies).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn search_url(&self) -> String {
        format!("{}/2/tweets/search/recent", self.base_url)
    }

    fn into_items(resp: SearchResponse, fetched_at: DateTime<Utc>) -> Vec<Item> {
        let users: HashMap<String, Author> = resp
            .includes
            .unwrap_or_default()
            .users
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    Author {
                        name: u.name,
                        username: u.username,
                    },
                )
            })
            .collect();

        resp.data
            .unwrap_or_default()
            .into_iter()
            .map(|t| {
                let author = t.author_id.as_ref().and_then(|id| users.get(id)).cloned();
                let metrics = t
                    .public_metrics
                    .map(|m| Engagement {
                        likes: m.like_count,
                        reposts: m.retweet_count,
                    })
                    .unwrap_or_default();
                Item {
                    url: permalink(author.as_ref(), &t.id),
                    text: normalize_text(&t.text),
                    created_at: t.created_at.unwrap_or(fetched_at),
                    id: t.id,
                    author,
                    metrics,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ItemSource for TwitterSearchProvider {
    async fn fetch(
        &self,
        query_terms: &[String],
        max_results: u32,
    ) -> Result<Vec<Item>, SourceUnavailable> {
        let t0 = Instant::now();
        let query = build_query(query_terms)
            .map_err(|e| SourceUnavailable::transport(format!("invalid query: {e:#}")))?;
        let now = Utc::now();
        let start_time = (now - ChronoDuration::hours(LOOKBACK_HOURS))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let max = max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string();

        let rsp = self
            .client
            .get(self.search_url())
            .bearer_auth(&self.bearer_token)
            .timeout(self.timeout)
            .query(&[
                ("query", query.as_str()),
                ("max_results", max.as_str()),
                ("start_time", start_time.as_str()),
                ("tweet.fields", "created_at,author_id,public_metrics,entities"),
                ("expansions", "author_id"),
                ("user.fields", "username,name"),
            ])
            .send()
            .await
            .map_err(|e| {
                counter!("ingest_provider_errors_total").increment(1);
                SourceUnavailable::from(e)
            })?;

        let status = rsp.status();
        let body = rsp.text().await.map_err(SourceUnavailable::from)?;
        if !status.is_success() {
            counter!("ingest_provider_errors_total").increment(1);
            return Err(SourceUnavailable::http(status.as_u16(), body));
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            counter!("ingest_provider_errors_total").increment(1);
            SourceUnavailable::transport(format!("decoding search response: {e}"))
        })?;
        let mut items = Self::into_items(parsed, now);
        // The API floor is 10 per page; the caller's cap still holds.
        items.truncate(max_results as usize);

        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("ingest_events_total").increment(items.len() as u64);
        tracing::debug!(target: "ingest", provider = self.name(), count = items.len(), "search ok");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}
