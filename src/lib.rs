// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod relevance;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::dedup::{DedupSet, DedupStore, JsonFileStore};
pub use crate::error::{PersistenceError, PipelineError, SinkError, SourceUnavailable};
pub use crate::ingest::types::{Item, ItemSource};
pub use crate::notify::{Delivered, NotificationSink};
pub use crate::pipeline::{Pipeline, RunReport, RunResult, RunState, SearchSpec};
pub use crate::relevance::{is_relevant, FilterConfig};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::BotConfig;
use crate::ingest::providers::twitter::TwitterSearchProvider;
use crate::notify::slack::SlackNotifier;

/// Wire the production adapters (X search, Slack webhook, JSON state file).
pub fn build_pipeline(
    cfg: &BotConfig,
    cancel: Arc<AtomicBool>,
) -> Pipeline<TwitterSearchProvider, SlackNotifier, JsonFileStore> {
    let source =
        TwitterSearchProvider::new(cfg.bearer_token.clone()).with_base_url(cfg.api_base.clone());
    let sink = SlackNotifier::new(cfg.webhook_url.clone());
    let store = JsonFileStore::new(cfg.state_path.clone());
    let search = SearchSpec {
        query_terms: cfg.keywords.search_keywords.clone(),
        max_results: cfg.max_results,
    };

    Pipeline::new(source, sink, store, search, &cfg.keywords.filter())
        .with_notify_delay(cfg.notify_delay)
        .with_cancel_flag(cancel)
}
