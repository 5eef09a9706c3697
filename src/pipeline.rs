// src/pipeline.rs
//! One run: load dedup state → fetch → drop already-notified → filter →
//! notify → persist.
//!
//! The dedup set is owned by the run: loaded once, updated only after a
//! confirmed delivery, written back once. A fetch failure aborts before any
//! side effect; everything after the fetch is per-item and never aborts.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;

use crate::dedup::{DedupSet, DedupStore};
use crate::error::{PersistenceError, PipelineError};
use crate::ingest::types::{Item, ItemSource};
use crate::notify::NotificationSink;
use crate::relevance::{FilterConfig, RelevanceFilter};
use crate::telemetry::ensure_metrics_described;

pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Fetching,
    Filtering,
    Notifying,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub fetched_count: usize,
    pub already_seen_count: usize,
    /// Items that passed the relevance filter.
    pub filtered_count: usize,
    pub notified_count: usize,
    pub failed_count: usize,
    pub cancelled: bool,
}

/// A run that got past the fetch.
#[derive(Debug)]
pub struct RunReport {
    pub result: RunResult,
    pub state: RunState,
    /// Set when the final write failed; next run may re-announce this run's items.
    pub persist_error: Option<PersistenceError>,
}

impl RunReport {
    pub fn dedup_state_stale(&self) -> bool {
        self.persist_error.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub query_terms: Vec<String>,
    pub max_results: u32,
}

pub struct Pipeline<S, N, D> {
    source: S,
    sink: N,
    store: D,
    search: SearchSpec,
    filter: RelevanceFilter,
    notify_delay: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S, N, D> Pipeline<S, N, D>
where
    S: ItemSource,
    N: NotificationSink,
    D: DedupStore,
{
    pub fn new(source: S, sink: N, store: D, search: SearchSpec, filter: &FilterConfig) -> Self {
        Self {
            source,
            sink,
            store,
            search,
            filter: RelevanceFilter::new(filter),
            notify_delay: DEFAULT_NOTIFY_DELAY,
            cancel: None,
        }
    }

    /// Pause between consecutive notify calls.
    pub fn with_notify_delay(mut self, delay: Duration) -> Self {
        self.notify_delay = delay;
        self
    }

    /// Checked before every notify call; once set, remaining items wait for the next run.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();
        let mut state = RunState::Idle;

        let dedup = self.store.load().await.map_err(|e| {
            tracing::error!(target: "pipeline", error = %e, "dedup state unreadable, aborting");
            counter!("pipeline_runs_failed_total").increment(1);
            e
        })?;

        transition(&mut state, RunState::Fetching);
        let fetched = match self
            .source
            .fetch(&self.search.query_terms, self.search.max_results)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                transition(&mut state, RunState::Failed);
                tracing::error!(
                    target: "pipeline",
                    source = self.source.name(),
                    status = ?e.status,
                    error = %e.message,
                    "fetch failed, run aborted"
                );
                counter!("pipeline_runs_failed_total").increment(1);
                return Err(e.into());
            }
        };

        let mut result = RunResult {
            fetched_count: fetched.len(),
            ..RunResult::default()
        };

        transition(&mut state, RunState::Filtering);
        let (fresh, seen) = drop_already_notified(fetched, &dedup);
        result.already_seen_count = seen;
        counter!("pipeline_seen_total").increment(seen as u64);

        let relevant = self.select_relevant(fresh);
        result.filtered_count = relevant.len();
        tracing::info!(
            target: "pipeline",
            fetched = result.fetched_count,
            already_seen = seen,
            relevant = result.filtered_count,
            "candidates selected"
        );

        transition(&mut state, RunState::Notifying);
        let dedup = self.notify_all(&relevant, dedup, &mut result).await;

        transition(&mut state, RunState::Persisting);
        let persist_error = self.persist(dedup).await;

        transition(&mut state, RunState::Done);
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "pipeline",
            fetched = result.fetched_count,
            relevant = result.filtered_count,
            notified = result.notified_count,
            failed = result.failed_count,
            cancelled = result.cancelled,
            stale_state = persist_error.is_some(),
            "run finished"
        );

        Ok(RunReport {
            result,
            state,
            persist_error,
        })
    }

    fn select_relevant(&self, items: Vec<Item>) -> Vec<Item> {
        let mut kept = Vec::with_capacity(items.len());
        for it in items {
            if self.filter.is_relevant(&it) {
                tracing::debug!(
                    target: "pipeline",
                    id = %it.id,
                    keyword = self.filter.matched_include(&it.text).unwrap_or("*"),
                    "relevant"
                );
                kept.push(it);
            } else {
                counter!("pipeline_irrelevant_total").increment(1);
                tracing::trace!(
                    target: "pipeline",
                    id = %it.id,
                    excluded_by = ?self.filter.matched_exclude(&it.text),
                    "not relevant"
                );
            }
        }
        kept
    }

    async fn notify_all(
        &self,
        items: &[Item],
        mut dedup: DedupSet,
        result: &mut RunResult,
    ) -> DedupSet {
        for (i, item) in items.iter().enumerate() {
            if self.cancelled() {
                result.cancelled = true;
                tracing::warn!(
                    target: "pipeline",
                    remaining = items.len() - i,
                    "cancelled, remaining items left for next run"
                );
                break;
            }
            if i > 0 && !self.notify_delay.is_zero() {
                tokio::time::sleep(self.notify_delay).await;
            }

            match self.sink.notify(item).await {
                Ok(delivered) => {
                    dedup.mark_notified(item.id.clone());
                    result.notified_count += 1;
                    counter!("notify_sent_total").increment(1);
                    tracing::info!(
                        target: "notify",
                        sink = self.sink.name(),
                        id = %item.id,
                        status = delivered.status,
                        "delivered"
                    );
                }
                Err(e) => {
                    result.failed_count += 1;
                    counter!("notify_failed_total").increment(1);
                    tracing::warn!(
                        target: "notify",
                        sink = self.sink.name(),
                        id = %item.id,
                        status = ?e.status,
                        body = %e.body,
                        "not delivered, will retry next run"
                    );
                }
            }
        }
        dedup
    }

    async fn persist(&self, mut dedup: DedupSet) -> Option<PersistenceError> {
        dedup.touch(Utc::now());
        match self.store.persist(&dedup).await {
            Ok(()) => None,
            Err(e) => {
                counter!("dedup_persist_errors_total").increment(1);
                tracing::warn!(
                    target: "dedup",
                    error = %e,
                    "dedup state not saved; items notified in this run may be re-announced next run"
                );
                Some(e)
            }
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!(target: "pipeline", from = %state, to = %next, "state");
    *state = next;
}

/// Split off items whose id is already recorded, plus repeats within the batch.
/// Returns (fresh items in fetch order, number dropped).
pub fn drop_already_notified(items: Vec<Item>, dedup: &DedupSet) -> (Vec<Item>, usize) {
    let mut batch_ids: HashSet<String> = HashSet::with_capacity(items.len());
    let mut fresh = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for it in items {
        if dedup.contains(&it.id) || !batch_ids.insert(it.id.clone()) {
            dropped += 1;
            continue;
        }
        fresh.push(it);
    }
    (fresh, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Engagement;

    fn item(id: &str) -> Item {
        Item {
            id: id.into(),
            text: "t".into(),
            created_at: Utc::now(),
            author: None,
            metrics: Engagement::default(),
            url: None,
        }
    }

    #[test]
    fn known_and_repeated_ids_are_dropped_in_order() {
        let dedup: DedupSet = ["2"].into_iter().collect();
        let (fresh, dropped) =
            drop_already_notified(vec![item("1"), item("2"), item("3"), item("1")], &dedup);
        let ids: Vec<&str> = fresh.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(dropped, 2);
    }
}
