// src/telemetry.rs
//! Logging setup and metric descriptions.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series carry descriptions once a recorder exists).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Items returned by the search source.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Search source transport/HTTP/decode failures."
        );
        describe_histogram!("ingest_fetch_ms", "Search request time in milliseconds.");
        describe_counter!(
            "pipeline_seen_total",
            "Items skipped because their id was already notified."
        );
        describe_counter!(
            "pipeline_irrelevant_total",
            "Items dropped by the include/exclude filter."
        );
        describe_counter!("notify_sent_total", "Notifications delivered.");
        describe_counter!("notify_failed_total", "Notifications rejected or not sent.");
        describe_counter!(
            "dedup_persist_errors_total",
            "Failed writes of the dedup state file."
        );
        describe_counter!("pipeline_runs_failed_total", "Runs aborted before notifying.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a run."
        );
    });
}
