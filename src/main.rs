//! job-feed-notifier — one polling run per invocation.
//! Exit code 0 after a completed (or empty) run, 1 when the run was aborted
//! or the configuration is invalid. Scheduling is left to cron/systemd timers.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use job_feed_notifier::config::BotConfig;
use job_feed_notifier::telemetry::init_tracing;
use job_feed_notifier::{build_pipeline, PipelineError};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env locally; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match BotConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(target: "config", error = %format!("{e:#}"), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        target: "config",
        terms = cfg.keywords.search_keywords.len(),
        include = cfg.keywords.include.len(),
        exclude = cfg.keywords.exclude.len(),
        max_results = cfg.max_results,
        state = %cfg.state_path.display(),
        "starting run"
    );

    // Ctrl-C stops between notifications; state is still saved.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing current item");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let pipeline = build_pipeline(&cfg, cancel);
    match pipeline.run().await {
        Ok(report) => {
            if report.dedup_state_stale() {
                warn!(target: "dedup", "run completed but dedup state may be stale next run");
            }
            info!(
                target: "pipeline",
                notified = report.result.notified_count,
                "summary: posted {} new jobs",
                report.result.notified_count
            );
            ExitCode::SUCCESS
        }
        Err(PipelineError::Source(e)) => {
            error!(target: "pipeline", status = ?e.status, error = %e.message, "source unavailable");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(target: "pipeline", error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}
