//! Watch mode: run the orchestrator on a fixed interval until shutdown.
//!
//! Each run happens on the blocking pool; the loop itself only waits on the
//! interval and the shutdown signal. A failed run is logged and the loop
//! keeps going. Shutdown is only observed between runs, so a swap that has
//! stopped the service always finishes its window.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use updraft_core::RunOutcome;
use updraft_engine::Orchestrator;

use crate::error::{io_err, DaemonError};
use crate::log_rotation::rotate_sink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub runs: usize,
    pub updates: usize,
    pub failures: usize,
}

/// Build a runtime and watch until ctrl-c.
pub fn watch_blocking(
    orchestrator: Orchestrator,
    interval: Duration,
) -> Result<WatchSummary, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(async move {
        let (signal_tx, signal_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let _ = signal_tx.send(tokio::signal::ctrl_c().await);
        });
        let shutdown = async move {
            match signal_rx.await {
                Ok(Ok(())) => tracing::info!("received ctrl-c, stopping watch"),
                Ok(Err(err)) => tracing::error!(error = %err, "ctrl-c handler failed, stopping watch"),
                Err(_) => {}
            }
        };
        watch_until(Arc::new(orchestrator), interval, shutdown).await
    })
}

/// Run immediately, then every `interval`, until `shutdown` resolves.
pub async fn watch_until<F>(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    shutdown: F,
) -> Result<WatchSummary, DaemonError>
where
    F: Future<Output = ()>,
{
    let log_file: PathBuf = orchestrator.config().log_file.clone();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = WatchSummary::default();

    tracing::info!(interval_secs = interval.as_secs(), "watching for updates");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let worker = orchestrator.clone();
                let sink = log_file.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    rotate_sink(&sink);
                    worker.run()
                })
                .await?;

                summary.runs += 1;
                match outcome {
                    RunOutcome::Updated(_) => summary.updates += 1,
                    RunOutcome::Failed(_) => summary.failures += 1,
                    RunOutcome::NoUpdateNeeded => {}
                }
            }
        }
    }

    tracing::info!(
        runs = summary.runs,
        updates = summary.updates,
        failures = summary.failures,
        "watch stopped"
    );
    Ok(summary)
}
