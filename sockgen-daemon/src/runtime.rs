//! Daemon runtime: filesystem watcher feeding the debounced reconciliation
//! loop.
//!
//! Two tasks: the main loop blocks on the raw notify event stream and
//! forwards every notification; the debouncer task owns all reconciliation
//! cycles. Because a cycle only ever runs on the debouncer task, cycles are
//! totally ordered and no lock guards the output file or host map.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use sockgen_sync::Pipeline;

use crate::debounce::ChangeDebouncer;
use crate::error::{io_err, DaemonError};

/// Filesystem locations to watch: the scan roots (recursively) and the
/// template file itself.
#[derive(Debug, Clone)]
pub struct WatchSet {
    pub roots: Vec<PathBuf>,
    pub template_file: PathBuf,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(
    pipeline: Pipeline,
    watch: WatchSet,
    quiet_period: Duration,
) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(pipeline, watch, quiet_period))
}

/// Run the daemon loop.
///
/// Failing to register any watch is fatal — returning an error here aborts
/// startup. Once watches are registered the loop only ends when the raw
/// event source closes (process teardown).
pub async fn run(
    pipeline: Pipeline,
    watch: WatchSet,
    quiet_period: Duration,
) -> Result<(), DaemonError> {
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = raw_tx.send(event);
    })?;

    for root in &watch.roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::debug!(path = %root.display(), "watching root");
    }
    watcher.watch(&watch.template_file, RecursiveMode::NonRecursive)?;
    tracing::debug!(path = %watch.template_file.display(), "watching template");

    let (change_tx, change_rx) = mpsc::channel::<()>(64);
    let debouncer_handle = tokio::spawn(debounce_task(
        Arc::new(pipeline),
        change_rx,
        quiet_period,
    ));

    // Main loop: block on the raw notification source and forward everything;
    // the debouncer decides when a cycle actually runs.
    while let Some(event) = raw_rx.recv().await {
        match event {
            Ok(event) => {
                tracing::debug!(paths = ?event.paths, kind = ?event.kind, "change notification");
                if change_tx.send(()).await.is_err() {
                    break;
                }
            }
            Err(err) => tracing::warn!(error = %err, "watcher event error"),
        }
    }
    drop(change_tx);

    debouncer_handle
        .await
        .map_err(|err| DaemonError::Task(format!("debouncer task join failure: {err}")))
}

async fn debounce_task(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::Receiver<()>,
    quiet_period: Duration,
) {
    let mut debouncer = ChangeDebouncer::new(quiet_period);
    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(()) => {
                        debouncer.observe(Instant::now());
                    }
                    None => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                // Drain whatever arrived during the exact expiry instant.
                while rx.try_recv().is_ok() {}
                debouncer.disarm();
                run_cycle(&pipeline).await;
            }
        }
    }
}

/// Run one cycle off the async executor. Cycle failures are logged; the
/// loop keeps running and the next change notification is the retry.
async fn run_cycle(pipeline: &Arc<Pipeline>) {
    let pipeline = pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.run_cycle()).await;
    match result {
        Ok(Ok(outcome)) => {
            tracing::debug!(hosts = outcome.hosts, "debounced cycle finished");
        }
        Ok(Err(err)) => tracing::error!(error = %err, "reconciliation cycle failed"),
        Err(err) => tracing::error!(error = %err, "reconciliation task join failure"),
    }
}
