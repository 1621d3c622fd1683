use crate::processor::FileProcessor;
use anyhow::{Context, Result};
use futures::stream::{self, Stream, StreamExt};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, info, warn};

/// Fixed capacity of the processing worker pool.
const WORKER_POOL_SIZE: usize = 4;

/// Configuration for the watch-and-dispatch loop.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Maximum number of files processed concurrently. Submissions beyond
    /// this queue on the pool; events are never dropped for backpressure.
    pub workers: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            workers: WORKER_POOL_SIZE,
        }
    }
}

/// One file-creation notification from the watched directory.
///
/// Transient: consumed by the dispatch loop immediately, never persisted.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub directory: PathBuf,
    pub file_name: String,
}

/// Immutable description of one file to process.
///
/// Owns no state shared with other tasks; the aggregates for the file are
/// private to the processor run it spawns.
#[derive(Debug, Clone)]
pub struct ProcessingTask {
    pub file_name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Start watching `input_dir` and return a lazy stream of file-creation
/// notifications.
///
/// The underlying `notify` watcher lives as long as the returned stream;
/// dropping the stream deregisters the watch. Registration failure (missing
/// directory, permissions) is reported here and is fatal for the caller's
/// loop; it is not retried.
pub fn watch_events(input_dir: impl AsRef<Path>) -> Result<impl Stream<Item = WatchEvent>> {
    let input_dir = input_dir.as_ref().to_path_buf();
    let event_dir = input_dir.clone();

    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in event.paths {
                    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    debug!(file = name, "File creation event observed");
                    let _ = tx.send(WatchEvent {
                        directory: event_dir.clone(),
                        file_name: name.to_string(),
                    });
                }
            }
            Err(e) => warn!(error = %e, "Filesystem watch error"),
        },
        NotifyConfig::default(),
    )
    .context("failed to create filesystem watcher")?;

    watcher
        .watch(&input_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch directory {}", input_dir.display()))?;

    info!(directory = %input_dir.display(), "Watch registered");

    // The watcher rides along in the unfold state so it stays alive for the
    // life of the stream.
    Ok(stream::unfold((rx, watcher), |(mut rx, watcher)| async move {
        rx.recv().await.map(|event| (event, (rx, watcher)))
    }))
}

/// Watch `input_dir` indefinitely, dispatching every file-creation event to
/// the worker pool. Blocks until the watch stream fails; never returns under
/// normal operation.
pub async fn run(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: WatcherConfig,
) -> Result<()> {
    let (_stop_tx, stop_rx) = watch::channel(false);
    run_until(input_dir, output_dir, config, stop_rx).await
}

/// Watch and dispatch until the stop signal flips to `true`.
///
/// Cancellation is observed between notifications: no event being handled is
/// interrupted, and tasks already submitted to the pool run to completion
/// after this returns.
pub async fn run_until(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: WatcherConfig,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref().to_path_buf();

    let events = watch_events(input_dir)?;
    tokio::pin!(events);

    let pool = Arc::new(Semaphore::new(config.workers));
    let in_flight: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

    info!(
        input = %input_dir.display(),
        output = %output_dir.display(),
        workers = config.workers,
        "Watching for new data files"
    );

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    info!("Stop signal received, leaving watch loop");
                    break;
                }
            }
            event = events.next() => {
                let Some(event) = event else {
                    warn!("Watch event stream closed, leaving watch loop");
                    break;
                };
                dispatch(event, &output_dir, &pool, &in_flight);
            }
        }
    }

    Ok(())
}

/// Submit one event to the worker pool, fire-and-forget.
///
/// The in-flight claim set guarantees at most one concurrent task per file
/// name: a duplicate creation event for a name still being processed is
/// ignored. The dispatcher never observes task outcomes; each task logs its
/// own result.
fn dispatch(
    event: WatchEvent,
    output_dir: &Path,
    pool: &Arc<Semaphore>,
    in_flight: &Arc<Mutex<HashSet<String>>>,
) {
    if !in_flight.lock().insert(event.file_name.clone()) {
        debug!(file = %event.file_name, "Duplicate creation event ignored, file already in flight");
        return;
    }

    let task = ProcessingTask {
        file_name: event.file_name,
        input_dir: event.directory,
        output_dir: output_dir.to_path_buf(),
    };

    debug!(file = %task.file_name, "Submitting processing task");

    let pool = Arc::clone(pool);
    let in_flight = Arc::clone(in_flight);

    tokio::spawn(async move {
        let permit = match pool.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Pool closed during shutdown; release the claim and bail.
                in_flight.lock().remove(&task.file_name);
                return;
            }
        };

        let success = FileProcessor::new(&task.file_name, &task.input_dir, &task.output_dir)
            .process()
            .await;
        debug!(file = %task.file_name, success, "Processing task finished");

        drop(permit);
        in_flight.lock().remove(&task.file_name);
    });
}
