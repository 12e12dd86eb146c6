//! Retirement of superseded files.
//!
//! A dump never deletes anything itself. It hands the paths it superseded to
//! a [`StaleSink`]; a client that fetched the previous index moments before
//! the dump must still be able to download the files it references, so
//! deletion waits out a grace period.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of a best-effort deletion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Paths removed by this pass.
    pub deleted: usize,
    /// Paths that were already gone.
    pub missing: usize,
    /// Paths that could not be removed.
    pub failed: usize,
    /// Paths skipped because a later dump referenced them again.
    pub reclaimed: usize,
}

impl DeletionReport {
    /// Combine two reports.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            deleted: self.deleted + other.deleted,
            missing: self.missing + other.missing,
            failed: self.failed + other.failed,
            reclaimed: self.reclaimed + other.reclaimed,
        }
    }
}

/// Delete each path, best effort.
///
/// Missing paths count as already deleted. Directories are removed
/// recursively. Other failures are logged and counted, never raised.
pub fn delete_paths(paths: &[PathBuf]) -> DeletionReport {
    let mut report = DeletionReport::default();

    for path in paths {
        let result = match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
            Ok(_) => std::fs::remove_file(path),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "deleted stale path");
                report.deleted += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => report.missing += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete stale path");
                report.failed += 1;
            }
        }
    }

    if !paths.is_empty() {
        info!(
            deleted = report.deleted,
            missing = report.missing,
            failed = report.failed,
            "stale paths retired"
        );
    }
    report
}

/// Receives paths a dump superseded.
///
/// Implementations decide when the files go away; they must not delete them
/// before clients holding the previous index could have fetched them.
///
/// Content addressing means a later dump can publish a file that is still
/// waiting for deletion: a package reverted to earlier content hashes to the
/// path retired before. The dumper reports every path it references through
/// [`reclaim`](Self::reclaim), and a sink that deletes later must not delete
/// those.
pub trait StaleSink: Send + Sync {
    /// Accept a non-empty batch of superseded paths.
    fn retire(&self, paths: Vec<PathBuf>);

    /// Paths the latest dump references. Any pending deletion of them is
    /// cancelled.
    fn reclaim(&self, _paths: &[PathBuf]) {}
}

/// Keeps retired paths in memory without deleting anything.
#[derive(Debug, Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Vec<PathBuf>>>,
}

impl CollectingSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch received so far, in order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<PathBuf>> {
        self.batches.lock().clone()
    }

    /// All received paths, flattened.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

impl StaleSink for CollectingSink {
    fn retire(&self, paths: Vec<PathBuf>) {
        self.batches.lock().push(paths);
    }
}

/// Pending deletions: each path maps to the batch that last retired it.
#[derive(Debug, Default)]
struct Schedule {
    next_batch: u64,
    pending: HashMap<PathBuf, u64>,
}

/// Deletes retired paths on a Tokio runtime after a grace period.
///
/// A path reclaimed before its grace period ends is left alone, and a path
/// retired again waits for the latest batch's grace period.
#[derive(Debug)]
pub struct DeferredDeleter {
    runtime: Handle,
    grace: Duration,
    schedule: Arc<Mutex<Schedule>>,
    tasks: Mutex<Vec<JoinHandle<DeletionReport>>>,
}

impl DeferredDeleter {
    /// Deleter that schedules onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle, grace: Duration) -> Self {
        Self {
            runtime,
            grace,
            schedule: Arc::default(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Deleter on the runtime of the calling context.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn on_current(grace: Duration) -> Self {
        Self::new(Handle::current(), grace)
    }

    /// Configured grace period.
    #[must_use]
    pub const fn grace(&self) -> Duration {
        self.grace
    }

    /// Number of scheduled batches not yet awaited.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Wait for every scheduled batch and sum their reports.
    pub async fn wait(&self) -> DeletionReport {
        let handles = std::mem::take(&mut *self.tasks.lock());
        let mut total = DeletionReport::default();
        for handle in handles {
            match handle.await {
                Ok(report) => total = total.merge(report),
                Err(e) => warn!(error = %e, "deferred deletion task failed"),
            }
        }
        total
    }
}

impl StaleSink for DeferredDeleter {
    fn retire(&self, paths: Vec<PathBuf>) {
        let grace = self.grace;
        let batch = {
            let mut schedule = self.schedule.lock();
            let batch = schedule.next_batch;
            schedule.next_batch += 1;
            for path in &paths {
                schedule.pending.insert(path.clone(), batch);
            }
            batch
        };
        info!(
            count = paths.len(),
            grace_secs = grace.as_secs(),
            "scheduling stale path deletion"
        );

        let schedule = Arc::clone(&self.schedule);
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;

            let mut due = Vec::with_capacity(paths.len());
            {
                let mut schedule = schedule.lock();
                for path in &paths {
                    // Only the batch that retired a path last may delete it
                    if schedule.pending.get(path) == Some(&batch) {
                        schedule.pending.remove(path);
                        due.push(path.clone());
                    }
                }
            }
            let reclaimed = paths.len() - due.len();
            if reclaimed > 0 {
                debug!(reclaimed, "skipping paths referenced again");
            }

            match tokio::task::spawn_blocking(move || delete_paths(&due)).await {
                Ok(report) => DeletionReport {
                    reclaimed,
                    ..report
                },
                Err(e) => {
                    warn!(error = %e, "stale path deletion panicked");
                    DeletionReport {
                        reclaimed,
                        ..DeletionReport::default()
                    }
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    fn reclaim(&self, paths: &[PathBuf]) {
        let mut schedule = self.schedule.lock();
        let cancelled = paths
            .iter()
            .filter(|path| schedule.pending.remove(*path).is_some())
            .count();
        if cancelled > 0 {
            info!(cancelled, "cancelled deletion of republished paths");
        }
    }
}
