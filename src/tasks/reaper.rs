//! Worker Reaper Task
//!
//! Background task that collects exited worker processes so none linger as
//! zombies under the process-per-connection strategy.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

// == Reaper Handle ==
/// Hands spawned workers to the reaper and reports on them.
#[derive(Debug, Clone)]
pub struct ReaperHandle {
    tx: mpsc::UnboundedSender<Child>,
    /// Workers adopted but not yet collected
    outstanding: Arc<AtomicUsize>,
    /// Workers collected so far
    reaped: Arc<AtomicU64>,
}

impl ReaperHandle {
    /// Passes a running worker to the reaper.
    ///
    /// Returns false if the reaper task is gone; the child is then dropped
    /// and left to the runtime's orphan handling.
    pub fn adopt(&self, child: Child) -> bool {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(child).is_err() {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            warn!("Reaper task stopped; worker not tracked");
            return false;
        }
        true
    }

    /// Number of adopted workers that have not been collected.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Number of workers collected since the reaper started.
    pub fn reaped(&self) -> u64 {
        self.reaped.load(Ordering::SeqCst)
    }
}

/// Spawns the reaper task.
///
/// Each adopted child gets its own wait; exits are collected as they
/// happen, in whatever order the children finish.
///
/// # Returns
/// The handle used to adopt workers, and the task's JoinHandle so it can be
/// aborted during shutdown.
///
/// # Example
/// ```ignore
/// let (reaper, reaper_task) = spawn_reaper_task();
/// reaper.adopt(child);
/// // Later, during shutdown:
/// reaper_task.abort();
/// ```
pub fn spawn_reaper_task() -> (ReaperHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Child>();
    let outstanding = Arc::new(AtomicUsize::new(0));
    let reaped = Arc::new(AtomicU64::new(0));

    let handle = ReaperHandle {
        tx,
        outstanding: outstanding.clone(),
        reaped: reaped.clone(),
    };

    let task = tokio::spawn(async move {
        info!("Starting worker reaper task");
        let mut waiting = JoinSet::new();

        loop {
            tokio::select! {
                Some(mut child) = rx.recv() => {
                    let pid = child.id();
                    waiting.spawn(async move { (pid, child.wait().await) });
                }
                Some(joined) = waiting.join_next(), if !waiting.is_empty() => {
                    match joined {
                        Ok((pid, Ok(status))) => debug!(pid = ?pid, %status, "Reaped worker"),
                        Ok((pid, Err(e))) => {
                            warn!(pid = ?pid, error = %e, "Failed to wait for worker")
                        }
                        Err(e) => warn!(error = %e, "Worker wait task failed"),
                    }
                    outstanding.fetch_sub(1, Ordering::SeqCst);
                    reaped.fetch_add(1, Ordering::SeqCst);
                }
                else => break,
            }
        }

        info!("Worker reaper task finished");
    });

    (handle, task)
}
