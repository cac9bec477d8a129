use super::message::SyncJob;
use crate::kernel::services::ports::DocumentSource;
use crate::kernel::syntax::{CacheEntry, SyncController, SyncError, SyncOutcome, TreeStore};
use crate::models::{DocumentId, DocumentSnapshot, TextChangedEvent};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};

/// Runs a [`SyncController`] behind a FIFO job queue.
///
/// Jobs run one at a time, in submission order, on a dedicated `treesync-sync` thread that
/// drives the runtime with `block_on`. Parses never occupy a runtime worker, and a
/// current-thread runtime still makes progress. Debounce timers are runtime tasks that feed
/// `Debounced` jobs back into the same queue, so they queue up behind whatever was
/// submitted before they fire.
///
/// Dropping the worker closes the queue. Jobs already queued still run, then the thread
/// exits.
pub struct SyncWorker {
    tx: UnboundedSender<SyncJob>,
    store: TreeStore,
}

impl SyncWorker {
    pub fn spawn(controller: SyncController) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("treesync-worker")
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Self::with_runtime(controller, runtime)
    }

    /// Run the queue on a caller-built runtime. The runtime must have its time driver
    /// enabled.
    pub fn with_runtime(
        controller: SyncController,
        runtime: tokio::runtime::Runtime,
    ) -> io::Result<Self> {
        let store = controller.store().clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let timers = tx.downgrade();
        std::thread::Builder::new()
            .name("treesync-sync".to_string())
            .spawn(move || runtime.block_on(drain_jobs(controller, rx, timers)))?;
        Ok(Self { tx, store })
    }

    /// Queue a job. `false` once the consumer is gone.
    pub fn submit(&self, job: SyncJob) -> bool {
        self.tx.send(job).is_ok()
    }

    pub fn load(&self, doc: DocumentId, snapshot: DocumentSnapshot) -> bool {
        self.submit(SyncJob::Load { doc, snapshot })
    }

    pub fn text_changed(&self, doc: DocumentId, event: TextChangedEvent) -> bool {
        self.submit(SyncJob::text_changed(doc, event))
    }

    pub fn close(&self, doc: DocumentId, remaining_views: usize) -> bool {
        self.submit(SyncJob::Close {
            doc,
            remaining_views,
        })
    }

    /// Block until every job submitted so far has run.
    pub fn barrier(&self) -> bool {
        let (reply, done) = std::sync::mpsc::channel();
        self.submit(SyncJob::Barrier(reply)) && done.recv().is_ok()
    }

    /// Current tree for `doc`, after every earlier job. Blocks the caller.
    pub fn tree(
        &self,
        doc: DocumentId,
        source: Arc<dyn DocumentSource + Send + Sync>,
    ) -> Option<CacheEntry> {
        let (reply, rx) = std::sync::mpsc::channel();
        if !self.submit(SyncJob::Tree { doc, source, reply }) {
            return None;
        }
        rx.recv().ok().flatten()
    }

    /// Read handle on the cache the worker writes to.
    pub fn store(&self) -> &TreeStore {
        &self.store
    }

}

async fn drain_jobs(
    mut controller: SyncController,
    mut rx: UnboundedReceiver<SyncJob>,
    timers: WeakUnboundedSender<SyncJob>,
) {
    while let Some(job) = rx.recv().await {
        tracing::trace!(job = ?job, "sync job");
        match job {
            SyncJob::Load { doc, snapshot } => {
                report(doc, "load", controller.load(doc, &snapshot));
            }
            SyncJob::TextChanged { doc, event, at } => {
                match controller.text_changed(doc, &event, at) {
                    Ok(SyncOutcome::Deferred { delay }) => schedule_debounce(&timers, doc, delay),
                    result => report(doc, "text_changed", result),
                }
            }
            SyncJob::Debounced { doc } => {
                report(
                    doc,
                    "debounced",
                    controller.debounce_elapsed(doc, Instant::now()),
                );
            }
            SyncJob::Close {
                doc,
                remaining_views,
            } => {
                controller.close(doc, remaining_views);
            }
            SyncJob::Tree { doc, source, reply } => {
                let entry = controller.tree(doc, source.as_ref()).unwrap_or_else(|e| {
                    tracing::warn!(doc = %doc, error = %e, "tree refresh failed");
                    None
                });
                let _ = reply.send(entry);
            }
            SyncJob::Barrier(reply) => {
                let _ = reply.send(());
            }
        }
    }
    tracing::debug!("sync queue closed");
}

/// Not cancellable: a superseded timer still fires and the controller's quiet-period
/// check turns it into a no-op. Timers hold a weak sender so they never keep a closed
/// queue alive.
fn schedule_debounce(timers: &WeakUnboundedSender<SyncJob>, doc: DocumentId, delay: Duration) {
    let timers = timers.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(tx) = timers.upgrade() {
            let _ = tx.send(SyncJob::Debounced { doc });
        }
    });
}

fn report(doc: DocumentId, job: &'static str, result: Result<SyncOutcome, SyncError>) {
    match result {
        Ok(outcome) => tracing::trace!(doc = %doc, job, outcome = ?outcome, "sync job done"),
        // Edit failures are logged by the controller when it drops the tree.
        Err(SyncError::Edit { .. }) => {}
        Err(e) => tracing::warn!(doc = %doc, job, error = %e, "sync job failed"),
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/worker.rs"]
mod tests;
