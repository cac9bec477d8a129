use crate::kernel::services::ports::DocumentSource;
use crate::kernel::syntax::CacheEntry;
use crate::models::{DocumentId, DocumentSnapshot, TextChangedEvent};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

pub enum SyncJob {
    /// Load, revert, reload or activation.
    Load {
        doc: DocumentId,
        snapshot: DocumentSnapshot,
    },
    TextChanged {
        doc: DocumentId,
        event: TextChangedEvent,
        at: Instant,
    },
    /// Deferred debounce check; enqueued by the worker's own timers.
    Debounced {
        doc: DocumentId,
    },
    Close {
        doc: DocumentId,
        remaining_views: usize,
    },
    /// Read the current tree, refreshing it from `source` when missing or stale.
    Tree {
        doc: DocumentId,
        source: Arc<dyn DocumentSource + Send + Sync>,
        reply: Sender<Option<CacheEntry>>,
    },
    /// Acknowledged once every job submitted before it has run.
    Barrier(Sender<()>),
}

impl SyncJob {
    pub fn text_changed(doc: DocumentId, event: TextChangedEvent) -> Self {
        Self::TextChanged {
            doc,
            event,
            at: Instant::now(),
        }
    }

    pub fn doc(&self) -> Option<DocumentId> {
        match self {
            Self::Load { doc, .. }
            | Self::TextChanged { doc, .. }
            | Self::Debounced { doc }
            | Self::Close { doc, .. }
            | Self::Tree { doc, .. } => Some(*doc),
            Self::Barrier(_) => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::TextChanged { .. } => "text_changed",
            Self::Debounced { .. } => "debounced",
            Self::Close { .. } => "close",
            Self::Tree { .. } => "tree",
            Self::Barrier(_) => "barrier",
        }
    }
}

impl std::fmt::Debug for SyncJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncJob")
            .field("kind", &self.name())
            .field("doc", &self.doc())
            .finish()
    }
}
