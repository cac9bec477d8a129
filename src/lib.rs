//! treesync - live, incrementally updated syntax trees for open editor buffers.
//!
//! Module layout:
//! - models: editor-facing value types (document ids, text changes, events)
//! - kernel::language: grammar catalogue and the scope -> grammar registry
//! - kernel::syntax: coordinate translation, edit descriptors, tree cache, sync controller, traversal
//! - kernel::services: settings and the FIFO sync worker

pub mod kernel;
pub mod models;

pub use kernel::language::{LanguageId, LanguageRegistry};
pub use kernel::services::adapters::runtime::{SyncJob, SyncWorker};
pub use kernel::services::ports::{DocumentSource, SyncSettings};
pub use kernel::syntax::{
    CacheEntry, EditError, SyncController, SyncError, SyncOutcome, TreeCache, TreeStore,
    TreeUpdate, UpdateKind,
};
pub use models::{
    DocumentId, DocumentSnapshot, Region, TextChange, TextChangedEvent, TextPosition,
};
