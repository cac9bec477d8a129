//! Sync worker: runs the sync controller behind an ordered job queue.

mod message;
mod worker;

pub use message::SyncJob;
pub use worker::SyncWorker;
