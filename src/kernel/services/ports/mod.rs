//! Service ports: traits + data contracts.

pub mod document;
pub mod settings;

pub use document::DocumentSource;
pub use settings::{SyncSettings, DEFAULT_MAX_CACHED_TREES};
