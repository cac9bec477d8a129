//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod runtime;
pub mod settings;

pub use runtime::{SyncJob, SyncWorker};
pub use settings::{
    ensure_log_dir, ensure_settings_file, get_log_dir, load_settings, settings_path,
};
