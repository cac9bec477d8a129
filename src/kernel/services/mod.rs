//! Services layer (ports + adapters).
//!
//! - `ports`: pure contracts/types used by the engine.
//! - `adapters`: OS/runtime specific implementations (settings files, the sync worker).

pub mod adapters;
pub mod ports;
