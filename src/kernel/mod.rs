//! Headless sync engine (languages, syntax trees, services).

pub mod language;
pub mod services;
pub mod syntax;
