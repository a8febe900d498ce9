// src/config/mod.rs
//! Runtime configuration: environment settings plus the source/event files.

pub mod ai;
pub mod settings;
pub mod sources;

pub use ai::BriefingConfig;
pub use settings::{ConfigError, Settings};
pub use sources::{default_sources, load_events, load_sources};
