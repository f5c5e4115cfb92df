//! Structural engine for Markdown outliner documents with hidden per-item system lines.

pub mod config;
pub mod engine;
pub mod error;
pub mod outline;

pub use config::{IdSettings, MarkerRemovalMode, RuleSet, Settings};
pub use engine::{Engine, Ensured};
pub use error::{ConfigError, IdExhausted};
