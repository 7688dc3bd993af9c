//! Verb Resolution
//!
//! Turns a raw verb into the plugin that handles it:
//! - Exact lookup through the registry cache
//! - Fuzzy fallback with a configurable threshold
//! - Priority-based conflict resolution and memoization

pub mod config;
pub mod manager;

pub use config::{MatchingConfig, DEFAULT_FUZZY_THRESHOLD};
pub use manager::{MatchKind, PluginManager, ResolutionStats, Suggestion, VerbMatch};
