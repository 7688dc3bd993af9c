//! # verb-resolver
//!
//! Resolves a free-form command verb to the plugin that handles it:
//! - **Plugins**: verb/alias capability contract and a table-driven implementation
//! - **Registry**: verb index with a cached exact lookup
//! - **Resolver**: exact-then-fuzzy matching with priority conflict resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use verb_resolver::plugin::{Plugin, VerbPlugin};
//! use verb_resolver::resolver::PluginManager;
//!
//! let mut manager = PluginManager::default();
//! manager
//!     .register(Arc::new(
//!         VerbPlugin::new("file", "File operations")
//!             .with_priority(10)
//!             .with_verbs(["ls", "find", "copy", "move"])
//!             .with_alias("list", "ls"),
//!     ))
//!     .unwrap();
//!
//! let plugin = manager.get_plugin_for_verb("lisst").unwrap();
//! assert_eq!(plugin.name(), "file");
//! ```

pub mod core;
pub mod logging;
pub mod matching;
pub mod plugin;
pub mod resolver;

pub use crate::core::error::{Error, Result};
pub use plugin::{Plugin, PluginRegistry, VerbPlugin};
pub use resolver::{MatchingConfig, PluginManager};
