//! Plugin Module
//!
//! Provides the verb capability contract and the registry:
//! - Plugin interface and the table-driven `VerbPlugin`
//! - Plugin registry with verb index and exact-lookup cache

pub mod interface;
pub mod registry;

pub use interface::{validate_plugin, Plugin, PluginInfo, PluginManifest, VerbPlugin};
pub use registry::{IndexSnapshot, PluginRegistry, RegisteredPlugin, VerbClaim};
