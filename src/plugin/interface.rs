//! Plugin interface definition.
//!
//! Defines the verb capability contract every plugin implements, plus
//! `VerbPlugin`, the standard table-driven implementation.

use crate::core::{normalize_verb, recover, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

/// Plugin information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin name
    pub name: String,
    /// Description (informational only)
    pub description: String,
    /// Conflict priority, higher wins
    pub priority: i32,
}

impl PluginInfo {
    /// Create new plugin info.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            priority: 0,
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Plugin trait that all plugins must implement.
///
/// Only `info`, `get_verbs` and `get_aliases` are required. The lookup
/// helpers have case-insensitive default implementations built on those two
/// tables; implementors may override them to add memoization, in which case
/// `clear_caches` must drop whatever they memoized.
pub trait Plugin: Send + Sync {
    /// Get plugin info.
    fn info(&self) -> &PluginInfo;

    /// Canonical verbs, in declaration order.
    fn get_verbs(&self) -> &[String];

    /// Alias to canonical verb mapping.
    fn get_aliases(&self) -> &BTreeMap<String, String>;

    /// Plugin name.
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Plugin priority.
    fn priority(&self) -> i32 {
        self.info().priority
    }

    /// Plugin description.
    fn description(&self) -> &str {
        &self.info().description
    }

    /// Whether this plugin owns `verb` as a canonical verb or alias.
    fn can_handle(&self, verb: &str) -> bool {
        self.get_canonical_verb(verb).is_ok()
    }

    /// Resolve `verb` (canonical or alias, any casing) to its canonical spelling.
    fn get_canonical_verb(&self, verb: &str) -> Result<String> {
        let key = normalize_verb(verb).ok_or_else(|| {
            Error::InvalidInput(format!(
                "empty verb passed to plugin '{}'",
                self.name()
            ))
        })?;
        lookup_canonical(self.get_verbs(), self.get_aliases(), &key).ok_or_else(|| {
            Error::VerbNotRecognized {
                verb: verb.to_string(),
                plugin: self.name().to_string(),
            }
        })
    }

    /// Every string this plugin answers to: canonical verbs, then aliases.
    fn get_all_verbs_and_aliases(&self) -> Vec<String> {
        self.get_verbs()
            .iter()
            .chain(self.get_aliases().keys())
            .cloned()
            .collect()
    }

    /// Drop plugin-local memoization. Must be idempotent.
    fn clear_caches(&self) {}
}

/// Look up a lowercased key in the verb and alias tables.
///
/// Canonical verbs are checked before aliases.
fn lookup_canonical(
    verbs: &[String],
    aliases: &BTreeMap<String, String>,
    key: &str,
) -> Option<String> {
    verbs
        .iter()
        .find(|v| v.to_lowercase() == key)
        .or_else(|| {
            aliases
                .iter()
                .find(|(alias, _)| alias.to_lowercase() == key)
                .map(|(_, canonical)| canonical)
        })
        .cloned()
}

/// Check a plugin definition for ambiguities.
///
/// Rejects an empty name, empty or case-insensitively duplicated verbs,
/// aliases shadowing one of the plugin's own canonical verbs, and aliases
/// pointing at a verb the plugin does not declare.
pub fn validate_plugin(plugin: &dyn Plugin) -> Result<()> {
    let name = plugin.name();
    if name.trim().is_empty() {
        return Err(Error::InvalidPlugin("plugin name is empty".to_string()));
    }

    let mut canonical = HashSet::new();
    for verb in plugin.get_verbs() {
        let key = normalize_verb(verb).ok_or_else(|| {
            Error::InvalidPlugin(format!("plugin '{}' declares an empty verb", name))
        })?;
        if !canonical.insert(key) {
            return Err(Error::InvalidPlugin(format!(
                "plugin '{}' declares verb '{}' more than once",
                name, verb
            )));
        }
    }

    let mut aliases = HashSet::new();
    for (alias, target) in plugin.get_aliases() {
        let key = normalize_verb(alias).ok_or_else(|| {
            Error::InvalidPlugin(format!("plugin '{}' declares an empty alias", name))
        })?;
        if !aliases.insert(key.clone()) {
            return Err(Error::InvalidPlugin(format!(
                "plugin '{}' declares alias '{}' more than once",
                name, alias
            )));
        }
        if canonical.contains(&key) {
            return Err(Error::InvalidPlugin(format!(
                "plugin '{}': alias '{}' is also a canonical verb",
                name, alias
            )));
        }
        if !plugin.get_verbs().iter().any(|v| v == target) {
            return Err(Error::InvalidPlugin(format!(
                "plugin '{}': alias '{}' points at unknown verb '{}'",
                name, alias, target
            )));
        }
    }

    Ok(())
}

/// Serializable plugin description.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub verbs: Vec<String>,
    pub aliases: BTreeMap<String, String>,
}

impl PluginManifest {
    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Table-driven plugin with a memoized canonical-verb lookup.
pub struct VerbPlugin {
    info: PluginInfo,
    verbs: Vec<String>,
    aliases: BTreeMap<String, String>,
    /// Lowercased input -> canonical verb (or `None` for a known miss)
    canonical_cache: RwLock<HashMap<String, Option<String>>>,
}

impl VerbPlugin {
    /// Create a new plugin with no verbs and priority 0.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            info: PluginInfo::new(name, description),
            verbs: Vec::new(),
            aliases: BTreeMap::new(),
            canonical_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build a plugin from a manifest.
    pub fn from_manifest(manifest: PluginManifest) -> Self {
        Self {
            info: PluginInfo::new(&manifest.name, &manifest.description)
                .with_priority(manifest.priority),
            verbs: manifest.verbs,
            aliases: manifest.aliases,
            canonical_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Describe this plugin as a manifest.
    pub fn to_manifest(&self) -> PluginManifest {
        PluginManifest {
            name: self.info.name.clone(),
            description: self.info.description.clone(),
            priority: self.info.priority,
            verbs: self.verbs.clone(),
            aliases: self.aliases.clone(),
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.info.priority = priority;
        self
    }

    /// Add a canonical verb.
    pub fn with_verb(mut self, verb: &str) -> Self {
        self.verbs.push(verb.to_string());
        self
    }

    /// Add several canonical verbs.
    pub fn with_verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verbs.extend(verbs.into_iter().map(Into::into));
        self
    }

    /// Map an alias onto a canonical verb.
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases.insert(alias.to_string(), canonical.to_string());
        self
    }

    /// Number of memoized canonical lookups.
    pub fn cache_len(&self) -> usize {
        recover(self.canonical_cache.read()).len()
    }
}

impl Plugin for VerbPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn get_verbs(&self) -> &[String] {
        &self.verbs
    }

    fn get_aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    fn get_canonical_verb(&self, verb: &str) -> Result<String> {
        let key = normalize_verb(verb).ok_or_else(|| {
            Error::InvalidInput(format!(
                "empty verb passed to plugin '{}'",
                self.info.name
            ))
        })?;

        let cached = recover(self.canonical_cache.read()).get(&key).cloned();
        let resolved = match cached {
            Some(hit) => hit,
            None => {
                let found = lookup_canonical(&self.verbs, &self.aliases, &key);
                recover(self.canonical_cache.write()).insert(key, found.clone());
                found
            }
        };

        resolved.ok_or_else(|| Error::VerbNotRecognized {
            verb: verb.to_string(),
            plugin: self.info.name.clone(),
        })
    }

    fn clear_caches(&self) {
        recover(self.canonical_cache.write()).clear();
    }
}

impl std::fmt::Debug for VerbPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbPlugin")
            .field("info", &self.info)
            .field("verbs", &self.verbs)
            .field("aliases", &self.aliases)
            .finish()
    }
}
