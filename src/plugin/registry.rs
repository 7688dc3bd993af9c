//! Plugin registry for verb lookup.
//!
//! Owns the registered plugins, the verb index derived from them and the
//! exact-lookup cache. Every mutation bumps the registry generation so that
//! caches layered on top (see `resolver::manager`) can tell they are stale.
//!
//! Conflict rule: when several plugins claim the same verb, the strictly
//! highest priority wins; on equal priority the earliest registration wins.

use crate::core::{normalize_verb, now, recover, Error, Result, Timestamp};
use crate::plugin::interface::{validate_plugin, Plugin};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace, warn};

/// One plugin's claim on a verb-or-alias string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerbClaim {
    /// Claiming plugin
    pub plugin: String,
    /// Canonical verb the claimed string resolves to
    pub canonical_verb: String,
}

/// Registered plugin entry.
pub struct RegisteredPlugin {
    /// Plugin instance
    pub plugin: Arc<dyn Plugin>,
    /// Registration order, used as the equal-priority tie-break
    pub sequence: u64,
    /// Registration time
    pub registered_at: Timestamp,
}

/// Serializable view of the verb index for diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct IndexSnapshot {
    /// Registry generation the snapshot was taken at
    pub generation: u64,
    /// Plugin names in registration order
    pub plugins: Vec<String>,
    /// Verb-or-alias -> live claims in precedence order
    pub verbs: BTreeMap<String, Vec<VerbClaim>>,
}

/// Plugin registry.
pub struct PluginRegistry {
    /// Registered plugins
    plugins: HashMap<String, RegisteredPlugin>,
    /// Lowercased verb-or-alias -> claims
    verb_index: HashMap<String, Vec<VerbClaim>>,
    /// Raw input -> resolved plugin name
    lookup_cache: RwLock<HashMap<String, Option<String>>>,
    /// Mutation counter
    generation: AtomicU64,
    /// Next registration sequence number
    next_sequence: u64,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
            verb_index: HashMap::new(),
            lookup_cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            next_sequence: 0,
        }
    }

    /// Register a plugin, replacing any plugin with the same name.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        validate_plugin(plugin.as_ref())?;
        let name = plugin.name().to_string();

        if self.plugins.contains_key(&name) {
            debug!(plugin = %name, "replacing registered plugin");
            self.drop_index_entries(&name);
        }

        self.index_plugin(plugin.as_ref());
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.plugins.insert(
            name.clone(),
            RegisteredPlugin {
                plugin,
                sequence,
                registered_at: now(),
            },
        );
        self.invalidate();

        debug!(plugin = %name, sequence, "registered plugin");
        Ok(())
    }

    /// Unregister a plugin, returning it.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<dyn Plugin>> {
        let entry = self
            .plugins
            .remove(name)
            .ok_or_else(|| Error::PluginNotFound(name.to_string()))?;
        self.drop_index_entries(name);
        entry.plugin.clear_caches();
        self.invalidate();

        debug!(plugin = %name, "unregistered plugin");
        Ok(entry.plugin)
    }

    /// Get plugin by name.
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).map(|entry| Arc::clone(&entry.plugin))
    }

    /// Get the full registration entry.
    pub fn get_entry(&self, name: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(name)
    }

    /// Plugin names in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.plugins.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries
            .into_iter()
            .map(|entry| entry.plugin.name().to_string())
            .collect()
    }

    /// Get plugin count.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Current generation. Changes on every mutation or invalidation.
    pub fn generation(&self) -> u64 {
        self.generation.load(AtomicOrdering::Acquire)
    }

    /// Iterate over live plugins, in no particular order.
    pub fn plugins(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.values().map(|entry| &entry.plugin)
    }

    /// Verb-or-alias -> owning plugin names, in precedence order.
    pub fn get_all_verbs(&self) -> BTreeMap<String, Vec<String>> {
        self.verb_index
            .keys()
            .filter_map(|verb| {
                let owners: Vec<String> = self
                    .live_claims(verb)
                    .into_iter()
                    .map(|(_, claim)| claim.plugin.clone())
                    .collect();
                (!owners.is_empty()).then(|| (verb.clone(), owners))
            })
            .collect()
    }

    /// Live claims on `verb`, in precedence order.
    pub fn claims_for(&self, verb: &str) -> Vec<VerbClaim> {
        match normalize_verb(verb) {
            Some(key) => self
                .live_claims(&key)
                .into_iter()
                .map(|(_, claim)| claim.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Winning plugin for `verb` together with the canonical verb it maps to.
    ///
    /// Uncached; see `get_plugin_for_verb` for the cached path.
    pub fn resolve_claim(&self, verb: &str) -> Option<(Arc<dyn Plugin>, String)> {
        let key = normalize_verb(verb)?;
        self.live_claims(&key)
            .into_iter()
            .next()
            .map(|(entry, claim)| (Arc::clone(&entry.plugin), claim.canonical_verb.clone()))
    }

    /// Cached exact lookup.
    ///
    /// The cache is keyed by the raw input; matching is case-insensitive.
    pub fn get_plugin_for_verb(&self, verb: &str) -> Option<Arc<dyn Plugin>> {
        let cached = recover(self.lookup_cache.read()).get(verb).cloned();
        let name = match cached {
            Some(name) => {
                trace!(verb, "registry cache hit");
                name
            }
            None => {
                let name = self
                    .resolve_claim(verb)
                    .map(|(plugin, _)| plugin.name().to_string());
                recover(self.lookup_cache.write()).insert(verb.to_string(), name.clone());
                name
            }
        };

        let name = name?;
        match self.plugins.get(&name) {
            Some(entry) => Some(Arc::clone(&entry.plugin)),
            None => {
                warn!(verb, plugin = %name, "cached plugin no longer registered");
                None
            }
        }
    }

    /// Number of cached exact lookups.
    pub fn cache_len(&self) -> usize {
        recover(self.lookup_cache.read()).len()
    }

    /// Drop the exact-lookup cache and bump the generation.
    pub fn invalidate(&self) {
        recover(self.lookup_cache.write()).clear();
        self.generation.fetch_add(1, AtomicOrdering::AcqRel);
    }

    /// Invalidate the registry cache and every plugin's local caches.
    pub fn clear_caches(&self) {
        for entry in self.plugins.values() {
            entry.plugin.clear_caches();
        }
        self.invalidate();
    }

    /// Rebuild the verb index from scratch and clear all caches.
    pub fn reindex(&mut self) {
        self.verb_index.clear();
        let plugins: Vec<Arc<dyn Plugin>> = self
            .plugins
            .values()
            .map(|entry| Arc::clone(&entry.plugin))
            .collect();
        for plugin in &plugins {
            self.index_plugin(plugin.as_ref());
        }
        self.clear_caches();
        debug!(plugins = plugins.len(), "rebuilt verb index");
    }

    /// Snapshot the index for diagnostics.
    pub fn index_snapshot(&self) -> IndexSnapshot {
        let verbs = self
            .verb_index
            .keys()
            .filter_map(|verb| {
                let claims: Vec<VerbClaim> = self
                    .live_claims(verb)
                    .into_iter()
                    .map(|(_, claim)| claim.clone())
                    .collect();
                (!claims.is_empty()).then(|| (verb.clone(), claims))
            })
            .collect();

        IndexSnapshot {
            generation: self.generation(),
            plugins: self.plugin_names(),
            verbs,
        }
    }

    /// Order two entries by precedence: higher priority first, then earlier
    /// registration.
    pub fn precedence(a: &RegisteredPlugin, b: &RegisteredPlugin) -> Ordering {
        b.plugin
            .priority()
            .cmp(&a.plugin.priority())
            .then(a.sequence.cmp(&b.sequence))
    }

    /// Claims on an already-normalized key whose plugin is still registered,
    /// sorted by precedence.
    fn live_claims(&self, key: &str) -> Vec<(&RegisteredPlugin, &VerbClaim)> {
        let Some(claims) = self.verb_index.get(key) else {
            return Vec::new();
        };

        let mut live: Vec<_> = claims
            .iter()
            .filter_map(|claim| match self.plugins.get(&claim.plugin) {
                Some(entry) => Some((entry, claim)),
                None => {
                    warn!(
                        verb = key,
                        plugin = %claim.plugin,
                        "index references unregistered plugin"
                    );
                    None
                }
            })
            .collect();
        live.sort_by(|(a, _), (b, _)| Self::precedence(a, b));
        live
    }

    fn index_plugin(&mut self, plugin: &dyn Plugin) {
        let name = plugin.name();
        let verbs = plugin
            .get_verbs()
            .iter()
            .map(|verb| (verb, verb))
            .chain(plugin.get_aliases().iter());

        for (key, canonical) in verbs {
            let Some(key) = normalize_verb(key) else {
                continue;
            };
            self.verb_index.entry(key).or_default().push(VerbClaim {
                plugin: name.to_string(),
                canonical_verb: canonical.clone(),
            });
        }
    }

    fn drop_index_entries(&mut self, name: &str) {
        self.verb_index.retain(|_, claims| {
            claims.retain(|claim| claim.plugin != name);
            !claims.is_empty()
        });
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
