//! Verb resolution manager.
//!
//! Tries the registry's exact lookup first and only falls back to fuzzy
//! matching over every registered verb and alias on a miss. Final outcomes,
//! misses included, are memoized per raw input. The memo is tagged with the
//! registry generation, so any registry mutation turns it cold for every key.

use crate::core::{normalize_verb, recover, Result};
use crate::matching::{EditDistanceMatcher, FuzzyMatcher, ScoredCandidate};
use crate::plugin::{Plugin, PluginRegistry};
use crate::resolver::config::{validate_threshold, MatchingConfig};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, trace};

/// How a verb was matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    /// Case-insensitive hit on a verb or alias
    Exact,
    /// Approximate hit above the threshold
    Fuzzy,
}

/// A resolved verb.
#[derive(Clone)]
pub struct VerbMatch {
    /// Owning plugin
    pub plugin: Arc<dyn Plugin>,
    /// Canonical verb within that plugin
    pub canonical_verb: String,
    /// Verb or alias that matched, lowercased
    pub matched: String,
    /// Similarity score (1.0 for exact matches)
    pub score: f64,
    /// Match kind
    pub kind: MatchKind,
}

impl std::fmt::Debug for VerbMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbMatch")
            .field("plugin", &self.plugin.name())
            .field("canonical_verb", &self.canonical_verb)
            .field("matched", &self.matched)
            .field("score", &self.score)
            .field("kind", &self.kind)
            .finish()
    }
}

/// "Did you mean" candidate for an unrecognized verb.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
    /// Suggested verb or alias
    pub verb: String,
    /// Plugin that would handle it
    pub plugin: String,
    /// Canonical verb it maps to
    pub canonical_verb: String,
    /// Similarity score
    pub score: f64,
}

/// Resolution counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub lookups: u64,
    pub cache_hits: u64,
    pub exact_matches: u64,
    pub fuzzy_attempts: u64,
    pub fuzzy_matches: u64,
    pub misses: u64,
}

/// Memoized outcome, holding the plugin by name so a removed plugin can
/// never be served from the cache.
#[derive(Clone, Debug)]
struct CachedResolution {
    plugin: String,
    canonical_verb: String,
    matched: String,
    score: f64,
    kind: MatchKind,
}

#[derive(Default)]
struct ResolutionCache {
    /// Registry generation the entries were computed against
    generation: u64,
    entries: HashMap<String, Option<CachedResolution>>,
    universe: Option<Arc<Vec<String>>>,
}

/// Verb resolution manager.
pub struct PluginManager {
    /// Plugin registry
    registry: PluginRegistry,
    /// Matching configuration
    config: MatchingConfig,
    /// Fuzzy matching strategy
    matcher: Arc<dyn FuzzyMatcher>,
    /// Raw input -> final outcome
    cache: RwLock<ResolutionCache>,
    /// Counters
    stats: RwLock<ResolutionStats>,
}

impl PluginManager {
    /// Create a manager with the default configuration.
    pub fn new(registry: PluginRegistry) -> Self {
        let config = MatchingConfig::default();
        let matcher: Arc<dyn FuzzyMatcher> = Arc::new(EditDistanceMatcher::from_config(&config));
        Self {
            registry,
            config,
            matcher,
            cache: RwLock::new(ResolutionCache::default()),
            stats: RwLock::new(ResolutionStats::default()),
        }
    }

    /// Create a manager with a validated configuration.
    pub fn with_config(registry: PluginRegistry, config: MatchingConfig) -> Result<Self> {
        config.validate()?;
        let mut manager = Self::new(registry);
        manager.matcher = Arc::new(EditDistanceMatcher::from_config(&config));
        manager.config = config;
        Ok(manager)
    }

    /// Replace the fuzzy matching strategy.
    pub fn with_matcher(mut self, matcher: Arc<dyn FuzzyMatcher>) -> Self {
        self.matcher = matcher;
        self.invalidate();
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Active matcher.
    pub fn matcher(&self) -> &Arc<dyn FuzzyMatcher> {
        &self.matcher
    }

    /// Current fuzzy threshold.
    pub fn fuzzy_threshold(&self) -> f64 {
        self.config.fuzzy_threshold
    }

    /// Change the fuzzy threshold. Memoized outcomes are dropped.
    pub fn set_fuzzy_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.config.fuzzy_threshold = threshold;
        self.invalidate();
        debug!(threshold, "fuzzy threshold updated");
        Ok(())
    }

    /// Underlying registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Mutable registry access. Mutations bump the registry generation,
    /// which makes this manager's memo cold on its next use.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Register a plugin.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.registry.register(plugin)?;
        self.invalidate();
        Ok(())
    }

    /// Unregister a plugin.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<dyn Plugin>> {
        let plugin = self.registry.unregister(name)?;
        self.invalidate();
        Ok(plugin)
    }

    /// Resolve a verb to its plugin. Never fails; empty input is a miss.
    pub fn get_plugin_for_verb(&self, verb: &str) -> Option<Arc<dyn Plugin>> {
        self.resolve(Some(verb))
    }

    /// Resolve a possibly absent verb to its plugin.
    pub fn resolve(&self, verb: Option<&str>) -> Option<Arc<dyn Plugin>> {
        self.resolve_match(verb).map(|found| found.plugin)
    }

    /// Resolve a verb with match details.
    pub fn resolve_verb(&self, verb: &str) -> Option<VerbMatch> {
        self.resolve_match(Some(verb))
    }

    /// Verb-or-alias -> owning plugin names, in precedence order.
    pub fn get_all_verbs(&self) -> BTreeMap<String, Vec<String>> {
        self.registry.get_all_verbs()
    }

    /// Suggestions for an unrecognized verb, using the looser
    /// `suggestion_threshold`.
    pub fn suggest(&self, verb: &str, limit: usize) -> Vec<Suggestion> {
        let Some(key) = normalize_verb(verb) else {
            return Vec::new();
        };
        let universe = self.verb_universe();
        self.matcher
            .rank(&key, &universe, limit, self.config.suggestion_threshold)
            .into_iter()
            .filter_map(|scored| {
                let (plugin, canonical_verb) = self.registry.resolve_claim(&scored.candidate)?;
                Some(Suggestion {
                    verb: scored.candidate,
                    plugin: plugin.name().to_string(),
                    canonical_verb,
                    score: scored.score,
                })
            })
            .collect()
    }

    /// Drop every memoized outcome and the cached verb universe.
    pub fn invalidate(&self) {
        let mut cache = recover(self.cache.write());
        cache.entries.clear();
        cache.universe = None;
        cache.generation = self.registry.generation();
    }

    /// Number of memoized outcomes still valid for the current registry.
    pub fn cache_len(&self) -> usize {
        let cache = recover(self.cache.read());
        if cache.generation == self.registry.generation() {
            cache.entries.len()
        } else {
            0
        }
    }

    /// Resolution counters.
    pub fn stats(&self) -> ResolutionStats {
        recover(self.stats.read()).clone()
    }

    /// Reset resolution counters.
    pub fn reset_stats(&self) {
        *recover(self.stats.write()) = ResolutionStats::default();
    }

    fn resolve_match(&self, verb: Option<&str>) -> Option<VerbMatch> {
        let verb = verb?;
        let key = normalize_verb(verb)?;
        self.record(|stats| stats.lookups += 1);

        if let Some(cached) = self.cached(verb) {
            trace!(verb, "manager cache hit");
            self.record(|stats| stats.cache_hits += 1);
            return cached.and_then(|outcome| self.materialize(outcome));
        }

        let outcome = self.resolve_uncached(verb, &key);
        self.fresh_cache()
            .entries
            .insert(verb.to_string(), outcome.clone());
        outcome.and_then(|outcome| self.materialize(outcome))
    }

    fn resolve_uncached(&self, verb: &str, key: &str) -> Option<CachedResolution> {
        if let Some(plugin) = self.registry.get_plugin_for_verb(verb) {
            self.record(|stats| stats.exact_matches += 1);
            let canonical_verb = plugin
                .get_canonical_verb(verb)
                .unwrap_or_else(|_| key.to_string());
            debug!(verb, plugin = plugin.name(), "exact match");
            return Some(CachedResolution {
                plugin: plugin.name().to_string(),
                canonical_verb,
                matched: key.to_string(),
                score: 1.0,
                kind: MatchKind::Exact,
            });
        }

        self.record(|stats| stats.fuzzy_attempts += 1);
        let outcome = self.find_plugin_with_fuzzy_matching(key);
        match &outcome {
            Some(found) => {
                self.record(|stats| stats.fuzzy_matches += 1);
                debug!(
                    verb,
                    matched = %found.matched,
                    plugin = %found.plugin,
                    score = found.score,
                    "fuzzy match"
                );
            }
            None => {
                self.record(|stats| stats.misses += 1);
                debug!(verb, threshold = self.config.fuzzy_threshold, "no plugin for verb");
            }
        }
        outcome
    }

    /// Rank the verb universe and pick a winner from the best-scoring tier.
    ///
    /// Within a tier: highest owner priority, then shorter candidate, then
    /// lexical order, then earliest registration. A tier whose candidates
    /// have no live owner falls through to the next one.
    fn find_plugin_with_fuzzy_matching(&self, key: &str) -> Option<CachedResolution> {
        let universe = self.verb_universe();
        let ranked = self.matcher.rank(
            key,
            &universe,
            universe.len(),
            self.config.fuzzy_threshold,
        );
        let kept = retained_len(&ranked, self.config.max_candidates);

        let mut remaining = &ranked[..kept];
        while let Some(first) = remaining.first() {
            let tier_len = remaining
                .iter()
                .take_while(|scored| scored.score.total_cmp(&first.score).is_eq())
                .count();
            let (tier, rest) = remaining.split_at(tier_len);

            if let Some(found) = self.pick_from_tier(tier) {
                return Some(found);
            }
            remaining = rest;
        }
        None
    }

    fn pick_from_tier(&self, tier: &[ScoredCandidate]) -> Option<CachedResolution> {
        tier.iter()
            .filter_map(|scored| {
                let (plugin, canonical_verb) = self.registry.resolve_claim(&scored.candidate)?;
                let sequence = self.registry.get_entry(plugin.name())?.sequence;
                Some((scored, plugin, canonical_verb, sequence))
            })
            .min_by(|a, b| {
                b.1.priority()
                    .cmp(&a.1.priority())
                    .then(a.0.rank_order(b.0))
                    .then(a.3.cmp(&b.3))
            })
            .map(|(scored, plugin, canonical_verb, _)| CachedResolution {
                plugin: plugin.name().to_string(),
                canonical_verb,
                matched: scored.candidate.clone(),
                score: scored.score,
                kind: MatchKind::Fuzzy,
            })
    }

    /// Every verb and alias of every registered plugin, lowercased,
    /// deduplicated and sorted.
    fn verb_universe(&self) -> Arc<Vec<String>> {
        {
            let cache = recover(self.cache.read());
            if cache.generation == self.registry.generation() {
                if let Some(universe) = &cache.universe {
                    return Arc::clone(universe);
                }
            }
        }

        let universe: BTreeSet<String> = self
            .registry
            .plugins()
            .flat_map(|plugin| plugin.get_all_verbs_and_aliases())
            .filter_map(|verb| normalize_verb(&verb))
            .collect();
        let universe = Arc::new(universe.into_iter().collect::<Vec<_>>());
        trace!(size = universe.len(), "built verb universe");

        self.fresh_cache().universe = Some(Arc::clone(&universe));
        universe
    }

    fn cached(&self, verb: &str) -> Option<Option<CachedResolution>> {
        let cache = recover(self.cache.read());
        if cache.generation != self.registry.generation() {
            return None;
        }
        cache.entries.get(verb).cloned()
    }

    /// Write access to the cache, emptied first if the registry moved on.
    fn fresh_cache(&self) -> RwLockWriteGuard<'_, ResolutionCache> {
        let mut cache = recover(self.cache.write());
        let generation = self.registry.generation();
        if cache.generation != generation {
            cache.entries.clear();
            cache.universe = None;
            cache.generation = generation;
        }
        cache
    }

    fn materialize(&self, outcome: CachedResolution) -> Option<VerbMatch> {
        let plugin = self.registry.get_plugin(&outcome.plugin)?;
        Some(VerbMatch {
            plugin,
            canonical_verb: outcome.canonical_verb,
            matched: outcome.matched,
            score: outcome.score,
            kind: outcome.kind,
        })
    }

    fn record(&self, update: impl FnOnce(&mut ResolutionStats)) {
        update(&mut *recover(self.stats.write()));
    }
}

/// Number of ranked candidates to keep: at least `limit`, extended so a tier
/// of equal scores is never split by the cut.
fn retained_len(ranked: &[ScoredCandidate], limit: usize) -> usize {
    if ranked.len() <= limit || limit == 0 {
        return ranked.len().min(limit);
    }
    let boundary = ranked[limit - 1].score;
    limit
        + ranked[limit..]
            .iter()
            .take_while(|scored| scored.score.total_cmp(&boundary).is_eq())
            .count()
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(PluginRegistry::default())
    }
}
