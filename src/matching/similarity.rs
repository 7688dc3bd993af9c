//! Edit-distance similarity with a prefix boost.
//!
//! Scores are computed on lowercased strings. A partially typed verb that is
//! a prefix of a candidate (or the other way round, for trailing typos such
//! as "listt") is lifted to at least
//! `prefix_floor + (1 - prefix_floor) * coverage`, where coverage is the
//! shorter length over the longer length.

use crate::matching::strategy::FuzzyMatcher;
use crate::resolver::config::MatchingConfig;
use serde::{Deserialize, Serialize};

/// Base similarity metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Edit distance counting adjacent transpositions as one edit
    #[default]
    DamerauLevenshtein,
    /// Plain edit distance
    Levenshtein,
    /// Jaro-Winkler, favours shared leading characters
    JaroWinkler,
    /// Bigram overlap
    SorensenDice,
}

impl SimilarityMetric {
    /// Normalized similarity in [0, 1].
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::DamerauLevenshtein => strsim::normalized_damerau_levenshtein(a, b),
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(a, b),
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMetric::DamerauLevenshtein => write!(f, "damerau_levenshtein"),
            SimilarityMetric::Levenshtein => write!(f, "levenshtein"),
            SimilarityMetric::JaroWinkler => write!(f, "jaro_winkler"),
            SimilarityMetric::SorensenDice => write!(f, "sorensen_dice"),
        }
    }
}

/// Default matcher: a `SimilarityMetric` plus prefix boost.
#[derive(Clone, Debug)]
pub struct EditDistanceMatcher {
    metric: SimilarityMetric,
    name: String,
    /// Minimum score for a prefix relationship
    prefix_floor: f64,
    /// Shorter side must be at least this many chars for the boost to apply
    min_prefix_len: usize,
}

impl EditDistanceMatcher {
    /// Create a matcher with the default prefix boost.
    pub fn new(metric: SimilarityMetric) -> Self {
        let defaults = MatchingConfig::default();
        Self {
            metric,
            name: metric.to_string(),
            prefix_floor: defaults.prefix_floor,
            min_prefix_len: defaults.min_prefix_len,
        }
    }

    /// Create a matcher from configuration.
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.metric).with_prefix_boost(config.prefix_floor, config.min_prefix_len)
    }

    /// Set prefix boost parameters.
    pub fn with_prefix_boost(mut self, floor: f64, min_len: usize) -> Self {
        self.prefix_floor = floor.clamp(0.0, 1.0);
        self.min_prefix_len = min_len;
        self
    }

    /// Underlying metric.
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Boosted score when one string is a proper prefix of the other.
    pub fn prefix_score(&self, a: &str, b: &str) -> Option<f64> {
        let (a_len, b_len) = (a.chars().count(), b.chars().count());
        let (short, short_len, long, long_len) = if a_len <= b_len {
            (a, a_len, b, b_len)
        } else {
            (b, b_len, a, a_len)
        };

        if short_len < self.min_prefix_len || short_len == long_len || !long.starts_with(short) {
            return None;
        }

        let coverage = short_len as f64 / long_len as f64;
        Some(self.prefix_floor + (1.0 - self.prefix_floor) * coverage)
    }
}

impl Default for EditDistanceMatcher {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl FuzzyMatcher for EditDistanceMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, input: &str, candidate: &str) -> f64 {
        let input = input.to_lowercase();
        let candidate = candidate.to_lowercase();

        let base = self.metric.similarity(&input, &candidate);
        let score = match self.prefix_score(&input, &candidate) {
            Some(boosted) => base.max(boosted),
            None => base,
        };
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_scores_one() {
        let matcher = EditDistanceMatcher::default();
        assert!(close(matcher.score("create", "create"), 1.0));
        assert!(close(matcher.score("LS", "ls"), 1.0));
    }

    #[test]
    fn test_single_edit() {
        let matcher = EditDistanceMatcher::default();
        assert!(close(matcher.score("creatt", "create"), 5.0 / 6.0));
        assert!(close(matcher.score("lst", "list"), 0.75));
    }

    #[test]
    fn test_transposition_counts_once() {
        let damerau = EditDistanceMatcher::new(SimilarityMetric::DamerauLevenshtein);
        let plain = EditDistanceMatcher::new(SimilarityMetric::Levenshtein);
        assert!(close(damerau.score("saerch", "search"), 5.0 / 6.0));
        assert!(close(plain.score("saerch", "search"), 4.0 / 6.0));
    }

    #[test]
    fn test_symmetric() {
        let matcher = EditDistanceMatcher::default();
        for (a, b) in [("creatt", "create"), ("del", "delete"), ("grep", "sed")] {
            assert!(close(matcher.score(a, b), matcher.score(b, a)));
        }
    }

    #[test]
    fn test_prefix_boost() {
        let matcher = EditDistanceMatcher::default();
        // base similarity is 0.5, boosted to 0.8 + 0.2 * 3/6
        assert!(close(matcher.score("del", "delete"), 0.9));
        assert!(close(matcher.score("listt", "list"), 0.8 + 0.2 * 0.8));
        assert!(matcher.score("up", "update") >= 0.75);
    }

    #[test]
    fn test_prefix_beats_equally_distant_non_prefix() {
        let matcher = EditDistanceMatcher::default();
        // both are three edits away from "cop"
        assert!(matcher.score("cop", "copyit") > matcher.score("cop", "xcopyz"));
    }

    #[test]
    fn test_prefix_min_len() {
        let matcher = EditDistanceMatcher::default();
        assert_eq!(matcher.prefix_score("l", "ls"), None);
        assert!(close(matcher.score("l", "ls"), 0.5));

        let eager = EditDistanceMatcher::default().with_prefix_boost(0.8, 1);
        assert!(eager.prefix_score("l", "ls").is_some());
    }

    #[test]
    fn test_no_prefix_for_equal_or_unrelated() {
        let matcher = EditDistanceMatcher::default();
        assert_eq!(matcher.prefix_score("find", "find"), None);
        assert_eq!(matcher.prefix_score("creatt", "create"), None);
    }

    #[test]
    fn test_metrics_stay_in_range() {
        for metric in [
            SimilarityMetric::DamerauLevenshtein,
            SimilarityMetric::Levenshtein,
            SimilarityMetric::JaroWinkler,
            SimilarityMetric::SorensenDice,
        ] {
            let matcher = EditDistanceMatcher::new(metric);
            let pairs = [
                ("", ""),
                ("a", ""),
                ("xyz", "list"),
                ("special_listt", "special_list"),
            ];
            for (a, b) in pairs {
                let score = matcher.score(a, b);
                assert!((0.0..=1.0).contains(&score), "{} {} {}", metric, a, b);
            }
            assert_eq!(matcher.name(), metric.to_string());
        }
    }

    #[test]
    fn test_metric_serde() {
        let json = serde_json::to_string(&SimilarityMetric::JaroWinkler).unwrap();
        assert_eq!(json, "\"jaro_winkler\"");
        let parsed: SimilarityMetric = serde_json::from_str("\"sorensen_dice\"").unwrap();
        assert_eq!(parsed, SimilarityMetric::SorensenDice);
    }
}
