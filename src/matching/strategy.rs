//! Pluggable approximate-matching strategy.

use serde::Serialize;
use std::cmp::Ordering;

/// A candidate that survived ranking.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    /// Candidate string, as it appeared in the universe
    pub candidate: String,
    /// Similarity score in [0, 1]
    pub score: f64,
}

impl ScoredCandidate {
    /// Create a new scored candidate.
    pub fn new(candidate: &str, score: f64) -> Self {
        Self {
            candidate: candidate.to_string(),
            score,
        }
    }

    /// Ranking order: higher score first, then shorter, then lexical.
    pub fn rank_order(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.candidate.chars().count().cmp(&other.candidate.chars().count()))
            .then_with(|| self.candidate.cmp(&other.candidate))
    }
}

/// Approximate string matcher.
///
/// `score` must be symmetric in its arguments apart from any prefix boost,
/// return values in [0, 1], and give 1.0 for identical strings.
pub trait FuzzyMatcher: Send + Sync {
    /// Matcher name, for diagnostics.
    fn name(&self) -> &str;

    /// Similarity between `input` and `candidate`.
    fn score(&self, input: &str, candidate: &str) -> f64;

    /// Score every candidate, drop those below `threshold` and keep at most
    /// `limit`, best first.
    fn rank(
        &self,
        input: &str,
        candidates: &[String],
        limit: usize,
        threshold: f64,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|candidate| ScoredCandidate::new(candidate, self.score(input, candidate)))
            .filter(|scored| scored.score >= threshold)
            .collect();

        scored.sort_by(ScoredCandidate::rank_order);
        scored.truncate(limit);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores by shared leading characters.
    struct CommonPrefixMatcher;

    impl FuzzyMatcher for CommonPrefixMatcher {
        fn name(&self) -> &str {
            "common-prefix"
        }

        fn score(&self, input: &str, candidate: &str) -> f64 {
            let longest = input.len().max(candidate.len());
            if longest == 0 {
                return 1.0;
            }
            let shared = input
                .chars()
                .zip(candidate.chars())
                .take_while(|(a, b)| a == b)
                .count();
            shared as f64 / longest as f64
        }
    }

    fn universe(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_rank_filters_by_threshold() {
        let ranked = CommonPrefixMatcher.rank("cop", &universe(&["copy", "cat", "move"]), 3, 0.5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate, "copy");
        assert_eq!(ranked[0].score, 0.75);
    }

    #[test]
    fn test_rank_limit() {
        let ranked = CommonPrefixMatcher.rank("a", &universe(&["ab", "ac", "ad", "ae"]), 3, 0.0);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_rank_tie_break_length_then_lexical() {
        let ranked =
            CommonPrefixMatcher.rank("x", &universe(&["zz", "yy", "q", "www"]), 10, 0.0);
        let order: Vec<&str> = ranked.iter().map(|c| c.candidate.as_str()).collect();
        assert_eq!(order, vec!["q", "yy", "zz", "www"]);
    }

    #[test]
    fn test_rank_order_prefers_score() {
        let high = ScoredCandidate::new("longer", 0.9);
        let low = ScoredCandidate::new("s", 0.8);
        assert_eq!(high.rank_order(&low), Ordering::Less);
    }
}
