//! Resolver configuration.

use crate::core::{Error, Result};
use crate::matching::SimilarityMetric;
use serde::{Deserialize, Serialize};

/// Default fuzzy acceptance threshold.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.75;

/// Fuzzy matching configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum score a fuzzy candidate needs, in [0, 1]
    pub fuzzy_threshold: f64,
    /// Candidates kept after ranking
    pub max_candidates: usize,
    /// Minimum score for a prefix relationship, in [0, 1]
    pub prefix_floor: f64,
    /// Shortest prefix that earns the boost
    pub min_prefix_len: usize,
    /// Base similarity metric
    pub metric: SimilarityMetric,
    /// Looser threshold used for "did you mean" suggestions
    pub suggestion_threshold: f64,
}

impl MatchingConfig {
    /// Parse from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the fuzzy threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Set the similarity metric.
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.fuzzy_threshold)?;
        validate_threshold(self.suggestion_threshold)?;
        if !(0.0..=1.0).contains(&self.prefix_floor) {
            return Err(Error::Config(format!(
                "prefix_floor {} is outside [0, 1]",
                self.prefix_floor
            )));
        }
        if self.max_candidates == 0 {
            return Err(Error::Config("max_candidates must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            max_candidates: 3,
            prefix_floor: 0.8,
            min_prefix_len: 2,
            metric: SimilarityMetric::default(),
            suggestion_threshold: 0.5,
        }
    }
}

/// Reject thresholds outside [0, 1] (NaN included).
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold(threshold))
    }
}
