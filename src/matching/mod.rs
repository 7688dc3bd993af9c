//! Approximate verb matching.
//!
//! - `FuzzyMatcher` strategy trait (`score` + `rank`)
//! - `EditDistanceMatcher`, the default strategy, over `strsim` metrics

pub mod similarity;
pub mod strategy;

pub use similarity::{EditDistanceMatcher, SimilarityMetric};
pub use strategy::{FuzzyMatcher, ScoredCandidate};
