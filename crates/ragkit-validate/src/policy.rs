use serde::{Deserialize, Serialize};

/// Admission thresholds, `[validation]` in the configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Floor for the mean candidate score; also the bar a single candidate
    /// must clear to count as relevant.
    pub min_avg_score: f64,
    /// Floor for `candidates / requested top_k`.
    pub min_recall: f64,
    pub min_relevant_ratio: f64,
    /// Whitespace tokens required across the fetched texts.
    pub min_context_tokens: usize,
    /// How many of the best candidates get their text fetched.
    pub top_n_validate: usize,
    /// Distinct numeric tokens tolerated before the evidence counts as conflicting.
    pub max_distinct_numbers: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_avg_score: 0.25,
            min_recall: 0.4,
            min_relevant_ratio: 0.5,
            min_context_tokens: 150,
            top_n_validate: 3,
            max_distinct_numbers: 1,
        }
    }
}
