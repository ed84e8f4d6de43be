//! Admission gate run on fused candidates before anything is answered.
//!
//! Gates run in a fixed order and the first one that fails decides the
//! verdict. Score-only gates come first; chunk text is fetched only once
//! all of them have passed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use ragkit_core::error::Result;
use ragkit_core::traits::ChunkTextSource;
use ragkit_core::types::FusedHit;

use crate::policy::ValidationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    EmptyContext,
    WeakRetrieval,
    LowRecall,
    PartialRelevance,
    InsufficientContext,
    ConflictingSources,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::EmptyContext => "empty_context",
            FailureReason::WeakRetrieval => "weak_retrieval",
            FailureReason::LowRecall => "low_recall",
            FailureReason::PartialRelevance => "partial_relevance",
            FailureReason::InsufficientContext => "insufficient_context",
            FailureReason::ConflictingSources => "conflicting_sources",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Numbers computed on the way to a verdict. Fields stay `None` for gates
/// that were never reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mean_score: Option<f64>,
    pub recall_proxy: Option<f64>,
    pub relevant_ratio: Option<f64>,
    pub context_tokens: Option<usize>,
    pub numeric_tokens: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub admitted: bool,
    pub reason: Option<FailureReason>,
    #[serde(default)]
    pub metrics: ValidationMetrics,
}

impl Verdict {
    pub fn admitted() -> Self { Self { admitted: true, reason: None, metrics: ValidationMetrics::default() } }

    pub fn rejected(reason: FailureReason) -> Self {
        Self { admitted: false, reason: Some(reason), metrics: ValidationMetrics::default() }
    }

    fn with_metrics(mut self, metrics: ValidationMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalValidator {
    policy: ValidationPolicy,
}

impl RetrievalValidator {
    pub fn new(policy: ValidationPolicy) -> Self { Self { policy } }

    pub fn policy(&self) -> &ValidationPolicy { &self.policy }

    /// Decide whether `candidates` (best first, as fused) are good enough to
    /// answer from. `requested_top_k` is the `top_k` the retrieval asked for.
    ///
    /// A rejection is a normal verdict. Only a failing text fetch is an error.
    pub fn validate(&self, candidates: &[FusedHit], requested_top_k: usize, source: &dyn ChunkTextSource) -> Result<Verdict> {
        let p = &self.policy;
        let mut metrics = ValidationMetrics::default();
        let reject = |reason: FailureReason, metrics: ValidationMetrics| -> Result<Verdict> {
            tracing::info!(%reason, ?metrics, "retrieval rejected");
            Ok(Verdict::rejected(reason).with_metrics(metrics))
        };

        if candidates.is_empty() {
            return reject(FailureReason::EmptyContext, metrics);
        }

        let n = candidates.len() as f64;
        let mean = candidates.iter().map(|c| c.fused_score).sum::<f64>() / n;
        metrics.mean_score = Some(mean);
        tracing::debug!(mean, min = p.min_avg_score, "weak_retrieval gate");
        if mean < p.min_avg_score {
            return reject(FailureReason::WeakRetrieval, metrics);
        }

        let recall = recall_proxy(candidates.len(), requested_top_k);
        metrics.recall_proxy = Some(recall);
        tracing::debug!(recall, min = p.min_recall, "low_recall gate");
        if recall < p.min_recall {
            return reject(FailureReason::LowRecall, metrics);
        }

        let relevant = candidates.iter().filter(|c| c.fused_score >= p.min_avg_score).count() as f64 / n;
        metrics.relevant_ratio = Some(relevant);
        tracing::debug!(relevant, min = p.min_relevant_ratio, "partial_relevance gate");
        if relevant < p.min_relevant_ratio {
            return reject(FailureReason::PartialRelevance, metrics);
        }

        let texts = candidates
            .iter()
            .take(p.top_n_validate)
            .map(|c| source.fetch_chunk_text(&c.chunk_id))
            .collect::<Result<Vec<_>>>()?;

        let tokens: usize = texts.iter().map(|t| t.split_whitespace().count()).sum();
        metrics.context_tokens = Some(tokens);
        tracing::debug!(tokens, min = p.min_context_tokens, fetched = texts.len(), "insufficient_context gate");
        if tokens < p.min_context_tokens {
            return reject(FailureReason::InsufficientContext, metrics);
        }

        let numbers = distinct_numbers(&texts);
        tracing::debug!(distinct = numbers.len(), max = p.max_distinct_numbers, "conflicting_sources gate");
        let conflicting = numbers.len() > p.max_distinct_numbers;
        metrics.numeric_tokens = Some(numbers.into_iter().collect());
        if conflicting {
            return reject(FailureReason::ConflictingSources, metrics);
        }

        tracing::info!(?metrics, "retrieval admitted");
        Ok(Verdict::admitted().with_metrics(metrics))
    }
}

/// `retrieved / requested`; nothing requested means nothing recalled.
pub fn recall_proxy(retrieved: usize, requested_top_k: usize) -> f64 {
    if requested_top_k == 0 { 0.0 } else { retrieved as f64 / requested_top_k as f64 }
}

/// Whitespace tokens made only of numeric characters (any script),
/// deduplicated and sorted. `"17.4.2"` and `"2024,"` are not numbers.
pub fn distinct_numbers<S: AsRef<str>>(texts: &[S]) -> BTreeSet<String> {
    texts
        .iter()
        .flat_map(|t| t.as_ref().split_whitespace())
        .filter(|tok| tok.chars().all(char::is_numeric))
        .map(str::to_string)
        .collect()
}
