// SPDX-License-Identifier: MIT OR Apache-2.0

//! Brute-force similarity ranking.
//!
//! Scores every candidate against the query with cosine similarity, drops
//! candidates of another dimension and anything under the threshold, and
//! returns the best `limit` hits. Equal scores keep candidate order.

use serde::Serialize;
use tracing::warn;

use crate::embedding::storage::EmbeddingRecord;
use crate::embedding::vector::{cosine_similarity, EmbeddingVector};
use crate::errors::{Result, RetrievalError};

/// Default number of results returned by a query.
pub const DEFAULT_LIMIT: usize = 10;

/// Default minimum score.
pub const DEFAULT_THRESHOLD: f32 = 0.0;

/// A ranked hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub record_id: i64,
    pub item_id: String,
    pub chunk_index: u32,
    pub text: String,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

impl SearchResult {
    fn from_record(record: &EmbeddingRecord, score: f32) -> Self {
        Self {
            record_id: record.id,
            item_id: record.item_id.clone(),
            chunk_index: record.chunk_index,
            text: record.text.clone(),
            score,
        }
    }
}

/// Ranked hits plus bookkeeping about what was left out.
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub results: Vec<SearchResult>,
    /// Candidates skipped because their dimensions differ from the query.
    pub excluded_dimensions: usize,
    /// Candidates that were scored.
    pub scored: usize,
}

/// Ranks `candidates` against `query`.
///
/// Never fails: incomparable candidates are filtered out and zero-norm
/// vectors score 0.0.
/// Accepts a similarity threshold only if it lies within [-1, 1]. NaN is rejected.
pub fn check_threshold(threshold: f32) -> Result<f32> {
    if (-1.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(RetrievalError::Configuration(format!(
            "threshold must be within [-1, 1], got {}",
            threshold
        )))
    }
}

pub fn rank(
    query: &EmbeddingVector,
    candidates: &[EmbeddingRecord],
    limit: usize,
    threshold: f32,
) -> RankOutcome {
    let dimensions = query.dimensions();
    let mut excluded_dimensions = 0;
    let mut scored: Vec<(usize, f32)> = Vec::with_capacity(candidates.len());

    for (position, candidate) in candidates.iter().enumerate() {
        if candidate.dimensions() != dimensions {
            excluded_dimensions += 1;
            continue;
        }
        scored.push((position, cosine_similarity(&query.vector, &candidate.embedding)));
    }

    if excluded_dimensions > 0 {
        warn!(
            excluded = excluded_dimensions,
            query_dimensions = dimensions,
            query_model = %query.model,
            "skipped candidates with mismatched embedding dimensions"
        );
    }

    let total_scored = scored.len();
    scored.retain(|(_, score)| *score >= threshold);
    // stable: ties keep candidate order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);

    RankOutcome {
        results: scored
            .into_iter()
            .map(|(position, score)| SearchResult::from_record(&candidates[position], score))
            .collect(),
        excluded_dimensions,
        scored: total_scored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, item: &str, embedding: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id,
            workspace_id: "ws".to_string(),
            item_id: item.to_string(),
            chunk_index: 0,
            text: format!("chunk {}", id),
            model: "test".to_string(),
            embedding,
            created_at: 0,
        }
    }

    fn query(vector: Vec<f32>) -> EmbeddingVector {
        EmbeddingVector::new(vector, "test")
    }

    #[test]
    fn test_check_threshold_range() {
        assert_eq!(check_threshold(-1.0).unwrap(), -1.0);
        assert_eq!(check_threshold(0.35).unwrap(), 0.35);
        assert!(check_threshold(1.5).is_err());
        assert!(check_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_orders_by_score() {
        let candidates = vec![
            record(1, "b", vec![0.0, 1.0, 0.0]),
            record(2, "a", vec![1.0, 0.0, 0.0]),
            record(3, "c", vec![0.9, 0.1, 0.0]),
        ];
        let outcome = rank(&query(vec![1.0, 0.0, 0.0]), &candidates, 2, 0.0);
        let ids: Vec<_> = outcome.results.iter().map(|r| r.record_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!((outcome.results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_is_filtered() {
        let candidates = vec![
            record(1, "short", vec![1.0, 0.0]),
            record(2, "match", vec![1.0, 0.0, 0.0]),
            record(3, "long", vec![1.0, 0.0, 0.0, 0.0]),
        ];
        let outcome = rank(&query(vec![1.0, 0.0, 0.0]), &candidates, 10, -1.0);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].item_id, "match");
        assert_eq!(outcome.excluded_dimensions, 2);
        assert_eq!(outcome.scored, 1);
    }

    #[test]
    fn test_threshold_and_limit() {
        let candidates: Vec<_> = (0..20)
            .map(|i| record(i, "doc", vec![1.0, i as f32 * 0.1]))
            .collect();
        let outcome = rank(&query(vec![1.0, 0.0]), &candidates, 5, 0.9);
        assert!(outcome.results.len() <= 5);
        assert!(outcome.results.iter().all(|r| r.score >= 0.9));
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let candidates = vec![
            record(7, "x", vec![0.6, 0.8]),
            record(9, "best", vec![1.0, 0.0]),
            record(3, "y", vec![0.6, 0.8]),
            record(5, "z", vec![0.6, 0.8]),
        ];
        let outcome = rank(&query(vec![1.0, 0.0]), &candidates, 10, 0.0);
        let ids: Vec<_> = outcome.results.iter().map(|r| r.record_id).collect();
        assert_eq!(ids, vec![9, 7, 3, 5]);
    }

    #[test]
    fn test_zero_norm_scores_zero() {
        let candidates = vec![record(1, "zero", vec![0.0, 0.0])];
        let outcome = rank(&query(vec![1.0, 0.0]), &candidates, 10, 0.0);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].score, 0.0);

        let outcome = rank(&query(vec![0.0, 0.0]), &candidates, 10, 0.0);
        assert_eq!(outcome.results[0].score, 0.0);
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let candidates = vec![record(1, "a", vec![1.0])];
        let outcome = rank(&query(vec![1.0]), &candidates, 0, 0.0);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_negative_scores_below_default_threshold() {
        let candidates = vec![record(1, "opposite", vec![-1.0, 0.0])];
        let outcome = rank(&query(vec![1.0, 0.0]), &candidates, 10, DEFAULT_THRESHOLD);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.scored, 1);
    }
}
