// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector math shared by the embedders and the ranker.

use serde::{Deserialize, Serialize};

/// A fixed-length embedding tagged with the method that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub vector: Vec<f32>,
    pub model: String,
}

impl EmbeddingVector {
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            vector,
            model: model.into(),
        }
    }

    /// Number of components.
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    /// Euclidean norm of the vector.
    pub fn norm(&self) -> f32 {
        l2_norm(&self.vector)
    }
}

/// Dot product over the common prefix of `a` and `b`.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

/// Cosine similarity in [-1, 1].
///
/// Returns 0.0 for vectors of different length, empty vectors, or when either
/// side has zero norm, so callers never see NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let magnitude_a = l2_norm(a);
    let magnitude_b = l2_norm(b);
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    let score = dot(a, b) / (magnitude_a * magnitude_b);
    score.clamp(-1.0, 1.0)
}
