// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic hashing embedder used when no remote provider is configured.
//!
//! Bag-of-words counting: every token is hashed with blake3, the first two
//! digest bytes form a `u16`, and slot `hash % D` is incremented. The counts
//! are then scaled to unit length. Same text always gives the same vector.

use super::provider::EmbeddingProvider;
use super::vector::{l2_normalize, EmbeddingVector};
use crate::errors::{RetrievalError, Result};

/// Local fallback provider.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RetrievalError::config(
                "local embedding dimensions must be greater than 0",
            ));
        }
        Ok(Self {
            dimensions,
            model_id: format!("local-hash-{}", dimensions),
        })
    }

    /// Embeds `text` without touching the network. Never fails.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in tokenize(text) {
            let slot = token_hash(&token) as usize % self.dimensions;
            vector[slot] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        Ok(EmbeddingVector::new(self.embed_text(text), self.model_id.clone()))
    }
}

/// Lower-cases, maps anything outside `[a-z0-9\s-]` to a space, and splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Stable 16-bit token hash: the first two bytes of the blake3 digest.
pub fn token_hash(token: &str) -> u16 {
    let digest = blake3::hash(token.as_bytes());
    let bytes = digest.as_bytes();
    u16::from_be_bytes([bytes[0], bytes[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::vector::{cosine_similarity, l2_norm};

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Fusion, Research! state-of-the-art\tv2"),
            vec!["fusion", "research", "state-of-the-art", "v2"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ???").is_empty());
    }

    #[test]
    fn test_non_ascii_letters_are_separators() {
        assert_eq!(tokenize("café au lait"), vec!["caf", "au", "lait"]);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[test]
    fn test_unit_norm() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let v = embedder.embed_text("tokamak plasma confinement and plasma heating");
        assert_eq!(v.len(), 384);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let v = embedder.embed_text("  ...  ");
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::new(128).unwrap();
        let a = embedder.embed_text("neutron flux measurements");
        let b = HashingEmbedder::new(128)
            .unwrap()
            .embed_text("neutron flux measurements");
        let a_bits: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_counts_repeated_tokens() {
        let embedder = HashingEmbedder::new(1024).unwrap();
        let v = embedder.embed_text("plasma plasma");
        let slot = token_hash("plasma") as usize % 1024;
        assert!((v[slot] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lexical_overlap_scores_higher() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let query = embedder.embed_text("fusion reactor");
        let close = embedder.embed_text("a fusion reactor design");
        let far = embedder.embed_text("protein folding kinetics");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_model_id_includes_dimensions() {
        let embedder = HashingEmbedder::new(8).unwrap();
        let embedded = embedder.embed("fusion").unwrap();
        assert_eq!(embedded.model, "local-hash-8");
        assert_eq!(embedded.dimensions(), 8);
    }
}
