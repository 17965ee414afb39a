// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and dispatch.
//!
//! The provider is chosen once, when configuration is resolved into a
//! [`ProviderSelection`]. Call sites only ever see `dyn EmbeddingProvider`.

use std::time::Duration;

use rayon::prelude::*;
use tracing::debug;

use super::local::HashingEmbedder;
use super::remote::RemoteEmbedder;
use super::vector::EmbeddingVector;
use crate::errors::Result;

/// Default dimension of the local hashing embedder.
pub const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

/// Default remote embedding model.
pub const DEFAULT_REMOTE_MODEL: &str = "text-embedding-3-small";

/// Default OpenAI-compatible base URL.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default request timeout for the remote provider.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the remote embedding endpoint.
#[derive(Clone)]
pub struct RemoteConfig {
    pub api_key: String,
    /// Base URL; `/embeddings` is appended.
    pub endpoint: String,
    pub model: String,
    /// Requested output size, if the endpoint supports it.
    pub dimensions: Option<usize>,
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The embedding method selected at startup.
#[derive(Debug, Clone)]
pub enum ProviderSelection {
    Remote(RemoteConfig),
    Local { dimensions: usize },
}

impl ProviderSelection {
    pub fn local(dimensions: usize) -> Self {
        Self::Local { dimensions }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier stored alongside every vector.
    fn model_id(&self) -> &str;

    /// Returns the output dimension when it is known ahead of a call.
    fn dimensions(&self) -> Option<usize>;

    /// Generates a unit-normalized embedding for a single text.
    fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Embeds each text independently and in parallel. Outcomes are
    /// returned in input order; one failure does not affect the others.
    fn embed_each(&self, texts: &[&str]) -> Vec<Result<EmbeddingVector>> {
        texts.par_iter().map(|text| self.embed(text)).collect()
    }
}

/// Builds the provider for a resolved selection.
pub fn create_provider(selection: &ProviderSelection) -> Result<Box<dyn EmbeddingProvider>> {
    match selection {
        ProviderSelection::Remote(config) => {
            debug!(model = %config.model, endpoint = %config.endpoint, "using remote embedding provider");
            Ok(Box::new(RemoteEmbedder::new(config.clone())?))
        }
        ProviderSelection::Local { dimensions } => {
            debug!(dimensions, "using local hashing embedder");
            Ok(Box::new(HashingEmbedder::new(*dimensions)?))
        }
    }
}
