// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types surfaced at the retrieval boundary.
//!
//! Chunking, vector math, the local embedder and ranking are total and never
//! produce these. Only configuration, the remote provider and storage can fail.

use thiserror::Error;

/// Errors returned by the retrieval core.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A required setting is missing or invalid. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote embedding call failed (network, HTTP status or response body).
    #[error("embedding provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The vector store could not be read or written.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl RetrievalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    pub fn provider_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Provider {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true when a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
