// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns text into vectors and keeps them per workspace
//!
//! Chunking, the two embedding methods (remote endpoint and local hashing
//! fallback), shared vector math, and SQLite persistence of the resulting
//! records.

pub mod chunker;
pub mod local;
pub mod provider;
pub mod remote;
pub mod storage;
pub mod vector;

pub use chunker::{chunk, ChunkConfig, TextChunk, TextChunker, DEFAULT_MAX_CHARS};
pub use local::HashingEmbedder;
pub use provider::{
    create_provider, EmbeddingProvider, ProviderSelection, RemoteConfig,
    DEFAULT_LOCAL_DIMENSIONS,
};
pub use remote::RemoteEmbedder;
pub use storage::{EmbeddingRecord, EmbeddingStorage, ItemSummary, RecordInput};
pub use vector::{cosine_similarity, EmbeddingVector};
