// SPDX-License-Identifier: MIT OR Apache-2.0

//! paperdex - semantic retrieval core for research workspaces
//!
//! Chunking, embedding (remote endpoint or local hashing fallback), SQLite
//! record storage and brute-force cosine ranking, scoped per workspace.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod output;
pub mod ranking;
pub mod retrieval;
pub mod utils;

pub use errors::RetrievalError;
pub use ranking::{rank, RankOutcome, SearchResult};
pub use retrieval::{IngestReport, Retriever};
