// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workspace-scoped ingestion and query.
//!
//! Ingest: text → chunks → embeddings (in parallel, collected in chunk order)
//! → one transaction of records. Query: text → embedding → rank against the
//! records of a single workspace. Every query takes that path, including one
//! with no tokens, which embeds to the zero vector and scores 0 everywhere.

use serde::Serialize;
use tracing::{debug, warn};

use crate::embedding::chunker::{ChunkConfig, TextChunker};
use crate::embedding::provider::EmbeddingProvider;
use crate::embedding::storage::{EmbeddingStorage, ItemSummary, RecordInput};
use crate::ranking::{rank, RankOutcome, SearchResult};
use crate::errors::{Result, RetrievalError};

/// A chunk that could not be embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    pub chunk_index: u32,
    pub message: String,
}

/// Outcome of ingesting one item.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub workspace_id: String,
    pub item_id: String,
    /// Number of chunks the text produced.
    pub chunks: usize,
    /// Number of records written.
    pub created: usize,
    pub record_ids: Vec<i64>,
    pub failures: Vec<ChunkFailure>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns a report with chunk failures into a provider error.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        let first = &self.failures[0];
        Err(RetrievalError::provider(format!(
            "{} of {} chunks of item '{}' failed to embed (chunk {}: {})",
            self.failures.len(),
            self.chunks,
            self.item_id,
            first.chunk_index,
            first.message
        )))
    }
}

/// Per-workspace summary.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceStats {
    pub workspace_id: String,
    pub records: u64,
    pub items: Vec<ItemStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemStats {
    pub item_id: String,
    pub records: u64,
    pub model: String,
    pub dimensions: usize,
}

impl From<ItemSummary> for ItemStats {
    fn from(summary: ItemSummary) -> Self {
        Self {
            item_id: summary.item_id,
            records: summary.record_count,
            model: summary.model,
            dimensions: summary.dimensions,
        }
    }
}

/// The retrieval core: a provider, a chunker and a record store.
pub struct Retriever {
    provider: Box<dyn EmbeddingProvider>,
    storage: EmbeddingStorage,
    chunker: TextChunker,
}

impl Retriever {
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        storage: EmbeddingStorage,
        chunk_config: ChunkConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            chunker: TextChunker::new(chunk_config),
        }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn storage(&self) -> &EmbeddingStorage {
        &self.storage
    }

    /// Chunks, embeds and stores `text` for an item.
    ///
    /// Chunks that fail to embed are reported in the returned
    /// [`IngestReport`]; the rest are written together. Existing records for
    /// the item are kept.
    pub fn ingest(&mut self, workspace_id: &str, item_id: &str, text: &str) -> Result<IngestReport> {
        let chunks = self.chunker.chunk_text(text);
        debug!(workspace_id, item_id, chunks = chunks.len(), "ingesting item");

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let embedded = self.provider.embed_each(&texts);

        let mut inputs = Vec::with_capacity(chunks.len());
        let mut failures = Vec::new();
        for (chunk, outcome) in chunks.iter().zip(embedded.iter()) {
            match outcome {
                Ok(vector) => inputs.push(RecordInput {
                    chunk_index: chunk.index as u32,
                    text: &chunk.text,
                    model: &vector.model,
                    embedding: &vector.vector,
                }),
                Err(err) => {
                    warn!(workspace_id, item_id, chunk = chunk.index, "chunk embedding failed: {}", err);
                    failures.push(ChunkFailure {
                        chunk_index: chunk.index as u32,
                        message: err.to_string(),
                    });
                }
            }
        }

        let record_ids = self
            .storage
            .insert_item_records(workspace_id, item_id, &inputs)?;

        Ok(IngestReport {
            workspace_id: workspace_id.to_string(),
            item_id: item_id.to_string(),
            chunks: chunks.len(),
            created: record_ids.len(),
            record_ids,
            failures,
        })
    }

    /// Ingests a document's content, falling back to its title when the
    /// content is absent or blank.
    pub fn ingest_document(
        &mut self,
        workspace_id: &str,
        item_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<IngestReport> {
        let text = content
            .filter(|c| !c.trim().is_empty())
            .or(title)
            .unwrap_or("");
        self.ingest(workspace_id, item_id, text)
    }

    /// Embeds new text for an item. Prior records are not touched; delete
    /// them first with [`Retriever::delete_item`] when they are stale.
    pub fn reembed(&mut self, workspace_id: &str, item_id: &str, text: &str) -> Result<IngestReport> {
        self.ingest(workspace_id, item_id, text)
    }

    /// Returns the best matches for `query` within one workspace.
    pub fn query(
        &self,
        workspace_id: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        Ok(self.query_detailed(workspace_id, query, limit, threshold)?.results)
    }

    /// Like [`Retriever::query`], keeping the ranking bookkeeping.
    pub fn query_detailed(
        &self,
        workspace_id: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<RankOutcome> {
        if limit == 0 {
            return Ok(RankOutcome::default());
        }

        let query_vector = self.provider.embed(query)?;
        let candidates = self.storage.records_for_workspace(workspace_id)?;
        debug!(
            workspace_id,
            candidates = candidates.len(),
            dimensions = query_vector.dimensions(),
            "ranking workspace records"
        );

        Ok(rank(&query_vector, &candidates, limit, threshold))
    }

    /// Deletes every record of an item. Returns the number removed.
    pub fn delete_item(&self, workspace_id: &str, item_id: &str) -> Result<usize> {
        Ok(self.storage.delete_item(workspace_id, item_id)?)
    }

    /// Deletes every record of a workspace.
    pub fn delete_workspace(&self, workspace_id: &str) -> Result<usize> {
        Ok(self.storage.delete_workspace(workspace_id)?)
    }

    pub fn stats(&self, workspace_id: &str) -> Result<WorkspaceStats> {
        Ok(WorkspaceStats {
            workspace_id: workspace_id.to_string(),
            records: self.storage.count_records(workspace_id)?,
            items: self
                .storage
                .list_items(workspace_id)?
                .into_iter()
                .map(ItemStats::from)
                .collect(),
        })
    }
}
