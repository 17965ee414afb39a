// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text chunker for embedding generation.
//!
//! Documents are split into paragraphs on runs of newlines. Paragraphs that fit
//! within `max_chars` become one chunk; longer paragraphs are cut into
//! consecutive, non-overlapping slices of exactly `max_chars` characters.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHARS: usize = 900;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

/// Configuration for the text chunker.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum number of characters per chunk.
    pub max_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl ChunkConfig {
    /// Creates a new ChunkConfig with the given maximum chunk length.
    pub fn new(max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            bail!("max_chars must be greater than 0");
        }
        Ok(Self { max_chars })
    }
}

/// A contiguous span of source text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in the document (0-indexed).
    pub index: usize,
    /// The chunk text content.
    pub text: String,
}

/// Splits documents into bounded-size chunks.
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    /// Creates a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Creates a chunker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Splits `content` into ordered chunks.
    ///
    /// ```text
    /// for paragraph in content.split(/\n+/):
    ///   paragraph = trim(paragraph)
    ///   skip if empty
    ///   if chars(paragraph) <= max_chars: emit paragraph
    ///   else: emit paragraph[0..max), paragraph[max..2max), ...
    /// ```
    pub fn chunk_text(&self, content: &str) -> Vec<TextChunk> {
        let max_chars = self.config.max_chars.max(1);
        let mut chunks = Vec::new();

        for paragraph in PARAGRAPH_BREAK.split(content) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            for piece in split_by_chars(paragraph, max_chars) {
                chunks.push(TextChunk {
                    index: chunks.len(),
                    text: piece.to_string(),
                });
            }
        }

        chunks
    }
}

/// Chunks optional text with the given limit. Absent or empty text yields no chunks.
///
/// A `max_chars` of zero falls back to [`DEFAULT_MAX_CHARS`].
pub fn chunk(text: Option<&str>, max_chars: usize) -> Vec<TextChunk> {
    let Some(text) = text else {
        return Vec::new();
    };
    let config = ChunkConfig::new(max_chars).unwrap_or_default();
    TextChunker::new(config).chunk_text(text)
}

/// Slices `input` into pieces of at most `max_chars` characters on char boundaries.
fn split_by_chars(input: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in input.char_indices() {
        if count == max_chars {
            pieces.push(&input[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < input.len() {
        pieces.push(&input[start..]);
    }

    pieces
}
