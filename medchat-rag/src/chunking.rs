//! Document chunking.
//!
//! This module provides the [`Chunker`] trait, the [`GreedyChunker`]
//! implementation, and [`Chunks`], a lazy iterator over the chunks of a
//! whole document set.
//!
//! Chunks partition their source: concatenating a document's chunks in order
//! yields the document text exactly, and no chunk is longer than the
//! configured bound (measured in characters, never bytes).

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, Document};

/// The smallest piece of text a chunker will not split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// A single character.
    Char,
    /// A word together with the whitespace that follows it.
    #[default]
    Word,
}

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Lazily chunk `documents` in order. See [`Chunks`].
    fn chunks<'a>(&'a self, documents: &'a [Document]) -> Chunks<'a>
    where
        Self: Sized,
    {
        Chunks::new(self, documents)
    }
}

/// Fills each chunk greedily with whole units up to `chunk_size` characters.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}` and each chunk
/// carries a `chunk_index` metadata field. A single word longer than
/// `chunk_size` is cut at character boundaries so the bound always holds.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::{GreedyChunker, Granularity};
///
/// let chunker = GreedyChunker::new(512, Granularity::Word);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyChunker {
    chunk_size: usize,
    granularity: Granularity,
}

impl GreedyChunker {
    /// Create a new `GreedyChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk, at least 1
    /// * `granularity` — unit that is never split unless it alone exceeds `chunk_size`
    pub fn new(chunk_size: usize, granularity: Granularity) -> Self {
        Self { chunk_size: chunk_size.max(1), granularity }
    }

    /// The maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for unit in units(text, self.granularity) {
            let unit_len = unit.chars().count();

            if unit_len > self.chunk_size {
                // Oversized unit: fall back to characters, continuing the open chunk.
                for ch in unit.chars() {
                    if current_len == self.chunk_size {
                        pieces.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    current.push(ch);
                    current_len += 1;
                }
                continue;
            }

            if current_len + unit_len > self.chunk_size {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(unit);
            current_len += unit_len;
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }
}

impl Default for GreedyChunker {
    fn default() -> Self {
        Self::new(512, Granularity::default())
    }
}

/// Split text into indivisible units without dropping any character.
fn units(text: &str, granularity: Granularity) -> Vec<&str> {
    match granularity {
        Granularity::Char => {
            text.char_indices().map(|(i, ch)| &text[i..i + ch.len_utf8()]).collect()
        }
        Granularity::Word => {
            let mut result = Vec::new();
            let mut start = 0;
            let mut prev_is_space = false;

            for (i, ch) in text.char_indices() {
                let is_space = ch.is_whitespace();
                // A new word begins where whitespace ends.
                if prev_is_space && !is_space && i > start {
                    result.push(&text[start..i]);
                    start = i;
                }
                prev_is_space = is_space;
            }

            if start < text.len() {
                result.push(&text[start..]);
            }

            result
        }
    }
}

impl Chunker for GreedyChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("{}_{i}", document.id),
                text,
                embedding: Vec::new(),
                metadata: [("chunk_index".to_string(), i.to_string())].into_iter().collect(),
                document_id: document.id.clone(),
            })
            .collect()
    }
}

/// Lazy iterator over the chunks of a document set, in document order.
///
/// Each document is chunked only when the iterator reaches it. Cloning the
/// iterator, or building a new one from the same documents, restarts the
/// sequence.
pub struct Chunks<'a> {
    chunker: &'a dyn Chunker,
    documents: std::slice::Iter<'a, Document>,
    pending: std::vec::IntoIter<Chunk>,
}

impl<'a> Chunks<'a> {
    /// Create an iterator over all chunks of `documents`.
    pub fn new(chunker: &'a dyn Chunker, documents: &'a [Document]) -> Self {
        Self { chunker, documents: documents.iter(), pending: Vec::new().into_iter() }
    }
}

impl Clone for Chunks<'_> {
    fn clone(&self) -> Self {
        Self {
            chunker: self.chunker,
            documents: self.documents.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            if let Some(chunk) = self.pending.next() {
                return Some(chunk);
            }
            let document = self.documents.next()?;
            self.pending = self.chunker.chunk(document).into_iter();
        }
    }
}
