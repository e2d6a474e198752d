//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One patient record loaded from the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document (`record_{index}`).
    pub id: String,
    /// Flattened text of the record, used for chunking and embedding.
    pub text: String,
    /// The source record, preserved verbatim.
    pub metadata: Map<String, Value>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

/// A segment of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{document_id}_{chunk_index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until indexed.
    pub embedding: Vec<f32>,
    /// Chunk-specific fields such as `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`]. Lookup only.
    pub document_id: String,
}

impl Chunk {
    /// Position of this chunk within its parent document.
    pub fn index(&self) -> Option<usize> {
        self.metadata.get("chunk_index").and_then(|i| i.parse().ok())
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Find the document a chunk was cut from.
pub fn source_document<'a>(documents: &'a [Document], chunk: &Chunk) -> Option<&'a Document> {
    documents.iter().find(|d| d.id == chunk.document_id)
}
