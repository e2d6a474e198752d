//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] owns the retrieval index for the lifetime of the
//! process. It is built once from the corpus (chunk → embed → store) and
//! then answers prompts (embed → search → assemble context → complete).
//!
//! # Example
//!
//! ```rust,ignore
//! use medchat_rag::{RagPipeline, RagConfig, InMemoryVectorStore, GreedyChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .completion_provider(Arc::new(llm))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(GreedyChunker::default()))
//!     .build()?;
//!
//! pipeline.index(&documents).await?;
//! let answer = pipeline.answer("¿Qué pruebas recomiendas?").await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunking::{Chunker, Chunks, GreedyChunker};
use crate::completion::CompletionProvider;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "corpus";

/// Number of chunks embedded and stored per round trip while indexing.
const INDEX_BATCH: usize = 64;

/// A generated answer and the chunks it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The language model's response.
    pub text: String,
    /// Retrieved chunks, most relevant first.
    pub sources: Vec<SearchResult>,
}

/// Something that can answer a fully built prompt.
///
/// The chat layer depends on this seam only, so tests can swap in a scripted
/// engine instead of the network-backed [`RagPipeline`].
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    /// Answer `prompt`. Failures are request-scoped.
    async fn answer(&self, prompt: &str) -> Result<Answer>;
}

/// Wrap a query with retrieved context the way the language model expects it.
pub fn context_prompt(context: &[SearchResult], query: &str) -> String {
    let context_str =
        context.iter().map(|r| r.chunk.text.trim()).collect::<Vec<_>>().join("\n\n");
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context_str}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`], call
/// [`index`](RagPipeline::index) once, then share it behind an `Arc`.
pub struct RagPipeline {
    config: RagConfig,
    collection: String,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    completion_provider: Arc<dyn CompletionProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Name of the collection holding the index.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Build the index from `documents`, replacing anything indexed before.
    ///
    /// Chunks are produced lazily and embedded in batches. Returns the number
    /// of chunks stored.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails,
    /// including the first affected chunk ID in the message.
    pub async fn index(&self, documents: &[Document]) -> Result<usize> {
        let collection = self.collection.as_str();
        let dimensions = self.embedding_provider.dimensions();

        self.vector_store.delete_collection(collection).await?;
        self.vector_store.create_collection(collection, dimensions).await.map_err(|e| {
            error!(collection, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{collection}': {e}"))
        })?;

        let mut chunks = Chunks::new(self.chunker.as_ref(), documents);
        let mut total = 0;

        loop {
            let mut batch: Vec<Chunk> = chunks.by_ref().take(INDEX_BATCH).collect();
            if batch.is_empty() {
                break;
            }
            let first_id = batch[0].id.clone();

            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(chunk.id = %first_id, error = %e, "embedding failed during indexing");
                RagError::PipelineError(format!("embedding failed at chunk '{first_id}': {e}"))
            })?;

            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }

            self.vector_store.upsert(collection, &batch).await.map_err(|e| {
                error!(chunk.id = %first_id, error = %e, "upsert failed during indexing");
                RagError::PipelineError(format!("upsert failed at chunk '{first_id}': {e}"))
            })?;

            total += batch.len();
        }

        if total == 0 {
            warn!(document_count = documents.len(), "corpus produced no chunks");
        }
        info!(document_count = documents.len(), chunk_count = total, "built retrieval index");

        Ok(total)
    }

    /// Embed `query` and return the `top_k` nearest chunks.
    ///
    /// With a configured similarity threshold, results scoring below it are
    /// dropped; otherwise every one of the `top_k` hits is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or search fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let collection = self.collection.as_str();
        let results = self
            .vector_store
            .search(collection, &query_embedding, self.config.top_k)
            .await
            .map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                RagError::PipelineError(format!("search failed in collection '{collection}': {e}"))
            })?;

        Ok(match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        })
    }

    async fn answer_inner(&self, prompt: &str) -> Result<Answer> {
        let sources = self.retrieve(prompt).await?;
        let request = context_prompt(&sources, prompt);
        let text = self.completion_provider.complete(&request).await?;

        info!(
            model = self.completion_provider.model(),
            source_count = sources.len(),
            answer_len = text.len(),
            "answered query"
        );

        Ok(Answer { text, sources })
    }
}

#[async_trait]
impl AnswerEngine for RagPipeline {
    /// Retrieve context for `prompt`, then ask the language model.
    ///
    /// The whole round trip is bounded by `request_timeout`.
    async fn answer(&self, prompt: &str) -> Result<Answer> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.answer_inner(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                error!(?timeout, "answer timed out");
                Err(RagError::Timeout(timeout))
            }
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider, completion provider and vector store are required.
/// Config defaults to [`RagConfig::default()`] and the chunker to a
/// [`GreedyChunker`] derived from the config.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    collection: Option<String>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the completion provider.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let completion_provider = self
            .completion_provider
            .ok_or_else(|| RagError::ConfigError("completion_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(GreedyChunker::new(config.chunk_size, config.granularity))
        });

        Ok(RagPipeline {
            config,
            collection: self.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            embedding_provider,
            completion_provider,
            vector_store,
            chunker,
        })
    }
}
