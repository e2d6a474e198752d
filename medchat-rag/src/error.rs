//! Error types for the `medchat-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building or querying the retrieval index.
#[derive(Debug, Error)]
pub enum RagError {
    /// The corpus file is missing or is not the expected JSON structure.
    #[error("Failed to load corpus '{path}': {message}")]
    LoadError {
        /// Path of the corpus file.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model completion call failed.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// The answer did not arrive within the configured request timeout.
    #[error("Answer timed out after {0:?}")]
    Timeout(Duration),
}

impl RagError {
    /// Whether this error belongs to a single query and leaves the index usable.
    ///
    /// Load and configuration errors are fatal at startup; everything raised
    /// while embedding, searching or completing a query is request-scoped.
    pub fn is_retrieval(&self) -> bool {
        !matches!(self, RagError::LoadError { .. } | RagError::ConfigError(_))
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
