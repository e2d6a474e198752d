//! # medchat-rag
//!
//! Retrieval-augmented answering over a fixed corpus of patient histories.
//!
//! ## Overview
//!
//! - [`CorpusLoader`] reads the JSON corpus into [`Document`]s
//! - [`GreedyChunker`] cuts documents into bounded, lossless [`Chunk`]s
//! - [`EmbeddingProvider`] and [`CompletionProvider`] wrap the hosted model API
//!   ([`openai`] has the OpenAI-compatible implementations)
//! - [`InMemoryVectorStore`] holds the index and runs cosine search
//! - [`RagPipeline`] builds the index once and answers prompts through
//!   [`AnswerEngine`]

pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod openai;
pub mod pipeline;
pub mod vectorstore;

pub use chunking::{Chunker, Chunks, Granularity, GreedyChunker};
pub use completion::CompletionProvider;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::{CorpusFormat, CorpusLoader};
pub use openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
pub use pipeline::{Answer, AnswerEngine, RagPipeline, RagPipelineBuilder, context_prompt};
pub use vectorstore::VectorStore;
