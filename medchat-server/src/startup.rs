//! Builds the answer engine once at process start.

use std::sync::Arc;

use anyhow::Context;
use medchat_rag::{
    CorpusFormat, CorpusLoader, InMemoryVectorStore, OpenAICompletionProvider,
    OpenAIEmbeddingProvider, RagConfig, RagPipeline,
};
use tracing::info;

use crate::config::AppConfig;

/// Load the corpus, chunk and embed it, and return a ready pipeline.
///
/// Any failure here is fatal to startup.
pub async fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<RagPipeline>> {
    let format = match config.corpus_path.extension().and_then(|ext| ext.to_str()) {
        Some("jsonl") | Some("ndjson") => CorpusFormat::JsonLines,
        _ => CorpusFormat::Json,
    };
    let documents = CorpusLoader::new()
        .with_format(format)
        .load(&config.corpus_path)
        .with_context(|| format!("failed to load corpus {}", config.corpus_path.display()))?;
    info!(path = %config.corpus_path.display(), documents = documents.len(), "corpus loaded");

    let embedding = OpenAIEmbeddingProvider::new(&config.api_key)?
        .with_base_url(&config.api_base)
        .with_model(&config.embedding_model);
    let completion = OpenAICompletionProvider::new(&config.api_key)?
        .with_base_url(&config.api_base)
        .with_model(&config.chat_model);

    let rag_config = RagConfig::builder().request_timeout(config.request_timeout).build()?;

    let pipeline = RagPipeline::builder()
        .config(rag_config)
        .embedding_provider(Arc::new(embedding))
        .completion_provider(Arc::new(completion))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()?;

    let chunks = pipeline.index(&documents).await.context("failed to build the vector index")?;
    info!(chunks, model = %config.chat_model, "index ready");

    Ok(Arc::new(pipeline))
}
