//! Completion provider trait for the hosted language model.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that turns a single prompt into a text answer.
///
/// The pipeline sends one fully assembled request (retrieved context plus
/// the user's prompt) and takes the first returned message as the answer.
/// Implementations must not retry on their own.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt` and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// The model identifier requests are sent to.
    fn model(&self) -> &str;
}
