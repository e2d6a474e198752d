//! The submit action: prompt building, answering, and history updates.

use std::sync::Arc;

use medchat_rag::{AnswerEngine, RagError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::conversation::{Conversation, Turn};
use crate::prompt::{Category, InvalidCategoryError, Locale, build_prompt};

/// Errors surfaced to the user for a single request.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    InvalidCategory(#[from] InvalidCategoryError),

    /// Embedding, search or completion failed. The session stays usable.
    #[error("could not get an answer: {0}")]
    Retrieval(#[from] RagError),

    /// The request body was not a valid chat request.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

/// A retrieved chunk the answer was based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub document_id: String,
    pub score: f32,
}

/// What one successful submit produced.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub prompt: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Runs submits against a shared, already built answer engine.
#[derive(Clone)]
pub struct ChatService {
    engine: Arc<dyn AnswerEngine>,
    locale: Locale,
}

impl ChatService {
    pub fn new(engine: Arc<dyn AnswerEngine>, locale: Locale) -> Self {
        Self { engine, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Answer `text` under `category` and record the exchange.
    ///
    /// Blank input is a no-op and returns `Ok(None)` without calling the
    /// engine. The user and bot turns are appended together once the answer
    /// arrives; on failure the conversation is left exactly as it was.
    pub async fn submit(
        &self,
        conversation: &mut Conversation,
        category: Category,
        text: &str,
    ) -> Result<Option<Exchange>, ChatError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let prompt = build_prompt(category, self.locale, text);
        let answer = self.engine.answer(&prompt).await.map_err(|e| {
            warn!(%category, error = %e, "answer failed; history unchanged");
            e
        })?;

        conversation.append(Turn::user(text));
        conversation.append(Turn::bot(answer.text.clone()));
        info!(%category, history_len = conversation.len(), "recorded exchange");

        let sources = answer
            .sources
            .iter()
            .map(|r| SourceRef {
                chunk_id: r.chunk.id.clone(),
                document_id: r.chunk.document_id.clone(),
                score: r.score,
            })
            .collect();

        Ok(Some(Exchange { prompt, answer: answer.text, sources }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use medchat_rag::Answer;

    use super::*;
    use crate::conversation::Role;

    /// Replies with a fixed answer, or fails, and records every prompt.
    struct ScriptedEngine {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedEngine {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { fail, prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl AnswerEngine for ScriptedEngine {
        async fn answer(&self, prompt: &str) -> medchat_rag::Result<Answer> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(RagError::CompletionError {
                    provider: "scripted".into(),
                    message: "service unavailable".into(),
                });
            }
            let n = self.prompts.lock().unwrap().len();
            Ok(Answer { text: format!("answer #{n}"), sources: Vec::new() })
        }
    }

    #[tokio::test]
    async fn test_suggestion_scenario() {
        let engine = ScriptedEngine::new(false);
        let service = ChatService::new(engine.clone(), Locale::En);
        let mut conversation = Conversation::new();

        let category: Category = "Sugerencias de Pruebas".parse().unwrap();
        let exchange =
            service.submit(&mut conversation, category, "fiebre y tos").await.unwrap().unwrap();

        let expected = "Given the following patient information: fiebre y tos, what are the 5 recommended tests to confirm a diagnosis?";
        assert_eq!(exchange.prompt, expected);
        assert_eq!(*engine.prompts.lock().unwrap(), vec![expected.to_string()]);
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[0].role, Role::User);
        assert_eq!(conversation.turns()[0].text, "fiebre y tos");
        assert_eq!(conversation.turns()[1].role, Role::Bot);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let engine = ScriptedEngine::new(false);
        let service = ChatService::new(engine.clone(), Locale::Es);
        let mut conversation = Conversation::new();

        for text in ["", "   ", "\n\t"] {
            let result = service.submit(&mut conversation, Category::Symptoms, text).await;
            assert!(matches!(result, Ok(None)));
        }
        assert!(conversation.is_empty());
        assert!(engine.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_leaves_history_unchanged() {
        let service = ChatService::new(ScriptedEngine::new(true), Locale::Es);
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("antes"));
        conversation.append(Turn::bot("respuesta"));
        let before = conversation.clone();

        let err = service.submit(&mut conversation, Category::History, "diabetes").await.unwrap_err();

        assert!(matches!(err, ChatError::Retrieval(_)));
        assert_eq!(conversation, before);
    }

    #[tokio::test]
    async fn identical_submits_are_not_deduplicated() {
        let engine = ScriptedEngine::new(false);
        let service = ChatService::new(engine.clone(), Locale::Es);
        let mut conversation = Conversation::new();

        for _ in 0..2 {
            service.submit(&mut conversation, Category::LabResults, "glucosa 180").await.unwrap();
        }

        assert_eq!(conversation.len(), 4);
        assert_eq!(engine.prompts.lock().unwrap().len(), 2);
        let rendered = conversation.render(Locale::Es);
        assert_eq!(rendered[0].text, "answer #2");
        assert_eq!(rendered[2].text, "answer #1");
    }
}
