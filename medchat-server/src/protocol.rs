//! JSON bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::chat::SourceRef;
use crate::conversation::DisplayRecord;
use crate::session::SessionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub slug: String,
    pub label: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Category slug or display label.
    pub category: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// False when the input was blank and nothing was submitted.
    pub accepted: bool,
    /// Session history, most recent first.
    pub history: Vec<DisplayRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub history: Vec<DisplayRecord>,
}
