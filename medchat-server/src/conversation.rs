//! Conversation history for one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompt::Locale;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Speaker name shown next to the message.
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Role::User, Locale::Es) => "Usuario",
            (Role::User, Locale::En) => "User",
            (Role::Bot, _) => "Bot",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), created_at: Utc::now() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { role: Role::Bot, text: text.into(), created_at: Utc::now() }
    }
}

/// A turn prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub role: Role,
    pub speaker: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only, insertion-ordered log of turns.
///
/// Turns are never edited or removed individually; [`clear`](Conversation::clear)
/// only exists to end a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Display records, most recent first.
    pub fn render(&self, locale: Locale) -> Vec<DisplayRecord> {
        self.turns
            .iter()
            .rev()
            .map(|turn| DisplayRecord {
                role: turn.role,
                speaker: turn.role.label(locale).to_string(),
                text: turn.text.clone(),
                created_at: turn.created_at,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
