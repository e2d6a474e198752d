//! `medchat-server` serves the medical assistant chat: a single page UI plus
//! a small JSON API over a retrieval-augmented answer engine.

pub mod chat;
pub mod config;
pub mod conversation;
pub mod prompt;
pub mod protocol;
pub mod server;
pub mod session;
pub mod startup;

pub use chat::{ChatError, ChatService};
pub use config::{AppConfig, ConfigError, ServerConfig};
pub use prompt::{Category, Locale, build_prompt};
pub use server::{AppState, app_router, run_server};
pub use startup::build_engine;
