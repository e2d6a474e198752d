//! Process configuration read from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use medchat_rag::openai::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use thiserror::Error;

use crate::prompt::Locale;

pub const DEFAULT_CORPUS: &str = "data/historias100.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY is not set; add it to .env or the environment")]
    MissingApiKey,

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8501 }
    }
}

/// Everything `main` needs to build the index and start serving.
#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub corpus_path: PathBuf,
    pub locale: Locale,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("corpus_path", &self.corpus_path)
            .field("locale", &self.locale)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a key to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("API_KEY").or_else(|| get("OPENAI_API_KEY")).ok_or(ConfigError::MissingApiKey)?;

        let defaults = ServerConfig::default();
        let port = match get("MEDCHAT_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "MEDCHAT_PORT",
                message: e.to_string(),
            })?,
            None => defaults.port,
        };

        let locale = match get("MEDCHAT_LOCALE") {
            Some(raw) => raw
                .parse::<Locale>()
                .map_err(|message| ConfigError::Invalid { key: "MEDCHAT_LOCALE", message })?,
            None => Locale::default(),
        };

        let request_timeout = match get("MEDCHAT_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        key: "MEDCHAT_TIMEOUT_SECS",
                        message: "must be greater than zero".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "MEDCHAT_TIMEOUT_SECS",
                        message: e.to_string(),
                    });
                }
            },
            None => Duration::from_secs(60),
        };

        Ok(Self {
            server: ServerConfig { host: get("MEDCHAT_HOST").unwrap_or(defaults.host), port },
            api_key,
            api_base: get("MEDCHAT_API_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            chat_model: get("MEDCHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get("MEDCHAT_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            corpus_path: get("MEDCHAT_CORPUS").map_or_else(|| PathBuf::from(DEFAULT_CORPUS), PathBuf::from),
            locale,
            request_timeout,
        })
    }
}
