use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use medchat_rag::{AnswerEngine, RagError};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    chat::{ChatError, ChatService},
    config::ServerConfig,
    conversation::DisplayRecord,
    prompt::{Category, Locale},
    protocol::{CategoryInfo, ChatRequest, ChatResponse, HistoryResponse, SessionCreateResponse},
    session::SessionManager,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub chat: ChatService,
}

impl AppState {
    /// State around an engine whose index is already built.
    pub fn new(engine: Arc<dyn AnswerEngine>, locale: Locale) -> Self {
        Self { sessions: SessionManager::default(), chat: ChatService::new(engine, locale) }
    }

    fn locale(&self) -> Locale {
        self.chat.locale()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/categories", get(categories))
        .route("/api/session", post(create_session))
        .route("/api/session/{session_id}", axum::routing::delete(end_session))
        .route("/api/session/{session_id}/reset", post(reset_session))
        .route("/api/chat/{session_id}", post(chat))
        .route("/api/history/{session_id}", get(history))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for medchat server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("medchat listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"medchat"}))
}

async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryInfo>> {
    let locale = state.locale();
    Json(
        Category::ALL
            .into_iter()
            .map(|c| CategoryInfo {
                slug: c.slug().to_string(),
                label: c.label(locale).to_string(),
                placeholder: c.placeholder(locale).to_string(),
            })
            .collect(),
    )
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create_session().await;
    Json(SessionCreateResponse { session_id })
}

async fn end_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, (StatusCode, Json<ChatResponse>)> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(failure(&ChatError::SessionNotFound(session_id), Vec::new()))
    }
}

async fn reset_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ChatResponse>)> {
    if !state.sessions.reset(&session_id).await {
        return Err(failure(&ChatError::SessionNotFound(session_id), Vec::new()));
    }
    Ok(Json(HistoryResponse { session_id, history: Vec::new() }))
}

async fn history(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ChatResponse>)> {
    let conversation = state
        .sessions
        .snapshot(&session_id)
        .await
        .ok_or_else(|| failure(&ChatError::SessionNotFound(session_id.clone()), Vec::new()))?;

    Ok(Json(HistoryResponse { session_id, history: conversation.render(state.locale()) }))
}

async fn chat(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ChatResponse>)> {
    let locale = state.locale();
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| failure(&ChatError::SessionNotFound(session_id.clone()), Vec::new()))?;
    let mut conversation = handle.lock().await;

    let Json(request) = body.map_err(|rejection| {
        failure(&ChatError::MalformedRequest(rejection.body_text()), conversation.render(locale))
    })?;

    let category = request
        .category
        .parse::<Category>()
        .map_err(|e| failure(&e.into(), conversation.render(locale)))?;

    match state.chat.submit(&mut conversation, category, &request.text).await {
        Ok(Some(exchange)) => Ok(Json(ChatResponse {
            accepted: true,
            history: conversation.render(locale),
            sources: exchange.sources,
            error: None,
        })),
        Ok(None) => Ok(Json(ChatResponse {
            accepted: false,
            history: conversation.render(locale),
            sources: Vec::new(),
            error: None,
        })),
        Err(e) => Err(failure(&e, conversation.render(locale))),
    }
}

fn status_for(error: &ChatError) -> StatusCode {
    match error {
        ChatError::InvalidCategory(_) | ChatError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Retrieval(RagError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        ChatError::Retrieval(_) => StatusCode::BAD_GATEWAY,
    }
}

fn failure(error: &ChatError, history: Vec<DisplayRecord>) -> (StatusCode, Json<ChatResponse>) {
    (
        status_for(error),
        Json(ChatResponse {
            accepted: false,
            history,
            sources: Vec::new(),
            error: Some(error.to_string()),
        }),
    )
}
