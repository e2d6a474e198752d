use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use medchat_rag::{Answer, AnswerEngine, RagError};
use medchat_server::{
    AppState, Locale, app_router,
    protocol::{CategoryInfo, ChatResponse, HistoryResponse, SessionCreateResponse},
};
use reqwest::StatusCode;
use serde_json::json;

/// Echoes the prompt back, or fails while `fail` is set.
#[derive(Default)]
struct EchoEngine {
    fail: AtomicBool,
}

#[async_trait]
impl AnswerEngine for EchoEngine {
    async fn answer(&self, prompt: &str) -> medchat_rag::Result<Answer> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::CompletionError {
                provider: "echo".into(),
                message: "upstream unavailable".into(),
            });
        }
        Ok(Answer { text: format!("echo: {prompt}"), sources: Vec::new() })
    }
}

async fn spawn_server(engine: Arc<EchoEngine>) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(AppState::new(engine, Locale::En));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let response =
        client.post(format!("{}/api/session", base)).send().await.expect("session create response");
    assert!(response.status().is_success());
    let created: SessionCreateResponse = response.json().await.expect("session json");
    created.session_id
}

#[tokio::test]
async fn submit_records_both_turns_newest_first() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let response = client
        .post(format!("{}/api/chat/{}", base, session_id))
        .json(&json!({ "category": "Sugerencias de Pruebas", "text": "fiebre y tos" }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), StatusCode::OK);

    let body: ChatResponse = response.json().await.expect("chat json");
    assert!(body.accepted);
    assert!(body.error.is_none());
    assert_eq!(body.history.len(), 2);
    assert_eq!(body.history[0].speaker, "Bot");
    assert!(body.history[0].text.contains("fiebre y tos"));
    assert!(body.history[0].text.contains("5 recommended tests"));
    assert_eq!(body.history[1].speaker, "User");
    assert_eq!(body.history[1].text, "fiebre y tos");

    let history: HistoryResponse = client
        .get(format!("{}/api/history/{}", base, session_id))
        .send()
        .await
        .expect("history response")
        .json()
        .await
        .expect("history json");
    assert_eq!(history.history, body.history);

    handle.abort();
}

#[tokio::test]
async fn blank_text_is_not_accepted() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let response = client
        .post(format!("{}/api/chat/{}", base, session_id))
        .json(&json!({ "category": "symptoms", "text": "   " }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), StatusCode::OK);

    let body: ChatResponse = response.json().await.expect("chat json");
    assert!(!body.accepted);
    assert!(body.history.is_empty());

    handle.abort();
}

#[tokio::test]
async fn unknown_category_is_a_bad_request() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;

    let response = client
        .post(format!("{}/api/chat/{}", base, session_id))
        .json(&json!({ "category": "astrology", "text": "dolor de cabeza" }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ChatResponse = response.json().await.expect("error json");
    assert!(body.error.is_some());
    assert!(body.history.is_empty());

    handle.abort();
}

#[tokio::test]
async fn chat_to_an_unknown_session_is_not_found_and_creates_nothing() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        let response = client
            .post(format!("{}/api/chat/garbage-{}", base, i))
            .json(&json!({ "category": "astrology", "text": "" }))
            .send()
            .await
            .expect("chat response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ChatResponse = response.json().await.expect("error json");
        assert!(body.error.is_some());
    }

    let history = client.get(format!("{}/api/history/garbage-1", base)).send().await.expect("history");
    assert_eq!(history.status(), StatusCode::NOT_FOUND);

    handle.abort();
}

#[tokio::test]
async fn malformed_body_is_a_json_bad_request() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    let url = format!("{}/api/chat/{}", base, session_id);

    let missing_category = client
        .post(&url)
        .json(&json!({ "text": "fiebre" }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(missing_category.status(), StatusCode::BAD_REQUEST);
    let body: ChatResponse = missing_category.json().await.expect("error json");
    assert!(!body.accepted);
    assert!(body.error.is_some());
    assert!(body.history.is_empty());

    let not_json = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("chat response");
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    let body: ChatResponse = not_json.json().await.expect("error json");
    assert!(body.error.is_some());

    handle.abort();
}

#[tokio::test]
async fn failed_answer_keeps_history_and_session() {
    let engine = Arc::new(EchoEngine::default());
    let (base, handle) = spawn_server(engine.clone()).await;
    let client = reqwest::Client::new();
    let session_id = create_session(&client, &base).await;
    let url = format!("{}/api/chat/{}", base, session_id);

    let first: ChatResponse = client
        .post(&url)
        .json(&json!({ "category": "history", "text": "hipertensión" }))
        .send()
        .await
        .expect("chat response")
        .json()
        .await
        .expect("chat json");
    assert_eq!(first.history.len(), 2);

    engine.fail.store(true, Ordering::SeqCst);
    let response = client
        .post(&url)
        .json(&json!({ "category": "history", "text": "diabetes" }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let failed: ChatResponse = response.json().await.expect("error json");
    assert!(!failed.accepted);
    assert!(failed.error.is_some());
    assert_eq!(failed.history, first.history);

    engine.fail.store(false, Ordering::SeqCst);
    let recovered: ChatResponse = client
        .post(&url)
        .json(&json!({ "category": "history", "text": "diabetes" }))
        .send()
        .await
        .expect("chat response")
        .json()
        .await
        .expect("chat json");
    assert_eq!(recovered.history.len(), 4);
    assert_eq!(recovered.history[1].text, "diabetes");

    handle.abort();
}

#[tokio::test]
async fn categories_list_all_five_in_order() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;

    let categories: Vec<CategoryInfo> = reqwest::get(format!("{}/api/categories", base))
        .await
        .expect("categories response")
        .json()
        .await
        .expect("categories json");

    let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, ["symptoms", "lab_results", "history", "test_suggestions", "disease_info"]);
    assert!(categories.iter().all(|c| !c.placeholder.is_empty()));

    handle.abort();
}

#[tokio::test]
async fn sessions_are_isolated_and_can_end() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;
    let client = reqwest::Client::new();
    let a = create_session(&client, &base).await;
    let b = create_session(&client, &base).await;

    client
        .post(format!("{}/api/chat/{}", base, a))
        .json(&json!({ "category": "disease_info", "text": "anemia" }))
        .send()
        .await
        .expect("chat response");

    let history_b: HistoryResponse = client
        .get(format!("{}/api/history/{}", base, b))
        .send()
        .await
        .expect("history response")
        .json()
        .await
        .expect("history json");
    assert!(history_b.history.is_empty());

    let reset: HistoryResponse = client
        .post(format!("{}/api/session/{}/reset", base, a))
        .send()
        .await
        .expect("reset response")
        .json()
        .await
        .expect("reset json");
    assert!(reset.history.is_empty());

    let ended = client.delete(format!("{}/api/session/{}", base, a)).send().await.expect("delete");
    assert_eq!(ended.status(), StatusCode::NO_CONTENT);

    let gone = client.get(format!("{}/api/history/{}", base, a)).send().await.expect("history");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    handle.abort();
}

#[tokio::test]
async fn index_page_and_health_are_served() {
    let (base, handle) = spawn_server(Arc::new(EchoEngine::default())).await;

    let page = reqwest::get(format!("{}/", base)).await.expect("index response");
    assert!(page.status().is_success());
    assert!(page.text().await.expect("index body").contains("Enviar"));

    let health: serde_json::Value =
        reqwest::get(format!("{}/health", base)).await.expect("health").json().await.expect("json");
    assert_eq!(health["status"], "ok");

    handle.abort();
}
