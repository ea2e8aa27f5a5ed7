//! Routing integration tests for EduBot
//!
//! These tests route free text through a `ConfidenceRouter` backed by a real
//! `QnaClient` talking to a local stub knowledge base.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Json;
use axum::routing::post;
use axum::Router;
use edubot_dialog::{
    Activity, ConfidenceRouter, KnowledgeSource, LookupError, QnaResult, RouteOutcome,
    DEFAULT_THRESHOLD,
};
use edubot_qna::QnaClient;
use serde_json::{json, Value};

/// Stub knowledge base: questions mentioning "capital" score high, "weather"
/// scores low, anything else gets no answer at all.
async fn generate_answer(Json(body): Json<Value>) -> Json<Value> {
    let question = body["question"].as_str().unwrap_or_default().to_lowercase();
    if question.contains("capital") {
        Json(json!({
            "answers": [{
                "answer": "Paris is the capital of France.",
                "questions": ["What is the capital of France?"],
                "score": 96.0
            }]
        }))
    } else if question.contains("weather") {
        Json(json!({
            "answers": [{
                "answer": "It is sunny.",
                "questions": ["What is the weather?"],
                "score": 42.0
            }]
        }))
    } else {
        Json(json!({ "answers": [] }))
    }
}

/// Starts the stub and returns its base URL.
async fn spawn_knowledge_base() -> String {
    let app = Router::new().route(
        "/qnamaker/knowledgebases/:kb/generateAnswer",
        post(generate_answer),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });
    format!("http://{addr}/qnamaker")
}

fn router_for(context: &str, source: Arc<dyn KnowledgeSource>) -> ConfidenceRouter {
    let mut sources: HashMap<String, Arc<dyn KnowledgeSource>> = HashMap::new();
    sources.insert(context.to_string(), source);
    ConfidenceRouter::new(sources, DEFAULT_THRESHOLD)
}

/// Source that never answers and always fails.
struct Unreachable;

#[async_trait]
impl KnowledgeSource for Unreachable {
    async fn query(&self, _text: &str) -> Result<QnaResult, LookupError> {
        Err(LookupError::Transport("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_confident_answer_is_delivered() {
    let base = spawn_knowledge_base().await;
    let router = router_for("default", Arc::new(QnaClient::new(base, "capitals-faq", "k")));

    let outcome = router
        .route("default", "What is the capital of France?")
        .await;
    assert_eq!(
        outcome,
        RouteOutcome::Answered(vec![Activity::text("Paris is the capital of France.")])
    );
}

#[tokio::test]
async fn test_low_score_falls_back() {
    let base = spawn_knowledge_base().await;
    let router = router_for("default", Arc::new(QnaClient::new(base, "capitals-faq", "k")));

    let outcome = router.route("default", "How is the weather?").await;
    assert_eq!(outcome, RouteOutcome::Unhandled);
}

#[tokio::test]
async fn test_no_answer_falls_back() {
    let base = spawn_knowledge_base().await;
    let router = router_for("default", Arc::new(QnaClient::new(base, "capitals-faq", "k")));

    let outcome = router.route("default", "Tell me a joke").await;
    assert!(!outcome.is_handled());
}

#[tokio::test]
async fn test_unreachable_knowledge_base_falls_back() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let client = QnaClient::new(format!("http://{addr}/qnamaker"), "capitals-faq", "k");
    let router = router_for("default", Arc::new(client));

    let outcome = router.route("default", "What is the capital of France?").await;
    assert_eq!(outcome, RouteOutcome::Unhandled);
}

#[tokio::test]
async fn test_failing_source_falls_back() {
    let router = router_for("default", Arc::new(Unreachable));
    assert_eq!(
        router.route("default", "anything").await,
        RouteOutcome::Unhandled
    );
}

#[tokio::test]
async fn test_other_context_is_not_routed() {
    let base = spawn_knowledge_base().await;
    let router = router_for("faq", Arc::new(QnaClient::new(base, "capitals-faq", "k")));

    let outcome = router
        .route("default", "What is the capital of France?")
        .await;
    assert_eq!(outcome, RouteOutcome::Unhandled);
    assert!(router.has_source("faq"));
}

#[tokio::test]
async fn test_threshold_from_config_is_exclusive() {
    let base = spawn_knowledge_base().await;
    let client: Arc<dyn KnowledgeSource> = Arc::new(QnaClient::new(base, "capitals-faq", "k"));
    let mut sources: HashMap<String, Arc<dyn KnowledgeSource>> = HashMap::new();
    sources.insert("default".to_string(), client);

    // The stub scores capital questions at exactly 96.
    let strict = ConfidenceRouter::new(sources.clone(), 96.0);
    assert!(!strict.route("default", "capital?").await.is_handled());

    let lenient = ConfidenceRouter::new(sources, 95.9);
    assert!(lenient.route("default", "capital?").await.is_handled());
}
