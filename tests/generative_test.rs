//! Generative strategy against a local stand-in for the chat service.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hr_policy_assistant::compose::{TIMEOUT_REPLY, UNAVAILABLE_REPLY};
use hr_policy_assistant::llm::ChatClient;
use hr_policy_assistant::{Assistant, GenerativeComposer, Outcome};
use serde_json::{json, Value};
use tempfile::TempDir;

use common::fixture;

const LEAVE_QUESTION: &str = "How many leave days do I get?";

async fn spawn_chat_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn generative_assistant(base_url: &str, timeout: Duration) -> (Assistant, TempDir) {
    let fx = fixture(true).await;
    let client = ChatClient::new(base_url, "test-model", timeout).unwrap();
    let assistant = Assistant::new(fx.index, Arc::new(GenerativeComposer::new(client)));
    (assistant, fx.dir)
}

#[tokio::test]
async fn test_generated_answer_is_redacted() {
    // Echoes the question, reports whether the leave policy was in the
    // context, and leaks an employee id.
    let app = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            let system = body["messages"][0]["content"].as_str().unwrap_or("");
            let user = body["messages"][1]["content"].as_str().unwrap_or("");
            let has_leave = system.contains("Employees get 20 paid days per year.");
            Json(json!({
                "message": {
                    "role": "assistant",
                    "content": format!("  {user} | context_has_leave={has_leave} | ask EMP-5521\n")
                },
                "done": true
            }))
        }),
    );
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_secs(5)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();

    assert_eq!(answer.outcome, Outcome::Answered);
    assert_eq!(
        answer.reply,
        format!("{LEAVE_QUESTION} | context_has_leave=true | ask [REDACTED]")
    );
}

#[tokio::test]
async fn test_slow_upstream_gives_timeout_reply() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"message": {"content": "too late"}}))
        }),
    );
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_millis(200)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();
    assert_eq!(answer.reply, TIMEOUT_REPLY);
}

#[tokio::test]
async fn test_unreachable_upstream_gives_unavailable_reply() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (assistant, _dir) =
        generative_assistant(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();
    assert_eq!(answer.reply, UNAVAILABLE_REPLY);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
    );
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_secs(5)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();
    assert_eq!(
        answer.reply,
        "Error: Unable to generate response. Status code: 500. Please contact HR directly."
    );
}

#[tokio::test]
async fn test_out_of_scope_never_calls_upstream() {
    // Nothing listens here; reaching it would produce the unavailable reply.
    let (assistant, _dir) = generative_assistant("http://127.0.0.1:9", Duration::from_millis(200)).await;

    let answer = assistant.answer("What is the weather today?").await.unwrap();
    assert_eq!(answer.outcome, Outcome::OutOfScope);
}

#[tokio::test]
async fn test_sampling_options_reach_upstream() {
    // Replies with the options object it received, serialized as the answer.
    let app = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "message": {"role": "assistant", "content": body["options"].to_string()},
                "done": true
            }))
        }),
    );
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_secs(5)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();
    let options: Value = serde_json::from_str(&answer.reply).unwrap();

    assert_relative_eq!(options["temperature"].as_f64().unwrap(), 0.1, epsilon = 1e-6);
    assert_relative_eq!(options["top_p"].as_f64().unwrap(), 0.9, epsilon = 1e-6);
    assert_eq!(options["num_predict"], 150);
    assert_eq!(options["top_k"], 20);
}

#[tokio::test]
async fn test_malformed_upstream_body_gives_unexpected_error_reply() {
    let app = Router::new().route("/api/chat", post(|| async { Json(json!({"nope": 1})) }));
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_secs(5)).await;

    let answer = assistant.answer(LEAVE_QUESTION).await.unwrap();
    assert!(answer
        .reply
        .starts_with("Error: An unexpected error occurred - "));
}

#[tokio::test]
async fn test_startup_check_uses_the_composer_client() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/tags",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({"models": [{"name": "test-model"}]}))
            }
        }),
    );
    let base = spawn_chat_server(app).await;
    let (assistant, _dir) = generative_assistant(&base, Duration::from_secs(5)).await;

    assistant.check_upstream().await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
