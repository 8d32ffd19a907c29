use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct FakeApi {
    models: Arc<Mutex<Vec<String>>>,
}

async fn generate(
    State(api): State<FakeApi>,
    Path(model_call): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let model = model_call
        .strip_suffix(":generateContent")
        .unwrap_or(model_call.as_str())
        .to_string();
    api.models.lock().expect("lock").push(model.clone());

    if model == "overloaded-model" {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": 503, "message": "The model is overloaded."}})),
        );
    }

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let language = if prompt.contains("Respond in Urdu") {
        "urdu"
    } else {
        "english"
    };
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": format!("answer from {model} in {language}")}]}}]
        })),
    )
}

async fn spawn_fake_api() -> (String, FakeApi) {
    let api = FakeApi::default();
    let app = Router::new()
        .route("/v1beta/models/{model_call}", post(generate))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake api should run");
    });
    (format!("http://{addr}/v1beta"), api)
}

async fn run_ask(base_url: String, models: &str, lang: &str) -> Output {
    let models = models.to_string();
    let lang = lang.to_string();
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_ayah"))
            .args(["How", "many", "times", "is", "the", "word", "sabr", "mentioned?"])
            .env("GOOGLE_API_KEY", "test-key")
            .env("GEMINI_BASE_URL", base_url)
            .env("MODELS", models)
            .env("RETRY_DELAY_MS", "0")
            .env("ANSWER_LANG", lang)
            .env("LOG_OUTPUT", "stderr")
            .env("RUST_LOG", "ayah=info")
            .output()
            .expect("failed to run ayah binary")
    })
    .await
    .expect("blocking task should join")
}

#[tokio::test(flavor = "multi_thread")]
async fn one_shot_ask_falls_back_to_next_model_and_prints_answer() {
    let (base_url, api) = spawn_fake_api().await;

    let output = run_ask(base_url, "overloaded-model,healthy-model", "ur").await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "command failed, stderr:\n{stderr}");
    assert_eq!(stdout.trim(), "answer from healthy-model in urdu");
    assert_eq!(
        *api.models.lock().expect("lock"),
        vec!["overloaded-model", "healthy-model"]
    );
    assert!(
        stderr.contains("temporarily unavailable"),
        "expected fallback warning, got stderr:\n{stderr}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn one_shot_ask_fails_when_every_model_fails() {
    let (base_url, api) = spawn_fake_api().await;

    let output = run_ask(base_url, "overloaded-model", "en").await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "command should fail");
    assert!(stdout.trim().is_empty(), "unexpected stdout:\n{stdout}");
    assert!(
        stderr.contains("Unable to access models at this time!"),
        "expected troubleshooting output, got stderr:\n{stderr}"
    );
    assert!(
        stderr.contains("The model is overloaded."),
        "expected upstream message, got stderr:\n{stderr}"
    );
    assert_eq!(api.models.lock().expect("lock").len(), 1);
}
