use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get_service, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::assistant::{AskError, Assistant};
use crate::prompt::Lang;

const INDEX_FILE: &str = "index.html";

/// Body of `POST /api/ask`. Fields are loosely typed so that a wrong type
/// is reported as a missing question instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub lang: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::EmptyQuestion => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            AskError::Exhausted(failure) => {
                let status = failure
                    .status()
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .filter(|status| status.is_client_error() || status.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let message = failure
                    .last_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| failure.to_string());
                Self::new(status, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn ask(
    State(assistant): State<Arc<Assistant>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected malformed ask request");
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    let question = request
        .question
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default();
    let lang = Lang::from_tag(request.lang.as_ref().and_then(Value::as_str));

    let answer = assistant.ask(question, lang).await.map_err(|err| {
        warn!(error = %err, "ask request failed");
        ApiError::from(err)
    })?;
    info!(model = %answer.model, lang = lang.as_str(), "answered ask request");

    Ok(Json(AskResponse {
        answer: answer.text,
    }))
}

pub fn router(assistant: Arc<Assistant>) -> Router {
    let static_dir = assistant.config().static_dir.clone();
    let index = ServeFile::new(static_dir.join(INDEX_FILE));

    Router::new()
        .route("/api/ask", post(ask))
        .route("/", get_service(index.clone()))
        .route("/index.html", get_service(index))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(assistant)
}

pub async fn serve(assistant: Arc<Assistant>) -> Result<()> {
    let port = assistant.config().port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind HTTP listener on port {port}"))?;
    info!(
        port,
        static_dir = %assistant.config().static_dir.display(),
        "quran assistant API listening on http://localhost:{port}"
    );

    axum::serve(listener, router(assistant))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
