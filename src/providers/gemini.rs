use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::UpstreamError;
use super::http_errors::{model_api_request_error, model_api_status_error};
use crate::config::Config;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn request_body<'a>(prompt: &'a str, system_instruction: &'a str) -> GenerateContentRequest<'a> {
    let system_instruction = (!system_instruction.trim().is_empty()).then(|| SystemInstruction {
        parts: vec![Part {
            text: system_instruction,
        }],
    });

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        system_instruction,
    }
}

/// Calls `generateContent` for one model and returns the first candidate's text.
pub async fn generate(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
    system_instruction: &str,
) -> Result<String, UpstreamError> {
    let api_url = generate_url(&cfg.gemini_base_url, model);
    let body = request_body(prompt, system_instruction);
    debug!(
        model = %model,
        prompt_len = prompt.len(),
        "sending gemini generateContent request"
    );

    let response = client
        .post(&api_url)
        .header(API_KEY_HEADER, cfg.api_key.as_deref().unwrap_or_default())
        .timeout(cfg.model_timeout())
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(model = %model, error = %err, "gemini request failed");
            model_api_request_error(err, model, cfg.model_timeout_secs)
        })?;

    let status = response.status();
    if !status.is_success() {
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            model = %model,
            status = %status,
            response_body_len = response_body.len(),
            "gemini returned non-success status"
        );
        return Err(model_api_status_error(status.as_u16(), &response_body));
    }

    let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
        UpstreamError::transport(format!(
            "Failed to parse response from model '{model}': {err}"
        ))
    })?;
    let text = parsed.into_text();
    debug!(
        model = %model,
        response_len = text.len(),
        "received gemini response"
    );
    Ok(text)
}
