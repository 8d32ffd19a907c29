use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::model_gateway::{GenerateRequest, ModelGateway};
use crate::providers::UpstreamError;

pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Waits between model attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub model: String,
    pub error: UpstreamError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_failures(.failures))]
pub struct FallbackError {
    pub failures: Vec<AttemptFailure>,
}

impl FallbackError {
    /// Upstream status of the final attempt, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        self.failures.last().and_then(|failure| failure.error.status)
    }

    pub fn last_message(&self) -> Option<&str> {
        self.failures
            .last()
            .map(|failure| failure.error.message.as_str())
    }
}

fn render_failures(failures: &[AttemptFailure]) -> String {
    if failures.is_empty() {
        return "no models configured".to_string();
    }

    let mut rendered = format!("all {} model(s) failed", failures.len());
    for failure in failures {
        rendered.push_str(&format!("; {}: {}", failure.model, failure.error));
    }
    rendered
}

/// Asks each model in order until one answers.
///
/// A failed attempt is followed by a flat `delay` before the next model,
/// except after the last one.
pub async fn ask_with_fallback<G, S>(
    gateway: &G,
    sleeper: &S,
    models: &[String],
    prompt: &str,
    system_instruction: &str,
    delay: Duration,
) -> Result<Answer, FallbackError>
where
    G: ModelGateway + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut failures = Vec::new();

    for (idx, model) in models.iter().enumerate() {
        info!(model = %model, attempt = idx + 1, "consulting model");
        let request = GenerateRequest {
            model,
            prompt,
            system_instruction,
        };

        match gateway.generate(request).await {
            Ok(text) => {
                info!(model = %model, response_len = text.len(), "answer received");
                return Ok(Answer {
                    text,
                    model: model.clone(),
                });
            }
            Err(error) => {
                if error.is_unavailable() {
                    warn!(model = %model, "service temporarily unavailable, trying alternative model");
                } else {
                    warn!(model = %model, error = %error, "model attempt failed");
                }
                failures.push(AttemptFailure {
                    model: model.clone(),
                    error,
                });

                if idx + 1 < models.len() {
                    info!(delay_ms = delay.as_millis() as u64, "waiting before next model");
                    sleeper.sleep(delay).await;
                }
            }
        }
    }

    Err(FallbackError { failures })
}
