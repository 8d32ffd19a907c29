use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::fallback::{self, Answer, FallbackError, Sleeper, TokioSleeper};
use crate::model_gateway::{GeminiGateway, ModelGateway};
use crate::prompt::{self, Lang};

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Question is required")]
    EmptyQuestion,
    #[error(transparent)]
    Exhausted(#[from] FallbackError),
}

/// Single entry point shared by the CLI, the REPL and the HTTP server.
pub struct Assistant {
    cfg: Arc<Config>,
    gateway: Box<dyn ModelGateway>,
    sleeper: Box<dyn Sleeper>,
}

impl Assistant {
    pub fn new(client: Client, cfg: Arc<Config>) -> Self {
        let gateway = GeminiGateway::new(client, Arc::clone(&cfg));
        Self::with_parts(cfg, gateway, TokioSleeper)
    }

    pub fn with_parts(
        cfg: Arc<Config>,
        gateway: impl ModelGateway + 'static,
        sleeper: impl Sleeper + 'static,
    ) -> Self {
        Self {
            cfg,
            gateway: Box::new(gateway),
            sleeper: Box::new(sleeper),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub async fn ask(&self, question: &str, lang: Lang) -> Result<Answer, AskError> {
        if question.trim().is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let prompt = prompt::build_prompt(question, lang);
        debug!(
            lang = lang.as_str(),
            prompt_len = prompt.len(),
            "built augmented prompt"
        );

        let answer = fallback::ask_with_fallback(
            self.gateway.as_ref(),
            self.sleeper.as_ref(),
            self.cfg.attempt_models(),
            &prompt,
            &self.cfg.system_instruction,
            self.cfg.retry_delay(),
        )
        .await?;
        Ok(answer)
    }
}
