pub mod assistant;
pub mod config;
pub mod fallback;
pub mod logging;
pub mod model_gateway;
pub mod prompt;
pub mod providers;
pub mod repl;
pub mod server;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use std::env;
use std::sync::Arc;
use tracing::{error, info};

use assistant::{AskError, Assistant};
use config::Config;
use repl::run_repl;

const SERVE_COMMAND: &str = "serve";

const TROUBLESHOOTING_HINTS: &str = "\
Possible solutions:
   1. Wait a few minutes and try again
   2. Check Google AI Studio status: https://status.ai.google.dev/
   3. Verify your API key is valid
   4. Check your internet connection";

pub async fn run() -> Result<()> {
    let cfg = Config::from_env();
    info!(
        models = %cfg.models.join(","),
        max_retries = cfg.max_retries,
        retry_delay_ms = cfg.retry_delay_ms,
        model_timeout_secs = cfg.model_timeout_secs,
        api_key_set = cfg.api_key.is_some(),
        "loaded runtime configuration"
    );

    if let Err(err) = cfg.validate() {
        error!(error = %err, "invalid configuration");
        eprintln!("Error: {err}");
        eprintln!("Set GOOGLE_API_KEY in the environment or in a .env file and restart.");
        bail!(err);
    }

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let assistant = Assistant::new(client, Arc::new(cfg));

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => run_repl(&assistant).await,
        Some(SERVE_COMMAND) if args.len() == 1 => server::serve(Arc::new(assistant)).await,
        Some(_) => ask_once(&assistant, &args.join(" ")).await,
    }
}

async fn ask_once(assistant: &Assistant, question: &str) -> Result<()> {
    let lang = assistant.config().default_lang;
    info!(question = %question, lang = lang.as_str(), "asking quran assistant");

    match assistant.ask(question, lang).await {
        Ok(answer) => {
            info!(model = %answer.model, "answer received");
            println!("{}", answer.text.trim());
            Ok(())
        }
        Err(AskError::EmptyQuestion) => bail!("Question is required"),
        Err(AskError::Exhausted(err)) => {
            eprintln!("Unable to access models at this time!");
            eprintln!("{TROUBLESHOOTING_HINTS}");
            Err(err).context("All configured models failed")
        }
    }
}
