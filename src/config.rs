use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::prompt::Lang;

const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-1.0-pro",
];
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "static";
const PLACEHOLDER_API_KEY: &str = "your_google_api_key_here";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are a humble, polite, and precise assistant that ONLY answers questions about the Holy Quran.

- Answer questions strictly related to the Quran: its surahs, ayahs, themes, language, structure and recitation.
- If a question is outside the Quran, respectfully redirect the user to ask about a surah, a verse, a theme, or a word.
- Give medium-length answers (about 120-200 words) unless the user asks otherwise.
- Cite verses as SurahName SurahNumber:AyahNumber (e.g., An-Nahl 16:90) and list them under \"References\".
- Provide verification links such as https://quran.com/{surah}:{ayah} and https://quran.com/search?q={query}.
- Never guess or fabricate verse numbers or counts; say so when you cannot verify a figure.
- Do not issue religious rulings and avoid sectarian debates.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("MODELS must name at least one model")]
    NoModels,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub gemini_base_url: String,
    pub models: Vec<String>,
    pub system_instruction: String,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub model_timeout_secs: u64,
    pub port: u16,
    pub static_dir: PathBuf,
    pub default_lang: Lang,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let api_key = get_var("GOOGLE_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            api_key,
            gemini_base_url: get_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            models: parse_models(get_var("MODELS").as_deref()),
            system_instruction: get_var("SYSTEM_INSTRUCTION")
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            max_retries: parse_max_retries(get_var("MAX_RETRIES").as_deref()),
            retry_delay_ms: parse_retry_delay_ms(get_var("RETRY_DELAY_MS").as_deref()),
            model_timeout_secs: parse_model_timeout_secs(
                get_var("MODEL_TIMEOUT_SECS").as_deref(),
            ),
            port: parse_port(get_var("PORT").as_deref()),
            static_dir: parse_static_dir(get_var("STATIC_DIR").as_deref()),
            default_lang: Lang::from_tag(get_var("ANSWER_LANG").as_deref()),
        }
    }

    /// Checks the settings the process cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.api_key.as_deref() {
            None | Some(PLACEHOLDER_API_KEY) => return Err(ConfigError::MissingApiKey),
            Some(_) => {}
        }
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        Ok(())
    }

    /// Models tried for a single question, in fallback order.
    pub fn attempt_models(&self) -> &[String] {
        let attempts = self.max_retries.saturating_add(1).min(self.models.len());
        &self.models[..attempts]
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

fn parse_models(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        DEFAULT_MODELS.iter().map(|name| name.to_string()).collect()
    } else {
        parsed
    }
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_max_retries(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_RETRIES)
}

fn parse_retry_delay_ms(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_DELAY_MS)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PORT)
}

fn parse_static_dir(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}
