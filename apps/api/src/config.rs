use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::{DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub llm_model: String,
    pub embedding_model: String,
    /// When unset the service runs on in-memory stores.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Ceiling on simultaneously running pipelines in batch mode.
    pub max_concurrent_analyses: usize,
    pub embedding_penalty_exponent: i32,
    pub keyword_match_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_concurrent_analyses = parse_env("MAX_CONCURRENT_ANALYSES", 4usize)?;
        if max_concurrent_analyses == 0 {
            bail!("MAX_CONCURRENT_ANALYSES must be at least 1");
        }

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_concurrent_analyses,
            embedding_penalty_exponent: parse_env("EMBEDDING_PENALTY_EXPONENT", 2i32)?,
            keyword_match_threshold: parse_env("KEYWORD_MATCH_THRESHOLD", 85.0f64)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
