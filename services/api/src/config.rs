//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use journal_core::EngineConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent, generated prompts are cached in memory only.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// When absent, the engine runs offline and only serves static prompts.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub prompt_model: String,
    pub visualization_max_tokens: u32,
    pub baseline_max_tokens: u32,
    pub contextual_max_tokens: u32,
    pub connectivity_host: String,
    pub connectivity_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty());
        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok().filter(|v| !v.is_empty());

        // --- Load Engine Settings ---
        let prompt_model =
            std::env::var("PROMPT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let visualization_max_tokens = parse_var("VISUALIZATION_MAX_TOKENS", "150")?;
        let baseline_max_tokens = parse_var("BASELINE_MAX_TOKENS", "200")?;
        let contextual_max_tokens = parse_var("CONTEXTUAL_MAX_TOKENS", "150")?;
        check_token_ceilings(baseline_max_tokens, contextual_max_tokens)?;

        // --- Load Connectivity Probe Settings ---
        let connectivity_host = std::env::var("CONNECTIVITY_HOST")
            .unwrap_or_else(|_| "api.openai.com:443".to_string());
        let connectivity_timeout =
            Duration::from_millis(parse_var("CONNECTIVITY_TIMEOUT_MS", "1500")?);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            openai_base_url,
            prompt_model,
            visualization_max_tokens,
            baseline_max_tokens,
            contextual_max_tokens,
            connectivity_host,
            connectivity_timeout,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model: self.prompt_model.clone(),
            visualization_max_tokens: self.visualization_max_tokens,
            baseline_max_tokens: self.baseline_max_tokens,
            contextual_max_tokens: self.contextual_max_tokens,
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

/// The contextual ceiling must sit below the baseline ceiling.
fn check_token_ceilings(baseline: u32, contextual: u32) -> Result<(), ConfigError> {
    if contextual >= baseline {
        return Err(ConfigError::InvalidValue(
            "CONTEXTUAL_MAX_TOKENS".to_string(),
            format!(
                "{} must be smaller than BASELINE_MAX_TOKENS ({})",
                contextual, baseline
            ),
        ));
    }
    Ok(())
}
