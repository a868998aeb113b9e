//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const GOOGLE_FACT_CHECK_ENDPOINT: &str =
    "https://factchecktools.googleapis.com/v1alpha1/claims:search";
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which hosted model family answers chat requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub extraction_model: String,
    pub chat_model: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub allowed_origin: String,
    pub fact_check_api_key: Option<String>,
    pub fact_check_endpoint: String,
    pub search_timeout: Duration,
    pub thumbnail_timeout: Duration,
    pub cache_ttl: Duration,
    pub browse_query: String,
    pub default_language: String,
    pub browse_page_size: u32,
    pub search_page_size: u32,
    pub chat_page_size: u32,
    pub llm: Option<LlmConfig>,
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

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Fact Check Provider Settings ---
        // A missing key is not fatal at startup; each search reports it instead.
        let fact_check_api_key = non_empty_var("FACT_CHECK_API_KEY");
        let fact_check_endpoint = std::env::var("FACT_CHECK_ENDPOINT")
            .unwrap_or_else(|_| GOOGLE_FACT_CHECK_ENDPOINT.to_string());

        let search_timeout = Duration::from_secs(parse_var("SEARCH_TIMEOUT_SECS", 15)?);
        let thumbnail_timeout = Duration::from_secs(parse_var("THUMBNAIL_TIMEOUT_SECS", 10)?);
        let cache_ttl = Duration::from_secs(parse_var("CACHE_TTL_SECS", 3600)?);

        let browse_query =
            std::env::var("BROWSE_QUERY").unwrap_or_else(|_| "India".to_string());
        let default_language =
            std::env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".to_string());
        let browse_page_size = parse_page_size("BROWSE_PAGE_SIZE", 10)?;
        let search_page_size = parse_page_size("SEARCH_PAGE_SIZE", 20)?;
        let chat_page_size = parse_page_size("CHAT_PAGE_SIZE", 5)?;

        // --- Load LLM Settings (Groq preferred, Gemini as fallback) ---
        let llm = if let Some(api_key) = non_empty_var("GROQ_API_KEY") {
            Some(LlmConfig {
                api_key,
                api_base: GROQ_API_BASE.to_string(),
                extraction_model: std::env::var("EXTRACTION_MODEL")
                    .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
                chat_model: std::env::var("CHAT_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            })
        } else {
            non_empty_var("GEMINI_API_KEY").map(|api_key| LlmConfig {
                api_key,
                api_base: GEMINI_API_BASE.to_string(),
                extraction_model: std::env::var("EXTRACTION_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
                chat_model: std::env::var("CHAT_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            })
        };

        Ok(Self {
            bind_address,
            log_level,
            allowed_origin,
            fact_check_api_key,
            fact_check_endpoint,
            search_timeout,
            thumbnail_timeout,
            cache_ttl,
            browse_query,
            default_language,
            browse_page_size,
            search_page_size,
            chat_page_size,
            llm,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_page_size(name: &str, default: u32) -> Result<u32, ConfigError> {
    let size = parse_var(name, default)?;
    if size == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "page size must be positive".to_string(),
        ));
    }
    Ok(size)
}
