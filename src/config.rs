//! Settings read from the environment (and `.env`, when present).
//!
//! Keys stay on the server. A missing key only becomes an error when the
//! client that needs it is built, so the image proxy runs without any.

use crate::completion::{CompletionSettings, OPENAI_CHAT_URL};
use log::warn;
use thiserror::Error;

pub const DEFAULT_BUCKET: &str = "fly-images";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_url: Option<String>,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub admin_token: Option<String>,
    pub bucket: String,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(name))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Could not read .env file: {}", e);
            }
        }

        Ok(Self {
            supabase_url: var("SUPABASE_URL"),
            supabase_service_key: var("SUPABASE_SERVICE_KEY"),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_api_url: var("OPENAI_API_URL"),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_max_tokens: parsed_var("OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            openai_temperature: parsed_var("OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            google_api_key: var("GOOGLE_API_KEY"),
            google_search_engine_id: var("GOOGLE_SEARCH_ENGINE_ID"),
            admin_token: var("ADMIN_TOKEN"),
            bucket: var("FLY_IMAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        })
    }

    /// Base URL and service key of the hosted store.
    pub fn store(&self) -> Result<(&str, &str), ConfigError> {
        Ok((
            required(&self.supabase_url, "SUPABASE_URL")?,
            required(&self.supabase_service_key, "SUPABASE_SERVICE_KEY")?,
        ))
    }

    pub fn completion(&self) -> Result<CompletionSettings, ConfigError> {
        Ok(CompletionSettings {
            api_key: required(&self.openai_api_key, "OPENAI_API_KEY")?.to_string(),
            endpoint: self
                .openai_api_url
                .clone()
                .unwrap_or_else(|| OPENAI_CHAT_URL.to_string()),
            model: self.openai_model.clone(),
            temperature: self.openai_temperature,
            max_tokens: self.openai_max_tokens,
        })
    }

    /// API key and engine id for image search.
    pub fn image_search(&self) -> Result<(&str, &str), ConfigError> {
        Ok((
            required(&self.google_api_key, "GOOGLE_API_KEY")?,
            required(&self.google_search_engine_id, "GOOGLE_SEARCH_ENGINE_ID")?,
        ))
    }
}
