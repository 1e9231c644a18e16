// src/config.rs
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::services::flows::LanguageStrategy;
use crate::services::translate::GOOGLE_TRANSLATE_ENDPOINT;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
    #[error("{0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorKind {
    Echo,
    Google,
}

impl FromStr for TranslatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(TranslatorKind::Echo),
            "google" => Ok(TranslatorKind::Google),
            other => Err(format!("unknown translator '{other}' (expected echo or google)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub kind: TranslatorKind,
    pub api_key: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub model: ModelConfig,
    pub translator: TranslatorConfig,
    pub language_strategy: LanguageStrategy,
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            model: ModelConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.3,
            },
            translator: TranslatorConfig {
                kind: TranslatorKind::Echo,
                api_key: None,
                endpoint: GOOGLE_TRANSLATE_ENDPOINT.to_string(),
            },
            language_strategy: LanguageStrategy::Translate,
            call_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            session_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and build the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("no .env file found, using process environment only");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, applying defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("FINLIT_BIND") {
            config.bind = parse("FINLIT_BIND", &v)?;
        }

        if let Some(v) = lookup("FINLIT_MODEL_API_BASE") {
            config.model.api_base = v;
        }
        if let Some(v) = lookup("FINLIT_MODEL_API_KEY") {
            config.model.api_key = v;
        }
        if let Some(v) = lookup("FINLIT_MODEL") {
            config.model.model = v;
        }
        if let Some(v) = lookup("FINLIT_MODEL_TEMPERATURE") {
            config.model.temperature = parse("FINLIT_MODEL_TEMPERATURE", &v)?;
        }

        if let Some(v) = lookup("FINLIT_TRANSLATOR") {
            config.translator.kind = parse("FINLIT_TRANSLATOR", &v)?;
        }
        config.translator.api_key = lookup("FINLIT_TRANSLATE_API_KEY").filter(|k| !k.is_empty());
        if let Some(v) = lookup("FINLIT_TRANSLATE_ENDPOINT") {
            config.translator.endpoint = v;
        }

        if let Some(v) = lookup("FINLIT_LANGUAGE_STRATEGY") {
            config.language_strategy = parse("FINLIT_LANGUAGE_STRATEGY", &v)?;
        }

        if let Some(v) = lookup("FINLIT_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(parse("FINLIT_CALL_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("FINLIT_RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse("FINLIT_RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("FINLIT_RETRY_INITIAL_DELAY_MS") {
            config.retry.initial_delay =
                Duration::from_millis(parse("FINLIT_RETRY_INITIAL_DELAY_MS", &v)?);
        }
        if let Some(v) = lookup("FINLIT_RETRY_MAX_DELAY_MS") {
            config.retry.max_delay = Duration::from_millis(parse("FINLIT_RETRY_MAX_DELAY_MS", &v)?);
        }
        if let Some(v) = lookup("FINLIT_SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(parse("FINLIT_SESSION_TTL_SECS", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Inconsistent(format!(
                "model temperature must be within 0..=2, got {}",
                self.model.temperature
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::Inconsistent("call timeout must be positive".to_string()));
        }
        if self.session_ttl.is_zero() {
            return Err(ConfigError::Inconsistent("session TTL must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Inconsistent("retry attempts must be at least 1".to_string()));
        }
        if self.translator.kind == TranslatorKind::Google && self.translator.api_key.is_none() {
            return Err(ConfigError::Inconsistent(
                "FINLIT_TRANSLATE_API_KEY is required when FINLIT_TRANSLATOR=google".to_string(),
            ));
        }
        if self.model.api_key.is_empty() {
            tracing::warn!("FINLIT_MODEL_API_KEY is not set; model calls will be rejected by the provider");
        }
        Ok(())
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
