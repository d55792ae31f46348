//! Environment configuration
//!
//! Values come from the process environment; binaries load `.env` first.

use crate::error::LedgerError;
use crate::gemini::DEFAULT_MODEL;
use crate::models::{Locale, DEFAULT_CURRENCY};
use crate::pipeline::PipelineSettings;
use crate::Result;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL; `None` selects the in-memory ledger.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub port: u16,
    pub locale: Locale,
    pub currency: String,
    pub pipeline: PipelineSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            port: 8080,
            locale: Locale::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let currency = get("LEDGER_CURRENCY")
            .map(|c| c.to_uppercase())
            .unwrap_or(defaults.currency);
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(LedgerError::Config(format!(
                "LEDGER_CURRENCY must be a 3-letter code, got '{}'",
                currency
            )));
        }

        Ok(Self {
            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            )?,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            port: parse_or("PORT", get("PORT").or_else(|| get("API_PORT")), defaults.port)?,
            locale: match get("LEDGER_LOCALE") {
                Some(raw) => raw.parse()?,
                None => defaults.locale,
            },
            currency,
            pipeline: PipelineSettings {
                context_recent: parse_or(
                    "LEDGER_CONTEXT_RECENT",
                    get("LEDGER_CONTEXT_RECENT"),
                    defaults.pipeline.context_recent,
                )?,
                report_recent: parse_or(
                    "LEDGER_REPORT_RECENT",
                    get("LEDGER_REPORT_RECENT"),
                    defaults.pipeline.report_recent,
                )?,
            },
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| LedgerError::Config(format!("{} has invalid value '{}'", key, value))),
        None => Ok(default),
    }
}
