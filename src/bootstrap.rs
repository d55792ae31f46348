//! Builds a ready pipeline from configuration

use crate::classifier::IntentClassifier;
use crate::composer::ResponseComposer;
use crate::config::AppConfig;
use crate::error::LedgerError;
use crate::extractor::{GeminiExtractor, TransactionExtractor};
use crate::ledger::{InMemoryLedgerStore, LedgerStore, PgLedgerStore};
use crate::models::Vocabulary;
use crate::pipeline::Pipeline;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Postgres when a URL is configured, otherwise in-memory.
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn LedgerStore>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(PgLedgerStore::connect_lazy(
            url,
            config.database_max_connections,
        )?)),
        None => {
            warn!("DATABASE_URL not set, ledger will not survive a restart");
            info!("Ledger backend: in-memory");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
    }
}

pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let api_key = config
        .gemini_api_key
        .clone()
        .ok_or_else(|| LedgerError::Config("GEMINI_API_KEY is required".to_string()))?;

    let store = build_store(config)?;
    let backend = Arc::new(GeminiExtractor::new(api_key, &config.gemini_model)?);
    let extractor = TransactionExtractor::new(backend).with_currency(config.currency.clone());

    info!(
        locale = ?config.locale,
        currency = %config.currency,
        model = %config.gemini_model,
        "Pipeline configured"
    );

    Ok(Pipeline::new(
        store,
        extractor,
        IntentClassifier::new(config.locale),
        Vocabulary::for_locale(config.locale),
        ResponseComposer::new(config.currency.clone()),
        config.pipeline,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = build_pipeline(&AppConfig::default());
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[tokio::test]
    async fn test_in_memory_pipeline_builds() {
        let config = AppConfig {
            gemini_api_key: Some("test-key".to_string()),
            ..AppConfig::default()
        };
        assert!(build_pipeline(&config).is_ok());
    }
}
