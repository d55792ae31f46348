//! Error types for the ledger intake pipeline

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// A transaction candidate broke a ledger invariant (amount, kind, label).
    #[error("Validation failure: {0}")]
    Validation(String),

    /// The extraction backend produced nothing usable for the utterance.
    #[error("Extraction failure: {0}")]
    Extraction(String),

    /// The persistence layer is unreachable or rejected the statement.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The extraction backend itself failed (transport, status, payload).
    #[error("Extraction backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(error: sqlx::Error) -> Self {
        LedgerError::StoreUnavailable(error.to_string())
    }
}

impl LedgerError {
    /// Short machine-readable label, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation",
            LedgerError::Extraction(_) => "extraction",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
            LedgerError::Backend(_) | LedgerError::Http(_) => "backend",
            LedgerError::Config(_) => "config",
            LedgerError::Serialization(_) => "serialization",
            LedgerError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_errors_become_store_unavailable() {
        let err: LedgerError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));
        assert_eq!(err.kind(), "store_unavailable");
    }

    #[test]
    fn test_serde_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: LedgerError = parse.unwrap_err().into();
        assert_eq!(err.kind(), "serialization");
    }
}
