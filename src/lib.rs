//! Conversational Ledger Intake
//!
//! Turns free-form statements ("spent 300 on groceries") into ledger entries
//! and answers balance and report questions from an append-only log.
//!
//! PIPELINE:
//! MESSAGE → CLASSIFY → EXTRACT & APPEND | AGGREGATE | HELP → COMPOSE

pub mod api;
pub mod bootstrap;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod gemini;
pub mod ledger;
pub mod models;
pub mod pipeline;

pub use error::{LedgerError, Result};

// Re-export common types
pub use models::*;
pub use classifier::IntentClassifier;
pub use composer::ResponseComposer;
pub use extractor::{ExtractionBackend, TransactionExtractor};
pub use ledger::{InMemoryLedgerStore, LedgerStore, PgLedgerStore};
pub use pipeline::{Pipeline, PipelineSettings};
