//! Transaction extraction
//!
//! Turns an utterance into a validated `NewTransaction`. The language
//! understanding step is delegated to an `ExtractionBackend`; everything the
//! backend returns is treated as untrusted and re-validated here.

use crate::error::LedgerError;
use crate::ledger::LedgerStore;
use crate::models::{
    NewTransaction, OwnerId, Transaction, TransactionKind, Vocabulary, DEFAULT_CURRENCY,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod gemini;
pub use gemini::GeminiExtractor;

/// Payload sent to the extraction backend.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest {
    /// System instruction, including current time and vocabulary lists.
    pub instruction: String,
    /// The user's utterance, verbatim.
    pub utterance: String,
    /// JSON schema the response must follow.
    pub schema: Value,
}

/// Candidate record as returned by the backend. Every field is optional and
/// nothing in it is trusted until `validate_candidate` accepts it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCandidate {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub category_or_source: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<String>,
}

/// Trait for the natural-language extraction capability (LLM controlled)
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Return at most one candidate for the request, `None` if the utterance
    /// holds no transaction.
    async fn extract(&self, request: &ExtractionRequest) -> Result<Option<RawCandidate>>;
}

pub struct TransactionExtractor {
    backend: Arc<dyn ExtractionBackend>,
    currency: String,
}

impl TransactionExtractor {
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self {
            backend,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Ask the backend for a candidate and validate it.
    pub async fn extract(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
        now: DateTime<Utc>,
    ) -> Result<NewTransaction> {
        let request = build_request(text, vocabulary, now);

        let Some(candidate) = self.backend.extract(&request).await? else {
            info!("Extraction backend returned no candidate");
            return Err(LedgerError::Extraction(
                "no transaction found in message".to_string(),
            ));
        };

        debug!(?candidate, "Extraction candidate received");

        validate_candidate(&candidate, vocabulary, now, &self.currency).map_err(|e| {
            warn!("Rejected extraction candidate: {}", e);
            e
        })
    }

    /// Extract, then append to the ledger. Returns the stored record.
    pub async fn extract_and_record(
        &self,
        store: &dyn LedgerStore,
        owner: OwnerId,
        text: &str,
        vocabulary: &Vocabulary,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        let new = self.extract(text, vocabulary, now).await?;
        let stored = store.append(owner, new).await?;

        info!(
            %owner,
            transaction_id = %stored.id,
            kind = %stored.kind,
            "Transaction recorded"
        );

        Ok(stored)
    }
}

/// Build the instruction/schema payload for one utterance.
pub fn build_request(text: &str, vocabulary: &Vocabulary, now: DateTime<Utc>) -> ExtractionRequest {
    let instruction = format!(
        r#"Extract information about a single financial transaction from the user's message.

Determine:
1. kind: "income" or "expense"
2. amount: the sum as a positive number only, without currency symbols
3. category_or_source: a category for expenses or a source for income; use one of the listed labels whenever one fits
4. comment: any additional detail worth keeping, or null
5. occurred_at: RFC 3339 timestamp of the event if the user names a time other than now, otherwise null

If the message does not describe a transaction, return an empty "transactions" list.
Never return more than one transaction.

Current time: {}
Expense categories: {}
Income sources: {}"#,
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        vocabulary.expense_categories.join(", "),
        vocabulary.income_sources.join(", "),
    );

    ExtractionRequest {
        instruction,
        utterance: text.to_string(),
        schema: response_schema(),
    }
}

/// Response schema in the OpenAPI subset the backend understands.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "transactions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "kind": { "type": "STRING", "enum": ["income", "expense"] },
                        "amount": { "type": "NUMBER" },
                        "category_or_source": { "type": "STRING" },
                        "comment": { "type": "STRING", "nullable": true },
                        "occurred_at": { "type": "STRING", "nullable": true }
                    },
                    "required": ["kind", "amount", "category_or_source"]
                }
            }
        },
        "required": ["transactions"]
    })
}

/// Accept or reject a backend candidate. Invalid data is never repaired.
pub fn validate_candidate(
    candidate: &RawCandidate,
    vocabulary: &Vocabulary,
    now: DateTime<Utc>,
    currency: &str,
) -> Result<NewTransaction> {
    let kind: TransactionKind = candidate
        .kind
        .as_deref()
        .ok_or_else(|| LedgerError::Validation("transaction kind is missing".to_string()))?
        .parse()?;

    let amount = match &candidate.amount {
        Some(value) => parse_amount(value)?,
        None => return Err(LedgerError::Validation("amount is missing".to_string())),
    };

    let label = candidate
        .category_or_source
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .ok_or_else(|| LedgerError::Validation("category or source is missing".to_string()))?;
    let category_or_source = vocabulary
        .canonical(kind, label)
        .unwrap_or(label)
        .to_string();

    let comment = candidate
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let occurred_at = match candidate.occurred_at.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let at = parse_timestamp(raw)?;
            if at > now {
                return Err(LedgerError::Validation(format!(
                    "occurred_at {} is in the future",
                    raw
                )));
            }
            at
        }
        _ => now,
    };

    let transaction = NewTransaction {
        kind,
        amount,
        currency: currency.to_string(),
        category_or_source,
        comment,
        occurred_at,
    };
    transaction.validate()?;

    Ok(transaction)
}

fn parse_amount(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(LedgerError::Validation(format!(
                "amount must be a number, got {}",
                other
            )))
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| LedgerError::Validation(format!("amount '{}' is not a number", text)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }

    Err(LedgerError::Validation(format!(
        "occurred_at '{}' is not a valid timestamp",
        raw
    )))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Backend returning a fixed answer and remembering the last request.
    pub struct StubBackend {
        answer: std::result::Result<Option<RawCandidate>, String>,
        pub last_request: Mutex<Option<ExtractionRequest>>,
    }

    impl StubBackend {
        pub fn returning(candidate: Option<RawCandidate>) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(candidate),
                last_request: Mutex::new(None),
            })
        }

        pub fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(reason.to_string()),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ExtractionBackend for StubBackend {
        async fn extract(&self, request: &ExtractionRequest) -> Result<Option<RawCandidate>> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.answer {
                Ok(candidate) => Ok(candidate.clone()),
                Err(reason) => Err(LedgerError::Backend(reason.clone())),
            }
        }
    }

    pub fn candidate(kind: &str, amount: Value, label: &str) -> RawCandidate {
        RawCandidate {
            kind: Some(kind.to_string()),
            amount: Some(amount),
            category_or_source: Some(label.to_string()),
            comment: None,
            occurred_at: None,
        }
    }
}
