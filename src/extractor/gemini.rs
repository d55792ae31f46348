//! Gemini-powered extraction backend
//!
//! Asks Gemini for a `{"transactions": [...]}` document and hands back the
//! first entry, untouched, for validation by the extractor.

use super::{ExtractionBackend, ExtractionRequest, RawCandidate};
use crate::error::LedgerError;
use crate::gemini::GeminiClient;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

pub struct GeminiExtractor {
    client: GeminiClient,
}

impl GeminiExtractor {
    pub fn new(api_key: String, model: &str) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key, model)?,
        })
    }
}

#[async_trait]
impl ExtractionBackend for GeminiExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Option<RawCandidate>> {
        let text = self
            .client
            .generate_json(&request.instruction, &request.utterance, &request.schema)
            .await?;

        parse_envelope(&text)
    }
}

#[derive(Debug, Deserialize)]
struct ExtractionEnvelope {
    #[serde(default)]
    transactions: Vec<RawCandidate>,
}

/// Parse the model's JSON text. Empty text or an empty list means "no candidate".
fn parse_envelope(text: &str) -> Result<Option<RawCandidate>> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Ok(None);
    }

    let envelope: ExtractionEnvelope = serde_json::from_str(body).map_err(|e| {
        warn!("Unparseable extraction response: {}", e);
        LedgerError::Extraction(format!("backend response is not valid JSON: {}", e))
    })?;

    let count = envelope.transactions.len();
    if count > 1 {
        info!(count, "Backend returned several candidates, keeping the first");
    }

    Ok(envelope.transactions.into_iter().next())
}

/// Remove a surrounding ```json ... ``` fence if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_candidate() {
        let text = r#"{"transactions": [{"kind": "expense", "amount": 300, "category_or_source": "Groceries", "comment": null}]}"#;
        let candidate = parse_envelope(text).unwrap().unwrap();

        assert_eq!(candidate.kind.as_deref(), Some("expense"));
        assert_eq!(candidate.amount, Some(json!(300)));
        assert_eq!(candidate.category_or_source.as_deref(), Some("Groceries"));
        assert!(candidate.comment.is_none());
    }

    #[test]
    fn test_parse_empty_results() {
        assert!(parse_envelope(r#"{"transactions": []}"#).unwrap().is_none());
        assert!(parse_envelope("{}").unwrap().is_none());
        assert!(parse_envelope("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_fenced_response() {
        let text = "```json\n{\"transactions\": [{\"kind\": \"income\", \"amount\": 50000, \"category_or_source\": \"Salary\"}]}\n```";
        let candidate = parse_envelope(text).unwrap().unwrap();
        assert_eq!(candidate.kind.as_deref(), Some("income"));
    }

    #[test]
    fn test_parse_keeps_first_of_many() {
        let text = r#"{"transactions": [
            {"kind": "expense", "amount": 10, "category_or_source": "Transport"},
            {"kind": "expense", "amount": 20, "category_or_source": "Groceries"}
        ]}"#;
        let candidate = parse_envelope(text).unwrap().unwrap();
        assert_eq!(candidate.category_or_source.as_deref(), Some("Transport"));
    }

    #[test]
    fn test_parse_garbage_is_extraction_failure() {
        let result = parse_envelope("I could not find a transaction");
        assert!(matches!(result, Err(LedgerError::Extraction(_))));
    }
}
