//! Gemini API client
//!
//! Sends one system instruction plus one user turn and asks for a JSON
//! document matching a response schema.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::LedgerError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/{}:generateContent", BASE_URL, model),
        })
    }

    /// Generate a JSON response constrained by `schema`; returns the raw text part.
    pub async fn generate_json(
        &self,
        system_prompt: &str,
        user_text: &str,
        schema: &serde_json::Value,
    ) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(LedgerError::Config("GEMINI_API_KEY not configured".to_string()));
        }

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let request = build_request(system_prompt, user_text, schema);

        info!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                LedgerError::Backend(format!("Gemini API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(LedgerError::Backend(format!("Gemini API returned {}", status)));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            LedgerError::Backend(format!("Gemini parse error: {}", e))
        })?;

        Ok(first_text(gemini_response).unwrap_or_default())
    }
}

fn build_request(system_prompt: &str, user_text: &str, schema: &serde_json::Value) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: user_text.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.0,
            max_output_tokens: 512,
            response_mime_type: "application/json".to_string(),
            response_schema: schema.clone(),
        },
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        },
    }
}

/// Text of the first candidate's first part, if any.
fn first_text(response: GeminiResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            warn!(finish_reason = reason, "Gemini candidate finished early");
        }
    }

    candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: i32,
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let schema = serde_json::json!({ "type": "OBJECT" });
        let request = build_request("Extract a transaction", "spent 300 on groceries", &schema);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "spent 300 on groceries");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generation_config"]["response_mime_type"], "application/json");
        assert_eq!(json["generation_config"]["response_schema"]["type"], "OBJECT");
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "Extract a transaction");
    }

    #[test]
    fn test_first_text_reads_candidate() {
        let raw = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"transactions\": []}" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10 }
        }"#;
        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_text(response).as_deref(), Some("{\"transactions\": []}"));
    }

    #[test]
    fn test_first_text_handles_missing_candidates() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(response).is_none());

        let blocked = r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#;
        let response: GeminiResponse = serde_json::from_str(blocked).unwrap();
        assert!(first_text(response).is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GeminiClient::new(String::new(), DEFAULT_MODEL).unwrap();
        let result = client
            .generate_json("system", "spent 300", &serde_json::json!({}))
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
