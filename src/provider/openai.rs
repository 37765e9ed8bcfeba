//! OpenAI API Provider
//!
//! Adapter over the Chat Completions API. Every operation serializes its
//! task payload to JSON, asks for a strict JSON reply, and parses the
//! response content. Free-text fields are re-sanitized with field-specific
//! bounds before they leave the process.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{AiProvider, ProviderConfig};
use crate::sanitize::sanitize_text;
use crate::types::{
    AssistError, BudgetCoachInput, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, Result,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI adapter with secure API key handling.
pub struct OpenAiProvider {
    /// Stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                AssistError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY or provide ai.api_key"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model,
            client,
        })
    }

    /// POST a system/user message pair, expect a JSON object back.
    async fn call_json<T: DeserializeOwned>(&self, system: &str, user: String) -> Result<T> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.api_base);
        debug!(model = %self.model, "Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistError::provider("openai", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::provider(
                "openai",
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistError::provider("openai", format!("malformed response: {}", e)))?;

        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("{}");

        serde_json::from_str(content)
            .map_err(|_| AssistError::provider("openai", "returned non-JSON response"))
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize_report(&self, input: &ReportSummaryInput) -> Result<String> {
        info!(model = %self.model, "Summarizing report via OpenAI");
        let system = "You are a concise finance assistant. Return JSON: {\"text\": string}.";
        let user = json!({ "task": "summarizeReport", "input": input }).to_string();
        let data: TextPayload = self.call_json(system, user).await?;
        Ok(data.text)
    }

    async fn suggest_category(
        &self,
        input: &CategorySuggestInput,
    ) -> Result<CategorySuggestResult> {
        let system = "Return JSON: {\"categoryName\": string, \"confidence\": number}.";
        let user = json!({
            "task": "suggestCategory",
            "note": sanitize_text(&input.note, 300),
            "candidates": input.candidates.as_deref().unwrap_or_default(),
        })
        .to_string();
        self.call_json(system, user).await
    }

    async fn budget_coach(&self, input: &BudgetCoachInput) -> Result<String> {
        let system = "Return JSON: {\"text\": string}. Keep it actionable and brief.";
        let user = json!({ "task": "budgetCoach", "input": input }).to_string();
        let data: TextPayload = self.call_json(system, user).await?;
        Ok(data.text)
    }

    async fn find_duplicates(&self, input: &DuplicatesInput) -> Result<DuplicatesResult> {
        let system = "Return JSON: {\"ids\": string[]}.";
        let safe_txs: Vec<_> = input
            .transactions
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "amount": t.amount,
                    "note": sanitize_text(t.note.as_deref().unwrap_or(""), 120),
                    "occurred_at": t.occurred_at,
                })
            })
            .collect();
        let user = json!({ "task": "findDuplicates", "transactions": safe_txs }).to_string();
        self.call_json(system, user).await
    }

    async fn nl_filter_to_query(&self, input: &NlFilterInput) -> Result<NlFilterResult> {
        let system = "Return JSON with any of these fields only: {\"type\":\"income\"|\"expense\",\"categoryId\":string,\"from\":\"YYYY-MM-DD\",\"to\":\"YYYY-MM-DD\",\"maxAmount\":number}. Omit fields you can't infer.";
        let user = json!({
            "task": "nlFilterToQuery",
            "text": sanitize_text(&input.text, 200),
        })
        .to_string();
        self.call_json(system, user).await
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = ProviderConfig {
            provider: "openai".to_string(),
            api_key: None,
            ..ProviderConfig::default()
        };
        // Only meaningful when the env var is absent; skip otherwise.
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(OpenAiProvider::new(&config).is_err());
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        let debug = format!("{:?}", provider);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_text_payload_defaults_empty() {
        let payload: TextPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.text, "");
    }
}
