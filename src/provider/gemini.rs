//! Gemini API Provider
//!
//! Adapter over the generateContent API with model/endpoint fallback:
//!
//! - 2.5 and "latest" models are tried on v1beta first, others on v1
//! - On 404/405 the same model is retried on the flipped base, then the
//!   model pool is tried across both bases
//! - Other statuses abort immediately (auth/rate-limit problems are not
//!   version mismatches)
//! - The first working (model, base) pair is locked in for later calls
//! - Replies are requested as JSON; fenced or braced JSON embedded in text
//!   is extracted as a fallback

use std::sync::LazyLock;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AiProvider, ProviderConfig};
use crate::sanitize::sanitize_text;
use crate::types::{
    AssistError, BudgetCoachInput, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, Result,
};

const API_V1: &str = "https://generativelanguage.googleapis.com/v1";
const API_V1BETA: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Stable aliases preferred before "-latest" ones.
const MODEL_POOL: &[&str] = &[
    "models/gemini-2.5-flash",
    "models/gemini-2.5-pro",
    "models/gemini-flash-latest",
    "models/gemini-pro-latest",
    "models/gemini-2.0-flash",
];

static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)```").expect("fenced-json pattern is valid")
});
static BRACED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\{.*\})").expect("braced-json pattern is valid"));

fn api_base_for_model(model: &str) -> &'static str {
    let lower = model.to_lowercase();
    // 2.5 and "latest" models are better supported via v1beta.
    if lower.contains("2.5") || lower.contains("latest") {
        API_V1BETA
    } else {
        API_V1
    }
}

fn flip_base(base: &str) -> &'static str {
    if base == API_V1 { API_V1BETA } else { API_V1 }
}

/// Parse a JSON value out of provider text: direct parse, then fenced
/// ```json blocks, then the outermost braced region.
fn extract_json_from_text(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    if let Some(caps) = FENCED_JSON_RE.captures(text) {
        if let Some(inner) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(inner.as_str()) {
                return Some(value);
            }
        }
    }
    if let Some(caps) = BRACED_JSON_RE.captures(text) {
        if let Some(inner) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(inner.as_str()) {
                return Some(value);
            }
        }
    }
    None
}

/// The (model, base) pair currently in use; updated when fallback finds a
/// working combination.
#[derive(Debug, Clone)]
struct ActivePair {
    model: String,
    api_base: String,
}

/// Gemini adapter with model/endpoint fallback.
pub struct GeminiProvider {
    api_key: SecretString,
    active: Mutex<ActivePair>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.active_pair();
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("model", &active.model)
            .field("api_base", &active.api_base)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                AssistError::Config(
                    "Gemini API key not found. Set GEMINI_API_KEY or provide ai.api_key"
                        .to_string(),
                )
            })?;

        let model = config
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| MODEL_POOL[0].to_string());

        let api_base = match &config.api_base {
            Some(base) => Self::validate_endpoint(base)?,
            None => api_base_for_model(&model).to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            active: Mutex::new(ActivePair { model, api_base }),
            client,
        })
    }

    /// Only http/https endpoints are accepted for overrides.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            AssistError::Config(format!("Invalid Gemini endpoint '{}': {}", endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AssistError::Config(format!(
                "Gemini endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }
        Ok(endpoint.trim_end_matches('/').to_string())
    }

    fn active_pair(&self) -> ActivePair {
        self.active
            .lock()
            .map(|pair| pair.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_active_pair(&self, pair: ActivePair) {
        match self.active.lock() {
            Ok(mut active) => *active = pair,
            Err(poisoned) => *poisoned.into_inner() = pair,
        }
    }

    /// Fallback order: current pair, flipped base, then the pool across
    /// both bases.
    fn attempt_order(&self) -> Vec<ActivePair> {
        let current = self.active_pair();
        let mut order = vec![
            current.clone(),
            ActivePair {
                model: current.model.clone(),
                api_base: flip_base(&current.api_base).to_string(),
            },
        ];
        for model in MODEL_POOL {
            if *model == current.model {
                continue;
            }
            let base = api_base_for_model(model);
            order.push(ActivePair {
                model: model.to_string(),
                api_base: base.to_string(),
            });
            order.push(ActivePair {
                model: model.to_string(),
                api_base: flip_base(base).to_string(),
            });
        }
        order
    }

    async fn raw_call(
        &self,
        pair: &ActivePair,
        system: &str,
        user: &str,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        // The "models/..." path segment must not be percent-encoded.
        let endpoint = format!("{}/{}:generateContent", pair.api_base, pair.model);
        self.client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&json!({
                "systemInstruction": { "role": "system", "parts": [{ "text": system }] },
                "contents": [{ "role": "user", "parts": [{ "text": user }] }],
                "generationConfig": {
                    "temperature": 0.2,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await
    }

    async fn call_json<T: DeserializeOwned>(&self, system: &str, user: String) -> Result<T> {
        let mut tried: Vec<String> = Vec::new();
        let mut last_status = None;
        let mut last_body = String::new();

        for pair in self.attempt_order() {
            debug!(model = %pair.model, base = %pair.api_base, "Gemini attempt");
            let response = self
                .raw_call(&pair, system, &user)
                .await
                .map_err(|e| AssistError::provider("gemini", format!("request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                // Lock onto the working pair.
                self.set_active_pair(pair.clone());

                let body: GenerateContentResponse = response.json().await.map_err(|e| {
                    AssistError::provider("gemini", format!("malformed response: {}", e))
                })?;
                let text = body
                    .candidates
                    .first()
                    .and_then(|c| c.content.parts.first())
                    .map(|p| p.text.as_str())
                    .unwrap_or("");

                let value = extract_json_from_text(text).ok_or_else(|| {
                    AssistError::provider("gemini", "returned non-JSON response")
                })?;
                return Ok(serde_json::from_value(value)?);
            }

            last_body = response.text().await.unwrap_or_default();
            last_status = Some(status);
            tried.push(format!("{}@{}", pair.model, pair.api_base));

            // Anything other than a version/method mismatch bubbles up.
            if status.as_u16() != 404 && status.as_u16() != 405 {
                return Err(AssistError::provider(
                    "gemini",
                    format!(
                        "HTTP {}: {} [model={} base={}]",
                        status,
                        if last_body.is_empty() { "(no body)" } else { last_body.as_str() },
                        pair.model,
                        pair.api_base
                    ),
                ));
            }
            warn!(model = %pair.model, %status, "Gemini model/endpoint mismatch, trying next");
        }

        Err(AssistError::provider(
            "gemini",
            format!(
                "HTTP {}: {} [tried={}]",
                last_status.map(|s| s.as_u16()).unwrap_or(404),
                if last_body.is_empty() { "(no body)" } else { last_body.as_str() },
                tried.join(", ")
            ),
        ))
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn summarize_report(&self, input: &ReportSummaryInput) -> Result<String> {
        let system = "Return JSON exactly: {\"text\": string}. Keep it to 2-3 concise finance summary sentences. No extra fields.";
        let user = json!({ "task": "summarizeReport", "input": input }).to_string();
        let data: TextPayload = self.call_json(system, user).await?;
        Ok(data.text)
    }

    async fn suggest_category(
        &self,
        input: &CategorySuggestInput,
    ) -> Result<CategorySuggestResult> {
        let system = "Return JSON exactly: {\"categoryName\": string, \"confidence\": number}. Category is a single high-level word (Food, Transport, Utilities, Rent, Shopping, Salary, Investment, Misc). No extra fields.";
        let user = json!({
            "task": "suggestCategory",
            "note": sanitize_text(&input.note, 300),
            "candidates": input.candidates.as_deref().unwrap_or_default(),
        })
        .to_string();
        self.call_json(system, user).await
    }

    async fn budget_coach(&self, input: &BudgetCoachInput) -> Result<String> {
        let system = "Return JSON exactly: {\"text\": string}. Be an empathetic budgeting coach; under 120 words; actionable next-month adjustments. No extra fields.";
        let user = json!({ "task": "budgetCoach", "input": input }).to_string();
        let data: TextPayload = self.call_json(system, user).await?;
        Ok(data.text)
    }

    async fn find_duplicates(&self, input: &DuplicatesInput) -> Result<DuplicatesResult> {
        let system = "Return JSON exactly: {\"ids\": string[]}. No extra fields.";
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
        let system = "Return JSON with any of these fields only: {\"type\":\"income\"|\"expense\",\"categoryId\":string,\"from\":\"YYYY-MM-DD\",\"to\":\"YYYY-MM-DD\",\"maxAmount\":number}. Omit fields you can't infer. No extra fields.";
        let user = json!({
            "task": "nlFilterToQuery",
            "text": sanitize_text(&input.text, 200),
        })
        .to_string();
        self.call_json(system, user).await
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_model(model: &str) -> GeminiProvider {
        GeminiProvider::new(&ProviderConfig {
            provider: "gemini".to_string(),
            model: Some(model.to_string()),
            api_key: Some("test-key".to_string()),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_base_selection_by_model_name() {
        assert_eq!(api_base_for_model("models/gemini-2.5-flash"), API_V1BETA);
        assert_eq!(api_base_for_model("models/gemini-flash-latest"), API_V1BETA);
        assert_eq!(api_base_for_model("models/gemini-2.0-flash"), API_V1);
    }

    #[test]
    fn test_attempt_order_flips_base_then_walks_pool() {
        let provider = provider_with_model("models/gemini-2.0-flash");
        let order = provider.attempt_order();
        assert_eq!(order[0].model, "models/gemini-2.0-flash");
        assert_eq!(order[0].api_base, API_V1);
        assert_eq!(order[1].model, "models/gemini-2.0-flash");
        assert_eq!(order[1].api_base, API_V1BETA);
        // Pool minus the current model, each on two bases.
        assert_eq!(order.len(), 2 + (MODEL_POOL.len() - 1) * 2);
        assert!(order[2..].iter().all(|p| p.model != "models/gemini-2.0-flash"));
    }

    #[test]
    fn test_new_requires_api_key() {
        if std::env::var("GEMINI_API_KEY").is_err() {
            let result = GeminiProvider::new(&ProviderConfig {
                provider: "gemini".to_string(),
                ..ProviderConfig::default()
            });
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = GeminiProvider::new(&ProviderConfig {
            provider: "gemini".to_string(),
            api_key: Some("test-key".to_string()),
            api_base: Some("file:///etc/passwd".to_string()),
            ..ProviderConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json_from_text("{\"text\": \"hi\"}").unwrap();
        assert_eq!(value["text"], "hi");
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "Here you go:\n```json\n{\"ids\": [\"a\"]}\n```\nDone.";
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["ids"][0], "a");
    }

    #[test]
    fn test_extract_json_braced() {
        let text = "Sure! {\"confidence\": 0.4} hope that helps";
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["confidence"], 0.4);
    }

    #[test]
    fn test_extract_json_none() {
        assert!(extract_json_from_text("no json here").is_none());
    }
}
