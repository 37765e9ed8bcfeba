//! AI Provider Abstraction
//!
//! Defines the [`AiProvider`] trait implemented by three interchangeable
//! backends:
//!
//! - `mock`: deterministic, offline heuristics (default)
//! - `openai`: Chat Completions adapter
//! - `gemini`: generateContent adapter with model/endpoint fallback
//!
//! Provider selection with graceful fallback lives in [`router`].

mod gemini;
mod mock;
mod openai;
mod router;

pub use gemini::GeminiProvider;
pub use mock::{parse_nl_filter, MockProvider};
pub use openai::OpenAiProvider;
pub use router::{select_provider, ProviderFactory, ProviderRegistry};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{
    BudgetCoachInput, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, Result,
};

/// Shared provider handle for concurrent use across request handlers.
pub type SharedProvider = Arc<dyn AiProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for AI providers.
///
/// API keys are never serialized to output and are redacted in debug
/// output; remote providers convert the key to a SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name: "mock", "openai", "gemini"
    pub provider: String,
    /// Model override (provider-specific)
    #[serde(default)]
    pub model: Option<String>,
    /// API key; falls back to the provider's environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL override (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// AI Provider Trait
// =============================================================================

/// Capability contract for the five AI-backed operations.
///
/// Inputs are expected to be validated and sanitized by the caller. Every
/// operation may fail (network error, malformed response) and such
/// failures propagate as typed errors, never panics.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name for logging ("mock", "openai", "gemini")
    fn name(&self) -> &str;

    /// Short natural-language summary of a date-range report.
    async fn summarize_report(&self, input: &ReportSummaryInput) -> Result<String>;

    /// Best-guess category for a free-text note.
    async fn suggest_category(
        &self,
        input: &CategorySuggestInput,
    ) -> Result<CategorySuggestResult>;

    /// Actionable guidance over a month's budget lines.
    async fn budget_coach(&self, input: &BudgetCoachInput) -> Result<String>;

    /// Subset of transaction ids judged to be probable duplicates.
    async fn find_duplicates(&self, input: &DuplicatesInput) -> Result<DuplicatesResult>;

    /// Parse free text into a sparse structured filter.
    async fn nl_filter_to_query(&self, input: &NlFilterInput) -> Result<NlFilterResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_provider_config_never_serializes_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("api_key"));
    }
}
