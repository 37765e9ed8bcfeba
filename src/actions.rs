//! Action Handlers
//!
//! The in-process boundary consumed by route-level callers. Each handler
//! runs the same linear pipeline:
//!
//! 1. validate the input shape/bounds
//! 2. check rate-limit admission for `user_id:action`
//! 3. sanitize every string field
//! 4. invoke the selected provider
//!
//! Validation runs before the admission check, so a malformed request does
//! not consume a token. All state lives in [`AssistContext`], which the
//! embedding application constructs once and shares.

use tracing::{debug, warn};

use crate::config::{Config, LimitsConfig};
use crate::limit::{per_minute, Admission, RateLimiter};
use crate::provider::{select_provider, ProviderRegistry, SharedProvider};
use crate::sanitize::sanitize_input;
use crate::types::{
    AssistError, BudgetCoachInput, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, Result, Validate,
};

/// Duplicate detection caps the transactions sent to a provider.
const MAX_DUPLICATE_SCAN: usize = 500;

/// Composition root for the assistance layer: one provider, one limiter,
/// shared by all request handlers.
pub struct AssistContext {
    provider: SharedProvider,
    limiter: RateLimiter,
    limits: LimitsConfig,
}

impl AssistContext {
    pub fn new(provider: SharedProvider, limits: LimitsConfig) -> Self {
        Self {
            provider,
            limiter: RateLimiter::new(),
            limits,
        }
    }

    /// Build from configuration using the built-in provider registry.
    /// Selection falls back to the mock provider on any load failure.
    pub fn from_config(config: &Config) -> Self {
        let registry = ProviderRegistry::default();
        let provider = select_provider(&registry, &config.ai);
        Self::new(provider, config.limits.clone())
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn admit(&self, user_id: &str, action: &str, per_min: u32) -> Result<()> {
        let key = format!("{}:{}", user_id, action);
        match self.limiter.consume(&key, per_minute(per_min)) {
            Admission::Granted => Ok(()),
            Admission::Denied { retry_after } => {
                warn!(%action, user = %user_id, ?retry_after, "Rate limit exceeded");
                Err(AssistError::RateLimited { retry_after })
            }
        }
    }

    /// Summarize the report KPIs for a date range.
    pub async fn summarize_report(
        &self,
        user_id: &str,
        input: ReportSummaryInput,
    ) -> Result<String> {
        input.validate()?;
        self.admit(user_id, "reports.summarize", self.limits.summarize_per_minute)?;
        let safe = sanitize_input(&input, 300)?;
        debug!(provider = %self.provider.name(), "reports.summarize");
        self.provider.summarize_report(&safe).await
    }

    /// Suggest a category for a transaction note.
    pub async fn suggest_category(
        &self,
        user_id: &str,
        input: CategorySuggestInput,
    ) -> Result<CategorySuggestResult> {
        input.validate()?;
        self.admit(user_id, "tx.suggestCategory", self.limits.suggest_per_minute)?;
        let safe = sanitize_input(&input, 300)?;
        debug!(provider = %self.provider.name(), "tx.suggestCategory");
        self.provider.suggest_category(&safe).await
    }

    /// Provide brief guidance for overspends and next-month adjustments.
    pub async fn budget_coach(&self, user_id: &str, input: BudgetCoachInput) -> Result<String> {
        input.validate()?;
        self.admit(user_id, "budgets.coach", self.limits.coach_per_minute)?;
        let mut trimmed = input;
        trimmed.budgets.truncate(200);
        let safe = sanitize_input(&trimmed, 200)?;
        debug!(provider = %self.provider.name(), "budgets.coach");
        self.provider.budget_coach(&safe).await
    }

    /// Flag probable duplicate transactions.
    pub async fn find_duplicates(
        &self,
        user_id: &str,
        input: DuplicatesInput,
    ) -> Result<DuplicatesResult> {
        input.validate()?;
        self.admit(user_id, "tx.findDuplicates", self.limits.duplicates_per_minute)?;
        let mut trimmed = input;
        trimmed.transactions.truncate(MAX_DUPLICATE_SCAN);
        let safe = sanitize_input(&trimmed, 200)?;
        debug!(provider = %self.provider.name(), "tx.findDuplicates");
        self.provider.find_duplicates(&safe).await
    }

    /// Parse free text into a structured transaction filter.
    pub async fn nl_filter(&self, user_id: &str, input: NlFilterInput) -> Result<NlFilterResult> {
        input.validate()?;
        self.admit(user_id, "tx.nlFilter", self.limits.nl_filter_per_minute)?;
        let safe = sanitize_input(&input, 200)?;
        debug!(provider = %self.provider.name(), "tx.nlFilter");
        self.provider.nl_filter_to_query(&safe).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BudgetLine, TxRecord};

    fn context() -> AssistContext {
        AssistContext::from_config(&Config::default())
    }

    fn context_with_limits(limits: LimitsConfig) -> AssistContext {
        AssistContext::new(
            select_provider(&ProviderRegistry::default(), &Default::default()),
            limits,
        )
    }

    fn report_input() -> ReportSummaryInput {
        ReportSummaryInput {
            from: "2025-08-01".to_string(),
            to: "2025-08-31".to_string(),
            income: 50_000.0,
            expense: 20_000.0,
            net: 30_000.0,
            count: 10,
        }
    }

    #[tokio::test]
    async fn test_default_context_uses_mock() {
        assert_eq!(context().provider_name(), "mock");
    }

    #[tokio::test]
    async fn test_summarize_full_pipeline() {
        let ctx = context();
        let summary = ctx.summarize_report("u1", report_input()).await.unwrap();
        assert!(summary.contains("surplus"));
    }

    #[tokio::test]
    async fn test_invalid_input_does_not_consume_token() {
        let ctx = context_with_limits(LimitsConfig {
            summarize_per_minute: 1,
            ..LimitsConfig::default()
        });
        let mut bad = report_input();
        bad.from = "not-a-date".to_string();
        // Validation fails first; no bucket is created for the key.
        let err = ctx.summarize_report("u1", bad).await.unwrap_err();
        assert!(matches!(err, AssistError::Validation(_)));
        assert!(ctx.limiter().is_empty());
        // The single allowed call still goes through afterwards.
        assert!(ctx.summarize_report("u1", report_input()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_denial_maps_to_typed_error() {
        let ctx = context_with_limits(LimitsConfig {
            summarize_per_minute: 1,
            ..LimitsConfig::default()
        });
        assert!(ctx.summarize_report("u1", report_input()).await.is_ok());
        let err = ctx.summarize_report("u1", report_input()).await.unwrap_err();
        match err {
            AssistError::RateLimited { retry_after } => {
                assert!(retry_after > std::time::Duration::ZERO)
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
        // A different user is unaffected.
        assert!(ctx.summarize_report("u2", report_input()).await.is_ok());
    }

    #[tokio::test]
    async fn test_suggest_category_sanitizes_note() {
        let ctx = context();
        let input = CategorySuggestInput {
            note: "  Uber ride to airport  ".to_string(),
            candidates: None,
        };
        let result = ctx.suggest_category("u1", input).await.unwrap();
        assert_eq!(result.category_name, "Transport");
    }

    #[tokio::test]
    async fn test_budget_coach_pipeline() {
        let ctx = context();
        let input = BudgetCoachInput {
            month: 9,
            year: 2025,
            budgets: vec![BudgetLine {
                category: "Food".to_string(),
                planned: 100.0,
                actual: 80.0,
            }],
            question: None,
        };
        let advice = ctx.budget_coach("u1", input).await.unwrap();
        assert!(advice.contains("Nice work"));
    }

    #[tokio::test]
    async fn test_find_duplicates_pipeline() {
        let ctx = context();
        let input = DuplicatesInput {
            transactions: vec![
                TxRecord {
                    id: "a".to_string(),
                    amount: 250.0,
                    note: Some("Swiggy dinner".to_string()),
                    occurred_at: "2025-08-12T19:30:00Z".to_string(),
                },
                TxRecord {
                    id: "b".to_string(),
                    amount: 250.0,
                    note: Some("Swiggy dinner order".to_string()),
                    occurred_at: "2025-08-12T20:00:00Z".to_string(),
                },
            ],
        };
        let result = ctx.find_duplicates("u1", input).await.unwrap();
        assert_eq!(result.ids.len(), 2);
    }

    #[tokio::test]
    async fn test_nl_filter_pipeline() {
        let ctx = context();
        let input = NlFilterInput {
            text: "spent under 300 on groceries".to_string(),
        };
        let result = ctx.nl_filter("u1", input).await.unwrap();
        assert_eq!(result.max_amount, Some(300.0));
        assert_eq!(result.category_id.as_deref(), Some("Food"));
    }

    #[tokio::test]
    async fn test_actions_use_separate_buckets() {
        let ctx = context_with_limits(LimitsConfig {
            summarize_per_minute: 1,
            nl_filter_per_minute: 1,
            ..LimitsConfig::default()
        });
        assert!(ctx.summarize_report("u1", report_input()).await.is_ok());
        // Exhausting the summarize bucket leaves nl_filter untouched.
        let input = NlFilterInput {
            text: "under 100".to_string(),
        };
        assert!(ctx.nl_filter("u1", input).await.is_ok());
    }
}
