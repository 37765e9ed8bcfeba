//! finassist - AI Assistance Layer for Personal Finance Data
//!
//! A small assistance layer that answers five questions about a user's
//! finance data: report summaries, category suggestions, budget coaching,
//! duplicate detection, and natural-language filter parsing. Every
//! operation works fully offline through a deterministic mock provider;
//! OpenAI and Gemini backends are optional drop-ins behind the same trait.
//!
//! ## Core Features
//!
//! - **Provider Abstraction**: One async trait, three interchangeable backends
//! - **Graceful Fallback**: Misconfigured providers degrade to the mock, never fail
//! - **Rate Limiting**: Per-user, per-action token buckets with retry hints
//! - **Input Sanitization**: PII redaction and length bounding before any provider call
//!
//! ## Quick Start
//!
//! ```ignore
//! use finassist::{AssistContext, Config, NlFilterInput};
//!
//! let config = Config::default();
//! let ctx = AssistContext::from_config(&config);
//! let filter = ctx
//!     .nl_filter("user-1", NlFilterInput { text: "food expenses under 500".into() })
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: The [`AiProvider`] trait, mock/OpenAI/Gemini backends, selection
//! - [`actions`]: Validated, rate-limited, sanitized request handlers
//! - [`limit`]: Token-bucket rate limiter
//! - [`sanitize`]: Text redaction and truncation
//! - [`config`]: Layered configuration (defaults, TOML file, environment)

pub mod actions;
pub mod cli;
pub mod config;
pub mod limit;
pub mod provider;
pub mod sanitize;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Handlers
pub use actions::AssistContext;

// Configuration
pub use config::{Config, ConfigLoader, LimitsConfig};

// Error Types
pub use types::{AssistError, Result, ValidationError};

// Inputs and Results
pub use types::{
    BudgetCoachInput, BudgetLine, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, TxKind, TxRecord,
};

// =============================================================================
// Provider Re-exports
// =============================================================================

pub use provider::{
    select_provider, AiProvider, GeminiProvider, MockProvider, OpenAiProvider, ProviderConfig,
    ProviderRegistry, SharedProvider,
};

// =============================================================================
// Rate Limiting Re-exports
// =============================================================================

pub use limit::{per_minute, Admission, RateLimitOptions, RateLimiter};
