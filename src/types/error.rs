//! Unified Error Type System
//!
//! Centralized error types for the assistance layer.
//!
//! ## Design Principles
//!
//! - Single unified error type (AssistError) for the entire crate
//! - Structured validation errors with field context
//! - Rate-limit denial carries a retry-after hint for the caller
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Shorthand for a range violation on a named field
    pub fn range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::Range, message).with_field(field)
    }

    /// Shorthand for a format violation on a named field
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::Format, message).with_field(field)
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing or empty
    MissingField,
    /// Invalid format
    Format,
    /// Value out of range
    Range,
    /// General validation error
    General,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum AssistError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    /// Admission denied by the rate limiter. Carries the time until one
    /// token will be available again.
    #[error("Rate limited: retry in {}s", retry_after.as_secs().max(1))]
    RateLimited { retry_after: Duration },

    #[error("Config error: {0}")]
    Config(String),

    /// A live call to a remote provider failed (non-2xx, malformed body,
    /// exhausted fallback attempts).
    #[error("Provider '{provider}' call failed: {message}")]
    Provider { provider: String, message: String },
}

impl From<ValidationError> for AssistError {
    fn from(err: ValidationError) -> Self {
        AssistError::Validation(err)
    }
}

impl AssistError {
    /// Create a provider call failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True if this error is a rate-limit denial
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, AssistError>;
