//! Input validation for the five AI operations.
//!
//! Shape/bounds checks run before any rate-limit or provider work so a
//! malformed request never consumes a token. Bounds mirror the form limits
//! of the embedding application (note length, candidate counts, money caps).

use std::sync::LazyLock;

use regex::Regex;

use super::error::{ValidationError, ValidationErrorKind};
use super::request::{
    BudgetCoachInput, CategorySuggestInput, DuplicatesInput, NlFilterInput, ReportSummaryInput,
};

/// Upper bound for any money amount. Large enough for aggregate totals.
pub const MONEY_MAX: f64 = 1_000_000_000_000.0; // 1e12

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO date pattern is valid")
});

static ISO_DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2})?(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("ISO date-time pattern is valid")
});

/// Shape/bounds validation for a request value object.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

// =============================================================================
// Field checks
// =============================================================================

fn check_iso_date(value: &str, field: &str) -> Result<(), ValidationError> {
    if ISO_DATE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::format(field, "must be ISO date (YYYY-MM-DD)"))
    }
}

fn check_iso_date_time(value: &str, field: &str) -> Result<(), ValidationError> {
    if ISO_DATE_TIME.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::format(field, "must be ISO date-time"))
    }
}

fn check_money(value: f64, field: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::range(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::range(field, "must be >= 0"));
    }
    if value > MONEY_MAX {
        return Err(ValidationError::range(field, "amount too large"));
    }
    Ok(())
}

fn check_signed_money(value: f64, field: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::range(field, "must be a finite number"));
    }
    if value < -MONEY_MAX || value > MONEY_MAX {
        return Err(ValidationError::range(field, "amount out of range"));
    }
    Ok(())
}

fn check_text(value: &str, field: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!("must be at least {} character(s)", min),
        )
        .with_field(field));
    }
    if len > max {
        return Err(ValidationError::range(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

// =============================================================================
// Per-input rules
// =============================================================================

impl Validate for ReportSummaryInput {
    fn validate(&self) -> Result<(), ValidationError> {
        check_iso_date(&self.from, "from")?;
        check_iso_date(&self.to, "to")?;
        check_money(self.income, "income")?;
        check_money(self.expense, "expense")?;
        check_signed_money(self.net, "net")?;
        if self.count > 1_000_000 {
            return Err(ValidationError::range("count", "too many transactions"));
        }
        Ok(())
    }
}

impl Validate for CategorySuggestInput {
    fn validate(&self) -> Result<(), ValidationError> {
        check_text(&self.note, "note", 1, 500)?;
        if let Some(candidates) = &self.candidates {
            if candidates.len() > 200 {
                return Err(ValidationError::range("candidates", "at most 200 entries"));
            }
            for (idx, candidate) in candidates.iter().enumerate() {
                check_text(candidate, &format!("candidates[{}]", idx), 1, 60)?;
            }
        }
        Ok(())
    }
}

impl Validate for BudgetCoachInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=12).contains(&self.month) {
            return Err(ValidationError::range("month", "must be between 1 and 12"));
        }
        if !(2000..=2100).contains(&self.year) {
            return Err(ValidationError::range("year", "must be between 2000 and 2100"));
        }
        if self.budgets.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                "at least one budget line required",
            )
            .with_field("budgets"));
        }
        if self.budgets.len() > 1000 {
            return Err(ValidationError::range("budgets", "at most 1000 lines"));
        }
        for (idx, line) in self.budgets.iter().enumerate() {
            check_text(&line.category, &format!("budgets[{}].category", idx), 1, 60)?;
            check_money(line.planned, &format!("budgets[{}].planned", idx))?;
            check_money(line.actual, &format!("budgets[{}].actual", idx))?;
        }
        if let Some(question) = &self.question {
            check_text(question, "question", 1, 200)?;
        }
        Ok(())
    }
}

impl Validate for DuplicatesInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.transactions.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                "at least one transaction required",
            )
            .with_field("transactions"));
        }
        if self.transactions.len() > 5000 {
            return Err(ValidationError::range(
                "transactions",
                "at most 5000 transactions",
            ));
        }
        for (idx, tx) in self.transactions.iter().enumerate() {
            check_text(&tx.id, &format!("transactions[{}].id", idx), 1, 64)?;
            check_money(tx.amount, &format!("transactions[{}].amount", idx))?;
            if let Some(note) = &tx.note {
                check_text(note, &format!("transactions[{}].note", idx), 0, 500)?;
            }
            check_iso_date_time(&tx.occurred_at, &format!("transactions[{}].occurred_at", idx))?;
        }
        Ok(())
    }
}

impl Validate for NlFilterInput {
    fn validate(&self) -> Result<(), ValidationError> {
        check_text(&self.text, "text", 1, 300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::{BudgetLine, TxRecord};

    fn report_input() -> ReportSummaryInput {
        ReportSummaryInput {
            from: "2025-08-01".to_string(),
            to: "2025-08-31".to_string(),
            income: 100_000.0,
            expense: 60_000.0,
            net: 40_000.0,
            count: 42,
        }
    }

    #[test]
    fn test_report_input_valid() {
        assert!(report_input().validate().is_ok());
    }

    #[test]
    fn test_report_input_rejects_bad_date() {
        let mut input = report_input();
        input.from = "08/01/2025".to_string();
        let err = input.validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("from"));
        assert_eq!(err.kind, ValidationErrorKind::Format);
    }

    #[test]
    fn test_report_input_rejects_nan_income() {
        let mut input = report_input();
        input.income = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_report_input_rejects_huge_amount() {
        let mut input = report_input();
        input.expense = MONEY_MAX * 2.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_net_may_be_negative() {
        let mut input = report_input();
        input.net = -5000.0;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_suggest_rejects_empty_note() {
        let input = CategorySuggestInput {
            note: "   ".to_string(),
            candidates: None,
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_suggest_rejects_long_candidate() {
        let input = CategorySuggestInput {
            note: "coffee".to_string(),
            candidates: Some(vec!["x".repeat(61)]),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_coach_rejects_month_zero() {
        let input = BudgetCoachInput {
            month: 0,
            year: 2025,
            budgets: vec![BudgetLine {
                category: "Food".to_string(),
                planned: 100.0,
                actual: 80.0,
            }],
            question: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_duplicates_accepts_date_time_variants() {
        let input = DuplicatesInput {
            transactions: vec![
                TxRecord {
                    id: "a".to_string(),
                    amount: 10.0,
                    note: None,
                    occurred_at: "2025-08-12T10:30:00Z".to_string(),
                },
                TxRecord {
                    id: "b".to_string(),
                    amount: 10.0,
                    note: Some("tea".to_string()),
                    occurred_at: "2025-08-12T10:30".to_string(),
                },
            ],
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_nl_filter_rejects_oversized_text() {
        let input = NlFilterInput {
            text: "a".repeat(301),
        };
        assert!(input.validate().is_err());
    }
}
