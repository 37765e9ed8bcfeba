//! Request and result value objects for the five AI operations.
//!
//! These are transient values: constructed, validated, sanitized, and
//! discarded within a single request. Serde renames keep the wire shape
//! stable (`categoryName`, `maxAmount`, `type`, ...) so results can be
//! handed to a JSON frontend unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Inputs
// =============================================================================

/// Aggregates for a date-range report summary.
///
/// `net` is passed through as computed by the caller; providers must not
/// recompute it from `income - expense`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummaryInput {
    /// ISO date (YYYY-MM-DD), inclusive
    pub from: String,
    /// ISO date (YYYY-MM-DD), inclusive
    pub to: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    /// Number of transactions in range
    pub count: u64,
}

/// Free-text note plus optional existing category names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestInput {
    pub note: String,
    /// Existing category names; a match is returned with its exact casing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

/// One budget row: what was planned vs. what was actually spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub planned: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetCoachInput {
    /// 1-12
    pub month: u32,
    pub year: i32,
    pub budgets: Vec<BudgetLine>,
    /// Optional follow-up question from the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// A transaction as seen by the duplicate detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// ISO date-time string
    pub occurred_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatesInput {
    pub transactions: Vec<TxRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlFilterInput {
    pub text: String,
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySuggestResult {
    pub category_name: String,
    /// 0..=1
    pub confidence: f64,
}

/// Ids of transactions judged to be probable duplicates of each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicatesResult {
    pub ids: Vec<String>,
}

impl DuplicatesResult {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }
}

/// Transaction direction inferred from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

/// Sparse filter parsed from free text. Absent fields mean "no constraint
/// inferred". `category_id` carries a bare category name; mapping name to
/// identifier is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlFilterResult {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TxKind>,
    #[serde(rename = "categoryId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(rename = "maxAmount", default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
}

impl NlFilterResult {
    /// True when no constraint at all was inferred.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.category_id.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.max_amount.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nl_filter_result_wire_shape() {
        let result = NlFilterResult {
            kind: Some(TxKind::Expense),
            category_id: Some("Food".to_string()),
            from: NaiveDate::from_ymd_opt(2025, 8, 1),
            to: NaiveDate::from_ymd_opt(2025, 8, 31),
            max_amount: Some(2000.0),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "expense",
                "categoryId": "Food",
                "from": "2025-08-01",
                "to": "2025-08-31",
                "maxAmount": 2000.0
            })
        );
    }

    #[test]
    fn test_nl_filter_result_omits_absent_fields() {
        let value = serde_json::to_value(NlFilterResult::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_category_result_camel_case() {
        let result = CategorySuggestResult {
            category_name: "Transport".to_string(),
            confidence: 0.4,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["categoryName"], "Transport");
    }

    #[test]
    fn test_suggest_input_accepts_missing_candidates() {
        let input: CategorySuggestInput =
            serde_json::from_value(json!({ "note": "Uber ride" })).unwrap();
        assert!(input.candidates.is_none());
    }
}
