//! Deterministic Mock Provider
//!
//! Offline, zero-cost implementation of [`AiProvider`]. No network calls,
//! no randomness: the same input always yields the same output. Used for
//! local development, tests, demos, and as the fallback when a remote
//! provider cannot be loaded.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

use super::AiProvider;
use crate::sanitize::{clamp, sanitize_text};
use crate::types::{
    BudgetCoachInput, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, Result, TxKind,
};

/// Keyword families mapped to category names. Matched as substrings of the
/// lowercased note; longer keywords score higher.
const KEYWORD_TABLE: &[(&[&str], &str)] = &[
    (
        &["uber", "ola", "fuel", "petrol", "diesel", "metro", "bus", "cab", "train", "flight", "airfare"],
        "Transport",
    ),
    (
        &["grocery", "groceries", "swiggy", "zomato", "restaurant", "food", "dinner", "lunch", "breakfast", "snacks", "cafe"],
        "Food",
    ),
    (&["rent", "landlord", "lease"], "Rent"),
    (
        &["electricity", "power", "bescom", "tneb", "mahavitaran", "water", "gas", "internet", "wifi", "broadband", "mobile", "recharge", "dth"],
        "Utilities",
    ),
    (&["medicine", "pharmacy", "doctor", "hospital", "clinic", "lab"], "Health"),
    (
        &["amazon", "flipkart", "myntra", "nykaa", "shopping", "clothes", "apparel", "shoes"],
        "Shopping",
    ),
    (
        &["salary", "stipend", "payout", "freelance", "invoice", "payment received"],
        "Income",
    ),
    (&["school", "tuition", "course", "udemy", "coursera", "byju"], "Education"),
    (&["emi", "loan", "interest", "credit card"], "Debt"),
    (&["gift", "donation", "charity"], "Gifts/Donations"),
];

static INCOME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(income|salary|received)\b").expect("income pattern is valid"));
static EXPENSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(expense|spent|pay|paid|purchase)\b").expect("expense pattern is valid")
});
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:under|below|less than)|<=?)\s*([0-9]+)\b").expect("amount pattern is valid")
});
static LAST_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blast month\b").expect("last-month pattern is valid"));
static FOOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(grocery|groceries|food|restaurant|swiggy|zomato)\b")
        .expect("food pattern is valid")
});
static TRANSPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(uber|ola|metro|bus|fuel|petrol|diesel)\b").expect("transport pattern is valid")
});

/// Deterministic heuristic provider.
#[derive(Debug, Default, Clone)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn summarize_report(&self, input: &ReportSummaryInput) -> Result<String> {
        let burn = if input.income > 0.0 {
            (input.expense / input.income.max(1.0)) * 100.0
        } else {
            0.0
        };
        let direction = if input.net >= 0.0 { "surplus" } else { "deficit" };
        Ok(format!(
            "Summary for {} → {}: • Transactions: {} • Income: ₹{} • Expense: ₹{} ({:.1}% of income) • Net: ₹{} ({}) Tip: Keep fixed costs ≤ 50% of income and discretionary ≤ 30%.",
            input.from,
            input.to,
            input.count,
            format_inr(input.income),
            format_inr(input.expense),
            burn,
            format_inr(input.net),
            direction,
        ))
    }

    async fn suggest_category(
        &self,
        input: &CategorySuggestInput,
    ) -> Result<CategorySuggestResult> {
        let note = sanitize_text(&input.note, 200).to_lowercase();

        let mut best_name = "Other";
        let mut best_score = 0.1;
        for (keywords, category) in KEYWORD_TABLE {
            for keyword in *keywords {
                if note.contains(keyword) {
                    // Longer keyword, higher confidence.
                    let score = clamp(keyword.len() as f64 / 10.0, 0.3, 0.95);
                    if score > best_score {
                        best_name = category;
                        best_score = score;
                    }
                }
            }
        }

        // Prefer the caller's exact casing when a candidate matches.
        if let Some(candidates) = &input.candidates {
            if let Some(hit) = candidates
                .iter()
                .find(|c| c.eq_ignore_ascii_case(best_name))
            {
                return Ok(CategorySuggestResult {
                    category_name: hit.clone(),
                    confidence: best_score,
                });
            }
        }

        Ok(CategorySuggestResult {
            category_name: best_name.to_string(),
            confidence: best_score,
        })
    }

    async fn budget_coach(&self, input: &BudgetCoachInput) -> Result<String> {
        let mut overs: Vec<(&str, f64, f64)> = input
            .budgets
            .iter()
            .filter_map(|line| {
                let diff = line.actual - line.planned;
                (diff > 0.0).then_some((line.category.as_str(), diff, line.planned))
            })
            .collect();
        overs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if overs.is_empty() {
            return Ok(format!(
                "Nice work for {}/{}! All categories are within budget. Consider increasing savings or debt repayment.",
                input.month, input.year
            ));
        }

        let mut lines = vec![format!(
            "For {}/{}, {} categor{} over budget.",
            input.month,
            input.year,
            overs.len(),
            if overs.len() > 1 { "ies are" } else { "y is" }
        )];

        for (category, diff, planned) in overs.iter().take(5) {
            let over_pct = (diff / planned.max(1.0)) * 100.0;
            // Suggest a 10% tighter plan next month, floored at zero.
            let next_plan = (planned * 0.9).round().max(0.0);
            lines.push(format!(
                "• {}: overspent by ₹{} ({:.1}%). Try: cap discretionary, set alerts at 80%, plan next month = ₹{} if feasible.",
                category,
                format_inr(*diff),
                over_pct,
                format_inr(next_plan),
            ));
        }

        lines.push(
            "General tips: move recurring bills to early-in-month, use category-level alerts at 80/100%, and review weekly.".to_string(),
        );

        if let Some(question) = input.question.as_deref().filter(|q| !q.trim().is_empty()) {
            lines.push(format!(
                "On your question (\"{}\"): start with the overspent categories above and revisit after a week of tracking.",
                sanitize_text(question, 200)
            ));
        }

        Ok(lines.join(" "))
    }

    async fn find_duplicates(&self, input: &DuplicatesInput) -> Result<DuplicatesResult> {
        // Heuristic: same calendar day and rounded amount, plus note
        // similarity (shared 10-char prefix after normalization). Pairs are
        // compared adjacently after sorting, so clustering is deliberately
        // not transitive.
        let mut by_day_amount: HashMap<(String, i64), Vec<(String, String)>> = HashMap::new();

        for tx in &input.transactions {
            let day: String = tx.occurred_at.chars().take(10).collect();
            let amount = tx.amount.round() as i64;
            let note = normalize_note(tx.note.as_deref().unwrap_or(""));
            by_day_amount
                .entry((day, amount))
                .or_default()
                .push((tx.id.clone(), note));
        }

        let mut ids = BTreeSet::new();
        for (_, mut group) in by_day_amount {
            if group.len() < 2 {
                continue;
            }
            group.sort_by(|a, b| a.1.cmp(&b.1));
            for pair in group.windows(2) {
                let prev: String = pair[0].1.chars().take(10).collect();
                let cur: String = pair[1].1.chars().take(10).collect();
                if prev == cur {
                    ids.insert(pair[0].0.clone());
                    ids.insert(pair[1].0.clone());
                }
            }
        }

        Ok(DuplicatesResult {
            ids: ids.into_iter().collect(),
        })
    }

    async fn nl_filter_to_query(&self, input: &NlFilterInput) -> Result<NlFilterResult> {
        Ok(parse_nl_filter(&input.text, Utc::now().date_naive()))
    }
}

/// Parse free text into a sparse filter, resolving relative dates against
/// `today`. Deterministic core of the mock's `nl_filter_to_query`.
pub fn parse_nl_filter(text: &str, today: NaiveDate) -> NlFilterResult {
    let text = sanitize_text(text, 200).to_lowercase();
    let mut out = NlFilterResult::default();

    // Both patterns run unconditionally; text naming both directions ends
    // up with whichever matched later.
    if INCOME_RE.is_match(&text) {
        out.kind = Some(TxKind::Income);
    }
    if EXPENSE_RE.is_match(&text) {
        out.kind = Some(TxKind::Expense);
    }

    if let Some(caps) = AMOUNT_RE.captures(&text) {
        if let Some(amount) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
            out.max_amount = Some(amount);
        }
    }

    if LAST_MONTH_RE.is_match(&text) {
        let first_of_this = today.with_day(1).unwrap_or(today);
        let to = first_of_this.pred_opt().unwrap_or(first_of_this);
        let from = to.with_day(1).unwrap_or(to);
        out.from = Some(from);
        out.to = Some(to);
    }

    // Bare category names; mapping name -> id is left to the caller.
    if FOOD_RE.is_match(&text) {
        out.category_id = Some("Food".to_string());
    }
    if TRANSPORT_RE.is_match(&text) {
        out.category_id = Some("Transport".to_string());
    }

    out
}

/// Lowercase, strip non-alphanumerics (keeping spaces), trim, cap at 40 chars.
fn normalize_note(note: &str) -> String {
    let lowered = note.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    cleaned.trim().chars().take(40).collect()
}

/// Format an amount with Indian digit grouping (₹ symbol added by callers).
fn format_inr(n: f64) -> String {
    let negative = n < 0.0;
    let abs = n.abs();
    let int_part = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;

    let digits = int_part.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            parts.push(t);
            rest = h;
        }
        parts.push(rest);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if cents > 0 && cents < 100 {
        out.push_str(&format!(".{:02}", cents));
    }
    out
}
