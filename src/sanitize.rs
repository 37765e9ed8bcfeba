//! Input Sanitization
//!
//! Free text is redacted and bounded before it leaves the system boundary
//! toward any provider. Two related operations:
//!
//! - [`sanitize_text`]: redact email/phone-like substrings, trim, truncate
//! - [`sanitize_strings`]: recursively trim+truncate every string leaf of a
//!   JSON value (no redaction), preserving structure
//!
//! Both are pure and total: they never fail and never lengthen a string.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::Result;

/// Default truncation bound. Call sites typically override with 120-300
/// depending on the field's expected length.
pub const DEFAULT_MAX_LEN: usize = 500;

const ELLIPSIS: char = '…';

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("email pattern is valid")
});

// Phone-ish: 7+ digits, possibly +-prefixed and space/dash separated.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?\d[\s-]?){7,}\b").expect("phone pattern is valid")
});

/// Hard truncate to `max` characters total. When truncation occurs the last
/// character is an ellipsis marker, so the result never exceeds `max`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

/// Redact emails and obvious phone-like sequences, trim whitespace, then
/// truncate to `max` characters.
///
/// Runs redact+trim+truncate to a fixpoint: truncation can end a digit run
/// early and expose a phone-like suffix that a single pass would miss.
pub fn sanitize_text(s: &str, max: usize) -> String {
    let mut current = s.to_string();
    loop {
        let redacted = EMAIL_RE.replace_all(&current, "[redacted-email]");
        let redacted = PHONE_RE.replace_all(&redacted, "[redacted-phone]");
        let next = truncate_chars(redacted.trim(), max);
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Clamp a number to a safe range.
pub fn clamp(n: f64, lo: f64, hi: f64) -> f64 {
    n.max(lo).min(hi)
}

/// Recursively trim and truncate every string leaf of a JSON value.
/// Numbers, booleans and null are untouched; structure is preserved.
pub fn sanitize_strings(value: &mut Value, max: usize) {
    match value {
        Value::String(s) => {
            *s = truncate_chars(s.trim(), max);
        }
        Value::Array(items) => {
            for item in items {
                sanitize_strings(item, max);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                sanitize_strings(v, max);
            }
        }
        _ => {}
    }
}

/// Apply [`sanitize_strings`] to a typed value via its JSON representation.
///
/// Used by action handlers to bound every string field of a validated input
/// before it reaches a provider.
pub fn sanitize_input<T>(input: &T, max: usize) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(input)?;
    sanitize_strings(&mut value, max);
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_redacts_email() {
        let out = sanitize_text("pay alice.smith@example.com tomorrow", 500);
        assert_eq!(out, "pay [redacted-email] tomorrow");
    }

    #[test]
    fn test_redacts_phone() {
        let out = sanitize_text("call +91 98765 43210 now", 500);
        assert!(out.contains("[redacted-phone]"));
        assert!(!out.contains("98765"));
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_text("  coffee  ", 500), "coffee");
    }

    #[test]
    fn test_truncates_with_ellipsis_within_bound() {
        let out = sanitize_text(&"a".repeat(600), 500);
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_truncate_zero_bound() {
        assert_eq!(sanitize_text("anything", 0), "");
    }

    #[test]
    fn test_sanitize_strings_preserves_structure() {
        let mut value = json!({
            "note": "  a very long note that should be cut  ",
            "amount": 42.5,
            "nested": { "tags": ["  spaced  ", true, null] }
        });
        sanitize_strings(&mut value, 10);
        assert_eq!(value["note"].as_str().unwrap().chars().count(), 10);
        assert_eq!(value["amount"], 42.5);
        assert_eq!(value["nested"]["tags"][0], "spaced");
        assert_eq!(value["nested"]["tags"][1], true);
        assert_eq!(value["nested"]["tags"][2], Value::Null);
    }

    #[test]
    fn test_sanitize_strings_no_redaction() {
        // Recursive walk bounds length only; redaction is sanitize_text's job.
        let mut value = json!("mail me at a@b.io");
        sanitize_strings(&mut value, 500);
        assert_eq!(value, "mail me at a@b.io");
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.2, 0.3, 0.95), 0.95);
        assert_eq!(clamp(0.1, 0.3, 0.95), 0.3);
        assert_eq!(clamp(0.5, 0.3, 0.95), 0.5);
    }

    proptest! {
        #[test]
        fn prop_sanitize_never_lengthens(s in ".*", max in 0usize..600) {
            let out = sanitize_text(&s, max);
            prop_assert!(out.chars().count() <= max);
        }

        #[test]
        fn prop_sanitize_idempotent(s in ".*", max in 0usize..600) {
            let once = sanitize_text(&s, max);
            let twice = sanitize_text(&once, max);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_truncate_bound(s in ".*", max in 0usize..200) {
            prop_assert!(truncate_chars(&s, max).chars().count() <= max);
        }
    }
}
