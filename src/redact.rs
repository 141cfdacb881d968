//! PII masking applied to every inbound and outbound text surface.

use regex::Regex;
use std::sync::LazyLock;

/// Replacement for every masked span.
pub const REDACTED: &str = "[REDACTED]";

const PATTERNS: &[&str] = &[
    // email address
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    // SSN-shaped digit groups
    r"\b\d{3}-\d{2}-\d{4}\b",
    // employee id
    r"\bEMP-\d{3,}\b",
];

static PII: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(pattern = p, error = %e, "PII pattern failed to compile, skipping");
                None
            }
        })
        .collect()
});

/// Mask emails, SSN-shaped numbers and employee ids with [`REDACTED`].
///
/// Every pattern runs on every call. The function cannot fail: a pattern
/// that does not compile is skipped, so at worst the input comes back
/// unchanged. Idempotent, since the marker matches none of the patterns.
pub fn redact(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    PII.iter().fold(text.to_string(), |acc, re| {
        re.replace_all(&acc, REDACTED).into_owned()
    })
}

/// Whether `text` contains anything [`redact`] would mask.
pub fn contains_pii(text: &str) -> bool {
    PII.iter().any(|re| re.is_match(text))
}
