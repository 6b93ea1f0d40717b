//! Log Redaction
//!
//! Masks API keys, bearer tokens, Israeli phone numbers and 9-digit ID or
//! HMO card numbers before text reaches the logs.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)|\b[a-f0-9]{32}\b").unwrap()
});

/// Mobile `05X-XXXXXXX` and landline `0X-XXXXXXX`, with optional `+972` and separators.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+972[-\s]?|\b0)(?:5\d|[2-489])[-\s]?\d{3}[-\s]?\d{4}\b").unwrap()
});

static NINE_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{9}\b").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = PHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]");
    NINE_DIGITS_RE.replace_all(&redacted, "[REDACTED_ID]").into_owned()
}
