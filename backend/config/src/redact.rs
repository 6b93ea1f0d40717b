//! Masks credentials in a config snapshot before it is printed or logged.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "apikey",
    "key",
    "token",
    "accessToken",
    "secret",
    "password",
];

pub const MASK: &str = "***";

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Replace every non-empty value under a credential-like key with a short
/// hint (first four characters) followed by `***`.
pub fn redact(value: &Value) -> Value {
    redact_under(value, false)
}

fn redact_under(value: &Value, sensitive: bool) -> Value {
    match value {
        Value::String(s) if sensitive && !s.is_empty() => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 8 {
                Value::String(format!("{hint}{MASK}"))
            } else {
                Value::String(MASK.to_string())
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_under(v, sensitive)).collect()),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), redact_under(v, sensitive || is_sensitive_key(k))))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_api_keys() {
        let v = json!({
            "llm": { "apiKey": "sk-abcdef123456", "chatModel": "gpt-4o" },
            "ocr": { "apiKey": "short" }
        });
        let redacted = redact(&v);
        assert_eq!(redacted["llm"]["apiKey"], "sk-a***");
        assert_eq!(redacted["llm"]["chatModel"], "gpt-4o");
        assert_eq!(redacted["ocr"]["apiKey"], "***");
    }

    #[test]
    fn empty_values_stay_empty() {
        let redacted = redact(&json!({ "llm": { "apiKey": "" } }));
        assert_eq!(redacted["llm"]["apiKey"], "");
    }
}
