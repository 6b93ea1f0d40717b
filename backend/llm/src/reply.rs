//! Turning free-form model output into JSON.
//!
//! Models are asked for bare JSON but sometimes wrap it in a Markdown fence
//! or surround it with prose.

use medassist_core::MedAssistError;
use serde_json::Value;

/// Return the JSON payload of a model reply: the body of the first ```json
/// fence if there is one, the body of a bare ``` fence otherwise, then the
/// reply from its first `{` onwards when it opens with prose.
pub fn extract_json_block(raw: &str) -> Result<&str, MedAssistError> {
    let raw = raw.trim();

    if let Some((_, rest)) = raw.split_once("```json") {
        let body = rest.split("```").next().unwrap_or(rest);
        return Ok(body.trim());
    }

    if let Some(rest) = raw.strip_prefix("```") {
        let body = rest
            .strip_suffix("```")
            .ok_or_else(|| MedAssistError::MalformedModelReply(format!("unterminated code fence: {raw}")))?;
        return Ok(body.trim());
    }

    if raw.starts_with(['{', '[']) {
        return Ok(raw);
    }
    Ok(raw.find('{').map_or(raw, |start| &raw[start..]))
}

/// Parse a model reply as JSON, see [`extract_json_block`].
pub fn parse_model_json(raw: &str) -> Result<Value, MedAssistError> {
    let block = extract_json_block(raw)?;
    if block.is_empty() {
        return Err(MedAssistError::MalformedModelReply(
            "empty JSON response from model".into(),
        ));
    }
    // First complete value only; trailing prose after the object is ignored.
    let mut values = serde_json::Deserializer::from_str(block).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(MedAssistError::MalformedModelReply(format!("{e}: {block}"))),
        None => Err(MedAssistError::MalformedModelReply(format!("no JSON in reply: {block}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let v = parse_model_json(r#"  {"a": "1"} "#).unwrap();
        assert_eq!(v["a"], "1");
    }

    #[test]
    fn test_json_fence() {
        let raw = "Here you go:\n```json\n{\"lastName\": \"Cohen\"}\n```\nDone.";
        let v = parse_model_json(raw).unwrap();
        assert_eq!(v["lastName"], "Cohen");
    }

    #[test]
    fn test_bare_fence() {
        let v = parse_model_json("```\n[1, 2]\n```").unwrap();
        assert_eq!(v, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_object_inside_prose() {
        let raw = "Sure, here is the record: {\"lastName\": \"Cohen\", \"note\": \"a } b\"} Let me know if you need more.";
        let v = parse_model_json(raw).unwrap();
        assert_eq!(v["lastName"], "Cohen");
        assert_eq!(v["note"], "a } b");
    }

    #[test]
    fn test_prose_without_json() {
        assert!(matches!(
            parse_model_json("I could not read the form."),
            Err(MedAssistError::MalformedModelReply(_))
        ));
    }

    #[test]
    fn test_empty_reply() {
        assert!(matches!(
            parse_model_json("```json\n```"),
            Err(MedAssistError::MalformedModelReply(_))
        ));
        assert!(parse_model_json("   ").is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_model_json("{not json").unwrap_err();
        assert!(err.to_string().contains("malformed model reply"));
    }
}
