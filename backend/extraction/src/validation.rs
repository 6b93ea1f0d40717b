//! Scoring of extracted records: field-by-field diff against a ground-truth
//! file, or completeness and format checks when no ground truth exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Replace the Hebrew gershayim and single quotes in object keys with `"`,
/// recursively. Values are left untouched.
pub fn normalize_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.replace('״', "\"").replace('\'', "\""), normalize_keys(v)))
            .collect::<Map<_, _>>()
            .into(),
        Value::Array(items) => Value::Array(items.iter().map(normalize_keys).collect()),
        other => other.clone(),
    }
}

/// Flatten nested objects into dotted paths. Arrays and scalars are leaves;
/// empty objects contribute nothing. A non-object root yields an empty map.
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = value {
        flatten_into(map, "", &mut out);
    }
    out
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match value {
            Value::Object(inner) => flatten_into(inner, &path, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Rebuild nested objects from dotted paths. When a path runs through an
/// existing leaf, the leaf is replaced by an object.
pub fn unflatten(flat: &BTreeMap<String, Value>) -> Value {
    let mut root = Map::new();
    for (path, value) in flat {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };
        let mut node = &mut root;
        for segment in segments {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(inner) => inner,
                _ => unreachable!("entry was just made an object"),
            };
        }
        node.insert(last.to_string(), value.clone());
    }
    Value::Object(root)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchedField {
    pub expected: Value,
    pub actual: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthReport {
    pub accuracy: f64,
    pub completeness: f64,
    pub missing_fields: Vec<String>,
    pub mismatched_fields: BTreeMap<String, MismatchedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicReport {
    pub completeness: f64,
    pub missing_fields: Vec<String>,
    pub invalid_fields: BTreeMap<String, String>,
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Compare every ground-truth leaf with the extracted value at the same path.
/// A path absent from the extraction counts as missing and compares as `""`.
pub fn validate_with_ground_truth(extracted: &Value, ground_truth: &Value) -> GroundTruthReport {
    let flat_extracted = flatten(&normalize_keys(extracted));
    let flat_truth = flatten(&normalize_keys(ground_truth));
    let empty = Value::String(String::new());

    let mut correct = 0usize;
    let mut missing_fields = Vec::new();
    let mut mismatched_fields = BTreeMap::new();

    for (path, expected) in &flat_truth {
        let actual = match flat_extracted.get(path) {
            Some(v) => v,
            None => {
                missing_fields.push(path.clone());
                &empty
            }
        };
        if actual == expected {
            correct += 1;
        } else {
            mismatched_fields.insert(
                path.clone(),
                MismatchedField { expected: expected.clone(), actual: actual.clone() },
            );
        }
    }

    let total = flat_truth.len();
    GroundTruthReport {
        accuracy: percentage(correct, total),
        completeness: percentage(total - missing_fields.len(), total),
        missing_fields,
        mismatched_fields,
    }
}

/// Key completeness against `reference` plus plausibility checks on dates,
/// ID numbers and mobile phones. Empty values are not checked.
pub fn validate_dynamic(extracted: &Value, reference: &Value) -> DynamicReport {
    let flat_extracted = flatten(&normalize_keys(extracted));
    let reference_paths: Vec<String> = flatten(&normalize_keys(reference)).into_keys().collect();

    let missing_fields: Vec<String> = reference_paths
        .iter()
        .filter(|p| !flat_extracted.contains_key(*p))
        .cloned()
        .collect();

    let mut invalid_fields = BTreeMap::new();
    for (path, value) in &flat_extracted {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }
        if let Some(reason) = check_field(path, &text) {
            invalid_fields.insert(path.clone(), reason.to_string());
        }
    }

    DynamicReport {
        completeness: percentage(reference_paths.len() - missing_fields.len(), reference_paths.len()),
        missing_fields,
        invalid_fields,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn check_field(path: &str, value: &str) -> Option<&'static str> {
    let last = path.rsplit('.').next().unwrap_or(path);
    let in_date = path.contains("תאריך") || path.to_lowercase().contains("date");

    if in_date {
        let is_day = matches!(last, "יום" | "day");
        let is_month = matches!(last, "חודש" | "month");
        if is_day || is_month {
            let number = if is_digits(value) { value.parse::<u64>().ok() } else { None };
            return match number {
                None | Some(0) => Some("Invalid day or month value"),
                Some(n) if is_month && n > 12 => Some("Invalid month value"),
                Some(n) if is_day && n > 31 => Some("Invalid day value"),
                Some(_) => None,
            };
        }
        if matches!(last, "שנה" | "year") && !(is_digits(value) && value.len() == 4) {
            return Some("Invalid year value");
        }
        return None;
    }

    match last {
        "מספר זהות" | "idNumber" if !(is_digits(value) && value.len() == 9) => Some("Invalid ID number"),
        "טלפון נייד" | "mobilePhone" if !(is_digits(value) && matches!(value.len(), 9 | 10)) => {
            Some("Invalid phone number")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_and_unflatten() {
        let record = json!({
            "lastName": "Cohen",
            "dateOfBirth": { "day": "02", "month": "05", "year": "1999" },
            "tags": ["a", "b"]
        });
        let flat = flatten(&record);
        assert_eq!(flat.len(), 5);
        assert_eq!(flat["dateOfBirth.month"], "05");
        assert_eq!(flat["tags"], json!(["a", "b"]));
        assert_eq!(unflatten(&flat), record);
    }

    #[test]
    fn test_flatten_skips_empty_objects() {
        let flat = flatten(&json!({ "a": {}, "b": { "c": {} }, "d": "" }));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["d"]);
        assert!(flatten(&json!("scalar")).is_empty());
    }

    #[test]
    fn test_unflatten_path_through_leaf() {
        let mut flat = BTreeMap::new();
        flat.insert("a".to_string(), json!("leaf"));
        flat.insert("a.b".to_string(), json!("x"));
        assert_eq!(unflatten(&flat), json!({ "a": { "b": "x" } }));
    }

    #[test]
    fn test_normalize_keys() {
        let value = json!({ "ע״י": { "it's": [ { "x'y": 1 } ] } });
        assert_eq!(normalize_keys(&value), json!({ "ע\"י": { "it\"s": [ { "x\"y": 1 } ] } }));
    }

    #[test]
    fn test_ground_truth_perfect_match() {
        let gt = json!({ "שם משפחה": "כהן", "תאריך לידה": { "יום": "02" } });
        let report = validate_with_ground_truth(&gt, &gt);
        assert_eq!(report.accuracy, 100.0);
        assert_eq!(report.completeness, 100.0);
        assert!(report.missing_fields.is_empty());
        assert!(report.mismatched_fields.is_empty());
    }

    #[test]
    fn test_ground_truth_mismatch_and_missing() {
        let gt = json!({ "a": "1", "b": "2", "c": { "d": "3" }, "e": "" });
        let extracted = json!({ "a": "1", "b": "X", "e": "" });
        let report = validate_with_ground_truth(&extracted, &gt);

        assert_eq!(report.accuracy, 50.0);
        assert_eq!(report.completeness, 75.0);
        assert_eq!(report.missing_fields, vec!["c.d"]);
        assert_eq!(
            report.mismatched_fields["b"],
            MismatchedField { expected: json!("2"), actual: json!("X") }
        );
        assert_eq!(report.mismatched_fields["c.d"].actual, json!(""));
        assert_eq!(report.mismatched_fields.len(), 2);
    }

    #[test]
    fn test_ground_truth_missing_empty_field_still_matches() {
        let report = validate_with_ground_truth(&json!({}), &json!({ "a": "" }));
        assert_eq!(report.accuracy, 100.0);
        assert_eq!(report.completeness, 0.0);
        assert_eq!(report.missing_fields, vec!["a"]);
    }

    #[test]
    fn test_ground_truth_empty() {
        let report = validate_with_ground_truth(&json!({ "a": "1" }), &json!({}));
        assert_eq!(report.accuracy, 100.0);
        assert_eq!(report.completeness, 100.0);
    }

    #[test]
    fn test_dynamic_hebrew_checks() {
        let reference = json!({
            "מספר זהות": "",
            "טלפון נייד": "",
            "תאריך לידה": { "יום": "", "חודש": "", "שנה": "" },
            "מין": ""
        });
        let extracted = json!({
            "מספר זהות": "12345",
            "טלפון נייד": "0501234567",
            "תאריך לידה": { "יום": "0", "חודש": "13", "שנה": "99" }
        });
        let report = validate_dynamic(&extracted, &reference);

        assert!((report.completeness - 500.0 / 6.0).abs() < 1e-9);
        assert_eq!(report.missing_fields, vec!["מין"]);
        assert_eq!(report.invalid_fields["מספר זהות"], "Invalid ID number");
        assert_eq!(report.invalid_fields["תאריך לידה.יום"], "Invalid day or month value");
        assert_eq!(report.invalid_fields["תאריך לידה.חודש"], "Invalid month value");
        assert_eq!(report.invalid_fields["תאריך לידה.שנה"], "Invalid year value");
        assert!(!report.invalid_fields.contains_key("טלפון נייד"));
    }

    #[test]
    fn test_dynamic_english_checks() {
        let extracted = json!({
            "idNumber": "123456789",
            "mobilePhone": "05-123",
            "dateOfInjury": { "day": "32", "month": "ab", "year": "2024" },
            "landlinePhone": ""
        });
        let report = validate_dynamic(&extracted, &extracted);

        assert_eq!(report.completeness, 100.0);
        assert_eq!(report.invalid_fields.len(), 3);
        assert_eq!(report.invalid_fields["mobilePhone"], "Invalid phone number");
        assert_eq!(report.invalid_fields["dateOfInjury.day"], "Invalid day value");
        assert_eq!(report.invalid_fields["dateOfInjury.month"], "Invalid day or month value");
    }

    #[test]
    fn test_dynamic_skips_empty_values() {
        let extracted = json!({ "idNumber": "", "dateOfBirth": { "year": "  " } });
        assert!(validate_dynamic(&extracted, &json!({})).invalid_fields.is_empty());
    }
}
