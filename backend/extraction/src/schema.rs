//! The fixed output schema of form 283 in both languages.
//!
//! Every leaf is a string; missing fields are `""`.

use medassist_core::Language;
use serde_json::{json, Map, Value};

use crate::validation::normalize_keys;

pub fn english_template() -> Value {
    json!({
        "lastName": "",
        "firstName": "",
        "idNumber": "",
        "gender": "",
        "dateOfBirth": { "day": "", "month": "", "year": "" },
        "address": {
            "street": "",
            "houseNumber": "",
            "entrance": "",
            "apartment": "",
            "city": "",
            "postalCode": "",
            "poBox": ""
        },
        "landlinePhone": "",
        "mobilePhone": "",
        "jobType": "",
        "dateOfInjury": { "day": "", "month": "", "year": "" },
        "timeOfInjury": "",
        "accidentLocation": "",
        "accidentAddress": "",
        "accidentDescription": "",
        "injuredBodyPart": "",
        "signature": "",
        "formFillingDate": { "day": "", "month": "", "year": "" },
        "formReceiptDateAtClinic": { "day": "", "month": "", "year": "" },
        "medicalInstitutionFields": {
            "healthFundMember": "",
            "natureOfAccident": "",
            "medicalDiagnoses": ""
        }
    })
}

pub fn hebrew_template() -> Value {
    json!({
        "שם משפחה": "",
        "שם פרטי": "",
        "מספר זהות": "",
        "מין": "",
        "תאריך לידה": { "יום": "", "חודש": "", "שנה": "" },
        "כתובת": {
            "רחוב": "",
            "מספר בית": "",
            "כניסה": "",
            "דירה": "",
            "ישוב": "",
            "מיקוד": "",
            "תא דואר": ""
        },
        "טלפון קווי": "",
        "טלפון נייד": "",
        "סוג העבודה": "",
        "תאריך הפגיעה": { "יום": "", "חודש": "", "שנה": "" },
        "שעת הפגיעה": "",
        "מקום התאונה": "",
        "כתובת מקום התאונה": "",
        "תיאור התאונה": "",
        "האיבר שנפגע": "",
        "חתימה": "",
        "תאריך מילוי הטופס": { "יום": "", "חודש": "", "שנה": "" },
        "תאריך קבלת הטופס בקופה": { "יום": "", "חודש": "", "שנה": "" },
        "למילוי ע\"י המוסד הרפואי": {
            "חבר בקופת חולים": "",
            "מהות התאונה": "",
            "אבחנות רפואיות": ""
        }
    })
}

pub fn template(language: Language) -> Value {
    match language {
        Language::English => english_template(),
        Language::Hebrew => hebrew_template(),
    }
}

/// Guess which template a model reply follows by counting matching top-level
/// keys. `None` when neither template matches better.
pub fn detect_record_language(record: &Value) -> Option<Language> {
    let Value::Object(map) = record else {
        return None;
    };
    let hits = |tpl: Value| match tpl {
        Value::Object(t) => map.keys().filter(|k| t.contains_key(k.as_str())).count(),
        _ => 0,
    };
    let english = hits(english_template());
    let hebrew = hits(hebrew_template());
    match english.cmp(&hebrew) {
        std::cmp::Ordering::Greater => Some(Language::English),
        std::cmp::Ordering::Less => Some(Language::Hebrew),
        std::cmp::Ordering::Equal => None,
    }
}

/// Reshape a model reply to exactly follow `template`: missing fields become
/// `""`, non-string leaves are stringified, and keys the template does not
/// know are kept after the known ones.
pub fn conform_to_template(record: &Value, template: &Value) -> Value {
    conform(&normalize_keys(record), template)
}

fn conform(value: &Value, template: &Value) -> Value {
    match template {
        Value::Object(fields) => {
            let source = value.as_object();
            let mut out = Map::new();
            for (key, sub_template) in fields {
                let sub_value = source.and_then(|s| s.get(key)).unwrap_or(&Value::Null);
                out.insert(key.clone(), conform(sub_value, sub_template));
            }
            if let Some(source) = source {
                for (key, extra) in source {
                    if !fields.contains_key(key) {
                        out.insert(key.clone(), stringify_leaves(extra));
                    }
                }
            }
            out.into()
        }
        _ => Value::String(leaf_string(value)),
    }
}

fn leaf_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
    }
}

fn stringify_leaves(value: &Value) -> Value {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), stringify_leaves(v)))
            .collect::<Map<_, _>>()
            .into(),
        other => Value::String(leaf_string(other)),
    }
}
