use medassist_core::ChatMessage;
use serde_json::Value;

use crate::schema::{english_template, hebrew_template};

const SYSTEM_PROMPT_HEAD: &str = "\
You are a data organization expert specializing in processing forms and extracting structured \
information about individuals. Your task is to take raw text data from an OCR system, analyze it, \
and organize the extracted information into a well-structured JSON format.

Input characteristics:
- The input is a raw text string containing information extracted from a form.
- The text may be in English or Hebrew.
- It contains fields related to personal information, addresses, and medical details.

Input OCR text may include errors such as:
- Dates with incorrect separators (e.g. '02 05 1999' or '02|05|1999' or '0 2 02 1 99 5').
- Numbers split by '|' or 'l'.";

const SYSTEM_PROMPT_RULES: &str = "\
Special considerations:
- Every phone number (home or mobile) must start with a 0; if you recognize another digit in the first place, make it 0.
- If a field is missing or cannot be extracted, leave it as an empty string in the JSON.
- Pay attention to the text language and make sure the matching structure is used.
- Extract the day, month and year of every date separately.
- All dates in this form are written as dd/mm/yyyy, so \"0\" cannot be a day.
- A date may appear as \"ddmm yyy y\", \"d dmm yy y y\", \"d  d m m y y y y\" or any other spacing of dd-mm-yyyy. Only the order matters.
- \"healthFundMember\" (\"חבר בקופת חולים\") must only be extracted from section 5 of the form.
- A landline phone (טלפון קווי) never starts with \"05\". A number starting with \"05\" is a mobile number (טלפון נייד).

The output MUST follow these guidelines:
- Normalize dates into the format DD-MM-YYYY.
- Combine numbers split by '|' or 'l'.
- Follow the JSON structure above exactly.
- Return only the JSON object.";

const USER_PREFIX: &str = "Extract the text from the data, following the above guidelines: ";

/// OCR text of the worked example shown to the model before the real form.
pub const FEW_SHOT_OCR: &str = "\
המוסד לביטוח לאומי
בקשה למתן טיפול רפואי לנפגע עבודה - עצמאי
טופס 283
1. פרטי התובע
שם משפחה שם פרטי ת.ז.
לוי יעל 0|3|4|5|6|7|8|9|1
מין נקבה
תאריך לידה 14 07 1985
כתובת רחוב / תא דואר הרצל מספר בית 12 כניסה א דירה 4 ישוב חיפה מיקוד 3303112
טלפון קווי 048123456 טלפון נייד 0521234567
2. פרטי התאונה
תאריך הפגיעה 03 02 2023 שעת הפגיעה 09:30
כאשר עבדתי ב: מוסך
מקום התאונה: במפעל
כתובת מקום התאונה: העצמאות 5 חיפה
נסיבות הפגיעה / תאור התאונה: החלקתי על שמן ונפלתי
האיבר שנפגע: יד שמאל
שם המבקש יעל לוי חתימה X
תאריך מילוי הטופס 05 02 2023
תאריך קבלת הטופס בקופה 06 02 2023
5. למילוי ע\"י המוסד הרפואי
חבר בקופת חולים מכבי
מהות התאונה (אבחנות רפואיות): שבר בשורש כף היד";

/// The record expected for [`FEW_SHOT_OCR`].
pub fn few_shot_record() -> Value {
    serde_json::json!({
        "שם משפחה": "לוי",
        "שם פרטי": "יעל",
        "מספר זהות": "034567891",
        "מין": "נקבה",
        "תאריך לידה": { "יום": "14", "חודש": "07", "שנה": "1985" },
        "כתובת": {
            "רחוב": "הרצל",
            "מספר בית": "12",
            "כניסה": "א",
            "דירה": "4",
            "ישוב": "חיפה",
            "מיקוד": "3303112",
            "תא דואר": ""
        },
        "טלפון קווי": "048123456",
        "טלפון נייד": "0521234567",
        "סוג העבודה": "מוסך",
        "תאריך הפגיעה": { "יום": "03", "חודש": "02", "שנה": "2023" },
        "שעת הפגיעה": "09:30",
        "מקום התאונה": "במפעל",
        "כתובת מקום התאונה": "העצמאות 5 חיפה",
        "תיאור התאונה": "החלקתי על שמן ונפלתי",
        "האיבר שנפגע": "יד שמאל",
        "חתימה": "X",
        "תאריך מילוי הטופס": { "יום": "05", "חודש": "02", "שנה": "2023" },
        "תאריך קבלת הטופס בקופה": { "יום": "06", "חודש": "02", "שנה": "2023" },
        "למילוי ע\"י המוסד הרפואי": {
            "חבר בקופת חולים": "מכבי",
            "מהות התאונה": "",
            "אבחנות רפואיות": "שבר בשורש כף היד"
        }
    })
}

pub fn system_prompt() -> String {
    let english = serde_json::to_string_pretty(&english_template()).unwrap_or_default();
    let hebrew = serde_json::to_string_pretty(&hebrew_template()).unwrap_or_default();
    format!(
        "{SYSTEM_PROMPT_HEAD}\n\n\
         If the input text is in English, produce JSON in the following structure:\n{english}\n\n\
         If the input text is in Hebrew, produce JSON in the following structure:\n{hebrew}\n\n\
         {SYSTEM_PROMPT_RULES}"
    )
}

/// System prompt, one worked example, then the form to extract.
pub fn build_extraction_messages(ocr_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt()),
        ChatMessage::user(format!("{USER_PREFIX}{FEW_SHOT_OCR}")),
        ChatMessage::assistant(few_shot_record().to_string()),
        ChatMessage::user(format!("{USER_PREFIX}{ocr_text}")),
    ]
}
