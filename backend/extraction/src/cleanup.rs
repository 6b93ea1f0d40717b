use once_cell::sync::Lazy;
use regex::Regex;

/// Digits split by `|` or a misread `l`, as OCR renders the boxed date fields.
static SPLIT_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)[|l]+(\d)").unwrap());

/// `dd mm yyyy` separated by whitespace.
static SPACED_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})\s+(\d{2})\s+(\d{4})").unwrap());

/// Repair numeric fields in raw OCR text: join digits separated by `|`/`l`
/// and turn spaced `dd mm yyyy` dates into `dd-mm-yyyy`.
pub fn clean_numeric_fields(text: &str) -> String {
    let mut joined = text.to_string();
    // Matches cannot overlap, so "1|2|3" needs a second pass.
    loop {
        let next = SPLIT_DIGITS_RE.replace_all(&joined, "${1}${2}").into_owned();
        if next == joined {
            break;
        }
        joined = next;
    }
    SPACED_DATE_RE.replace_all(&joined, "${1}-${2}-${3}").into_owned()
}
