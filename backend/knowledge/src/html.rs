//! Plain-text extraction from the health-fund service pages.
//!
//! Keeps headings, paragraphs and list items in document order, then appends
//! every table row as `cell | cell | ...`.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(h2|h3|p|li)\b[^>]*>(.*?)</(?:h2|h3|p|li)\s*>").unwrap()
});

static TABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").unwrap());

static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").unwrap());

static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<t[dh]\b[^>]*>(.*?)</t[dh]\s*>").unwrap());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").unwrap()
});

/// Extract readable text from an HTML page, one block per line.
pub fn extract_raw_text(html: &str) -> String {
    let html = SCRIPT_RE.replace_all(html, " ");
    let mut lines = Vec::new();

    for caps in BLOCK_RE.captures_iter(&html) {
        let text = inner_text(&caps[2]);
        if !text.is_empty() {
            lines.push(text);
        }
    }

    for table in TABLE_RE.captures_iter(&html) {
        for row in ROW_RE.captures_iter(&table[1]) {
            let cells: Vec<String> = CELL_RE
                .captures_iter(&row[1])
                .map(|c| inner_text(&c[1]))
                .filter(|c| !c.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }
    }

    lines.join("\n")
}

/// Strip tags, decode entities and collapse whitespace.
fn inner_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
