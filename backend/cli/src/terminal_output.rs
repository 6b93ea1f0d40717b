//! Terminal output: status notes and the small tables used for validation
//! reports.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Colour only when `NO_COLOR` is unset and the terminal is not dumb.
pub fn supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false)
}

fn note(color: &str, symbol: &str, plain: &str, msg: &str) -> String {
    if supports_color() {
        format!("{color}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{plain}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    println!("{}", note(CYAN, "ℹ", "INFO", msg));
}

pub fn note_warn(msg: &str) {
    println!("{}", note(YELLOW, "⚠", "WARN", msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note(RED, "✗", "ERROR", msg));
}

pub fn note_success(msg: &str) {
    println!("{}", note(GREEN, "✓", "OK", msg));
}

pub fn heading(title: &str) {
    if supports_color() {
        println!("\n{BOLD}{title}{RESET}");
    } else {
        println!("\n{title}");
    }
}

/// Left-aligned columns, two spaces apart. Widths count characters, so
/// Hebrew cells line up with Latin ones.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell}{}", " ".repeat(width - cell.chars().count())))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.to_vec());
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rules.iter().map(String::as_str).collect()));
    for row in rows {
        let cells = (0..headers.len()).map(|i| row.get(i).map(String::as_str).unwrap_or("")).collect();
        out.push_str(&line(cells));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aligned_table() {
        let rows = vec![
            vec!["lastName".to_string(), "Smith".to_string()],
            vec!["שם".to_string(), "כהן".to_string()],
        ];
        let table = render_table(&["Field", "Value"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "  Field     Value");
        assert_eq!(lines[1], "  --------  -----");
        assert_eq!(lines[2], "  lastName  Smith");
        assert_eq!(lines[3], "  שם        כהן");
    }

    #[test]
    fn short_rows_are_padded() {
        let table = render_table(&["A", "B"], &[vec!["x".to_string()]]);
        assert_eq!(table.lines().nth(2), Some("  x"));
    }
}
