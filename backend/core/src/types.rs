use std::fmt;

use serde::{Deserialize, Serialize};

/// Language of a document or user message. Only the two languages the
/// claim forms and the chatbot support are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Hebrew,
}

impl Language {
    /// Hebrew when at least a fifth of the alphabetic characters are Hebrew
    /// letters. Text with no letters at all is treated as English.
    pub fn detect(text: &str) -> Self {
        let mut letters = 0usize;
        let mut hebrew = 0usize;
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            if is_hebrew_letter(c) {
                hebrew += 1;
            }
        }
        if letters > 0 && hebrew * 5 >= letters {
            Language::Hebrew
        } else {
            Language::English
        }
    }
}

/// Hebrew block letters (U+05D0..=U+05EA), including final forms.
pub fn is_hebrew_letter(c: char) -> bool {
    ('\u{05D0}'..='\u{05EA}').contains(&c)
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Hebrew => write!(f, "hebrew"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_hebrew() {
        assert_eq!(Language::detect("שם משפחה: כהן"), Language::Hebrew);
        assert_eq!(Language::detect("טופס 283 form"), Language::Hebrew);
    }

    #[test]
    fn test_detect_english() {
        assert_eq!(Language::detect("Last name: Cohen"), Language::English);
        assert_eq!(Language::detect("12-05-1999"), Language::English);
        assert_eq!(Language::detect(""), Language::English);
    }

    #[test]
    fn test_display() {
        assert_eq!(Language::Hebrew.to_string(), "hebrew");
    }
}
