/// Default maximum whitespace-separated tokens per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 150;

/// Split text into chunks of whole lines, each holding at most `max_tokens`
/// whitespace-separated tokens. A single line longer than the limit becomes
/// its own chunk. Blank lines are skipped and no empty chunk is produced.
pub fn chunk_text(raw_text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut token_count = 0usize;

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line_tokens = line.split_whitespace().count();
        if token_count + line_tokens > max_tokens && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            token_count = 0;
        }
        current.push(line);
        token_count += line_tokens;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packs_lines_until_limit() {
        let text = "one two three\nfour five\nsix seven eight nine";
        let chunks = chunk_text(text, 5);
        assert_eq!(chunks, vec!["one two three four five", "six seven eight nine"]);
    }

    #[test]
    fn test_long_line_stands_alone() {
        let text = "a b\nc d e f g h\ni";
        let chunks = chunk_text(text, 3);
        assert_eq!(chunks, vec!["a b", "c d e f g h", "i"]);
    }

    #[test]
    fn test_blank_input() {
        assert!(chunk_text("", 10).is_empty());
        assert!(chunk_text("\n  \n", 10).is_empty());
    }

    #[test]
    fn test_preserves_hebrew() {
        let chunks = chunk_text("מרפאת שיניים\nהנחה של 20%", DEFAULT_MAX_TOKENS);
        assert_eq!(chunks, vec!["מרפאת שיניים הנחה של 20%"]);
    }
}
