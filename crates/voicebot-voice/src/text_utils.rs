//! Text helpers for answer streaming.

/// Split text into alternating word and whitespace runs.
///
/// Whitespace runs are kept as their own fragments so that concatenating the
/// result reproduces `text` exactly. Empty input yields no fragments.
#[must_use]
pub fn split_preserving_whitespace(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != is_space => {
                parts.push(text[start..i].to_owned());
                start = i;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }

    if start < text.len() {
        parts.push(text[start..].to_owned());
    }
    parts
}

/// Join a new final transcript segment onto an accumulated buffer.
///
/// Segments are space-joined and the result is trimmed.
#[must_use]
pub fn append_segment(buffer: &str, segment: &str) -> String {
    format!("{buffer} {segment}").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_whitespace_runs() {
        let parts = split_preserving_whitespace("Hello  world\n\nbye");
        assert_eq!(parts, vec!["Hello", "  ", "world", "\n\n", "bye"]);
    }

    #[test]
    fn split_round_trips_leading_and_trailing_space() {
        let text = "  padded text ";
        let parts = split_preserving_whitespace(text);
        assert_eq!(parts.first().map(String::as_str), Some("  "));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn split_empty_yields_nothing() {
        assert!(split_preserving_whitespace("").is_empty());
    }

    #[test]
    fn split_handles_multibyte_text() {
        let parts = split_preserving_whitespace("Dijiste: “¿qué tal?”");
        assert_eq!(parts, vec!["Dijiste:", " ", "“¿qué", " ", "tal?”"]);
    }

    #[test]
    fn segments_are_space_joined() {
        assert_eq!(append_segment("", "hello"), "hello");
        assert_eq!(append_segment("hello", "world "), "hello world");
        assert_eq!(append_segment("hello", ""), "hello");
    }
}
