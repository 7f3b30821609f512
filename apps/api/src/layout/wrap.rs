//! Greedy word wrap with a mid-token fallback.
//!
//! Words are packed onto a line until the next one would overflow `max_width`.
//! A word that is wider than a whole line on its own is split at character
//! boundaries instead of overflowing or being truncated. Every emitted line
//! carries at least one character, so wrapping always terminates.

/// Wraps `text` into lines no wider than `max_width`, as measured by `measure`.
///
/// Explicit newlines start a new paragraph; an empty paragraph yields an
/// empty line. Runs of whitespace inside a paragraph collapse to one space.
/// Callers must pass a strictly positive `max_width`.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let space_width = measure(" ");
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut words = paragraph.split_whitespace().peekable();
        if words.peek().is_none() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in words {
            let word_width = measure(word);

            if !current.is_empty() && current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space_width + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                let mut pieces = break_word(word, max_width, &measure);
                // The tail of a broken word may share its line with what follows.
                let tail = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current_width = measure(&tail);
                current = tail;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Splits a single token into chunks that each fit `max_width`. A glyph wider
/// than the line still gets a chunk of its own.
fn break_word<F>(word: &str, max_width: f32, measure: &F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_width = 0.0_f32;
    let mut buf = [0u8; 4];

    for ch in word.chars() {
        let ch_width = measure(ch.encode_utf8(&mut buf));
        if !piece.is_empty() && piece_width + ch_width > max_width {
            pieces.push(std::mem::take(&mut piece));
            piece_width = 0.0;
        }
        piece.push(ch);
        piece_width += ch_width;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 1 unit wide, so widths equal char counts.
    fn mono(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap_text("Python, Docker", 40.0, mono), vec!["Python, Docker"]);
    }

    #[test]
    fn test_greedy_wrap_breaks_on_whitespace() {
        let lines = wrap_text("aaa bbb ccc ddd", 7.0, mono);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_word_exactly_line_width_fits() {
        assert_eq!(wrap_text("abcde", 5.0, mono), vec!["abcde"]);
    }

    #[test]
    fn test_long_token_is_broken_mid_word() {
        let token = "a".repeat(500);
        let lines = wrap_text(&token, 80.0, mono);
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| mono(l) <= 80.0));
        assert_eq!(lines.concat(), token);
    }

    #[test]
    fn test_tail_of_broken_word_shares_line_with_next_word() {
        let lines = wrap_text("abcdefgh ij", 5.0, mono);
        assert_eq!(lines, vec!["abcde", "fgh", "ij"]);
        let lines = wrap_text("abcdefg ij", 6.0, mono);
        assert_eq!(lines, vec!["abcdef", "g ij"]);
    }

    #[test]
    fn test_long_token_after_words_starts_fresh_line() {
        let lines = wrap_text("hi abcdefghij", 4.0, mono);
        assert_eq!(lines, vec!["hi", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_glyph_wider_than_line_still_progresses() {
        let lines = wrap_text("xyz", 0.5, mono);
        assert_eq!(lines, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_newlines_start_paragraphs() {
        let lines = wrap_text("first line\n\nthird", 40.0, mono);
        assert_eq!(lines, vec!["first line", "", "third"]);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(wrap_text("a \t  b", 40.0, mono), vec!["a b"]);
    }

    #[test]
    fn test_cyrillic_is_split_on_char_boundaries() {
        let word = "Ж".repeat(10);
        let lines = wrap_text(&word, 4.0, mono);
        assert_eq!(lines, vec!["ЖЖЖЖ", "ЖЖЖЖ", "ЖЖ"]);
    }

    #[test]
    fn test_words_preserve_order() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap_text(text, 10.0, mono);
        assert_eq!(lines.join(" "), text);
    }
}
