//! Message text preparation.

/// Strips leading line breaks and removes the indentation shared by all
/// non-blank lines. Whitespace-only lines become empty; everything else,
/// including the final line break, is kept.
///
/// Lets messages be indented inside the rule document:
///
/// ```xml
/// <SendError>
///   Commit rejected.
///     Please add a log message.
/// </SendError>
/// ```
pub fn dedent(text: &str) -> String {
    let text = text.trim_start_matches(['\n', '\r']);

    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .reduce(common_prefix)
        .unwrap_or("");

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        let ending = &line[body.len()..];
        if !body.trim().is_empty() {
            out.push_str(body.strip_prefix(margin).unwrap_or(body));
        }
        out.push_str(ending);
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((idx, ch), _)| idx + ch.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(dedent("I feel joy!"), "I feel joy!");
    }

    #[test]
    fn test_indented_block() {
        let text = "\n      Commit rejected.\n        Add a log message.\n    ";
        assert_eq!(dedent(text), "Commit rejected.\n  Add a log message.\n");
    }

    #[test]
    fn test_blank_lines_ignored_for_margin() {
        let text = "\n    one\n\n    two\n";
        assert_eq!(dedent(text), "one\n\ntwo\n");
    }

    #[test]
    fn test_mixed_indent_keeps_common_prefix() {
        let text = "\t  a\n\t b";
        assert_eq!(dedent(text), " a\nb");
    }

    #[test]
    fn test_trailing_text_whitespace_kept() {
        assert_eq!(dedent("  done.  "), "done.  ");
        assert_eq!(dedent("  a\r\n  b\r\n"), "a\r\nb\r\n");
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix("    ", "  \t"), "  ");
        assert_eq!(common_prefix("", "  "), "");
    }
}
