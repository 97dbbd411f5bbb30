use std::fmt;

/// Renders `error_msg` under the offending line of `source`, with one line of
/// context on either side and a caret at the reported column.
pub fn format_error_with_source(error_msg: &str, source: &str, span: Span) -> String {
    let lines: Vec<&str> = source.lines().collect();

    let line_idx = span.line.saturating_sub(1);

    if line_idx >= lines.len() {
        return format!("{} at line {}", error_msg, span.line);
    }

    let line_num = span.line;

    let mut output = String::new();
    output.push_str(&format!("  --> line {}:{}\n", line_num, span.col));
    output.push_str("   |\n");

    if line_idx > 0 {
        output.push_str(&format!(" {} | {}\n", line_num - 1, lines[line_idx - 1]));
    }

    output.push_str(&format!(" {} | {}\n", line_num, lines[line_idx]));

    output.push_str(&format!(
        "   | {}^ {}\n",
        " ".repeat(span.col.saturating_sub(1)),
        error_msg
    ));

    if line_idx + 1 < lines.len() {
        output.push_str(&format!(" {} | {}\n", line_num + 1, lines[line_idx + 1]));
    }

    output.push_str("   |");

    output
}

/// Location of a node or error inside the configuration document.
///
/// `line` and `col` are 1-based; `start`/`end` are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, start: usize, end: usize) -> Self {
        Self { line, col, start, end }
    }

    pub fn point(line: usize, col: usize) -> Self {
        Self { line, col, start: 0, end: 0 }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// Errors raised while turning a document into a [`ConfigNode`](crate::ConfigNode) tree.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// The document is not well-formed XML.
    Malformed { message: String, span: Span },
    /// The document has no root element to execute.
    Empty,
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Malformed { span, .. } => Some(*span),
            ParseError::Empty => None,
        }
    }

    /// Formats the error with a source excerpt when a location is known.
    pub fn render(&self, source: &str) -> String {
        match self.span() {
            Some(span) => format!(
                "{}\n{}",
                self,
                format_error_with_source(&self.to_string(), source, span)
            ),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed { message, .. } => {
                write!(f, "malformed configuration: {}", message)
            }
            ParseError::Empty => write!(f, "configuration document has no root element"),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_points_at_column() {
        let source = "<Actions>\n  <SendError>\n</Actions>";
        let out = format_error_with_source("mismatched tag", source, Span::point(3, 3));
        assert!(out.contains("--> line 3:3"));
        assert!(out.contains(" 2 |   <SendError>"));
        assert!(out.contains("   |   ^ mismatched tag"));
    }

    #[test]
    fn test_format_error_past_end() {
        let out = format_error_with_source("boom", "<a/>", Span::point(9, 1));
        assert_eq!(out, "boom at line 9");
    }

    #[test]
    fn test_empty_has_no_span() {
        assert!(ParseError::Empty.span().is_none());
        assert_eq!(
            ParseError::Empty.render("anything"),
            "configuration document has no root element"
        );
    }
}
