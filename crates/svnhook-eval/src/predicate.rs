//! Pattern sub-elements that gate filters (`<AuthorRegex>`, `<PathRegex>`, ...).

use crate::bail_hook;
use crate::error::HookError;
use anyhow::Result;
use regex::{Regex, RegexBuilder};
use svnhook_syntax::ConfigNode;

/// A compiled `<...Regex sense="...">pattern</...Regex>` element.
///
/// Matching is an unanchored search. A false `sense` inverts the result.
#[derive(Debug, Clone)]
pub struct RegexTag {
    tag: &'static str,
    regex: Regex,
    sense: bool,
}

impl RegexTag {
    /// Reads the first `tag` child of `node`, if present.
    pub fn optional(node: &ConfigNode, tag: &'static str, ignore_case: bool) -> Result<Option<Self>> {
        let Some(child) = node.child(tag) else {
            return Ok(None);
        };

        let pattern = match child.text() {
            Some(text) if !text.is_empty() => text,
            _ => bail_hook!(HookError::MissingText {
                node: tag.to_string(),
                span: child.span(),
            }),
        };

        let regex = match RegexBuilder::new(pattern).case_insensitive(ignore_case).build() {
            Ok(regex) => regex,
            Err(e) => bail_hook!(HookError::InvalidPattern {
                tag: tag.to_string(),
                message: e.to_string(),
                span: child.span(),
            }),
        };

        Ok(Some(Self {
            tag,
            regex,
            sense: parse_sense(child.attr("sense")),
        }))
    }

    /// Like [`optional`](Self::optional) but a missing element is an error.
    pub fn required(node: &ConfigNode, tag: &'static str, ignore_case: bool) -> Result<Self> {
        match Self::optional(node, tag, ignore_case)? {
            Some(regex) => Ok(regex),
            None => bail_hook!(HookError::MissingTag {
                tag: tag.to_string(),
                span: node.span(),
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn sense(&self) -> bool {
        self.sense
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text) == self.sense
    }
}

/// Interprets a `sense` attribute. Absent means `true`; anything other than
/// `1`, `true` or `yes` (any case) means `false`.
pub fn parse_sense(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => parse_bool(v),
    }
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(tag: ConfigNode) -> ConfigNode {
        ConfigNode::new("FilterAuthor").with_child(tag)
    }

    #[test]
    fn test_unanchored_search() {
        let node = filter_with(ConfigNode::new("AuthorRegex").with_text("user"));
        let tag = RegexTag::required(&node, "AuthorRegex", false).unwrap();
        assert!(tag.is_match("the-userA"));
        assert!(!tag.is_match("admin"));
    }

    #[test]
    fn test_sense_inverts() {
        let node = filter_with(ConfigNode::new("AuthorRegex").with_attr("sense", "no").with_text("^userA$"));
        let tag = RegexTag::required(&node, "AuthorRegex", false).unwrap();
        assert!(!tag.sense());
        assert!(!tag.is_match("userA"));
        assert!(tag.is_match("userB"));
    }

    #[test]
    fn test_ignore_case() {
        let node = filter_with(ConfigNode::new("AuthorRegex").with_text("^usera$"));
        assert!(RegexTag::required(&node, "AuthorRegex", true).unwrap().is_match("UserA"));
        assert!(!RegexTag::required(&node, "AuthorRegex", false).unwrap().is_match("UserA"));
    }

    #[test]
    fn test_parse_sense() {
        assert!(parse_sense(None));
        for yes in ["1", "true", "TRUE", "Yes", " yes "] {
            assert!(parse_sense(Some(yes)), "{yes}");
        }
        for no in ["0", "false", "no", "", "truely"] {
            assert!(!parse_sense(Some(no)), "{no}");
        }
    }

    #[test]
    fn test_missing_tag() {
        let node = ConfigNode::new("FilterAuthor");
        assert!(RegexTag::optional(&node, "AuthorRegex", false).unwrap().is_none());
        let err = RegexTag::required(&node, "AuthorRegex", false).unwrap_err();
        assert_eq!(err.to_string(), "Required tag missing: AuthorRegex");
    }

    #[test]
    fn test_empty_pattern() {
        let node = filter_with(ConfigNode::new("AuthorRegex"));
        let err = RegexTag::optional(&node, "AuthorRegex", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HookError>(),
            Some(HookError::MissingText { .. })
        ));
    }

    #[test]
    fn test_bad_pattern() {
        let node = filter_with(ConfigNode::new("AuthorRegex").with_text("(unclosed"));
        let err = RegexTag::optional(&node, "AuthorRegex", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HookError>(),
            Some(HookError::InvalidPattern { .. })
        ));
    }
}
