//! Configuration and evaluation errors.
//!
//! [`HookError`] names the conditions a rule document can trigger. Rules
//! return them wrapped in [`anyhow::Error`]; callers that need to tell them
//! apart use `downcast_ref::<HookError>()`.

use std::fmt;
use svnhook_syntax::Span;

/// A rule or token failure that aborts the whole evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// A filter or action lacks a required sub-element.
    MissingTag { tag: String, span: Span },
    /// A required attribute is absent.
    MissingAttribute { node: String, attribute: String, span: Span },
    /// An attribute is present but its value is not acceptable.
    InvalidAttribute {
        node: String,
        attribute: String,
        value: String,
        span: Span,
    },
    /// The element's text content is required but empty.
    MissingText { node: String, span: Span },
    /// A predicate pattern does not compile.
    InvalidPattern { tag: String, message: String, span: Span },
    /// The element passed for execution is not a known rule.
    UnknownNode { node: String, span: Span },
    /// A rule looked up a token nobody set.
    TokenNotFound { name: String },
    /// Placeholder expansion kept producing new placeholders.
    DepthExceeded { text: String },
}

impl HookError {
    pub fn span(&self) -> Option<Span> {
        match self {
            HookError::MissingTag { span, .. }
            | HookError::MissingAttribute { span, .. }
            | HookError::InvalidAttribute { span, .. }
            | HookError::MissingText { span, .. }
            | HookError::InvalidPattern { span, .. }
            | HookError::UnknownNode { span, .. } => Some(*span),
            HookError::TokenNotFound { .. } | HookError::DepthExceeded { .. } => None,
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::MissingTag { tag, .. } => write!(f, "Required tag missing: {}", tag),
            HookError::MissingAttribute { node, attribute, .. } => {
                write!(f, "Required attribute missing: {} (in {})", attribute, node)
            }
            HookError::InvalidAttribute { node, attribute, value, .. } => {
                write!(f, "Not a valid {} for {}: {:?}", attribute, node, value)
            }
            HookError::MissingText { node, .. } => {
                write!(f, "Required tag content missing: {}", node)
            }
            HookError::InvalidPattern { tag, message, .. } => {
                write!(f, "Invalid pattern in {}: {}", tag, message)
            }
            HookError::UnknownNode { node, .. } => write!(f, "Unknown action or filter: {}", node),
            HookError::TokenNotFound { name } => write!(f, "Token not found: {}", name),
            HookError::DepthExceeded { text } => {
                write!(f, "Maximum token recursion depth exceeded: text = {:?}", text)
            }
        }
    }
}

impl std::error::Error for HookError {}

/// Return early with a [`HookError`] wrapped in [`anyhow::Error`].
///
/// ```ignore
/// bail_hook!(HookError::MissingText { node: "SendError".into(), span });
/// ```
#[macro_export]
macro_rules! bail_hook {
    ($err:expr) => {
        return Err(anyhow::anyhow!($err))
    };
}
