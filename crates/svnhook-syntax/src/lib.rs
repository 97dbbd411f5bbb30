//! # svnhook-syntax
//!
//! Configuration document model for svnhook.
//!
//! A rule document is plain XML. Its root element (conventionally
//! `<Actions>`) holds filters and actions; element names select the rule,
//! attributes configure it and text carries messages, patterns and command
//! lines:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <Actions>
//!   <FilterAuthor>
//!     <AuthorRegex sense="false">^(alice|bob)$</AuthorRegex>
//!     <SendError>Commits by ${Author} are not accepted.</SendError>
//!   </FilterAuthor>
//! </Actions>
//! ```
//!
//! Parsing produces an owned [`ConfigNode`] tree. Nothing here interprets
//! element names; that is the job of `svnhook-eval`.
//!
//! ```rust
//! use svnhook_syntax::parse;
//!
//! let root = parse("<Actions><SendError>stop</SendError></Actions>").unwrap();
//! assert_eq!(root.name(), "Actions");
//! assert_eq!(root.children()[0].text(), Some("stop"));
//! ```

pub mod error;
pub mod node;
pub mod parser;

pub use error::{ParseError, Span, format_error_with_source};
pub use node::ConfigNode;
pub use parser::{parse, parse_file};
