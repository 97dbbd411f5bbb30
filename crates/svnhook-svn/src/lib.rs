//! # svnhook-svn
//!
//! Subversion integration for svnhook.
//!
//! ## Overview
//!
//! - **Fact context**: [`FactContext`] is the read-only surface rules use to
//!   ask about the event (author, log message, changed paths, file content,
//!   properties, locks). [`RepoContext`] implements it with `svnlook`.
//! - **Subjects**: a context is bound to one [`Subject`]; the youngest
//!   revision, a committed revision (`-r`) or a pending transaction (`-t`).
//! - **Change parsing**: [`ChangeParser`] splits `svnlook changed` lines and
//!   flags paths that were replaced within one listing.
//!
//! ## Caching
//!
//! Every fact is fetched at most once per context. Per-path facts (file
//! contents, properties, lock owners, folder listings) are kept for the
//! lifetime of the context.
//!
//! ## Example
//!
//! ```rust,no_run
//! use svnhook_svn::{FactContext, RepoContext, Subject};
//!
//! let facts = RepoContext::new("/srv/svn/repo", Subject::Transaction("12-a".into()));
//! for change in facts.changes().unwrap() {
//!     println!("{} {}", change.change_type(), change.path());
//! }
//! ```

pub mod change;
pub mod context;
pub mod error;
pub mod memory;
pub mod runner;

pub use change::{ChangeItem, ChangeParser, is_folder_path};
pub use context::{FactContext, Properties, RepoContext, Subject, repository_url};
pub use error::FactError;
pub use memory::StaticFacts;
pub use runner::{Output, ProcessRunner, Runner};
