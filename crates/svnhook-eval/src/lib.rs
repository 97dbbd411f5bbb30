//! # svnhook-eval
//!
//! Rule interpreter for svnhook.
//!
//! A parsed rule document is walked depth first. Every element is looked up
//! in the [`Registry`] and turned into a rule: filters evaluate a predicate
//! against the event and run their children once per match, actions produce
//! side effects (an error message, a mail, a command) and an exit code.
//!
//! Tokens (`${Name}`) carry facts down the tree. Filters bind what they
//! matched into a child scope, so bindings never leak to siblings.

mod config;
pub mod error;
mod event;
mod executor;
mod mail;
mod outcome;
mod predicate;
mod registry;
pub mod rules;
mod text;
mod tokens;

pub use config::Config;
pub use error::HookError;
pub use event::{EventKind, HookEvent, LockToken, parse_lock_tokens};
pub use executor::Executor;
pub use mail::{Mail, Mailer, SmtpMailer};
pub use outcome::{INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE, Outcome};
pub use predicate::RegexTag;
pub use registry::{Constructor, Registry};
pub use text::dedent;
pub use tokens::Tokens;
