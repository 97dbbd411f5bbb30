//! # svnhook
//!
//! Declarative Subversion hooks. A hook script hands its arguments to a
//! [`HookEvent`], and a [`Session`] evaluates the XML rule document for that
//! event against the repository. The result is the exit code Subversion
//! expects.
//!
//! ```rust,no_run
//! use svnhook::prelude::*;
//!
//! let event = HookEvent::pre_commit("/srv/svn/repo", "12-a", "");
//! let code = Session::new(event, "/srv/svn/repo/hooks/pre-commit.xml").run();
//! std::process::exit(code);
//! ```

mod check;
mod session;

pub use check::{Problem, check_document};
pub use session::{Session, default_config_path};

pub use svnhook_eval::{
    Config, EventKind, Executor, HookError, HookEvent, INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE, Mail,
    Mailer, Outcome, Registry, SmtpMailer, Tokens,
};
pub use svnhook_svn::{FactContext, FactError, RepoContext, StaticFacts, Subject};
pub use svnhook_syntax::{ConfigNode, ParseError, Span, parse, parse_file};

pub mod prelude {
    pub use crate::{Config, EventKind, HookEvent, Session, check_document, default_config_path};
    pub use crate::{INTERNAL_ERROR_CODE, Outcome};
}
