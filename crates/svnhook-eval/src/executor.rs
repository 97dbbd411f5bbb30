//! Tree-walking evaluator for rule documents.
//!
//! Each element goes through construct, evaluate and propagate. Children run
//! in document order and the first non-zero outcome stops the walk. Errors
//! are logged where they happen and travel upward as
//! [`Outcome::Internal`].

use crate::config::Config;
use crate::error::HookError;
use crate::event::HookEvent;
use crate::mail::{Mailer, SmtpMailer};
use crate::outcome::{INTERNAL_ERROR_MESSAGE, Outcome};
use crate::registry::{Constructor, Registry};
use crate::tokens::Tokens;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::io::Write;
use svnhook_svn::FactContext;
use svnhook_syntax::ConfigNode;
use tracing::{debug, error, warn};

/// Evaluates rule elements against one event.
///
/// Create an `Executor`, optionally configure it with the `with_*` builders,
/// then call [`run`](Executor::run) on the document root.
pub struct Executor<'a> {
    facts: &'a dyn FactContext,
    event: &'a HookEvent,
    config: Config,
    registry: Registry,
    mailer: Box<dyn Mailer + 'a>,
    stderr: RefCell<Box<dyn Write + 'a>>,
}

impl<'a> Executor<'a> {
    /// Creates an executor that mails through SMTP and reports to the
    /// process stderr.
    pub fn new(facts: &'a dyn FactContext, event: &'a HookEvent) -> Self {
        Self {
            facts,
            event,
            config: Config::default(),
            registry: Registry::new(),
            mailer: Box::new(SmtpMailer),
            stderr: RefCell::new(Box::new(std::io::stderr())),
        }
    }

    /// Builder: sets the runtime configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_mailer(mut self, mailer: impl Mailer + 'a) -> Self {
        self.mailer = Box::new(mailer);
        self
    }

    /// Builder: redirects client-visible messages.
    pub fn with_stderr(mut self, sink: impl Write + 'a) -> Self {
        self.stderr = RefCell::new(Box::new(sink));
        self
    }

    pub fn facts(&self) -> &dyn FactContext {
        self.facts
    }

    pub fn event(&self) -> &HookEvent {
        self.event
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// Writes text the Subversion client will see.
    pub fn write_stderr(&self, text: &str) -> Result<()> {
        let mut sink = self.stderr.borrow_mut();
        sink.write_all(text.as_bytes())
            .and_then(|_| sink.flush())
            .context("Failed to write to stderr")
    }

    /// Evaluates the document root and tells the client about internal errors.
    pub fn run(&self, root: &ConfigNode, tokens: &mut Tokens) -> Outcome {
        let outcome = self.execute(root, tokens);
        if outcome.is_internal() {
            if let Err(err) = self.write_stderr(&format!("{}\n", INTERNAL_ERROR_MESSAGE)) {
                warn!("{:#}", err);
            }
        }
        outcome
    }

    /// Evaluates `node` itself. Unlike a child, an unknown `node` is a
    /// configuration error.
    pub fn execute(&self, node: &ConfigNode, tokens: &mut Tokens) -> Outcome {
        match self.registry.lookup(node.name()) {
            Some(constructor) => self.dispatch(constructor, node, tokens),
            None => self.fail(
                node,
                anyhow::anyhow!(HookError::UnknownNode {
                    node: node.name().to_string(),
                    span: node.span(),
                }),
            ),
        }
    }

    /// Evaluates `children` in order, skipping parameter elements, and stops
    /// at the first outcome that is not `0`.
    pub fn execute_children<'n>(
        &self,
        children: impl IntoIterator<Item = &'n ConfigNode>,
        tokens: &mut Tokens,
    ) -> Outcome {
        for child in children {
            let Some(constructor) = self.registry.lookup(child.name()) else {
                debug!(node = child.name(), "skipping parameter element");
                continue;
            };
            let outcome = self.dispatch(constructor, child, tokens);
            if outcome.should_stop() {
                return outcome;
            }
        }
        Outcome::ok()
    }

    fn dispatch(&self, constructor: Constructor, node: &ConfigNode, tokens: &mut Tokens) -> Outcome {
        debug!(node = node.name(), line = node.span().line, "evaluating");
        match constructor(node).and_then(|rule| rule.run(node, self, tokens)) {
            Ok(outcome) => outcome,
            Err(err) => self.fail(node, err),
        }
    }

    fn fail(&self, node: &ConfigNode, err: anyhow::Error) -> Outcome {
        error!(
            node = node.name(),
            line = node.span().line,
            column = node.span().col,
            "{:#}",
            err
        );
        Outcome::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::INTERNAL_ERROR_CODE;
    use crate::rules::Rule;
    use svnhook_svn::{StaticFacts, Subject};

    fn facts() -> StaticFacts {
        StaticFacts::new("/srv/repo", Subject::Youngest).with_user("alice")
    }

    fn event() -> HookEvent {
        HookEvent::start_commit("/srv/repo", "alice", "mergeinfo")
    }

    fn send_error(code: &str, text: &str) -> ConfigNode {
        ConfigNode::new("SendError").with_attr("exitCode", code).with_text(text)
    }

    #[test]
    fn test_children_stop_at_first_failure() {
        let facts = facts();
        let event = event();
        let root = ConfigNode::new("Actions")
            .with_child(ConfigNode::new("SetToken").with_attr("name", "a").with_text("1"))
            .with_child(send_error("3", "first"))
            .with_child(send_error("4", "second"));

        let mut stderr = Vec::new();
        let outcome = {
            let exec = Executor::new(&facts, &event).with_stderr(&mut stderr);
            exec.run(&root, &mut Tokens::new())
        };
        assert_eq!(outcome.exit_code(), 3);
        assert_eq!(String::from_utf8(stderr).unwrap(), "first");
    }

    #[test]
    fn test_unknown_root_is_internal() {
        let facts = facts();
        let event = event();
        let mut stderr = Vec::new();
        let outcome = {
            let exec = Executor::new(&facts, &event).with_stderr(&mut stderr);
            exec.run(&ConfigNode::new("Bogus"), &mut Tokens::new())
        };
        assert!(outcome.is_internal());
        assert_eq!(outcome.exit_code(), INTERNAL_ERROR_CODE);
        assert!(matches!(
            outcome.error().and_then(|e| e.downcast_ref::<HookError>()),
            Some(HookError::UnknownNode { node, .. }) if node == "Bogus"
        ));
        assert_eq!(String::from_utf8(stderr).unwrap(), format!("{}\n", INTERNAL_ERROR_MESSAGE));
    }

    #[test]
    fn test_unknown_children_are_skipped() {
        let facts = facts();
        let event = event();
        let root = ConfigNode::new("Actions")
            .with_child(ConfigNode::new("Note").with_text("ignored"))
            .with_child(send_error("2", "reached"));
        let exec = Executor::new(&facts, &event).with_stderr(std::io::sink());
        assert_eq!(exec.run(&root, &mut Tokens::new()).exit_code(), 2);
    }

    #[test]
    fn test_set_token_visible_to_later_siblings() {
        let facts = facts();
        let event = event();
        let root = ConfigNode::new("Actions")
            .with_child(ConfigNode::new("SetToken").with_attr("name", "who").with_text("bob"))
            .with_child(send_error("5", "hello ${who}"));

        let mut stderr = Vec::new();
        let mut tokens = Tokens::new();
        {
            let exec = Executor::new(&facts, &event).with_stderr(&mut stderr);
            exec.run(&root, &mut tokens);
        }
        assert_eq!(String::from_utf8(stderr).unwrap(), "hello bob");
        // The root filter works on a copy.
        assert!(!tokens.contains("who"));
    }

    struct Exit(i32);

    impl Rule for Exit {
        fn run(&self, _node: &ConfigNode, _exec: &Executor<'_>, _tokens: &mut Tokens) -> Result<Outcome> {
            Ok(Outcome::Code(self.0))
        }
    }

    fn exit_nine(_node: &ConfigNode) -> Result<Box<dyn Rule>> {
        Ok(Box::new(Exit(9)))
    }

    #[test]
    fn test_extension_rule() {
        let facts = facts();
        let event = event();
        let registry = Registry::new().with_extension("ExitNine", exit_nine);
        let exec = Executor::new(&facts, &event)
            .with_registry(registry)
            .with_stderr(std::io::sink());
        let root = ConfigNode::new("Actions").with_child(ConfigNode::new("ExitNine"));
        assert_eq!(exec.run(&root, &mut Tokens::new()).exit_code(), 9);
    }

    #[test]
    fn test_construction_error_is_internal() {
        let facts = facts();
        let event = event();
        let root = ConfigNode::new("Actions").with_child(ConfigNode::new("SetToken").with_text("x"));
        let exec = Executor::new(&facts, &event).with_stderr(std::io::sink());
        let outcome = exec.run(&root, &mut Tokens::new());
        assert!(outcome.is_internal());
        assert!(outcome.error().unwrap().to_string().contains("Required attribute missing: name"));
    }
}
