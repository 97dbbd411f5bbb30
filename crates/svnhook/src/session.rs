use anyhow::Result;
use std::path::{Path, PathBuf};
use svnhook_eval::{
    Config, EventKind, Executor, HookEvent, INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE, Tokens,
};
use svnhook_svn::RepoContext;
use svnhook_syntax::{ConfigNode, parse_file};
use tracing::{error, info, warn};

/// `<REPOS>/hooks/<event>.xml`, used when no document is named.
pub fn default_config_path(repository: &Path, kind: EventKind) -> PathBuf {
    repository.join("hooks").join(format!("{}.xml", kind.name()))
}

/// One hook invocation: the event and the rule document that governs it.
#[derive(Debug, Clone)]
pub struct Session {
    event: HookEvent,
    config_path: PathBuf,
    config: Config,
}

impl Session {
    pub fn new(event: HookEvent, config_path: impl Into<PathBuf>) -> Self {
        Self {
            event,
            config_path: config_path.into(),
            config: Config::default(),
        }
    }

    /// Builder: sets the runtime settings.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn event(&self) -> &HookEvent {
        &self.event
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A fact context that queries the event's repository with `svnlook`.
    pub fn repo_context(&self) -> RepoContext {
        let facts = RepoContext::new(&self.event.repository, self.event.subject.clone())
            .with_svnlook(self.config.svnlook.as_str())
            .with_svn(self.config.svn.as_str());
        match &self.event.user {
            Some(user) => facts.with_user(user.as_str()),
            None => facts,
        }
    }

    pub fn load_document(&self) -> Result<ConfigNode> {
        parse_file(&self.config_path)
    }

    /// Evaluates the rule document against the repository and returns the
    /// process exit code.
    pub fn run(&self) -> i32 {
        let facts = self.repo_context();
        let exec = Executor::new(&facts, &self.event).with_config(self.config.clone());
        self.run_with(&exec)
    }

    /// Like [`run`](Self::run) with a caller-supplied executor.
    pub fn run_with(&self, exec: &Executor<'_>) -> i32 {
        let root = match self.load_document() {
            Ok(root) => root,
            Err(err) => {
                error!(config = %self.config_path.display(), "{:#}", err);
                if let Err(err) = exec.write_stderr(&format!("{}\n", INTERNAL_ERROR_MESSAGE)) {
                    warn!("{:#}", err);
                }
                return INTERNAL_ERROR_CODE;
            }
        };

        info!(
            hook = %self.event.kind,
            repository = %self.event.repository.display(),
            config = %self.config_path.display(),
            "evaluating rules"
        );
        let mut tokens = self.event.initial_tokens(Tokens::from_env());
        let outcome = exec.run(&root, &mut tokens);
        let code = outcome.exit_code();
        info!(hook = %self.event.kind, code, "rules evaluated");
        code
    }
}
