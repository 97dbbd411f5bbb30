//! Repository facts for one hook event.
//!
//! [`RepoContext`] answers questions about the repository by running
//! `svnlook` (and `svn log` for the formatted revision log). Every answer is
//! computed at most once per context.

use crate::change::{ChangeItem, ChangeParser};
use crate::error::FactError;
use crate::runner::{Output, ProcessRunner, Runner, command_line};
use anyhow::Result;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Versioned properties of one path, in `svnlook proplist` order.
pub type Properties = Vec<(String, String)>;

/// What the facts are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// No revision reference; queries see the youngest revision.
    Youngest,
    /// An already committed revision.
    Revision(u64),
    /// A pending transaction.
    Transaction(String),
}

impl Subject {
    /// The `svnlook` option selecting this subject.
    pub fn qualifier(&self) -> Vec<String> {
        match self {
            Subject::Youngest => Vec::new(),
            Subject::Revision(rev) => vec!["-r".to_string(), rev.to_string()],
            Subject::Transaction(txn) => vec!["-t".to_string(), txn.clone()],
        }
    }

    pub fn revision(&self) -> Option<u64> {
        match self {
            Subject::Revision(rev) => Some(*rev),
            _ => None,
        }
    }

    pub fn transaction(&self) -> Option<&str> {
        match self {
            Subject::Transaction(txn) => Some(txn),
            _ => None,
        }
    }
}

/// Read-only view of the repository facts a rule may ask for.
pub trait FactContext {
    fn repository(&self) -> &Path;

    fn subject(&self) -> &Subject;

    /// The acting user, when the event names one.
    fn user(&self) -> Option<&str>;

    fn author(&self) -> Result<&str>;

    fn log_message(&self) -> Result<&str>;

    /// Changed paths, in listing order.
    fn changes(&self) -> Result<&[ChangeItem]>;

    fn file_content(&self, path: &str) -> Result<Rc<str>>;

    fn properties(&self, path: &str) -> Result<Rc<Properties>>;

    /// Owner of the lock on `path`, or `None` when it is not locked.
    fn lock_owner(&self, path: &str) -> Result<Option<String>>;

    /// The `svn log` entry of the revision. Only revisions have one.
    fn revision_log(&self, verbose: bool) -> Result<String>;

    /// Names directly inside `folder` (`""` is the root). Folder names keep
    /// their trailing `/`.
    fn folder_entries(&self, folder: &str) -> Result<Rc<Vec<String>>>;
}

/// Converts a repository path into a `file://` URL.
pub fn repository_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    }
}

/// [`FactContext`] backed by `svnlook`.
pub struct RepoContext {
    repository: PathBuf,
    subject: Subject,
    user: Option<String>,
    svnlook: String,
    svn: String,
    runner: Box<dyn Runner>,
    parser: ChangeParser,
    author: OnceCell<String>,
    log_message: OnceCell<String>,
    changes: OnceCell<Vec<ChangeItem>>,
    properties: RefCell<HashMap<String, Rc<Properties>>>,
    locks: RefCell<HashMap<String, Option<String>>>,
    contents: RefCell<HashMap<String, Rc<str>>>,
    entries: RefCell<HashMap<String, Rc<Vec<String>>>>,
}

impl RepoContext {
    pub fn new(repository: impl Into<PathBuf>, subject: Subject) -> Self {
        Self {
            repository: repository.into(),
            subject,
            user: None,
            svnlook: "svnlook".to_string(),
            svn: "svn".to_string(),
            runner: Box::new(ProcessRunner),
            parser: ChangeParser::new(),
            author: OnceCell::new(),
            log_message: OnceCell::new(),
            changes: OnceCell::new(),
            properties: RefCell::new(HashMap::new()),
            locks: RefCell::new(HashMap::new()),
            contents: RefCell::new(HashMap::new()),
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder: program used for `svnlook` queries.
    pub fn with_svnlook(mut self, program: impl Into<String>) -> Self {
        self.svnlook = program.into();
        self
    }

    /// Builder: program used for `svn log`.
    pub fn with_svn(mut self, program: impl Into<String>) -> Self {
        self.svn = program.into();
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn Runner>) -> Self {
        self.runner = runner;
        self
    }

    fn repos_arg(&self) -> String {
        self.repository.to_string_lossy().into_owned()
    }

    fn capture(&self, program: &str, args: Vec<String>) -> Result<String> {
        let line = command_line(program, &args);
        debug!(command = %line, "running repository query");

        let Output { code, stdout, stderr } = self.runner.run(program, &args)?;
        if code != Some(0) {
            return Err(FactError::QueryFailed {
                command: line,
                code,
                stderr: stderr.trim().to_string(),
            }
            .into());
        }
        Ok(stdout)
    }

    /// Runs `svnlook <subcommand> REPOS [extra..] [qualifier]`.
    fn svnlook(&self, subcommand: &str, extra: &[&str], qualified: bool) -> Result<String> {
        let mut args = vec![subcommand.to_string(), self.repos_arg()];
        args.extend(extra.iter().map(|s| s.to_string()));
        if qualified {
            args.extend(self.subject.qualifier());
        }
        self.capture(&self.svnlook, args)
    }
}

impl FactContext for RepoContext {
    fn repository(&self) -> &Path {
        &self.repository
    }

    fn subject(&self) -> &Subject {
        &self.subject
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn author(&self) -> Result<&str> {
        self.author
            .get_or_try_init(|| -> Result<String> {
                Ok(self.svnlook("author", &[], true)?.trim().to_string())
            })
            .map(String::as_str)
    }

    fn log_message(&self) -> Result<&str> {
        self.log_message
            .get_or_try_init(|| -> Result<String> {
                Ok(self.svnlook("log", &[], true)?.trim().to_string())
            })
            .map(String::as_str)
    }

    fn changes(&self) -> Result<&[ChangeItem]> {
        if self.subject == Subject::Youngest {
            return Err(FactError::Unavailable { fact: "change list" }.into());
        }
        self.changes
            .get_or_try_init(|| -> Result<Vec<ChangeItem>> {
                let listing = self.svnlook("changed", &[], true)?;
                Ok(self.parser.parse_listing(&listing))
            })
            .map(Vec::as_slice)
    }

    fn file_content(&self, path: &str) -> Result<Rc<str>> {
        if let Some(content) = self.contents.borrow().get(path) {
            return Ok(Rc::clone(content));
        }
        let content: Rc<str> = Rc::from(self.svnlook("cat", &[path], true)?.trim());
        self.contents
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&content));
        Ok(content)
    }

    fn properties(&self, path: &str) -> Result<Rc<Properties>> {
        if let Some(props) = self.properties.borrow().get(path) {
            return Ok(Rc::clone(props));
        }

        let listing = self.svnlook("proplist", &[path], true)?;
        let mut props = Properties::new();
        for name in listing.lines().map(str::trim).filter(|n| !n.is_empty()) {
            let value = self.svnlook("propget", &[name, path], true)?;
            props.push((name.to_string(), value.trim().to_string()));
        }

        let props = Rc::new(props);
        self.properties
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&props));
        Ok(props)
    }

    fn lock_owner(&self, path: &str) -> Result<Option<String>> {
        if let Some(owner) = self.locks.borrow().get(path) {
            return Ok(owner.clone());
        }

        let description = self.svnlook("lock", &[path], false)?;
        let owner = description
            .lines()
            .find_map(|line| line.strip_prefix("Owner:"))
            .map(|owner| owner.trim().to_string())
            .filter(|owner| !owner.is_empty());

        self.locks
            .borrow_mut()
            .insert(path.to_string(), owner.clone());
        Ok(owner)
    }

    fn revision_log(&self, verbose: bool) -> Result<String> {
        let Some(rev) = self.subject.revision() else {
            return Err(FactError::Unavailable { fact: "revision log" }.into());
        };

        let mut args = vec![
            "log".to_string(),
            repository_url(&self.repository),
            "-r".to_string(),
            rev.to_string(),
        ];
        if verbose {
            args.push("--verbose".to_string());
        }
        self.capture(&self.svn, args)
    }

    fn folder_entries(&self, folder: &str) -> Result<Rc<Vec<String>>> {
        let folder = folder.trim_matches('/');
        if let Some(entries) = self.entries.borrow().get(folder) {
            return Ok(Rc::clone(entries));
        }

        let mut extra = vec!["--non-recursive"];
        if !folder.is_empty() {
            extra.insert(0, folder);
        }
        let tree = self.svnlook("tree", &extra, true)?;
        // The first line names the folder itself; entries are indented by one.
        let entries: Vec<String> = tree
            .lines()
            .skip(1)
            .filter_map(|line| line.strip_prefix(' '))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        let entries = Rc::new(entries);
        self.entries
            .borrow_mut()
            .insert(folder.to_string(), Rc::clone(&entries));
        Ok(entries)
    }
}
