//! In-memory [`FactContext`] for tests and dry runs.

use crate::change::{ChangeItem, ChangeParser};
use crate::context::{FactContext, Properties, Subject};
use crate::error::FactError;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A [`FactContext`] whose answers are fixed up front.
///
/// Facts that were never provided are reported as unavailable.
#[derive(Debug, Clone)]
pub struct StaticFacts {
    repository: PathBuf,
    subject: Subject,
    user: Option<String>,
    author: Option<String>,
    log_message: Option<String>,
    changes: Option<Vec<ChangeItem>>,
    contents: HashMap<String, Rc<str>>,
    properties: HashMap<String, Rc<Properties>>,
    locks: HashMap<String, String>,
    revision_log: Option<String>,
    entries: HashMap<String, Rc<Vec<String>>>,
}

impl StaticFacts {
    pub fn new(repository: impl Into<PathBuf>, subject: Subject) -> Self {
        Self {
            repository: repository.into(),
            subject,
            user: None,
            author: None,
            log_message: None,
            changes: None,
            contents: HashMap::new(),
            properties: HashMap::new(),
            locks: HashMap::new(),
            revision_log: None,
            entries: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_log_message(mut self, message: impl Into<String>) -> Self {
        self.log_message = Some(message.into());
        self
    }

    /// Builder: sets the change list from raw `svnlook changed` output.
    pub fn with_listing(mut self, listing: &str) -> Self {
        self.changes = Some(ChangeParser::new().parse_listing(listing));
        self
    }

    pub fn with_content(mut self, path: impl Into<String>, content: &str) -> Self {
        self.contents.insert(path.into(), Rc::from(content));
        self
    }

    pub fn with_property(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let entry = self.properties.entry(path.into()).or_default();
        Rc::make_mut(entry).push((name.into(), value.into()));
        self
    }

    pub fn with_lock(mut self, path: impl Into<String>, owner: impl Into<String>) -> Self {
        self.locks.insert(path.into(), owner.into());
        self
    }

    pub fn with_revision_log(mut self, log: impl Into<String>) -> Self {
        self.revision_log = Some(log.into());
        self
    }

    /// Builder: sets the listing of `folder`, as [`FactContext::folder_entries`] returns it.
    pub fn with_entries(mut self, folder: &str, names: &[&str]) -> Self {
        let names = names.iter().map(|name| name.to_string()).collect();
        self.entries
            .insert(folder.trim_matches('/').to_string(), Rc::new(names));
        self
    }
}

impl FactContext for StaticFacts {
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
            .as_deref()
            .ok_or_else(|| FactError::Unavailable { fact: "author" }.into())
    }

    fn log_message(&self) -> Result<&str> {
        self.log_message
            .as_deref()
            .ok_or_else(|| FactError::Unavailable { fact: "log message" }.into())
    }

    fn changes(&self) -> Result<&[ChangeItem]> {
        self.changes
            .as_deref()
            .ok_or_else(|| FactError::Unavailable { fact: "change list" }.into())
    }

    fn file_content(&self, path: &str) -> Result<Rc<str>> {
        Ok(self.contents.get(path).cloned().unwrap_or_else(|| Rc::from("")))
    }

    fn properties(&self, path: &str) -> Result<Rc<Properties>> {
        Ok(self.properties.get(path).cloned().unwrap_or_default())
    }

    fn lock_owner(&self, path: &str) -> Result<Option<String>> {
        Ok(self.locks.get(path).cloned())
    }

    fn revision_log(&self, _verbose: bool) -> Result<String> {
        match (&self.subject, &self.revision_log) {
            (Subject::Revision(_), Some(log)) => Ok(log.clone()),
            _ => Err(FactError::Unavailable { fact: "revision log" }.into()),
        }
    }

    fn folder_entries(&self, folder: &str) -> Result<Rc<Vec<String>>> {
        Ok(self
            .entries
            .get(folder.trim_matches('/'))
            .cloned()
            .unwrap_or_default())
    }
}
