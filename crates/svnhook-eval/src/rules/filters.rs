//! Built-in filters.
//!
//! Every constructor here has the registry's `Constructor` signature. A
//! filter reads its pattern elements up front and lists them as consumed so
//! they are never dispatched as children.

use super::{Bindings, Filter, Predicate, Rule, bool_attr};
use crate::bail_hook;
use crate::error::HookError;
use crate::event::EventKind;
use crate::executor::Executor;
use crate::predicate::{RegexTag, parse_sense};
use crate::tokens::Tokens;
use anyhow::Result;
use svnhook_svn::{FactError, is_folder_path};
use svnhook_syntax::ConfigNode;

fn matched(bindings: Bindings) -> Vec<Bindings> {
    vec![bindings]
}

fn when(condition: bool, bindings: Bindings) -> Vec<Bindings> {
    if condition { vec![bindings] } else { Vec::new() }
}

/// Reads at least one of two optional pattern elements.
fn either(
    node: &ConfigNode,
    first: (&'static str, bool),
    second: (&'static str, bool),
) -> Result<(Option<RegexTag>, Option<RegexTag>)> {
    let a = RegexTag::optional(node, first.0, first.1)?;
    let b = RegexTag::optional(node, second.0, second.1)?;
    if a.is_none() && b.is_none() {
        bail_hook!(HookError::MissingTag {
            tag: format!("{} or {}", first.0, second.0),
            span: node.span(),
        });
    }
    Ok((a, b))
}

fn test(tag: &Option<RegexTag>, text: &str) -> bool {
    tag.as_ref().is_none_or(|t| t.is_match(text))
}

fn require_event(exec: &Executor<'_>, kinds: &[EventKind], fact: &'static str) -> Result<()> {
    if kinds.contains(&exec.event().kind) {
        Ok(())
    } else {
        Err(FactError::Unavailable { fact }.into())
    }
}

/// The root `<Actions>` element: runs its children unconditionally.
struct Always;

impl Predicate for Always {
    fn select(&self, _exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        Ok(matched(Vec::new()))
    }
}

pub fn group(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Filter::boxed(node, Always, &[])
}

/// Matches a token's value against one pattern element.
struct TokenMatch {
    token: &'static str,
    regex: RegexTag,
}

impl Predicate for TokenMatch {
    fn select(&self, _exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>> {
        let value = tokens.get(self.token)?;
        Ok(when(self.regex.is_match(value), Vec::new()))
    }
}

fn token_filter(
    node: &ConfigNode,
    token: &'static str,
    tag: &'static [&'static str],
    ignore_case: bool,
) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, tag[0], ignore_case)?;
    Filter::boxed(node, TokenMatch { token, regex }, tag)
}

pub fn user(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    token_filter(node, "User", &["UserRegex"], true)
}

pub fn capabilities(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    token_filter(node, "Capabilities", &["CapabilitiesRegex"], false)
}

pub fn comment(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    token_filter(node, "Comment", &["CommentRegex"], false)
}

pub fn path(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    token_filter(node, "Path", &["PathRegex"], false)
}

pub fn change_type(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    token_filter(node, "Action", &["ChgTypeRegex"], true)
}

struct Author(RegexTag);

impl Predicate for Author {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        let author = exec.facts().author()?;
        Ok(when(self.0.is_match(author), vec![("Author", author.to_string())]))
    }
}

pub fn author(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, "AuthorRegex", true)?;
    Filter::boxed(node, Author(regex), &["AuthorRegex"])
}

struct LogMsg(RegexTag);

impl Predicate for LogMsg {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        let message = exec.facts().log_message()?;
        Ok(when(self.0.is_match(message), vec![("LogMsg", message.to_string())]))
    }
}

pub fn log_message(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, "LogMsgRegex", false)?;
    Filter::boxed(node, LogMsg(regex), &["LogMsgRegex"])
}

/// Changed paths of the revision or transaction.
struct CommitList {
    path: Option<RegexTag>,
    change_type: Option<RegexTag>,
}

impl Predicate for CommitList {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        Ok(exec
            .facts()
            .changes()?
            .iter()
            .filter(|c| test(&self.path, c.path()) && test(&self.change_type, c.change_type()))
            .map(|c| {
                vec![
                    ("ChgPath", c.path().to_string()),
                    ("ChgType", c.change_type().to_string()),
                    ("Path", c.path().to_string()),
                ]
            })
            .collect())
    }
}

pub fn commit_list(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let (path, change_type) = either(node, ("PathRegex", false), ("ChgTypeRegex", true))?;
    Filter::boxed(node, CommitList { path, change_type }, &["PathRegex", "ChgTypeRegex"])
}

/// Content of the file named by the `Path` token. Folders never match.
struct FileContent(RegexTag);

impl Predicate for FileContent {
    fn select(&self, exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>> {
        let path = tokens.get("Path")?;
        if is_folder_path(path) {
            return Ok(Vec::new());
        }
        let content = exec.facts().file_content(path)?;
        Ok(when(self.0.is_match(&content), Vec::new()))
    }
}

pub fn file_content(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, "ContentRegex", false)?;
    Filter::boxed(node, FileContent(regex), &["ContentRegex"])
}

/// Added paths whose name differs only in case from a sibling entry.
///
/// Replaced paths are skipped.
struct AddNameCase;

impl Predicate for AddNameCase {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        let mut conflicts = Vec::new();
        for change in exec.facts().changes()? {
            if !change.is_add() || change.is_replaced() {
                continue;
            }
            let path = change.path().trim_end_matches('/');
            let (folder, added) = path.rsplit_once('/').unwrap_or(("", path));
            for entry in exec.facts().folder_entries(folder)?.iter() {
                let existing = entry.trim_end_matches('/');
                if existing != added && existing.eq_ignore_ascii_case(added) {
                    conflicts.push(vec![
                        ("Folder", format!("/{}", folder)),
                        ("Existing", existing.to_string()),
                        ("Added", added.to_string()),
                        ("Path", change.path().to_string()),
                    ]);
                }
            }
        }
        Ok(conflicts)
    }
}

pub fn add_name_case(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Filter::boxed(node, AddNameCase, &[])
}

/// Versioned properties of the path named by the `Path` token.
struct PropList {
    name: Option<RegexTag>,
    value: Option<RegexTag>,
}

impl Predicate for PropList {
    fn select(&self, exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>> {
        let path = tokens.get("Path")?;
        Ok(exec
            .facts()
            .properties(path)?
            .iter()
            .filter(|(name, value)| test(&self.name, name) && test(&self.value, value))
            .map(|(name, value)| vec![("PropName", name.clone()), ("PropValue", value.clone())])
            .collect())
    }
}

pub fn prop_list(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let (name, value) = either(node, ("PropNameRegex", false), ("PropValueRegex", false))?;
    Filter::boxed(node, PropList { name, value }, &["PropNameRegex", "PropValueRegex"])
}

/// The revision property being changed.
struct RevProp {
    name: Option<RegexTag>,
    value: Option<RegexTag>,
}

impl Predicate for RevProp {
    fn select(&self, exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>> {
        let name = tokens.get("PropName")?;
        let Some(value) = exec.event().prop_value.as_deref() else {
            return Err(FactError::Unavailable { fact: "revision property value" }.into());
        };
        Ok(when(
            test(&self.name, name) && test(&self.value, value),
            vec![("PropValue", value.to_string())],
        ))
    }
}

pub fn rev_prop(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let (name, value) = either(node, ("PropNameRegex", false), ("PropValueRegex", false))?;
    Filter::boxed(node, RevProp { name, value }, &["PropNameRegex", "PropValueRegex"])
}

/// Paths reported on standard input after a lock or unlock.
struct PathList(RegexTag);

impl Predicate for PathList {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        require_event(exec, &[EventKind::PostLock, EventKind::PostUnlock], "lock path list")?;
        Ok(exec
            .event()
            .paths
            .iter()
            .filter(|p| self.0.is_match(p))
            .map(|p| vec![("Path", p.clone())])
            .collect())
    }
}

pub fn path_list(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, "PathRegex", false)?;
    Filter::boxed(node, PathList(regex), &["PathRegex"])
}

/// Lock tokens presented with a commit or unlock.
struct LockTokens(RegexTag);

impl Predicate for LockTokens {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        require_event(exec, &[EventKind::PreCommit, EventKind::PreUnlock], "lock token")?;
        Ok(exec
            .event()
            .lock_tokens
            .iter()
            .filter(|lock| self.0.is_match(&lock.token))
            .map(|lock| vec![("LockToken", lock.token.clone()), ("Path", lock.path.clone())])
            .collect())
    }
}

pub fn lock_token(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let regex = RegexTag::required(node, "LockTokenRegex", false)?;
    Filter::boxed(node, LockTokens(regex), &["LockTokenRegex"])
}

/// Whether the current user already owns the lock on `Path`.
struct LockOwner {
    sense: bool,
}

impl Predicate for LockOwner {
    fn select(&self, exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>> {
        let path = tokens.get("Path")?;
        let user = tokens.get("User")?;
        let Some(owner) = exec.facts().lock_owner(path)? else {
            return Ok(Vec::new());
        };
        Ok(when((owner == user) == self.sense, vec![("LockOwner", owner)]))
    }
}

pub fn lock_owner(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let sense = parse_sense(node.attr("sense"));
    Filter::boxed(node, LockOwner { sense }, &[])
}

/// A boolean event flag compared against the filter's `sense`.
struct Flag {
    read: fn(&Executor<'_>) -> Option<bool>,
    fact: &'static str,
    sense: bool,
}

impl Predicate for Flag {
    fn select(&self, exec: &Executor<'_>, _tokens: &Tokens) -> Result<Vec<Bindings>> {
        match (self.read)(exec) {
            Some(flag) => Ok(when(flag == self.sense, Vec::new())),
            None => Err(FactError::Unavailable { fact: self.fact }.into()),
        }
    }
}

pub fn steal_lock(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let flag = Flag {
        read: |exec| exec.event().steal,
        fact: "steal-lock flag",
        sense: bool_attr(node, "sense", true),
    };
    Filter::boxed(node, flag, &[])
}

pub fn break_unlock(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let flag = Flag {
        read: |exec| exec.event().break_unlock,
        fact: "break-unlock flag",
        sense: bool_attr(node, "sense", true),
    };
    Filter::boxed(node, flag, &[])
}
