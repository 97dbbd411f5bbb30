//! Hook events and the facts Subversion passes to them.
//!
//! Each event kind has its own positional arguments and, for some, data on
//! standard input. [`HookEvent`] keeps them together and seeds the initial
//! token context.

use crate::tokens::Tokens;
use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use svnhook_svn::{Subject, repository_url};

/// The repository lifecycle action that triggered the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartCommit,
    PreCommit,
    PostCommit,
    PreRevpropChange,
    PostRevpropChange,
    PreLock,
    PostLock,
    PreUnlock,
    PostUnlock,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::StartCommit,
        EventKind::PreCommit,
        EventKind::PostCommit,
        EventKind::PreRevpropChange,
        EventKind::PostRevpropChange,
        EventKind::PreLock,
        EventKind::PostLock,
        EventKind::PreUnlock,
        EventKind::PostUnlock,
    ];

    /// Hook script name as used by Subversion (`pre-commit`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StartCommit => "start-commit",
            EventKind::PreCommit => "pre-commit",
            EventKind::PostCommit => "post-commit",
            EventKind::PreRevpropChange => "pre-revprop-change",
            EventKind::PostRevpropChange => "post-revprop-change",
            EventKind::PreLock => "pre-lock",
            EventKind::PostLock => "post-lock",
            EventKind::PreUnlock => "pre-unlock",
            EventKind::PostUnlock => "post-unlock",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown hook event: {}", s))
    }
}

/// A lock token presented with a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub path: String,
    pub token: String,
}

/// Everything Subversion told us about one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub kind: EventKind,
    pub repository: PathBuf,
    pub subject: Subject,
    pub user: Option<String>,
    pub capabilities: Option<String>,
    /// Locked or unlocked path (pre-lock, pre-unlock).
    pub path: Option<String>,
    pub comment: Option<String>,
    pub steal: Option<bool>,
    pub break_unlock: Option<bool>,
    /// Revision property name and change action (`A`, `M`, `D`).
    pub prop_name: Option<String>,
    pub prop_action: Option<String>,
    /// Property value from standard input (new value for pre-, old for post-).
    pub prop_value: Option<String>,
    /// Tokens held by the committer or presented for unlock.
    pub lock_tokens: Vec<LockToken>,
    /// Paths from standard input (post-lock, post-unlock).
    pub paths: Vec<String>,
}

impl HookEvent {
    fn base(kind: EventKind, repository: impl Into<PathBuf>, subject: Subject) -> Self {
        Self {
            kind,
            repository: repository.into(),
            subject,
            user: None,
            capabilities: None,
            path: None,
            comment: None,
            steal: None,
            break_unlock: None,
            prop_name: None,
            prop_action: None,
            prop_value: None,
            lock_tokens: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn start_commit(
        repository: impl Into<PathBuf>,
        user: impl Into<String>,
        capabilities: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            capabilities: Some(capabilities.into()),
            ..Self::base(EventKind::StartCommit, repository, Subject::Youngest)
        }
    }

    /// `stdin` carries the `LOCK-TOKENS:` section, if any.
    pub fn pre_commit(repository: impl Into<PathBuf>, txn: impl Into<String>, stdin: &str) -> Self {
        Self {
            lock_tokens: parse_lock_tokens(stdin),
            ..Self::base(
                EventKind::PreCommit,
                repository,
                Subject::Transaction(txn.into()),
            )
        }
    }

    pub fn post_commit(repository: impl Into<PathBuf>, revision: &str) -> Result<Self> {
        Ok(Self::base(
            EventKind::PostCommit,
            repository,
            Subject::Revision(parse_revision(revision)?),
        ))
    }

    /// `stdin` carries the proposed (pre-) or previous (post-) value.
    pub fn revprop_change(
        kind: EventKind,
        repository: impl Into<PathBuf>,
        revision: &str,
        user: impl Into<String>,
        prop_name: impl Into<String>,
        action: impl Into<String>,
        stdin: &str,
    ) -> Result<Self> {
        Ok(Self {
            user: Some(user.into()),
            prop_name: Some(prop_name.into()),
            prop_action: Some(action.into()),
            prop_value: Some(stdin.to_string()),
            ..Self::base(kind, repository, Subject::Revision(parse_revision(revision)?))
        })
    }

    pub fn pre_lock(
        repository: impl Into<PathBuf>,
        path: impl Into<String>,
        user: impl Into<String>,
        comment: impl Into<String>,
        steal: &str,
    ) -> Self {
        Self {
            path: Some(path.into()),
            user: Some(user.into()),
            comment: Some(comment.into()),
            steal: Some(parse_flag(steal)),
            ..Self::base(EventKind::PreLock, repository, Subject::Youngest)
        }
    }

    pub fn pre_unlock(
        repository: impl Into<PathBuf>,
        path: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        break_unlock: &str,
    ) -> Self {
        let path = path.into();
        Self {
            lock_tokens: vec![LockToken {
                path: path.clone(),
                token: token.into(),
            }],
            path: Some(path),
            user: Some(user.into()),
            break_unlock: Some(parse_flag(break_unlock)),
            ..Self::base(EventKind::PreUnlock, repository, Subject::Youngest)
        }
    }

    /// Post-lock and post-unlock; `stdin` lists the affected paths.
    pub fn lock_notification(
        kind: EventKind,
        repository: impl Into<PathBuf>,
        user: impl Into<String>,
        stdin: &str,
    ) -> Self {
        Self {
            user: Some(user.into()),
            paths: stdin
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            ..Self::base(kind, repository, Subject::Youngest)
        }
    }

    /// Tokens every rule starts with: `environment`, then the event arguments.
    pub fn initial_tokens(&self, environment: Tokens) -> Tokens {
        let mut tokens = environment;
        let repos = self.repository.to_string_lossy().into_owned();
        tokens.set("ReposUrl", repository_url(&self.repository));
        tokens.set("ReposPath", repos);
        tokens.set("Hook", self.kind.name());

        if let Some(rev) = self.subject.revision() {
            tokens.set("Revision", rev.to_string());
        }
        if let Some(txn) = self.subject.transaction() {
            tokens.set("Transaction", txn);
        }

        let optional = [
            ("User", &self.user),
            ("Capabilities", &self.capabilities),
            ("Path", &self.path),
            ("Comment", &self.comment),
            ("PropName", &self.prop_name),
            ("Action", &self.prop_action),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                tokens.set(name, value.as_str());
            }
        }

        if let Some(steal) = self.steal {
            tokens.set("Steal", flag_text(steal));
        }
        if let Some(break_unlock) = self.break_unlock {
            tokens.set("Break", flag_text(break_unlock));
        }
        if self.kind == EventKind::PreUnlock {
            if let Some(lock) = self.lock_tokens.first() {
                tokens.set("LockToken", lock.token.as_str());
            }
        }

        tokens
    }
}

fn parse_revision(revision: &str) -> Result<u64> {
    revision
        .trim()
        .parse()
        .with_context(|| format!("Not a valid revision number: {:?}", revision))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes")
}

fn flag_text(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Parses the `LOCK-TOKENS:` section a pre-commit hook receives on stdin.
///
/// Each entry is `path|token`; the path is URI-escaped by Subversion and
/// kept as-is.
pub fn parse_lock_tokens(stdin: &str) -> Vec<LockToken> {
    stdin
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "LOCK-TOKENS:")
        .filter_map(|line| {
            let (path, token) = line.split_once('|')?;
            Some(LockToken {
                path: path.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>().unwrap(), kind);
        }
        assert!("pre-frobnicate".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_parse_lock_tokens() {
        let stdin = "LOCK-TOKENS:\n/trunk/a.txt|opaquelocktoken:1\n/trunk/b%20c.txt|opaquelocktoken:2\n\n";
        let tokens = parse_lock_tokens(stdin);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].path, "/trunk/b%20c.txt");
        assert_eq!(tokens[1].token, "opaquelocktoken:2");
        assert!(parse_lock_tokens("").is_empty());
    }

    #[test]
    fn test_post_commit_rejects_bad_revision() {
        assert!(HookEvent::post_commit("/repo", "abc").is_err());
        let event = HookEvent::post_commit("/repo", "42").unwrap();
        assert_eq!(event.subject, Subject::Revision(42));
    }

    #[test]
    fn test_pre_commit_tokens() {
        let event = HookEvent::pre_commit("/srv/repo", "12-c", "");
        let tokens = event.initial_tokens(Tokens::new());
        assert_eq!(tokens.lookup("ReposPath"), Some("/srv/repo"));
        assert_eq!(tokens.lookup("ReposUrl"), Some("file:///srv/repo"));
        assert_eq!(tokens.lookup("Transaction"), Some("12-c"));
        assert_eq!(tokens.lookup("Hook"), Some("pre-commit"));
        assert!(!tokens.contains("Revision"));
        assert!(!tokens.contains("User"));
    }

    #[test]
    fn test_pre_lock_tokens() {
        let event = HookEvent::pre_lock("/repo", "/trunk/a.txt", "userA", "mine", "1");
        assert_eq!(event.steal, Some(true));
        let tokens = event.initial_tokens(Tokens::new());
        assert_eq!(tokens.lookup("Path"), Some("/trunk/a.txt"));
        assert_eq!(tokens.lookup("Comment"), Some("mine"));
        assert_eq!(tokens.lookup("Steal"), Some("1"));
    }

    #[test]
    fn test_pre_unlock_tokens() {
        let event = HookEvent::pre_unlock("/repo", "/trunk/a.txt", "userA", "opaquelocktoken:9", "0");
        assert_eq!(event.break_unlock, Some(false));
        let tokens = event.initial_tokens(Tokens::new());
        assert_eq!(tokens.lookup("LockToken"), Some("opaquelocktoken:9"));
        assert_eq!(tokens.lookup("Break"), Some("0"));
    }

    #[test]
    fn test_revprop_change() {
        let event = HookEvent::revprop_change(
            EventKind::PreRevpropChange,
            "/repo",
            "3",
            "userA",
            "svn:log",
            "M",
            "new message\n",
        )
        .unwrap();
        assert_eq!(event.prop_value.as_deref(), Some("new message\n"));
        let tokens = event.initial_tokens(Tokens::new());
        assert_eq!(tokens.lookup("PropName"), Some("svn:log"));
        assert_eq!(tokens.lookup("Action"), Some("M"));
        assert_eq!(tokens.lookup("Revision"), Some("3"));
    }

    #[test]
    fn test_lock_notification_paths() {
        let event = HookEvent::lock_notification(EventKind::PostLock, "/repo", "userA", "trunk/a\n\ntrunk/b\n");
        assert_eq!(event.paths, vec!["trunk/a", "trunk/b"]);
    }

    #[test]
    fn test_event_tokens_override_environment() {
        let mut env = Tokens::new();
        env.set("USER", "shell-user");
        env.set("HOME", "/home/x");
        let event = HookEvent::start_commit("/repo", "svn-user", "mergeinfo");
        let tokens = event.initial_tokens(env);
        assert_eq!(tokens.lookup("user"), Some("svn-user"));
        assert_eq!(tokens.lookup("home"), Some("/home/x"));
        assert_eq!(tokens.lookup("Capabilities"), Some("mergeinfo"));
    }
}
