//! # svnhook-cli
//!
//! The `svnhook` binary. Subversion hook scripts call it with the event name
//! and the hook's own arguments:
//!
//! ```sh
//! #!/bin/sh
//! exec svnhook pre-commit "$@" --cfgfile /srv/svn/repo/hooks/pre-commit.xml
//! ```
//!
//! The exit code and stderr are passed back to Subversion unchanged. Logs go
//! to a file next to the rule document.

mod errors;
mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use svnhook::{
    Config, EventKind, HookEvent, INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE, Registry, Session,
    check_document, default_config_path,
};
use tracing::{error, warn};

use errors::Diagnostic;

#[derive(Parser)]
#[command(name = "svnhook")]
#[command(about = "Declarative Subversion hook handler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Repository and rule document shared by every event.
#[derive(Args)]
struct Target {
    /// Repository path as passed by Subversion
    repos: PathBuf,
    /// Rule document (default: <REPOS>/hooks/<event>.xml)
    #[arg(long, value_name = "PATH")]
    cfgfile: Option<PathBuf>,
}

#[derive(Args)]
struct RevpropArgs {
    #[command(flatten)]
    target: Target,
    rev: String,
    user: String,
    propname: String,
    action: String,
}

#[derive(Args)]
struct NotifyArgs {
    #[command(flatten)]
    target: Target,
    user: String,
}

#[derive(Subcommand)]
enum Commands {
    StartCommit {
        #[command(flatten)]
        target: Target,
        user: String,
        #[arg(default_value = "")]
        capabilities: String,
    },
    PreCommit {
        #[command(flatten)]
        target: Target,
        txn: String,
    },
    PostCommit {
        #[command(flatten)]
        target: Target,
        rev: String,
    },
    PreRevpropChange(RevpropArgs),
    PostRevpropChange(RevpropArgs),
    PreLock {
        #[command(flatten)]
        target: Target,
        path: String,
        user: String,
        #[arg(default_value = "")]
        comment: String,
        #[arg(default_value = "0")]
        steal: String,
    },
    PostLock(NotifyArgs),
    PreUnlock {
        #[command(flatten)]
        target: Target,
        path: String,
        user: String,
        #[arg(default_value = "")]
        token: String,
        #[arg(default_value = "0")]
        break_unlock: String,
    },
    PostUnlock(NotifyArgs),
    #[command(about = "Validate a rule document without running it")]
    Check {
        #[arg(long, value_name = "PATH")]
        cfgfile: PathBuf,
    },
}

impl Commands {
    fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Commands::StartCommit { .. } => EventKind::StartCommit,
            Commands::PreCommit { .. } => EventKind::PreCommit,
            Commands::PostCommit { .. } => EventKind::PostCommit,
            Commands::PreRevpropChange(_) => EventKind::PreRevpropChange,
            Commands::PostRevpropChange(_) => EventKind::PostRevpropChange,
            Commands::PreLock { .. } => EventKind::PreLock,
            Commands::PostLock(_) => EventKind::PostLock,
            Commands::PreUnlock { .. } => EventKind::PreUnlock,
            Commands::PostUnlock(_) => EventKind::PostUnlock,
            Commands::Check { .. } => return None,
        })
    }

    fn target(&self) -> Option<&Target> {
        match self {
            Commands::StartCommit { target, .. }
            | Commands::PreCommit { target, .. }
            | Commands::PostCommit { target, .. }
            | Commands::PreLock { target, .. }
            | Commands::PreUnlock { target, .. } => Some(target),
            Commands::PreRevpropChange(args) | Commands::PostRevpropChange(args) => Some(&args.target),
            Commands::PostLock(args) | Commands::PostUnlock(args) => Some(&args.target),
            Commands::Check { .. } => None,
        }
    }

    /// Builds the event; `stdin` is only consulted by events that read it.
    fn into_event(self, stdin: &str) -> Result<HookEvent> {
        Ok(match self {
            Commands::StartCommit { target, user, capabilities } => {
                HookEvent::start_commit(target.repos, user, capabilities)
            }
            Commands::PreCommit { target, txn } => HookEvent::pre_commit(target.repos, txn, stdin),
            Commands::PostCommit { target, rev } => HookEvent::post_commit(target.repos, &rev)?,
            Commands::PreRevpropChange(args) => revprop(EventKind::PreRevpropChange, args, stdin)?,
            Commands::PostRevpropChange(args) => revprop(EventKind::PostRevpropChange, args, stdin)?,
            Commands::PreLock { target, path, user, comment, steal } => {
                HookEvent::pre_lock(target.repos, path, user, comment, &steal)
            }
            Commands::PostLock(args) => {
                HookEvent::lock_notification(EventKind::PostLock, args.target.repos, args.user, stdin)
            }
            Commands::PreUnlock { target, path, user, token, break_unlock } => {
                HookEvent::pre_unlock(target.repos, path, user, token, &break_unlock)
            }
            Commands::PostUnlock(args) => {
                HookEvent::lock_notification(EventKind::PostUnlock, args.target.repos, args.user, stdin)
            }
            Commands::Check { .. } => anyhow::bail!("check is not a hook event"),
        })
    }
}

fn revprop(kind: EventKind, args: RevpropArgs, stdin: &str) -> Result<HookEvent> {
    HookEvent::revprop_change(
        kind,
        args.target.repos,
        &args.rev,
        args.user,
        args.propname,
        args.action,
        stdin,
    )
}

fn reads_stdin(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::PreCommit
            | EventKind::PreRevpropChange
            | EventKind::PostRevpropChange
            | EventKind::PostLock
            | EventKind::PostUnlock
    )
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Check { cfgfile } => check(&cfgfile),
        command => run_hook(command),
    };
    std::process::exit(code);
}

fn run_hook(command: Commands) -> i32 {
    let (Some(kind), Some(target)) = (command.kind(), command.target()) else {
        return INTERNAL_ERROR_CODE;
    };
    let cfgfile = target
        .cfgfile
        .clone()
        .unwrap_or_else(|| default_config_path(&target.repos, kind));
    let config_dir = cfgfile.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    let (config, config_error) = match Config::load(&config_dir) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    logging::init(&config, &config.log_path(&cfgfile));
    if let Some(err) = config_error {
        warn!("{:#}; using default settings", err);
    }

    let event = match read_input(kind).and_then(|stdin| command.into_event(&stdin)) {
        Ok(event) => event,
        Err(err) => {
            error!(hook = %kind, "{:#}", err);
            eprintln!("{}", INTERNAL_ERROR_MESSAGE);
            return INTERNAL_ERROR_CODE;
        }
    };

    Session::new(event, cfgfile).with_config(config).run()
}

fn read_input(kind: EventKind) -> Result<String> {
    let mut stdin = String::new();
    if reads_stdin(kind) {
        std::io::stdin()
            .read_to_string(&mut stdin)
            .context("Failed to read hook input from stdin")?;
    }
    Ok(stdin)
}

fn check(cfgfile: &Path) -> i32 {
    let source = match fs::read_to_string(cfgfile) {
        Ok(source) => source,
        Err(err) => {
            Diagnostic::new(format!("Failed to read {}: {}", cfgfile.display(), err))
                .with_help("Pass the rule document with --cfgfile")
                .display();
            return 1;
        }
    };

    let root = match svnhook::parse(&source) {
        Ok(root) => root,
        Err(err) => {
            Diagnostic::new(err.to_string())
                .with_span(err.span())
                .with_file(cfgfile)
                .with_source(&source)
                .display();
            return 1;
        }
    };

    let problems = check_document(&root, &Registry::new());
    for problem in &problems {
        Diagnostic::new(format!("{}: {}", problem.node, problem.message))
            .with_span(Some(problem.span))
            .with_file(cfgfile)
            .with_source(&source)
            .display();
    }

    if problems.is_empty() {
        println!(
            "{} {}",
            "✓".green().bold(),
            format!("{} is valid", cfgfile.display()).bold()
        );
        0
    } else {
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("{} problem(s) in {}", problems.len(), cfgfile.display()).red().bold()
        );
        1
    }
}
