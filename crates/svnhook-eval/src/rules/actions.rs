//! Built-in actions.
//!
//! Actions never run children. Parameters are validated when the action is
//! built; token expansion happens when it runs.

use super::{Rule, bool_attr, int_attr, required_attr, required_child_text, required_text};
use crate::bail_hook;
use crate::error::HookError;
use crate::executor::Executor;
use crate::mail::Mail;
use crate::outcome::{INTERNAL_ERROR_CODE, Outcome};
use crate::text::dedent;
use crate::tokens::Tokens;
use anyhow::{Context, Result, bail};
use std::process::Command;
use std::time::Duration;
use svnhook_svn::FactError;
use svnhook_syntax::ConfigNode;
use tracing::{error, info};

/// `<SetToken name="...">value</SetToken>`
///
/// Stores the raw value in the current scope; it is expanded where it is used.
struct SetToken {
    name: String,
    value: String,
}

impl Rule for SetToken {
    fn run(&self, _node: &ConfigNode, _exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        tokens.set(&self.name, self.value.as_str());
        Ok(Outcome::ok())
    }
}

pub fn set_token(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Ok(Box::new(SetToken {
        name: required_attr(node, "name")?.to_string(),
        value: node.text().unwrap_or("").to_string(),
    }))
}

/// `<SendError exitCode="1">message</SendError>`
struct SendError {
    code: i32,
    message: String,
}

impl Rule for SendError {
    fn run(&self, _node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let message = tokens.expand(&self.message)?;
        for line in message.lines() {
            error!(code = self.code, "{}", line);
        }
        exec.write_stderr(&message)?;
        Ok(Outcome::Code(self.code))
    }
}

pub fn send_error(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let code = int_attr(node, "exitCode", 1..=INTERNAL_ERROR_CODE - 1)?.unwrap_or(1);
    let message = dedent(required_text(node)?);
    Ok(Box::new(SendError { code, message }))
}

/// Server and envelope shared by the mail actions.
struct Envelope {
    server: String,
    port: Option<u16>,
    timeout: Option<Duration>,
    from: String,
    to: Vec<String>,
    subject: String,
}

impl Envelope {
    fn parse(node: &ConfigNode) -> Result<Self> {
        let server = required_attr(node, "server")?.to_string();
        let port = int_attr(node, "port", 1..=u16::MAX)?;
        let timeout = int_attr(node, "seconds", 1..=u64::MAX)?.map(Duration::from_secs);
        let from = required_child_text(node, "FromAddress")?.to_string();
        let to: Vec<String> = node
            .children_named("ToAddress")
            .filter_map(|c| c.text())
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect();
        if to.is_empty() {
            bail_hook!(HookError::MissingTag {
                tag: "ToAddress".to_string(),
                span: node.span(),
            });
        }
        let subject = required_child_text(node, "Subject")?.to_string();

        Ok(Self { server, port, timeout, from, to, subject })
    }

    fn expand(&self, exec: &Executor<'_>, tokens: &Tokens, body: String) -> Result<Mail> {
        let mut to = Vec::with_capacity(self.to.len());
        for address in &self.to {
            to.push(tokens.expand(address.trim())?);
        }
        Ok(Mail {
            server: tokens.expand(&self.server)?,
            port: self.port.unwrap_or(exec.config().smtp_port),
            timeout: self.timeout.unwrap_or(exec.config().smtp_timeout),
            from: tokens.expand(self.from.trim())?,
            to,
            subject: tokens.expand(self.subject.trim())?,
            body,
        })
    }
}

/// `<SendSmtp server="...">` with address, subject and message elements.
struct SendSmtp {
    envelope: Envelope,
    message: String,
}

impl Rule for SendSmtp {
    fn run(&self, _node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let body = tokens.expand(&self.message)?;
        let mail = self.envelope.expand(exec, tokens, body)?;
        info!(to = ?mail.to, subject = %mail.subject, "sending mail");
        exec.mailer().send(&mail)?;
        Ok(Outcome::ok())
    }
}

pub fn send_smtp(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    let envelope = Envelope::parse(node)?;
    let message = dedent(required_child_text(node, "Message")?);
    Ok(Box::new(SendSmtp { envelope, message }))
}

/// `<SendLogSmtp server="..." verbose="true">`: mails the revision log entry.
struct SendLogSmtp {
    envelope: Envelope,
    verbose: bool,
}

impl Rule for SendLogSmtp {
    fn run(&self, _node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let body = exec.facts().revision_log(self.verbose)?;
        let mail = self.envelope.expand(exec, tokens, body)?;
        info!(to = ?mail.to, subject = %mail.subject, "sending revision log");
        exec.mailer().send(&mail)?;
        Ok(Outcome::ok())
    }
}

pub fn send_log_smtp(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Ok(Box::new(SendLogSmtp {
        envelope: Envelope::parse(node)?,
        verbose: bool_attr(node, "verbose", true),
    }))
}

/// `<ExecuteCmd errorLevel="1">command line</ExecuteCmd>`
///
/// Exit codes at or above `errorLevel` stop evaluation and forward the
/// command's stderr to the client. A command exiting with the internal-error
/// code is reported as `254`.
struct ExecuteCmd {
    command: String,
    error_level: i32,
}

impl Rule for ExecuteCmd {
    fn run(&self, _node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let line = tokens.expand(self.command.trim())?;
        let argv = shell_words::split(&line)
            .map_err(|e| anyhow::anyhow!("Failed to parse command '{}': {}", line, e))?;
        let Some((program, args)) = argv.split_first() else {
            bail!("Command line is empty after expansion: {:?}", self.command);
        };

        info!(command = %line, "executing command");
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute command: {}", line))?;

        let Some(code) = output.status.code() else {
            bail!("Command terminated by signal: {}", line);
        };

        if code >= self.error_level {
            exec.write_stderr(&String::from_utf8_lossy(&output.stderr))?;
            return Ok(Outcome::Code(code.min(INTERNAL_ERROR_CODE - 1)));
        }
        Ok(Outcome::ok())
    }
}

pub fn execute_cmd(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Ok(Box::new(ExecuteCmd {
        command: required_text(node)?.to_string(),
        error_level: int_attr(node, "errorLevel", 1..=i32::MAX)?.unwrap_or(1),
    }))
}

/// `<SetRevisionFile>path</SetRevisionFile>`: records the committed revision.
struct SetRevisionFile {
    path: String,
}

impl Rule for SetRevisionFile {
    fn run(&self, _node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let Some(revision) = exec.facts().subject().revision() else {
            return Err(FactError::Unavailable { fact: "revision" }.into());
        };
        let path = tokens.expand(self.path.trim())?;
        std::fs::write(&path, format!("{}\n", revision))
            .with_context(|| format!("Failed to write revision file: {}", path))?;
        info!(revision, path = %path, "revision file written");
        Ok(Outcome::ok())
    }
}

pub fn set_revision_file(node: &ConfigNode) -> Result<Box<dyn Rule>> {
    Ok(Box::new(SetRevisionFile {
        path: required_text(node)?.to_string(),
    }))
}
