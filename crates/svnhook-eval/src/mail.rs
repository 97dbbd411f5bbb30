//! Outbound mail for the `SendSmtp` and `SendLogSmtp` actions.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::{debug, warn};

/// A fully expanded message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub server: String,
    pub port: u16,
    pub timeout: Duration,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivers mail. Blocks until the server has answered.
pub trait Mailer {
    fn send(&self, mail: &Mail) -> Result<()>;
}

impl<M: Mailer + ?Sized> Mailer for &M {
    fn send(&self, mail: &Mail) -> Result<()> {
        (**self).send(mail)
    }
}

/// [`Mailer`] that talks plain SMTP through `lettre`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl Mailer for SmtpMailer {
    fn send(&self, mail: &Mail) -> Result<()> {
        let mut builder = Message::builder()
            .from(
                mail.from
                    .parse::<Mailbox>()
                    .with_context(|| format!("Invalid sender address: {}", mail.from))?,
            )
            .subject(mail.subject.as_str());
        for to in &mail.to {
            builder = builder.to(to
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address: {}", to))?);
        }
        let message = builder
            .body(mail.body.clone())
            .context("Failed to build mail message")?;

        let transport = SmtpTransport::builder_dangerous(mail.server.as_str())
            .port(mail.port)
            .timeout(Some(mail.timeout))
            .build();

        debug!(server = %mail.server, port = mail.port, recipients = mail.to.len(), "sending mail");
        match transport.send(&message) {
            Ok(_) => Ok(()),
            Err(err) if err.is_permanent() => {
                warn!(server = %mail.server, error = %err, "mail rejected by server");
                Ok(())
            }
            Err(err) => {
                Err(anyhow::Error::new(err).context(format!("Failed to send mail via {}", mail.server)))
            }
        }
    }
}
