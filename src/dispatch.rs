//! Mail request validation, message assembly, and the SMTP send seam
//!
//! Validation runs in a fixed order and stops at the first failure:
//! recipients, then the mail object, then the subject. The assembled
//! [`MailMessage`] is ephemeral; it is handed to a [`Mailer`] together with
//! the current connection state and discarded regardless of the outcome.

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use crate::{
    connection::Connection,
    error::{SendError, ValidationError},
    schema::MailRequest,
};

/// Outbound message assembled from a validated request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub plain: Option<String>,
    pub html: Option<String>,
}

/// Validate a request and assemble the outbound message
///
/// Each optional field is carried over independently; assembly order has no
/// cross-field effects. A message with neither a plain nor an html body is
/// deliberately allowed through.
///
/// # Errors
///
/// Returns the first failing check: [`ValidationError::MissingRecipient`],
/// [`ValidationError::MissingMailObject`], or
/// [`ValidationError::MissingSubject`] (also for an empty subject)
pub fn build_message(request: MailRequest) -> Result<MailMessage, ValidationError> {
    if request.to.is_empty() {
        return Err(ValidationError::MissingRecipient);
    }

    let Some(mail) = request.mail else {
        return Err(ValidationError::MissingMailObject);
    };

    let subject = match mail.subject {
        Some(subject) if !subject.is_empty() => subject,
        _ => return Err(ValidationError::MissingSubject),
    };

    Ok(MailMessage {
        to: request.to,
        subject,
        cc: mail.cc.unwrap_or_default(),
        bcc: mail.bcc.unwrap_or_default(),
        reply_to: mail.reply_to,
        from: mail.from,
        from_name: mail.from_name,
        plain: mail.plain,
        html: mail.html,
    })
}

/// Seam to the external mail-sending collaborator
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message using the given connection state
    ///
    /// The call resolves only once the SMTP round trip completes; the worker
    /// awaits it before reading the next package.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] when the collaborator rejects the message or
    /// the delivery fails
    async fn send(&self, connection: &Connection, message: &MailMessage) -> Result<(), SendError>;
}

/// Mailer backed by lettre's asynchronous SMTP transport
///
/// A transport is built per send from the current connection state; the
/// worker never holds more than one outbound configuration at a time, so
/// there is nothing to pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    fn transport(
        connection: &Connection,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, SendError> {
        let tls = TlsParameters::new(connection.server.clone())
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(connection.server.as_str())
                .port(connection.port)
                .tls(Tls::Opportunistic(tls));

        if let Some(credentials) = &connection.credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }

        Ok(builder.build())
    }

    fn assemble(connection: &Connection, message: &MailMessage) -> Result<Message, SendError> {
        let mut builder = Message::builder().subject(message.subject.clone());

        for to in &message.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &message.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }
        for bcc in &message.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }
        if let Some(reply_to) = &message.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        // The message format requires a From header even when the request
        // omits one; fall back to the module's own address at the server.
        let mut from = match &message.from {
            Some(from) => parse_mailbox(from)?,
            None => Mailbox::new(
                None,
                Address::new(crate::MODULE_NAME, connection.server.as_str())
                    .map_err(|e| SendError::BadAddress(e.to_string()))?,
            ),
        };
        if let Some(name) = &message.from_name {
            from.name = Some(name.clone());
        }
        builder = builder.from(from);

        match (&message.plain, &message.html) {
            (Some(plain), Some(html)) => {
                builder.multipart(MultiPart::alternative_plain_html(plain.clone(), html.clone()))
            }
            (None, Some(html)) => builder.singlepart(SinglePart::html(html.clone())),
            (Some(plain), None) => builder.body(plain.clone()),
            (None, None) => builder.body(String::new()),
        }
        .map_err(|e| SendError::Message(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address
        .parse()
        .map_err(|e| SendError::BadAddress(format!("{address}: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, connection: &Connection, message: &MailMessage) -> Result<(), SendError> {
        let email = Self::assemble(connection, message)?;
        let transport = Self::transport(connection)?;

        transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| SendError::Transport(e.to_string()))
    }
}
