//! SMTP delivery through [`lettre`].

use drip_core::mail::{BodyFormat, MailTransport, Outgoing};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use serde::Deserialize;

use crate::MailError;

/// Where and as whom to submit mail.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
  #[serde(default = "default_host")]
  pub smtp_host:    String,
  #[serde(default = "default_port")]
  pub smtp_port:    u16,
  /// TLS from the first byte (port 465). `false` means STARTTLS.
  #[serde(default = "default_true")]
  pub implicit_tls: bool,
  pub sender:       String,
  #[serde(default)]
  pub display_name: Option<String>,
  /// May instead come from the environment at startup.
  #[serde(default)]
  pub credentials:  Option<SmtpCredentials>,
}

fn default_host() -> String { "smtp.gmail.com".into() }
fn default_port() -> u16 { 465 }
fn default_true() -> bool { true }

/// Account used to authenticate with the SMTP server.
#[derive(Clone, Deserialize)]
pub struct SmtpCredentials {
  pub username: String,
  pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SmtpCredentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// A pooled SMTP connection. Cheap to share behind an `Arc`.
pub struct SmtpTransport {
  mailer: AsyncSmtpTransport<Tokio1Executor>,
  from:   Mailbox,
}

impl SmtpTransport {
  pub fn new(settings: &SmtpSettings, credentials: SmtpCredentials) -> Result<Self, MailError> {
    let from = match &settings.display_name {
      Some(name) => format!("{name} <{}>", settings.sender),
      None => settings.sender.clone(),
    };
    let from: Mailbox = from
      .parse()
      .map_err(|e: lettre::address::AddressError| MailError::InvalidSender(e.to_string()))?;

    let builder = if settings.implicit_tls {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
    }
    .map_err(|e| MailError::Transport(Box::new(e)))?;

    let mailer = builder
      .port(settings.smtp_port)
      .credentials(Credentials::new(credentials.username, credentials.password))
      .build();

    Ok(Self { mailer, from })
  }

  fn build(&self, mail: &Outgoing) -> Result<Message, MailError> {
    let to: Mailbox = mail
      .to
      .parse()
      .map_err(|_| MailError::InvalidRecipient(mail.to.clone()))?;

    let content_type = match mail.format {
      BodyFormat::Plain => ContentType::TEXT_PLAIN,
      BodyFormat::Html => ContentType::TEXT_HTML,
    };

    Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(mail.subject.clone())
      .header(content_type)
      .body(mail.body.clone())
      .map_err(|e| MailError::Build(e.to_string()))
  }
}

impl MailTransport for SmtpTransport {
  type Error = MailError;

  async fn deliver<'a>(&'a self, mail: &'a Outgoing) -> Result<(), MailError> {
    let message = self.build(mail)?;
    self
      .mailer
      .send(message)
      .await
      .map_err(|e| MailError::Transport(Box::new(e)))?;
    Ok(())
  }
}
