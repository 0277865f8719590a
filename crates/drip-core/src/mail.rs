//! Outgoing mail and the `MailTransport` trait.

use std::future::Future;

/// How the body of an [`Outgoing`] message should be labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFormat {
  #[default]
  Plain,
  Html,
}

/// One fully rendered message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
  pub to:      String,
  pub subject: String,
  pub body:    String,
  pub format:  BodyFormat,
}

impl Outgoing {
  pub fn plain(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      to:      to.into(),
      subject: subject.into(),
      body:    body.into(),
      format:  BodyFormat::Plain,
    }
  }

  pub fn html(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
    Self { format: BodyFormat::Html, ..Self::plain(to, subject, body) }
  }
}

/// Something that can hand a message to a mail server.
///
/// One call is one transmission attempt. Retrying is the caller's business.
pub trait MailTransport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn deliver<'a>(
    &'a self,
    mail: &'a Outgoing,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
