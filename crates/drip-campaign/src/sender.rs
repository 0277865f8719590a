//! Sending one email to one recipient. Failures stop here as `false`.

use drip_core::{
  address::is_valid_email,
  mail::{MailTransport, Outgoing},
};
use tracing::{error, info, warn};

use crate::{MailError, retry::RetryPolicy};

pub struct MailSender<T> {
  transport: T,
  /// `None` means a single attempt per message.
  retry:     Option<RetryPolicy>,
}

impl<T: MailTransport> MailSender<T> {
  pub fn new(transport: T, retry: Option<RetryPolicy>) -> Self { Self { transport, retry } }

  pub fn transport(&self) -> &T { &self.transport }

  /// Send a plain-text message; `true` if the transport accepted it.
  pub async fn send(&self, subject: &str, body: &str, recipient: &str) -> bool {
    self.deliver(&Outgoing::plain(recipient, subject, body)).await.is_ok()
  }

  /// Validate and transmit `mail`, logging the outcome once.
  pub async fn deliver(&self, mail: &Outgoing) -> Result<(), MailError> {
    if !is_valid_email(&mail.to) {
      warn!(recipient = %mail.to, "invalid email address; not sending");
      return Err(MailError::InvalidRecipient(mail.to.clone()));
    }

    let policy = self.retry.unwrap_or(RetryPolicy::once());
    let outcome = policy
      .run("sending email", || self.transport.deliver(mail))
      .await;

    match outcome {
      Ok(()) => {
        info!(recipient = %mail.to, subject = %mail.subject, "sent email");
        Ok(())
      }
      Err(e) => {
        error!(recipient = %mail.to, subject = %mail.subject, error = %e, "failed to send email");
        Err(MailError::Transport(Box::new(e)))
      }
    }
  }
}
