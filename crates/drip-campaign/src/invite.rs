//! Segment invitations: an HTML email with one selection link per segment.

use std::collections::HashSet;

use drip_core::{
  contact::Contact,
  mail::{MailTransport, Outgoing},
  sequence::personalize,
  sheet::Worksheet,
};
use tracing::info;

use crate::{Result, campaign::Campaign};

/// The selection link for `email` and `segment`, with form-urlencoded query
/// parameters.
pub fn selection_link(select_url: &str, email: &str, segment: &str) -> String {
  // Encoding a slice of string pairs cannot fail.
  let query = serde_urlencoded::to_string([("email", email), ("segment", segment)])
    .unwrap_or_default();
  let separator = if select_url.contains('?') { '&' } else { '?' };
  format!("{select_url}{separator}{query}")
}

/// Escape text for an HTML body or a double-quoted attribute.
fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

impl<W: Worksheet, T: MailTransport> Campaign<W, T> {
  /// The invitation body for `contact`.
  pub fn invitation_body(&self, contact: &Contact) -> String {
    let settings = self.settings();
    let mut body = format!(
      "<p>{}</p>\n<p>{}</p>\n<ul>\n",
      escape_html(&personalize("Hi {name},", &contact.name)),
      escape_html(&settings.invite.intro),
    );
    for segment in &settings.segments {
      let link = selection_link(&settings.select_url, &contact.email, segment);
      body.push_str(&format!(
        "  <li><a href=\"{}\">{}</a></li>\n",
        escape_html(&link),
        escape_html(segment)
      ));
    }
    body.push_str(&format!("</ul>\n<p>{}</p>\n", escape_html(&settings.invite.outro)));
    body
  }

  /// Email `contact` the segment-selection links.
  pub async fn invite(&self, contact: &Contact) -> bool {
    let mail = Outgoing::html(
      contact.email.as_str(),
      self.settings().invite.subject.as_str(),
      self.invitation_body(contact),
    );
    self.sender().deliver(&mail).await.is_ok()
  }

  /// Invite every contact still awaiting segment selection, once per email.
  /// Returns the number of invitations sent.
  pub async fn invite_pending(&self) -> Result<usize> {
    let contacts = self.store().list_all().await?;
    let mut seen = HashSet::new();
    let mut sent = 0;
    for contact in contacts.iter().filter(|c| c.segment.is_pending() && !c.email.is_empty()) {
      if !seen.insert(contact.email.as_str()) {
        continue;
      }
      if self.invite(contact).await {
        sent += 1;
      }
    }
    info!(sent, pending = seen.len(), "sent segment invitations");
    Ok(sent)
  }
}
