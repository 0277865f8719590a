//! Campaign configuration, deserialised from the `[campaign]` table.

use std::path::PathBuf;

use drip_core::address::normalize;
use serde::Deserialize;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignSettings {
  /// Folder holding one `<segment_key>.json` per segment.
  pub sequence_folder:      PathBuf,
  /// The segment labels: offered in invitations, and the only values
  /// assignment accepts. Must not be empty.
  #[serde(default)]
  pub segments:             Vec<String>,
  /// Target of the per-segment links in invitation emails.
  #[serde(default)]
  pub select_url:           String,
  /// Days between consecutive sends to one contact.
  #[serde(default = "default_cadence")]
  pub cadence_days:         u32,
  /// Send step 0 at assignment time instead of waiting for the next pass.
  #[serde(default)]
  pub first_send_on_assign: bool,
  /// Email the segment-choice links as soon as a contact registers.
  #[serde(default = "default_true")]
  pub invite_on_register:   bool,
  #[serde(default)]
  pub store_retry:          RetryPolicy,
  /// Retry policy for sends; absent means one attempt per message.
  #[serde(default)]
  pub mail_retry:           Option<RetryPolicy>,
  #[serde(default)]
  pub cta:                  CtaMessage,
  #[serde(default)]
  pub invite:               InviteMessage,
}

fn default_cadence() -> u32 { 7 }
fn default_true() -> bool { true }

impl CampaignSettings {
  /// Settings with every optional field at its default.
  pub fn new(sequence_folder: impl Into<PathBuf>) -> Self {
    Self {
      sequence_folder:      sequence_folder.into(),
      segments:             Vec::new(),
      select_url:           String::new(),
      cadence_days:         default_cadence(),
      first_send_on_assign: false,
      invite_on_register:   true,
      store_retry:          RetryPolicy::default(),
      mail_retry:           None,
      cta:                  CtaMessage::default(),
      invite:               InviteMessage::default(),
    }
  }

  /// The configured label matching `segment`, ignoring case and surrounding
  /// whitespace.
  pub fn catalogue_label(&self, segment: &str) -> Option<&str> {
    let wanted = normalize(segment);
    if wanted.is_empty() {
      return None;
    }
    self
      .segments
      .iter()
      .map(|s| s.trim())
      .find(|s| normalize(s) == wanted)
  }
}

/// The message repeated every cadence once a sequence is exhausted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CtaMessage {
  pub subject: String,
  /// Template; `{name}` is substituted.
  pub body:    String,
}

impl Default for CtaMessage {
  fn default() -> Self {
    Self {
      subject: "Still Thinking It Over? Let's Talk".into(),
      body:    "Hi {name},\n\n\
                We noticed you haven't scheduled your free strategy call yet.\n\n\
                We're here to help you move forward with funding that fits your vision.\n\n\
                Reply to this email to book a call.\n"
        .into(),
    }
  }
}

/// The segment-choice invitation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InviteMessage {
  pub subject: String,
  /// Line shown above the list of links.
  pub intro:   String,
  /// Line shown below the list of links.
  pub outro:   String,
}

impl Default for InviteMessage {
  fn default() -> Self {
    Self {
      subject: "Welcome! Choose Your Path".into(),
      intro:   "Please select the area you're most interested in:".into(),
      outro:   "Once you click, we'll send you personalized info and guidance to match!".into(),
    }
  }
}
