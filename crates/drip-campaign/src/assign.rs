//! Segment assignment: the target of the link a pending contact clicks.

use chrono::{Local, NaiveDate};
use drip_core::{
  address::{is_valid_email, normalize_email},
  contact::{Contact, StepMarker, format_date},
  mail::MailTransport,
  sequence::personalize,
  sheet::{Column, Worksheet},
};
use tracing::{error, info, warn};

use crate::{Result, campaign::Campaign};

impl<W: Worksheet, T: MailTransport> Campaign<W, T> {
  /// Assign `segment` to the first pending contact with `email`, scheduling
  /// the first send for today (local time).
  ///
  /// `false` covers both "no such pending contact" and store failures; the
  /// latter are logged.
  pub async fn assign(&self, email: &str, segment: &str) -> bool {
    match self.assign_on(email, segment, Local::now().date_naive()).await {
      Ok(assigned) => assigned,
      Err(e) => {
        error!(%email, %segment, error = %e, "segment assignment failed");
        false
      }
    }
  }

  /// [`assign`](Self::assign) with an explicit date, surfacing store errors.
  ///
  /// `Ok(false)` means the email was invalid, the segment is not in the
  /// catalogue, or no contact with that email is awaiting a segment. The
  /// catalogue's spelling of the label is what gets stored.
  pub async fn assign_on(&self, email: &str, segment: &str, today: NaiveDate) -> Result<bool> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
      warn!(%email, %segment, "rejected segment assignment with invalid email");
      return Ok(false);
    }
    let Some(segment) = self.settings().catalogue_label(segment) else {
      warn!(%email, %segment, "rejected segment assignment for unknown segment");
      return Ok(false);
    };

    let contacts = self.store().list_all().await?;
    let Some(contact) = contacts
      .iter()
      .find(|c| c.email == email && c.segment.is_pending())
    else {
      info!(%email, %segment, "no pending contact to assign");
      return Ok(false);
    };

    // The segment cell is written last: until it lands the row is still
    // pending, so a failure part-way leaves it assignable.
    let row = contact.row;
    self.store().update_field(row, Column::LastEmailSent, "").await?;
    self.store().update_field(row, Column::NextStepDate, &format_date(today)).await?;
    self.store().update_field(row, Column::Segment, segment).await?;
    info!(%row, %email, %segment, "assigned segment");

    if self.settings().first_send_on_assign {
      self.send_first_step(contact, segment, today).await;
    }
    Ok(true)
  }

  /// Send step 0 right away. On failure the row stays due today and the next
  /// pass picks it up.
  async fn send_first_step(&self, contact: &Contact, segment: &str, today: NaiveDate) {
    let sequence = self.sequences().load(segment).await;
    let Some(step) = sequence.first() else {
      return;
    };

    let body = personalize(&step.body, &contact.name);
    if !self.sender().send(&step.subject, &body, &contact.email).await {
      return;
    }

    let failed = self
      .store()
      .advance_cursor(contact.row, &StepMarker::Week(1).to_string(), self.next_send_after(today))
      .await;
    if failed > 0 {
      warn!(row = %contact.row, email = %contact.email, failed, "sent first step, but the cursor was not fully advanced");
    }
  }
}
