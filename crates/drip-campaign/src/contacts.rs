//! [`ContactStore`] — the typed adapter over a [`Worksheet`].
//!
//! Rows are parsed into [`Contact`]s here and nowhere else. Writes are single
//! cells, each retried under the configured [`RetryPolicy`]; a write that
//! still fails is logged once and reported to the caller, who carries on.

use chrono::NaiveDate;
use drip_core::{
  contact::{Contact, NewContact, format_date},
  sheet::{Column, RowRef, Worksheet},
};
use tracing::{error, info, warn};

use crate::{Error, Result, retry::RetryPolicy};

pub struct ContactStore<W> {
  sheet: W,
  retry: RetryPolicy,
}

impl<W: Worksheet> ContactStore<W> {
  pub fn new(sheet: W, retry: RetryPolicy) -> Self { Self { sheet, retry } }

  pub fn sheet(&self) -> &W { &self.sheet }

  /// Every contact, in store order.
  pub async fn list_all(&self) -> Result<Vec<Contact>> {
    let records = self
      .retry
      .run("reading contact rows", || self.sheet.records())
      .await
      .map_err(|e| {
        error!(error = %e, "giving up reading contact rows");
        Error::Store(Box::new(e))
      })?;

    Ok(
      records
        .iter()
        .enumerate()
        .map(|(index, cells)| {
          let contact = Contact::from_cells(RowRef::for_record(index), cells);
          let raw_date = cells
            .get(Column::NextStepDate.offset())
            .map(|s| s.trim())
            .unwrap_or("");
          if !raw_date.is_empty() && contact.next_send_date.is_none() {
            warn!(row = %contact.row, value = raw_date, "unparseable Next_Step_Date; row is never due");
          }
          contact
        })
        .collect(),
    )
  }

  /// Overwrite one field of one row.
  pub async fn update_field(&self, row: RowRef, column: Column, value: &str) -> Result<()> {
    let outcome = self
      .retry
      .run("updating contact cell", || {
        self.sheet.update_cell(row, column, value.to_owned())
      })
      .await;

    match outcome {
      Ok(()) => {
        info!(%row, %column, value, "updated cell");
        Ok(())
      }
      Err(e) => {
        error!(%row, %column, value, error = %e, "giving up updating cell");
        Err(Error::Store(Box::new(e)))
      }
    }
  }

  /// Move a contact's cursor: `Next_Step_Date` then `Last_Email_Sent`.
  ///
  /// If the date does not land the cursor is left alone, so the row stays due
  /// at the same step instead of due at the next one. Returns the number of
  /// writes that did not land, skipped ones included.
  pub async fn advance_cursor(&self, row: RowRef, last_step: &str, next: Option<NaiveDate>) -> usize {
    let next = next.map(format_date).unwrap_or_default();
    if self.update_field(row, Column::NextStepDate, &next).await.is_err() {
      warn!(%row, "Next_Step_Date not written; leaving Last_Email_Sent as it was");
      return 2;
    }
    match self.update_field(row, Column::LastEmailSent, last_step).await {
      Ok(()) => 0,
      Err(_) => 1,
    }
  }

  /// Append a new contact row.
  pub async fn append(&self, contact: NewContact) -> Result<RowRef> {
    let email = contact.email.clone();
    let row = self
      .retry
      .run("appending contact row", || self.sheet.append_row(contact.clone().into_cells()))
      .await
      .map_err(|e| {
        error!(%email, error = %e, "giving up appending contact row");
        Error::Store(Box::new(e))
      })?;
    info!(%row, %email, "appended contact");
    Ok(row)
  }
}
