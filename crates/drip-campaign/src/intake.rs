//! Intake: a new contact enters the store awaiting segment selection.

use chrono::Local;
use drip_core::{
  contact::{Contact, NewContact},
  mail::MailTransport,
  sheet::{RowRef, Worksheet},
};
use tracing::warn;

use crate::{Error, Result, campaign::Campaign};

impl<W: Worksheet, T: MailTransport> Campaign<W, T> {
  /// Append a pending contact, then invite them if configured to.
  ///
  /// An email that is already in the store, in any segment state, is refused.
  /// A failed invitation does not undo the registration.
  pub async fn register(&self, name: &str, email: &str) -> Result<RowRef> {
    let new = NewContact::new(name, email, Local::now().naive_local())?;

    let contacts = self.store().list_all().await?;
    if contacts.iter().any(|c| c.email == new.email) {
      return Err(Error::AlreadyRegistered(new.email));
    }

    let row = self.store().append(new.clone()).await?;

    if self.settings().invite_on_register {
      let contact = Contact::from_cells(row, &new.into_cells());
      if !self.invite(&contact).await {
        warn!(%row, email = %contact.email, "registered, but the invitation was not sent");
      }
    }
    Ok(row)
  }
}
