//! [`Campaign`]: the explicitly constructed bundle of collaborators that the
//! scheduler, assignment, intake, and invitation operations run against.
//!
//! Each operation lives in its own module as an `impl` block on this type.

use chrono::{Days, NaiveDate};
use drip_core::{mail::MailTransport, sequence::sequence_key, sheet::Worksheet};

use crate::{
  Error, Result, contacts::ContactStore, sender::MailSender, sequences::SequenceLibrary,
  settings::CampaignSettings,
};

pub struct Campaign<W, T> {
  store:     ContactStore<W>,
  sequences: SequenceLibrary,
  sender:    MailSender<T>,
  settings:  CampaignSettings,
}

impl<W: Worksheet, T: MailTransport> Campaign<W, T> {
  /// Wire a campaign over `sheet` and `transport`.
  ///
  /// Fails if the sequence folder does not exist, or if the segment catalogue
  /// is empty or holds a label that cannot name a sequence file.
  pub fn new(sheet: W, transport: T, settings: CampaignSettings) -> Result<Self> {
    if settings.segments.is_empty() {
      return Err(Error::NoSegments);
    }
    if let Some(bad) = settings.segments.iter().find(|s| sequence_key(s).is_none()) {
      return Err(Error::UnusableSegment(bad.clone()));
    }
    let sequences = SequenceLibrary::open(&settings.sequence_folder)?;
    Ok(Self {
      store: ContactStore::new(sheet, settings.store_retry),
      sender: MailSender::new(transport, settings.mail_retry),
      sequences,
      settings,
    })
  }

  pub fn store(&self) -> &ContactStore<W> { &self.store }

  pub fn sequences(&self) -> &SequenceLibrary { &self.sequences }

  pub fn sender(&self) -> &MailSender<T> { &self.sender }

  pub fn settings(&self) -> &CampaignSettings { &self.settings }

  /// The date one cadence after `today`.
  pub(crate) fn next_send_after(&self, today: NaiveDate) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(self.settings.cadence_days.into()))
  }
}
