//! The drip campaign: contact store adapter, sequence loader, mail sender,
//! segment assignment, the daily scheduler pass, intake, and invitations.
//!
//! Everything here is generic over the storage backend
//! ([`Worksheet`](drip_core::sheet::Worksheet)) and the mail transport
//! ([`MailTransport`](drip_core::mail::MailTransport)); [`Campaign`] wires
//! them together.

pub mod assign;
pub mod campaign;
pub mod contacts;
pub mod error;
pub mod intake;
pub mod invite;
pub mod retry;
pub mod scheduler;
pub mod sender;
pub mod sequences;
pub mod settings;
pub mod smtp;

#[cfg(test)]
mod testing;

pub use campaign::Campaign;
pub use error::{Error, MailError, Result};
pub use scheduler::RunReport;
pub use settings::CampaignSettings;
