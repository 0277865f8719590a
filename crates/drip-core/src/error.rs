//! Error types for `drip-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("column index {0} is outside the contact schema")]
  UnknownColumn(usize),

  #[error("row {0} is the header row")]
  HeaderRow(u32),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("name must not be blank")]
  BlankName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
