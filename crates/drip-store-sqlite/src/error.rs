//! Error type for `drip-store-sqlite`.

use drip_core::sheet::RowRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] drip_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("row {row} not found in worksheet {worksheet:?}")]
  RowNotFound { worksheet: String, row: RowRef },

  #[error("row has {0} cells but the worksheet has {max} columns", max = drip_core::sheet::COLUMN_COUNT)]
  TooManyCells(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
