//! Mapping between the contact schema and the positional cell columns.

use drip_core::sheet::{COLUMN_COUNT, Column};

use crate::{Error, Result};

/// SQL column holding `column`'s cells. Only ever interpolated from this
/// closed set.
pub fn cell_column(column: Column) -> &'static str {
  match column {
    Column::Name => "c1",
    Column::Email => "c2",
    Column::Segment => "c3",
    Column::LastEmailSent => "c4",
    Column::NextStepDate => "c5",
    Column::Timestamp => "c6",
    Column::Notes => "c7",
  }
}

/// Pad `cells` with blanks to exactly [`COLUMN_COUNT`] entries.
pub fn pad_cells(mut cells: Vec<String>) -> Result<Vec<String>> {
  if cells.len() > COLUMN_COUNT {
    return Err(Error::TooManyCells(cells.len()));
  }
  cells.resize(COLUMN_COUNT, String::new());
  Ok(cells)
}

/// The header row in column order.
pub fn header_cells() -> Vec<String> {
  Column::ALL.iter().map(|c| c.header().to_owned()).collect()
}
