//! The `Worksheet` trait: a header row followed by rows of string cells.
//!
//! The trait is implemented by storage backends (e.g. `drip-store-sqlite`).
//! The campaign crate depends on this abstraction and parses rows into typed
//! [`Contact`](crate::contact::Contact)s at its boundary.

use std::{fmt, future::Future};

use crate::{Error, Result};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// The fixed contact schema, in store order. Discriminants are the 1-based
/// column numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
  Name          = 1,
  Email         = 2,
  Segment       = 3,
  LastEmailSent = 4,
  NextStepDate  = 5,
  Timestamp     = 6,
  Notes         = 7,
}

/// Number of columns in a contact row.
pub const COLUMN_COUNT: usize = 7;

impl Column {
  pub const ALL: [Column; COLUMN_COUNT] = [
    Column::Name,
    Column::Email,
    Column::Segment,
    Column::LastEmailSent,
    Column::NextStepDate,
    Column::Timestamp,
    Column::Notes,
  ];

  /// 1-based column number.
  pub fn number(self) -> usize { self as usize }

  /// 0-based offset into a record's cells.
  pub fn offset(self) -> usize { self as usize - 1 }

  /// Header cell text.
  pub fn header(self) -> &'static str {
    match self {
      Column::Name => "Name",
      Column::Email => "Email",
      Column::Segment => "Segment",
      Column::LastEmailSent => "Last_Email_Sent",
      Column::NextStepDate => "Next_Step_Date",
      Column::Timestamp => "Timestamp",
      Column::Notes => "Notes",
    }
  }

  pub fn from_number(n: usize) -> Result<Self> {
    Column::ALL
      .get(n.wrapping_sub(1))
      .copied()
      .ok_or(Error::UnknownColumn(n))
  }
}

impl fmt::Display for Column {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.header())
  }
}

// ─── Row references ──────────────────────────────────────────────────────────

/// Number of header rows above the first record.
pub const HEADER_ROWS: u32 = 1;

/// A 1-based store row number. Row 1 is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowRef(u32);

impl RowRef {
  /// Reference a data row by store row number; the header row is refused.
  pub fn new(row: u32) -> Result<Self> {
    if row <= HEADER_ROWS {
      return Err(Error::HeaderRow(row));
    }
    Ok(Self(row))
  }

  /// The row holding the `index`-th record (0-based) returned by
  /// [`Worksheet::records`].
  pub fn for_record(index: usize) -> Self {
    Self(index as u32 + HEADER_ROWS + 1)
  }

  pub fn get(self) -> u32 { self.0 }
}

impl fmt::Display for RowRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tabular contact store.
///
/// The store offers no transactions and no row locking: every
/// [`update_cell`](Worksheet::update_cell) is an independent write.
pub trait Worksheet: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All data rows below the header, in store order. Record `i` lives at
  /// [`RowRef::for_record(i)`](RowRef::for_record). Rows may be shorter than
  /// [`COLUMN_COUNT`]; missing trailing cells read as empty.
  fn records(&self) -> impl Future<Output = Result<Vec<Vec<String>>, Self::Error>> + Send + '_;

  /// Overwrite a single cell.
  fn update_cell(
    &self,
    row: RowRef,
    column: Column,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append a row after the last one and return where it landed.
  fn append_row(
    &self,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<RowRef, Self::Error>> + Send + '_;
}
