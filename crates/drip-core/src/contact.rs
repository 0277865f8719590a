//! One worksheet row as a typed [`Contact`], parsed once at the store boundary.
//!
//! Cells are plain strings in the store. Parsing never fails: malformed
//! cursor cells become [`StepMarker::Unrecognized`] and unparseable dates
//! become `None`, so a single bad row can never stop a pass.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{
  address::{normalize, normalize_email},
  sheet::{Column, RowRef},
};

/// Segment cell value of a contact that has not chosen a topic yet.
pub const PENDING_SEGMENT: &str = "Pending Segment Selection";

/// Cell format of `Next_Step_Date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cell format of `Timestamp`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Segment ─────────────────────────────────────────────────────────────────

/// The segment cell, interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "label", rename_all = "snake_case")]
pub enum SegmentState {
  /// Blank cell.
  Unset,
  /// The [`PENDING_SEGMENT`] sentinel, in any spacing or case.
  Pending,
  /// A chosen topic label, trimmed.
  Assigned(String),
}

impl SegmentState {
  pub fn parse(raw: &str) -> Self {
    let key = normalize(raw);
    if key.is_empty() {
      Self::Unset
    } else if key == normalize(PENDING_SEGMENT) {
      Self::Pending
    } else {
      Self::Assigned(raw.replace('\u{a0}', " ").trim().to_owned())
    }
  }

  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }

  pub fn label(&self) -> Option<&str> {
    match self {
      Self::Assigned(label) => Some(label),
      _ => None,
    }
  }
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// The `Last_Email_Sent` cell: how far through its sequence a contact is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepMarker {
  /// `Week N`: the first N steps have been sent.
  Week(u32),
  /// `CTA Loop`: the sequence is exhausted; the call-to-action recurs.
  CtaLoop,
  /// Anything else found in the cell.
  Unrecognized(String),
}

impl StepMarker {
  /// Parse a cell. A blank cell means no step has been sent.
  pub fn parse(raw: &str) -> Option<Self> {
    let key = normalize(raw);
    if key.is_empty() {
      return None;
    }
    if key == "cta loop" {
      return Some(Self::CtaLoop);
    }
    let parsed = key
      .strip_prefix("week")
      .map(str::trim)
      .and_then(|n| n.parse::<u32>().ok());
    Some(match parsed {
      Some(n) => Self::Week(n),
      None => Self::Unrecognized(raw.trim().to_owned()),
    })
  }
}

impl fmt::Display for StepMarker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Week(n) => write!(f, "Week {n}"),
      Self::CtaLoop => f.write_str("CTA Loop"),
      Self::Unrecognized(raw) => f.write_str(raw),
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A typed view of one worksheet row.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
  /// Where this contact lives in the store.
  #[serde(skip)]
  pub row:            RowRef,
  pub name:           String,
  /// Normalised; empty if the cell was blank.
  pub email:          String,
  pub segment:        SegmentState,
  pub last_step:      Option<StepMarker>,
  pub next_send_date: Option<NaiveDate>,
  pub created_at:     Option<NaiveDateTime>,
  pub notes:          String,
}

impl Contact {
  /// Interpret the cells of the row at `row`.
  pub fn from_cells(row: RowRef, cells: &[String]) -> Self {
    let cell = |column: Column| cells.get(column.offset()).map(String::as_str).unwrap_or("");

    Self {
      row,
      name: cell(Column::Name).replace('\u{a0}', " ").trim().to_owned(),
      email: normalize_email(cell(Column::Email)),
      segment: SegmentState::parse(cell(Column::Segment)),
      last_step: StepMarker::parse(cell(Column::LastEmailSent)),
      next_send_date: parse_date(cell(Column::NextStepDate)),
      created_at: NaiveDateTime::parse_from_str(cell(Column::Timestamp).trim(), TIMESTAMP_FORMAT)
        .ok(),
      notes: cell(Column::Notes).to_owned(),
    }
  }

  /// Whether a send is due on `today`. Contacts with no date are never due.
  pub fn is_due(&self, today: NaiveDate) -> bool { self.next_send_date == Some(today) }
}

/// Parse a `Next_Step_Date` cell.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Render a date for a `Next_Step_Date` cell.
pub fn format_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

/// Render a timestamp for the `Timestamp` cell.
pub fn format_timestamp(at: NaiveDateTime) -> String { at.format(TIMESTAMP_FORMAT).to_string() }

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input for intake: a validated, not-yet-stored pending contact.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub name:       String,
  pub email:      String,
  pub created_at: NaiveDateTime,
}

impl NewContact {
  /// Validate and normalise intake input.
  pub fn new(name: &str, email: &str, created_at: NaiveDateTime) -> crate::Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(crate::Error::BlankName);
    }
    let email = normalize_email(email);
    if !crate::address::is_valid_email(&email) {
      return Err(crate::Error::InvalidEmail(email));
    }
    Ok(Self { name: name.to_owned(), email, created_at })
  }

  /// The full row, in column order.
  pub fn into_cells(self) -> Vec<String> {
    vec![
      self.name,
      self.email,
      PENDING_SEGMENT.to_owned(),
      String::new(),
      String::new(),
      format_timestamp(self.created_at),
      String::new(),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cells(values: &[&str]) -> Vec<String> { values.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn parses_a_full_row() {
    let row = RowRef::for_record(0);
    let c = Contact::from_cells(
      row,
      &cells(&[
        " Alice ",
        " Alice@Example.com ",
        "Credit Building",
        "Week 2",
        "2024-05-01",
        "2024-04-17 09:30:00",
        "vip",
      ]),
    );
    assert_eq!(c.row, row);
    assert_eq!(c.name, "Alice");
    assert_eq!(c.email, "alice@example.com");
    assert_eq!(c.segment, SegmentState::Assigned("Credit Building".into()));
    assert_eq!(c.last_step, Some(StepMarker::Week(2)));
    assert_eq!(c.next_send_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    assert!(c.created_at.is_some());
    assert_eq!(c.notes, "vip");
  }

  #[test]
  fn short_rows_read_as_blank() {
    let c = Contact::from_cells(RowRef::for_record(3), &cells(&["Bob", "bob@example.com"]));
    assert_eq!(c.segment, SegmentState::Unset);
    assert_eq!(c.last_step, None);
    assert_eq!(c.next_send_date, None);
    assert_eq!(c.created_at, None);
  }

  #[test]
  fn pending_sentinel_matches_loosely() {
    assert_eq!(SegmentState::parse("Pending Segment Selection"), SegmentState::Pending);
    assert_eq!(SegmentState::parse("pending\u{a0}segment selection "), SegmentState::Pending);
    assert_eq!(SegmentState::parse("   "), SegmentState::Unset);
  }

  #[test]
  fn step_markers() {
    assert_eq!(StepMarker::parse(""), None);
    assert_eq!(StepMarker::parse("Week 3"), Some(StepMarker::Week(3)));
    assert_eq!(StepMarker::parse("week 10"), Some(StepMarker::Week(10)));
    assert_eq!(StepMarker::parse("CTA Loop"), Some(StepMarker::CtaLoop));
    assert_eq!(
      StepMarker::parse("Week three"),
      Some(StepMarker::Unrecognized("Week three".into()))
    );
    assert_eq!(StepMarker::Week(4).to_string(), "Week 4");
    assert_eq!(StepMarker::CtaLoop.to_string(), "CTA Loop");
  }

  #[test]
  fn malformed_date_is_never_due() {
    let c = Contact::from_cells(
      RowRef::for_record(0),
      &cells(&["A", "a@example.com", "X", "", "05/01/2024"]),
    );
    assert_eq!(c.next_send_date, None);
    assert!(!c.is_due(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
  }

  #[test]
  fn new_contact_validates() {
    let at = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
    assert!(matches!(NewContact::new("  ", "a@example.com", at), Err(crate::Error::BlankName)));
    assert!(matches!(NewContact::new("A", "nope", at), Err(crate::Error::InvalidEmail(_))));

    let cells = NewContact::new(" Ann ", " Ann@Example.com", at).unwrap().into_cells();
    assert_eq!(cells, vec![
      "Ann",
      "ann@example.com",
      PENDING_SEGMENT,
      "",
      "",
      "2024-01-02 03:04:05",
      "",
    ]);
  }
}
