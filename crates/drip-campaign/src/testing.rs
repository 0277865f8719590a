//! In-test collaborators: a worksheet and a transport that can be told to
//! fail, plus fixture helpers.

use std::{
  collections::HashMap,
  path::Path,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use drip_core::{
  mail::{MailTransport, Outgoing},
  sequence::{SequenceStep, sequence_key},
  sheet::{COLUMN_COUNT, Column, RowRef, Worksheet},
};

use crate::{campaign::Campaign, retry::RetryPolicy, settings::CampaignSettings};

pub fn cells(values: &[&str]) -> Vec<String> { values.iter().map(|s| s.to_string()).collect() }

pub fn instant_retry() -> RetryPolicy { RetryPolicy { attempts: 3, base_secs: 0, max_secs: 0 } }

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Injected(pub &'static str);

// ─── Worksheet ───────────────────────────────────────────────────────────────

/// A vector-backed worksheet whose next N reads or writes fail, optionally
/// only the writes to one column.
#[derive(Default)]
pub struct FlakySheet {
  rows:         Mutex<Vec<Vec<String>>>,
  fail_reads:   AtomicUsize,
  fail_writes:  AtomicUsize,
  fail_columns: Mutex<HashMap<Column, usize>>,
  writes:       AtomicUsize,
}

impl FlakySheet {
  pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
    let rows = rows
      .into_iter()
      .map(|mut r| {
        r.resize(COLUMN_COUNT, String::new());
        r
      })
      .collect();
    Self { rows: Mutex::new(rows), ..Self::default() }
  }

  pub fn fail_next_reads(&self, n: usize) { self.fail_reads.store(n, Ordering::SeqCst); }

  pub fn fail_next_writes(&self, n: usize) { self.fail_writes.store(n, Ordering::SeqCst); }

  /// Fail the next `n` cell updates to `column`; other columns are unaffected.
  pub fn fail_writes_to(&self, column: Column, n: usize) {
    self.fail_columns.lock().unwrap().insert(column, n);
  }

  /// Successful cell updates so far.
  pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  pub fn records_len(&self) -> usize { self.rows.lock().unwrap().len() }

  pub fn row(&self, index: usize) -> Vec<String> { self.rows.lock().unwrap()[index].clone() }

  pub fn cell(&self, index: usize, column: Column) -> String {
    self.row(index)[column.offset()].clone()
  }

  fn take_failure(counter: &AtomicUsize) -> bool {
    counter
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }

  fn take_column_failure(&self, column: Column) -> bool {
    let mut columns = self.fail_columns.lock().unwrap();
    match columns.get_mut(&column) {
      Some(n) if *n > 0 => {
        *n -= 1;
        true
      }
      _ => false,
    }
  }
}

impl Worksheet for FlakySheet {
  type Error = Injected;

  async fn records(&self) -> Result<Vec<Vec<String>>, Injected> {
    if Self::take_failure(&self.fail_reads) {
      return Err(Injected("read failed"));
    }
    Ok(self.rows.lock().unwrap().clone())
  }

  async fn update_cell(&self, row: RowRef, column: Column, value: String) -> Result<(), Injected> {
    if Self::take_failure(&self.fail_writes) || self.take_column_failure(column) {
      return Err(Injected("write failed"));
    }
    let mut rows = self.rows.lock().unwrap();
    let index = (row.get() - 2) as usize;
    let record = rows.get_mut(index).ok_or(Injected("no such row"))?;
    record[column.offset()] = value;
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn append_row(&self, mut cells: Vec<String>) -> Result<RowRef, Injected> {
    if Self::take_failure(&self.fail_writes) {
      return Err(Injected("write failed"));
    }
    cells.resize(COLUMN_COUNT, String::new());
    let mut rows = self.rows.lock().unwrap();
    rows.push(cells);
    Ok(RowRef::for_record(rows.len() - 1))
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Records every delivered message; the next N deliveries fail.
#[derive(Default)]
pub struct RecordingTransport {
  sent:  Mutex<Vec<Outgoing>>,
  fail:  AtomicUsize,
  tries: AtomicUsize,
}

impl RecordingTransport {
  pub fn fail_next(&self, n: usize) { self.fail.store(n, Ordering::SeqCst); }

  pub fn sent(&self) -> Vec<Outgoing> { self.sent.lock().unwrap().clone() }

  /// Delivery attempts, successful or not.
  pub fn tries(&self) -> usize { self.tries.load(Ordering::SeqCst) }
}

impl MailTransport for RecordingTransport {
  type Error = Injected;

  async fn deliver<'a>(&'a self, mail: &'a Outgoing) -> Result<(), Injected> {
    self.tries.fetch_add(1, Ordering::SeqCst);
    if FlakySheet::take_failure(&self.fail) {
      return Err(Injected("smtp unavailable"));
    }
    self.sent.lock().unwrap().push(mail.clone());
    Ok(())
  }
}

// ─── Sequences ───────────────────────────────────────────────────────────────

pub fn step(subject: &str, body: &str) -> SequenceStep {
  SequenceStep { subject: subject.into(), body: body.into() }
}

/// Write `steps` as the sequence resource for `segment` under `folder`.
pub fn write_sequence(folder: &Path, segment: &str, steps: &[SequenceStep]) {
  let json = serde_json::to_string(steps).unwrap();
  std::fs::write(folder.join(sequence_key(segment).unwrap()), json).unwrap();
}

// ─── Campaign ────────────────────────────────────────────────────────────────

pub type TestCampaign = Campaign<FlakySheet, RecordingTransport>;

/// Settings over `folder` offering `Credit Building` and `Business Financing`,
/// never sleeping between retries.
pub fn settings(folder: &Path) -> CampaignSettings {
  CampaignSettings {
    segments: vec!["Credit Building".into(), "Business Financing".into()],
    store_retry: instant_retry(),
    ..CampaignSettings::new(folder)
  }
}

pub fn campaign(settings: CampaignSettings, rows: Vec<Vec<String>>) -> TestCampaign {
  Campaign::new(FlakySheet::with_rows(rows), RecordingTransport::default(), settings).unwrap()
}

impl TestCampaign {
  pub fn sheet(&self) -> &FlakySheet { self.store().sheet() }

  pub fn transport(&self) -> &RecordingTransport { self.sender().transport() }
}
