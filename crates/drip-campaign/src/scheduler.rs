//! The daily pass: send each due contact the next step of its segment's
//! sequence, or the recurring call-to-action once the sequence is exhausted.
//!
//! A pass walks the rows once, in store order, and never stops early because
//! of one row. Per row the order is always send first, then advance the
//! cursor; a failed send leaves the row due so the next pass on the same day
//! tries again. A failed cursor write is counted and logged but does not undo
//! the send. The cursor never moves unless `Next_Step_Date` moved first, so a
//! row is never both advanced and still due.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use chrono::NaiveDate;
use drip_core::{
  contact::{Contact, SegmentState, StepMarker},
  mail::MailTransport,
  sequence::{SequenceStep, personalize, sequence_key},
  sheet::Worksheet,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Result, campaign::Campaign};

/// What a single pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  /// Data rows read from the store.
  pub rows:               usize,
  /// Sequence steps sent.
  pub sent:               usize,
  /// Call-to-action messages sent.
  pub cta_sent:           usize,
  /// Rows with no email or no segment.
  pub skipped_incomplete: usize,
  /// Rows still awaiting segment selection.
  pub skipped_pending:    usize,
  /// Rows whose next send is not today.
  pub skipped_not_due:    usize,
  /// Rows whose email was already messaged earlier in this pass.
  pub skipped_duplicate:  usize,
  /// Rows whose segment has no usable sequence.
  pub skipped_no_sequence: usize,
  pub send_failures:      usize,
  /// Cursor cells that could not be written after a successful send.
  pub write_failures:     usize,
}

impl RunReport {
  /// Messages sent of either kind.
  pub fn total_sent(&self) -> usize { self.sent + self.cta_sent }
}

impl fmt::Display for RunReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} rows: {} sequence emails and {} call-to-action emails sent; skipped {} incomplete, {} \
       pending, {} not due, {} duplicate, {} without a sequence; {} send failures, {} write \
       failures",
      self.rows,
      self.sent,
      self.cta_sent,
      self.skipped_incomplete,
      self.skipped_pending,
      self.skipped_not_due,
      self.skipped_duplicate,
      self.skipped_no_sequence,
      self.send_failures,
      self.write_failures,
    )
  }
}

/// Position in the sequence implied by the cursor cell.
fn step_index(contact: &Contact, sequence_len: usize) -> usize {
  match &contact.last_step {
    None => 0,
    Some(StepMarker::Week(n)) => *n as usize,
    Some(StepMarker::CtaLoop) => sequence_len,
    Some(StepMarker::Unrecognized(raw)) => {
      warn!(row = %contact.row, email = %contact.email, value = %raw, "unrecognised Last_Email_Sent; starting from the first step");
      0
    }
  }
}

impl<W: Worksheet, T: MailTransport> Campaign<W, T> {
  /// Run one pass for `today`.
  ///
  /// Only a failure to read the rows at all is an error; everything that goes
  /// wrong for a single row is logged and counted in the report.
  pub async fn run_once(&self, today: NaiveDate) -> Result<RunReport> {
    let contacts = self.store().list_all().await?;
    let mut report = RunReport { rows: contacts.len(), ..RunReport::default() };
    let mut messaged = HashSet::new();
    let mut sequences: HashMap<String, Vec<SequenceStep>> = HashMap::new();

    for contact in &contacts {
      let segment = match &contact.segment {
        _ if contact.email.is_empty() => {
          report.skipped_incomplete += 1;
          continue;
        }
        SegmentState::Unset => {
          report.skipped_incomplete += 1;
          continue;
        }
        SegmentState::Pending => {
          report.skipped_pending += 1;
          continue;
        }
        SegmentState::Assigned(label) => label,
      };

      if !contact.is_due(today) {
        report.skipped_not_due += 1;
        continue;
      }

      if messaged.contains(&contact.email) {
        debug!(row = %contact.row, email = %contact.email, "already messaged in this pass");
        report.skipped_duplicate += 1;
        continue;
      }

      let key = sequence_key(segment);
      if let Some(key) = &key
        && !sequences.contains_key(key)
      {
        let steps = self.sequences().load(segment).await;
        sequences.insert(key.clone(), steps);
      }
      let sequence = key
        .as_ref()
        .and_then(|key| sequences.get(key))
        .map(Vec::as_slice)
        .unwrap_or_default();
      if sequence.is_empty() {
        warn!(row = %contact.row, email = %contact.email, %segment, "no sequence for segment; skipping");
        report.skipped_no_sequence += 1;
        continue;
      }

      let index = step_index(contact, sequence.len());
      let cta = &self.settings().cta;
      let (subject, template, marker) = match sequence.get(index) {
        Some(step) => (&step.subject, &step.body, StepMarker::Week(index as u32 + 1)),
        None => (&cta.subject, &cta.body, StepMarker::CtaLoop),
      };

      let body = personalize(template, &contact.name);
      if !self.sender().send(subject, &body, &contact.email).await {
        report.send_failures += 1;
        continue;
      }

      messaged.insert(contact.email.clone());
      match marker {
        StepMarker::CtaLoop => report.cta_sent += 1,
        _ => report.sent += 1,
      }

      let failed = self
        .store()
        .advance_cursor(contact.row, &marker.to_string(), self.next_send_after(today))
        .await;
      if failed > 0 {
        warn!(row = %contact.row, email = %contact.email, failed, "sent, but the cursor was not fully advanced");
        report.write_failures += failed;
      }
    }

    info!(
      rows = report.rows,
      sent = report.sent,
      cta_sent = report.cta_sent,
      send_failures = report.send_failures,
      write_failures = report.write_failures,
      "campaign pass finished"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use drip_core::{
    contact::PENDING_SEGMENT,
    mail::Outgoing,
    sheet::{Column, Worksheet},
  };

  use super::*;
  use crate::{
    Error,
    testing::{campaign, cells, settings, step, write_sequence},
  };

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, d).unwrap() }

  const TODAY: &str = "2024-05-01";
  const NEXT_WEEK: &str = "2024-05-08";

  fn credit_building(dir: &std::path::Path, steps: usize) {
    let steps: Vec<_> = (1..=steps)
      .map(|i| step(&format!("S{i}"), &format!("Step {i} for {{name}}")))
      .collect();
    write_sequence(dir, "Credit Building", &steps);
  }

  #[tokio::test]
  async fn first_step_is_sent_and_cursor_advanced() {
    let dir = tempfile::tempdir().unwrap();
    write_sequence(dir.path(), "Credit Building", &[step("S1", "Hi {name}")]);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "Alice",
      "alice@example.com",
      "Credit Building",
      "",
      TODAY,
    ])]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(c.transport().sent(), vec![Outgoing::plain("alice@example.com", "S1", "Hi Alice")]);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "Week 1");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), NEXT_WEEK);
  }

  #[tokio::test]
  async fn second_pass_on_the_same_day_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 3);
    let c = campaign(settings(dir.path()), vec![
      cells(&["Alice", "alice@example.com", "Credit Building", "", TODAY]),
      cells(&["Bob", "bob@example.com", "Credit Building", "Week 3", TODAY]),
    ]);

    let first = c.run_once(day(1)).await.unwrap();
    assert_eq!(first.total_sent(), 2);

    let second = c.run_once(day(1)).await.unwrap();
    assert_eq!(second.total_sent(), 0);
    assert_eq!(second.skipped_not_due, 2);
    assert_eq!(c.transport().sent().len(), 2);
  }

  #[tokio::test]
  async fn exhausted_sequence_sends_the_call_to_action() {
    let dir = tempfile::tempdir().unwrap();
    write_sequence(dir.path(), "Credit Building", &[step("S1", "Hi {name}")]);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "Alice",
      "alice@example.com",
      "Credit Building",
      "Week 1",
      TODAY,
    ])]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.cta_sent, 1);
    let sent = c.transport().sent();
    assert_eq!(sent[0].subject, c.settings().cta.subject);
    assert!(sent[0].body.starts_with("Hi Alice,"));
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "CTA Loop");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), NEXT_WEEK);
  }

  #[tokio::test]
  async fn week_equal_to_length_is_the_call_to_action() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 3);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Credit Building", "Week 3", TODAY]),
      cells(&["B", "b@example.com", "Credit Building", "Week 9", TODAY]),
      cells(&["C", "c@example.com", "Credit Building", "Week 2", TODAY]),
    ]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.cta_sent, 2);
    assert_eq!(report.sent, 1);
    assert_eq!(c.transport().sent()[2].subject, "S3");
    assert_eq!(c.sheet().cell(2, Column::LastEmailSent), "Week 3");
  }

  #[tokio::test]
  async fn call_to_action_recurs_every_cadence() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 1);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "",
      "alice@example.com",
      "Credit Building",
      "CTA Loop",
      TODAY,
    ])]);

    assert_eq!(c.run_once(day(1)).await.unwrap().cta_sent, 1);
    assert_eq!(c.run_once(day(8)).await.unwrap().cta_sent, 1);
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), "2024-05-15");
    assert!(c.transport().sent()[0].body.starts_with("Hi there,"));
  }

  #[tokio::test]
  async fn pending_and_incomplete_rows_are_never_messaged() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![
      cells(&["P", "p@example.com", PENDING_SEGMENT, "", TODAY]),
      cells(&["Q", "q@example.com", "pending\u{a0}segment selection", "", TODAY]),
      cells(&["N", "", "Credit Building", "", TODAY]),
      cells(&["U", "u@example.com", "", "", TODAY]),
    ]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.skipped_pending, 2);
    assert_eq!(report.skipped_incomplete, 2);
    assert_eq!(c.transport().tries(), 0);
    assert_eq!(c.sheet().writes(), 0);
  }

  #[tokio::test]
  async fn only_rows_due_today_are_messaged() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Credit Building", "Week 1", "2024-04-30"]),
      cells(&["B", "b@example.com", "Credit Building", "Week 1", "2024-05-02"]),
      cells(&["C", "c@example.com", "Credit Building", "Week 1", ""]),
      cells(&["D", "d@example.com", "Credit Building", "Week 1", "May 1st"]),
    ]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.skipped_not_due, 4);
    assert_eq!(c.transport().tries(), 0);
  }

  #[tokio::test]
  async fn failed_send_leaves_the_row_due() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Credit Building", "Week 1", TODAY]),
      cells(&["B", "b@example.com", "Credit Building", "", TODAY]),
    ]);
    c.transport().fail_next(1);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.send_failures, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "Week 1");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), TODAY);
    assert_eq!(c.sheet().cell(1, Column::LastEmailSent), "Week 1");

    let retry = c.run_once(day(1)).await.unwrap();
    assert_eq!(retry.sent, 1);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "Week 2");
  }

  #[tokio::test]
  async fn failed_cursor_write_does_not_stop_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Credit Building", "", TODAY]),
      cells(&["B", "b@example.com", "Credit Building", "", TODAY]),
    ]);
    // Three attempts at the first row's Next_Step_Date.
    c.sheet().fail_next_writes(3);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.write_failures, 2);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), TODAY);
    assert_eq!(c.sheet().cell(1, Column::LastEmailSent), "Week 1");
  }

  #[tokio::test]
  async fn failed_date_write_never_skips_a_step() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 3);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "A",
      "a@example.com",
      "Credit Building",
      "",
      TODAY,
    ])]);
    c.sheet().fail_writes_to(Column::NextStepDate, 3);

    let first = c.run_once(day(1)).await.unwrap();
    assert_eq!(first.sent, 1);
    assert_eq!(first.write_failures, 2);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), TODAY);

    // The row is still due, but at the same step.
    c.run_once(day(1)).await.unwrap();
    assert_eq!(c.run_once(day(1)).await.unwrap().total_sent(), 0);
    let subjects: Vec<_> = c.transport().sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, ["S1", "S1"]);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "Week 1");
    assert_eq!(c.sheet().cell(0, Column::NextStepDate), NEXT_WEEK);
  }

  #[tokio::test]
  async fn failed_cursor_write_repeats_the_step_next_cadence() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 3);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "A",
      "a@example.com",
      "Credit Building",
      "",
      TODAY,
    ])]);
    c.sheet().fail_writes_to(Column::LastEmailSent, 3);

    assert_eq!(c.run_once(day(1)).await.unwrap().write_failures, 1);
    assert_eq!(c.run_once(day(1)).await.unwrap().total_sent(), 0);

    c.run_once(day(8)).await.unwrap();
    let subjects: Vec<_> = c.transport().sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, ["S1", "S1"]);
  }

  #[tokio::test]
  async fn stored_labels_cannot_reach_files_outside_the_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("email_sequences");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(dir.path().join("secret.json"), r#"[{"subject": "LEAKED", "body": "x"}]"#)
      .unwrap();
    let c = campaign(settings(&folder), vec![cells(&[
      "Eve",
      "eve@example.com",
      "../secret",
      "",
      TODAY,
    ])]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.skipped_no_sequence, 1);
    assert_eq!(c.transport().tries(), 0);
  }

  #[tokio::test]
  async fn unrecognised_cursor_starts_over() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "A",
      "a@example.com",
      "Credit Building",
      "Week two",
      TODAY,
    ])]);

    c.run_once(day(1)).await.unwrap();
    assert_eq!(c.transport().sent()[0].subject, "S1");
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "Week 1");
  }

  #[tokio::test]
  async fn missing_sequence_skips_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 1);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Crypto", "", TODAY]),
      cells(&["B", "b@example.com", "Credit Building", "", TODAY]),
    ]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.skipped_no_sequence, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(c.sheet().cell(0, Column::LastEmailSent), "");
  }

  #[tokio::test]
  async fn duplicate_rows_get_one_message() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![
      cells(&["A", "a@example.com", "Credit Building", "", TODAY]),
      cells(&["A again", " A@Example.com", "Credit Building", "", TODAY]),
    ]);

    let report = c.run_once(day(1)).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(c.sheet().cell(1, Column::LastEmailSent), "");
  }

  #[tokio::test]
  async fn unreadable_store_fails_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let c = campaign(settings(dir.path()), vec![]);
    c.sheet().fail_next_reads(3);
    assert!(matches!(c.run_once(day(1)).await, Err(Error::Store(_))));
  }

  #[tokio::test]
  async fn assignment_then_pass_sends_the_first_step() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let c = campaign(settings(dir.path()), vec![cells(&[
      "Alice",
      "alice@example.com",
      PENDING_SEGMENT,
    ])]);

    assert!(c.assign_on("Alice@Example.com", "Credit Building", day(1)).await.unwrap());
    c.run_once(day(1)).await.unwrap();
    assert_eq!(c.transport().sent(), vec![Outgoing::plain(
      "alice@example.com",
      "S1",
      "Step 1 for Alice"
    )]);
  }

  #[tokio::test]
  async fn full_lifecycle_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    credit_building(dir.path(), 2);
    let sheet = drip_store_sqlite::SqliteWorksheet::open_in_memory().await.unwrap();
    sheet
      .append_row(cells(&["Alice", "alice@example.com", PENDING_SEGMENT, "", "", "2024-04-30 10:00:00"]))
      .await
      .unwrap();
    let c = Campaign::new(
      sheet,
      crate::testing::RecordingTransport::default(),
      settings(dir.path()),
    )
    .unwrap();

    assert!(c.assign_on("alice@example.com", "Credit Building", day(1)).await.unwrap());
    for (d, expected) in [(1, "Week 1"), (8, "Week 2"), (15, "CTA Loop"), (22, "CTA Loop")] {
      let report = c.run_once(day(d)).await.unwrap();
      assert_eq!(report.total_sent(), 1, "day {d}");
      let rows = c.store().sheet().records().await.unwrap();
      assert_eq!(rows[0][Column::LastEmailSent.offset()], expected);
    }
    let subjects: Vec<_> =
      c.sender().transport().sent().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects[..2], ["S1".to_owned(), "S2".to_owned()]);
  }
}
