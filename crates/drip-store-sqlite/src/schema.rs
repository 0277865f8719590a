//! SQL schema for the drip SQLite worksheet store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per worksheet row. Cells are positional, like a spreadsheet:
-- c1 = Name, c2 = Email, c3 = Segment, c4 = Last_Email_Sent,
-- c5 = Next_Step_Date, c6 = Timestamp, c7 = Notes.
-- row_number 1 holds the header. Rows are never deleted.
CREATE TABLE IF NOT EXISTS worksheet_rows (
    worksheet  TEXT    NOT NULL,
    row_number INTEGER NOT NULL,
    c1         TEXT    NOT NULL DEFAULT '',
    c2         TEXT    NOT NULL DEFAULT '',
    c3         TEXT    NOT NULL DEFAULT '',
    c4         TEXT    NOT NULL DEFAULT '',
    c5         TEXT    NOT NULL DEFAULT '',
    c6         TEXT    NOT NULL DEFAULT '',
    c7         TEXT    NOT NULL DEFAULT '',
    PRIMARY KEY (worksheet, row_number),
    CHECK (row_number >= 1)
);

PRAGMA user_version = 1;
";
