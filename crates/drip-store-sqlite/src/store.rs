//! [`SqliteWorksheet`] — the SQLite implementation of [`Worksheet`].

use std::path::Path;

use drip_core::sheet::{COLUMN_COUNT, Column, RowRef, Worksheet};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{cell_column, header_cells, pad_cells},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// One named worksheet inside a SQLite file.
///
/// Several worksheets may share a file; each keeps its own header row and
/// row numbering. Cloning is cheap; the inner connection is
/// reference-counted.
#[derive(Clone)]
pub struct SqliteWorksheet {
  conn:      tokio_rusqlite::Connection,
  worksheet: String,
}

impl SqliteWorksheet {
  /// Open (or create) `worksheet` in the file at `path`.
  pub async fn open(path: impl AsRef<Path>, worksheet: impl Into<String>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let sheet = Self { conn, worksheet: worksheet.into() };
    sheet.init().await?;
    Ok(sheet)
  }

  /// Open an in-memory worksheet named `Sheet1`, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let sheet = Self { conn, worksheet: "Sheet1".to_owned() };
    sheet.init().await?;
    Ok(sheet)
  }

  pub fn name(&self) -> &str { &self.worksheet }

  /// Run the schema and write the header row if this worksheet is new.
  async fn init(&self) -> Result<()> {
    let worksheet = self.worksheet.clone();
    let header = header_cells();

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
          "INSERT OR IGNORE INTO worksheet_rows
             (worksheet, row_number, c1, c2, c3, c4, c5, c6, c7)
           VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            worksheet, header[0], header[1], header[2], header[3], header[4], header[5],
            header[6],
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The header row as stored.
  pub async fn header(&self) -> Result<Vec<String>> {
    let worksheet = self.worksheet.clone();
    let header = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT c1, c2, c3, c4, c5, c6, c7 FROM worksheet_rows
               WHERE worksheet = ?1 AND row_number = 1",
              rusqlite::params![worksheet],
              read_cells,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(header.unwrap_or_default())
  }
}

fn read_cells(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vec<String>> {
  (0..COLUMN_COUNT).map(|i| row.get::<_, String>(i)).collect()
}

// ─── Worksheet impl ──────────────────────────────────────────────────────────

impl Worksheet for SqliteWorksheet {
  type Error = Error;

  async fn records(&self) -> Result<Vec<Vec<String>>> {
    let worksheet = self.worksheet.clone();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c1, c2, c3, c4, c5, c6, c7 FROM worksheet_rows
           WHERE worksheet = ?1 AND row_number > 1
           ORDER BY row_number",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![worksheet], read_cells)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn update_cell(&self, row: RowRef, column: Column, value: String) -> Result<()> {
    let worksheet = self.worksheet.clone();
    let row_number = row.get();
    let sql = format!(
      "UPDATE worksheet_rows SET {} = ?1 WHERE worksheet = ?2 AND row_number = ?3",
      cell_column(column)
    );

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![value, worksheet, row_number])?))
      .await?;

    if changed == 0 {
      return Err(Error::RowNotFound { worksheet: self.worksheet.clone(), row });
    }
    Ok(())
  }

  async fn append_row(&self, cells: Vec<String>) -> Result<RowRef> {
    let cells = pad_cells(cells)?;
    let worksheet = self.worksheet.clone();

    let row_number: u32 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let last: u32 = tx.query_row(
          "SELECT COALESCE(MAX(row_number), 1) FROM worksheet_rows WHERE worksheet = ?1",
          rusqlite::params![worksheet],
          |r| r.get(0),
        )?;
        let next = last + 1;
        tx.execute(
          "INSERT INTO worksheet_rows
             (worksheet, row_number, c1, c2, c3, c4, c5, c6, c7)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            worksheet, next, cells[0], cells[1], cells[2], cells[3], cells[4], cells[5],
            cells[6],
          ],
        )?;
        tx.commit()?;
        Ok(next)
      })
      .await?;

    Ok(RowRef::new(row_number)?)
  }
}
