//! Table module.
//!
//! This module contains the in-memory recipient table: named columns in
//! a stable order and rows of string cells, mutated in place by the
//! merge runner and exportable as CSV once a run is over.

use regex::Regex;
use serde::Serialize;

use crate::Row;

/// Column holding the raw recipient address.
pub const EMAIL_COLUMN: &str = "Email";
/// Column holding the provider thread identifier, written back after
/// each send and read back for follow-up replies.
pub const THREAD_ID_COLUMN: &str = "ThreadId";
/// Column holding the durable RFC 2822 message identifier.
pub const RFC_MESSAGE_ID_COLUMN: &str = "RfcMessageId";

/// Represents the recipient table. Rows keep their index for the whole
/// run: they are never reordered nor deleted, so identifiers written
/// back for row `i` always land in the row they were produced for.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RowTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowTable {
    pub fn new<C: ToString>(columns: impl IntoIterator<Item = C>) -> Self {
        Self {
            columns: columns.into_iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row built from the given cells.
    pub fn push_row<K: ToString, V: ToString>(&mut self, cells: impl IntoIterator<Item = (K, V)>) {
        self.rows.push(cells.into_iter().collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        self.columns.as_slice()
    }

    pub fn rows(&self) -> &[Row] {
        self.rows.as_slice()
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Appends the given column when the table does not know it yet.
    pub fn ensure_column(&mut self, column: &str) {
        if !self.columns.iter().any(|known| known == column) {
            self.columns.push(column.to_string());
        }
    }

    /// Overwrites one cell in place, keyed by stable row index.
    pub fn set<V: ToString>(&mut self, idx: usize, column: &str, value: V) {
        self.ensure_column(column);
        if let Some(row) = self.rows.get_mut(idx) {
            row.set(column, value);
        }
    }

    /// Serializes the whole table, mutations included, as CSV.
    pub fn to_csv(&self) -> String {
        self.csv_of(self.rows.len())
    }

    /// Serializes the first `max_rows` rows as CSV. Column order is the
    /// table order, so the sample is deterministic for identical data.
    pub fn sample_csv(&self, max_rows: usize) -> String {
        self.csv_of(max_rows.min(self.rows.len()))
    }

    fn csv_of(&self, rows: usize) -> String {
        let mut csv = String::new();
        push_csv_line(&mut csv, self.columns.iter().map(String::as_str));
        for row in &self.rows[..rows] {
            push_csv_line(
                &mut csv,
                self.columns
                    .iter()
                    .map(|column| row.get(column).unwrap_or_default()),
            );
        }
        csv
    }
}

fn push_csv_line<'a>(csv: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            csv.push(',');
        }
        first = false;
        if cell.contains(&[',', '"', '\n', '\r'][..]) {
            csv.push('"');
            csv.push_str(&cell.replace('"', "\"\""));
            csv.push('"');
        } else {
            csv.push_str(cell);
        }
    }
    csv.push('\n');
}

/// Builds the download file name for an exported table from the label
/// it was sent under.
pub fn export_file_name(label: &str) -> String {
    let safe = Regex::new(r"[^A-Za-z0-9_-]")
        .unwrap()
        .replace_all(label, "_");
    format!("{}.csv", safe)
}
