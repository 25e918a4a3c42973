//! In-memory record table: named columns over positional rows.

pub mod csv_io;
pub mod value;

pub use csv_io::{read_csv, read_csv_from_reader, write_csv, write_csv_to_writer};
pub use value::Value;

static MISSING: Value = Value::Missing;

/// An ordered sequence of rows sharing one header.
///
/// Row identity is positional. A row shorter than the header reads as
/// `Value::Missing` in the absent trailing cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column index); out-of-range cells are `Missing`
    pub fn cell(&self, row: usize, column: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&MISSING)
    }

    /// Keep only the rows at the given positions, in the given order.
    pub fn select_rows(&self, positions: &[usize]) -> RecordTable {
        RecordTable {
            columns: self.columns.clone(),
            rows: positions
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}
