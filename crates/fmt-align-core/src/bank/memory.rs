//! In-memory banks
//!
//! Events serialize as a map of bank name to a map of column name to a typed
//! value list:
//!
//! ```json
//! {"REC::Track": {"pindex": {"short": [0, 1]}, "sector": {"byte": [2, 5]}}}
//! ```

use super::{DataEvent, RowTable};
use crate::error::{AlignError, BankError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    /// Signed 8-bit values
    Byte(Vec<i8>),
    /// Signed 16-bit values
    Short(Vec<i16>),
    /// Single precision values
    Float(Vec<f32>),
}

impl Column {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            Column::Byte(v) => v.len(),
            Column::Short(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    /// Whether the column holds no value
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str {
        match self {
            Column::Byte(_) => "byte",
            Column::Short(_) => "short",
            Column::Float(_) => "float",
        }
    }
}

/// A bank held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBank {
    name: String,
    columns: BTreeMap<String, Column>,
}

impl MemoryBank {
    /// Create an empty bank
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Bank name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a column
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// Add a byte column
    pub fn with_bytes(self, name: impl Into<String>, values: Vec<i8>) -> Self {
        self.with_column(name, Column::Byte(values))
    }

    /// Add a short column
    pub fn with_shorts(self, name: impl Into<String>, values: Vec<i16>) -> Self {
        self.with_column(name, Column::Short(values))
    }

    /// Add a float column
    pub fn with_floats(self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.with_column(name, Column::Float(values))
    }

    /// Check that every column has the same number of rows
    pub fn validate(&self) -> Result<()> {
        let rows = self.rows();
        for (column, values) in &self.columns {
            if values.len() != rows {
                return Err(BankError::RaggedColumns {
                    bank: self.name.clone(),
                    column: column.clone(),
                    len: values.len(),
                    rows,
                }
                .into());
            }
        }
        Ok(())
    }

    fn column(&self, column: &str) -> Result<&Column> {
        self.columns.get(column).ok_or_else(|| {
            BankError::MissingColumn {
                bank: self.name.clone(),
                column: column.to_string(),
            }
            .into()
        })
    }

    fn out_of_range(&self, row: usize, rows: usize) -> AlignError {
        BankError::RowOutOfRange {
            bank: self.name.clone(),
            row,
            rows,
        }
        .into()
    }

    fn type_mismatch(&self, column: &str, expected: &'static str, actual: &Column) -> AlignError {
        BankError::ColumnType {
            bank: self.name.clone(),
            column: column.to_string(),
            expected,
            actual: actual.type_name(),
        }
        .into()
    }
}

macro_rules! typed_read {
    ($self:ident, $column:ident, $row:ident, $variant:ident, $expected:literal) => {
        match $self.column($column)? {
            Column::$variant(values) => values
                .get($row)
                .copied()
                .ok_or_else(|| $self.out_of_range($row, values.len())),
            other => Err($self.type_mismatch($column, $expected, other)),
        }
    };
}

impl RowTable for MemoryBank {
    fn rows(&self) -> usize {
        self.columns.values().map(Column::len).max().unwrap_or(0)
    }

    fn get_byte(&self, column: &str, row: usize) -> Result<i8> {
        typed_read!(self, column, row, Byte, "byte")
    }

    fn get_short(&self, column: &str, row: usize) -> Result<i16> {
        typed_read!(self, column, row, Short, "short")
    }

    fn get_float(&self, column: &str, row: usize) -> Result<f32> {
        typed_read!(self, column, row, Float, "float")
    }
}

type RawEvent = BTreeMap<String, BTreeMap<String, Column>>;

/// An event held in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub struct MemoryEvent {
    banks: BTreeMap<String, MemoryBank>,
}

impl MemoryEvent {
    /// An event with no bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a bank
    pub fn with_bank(mut self, bank: MemoryBank) -> Self {
        self.banks.insert(bank.name.clone(), bank);
        self
    }

    /// Drop a bank, returning it if it was present
    pub fn remove_bank(&mut self, name: &str) -> Option<MemoryBank> {
        self.banks.remove(name)
    }

    /// Names of the banks present, sorted
    pub fn bank_names(&self) -> impl Iterator<Item = &str> {
        self.banks.keys().map(String::as_str)
    }
}

impl DataEvent for MemoryEvent {
    type Bank = MemoryBank;

    fn bank(&self, name: &str) -> Option<&MemoryBank> {
        self.banks.get(name)
    }
}

impl TryFrom<RawEvent> for MemoryEvent {
    type Error = AlignError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let mut event = MemoryEvent::new();
        for (name, columns) in raw {
            let bank = MemoryBank {
                name: name.clone(),
                columns,
            };
            bank.validate()?;
            event.banks.insert(name, bank);
        }
        Ok(event)
    }
}

impl From<MemoryEvent> for RawEvent {
    fn from(event: MemoryEvent) -> Self {
        event
            .banks
            .into_iter()
            .map(|(name, bank)| (name, bank.columns))
            .collect()
    }
}
