//! Pipe-delimited `-Y` tables and declarative column mappings
//!
//! ctdb's machine-readable output is a header line followed by data lines,
//! every line split on `|`. Columns are matched by name, never by position,
//! since column order is not stable across ctdb versions. Each record type
//! declares its fields once as a slice of [`ColumnField`]:
//! - Column name to match in the header
//! - Parse strategy (verbatim text, `1` flag, `Y` marker, integer, real)
//! - Setter storing the parsed value on the record
//!
//! A value that is empty or fails to parse leaves the field at its default.

use tracing::debug;

use crate::utils::{CtdbError, Result};

/// Column delimiter used by `-Y` output
pub const DELIMITER: char = '|';

/// Parse strategy for a single column value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Keep the text as-is
    Verbatim,
    /// `1` is set, anything else is unset
    Flag,
    /// `Y` is set, anything else is unset
    Marker,
    /// Parse as integer, widen to f64
    Integer,
    /// Parse as f64
    Real,
}

/// Parsed column value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

/// Parse a raw column value according to a strategy
///
/// Returns `None` when the value cannot be coerced, in which case the caller
/// leaves the field untouched.
pub fn parse_value(raw: &str, strategy: ParseStrategy) -> Option<FieldValue<'_>> {
    match strategy {
        ParseStrategy::Verbatim => Some(FieldValue::Text(raw)),
        ParseStrategy::Flag => Some(FieldValue::Number(if raw == "1" { 1.0 } else { 0.0 })),
        ParseStrategy::Marker => Some(FieldValue::Number(if raw == "Y" { 1.0 } else { 0.0 })),
        ParseStrategy::Integer => raw.parse::<i64>().ok().map(|v| FieldValue::Number(v as f64)),
        ParseStrategy::Real => raw.parse::<f64>().ok().map(FieldValue::Number),
    }
}

/// Setter for a mapped field
pub enum Setter<T> {
    Text(fn(&mut T, &str)),
    Number(fn(&mut T, f64)),
}

/// Definition of a column to extract into a record of type `T`
pub struct ColumnField<T> {
    /// Header name to match (exact)
    pub column: &'static str,
    /// How to parse the value
    pub strategy: ParseStrategy,
    /// Where to store it
    pub setter: Setter<T>,
}

impl<T> ColumnField<T> {
    /// Column stored verbatim as text
    pub const fn text(column: &'static str, set: fn(&mut T, &str)) -> Self {
        Self {
            column,
            strategy: ParseStrategy::Verbatim,
            setter: Setter::Text(set),
        }
    }

    /// Numeric column with the given strategy
    pub const fn number(column: &'static str, strategy: ParseStrategy, set: fn(&mut T, f64)) -> Self {
        Self {
            column,
            strategy,
            setter: Setter::Number(set),
        }
    }

    /// Check if this field matches a header column
    pub fn matches(&self, column: &str) -> bool {
        !column.is_empty() && column == self.column
    }

    /// Parse `raw` and store it on `record`; unparsable values are skipped
    pub fn apply(&self, record: &mut T, raw: &str) {
        match (parse_value(raw, self.strategy), &self.setter) {
            (Some(FieldValue::Text(text)), Setter::Text(set)) => set(record, text),
            (Some(FieldValue::Number(value)), Setter::Number(set)) => set(record, value),
            // constructors pair text setters with Verbatim only
            _ => {}
        }
    }
}

/// A `-Y` table split into header columns and raw data lines
#[derive(Debug, Clone)]
pub struct PipeTable<'a> {
    columns: Vec<&'a str>,
    rows: Vec<&'a str>,
}

impl<'a> PipeTable<'a> {
    /// Split raw command output into header and data lines
    ///
    /// `command` names the producing invocation for error context. Blank data
    /// lines are dropped; empty output is an error.
    pub fn parse(command: &str, raw: &'a str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(CtdbError::EmptyOutput {
                command: command.to_string(),
            });
        }

        let mut lines = raw.split('\n').map(|line| line.trim_end_matches('\r'));
        let header = lines.next().unwrap_or_default();
        let columns = header.split(DELIMITER).collect();
        let rows: Vec<&str> = lines.filter(|line| !line.trim().is_empty()).collect();

        debug!(command, rows = rows.len(), "parsed table");
        Ok(Self { columns, rows })
    }

    /// Raw data lines
    pub fn rows(&self) -> &[&'a str] {
        &self.rows
    }

    /// Number of lines including the header
    pub fn line_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Decode one data line into a fresh record
    ///
    /// Values are dispatched by the header name at their position; empty
    /// values, unknown columns and positions past the header are ignored.
    pub fn decode_row<T: Default>(&self, row: &str, fields: &[ColumnField<T>]) -> T {
        let mut record = T::default();
        for (idx, value) in row.split(DELIMITER).enumerate() {
            if value.is_empty() {
                continue;
            }
            let Some(column) = self.columns.get(idx) else {
                continue;
            };
            if let Some(field) = fields.iter().find(|f| f.matches(column)) {
                field.apply(&mut record, value);
            }
        }
        record
    }

    /// Decode every data line, in order
    pub fn decode_all<T: Default>(&self, fields: &[ColumnField<T>]) -> Vec<T> {
        self.rows
            .iter()
            .map(|row| self.decode_row(row, fields))
            .collect()
    }
}
