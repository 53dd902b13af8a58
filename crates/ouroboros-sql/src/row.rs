//! Result row representation.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::types::FromValue;
use crate::{DataAccessError, Result, Value};

/// Represents a single row from a query result.
///
/// Every column is decoded from the driver cursor before the row is yielded,
/// so a `Row` remains valid after the stream that produced it advances or is
/// dropped. Column names are shared by all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from column names and values in the same order.
    ///
    /// # Errors
    ///
    /// Returns `Access` if the number of values differs from the number of columns.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(DataAccessError::Access(format!(
                "Row has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Gets a value by zero-based position or by column name.
    ///
    /// NULL columns return [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns `Access` for an out-of-range index or an unknown column name.
    pub fn get<I: ColumnIndex>(&self, index: I) -> Result<&Value> {
        let position = index.position(self)?;
        Ok(&self.values[position])
    }

    /// Gets a value converted into `T`; NULL converts to `None`.
    ///
    /// # Errors
    ///
    /// Returns `Access` for an invalid index/name, or when the stored value
    /// cannot be represented as `T`.
    pub fn get_as<T: FromValue, I: ColumnIndex>(&self, index: I) -> Result<Option<T>> {
        let position = index.position(self)?;
        let value = &self.values[position];
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some).ok_or_else(|| {
            DataAccessError::Access(format!(
                "Column '{}' holds {} which cannot be read as {}",
                self.columns[position],
                value.type_name(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Column names in result-set order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result-set order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts row to a JSON object keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }
}

/// A way of addressing a column: zero-based position or name.
pub trait ColumnIndex {
    /// Resolves this index to a position within `row`.
    fn position(&self, row: &Row) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn position(&self, row: &Row) -> Result<usize> {
        if *self < row.len() {
            Ok(*self)
        } else {
            Err(DataAccessError::Access(format!(
                "Column index {} out of range for row with {} columns",
                self,
                row.len()
            )))
        }
    }
}

impl ColumnIndex for &str {
    /// Exact match first, then ASCII case-insensitive, since SQL identifiers
    /// are case-insensitive unless quoted.
    fn position(&self, row: &Row) -> Result<usize> {
        row.columns
            .iter()
            .position(|c| c == self)
            .or_else(|| row.columns.iter().position(|c| c.eq_ignore_ascii_case(self)))
            .ok_or_else(|| DataAccessError::Access(format!("No column named '{}' in result set", self)))
    }
}

impl ColumnIndex for String {
    fn position(&self, row: &Row) -> Result<usize> {
        self.as_str().position(row)
    }
}

impl ColumnIndex for &String {
    fn position(&self, row: &Row) -> Result<usize> {
        self.as_str().position(row)
    }
}
