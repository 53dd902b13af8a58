//! Type mapping between Rust values and SQL column/parameter values.
//!
//! [`Value`] is used both for bound parameters and for decoded result cells,
//! so a value read from one statement can be passed straight into another.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{DataAccessError, ExecutionErrorKind};

/// A single SQL value: a bound parameter or a decoded column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    ///
    /// PostgreSQL receives a bound NULL as a typed `INT4` parameter. Cast the
    /// placeholder (`$1::uuid`) when the target column has no assignment
    /// cast from integer.
    Null,
    /// Boolean (BOOLEAN)
    Bool(bool),
    /// Small integer (SMALLINT)
    SmallInt(i16),
    /// Integer (INTEGER)
    Int(i32),
    /// Big integer (BIGINT, SQLite INTEGER)
    BigInt(i64),
    /// Single-precision float (REAL)
    Float(f32),
    /// Double-precision float (DOUBLE PRECISION, SQLite REAL)
    Double(f64),
    /// Variable-length string (VARCHAR, TEXT)
    String(String),
    /// Binary data (BYTEA, BLOB)
    Bytes(Vec<u8>),
    /// UUID (UUID)
    Uuid(Uuid),
    /// Date (DATE)
    Date(NaiveDate),
    /// Time (TIME)
    Time(NaiveTime),
    /// Timestamp without timezone (TIMESTAMP)
    Timestamp(NaiveDateTime),
    /// Timestamp with timezone (TIMESTAMPTZ)
    TimestampTz(DateTime<Utc>),
    /// JSON/JSONB (JSON, JSONB)
    Json(JsonValue),
    /// Decimal/Numeric (NUMERIC, DECIMAL)
    Decimal(Decimal),
}

impl Value {
    /// Returns the SQL type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "REAL",
            Value::Double(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Uuid(_) => "UUID",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::TimestampTz(_) => "TIMESTAMPTZ",
            Value::Json(_) => "JSONB",
            Value::Decimal(_) => "NUMERIC",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value; smaller integer widths are widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view of the value. SQLite stores booleans as 0/1 integers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
                self.as_i64().map(|v| v != 0)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Converts the value to JSON.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(v) => JsonValue::Bool(*v),
            Value::SmallInt(v) => JsonValue::from(*v),
            Value::Int(v) => JsonValue::from(*v),
            Value::BigInt(v) => JsonValue::from(*v),
            Value::Float(v) => JsonValue::from(*v),
            Value::Double(v) => JsonValue::from(*v),
            Value::String(v) => JsonValue::String(v.clone()),
            Value::Bytes(v) => JsonValue::Array(v.iter().map(|b| JsonValue::from(*b)).collect()),
            Value::Uuid(v) => JsonValue::String(v.to_string()),
            Value::Date(v) => JsonValue::String(v.to_string()),
            Value::Time(v) => JsonValue::String(v.to_string()),
            Value::Timestamp(v) => JsonValue::String(v.to_string()),
            Value::TimestampTz(v) => JsonValue::String(v.to_rfc3339()),
            Value::Json(v) => v.clone(),
            Value::Decimal(v) => JsonValue::String(v.to_string()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    JsonValue => Json,
    Decimal => Decimal,
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::BigInt(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Builds a positional parameter list from values convertible into [`Value`].
///
/// ```rust,ignore
/// let params = params!["alice", 42, None::<String>];
/// ```
///
/// `None` becomes [`Value::Null`] whatever its type parameter. On PostgreSQL
/// that NULL is bound as `INT4`, so columns such as `BOOLEAN` or `UUID`
/// need a cast:
///
/// ```rust,ignore
/// client.update("UPDATE users SET active = $1::boolean WHERE id = $2", params![None::<bool>, 7]);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

/// Conversion from a decoded [`Value`] into a Rust type.
///
/// Returns `None` when the value holds an incompatible type. NULL handling is
/// done by the caller (see [`crate::Row::get_as`]).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => value.as_i64().map(|v| v as f64),
            _ => value.as_f64(),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(v) => Some(*v),
            Value::String(s) => Uuid::parse_str(s).ok(),
            Value::Bytes(b) => Uuid::from_slice(b).ok(),
            _ => None,
        }
    }
}

impl FromValue for JsonValue {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Json(v) => Some(v.clone()),
            Value::String(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(*v),
            Value::String(s) => s.parse().ok(),
            _ => value.as_i64().map(Decimal::from),
        }
    }
}

fn bind_error(type_name: &str, err: impl std::fmt::Display) -> DataAccessError {
    DataAccessError::execution(
        ExecutionErrorKind::Encode,
        format!("Failed to bind {}: {}", type_name, err),
    )
}

/// SQLite parameter binding and row decoding.
#[cfg(feature = "sqlite")]
pub(crate) mod sqlite {
    use std::sync::Arc;

    use sqlx::sqlite::{SqliteArguments, SqliteRow};
    use sqlx::{Arguments, Row as SqlxRow, TypeInfo, ValueRef};

    use super::{bind_error, Value};
    use crate::{DataAccessError, ExecutionErrorKind, Result, Row};

    /// Binds parameters positionally, in declaration order.
    pub(crate) fn bind_all<'q>(params: &[Value]) -> Result<SqliteArguments<'q>> {
        let mut arguments = SqliteArguments::default();
        for param in params {
            bind(param, &mut arguments)?;
        }
        Ok(arguments)
    }

    fn bind<'q>(value: &Value, arguments: &mut SqliteArguments<'q>) -> Result<()> {
        let name = value.type_name();
        match value {
            // SQLite is dynamically typed; any nullable type binds NULL
            Value::Null => arguments.add(Option::<i64>::None),
            Value::Bool(v) => arguments.add(*v),
            Value::SmallInt(v) => arguments.add(*v),
            Value::Int(v) => arguments.add(*v),
            Value::BigInt(v) => arguments.add(*v),
            Value::Float(v) => arguments.add(*v),
            Value::Double(v) => arguments.add(*v),
            Value::String(v) => arguments.add(v.clone()),
            Value::Bytes(v) => arguments.add(v.clone()),
            Value::Uuid(v) => arguments.add(*v),
            Value::Date(v) => arguments.add(*v),
            Value::Time(v) => arguments.add(*v),
            Value::Timestamp(v) => arguments.add(*v),
            Value::TimestampTz(v) => arguments.add(*v),
            // No native JSON or NUMERIC storage: store the text form
            Value::Json(v) => arguments.add(v.to_string()),
            Value::Decimal(v) => arguments.add(v.to_string()),
        }
        .map_err(|e| bind_error(name, e))
    }

    /// Column names of a result row, shared by every row of one result set.
    pub(crate) fn column_names(row: &SqliteRow) -> Arc<[String]> {
        use sqlx::Column;
        row.columns().iter().map(|c| c.name().to_string()).collect()
    }

    /// Decodes every column of `row` eagerly into a [`Row`].
    ///
    /// Decoding follows the runtime storage class of each value rather than
    /// the declared column type, so expressions without a declared type
    /// (`SELECT 1`, `SELECT count(*)`) decode correctly.
    pub(crate) fn decode_row(row: &SqliteRow, columns: Arc<[String]>) -> Result<Row> {
        let mut values = Vec::with_capacity(columns.len());

        for (idx, column_name) in columns.iter().enumerate() {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                values.push(Value::Null);
                continue;
            }

            let type_info = raw.type_info();
            let value = match type_info.name() {
                "INTEGER" => Value::BigInt(row.try_get_unchecked::<i64, _>(idx)?),
                "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
                "REAL" => Value::Double(row.try_get_unchecked::<f64, _>(idx)?),
                "BLOB" => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                    Value::String(row.try_get_unchecked::<String, _>(idx)?)
                }
                "NUMERIC" => match row.try_get_unchecked::<i64, _>(idx) {
                    Ok(v) => Value::BigInt(v),
                    Err(_) => Value::Double(row.try_get_unchecked::<f64, _>(idx)?),
                },
                other => {
                    return Err(DataAccessError::execution(
                        ExecutionErrorKind::Decode,
                        format!("Unsupported SQLite type '{}' in column '{}'", other, column_name),
                    ))
                }
            };
            values.push(value);
        }

        Row::new(columns, values)
    }

    /// Reads column 0 of a `RETURNING` row as a generated key.
    pub(crate) fn decode_key(row: &SqliteRow) -> Result<i64> {
        Ok(row.try_get::<i64, _>(0)?)
    }
}

/// PostgreSQL parameter binding and row decoding.
#[cfg(feature = "postgres")]
pub(crate) mod postgres {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use rust_decimal::Decimal;
    use serde_json::Value as JsonValue;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::{Arguments, Column, Row as SqlxRow, TypeInfo};
    use uuid::Uuid;

    use super::{bind_error, Value};
    use crate::{DataAccessError, ExecutionErrorKind, Result, Row};

    /// Binds parameters positionally, in declaration order.
    pub(crate) fn bind_all(params: &[Value]) -> Result<PgArguments> {
        let mut arguments = PgArguments::default();
        for param in params {
            bind(param, &mut arguments)?;
        }
        Ok(arguments)
    }

    fn bind(value: &Value, arguments: &mut PgArguments) -> Result<()> {
        let name = value.type_name();
        match value {
            // Untyped NULL goes out as INT4; BOOLEAN or UUID targets need a cast in SQL
            Value::Null => arguments.add(Option::<i32>::None),
            Value::Bool(v) => arguments.add(*v),
            Value::SmallInt(v) => arguments.add(*v),
            Value::Int(v) => arguments.add(*v),
            Value::BigInt(v) => arguments.add(*v),
            Value::Float(v) => arguments.add(*v),
            Value::Double(v) => arguments.add(*v),
            Value::String(v) => arguments.add(v.clone()),
            Value::Bytes(v) => arguments.add(v.clone()),
            Value::Uuid(v) => arguments.add(*v),
            Value::Date(v) => arguments.add(*v),
            Value::Time(v) => arguments.add(*v),
            Value::Timestamp(v) => arguments.add(*v),
            Value::TimestampTz(v) => arguments.add(*v),
            Value::Json(v) => arguments.add(v.clone()),
            Value::Decimal(v) => arguments.add(*v),
        }
        .map_err(|e| bind_error(name, e))
    }

    pub(crate) fn column_names(row: &PgRow) -> Arc<[String]> {
        row.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_failed(type_name: &str, column: &str, err: sqlx::Error) -> DataAccessError {
        DataAccessError::execution(
            ExecutionErrorKind::Decode,
            format!("Failed to extract {} from column '{}': {}", type_name, column, err),
        )
    }

    fn extract<'r, T>(row: &'r PgRow, idx: usize, type_name: &str, column: &str, wrap: fn(T) -> Value) -> Result<Value>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        match row.try_get::<Option<T>, _>(idx) {
            Ok(Some(v)) => Ok(wrap(v)),
            Ok(None) => Ok(Value::Null),
            Err(e) => Err(decode_failed(type_name, column, e)),
        }
    }

    /// Decodes every column of `row` eagerly into a [`Row`], based on the
    /// PostgreSQL column type.
    pub(crate) fn decode_row(row: &PgRow, columns: Arc<[String]>) -> Result<Row> {
        let mut values = Vec::with_capacity(columns.len());

        for (idx, column) in row.columns().iter().enumerate() {
            let name = column.name();
            let value = match column.type_info().name() {
                "BOOL" => extract::<bool>(row, idx, "BOOL", name, Value::Bool)?,
                "INT2" => extract::<i16>(row, idx, "SMALLINT", name, Value::SmallInt)?,
                "INT4" => extract::<i32>(row, idx, "INT", name, Value::Int)?,
                "INT8" => extract::<i64>(row, idx, "BIGINT", name, Value::BigInt)?,
                "FLOAT4" => extract::<f32>(row, idx, "FLOAT", name, Value::Float)?,
                "FLOAT8" => extract::<f64>(row, idx, "DOUBLE", name, Value::Double)?,
                "NUMERIC" => extract::<Decimal>(row, idx, "NUMERIC", name, Value::Decimal)?,
                "VARCHAR" | "TEXT" | "CHAR" | "BPCHAR" | "NAME" => {
                    extract::<String>(row, idx, "STRING", name, Value::String)?
                }
                "BYTEA" => extract::<Vec<u8>>(row, idx, "BYTES", name, Value::Bytes)?,
                "UUID" => extract::<Uuid>(row, idx, "UUID", name, Value::Uuid)?,
                "DATE" => extract::<NaiveDate>(row, idx, "DATE", name, Value::Date)?,
                "TIME" => extract::<NaiveTime>(row, idx, "TIME", name, Value::Time)?,
                "TIMESTAMP" => extract::<NaiveDateTime>(row, idx, "TIMESTAMP", name, Value::Timestamp)?,
                "TIMESTAMPTZ" => {
                    extract::<DateTime<Utc>>(row, idx, "TIMESTAMPTZ", name, Value::TimestampTz)?
                }
                "JSON" | "JSONB" => extract::<JsonValue>(row, idx, "JSON", name, Value::Json)?,
                // Unknown types (enums, domains, ...) fall back to their text form
                other => match row.try_get::<Option<String>, _>(idx) {
                    Ok(Some(v)) => Value::String(v),
                    Ok(None) => Value::Null,
                    Err(e) => return Err(decode_failed(other, name, e)),
                },
            };
            values.push(value);
        }

        Row::new(columns, values)
    }

    /// Reads column 0 of a `RETURNING` row as a generated key.
    pub(crate) fn decode_key(row: &PgRow) -> Result<i64> {
        let column = row.columns().first().ok_or_else(|| {
            DataAccessError::execution(ExecutionErrorKind::Decode, "RETURNING produced no columns")
        })?;

        match column.type_info().name() {
            "INT8" => Ok(row.try_get::<i64, _>(0)?),
            "INT4" => Ok(i64::from(row.try_get::<i32, _>(0)?)),
            "INT2" => Ok(i64::from(row.try_get::<i16, _>(0)?)),
            other => Err(DataAccessError::execution(
                ExecutionErrorKind::Decode,
                format!(
                    "Generated key column '{}' has non-integer type {}",
                    column.name(),
                    other
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    #[allow(clippy::approx_constant)] // 3.14 is just a test value, not meant to be PI
    fn test_value_type_names() {
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::SmallInt(42).type_name(), "SMALLINT");
        assert_eq!(Value::Int(42).type_name(), "INTEGER");
        assert_eq!(Value::BigInt(42).type_name(), "BIGINT");
        assert_eq!(Value::Float(3.14).type_name(), "REAL");
        assert_eq!(Value::Double(3.14).type_name(), "DOUBLE PRECISION");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).type_name(), "BYTEA");
        assert_eq!(Value::Uuid(Uuid::nil()).type_name(), "UUID");
        assert_eq!(Value::Json(JsonValue::Null).type_name(), "JSONB");
        assert_eq!(Value::Decimal(Decimal::from_str("123.45").unwrap()).type_name(), "NUMERIC");
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("alice"), Value::String("alice".to_string()));
        assert_eq!(Value::from(7_i64), Value::BigInt(7));
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from(7_u32), Value::BigInt(7));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(&b"ab"[..]), Value::Bytes(vec![b'a', b'b']));
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::BigInt(3));
    }

    #[test]
    fn test_params_macro() {
        let empty = params![];
        assert!(empty.is_empty());

        let params = params!["alice", 1_i64, None::<i32>, 2.5_f64];
        assert_eq!(
            params,
            vec![
                Value::String("alice".to_string()),
                Value::BigInt(1),
                Value::Null,
                Value::Double(2.5),
            ]
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(5).as_i64(), Some(5));
        assert_eq!(Value::SmallInt(-2).as_i64(), Some(-2));
        assert_eq!(Value::String("x".into()).as_i64(), None);
        assert_eq!(Value::BigInt(1).as_bool(), Some(true));
        assert_eq!(Value::BigInt(0).as_bool(), Some(false));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i64::from_value(&Value::Int(3)), Some(3));
        assert_eq!(i32::from_value(&Value::BigInt(i64::MAX)), None);
        assert_eq!(f64::from_value(&Value::BigInt(2)), Some(2.0));
        assert_eq!(String::from_value(&Value::BigInt(2)), None);
        assert_eq!(
            Uuid::from_value(&Value::String(Uuid::nil().to_string())),
            Some(Uuid::nil())
        );
        assert_eq!(
            JsonValue::from_value(&Value::String("{\"a\":1}".into())),
            Some(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            Decimal::from_value(&Value::String("1.50".into())),
            Decimal::from_str("1.50").ok()
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Null.to_json(), JsonValue::Null);
        assert_eq!(Value::BigInt(1).to_json(), serde_json::json!(1));
        assert_eq!(Value::String("a".into()).to_json(), serde_json::json!("a"));
        assert_eq!(Value::Uuid(Uuid::nil()).to_json(), serde_json::json!(Uuid::nil().to_string()));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_bind_all() {
        let params = params![
            Value::Null,
            true,
            1_i16,
            2_i32,
            3_i64,
            1.5_f32,
            2.5_f64,
            "text",
            vec![1_u8, 2],
            Uuid::nil(),
            serde_json::json!({"a": 1}),
            Decimal::from_str("1.25").unwrap(),
        ];
        assert!(sqlite::bind_all(&params).is_ok());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_postgres_bind_all() {
        let params = params![Value::Null, 42_i32, "test", true, Uuid::nil()];
        assert!(postgres::bind_all(&params).is_ok());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_postgres_binds_typed_none_as_single_null() {
        use sqlx::Arguments;

        let params = params![None::<String>, None::<Uuid>];
        assert_eq!(params, vec![Value::Null, Value::Null]);

        let arguments = postgres::bind_all(&params).unwrap();
        assert_eq!(arguments.len(), 2);
    }
}
