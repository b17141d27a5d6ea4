use super::ValueConverter;
use crate::error::{DriverError, DriverResult};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A value a driver accepts as an argument or returns in a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "{v:?}"),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// An argument with an optional name and its 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    /// Parameter name without its prefix; empty for positional arguments.
    pub name: String,
    /// 1-based position in the argument list.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    /// Create a positional argument.
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: String::new(),
            ordinal,
            value: value.into(),
        }
    }

    /// Create a named argument.
    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            value: value.into(),
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for NamedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_named() {
            write!(f, "{}={}", self.name, self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Convert named arguments to positional values for statements that
/// only accept positional ones.
pub fn named_values_to_values(named: &[NamedValue]) -> DriverResult<Vec<Value>> {
    named
        .iter()
        .map(|param| {
            if param.is_named() {
                Err(DriverError::NamedParametersUnsupported)
            } else {
                Ok(param.value.clone())
            }
        })
        .collect()
}

/// The type a column's values are best scanned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScanType {
    /// No specific type; callers scan into a dynamic value.
    #[default]
    Any,
    Int,
    Float,
    Bool,
    Bytes,
    Text,
    Timestamp,
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IsolationLevel {
    /// The driver's default level.
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

/// Options for beginning a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation_level(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// The converter used when a statement offers no column converter of its own.
///
/// Null, booleans, integers, floats and strings map onto their [`Value`]
/// counterparts. Unsigned integers that do not fit an `i64` and composite
/// inputs (arrays, objects) are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParameterConverter;

impl ValueConverter for DefaultParameterConverter {
    fn convert_value(&self, input: &serde_json::Value) -> DriverResult<Value> {
        use serde_json::Value as Json;

        match input {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    Err(DriverError::other(format!(
                        "uint64 values with high bit set are not supported: {n}"
                    )))
                } else {
                    n.as_f64().map(Value::Float).ok_or_else(|| {
                        DriverError::other(format!("unsupported number {n}"))
                    })
                }
            }
            Json::String(s) => Ok(Value::Text(s.clone())),
            Json::Array(_) => Err(DriverError::other(
                "unsupported type array, a slice of values",
            )),
            Json::Object(_) => Err(DriverError::other("unsupported type object, a map")),
        }
    }
}
