use rusqlite::Statement;
use rusqlite::types::{Value as SqlValue, ValueRef};
use sqlproxy::driver::{NamedValue, Value};
use sqlproxy::{DriverError, DriverResult};

/// Placeholder prefixes SQLite accepts for named parameters.
const NAME_PREFIXES: [char; 3] = [':', '@', '$'];

pub(crate) fn to_sqlite(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Bytes(bytes) => SqlValue::Blob(bytes.clone()),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Timestamp(ts) => SqlValue::Text(ts.format("%F %T%.f").to_string()),
    }
}

pub(crate) fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

/// Positional arguments numbered from 1.
pub(crate) fn positional(args: Vec<Value>) -> Vec<NamedValue> {
    args.into_iter()
        .enumerate()
        .map(|(i, value)| NamedValue::positional(i + 1, value))
        .collect()
}

fn parameter_index(stmt: &Statement<'_>, arg: &NamedValue) -> DriverResult<usize> {
    if !arg.is_named() {
        return Ok(arg.ordinal);
    }
    for prefix in NAME_PREFIXES {
        let name = format!("{prefix}{}", arg.name);
        if let Some(index) = stmt.parameter_index(&name).map_err(DriverError::driver)? {
            return Ok(index);
        }
    }
    Err(DriverError::other(format!(
        "sqlite: no such parameter: {}",
        arg.name
    )))
}

/// Bind every argument, checking the count against the placeholders.
pub(crate) fn bind(stmt: &mut Statement<'_>, args: &[NamedValue]) -> DriverResult<()> {
    let expected = stmt.parameter_count();
    if args.len() != expected {
        return Err(DriverError::other(format!(
            "sql: expected {expected} arguments, got {}",
            args.len()
        )));
    }
    for arg in args {
        let index = parameter_index(stmt, arg)?;
        stmt.raw_bind_parameter(index, to_sqlite(&arg.value))
            .map_err(DriverError::driver)?;
    }
    Ok(())
}
