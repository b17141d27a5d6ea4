//! The driver contract the proxy forwards through.
//!
//! Every wrapped object implements one required trait ([`Driver`], [`Conn`],
//! [`Stmt`], ...) and may additionally expose optional capabilities. A
//! capability is advertised through an `as_*` accessor on the required trait,
//! which returns `None` unless the implementation overrides it:
//!
//! ```rust,ignore
//! impl Conn for MyConn {
//!     // ...required methods...
//!
//!     fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
//!         Some(self)
//!     }
//! }
//! ```
//!
//! Callers probe the accessor and fall back to the required path (or to the
//! [`Sentinel::Skip`](crate::Sentinel::Skip) signal) when it is absent.

mod context;
mod value;


pub use context::Context;
pub use value::{
    DefaultParameterConverter, IsolationLevel, NamedValue, ScanType, TxOptions, Value,
    named_values_to_values,
};

use crate::error::DriverResult;
use std::sync::Arc;

/// Entry point of a database driver.
pub trait Driver: Send + Sync {
    /// Open a new connection using a driver-specific name (DSN, path, ...).
    fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>>;

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        None
    }
}

/// Drivers that can parse a name once and hand out a reusable [`Connector`].
pub trait DriverContext: Send + Sync {
    fn open_connector(&self, name: &str) -> DriverResult<Box<dyn Connector>>;
}

/// A reusable connection factory.
pub trait Connector: Send + Sync {
    fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>>;

    /// The driver this connector belongs to.
    fn driver(&self) -> Arc<dyn Driver>;
}

/// A connection, used by a single caller at a time.
pub trait Conn: Send {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>>;

    fn close(&mut self) -> DriverResult<()>;

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>>;

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        None
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        None
    }
}

pub trait ConnPrepareContext {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>>;
}

pub trait ConnBeginTx {
    fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>>;
}

/// Custom argument validation and conversion.
///
/// Returning [`Sentinel::Skip`](crate::Sentinel::Skip) asks the caller to use
/// its default conversion; [`Sentinel::RemoveArgument`](crate::Sentinel::RemoveArgument)
/// drops the argument from the list.
pub trait NamedValueChecker {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()>;
}

/// Direct execution without a prepared statement.
pub trait Execer {
    fn exec(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>>;
}

pub trait ExecerContext {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>>;
}

/// Direct querying without a prepared statement.
pub trait Queryer {
    fn query(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn Rows>>;
}

pub trait QueryerContext {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>>;
}

/// Called by a pool before a connection is reused.
pub trait SessionResetter {
    fn reset_session(&mut self, ctx: &Context) -> DriverResult<()>;
}

/// Reports whether a connection may still be used.
pub trait Validator {
    fn is_valid(&self) -> bool;
}

/// A prepared statement.
pub trait Stmt: Send {
    fn close(&mut self) -> DriverResult<()>;

    /// Number of placeholders, or `None` if the driver does not know.
    fn num_input(&self) -> Option<usize>;

    fn exec(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>>;

    fn query(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn Rows>>;

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        None
    }
}

pub trait StmtExecContext {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>>;
}

pub trait StmtQueryContext {
    fn query_context(&mut self, ctx: &Context, args: Vec<NamedValue>)
    -> DriverResult<Box<dyn Rows>>;
}

/// Per-column argument conversion offered by a statement.
pub trait ColumnConverter {
    fn column_converter(&self, index: usize) -> Box<dyn ValueConverter>;
}

/// Converts an arbitrary input into a driver [`Value`].
pub trait ValueConverter: Send + Sync {
    fn convert_value(&self, input: &serde_json::Value) -> DriverResult<Value>;
}

/// An open transaction. Both outcomes consume it.
pub trait Tx: Send {
    fn commit(self: Box<Self>) -> DriverResult<()>;

    fn rollback(self: Box<Self>) -> DriverResult<()>;
}

/// The outcome of an exec call.
pub trait ExecResult: Send {
    fn last_insert_id(&self) -> DriverResult<i64>;

    fn rows_affected(&self) -> DriverResult<i64>;
}

/// A forward-only row cursor.
pub trait Rows: Send {
    fn columns(&self) -> Vec<String>;

    fn close(&mut self) -> DriverResult<()>;

    /// Fill `dest` with the next row, or fail with
    /// [`Sentinel::EndOfStream`](crate::Sentinel::EndOfStream) when exhausted.
    fn next(&mut self, dest: &mut [Value]) -> DriverResult<()>;

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        None
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        None
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        None
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        None
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        None
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        None
    }
}

pub trait RowsNextResultSet {
    fn has_next_result_set(&mut self) -> bool;

    fn next_result_set(&mut self) -> DriverResult<()>;
}

pub trait RowsColumnTypeScanType {
    fn column_type_scan_type(&self, index: usize) -> ScanType;
}

pub trait RowsColumnTypeDatabaseTypeName {
    fn column_type_database_type_name(&self, index: usize) -> String;
}

pub trait RowsColumnTypeLength {
    /// `None` when the length is unknown or not applicable.
    fn column_type_length(&self, index: usize) -> Option<i64>;
}

pub trait RowsColumnTypeNullable {
    fn column_type_nullable(&self, index: usize) -> Option<bool>;
}

pub trait RowsColumnTypePrecisionScale {
    /// `(precision, scale)`, or `None` when unknown.
    fn column_type_precision_scale(&self, index: usize) -> Option<(i64, i64)>;
}
