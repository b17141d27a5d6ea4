//! Descriptors of intercepted calls, passed to every hook.

use serde::Serialize;
use std::fmt;

/// The kind of wrapped object an [`Event`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    /// A connection.
    Connection,
    /// A reusable connection factory.
    Connector,
    /// The top-level driver.
    Driver,
    /// The outcome of an exec call.
    Result,
    /// A row cursor.
    Rows,
    /// A prepared statement.
    Statement,
    /// An open transaction.
    Transaction,
    /// A per-column value converter.
    ValueConverter,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Connection => "connection",
            Entity::Connector => "connector",
            Entity::Driver => "driver",
            Entity::Result => "result",
            Entity::Rows => "rows",
            Entity::Statement => "statement",
            Entity::Transaction => "transaction",
            Entity::ValueConverter => "valueConverter",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The intercepted method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    Begin,
    BeginTx,
    CheckNamedValue,
    Close,
    Commit,
    Connect,
    ConvertValue,
    Exec,
    ExecContext,
    LastInsertId,
    Next,
    NextResultSet,
    Open,
    OpenConnector,
    Prepare,
    PrepareContext,
    Query,
    QueryContext,
    ResetSession,
    Rollback,
    RowsAffected,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Begin => "Begin",
            Method::BeginTx => "BeginTx",
            Method::CheckNamedValue => "CheckNamedValue",
            Method::Close => "Close",
            Method::Commit => "Commit",
            Method::Connect => "Connect",
            Method::ConvertValue => "ConvertValue",
            Method::Exec => "Exec",
            Method::ExecContext => "ExecContext",
            Method::LastInsertId => "LastInsertId",
            Method::Next => "Next",
            Method::NextResultSet => "NextResultSet",
            Method::Open => "Open",
            Method::OpenConnector => "OpenConnector",
            Method::Prepare => "Prepare",
            Method::PrepareContext => "PrepareContext",
            Method::Query => "Query",
            Method::QueryContext => "QueryContext",
            Method::ResetSession => "ResetSession",
            Method::Rollback => "Rollback",
            Method::RowsAffected => "RowsAffected",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is happening at an interception point.
///
/// Built fresh for every intercepted call and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The entity the event relates to, e.g. connection or statement.
    pub entity: Entity,
    /// The method the event relates to, e.g. `Prepare` or `ExecContext`.
    pub method: Method,
    /// True if the owning connection was inside a transaction at the time of the event.
    pub in_transaction: bool,
}

impl Event {
    pub fn new(entity: Entity, method: Method, in_transaction: bool) -> Self {
        Self {
            entity,
            method,
            in_transaction,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.method)
    }
}
