use super::ConnState;
use crate::driver::{
    Rows, RowsColumnTypeDatabaseTypeName, RowsColumnTypeLength, RowsColumnTypeNullable,
    RowsColumnTypePrecisionScale, RowsColumnTypeScanType, RowsNextResultSet, ScanType, Value,
};
use crate::error::DriverResult;
use crate::event::{Entity, Event, Method};
use crate::stack;
use std::sync::Arc;

/// A row cursor proxy.
///
/// Advertises every column metadata capability. When the wrapped cursor
/// cannot answer, the generic front-end defaults are reported: no further
/// result set, [`ScanType::Any`], an empty type name, and unknown length,
/// nullability and precision.
pub struct ProxyRows {
    inner: Box<dyn Rows>,
    state: Arc<ConnState>,
}

impl ProxyRows {
    pub(super) fn new(inner: Box<dyn Rows>, state: Arc<ConnState>) -> Self {
        Self { inner, state }
    }

    fn event(&self, method: Method) -> Event {
        self.state.event(Entity::Rows, method)
    }
}

impl Rows for ProxyRows {
    fn columns(&self) -> Vec<String> {
        self.inner.columns()
    }

    fn close(&mut self) -> DriverResult<()> {
        let event = self.event(Method::Close);
        let _scope = stack::proxy_scope(event);
        let result = self.inner.close();
        self.state.hooks.settle(&event, result, || ())
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<()> {
        let event = self.event(Method::Next);
        let _scope = stack::proxy_scope(event);
        let result = self.inner.next(dest);
        self.state.hooks.settle(&event, result, || ())
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        Some(self)
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        Some(self)
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        Some(self)
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        Some(self)
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        Some(self)
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        Some(self)
    }
}

impl RowsNextResultSet for ProxyRows {
    fn has_next_result_set(&mut self) -> bool {
        self.inner
            .as_next_result_set()
            .is_some_and(|inner| inner.has_next_result_set())
    }

    fn next_result_set(&mut self) -> DriverResult<()> {
        let event = self.event(Method::NextResultSet);
        let Some(inner) = self.inner.as_next_result_set() else {
            return Ok(());
        };
        let _scope = stack::proxy_scope(event);
        let result = inner.next_result_set();
        self.state.hooks.settle(&event, result, || ())
    }
}

impl RowsColumnTypeScanType for ProxyRows {
    fn column_type_scan_type(&self, index: usize) -> ScanType {
        self.inner
            .as_column_type_scan_type()
            .map_or(ScanType::Any, |inner| inner.column_type_scan_type(index))
    }
}

impl RowsColumnTypeDatabaseTypeName for ProxyRows {
    fn column_type_database_type_name(&self, index: usize) -> String {
        self.inner
            .as_column_type_database_type_name()
            .map(|inner| inner.column_type_database_type_name(index))
            .unwrap_or_default()
    }
}

impl RowsColumnTypeLength for ProxyRows {
    fn column_type_length(&self, index: usize) -> Option<i64> {
        self.inner
            .as_column_type_length()
            .and_then(|inner| inner.column_type_length(index))
    }
}

impl RowsColumnTypeNullable for ProxyRows {
    fn column_type_nullable(&self, index: usize) -> Option<bool> {
        self.inner
            .as_column_type_nullable()
            .and_then(|inner| inner.column_type_nullable(index))
    }
}

impl RowsColumnTypePrecisionScale for ProxyRows {
    fn column_type_precision_scale(&self, index: usize) -> Option<(i64, i64)> {
        self.inner
            .as_column_type_precision_scale()
            .and_then(|inner| inner.column_type_precision_scale(index))
    }
}
