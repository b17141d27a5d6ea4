use super::Hooks;
use crate::error::DriverError;
use crate::event::Event;
use std::borrow::Cow;
use tracing::Level;

/// Default cap on logged SQL, in bytes.
const DEFAULT_SQL_LIMIT: usize = 200;

/// Logs every intercepted call through `tracing` without changing it.
///
/// Query text and argument counts go to the `sqlproxy.sql` target at the
/// configured level. Routed errors go to `sqlproxy.error` at `WARN` and are
/// handed back untouched. Needs the `tracing-hooks` feature (default).
///
/// ```rust,ignore
/// let hooks: Hooks = TracingHooks::new().level(Level::INFO).no_truncate().into();
/// let driver = ProxyDriver::with_hooks(SqliteDriver::new(), hooks);
/// ```
#[derive(Debug, Clone)]
pub struct TracingHooks {
    level: Level,
    sql_limit: Option<usize>,
}

impl Default for TracingHooks {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            sql_limit: Some(DEFAULT_SQL_LIMIT),
        }
    }
}

impl TracingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of the per-query events. Errors are always `WARN`.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Cut logged SQL after `len` bytes, on a character boundary.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.sql_limit = Some(len);
        self
    }

    /// Log SQL in full.
    pub fn no_truncate(mut self) -> Self {
        self.sql_limit = None;
        self
    }

    pub(crate) fn shorten<'q>(&self, sql: &'q str) -> Cow<'q, str> {
        match self.sql_limit {
            Some(limit) if sql.len() > limit => {
                Cow::Owned(format!("{}...", &sql[..char_floor(sql, limit)]))
            }
            _ => Cow::Borrowed(sql),
        }
    }

    fn log_call(&self, event: &Event, sql: Option<&str>, param_count: usize) {
        let sql = sql.map_or(Cow::Borrowed("-"), |sql| self.shorten(sql));
        // `tracing` needs the level at compile time.
        macro_rules! at {
            ($lvl:ident) => {
                tracing::event!(
                    target: "sqlproxy.sql",
                    Level::$lvl,
                    entity = %event.entity,
                    method = %event.method,
                    in_transaction = event.in_transaction,
                    param_count,
                    sql = %sql
                )
            };
        }

        if self.level == Level::ERROR {
            at!(ERROR)
        } else if self.level == Level::WARN {
            at!(WARN)
        } else if self.level == Level::INFO {
            at!(INFO)
        } else if self.level == Level::DEBUG {
            at!(DEBUG)
        } else {
            at!(TRACE)
        }
    }

    fn log_error(event: &Event, err: &DriverError) {
        tracing::warn!(
            target: "sqlproxy.error",
            entity = %event.entity,
            method = %event.method,
            in_transaction = event.in_transaction,
            error = %err,
        );
    }

    /// The hook bundle; every slot logs and keeps the call unchanged.
    pub fn into_hooks(self) -> Hooks {
        let preset = std::sync::Arc::new(self);
        let (prepare, prepared, prepared_ctx, direct, direct_ctx) = (
            preset.clone(),
            preset.clone(),
            preset.clone(),
            preset.clone(),
            preset,
        );

        Hooks::new()
            .before_prepare(move |event, query| {
                prepare.log_call(event, Some(query), 0);
                Ok(String::new())
            })
            .before_prepared_query(move |event, args| {
                prepared.log_call(event, None, args.len());
                Ok(None)
            })
            .before_prepared_query_context(move |event, args| {
                prepared_ctx.log_call(event, None, args.len());
                Ok(None)
            })
            .before_query(move |event, query, args| {
                direct.log_call(event, Some(query), args.len());
                Ok((String::new(), None))
            })
            .before_query_context(move |event, query, args| {
                direct_ctx.log_call(event, Some(query), args.len());
                Ok((String::new(), None))
            })
            .on_error(|event, err| {
                Self::log_error(event, &err);
                Some(err)
            })
    }
}

impl From<TracingHooks> for Hooks {
    fn from(preset: TracingHooks) -> Self {
        preset.into_hooks()
    }
}

/// Largest char boundary in `s` not above `index`.
fn char_floor(s: &str, index: usize) -> usize {
    (0..=index.min(s.len()))
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}
