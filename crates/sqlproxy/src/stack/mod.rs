//! Stack-enriched errors.
//!
//! Instead of walking the native call stack and guessing from symbol names
//! which frames belong to the proxy, every proxy method pushes a marker frame
//! onto a thread-local call context for the duration of the call. Application
//! code marks its own frames with [`scope`], and a database front-end can mark
//! its frames as internal with [`library_scope`]. When an error is enriched,
//! the current call context is captured and filtered down to the frames the
//! caller can act on.
//!
//! ```rust,ignore
//! use sqlproxy::{Hooks, ProxyDriver, stack};
//!
//! let driver = ProxyDriver::with_hooks(sqlite, Hooks::with_stacktrace());
//!
//! fn load_user(conn: &mut dyn Conn) -> DriverResult<()> {
//!     let _frame = stack::scope("app::load_user");
//!     // errors raised below carry "app::load_user" as their first frame
//! }
//! ```

#[cfg(test)]
mod tests;

use crate::error::DriverError;
use crate::event::Event;
use crate::hooks::Hooks;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;

/// Maximum number of frames captured per error, innermost first.
pub const DEFAULT_MAX_DEPTH: usize = 32;

thread_local! {
    static CALL_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Who owns a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Application code.
    Caller,
    /// A database-access front-end sitting between the caller and the proxy.
    Library,
    /// A proxy method.
    Proxy,
}

#[derive(Debug, Clone)]
enum Label {
    Text(Cow<'static, str>),
    Proxy(Event),
}

/// A marker frame on the call context.
#[derive(Debug, Clone)]
pub struct Frame {
    label: Label,
    kind: FrameKind,
    location: &'static Location<'static>,
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Where the scope was entered.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Frames owned by the proxy or by a front-end.
    pub fn is_internal(&self) -> bool {
        self.kind != FrameKind::Caller
    }

    pub fn label(&self) -> Cow<'_, str> {
        match &self.label {
            Label::Text(s) => Cow::Borrowed(s.as_ref()),
            Label::Proxy(event) => Cow::Owned(format!("sqlproxy::{event}")),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Label::Text(s) => f.write_str(s)?,
            Label::Proxy(event) => write!(f, "sqlproxy::{event}")?,
        }
        write!(f, "\n\t{}:{}", self.location.file(), self.location.line())
    }
}

/// Keeps a frame on the call context until dropped.
#[must_use = "the frame is popped as soon as the scope is dropped"]
pub struct Scope {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Truncating rather than popping keeps the context consistent even if
        // an inner scope was leaked.
        CALL_STACK.with(|stack| stack.borrow_mut().truncate(self.depth));
    }
}

fn push(frame: Frame) -> Scope {
    CALL_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let depth = stack.len();
        stack.push(frame);
        Scope {
            depth,
            _not_send: PhantomData,
        }
    })
}

/// Mark a caller-visible frame.
#[track_caller]
pub fn scope(label: impl Into<Cow<'static, str>>) -> Scope {
    push(Frame {
        label: Label::Text(label.into()),
        kind: FrameKind::Caller,
        location: Location::caller(),
    })
}

/// Mark a frame belonging to a database front-end, excluded from enriched errors.
#[track_caller]
pub fn library_scope(label: impl Into<Cow<'static, str>>) -> Scope {
    push(Frame {
        label: Label::Text(label.into()),
        kind: FrameKind::Library,
        location: Location::caller(),
    })
}

#[track_caller]
pub(crate) fn proxy_scope(event: Event) -> Scope {
    push(Frame {
        label: Label::Proxy(event),
        kind: FrameKind::Proxy,
        location: Location::caller(),
    })
}

/// A captured call context, innermost frame first.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    /// Capture the current call context.
    pub fn capture() -> Self {
        Self::capture_with_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn capture_with_depth(max_depth: usize) -> Self {
        let frames = CALL_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .take(max_depth)
                .cloned()
                .collect()
        });
        Self { frames }
    }

    /// Every captured frame.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The frames external to the proxy and to any front-end.
    ///
    /// Starts at the first caller frame that follows at least one internal
    /// frame, so leading caller frames (e.g. the error hook's own scope) are
    /// dropped and the frame that called into the proxy comes first. A
    /// capture without any internal frame is kept whole; one whose caller
    /// frames were never marked or were cut off by the depth limit yields no
    /// frames at all.
    pub fn external(&self) -> &[Frame] {
        let Some(first_internal) = self.frames.iter().position(Frame::is_internal) else {
            return &self.frames;
        };
        let rest = &self.frames[first_internal..];
        match rest.iter().position(|frame| !frame.is_internal()) {
            Some(start) => &rest[start..],
            None => &[],
        }
    }
}

/// An error together with the call context it was raised in.
///
/// `{}` prints the wrapped error only; `{:#}` appends one
/// `\n<label>\n\t<file>:<line>` block per external frame.
#[derive(Debug)]
pub struct WithStack {
    error: DriverError,
    stack: Stack,
}

impl WithStack {
    pub fn new(error: DriverError, stack: Stack) -> Self {
        Self { error, stack }
    }

    pub fn inner(&self) -> &DriverError {
        &self.error
    }

    pub fn into_inner(self) -> DriverError {
        self.error
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The frames shown when formatting, see [`Stack::external`].
    pub fn frames(&self) -> &[Frame] {
        self.stack.external()
    }
}

impl fmt::Display for WithStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return write!(f, "{}", self.error);
        }
        write!(f, "{:#}", self.error)?;
        for frame in self.frames() {
            write!(f, "\n{frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for WithStack {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// Attaches the current call context to errors.
#[derive(Debug, Clone, Copy)]
pub struct Enricher {
    /// Maximum number of frames captured, innermost first.
    pub max_depth: usize,
}

impl Default for Enricher {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Enricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Wrap `err` with the current call context.
    ///
    /// Sentinels and errors that already carry a stack are returned unchanged,
    /// so stacked proxies report the innermost capture only.
    pub fn enrich(&self, err: DriverError) -> DriverError {
        if err.is_sentinel() || err.stack().is_some() {
            return err;
        }
        WithStack::new(err, Stack::capture_with_depth(self.max_depth)).into()
    }

    /// A hook bundle whose error hook enriches every routed error.
    pub fn into_hooks(self) -> Hooks {
        Hooks::new().on_error(move |_, err| Some(self.enrich(err)))
    }
}

/// Wrap `err` with the current call context, using the default depth.
pub fn add_stacktrace(err: DriverError) -> DriverError {
    Enricher::default().enrich(err)
}
