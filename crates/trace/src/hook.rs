//! Process-wide execution trace hooks
//!
//! Instrumented code reports execution events through [`emit`] (usually via
//! the [`trace_statement!`](crate::trace_statement) and
//! [`trace_call!`](crate::trace_call) probes). Each granularity has at most one
//! installed callback.

use parking_lot::{const_rwlock, RwLock};
use std::fmt;
use std::sync::Arc;

/// Kind of execution event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    /// A statement finished executing
    Statement,
    /// A function was invoked
    Call,
}

/// One execution event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent<'a> {
    pub granularity: Granularity,
    /// Identifier of the source unit the event happened in
    pub source_unit: &'a str,
    pub line: u32,
    /// Invoked function, for call events
    pub function: Option<&'a str>,
}

impl<'a> TraceEvent<'a> {
    pub fn statement(source_unit: &'a str, line: u32) -> Self {
        Self {
            granularity: Granularity::Statement,
            source_unit,
            line,
            function: None,
        }
    }

    pub fn call(source_unit: &'a str, line: u32, function: &'a str) -> Self {
        Self {
            granularity: Granularity::Call,
            source_unit,
            line,
            function: Some(function),
        }
    }
}

impl fmt::Display for TraceEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function {
            Some(function) => write!(f, "{}:{} call {}", self.source_unit, self.line, function),
            None => write!(f, "{}:{}", self.source_unit, self.line),
        }
    }
}

/// Installed trace callback
pub type TraceFn = Arc<dyn Fn(&TraceEvent<'_>) + Send + Sync>;

struct Hooks {
    statement: Option<TraceFn>,
    call: Option<TraceFn>,
}

impl Hooks {
    fn slot(&mut self, granularity: Granularity) -> &mut Option<TraceFn> {
        match granularity {
            Granularity::Statement => &mut self.statement,
            Granularity::Call => &mut self.call,
        }
    }

    fn get(&self, granularity: Granularity) -> Option<&TraceFn> {
        match granularity {
            Granularity::Statement => self.statement.as_ref(),
            Granularity::Call => self.call.as_ref(),
        }
    }
}

static HOOKS: RwLock<Hooks> = const_rwlock(Hooks {
    statement: None,
    call: None,
});

/// Install `hook` for `granularity`, returning the callback it replaces
pub fn set_hook(granularity: Granularity, hook: Option<TraceFn>) -> Option<TraceFn> {
    std::mem::replace(HOOKS.write().slot(granularity), hook)
}

/// Callback currently installed for `granularity`
pub fn current_hook(granularity: Granularity) -> Option<TraceFn> {
    HOOKS.read().get(granularity).cloned()
}

/// Deliver `event` to the callback installed for its granularity
pub fn emit(event: &TraceEvent<'_>) {
    // Release the table before calling out: the callback may duplicate the
    // process or install hooks itself
    let hook = current_hook(event.granularity);
    if let Some(hook) = hook {
        hook(event);
    }
}

/// Report that the statement on the current line ran
#[macro_export]
macro_rules! trace_statement {
    () => {
        $crate::emit(&$crate::TraceEvent::statement(file!(), line!()))
    };
}

/// Report a call to the named function
#[macro_export]
macro_rules! trace_call {
    ($function:expr) => {
        $crate::emit(&$crate::TraceEvent::call(file!(), line!(), $function))
    };
}
