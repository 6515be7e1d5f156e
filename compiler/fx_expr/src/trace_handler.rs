//! Sinks for per-record condition trace events.
//!
//! When tracing is enabled on an evaluation context, every conditional node
//! reports the value its condition produced and which way it branched.
//! Where those reports go is decided by the handler:
//! - `Log`: a `tracing` event at TRACE level (default)
//! - `Buffer`: captured in memory for assertions
//! - `Silent`: discarded
//!
//! Uses enum dispatch, matching how output handlers are selected elsewhere
//! in the workspace.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::location::Location;

/// One condition trace event, borrowed from the evaluating node.
#[derive(Copy, Clone, Debug)]
pub struct ConditionTrace<'a> {
    pub location: &'a Location,
    /// Rendered condition value.
    pub value: &'a str,
    pub truthy: bool,
    pub type_name: &'static str,
}

impl ConditionTrace<'_> {
    /// Event label: `FILTERX CONDT` for a truthy condition, `FILTERX CONDF` otherwise.
    pub fn label(&self) -> &'static str {
        if self.truthy {
            "FILTERX CONDT"
        } else {
            "FILTERX CONDF"
        }
    }

    pub fn to_record(&self) -> TraceRecord {
        TraceRecord {
            label: self.label(),
            location: self.location.clone(),
            value: self.value.to_string(),
            truthy: self.truthy,
            type_name: self.type_name,
        }
    }
}

/// Owned copy of a [`ConditionTrace`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    pub label: &'static str,
    pub location: Location,
    pub value: String,
    pub truthy: bool,
    pub type_name: &'static str,
}

/// Forwards trace events to the `tracing` subscriber.
#[derive(Default)]
pub struct LogTraceHandler;

impl LogTraceHandler {
    pub fn emit(&self, event: &ConditionTrace<'_>) {
        tracing::trace!(
            location = %event.location,
            value = event.value,
            truthy = event.truthy,
            type_name = event.type_name,
            "{}",
            event.label()
        );
    }
}

/// Captures trace events in memory.
#[derive(Default)]
pub struct BufferTraceHandler {
    records: Mutex<Vec<TraceRecord>>,
}

impl BufferTraceHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: &ConditionTrace<'_>) {
        self.records.lock().push(event.to_record());
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

/// Trace handler implementation using enum dispatch.
pub enum TraceHandlerImpl {
    /// Emits `tracing` events (default).
    Log(LogTraceHandler),
    /// Captures to memory (testing).
    Buffer(BufferTraceHandler),
    /// Discards events.
    Silent,
}

impl TraceHandlerImpl {
    pub fn emit(&self, event: &ConditionTrace<'_>) {
        match self {
            Self::Log(h) => h.emit(event),
            Self::Buffer(h) => h.emit(event),
            Self::Silent => {}
        }
    }

    /// Captured records. Empty for handlers that don't capture.
    pub fn records(&self) -> Vec<TraceRecord> {
        match self {
            Self::Buffer(h) => h.records(),
            Self::Log(_) | Self::Silent => Vec::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

/// Shared trace handler, cloned into every worker's evaluation context.
pub type SharedTraceHandler = Arc<TraceHandlerImpl>;

pub fn log_handler() -> SharedTraceHandler {
    Arc::new(TraceHandlerImpl::Log(LogTraceHandler))
}

pub fn buffer_handler() -> SharedTraceHandler {
    Arc::new(TraceHandlerImpl::Buffer(BufferTraceHandler::new()))
}

pub fn silent_handler() -> SharedTraceHandler {
    Arc::new(TraceHandlerImpl::Silent)
}
