//! Per-record evaluation context.
//!
//! A compiled expression tree is shared by all workers; each worker builds
//! its own `EvalContext` for the record it is processing. The context holds
//! everything `eval` may touch besides the tree itself: the record's fields,
//! the trace sink and the scratch-buffer pool.

use fx_value::Value;
use rustc_hash::FxHashMap;

use crate::scratch::ScratchBuffers;
use crate::trace_handler::SharedTraceHandler;

/// Fields of one log record, addressed by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: FxHashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// State for evaluating one record.
pub struct EvalContext<'r> {
    record: &'r Record,
    trace: Option<SharedTraceHandler>,
    scratch: ScratchBuffers,
}

impl<'r> EvalContext<'r> {
    pub fn new(record: &'r Record) -> Self {
        EvalContext {
            record,
            trace: None,
            scratch: ScratchBuffers::new(),
        }
    }

    /// Enable condition tracing into `handler`.
    #[must_use]
    pub fn with_trace(mut self, handler: SharedTraceHandler) -> Self {
        self.trace = Some(handler);
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.is_some()
    }

    pub(crate) fn trace_handler(&self) -> Option<&SharedTraceHandler> {
        self.trace.as_ref()
    }

    pub fn scratch(&self) -> &ScratchBuffers {
        &self.scratch
    }

    /// Look up a record field.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn record(&self) -> &Record {
        self.record
    }
}
