//! FX Expr - evaluation core of the filter expression language.
//!
//! A filter expression decides, per log record, whether and how the record
//! is routed, enriched or dropped. This crate provides the compiled tree and
//! everything it needs at run time.
//!
//! # Architecture
//!
//! - `Expr`: shared handle to a node; `ExprKind` is the closed set of kinds
//! - `Conditional`: ternaries and `if` / `elif` / `else` chains
//! - `AffixFunction`: the `startswith` / `endswith` builtins
//! - `FunctionRegistry` / `FunctionArgs`: builtin lookup and argument binding
//! - `ExprConfig`: what `init` / `deinit` see (the metrics registry)
//! - `EvalContext`: what `eval` sees (record, trace sink, scratch buffers)
//!
//! A tree is built and optimized on one thread, initialized once, then
//! evaluated concurrently by any number of workers, each with its own
//! `EvalContext`.
//!
//! # Re-exports
//!
//! `Value` and `Heap` are re-exported from `fx_value` for convenience.

mod condition;
mod config;
mod context;
pub mod errors;
mod expr;
mod function;
mod location;
pub mod metrics;
mod scratch;
mod stack;
mod trace_handler;

use std::sync::Once;

pub use fx_value::{Heap, MarshalType, Value};

pub use condition::{Conditional, IfChainBuilder, CONDITION_EVALS_COUNTER, CONDITION_EVALS_LEVEL};
pub use config::{ExprConfig, ExprConfigBuilder};
pub use context::{EvalContext, Record};
pub use errors::{ArgumentError, DiagnosticFrame, EvalError, EvalErrorKind, EvalResult, InitError};
pub use expr::{Expr, ExprKind, NodeHeader};
pub use function::{AffixFunction, AffixKind, FunctionArgs, FunctionCtor, FunctionRegistry};
pub use location::Location;
pub use metrics::{Counter, MetricsError, MetricsRegistry, SharedMetricsRegistry, StatsLevel};
pub use scratch::{ScratchBuffer, ScratchBuffers};
pub use stack::ensure_sufficient_stack;
pub use trace_handler::{
    buffer_handler, log_handler, silent_handler, BufferTraceHandler, ConditionTrace,
    LogTraceHandler, SharedTraceHandler, TraceHandlerImpl, TraceRecord,
};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
/// Condition trace events are emitted at TRACE level, so
/// `RUST_LOG=fx_expr=trace` shows them.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
