//! Error types for expression construction, initialization and evaluation.
//!
//! # Categories
//!
//! - `ArgumentError`: malformed builtin call, raised while the tree is built.
//! - `InitError`: runtime resources could not be acquired in `init`.
//! - `EvalError`: a record could not be evaluated. Carries the chain of
//!   diagnostic frames collected while the error propagated upward.
//!
//! Invariant violations (a literal that fails to evaluate, a value that can
//! be neither rendered nor marshalled) are not represented here: they panic.
//!
//! Factory functions (`failed_to_evaluate`, `type_mismatch`, ...) are the
//! public way to build evaluation errors; they keep messages consistent.

use std::fmt;

use fx_value::Value;

use crate::location::Location;
use crate::metrics::MetricsError;

/// Result of evaluating an expression.
pub type EvalResult = Result<Value, EvalError>;

/// Typed category of an evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// A sub-expression failed to produce a value.
    Eval,
    /// A value was present but had the wrong type.
    Type { expected: String, got: String },
}

/// One entry of the diagnostic stack.
///
/// Frames are ordered innermost first: the first frame is where the failure
/// originated, later frames are the expressions it propagated through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticFrame {
    pub location: Option<Location>,
    pub message: String,
}

impl fmt::Display for DiagnosticFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Location of the expression that raised the error.
    pub location: Option<Location>,
    /// Errors this one was raised on top of, innermost first.
    pub frames: Vec<DiagnosticFrame>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind, message: String) -> Self {
        EvalError {
            kind,
            message,
            location: None,
            frames: Vec::new(),
        }
    }

    /// Attach the location of the raising expression.
    #[must_use]
    pub fn with_location(mut self, location: &Location) -> Self {
        self.location = Some(location.clone());
        self
    }

    /// Push an extra frame on top of the diagnostic stack.
    #[must_use]
    pub fn with_frame(mut self, location: Option<Location>, message: impl Into<String>) -> Self {
        self.frames.push(DiagnosticFrame {
            location,
            message: message.into(),
        });
        self
    }

    /// Re-raise this error as `outer`, keeping this error as a frame.
    #[must_use]
    pub fn wrapped_by(mut self, mut outer: EvalError) -> EvalError {
        let mut frames = std::mem::take(&mut self.frames);
        frames.push(DiagnosticFrame {
            location: self.location,
            message: self.message,
        });
        frames.append(&mut outer.frames);
        outer.frames = frames;
        outer
    }

    /// Whether this is a type error.
    pub fn is_type_error(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Type { .. })
    }

    /// The innermost cause, as recorded in the diagnostic stack.
    pub fn root_cause(&self) -> Option<&DiagnosticFrame> {
        self.frames.first()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        for frame in self.frames.iter().rev() {
            write!(f, "\n  caused by: {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

/// A sub-expression failed to evaluate.
#[cold]
pub fn failed_to_evaluate(what: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Eval, format!("failed to evaluate {what}"))
}

/// A value of the wrong type was produced.
#[cold]
pub fn type_mismatch(what: &str, expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(
        EvalErrorKind::Type {
            expected: expected.to_string(),
            got: got.to_string(),
        },
        format!("{what} must be {expected}, got {got}"),
    )
}

/// A record field referenced by the expression is not set.
#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Eval, format!("no such variable: {name}"))
}

/// An element of a list expression failed to evaluate.
#[cold]
pub fn list_element_failed(index: usize) -> EvalError {
    EvalError::from_kind(
        EvalErrorKind::Eval,
        format!("failed to evaluate list element {index}"),
    )
}

/// Malformed builtin function call, detected while building the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentError {
    pub function: String,
    pub message: String,
    pub usage: Option<&'static str>,
}

impl ArgumentError {
    pub fn new(function: &str, message: impl Into<String>) -> Self {
        ArgumentError {
            function: function.to_string(),
            message: message.into(),
            usage: None,
        }
    }

    /// Attach a usage hint shown after the message.
    #[must_use]
    pub fn with_usage(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(): {}", self.function, self.message)?;
        if let Some(usage) = self.usage {
            write!(f, "; {usage}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ArgumentError {}

/// Failure to acquire runtime resources in `init`.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}
