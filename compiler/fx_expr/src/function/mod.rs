//! Builtin function calls: argument binding and the function registry.

mod affix;
mod registry;

pub use affix::{AffixFunction, AffixKind};
pub use registry::{FunctionCtor, FunctionRegistry};

use crate::errors::ArgumentError;
use crate::expr::Expr;

/// Arguments of a builtin call as written by the user.
///
/// Constructors take what they need with [`FunctionArgs::positional`],
/// [`FunctionArgs::named`] and [`FunctionArgs::named_literal_bool`], then
/// call [`FunctionArgs::check_unused`] to reject named arguments nobody
/// asked for.
#[derive(Clone, Debug, Default)]
pub struct FunctionArgs {
    positional: Vec<Expr>,
    named: Vec<NamedArg>,
}

#[derive(Clone, Debug)]
struct NamedArg {
    name: String,
    expr: Expr,
    consumed: bool,
}

impl FunctionArgs {
    pub fn new(positional: Vec<Expr>) -> Self {
        FunctionArgs {
            positional,
            named: Vec::new(),
        }
    }

    /// Add a named argument (`name=expr`).
    #[must_use]
    pub fn with_named(mut self, name: &str, expr: Expr) -> Self {
        self.named.push(NamedArg {
            name: name.to_string(),
            expr,
            consumed: false,
        });
        self
    }

    /// Total number of arguments, positional and named.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    pub fn positional(&self, index: usize) -> Option<Expr> {
        self.positional.get(index).cloned()
    }

    /// Take the named argument `name`, marking it as used.
    pub fn named(&mut self, name: &str) -> Option<Expr> {
        let arg = self.named.iter_mut().find(|arg| arg.name == name)?;
        arg.consumed = true;
        Some(arg.expr.clone())
    }

    /// Take the named argument `name`, which must be a boolean literal.
    ///
    /// `Ok(None)` if the argument was not given.
    pub fn named_literal_bool(
        &mut self,
        function: &str,
        name: &str,
    ) -> Result<Option<bool>, ArgumentError> {
        let Some(expr) = self.named(name) else {
            return Ok(None);
        };
        match expr.literal_value() {
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                ArgumentError::new(
                    function,
                    format!("{name} must be a boolean literal, got {}", value.type_name()),
                )
            }),
            None => Err(ArgumentError::new(
                function,
                format!("{name} must be a boolean literal"),
            )),
        }
    }

    /// Fail on the first named argument that no constructor consumed.
    pub fn check_unused(&self, function: &str) -> Result<(), ArgumentError> {
        match self.named.iter().find(|arg| !arg.consumed) {
            Some(arg) => Err(ArgumentError::new(
                function,
                format!("unexpected argument: {}", arg.name),
            )),
            None => Ok(()),
        }
    }
}
