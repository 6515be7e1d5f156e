//! Name-based lookup of builtin function constructors.

use super::affix::AffixKind;
use super::FunctionArgs;
use crate::errors::ArgumentError;
use crate::expr::Expr;
use crate::location::Location;

/// Builds the expression for one call of a builtin.
///
/// Receives the name the function was called by, its arguments and the
/// location of the call.
pub type FunctionCtor = fn(&str, FunctionArgs, Location) -> Result<Expr, ArgumentError>;

/// Registry mapping builtin names to constructors.
///
/// The set of builtins is closed, so lookup is a `match` rather than a map.
pub struct FunctionRegistry {
    _private: (),
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry { _private: () }
    }

    /// Constructor registered under `name`.
    pub fn get(&self, name: &str) -> Option<FunctionCtor> {
        match name {
            "startswith" => Some(startswith),
            "endswith" => Some(endswith),
            _ => None,
        }
    }

    /// Build a call of `name`. Unknown names are an argument error.
    pub fn construct(
        &self,
        name: &str,
        args: FunctionArgs,
        location: Location,
    ) -> Result<Expr, ArgumentError> {
        let ctor = self
            .get(name)
            .ok_or_else(|| ArgumentError::new(name, "unknown function"))?;
        ctor(name, args, location)
    }

    /// All registered builtin names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        [AffixKind::Prefix.function_name(), AffixKind::Suffix.function_name()].into_iter()
    }

    pub fn len(&self) -> usize {
        self.names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn startswith(_name: &str, args: FunctionArgs, location: Location) -> Result<Expr, ArgumentError> {
    AffixKind::Prefix.construct(args, location)
}

fn endswith(_name: &str, args: FunctionArgs, location: Location) -> Result<Expr, ArgumentError> {
    AffixKind::Suffix.construct(args, location)
}
