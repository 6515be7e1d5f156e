//! Compiled form of the needle argument.

use fx_value::Value;
use smallvec::SmallVec;

use super::fold_case;
use crate::errors::ArgumentError;
use crate::expr::{optimize_all, Expr};

/// What the needle argument was resolved to when the call was built.
///
/// Literal strings are extracted (and case-folded, if requested) once, so
/// evaluation never touches their `Value`s again.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Needle {
    /// A single string literal.
    Literal(String),
    /// A list literal. String literal elements are cached in `literals`;
    /// the remaining elements are evaluated per record, in list order.
    List {
        literals: SmallVec<[String; 4]>,
        dynamic: SmallVec<[Expr; 2]>,
    },
    /// Anything else. Evaluated per record; may yield a string or a list.
    Dynamic(Expr),
}

impl Needle {
    /// Classify `expr`. Literal values that are not strings are rejected.
    pub(crate) fn from_expr(
        expr: Expr,
        ignore_case: bool,
        function: &str,
    ) -> Result<Needle, ArgumentError> {
        if let Some(elements) = expr.literal_list_elements() {
            let mut literals = SmallVec::new();
            let mut dynamic = SmallVec::new();
            for element in elements {
                match element.literal_value() {
                    Some(value) => {
                        let s = value.extract_string().ok_or_else(|| {
                            ArgumentError::new(
                                function,
                                format!(
                                    "needle list elements must be strings, got {}",
                                    value.type_name()
                                ),
                            )
                        })?;
                        literals.push(prepare(s, ignore_case));
                    }
                    None => dynamic.push(element),
                }
            }
            return Ok(Needle::List { literals, dynamic });
        }

        match expr.literal_value() {
            Some(value) => value
                .extract_string()
                .map(|s| Needle::Literal(prepare(s, ignore_case)))
                .ok_or_else(|| {
                    ArgumentError::new(
                        function,
                        format!(
                            "needle must be a string or a list of strings, got {}",
                            value.type_name()
                        ),
                    )
                }),
            None => Ok(Needle::Dynamic(expr)),
        }
    }

    /// Expressions evaluated per record.
    pub(crate) fn exprs(&self) -> &[Expr] {
        match self {
            Needle::Literal(_) => &[],
            Needle::List { dynamic, .. } => dynamic,
            Needle::Dynamic(expr) => std::slice::from_ref(expr),
        }
    }

    /// Whether the needle is fully known without a record.
    pub(crate) fn is_constant(&self) -> bool {
        self.exprs().is_empty()
    }

    /// Optimize the per-record expressions. Elements that fold into string
    /// literals move into the cache.
    pub(crate) fn optimize(&self, ignore_case: bool, function: &str) -> Option<Needle> {
        match self {
            Needle::Literal(_) => None,
            Needle::List { literals, dynamic } => {
                let (optimized, changed) = optimize_all(dynamic);
                if !changed {
                    return None;
                }
                let mut literals = literals.clone();
                let mut dynamic = SmallVec::new();
                for element in optimized {
                    match element.literal_value().and_then(Value::extract_string) {
                        Some(s) => literals.push(prepare(s, ignore_case)),
                        None => dynamic.push(element),
                    }
                }
                Some(Needle::List { literals, dynamic })
            }
            Needle::Dynamic(expr) => {
                let optimized = expr.optimize()?;
                Some(
                    Needle::from_expr(optimized.clone(), ignore_case, function)
                        .unwrap_or(Needle::Dynamic(optimized)),
                )
            }
        }
    }
}

fn prepare(s: &str, ignore_case: bool) -> String {
    if ignore_case {
        fold_case(s)
    } else {
        s.to_string()
    }
}
