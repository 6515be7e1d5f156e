//! `startswith` and `endswith`.
//!
//! Both accept either shape:
//!
//! ```text
//! startswith(haystack, needle[, ignorecase=true])
//! startswith(haystack, needles=[...][, ignorecase=true])
//! ```
//!
//! The needle may be a single string or a list of strings; the call is true
//! as soon as one needle matches. Literal needles are extracted once when
//! the call is built. With `ignorecase`, haystack and needles are compared
//! after Unicode case folding.

mod needle;

use std::borrow::Cow;

use fx_value::Value;

use self::needle::Needle;
use super::FunctionArgs;
use crate::config::ExprConfig;
use crate::context::{EvalContext, Record};
use crate::errors::{failed_to_evaluate, type_mismatch, ArgumentError, EvalError, EvalResult, InitError};
use crate::expr::{deinit_all, init_all, Expr, ExprKind, NodeHeader};
use crate::location::Location;

/// Which end of the haystack a needle is compared against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AffixKind {
    /// `startswith`
    Prefix,
    /// `endswith`
    Suffix,
}

impl AffixKind {
    pub fn function_name(self) -> &'static str {
        match self {
            AffixKind::Prefix => "startswith",
            AffixKind::Suffix => "endswith",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            AffixKind::Prefix => "Usage: startswith(my_string, my_prefix[, ignorecase=true])",
            AffixKind::Suffix => "Usage: endswith(my_string, my_suffix[, ignorecase=true])",
        }
    }

    /// Byte-wise affix test. An empty needle always matches; a needle
    /// longer than the haystack never does.
    #[inline]
    pub fn matches(self, haystack: &str, needle: &str) -> bool {
        let (haystack, needle) = (haystack.as_bytes(), needle.as_bytes());
        if needle.len() > haystack.len() {
            return false;
        }
        match self {
            AffixKind::Prefix => haystack.starts_with(needle),
            AffixKind::Suffix => haystack.ends_with(needle),
        }
    }

    /// Bind `args` into a call of this function.
    pub(crate) fn construct(
        self,
        mut args: FunctionArgs,
        location: Location,
    ) -> Result<Expr, ArgumentError> {
        let function = self.function_name();
        let usage = self.usage();
        let fail = |message: &str| ArgumentError::new(function, message).with_usage(usage);

        let ignore_case = args
            .named_literal_bool(function, "ignorecase")
            .map_err(|e| e.with_usage(usage))?
            .unwrap_or(false);
        let named_needles = args.named("needles");

        let needle = match (args.positional_len(), named_needles) {
            (0, _) => return Err(fail("haystack argument is missing")),
            (1, None) => return Err(fail("needle argument is missing")),
            (1, Some(needles)) => {
                if needles.is_literal() && !needles.is_literal_list() {
                    return Err(fail("needles must be a list"));
                }
                needles
            }
            (2, None) => args
                .positional(1)
                .ok_or_else(|| fail("needle argument is missing"))?,
            (2, Some(_)) => return Err(fail("needle given both positionally and as needles")),
            _ => return Err(fail("too many arguments")),
        };
        let haystack = args
            .positional(0)
            .ok_or_else(|| fail("haystack argument is missing"))?;
        args.check_unused(function).map_err(|e| e.with_usage(usage))?;

        let needle =
            Needle::from_expr(needle, ignore_case, function).map_err(|e| e.with_usage(usage))?;

        Ok(Expr::new(
            function,
            ExprKind::Affix(AffixFunction {
                kind: self,
                haystack,
                needle,
                ignore_case,
            }),
        )
        .at(location))
    }
}

/// Full Unicode default case folding.
///
/// Not the same as lowercasing: `ß` folds to `ss` and final sigma `ς` to
/// `σ`. The result may be longer than the input.
pub fn fold_case(s: &str) -> String {
    caseless::default_case_fold_str(s)
}

/// A bound `startswith` / `endswith` call.
#[derive(Clone, Debug, PartialEq)]
pub struct AffixFunction {
    kind: AffixKind,
    haystack: Expr,
    needle: Needle,
    ignore_case: bool,
}

impl AffixFunction {
    pub fn kind(&self) -> AffixKind {
        self.kind
    }

    pub fn haystack(&self) -> &Expr {
        &self.haystack
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Cached needle strings, already folded when `ignore_case` is set.
    pub fn literal_needles(&self) -> &[String] {
        match &self.needle {
            Needle::Literal(s) => std::slice::from_ref(s),
            Needle::List { literals, .. } => literals,
            Needle::Dynamic(_) => &[],
        }
    }

    /// Needle expressions evaluated per record.
    pub fn dynamic_needles(&self) -> &[Expr] {
        self.needle.exprs()
    }

    fn prepare<'s>(&self, s: &'s str) -> Cow<'s, str> {
        if self.ignore_case {
            Cow::Owned(fold_case(s))
        } else {
            Cow::Borrowed(s)
        }
    }

    fn matches(&self, haystack: &str, needle: &str) -> bool {
        self.kind.matches(haystack, &self.prepare(needle))
    }

    pub(crate) fn eval(&self, header: &NodeHeader, ctx: &EvalContext<'_>) -> EvalResult {
        let location = header.location();
        let value = self.haystack.eval(ctx).map_err(|e| {
            e.wrapped_by(failed_to_evaluate("haystack").with_location(location))
        })?;
        let Some(haystack) = value.extract_string() else {
            return Err(
                type_mismatch("haystack", "a string", value.type_name()).with_location(location)
            );
        };
        let haystack = self.prepare(haystack);

        self.any_needle_matches(&haystack, ctx, location)
            .map(Value::Bool)
    }

    fn any_needle_matches(
        &self,
        haystack: &str,
        ctx: &EvalContext<'_>,
        location: &Location,
    ) -> Result<bool, EvalError> {
        match &self.needle {
            Needle::Literal(needle) => Ok(self.kind.matches(haystack, needle)),
            Needle::List { literals, dynamic } => {
                if literals.iter().any(|needle| self.kind.matches(haystack, needle)) {
                    return Ok(true);
                }
                for expr in dynamic {
                    let value = eval_needle(expr, ctx, location)?;
                    let Some(needle) = value.extract_string() else {
                        return Err(type_mismatch("needle", "a string", value.type_name())
                            .with_location(location));
                    };
                    if self.matches(haystack, needle) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Needle::Dynamic(expr) => {
                let value = eval_needle(expr, ctx, location)?;
                if let Some(needle) = value.extract_string() {
                    return Ok(self.matches(haystack, needle));
                }
                let Some(items) = value.as_list() else {
                    return Err(
                        type_mismatch("needle", "a string or a list", value.type_name())
                            .with_location(location),
                    );
                };
                for item in items {
                    let Some(needle) = item.extract_string() else {
                        return Err(type_mismatch(
                            "needle list element",
                            "a string",
                            item.type_name(),
                        )
                        .with_location(location));
                    };
                    if self.matches(haystack, needle) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Optimize haystack and needle; fold the call into a boolean literal
    /// when neither depends on the record.
    pub(crate) fn optimize(&self, node: &Expr) -> Option<Expr> {
        let haystack = self.haystack.optimize();
        let needle = self
            .needle
            .optimize(self.ignore_case, self.kind.function_name());
        let changed = haystack.is_some() || needle.is_some();

        let func = AffixFunction {
            kind: self.kind,
            haystack: haystack.unwrap_or_else(|| self.haystack.clone()),
            needle: needle.unwrap_or_else(|| self.needle.clone()),
            ignore_case: self.ignore_case,
        };

        if func.haystack.is_literal() && func.needle.is_constant() {
            let record = Record::new();
            if let Ok(value) = func.eval(node.header(), &EvalContext::new(&record)) {
                tracing::debug!(
                    function = self.kind.function_name(),
                    location = %node.location(),
                    "folded call with literal arguments"
                );
                return Some(Expr::literal(value).at(node.location().clone()));
            }
        }

        changed.then(|| node.rebuild(ExprKind::Affix(func)))
    }

    fn children(&self) -> impl Iterator<Item = &Expr> {
        std::iter::once(&self.haystack).chain(self.needle.exprs())
    }

    pub(crate) fn init(&self, cfg: &ExprConfig) -> Result<(), InitError> {
        init_all(self.children(), cfg)
    }

    pub(crate) fn deinit(&self, cfg: &ExprConfig) {
        deinit_all(self.children(), cfg);
    }
}

fn eval_needle(expr: &Expr, ctx: &EvalContext<'_>, location: &Location) -> EvalResult {
    expr.eval(ctx)
        .map_err(|e| e.wrapped_by(failed_to_evaluate("needle").with_location(location)))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
