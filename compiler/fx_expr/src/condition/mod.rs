//! Conditional expressions: ternaries and `if` / `elif` / `else` chains.
//!
//! A chain is a conditional whose false branch is another conditional, and
//! so on. `find_tail` locates the last link so more clauses can be appended
//! without rebuilding the chain.

mod chain;

pub use chain::IfChainBuilder;

use fx_value::Value;

use crate::config::ExprConfig;
use crate::context::EvalContext;
use crate::errors::{EvalResult, InitError};
use crate::expr::{deinit_all, init_all, Expr, ExprKind, NodeHeader};
use crate::location::Location;
use crate::metrics::StatsLevel;
use crate::trace_handler::ConditionTrace;

/// Counter every initialized conditional registers its evaluation count under.
pub const CONDITION_EVALS_COUNTER: &str = "fx_condition_evals_total";

/// Level at which [`CONDITION_EVALS_COUNTER`] is collected.
pub const CONDITION_EVALS_LEVEL: StatsLevel = StatsLevel::Level3;

/// Payload of a conditional node.
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    condition: Expr,
    true_branch: Option<Expr>,
    false_branch: Option<Expr>,
}

impl Expr {
    /// Conditional without branches. Attach them with
    /// [`Conditional::set_true_branch`] / [`Conditional::set_false_branch`].
    ///
    /// Conditionals emit their own condition trace, so the node itself is
    /// marked `suppress_from_trace`.
    pub fn conditional(condition: Expr, location: Location) -> Expr {
        Expr::new(
            "conditional",
            ExprKind::Conditional(Conditional {
                condition,
                true_branch: None,
                false_branch: None,
            }),
        )
        .at(location)
        .suppressed_from_trace()
    }

    /// `condition ? true_branch : false_branch`. Either branch may be absent.
    pub fn ternary(
        condition: Expr,
        true_branch: Option<Expr>,
        false_branch: Option<Expr>,
        location: Location,
    ) -> Expr {
        Expr::new(
            "conditional",
            ExprKind::Conditional(Conditional {
                condition,
                true_branch,
                false_branch,
            }),
        )
        .at(location)
        .suppressed_from_trace()
    }

    /// Last conditional of the chain starting here, or `None` if this is not
    /// a conditional at all.
    ///
    /// Follows false branches for as long as they are conditionals, so the
    /// returned node's false branch is either empty or a final `else`.
    pub fn find_tail(&self) -> Option<&Expr> {
        let mut tail = self;
        tail.as_conditional()?;
        while let Some(next) = tail
            .as_conditional()
            .and_then(|cond| cond.false_branch.as_ref())
            .filter(|branch| branch.is_conditional())
        {
            tail = next;
        }
        Some(tail)
    }

    /// Mutable variant of [`Expr::find_tail`]. Shared links on the way are
    /// copied so that the returned node is exclusively owned.
    pub fn find_tail_mut(&mut self) -> Option<&mut Expr> {
        let mut tail = self;
        tail.as_conditional()?;
        loop {
            let next_is_conditional = tail
                .as_conditional()
                .and_then(|cond| cond.false_branch.as_ref())
                .is_some_and(Expr::is_conditional);
            if !next_is_conditional {
                return Some(tail);
            }
            tail = tail.as_conditional_mut()?.false_branch.as_mut()?;
        }
    }
}

impl Conditional {
    pub fn condition(&self) -> &Expr {
        &self.condition
    }

    pub fn true_branch(&self) -> Option<&Expr> {
        self.true_branch.as_ref()
    }

    pub fn false_branch(&self) -> Option<&Expr> {
        self.false_branch.as_ref()
    }

    /// Replace the true branch. Construction-time only.
    pub fn set_true_branch(&mut self, branch: Option<Expr>) {
        self.true_branch = branch;
    }

    /// Replace the false branch. Construction-time only.
    pub fn set_false_branch(&mut self, branch: Option<Expr>) {
        self.false_branch = branch;
    }

    fn children(&self) -> impl Iterator<Item = &Expr> {
        std::iter::once(&self.condition)
            .chain(self.true_branch.as_ref())
            .chain(self.false_branch.as_ref())
    }

    pub(crate) fn eval(&self, ctx: &EvalContext<'_>) -> EvalResult {
        let condition_value = self.condition.eval(ctx)?;
        let truthy = condition_value.truthy();

        if let Some(handler) = ctx.trace_handler() {
            let mut buf = ctx.scratch().acquire();
            if !condition_value.repr(&mut buf) {
                buf.clear();
                assert!(
                    condition_value.marshal(&mut buf).is_some(),
                    "invariant violated: {} value can be neither rendered nor marshalled",
                    condition_value.type_name()
                );
            }
            handler.emit(&ConditionTrace {
                location: self.condition.location(),
                value: buf.as_str(),
                truthy,
                type_name: condition_value.type_name(),
            });
        }

        if truthy {
            match &self.true_branch {
                Some(branch) => branch.eval(ctx),
                None => Ok(condition_value),
            }
        } else {
            match &self.false_branch {
                Some(branch) => branch.eval(ctx),
                None => Ok(Value::Bool(true)),
            }
        }
    }

    /// Optimize the branches, then drop whichever one a literal condition
    /// makes unreachable.
    pub(crate) fn optimize(&self, node: &Expr) -> Option<Expr> {
        let condition = self.condition.optimize();
        let true_branch = self.true_branch.as_ref().map(Expr::optimize);
        let false_branch = self.false_branch.as_ref().map(Expr::optimize);

        let changed = condition.is_some()
            || matches!(true_branch, Some(Some(_)))
            || matches!(false_branch, Some(Some(_)));

        let condition = condition.unwrap_or_else(|| self.condition.clone());
        let true_branch = merge_optimized(self.true_branch.as_ref(), true_branch);
        let false_branch = merge_optimized(self.false_branch.as_ref(), false_branch);

        let Some(value) = condition.literal_value() else {
            return changed.then(|| {
                node.rebuild(ExprKind::Conditional(Conditional {
                    condition,
                    true_branch,
                    false_branch,
                }))
            });
        };

        let replacement = if value.truthy() {
            true_branch.unwrap_or_else(|| condition.clone())
        } else {
            false_branch.unwrap_or_else(|| Expr::literal(true).at(node.location().clone()))
        };
        tracing::debug!(
            location = %node.location(),
            truthy = value.truthy(),
            "folded conditional with literal condition"
        );
        Some(replacement)
    }

    pub(crate) fn init(&self, header: &NodeHeader, cfg: &ExprConfig) -> Result<(), InitError> {
        init_all(self.children(), cfg)?;
        if let Err(err) = cfg.metrics().register_counter(
            CONDITION_EVALS_LEVEL,
            CONDITION_EVALS_COUNTER,
            header.eval_count(),
        ) {
            deinit_all(self.children(), cfg);
            return Err(err.into());
        }
        tracing::debug!(location = %header.location(), "initialized conditional");
        Ok(())
    }

    pub(crate) fn deinit(&self, header: &NodeHeader, cfg: &ExprConfig) {
        cfg.metrics()
            .unregister_counter(CONDITION_EVALS_COUNTER, header.eval_count());
        deinit_all(self.children(), cfg);
    }
}

fn merge_optimized(original: Option<&Expr>, optimized: Option<Option<Expr>>) -> Option<Expr> {
    match optimized {
        Some(Some(replacement)) => Some(replacement),
        _ => original.cloned(),
    }
}
