//! Incremental construction of `if` / `elif` / `else` chains.

use crate::expr::Expr;
use crate::location::Location;

/// Builds a conditional chain one clause at a time.
///
/// Each `elif` becomes the false branch of the current tail, found with
/// [`Expr::find_tail_mut`]. `else_` closes the chain, so no clause can
/// follow it.
///
/// ```
/// use fx_expr::{Expr, IfChainBuilder, Location};
///
/// let chain = IfChainBuilder::if_(Expr::variable("a"), Expr::literal("first"), Location::inline(1, 1))
///     .elif(Expr::variable("b"), Expr::literal("second"), Location::inline(2, 1))
///     .else_(Expr::literal("fallback"));
/// assert!(chain.is_conditional());
/// ```
#[derive(Debug)]
pub struct IfChainBuilder {
    chain: Expr,
}

impl IfChainBuilder {
    /// Start a chain with its first clause.
    pub fn if_(condition: Expr, body: Expr, location: Location) -> Self {
        IfChainBuilder {
            chain: Expr::ternary(condition, Some(body), None, location),
        }
    }

    /// Continue an existing chain.
    ///
    /// Returns `None` if `chain` is not a conditional or is already closed
    /// by an `else`.
    pub fn extend(chain: Expr) -> Option<Self> {
        let open = chain
            .find_tail()?
            .as_conditional()
            .is_some_and(|tail| tail.false_branch().is_none());
        open.then_some(IfChainBuilder { chain })
    }

    /// Append an `elif` clause.
    #[must_use]
    pub fn elif(mut self, condition: Expr, body: Expr, location: Location) -> Self {
        self.append(Expr::ternary(condition, Some(body), None, location));
        self
    }

    /// Close the chain with an `else` body.
    pub fn else_(mut self, body: Expr) -> Expr {
        self.append(body);
        self.chain
    }

    /// Finish without an `else`. A record matching no clause evaluates to `true`.
    pub fn build(self) -> Expr {
        self.chain
    }

    fn append(&mut self, branch: Expr) {
        if let Some(tail) = self.chain.find_tail_mut().and_then(Expr::as_conditional_mut) {
            tail.set_false_branch(Some(branch));
        }
    }
}
