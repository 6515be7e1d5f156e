//! Expression nodes and the lifecycle every node follows.
//!
//! A tree goes through these phases, in order:
//!
//! 1. **construct**: nodes are built from arguments (`Expr::literal`,
//!    `Expr::conditional`, `FunctionRegistry::construct`, ...). Malformed
//!    builtin calls fail here with an `ArgumentError`.
//! 2. **optimize** (at most once): `Expr::optimize` folds literals and drops
//!    dead branches, returning a replacement subtree.
//! 3. **init** (at most once): registers runtime resources such as counters.
//!    A failing `init` undoes whatever it already acquired.
//! 4. **eval** (any number of times, possibly from many threads).
//! 5. **deinit**: mirrors `init`. Safe on nodes that were never initialized.
//! 6. **free**: dropping the last `Expr` handle releases the node, its
//!    children and any cached needle strings.
//!
//! Nodes are immutable once shared. `optimize` never edits a node in place;
//! a rewrite builds a new node that reuses the old header, so the
//! evaluation counter survives optimization.

use std::fmt;
use std::sync::Arc;

use fx_value::Value;

use crate::condition::Conditional;
use crate::config::ExprConfig;
use crate::context::EvalContext;
use crate::errors::{list_element_failed, undefined_variable, EvalResult, InitError};
use crate::function::AffixFunction;
use crate::location::Location;
use crate::metrics::Counter;
use crate::stack::ensure_sufficient_stack;

/// Data every node carries regardless of kind.
#[derive(Clone, Debug)]
pub struct NodeHeader {
    location: Location,
    /// Short kind name used in diagnostics (`conditional`, `startswith`, ...).
    name: &'static str,
    eval_count: Counter,
    suppress_from_trace: bool,
}

impl NodeHeader {
    pub(crate) fn new(name: &'static str) -> Self {
        NodeHeader {
            location: Location::default(),
            name,
            eval_count: Counter::new(),
            suppress_from_trace: false,
        }
    }

    /// Same header with a fresh counter, for a node that is being copied
    /// rather than rebuilt.
    fn detached(&self) -> Self {
        NodeHeader {
            eval_count: Counter::new(),
            ..self.clone()
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn eval_count(&self) -> &Counter {
        &self.eval_count
    }

    pub fn suppress_from_trace(&self) -> bool {
        self.suppress_from_trace
    }
}

/// The closed set of node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Compile-time constant.
    Literal(Value),
    /// List literal. Elements may be arbitrary expressions.
    List(Vec<Expr>),
    /// Field of the record being evaluated.
    Variable(String),
    Conditional(Conditional),
    /// `startswith` / `endswith`.
    Affix(AffixFunction),
}

/// A node: header plus kind-specific payload.
#[derive(Debug)]
pub struct ExprNode {
    header: NodeHeader,
    kind: ExprKind,
}

impl Clone for ExprNode {
    fn clone(&self) -> Self {
        ExprNode {
            header: self.header.detached(),
            kind: self.kind.clone(),
        }
    }
}

/// Shared handle to an expression node.
///
/// Cloning is cheap and aliases the node: the optimizer relies on this to
/// return an existing branch as the replacement of a folded conditional.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    pub(crate) fn from_parts(header: NodeHeader, kind: ExprKind) -> Expr {
        Expr(Arc::new(ExprNode { header, kind }))
    }

    pub(crate) fn new(name: &'static str, kind: ExprKind) -> Expr {
        Self::from_parts(NodeHeader::new(name), kind)
    }

    /// Constant value.
    pub fn literal(value: impl Into<Value>) -> Expr {
        Self::new("literal", ExprKind::Literal(value.into()))
    }

    /// List literal built from `elements`.
    pub fn list(elements: Vec<Expr>) -> Expr {
        Self::new("list", ExprKind::List(elements))
    }

    /// Reference to the record field `name`.
    pub fn variable(name: &str) -> Expr {
        Self::new("variable", ExprKind::Variable(name.to_string()))
    }

    /// Set the source location. Copies the node if the handle is shared.
    #[must_use]
    pub fn at(mut self, location: Location) -> Expr {
        self.make_mut().header.location = location;
        self
    }

    /// Mark the node as one that reports its own trace events, so generic
    /// per-expression tracers skip it. Conditionals set this on themselves.
    #[must_use]
    pub fn suppressed_from_trace(mut self) -> Expr {
        self.make_mut().header.suppress_from_trace = true;
        self
    }

    /// Node with the same header but a different payload.
    pub(crate) fn rebuild(&self, kind: ExprKind) -> Expr {
        Self::from_parts(self.0.header.clone(), kind)
    }

    /// Exclusive access to the node, copying it first if it is shared.
    pub(crate) fn make_mut(&mut self) -> &mut ExprNode {
        Arc::make_mut(&mut self.0)
    }

    pub fn header(&self) -> &NodeHeader {
        &self.0.header
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    pub fn location(&self) -> &Location {
        &self.0.header.location
    }

    pub fn name(&self) -> &'static str {
        self.0.header.name
    }

    /// How many times this node has been evaluated.
    pub fn eval_count(&self) -> u64 {
        self.0.header.eval_count.get()
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(a: &Expr, b: &Expr) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Evaluate against the record in `ctx`.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> EvalResult {
        self.0.header.eval_count.inc();
        ensure_sufficient_stack(|| match &self.0.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::List(elements) => self.eval_list(elements, ctx),
            ExprKind::Variable(name) => ctx
                .lookup(name)
                .cloned()
                .ok_or_else(|| undefined_variable(name).with_location(self.location())),
            ExprKind::Conditional(cond) => cond.eval(ctx),
            ExprKind::Affix(func) => func.eval(self.header(), ctx),
        })
    }

    fn eval_list(&self, elements: &[Expr], ctx: &EvalContext<'_>) -> EvalResult {
        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let value = element
                .eval(ctx)
                .map_err(|e| e.wrapped_by(list_element_failed(i).with_location(self.location())))?;
            items.push(value);
        }
        Ok(Value::list(items))
    }

    /// Simplify the subtree rooted here.
    ///
    /// Returns the replacement, or `None` if nothing changed. Applying the
    /// replacement's `optimize` again returns `None`.
    pub fn optimize(&self) -> Option<Expr> {
        ensure_sufficient_stack(|| match &self.0.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => None,
            ExprKind::List(elements) => self.optimize_list(elements),
            ExprKind::Conditional(cond) => cond.optimize(self),
            ExprKind::Affix(func) => func.optimize(self),
        })
    }

    /// Optimize, keeping `self` when there is nothing to simplify.
    #[must_use]
    #[tracing::instrument(level = "trace", skip_all, fields(node = self.name()))]
    pub fn optimized(self) -> Expr {
        match self.optimize() {
            Some(replacement) => {
                tracing::debug!(
                    from = self.name(),
                    to = replacement.name(),
                    location = %self.location(),
                    "optimized expression"
                );
                replacement
            }
            None => self,
        }
    }

    fn optimize_list(&self, elements: &[Expr]) -> Option<Expr> {
        let (elements, changed) = optimize_all(elements);
        if elements.iter().all(Expr::is_literal) {
            let mut items = Vec::with_capacity(elements.len());
            for element in &elements {
                items.push(element.literal_value()?.clone());
            }
            return Some(self.rebuild(ExprKind::Literal(Value::list(items))));
        }
        changed.then(|| self.rebuild(ExprKind::List(elements)))
    }

    /// Acquire runtime resources for the subtree.
    ///
    /// On failure everything acquired so far, including children, has been
    /// released again.
    pub fn init(&self, cfg: &ExprConfig) -> Result<(), InitError> {
        ensure_sufficient_stack(|| match &self.0.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => Ok(()),
            ExprKind::List(elements) => init_all(elements.iter(), cfg),
            ExprKind::Conditional(cond) => cond.init(self.header(), cfg),
            ExprKind::Affix(func) => func.init(cfg),
        })
    }

    /// Release what `init` acquired. A no-op on nodes that hold nothing.
    pub fn deinit(&self, cfg: &ExprConfig) {
        ensure_sufficient_stack(|| match &self.0.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => {}
            ExprKind::List(elements) => deinit_all(elements.iter(), cfg),
            ExprKind::Conditional(cond) => cond.deinit(self.header(), cfg),
            ExprKind::Affix(func) => func.deinit(cfg),
        });
    }

    /// Whether the value is known without a record.
    pub fn is_literal(&self) -> bool {
        matches!(self.0.kind, ExprKind::Literal(_))
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.0.kind {
            ExprKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this is a list literal, or a literal whose value is a list.
    ///
    /// The elements of a list literal need not be literal themselves.
    pub fn is_literal_list(&self) -> bool {
        match &self.0.kind {
            ExprKind::List(_) => true,
            ExprKind::Literal(value) => value.is_list(),
            _ => false,
        }
    }

    /// Elements of a literal list, in order, or `None` if this is not one.
    pub fn literal_list_elements(&self) -> Option<Vec<Expr>> {
        match &self.0.kind {
            ExprKind::List(elements) => Some(elements.clone()),
            ExprKind::Literal(value) => value
                .as_list()
                .map(|items| items.iter().cloned().map(Expr::literal).collect()),
            _ => None,
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self.0.kind, ExprKind::Conditional(_))
    }

    pub fn as_conditional(&self) -> Option<&Conditional> {
        match &self.0.kind {
            ExprKind::Conditional(cond) => Some(cond),
            _ => None,
        }
    }

    pub fn as_affix(&self) -> Option<&AffixFunction> {
        match &self.0.kind {
            ExprKind::Affix(func) => Some(func),
            _ => None,
        }
    }

    /// Mutable access to a conditional, copying the node if it is shared.
    pub fn as_conditional_mut(&mut self) -> Option<&mut Conditional> {
        if !self.is_conditional() {
            return None;
        }
        match &mut self.make_mut().kind {
            ExprKind::Conditional(cond) => Some(cond),
            _ => None,
        }
    }
}

/// Optimize every expression in `exprs`; the flag reports whether any changed.
pub(crate) fn optimize_all(exprs: &[Expr]) -> (Vec<Expr>, bool) {
    let mut changed = false;
    let optimized = exprs
        .iter()
        .map(|expr| match expr.optimize() {
            Some(replacement) => {
                changed = true;
                replacement
            }
            None => expr.clone(),
        })
        .collect();
    (optimized, changed)
}

/// Initialize `exprs` in order. If one fails, the ones before it are
/// deinitialized in reverse order and the error is returned.
pub(crate) fn init_all<'a>(
    exprs: impl IntoIterator<Item = &'a Expr>,
    cfg: &ExprConfig,
) -> Result<(), InitError> {
    let mut done: Vec<&Expr> = Vec::new();
    for expr in exprs {
        if let Err(err) = expr.init(cfg) {
            for initialized in done.iter().rev() {
                initialized.deinit(cfg);
            }
            return Err(err);
        }
        done.push(expr);
    }
    Ok(())
}

pub(crate) fn deinit_all<'a>(exprs: impl IntoIterator<Item = &'a Expr>, cfg: &ExprConfig) {
    for expr in exprs {
        expr.deinit(cfg);
    }
}

/// Structural equality. Headers (location, counter) are not compared.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Expr::ptr_eq(self, other) || self.0.kind == other.0.kind
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ExprKind::Literal(value) => write!(f, "Literal({value:?})"),
            ExprKind::List(elements) => f.debug_tuple("List").field(elements).finish(),
            ExprKind::Variable(name) => write!(f, "Variable({name})"),
            ExprKind::Conditional(cond) => fmt::Debug::fmt(cond, f),
            ExprKind::Affix(func) => fmt::Debug::fmt(func, f),
        }
    }
}
