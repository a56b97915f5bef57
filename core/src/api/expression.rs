//! Compiled expressions.

use super::Error;
use crate::evaluator::{Evaluator, Value};
use crate::scope_stack::LocalStorage;
use crate::symbols::{SymbolTable, SymbolTableList};
use crate::tree::{NodeArena, NodeId, ReturnSink, ValueKind};
use std::rc::Rc;
use tracing::{debug, warn};

/// Everything a successful compile hands to its [`Expression`].
pub(crate) struct Compiled {
    pub arena: NodeArena,
    pub root: NodeId,
    /// Storage of `var` locals. Nodes hold their own references; this
    /// keeps the locals alive for the expression's lifetime.
    pub locals: Vec<LocalStorage>,
    pub returns: Rc<ReturnSink>,
    pub kind: ValueKind,
}

/// A compilable, re-evaluable expression bound to a list of symbol tables.
///
/// # Example
///
/// ```
/// use calyx_core::{Expression, Parser, SymbolTable};
///
/// let table = SymbolTable::new();
/// let x = table.add_variable("x", 3.0).unwrap();
///
/// let mut expression = Expression::new();
/// expression.register_symbol_table(table);
/// assert!(Parser::default().compile("x^2 + 1", &mut expression));
/// assert_eq!(expression.value(), 10.0);
///
/// x.set(4.0);
/// assert_eq!(expression.value(), 17.0);
/// ```
#[derive(Default)]
pub struct Expression {
    symbols: SymbolTableList,
    compiled: Option<Compiled>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table to the lookup list. Earlier tables win on name
    /// clashes.
    pub fn register_symbol_table(&mut self, table: SymbolTable) {
        self.symbols.push(table);
    }

    pub fn symbol_tables(&self) -> &SymbolTableList {
        &self.symbols
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Evaluate in scalar context. NaN when nothing is compiled or a loop
    /// runtime check aborts the evaluation.
    pub fn value(&self) -> f64 {
        let Some(compiled) = &self.compiled else {
            return f64::NAN;
        };
        match Evaluator::new(&compiled.arena).evaluate_scalar(&compiled.root) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "Evaluation aborted");
                f64::NAN
            }
        }
    }

    /// Evaluate in the context of the expression's result kind.
    pub fn evaluate(&self) -> Result<Value, Error> {
        let compiled = self
            .compiled
            .as_ref()
            .ok_or_else(|| Error::Api("expression is not compiled".to_string()))?;
        Ok(Evaluator::new(&compiled.arena).evaluate(&compiled.root)?)
    }

    /// Values passed to the `return` statement of the last evaluation.
    pub fn results(&self) -> Vec<Value> {
        self.compiled
            .as_ref()
            .map(|c| c.returns.values())
            .unwrap_or_default()
    }

    /// Whether the last evaluation ended through `return`.
    pub fn return_invoked(&self) -> bool {
        self.compiled.as_ref().is_some_and(|c| c.returns.invoked())
    }

    pub fn result_kind(&self) -> Option<ValueKind> {
        self.compiled.as_ref().map(|c| c.kind)
    }

    /// Live nodes of the compiled tree, zero when nothing is compiled.
    pub fn node_count(&self) -> usize {
        self.compiled
            .as_ref()
            .map_or(0, |c| c.arena.live_count())
    }

    /// Outline of the compiled tree, one node per line.
    pub fn render(&self) -> Option<String> {
        self.compiled.as_ref().map(|c| c.arena.render(&c.root))
    }

    /// Number of `var` locals the compiled expression owns.
    pub fn local_count(&self) -> usize {
        self.compiled.as_ref().map_or(0, |c| c.locals.len())
    }

    /// Drop the compiled tree and its locals. Symbol tables stay
    /// registered.
    pub fn release(&mut self) {
        if let Some(compiled) = self.compiled.take() {
            debug!(locals = compiled.locals.len(), "Released compiled expression");
        }
    }

    pub(crate) fn set_compiled(&mut self, compiled: Compiled) {
        self.compiled = Some(compiled);
    }
}
