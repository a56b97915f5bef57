//! Constant folding.

use super::{ExpressionGenerator, GenResult, Outcome};
use crate::evaluator::{Operator, binary, string_binary};
use crate::tree::{Node, NodeId};
use tracing::trace;

impl ExpressionGenerator<'_> {
    /// Fold an operator applied to two literals of the same kind.
    pub(super) fn fold_binary(&mut self, op: Operator, left: NodeId, right: NodeId) -> Outcome {
        if let (Some(a), Some(b)) = (self.arena.literal(&left), self.arena.literal(&right)) {
            self.arena.free_tree(left);
            self.arena.free_tree(right);
            let folded = binary(op, a, b);
            trace!(%op, a, b, folded, "Folded binary");
            return Outcome::Done(self.literal(folded));
        }

        let strings = match (self.arena.get(&left), self.arena.get(&right)) {
            (Node::StringLiteral(a), Node::StringLiteral(b)) => Some((a.clone(), b.clone())),
            _ => None,
        };
        let Some((a, b)) = strings else {
            return Outcome::Pass(left, right);
        };
        self.arena.free_tree(left);
        self.arena.free_tree(right);
        trace!(%op, "Folded string operation");
        if op == Operator::Add {
            Outcome::Done(self.string_literal(a + &b))
        } else {
            Outcome::Done(self.literal(string_binary(op, &a, &b)))
        }
    }

    /// Literal values of `args` when every argument is a literal.
    pub(super) fn literal_args(&self, args: &[NodeId]) -> Option<Vec<f64>> {
        args.iter().map(|id| self.arena.literal(id)).collect()
    }

    /// Replace `args` by the single literal `compute` derives from them,
    /// when all of them are literals.
    pub(super) fn try_fold<F>(&mut self, args: Vec<NodeId>, compute: F) -> Result<GenResult, Vec<NodeId>>
    where
        F: FnOnce(&[f64]) -> f64,
    {
        let Some(values) = self.literal_args(&args) else {
            return Err(args);
        };
        self.arena.free_all(args);
        let folded = compute(&values);
        trace!(?values, folded, "Folded call");
        Ok(self.literal(folded))
    }
}
