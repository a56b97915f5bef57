//! Expression generator: operator applications to evaluation nodes.
//!
//! Every synthesis entry point takes ownership of its operand ids. On
//! success the operands are either attached to the returned node or
//! released; on error all of them are released before returning, so the
//! caller never has to clean up after a failed synthesis.
//!
//! Binary synthesis runs, in order: validity checks, null algebra,
//! constant folding, vector and string specialization, chain fusion with
//! its algebraic rewrites, cardinal powers, and finally the generic node.

mod assign;
mod chain;
mod control;
mod fold;
mod specialize;


use crate::api::Settings;
use crate::evaluator::Operator;
use crate::symbols::{ImmutableRanges, ScalarRef, new_vector};
use crate::tree::{Leaf, Node, NodeArena, NodeId, Operand, StringOperand, ValueKind};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("invalid operand for '{op}': {reason}")]
    InvalidOperand { op: String, reason: &'static str },
    #[error("type mismatch for '{op}': {reason}")]
    TypeMismatch { op: String, reason: &'static str },
    #[error("'{0}' is disabled")]
    Disabled(String),
    #[error("assignment to immutable symbol")]
    Immutable,
    #[error("invalid assignment target")]
    InvalidTarget,
    #[error("expression tree depth exceeds {max}")]
    NodeDepthExceeded { max: usize },
    #[error("index {index} is out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}

pub type GenResult = Result<NodeId, GenError>;

/// Result of one binary synthesis pass: either the pass produced the
/// node, or it hands both operands on to the next pass.
enum Outcome {
    Done(GenResult),
    Pass(NodeId, NodeId),
}

macro_rules! pass {
    ($outcome:expr) => {
        match $outcome {
            Outcome::Done(result) => return result,
            Outcome::Pass(left, right) => (left, right),
        }
    };
}

const BREAK_AS_VALUE: &str = "break/continue used as a value";

pub struct ExpressionGenerator<'g> {
    arena: &'g mut NodeArena,
    settings: &'g Settings,
    immutable: &'g ImmutableRanges,
}

impl<'g> ExpressionGenerator<'g> {
    pub fn new(
        arena: &'g mut NodeArena,
        settings: &'g Settings,
        immutable: &'g ImmutableRanges,
    ) -> Self {
        Self {
            arena,
            settings,
            immutable,
        }
    }

    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    /// Allocate a node, enforcing the tree depth bound.
    pub fn alloc(&mut self, node: Node) -> GenResult {
        let id = self.arena.allocate(node);
        let max = self.settings.max_node_depth;
        if self.arena.depth(&id) > max {
            self.arena.free_tree(id);
            return Err(GenError::NodeDepthExceeded { max });
        }
        Ok(id)
    }

    pub fn free(&mut self, id: NodeId) {
        self.arena.free_tree(id);
    }

    pub fn free_all<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        self.arena.free_all(ids);
    }

    /// Release `ids` and return `err`.
    fn fail<I: IntoIterator<Item = NodeId>>(&mut self, ids: I, err: GenError) -> GenResult {
        self.arena.free_all(ids);
        Err(err)
    }

    pub fn literal(&mut self, value: f64) -> GenResult {
        self.alloc(Node::Literal(value))
    }

    pub fn string_literal(&mut self, value: String) -> GenResult {
        self.alloc(Node::StringLiteral(value))
    }

    pub fn null(&mut self) -> GenResult {
        self.alloc(Node::Null)
    }

    pub fn variable(&mut self, var: ScalarRef) -> GenResult {
        self.alloc(Node::Variable(var))
    }

    pub fn kind(&self, id: &NodeId) -> ValueKind {
        self.arena.kind(id)
    }

    pub fn literal_value(&self, id: &NodeId) -> Option<f64> {
        self.arena.literal(id)
    }

    fn is_null(&self, id: &NodeId) -> bool {
        self.arena.get(id).is_null()
    }

    fn is_break_or_continue(&self, id: &NodeId) -> bool {
        self.arena.get(id).is_break_or_continue()
    }

    /// Reject break/continue in value position.
    fn check_values(&mut self, op: &str, ids: Vec<NodeId>) -> Result<Vec<NodeId>, GenError> {
        if ids.iter().any(|id| self.is_break_or_continue(id)) {
            self.arena.free_all(ids);
            return Err(GenError::InvalidOperand {
                op: op.to_string(),
                reason: BREAK_AS_VALUE,
            });
        }
        Ok(ids)
    }

    /// Reject string operands where only scalars are accepted.
    fn check_numeric(&mut self, op: &str, ids: Vec<NodeId>) -> Result<Vec<NodeId>, GenError> {
        if ids.iter().any(|id| self.kind(id) == ValueKind::String) {
            self.arena.free_all(ids);
            return Err(GenError::TypeMismatch {
                op: op.to_string(),
                reason: "string argument",
            });
        }
        Ok(ids)
    }

    /// Scalar-producing leaf: a variable or a literal.
    fn leaf(&self, id: &NodeId) -> Option<Leaf> {
        match self.arena.get(id) {
            Node::Variable(v) => Some(Leaf::Var(v.clone())),
            Node::Literal(c) => Some(Leaf::Const(*c)),
            _ => None,
        }
    }

    /// Convert a node into a binary operand slot, unwrapping variables
    /// and literals.
    fn operand(&mut self, id: NodeId) -> Operand {
        match self.leaf(&id) {
            Some(Leaf::Var(v)) => {
                self.arena.free_tree(id);
                Operand::Var(v)
            }
            Some(Leaf::Const(c)) => {
                self.arena.free_tree(id);
                Operand::Const(c)
            }
            None => Operand::Node(id),
        }
    }

    fn string_operand(&mut self, id: NodeId) -> StringOperand {
        match self.arena.get(&id) {
            Node::StringVar(s) => {
                let s = s.clone();
                self.arena.free_tree(id);
                StringOperand::Var(s)
            }
            Node::StringLiteral(s) => {
                let s = s.clone();
                self.arena.free_tree(id);
                StringOperand::Literal(s)
            }
            _ => StringOperand::Node(id),
        }
    }

    fn check_enabled(&self, op: Operator) -> Result<(), GenError> {
        if self.settings.operator_enabled(op) {
            Ok(())
        } else {
            Err(GenError::Disabled(op.symbol().to_string()))
        }
    }

    /// Synthesize a unary operator or one-argument base function.
    pub fn unary(&mut self, op: Operator, operand: NodeId) -> GenResult {
        if let Err(err) = self.check_enabled(op) {
            return self.fail([operand], err);
        }
        if self.is_break_or_continue(&operand) {
            return self.fail(
                [operand],
                GenError::InvalidOperand {
                    op: op.to_string(),
                    reason: BREAK_AS_VALUE,
                },
            );
        }
        if self.is_null(&operand) {
            return Ok(operand);
        }

        match self.kind(&operand) {
            ValueKind::String => {
                return self.fail(
                    [operand],
                    GenError::TypeMismatch {
                        op: op.to_string(),
                        reason: "string operand",
                    },
                );
            }
            ValueKind::Vector => {
                let size = self.arena.vector_size(&operand);
                return self.alloc(Node::UnaryVector {
                    op,
                    operand,
                    temp: new_vector(size),
                });
            }
            ValueKind::Scalar => {}
        }

        if op == Operator::Pos {
            return Ok(operand);
        }
        if let Some(value) = self.arena.literal(&operand) {
            self.arena.free_tree(operand);
            let folded = crate::evaluator::unary(op, value);
            trace!(%op, value, folded, "Folded unary");
            return self.literal(folded);
        }

        match self.arena.get(&operand) {
            Node::Unary {
                op: Operator::Neg, ..
            } if op == Operator::Neg => {
                let mut inner = self.arena.take(operand).into_children();
                match inner.pop() {
                    Some(inner) => Ok(inner),
                    None => self.null(),
                }
            }
            Node::UnaryVar {
                op: Operator::Neg,
                var,
            } if op == Operator::Neg => {
                let var = var.clone();
                self.arena.free_tree(operand);
                self.variable(var)
            }
            Node::Variable(var) => {
                let var = var.clone();
                self.arena.free_tree(operand);
                self.alloc(Node::UnaryVar { op, var })
            }
            _ => self.alloc(Node::Unary { op, operand }),
        }
    }

    /// Synthesize a binary operator or two-argument base function.
    pub fn binary(&mut self, op: Operator, left: NodeId, right: NodeId) -> GenResult {
        if let Err(err) = self.check_enabled(op) {
            return self.fail([left, right], err);
        }
        if self.is_break_or_continue(&left) || self.is_break_or_continue(&right) {
            return self.fail(
                [left, right],
                GenError::InvalidOperand {
                    op: op.to_string(),
                    reason: BREAK_AS_VALUE,
                },
            );
        }

        let strings = (
            self.kind(&left) == ValueKind::String,
            self.kind(&right) == ValueKind::String,
        );
        let string_capable = op.is_comparison() || op.is_string_only() || op == Operator::Add;
        let mismatch = match strings {
            (true, true) if !string_capable => Some("operator does not apply to strings"),
            (true, false) | (false, true) => Some("string and non-string operands"),
            (false, false) if op.is_string_only() => Some("operator requires string operands"),
            _ => None,
        };
        if let Some(reason) = mismatch {
            return self.fail(
                [left, right],
                GenError::TypeMismatch {
                    op: op.to_string(),
                    reason,
                },
            );
        }

        let (left, right) = pass!(self.null_algebra(op, left, right));
        let (left, right) = pass!(self.fold_binary(op, left, right));
        if strings.0 {
            return self.string_binary(op, left, right);
        }
        if self.kind(&left) == ValueKind::Vector || self.kind(&right) == ValueKind::Vector {
            return self.vector_binary(op, left, right);
        }
        let (left, right) = pass!(self.fuse(op, left, right));
        let (left, right) = pass!(self.cardinal_pow(op, left, right));

        let left = self.operand(left);
        let right = self.operand(right);
        self.alloc(Node::Binary { op, left, right })
    }

    /// `null` with equality folds to a boolean; with anything else the
    /// non-null operand passes through unchanged.
    fn null_algebra(&mut self, op: Operator, left: NodeId, right: NodeId) -> Outcome {
        let (ln, rn) = (self.is_null(&left), self.is_null(&right));
        if !ln && !rn {
            return Outcome::Pass(left, right);
        }
        let equality = matches!(op, Operator::Eq | Operator::Ne);
        let equal = op == Operator::Eq;

        if ln && rn {
            self.arena.free_tree(right);
            if equality {
                self.arena.free_tree(left);
                return Outcome::Done(self.literal(if equal { 1.0 } else { 0.0 }));
            }
            return Outcome::Done(Ok(left));
        }

        let (null, other) = if ln { (left, right) } else { (right, left) };
        self.arena.free_tree(null);
        if !equality {
            return Outcome::Done(Ok(other));
        }
        if let Some(value) = self.arena.literal(&other) {
            self.arena.free_tree(other);
            let result = value.is_nan() == equal;
            return Outcome::Done(self.literal(if result { 1.0 } else { 0.0 }));
        }
        Outcome::Done(self.alloc(Node::NullEquality {
            operand: other,
            equal,
        }))
    }

    /// A sequence of statements; a single statement is returned as is.
    pub fn sequence(&mut self, mut items: Vec<NodeId>) -> GenResult {
        match items.len() {
            0 => self.null(),
            1 => match items.pop() {
                Some(only) => Ok(only),
                None => self.null(),
            },
            _ => self.alloc(Node::Sequence(items)),
        }
    }
}
