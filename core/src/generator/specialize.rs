//! Vector and string node selection.

use super::{ExpressionGenerator, GenError, GenResult};
use crate::evaluator::{Operator, VarArgOp};
use crate::symbols::{StringRef, VectorRef, new_vector};
use crate::tree::{Bound, Node, NodeId, RangeSpec, StringSource, ValueKind, VectorOperand};
use tracing::trace;

impl ExpressionGenerator<'_> {
    pub(super) fn vector_binary(&mut self, op: Operator, left: NodeId, right: NodeId) -> GenResult {
        if !(op.is_arithmetic() || op.is_comparison() || op.is_logic()) {
            return self.fail(
                [left, right],
                GenError::TypeMismatch {
                    op: op.to_string(),
                    reason: "operator does not apply to vectors",
                },
            );
        }
        let size_of = |this: &Self, id: &NodeId| match this.kind(id) {
            ValueKind::Vector => Some(this.arena.vector_size(id)),
            _ => None,
        };
        let size = match (size_of(self, &left), size_of(self, &right)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 0,
        };
        let wrap = |this: &Self, id: NodeId| match this.kind(&id) {
            ValueKind::Vector => VectorOperand::Vector(id),
            _ => VectorOperand::Scalar(id),
        };
        let left = wrap(self, left);
        let right = wrap(self, right);
        self.alloc(Node::VectorBinary {
            op,
            left,
            right,
            temp: new_vector(size),
        })
    }

    pub(super) fn string_binary(&mut self, op: Operator, left: NodeId, right: NodeId) -> GenResult {
        if op == Operator::Add {
            return self.alloc(Node::StringConcat { left, right });
        }
        let left = self.string_operand(left);
        let right = self.string_operand(right);
        self.alloc(Node::StringCompare { op, left, right })
    }

    /// Whole vector or a constant-bounds slice `[start, start + len)`.
    pub fn vector(&mut self, vector: VectorRef, start: usize, len: usize) -> GenResult {
        let size = vector.len();
        let fits = start.checked_add(len).is_some_and(|end| end <= size);
        if len == 0 || !fits {
            return Err(GenError::IndexOutOfBounds {
                index: start.saturating_add(len.saturating_sub(1)),
                size,
            });
        }
        self.alloc(Node::Vector { vector, start, len })
    }

    /// `v[start:end]` with inclusive constant bounds.
    pub fn vector_range(&mut self, vector: VectorRef, start: usize, end: usize) -> GenResult {
        let size = vector.len();
        if start > end || end >= size {
            return Err(GenError::IndexOutOfBounds {
                index: start.max(end),
                size,
            });
        }
        self.vector(vector, start, end - start + 1)
    }

    /// `v[index]`; constant indices are bounds-checked now.
    pub fn vector_element(&mut self, vector: VectorRef, index: NodeId) -> GenResult {
        if self.is_break_or_continue(&index) || self.kind(&index) != ValueKind::Scalar {
            return self.fail(
                [index],
                GenError::TypeMismatch {
                    op: "[]".to_string(),
                    reason: "vector index must be a scalar",
                },
            );
        }
        match self.arena.literal(&index) {
            Some(i) => {
                self.arena.free_tree(index);
                let size = vector.len();
                if !(i >= 0.0 && (i as usize) < size) {
                    return Err(GenError::IndexOutOfBounds {
                        index: i.max(0.0) as usize,
                        size,
                    });
                }
                self.alloc(Node::VectorElementConst {
                    vector,
                    index: i as usize,
                })
            }
            None => self.alloc(Node::VectorElement { vector, index }),
        }
    }

    /// Aggregate a single vector argument with a variadic builtin.
    pub fn vector_aggregate(&mut self, op: VarArgOp, operand: NodeId) -> GenResult {
        self.alloc(Node::VectorAggregate { op, operand })
    }

    pub fn string_var(&mut self, s: StringRef) -> GenResult {
        self.alloc(Node::StringVar(s))
    }

    /// `s[a:b]` over a string variable, literal or expression.
    pub fn string_range(&mut self, source: NodeId, range: RangeSpec) -> GenResult {
        let literal = match self.arena.get(&source) {
            Node::StringLiteral(s) if range.is_constant() => Some(s.clone()),
            _ => None,
        };
        if let Some(text) = literal {
            self.arena.free_tree(source);
            let len = text.chars().count();
            let start = match range.start {
                Bound::Const(c) => c,
                _ => 0,
            };
            let end = match range.end {
                Bound::Const(c) => Some(c),
                _ => len.checked_sub(1),
            };
            return match end {
                Some(end) if start <= end && end < len => {
                    let folded: String = text.chars().skip(start).take(end + 1 - start).collect();
                    trace!(%folded, "Folded string range");
                    self.string_literal(folded)
                }
                _ => Err(GenError::IndexOutOfBounds {
                    index: end.unwrap_or(start),
                    size: len,
                }),
            };
        }

        let source = match self.arena.get(&source) {
            Node::StringVar(s) => {
                let s = s.clone();
                self.arena.free_tree(source);
                StringSource::Var(s)
            }
            _ => StringSource::Node(source),
        };
        self.alloc(Node::StringRange { source, range })
    }

    pub fn string_size(&mut self, operand: NodeId) -> GenResult {
        if let Node::StringLiteral(s) = self.arena.get(&operand) {
            let size = s.chars().count() as f64;
            self.arena.free_tree(operand);
            return self.literal(size);
        }
        self.alloc(Node::StringSize(operand))
    }
}
