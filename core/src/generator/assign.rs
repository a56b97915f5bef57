//! Assignment, swap and vector definition.

use super::{BREAK_AS_VALUE, ExpressionGenerator, GenError, GenResult};
use crate::evaluator::Operator;
use crate::symbols::VectorRef;
use crate::tree::{AssignTarget, Bound, Node, NodeId, ValueKind, VectorInit};
use std::rc::Rc;
use tracing::trace;

fn target_ids(target: AssignTarget) -> Vec<NodeId> {
    let mut ids = Vec::new();
    match target {
        AssignTarget::Element { index, .. } => ids.push(index),
        AssignTarget::StringRange { range, .. } => {
            for bound in [range.start, range.end] {
                if let Bound::Node(id) = bound {
                    ids.push(id);
                }
            }
        }
        _ => {}
    }
    ids
}

impl ExpressionGenerator<'_> {
    fn is_immutable(&self, target: &AssignTarget) -> bool {
        match target {
            AssignTarget::Variable(v) => self.immutable.contains(Rc::as_ptr(v)),
            AssignTarget::Element { vector, .. }
            | AssignTarget::ElementConst { vector, .. }
            | AssignTarget::Vector { vector, .. } => self.immutable.contains(Rc::as_ptr(vector)),
            AssignTarget::String(s) | AssignTarget::StringRange { target: s, .. } => {
                self.immutable.contains(Rc::as_ptr(s))
            }
        }
    }

    fn discard(&mut self, target: AssignTarget, value: NodeId, err: GenError) -> GenResult {
        let mut ids = target_ids(target);
        ids.push(value);
        self.fail(ids, err)
    }

    /// `target op value` for `:= += -= *= /= %=`.
    pub fn assign(&mut self, op: Operator, target: AssignTarget, value: NodeId) -> GenResult {
        if let Err(err) = self.check_enabled(op) {
            return self.discard(target, value, err);
        }
        self.store(op, target, value)
    }

    /// Initialization of a declared local. Not subject to the assignment
    /// operator settings.
    pub fn define(&mut self, target: AssignTarget, value: NodeId) -> GenResult {
        self.store(Operator::Assign, target, value)
    }

    fn store(&mut self, op: Operator, target: AssignTarget, value: NodeId) -> GenResult {
        if self.is_immutable(&target) {
            return self.discard(target, value, GenError::Immutable);
        }
        if self.is_break_or_continue(&value) {
            return self.discard(
                target,
                value,
                GenError::InvalidOperand {
                    op: op.to_string(),
                    reason: BREAK_AS_VALUE,
                },
            );
        }

        let value_kind = self.kind(&value);
        let mismatch = match (target.kind(), value_kind) {
            (ValueKind::String, ValueKind::String) => {
                if matches!(op, Operator::Assign | Operator::AddAssign) {
                    None
                } else {
                    Some("only ':=' and '+=' apply to strings")
                }
            }
            (ValueKind::String, _) => Some("string target requires a string value"),
            (_, ValueKind::String) => Some("string value assigned to a numeric target"),
            (ValueKind::Scalar, ValueKind::Vector) => Some("vector value assigned to a scalar"),
            _ => None,
        };
        if let Some(reason) = mismatch {
            return self.discard(
                target,
                value,
                GenError::TypeMismatch {
                    op: op.to_string(),
                    reason,
                },
            );
        }
        trace!(%op, target = ?target.kind(), "Synthesized assignment");
        self.alloc(Node::Assign { op, target, value })
    }

    /// `left <=> right`.
    pub fn swap(&mut self, left: AssignTarget, right: AssignTarget) -> GenResult {
        let comparable = matches!(
            (&left, &right),
            (AssignTarget::Vector { .. }, AssignTarget::Vector { .. })
                | (AssignTarget::String(_), AssignTarget::String(_))
        ) || (left.kind() == ValueKind::Scalar && right.kind() == ValueKind::Scalar);

        let err = if !comparable {
            Some(GenError::TypeMismatch {
                op: "<=>".to_string(),
                reason: "swap operands must be of the same kind",
            })
        } else if self.is_immutable(&left) || self.is_immutable(&right) {
            Some(GenError::Immutable)
        } else {
            None
        };
        if let Some(err) = err {
            let mut ids = target_ids(left);
            ids.extend(target_ids(right));
            return self.fail(ids, err);
        }
        self.alloc(Node::Swap { left, right })
    }

    /// Initialization of a freshly declared vector.
    pub fn vector_definition(&mut self, storage: VectorRef, init: VectorInit) -> GenResult {
        let invalid = |this: &Self, id: &NodeId| {
            this.is_break_or_continue(id) || this.kind(id) == ValueKind::String
        };
        let (bad, too_long) = match &init {
            VectorInit::Zero => (false, false),
            VectorInit::List(items) => (
                items.iter().any(|id| invalid(self, id)),
                items.len() > storage.len(),
            ),
            VectorInit::Broadcast(id) => (
                invalid(self, id) || self.kind(id) != ValueKind::Scalar,
                false,
            ),
            VectorInit::Copy(id) => (
                invalid(self, id) || self.kind(id) != ValueKind::Vector,
                false,
            ),
        };
        if bad || too_long {
            let ids = match init {
                VectorInit::Zero => Vec::new(),
                VectorInit::List(items) => items,
                VectorInit::Broadcast(id) | VectorInit::Copy(id) => vec![id],
            };
            let err = if too_long {
                GenError::IndexOutOfBounds {
                    index: ids.len() - 1,
                    size: storage.len(),
                }
            } else {
                GenError::TypeMismatch {
                    op: "var".to_string(),
                    reason: "invalid vector initializer",
                }
            };
            return self.fail(ids, err);
        }
        self.alloc(Node::VectorDefinition { storage, init })
    }
}
