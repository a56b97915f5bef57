//! Chain fusion and algebraic rewrites over `+ - * /`.
//!
//! Operands that are variables, literals, variable/constant pairs or
//! three-leaf chains are flattened into a single [`Chain`] node of up to
//! four leaves. The chain's grouping is encoded as a shape key such as
//! `(t*t)/t`; shapes matching a special function evaluate through it.

use super::{ExpressionGenerator, Outcome};
use crate::evaluator::{Operator, special::special_for_shape};
use crate::tree::{Chain, ChainKernel, ChainShape, Leaf, Node, NodeId, Operand};
use smallvec::{SmallVec, smallvec};
use tracing::debug;

/// Largest integer exponent expanded into a cardinal power.
pub(super) const MAX_CARDINAL_POWER: f64 = 60.0;

/// Flattened view of a fusable operand.
enum Flat {
    Leaf(Leaf),
    Pair(Leaf, Operator, Leaf),
    Triple(ChainShape, [Leaf; 3], [Operator; 2]),
}

fn is_chain_op(op: Operator) -> bool {
    matches!(
        op,
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div
    )
}

fn chain(shape: ChainShape, leaves: SmallVec<[Leaf; 4]>, ops: SmallVec<[Operator; 3]>) -> Node {
    let kernel = match special_for_shape(&shape.key(&ops)) {
        Some(index) => ChainKernel::Special(index),
        None => ChainKernel::Generic,
    };
    Node::Chain(Chain {
        shape,
        leaves,
        ops,
        kernel,
    })
}

fn operand_of(leaf: Leaf) -> Operand {
    match leaf {
        Leaf::Var(v) => Operand::Var(v),
        Leaf::Const(c) => Operand::Const(c),
    }
}

/// `x o c` where `c` is the merged constant.
fn collapsed(x: Leaf, op: Operator, c: f64) -> Node {
    Node::Binary {
        op,
        left: operand_of(x),
        right: Operand::Const(c),
    }
}

/// Merge a trailing constant into a variable/constant pair.
fn collapse_constants(a: &Leaf, o0: Operator, b: &Leaf, o: Operator, c2: f64) -> Option<Node> {
    use Operator::*;
    let (x, c1, const_first) = match (a, b) {
        (Leaf::Var(_), Leaf::Const(c1)) => (a.clone(), *c1, false),
        (Leaf::Const(c1), Leaf::Var(_)) => (b.clone(), *c1, true),
        _ => return None,
    };
    Some(match (o0, o, const_first) {
        // (x + c1) ± c2, (c1 + x) ± c2
        (Add, Add, _) => collapsed(x, Add, c1 + c2),
        (Add, Sub, _) => collapsed(x, Add, c1 - c2),
        // (x * c1) * c2, (x * c1) / c2
        (Mul, Mul, _) => collapsed(x, Mul, c1 * c2),
        (Mul, Div, _) => collapsed(x, Mul, c1 / c2),
        // (x - c1) ± c2
        (Sub, Sub, false) => collapsed(x, Sub, c1 + c2),
        (Sub, Add, false) => collapsed(x, Sub, c1 - c2),
        // (x / c1) / c2, (x / c1) * c2
        (Div, Div, false) => collapsed(x, Div, c1 * c2),
        (Div, Mul, false) => collapsed(x, Mul, c2 / c1),
        _ => return None,
    })
}

impl ExpressionGenerator<'_> {
    fn flat(&self, id: &NodeId) -> Option<Flat> {
        if let Some(leaf) = self.leaf(id) {
            return Some(Flat::Leaf(leaf));
        }
        let leaf_of = |operand: &Operand| match operand {
            Operand::Var(v) => Some(Leaf::Var(v.clone())),
            Operand::Const(c) => Some(Leaf::Const(*c)),
            Operand::Node(_) => None,
        };
        match self.arena.get(id) {
            Node::Binary { op, left, right } if is_chain_op(*op) => {
                Some(Flat::Pair(leaf_of(left)?, *op, leaf_of(right)?))
            }
            Node::Chain(c) if c.leaves.len() == 3 && c.ops.len() == 2 => Some(Flat::Triple(
                c.shape,
                [c.leaves[0].clone(), c.leaves[1].clone(), c.leaves[2].clone()],
                [c.ops[0], c.ops[1]],
            )),
            _ => None,
        }
    }

    /// Rewrites of fixed shapes into cheaper equivalents.
    fn rewrite(&self, left: &Flat, op: Operator, right: &Flat) -> Option<Node> {
        use Operator::*;
        match (left, op, right) {
            // (a/b)/c --> a/(b*c)
            (Flat::Pair(a, Div, b), Div, Flat::Leaf(c)) => Some(chain(
                ChainShape::Right3,
                smallvec![a.clone(), b.clone(), c.clone()],
                smallvec![Div, Mul],
            )),
            // (a/b)*(c/d) --> (a*c)/(b*d)
            (Flat::Pair(a, Div, b), Mul, Flat::Pair(c, Div, d)) => Some(chain(
                ChainShape::Pair4,
                smallvec![a.clone(), c.clone(), b.clone(), d.clone()],
                smallvec![Mul, Div, Mul],
            )),
            // (a/b)/(c/d) --> (a*d)/(b*c)
            (Flat::Pair(a, Div, b), Div, Flat::Pair(c, Div, d)) => Some(chain(
                ChainShape::Pair4,
                smallvec![a.clone(), d.clone(), b.clone(), c.clone()],
                smallvec![Mul, Div, Mul],
            )),
            // a/(b/c) --> (a*c)/b
            (Flat::Leaf(a), Div, Flat::Pair(b, Div, c)) => Some(chain(
                ChainShape::Left3,
                smallvec![a.clone(), c.clone(), b.clone()],
                smallvec![Mul, Div],
            )),
            // a-(b-c) --> (a-b)+c
            (Flat::Leaf(a), Sub, Flat::Pair(b, Sub, c)) => Some(chain(
                ChainShape::Left3,
                smallvec![a.clone(), b.clone(), c.clone()],
                smallvec![Sub, Add],
            )),
            // a+(b-c) --> (a+b)-c
            (Flat::Leaf(a), Add, Flat::Pair(b, Sub, c)) => Some(chain(
                ChainShape::Left3,
                smallvec![a.clone(), b.clone(), c.clone()],
                smallvec![Add, Sub],
            )),
            // a*(b/c) --> (a*b)/c
            (Flat::Leaf(a), Mul, Flat::Pair(b, Div, c)) => Some(chain(
                ChainShape::Left3,
                smallvec![a.clone(), b.clone(), c.clone()],
                smallvec![Mul, Div],
            )),
            (Flat::Pair(a, o0, b), o, Flat::Leaf(Leaf::Const(c2))) => {
                collapse_constants(a, *o0, b, o, *c2)
            }
            _ => None,
        }
    }

    /// Generic flattening by shape.
    fn compose(left: Flat, op: Operator, right: Flat) -> Option<Node> {
        Some(match (left, right) {
            (Flat::Pair(a, o0, b), Flat::Leaf(c)) => {
                chain(ChainShape::Left3, smallvec![a, b, c], smallvec![o0, op])
            }
            (Flat::Leaf(a), Flat::Pair(b, o1, c)) => {
                chain(ChainShape::Right3, smallvec![a, b, c], smallvec![op, o1])
            }
            (Flat::Pair(a, o0, b), Flat::Pair(c, o2, d)) => chain(
                ChainShape::Pair4,
                smallvec![a, b, c, d],
                smallvec![o0, op, o2],
            ),
            (Flat::Triple(shape, [a, b, c], [o0, o1]), Flat::Leaf(d)) => {
                let shape = match shape {
                    ChainShape::Left3 => ChainShape::LeftLeft4,
                    _ => ChainShape::RightLeft4,
                };
                chain(shape, smallvec![a, b, c, d], smallvec![o0, o1, op])
            }
            (Flat::Leaf(a), Flat::Triple(shape, [b, c, d], [o1, o2])) => {
                let shape = match shape {
                    ChainShape::Left3 => ChainShape::LeftRight4,
                    _ => ChainShape::RightRight4,
                };
                chain(shape, smallvec![a, b, c, d], smallvec![op, o1, o2])
            }
            _ => return None,
        })
    }

    pub(super) fn fuse(&mut self, op: Operator, left: NodeId, right: NodeId) -> Outcome {
        if !is_chain_op(op) {
            return Outcome::Pass(left, right);
        }
        let (Some(lf), Some(rf)) = (self.flat(&left), self.flat(&right)) else {
            return Outcome::Pass(left, right);
        };

        let rewritten = if self.settings.strength_reduction {
            self.rewrite(&lf, op, &rf)
        } else {
            None
        };
        let node = match rewritten {
            Some(node) => {
                debug!(?node, "Rewrote operator chain");
                node
            }
            None => match Self::compose(lf, op, rf) {
                Some(node) => node,
                None => return Outcome::Pass(left, right),
            },
        };
        self.arena.free_tree(left);
        self.arena.free_tree(right);
        Outcome::Done(self.alloc(node))
    }

    /// `x ^ n` for integral `|n| <= 60` as repeated multiplication.
    pub(super) fn cardinal_pow(&mut self, op: Operator, left: NodeId, right: NodeId) -> Outcome {
        if op != Operator::Pow {
            return Outcome::Pass(left, right);
        }
        let Some(n) = self.arena.literal(&right) else {
            return Outcome::Pass(left, right);
        };
        if n.fract() != 0.0 || n.abs() > MAX_CARDINAL_POWER {
            return Outcome::Pass(left, right);
        }
        self.arena.free_tree(right);
        let base = self.operand(left);
        Outcome::Done(self.alloc(Node::IntPow {
            base,
            exponent: n.abs() as u32,
            reciprocal: n < 0.0,
        }))
    }
}
