//! Evaluation tree storage.
//!
//! Nodes live in a [`NodeArena`] and refer to their children through
//! [`NodeId`]s. Ids are neither `Copy` nor `Clone`: attaching a child moves
//! its id into the parent, which keeps every tree strictly single-owner.

mod arena;
mod node;

#[cfg(test)]
mod arena_test;

pub use arena::NodeArena;
pub use node::{
    AssignTarget, Bound, Chain, ChainKernel, ChainShape, Leaf, LoopCheck, Node, Operand,
    RangeSpec, ReturnSink, StringOperand, StringSource, ValueKind, VectorInit, VectorOperand,
};

use static_assertions::{assert_eq_size, assert_not_impl_any};
use std::fmt;

/// Owning handle to a node in a [`NodeArena`].
#[derive(PartialEq, Eq, Hash)]
pub struct NodeId(u32);

assert_not_impl_any!(NodeId: Clone, Copy);
assert_eq_size!(NodeId, u32);

impl NodeId {
    #[inline]
    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
