//! Evaluation-time loop guard.
//!
//! A [`LoopRuntimeCheck`] registered on the parser is attached to every
//! loop node of the loop kinds it covers. The evaluator counts iterations
//! per loop execution and hands control to the check once the limit is
//! exceeded.

use crate::evaluator::ExecutionError;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Loop kinds a runtime check applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoopTypes: u8 {
        const FOR = 1 << 0;
        const WHILE = 1 << 1;
        const REPEAT = 1 << 2;
    }
}

impl fmt::Display for LoopTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if *self == LoopTypes::FOR {
            "for"
        } else if *self == LoopTypes::WHILE {
            "while"
        } else if *self == LoopTypes::REPEAT {
            "repeat"
        } else {
            "loop"
        };
        f.write_str(name)
    }
}

/// Details handed to [`LoopRuntimeCheck::handle_violation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationContext {
    pub loop_type: LoopTypes,
    pub iterations: u64,
    pub max: u64,
}

pub trait LoopRuntimeCheck {
    fn loop_types(&self) -> LoopTypes {
        LoopTypes::all()
    }

    fn max_iterations(&self) -> u64;

    /// Called once a loop exceeds [`max_iterations`](Self::max_iterations).
    /// Returning `Ok` ends the loop quietly; an error aborts the evaluation.
    fn handle_violation(&self, context: &ViolationContext) -> Result<(), ExecutionError> {
        Err(ExecutionError::LoopLimit {
            loop_type: context.loop_type,
            iterations: context.iterations,
            max: context.max,
        })
    }
}

/// Fixed iteration bound over a set of loop kinds.
#[derive(Debug, Clone)]
pub struct IterationLimit {
    types: LoopTypes,
    max: u64,
}

impl IterationLimit {
    pub fn new(max: u64) -> Self {
        Self {
            types: LoopTypes::all(),
            max,
        }
    }

    pub fn for_loops(mut self, types: LoopTypes) -> Self {
        self.types = types;
        self
    }
}

impl LoopRuntimeCheck for IterationLimit {
    fn loop_types(&self) -> LoopTypes {
        self.types
    }

    fn max_iterations(&self) -> u64 {
        self.max
    }
}
