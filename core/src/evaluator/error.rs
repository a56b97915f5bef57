//! Runtime evaluation errors.
//!
//! Arithmetic never fails at runtime: invalid operations produce NaN and
//! out-of-bounds accesses read NaN or write nothing. The only errors an
//! evaluation can raise come from a registered loop runtime check.

use crate::runtime::LoopTypes;
use thiserror::Error;

/// Runtime evaluation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// A loop exceeded the iteration limit of the loop runtime check.
    #[error("{loop_type} loop exceeded {max} iterations (reached {iterations})")]
    LoopLimit {
        loop_type: LoopTypes,
        iterations: u64,
        max: u64,
    },

    /// The loop runtime check aborted evaluation.
    #[error("evaluation aborted: {message}")]
    Aborted { message: String },
}
