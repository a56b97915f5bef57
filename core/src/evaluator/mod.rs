//! Tree-walking evaluator for compiled expressions.
//!
//! The evaluator walks a [`NodeArena`](crate::tree::NodeArena) from a root
//! node and produces a [`Value`]. Arithmetic follows IEEE semantics and
//! never fails; the only runtime error is a loop runtime check violation.
//!
//! ## Example
//!
//! ```ignore
//! use calyx_core::{Expression, Parser, SymbolTable};
//!
//! let table = SymbolTable::new();
//! let x = table.add_variable("x", 2.0)?;
//!
//! let mut expression = Expression::new();
//! expression.register_symbol_table(table);
//! Parser::new().compile("x^2 + 1", &mut expression);
//! assert_eq!(expression.value(), 5.0);
//! ```

mod error;
mod eval;
mod operators;
pub mod special;

#[cfg(test)]
mod eval_test;

pub use error::ExecutionError;
pub use eval::{Evaluator, VectorView};
pub use operators::{
    BASE_FUNCTION_NAMES, Operator, VarArgOp, base_function, binary, int_pow, is_true,
    string_binary, ternary, truth, unary,
};

use std::fmt;

/// Result of evaluating an expression or a `return` argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    String(String),
    Vector(Vec<f64>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar view of the value: vectors read their first element and
    /// strings are NaN.
    pub fn to_scalar(&self) -> f64 {
        match self {
            Value::Scalar(v) => *v,
            Value::String(_) => f64::NAN,
            Value::Vector(v) => v.first().copied().unwrap_or(f64::NAN),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Vector(items) => {
                f.write_str("{")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
