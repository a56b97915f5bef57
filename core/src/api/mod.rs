//! Public API: settings, compiled expressions and error types.
//!
//! # Example
//!
//! ```
//! use calyx_core::api::{Expression, Settings};
//! use calyx_core::Parser;
//!
//! let mut parser = Parser::new(Settings::default());
//! let mut expression = Expression::new();
//! assert!(parser.compile("var x := 3; x * (x + 1)", &mut expression));
//! assert_eq!(expression.value(), 12.0);
//! ```

pub mod error;
pub mod expression;
pub mod options;

pub use crate::evaluator::Value;
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use expression::Expression;
pub(crate) use expression::Compiled;
pub use options::{
    ArithmeticOperators, AssignmentOperators, ControlStructures, InequalityOperators,
    LogicOperators, Settings,
};
