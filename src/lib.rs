//! Calyx - an embeddable mathematical expression compiler
//!
//! # Overview
//!
//! Calyx compiles infix expressions over host-registered variables,
//! vectors, strings and functions into evaluation trees that can be
//! evaluated repeatedly. Compilation folds constants, fuses operator chains
//! and prunes dead statements; evaluation reads and writes the host's
//! storage directly.
//!
//! The language covers arithmetic, comparison and logic operators,
//! assignments, local `var` declarations, `if`/`switch`/`for`/`while`/
//! `repeat` control flow, `return`, string slicing and vector operations.
//!
//! # Quick Start
//!
//! ```
//! use calyx::{Expression, Parser, SymbolTable};
//!
//! let table = SymbolTable::new();
//! let x = table.add_variable("x", 1.0).unwrap();
//! table.add_vector("v", &[1.0, 2.0, 3.0]).unwrap();
//!
//! let mut expression = Expression::new();
//! expression.register_symbol_table(table);
//!
//! let mut parser = Parser::default();
//! assert!(parser.compile("x * sum(v) + v[]", &mut expression));
//! assert_eq!(expression.value(), 9.0);
//!
//! x.set(2.0);
//! assert_eq!(expression.value(), 15.0);
//! ```
//!
//! # Errors
//!
//! [`Parser::compile`] reports success as a `bool` and keeps every error
//! it collected; [`Parser::compile_checked`] folds them into an [`Error`]
//! that [`render_error`] prints with source snippets:
//!
//! ```
//! use calyx::{Expression, Parser, render_error_to_string_no_color};
//!
//! let mut expression = Expression::new();
//! let err = Parser::default()
//!     .compile_checked("1 + unknown", &mut expression)
//!     .unwrap_err();
//! assert!(render_error_to_string_no_color(&err).contains("undefined symbol 'unknown'"));
//! ```

mod error_renderer;

pub use calyx_core::api::{
    ArithmeticOperators, AssignmentOperators, ControlStructures, Diagnostic, Error, Expression,
    InequalityOperators, LogicOperators, RelatedInfo, Settings, Severity, Value,
};
pub use calyx_core::parser::{
    AutoVariables, DependentEntityCollector, ErrorKind, Parser, ParserError, ResolverMode,
    SymbolType, UnknownSymbolResolver, UsrSymbolType,
};
pub use calyx_core::runtime::{IterationLimit, LoopRuntimeCheck, LoopTypes, ViolationContext};
pub use calyx_core::symbols::{
    Function, NativeFunction, NativeVarArgFunction, SymbolError, SymbolTable, SymbolTableList,
    VarArgFunction,
};
pub use calyx_core::evaluator::ExecutionError;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
