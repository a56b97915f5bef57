//! Host symbol registries.
//!
//! Storage is shared between the host and compiled expressions through
//! reference-counted cells: a host keeps the `Rc` it registered and sees
//! every assignment an expression performs.

mod function;
mod list;
mod table;

#[cfg(test)]
mod table_test;

pub use function::{
    Function, MAX_FUNCTION_ARITY, NativeFunction, NativeVarArgFunction, VarArgFunction,
};
pub use list::{ImmutableRanges, SymbolTableList, VariableLookup};
pub use table::{Mutability, SymbolTable};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

pub type ScalarRef = Rc<Cell<f64>>;
pub type VectorRef = Rc<[Cell<f64>]>;
pub type StringRef = Rc<RefCell<String>>;

/// Language keywords. None of these may name a symbol.
pub const RESERVED_WORDS: &[&str] = &[
    "and", "break", "case", "continue", "default", "else", "false", "for", "if", "ilike", "in",
    "like", "nand", "nor", "not", "null", "or", "repeat", "return", "swap", "switch", "true",
    "until", "var", "while", "xnor", "xor",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("'{0}' is not a valid symbol name")]
    InvalidName(String),
    #[error("'{0}' is a reserved word")]
    Reserved(String),
    #[error("symbol '{0}' is already defined")]
    AlreadyDefined(String),
    #[error("vector '{0}' must have at least one element")]
    EmptyVector(String),
    #[error("function '{name}' declares {arity} parameters (maximum is 20)")]
    ArityTooLarge { name: String, arity: usize },
    #[error("no symbol table is registered")]
    NoTable,
}

/// Whether `name` is a keyword or the name of a built-in function.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
        || crate::evaluator::base_function(name).is_some()
        || crate::evaluator::VarArgOp::from_name(name).is_some()
}

/// Symbol names start with a letter or underscore and continue with
/// letters, digits, underscores or dots.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

pub(crate) fn new_scalar(value: f64) -> ScalarRef {
    Rc::new(Cell::new(value))
}

pub(crate) fn new_vector(size: usize) -> VectorRef {
    (0..size).map(|_| Cell::new(0.0)).collect()
}

pub(crate) fn new_string(value: &str) -> StringRef {
    Rc::new(RefCell::new(value.to_string()))
}
