//! Core of the calyx expression compiler.
//!
//! Source text flows through the [`lexer`] (tokenizer plus the optional
//! token passes), into the [`parser`], which drives the
//! [`generator`] to synthesize an evaluation tree in a [`tree::NodeArena`].
//! The finished tree is owned by an [`api::Expression`] and evaluated by
//! the [`evaluator`].

pub mod api;
pub mod evaluator;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod scope_stack;
pub mod symbols;
pub mod tree;

pub use api::{Diagnostic, Error, Expression, Settings, Value};
pub use parser::{ErrorKind, Parser, ParserError};
pub use symbols::{SymbolTable, SymbolTableList};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_constant_folding() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
