//! Hook for symbols that no scope or symbol table defines.

use crate::symbols::SymbolTable;

/// How the parser consults an [`UnknownSymbolResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverMode {
    /// The resolver names a value; the parser registers it as a variable or
    /// constant in the first symbol table.
    #[default]
    Default,
    /// The resolver registers whatever it likes in the first symbol table
    /// and reports whether it did.
    Extended,
}

/// What a default-mode resolution registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsrSymbolType {
    Variable,
    Constant,
}

/// Resolves symbols unknown at compile time.
///
/// Errors are reported as symbol-table errors carrying the returned
/// message.
pub trait UnknownSymbolResolver {
    fn mode(&self) -> ResolverMode {
        ResolverMode::Default
    }

    fn resolve(&self, name: &str) -> Result<(UsrSymbolType, f64), String> {
        Err(format!("cannot resolve '{name}'"))
    }

    /// Extended mode: register `name` in `table`. `Ok(false)` means the
    /// resolver declined.
    fn resolve_extended(&self, name: &str, table: &SymbolTable) -> Result<bool, String> {
        let _ = (name, table);
        Ok(false)
    }
}

/// Registers every unknown symbol as a variable initialised to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoVariables;

impl UnknownSymbolResolver for AutoVariables {
    fn resolve(&self, _name: &str) -> Result<(UsrSymbolType, f64), String> {
        Ok((UsrSymbolType::Variable, 0.0))
    }
}
