//! Dependent entity collection.
//!
//! After a compile the collector reports which symbols the expression
//! reads, which it assigns, and the value signatures of its `return`
//! statements. Symbol and assignment collection are opt-in through
//! [`Settings`]; return signatures are always recorded.

use crate::api::Settings;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolType {
    Variable,
    Vector,
    String,
    Function,
    LocalVariable,
    LocalVector,
    LocalString,
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolType::Variable => "variable",
            SymbolType::Vector => "vector",
            SymbolType::String => "string",
            SymbolType::Function => "function",
            SymbolType::LocalVariable => "local variable",
            SymbolType::LocalVector => "local vector",
            SymbolType::LocalString => "local string",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependentEntityCollector {
    collect_variables: bool,
    collect_functions: bool,
    collect_assignments: bool,
    symbols: Vec<(String, SymbolType)>,
    assignments: Vec<(String, SymbolType)>,
    return_signatures: Vec<String>,
}

fn sorted(mut entries: Vec<(String, SymbolType)>) -> Vec<(String, SymbolType)> {
    entries.sort();
    entries.dedup();
    entries
}

impl DependentEntityCollector {
    pub fn new(settings: &Settings) -> Self {
        Self {
            collect_variables: settings.collect_variables,
            collect_functions: settings.collect_functions,
            collect_assignments: settings.collect_assignments,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
        self.assignments.clear();
        self.return_signatures.clear();
    }

    pub(crate) fn add_symbol(&mut self, name: &str, symbol_type: SymbolType) {
        let wanted = match symbol_type {
            SymbolType::Function => self.collect_functions,
            _ => self.collect_variables,
        };
        if wanted {
            self.symbols.push((name.to_string(), symbol_type));
        }
    }

    pub(crate) fn add_assignment(&mut self, name: &str, symbol_type: SymbolType) {
        if self.collect_assignments {
            self.assignments.push((name.to_string(), symbol_type));
        }
    }

    pub(crate) fn add_return_signature(&mut self, signature: String) {
        if !self.return_signatures.contains(&signature) {
            self.return_signatures.push(signature);
        }
    }

    /// Symbols referenced by the expression, sorted and de-duplicated.
    pub fn symbols(&self) -> Vec<(String, SymbolType)> {
        sorted(self.symbols.clone())
    }

    /// Assignment targets, sorted and de-duplicated.
    pub fn assignments(&self) -> Vec<(String, SymbolType)> {
        sorted(self.assignments.clone())
    }

    /// One signature per distinct `return` shape, e.g. `"TS"` for a scalar
    /// followed by a string.
    pub fn return_signatures(&self) -> &[String] {
        &self.return_signatures
    }
}
