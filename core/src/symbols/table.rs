use super::{
    Function, MAX_FUNCTION_ARITY, ScalarRef, StringRef, SymbolError, VarArgFunction, VectorRef,
    is_reserved, is_valid_name,
};
use hashbrown::HashMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Whether compiled expressions may assign into a table's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Immutable,
}

#[derive(Clone)]
pub(crate) struct VariableEntry {
    pub(crate) value: ScalarRef,
    pub(crate) constant: bool,
}

#[derive(Default)]
struct Registry {
    variables: HashMap<String, VariableEntry>,
    vectors: HashMap<String, VectorRef>,
    strings: HashMap<String, StringRef>,
    functions: HashMap<String, Rc<dyn Function>>,
    vararg_functions: HashMap<String, Rc<dyn VarArgFunction>>,
}

impl Registry {
    fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
            || self.vectors.contains_key(name)
            || self.strings.contains_key(name)
            || self.functions.contains_key(name)
            || self.vararg_functions.contains_key(name)
    }
}

/// A registry of host symbols.
///
/// `SymbolTable` is a cheap handle: clones share the same registry, so a
/// table registered with several expressions exposes the same storage to
/// all of them.
#[derive(Clone)]
pub struct SymbolTable {
    mutability: Mutability,
    registry: Rc<RefCell<Registry>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("SymbolTable")
            .field("mutability", &self.mutability)
            .field("variables", &registry.variables.len())
            .field("vectors", &registry.vectors.len())
            .field("strings", &registry.strings.len())
            .field("functions", &registry.functions.len())
            .field("vararg_functions", &registry.vararg_functions.len())
            .finish()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_mutability(Mutability::Mutable)
    }

    /// A table whose storage compiled expressions may read but never assign.
    pub fn immutable() -> Self {
        Self::with_mutability(Mutability::Immutable)
    }

    pub fn with_mutability(mutability: Mutability) -> Self {
        Self {
            mutability,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Mutable
    }

    fn check_name(&self, name: &str) -> Result<(), SymbolError> {
        if !is_valid_name(name) {
            return Err(SymbolError::InvalidName(name.to_string()));
        }
        if is_reserved(name) {
            return Err(SymbolError::Reserved(name.to_string()));
        }
        if self.registry.borrow().contains(name) {
            return Err(SymbolError::AlreadyDefined(name.to_string()));
        }
        Ok(())
    }

    /// Register a variable initialised to `value` and return its storage.
    pub fn add_variable(&self, name: &str, value: f64) -> Result<ScalarRef, SymbolError> {
        self.add_variable_ref(name, Rc::new(Cell::new(value)))
    }

    /// Register host-owned storage as a variable.
    pub fn add_variable_ref(&self, name: &str, value: ScalarRef) -> Result<ScalarRef, SymbolError> {
        self.check_name(name)?;
        self.registry.borrow_mut().variables.insert(
            name.to_string(),
            VariableEntry {
                value: Rc::clone(&value),
                constant: false,
            },
        );
        Ok(value)
    }

    /// Register a constant. References to constants are folded at compile time.
    pub fn add_constant(&self, name: &str, value: f64) -> Result<(), SymbolError> {
        self.check_name(name)?;
        self.registry.borrow_mut().variables.insert(
            name.to_string(),
            VariableEntry {
                value: Rc::new(Cell::new(value)),
                constant: true,
            },
        );
        Ok(())
    }

    /// Register `pi`, `epsilon` and `inf`.
    pub fn add_constants(&self) -> Result<(), SymbolError> {
        self.add_constant("pi", std::f64::consts::PI)?;
        self.add_constant("epsilon", f64::EPSILON)?;
        self.add_constant("inf", f64::INFINITY)
    }

    pub fn add_vector(&self, name: &str, values: &[f64]) -> Result<VectorRef, SymbolError> {
        if values.is_empty() {
            return Err(SymbolError::EmptyVector(name.to_string()));
        }
        let storage: VectorRef = values.iter().map(|v| Cell::new(*v)).collect();
        self.add_vector_ref(name, storage)
    }

    pub fn add_vector_ref(&self, name: &str, vector: VectorRef) -> Result<VectorRef, SymbolError> {
        if vector.is_empty() {
            return Err(SymbolError::EmptyVector(name.to_string()));
        }
        self.check_name(name)?;
        self.registry
            .borrow_mut()
            .vectors
            .insert(name.to_string(), Rc::clone(&vector));
        Ok(vector)
    }

    pub fn add_string(&self, name: &str, value: &str) -> Result<StringRef, SymbolError> {
        self.add_string_ref(name, Rc::new(RefCell::new(value.to_string())))
    }

    pub fn add_string_ref(&self, name: &str, value: StringRef) -> Result<StringRef, SymbolError> {
        self.check_name(name)?;
        self.registry
            .borrow_mut()
            .strings
            .insert(name.to_string(), Rc::clone(&value));
        Ok(value)
    }

    pub fn add_function(&self, name: &str, function: Rc<dyn Function>) -> Result<(), SymbolError> {
        if function.arity() > MAX_FUNCTION_ARITY {
            return Err(SymbolError::ArityTooLarge {
                name: name.to_string(),
                arity: function.arity(),
            });
        }
        self.check_name(name)?;
        self.registry
            .borrow_mut()
            .functions
            .insert(name.to_string(), function);
        Ok(())
    }

    pub fn add_vararg_function(
        &self,
        name: &str,
        function: Rc<dyn VarArgFunction>,
    ) -> Result<(), SymbolError> {
        self.check_name(name)?;
        self.registry
            .borrow_mut()
            .vararg_functions
            .insert(name.to_string(), function);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        let mut registry = self.registry.borrow_mut();
        registry.variables.remove(name).is_some()
            || registry.vectors.remove(name).is_some()
            || registry.strings.remove(name).is_some()
            || registry.functions.remove(name).is_some()
            || registry.vararg_functions.remove(name).is_some()
    }

    pub fn clear(&self) {
        *self.registry.borrow_mut() = Registry::default();
    }

    pub fn symbol_exists(&self, name: &str) -> bool {
        self.registry.borrow().contains(name)
    }

    pub(crate) fn variable_entry(&self, name: &str) -> Option<VariableEntry> {
        self.registry.borrow().variables.get(name).cloned()
    }

    pub fn get_variable(&self, name: &str) -> Option<ScalarRef> {
        self.variable_entry(name).map(|entry| entry.value)
    }

    /// Current value of a variable or constant.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.variable_entry(name).map(|entry| entry.value.get())
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.variable_entry(name).is_some_and(|entry| entry.constant)
    }

    pub fn get_vector(&self, name: &str) -> Option<VectorRef> {
        self.registry.borrow().vectors.get(name).cloned()
    }

    pub fn get_string(&self, name: &str) -> Option<StringRef> {
        self.registry.borrow().strings.get(name).cloned()
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.registry.borrow().functions.get(name).cloned()
    }

    pub fn get_vararg_function(&self, name: &str) -> Option<Rc<dyn VarArgFunction>> {
        self.registry.borrow().vararg_functions.get(name).cloned()
    }

    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.borrow().variables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Address ranges of every storage cell this table owns.
    pub(crate) fn storage_ranges(&self) -> Vec<(usize, usize)> {
        let registry = self.registry.borrow();
        let mut ranges = Vec::new();
        for entry in registry.variables.values() {
            let start = Rc::as_ptr(&entry.value) as usize;
            ranges.push((start, start + std::mem::size_of::<Cell<f64>>()));
        }
        for vector in registry.vectors.values() {
            let start = vector.as_ptr() as usize;
            ranges.push((start, start + std::mem::size_of_val(&**vector)));
        }
        for string in registry.strings.values() {
            let start = Rc::as_ptr(string) as usize;
            ranges.push((start, start + std::mem::size_of::<RefCell<String>>()));
        }
        ranges
    }
}
