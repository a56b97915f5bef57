use super::{Function, ScalarRef, StringRef, SymbolError, SymbolTable, VarArgFunction, VectorRef};
use std::rc::Rc;

/// Result of resolving a variable through a [`SymbolTableList`].
#[derive(Clone)]
pub struct VariableLookup {
    pub value: ScalarRef,
    pub constant: bool,
    pub immutable: bool,
}

/// Ordered list of symbol tables. The first table that defines a name
/// decides what the name is.
#[derive(Debug, Clone, Default)]
pub struct SymbolTableList {
    tables: Vec<SymbolTable>,
}

impl SymbolTableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: SymbolTable) {
        self.tables.push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> &[SymbolTable] {
        &self.tables
    }

    pub fn first(&self) -> Option<&SymbolTable> {
        self.tables.first()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    fn owner(&self, name: &str) -> Option<&SymbolTable> {
        self.tables.iter().find(|table| table.symbol_exists(name))
    }

    pub fn symbol_exists(&self, name: &str) -> bool {
        self.owner(name).is_some()
    }

    pub fn lookup_variable(&self, name: &str) -> Option<VariableLookup> {
        let table = self.owner(name)?;
        let entry = table.variable_entry(name)?;
        Some(VariableLookup {
            value: entry.value,
            constant: entry.constant,
            immutable: !table.is_mutable(),
        })
    }

    pub fn get_vector(&self, name: &str) -> Option<VectorRef> {
        self.owner(name)?.get_vector(name)
    }

    pub fn get_string(&self, name: &str) -> Option<StringRef> {
        self.owner(name)?.get_string(name)
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.owner(name)?.get_function(name)
    }

    pub fn get_vararg_function(&self, name: &str) -> Option<Rc<dyn VarArgFunction>> {
        self.owner(name)?.get_vararg_function(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.owner(name).is_some_and(|table| table.is_constant(name))
    }

    /// Whether the table defining `name` is immutable.
    pub fn is_immutable(&self, name: &str) -> bool {
        self.owner(name).is_some_and(|table| !table.is_mutable())
    }

    /// Add a variable (or constant) to the first table.
    pub fn add_variable(&self, name: &str, value: f64, constant: bool) -> Result<(), SymbolError> {
        let table = self
            .first()
            .ok_or(SymbolError::NoTable)?;
        if constant {
            table.add_constant(name, value)
        } else {
            table.add_variable(name, value).map(|_| ())
        }
    }

    /// Snapshot of the address ranges owned by immutable tables.
    pub fn immutable_ranges(&self) -> ImmutableRanges {
        let mut ranges: Vec<(usize, usize)> = self
            .tables
            .iter()
            .filter(|table| !table.is_mutable())
            .flat_map(SymbolTable::storage_ranges)
            .collect();
        ranges.sort_unstable();
        ImmutableRanges { ranges }
    }
}

/// Sorted set of half-open address intervals backing immutable storage.
#[derive(Debug, Clone, Default)]
pub struct ImmutableRanges {
    ranges: Vec<(usize, usize)>,
}

impl ImmutableRanges {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains_address(&self, address: usize) -> bool {
        let idx = self.ranges.partition_point(|(start, _)| *start <= address);
        idx > 0 && address < self.ranges[idx - 1].1
    }

    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        self.contains_address(ptr.cast::<u8>() as usize)
    }
}
