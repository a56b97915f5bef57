//! Lexical scope bookkeeping for locally declared variables.
//!
//! Every `var` declaration, and every `for` loop counter, registers a
//! [`ScopeElement`] tagged with the lexical depth it was declared at. When
//! a scope closes, every element at or beyond that depth is deactivated in
//! bulk. Deactivated elements stay in the manager so that a later
//! declaration of the same name, kind and depth can reuse their storage.
//!
//! ```text
//! for (var i := 0; i < 3; i += 1) { ... }   // `i` registered at depth 1
//! var i := 5;                               // legal: `i` was deactivated
//! ```

use crate::symbols::{ScalarRef, StringRef, VectorRef, new_scalar, new_string, new_vector};
use thiserror::Error;
use tracing::trace;

/// Backing storage of a local.
#[derive(Clone)]
pub enum LocalStorage {
    Scalar(ScalarRef),
    Vector(VectorRef),
    String(StringRef),
}

impl LocalStorage {
    fn kind(&self) -> LocalKind {
        match self {
            LocalStorage::Scalar(_) => LocalKind::Scalar,
            LocalStorage::Vector(_) => LocalKind::Vector,
            LocalStorage::String(_) => LocalKind::String,
        }
    }

    fn size(&self) -> usize {
        match self {
            LocalStorage::Vector(v) => v.len(),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    Scalar,
    Vector,
    String,
}

pub struct ScopeElement {
    pub name: String,
    pub depth: usize,
    pub ref_count: usize,
    pub active: bool,
    pub storage: LocalStorage,
}

impl ScopeElement {
    pub fn kind(&self) -> LocalKind {
        self.storage.kind()
    }

    pub fn size(&self) -> usize {
        self.storage.size()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("'{name}' is already declared in this scope")]
    AlreadyDeclared { name: String },
}

/// Requested local, before storage is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRequest<'a> {
    Scalar,
    Vector(usize),
    String(&'a str),
}

#[derive(Default)]
pub struct ScopeElementManager {
    elements: Vec<ScopeElement>,
}

impl ScopeElementManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost active element called `name`.
    pub fn get_active(&self, name: &str) -> Option<&ScopeElement> {
        self.elements
            .iter()
            .filter(|e| e.active && e.name == name)
            .max_by_key(|e| e.depth)
    }

    /// Declare `name` at `depth`.
    ///
    /// Fails when an element of that name is still active. A deactivated
    /// element with the same name, depth, kind and size is reactivated and
    /// its storage reused.
    pub fn add_element(
        &mut self,
        name: &str,
        depth: usize,
        request: LocalRequest<'_>,
    ) -> Result<&ScopeElement, ScopeError> {
        if self
            .elements
            .iter()
            .any(|e| e.active && e.name == name && e.depth <= depth)
        {
            return Err(ScopeError::AlreadyDeclared {
                name: name.to_string(),
            });
        }

        let (kind, size) = match request {
            LocalRequest::Scalar => (LocalKind::Scalar, 1),
            LocalRequest::Vector(size) => (LocalKind::Vector, size),
            LocalRequest::String(_) => (LocalKind::String, 1),
        };

        let reusable = self.elements.iter().position(|e| {
            !e.active && e.name == name && e.depth == depth && e.kind() == kind && e.size() == size
        });

        let index = match reusable {
            Some(index) => {
                let element = &mut self.elements[index];
                element.active = true;
                element.ref_count += 1;
                match (&element.storage, request) {
                    (LocalStorage::String(s), LocalRequest::String(init)) => {
                        *s.borrow_mut() = init.to_string();
                    }
                    (LocalStorage::Scalar(v), _) => v.set(0.0),
                    _ => {}
                }
                trace!(name, depth, "Reactivated scope element");
                index
            }
            None => {
                let storage = match request {
                    LocalRequest::Scalar => LocalStorage::Scalar(new_scalar(0.0)),
                    LocalRequest::Vector(size) => LocalStorage::Vector(new_vector(size)),
                    LocalRequest::String(init) => LocalStorage::String(new_string(init)),
                };
                self.elements.push(ScopeElement {
                    name: name.to_string(),
                    depth,
                    ref_count: 1,
                    active: true,
                    storage,
                });
                self.elements.len() - 1
            }
        };
        Ok(&self.elements[index])
    }

    /// Deactivate every element declared at `depth` or deeper.
    pub fn deactivate(&mut self, depth: usize) {
        let mut count = 0usize;
        for element in self.elements.iter_mut().filter(|e| e.active && e.depth >= depth) {
            element.active = false;
            count += 1;
        }
        if count > 0 {
            trace!(depth, count, "Deactivated scope elements");
        }
    }

    pub fn elements(&self) -> &[ScopeElement] {
        &self.elements
    }

    /// Hand the storage of every element to the caller and reset.
    pub fn take_storage(&mut self) -> Vec<LocalStorage> {
        self.elements.drain(..).map(|e| e.storage).collect()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}
