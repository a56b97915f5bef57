//! Host functions callable from expressions.

use std::fmt;
use std::rc::Rc;

/// Largest arity a fixed-arity host function may declare.
pub const MAX_FUNCTION_ARITY: usize = 20;

/// A host function with a fixed number of scalar parameters.
pub trait Function {
    fn arity(&self) -> usize;

    /// Calls to functions without side effects may be constant folded and
    /// pruned as dead statements.
    fn has_side_effects(&self) -> bool {
        true
    }

    fn call(&self, args: &[f64]) -> f64;
}

/// A host function accepting any number of scalar arguments.
pub trait VarArgFunction {
    fn has_side_effects(&self) -> bool {
        true
    }

    fn call(&self, args: &[f64]) -> f64;
}

/// Closure-backed [`Function`].
pub struct NativeFunction<F> {
    arity: usize,
    pure: bool,
    f: F,
}

impl<F> NativeFunction<F>
where
    F: Fn(&[f64]) -> f64 + 'static,
{
    pub fn new(arity: usize, f: F) -> Self {
        Self { arity, pure: false, f }
    }

    /// Mark the function free of side effects.
    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn into_rc(self) -> Rc<dyn Function> {
        Rc::new(self)
    }
}

impl<F> Function for NativeFunction<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn has_side_effects(&self) -> bool {
        !self.pure
    }

    fn call(&self, args: &[f64]) -> f64 {
        (self.f)(args)
    }
}

impl<F> fmt::Debug for NativeFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("arity", &self.arity)
            .field("pure", &self.pure)
            .finish()
    }
}

/// Closure-backed [`VarArgFunction`].
pub struct NativeVarArgFunction<F> {
    pure: bool,
    f: F,
}

impl<F> NativeVarArgFunction<F>
where
    F: Fn(&[f64]) -> f64 + 'static,
{
    pub fn new(f: F) -> Self {
        Self { pure: false, f }
    }

    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn into_rc(self) -> Rc<dyn VarArgFunction> {
        Rc::new(self)
    }
}

impl<F> VarArgFunction for NativeVarArgFunction<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn has_side_effects(&self) -> bool {
        !self.pure
    }

    fn call(&self, args: &[f64]) -> f64 {
        (self.f)(args)
    }
}
