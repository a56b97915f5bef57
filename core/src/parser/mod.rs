//! Recursive-descent parser driving the expression generator.
//!
//! A compile runs the tokenizer, the enabled token passes, and then a
//! precedence-climbing parse in which every production is synthesized
//! immediately: the parser never builds an intermediate syntax tree. The
//! first parse error aborts the compile; token scanners report every
//! problem they find.
//!
//! Parsing is split by concern:
//!
//! - `expression`: statement sequences, operators, primaries and ranges
//! - `symbol`: keywords, built-in and host functions, variables
//! - `control`: conditionals, loops, switches, `return`/`break`/`continue`
//! - `declare`: `var` declarations and `swap(a, b)`

mod collector;
mod control;
mod declare;
pub mod error;
mod expression;
mod resolver;
mod session;
mod symbol;

#[cfg(test)]
mod parser_test;

#[cfg(test)]
mod precedence_test;

pub use collector::{DependentEntityCollector, SymbolType};
pub use error::{ErrorKind, ParserError};
pub use resolver::{AutoVariables, ResolverMode, UnknownSymbolResolver, UsrSymbolType};

use crate::api::{Compiled, Error, Expression, Settings};
use crate::lexer::{self, TokenKind, TokenStream, helpers};
use crate::runtime::LoopRuntimeCheck;
use crate::scope_stack::ScopeElementManager;
use crate::tree::{LoopCheck, NodeArena};
use bumpalo::Bump;
use session::Session;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Compiles source text into [`Expression`]s.
///
/// A parser can be reused; each compile resets its error list and
/// dependent entity collector.
pub struct Parser {
    settings: Settings,
    resolver: Option<Rc<dyn UnknownSymbolResolver>>,
    loop_check: LoopCheck,
    errors: Vec<ParserError>,
    collector: DependentEntityCollector,
    scopes: ScopeElementManager,
    arena: NodeArena,
    leaked: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Parser {
    pub fn new(settings: Settings) -> Self {
        let collector = DependentEntityCollector::new(&settings);
        Self {
            settings,
            resolver: None,
            loop_check: None,
            errors: Vec::new(),
            collector,
            scopes: ScopeElementManager::new(),
            arena: NodeArena::new(),
            leaked: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn enable_unknown_symbol_resolver(&mut self, resolver: Rc<dyn UnknownSymbolResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn disable_unknown_symbol_resolver(&mut self) {
        self.resolver = None;
    }

    /// Attach `check` to every loop the following compiles produce.
    pub fn register_loop_runtime_check(&mut self, check: Rc<dyn LoopRuntimeCheck>) {
        self.loop_check = Some(check);
    }

    pub fn clear_loop_runtime_check(&mut self) {
        self.loop_check = None;
    }

    /// Compile `source` into `expression`, replacing whatever it held.
    ///
    /// Returns `false` on failure; the errors are then available through
    /// [`errors`](Self::errors) and `expression` is left uncompiled.
    pub fn compile(&mut self, source: &str, expression: &mut Expression) -> bool {
        debug!(len = source.len(), "Compiling expression");
        self.errors.clear();
        self.leaked = 0;
        self.collector.reset();
        self.scopes.clear();
        self.arena.clear();
        expression.release();

        let bump = Bump::new();
        let mut tokens = match lexer::tokenize(&bump, source) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.errors.push(err.into());
                return self.fail(source);
            }
        };

        if self.settings.replacer {
            let replaced =
                helpers::replace_symbols(&bump, &mut tokens, &self.settings.replacements);
            trace!(replaced, "Replaced symbols");
        }
        if self.settings.joiner {
            tokens = helpers::join_operators(tokens);
        }
        if self.settings.commutative_check {
            tokens = helpers::insert_implied_multiplication(tokens);
        }

        let mut rejected = Vec::new();
        if self.settings.bracket_check {
            rejected.extend(helpers::check_brackets(&tokens));
        }
        if self.settings.sequence_check {
            rejected.extend(helpers::check_sequences(&tokens));
        }
        if self.settings.numeric_check {
            rejected.extend(helpers::check_numerics(&tokens));
        }
        if !rejected.is_empty() {
            self.errors.extend(rejected.into_iter().map(ParserError::from));
            return self.fail(source);
        }

        let stream = TokenStream::new(tokens, source.len());
        if stream.is_empty() {
            let eof = stream.current();
            self.errors.push(ParserError::syntax(&eof, "empty expression"));
            return self.fail(source);
        }

        let mut session = Session::new(
            stream,
            &self.settings,
            expression.symbol_tables(),
            self.resolver.clone(),
            self.loop_check.clone(),
            &mut self.arena,
            &mut self.scopes,
            &mut self.collector,
        );
        let parsed = session.parse_corpus().and_then(|root| {
            if session.is(TokenKind::Eof) {
                Ok(root)
            } else {
                let err = session.unexpected("end of input");
                session.release(root);
                Err(err)
            }
        });
        let returns = session.returns.clone();
        drop(session);

        match parsed {
            Ok(root) => {
                let kind = self.arena.kind(&root);
                let arena = std::mem::take(&mut self.arena);
                let nodes = arena.live_count();
                expression.set_compiled(Compiled {
                    arena,
                    root,
                    locals: self.scopes.take_storage(),
                    returns,
                    kind,
                });
                debug!(nodes, ?kind, "Compiled expression");
                true
            }
            Err(err) => {
                self.errors.push(err);
                self.fail(source)
            }
        }
    }

    /// [`compile`](Self::compile) with the errors folded into an [`Error`].
    pub fn compile_checked(&mut self, source: &str, expression: &mut Expression) -> Result<(), Error> {
        if self.compile(source, expression) {
            Ok(())
        } else {
            Err(Error::compilation(&self.errors, source))
        }
    }

    fn fail(&mut self, source: &str) -> bool {
        for err in &mut self.errors {
            err.update_error(source);
        }
        self.leaked = self.arena.live_count();
        if self.leaked > 0 {
            warn!(leaked = self.leaked, "Released nodes left by a failed compile");
        }
        self.arena.clear();
        self.scopes.clear();
        debug!(errors = self.errors.len(), "Compilation failed");
        false
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn get_error(&self, index: usize) -> Option<&ParserError> {
        self.errors.get(index)
    }

    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    /// Message of the first error, empty after a successful compile.
    pub fn error(&self) -> String {
        self.errors
            .first()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn dependent_entities(&self) -> &DependentEntityCollector {
        &self.collector
    }

    /// Nodes still held by the parser. Always zero between compiles.
    pub fn live_nodes(&self) -> usize {
        self.arena.live_count()
    }

    /// Nodes the last failed compile still held when it gave up, counted
    /// before the arena was reclaimed. Zero when every error path freed
    /// its own branch.
    pub fn leaked_nodes(&self) -> usize {
        self.leaked
    }
}
