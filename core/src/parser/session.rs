//! State of one `compile` call.

use super::collector::{DependentEntityCollector, SymbolType};
use super::error::{ErrorKind, ParserError};
use super::resolver::UnknownSymbolResolver;
use crate::api::Settings;
use crate::generator::{ExpressionGenerator, GenResult};
use crate::lexer::{Token, TokenKind, TokenStream};
use crate::runtime::LoopTypes;
use crate::scope_stack::ScopeElementManager;
use crate::symbols::{ImmutableRanges, SymbolTableList};
use crate::tree::{AssignTarget, Bound, LoopCheck, NodeArena, NodeId, RangeSpec, ReturnSink, VectorInit};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

pub(super) type ParseResult<T = NodeId> = Result<T, ParserError>;

#[derive(Debug, Default)]
pub(super) struct ParserState {
    pub scope_depth: usize,
    pub stack_depth: usize,
    pub in_return: bool,
    pub loop_depth: usize,
    pub side_effect: bool,
    pub return_used: bool,
}

/// Partially built tree fragments that must be released when a parse
/// path is abandoned.
pub(super) trait Pending {
    fn release(self, arena: &mut NodeArena);
}

impl Pending for NodeId {
    fn release(self, arena: &mut NodeArena) {
        arena.free_tree(self);
    }
}

impl<T: Pending> Pending for Option<T> {
    fn release(self, arena: &mut NodeArena) {
        if let Some(inner) = self {
            inner.release(arena);
        }
    }
}

impl<T: Pending> Pending for Vec<T> {
    fn release(self, arena: &mut NodeArena) {
        for inner in self {
            inner.release(arena);
        }
    }
}

impl<A: Pending, B: Pending> Pending for (A, B) {
    fn release(self, arena: &mut NodeArena) {
        self.0.release(arena);
        self.1.release(arena);
    }
}

impl Pending for Bound {
    fn release(self, arena: &mut NodeArena) {
        if let Bound::Node(id) = self {
            arena.free_tree(id);
        }
    }
}

impl Pending for RangeSpec {
    fn release(self, arena: &mut NodeArena) {
        (self.start, self.end).release(arena);
    }
}

impl Pending for AssignTarget {
    fn release(self, arena: &mut NodeArena) {
        match self {
            AssignTarget::Element { index, .. } => arena.free_tree(index),
            AssignTarget::StringRange { range, .. } => range.release(arena),
            _ => {}
        }
    }
}

impl Pending for VectorInit {
    fn release(self, arena: &mut NodeArena) {
        match self {
            VectorInit::Zero => {}
            VectorInit::List(items) => items.release(arena),
            VectorInit::Broadcast(id) | VectorInit::Copy(id) => arena.free_tree(id),
        }
    }
}

/// Unwrap a parse result, releasing the listed fragments on error.
macro_rules! or_free {
    ($session:expr, $result:expr; $($pending:expr),+ $(,)?) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                $( $session.release($pending); )+
                return Err(err);
            }
        }
    };
}
pub(super) use or_free;

pub(super) struct Session<'s, 'a> {
    pub tokens: TokenStream<'a>,
    pub settings: &'s Settings,
    pub symbols: &'s SymbolTableList,
    pub resolver: Option<Rc<dyn UnknownSymbolResolver>>,
    pub loop_check: LoopCheck,
    pub arena: &'s mut NodeArena,
    pub scopes: &'s mut ScopeElementManager,
    pub collector: &'s mut DependentEntityCollector,
    pub immutable: ImmutableRanges,
    pub returns: Rc<ReturnSink>,
    pub state: ParserState,
    /// Storage address to symbol name, for reporting assignment targets.
    names: HashMap<usize, (String, SymbolType)>,
}

impl<'s, 'a> Session<'s, 'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tokens: TokenStream<'a>,
        settings: &'s Settings,
        symbols: &'s SymbolTableList,
        resolver: Option<Rc<dyn UnknownSymbolResolver>>,
        loop_check: LoopCheck,
        arena: &'s mut NodeArena,
        scopes: &'s mut ScopeElementManager,
        collector: &'s mut DependentEntityCollector,
    ) -> Self {
        Self {
            tokens,
            settings,
            symbols,
            resolver,
            loop_check,
            arena,
            scopes,
            collector,
            immutable: symbols.immutable_ranges(),
            returns: Rc::new(ReturnSink::default()),
            state: ParserState::default(),
            names: HashMap::new(),
        }
    }

    pub fn generator(&mut self) -> ExpressionGenerator<'_> {
        ExpressionGenerator::new(self.arena, self.settings, &self.immutable)
    }

    /// Run a generator synthesis, attributing failures to `token`.
    pub fn synth(
        &mut self,
        token: Token<'a>,
        f: impl FnOnce(&mut ExpressionGenerator<'_>) -> GenResult,
    ) -> ParseResult {
        let mut generator = self.generator();
        f(&mut generator).map_err(|err| ParserError::generator(&token, err))
    }

    pub fn release<P: Pending>(&mut self, pending: P) {
        pending.release(self.arena);
    }

    pub fn current(&self) -> Token<'a> {
        self.tokens.current()
    }

    pub fn advance(&mut self) {
        self.tokens.advance();
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.tokens.is(kind)
    }

    pub fn unexpected(&self, expected: &str) -> ParserError {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.text),
        };
        ParserError::syntax(&token, format!("expected {expected}, found {found}"))
    }

    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'a>> {
        let token = self.current();
        if token.kind == kind {
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(&format!("'{}'", kind.spelling())))
        }
    }

    pub fn expect_symbol(&mut self, name: &str) -> ParseResult<Token<'a>> {
        let token = self.current();
        if token.is_symbol(name) {
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(&format!("'{name}'")))
        }
    }

    /// Count one level of sub-expression recursion around `f`.
    pub fn with_depth_guard<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.state.stack_depth += 1;
        let result = if self.state.stack_depth > self.settings.max_stack_depth {
            let token = self.current();
            Err(ParserError::new(
                ErrorKind::Parser,
                &token,
                format!(
                    "expression nesting depth exceeds the maximum of {}",
                    self.settings.max_stack_depth
                ),
            ))
        } else {
            f(self)
        };
        self.state.stack_depth -= 1;
        result
    }

    /// Run `f` one lexical scope deeper. Locals declared inside are
    /// deactivated on every exit path.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.state.scope_depth += 1;
        let depth = self.state.scope_depth;
        let result = f(self);
        self.scopes.deactivate(depth);
        self.state.scope_depth -= 1;
        result
    }

    /// Run `f` as a loop body, where `break` and `continue` are legal.
    pub fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.state.loop_depth += 1;
        let result = f(self);
        self.state.loop_depth -= 1;
        result
    }

    /// The loop check to attach to a loop of `loop_type`, if it covers it.
    pub fn loop_check_for(&self, loop_type: LoopTypes) -> LoopCheck {
        self.loop_check
            .as_ref()
            .filter(|check| check.loop_types().contains(loop_type))
            .cloned()
    }

    pub fn note_storage<T: ?Sized>(&mut self, ptr: *const T, name: &str, symbol_type: SymbolType) {
        let address = ptr.cast::<u8>() as usize;
        self.names
            .entry(address)
            .or_insert_with(|| (name.to_string(), symbol_type));
    }

    /// Report an assignment into the storage at `address` to the collector.
    pub fn record_assignment(&mut self, address: usize) {
        if let Some((name, symbol_type)) = self.names.get(&address) {
            trace!(name, "Recorded assignment target");
            self.collector.add_assignment(name, *symbol_type);
        }
    }
}
