//! Symbol dispatch: keywords, built-in and host functions, locals and
//! symbol-table entries.

use super::collector::SymbolType;
use super::error::{ErrorKind, ParserError};
use super::expression::ARGUMENT_POWER;
use super::resolver::{ResolverMode, UsrSymbolType};
use super::session::{ParseResult, Session, or_free};
use crate::evaluator::{Operator, VarArgOp, base_function, special};
use crate::lexer::{Token, TokenKind};
use crate::scope_stack::LocalStorage;
use crate::symbols::{RESERVED_WORDS, VectorRef};
use crate::tree::{Bound, NodeId};
use std::rc::Rc;
use tracing::debug;

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl<'s, 'a> Session<'s, 'a> {
    pub(super) fn parse_symbol(&mut self) -> ParseResult {
        let token = self.current();
        match token.text {
            "if" => return self.parse_if(),
            "while" => return self.parse_while(),
            "repeat" => return self.parse_repeat(),
            "for" => return self.parse_for(),
            "switch" => return self.parse_switch(),
            "var" => return self.parse_var(),
            "swap" => return self.parse_swap(),
            "return" => return self.parse_return(),
            "break" => return self.parse_break(),
            "continue" => return self.parse_continue(),
            "null" => {
                self.advance();
                return self.synth(token, |g| g.null());
            }
            "true" | "false" => {
                self.advance();
                let value = if token.text == "true" { 1.0 } else { 0.0 };
                return self.synth(token, |g| g.literal(value));
            }
            "not" => {
                self.advance();
                let mut args = self.parse_call_args(token, Some(1))?;
                let Some(operand) = args.pop() else {
                    return Err(ParserError::syntax(&token, "'not' expects 1 argument"));
                };
                return self.synth(token, |g| g.unary(Operator::Not, operand));
            }
            _ => {}
        }

        if let Some(index) = special::parse_special(token.text) {
            self.advance();
            let args = self.parse_call_args(token, Some(special::special_arity(index)))?;
            return self.synth(token, |g| g.special(index, args));
        }
        if let Some((op, arity)) = base_function(token.text) {
            return self.parse_base_function(token, op, arity);
        }
        if let Some(op) = VarArgOp::from_name(token.text) {
            if !self.settings.base_function_enabled(token.text) {
                return Err(ParserError::syntax(
                    &token,
                    format!("function '{}' is disabled", token.text),
                ));
            }
            self.advance();
            return self.parse_vararg(token, op);
        }
        if RESERVED_WORDS.contains(&token.text) {
            return Err(ParserError::syntax(
                &token,
                format!("unexpected keyword '{}'", token.text),
            ));
        }
        self.parse_identifier(token, true)
    }

    /// `(a, b, ...)`. With `arity`, exactly that many arguments.
    pub(super) fn parse_call_args(
        &mut self,
        token: Token<'a>,
        arity: Option<usize>,
    ) -> ParseResult<Vec<NodeId>> {
        self.expect(TokenKind::LParen)?;
        let mut args: Vec<NodeId> = Vec::new();
        if !self.tokens.consume(TokenKind::RParen) {
            loop {
                let arg = or_free!(self, self.parse_expression(0); args);
                args.push(arg);
                if self.tokens.consume(TokenKind::Comma) {
                    continue;
                }
                or_free!(self, self.expect(TokenKind::RParen); args);
                break;
            }
        }
        if let Some(arity) = arity {
            if args.len() != arity {
                let found = args.len();
                self.release(args);
                return Err(ParserError::syntax(
                    &token,
                    format!(
                        "'{}' expects {arity} argument{}, found {found}",
                        token.text,
                        plural(arity)
                    ),
                ));
            }
        }
        Ok(args)
    }

    fn parse_base_function(&mut self, token: Token<'a>, op: Operator, arity: usize) -> ParseResult {
        if !self.settings.base_function_enabled(token.text) {
            return Err(ParserError::syntax(
                &token,
                format!("function '{}' is disabled", token.text),
            ));
        }
        self.advance();
        let mut args = self.parse_call_args(token, Some(arity))?;
        match arity {
            1 => match args.pop() {
                Some(x) => self.synth(token, |g| g.unary(op, x)),
                None => Err(self.unexpected("an argument")),
            },
            2 => match (args.pop(), args.pop()) {
                (Some(b), Some(a)) => self.synth(token, |g| g.binary(op, a, b)),
                (b, a) => {
                    self.release((a, b));
                    Err(self.unexpected("two arguments"))
                }
            },
            _ => self.synth(token, |g| g.base_function3(op, args)),
        }
    }

    /// Built-in variadic call; at least one argument.
    pub(super) fn parse_vararg(&mut self, token: Token<'a>, op: VarArgOp) -> ParseResult {
        let args = self.parse_call_args(token, None)?;
        if args.is_empty() {
            return Err(ParserError::syntax(
                &token,
                format!("'{}' expects at least one argument", op.name()),
            ));
        }
        self.synth(token, |g| g.vararg(op, args))
    }

    /// Locals first, then the symbol tables, then the unknown-symbol
    /// resolver.
    fn parse_identifier(&mut self, token: Token<'a>, resolve: bool) -> ParseResult {
        let name = token.text;

        let local = self
            .scopes
            .get_active(name)
            .map(|element| element.storage.clone());
        if let Some(storage) = local {
            self.advance();
            return match storage {
                LocalStorage::Scalar(v) => {
                    self.note_storage(Rc::as_ptr(&v), name, SymbolType::LocalVariable);
                    self.collector.add_symbol(name, SymbolType::LocalVariable);
                    let id = self.synth(token, |g| g.variable(v))?;
                    self.imply_multiplication();
                    Ok(id)
                }
                LocalStorage::Vector(v) => {
                    self.note_storage(Rc::as_ptr(&v), name, SymbolType::LocalVector);
                    self.collector.add_symbol(name, SymbolType::LocalVector);
                    self.parse_vector_suffix(token, v)
                }
                LocalStorage::String(s) => {
                    self.note_storage(Rc::as_ptr(&s), name, SymbolType::LocalString);
                    self.collector.add_symbol(name, SymbolType::LocalString);
                    let id = self.synth(token, |g| g.string_var(s))?;
                    self.parse_string_suffix(id)
                }
            };
        }

        let symbols = self.symbols;
        if let Some(lookup) = symbols.lookup_variable(name) {
            self.advance();
            if lookup.constant {
                let value = lookup.value.get();
                return self.synth(token, |g| g.literal(value));
            }
            self.note_storage(Rc::as_ptr(&lookup.value), name, SymbolType::Variable);
            self.collector.add_symbol(name, SymbolType::Variable);
            let id = self.synth(token, |g| g.variable(lookup.value))?;
            self.imply_multiplication();
            return Ok(id);
        }
        if let Some(vector) = symbols.get_vector(name) {
            self.advance();
            self.note_storage(Rc::as_ptr(&vector), name, SymbolType::Vector);
            self.collector.add_symbol(name, SymbolType::Vector);
            return self.parse_vector_suffix(token, vector);
        }
        if let Some(s) = symbols.get_string(name) {
            self.advance();
            self.note_storage(Rc::as_ptr(&s), name, SymbolType::String);
            self.collector.add_symbol(name, SymbolType::String);
            let id = self.synth(token, |g| g.string_var(s))?;
            return self.parse_string_suffix(id);
        }
        if let Some(function) = symbols.get_function(name) {
            self.advance();
            self.collector.add_symbol(name, SymbolType::Function);
            let arity = function.arity();
            let args = if arity == 0 && !self.is(TokenKind::LParen) {
                Vec::new()
            } else {
                self.parse_call_args(token, Some(arity))?
            };
            if function.has_side_effects() {
                self.state.side_effect = true;
            }
            return self.synth(token, |g| g.function(function, args));
        }
        if let Some(function) = symbols.get_vararg_function(name) {
            self.advance();
            self.collector.add_symbol(name, SymbolType::Function);
            let args = if self.is(TokenKind::LParen) {
                self.parse_call_args(token, None)?
            } else {
                Vec::new()
            };
            if function.has_side_effects() {
                self.state.side_effect = true;
            }
            return self.synth(token, |g| g.vararg_function(function, args));
        }

        if resolve && self.resolve_unknown(token)? {
            return self.parse_identifier(token, false);
        }
        Err(ParserError::new(
            ErrorKind::Symtab,
            &token,
            format!("undefined symbol '{name}'"),
        ))
    }

    /// Ask the unknown-symbol resolver to define `token`. `Ok(true)` means
    /// a symbol table now knows the name.
    fn resolve_unknown(&mut self, token: Token<'a>) -> ParseResult<bool> {
        let Some(resolver) = self.resolver.clone() else {
            return Ok(false);
        };
        let name = token.text;
        let failed = |message: String| {
            ParserError::new(
                ErrorKind::Symtab,
                &token,
                format!("failed to resolve symbol '{name}': {message}"),
            )
        };
        let resolved = match resolver.mode() {
            ResolverMode::Default => {
                let (symbol_type, value) = resolver.resolve(name).map_err(failed)?;
                self.symbols
                    .add_variable(name, value, symbol_type == UsrSymbolType::Constant)
                    .map_err(|err| failed(err.to_string()))?;
                true
            }
            ResolverMode::Extended => {
                let Some(table) = self.symbols.first() else {
                    return Err(failed("no symbol table is registered".to_string()));
                };
                resolver.resolve_extended(name, table).map_err(failed)?
            }
        };
        if resolved {
            debug!(name, "Resolved unknown symbol");
            self.immutable = self.symbols.immutable_ranges();
        }
        Ok(resolved)
    }

    /// `v`, `v[]` (size), `v[i]` and the constant slice `v[a:b]`.
    fn parse_vector_suffix(&mut self, token: Token<'a>, vector: VectorRef) -> ParseResult {
        let size = vector.len();
        if !self.tokens.consume(TokenKind::LBracket) {
            return self.synth(token, |g| g.vector(vector, 0, size));
        }
        if self.tokens.consume(TokenKind::RBracket) {
            return self.synth(token, |g| g.literal(size as f64));
        }

        let start = if self.is(TokenKind::Colon) {
            Bound::Open
        } else {
            let index_token = self.current();
            let index = self.parse_expression(ARGUMENT_POWER)?;
            if self.tokens.consume(TokenKind::RBracket) {
                return self.synth(index_token, |g| g.vector_element(vector, index));
            }
            self.bound(index_token, index)?
        };
        let range = self.finish_range(start)?;
        let start = match range.start {
            Bound::Open => Some(0),
            Bound::Const(c) => Some(c),
            Bound::Node(_) => None,
        };
        let end = match range.end {
            Bound::Open => size.checked_sub(1),
            Bound::Const(c) => Some(c),
            Bound::Node(_) => None,
        };
        match (start, end) {
            (Some(start), Some(end)) => {
                self.synth(token, |g| g.vector_range(vector, start, end))
            }
            _ => {
                self.release(range);
                Err(ParserError::syntax(
                    &token,
                    "vector ranges require constant bounds",
                ))
            }
        }
    }
}
