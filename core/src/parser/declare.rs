//! Local declarations (`var`) and the `swap` call form.

use super::error::ParserError;
use super::expression::ARGUMENT_POWER;
use super::session::{ParseResult, Session, or_free};
use crate::lexer::{Token, TokenKind};
use crate::scope_stack::{LocalRequest, LocalStorage};
use crate::symbols::{is_reserved, is_valid_name};
use crate::tree::{AssignTarget, NodeId, ValueKind, VectorInit};
use tracing::trace;

/// Largest vector a declaration may allocate.
const MAX_VECTOR_SIZE: f64 = 2.0e9;

impl<'s, 'a> Session<'s, 'a> {
    /// `var x`, `var x := value`, `var s := 'text'` and
    /// `var v[n] [:= {a, b, ...} | null | scalar | vector]`.
    pub(super) fn parse_var(&mut self) -> ParseResult {
        let token = self.current();
        if !self.settings.vardef {
            return Err(ParserError::syntax(&token, "variable definitions are disabled"));
        }
        self.advance();
        let name = self.current();
        if name.kind != TokenKind::Symbol {
            return Err(self.unexpected("a variable name"));
        }
        self.check_new_name(&name)?;
        self.advance();

        let id = if self.tokens.consume(TokenKind::LBracket) {
            self.parse_vector_var(name)?
        } else {
            self.parse_scalar_var(name)?
        };
        self.state.side_effect = true;
        Ok(id)
    }

    fn check_new_name(&self, name: &Token<'a>) -> ParseResult<()> {
        let text = name.text;
        let problem = if !is_valid_name(text) {
            Some(format!("'{text}' is not a valid variable name"))
        } else if is_reserved(text) {
            Some(format!("'{text}' is a reserved word"))
        } else if self.symbols.symbol_exists(text) {
            Some(format!("'{text}' is already defined in a symbol table"))
        } else {
            None
        };
        match problem {
            Some(message) => Err(ParserError::syntax(name, message)),
            None => Ok(()),
        }
    }

    /// Register the local in the current scope.
    fn declare(&mut self, name: &Token<'a>, request: LocalRequest<'_>) -> ParseResult<LocalStorage> {
        let depth = self.state.scope_depth;
        let element = self
            .scopes
            .add_element(name.text, depth, request)
            .map_err(|err| ParserError::syntax(name, err.to_string()))?;
        trace!(name = name.text, depth, "Declared local");
        Ok(element.storage.clone())
    }

    fn parse_vector_var(&mut self, name: Token<'a>) -> ParseResult {
        let size_token = self.current();
        let size_id = self.parse_expression(ARGUMENT_POWER)?;
        let size = self.arena.literal(&size_id);
        self.release(size_id);
        let size = match size {
            Some(v) if v.fract() == 0.0 && (1.0..=MAX_VECTOR_SIZE).contains(&v) => v as usize,
            _ => {
                return Err(ParserError::syntax(
                    &size_token,
                    format!("vector size of '{}' must be a constant integer between 1 and 2e9", name.text),
                ));
            }
        };
        self.expect(TokenKind::RBracket)?;

        let init = if self.tokens.consume(TokenKind::Assign) {
            self.parse_vector_init()?
        } else {
            VectorInit::Zero
        };
        let storage = match or_free!(self, self.declare(&name, LocalRequest::Vector(size)); init) {
            LocalStorage::Vector(v) => v,
            _ => {
                self.release(init);
                return Err(ParserError::syntax(&name, "local storage kind mismatch"));
            }
        };
        self.synth(name, |g| g.vector_definition(storage, init))
    }

    fn parse_vector_init(&mut self) -> ParseResult<VectorInit> {
        if self.tokens.consume(TokenKind::LBrace) {
            let mut items: Vec<NodeId> = Vec::new();
            if !self.tokens.consume(TokenKind::RBrace) {
                loop {
                    let item = or_free!(self, self.parse_expression(ARGUMENT_POWER); items);
                    items.push(item);
                    if !self.tokens.consume(TokenKind::Comma) {
                        break;
                    }
                }
                or_free!(self, self.expect(TokenKind::RBrace); items);
            }
            return Ok(if items.is_empty() {
                VectorInit::Zero
            } else {
                VectorInit::List(items)
            });
        }
        if self.tokens.consume_symbol("null") {
            return Ok(VectorInit::Zero);
        }
        let value = self.parse_expression(0)?;
        Ok(match self.arena.kind(&value) {
            ValueKind::Vector => VectorInit::Copy(value),
            _ => VectorInit::Broadcast(value),
        })
    }

    fn parse_scalar_var(&mut self, name: Token<'a>) -> ParseResult {
        let value = if self.tokens.consume(TokenKind::Assign) {
            self.parse_expression(0)?
        } else {
            self.synth(name, |g| g.literal(0.0))?
        };
        let request = match self.arena.kind(&value) {
            ValueKind::String => LocalRequest::String(""),
            ValueKind::Vector => {
                // `var w := v` declares a vector sized like `v`.
                let size = self.arena.vector_size(&value);
                if size > 0 {
                    let storage = match or_free!(self, self.declare(&name, LocalRequest::Vector(size)); value) {
                        LocalStorage::Vector(v) => v,
                        _ => {
                            self.release(value);
                            return Err(ParserError::syntax(&name, "local storage kind mismatch"));
                        }
                    };
                    return self.synth(name, |g| {
                        g.vector_definition(storage, VectorInit::Copy(value))
                    });
                }
                LocalRequest::Scalar
            }
            ValueKind::Scalar => LocalRequest::Scalar,
        };
        let target = match or_free!(self, self.declare(&name, request); value) {
            LocalStorage::Scalar(v) => AssignTarget::Variable(v),
            LocalStorage::String(s) => AssignTarget::String(s),
            LocalStorage::Vector(_) => {
                self.release(value);
                return Err(ParserError::syntax(&name, "local storage kind mismatch"));
            }
        };
        self.synth(name, |g| g.define(target, value))
    }

    /// `swap(a, b)`.
    pub(super) fn parse_swap(&mut self) -> ParseResult {
        let token = self.current();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let left = self.parse_expression(ARGUMENT_POWER)?;
        or_free!(self, self.expect(TokenKind::Comma); left);
        let right = or_free!(self, self.parse_expression(ARGUMENT_POWER); left);
        or_free!(self, self.expect(TokenKind::RParen); left, right);
        self.swap_nodes(token, left, right)
    }
}
