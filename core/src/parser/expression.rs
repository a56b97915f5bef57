//! Statement sequences, precedence climbing and primaries.

use super::error::{ErrorKind, ParserError};
use super::session::{ParseResult, Session, or_free};
use crate::api::ControlStructures;
use crate::evaluator::{Operator, VarArgOp};
use crate::lexer::{Token, TokenKind};
use crate::tree::{AssignTarget, Bound, Node, NodeId, RangeSpec, StringSource, ValueKind};
use std::rc::Rc;
use tracing::debug;

/// Binding power for the operand of a prefix operator: tighter than
/// `* / %`, looser than `^`.
const UNARY_POWER: u8 = 11;

/// Binding power for range bounds and call arguments: everything except
/// assignment and the ternary.
pub(super) const ARGUMENT_POWER: u8 = 1;

/// Chained string ranges (`s[..][..]...`) stop after this many.
const MAX_RANGE_CHAIN: usize = 100;

enum Infix {
    Binary(Operator),
    Assign(Operator),
    Swap,
}

/// `(operator, left power, right power)` for the token in infix position.
/// Left-associative operators bind their right operand one level tighter.
fn infix(token: &Token<'_>) -> Option<(Infix, u8, u8)> {
    use TokenKind::*;
    Some(match token.kind {
        Assign => (Infix::Assign(Operator::Assign), 0, 0),
        AddAssign => (Infix::Assign(Operator::AddAssign), 0, 0),
        SubAssign => (Infix::Assign(Operator::SubAssign), 0, 0),
        MulAssign => (Infix::Assign(Operator::MulAssign), 0, 0),
        DivAssign => (Infix::Assign(Operator::DivAssign), 0, 0),
        ModAssign => (Infix::Assign(Operator::ModAssign), 0, 0),
        Swap => (Infix::Swap, 0, 1),
        Or => (Infix::Binary(Operator::Or), 1, 2),
        And => (Infix::Binary(Operator::And), 3, 4),
        Lt => (Infix::Binary(Operator::Lt), 5, 6),
        Lte => (Infix::Binary(Operator::Lte), 5, 6),
        Eq => (Infix::Binary(Operator::Eq), 5, 6),
        Ne => (Infix::Binary(Operator::Ne), 5, 6),
        Gte => (Infix::Binary(Operator::Gte), 5, 6),
        Gt => (Infix::Binary(Operator::Gt), 5, 6),
        Add => (Infix::Binary(Operator::Add), 7, 8),
        Sub => (Infix::Binary(Operator::Sub), 7, 8),
        Mul => (Infix::Binary(Operator::Mul), 10, 11),
        Div => (Infix::Binary(Operator::Div), 10, 11),
        Mod => (Infix::Binary(Operator::Mod), 10, 11),
        Pow => (Infix::Binary(Operator::Pow), 12, 12),
        Symbol => match token.text {
            "or" => (Infix::Binary(Operator::Or), 1, 2),
            "nor" => (Infix::Binary(Operator::Nor), 1, 2),
            "xor" => (Infix::Binary(Operator::Xor), 1, 2),
            "xnor" => (Infix::Binary(Operator::Xnor), 1, 2),
            "and" => (Infix::Binary(Operator::And), 3, 4),
            "nand" => (Infix::Binary(Operator::Nand), 3, 4),
            "in" => (Infix::Binary(Operator::In), 5, 6),
            "like" => (Infix::Binary(Operator::Like), 5, 6),
            "ilike" => (Infix::Binary(Operator::Ilike), 5, 6),
            _ => return None,
        },
        _ => return None,
    })
}

/// Address of the storage an assignment writes, for the entity collector.
fn target_address(target: &AssignTarget) -> usize {
    match target {
        AssignTarget::Variable(v) => Rc::as_ptr(v).cast::<u8>() as usize,
        AssignTarget::Element { vector, .. }
        | AssignTarget::ElementConst { vector, .. }
        | AssignTarget::Vector { vector, .. } => Rc::as_ptr(vector).cast::<u8>() as usize,
        AssignTarget::String(s) | AssignTarget::StringRange { target: s, .. } => {
            Rc::as_ptr(s).cast::<u8>() as usize
        }
    }
}

impl<'s, 'a> Session<'s, 'a> {
    /// The whole program: statements up to the end of input.
    pub(super) fn parse_corpus(&mut self) -> ParseResult {
        let open = self.current();
        let body = self.parse_sequence(open, TokenKind::Eof)?;
        if self.state.return_used {
            let sink = self.returns.clone();
            return self.synth(open, |g| g.return_envelope(body, sink));
        }
        Ok(body)
    }

    /// Statements separated by `;` up to `close`, which is consumed.
    pub(super) fn parse_sequence(&mut self, open: Token<'a>, close: TokenKind) -> ParseResult {
        let id = self.parse_statements(open, |t| t.kind == close, close.spelling())?;
        if close != TokenKind::Eof {
            or_free!(self, self.expect(close); id);
        }
        Ok(id)
    }

    /// Statements up to (not including) the first token `is_close` accepts.
    ///
    /// Every statement but the last is dropped when it has no side
    /// effects.
    pub(super) fn parse_statements(
        &mut self,
        open: Token<'a>,
        is_close: impl Fn(&Token<'a>) -> bool,
        close: &str,
    ) -> ParseResult {
        let outer = std::mem::replace(&mut self.state.side_effect, false);
        let mut statements: Vec<NodeId> = Vec::new();
        let mut effects: Vec<bool> = Vec::new();

        while !is_close(&self.current()) {
            self.state.side_effect = false;
            let statement = or_free!(self, self.parse_expression(0); statements);
            statements.push(statement);
            effects.push(self.state.side_effect);

            if self.tokens.consume(TokenKind::Semicolon) || is_close(&self.current()) {
                continue;
            }
            // A closing brace ends a statement on its own.
            let after_block = self
                .tokens
                .previous()
                .is_some_and(|t| t.kind == TokenKind::RBrace);
            if !after_block {
                let err = self.unexpected(&format!("';' or '{close}'"));
                self.release(statements);
                return Err(err);
            }
        }
        self.state.side_effect = outer || effects.iter().any(|e| *e);

        let last = statements.len().saturating_sub(1);
        let mut kept = Vec::with_capacity(statements.len());
        let mut pruned = 0usize;
        for (i, (statement, effect)) in statements.into_iter().zip(effects).enumerate() {
            if i == last || effect {
                kept.push(statement);
            } else {
                self.release(statement);
                pruned += 1;
            }
        }
        if pruned > 0 {
            debug!(pruned, "Pruned statements without side effects");
        }
        self.synth(open, |g| g.sequence(kept))
    }

    pub(super) fn parse_expression(&mut self, min_power: u8) -> ParseResult {
        self.with_depth_guard(|p| p.climb(min_power))
    }

    fn climb(&mut self, min_power: u8) -> ParseResult {
        let mut lhs = self.parse_branch()?;
        loop {
            let token = self.current();
            if token.kind == TokenKind::Question {
                // Ternaries only bind at the lowest level.
                if min_power > 0 {
                    break;
                }
                lhs = self.parse_ternary(token, lhs)?;
                continue;
            }
            let Some((infix, left_power, right_power)) = infix(&token) else {
                break;
            };
            if left_power < min_power {
                break;
            }
            self.advance();
            lhs = match infix {
                Infix::Binary(op) => {
                    let rhs = or_free!(self, self.parse_expression(right_power); lhs);
                    self.synth(token, |g| g.binary(op, lhs, rhs))?
                }
                Infix::Assign(op) => self.parse_assignment(token, op, lhs, right_power)?,
                Infix::Swap => {
                    let rhs = or_free!(self, self.parse_expression(right_power); lhs);
                    self.swap_nodes(token, lhs, rhs)?
                }
            };
        }
        Ok(lhs)
    }

    fn parse_ternary(&mut self, token: Token<'a>, condition: NodeId) -> ParseResult {
        if !self.settings.control_enabled(ControlStructures::IF) {
            self.release(condition);
            return Err(ParserError::syntax(&token, "conditionals are disabled"));
        }
        self.advance();
        let consequent = or_free!(self, self.parse_expression(0); condition);
        or_free!(self, self.expect(TokenKind::Colon); condition, consequent);
        let alternative = or_free!(self, self.parse_expression(0); condition, consequent);
        self.synth(token, |g| {
            g.conditional(condition, consequent, Some(alternative))
        })
    }

    /// Turn a parsed operand back into the storage it reads. Nodes that
    /// do not name storage are handed back unchanged.
    pub(super) fn assign_target(&mut self, id: NodeId) -> Result<AssignTarget, NodeId> {
        let target = match self.arena.take(id) {
            Node::Variable(v) => AssignTarget::Variable(v),
            Node::VectorElement { vector, index } => AssignTarget::Element { vector, index },
            Node::VectorElementConst { vector, index } => {
                AssignTarget::ElementConst { vector, index }
            }
            Node::Vector { vector, start, len } => AssignTarget::Vector { vector, start, len },
            Node::StringVar(s) => AssignTarget::String(s),
            Node::StringRange {
                source: StringSource::Var(s),
                range,
            } => AssignTarget::StringRange { target: s, range },
            other => return Err(self.arena.allocate(other)),
        };
        Ok(target)
    }

    fn parse_assignment(
        &mut self,
        token: Token<'a>,
        op: Operator,
        lhs: NodeId,
        right_power: u8,
    ) -> ParseResult {
        let target = match self.assign_target(lhs) {
            Ok(target) => target,
            Err(lhs) => {
                self.release(lhs);
                return Err(ParserError::syntax(
                    &token,
                    format!("invalid left-hand side for '{op}'"),
                ));
            }
        };
        let value = or_free!(self, self.parse_expression(right_power); target);
        let address = target_address(&target);
        let id = self.synth(token, |g| g.assign(op, target, value))?;
        self.state.side_effect = true;
        self.record_assignment(address);
        Ok(id)
    }

    /// `lhs <=> rhs` and `swap(lhs, rhs)`.
    pub(super) fn swap_nodes(&mut self, token: Token<'a>, lhs: NodeId, rhs: NodeId) -> ParseResult {
        let invalid = || ParserError::syntax(&token, "swap operands must be variables, vectors, vector elements or strings");
        let left = match self.assign_target(lhs) {
            Ok(target) => target,
            Err(lhs) => {
                self.release((lhs, rhs));
                return Err(invalid());
            }
        };
        let right = match self.assign_target(rhs) {
            Ok(target) => target,
            Err(rhs) => {
                self.release(rhs);
                self.release(left);
                return Err(invalid());
            }
        };
        let addresses = [target_address(&left), target_address(&right)];
        let id = self.synth(token, |g| g.swap(left, right))?;
        self.state.side_effect = true;
        for address in addresses {
            self.record_assignment(address);
        }
        Ok(id)
    }

    fn parse_branch(&mut self) -> ParseResult {
        let token = self.current();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: f64 = token.text.parse().map_err(|_| {
                    ParserError::new(
                        ErrorKind::Numeric,
                        &token,
                        format!("failed to convert '{}' to a number", token.text),
                    )
                })?;
                self.synth(token, |g| g.literal(value))
            }
            TokenKind::String => {
                self.advance();
                let id = self.synth(token, |g| g.string_literal(token.text.to_string()))?;
                self.parse_string_suffix(id)
            }
            TokenKind::LParen => {
                self.advance();
                let id = self.parse_sequence(token, TokenKind::RParen)?;
                let id = self.parse_string_suffix(id)?;
                self.imply_multiplication();
                Ok(id)
            }
            TokenKind::LBracket | TokenKind::LBrace => {
                self.advance();
                let close = token.kind.closing().unwrap_or(TokenKind::RBrace);
                self.scoped(|p| p.parse_sequence(token, close))
            }
            TokenKind::Sub | TokenKind::Add | TokenKind::Not => {
                self.advance();
                let op = match token.kind {
                    TokenKind::Sub => Operator::Neg,
                    TokenKind::Add => Operator::Pos,
                    _ => Operator::Not,
                };
                let operand = self.parse_expression(UNARY_POWER)?;
                self.synth(token, |g| g.unary(op, operand))
            }
            TokenKind::Tilde => {
                self.advance();
                self.parse_vararg(token, VarArgOp::Multi)
            }
            TokenKind::MultiSwitch => self.parse_multi_switch(),
            TokenKind::Symbol => self.parse_symbol(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `(a)(b)` reads as `(a)*(b)` when implied multiplication is on.
    pub(super) fn imply_multiplication(&mut self) {
        if self.settings.commutative_check && self.is(TokenKind::LParen) {
            self.tokens.insert_front(TokenKind::Mul);
        }
    }

    /// `s[a:b]` and `s[]` applied to a string-valued node, repeatedly.
    pub(super) fn parse_string_suffix(&mut self, mut id: NodeId) -> ParseResult {
        let mut chained = 0;
        while chained < MAX_RANGE_CHAIN
            && self.is(TokenKind::LBracket)
            && self.arena.kind(&id) == ValueKind::String
        {
            let token = self.current();
            self.advance();
            if self.tokens.consume(TokenKind::RBracket) {
                return self.synth(token, |g| g.string_size(id));
            }
            let range = or_free!(self, self.parse_range(); id);
            id = self.synth(token, |g| g.string_range(id, range))?;
            chained += 1;
        }
        Ok(id)
    }

    /// `a:b]` after an opening `[`. Either bound may be omitted.
    pub(super) fn parse_range(&mut self) -> ParseResult<RangeSpec> {
        let start = if self.is(TokenKind::Colon) {
            Bound::Open
        } else {
            let token = self.current();
            let id = self.parse_expression(ARGUMENT_POWER)?;
            self.bound(token, id)?
        };
        self.finish_range(start)
    }

    /// The `:b]` rest of a range whose start is already parsed.
    pub(super) fn finish_range(&mut self, start: Bound) -> ParseResult<RangeSpec> {
        let token = self.current();
        or_free!(self, self.expect(TokenKind::Colon); start);
        let end = if self.is(TokenKind::RBracket) {
            Bound::Open
        } else {
            let bound_token = self.current();
            let id = or_free!(self, self.parse_expression(ARGUMENT_POWER); start);
            or_free!(self, self.bound(bound_token, id); start)
        };
        or_free!(self, self.expect(TokenKind::RBracket); start, end);

        if let (Bound::Const(lo), Bound::Const(hi)) = (&start, &end) {
            if lo > hi {
                let message = format!("range lower bound {lo} exceeds upper bound {hi}");
                return Err(ParserError::syntax(&token, message));
            }
        }
        Ok(RangeSpec { start, end })
    }

    /// Classify a parsed range bound: literals must be non-negative
    /// integers, anything else is checked at evaluation time.
    pub(super) fn bound(&mut self, token: Token<'a>, id: NodeId) -> ParseResult<Bound> {
        if let Some(value) = self.arena.literal(&id) {
            self.release(id);
            if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
                return Err(ParserError::syntax(
                    &token,
                    format!("range bound {value} is not a non-negative integer"),
                ));
            }
            return Ok(Bound::Const(value as usize));
        }
        if self.arena.kind(&id) != ValueKind::Scalar {
            self.release(id);
            return Err(ParserError::syntax(&token, "range bound must be numeric"));
        }
        Ok(Bound::Node(id))
    }
}
