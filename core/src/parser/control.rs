//! Control structures: conditionals, loops, switches, `return`, `break`
//! and `continue`.

use super::error::ParserError;
use super::session::{ParseResult, Session, or_free};
use crate::api::ControlStructures;
use crate::lexer::{Token, TokenKind};
use crate::runtime::LoopTypes;
use crate::tree::NodeId;

impl<'s, 'a> Session<'s, 'a> {
    /// Reject `token` when its control structure is turned off.
    fn require(&self, token: &Token<'a>, structure: ControlStructures) -> ParseResult<()> {
        if self.settings.control_enabled(structure) {
            Ok(())
        } else {
            Err(ParserError::syntax(
                token,
                format!("'{}' is disabled", token.text),
            ))
        }
    }

    /// `(expr)` around a condition.
    fn parse_condition(&mut self) -> ParseResult {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression(0)?;
        or_free!(self, self.expect(TokenKind::RParen); condition);
        Ok(condition)
    }

    /// `if (c) x [else y]`, with `else if` chains, or the function form
    /// `if(c, x, y)`.
    pub(super) fn parse_if(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::IF)?;
        self.advance();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression(0)?;

        if self.tokens.consume(TokenKind::Comma) {
            let consequent = or_free!(self, self.parse_expression(0); condition);
            or_free!(self, self.expect(TokenKind::Comma); condition, consequent);
            let alternative = or_free!(self, self.parse_expression(0); condition, consequent);
            or_free!(self, self.expect(TokenKind::RParen); condition, consequent, alternative);
            return self.synth(token, |g| {
                g.conditional(condition, consequent, Some(alternative))
            });
        }

        or_free!(self, self.expect(TokenKind::RParen); condition);
        let consequent = or_free!(self, self.parse_expression(0); condition);
        if self.is(TokenKind::Semicolon) && self.tokens.peek().is_symbol("else") {
            self.advance();
        }
        let alternative = if self.tokens.consume_symbol("else") {
            Some(or_free!(self, self.parse_expression(0); condition, consequent))
        } else {
            None
        };
        self.synth(token, |g| g.conditional(condition, consequent, alternative))
    }

    /// `while (c) body`.
    pub(super) fn parse_while(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::WHILE)?;
        self.advance();
        let condition = self.parse_condition()?;
        let body = or_free!(self, self.in_loop(|p| p.parse_expression(0)); condition);
        let check = self.loop_check_for(LoopTypes::WHILE);
        self.state.side_effect = true;
        self.synth(token, |g| g.while_loop(condition, body, check))
    }

    /// `repeat s1; s2; ... until (c)`.
    pub(super) fn parse_repeat(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::REPEAT)?;
        self.advance();
        let body = self.scoped(|p| {
            p.in_loop(|p| p.parse_statements(token, |t| t.is_symbol("until"), "until"))
        })?;
        or_free!(self, self.expect_symbol("until"); body);
        let condition = or_free!(self, self.parse_condition(); body);
        let check = self.loop_check_for(LoopTypes::REPEAT);
        self.state.side_effect = true;
        self.synth(token, |g| g.repeat_loop(body, condition, check))
    }

    /// `for (init; condition; increment) body`. Each clause may be empty;
    /// locals declared in `init` are scoped to the loop.
    pub(super) fn parse_for(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::FOR)?;
        self.advance();
        self.scoped(|p| {
            p.expect(TokenKind::LParen)?;
            let init = p.parse_clause(TokenKind::Semicolon)?;
            or_free!(p, p.expect(TokenKind::Semicolon); init);
            let condition = or_free!(p, p.parse_clause(TokenKind::Semicolon); init);
            or_free!(p, p.expect(TokenKind::Semicolon); init, condition);
            let increment = or_free!(p, p.parse_clause(TokenKind::RParen); init, condition);
            or_free!(p, p.expect(TokenKind::RParen); init, condition, increment);
            let body = or_free!(p, p.in_loop(|p| p.parse_expression(0)); init, condition, increment);
            let check = p.loop_check_for(LoopTypes::FOR);
            p.state.side_effect = true;
            p.synth(token, |g| g.for_loop(init, condition, increment, body, check))
        })
    }

    fn parse_clause(&mut self, end: TokenKind) -> ParseResult<Option<NodeId>> {
        if self.is(end) {
            Ok(None)
        } else {
            self.parse_expression(0).map(Some)
        }
    }

    /// `case c: x;` entries up to `default` (when allowed) or `}`.
    fn parse_cases(&mut self, with_default: bool) -> ParseResult<(Vec<(NodeId, NodeId)>, Option<NodeId>)> {
        self.expect(TokenKind::LBrace)?;
        let mut cases: Vec<(NodeId, NodeId)> = Vec::new();
        let mut default = None;
        loop {
            if self.tokens.consume_symbol("case") {
                let condition = or_free!(self, self.parse_expression(0); cases);
                or_free!(self, self.expect(TokenKind::Colon); cases, condition);
                let consequent = or_free!(self, self.parse_expression(0); cases, condition);
                self.tokens.consume(TokenKind::Semicolon);
                cases.push((condition, consequent));
            } else if with_default && self.tokens.consume_symbol("default") {
                or_free!(self, self.expect(TokenKind::Colon); cases);
                let value = or_free!(self, self.parse_expression(0); cases);
                self.tokens.consume(TokenKind::Semicolon);
                default = Some(value);
                break;
            } else {
                break;
            }
        }
        if with_default && default.is_none() {
            let expected = if cases.is_empty() { "'case' or 'default'" } else { "'default'" };
            let err = self.unexpected(expected);
            self.release(cases);
            return Err(err);
        }
        if cases.is_empty() && !with_default {
            let err = self.unexpected("'case'");
            return Err(err);
        }
        or_free!(self, self.expect(TokenKind::RBrace); cases, default);
        Ok((cases, default))
    }

    /// `switch { case c: x; ... default: y; }`: the first true case wins.
    pub(super) fn parse_switch(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::SWITCH)?;
        self.advance();
        let (cases, default) = self.parse_cases(true)?;
        let Some(default) = default else {
            self.release(cases);
            return Err(ParserError::syntax(&token, "switch requires a 'default' case"));
        };
        self.synth(token, |g| g.switch(cases, default))
    }

    /// `[*] { case c: x; ... }`: every true case runs.
    pub(super) fn parse_multi_switch(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::SWITCH)?;
        self.advance();
        let (cases, _) = self.parse_cases(false)?;
        self.synth(token, |g| g.multi_switch(cases))
    }

    /// `return`, `return []` or `return [a, b, ...]`.
    pub(super) fn parse_return(&mut self) -> ParseResult {
        let token = self.current();
        self.require(&token, ControlStructures::RETURN)?;
        if self.state.in_return {
            return Err(ParserError::syntax(&token, "'return' cannot be nested"));
        }
        self.advance();

        let mut args: Vec<NodeId> = Vec::new();
        if self.tokens.consume(TokenKind::LBracket) {
            self.state.in_return = true;
            let parsed = self.parse_return_args(&mut args);
            self.state.in_return = false;
            or_free!(self, parsed; args);
        }

        let signature: String = args
            .iter()
            .map(|id| self.arena.kind(id).signature())
            .collect();
        self.collector.add_return_signature(signature);
        self.state.return_used = true;
        self.state.side_effect = true;
        let sink = self.returns.clone();
        self.synth(token, |g| g.return_node(args, sink))
    }

    fn parse_return_args(&mut self, args: &mut Vec<NodeId>) -> ParseResult<()> {
        if self.tokens.consume(TokenKind::RBracket) {
            return Ok(());
        }
        loop {
            args.push(self.parse_expression(0)?);
            if !self.tokens.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(())
    }

    fn require_loop(&self, token: &Token<'a>) -> ParseResult<()> {
        if self.state.loop_depth == 0 {
            return Err(ParserError::syntax(
                token,
                format!("'{}' outside of a loop", token.text),
            ));
        }
        Ok(())
    }

    /// `break` or `break[value]`.
    pub(super) fn parse_break(&mut self) -> ParseResult {
        let token = self.current();
        self.require_loop(&token)?;
        self.advance();
        let value = if self.tokens.consume(TokenKind::LBracket) {
            let value = self.parse_expression(0)?;
            or_free!(self, self.expect(TokenKind::RBracket); value);
            Some(value)
        } else {
            None
        };
        self.state.side_effect = true;
        self.synth(token, |g| g.break_node(value))
    }

    pub(super) fn parse_continue(&mut self) -> ParseResult {
        let token = self.current();
        self.require_loop(&token)?;
        self.advance();
        self.state.side_effect = true;
        self.synth(token, |g| g.continue_node())
    }
}
