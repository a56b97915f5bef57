//! Token passes run between tokenizing and parsing.
//!
//! Modifiers, joiners and inserters rewrite the token list; scanners
//! validate it. Each pass is switched on or off through
//! [`Settings`](crate::api::Settings).

use super::{OwnedToken, Token, TokenKind};
use crate::symbols::RESERVED_WORDS;
use bumpalo::Bump;
use hashbrown::HashMap;

/// Which scanner rejected the token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Bracket,
    Sequence,
    Numeric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassError {
    pub kind: PassKind,
    pub token: OwnedToken,
    pub message: String,
}

impl PassError {
    fn new(kind: PassKind, token: &Token<'_>, message: String) -> Self {
        Self {
            kind,
            token: token.detach(),
            message,
        }
    }
}

/// Keywords whose parenthesised header is never the left operand of an
/// implied multiplication.
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "until"];

/// Replace `true`/`false` with `1`/`0` and apply host replacements.
/// Returns the number of tokens replaced.
pub fn replace_symbols<'a>(
    bump: &'a Bump,
    tokens: &mut [Token<'a>],
    replacements: &HashMap<String, String>,
) -> usize {
    let mut count = 0;
    for token in tokens.iter_mut().filter(|t| t.kind == TokenKind::Symbol) {
        let replacement: Option<&'a str> = match token.text {
            "true" => Some("1"),
            "false" => Some("0"),
            text => replacements
                .get(text)
                .map(|r| &*bump.alloc_str(r.as_str())),
        };
        if let Some(text) = replacement {
            token.kind = if text.parse::<f64>().is_ok() {
                TokenKind::Number
            } else {
                TokenKind::Symbol
            };
            token.text = text;
            count += 1;
        }
    }
    count
}

fn joined(first: TokenKind, second: TokenKind) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match (first, second) {
        (Colon, Eq) => Assign,
        (Add, Eq) => AddAssign,
        (Sub, Eq) => SubAssign,
        (Mul, Eq) => MulAssign,
        (Div, Eq) => DivAssign,
        (Mod, Eq) => ModAssign,
        (Lt, Eq) => Lte,
        (Gt, Eq) => Gte,
        (Eq, Eq) => Eq,
        (Not, Eq) => Ne,
        (Lt, Gt) => Ne,
        (Lte, Gt) => Swap,
        (Add, Sub) | (Sub, Add) => Sub,
        (Add, Add) | (Sub, Sub) => Add,
        _ => return None,
    })
}

/// Join operators split by whitespace and collapse adjacent sign pairs.
pub fn join_operators<'a>(tokens: Vec<Token<'a>>) -> Vec<Token<'a>> {
    let mut out: Vec<Token<'a>> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(last) = out.last_mut() {
            if let Some(kind) = joined(last.kind, token.kind) {
                last.kind = kind;
                last.text = kind.spelling();
                continue;
            }
        }
        out.push(token);
    }
    out
}

fn is_keyword(text: &str) -> bool {
    RESERVED_WORDS.contains(&text)
}

fn implies_multiplication(prev: &Token<'_>, next: &Token<'_>, closed_control: bool) -> bool {
    use TokenKind::*;
    match (prev.kind, next.kind) {
        (Number, Symbol) => !is_keyword(next.text),
        (Number, LParen) => true,
        (RParen, Symbol) => !closed_control && !is_keyword(next.text),
        (RParen, Number) => !closed_control,
        _ => false,
    }
}

/// Insert `*` for number→symbol, number→`(`, `)`→symbol and `)`→number.
pub fn insert_implied_multiplication<'a>(tokens: Vec<Token<'a>>) -> Vec<Token<'a>> {
    let mut out: Vec<Token<'a>> = Vec::with_capacity(tokens.len());
    // One entry per open parenthesis: was it a control-structure header?
    let mut groups: Vec<bool> = Vec::new();
    let mut closed_control = false;

    for token in tokens {
        let prev = out.last().copied();
        if let Some(prev) = prev {
            if implies_multiplication(&prev, &token, closed_control) {
                out.push(Token::new(TokenKind::Mul, "*", token.position));
            }
        }
        match token.kind {
            TokenKind::LParen => groups.push(
                prev.is_some_and(|p| p.kind == TokenKind::Symbol && CONTROL_KEYWORDS.contains(&p.text)),
            ),
            TokenKind::RParen => closed_control = groups.pop().unwrap_or(false),
            _ => {}
        }
        out.push(token);
    }
    out
}

/// Verify that brackets are balanced and properly nested.
pub fn check_brackets(tokens: &[Token<'_>]) -> Vec<PassError> {
    let mut stack: Vec<&Token<'_>> = Vec::new();
    for token in tokens {
        if token.kind.is_open_bracket() {
            stack.push(token);
        } else if token.kind.is_close_bracket() {
            match stack.pop() {
                Some(open) if open.kind.closing() == Some(token.kind) => {}
                Some(open) => {
                    return vec![PassError::new(
                        PassKind::Bracket,
                        token,
                        format!("mismatched bracket '{}' closes '{}'", token.text, open.text),
                    )];
                }
                None => {
                    return vec![PassError::new(
                        PassKind::Bracket,
                        token,
                        format!("unexpected closing bracket '{}'", token.text),
                    )];
                }
            }
        }
    }

    stack
        .first()
        .map(|open| {
            vec![PassError::new(
                PassKind::Bracket,
                open,
                format!("unclosed bracket '{}'", open.text),
            )]
        })
        .unwrap_or_default()
}

fn invalid_pair(first: TokenKind, second: TokenKind) -> bool {
    use TokenKind::*;
    let leads_operand = matches!(
        first,
        Add | Sub
            | Mul
            | Div
            | Mod
            | Pow
            | Lt
            | Lte
            | Eq
            | Ne
            | Gte
            | Gt
            | Assign
            | AddAssign
            | SubAssign
            | MulAssign
            | DivAssign
            | ModAssign
            | Swap
            | And
            | Or
            | LParen
            | LBracket
            | LBrace
            | Comma
    );
    let binary_only = matches!(second, Mul | Div | Mod | Pow);
    (leads_operand && binary_only)
        || matches!(
            (first, second),
            (Number, Number) | (String, String) | (Number, String) | (String, Number)
        )
}

/// Reject adjacent token pairs that can never form a valid expression.
pub fn check_sequences(tokens: &[Token<'_>]) -> Vec<PassError> {
    tokens
        .windows(2)
        .filter(|pair| invalid_pair(pair[0].kind, pair[1].kind))
        .map(|pair| {
            PassError::new(
                PassKind::Sequence,
                &pair[1],
                format!("invalid token sequence '{}' '{}'", pair[0].text, pair[1].text),
            )
        })
        .collect()
}

/// Verify that every numeric literal converts to a number.
pub fn check_numerics(tokens: &[Token<'_>]) -> Vec<PassError> {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number && t.text.parse::<f64>().is_err())
        .map(|t| {
            PassError::new(
                PassKind::Numeric,
                t,
                format!("invalid numeric literal '{}'", t.text),
            )
        })
        .collect()
}
