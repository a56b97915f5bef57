//! Tokenizer and token-stream passes.
//!
//! [`tokenize`] turns source text into tokens whose text lives either in the
//! source or in a per-compile bump arena (unescaped strings, replaced
//! symbols). The passes in [`helpers`] then rewrite and validate the token
//! list before the parser sees it.

pub mod helpers;
mod stream;
mod token;

#[cfg(test)]
mod lexer_test;

pub use stream::TokenStream;
pub use token::{OwnedToken, Span, Token, TokenKind};

use bumpalo::Bump;
use logos::Logos;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid token '{text}'")]
    InvalidToken { text: String, position: usize },
    #[error("unterminated string literal")]
    UnterminatedString { position: usize },
    #[error("invalid escape sequence '\\{escape}' in string literal")]
    InvalidEscape { escape: char, position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::InvalidToken { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. } => *position,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LexError::InvalidToken { text, .. } => text,
            LexError::UnterminatedString { .. } => "'",
            LexError::InvalidEscape { .. } => "\\",
        }
    }
}

/// Scan `source` into tokens.
pub fn tokenize<'a>(bump: &'a Bump, source: &'a str) -> Result<Vec<Token<'a>>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        match result {
            Ok(TokenKind::String) => {
                let body = &slice[1..slice.len() - 1];
                let text = unescape(bump, body, span.start)?;
                tokens.push(Token::new(TokenKind::String, text, span.start));
            }
            Ok(kind) => tokens.push(Token::new(kind, slice, span.start)),
            Err(()) if slice.starts_with('\'') => {
                return Err(LexError::UnterminatedString {
                    position: span.start,
                });
            }
            Err(()) => {
                return Err(LexError::InvalidToken {
                    text: slice.to_string(),
                    position: span.start,
                });
            }
        }
    }

    tracing::trace!(count = tokens.len(), "Tokenized source");
    Ok(tokens)
}

fn unescape<'a>(bump: &'a Bump, body: &'a str, position: usize) -> Result<&'a str, LexError> {
    if !body.contains('\\') {
        return Ok(body);
    }

    let mut out = bumpalo::collections::String::with_capacity_in(body.len(), bump);
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                return Err(LexError::InvalidEscape {
                    escape: other,
                    position,
                });
            }
            None => return Err(LexError::UnterminatedString { position }),
        }
    }
    Ok(out.into_bump_str())
}
