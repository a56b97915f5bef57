use super::{Token, TokenKind};

/// Cursor over a validated token list.
///
/// Reading past the end yields a synthetic [`TokenKind::Eof`] token located
/// at the end of the source.
pub struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    eof: Token<'a>,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: Vec<Token<'a>>, source_len: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            eof: Token::new(TokenKind::Eof, "", source_len),
        }
    }

    pub fn current(&self) -> Token<'a> {
        self.tokens.get(self.cursor).copied().unwrap_or(self.eof)
    }

    pub fn peek(&self) -> Token<'a> {
        self.peek_nth(1)
    }

    pub fn peek_nth(&self, n: usize) -> Token<'a> {
        self.tokens.get(self.cursor + n).copied().unwrap_or(self.eof)
    }

    /// The token before the cursor, if any.
    pub fn previous(&self) -> Option<Token<'a>> {
        self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i).copied())
    }

    pub fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Advance past the current token if it has the given kind.
    pub fn consume(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance past the current token if it is the given keyword.
    pub fn consume_symbol(&mut self, name: &str) -> bool {
        if self.current().is_symbol(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Insert a synthesized token so that it becomes the current token.
    pub fn insert_front(&mut self, kind: TokenKind) {
        let position = self.current().position;
        self.tokens
            .insert(self.cursor, Token::new(kind, kind.spelling(), position));
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
