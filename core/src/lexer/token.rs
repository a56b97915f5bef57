use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Byte range into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span(start..end)
    }

    pub fn at(position: usize) -> Self {
        Span(position..position)
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // Deliberately loose: the numeric checker rejects malformed exponents.
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]*)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]*)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    #[regex(r"\$f[0-9][0-9]")]
    Symbol,

    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[token("+")]
    Add,
    #[token("-")]
    Sub,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("%")]
    Mod,
    #[token("^")]
    Pow,

    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token("==")]
    #[token("=")]
    Eq,
    #[token("!=")]
    #[token("<>")]
    Ne,
    #[token(">=")]
    Gte,
    #[token(">")]
    Gt,

    #[token(":=")]
    Assign,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    ModAssign,
    #[token("<=>")]
    Swap,

    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("!")]
    Not,
    #[token("~")]
    Tilde,

    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[*]")]
    MultiSwitch,

    /// Synthetic end-of-input marker appended by the token stream.
    Eof,
}

impl TokenKind {
    pub fn is_open_bracket(self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    pub fn is_close_bracket(self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }

    /// The closing bracket matching an opening one.
    pub fn closing(self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            _ => None,
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubAssign
                | TokenKind::MulAssign
                | TokenKind::DivAssign
                | TokenKind::ModAssign
        )
    }

    /// Canonical spelling, used when a pass synthesizes a token.
    pub fn spelling(self) -> &'static str {
        use TokenKind::*;
        match self {
            Number => "<number>",
            Symbol => "<symbol>",
            String => "<string>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            Lt => "<",
            Lte => "<=",
            Eq => "==",
            Ne => "!=",
            Gte => ">=",
            Gt => ">",
            Assign => ":=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            Swap => "<=>",
            And => "&",
            Or => "|",
            Not => "!",
            Tilde => "~",
            Question => "?",
            Colon => ":",
            Semicolon => ";",
            Comma => ",",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
            MultiSwitch => "[*]",
            Eof => "<end of input>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// A lexeme. String tokens carry their unescaped contents without quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, position: usize) -> Self {
        Self { kind, text, position }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == name
    }

    pub fn span(&self) -> Span {
        Span::new(self.position, self.position + self.text.len().max(1))
    }

    pub fn detach(&self) -> OwnedToken {
        OwnedToken {
            kind: self.kind,
            text: self.text.to_string(),
            position: self.position,
        }
    }
}

/// A token detached from the compile session, kept by errors.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedToken {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl OwnedToken {
    pub fn span(&self) -> Span {
        Span::new(self.position, self.position + self.text.len().max(1))
    }
}
