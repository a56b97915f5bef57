use crate::api::{Diagnostic, Severity};
use crate::generator::GenError;
use crate::lexer::helpers::PassError;
use crate::lexer::{LexError, OwnedToken, Token, TokenKind};
use std::fmt;

/// Classification of a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown,
    /// Grammar violations, wrong arity, use of a disabled feature.
    Syntax,
    /// Rejected by a token scanner (brackets, sequences, numerics).
    Token,
    /// A numeric literal that does not convert to a number.
    Numeric,
    /// Undefined symbol or failed unknown-symbol resolution.
    Symtab,
    /// Malformed input the tokenizer could not scan.
    Lexer,
    /// A token pass failed outright.
    Helper,
    /// Resource bounds, immutability and other internal failures.
    Parser,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unknown => "E-UNKNOWN",
            ErrorKind::Syntax => "E-SYNTAX",
            ErrorKind::Token => "E-TOKEN",
            ErrorKind::Numeric => "E-NUMERIC",
            ErrorKind::Symtab => "E-SYMTAB",
            ErrorKind::Lexer => "E-LEXER",
            ErrorKind::Helper => "E-HELPER",
            ErrorKind::Parser => "E-PARSER",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Unknown => "unknown error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Token => "token error",
            ErrorKind::Numeric => "numeric error",
            ErrorKind::Symtab => "symbol error",
            ErrorKind::Lexer => "lexer error",
            ErrorKind::Helper => "helper error",
            ErrorKind::Parser => "parser error",
        })
    }
}

/// One entry of the error collector.
///
/// `line`, `column` and `source_line` stay empty until
/// [`update_error`](ParserError::update_error) maps the token offset back
/// onto the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub kind: ErrorKind,
    pub token: OwnedToken,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

impl ParserError {
    pub fn new(kind: ErrorKind, token: &Token<'_>, message: impl Into<String>) -> Self {
        Self::detached(kind, token.detach(), message)
    }

    pub fn detached(kind: ErrorKind, token: OwnedToken, message: impl Into<String>) -> Self {
        Self {
            kind,
            token,
            message: message.into(),
            line: 0,
            column: 0,
            source_line: String::new(),
        }
    }

    pub fn syntax(token: &Token<'_>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, token, message)
    }

    /// Error from a generator rejection at `token`.
    pub fn generator(token: &Token<'_>, err: GenError) -> Self {
        let kind = match err {
            GenError::Immutable | GenError::NodeDepthExceeded { .. } => ErrorKind::Parser,
            _ => ErrorKind::Syntax,
        };
        Self::new(kind, token, err.to_string())
    }

    /// Compute the 1-based line and column of the token and capture the
    /// text of that line.
    pub fn update_error(&mut self, source: &str) {
        let offset = self.token.position.min(source.len());
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[offset..]
            .find('\n')
            .map_or(source.len(), |i| offset + i);
        self.line = source[..line_start].matches('\n').count() + 1;
        self.column = source[line_start..offset].chars().count() + 1;
        self.source_line = source[line_start..line_end].trim_end_matches('\r').to_string();
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let help = match self.kind {
            ErrorKind::Token if self.token.kind.is_open_bracket() => {
                vec!["Add the missing closing bracket".to_string()]
            }
            ErrorKind::Symtab => {
                vec!["Register the symbol in a symbol table or declare it with 'var'".to_string()]
            }
            ErrorKind::Numeric => vec!["Check the number format".to_string()],
            ErrorKind::Parser if self.message.contains("depth") => {
                vec!["Reduce nesting or simplify the expression".to_string()]
            }
            _ => vec![],
        };
        Diagnostic {
            severity: Severity::Error,
            message: self.message.clone(),
            span: self.token.span(),
            related: vec![],
            help,
            code: Some(self.kind.code().to_string()),
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if self.line > 0 {
            write!(f, " (line {}, column {})", self.line, self.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {}

impl From<LexError> for ParserError {
    fn from(err: LexError) -> Self {
        let token = OwnedToken {
            kind: TokenKind::Eof,
            text: err.text().to_string(),
            position: err.position(),
        };
        Self::detached(ErrorKind::Lexer, token, err.to_string())
    }
}

impl From<PassError> for ParserError {
    fn from(err: PassError) -> Self {
        Self::detached(ErrorKind::Token, err.token, err.message)
    }
}
