use calyx_core::lexer::TokenKind;
use logos::Logos;
use reedline::{ValidationResult, Validator};

/// Bracket nesting left open at the end of `buffer`.
///
/// Returns `None` when the buffer does not scan, e.g. an unterminated
/// string literal.
pub fn calculate_depth(buffer: &str) -> Option<usize> {
    let mut depth: isize = 0;

    for token in TokenKind::lexer(buffer) {
        match token {
            Ok(kind) if kind.is_open_bracket() => depth += 1,
            Ok(kind) if kind.is_close_bracket() => depth -= 1,
            Ok(_) => {}
            Err(()) => return None,
        }
    }

    Some(depth.max(0) as usize)
}

/// Keeps reading lines while brackets are open or a string is unterminated.
pub struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match calculate_depth(line) {
            Some(0) => ValidationResult::Complete,
            _ => ValidationResult::Incomplete,
        }
    }
}
