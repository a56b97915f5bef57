use calyx_core::evaluator::{VarArgOp, base_function};
use calyx_core::lexer::TokenKind;
use calyx_core::symbols::RESERVED_WORDS;
use logos::Logos;
use nu_ansi_term::{Color, Style};
use reedline::StyledText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Plain,
    Keyword,
    Number,
    String,
    Function,
    Variable,
    Operator,
    Error,
}

impl Class {
    fn color(self) -> Color {
        match self {
            Class::Plain => Color::White,
            Class::Keyword => Color::Magenta,
            Class::Number => Color::Cyan,
            Class::String => Color::Green,
            Class::Function => Color::Blue,
            Class::Variable => Color::Red,
            Class::Operator => Color::Yellow,
            Class::Error => Color::LightRed,
        }
    }
}

fn classify(kind: TokenKind, text: &str) -> Class {
    match kind {
        TokenKind::Number => Class::Number,
        TokenKind::String => Class::String,
        TokenKind::Symbol if RESERVED_WORDS.contains(&text) => Class::Keyword,
        TokenKind::Symbol
            if base_function(text).is_some()
                || VarArgOp::from_name(text).is_some()
                || text.starts_with("$f") =>
        {
            Class::Function
        }
        TokenKind::Symbol => Class::Variable,
        TokenKind::MultiSwitch => Class::Keyword,
        kind if kind.is_open_bracket() || kind.is_close_bracket() => Class::Plain,
        TokenKind::Semicolon | TokenKind::Comma | TokenKind::Colon => Class::Plain,
        _ => Class::Operator,
    }
}

/// Colors REPL input by token class.
pub struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let mut lexer = TokenKind::lexer(line);
        let mut last_end = 0;

        while let Some(token) = lexer.next() {
            let span = lexer.span();
            // Skipped whitespace and comments between tokens.
            if span.start > last_end {
                output.push((
                    Style::new().fg(Color::DarkGray),
                    line[last_end..span.start].to_string(),
                ));
            }
            let class = match token {
                Ok(kind) => classify(kind, lexer.slice()),
                Err(()) => Class::Error,
            };
            output.push((Style::new().fg(class.color()), lexer.slice().to_string()));
            last_end = span.end;
        }

        if last_end < line.len() {
            output.push((
                Style::new().fg(Color::DarkGray),
                line[last_end..].to_string(),
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(TokenKind::Symbol, "while"), Class::Keyword);
        assert_eq!(classify(TokenKind::Symbol, "sin"), Class::Function);
        assert_eq!(classify(TokenKind::Symbol, "avg"), Class::Function);
        assert_eq!(classify(TokenKind::Symbol, "x"), Class::Variable);
        assert_eq!(classify(TokenKind::Assign, ":="), Class::Operator);
        assert_eq!(classify(TokenKind::LParen, "("), Class::Plain);
    }

    #[test]
    fn test_highlight_preserves_text() {
        use reedline::Highlighter as _;

        let line = "x := sin(1) # note";
        let styled = Highlighter.highlight(line, 0);
        let text: String = styled.buffer.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(text, line);
    }
}
