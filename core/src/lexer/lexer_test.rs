use super::helpers::*;
use super::*;
use bumpalo::Bump;
use hashbrown::HashMap;
use pretty_assertions::assert_eq;

fn kinds(tokens: &[Token<'_>]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
    tokens.iter().map(|t| t.text).collect()
}

#[test]
fn test_tokenize_operators_and_comments() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, "x := y <=> z # trailing\n/* block */ a != b // end").unwrap();
    use TokenKind::*;
    assert_eq!(
        kinds(&tokens),
        vec![Symbol, Assign, Symbol, Swap, Symbol, Symbol, Ne, Symbol]
    );
}

#[test]
fn test_tokenize_numbers_and_special_functions() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, "1.5e3 .25 $f07 [*]").unwrap();
    assert_eq!(texts(&tokens), vec!["1.5e3", ".25", "$f07", "[*]"]);
    assert_eq!(tokens[3].kind, TokenKind::MultiSwitch);
}

#[test]
fn test_tokenize_unescapes_strings() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, r"'it\'s' 'a\\b\n'").unwrap();
    assert_eq!(texts(&tokens), vec!["it's", "a\\b\n"]);
    assert_eq!(tokens[1].position, 8);
}

#[test]
fn test_tokenize_errors() {
    let bump = Bump::new();
    assert!(matches!(
        tokenize(&bump, "1 + 'abc"),
        Err(LexError::UnterminatedString { position: 4 })
    ));
    assert!(matches!(
        tokenize(&bump, "1 @ 2"),
        Err(LexError::InvalidToken { position: 2, .. })
    ));
    assert!(matches!(
        tokenize(&bump, r"'\q'"),
        Err(LexError::InvalidEscape { escape: 'q', .. })
    ));
}

#[test]
fn test_replace_symbols() {
    let bump = Bump::new();
    let mut tokens = tokenize(&bump, "true + false + rate").unwrap();
    let mut replacements = HashMap::new();
    replacements.insert("rate".to_string(), "0.25".to_string());
    assert_eq!(replace_symbols(&bump, &mut tokens, &replacements), 3);
    assert_eq!(texts(&tokens), vec!["1", "+", "0", "+", "0.25"]);
    assert!(tokens.iter().step_by(2).all(|t| t.kind == TokenKind::Number));
}

#[test]
fn test_join_operators() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, "x : = 1; y < = 2; a - - b; c + - d; p <= > q; m < > n").unwrap();
    let joined = join_operators(tokens);
    assert_eq!(
        texts(&joined),
        vec![
            "x", ":=", "1", ";", "y", "<=", "2", ";", "a", "+", "b", ";", "c", "-", "d", ";",
            "p", "<=>", "q", ";", "m", "!=", "n"
        ]
    );
}

#[test]
fn test_implied_multiplication() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, "2x + 3(y) + (a)b + (c)4").unwrap();
    let tokens = insert_implied_multiplication(tokens);
    assert_eq!(
        texts(&tokens).concat(),
        "2*x+3*(y)+(a)*b+(c)*4".to_string()
    );
}

#[test]
fn test_implied_multiplication_skips_keywords_and_headers() {
    let bump = Bump::new();
    let tokens = tokenize(&bump, "if (x > 1) y := 2 else 3; 1 and 0").unwrap();
    let tokens = insert_implied_multiplication(tokens);
    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Mul));
}

#[test]
fn test_bracket_checker() {
    let bump = Bump::new();
    assert!(check_brackets(&tokenize(&bump, "((1) + [2]) * {3}").unwrap()).is_empty());

    let errors = check_brackets(&tokenize(&bump, "(1 + 2]").unwrap());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].token.text, "]");

    let errors = check_brackets(&tokenize(&bump, "((1 + 2)").unwrap());
    assert_eq!(errors[0].token.position, 0);
    assert_eq!(errors[0].kind, PassKind::Bracket);
}

#[test]
fn test_sequence_checker() {
    let bump = Bump::new();
    assert!(check_sequences(&tokenize(&bump, "1 + -2 * (3)").unwrap()).is_empty());
    let errors = check_sequences(&tokenize(&bump, "1 * / 2 + 3 4").unwrap());
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].token.text, "/");
    assert_eq!(errors[1].token.text, "4");
}

#[test]
fn test_numeric_checker() {
    let bump = Bump::new();
    let errors = check_numerics(&tokenize(&bump, "1e + 2.5e-3").unwrap());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].token.text, "1e");
    assert_eq!(errors[0].kind, PassKind::Numeric);
}

#[test]
fn test_stream_insert_front() {
    let bump = Bump::new();
    let mut stream = TokenStream::new(tokenize(&bump, "(a)(b)").unwrap(), 6);
    for _ in 0..3 {
        stream.advance();
    }
    stream.insert_front(TokenKind::Mul);
    assert!(stream.is(TokenKind::Mul));
    assert_eq!(stream.peek().kind, TokenKind::LParen);
    assert_eq!(stream.peek_nth(10).kind, TokenKind::Eof);
}
