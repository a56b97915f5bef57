mod cases;

use calyx::{AssignmentOperators, ErrorKind, Settings};

test_case!(
    undefined_symbol,
    input: "x + nope",
    error: ErrorKind::Symtab,
    message: "undefined symbol 'nope'",
);

test_case!(
    recursion_guard,
    input: "((((((((((((1))))))))))))",
    settings: Settings::default().with_max_stack_depth(10),
    error: ErrorKind::Parser,
);

test_case!(
    immutable_assignment,
    input: "k := 1",
    error: ErrorKind::Parser,
    message: "immutable",
);

test_case!(
    disabled_assignment,
    input: "x := 1",
    settings: Settings::default().disable_assignment_operators(AssignmentOperators::ASSIGN),
    error: ErrorKind::Syntax,
    message: "disabled",
);

test_case!(
    compound_assignment_stays_enabled,
    input: "x += 1",
    settings: Settings::default().disable_assignment_operators(AssignmentOperators::ASSIGN),
    value: 3.0,
);

test_case!(
    empty_input,
    input: "   ",
    error: ErrorKind::Syntax,
    message: "empty expression",
);

test_case!(
    trailing_tokens,
    input: "1 )",
    error: ErrorKind::Token,
);

test_case!(
    wrong_arity,
    input: "sin(1, 2)",
    error: ErrorKind::Syntax,
    message: "'sin' expects 1 argument, found 2",
);

test_case!(
    redeclaration,
    input: "var a := 1; var a := 2",
    message: "already declared",
);

test_case!(
    reserved_name,
    input: "var for := 1",
    message: "reserved",
);

test_case!(
    declared_name_in_table,
    input: "var x := 1",
    message: "already defined",
);

#[test]
fn error_position_and_render() {
    let mut case = cases::Case::new("1 +\n  missing");
    assert!(!case.compiled());
    let err = &case.parser.errors()[0];
    assert_eq!((err.line, err.column), (2, 3));

    let mut expression = calyx::Expression::new();
    let err = calyx::Parser::default()
        .compile_checked("1 +\n  missing", &mut expression)
        .unwrap_err();
    let rendered = calyx::render_error_to_string_no_color(&err);
    assert!(rendered.contains("undefined symbol 'missing'"), "{rendered}");
}

#[test]
fn failed_compile_releases_everything() {
    let mut case = cases::Case::new("x + (y * ");
    assert!(!case.compiled());
    assert_eq!(case.parser.leaked_nodes(), 0);
    assert_eq!(case.parser.live_nodes(), 0);
    assert!(!case.expression.is_compiled());
    assert!(case.expression.value().is_nan());
}

#[test]
fn every_scanner_fault_is_reported() {
    let mut case = cases::Case::new("(1 2");
    assert!(!case.compiled());
    let parser = &case.parser;
    assert_eq!(parser.error_count(), 2);
    assert_eq!(parser.error_count(), parser.errors().len());
    for index in 0..parser.error_count() {
        let err = parser.get_error(index).unwrap();
        assert!(!err.message.is_empty(), "error {index} has no text");
        assert_eq!(err.kind, ErrorKind::Token, "error {index}: {}", err.message);
    }
    assert!(parser.get_error(parser.error_count()).is_none());
}

#[test]
fn reenabled_assignment_compiles_and_assigns() {
    let disabled = Settings::default().disable_assignment_operators(AssignmentOperators::ASSIGN);
    let mut case = cases::Case::new("x := 1").with_settings(disabled);
    assert!(!case.compiled());

    let enabled = Settings::default()
        .disable_assignment_operators(AssignmentOperators::ASSIGN)
        .enable_assignment_operators(AssignmentOperators::ASSIGN);
    let mut case = cases::Case::new("x := 1").with_settings(enabled);
    assert_eq!(case.value(), 1.0);
    assert_eq!(case.table.value("x"), Some(1.0));
}
