use super::*;
use crate::api::{AssignmentOperators, ControlStructures, Value};
use crate::runtime::IterationLimit;
use crate::symbols::{NativeFunction, SymbolTable};
use crate::test_utils::init_test_logging;
use pretty_assertions::assert_eq;

struct Fixture {
    parser: Parser,
    expression: Expression,
    table: SymbolTable,
}

impl Fixture {
    fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    fn with_settings(settings: Settings) -> Self {
        let table = SymbolTable::new();
        let mut expression = Expression::new();
        expression.register_symbol_table(table.clone());
        Self {
            parser: Parser::new(settings),
            expression,
            table,
        }
    }

    fn compile(&mut self, source: &str) -> bool {
        self.parser.compile(source, &mut self.expression)
    }

    fn value(&mut self, source: &str) -> f64 {
        assert!(self.compile(source), "{source}: {}", self.parser.error());
        self.expression.value()
    }

    fn first_error(&mut self, source: &str) -> ParserError {
        assert!(!self.compile(source), "{source} compiled");
        assert!(!self.expression.is_compiled());
        assert_eq!(self.parser.leaked_nodes(), 0, "{source} leaked nodes");
        assert_eq!(self.parser.live_nodes(), 0);
        self.parser.errors()[0].clone()
    }
}

#[test]
fn test_constant_expression_is_a_single_literal() {
    init_test_logging();
    let mut f = Fixture::new();
    assert_eq!(f.value("(2*3)+4"), 10.0);
    assert_eq!(f.expression.node_count(), 1);
}

#[test]
fn test_pure_statements_are_pruned() {
    let mut f = Fixture::new();
    f.table.add_variable("x", 1.0).unwrap();
    assert_eq!(f.value("x + 1; x * 2; 3"), 3.0);
    assert_eq!(f.expression.node_count(), 1);
}

#[test]
fn test_scoped_locals() {
    let mut f = Fixture::new();
    assert_eq!(f.value("{ var x := 1; x } + { var x := 2; x }"), 3.0);

    let err = f.first_error("{ var y := 1; }; y");
    assert_eq!(err.kind, ErrorKind::Symtab);
    assert_eq!(err.message, "undefined symbol 'y'");
}

#[test]
fn test_compiled_expression_owns_its_locals() {
    let mut f = Fixture::new();
    assert_eq!(f.value("var a := 1; var b := 2; a + b"), 3.0);
    assert_eq!(f.expression.local_count(), 2);

    f.expression.release();
    assert_eq!(f.expression.local_count(), 0);
    assert!(!f.expression.is_compiled());
}

#[test]
fn test_redeclaration_in_same_scope_fails() {
    let mut f = Fixture::new();
    let err = f.first_error("var x := 1; var x := 2");
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(err.message.contains("already declared"), "{}", err.message);
}

#[test]
fn test_declaration_name_checks() {
    let mut f = Fixture::new();
    f.table.add_variable("x", 0.0).unwrap();
    assert!(f.first_error("var x := 1").message.contains("already defined"));
    assert!(f.first_error("var while := 1").message.contains("reserved"));
    assert!(f.first_error("var sin := 1").message.contains("reserved"));
}

#[test]
fn test_recursion_guard() {
    let mut f = Fixture::with_settings(Settings::default().with_max_stack_depth(10));
    let nested = format!("{}1{}", "(".repeat(12), ")".repeat(12));
    let err = f.first_error(&nested);
    assert_eq!(err.kind, ErrorKind::Parser);
    assert_eq!(f.parser.leaked_nodes(), 0);

    assert_eq!(f.value("((((1))))"), 1.0);
}

#[test]
fn test_immutable_table_rejects_assignment() {
    let table = SymbolTable::immutable();
    table.add_variable("x", 2.0).unwrap();
    let mut expression = Expression::new();
    expression.register_symbol_table(table);
    let mut parser = Parser::default();

    assert!(parser.compile("x + 1", &mut expression));
    assert_eq!(expression.value(), 3.0);

    assert!(!parser.compile("x := 5", &mut expression));
    assert_eq!(parser.errors()[0].kind, ErrorKind::Parser);
    assert!(!parser.compile("x += 5", &mut expression));
    assert_eq!(parser.leaked_nodes(), 0);
    assert_eq!(parser.live_nodes(), 0);
}

#[test]
fn test_disabled_assignment_operator() {
    let settings = Settings::default().disable_assignment_operators(AssignmentOperators::ASSIGN);
    let mut f = Fixture::with_settings(settings);
    f.table.add_variable("x", 1.0).unwrap();

    let err = f.first_error("x := 1");
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(f.value("x += 1; x"), 2.0);
    // Declarations initialise their local regardless.
    assert_eq!(f.value("var y := 3; y"), 3.0);
}

#[test]
fn test_disabled_features() {
    let settings = Settings::default()
        .disable_control_structures(ControlStructures::FOR)
        .disable_base_function("sin")
        .with_vardef(false);
    let mut f = Fixture::with_settings(settings);
    assert!(
        f.first_error("for (x := 0; x < 1; x += 1) { }")
            .message
            .contains("disabled")
    );
    assert!(f.first_error("sin(1)").message.contains("disabled"));
    assert!(f.first_error("var z := 1").message.contains("disabled"));
    assert_eq!(f.value("cos(0)"), 1.0);
}

#[test]
fn test_invalid_assignment_target() {
    let mut f = Fixture::new();
    f.table.add_variable("x", 1.0).unwrap();
    let err = f.first_error("x + 1 := 2");
    assert_eq!(err.message, "invalid left-hand side for ':='");
}

#[test]
fn test_auto_variables_resolver() {
    let mut f = Fixture::new();
    f.parser.enable_unknown_symbol_resolver(Rc::new(AutoVariables));
    assert_eq!(f.value("z + 1"), 1.0);
    assert_eq!(f.table.value("z"), Some(0.0));

    f.parser.disable_unknown_symbol_resolver();
    assert_eq!(f.first_error("w + 1").kind, ErrorKind::Symtab);
}

struct Constants;

impl UnknownSymbolResolver for Constants {
    fn resolve(&self, name: &str) -> Result<(UsrSymbolType, f64), String> {
        match name {
            "answer" => Ok((UsrSymbolType::Constant, 42.0)),
            _ => Err(format!("no value for '{name}'")),
        }
    }
}

#[test]
fn test_resolver_constants_and_failures() {
    let mut f = Fixture::new();
    f.parser.enable_unknown_symbol_resolver(Rc::new(Constants));
    assert_eq!(f.value("answer / 2"), 21.0);
    assert!(f.table.is_constant("answer"));
    assert_eq!(f.expression.node_count(), 1);

    let err = f.first_error("question");
    assert_eq!(err.kind, ErrorKind::Symtab);
    assert!(err.message.contains("no value for 'question'"), "{}", err.message);
}

struct Vectors;

impl UnknownSymbolResolver for Vectors {
    fn mode(&self) -> ResolverMode {
        ResolverMode::Extended
    }

    fn resolve_extended(&self, name: &str, table: &SymbolTable) -> Result<bool, String> {
        if !name.starts_with("vec_") {
            return Ok(false);
        }
        table
            .add_vector(name, &[1.0, 2.0, 3.0])
            .map(|_| true)
            .map_err(|err| err.to_string())
    }
}

#[test]
fn test_extended_resolver() {
    let mut f = Fixture::new();
    f.parser.enable_unknown_symbol_resolver(Rc::new(Vectors));
    assert_eq!(f.value("sum(vec_a) + vec_a[]"), 9.0);
    assert_eq!(f.first_error("other").kind, ErrorKind::Symtab);
}

#[test]
fn test_dependent_entities() {
    let mut f = Fixture::with_settings(Settings::default().collect_all());
    f.table.add_variable("x", 0.0).unwrap();
    f.table.add_variable("y", 1.0).unwrap();
    f.table.add_vector("v", &[1.0, 2.0]).unwrap();
    f.table
        .add_function("twice", NativeFunction::new(1, |a: &[f64]| a[0] * 2.0).into_rc())
        .unwrap();

    assert!(f.compile("var t := 1; x := twice(y) + t; v[0] := x; v[1] <=> t"));
    let entities = f.parser.dependent_entities();
    assert_eq!(
        entities.symbols(),
        vec![
            ("t".to_string(), SymbolType::LocalVariable),
            ("twice".to_string(), SymbolType::Function),
            ("v".to_string(), SymbolType::Vector),
            ("x".to_string(), SymbolType::Variable),
            ("y".to_string(), SymbolType::Variable),
        ]
    );
    assert_eq!(
        entities.assignments(),
        vec![
            ("t".to_string(), SymbolType::LocalVariable),
            ("v".to_string(), SymbolType::Vector),
            ("x".to_string(), SymbolType::Variable),
        ]
    );
}

#[test]
fn test_collection_is_opt_in() {
    let mut f = Fixture::new();
    f.table.add_variable("x", 0.0).unwrap();
    assert!(f.compile("x := x + 1"));
    assert!(f.parser.dependent_entities().symbols().is_empty());
    assert!(f.parser.dependent_entities().assignments().is_empty());
}

#[test]
fn test_switch() {
    let mut f = Fixture::new();
    let x = f.table.add_variable("x", 5.0).unwrap();
    assert!(f.compile("switch { case x < 0: -1; case x > 0: 1; default: 0; }"));
    assert_eq!(f.expression.value(), 1.0);
    x.set(-2.0);
    assert_eq!(f.expression.value(), -1.0);
    x.set(0.0);
    assert_eq!(f.expression.value(), 0.0);

    assert_eq!(f.first_error("switch { case x: 1; }").kind, ErrorKind::Syntax);
}

#[test]
fn test_multi_switch_runs_every_true_case() {
    let mut f = Fixture::new();
    f.table.add_variable("n", 0.0).unwrap();
    assert_eq!(
        f.value("[*] { case 1 < 2: n += 1; case 1 > 2: n += 10; case 2 > 1: n += 100; }; n"),
        101.0
    );
}

#[test]
fn test_loops() {
    let mut f = Fixture::new();
    assert_eq!(
        f.value("var s := 0; for (var i := 0; i < 5; i += 1) { s += i; }; s"),
        10.0
    );
    assert_eq!(f.value("var n := 0; while (n < 10) { n += 1; }; n"), 10.0);
    assert_eq!(f.value("var n := 0; repeat n += 3; until (n >= 7); n"), 9.0);

    let err = f.first_error("for (var i := 0; i < 3; i += 1) { }; i");
    assert_eq!(err.kind, ErrorKind::Symtab);
}

#[test]
fn test_break_and_continue_outside_loops() {
    let mut f = Fixture::new();
    assert!(f.first_error("break").message.contains("outside of a loop"));
    assert!(f.first_error("1 + continue").message.contains("outside of a loop"));
}

#[test]
fn test_loop_runtime_check() {
    let mut f = Fixture::new();
    f.table.add_variable("x", 0.0).unwrap();
    f.parser
        .register_loop_runtime_check(Rc::new(IterationLimit::new(100)));
    assert!(f.compile("while (1) { x += 1; }"));
    assert!(matches!(
        f.expression.evaluate(),
        Err(Error::ResourceExceeded(_))
    ));
    assert!(f.expression.value().is_nan());
}

#[test]
fn test_return_statement() {
    let mut f = Fixture::new();
    let x = f.table.add_variable("x", 5.0).unwrap();
    assert!(f.compile("if (x > 1) return [x, 'abc']; x + 1"));
    assert_eq!(
        f.parser.dependent_entities().return_signatures(),
        &["TS".to_string()]
    );

    f.expression.value();
    assert!(f.expression.return_invoked());
    assert_eq!(
        f.expression.results(),
        vec![Value::Scalar(5.0), Value::String("abc".to_string())]
    );

    x.set(0.0);
    assert_eq!(f.expression.value(), 1.0);
    assert!(!f.expression.return_invoked());

    assert!(f.first_error("return [return [1]]").message.contains("nested"));
}

#[test]
fn test_string_ranges() {
    let mut f = Fixture::new();
    f.table.add_string("s", "hello").unwrap();
    assert!(f.compile("'hello'[1:3]"));
    assert_eq!(
        f.expression.evaluate().unwrap(),
        Value::String("ell".to_string())
    );
    assert!(f.compile("s[:1] + s[3:]"));
    assert_eq!(
        f.expression.evaluate().unwrap(),
        Value::String("helo".to_string())
    );
    assert_eq!(f.value("s[]"), 5.0);

    let err = f.first_error("'abc'[2:1]");
    assert_eq!(err.message, "range lower bound 2 exceeds upper bound 1");
}

#[test]
fn test_vector_access() {
    let mut f = Fixture::new();
    f.table.add_vector("v", &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(f.value("v[1]"), 2.0);
    assert_eq!(f.value("v[]"), 3.0);
    assert_eq!(f.value("sum(v)"), 6.0);
    assert_eq!(f.value("sum(v[1:2])"), 5.0);
    assert!(f.first_error("v[5]").message.contains("out of bounds"));
}

#[test]
fn test_vector_declarations() {
    let mut f = Fixture::new();
    assert_eq!(f.value("var w[3] := {1, 2}; w[0] + w[1] + w[2]"), 3.0);
    assert_eq!(f.value("var w[4] := 2; sum(w)"), 8.0);
    assert_eq!(f.value("var w[2]; w[1]"), 0.0);
    assert!(f.first_error("var w[2] := {1, 2, 3}").message.contains("out of bounds"));
    assert!(f.first_error("var w[0]").message.contains("between 1 and 2e9"));
}

#[test]
fn test_swap() {
    let mut f = Fixture::new();
    let x = f.table.add_variable("x", 1.0).unwrap();
    let y = f.table.add_variable("y", 2.0).unwrap();
    assert!(f.compile("x <=> y"));
    f.expression.value();
    assert_eq!((x.get(), y.get()), (2.0, 1.0));

    assert!(f.compile("swap(x, y)"));
    f.expression.value();
    assert_eq!((x.get(), y.get()), (1.0, 2.0));

    assert_eq!(f.first_error("swap(1, y)").kind, ErrorKind::Syntax);
}

#[test]
fn test_host_functions() {
    let mut f = Fixture::new();
    f.table
        .add_function("double", NativeFunction::new(1, |a: &[f64]| a[0] * 2.0).into_rc())
        .unwrap();
    assert_eq!(f.value("double(4) + 1"), 9.0);
    let err = f.first_error("double(1, 2)");
    assert_eq!(err.message, "'double' expects 1 argument, found 2");
}

#[test]
fn test_error_position() {
    let mut f = Fixture::new();
    let err = f.first_error("1 +\n  missing");
    assert_eq!((err.line, err.column), (2, 3));
    assert_eq!(err.source_line, "  missing");
    assert_eq!(err.to_string(), "symbol error: undefined symbol 'missing' (line 2, column 3)");
}

#[test]
fn test_token_scanners_report_every_fault() {
    let mut f = Fixture::new();
    assert!(!f.compile("(1 2"));
    assert_eq!(f.parser.error_count(), 2);
    assert!(f.parser.errors().iter().all(|e| e.kind == ErrorKind::Token));
}

#[test]
fn test_empty_and_trailing_input() {
    let mut f = Fixture::new();
    assert_eq!(f.first_error("   ").message, "empty expression");
    assert_eq!(f.first_error("1 )").kind, ErrorKind::Token);
    assert_eq!(f.value("1;"), 1.0);
}

#[test]
fn test_failed_compile_clears_expression() {
    let mut f = Fixture::new();
    assert_eq!(f.value("1 + 1"), 2.0);
    assert!(!f.compile("1 +"));
    assert!(!f.expression.is_compiled());
    assert!(f.expression.value().is_nan());
    assert!(f.parser.compile_checked("1 +", &mut f.expression).is_err());
}
