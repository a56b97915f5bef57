use crate::api::{Expression, Settings};
use crate::parser::Parser;
use crate::symbols::SymbolTable;

// Precedence is tested by comparing an expression against explicitly
// parenthesized forms. Variables hold distinct primes so that different
// groupings evaluate to different values.
fn value(source: &str) -> f64 {
    let table = SymbolTable::new();
    for (name, v) in [("a", 2.0), ("b", 3.0), ("c", 5.0), ("d", 7.0), ("e", 11.0), ("f", 13.0)] {
        table.add_variable(name, v).unwrap();
    }
    let mut expression = Expression::new();
    expression.register_symbol_table(table);
    let mut parser = Parser::new(Settings::default());
    assert!(
        parser.compile(source, &mut expression),
        "Expression parsing failed: {}\n{}",
        source,
        parser.error()
    );
    expression.value()
}

fn same(left: &str, right: &str) {
    let (l, r) = (value(left), value(right));
    assert!(
        l == r || (l.is_nan() && r.is_nan()),
        "'{left}' = {l} but '{right}' = {r}"
    );
}

#[test]
fn test_addition_vs_subtraction() {
    same("a + b - c", "(a + b) - c");
    same("a - b + c", "(a - b) + c");
    same("a + b - c + d - e + f", "((((a + b) - c) + d) - e) + f");
    assert_ne!(value("a - b + c"), value("a - (b + c)"));
}

#[test]
fn test_multiplication_vs_division() {
    same("a * b / c", "(a * b) / c");
    same("a / b * c", "(a / b) * c");
    same("a * b / c * d / e * f", "((((a * b) / c) * d) / e) * f");
    assert_ne!(value("a / b * c"), value("a / (b * c)"));
}

#[test]
fn test_addition_vs_multiplication() {
    same("a + b * c", "a + (b * c)");
    same("a * b + c", "(a * b) + c");
    assert_eq!(value("2 + 3 * 4"), 14.0);
}

#[test]
fn test_modulo_binds_like_multiplication() {
    same("f % c * b", "(f % c) * b");
    same("a + f % c", "a + (f % c)");
}

#[test]
fn test_and_vs_or() {
    same("1 and 0 or 1", "(1 and 0) or 1");
    same("1 or 0 and 0", "1 or (0 and 0)");
    assert_eq!(value("1 or 0 and 0"), 1.0);
}

#[test]
fn test_xor_shares_the_or_level() {
    same("1 or 1 xor 1", "(1 or 1) xor 1");
    same("1 xor 1 or 1", "(1 xor 1) or 1");
    assert_eq!(value("1 or 1 xor 1"), 0.0);
    same("0 xnor 0 nor 1", "(0 xnor 0) nor 1");
    same("1 xor 1 and 0", "1 xor (1 and 0)");
    assert_eq!(value("1 xor 1 and 0"), 1.0);
}

#[test]
fn test_comparison_vs_arithmetic() {
    same("a + b < c + d", "(a + b) < (c + d)");
    same("a * b == b * a", "(a * b) == (b * a)");
    assert_eq!(value("a + b == c"), 1.0);
}

#[test]
fn test_comparison_vs_logic() {
    same("a < b and c > d", "(a < b) and (c > d)");
    assert_eq!(value("a < b and c < d"), 1.0);
}

#[test]
fn test_unary_vs_binary() {
    same("--a", "-(-a)");
    same("-a + b", "(-a) + b");
    same("a + -b", "a + (-b)");
    same("a * -b", "a * (-b)");
}

#[test]
fn test_unary_minus_vs_exponentiation() {
    // The operand of a prefix operator stops before `* / %` but takes `^`.
    same("-a ^ 2", "-(a ^ 2)");
    assert_eq!(value("-a ^ 2"), -4.0);
    same("-a * b", "(-a) * b");
}

#[test]
fn test_exponentiation() {
    same("a ^ b ^ c", "a ^ (b ^ c)");
    same("2 ^ 3 ^ 2", "2 ^ (3 ^ 2)");
    assert_eq!(value("2 ^ 3 ^ 2"), 512.0);
}

#[test]
fn test_exponentiation_vs_multiplication() {
    same("a * b ^ c", "a * (b ^ c)");
    same("a ^ b * c", "(a ^ b) * c");
}

#[test]
fn test_ternary_is_loosest() {
    same("a < b ? c + d : e", "(a < b) ? (c + d) : e");
    same("a > b ? c : d > e ? f : a", "a > b ? c : (d > e ? f : a)");
    assert_eq!(value("a > b ? c : d > e ? f : a"), 2.0);
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(value("a := b := 4; a + b"), 8.0);
    assert_eq!(value("a += b * 2; a"), 8.0);
}

#[test]
fn test_implied_multiplication() {
    same("2a", "2 * a");
    same("2(a + 1)", "2 * (a + 1)");
    same("(a + 1)(b + 1)", "(a + 1) * (b + 1)");
    same("a(b)", "a * b");
}

#[test]
fn test_statement_value_is_last() {
    assert_eq!(value("a; b; c"), 5.0);
    assert_eq!(value("{ a + 1 } + 1"), 4.0);
}
