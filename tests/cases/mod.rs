#![allow(dead_code)]

use calyx::{ErrorKind, Expression, Parser, Settings, SymbolTable, Value};
use once_cell::sync::Lazy;

/// Scalars every case can read and write.
pub static VARIABLES: Lazy<Vec<(&'static str, f64)>> =
    Lazy::new(|| vec![("x", 2.0), ("y", 3.0), ("z", 0.0)]);

/// Read-only symbols, registered in an immutable table.
pub static CONSTANTS: Lazy<Vec<(&'static str, f64)>> = Lazy::new(|| vec![("k", 10.0)]);

/// One compile of `input` against the standard environment:
///
/// - mutable: `x = 2`, `y = 3`, `z = 0`, `v = {1, 2, 3}`, `w = {4, 5, 6}`,
///   `s = 'hello'`
/// - immutable: `k = 10`, `kv = {7, 8}`
pub struct Case {
    pub parser: Parser,
    pub expression: Expression,
    pub table: SymbolTable,
    input: &'static str,
    compiled: Option<bool>,
}

impl Case {
    pub fn new(input: &'static str) -> Self {
        let table = SymbolTable::new();
        for (name, value) in VARIABLES.iter() {
            table.add_variable(name, *value).unwrap();
        }
        table.add_vector("v", &[1.0, 2.0, 3.0]).unwrap();
        table.add_vector("w", &[4.0, 5.0, 6.0]).unwrap();
        table.add_string("s", "hello").unwrap();

        let fixed = SymbolTable::immutable();
        for (name, value) in CONSTANTS.iter() {
            fixed.add_variable(name, *value).unwrap();
        }
        fixed.add_vector("kv", &[7.0, 8.0]).unwrap();

        let mut expression = Expression::new();
        expression.register_symbol_table(table.clone());
        expression.register_symbol_table(fixed);
        Self {
            parser: Parser::new(Settings::default()),
            expression,
            table,
            input,
            compiled: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.parser = Parser::new(settings);
        self.compiled = None;
        self
    }

    pub fn input(&self) -> &'static str {
        self.input
    }

    /// Compile once; later calls reuse the outcome.
    pub fn compiled(&mut self) -> bool {
        if self.compiled.is_none() {
            let ok = self.parser.compile(self.input, &mut self.expression);
            self.compiled = Some(ok);
        }
        self.compiled == Some(true)
    }

    fn require_compiled(&mut self) {
        assert!(
            self.compiled(),
            "{:?} failed to compile: {}",
            self.input,
            self.parser.error()
        );
    }

    pub fn value(&mut self) -> f64 {
        self.require_compiled();
        self.expression.value()
    }

    pub fn evaluate(&mut self) -> Value {
        self.require_compiled();
        self.expression
            .evaluate()
            .unwrap_or_else(|err| panic!("{:?} failed to evaluate: {err}", self.input))
    }

    pub fn error_kinds(&mut self) -> Vec<ErrorKind> {
        assert!(!self.compiled(), "{:?} compiled", self.input);
        assert_eq!(self.parser.leaked_nodes(), 0, "{:?} leaked nodes", self.input);
        assert_eq!(self.parser.live_nodes(), 0);
        self.parser.errors().iter().map(|e| e.kind).collect()
    }

    pub fn first_message(&mut self) -> String {
        assert!(!self.compiled(), "{:?} compiled", self.input);
        self.parser.error()
    }
}

/// Declare a test compiling `input` against the standard environment and
/// checking each listed expectation in order:
///
/// - `settings: Settings` compile with these settings; must come first
/// - `value: f64` scalar result (NaN matches NaN)
/// - `nodes: usize` live nodes of the compiled tree
/// - `string: &str` / `vector: &[f64]` typed result
/// - `error: ErrorKind` kind of the first error
/// - `errors: usize` number of errors
/// - `message: &str` text contained in the first error
#[macro_export]
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr
        $(, $field:ident : $expected:expr)*
        $(,)?
    ) => {
        #[test]
        fn $name() {
            #[allow(unused_mut)]
            let mut case = $crate::cases::Case::new($input);
            $( $crate::test_case!(@check case, $field, $expected); )*
        }
    };

    (@check $case:ident, settings, $settings:expr) => {{
        $case = $case.with_settings($settings);
    }};
    (@check $case:ident, value, $expected:expr) => {{
        let expected: f64 = $expected;
        let actual = $case.value();
        assert!(
            actual == expected || (actual.is_nan() && expected.is_nan()),
            "{:?}: expected {}, got {}",
            $case.input(),
            expected,
            actual
        );
    }};
    (@check $case:ident, nodes, $expected:expr) => {{
        assert!($case.compiled(), "{:?}: {}", $case.input(), $case.parser.error());
        assert_eq!($case.expression.node_count(), $expected, "{:?}", $case.input());
    }};
    (@check $case:ident, string, $expected:expr) => {{
        pretty_assertions::assert_eq!($case.evaluate(), calyx::Value::String($expected.to_string()));
    }};
    (@check $case:ident, vector, $expected:expr) => {{
        let expected: &[f64] = $expected;
        pretty_assertions::assert_eq!($case.evaluate(), calyx::Value::Vector(expected.to_vec()));
    }};
    (@check $case:ident, error, $kind:expr) => {{
        assert_eq!($case.error_kinds().first().copied(), Some($kind), "{:?}", $case.input());
    }};
    (@check $case:ident, errors, $count:expr) => {{
        assert_eq!($case.error_kinds().len(), $count, "{:?}", $case.input());
    }};
    (@check $case:ident, message, $text:expr) => {{
        let message = $case.first_message();
        assert!(message.contains($text), "{:?}: {}", $case.input(), message);
    }};
}
