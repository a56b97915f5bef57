//! Operator tags and their numeric kernels.
//!
//! All kernels follow IEEE 754 semantics: they produce `inf`/`NaN` rather
//! than failing.

use lazy_static::lazy_static;
use hashbrown::HashMap;
use std::fmt;

/// Every operator and base function the generator can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Comparison
    Lt,
    Lte,
    Eq,
    Ne,
    Gte,
    Gt,
    // Logic
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Not,
    // String-only
    In,
    Like,
    Ilike,
    // Assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    // Unary
    Neg,
    Pos,
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Ceil,
    Cos,
    Cosh,
    Cot,
    Csc,
    Deg2Grad,
    Deg2Rad,
    Erf,
    Erfc,
    Exp,
    Expm1,
    Floor,
    Frac,
    Grad2Deg,
    Log,
    Log10,
    Log1p,
    Log2,
    Ncdf,
    Rad2Deg,
    Round,
    Sec,
    Sgn,
    Sin,
    Sinc,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Trunc,
    // Binary functions
    Atan2,
    Hypot,
    Logn,
    Root,
    Roundn,
    Equal,
    Shl,
    Shr,
    // Ternary functions
    Clamp,
    Iclamp,
    Inrange,
}

impl Operator {
    pub fn is_arithmetic(self) -> bool {
        use Operator::*;
        matches!(self, Add | Sub | Mul | Div | Mod | Pow)
    }

    pub fn is_comparison(self) -> bool {
        use Operator::*;
        matches!(self, Lt | Lte | Eq | Ne | Gte | Gt)
    }

    pub fn is_logic(self) -> bool {
        use Operator::*;
        matches!(self, And | Nand | Or | Nor | Xor | Xnor)
    }

    pub fn is_string_only(self) -> bool {
        matches!(self, Operator::In | Operator::Like | Operator::Ilike)
    }

    pub fn is_assignment(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Assign | AddAssign | SubAssign | MulAssign | DivAssign | ModAssign
        )
    }

    /// The arithmetic operator a compound assignment applies.
    pub fn compound_base(self) -> Option<Operator> {
        use Operator::*;
        match self {
            AddAssign => Some(Add),
            SubAssign => Some(Sub),
            MulAssign => Some(Mul),
            DivAssign => Some(Div),
            ModAssign => Some(Mod),
            _ => None,
        }
    }

    /// Canonical textual form used in chain shape keys and diagnostics.
    pub fn symbol(self) -> &'static str {
        use Operator::*;
        match self {
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
            And => "and",
            Nand => "nand",
            Or => "or",
            Nor => "nor",
            Xor => "xor",
            Xnor => "xnor",
            Not => "not",
            In => "in",
            Like => "like",
            Ilike => "ilike",
            Assign => ":=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            Neg => "-",
            Pos => "+",
            other => BASE_FUNCTION_NAMES
                .iter()
                .find(|(_, op, _)| *op == other)
                .map(|(name, _, _)| *name)
                .unwrap_or("?"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Base functions callable by name: `(name, operator, arity)`.
pub const BASE_FUNCTION_NAMES: &[(&str, Operator, usize)] = &[
    ("abs", Operator::Abs, 1),
    ("acos", Operator::Acos, 1),
    ("acosh", Operator::Acosh, 1),
    ("asin", Operator::Asin, 1),
    ("asinh", Operator::Asinh, 1),
    ("atan", Operator::Atan, 1),
    ("atanh", Operator::Atanh, 1),
    ("ceil", Operator::Ceil, 1),
    ("cos", Operator::Cos, 1),
    ("cosh", Operator::Cosh, 1),
    ("cot", Operator::Cot, 1),
    ("csc", Operator::Csc, 1),
    ("deg2grad", Operator::Deg2Grad, 1),
    ("deg2rad", Operator::Deg2Rad, 1),
    ("erf", Operator::Erf, 1),
    ("erfc", Operator::Erfc, 1),
    ("exp", Operator::Exp, 1),
    ("expm1", Operator::Expm1, 1),
    ("floor", Operator::Floor, 1),
    ("frac", Operator::Frac, 1),
    ("grad2deg", Operator::Grad2Deg, 1),
    ("log", Operator::Log, 1),
    ("log10", Operator::Log10, 1),
    ("log1p", Operator::Log1p, 1),
    ("log2", Operator::Log2, 1),
    ("ncdf", Operator::Ncdf, 1),
    ("notl", Operator::Not, 1),
    ("rad2deg", Operator::Rad2Deg, 1),
    ("round", Operator::Round, 1),
    ("sec", Operator::Sec, 1),
    ("sgn", Operator::Sgn, 1),
    ("sin", Operator::Sin, 1),
    ("sinc", Operator::Sinc, 1),
    ("sinh", Operator::Sinh, 1),
    ("sqrt", Operator::Sqrt, 1),
    ("tan", Operator::Tan, 1),
    ("tanh", Operator::Tanh, 1),
    ("trunc", Operator::Trunc, 1),
    ("atan2", Operator::Atan2, 2),
    ("hypot", Operator::Hypot, 2),
    ("logn", Operator::Logn, 2),
    ("root", Operator::Root, 2),
    ("roundn", Operator::Roundn, 2),
    ("equal", Operator::Equal, 2),
    ("pow", Operator::Pow, 2),
    ("shl", Operator::Shl, 2),
    ("shr", Operator::Shr, 2),
    ("clamp", Operator::Clamp, 3),
    ("iclamp", Operator::Iclamp, 3),
    ("inrange", Operator::Inrange, 3),
];

lazy_static! {
    static ref BASE_FUNCTIONS: HashMap<&'static str, (Operator, usize)> = BASE_FUNCTION_NAMES
        .iter()
        .map(|(name, op, arity)| (*name, (*op, *arity)))
        .collect();
}

/// Look up a base function by name, returning its operator and arity.
pub fn base_function(name: &str) -> Option<(Operator, usize)> {
    BASE_FUNCTIONS.get(name).copied()
}

/// Built-in variadic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarArgOp {
    Sum,
    Avg,
    Mul,
    Min,
    Max,
    Mand,
    Mor,
    /// `~(a, b, ...)`: evaluate every argument, yield the last.
    Multi,
}

impl VarArgOp {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => VarArgOp::Sum,
            "avg" => VarArgOp::Avg,
            "mul" => VarArgOp::Mul,
            "min" => VarArgOp::Min,
            "max" => VarArgOp::Max,
            "mand" => VarArgOp::Mand,
            "mor" => VarArgOp::Mor,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            VarArgOp::Sum => "sum",
            VarArgOp::Avg => "avg",
            VarArgOp::Mul => "mul",
            VarArgOp::Min => "min",
            VarArgOp::Max => "max",
            VarArgOp::Mand => "mand",
            VarArgOp::Mor => "mor",
            VarArgOp::Multi => "~",
        }
    }

    pub fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            VarArgOp::Sum => values.iter().sum(),
            VarArgOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
            VarArgOp::Mul => values.iter().product(),
            VarArgOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            VarArgOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            VarArgOp::Mand => truth(values.iter().all(|v| is_true(*v))),
            VarArgOp::Mor => truth(values.iter().any(|v| is_true(*v))),
            VarArgOp::Multi => values[values.len() - 1],
        }
    }
}

#[inline]
pub fn is_true(value: f64) -> bool {
    value != 0.0
}

#[inline]
pub fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

const EQUAL_EPSILON: f64 = 1e-10;

fn approx_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = 1f64.max(a.abs().max(b.abs()));
    (a - b).abs() <= scale * EQUAL_EPSILON
}

/// Abramowitz and Stegun 7.1.26.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

fn round_half_away(x: f64) -> f64 {
    x.round()
}

/// Evaluate a unary operator or one-argument base function.
pub fn unary(op: Operator, x: f64) -> f64 {
    use Operator::*;
    use std::f64::consts::PI;
    match op {
        Neg => -x,
        Pos => x,
        Not => truth(!is_true(x)),
        Abs => x.abs(),
        Acos => x.acos(),
        Acosh => x.acosh(),
        Asin => x.asin(),
        Asinh => x.asinh(),
        Atan => x.atan(),
        Atanh => x.atanh(),
        Ceil => x.ceil(),
        Cos => x.cos(),
        Cosh => x.cosh(),
        Cot => 1.0 / x.tan(),
        Csc => 1.0 / x.sin(),
        Deg2Grad => x * 10.0 / 9.0,
        Deg2Rad => x * PI / 180.0,
        Erf => erf(x),
        Erfc => 1.0 - erf(x),
        Exp => x.exp(),
        Expm1 => x.exp_m1(),
        Floor => x.floor(),
        Frac => x.fract(),
        Grad2Deg => x * 9.0 / 10.0,
        Log => x.ln(),
        Log10 => x.log10(),
        Log1p => x.ln_1p(),
        Log2 => x.log2(),
        Ncdf => 0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2)),
        Rad2Deg => x * 180.0 / PI,
        Round => round_half_away(x),
        Sec => 1.0 / x.cos(),
        Sgn => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Sin => x.sin(),
        Sinc => {
            if x == 0.0 {
                1.0
            } else {
                x.sin() / x
            }
        }
        Sinh => x.sinh(),
        Sqrt => x.sqrt(),
        Tan => x.tan(),
        Tanh => x.tanh(),
        Trunc => x.trunc(),
        _ => f64::NAN,
    }
}

/// Evaluate a binary operator or two-argument base function.
pub fn binary(op: Operator, a: f64, b: f64) -> f64 {
    use Operator::*;
    match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => a / b,
        Mod => a % b,
        Pow => a.powf(b),
        Lt => truth(a < b),
        Lte => truth(a <= b),
        Eq => truth(a == b),
        Ne => truth(a != b),
        Gte => truth(a >= b),
        Gt => truth(a > b),
        And => truth(is_true(a) && is_true(b)),
        Nand => truth(!(is_true(a) && is_true(b))),
        Or => truth(is_true(a) || is_true(b)),
        Nor => truth(!(is_true(a) || is_true(b))),
        Xor => truth(is_true(a) != is_true(b)),
        Xnor => truth(is_true(a) == is_true(b)),
        Atan2 => a.atan2(b),
        Hypot => a.hypot(b),
        Logn => a.ln() / b.ln(),
        Root => {
            if b == 0.0 || b.fract() != 0.0 {
                f64::NAN
            } else if a < 0.0 && (b as i64) % 2 != 0 {
                -(-a).powf(1.0 / b)
            } else {
                a.powf(1.0 / b)
            }
        }
        Roundn => {
            let factor = 10f64.powi(b.trunc() as i32);
            round_half_away(a * factor) / factor
        }
        Equal => truth(approx_equal(a, b)),
        Shl => a * 2f64.powf(b),
        Shr => a / 2f64.powf(b),
        _ => f64::NAN,
    }
}

/// Evaluate a three-argument base function.
pub fn ternary(op: Operator, a: f64, b: f64, c: f64) -> f64 {
    match op {
        // clamp(lo, x, hi)
        Operator::Clamp => {
            if b < a {
                a
            } else if b > c {
                c
            } else {
                b
            }
        }
        // iclamp(lo, x, hi): push x out of the open interval towards the nearer bound
        Operator::Iclamp => {
            if b <= a || b >= c {
                b
            } else if (c - b) < (b - a) {
                c
            } else {
                a
            }
        }
        // inrange(lo, x, hi)
        Operator::Inrange => truth(a <= b && b <= c),
        _ => f64::NAN,
    }
}

/// Raise `base` to a small non-negative integer power by repeated squaring.
pub fn int_pow(base: f64, exponent: u32) -> f64 {
    let mut result = 1.0;
    let mut factor = base;
    let mut n = exponent;
    while n > 0 {
        if n & 1 == 1 {
            result *= factor;
        }
        factor *= factor;
        n >>= 1;
    }
    result
}

/// Wildcard match where `*` matches any run and `?` any single character.
pub fn wildcard_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let fold = |c: char| {
        if case_insensitive {
            c.to_ascii_lowercase()
        } else {
            c
        }
    };
    let p: Vec<char> = pattern.chars().map(fold).collect();
    let t: Vec<char> = text.chars().map(fold).collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Evaluate a string comparison or string-only operator.
pub fn string_binary(op: Operator, a: &str, b: &str) -> f64 {
    use Operator::*;
    match op {
        Lt => truth(a < b),
        Lte => truth(a <= b),
        Eq => truth(a == b),
        Ne => truth(a != b),
        Gte => truth(a >= b),
        Gt => truth(a > b),
        In => truth(b.contains(a)),
        Like => truth(wildcard_match(b, a, false)),
        Ilike => truth(wildcard_match(b, a, true)),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(binary(Operator::Add, 2.0, 3.0), 5.0);
        assert_eq!(binary(Operator::Mod, 7.0, 4.0), 3.0);
        assert_eq!(binary(Operator::Pow, 2.0, 10.0), 1024.0);
        assert!(binary(Operator::Div, 1.0, 0.0).is_infinite());
    }

    #[test]
    fn test_logic_and_comparison() {
        assert_eq!(binary(Operator::Nand, 1.0, 1.0), 0.0);
        assert_eq!(binary(Operator::Xnor, 0.0, 0.0), 1.0);
        assert_eq!(binary(Operator::Gte, 2.0, 2.0), 1.0);
        assert_eq!(unary(Operator::Not, 0.0), 1.0);
        assert_eq!(binary(Operator::Equal, 0.1 + 0.2, 0.3), 1.0);
        assert_eq!(binary(Operator::Eq, f64::NAN, f64::NAN), 0.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(unary(Operator::Sgn, -4.0), -1.0);
        assert_eq!(unary(Operator::Frac, 2.75), 0.75);
        assert_eq!(binary(Operator::Root, 16.0, 4.0), 2.0);
        assert!((binary(Operator::Root, -27.0, 3.0) + 3.0).abs() < 1e-12);
        assert!(binary(Operator::Root, 4.0, 0.5).is_nan());
        assert_eq!(binary(Operator::Roundn, 1.23456, 2.0), 1.23);
        assert_eq!(binary(Operator::Shl, 3.0, 2.0), 12.0);
        assert!((unary(Operator::Erf, 1.0) - 0.8427).abs() < 1e-4);
        assert!((unary(Operator::Ncdf, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ternary_functions() {
        assert_eq!(ternary(Operator::Clamp, 0.0, 5.0, 3.0), 3.0);
        assert_eq!(ternary(Operator::Clamp, 0.0, -1.0, 3.0), 0.0);
        assert_eq!(ternary(Operator::Inrange, 0.0, 2.0, 3.0), 1.0);
        assert_eq!(ternary(Operator::Iclamp, 0.0, 2.5, 3.0), 3.0);
        assert_eq!(ternary(Operator::Iclamp, 0.0, 1.0, 3.0), 0.0);
    }

    #[test]
    fn test_int_pow() {
        assert_eq!(int_pow(3.0, 0), 1.0);
        assert_eq!(int_pow(3.0, 5), 243.0);
        assert_eq!(int_pow(2.0, 60), 2f64.powi(60));
    }

    #[test]
    fn test_varargs() {
        let values = [3.0, 1.0, 2.0];
        assert_eq!(VarArgOp::Sum.apply(&values), 6.0);
        assert_eq!(VarArgOp::Avg.apply(&values), 2.0);
        assert_eq!(VarArgOp::Min.apply(&values), 1.0);
        assert_eq!(VarArgOp::Max.apply(&values), 3.0);
        assert_eq!(VarArgOp::Mand.apply(&[1.0, 0.0]), 0.0);
        assert_eq!(VarArgOp::Mor.apply(&[1.0, 0.0]), 1.0);
        assert_eq!(VarArgOp::Multi.apply(&values), 2.0);
    }

    #[test]
    fn test_strings() {
        assert_eq!(string_binary(Operator::In, "ell", "hello"), 1.0);
        assert_eq!(string_binary(Operator::Like, "hello", "h*l?o"), 1.0);
        assert_eq!(string_binary(Operator::Like, "hello", "H*"), 0.0);
        assert_eq!(string_binary(Operator::Ilike, "hello", "H*"), 1.0);
        assert_eq!(string_binary(Operator::Lt, "abc", "abd"), 1.0);
    }

    #[test]
    fn test_base_function_lookup() {
        assert_eq!(base_function("atan2"), Some((Operator::Atan2, 2)));
        assert_eq!(base_function("clamp"), Some((Operator::Clamp, 3)));
        assert_eq!(base_function("nope"), None);
        assert_eq!(Operator::Hypot.symbol(), "hypot");
    }
}
