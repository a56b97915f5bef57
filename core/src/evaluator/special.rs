//! Special functions `$f00` to `$f99`.
//!
//! Functions 00..=47 take three arguments, 48..=99 take four. The pure
//! `+ - * /` shapes among them double as the resolved evaluators of
//! flattened chain nodes, looked up through [`special_for_shape`].

use super::operators::is_true;
use hashbrown::HashMap;
use lazy_static::lazy_static;

pub const SPECIAL_FUNCTION_COUNT: u8 = 100;

/// Number of arguments `$fNN` takes.
pub fn special_arity(index: u8) -> usize {
    if index < 48 { 3 } else { 4 }
}

/// Parse `$fNN` into its index.
pub fn parse_special(name: &str) -> Option<u8> {
    let digits = name.strip_prefix("$f")?;
    if digits.len() != 2 {
        return None;
    }
    digits.parse::<u8>().ok().filter(|i| *i < SPECIAL_FUNCTION_COUNT)
}

#[inline]
fn axn(a: f64, x: f64, n: i32) -> f64 {
    a * x.powi(n)
}

/// Evaluate `$fNN` over `args` (3 or 4 values).
pub fn evaluate(index: u8, args: &[f64]) -> f64 {
    let x = args.first().copied().unwrap_or(f64::NAN);
    let y = args.get(1).copied().unwrap_or(f64::NAN);
    let z = args.get(2).copied().unwrap_or(f64::NAN);
    let w = args.get(3).copied().unwrap_or(f64::NAN);

    match index {
        0 => (x + y) / z,
        1 => (x + y) * z,
        2 => (x + y) - z,
        3 => (x + y) + z,
        4 => (x - y) + z,
        5 => (x - y) / z,
        6 => (x - y) * z,
        7 => (x * y) + z,
        8 => (x * y) - z,
        9 => (x * y) / z,
        10 => (x * y) * z,
        11 => (x / y) + z,
        12 => (x / y) - z,
        13 => (x / y) / z,
        14 => (x / y) * z,
        15 => x / (y + z),
        16 => x / (y - z),
        17 => x / (y * z),
        18 => x / (y / z),
        19 => x * (y + z),
        20 => x * (y - z),
        21 => x * (y * z),
        22 => x * (y / z),
        23 => x - (y + z),
        24 => x - (y - z),
        25 => x - (y / z),
        26 => x - (y * z),
        27 => x + (y * z),
        28 => x + (y / z),
        29 => x + (y + z),
        30 => x + (y - z),
        31..=38 => axn(x, y, index as i32 - 29) + z,
        39 => x * y.ln() + z,
        40 => x * y.ln() - z,
        41 => x * y.log10() + z,
        42 => x * y.log10() - z,
        43 => x * y.sin() + z,
        44 => x * y.sin() - z,
        45 => x * y.cos() + z,
        46 => x * y.cos() - z,
        47 => {
            if is_true(x) {
                y
            } else {
                z
            }
        }
        48 => x + ((y + z) / w),
        49 => x + ((y + z) * w),
        50 => x + ((y - z) / w),
        51 => x + ((y - z) * w),
        52 => x + ((y * z) / w),
        53 => x + ((y * z) * w),
        54 => x + ((y / z) + w),
        55 => x + ((y / z) / w),
        56 => x + ((y / z) * w),
        57 => x - ((y + z) / w),
        58 => x - ((y + z) * w),
        59 => x - ((y - z) / w),
        60 => x - ((y - z) * w),
        61 => x - ((y * z) / w),
        62 => x - ((y * z) * w),
        63 => x - ((y / z) / w),
        64 => x - ((y / z) * w),
        65 => ((x + y) * z) - w,
        66 => ((x - y) * z) - w,
        67 => ((x * y) * z) - w,
        68 => ((x / y) * z) - w,
        69 => ((x + y) / z) - w,
        70 => ((x - y) / z) - w,
        71 => ((x * y) / z) - w,
        72 => ((x / y) / z) - w,
        73 => (x * y) + (z * w),
        74 => (x * y) - (z * w),
        75 => (x * y) + (z / w),
        76 => (x * y) - (z / w),
        77 => (x / y) + (z / w),
        78 => (x / y) - (z / w),
        79 => (x / y) - (z * w),
        80 => x / (y + (z * w)),
        81 => x / (y - (z * w)),
        82 => x * (y + (z * w)),
        83 => x * (y - (z * w)),
        84..=91 => {
            let n = index as i32 - 82;
            axn(x, y, n) + axn(z, w, n)
        }
        92 => {
            if is_true(x) && is_true(y) {
                z
            } else {
                w
            }
        }
        93 => {
            if is_true(x) || is_true(y) {
                z
            } else {
                w
            }
        }
        94 => if x < y { z } else { w },
        95 => if x <= y { z } else { w },
        96 => if x > y { z } else { w },
        97 => if x >= y { z } else { w },
        98 => {
            if is_true(super::operators::binary(super::Operator::Equal, x, y)) {
                z
            } else {
                w
            }
        }
        99 => x * y.sin() + z * w.cos(),
        _ => f64::NAN,
    }
}

/// Shape keys of the special functions whose formula is a pure
/// `+ - * /` chain over their arguments in order.
const SHAPES: &[(&str, u8)] = &[
    ("(t+t)/t", 0),
    ("(t+t)*t", 1),
    ("(t+t)-t", 2),
    ("(t+t)+t", 3),
    ("(t-t)+t", 4),
    ("(t-t)/t", 5),
    ("(t-t)*t", 6),
    ("(t*t)+t", 7),
    ("(t*t)-t", 8),
    ("(t*t)/t", 9),
    ("(t*t)*t", 10),
    ("(t/t)+t", 11),
    ("(t/t)-t", 12),
    ("(t/t)/t", 13),
    ("(t/t)*t", 14),
    ("t/(t+t)", 15),
    ("t/(t-t)", 16),
    ("t/(t*t)", 17),
    ("t/(t/t)", 18),
    ("t*(t+t)", 19),
    ("t*(t-t)", 20),
    ("t*(t*t)", 21),
    ("t*(t/t)", 22),
    ("t-(t+t)", 23),
    ("t-(t-t)", 24),
    ("t-(t/t)", 25),
    ("t-(t*t)", 26),
    ("t+(t*t)", 27),
    ("t+(t/t)", 28),
    ("t+(t+t)", 29),
    ("t+(t-t)", 30),
    ("t+((t+t)/t)", 48),
    ("t+((t+t)*t)", 49),
    ("t+((t-t)/t)", 50),
    ("t+((t-t)*t)", 51),
    ("t+((t*t)/t)", 52),
    ("t+((t*t)*t)", 53),
    ("t+((t/t)+t)", 54),
    ("t+((t/t)/t)", 55),
    ("t+((t/t)*t)", 56),
    ("t-((t+t)/t)", 57),
    ("t-((t+t)*t)", 58),
    ("t-((t-t)/t)", 59),
    ("t-((t-t)*t)", 60),
    ("t-((t*t)/t)", 61),
    ("t-((t*t)*t)", 62),
    ("t-((t/t)/t)", 63),
    ("t-((t/t)*t)", 64),
    ("((t+t)*t)-t", 65),
    ("((t-t)*t)-t", 66),
    ("((t*t)*t)-t", 67),
    ("((t/t)*t)-t", 68),
    ("((t+t)/t)-t", 69),
    ("((t-t)/t)-t", 70),
    ("((t*t)/t)-t", 71),
    ("((t/t)/t)-t", 72),
    ("(t*t)+(t*t)", 73),
    ("(t*t)-(t*t)", 74),
    ("(t*t)+(t/t)", 75),
    ("(t*t)-(t/t)", 76),
    ("(t/t)+(t/t)", 77),
    ("(t/t)-(t/t)", 78),
    ("(t/t)-(t*t)", 79),
    ("t/(t+(t*t))", 80),
    ("t/(t-(t*t))", 81),
    ("t*(t+(t*t))", 82),
    ("t*(t-(t*t))", 83),
];

lazy_static! {
    static ref SHAPE_TABLE: HashMap<&'static str, u8> = SHAPES.iter().copied().collect();
}

/// The special function implementing a chain shape, if one exists.
pub fn special_for_shape(shape: &str) -> Option<u8> {
    SHAPE_TABLE.get(shape).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_special() {
        assert_eq!(parse_special("$f00"), Some(0));
        assert_eq!(parse_special("$f99"), Some(99));
        assert_eq!(parse_special("$f7"), None);
        assert_eq!(parse_special("sin"), None);
        assert_eq!(special_arity(47), 3);
        assert_eq!(special_arity(48), 4);
    }

    #[test]
    fn test_selected_formulas() {
        assert_eq!(evaluate(0, &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(evaluate(31, &[2.0, 3.0, 1.0]), 19.0);
        assert_eq!(evaluate(47, &[0.0, 1.0, 2.0]), 2.0);
        assert_eq!(evaluate(73, &[1.0, 2.0, 3.0, 4.0]), 14.0);
        assert_eq!(evaluate(84, &[1.0, 2.0, 1.0, 3.0]), 13.0);
        assert_eq!(evaluate(94, &[1.0, 2.0, 5.0, 6.0]), 5.0);
        assert_eq!(evaluate(99, &[2.0, 0.0, 3.0, 0.0]), 3.0);
    }

    #[test]
    fn test_shape_table_agrees_with_formulas() {
        let args = [7.0, 3.0, 2.0, 5.0];
        for (shape, index) in SHAPES {
            assert_eq!(special_for_shape(shape), Some(*index));
            let arity = special_arity(*index);
            let value = evaluate(*index, &args[..arity]);
            assert!(value.is_finite(), "{shape} produced {value}");
        }
        assert_eq!(special_for_shape("(t%t)+t"), None);
    }
}
