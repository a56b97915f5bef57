mod cases;

test_case!(
    precedence,
    input: "2 + 3 * 4",
    value: 14.0,
    nodes: 1,
);

test_case!(
    constant_subexpression_folds,
    input: "(2 * 3) + 4",
    value: 10.0,
    nodes: 1,
);

test_case!(
    variables,
    input: "x * y + 1",
    value: 7.0,
);

test_case!(
    power_is_right_associative,
    input: "2 ^ 3 ^ 2",
    value: 512.0,
);

test_case!(
    negated_power,
    input: "-x ^ 2",
    value: -4.0,
);

test_case!(
    modulo,
    input: "10 % 4",
    value: 2.0,
);

test_case!(
    division_by_zero,
    input: "1 / z",
    value: f64::INFINITY,
);

test_case!(
    implied_multiplication,
    input: "2x + 3(y - 1)",
    value: 10.0,
);

test_case!(
    sign_pairs_collapse,
    input: "x +- y",
    value: -1.0,
);

test_case!(
    base_functions,
    input: "sqrt(16) + abs(-2) + clamp(0, 5, 3)",
    value: 9.0,
);

test_case!(
    variadic_functions,
    input: "sum(1, 2, 3, x) + avg(x, y) * 2 + max(x, y, z) - min(x, y, z)",
    value: 16.0,
);

test_case!(
    special_function,
    input: "$f00(1, 2, 3)",
    value: 1.0,
);

test_case!(
    comparisons,
    input: "(x < y) + (x == 2) + (x != 2) + (y >= 3)",
    value: 3.0,
);

test_case!(
    logic,
    input: "(true and false) + (x or z) + not(z) + (1 xor 1)",
    value: 2.0,
);

test_case!(
    immutable_constant,
    input: "k * 2",
    value: 20.0,
);

test_case!(
    statements_yield_last_value,
    input: "x := 4; y += x; y",
    value: 7.0,
);

test_case!(
    compound_assignment,
    input: "x *= 3; x -= 1; x /= 5",
    value: 1.0,
);
