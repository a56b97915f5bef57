mod cases;

use calyx::ErrorKind;

test_case!(
    element_access,
    input: "v[0] + v[2] * w[1]",
    value: 16.0,
);

test_case!(
    size,
    input: "v[] + w[]",
    value: 6.0,
);

test_case!(
    constant_index_out_of_bounds,
    input: "v[5]",
    error: ErrorKind::Syntax,
    message: "out of bounds",
);

test_case!(
    open_slice_past_the_end,
    input: "sum(v[5:])",
    error: ErrorKind::Syntax,
    message: "index 5 is out of bounds for size 3",
);

test_case!(
    slice_end_beyond_any_size,
    input: "sum(v[0:1e300])",
    error: ErrorKind::Syntax,
    message: "out of bounds",
);

test_case!(
    slice_start_beyond_any_size,
    input: "sum(v[1e300:1e300])",
    error: ErrorKind::Syntax,
    message: "out of bounds",
);

test_case!(
    open_slice_within_bounds,
    input: "sum(v[1:])",
    value: 5.0,
);

test_case!(
    elementwise_addition,
    input: "v + w",
    vector: &[5.0, 7.0, 9.0],
);

test_case!(
    scalar_broadcast,
    input: "v * 2",
    vector: &[2.0, 4.0, 6.0],
);

test_case!(
    reductions,
    input: "sum(v) + max(w) - min(v)",
    value: 11.0,
);

test_case!(
    slice,
    input: "sum(w[1:2])",
    value: 11.0,
);

test_case!(
    slice_requires_constant_bounds,
    input: "v[0:x]",
    message: "constant bounds",
);

test_case!(
    element_assignment,
    input: "v[1] := 10; sum(v)",
    value: 14.0,
);

test_case!(
    vector_assignment,
    input: "v := w; v[0]",
    value: 4.0,
);

test_case!(
    declaration_with_initializer_list,
    input: "var u[4] := {1, 2}; sum(u) + u[]",
    value: 7.0,
);

test_case!(
    declaration_broadcast,
    input: "var u[3] := x; sum(u)",
    value: 6.0,
);

test_case!(
    declaration_copies_vector,
    input: "var u[3] := w; u[0] + u[2]",
    value: 10.0,
);

test_case!(
    zero_size_declaration,
    input: "var u[0]",
    message: "between 1 and 2e9",
);

test_case!(
    immutable_vector,
    input: "kv[0] := 1",
    error: ErrorKind::Parser,
);
