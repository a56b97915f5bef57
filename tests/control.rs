mod cases;

use calyx::{ControlStructures, ErrorKind, Settings};

test_case!(
    if_statement,
    input: "if (x > 1) 10; else 20",
    value: 10.0,
);

test_case!(
    if_function,
    input: "if (x < 1, 10, 20)",
    value: 20.0,
);

test_case!(
    else_if_chain,
    input: "if (x > 5) 1; else if (x > 1) 2; else 3",
    value: 2.0,
);

test_case!(
    ternary,
    input: "x > y ? x : y",
    value: 3.0,
);

test_case!(
    switch_picks_first_true_case,
    input: "switch { case x == 1: 10; case x == 2: 20; default: 30; }",
    value: 20.0,
);

test_case!(
    switch_requires_default,
    input: "switch { case x == 1: 10; }",
    error: ErrorKind::Syntax,
);

test_case!(
    for_loop,
    input: "for (var i := 0; i < 5; i += 1) { z += i; }; z",
    value: 10.0,
);

test_case!(
    while_loop,
    input: "while (x < 10) { x += 1; }; x",
    value: 10.0,
);

test_case!(
    repeat_until,
    input: "repeat x += 1; until (x >= 5); x",
    value: 5.0,
);

test_case!(
    break_with_value,
    input: "for (var i := 0; i < 10; i += 1) { if (i == 3) break; z += 1; }; z",
    value: 3.0,
);

test_case!(
    continue_skips_rest_of_body,
    input: "for (var i := 0; i < 4; i += 1) { if (i == 1) continue; z += i; }; z",
    value: 5.0,
);

test_case!(
    loop_local_is_scoped,
    input: "for (var i := 0; i < 3; i += 1) { }; i",
    error: ErrorKind::Symtab,
    message: "undefined symbol 'i'",
);

test_case!(
    block_locals_are_scoped,
    input: "{ var t := 1; }; t",
    error: ErrorKind::Symtab,
);

test_case!(
    sibling_blocks_reuse_names,
    input: "{ var t := 1; t } + { var t := 2; t }",
    value: 3.0,
);

test_case!(
    disabled_loop,
    input: "while (x < 10) { x += 1; }",
    settings: Settings::default().disable_control_structures(ControlStructures::WHILE),
    error: ErrorKind::Syntax,
    message: "disabled",
);

test_case!(
    break_outside_loop,
    input: "x + 1; break",
    message: "outside of a loop",
);

test_case!(
    multi_switch,
    input: "[*] { case x > 1: z += 1; case x > 5: z += 10; case y > 1: z += 100; }; z",
    value: 101.0,
);

test_case!(
    loop_counter_name_is_reusable,
    input: "for (var i := 0; i < 3; i += 1) { z += i; }; var i := 5; i + z",
    value: 8.0,
);

test_case!(
    redeclaration_in_active_block,
    input: "{ var t := 1; var t := 2; t }",
    error: ErrorKind::Syntax,
    message: "already declared",
);
