// End-to-end interpreter tests: parse, validate, execute, check the result

use cstep::pipeline::{run_source, PipelineError};
use cstep::runtime::RuntimeError;

fn run_ok(code: &str) -> Option<i64> {
    match run_source(code) {
        Ok(execution) => execution.result,
        Err(err) => panic!("pipeline failed: {err}"),
    }
}

fn run_runtime_err(code: &str) -> RuntimeError {
    match run_source(code) {
        Ok(execution) => panic!("expected a runtime error, got {:?}", execution.result),
        Err(PipelineError::Runtime(err)) => err,
        Err(other) => panic!("expected a runtime error, got: {other}"),
    }
}

struct Case {
    name: &'static str,
    code: &'static str,
    expected: i64,
}

fn run_cases(cases: &[Case]) {
    for case in cases {
        assert_eq!(
            run_ok(case.code),
            Some(case.expected),
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn arithmetic() {
    run_cases(&[
        Case {
            name: "addition",
            code: "int main() { return 5 + 3; }",
            expected: 8,
        },
        Case {
            name: "subtraction",
            code: "int main() { return 10 - 4; }",
            expected: 6,
        },
        Case {
            name: "multiplication",
            code: "int main() { return 6 * 7; }",
            expected: 42,
        },
        Case {
            name: "division truncates toward zero",
            code: "int main() { return (0 - 7) / 2; }",
            expected: -3,
        },
        Case {
            name: "modulo",
            code: "int main() { return 17 % 5; }",
            expected: 2,
        },
        Case {
            name: "precedence",
            code: "int main() { return 2 + 3 * 4; }",
            expected: 14,
        },
        Case {
            name: "parentheses",
            code: "int main() { return (2 + 3) * 4; }",
            expected: 20,
        },
        Case {
            name: "negative literal",
            code: "int main() { return -5; }",
            expected: -5,
        },
        Case {
            name: "double negation",
            code: "int main() { int x = 9; return -(-x); }",
            expected: 9,
        },
    ]);
}

#[test]
fn comparisons_and_logic() {
    run_cases(&[
        Case {
            name: "less than",
            code: "int main() { return 2 < 3; }",
            expected: 1,
        },
        Case {
            name: "equality",
            code: "int main() { return 4 == 4; }",
            expected: 1,
        },
        Case {
            name: "inequality",
            code: "int main() { return 4 != 4; }",
            expected: 0,
        },
        Case {
            name: "logical and coerces to one",
            code: "int main() { return 7 && 3; }",
            expected: 1,
        },
        Case {
            name: "logical or coerces to one",
            code: "int main() { return 0 || 9; }",
            expected: 1,
        },
        Case {
            name: "logical not",
            code: "int main() { return !0 + !5; }",
            expected: 1,
        },
    ]);
}

#[test]
fn factorial_by_recursion() {
    let code = r#"
        int factorial(int n) {
            if (n <= 1) { return 1; }
            return n * factorial(n - 1);
        }
        int main() { return factorial(5); }
    "#;
    assert_eq!(run_ok(code), Some(120));
}

#[test]
fn bubble_sort_smallest_first() {
    let code = r#"
        int main() {
            int a[5] = {5, 2, 8, 1, 9};
            for (int i = 0; i < 5; i++) {
                for (int j = 0; j < 4; j++) {
                    if (a[j] > a[j + 1]) {
                        int t = a[j];
                        a[j] = a[j + 1];
                        a[j + 1] = t;
                    }
                }
            }
            return a[0];
        }
    "#;
    assert_eq!(run_ok(code), Some(1));
}

#[test]
fn short_circuit_preserves_side_effects() {
    let code = r#"
        int main() {
            int x = 0;
            if (0 && (x = 5)) { x = 10; }
            return x;
        }
    "#;
    assert_eq!(run_ok(code), Some(0));
}

#[test]
fn or_short_circuits_on_any_nonzero() {
    let code = r#"
        int main() {
            int x = 0;
            if (2 || (x = 5)) { return x + 1; }
            return 99;
        }
    "#;
    assert_eq!(run_ok(code), Some(1));
}

#[test]
fn literal_conditions_take_exactly_one_branch() {
    let code = r#"
        int main() {
            int x = 0;
            if (0) { x = 1; } else { x = 2; }
            if (1) { x = x + 10; } else { x = x + 20; }
            return x;
        }
    "#;
    assert_eq!(run_ok(code), Some(12));
}

#[test]
fn else_if_conditions_evaluate_in_order() {
    let code = r#"
        int main() {
            int probe = 0;
            int x = 2;
            if (x == 1) { return 100; }
            else if ((probe = probe + 1) && x == 2) { return probe; }
            else { return 99; }
        }
    "#;
    assert_eq!(run_ok(code), Some(1));
}

#[test]
fn lexical_scope_shadowing() {
    let code = r#"
        int main() {
            int x = 10;
            { int x = 20; }
            return x;
        }
    "#;
    assert_eq!(run_ok(code), Some(10));

    let write_through = r#"
        int main() {
            int x = 1;
            { int x = 2; x = 3; }
            return x;
        }
    "#;
    assert_eq!(run_ok(write_through), Some(1));
}

#[test]
fn global_vs_parameter() {
    let code = r#"
        int counter = 0;
        void inc() { counter++; }
        int main() {
            inc();
            inc();
            inc();
            return counter;
        }
    "#;
    assert_eq!(run_ok(code), Some(3));
}

#[test]
fn nested_initializer() {
    let code = r#"
        int m[2][2] = {{1, 2}, {3, 4}};
        int main() { return m[0][0] + m[1][1]; }
    "#;
    assert_eq!(run_ok(code), Some(5));
}

#[test]
fn loops() {
    run_cases(&[
        Case {
            name: "while sum",
            code: r#"
                int main() {
                    int i = 0;
                    int sum = 0;
                    while (i < 5) { sum += i; i++; }
                    return sum;
                }
            "#,
            expected: 10,
        },
        Case {
            name: "do-while checks after the body",
            code: r#"
                int main() {
                    int runs = 0;
                    do { runs++; } while (0);
                    return runs;
                }
            "#,
            expected: 1,
        },
        Case {
            name: "do-while loops until zero",
            code: r#"
                int main() {
                    int i = 0;
                    do { i++; } while (i < 3);
                    return i;
                }
            "#,
            expected: 3,
        },
        Case {
            name: "for sum",
            code: r#"
                int main() {
                    int sum = 0;
                    for (int i = 1; i <= 4; i++) { sum += i; }
                    return sum;
                }
            "#,
            expected: 10,
        },
        Case {
            name: "for with an expression initializer",
            code: r#"
                int main() {
                    int i;
                    int sum = 0;
                    for (i = 1; i <= 3; i++) { sum += i; }
                    return sum;
                }
            "#,
            expected: 6,
        },
        Case {
            name: "continue skips even numbers",
            code: r#"
                int main() {
                    int sum = 0;
                    for (int i = 0; i < 10; i++) {
                        if (i % 2 == 0) { continue; }
                        sum += i;
                    }
                    return sum;
                }
            "#,
            expected: 25,
        },
    ]);
}

#[test]
fn break_halts_only_the_enclosing_loop() {
    let code = r#"
        int main() {
            int count = 0;
            int i = 0;
            while (i < 3) {
                int j = 0;
                while (1) {
                    j++;
                    if (j == 2) { break; }
                }
                count = count + j;
                i++;
            }
            return count;
        }
    "#;
    assert_eq!(run_ok(code), Some(6));
}

#[test]
fn return_exits_nested_loops() {
    let code = r#"
        int find() {
            for (int i = 0; i < 10; i++) {
                for (int j = 0; j < 10; j++) {
                    if (i * 10 + j == 42) { return i * 10 + j; }
                }
            }
            return -1;
        }
        int main() { return find(); }
    "#;
    assert_eq!(run_ok(code), Some(42));
}

#[test]
fn increment_decrement() {
    let code = r#"
        int main() {
            int x = 5;
            int a = x++;
            int b = ++x;
            return a * 100 + b * 10 + x;
        }
    "#;
    assert_eq!(run_ok(code), Some(577));

    let decrement = r#"
        int main() {
            int x = 5;
            int a = x--;
            int b = --x;
            return a * 100 + b * 10 + x;
        }
    "#;
    assert_eq!(run_ok(decrement), Some(533));
}

#[test]
fn assignment_yields_the_written_value() {
    let code = r#"
        int main() {
            int x;
            int y = (x = 5);
            return x + y;
        }
    "#;
    assert_eq!(run_ok(code), Some(10));
}

#[test]
fn compound_assignments() {
    let code = r#"
        int main() {
            int x = 10;
            x += 5;
            x -= 3;
            x *= 2;
            x /= 4;
            x %= 4;
            return x;
        }
    "#;
    assert_eq!(run_ok(code), Some(2));
}

#[test]
fn array_init_round_trip() {
    let code = r#"
        int main() {
            int a[4] = {4, 3, 2, 1};
            return a[0] * 1000 + a[1] * 100 + a[2] * 10 + a[3];
        }
    "#;
    assert_eq!(run_ok(code), Some(4321));
}

#[test]
fn partial_initializer_zero_fills() {
    let code = r#"
        int main() {
            int a[5] = {1, 2};
            return a[1] * 10 + a[4];
        }
    "#;
    assert_eq!(run_ok(code), Some(20));
}

#[test]
fn global_arrays_are_zeroed() {
    let code = r#"
        int g[3];
        int main() { return g[2]; }
    "#;
    assert_eq!(run_ok(code), Some(0));
}

#[test]
fn global_initialization_order() {
    let code = r#"
        int a = 5;
        int b;
        int main() {
            b = a + 1;
            return b;
        }
    "#;
    assert_eq!(run_ok(code), Some(6));
}

#[test]
fn by_value_parameters() {
    let code = r#"
        int bump(int n) {
            n = n + 1;
            return n;
        }
        int main() {
            int x = 5;
            int y = bump(x);
            return x * 10 + y;
        }
    "#;
    assert_eq!(run_ok(code), Some(56));
}

#[test]
fn callee_cannot_see_caller_locals() {
    let code = r#"
        int peek() { return x; }
        int main() {
            int x = 5;
            return peek();
        }
    "#;
    let err = run_runtime_err(code);
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn void_return_value_is_accepted_and_ignored() {
    let code = r#"
        void f() { return 3; }
        int main() {
            f();
            return 1;
        }
    "#;
    assert_eq!(run_ok(code), Some(1));
}

#[test]
fn fall_through_call_in_statement_position() {
    let code = r#"
        int f() { }
        int main() {
            f();
            return 7;
        }
    "#;
    assert_eq!(run_ok(code), Some(7));
}

#[test]
fn fall_through_value_in_expression_is_a_types_mismatch() {
    let code = r#"
        int f() { }
        int main() { return f(); }
    "#;
    let err = run_runtime_err(code);
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn main_falling_through_yields_no_value() {
    let code = "int main() { int x = 1; }";
    assert_eq!(run_ok(code), None);
}

#[test]
fn label_executes_inner_statement() {
    let code = r#"
        int main() {
            done: return 5;
        }
    "#;
    assert_eq!(run_ok(code), Some(5));
}

#[test]
fn goto_is_rejected_at_runtime() {
    let code = r#"
        int main() {
            goto done;
            done: return 5;
        }
    "#;
    let err = run_runtime_err(code);
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn break_outside_a_loop_reaches_the_frame() {
    let code = r#"
        int main() {
            break;
            return 0;
        }
    "#;
    let err = run_runtime_err(code);
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn division_and_modulo_by_zero() {
    for code in [
        "int main() { return 1 / 0; }",
        "int main() { return 1 % 0; }",
        "int main() { int x = 4; x /= 0; return x; }",
        "int main() { int x = 4; x %= 0; return x; }",
    ] {
        let err = run_runtime_err(code);
        assert_eq!(err.code(), "Runtime", "{code}");
    }
}

#[test]
fn undefined_behavior_errors() {
    for code in [
        "int main() { int x; return x; }",
        "int main() { int a[3]; return a[0]; }",
        "int main() { int a[3] = {1, 2, 3}; return a[3]; }",
        "int main() { int a[3] = {1, 2, 3}; return a[0 - 1]; }",
        "int main() { int a[3] = {1, 2, 3}; a[5] = 1; return 0; }",
        "int m[2][2]; int main() { return m[2][0]; }",
        "int m[2][2]; int main() { m[0][2] = 1; return 0; }",
    ] {
        let err = run_runtime_err(code);
        assert_eq!(err.code(), "UndefinedBehavior", "{code}");
    }
}

#[test]
fn internal_errors() {
    for code in [
        // duplicate function
        "int f() { return 1; } int f() { return 2; } int main() { return f(); }",
        // missing main
        "int f() { return 1; }",
        // arity mismatch
        "int f(int a) { return a; } int main() { return f(); }",
        // unknown variable
        "int main() { return y; }",
        // unknown function
        "int main() { return g(); }",
        // void result used as an integer
        "void f() { } int main() { return f(); }",
    ] {
        let err = run_runtime_err(code);
        assert_eq!(err.code(), "UnexpectedInternalError", "{code}");
    }
}

#[test]
fn lowering_failures_preempt_validation() {
    let err = run_source("int* a = $;").unwrap_err();
    assert!(matches!(err, PipelineError::Lower(_)), "{err}");
}

#[test]
fn validation_failures_preempt_execution() {
    let err = run_source("int main() { int x = 1 / 0; return ~x; }").unwrap_err();
    assert!(matches!(err, PipelineError::Semantic(_)), "{err}");
}

#[test]
fn frame_count_is_restored_after_calls() {
    let code = r#"
        int factorial(int n) {
            if (n <= 1) { return 1; }
            return n * factorial(n - 1);
        }
        int main() { return factorial(6); }
    "#;
    let execution = run_source(code).expect("pipeline failed");
    assert_eq!(execution.result, Some(720));
    // only the synthetic global frame survives the run
    assert_eq!(execution.dispatcher.snapshot().frames_count(), 1);
}
