//! End-to-end pipeline scenarios: source text in, either an executable WASM
//! module's `main()` return value or a specific diagnostic id out.

use cwasmc::diagnostics::{ids, DiagnosticList};
use cwasmc::{compile, Output, PrintMode};
use wasmer::{imports, Instance, Module, Store, Value};

fn compile_ok(source: &str) -> Vec<u8> {
    let mut diagnostics = DiagnosticList::new();
    match compile(source, PrintMode::None, &mut diagnostics) {
        Some(Output::Wasm(bytes)) => bytes,
        _ => panic!("expected a successful compile of {source:?}, got diagnostics {diagnostics:?}"),
    }
}

fn compile_err(source: &str) -> DiagnosticList {
    let mut diagnostics = DiagnosticList::new();
    let output = compile(source, PrintMode::None, &mut diagnostics);
    assert!(output.is_none(), "expected {source:?} to fail to compile");
    assert!(diagnostics.has_fatal());
    diagnostics
}

fn run_main(wasm_bytes: &[u8]) -> i32 {
    let mut store = Store::default();
    let module = Module::new(&store, wasm_bytes).expect("module compiles");
    let instance = Instance::new(&mut store, &module, &imports! {}).expect("module instantiates");
    let main = instance.exports.get_function("main").expect("main is exported");
    let results = main.call(&mut store, &[]).expect("main executes");
    match results[0] {
        Value::I32(n) => n,
        other => panic!("expected an i32 return, got {other:?}"),
    }
}

fn expect_return(source: &str, expected: i32) {
    let bytes = compile_ok(source);
    assert_eq!(&bytes[0..8], &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00]);
    assert_eq!(run_main(&bytes), expected, "for source {source:?}");
}

#[test]
fn returns_an_integer_constant() {
    expect_return("int main() { return 42; }", 42);
}

#[test]
fn unary_operators_compose() {
    // ~1 = -2, !0 = 1 (logical not always yields 0/1), sum = -1, negated = 1.
    expect_return("int main() { return -(~1 + !0); }", 1);
}

#[test]
fn arithmetic_on_local_variables() {
    expect_return("int main() { int a = 3; int b = 4; return a*a + b*b; }", 25);
}

#[test]
fn if_else_selects_a_branch() {
    expect_return("int main() { int x = 10; if (x > 5) return 1; else return 0; }", 1);
}

#[test]
fn while_loop_accumulates() {
    expect_return(
        "int main() { int i = 0; int s = 0; while (i < 5) { s = s + i; i = i + 1; } return s; }",
        10,
    );
}

#[test]
fn short_circuit_logical_operators_normalize_to_zero_or_one() {
    // (1 && 0) || 2 -> 0 || 2 -> 1, not the raw operand 2.
    expect_return("int main() { return 1 && 0 || 2; }", 1);
}

#[test]
fn undeclared_variable_reports_3001() {
    let diagnostics = compile_err("int main() { return y; }");
    assert!(diagnostics.iter().any(|d| d.id == ids::SEM_UNDEFINED_VARIABLE));
}

#[test]
fn redeclaring_a_variable_in_the_same_scope_reports_3004() {
    let diagnostics = compile_err("int main() { int x = 1; int x = 2; return x; }");
    assert!(diagnostics.iter().any(|d| d.id == ids::SEM_REDEFINITION));
}

#[test]
fn break_outside_a_loop_reports_3007() {
    let diagnostics = compile_err("int main() { break; return 0; }");
    assert!(diagnostics.iter().any(|d| d.id == ids::SEM_BREAK_OUTSIDE_LOOP));
}

#[test]
fn unterminated_statement_and_function_report_2003_and_2004() {
    let diagnostics = compile_err("int main() { return 1");
    let ids_seen: Vec<u32> = diagnostics.iter().map(|d| d.id).collect();
    assert!(ids_seen.contains(&ids::SYNTAX_MISSING_SEMICOLON));
    assert!(ids_seen.contains(&ids::SYNTAX_MISSING_BRACE));
}

#[test]
fn do_while_runs_the_body_at_least_once() {
    expect_return(
        "int main() { int i = 0; do { i = i + 1; } while (i < 3); return i; }",
        3,
    );
}

#[test]
fn continue_skips_to_the_condition_check() {
    expect_return(
        "int main() { int i = 0; int s = 0; while (i < 5) { i = i + 1; if (i == 3) continue; s = s + i; } return s; }",
        1 + 2 + 4 + 5,
    );
}

#[test]
fn nested_loops_with_break_stop_only_the_inner_loop() {
    expect_return(
        "int main() { int i = 0; int t = 0; while (i < 3) { int j = 0; while (j < 3) { if (j == 1) break; t = t + 1; j = j + 1; } i = i + 1; } return t; }",
        3,
    );
}

#[test]
fn print_ast_mode_returns_text_without_running_later_stages() {
    let mut diagnostics = DiagnosticList::new();
    let output = compile("int main() { return 1 + 2; }", PrintMode::Ast, &mut diagnostics);
    match output {
        Some(Output::Ast(text)) => {
            assert!(text.starts_with("Program\n"));
            assert!(text.contains("Function: main"));
        }
        _ => panic!("expected AST text"),
    }
}

#[test]
fn print_ir_mode_returns_text_without_emitting() {
    let mut diagnostics = DiagnosticList::new();
    let output = compile("int main() { return 1 + 2; }", PrintMode::Ir, &mut diagnostics);
    match output {
        Some(Output::Ir(text)) => assert!(text.contains("Function: main")),
        _ => panic!("expected IR text"),
    }
}
