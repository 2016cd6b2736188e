//! A small compiler translating a tiny C subset to a WASM 1.0 binary module.
//!
//! The pipeline is linear, with a shared [`DiagnosticList`] threaded through
//! every stage (spec.md §2): Lexer → Parser → Semantic Analyzer → IR
//! Generator → WASM Emitter. A fatal diagnostic in any stage halts the
//! pipeline before the next stage runs; each stage still collects every
//! diagnostic it can detect before returning.

pub mod arena;
pub mod ast;
pub mod diagnostics;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symbol_table;
pub mod wasm;

use ast::AstArenas;
use diagnostics::DiagnosticList;

/// Which intermediate representation, if any, the driver should dump
/// instead of running the rest of the pipeline (spec.md §6 `--print-ast`
/// / `--print-ir`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    None,
    Ast,
    Ir,
}

/// What a successful [`compile`] call produced.
pub enum Output {
    /// `--print-ast`: parsing succeeded: the IR and emission stages never ran.
    Ast(String),
    /// `--print-ir`: semantic analysis and IR generation succeeded; emission
    /// never ran.
    Ir(String),
    /// The full pipeline ran to completion: a binary WASM 1.0 module.
    Wasm(Vec<u8>),
}

/// Runs `source` through the pipeline up to `print_mode`'s stage (or to
/// completion), appending every diagnostic encountered to `diagnostics`.
/// Returns `None` as soon as a stage reports a fatal diagnostic; the caller
/// is expected to print `diagnostics` and exit non-zero in that case.
pub fn compile(source: &str, print_mode: PrintMode, diagnostics: &mut DiagnosticList) -> Option<Output> {
    let arenas = AstArenas::new();
    let program = {
        let mut parser = parser::Parser::new(source, &arenas, diagnostics);
        parser.parse_program()
    };
    let program = program?;
    if diagnostics.has_fatal() {
        return None;
    }

    if print_mode == PrintMode::Ast {
        let mut out = String::new();
        ast::print::program(&mut out, &program);
        return Some(Output::Ast(out));
    }

    if !semantic::analyze(&program, diagnostics) {
        return None;
    }

    let ir_module = ir::generate(&program);

    if print_mode == PrintMode::Ir {
        let mut out = String::new();
        ir::print::module(&mut out, &ir_module);
        return Some(Output::Ir(out));
    }

    let bytes = wasm::emit(&ir_module, diagnostics)?;
    Some(Output::Wasm(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_ast_mode_stops_before_semantic_analysis() {
        // `y` is undeclared, which semantic analysis would flag (3001), but
        // print-ast mode must short-circuit before that stage ever runs.
        let mut diagnostics = DiagnosticList::new();
        let output = compile("int main() { return y; }", PrintMode::Ast, &mut diagnostics);
        assert!(diagnostics.is_empty());
        match output {
            Some(Output::Ast(text)) => assert!(text.starts_with("Program\n")),
            _ => panic!("expected AST output"),
        }
    }

    #[test]
    fn full_pipeline_emits_a_valid_wasm_module() {
        let mut diagnostics = DiagnosticList::new();
        let output = compile("int main() { return 1 + 2; }", PrintMode::None, &mut diagnostics);
        match output {
            Some(Output::Wasm(bytes)) => {
                assert_eq!(&bytes[0..4], &[0x00, 0x61, 0x73, 0x6d]);
            }
            _ => panic!("expected a WASM module"),
        }
    }

    #[test]
    fn undeclared_variable_halts_before_ir_generation() {
        let mut diagnostics = DiagnosticList::new();
        let output = compile("int main() { return y; }", PrintMode::None, &mut diagnostics);
        assert!(output.is_none());
        assert!(diagnostics.has_fatal());
        assert!(diagnostics
            .iter()
            .any(|d| d.id == diagnostics::ids::SEM_UNDEFINED_VARIABLE));
    }
}
