//! WASM 1.0 binary emitter (spec.md §4.6).
//!
//! Serializes an IR [`Module`] using `wasm_encoder`'s section/instruction
//! builders, the way the teacher's `backends/wasm/encode.rs` assembles a
//! module from its own LIR, rather than hand-pushing bytes. Loop/if label
//! depths for `break`/`continue` are tracked with the same "stack of active
//! blocks, search by target" scheme as the teacher's `ControlFlowManager`
//! (`backends/wasm/control_flow.rs`).

use wasm_encoder::{
    BlockType, CodeSection, ExportKind, ExportSection, Function, FunctionSection, Instruction as W,
    Module as EncoderModule, TypeSection, ValType,
};

use crate::diagnostics::{ids, Diagnostic, DiagnosticList, Severity, SourcePos};
use crate::ir::{BinOp, Function as IrFunction, Instruction, Module, RegionData, RegionId, RegionKind};

/// A WASM function body may declare at most this many locals before we treat
/// it as a codegen-level resource limit rather than a legitimate program
/// (spec.md §6, id 4001). No hand-written test program comes close; this
/// exists so the diagnostic path is real, not dead code.
const MAX_LOCALS: usize = 50_000;

/// Emits `module` as a binary WASM 1.0 module, or appends a codegen
/// diagnostic and returns `None`. A `None` result at this stage always means
/// a compiler defect (the front end only ever produces IR this emitter can
/// encode), never a user-facing language-level error.
pub fn emit(module: &Module, diagnostics: &mut DiagnosticList) -> Option<Vec<u8>> {
    let function = module.functions.first()?;

    if function.locals.len() > MAX_LOCALS {
        diagnostics.push(Diagnostic::new(
            ids::CODEGEN_WASM_LIMIT_EXCEEDED,
            Severity::Codegen,
            SourcePos::default(),
            format!(
                "function `{}` declares {} locals, exceeding the {} supported by this emitter",
                function.name,
                function.locals.len(),
                MAX_LOCALS
            ),
        ));
        return None;
    }

    let mut types = TypeSection::new();
    types.ty().function([], [ValType::I32]);

    let mut functions = FunctionSection::new();
    functions.function(0);

    let mut exports = ExportSection::new();
    exports.export("main", ExportKind::Func, 0);

    let mut code = CodeSection::new();
    code.function(&encode_function(function));

    let mut out = EncoderModule::new();
    out.section(&types);
    out.section(&functions);
    out.section(&exports);
    out.section(&code);
    let bytes = out.finish();

    match wasmparser::validate(&bytes) {
        Ok(_) => Some(bytes),
        Err(err) => {
            diagnostics.push(Diagnostic::new(
                ids::CODEGEN_UNSUPPORTED_OPERATION,
                Severity::Codegen,
                SourcePos::default(),
                format!("internal error: emitted module failed validation: {err}"),
            ));
            None
        }
    }
}

fn encode_function(function: &IrFunction) -> Function {
    let wasm_locals: Vec<(u32, ValType)> = if function.locals.is_empty() {
        Vec::new()
    } else {
        vec![(function.locals.len() as u32, ValType::I32)]
    };

    let mut body = Function::new(wasm_locals);
    let mut labels = LabelStack::new();
    emit_region(&mut body, function, function.root_region, &mut labels);

    // Function epilogue: a well-typed fall-through for any path that didn't
    // already `return` (spec.md §4.6, §4.5 guarantee).
    body.instruction(&W::I32Const(0));
    body.instruction(&W::Return);
    body.instruction(&W::End);
    body
}

/// One entry per WASM structured-control-flow label currently open, ordered
/// outermost-first; `br`/`br_if` depth is this stack's length minus the
/// matched entry's position, searched innermost-first.
struct LabelStack(Vec<LabelRole>);

#[derive(Clone, Copy, PartialEq, Eq)]
enum LabelRole {
    /// A block/loop/if that is not itself a break/continue target (a plain
    /// `if`, or a `loop`'s internal back-edge label in a do-while).
    Plain,
    /// The outer `block` wrapping a loop: `break`'s target.
    Break(RegionId),
    /// Where a `continue` branches to: the `loop` itself for a `while`, or
    /// an inner `block` wrapping just the body for a `do-while` (so control
    /// lands on the condition check, not back at the top of the body).
    Continue(RegionId),
}

impl LabelStack {
    fn new() -> Self {
        LabelStack(Vec::new())
    }

    fn push(&mut self, role: LabelRole) {
        self.0.push(role);
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    /// Relative branch depth to the label matching `target`, innermost label
    /// first (depth 0).
    fn depth_to(&self, target: LabelRole) -> u32 {
        let position = self
            .0
            .iter()
            .rposition(|&role| role == target)
            .expect("semantic analysis guarantees a matching enclosing loop");
        (self.0.len() - 1 - position) as u32
    }
}

/// Emits one region's instructions in order, recursing into any nested
/// region a `Instruction::Region` marker points at. Plain `Block` regions
/// (compound-statement scopes) have no WASM representation of their own and
/// are simply inlined; `If`/`Loop` regions open real structured blocks.
fn emit_region(body: &mut Function, function: &IrFunction, id: RegionId, labels: &mut LabelStack) {
    let region = function.regions.get(id);
    for instr in &region.instructions {
        match instr {
            Instruction::Region(child) => emit_child_region(body, function, *child, labels),
            other => emit_instruction(body, other, labels),
        }
    }
}

fn emit_child_region(body: &mut Function, function: &IrFunction, id: RegionId, labels: &mut LabelStack) {
    let region = function.regions.get(id);
    match region.kind {
        RegionKind::Block => emit_region(body, function, id, labels),
        RegionKind::If => emit_if(body, function, id, labels),
        RegionKind::Loop => emit_loop(body, function, id, labels),
        RegionKind::Function => unreachable!("a function region is only ever a pipeline root"),
    }
}

fn emit_if(body: &mut Function, function: &IrFunction, id: RegionId, labels: &mut LabelStack) {
    let region = function.regions.get(id);
    let RegionData::If { then_region, else_region } = region.data else {
        unreachable!("If region without If data");
    };
    let block_type = if region.is_expression {
        BlockType::Result(ValType::I32)
    } else {
        BlockType::Empty
    };

    // An if-region's own instruction list holds only its condition (the
    // then/else bodies are separate regions reached through `data`), but the
    // condition can itself contain a nested if-region from a ternary, so it
    // has to go through the generic region walk rather than a flat loop.
    emit_region(body, function, id, labels);

    body.instruction(&W::If(block_type));
    labels.push(LabelRole::Plain);
    emit_region(body, function, then_region, labels);
    if let Some(else_region) = else_region {
        body.instruction(&W::Else);
        emit_region(body, function, else_region, labels);
    }
    labels.pop();
    body.instruction(&W::End);
}

fn emit_loop(body: &mut Function, function: &IrFunction, id: RegionId, labels: &mut LabelStack) {
    let region = function.regions.get(id);
    let RegionData::Loop {
        condition_region,
        body_region,
        is_do_while,
    } = region.data
    else {
        unreachable!("Loop region without Loop data");
    };

    body.instruction(&W::Block(BlockType::Empty));
    labels.push(LabelRole::Break(id));
    body.instruction(&W::Loop(BlockType::Empty));

    if is_do_while {
        labels.push(LabelRole::Plain); // loop's own back-edge label; never a user target
        body.instruction(&W::Block(BlockType::Empty));
        labels.push(LabelRole::Continue(id));
        emit_region(body, function, body_region, labels);
        labels.pop();
        body.instruction(&W::End);
        emit_region(body, function, condition_region, labels);
        body.instruction(&W::BrIf(labels.depth_to(LabelRole::Plain)));
    } else {
        labels.push(LabelRole::Continue(id));
        emit_region(body, function, condition_region, labels);
        body.instruction(&W::I32Eqz);
        body.instruction(&W::BrIf(labels.depth_to(LabelRole::Break(id))));
        emit_region(body, function, body_region, labels);
        body.instruction(&W::Br(labels.depth_to(LabelRole::Continue(id))));
    }

    labels.pop();
    body.instruction(&W::End);
    labels.pop();
    body.instruction(&W::End);
}

fn emit_instruction(body: &mut Function, instr: &Instruction, labels: &LabelStack) {
    match instr {
        Instruction::ConstI32(n) => {
            body.instruction(&W::I32Const(*n));
        }
        Instruction::LocalGet(i) => {
            body.instruction(&W::LocalGet(*i));
        }
        Instruction::LocalSet(i) => {
            body.instruction(&W::LocalSet(*i));
        }
        Instruction::Binary(op) => {
            body.instruction(&binop_instruction(*op));
        }
        Instruction::Eqz => {
            body.instruction(&W::I32Eqz);
        }
        Instruction::Drop => {
            body.instruction(&W::Drop);
        }
        Instruction::Return => {
            body.instruction(&W::Return);
        }
        Instruction::Break(target) => {
            body.instruction(&W::Br(labels.depth_to(LabelRole::Break(*target))));
        }
        Instruction::Continue(target) => {
            body.instruction(&W::Br(labels.depth_to(LabelRole::Continue(*target))));
        }
        Instruction::Region(_) => unreachable!("handled by emit_region"),
    }
}

fn binop_instruction(op: BinOp) -> W<'static> {
    match op {
        BinOp::Add => W::I32Add,
        BinOp::Sub => W::I32Sub,
        BinOp::Mul => W::I32Mul,
        BinOp::DivS => W::I32DivS,
        BinOp::RemS => W::I32RemS,
        BinOp::Eq => W::I32Eq,
        BinOp::Ne => W::I32Ne,
        BinOp::LtS => W::I32LtS,
        BinOp::GtS => W::I32GtS,
        BinOp::LeS => W::I32LeS,
        BinOp::GeS => W::I32GeS,
        BinOp::And => W::I32And,
        BinOp::Or => W::I32Or,
        BinOp::Xor => W::I32Xor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstArenas;
    use crate::diagnostics::DiagnosticList;
    use crate::parser::Parser;

    fn compile(source: &str) -> Vec<u8> {
        let arenas: &'static AstArenas<'static> = Box::leak(Box::new(AstArenas::new()));
        let mut diagnostics = DiagnosticList::new();
        let program = {
            let mut parser = Parser::new(source, arenas, &mut diagnostics);
            parser.parse_program().expect("parses")
        };
        assert!(crate::semantic::analyze(&program, &mut diagnostics));
        let ir = crate::ir::generate(&program);
        emit(&ir, &mut diagnostics).expect("emits")
    }

    #[test]
    fn module_begins_with_the_wasm_magic_and_version() {
        let bytes = compile("int main() { return 42; }");
        assert_eq!(&bytes[0..8], &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn emitted_module_validates() {
        let bytes = compile(
            "int main() { int i = 0; int s = 0; while (i < 5) { s = s + i; i = i + 1; } return s; }",
        );
        wasmparser::validate(&bytes).expect("valid module");
    }

    #[test]
    fn do_while_with_break_and_continue_validates() {
        let bytes = compile(
            "int main() { int i = 0; do { i = i + 1; if (i == 2) continue; if (i == 4) break; } while (i < 10); return i; }",
        );
        wasmparser::validate(&bytes).expect("valid module");
    }

    #[test]
    fn ternary_nested_inside_a_condition_validates() {
        let bytes = compile("int main() { if ((1 ? 2 : 3) == 2) { return 1; } return 0; }");
        wasmparser::validate(&bytes).expect("valid module");
    }

    #[test]
    fn nested_loops_with_break_validate() {
        let bytes = compile(
            "int main() { int i = 0; int t = 0; while (i < 3) { int j = 0; while (j < 3) { if (j == 1) break; t = t + 1; j = j + 1; } i = i + 1; } return t; }",
        );
        wasmparser::validate(&bytes).expect("valid module");
    }
}
