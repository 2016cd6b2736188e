//! Intermediate representation: structured regions over a stack machine.
//!
//! The region tree mirrors WASM's structured control flow directly — no
//! basic-block CFG is built (spec.md §9). Lowering from AST to IR lives in
//! [`generator`].

pub mod generator;
pub mod instruction;
pub mod region;

pub use generator::generate;
pub use instruction::{BinOp, Instruction};
pub use region::{Region, RegionArena, RegionData, RegionId, RegionKind};

/// One local variable slot. Position in [`Function::locals`] *is* its WASM
/// local index — locals never shift once added (spec.md §3).
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I32,
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub return_type: ValueType,
    pub locals: Vec<Local>,
    pub regions: RegionArena,
    pub root_region: RegionId,
    /// Rough upper bound on simultaneous live operand-stack values, derived
    /// from expression nesting depth during lowering. Used by the emitter to
    /// flag pathological input before it tries to serialize it.
    pub stack_size_bound: u32,
}

#[derive(Debug)]
pub struct Module {
    pub functions: Vec<Function>,
}

/// Renders an IR module as indented text for `--print-ir` (spec.md §6),
/// walking the region tree the same way the emitter does rather than a flat
/// instruction dump, so nesting is visible.
pub mod print {
    use super::*;
    use std::fmt::Write as _;

    pub fn module(out: &mut String, module: &Module) {
        for function in &module.functions {
            self::function(out, function);
        }
    }

    fn function(out: &mut String, function: &Function) {
        writeln!(
            out,
            "Function: {} (locals: {}, stack bound: {})",
            function.name,
            function.locals.len(),
            function.stack_size_bound
        )
        .unwrap();
        for (i, local) in function.locals.iter().enumerate() {
            writeln!(out, "  local {i}: {}", local.name).unwrap();
        }
        region(out, &function.regions, function.root_region, 1);
    }

    fn region(out: &mut String, regions: &RegionArena, id: RegionId, depth: usize) {
        let r = regions.get(id);
        let indent = "  ".repeat(depth);
        writeln!(
            out,
            "{indent}Region #{} {:?}{}",
            id.0,
            r.kind,
            if r.is_expression { " (expression)" } else { "" }
        )
        .unwrap();
        for instr in &r.instructions {
            match instr {
                Instruction::Region(child) => region(out, regions, *child, depth + 1),
                other => writeln!(out, "{indent}  {}", instruction_text(other)).unwrap(),
            }
        }

        // `If`/`Loop` regions reach their then/else or condition/body
        // sub-regions only through `data`, not through an `Instruction::Region`
        // marker in their own instruction stream (see
        // `generator::Generator::lower_if`/`lower_loop`) — the emitter walks
        // them the same way, so the printer has to match it rather than rely
        // on the instruction-stream markers alone.
        match r.data {
            RegionData::If { then_region, else_region } => {
                writeln!(out, "{indent}  Then:").unwrap();
                region(out, regions, then_region, depth + 2);
                if let Some(else_region) = else_region {
                    writeln!(out, "{indent}  Else:").unwrap();
                    region(out, regions, else_region, depth + 2);
                }
            }
            RegionData::Loop {
                condition_region,
                body_region,
                is_do_while,
            } => {
                if is_do_while {
                    writeln!(out, "{indent}  Body:").unwrap();
                    region(out, regions, body_region, depth + 2);
                    writeln!(out, "{indent}  Condition:").unwrap();
                    region(out, regions, condition_region, depth + 2);
                } else {
                    writeln!(out, "{indent}  Condition:").unwrap();
                    region(out, regions, condition_region, depth + 2);
                    writeln!(out, "{indent}  Body:").unwrap();
                    region(out, regions, body_region, depth + 2);
                }
            }
            RegionData::None => {}
        }
    }

    fn instruction_text(instr: &Instruction) -> String {
        match instr {
            Instruction::ConstI32(n) => format!("const.i32 {n}"),
            Instruction::LocalGet(i) => format!("local.get {i}"),
            Instruction::LocalSet(i) => format!("local.set {i}"),
            Instruction::Binary(op) => format!("{op:?}"),
            Instruction::Eqz => "eqz".to_string(),
            Instruction::Drop => "drop".to_string(),
            Instruction::Return => "return".to_string(),
            Instruction::Break(target) => format!("break -> region #{}", target.0),
            Instruction::Continue(target) => format!("continue -> region #{}", target.0),
            Instruction::Region(id) => format!("region #{}", id.0),
        }
    }
}
