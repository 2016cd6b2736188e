//! IR instruction set.
//!
//! A closed sum type, one variant per opcode, carrying exactly the operands
//! that opcode needs — not the source's generic "up to three tagged
//! operands" union (spec.md §9: re-architect as closed sum types so a
//! missing match arm is a compile error, not a silent default case).

use super::region::RegionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    DivS,
    RemS,
    Eq,
    Ne,
    LtS,
    GtS,
    LeS,
    GeS,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    ConstI32(i32),
    LocalGet(u32),
    LocalSet(u32),
    Binary(BinOp),
    /// `i32.eqz` — also how logical-not is lowered.
    Eqz,
    /// Discards the expression-statement's result value.
    Drop,
    Return,
    /// `break`, targeting the enclosing loop region by id; the emitter
    /// resolves this to a relative `br` depth.
    Break(RegionId),
    /// `continue`, targeting the enclosing loop region's condition label.
    Continue(RegionId),
    /// Marks a nested region's control construct at this point in the
    /// instruction stream (see [`super::region::RegionArena::attach_child`]).
    Region(RegionId),
}
