//! Abstract syntax tree.
//!
//! Nodes are tagged variants (spec.md §3, §9 "tagged variants for AST/IR")
//! rather than the source's tagged unions: each closed sum type is matched
//! exhaustively wherever it's consumed, so adding a variant is a compile
//! error at every missed arm instead of a silently-ignored default case.
//!
//! `Expr`/`Stmt`/`Function` are arena-allocated (see [`crate::arena`]) and
//! referenced by plain `&'a` borrows; only the arena itself owns them. Names
//! borrow directly from the source text rather than being copied or
//! re-interned, since the source outlives the arena for the whole pipeline.

use crate::arena::Arena;
use crate::diagnostics::SourcePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    LogicalNot,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone, Copy)]
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub pos: SourcePos,
}

impl<'a> Expr<'a> {
    pub fn new(kind: ExprKind<'a>, pos: SourcePos) -> Self {
        Expr { kind, pos }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    IntegerConstant(i32),
    Variable(&'a str),
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
    },
    Binary {
        op: BinaryOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Assign {
        target: &'a str,
        value: &'a Expr<'a>,
    },
    Ternary {
        cond: &'a Expr<'a>,
        then_branch: &'a Expr<'a>,
        else_branch: &'a Expr<'a>,
    },
}

#[derive(Debug)]
pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub pos: SourcePos,
}

impl<'a> Stmt<'a> {
    pub fn new(kind: StmtKind<'a>, pos: SourcePos) -> Self {
        Stmt { kind, pos }
    }
}

#[derive(Debug)]
pub enum StmtKind<'a> {
    Return(&'a Expr<'a>),
    VariableDecl {
        name: &'a str,
        init: Option<&'a Expr<'a>>,
    },
    Expr(&'a Expr<'a>),
    If {
        cond: &'a Expr<'a>,
        then_branch: &'a Stmt<'a>,
        else_branch: Option<&'a Stmt<'a>>,
    },
    While {
        cond: &'a Expr<'a>,
        body: &'a Stmt<'a>,
    },
    DoWhile {
        cond: &'a Expr<'a>,
        body: &'a Stmt<'a>,
    },
    Break,
    Continue,
    /// `{ stmt* }` — also used to hold a function's top-level body so that
    /// both share the same scope-opening behavior in the semantic analyzer
    /// and IR generator.
    Compound(Vec<&'a Stmt<'a>>),
}

#[derive(Debug)]
pub struct Function<'a> {
    pub name: &'a str,
    pub body: Vec<&'a Stmt<'a>>,
    pub pos: SourcePos,
}

#[derive(Debug)]
pub struct Program<'a> {
    pub function: &'a Function<'a>,
}

/// One arena per node family, bundled for convenience: every stage that
/// builds or walks the tree shares this handle instead of three loose ones.
#[derive(Default)]
pub struct AstArenas<'a> {
    pub exprs: Arena<Expr<'a>>,
    pub stmts: Arena<Stmt<'a>>,
    pub functions: Arena<Function<'a>>,
}

impl<'a> AstArenas<'a> {
    pub fn new() -> Self {
        AstArenas::default()
    }
}

/// Renders a parsed program as indented text for `--print-ast` (spec.md §6).
/// Mirrors the original `ast_print`'s one-line-per-node, two-space-per-depth
/// shape; not used by any other stage.
pub mod print {
    use super::*;
    use std::fmt::Write as _;

    pub fn program(out: &mut String, program: &Program<'_>) {
        writeln!(out, "Program").unwrap();
        function(out, program.function, 1);
    }

    fn indent(out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
    }

    fn function(out: &mut String, function: &Function<'_>, depth: usize) {
        indent(out, depth);
        writeln!(out, "Function: {}", function.name).unwrap();
        for stmt in &function.body {
            stmt_node(out, stmt, depth + 1);
        }
    }

    fn stmt_node(out: &mut String, stmt: &Stmt<'_>, depth: usize) {
        indent(out, depth);
        match &stmt.kind {
            StmtKind::Return(expr) => {
                writeln!(out, "Return").unwrap();
                expr_node(out, expr, depth + 1);
            }
            StmtKind::VariableDecl { name, init } => {
                writeln!(out, "Variable Declaration: {name}").unwrap();
                if let Some(init) = init {
                    expr_node(out, init, depth + 1);
                }
            }
            StmtKind::Expr(expr) => {
                writeln!(out, "Expression Statement").unwrap();
                expr_node(out, expr, depth + 1);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                writeln!(out, "If Statement").unwrap();
                indent(out, depth + 1);
                writeln!(out, "Condition:").unwrap();
                expr_node(out, cond, depth + 2);
                indent(out, depth + 1);
                writeln!(out, "Then:").unwrap();
                stmt_node(out, then_branch, depth + 2);
                if let Some(else_branch) = else_branch {
                    indent(out, depth + 1);
                    writeln!(out, "Else:").unwrap();
                    stmt_node(out, else_branch, depth + 2);
                }
            }
            StmtKind::While { cond, body } => {
                writeln!(out, "While").unwrap();
                indent(out, depth + 1);
                writeln!(out, "Condition:").unwrap();
                expr_node(out, cond, depth + 2);
                indent(out, depth + 1);
                writeln!(out, "Body:").unwrap();
                stmt_node(out, body, depth + 2);
            }
            StmtKind::DoWhile { cond, body } => {
                writeln!(out, "Do While").unwrap();
                indent(out, depth + 1);
                writeln!(out, "Body:").unwrap();
                stmt_node(out, body, depth + 2);
                indent(out, depth + 1);
                writeln!(out, "Condition:").unwrap();
                expr_node(out, cond, depth + 2);
            }
            StmtKind::Break => writeln!(out, "Break").unwrap(),
            StmtKind::Continue => writeln!(out, "Continue").unwrap(),
            StmtKind::Compound(stmts) => {
                writeln!(out, "Compound Statement").unwrap();
                for s in stmts {
                    stmt_node(out, s, depth + 1);
                }
            }
        }
    }

    fn expr_node(out: &mut String, expr: &Expr<'_>, depth: usize) {
        indent(out, depth);
        match &expr.kind {
            ExprKind::IntegerConstant(n) => writeln!(out, "Integer: {n}").unwrap(),
            ExprKind::Variable(name) => writeln!(out, "Variable Reference: {name}").unwrap(),
            ExprKind::Unary { op, operand } => {
                writeln!(out, "Unary: {}", unary_op_name(*op)).unwrap();
                expr_node(out, operand, depth + 1);
            }
            ExprKind::Binary { op, left, right } => {
                writeln!(out, "Binary: {}", binary_op_name(*op)).unwrap();
                expr_node(out, left, depth + 1);
                expr_node(out, right, depth + 1);
            }
            ExprKind::Assign { target, value } => {
                writeln!(out, "Assignment: {target}").unwrap();
                expr_node(out, value, depth + 1);
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                writeln!(out, "Ternary Expression").unwrap();
                indent(out, depth + 1);
                writeln!(out, "Condition:").unwrap();
                expr_node(out, cond, depth + 2);
                indent(out, depth + 1);
                writeln!(out, "True:").unwrap();
                expr_node(out, then_branch, depth + 2);
                indent(out, depth + 1);
                writeln!(out, "False:").unwrap();
                expr_node(out, else_branch, depth + 2);
            }
        }
    }

    fn unary_op_name(op: UnaryOp) -> &'static str {
        match op {
            UnaryOp::Negate => "-",
            UnaryOp::LogicalNot => "!",
            UnaryOp::BitNot => "~",
        }
    }

    fn binary_op_name(op: BinaryOp) -> &'static str {
        match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }
}
