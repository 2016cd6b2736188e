//! Lowers a semantically-valid AST into an IR [`Module`] (spec.md §4.5).
//!
//! Only called after the semantic analyzer has returned success, so this
//! stage never needs to report diagnostics of its own — every name resolves
//! and every assignment target is legal by construction.

use crate::ast::{BinaryOp, Expr, ExprKind, Function as AstFunction, Program, Stmt, StmtKind, UnaryOp};
use crate::symbol_table::{Binding, SymbolTable};

use super::region::{RegionData, RegionId, RegionKind};
use super::{BinOp, Function, Instruction, Local, Module, RegionArena, ValueType};

pub fn generate(program: &Program<'_>) -> Module {
    let function = Generator::new().generate_function(program.function);
    Module {
        functions: vec![function],
    }
}

/// One operand to a ternary-shaped lowering: either a full subexpression or
/// a bare constant, used to desugar `&&`/`||` without allocating a
/// throwaway AST node for the `0`/`1` literal (spec.md §4.5).
enum TernaryArm<'a> {
    Expr(&'a Expr<'a>),
    Const(i32),
    /// Like `Expr`, but boolean-normalized (`!!x`) after lowering. `&&`/`||`
    /// must always yield `0`/`1` even when the short-circuited operand is
    /// some other nonzero value (e.g. `0 || 2` is `1`, not `2`) — unlike a
    /// real ternary operator, whose arms pass through unchanged.
    Bool(&'a Expr<'a>),
}

struct Generator {
    regions: RegionArena,
    symbols: SymbolTable,
    loop_stack: Vec<RegionId>,
    locals: Vec<Local>,
    expr_depth: u32,
    max_expr_depth: u32,
}

impl Generator {
    fn new() -> Self {
        Generator {
            regions: RegionArena::new(),
            symbols: SymbolTable::new(),
            loop_stack: Vec::new(),
            locals: Vec::new(),
            expr_depth: 0,
            max_expr_depth: 0,
        }
    }

    fn generate_function(mut self, function: &AstFunction<'_>) -> Function {
        let root = self.regions.create(RegionKind::Function, None, false);
        self.symbols.push_scope();
        for stmt in &function.body {
            self.lower_statement(root, stmt);
        }
        self.symbols.pop_scope();

        Function {
            name: function.name.to_string(),
            return_type: ValueType::I32,
            locals: self.locals,
            regions: self.regions,
            root_region: root,
            stack_size_bound: self.max_expr_depth + 1,
        }
    }

    fn declare_local(&mut self, name: &str) -> u32 {
        let index = self.locals.len() as u32;
        self.locals.push(Local { name: name.to_string() });
        self.symbols.declare(name, Binding { local_index: index });
        index
    }

    fn resolve_local(&self, name: &str) -> u32 {
        self.symbols
            .resolve(name)
            .expect("semantic analysis guarantees every reference resolves")
            .local_index
    }

    // ---- statements ----------------------------------------------------

    fn lower_statement(&mut self, region: RegionId, stmt: &Stmt<'_>) {
        match &stmt.kind {
            StmtKind::Return(expr) => {
                self.lower_expr(region, expr);
                self.regions.emit(region, Instruction::Return);
            }
            StmtKind::VariableDecl { name, init } => {
                let index = self.declare_local(name);
                if let Some(init) = init {
                    self.lower_expr(region, init);
                    self.regions.emit(region, Instruction::LocalSet(index));
                }
            }
            StmtKind::Expr(expr) => {
                self.lower_expr(region, expr);
                self.regions.emit(region, Instruction::Drop);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.lower_if(region, cond, then_branch, *else_branch, false);
            }
            StmtKind::While { cond, body } => self.lower_loop(region, cond, body, false),
            StmtKind::DoWhile { cond, body } => self.lower_loop(region, cond, body, true),
            StmtKind::Break => {
                let target = *self.loop_stack.last().expect("semantic analysis guarantees an enclosing loop");
                self.regions.emit(region, Instruction::Break(target));
            }
            StmtKind::Continue => {
                let target = *self.loop_stack.last().expect("semantic analysis guarantees an enclosing loop");
                self.regions.emit(region, Instruction::Continue(target));
            }
            StmtKind::Compound(stmts) => {
                let block = self.regions.create(RegionKind::Block, Some(region), false);
                self.symbols.push_scope();
                for s in stmts {
                    self.lower_statement(block, s);
                }
                self.symbols.pop_scope();
                self.regions.attach_child(region, block);
            }
        }
    }

    fn lower_if(
        &mut self,
        region: RegionId,
        cond: &Expr<'_>,
        then_branch: &Stmt<'_>,
        else_branch: Option<&Stmt<'_>>,
        is_expression: bool,
    ) -> RegionId {
        let if_region = self.regions.create(RegionKind::If, Some(region), is_expression);
        self.lower_expr(if_region, cond);

        let then_region = self.regions.create(RegionKind::Block, Some(if_region), is_expression);
        self.symbols.push_scope();
        self.lower_statement(then_region, then_branch);
        self.symbols.pop_scope();

        let else_region = else_branch.map(|else_stmt| {
            let r = self.regions.create(RegionKind::Block, Some(if_region), is_expression);
            self.symbols.push_scope();
            self.lower_statement(r, else_stmt);
            self.symbols.pop_scope();
            r
        });

        self.regions.get_mut(if_region).children.push(then_region);
        if let Some(r) = else_region {
            self.regions.get_mut(if_region).children.push(r);
        }
        self.regions.set_data(
            if_region,
            RegionData::If {
                then_region,
                else_region,
            },
        );
        self.regions.attach_child(region, if_region);
        if_region
    }

    fn lower_loop(&mut self, region: RegionId, cond: &Expr<'_>, body: &Stmt<'_>, is_do_while: bool) {
        let loop_region = self.regions.create(RegionKind::Loop, Some(region), false);
        let condition_region = self.regions.create(RegionKind::Block, Some(loop_region), false);
        self.lower_expr(condition_region, cond);

        let body_region = self.regions.create(RegionKind::Block, Some(loop_region), false);
        self.loop_stack.push(loop_region);
        self.symbols.push_scope();
        self.lower_statement(body_region, body);
        self.symbols.pop_scope();
        self.loop_stack.pop();

        let children = if is_do_while {
            [body_region, condition_region]
        } else {
            [condition_region, body_region]
        };
        self.regions.get_mut(loop_region).children.extend(children);
        self.regions.set_data(
            loop_region,
            RegionData::Loop {
                condition_region,
                body_region,
                is_do_while,
            },
        );
        self.regions.attach_child(region, loop_region);
    }

    // ---- expressions ----------------------------------------------------

    fn lower_expr(&mut self, region: RegionId, expr: &Expr<'_>) {
        self.expr_depth += 1;
        self.max_expr_depth = self.max_expr_depth.max(self.expr_depth);

        match &expr.kind {
            ExprKind::IntegerConstant(n) => {
                self.regions.emit(region, Instruction::ConstI32(*n));
            }
            ExprKind::Variable(name) => {
                let index = self.resolve_local(name);
                self.regions.emit(region, Instruction::LocalGet(index));
            }
            ExprKind::Unary { op, operand } => {
                self.lower_expr(region, operand);
                match op {
                    UnaryOp::Negate => {
                        self.regions.emit(region, Instruction::ConstI32(-1));
                        self.regions.emit(region, Instruction::Binary(BinOp::Mul));
                    }
                    UnaryOp::BitNot => {
                        self.regions.emit(region, Instruction::ConstI32(-1));
                        self.regions.emit(region, Instruction::Binary(BinOp::Xor));
                    }
                    UnaryOp::LogicalNot => {
                        self.regions.emit(region, Instruction::Eqz);
                    }
                }
            }
            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::LogicalAnd => {
                    self.lower_ternary(region, left, TernaryArm::Bool(right), TernaryArm::Const(0));
                }
                BinaryOp::LogicalOr => {
                    self.lower_ternary(region, left, TernaryArm::Const(1), TernaryArm::Bool(right));
                }
                _ => {
                    self.lower_expr(region, left);
                    self.lower_expr(region, right);
                    self.regions.emit(region, Instruction::Binary(binop_of(*op)));
                }
            },
            ExprKind::Assign { target, value } => {
                self.lower_expr(region, value);
                let index = self.resolve_local(target);
                self.regions.emit(region, Instruction::LocalSet(index));
                self.regions.emit(region, Instruction::LocalGet(index));
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.lower_ternary(
                    region,
                    cond,
                    TernaryArm::Expr(then_branch),
                    TernaryArm::Expr(else_branch),
                );
            }
        }

        self.expr_depth -= 1;
    }

    /// Lowers `cond ? then_arm : else_arm` as an expression-context if-region
    /// (spec.md §4.5: `&&`/`||` are desugared into this same shape).
    fn lower_ternary(&mut self, region: RegionId, cond: &Expr<'_>, then_arm: TernaryArm<'_>, else_arm: TernaryArm<'_>) {
        let if_region = self.regions.create(RegionKind::If, Some(region), true);
        self.lower_expr(if_region, cond);

        let then_region = self.regions.create(RegionKind::Block, Some(if_region), true);
        self.lower_ternary_arm(then_region, then_arm);

        let else_region = self.regions.create(RegionKind::Block, Some(if_region), true);
        self.lower_ternary_arm(else_region, else_arm);

        self.regions.get_mut(if_region).children.push(then_region);
        self.regions.get_mut(if_region).children.push(else_region);
        self.regions.set_data(
            if_region,
            RegionData::If {
                then_region,
                else_region: Some(else_region),
            },
        );
        self.regions.attach_child(region, if_region);
    }

    fn lower_ternary_arm(&mut self, region: RegionId, arm: TernaryArm<'_>) {
        match arm {
            TernaryArm::Expr(expr) => self.lower_expr(region, expr),
            TernaryArm::Const(n) => self.regions.emit(region, Instruction::ConstI32(n)),
            TernaryArm::Bool(expr) => {
                self.lower_expr(region, expr);
                self.regions.emit(region, Instruction::Eqz);
                self.regions.emit(region, Instruction::Eqz);
            }
        }
    }
}

fn binop_of(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::DivS,
        BinaryOp::Rem => BinOp::RemS,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::Ne => BinOp::Ne,
        BinaryOp::Lt => BinOp::LtS,
        BinaryOp::Gt => BinOp::GtS,
        BinaryOp::Le => BinOp::LeS,
        BinaryOp::Ge => BinOp::GeS,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            unreachable!("short-circuit operators are desugared before reaching binop_of")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstArenas;
    use crate::diagnostics::DiagnosticList;
    use crate::parser::Parser;

    fn lower(source: &str) -> Module {
        let arenas: &'static AstArenas<'static> = Box::leak(Box::new(AstArenas::new()));
        let mut diagnostics = DiagnosticList::new();
        let program = {
            let mut parser = Parser::new(source, arenas, &mut diagnostics);
            parser.parse_program().expect("parses")
        };
        assert!(crate::semantic::analyze(&program, &mut diagnostics));
        generate(&program)
    }

    #[test]
    fn return_constant_emits_const_then_return() {
        let module = lower("int main() { return 42; }");
        let function = &module.functions[0];
        let root = function.regions.get(function.root_region);
        assert!(matches!(root.instructions[0], Instruction::ConstI32(42)));
        assert!(matches!(root.instructions[1], Instruction::Return));
    }

    #[test]
    fn variable_declaration_assigns_sequential_local_indices() {
        let module = lower("int main() { int a = 1; int b = 2; return a + b; }");
        let function = &module.functions[0];
        assert_eq!(function.locals.len(), 2);
        assert_eq!(function.locals[0].name, "a");
        assert_eq!(function.locals[1].name, "b");
    }

    #[test]
    fn logical_and_desugars_to_an_expression_if_region() {
        let module = lower("int main() { return 1 && 0; }");
        let function = &module.functions[0];
        let root = function.regions.get(function.root_region);
        let if_region_id = root
            .children
            .first()
            .copied()
            .expect("logical && lowers through a child if-region");
        let if_region = function.regions.get(if_region_id);
        assert_eq!(if_region.kind, RegionKind::If);
        assert!(if_region.is_expression);
    }

    #[test]
    fn logical_or_normalizes_a_nonzero_operand_to_one() {
        // `0 || 2` must yield `1`, not the raw operand `2` — the else arm
        // has to go through the `Bool` boolean-normalizing path.
        let module = lower("int main() { return 0 || 2; }");
        let function = &module.functions[0];
        let root = function.regions.get(function.root_region);
        let if_region_id = root.children[0];
        let if_region = function.regions.get(if_region_id);
        let RegionData::If { else_region, .. } = if_region.data else {
            panic!("expected if data");
        };
        let else_region = function.regions.get(else_region.expect("|| always has an else arm"));
        let eqz_count = else_region
            .instructions
            .iter()
            .filter(|instr| matches!(instr, Instruction::Eqz))
            .count();
        assert_eq!(eqz_count, 2, "else arm must double-Eqz to normalize to 0/1");
    }

    #[test]
    fn break_targets_the_nearest_enclosing_loop() {
        let module = lower("int main() { while (1) { break; } return 0; }");
        let function = &module.functions[0];
        let root = function.regions.get(function.root_region);
        let loop_id = root.children[0];
        let loop_region = function.regions.get(loop_id);
        let RegionData::Loop { body_region, .. } = loop_region.data else {
            panic!("expected loop data");
        };
        let body = function.regions.get(body_region);
        assert!(body
            .instructions
            .iter()
            .any(|instr| matches!(instr, Instruction::Break(target) if *target == loop_id)));
    }

    #[test]
    fn do_while_orders_body_before_condition() {
        let module = lower("int main() { int i = 0; do { i = i + 1; } while (i < 3); return i; }");
        let function = &module.functions[0];
        let root = function.regions.get(function.root_region);
        let loop_id = root.children[0];
        let loop_region = function.regions.get(loop_id);
        let RegionData::Loop {
            body_region,
            condition_region,
            is_do_while,
        } = loop_region.data
        else {
            panic!("expected loop data");
        };
        assert!(is_do_while);
        assert_eq!(loop_region.children, vec![body_region, condition_region]);
    }
}
