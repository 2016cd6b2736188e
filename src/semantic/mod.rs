//! Semantic analysis: name resolution and flow-sensitive legality checks.
//!
//! Walks the AST read-only (spec.md §4.4: "does not mutate the AST") and
//! appends diagnostics for every violation it finds rather than stopping at
//! the first one, so a single run surfaces as many problems as possible.

use crate::ast::{Function, Program, Stmt, StmtKind};
use crate::diagnostics::{ids, Diagnostic, DiagnosticList, Severity, SourcePos};
use crate::symbol_table::{Binding, SymbolTable};

/// Returns `true` iff analysis appended no fatal diagnostic.
pub fn analyze<'a>(program: &Program<'a>, diagnostics: &mut DiagnosticList) -> bool {
    let mut analyzer = Analyzer {
        symbols: SymbolTable::new(),
        next_local: 0,
        loop_depth: 0,
        diagnostics,
    };
    analyzer.analyze_function(program.function);
    !analyzer.diagnostics.has_fatal()
}

struct Analyzer<'d> {
    symbols: SymbolTable,
    next_local: u32,
    loop_depth: u32,
    diagnostics: &'d mut DiagnosticList,
}

impl Analyzer<'_> {
    fn analyze_function<'a>(&mut self, function: &Function<'a>) {
        self.symbols.push_scope();
        for stmt in &function.body {
            self.analyze_stmt(stmt);
        }
        self.symbols.pop_scope();
    }

    fn declare_variable(&mut self, name: &str, pos: SourcePos) {
        let binding = Binding {
            local_index: self.next_local,
        };
        if self.symbols.declare(name, binding) {
            self.next_local += 1;
        } else {
            self.diagnostics.push(Diagnostic::new(
                ids::SEM_REDEFINITION,
                Severity::Semantic,
                pos,
                format!("redefinition of `{name}`"),
            ));
        }
    }

    /// The "dependent statement" of an `if`/`while`/`do-while` that is a raw
    /// variable declaration has no scope to hold it in (spec.md §4.4).
    fn check_dependent_statement<'a>(&mut self, stmt: &Stmt<'a>) {
        if let StmtKind::VariableDecl { name, .. } = &stmt.kind {
            self.diagnostics.push(
                Diagnostic::new(
                    ids::SEM_DEPENDENT_STATEMENT_DECL,
                    Severity::Semantic,
                    stmt.pos,
                    format!("declaration of `{name}` cannot be the sole body of a control statement"),
                )
                .with_suggestion("wrap the declaration in `{ }`"),
            );
        }
    }

    fn analyze_stmt<'a>(&mut self, stmt: &Stmt<'a>) {
        match &stmt.kind {
            StmtKind::VariableDecl { name, init } => {
                if let Some(init) = init {
                    self.analyze_expr(init);
                }
                self.declare_variable(name, stmt.pos);
            }
            StmtKind::Return(expr) => self.analyze_expr(expr),
            StmtKind::Expr(expr) => self.analyze_expr(expr),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.analyze_expr(cond);
                self.check_dependent_statement(then_branch);
                self.analyze_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_dependent_statement(else_branch);
                    self.analyze_stmt(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.analyze_expr(cond);
                self.check_dependent_statement(body);
                self.loop_depth += 1;
                self.analyze_stmt(body);
                self.loop_depth -= 1;
            }
            StmtKind::DoWhile { cond, body } => {
                self.check_dependent_statement(body);
                self.loop_depth += 1;
                self.analyze_stmt(body);
                self.loop_depth -= 1;
                self.analyze_expr(cond);
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.diagnostics.push(Diagnostic::new(
                        ids::SEM_BREAK_OUTSIDE_LOOP,
                        Severity::Semantic,
                        stmt.pos,
                        "`break` outside any enclosing loop",
                    ));
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.diagnostics.push(Diagnostic::new(
                        ids::SEM_CONTINUE_OUTSIDE_LOOP,
                        Severity::Semantic,
                        stmt.pos,
                        "`continue` outside any enclosing loop",
                    ));
                }
            }
            StmtKind::Compound(stmts) => {
                self.symbols.push_scope();
                for s in stmts {
                    self.analyze_stmt(s);
                }
                self.symbols.pop_scope();
            }
        }
    }

    fn analyze_expr<'a>(&mut self, expr: &crate::ast::Expr<'a>) {
        use crate::ast::ExprKind;
        match &expr.kind {
            ExprKind::IntegerConstant(_) => {}
            ExprKind::Variable(name) => {
                if self.symbols.resolve(name).is_none() {
                    self.diagnostics.push(Diagnostic::new(
                        ids::SEM_UNDEFINED_VARIABLE,
                        Severity::Semantic,
                        expr.pos,
                        format!("undeclared variable `{name}`"),
                    ));
                }
            }
            ExprKind::Unary { operand, .. } => self.analyze_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.analyze_expr(left);
                self.analyze_expr(right);
            }
            ExprKind::Assign { target, value } => {
                self.analyze_expr(value);
                if self.symbols.resolve(target).is_none() {
                    self.diagnostics.push(Diagnostic::new(
                        ids::SEM_UNDEFINED_VARIABLE,
                        Severity::Semantic,
                        expr.pos,
                        format!("undeclared variable `{target}`"),
                    ));
                }
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.analyze_expr(cond);
                self.analyze_expr(then_branch);
                self.analyze_expr(else_branch);
            }
        }
    }
}
