//! Recursive-descent parser.
//!
//! One method per precedence level (spec.md §4.3), each calling the next
//! tighter level before looking for its own operators. A parse method
//! returns `None` after it has already appended a diagnostic and
//! synchronized — callers propagate `None` rather than re-reporting.

use crate::ast::{AstArenas, BinaryOp, Expr, ExprKind, Function, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostics::{ids, Diagnostic, DiagnosticList, Severity, SourcePos};
use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;

pub struct Parser<'a, 'd> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    arenas: &'a AstArenas<'a>,
    diagnostics: &'d mut DiagnosticList,
    consumed: u64,
}

impl<'a, 'd> Parser<'a, 'd> {
    pub fn new(source: &'a str, arenas: &'a AstArenas<'a>, diagnostics: &'d mut DiagnosticList) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token(diagnostics);
        Parser {
            lexer,
            current,
            arenas,
            diagnostics,
            consumed: 0,
        }
    }

    /// Parse a whole program, or return `None` if the function definition
    /// itself could not be recovered from.
    pub fn parse_program(&mut self) -> Option<Program<'a>> {
        let function = self.parse_function()?;
        Some(Program { function })
    }

    // ---- helpers ---------------------------------------------------

    fn bump(&mut self) -> Token<'a> {
        let previous = self.current;
        self.current = self.lexer.next_token(self.diagnostics);
        self.consumed += 1;
        previous
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&mut self, id: u32, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::new(id, Severity::Syntax, self.current.pos, message.into())
                .with_byte_range(self.current_byte_range()),
        );
    }

    fn error_with_suggestion(&mut self, id: u32, message: impl Into<String>, suggestion: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::new(id, Severity::Syntax, self.current.pos, message.into())
                .with_suggestion(suggestion.into())
                .with_byte_range(self.current_byte_range()),
        );
    }

    fn current_byte_range(&self) -> std::ops::Range<u32> {
        self.current.start_byte as u32..self.current.end_byte() as u32
    }

    /// Skip tokens until the next `;`, `{`, `}`, or `EOF`, without consuming
    /// it (spec.md §4.3 "error recovery").
    fn synchronize(&mut self) {
        while !matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::CloseBrace | TokenKind::Eof
        ) {
            self.bump();
        }
    }

    fn expect(&mut self, kind: TokenKind, id: u32, what: &str) -> Option<Token<'a>> {
        if self.check(kind) {
            Some(self.bump())
        } else {
            self.error(id, format!("expected {what}, found `{}`", self.current.text));
            self.synchronize();
            None
        }
    }

    fn expect_semicolon(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::Semicolon, ids::SYNTAX_MISSING_SEMICOLON, "`;`")
    }

    fn expect_open_paren(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::OpenParen, ids::SYNTAX_MISSING_PAREN, "`(`")
    }

    fn expect_close_paren(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::CloseParen, ids::SYNTAX_MISSING_PAREN, "`)`")
    }

    fn expect_open_brace(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::OpenBrace, ids::SYNTAX_MISSING_BRACE, "`{`")
    }

    fn expect_close_brace(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::CloseBrace, ids::SYNTAX_MISSING_BRACE, "`}`")
    }

    fn expect_identifier(&mut self) -> Option<Token<'a>> {
        self.expect(TokenKind::Identifier, ids::SYNTAX_EXPECTED_TOKEN, "an identifier")
    }

    fn alloc_expr(&self, kind: ExprKind<'a>, pos: SourcePos) -> &'a Expr<'a> {
        self.arenas.exprs.alloc(Expr::new(kind, pos))
    }

    fn alloc_stmt(&self, kind: StmtKind<'a>, pos: SourcePos) -> &'a Stmt<'a> {
        self.arenas.stmts.alloc(Stmt::new(kind, pos))
    }

    // ---- function ----------------------------------------------------

    fn parse_function(&mut self) -> Option<&'a Function<'a>> {
        let pos = self.current.pos;
        self.expect(TokenKind::Int, ids::SYNTAX_EXPECTED_FUNCTION, "`int`")?;
        let name_tok = self.expect_identifier()?;
        self.expect_open_paren()?;
        self.expect_close_paren()?;
        self.expect_open_brace()?;

        let mut body = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        self.expect_close_brace()?;

        Some(self.arenas.functions.alloc(Function {
            name: name_tok.text,
            body,
            pos,
        }))
    }

    // ---- statements ----------------------------------------------------

    fn parse_statement(&mut self) -> Option<&'a Stmt<'a>> {
        let before = self.consumed;
        let result = self.parse_statement_inner();
        if self.consumed == before {
            // Nothing moved the cursor (e.g. a stray token couldn't start any
            // statement or expression); force progress so the caller's loop
            // can't spin forever.
            self.bump();
        }
        result
    }

    fn parse_statement_inner(&mut self) -> Option<&'a Stmt<'a>> {
        match self.current.kind {
            TokenKind::Int => self.parse_variable_decl(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Break => self.parse_break_stmt(),
            TokenKind::Continue => self.parse_continue_stmt(),
            TokenKind::OpenBrace => self.parse_compound_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_variable_decl(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `int`
        let name_tok = self.expect_identifier()?;
        let init = if self.matches(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        Some(self.alloc_stmt(
            StmtKind::VariableDecl {
                name: name_tok.text,
                init,
            },
            pos,
        ))
    }

    fn parse_return_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `return`
        let value = self.parse_expression()?;
        self.expect_semicolon()?;
        Some(self.alloc_stmt(StmtKind::Return(value), pos))
    }

    fn parse_if_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `if`
        self.expect_open_paren()?;
        let cond = self.parse_expression()?;
        self.expect_close_paren()?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.matches(TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Some(self.alloc_stmt(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            pos,
        ))
    }

    fn parse_while_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `while`
        self.expect_open_paren()?;
        let cond = self.parse_expression()?;
        self.expect_close_paren()?;
        let body = self.parse_statement()?;
        Some(self.alloc_stmt(StmtKind::While { cond, body }, pos))
    }

    fn parse_do_while_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `do`
        let body = self.parse_statement()?;
        self.expect(TokenKind::While, ids::SYNTAX_EXPECTED_TOKEN, "`while`")?;
        self.expect_open_paren()?;
        let cond = self.parse_expression()?;
        self.expect_close_paren()?;
        self.expect_semicolon()?;
        Some(self.alloc_stmt(StmtKind::DoWhile { cond, body }, pos))
    }

    fn parse_break_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `break`
        self.expect_semicolon()?;
        Some(self.alloc_stmt(StmtKind::Break, pos))
    }

    fn parse_continue_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `continue`
        self.expect_semicolon()?;
        Some(self.alloc_stmt(StmtKind::Continue, pos))
    }

    fn parse_compound_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        self.bump(); // `{`
        let mut stmts = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
        }
        self.expect_close_brace()?;
        Some(self.alloc_stmt(StmtKind::Compound(stmts), pos))
    }

    fn parse_expr_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let pos = self.current.pos;
        let expr = self.parse_expression()?;
        self.expect_semicolon()?;
        Some(self.alloc_stmt(StmtKind::Expr(expr), pos))
    }

    // ---- expressions ----------------------------------------------------

    fn parse_expression(&mut self) -> Option<&'a Expr<'a>> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<&'a Expr<'a>> {
        let target = self.parse_ternary()?;
        if self.matches(TokenKind::Eq) {
            let value = self.parse_assignment()?;
            match target.kind {
                ExprKind::Variable(name) => Some(self.alloc_expr(
                    ExprKind::Assign { target: name, value },
                    target.pos,
                )),
                _ => {
                    self.diagnostics.push(Diagnostic::new(
                        ids::SEM_INVALID_ASSIGNMENT,
                        Severity::Semantic,
                        target.pos,
                        "invalid assignment target: only a variable may be assigned to",
                    ));
                    None
                }
            }
        } else {
            Some(target)
        }
    }

    fn parse_ternary(&mut self) -> Option<&'a Expr<'a>> {
        let cond = self.parse_logical_or()?;
        if self.matches(TokenKind::Question) {
            let then_branch = self.parse_assignment()?;
            self.expect(TokenKind::Colon, ids::SYNTAX_EXPECTED_TOKEN, "`:`")?;
            let else_branch = self.parse_ternary()?;
            Some(self.alloc_expr(
                ExprKind::Ternary {
                    cond,
                    then_branch,
                    else_branch,
                },
                cond.pos,
            ))
        } else {
            Some(cond)
        }
    }

    fn parse_logical_or(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_logical_and()?;
        while self.check(TokenKind::PipePipe) {
            self.bump();
            let right = self.parse_logical_and()?;
            left = self.alloc_expr(
                ExprKind::Binary {
                    op: BinaryOp::LogicalOr,
                    left,
                    right,
                },
                left.pos,
            );
        }
        Some(left)
    }

    fn parse_logical_and(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::AmpAmp) {
            self.bump();
            let right = self.parse_equality()?;
            left = self.alloc_expr(
                ExprKind::Binary {
                    op: BinaryOp::LogicalAnd,
                    left,
                    right,
                },
                left.pos,
            );
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let right = self.parse_relational()?;
            left = self.alloc_expr(ExprKind::Binary { op, left, right }, left.pos);
        }
        Some(left)
    }

    fn parse_relational(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive()?;
            left = self.alloc_expr(ExprKind::Binary { op, left, right }, left.pos);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = self.alloc_expr(ExprKind::Binary { op, left, right }, left.pos);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = self.alloc_expr(ExprKind::Binary { op, left, right }, left.pos);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<&'a Expr<'a>> {
        let pos = self.current.pos;
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Bang => UnaryOp::LogicalNot,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.bump();
        let operand = self.parse_unary()?;
        Some(self.alloc_expr(ExprKind::Unary { op, operand }, pos))
    }

    fn parse_primary(&mut self) -> Option<&'a Expr<'a>> {
        let pos = self.current.pos;
        match self.current.kind {
            TokenKind::IntegerLiteral => {
                let tok = self.bump();
                let value: i32 = tok.text.parse().unwrap_or_else(|_| {
                    self.diagnostics.push(
                        Diagnostic::new(
                            ids::LEX_NUMBER_TOO_LARGE,
                            Severity::Lexical,
                            pos,
                            format!("integer literal `{}` does not fit in 32 bits", tok.text),
                        )
                        .with_byte_range(tok.start_byte as u32..tok.end_byte() as u32),
                    );
                    0
                });
                Some(self.alloc_expr(ExprKind::IntegerConstant(value), pos))
            }
            TokenKind::Identifier => {
                let tok = self.bump();
                Some(self.alloc_expr(ExprKind::Variable(tok.text), pos))
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect_close_paren()?;
                Some(expr)
            }
            _ => {
                self.error_with_suggestion(
                    ids::SYNTAX_EXPECTED_EXPRESSION,
                    format!("expected an expression, found `{}`", self.current.text),
                    "insert a literal, variable, or parenthesized expression here",
                );
                self.synchronize();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StmtKind;

    fn parse(source: &str) -> (Option<Program<'_>>, DiagnosticList) {
        // Leaked so the returned `Program` can outlive this helper without
        // threading an explicit arena through every test.
        let arenas: &'static AstArenas<'static> = Box::leak(Box::new(AstArenas::new()));
        let mut diagnostics = DiagnosticList::new();
        let mut parser = Parser::new(source, arenas, &mut diagnostics);
        let program = parser.parse_program();
        (program, diagnostics)
    }

    #[test]
    fn parses_minimal_function() {
        let (program, diags) = parse("int main() { return 42; }");
        assert!(!diags.has_fatal());
        let program = program.expect("should parse");
        assert_eq!(program.function.name, "main");
        assert_eq!(program.function.body.len(), 1);
        assert!(matches!(program.function.body[0].kind, StmtKind::Return(_)));
    }

    #[test]
    fn assignment_is_right_associative_and_low_precedence() {
        let (program, diags) = parse("int main() { int a = 0; int b = 0; a = b = 1; return a; }");
        assert!(!diags.has_fatal());
        let program = program.unwrap();
        let assign_stmt = &program.function.body[2];
        match assign_stmt.kind {
            StmtKind::Expr(expr) => match expr.kind {
                ExprKind::Assign { target, value } => {
                    assert_eq!(target, "a");
                    assert!(matches!(value.kind, ExprKind::Assign { target: "b", .. }));
                }
                _ => panic!("expected assignment expression"),
            },
            _ => panic!("expected expression statement"),
        }
    }

    #[test]
    fn invalid_assignment_target_is_rejected() {
        let (_, diags) = parse("int main() { 1 = 2; return 0; }");
        assert!(diags.has_fatal());
        assert!(diags.iter().any(|d| d.id == ids::SEM_INVALID_ASSIGNMENT));
    }

    #[test]
    fn missing_semicolon_then_missing_brace_reports_both() {
        let (_, diags) = parse("int main() { return 1");
        let ids_seen: Vec<u32> = diags.iter().map(|d| d.id).collect();
        assert!(ids_seen.contains(&ids::SYNTAX_MISSING_SEMICOLON));
        assert!(ids_seen.contains(&ids::SYNTAX_MISSING_BRACE));
    }

    #[test]
    fn syntax_diagnostic_carries_the_offending_token_byte_range() {
        // Missing `;` is reported pointing at EOF, an empty span at the end
        // of the source rather than some earlier token's span.
        let source = "int main() { return 1";
        let (_, diags) = parse(source);
        let diag = diags
            .iter()
            .find(|d| d.id == ids::SYNTAX_MISSING_SEMICOLON)
            .expect("missing semicolon diagnostic");
        assert_eq!(diag.byte_range, source.len() as u32..source.len() as u32);
    }

    #[test]
    fn ternary_is_right_associative() {
        let (program, diags) = parse("int main() { return 1 ? 2 : 3 ? 4 : 5; }");
        assert!(!diags.has_fatal());
        let program = program.unwrap();
        match program.function.body[0].kind {
            StmtKind::Return(expr) => match expr.kind {
                ExprKind::Ternary { else_branch, .. } => {
                    assert!(matches!(else_branch.kind, ExprKind::Ternary { .. }));
                }
                _ => panic!("expected ternary"),
            },
            _ => panic!("expected return"),
        }
    }

    #[test]
    fn non_advancing_error_still_makes_progress() {
        let (_, diags) = parse("int main() { ) ) return 0; }");
        assert!(diags.has_fatal());
    }
}
