//! Structured compiler diagnostics.
//!
//! One [`DiagnosticList`] is threaded through the whole pipeline. Every stage
//! appends to it instead of failing fast, so a single run can report every
//! detectable problem rather than just the first one. Any error-severity
//! entry sets the list's sticky `fatal` flag; that flag, not a `Result`, is
//! what the driver checks before moving on to the next stage.

use std::fmt;
use std::path::{Path, PathBuf};

/// 1-based line/column pair identifying a single source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(line: u32, column: u32) -> Self {
        SourcePos { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Lexical,
    Syntax,
    Semantic,
    Codegen,
    Warning,
}

impl Severity {
    /// The word spec.md's diagnostic format prints: "error" for every
    /// error-level severity, "warning" for the one non-fatal severity.
    fn label(self) -> &'static str {
        match self {
            Severity::Lexical | Severity::Syntax | Severity::Semantic | Severity::Codegen => {
                "error"
            }
            Severity::Warning => "warning",
        }
    }

    fn is_fatal(self) -> bool {
        !matches!(self, Severity::Warning)
    }
}

/// Stable diagnostic identifiers, grouped by the 1000-series ranges in
/// spec.md §6. Kept as plain `u32` ids (not an enum) because the format
/// spec.md mandates prints the raw number — an enum would just be relabeled
/// back into these same integers at the print site.
pub mod ids {
    pub const LEX_INVALID_CHARACTER: u32 = 1001;
    pub const LEX_UNTERMINATED_STRING: u32 = 1002;
    pub const LEX_UNTERMINATED_COMMENT: u32 = 1003;
    pub const LEX_INVALID_ESCAPE: u32 = 1004;
    pub const LEX_NUMBER_TOO_LARGE: u32 = 1005;

    pub const SYNTAX_EXPECTED_TOKEN: u32 = 2001;
    pub const SYNTAX_UNEXPECTED_TOKEN: u32 = 2002;
    pub const SYNTAX_MISSING_SEMICOLON: u32 = 2003;
    pub const SYNTAX_MISSING_BRACE: u32 = 2004;
    pub const SYNTAX_MISSING_PAREN: u32 = 2005;
    pub const SYNTAX_MALFORMED_EXPRESSION: u32 = 2006;
    pub const SYNTAX_EXPECTED_FUNCTION: u32 = 2007;
    pub const SYNTAX_EXPECTED_STATEMENT: u32 = 2008;
    pub const SYNTAX_EXPECTED_EXPRESSION: u32 = 2009;
    pub const SYNTAX_MISSING_OPERATOR: u32 = 2010;

    pub const SEM_UNDEFINED_VARIABLE: u32 = 3001;
    pub const SEM_UNDEFINED_FUNCTION: u32 = 3002;
    pub const SEM_TYPE_MISMATCH: u32 = 3003;
    pub const SEM_REDEFINITION: u32 = 3004;
    pub const SEM_INVALID_ASSIGNMENT: u32 = 3005;
    pub const SEM_INVALID_CALL: u32 = 3006;
    pub const SEM_BREAK_OUTSIDE_LOOP: u32 = 3007;
    pub const SEM_CONTINUE_OUTSIDE_LOOP: u32 = 3008;
    pub const SEM_DEPENDENT_STATEMENT_DECL: u32 = 3009;

    pub const CODEGEN_WASM_LIMIT_EXCEEDED: u32 = 4001;
    pub const CODEGEN_INVALID_MEMORY_ACCESS: u32 = 4002;
    pub const CODEGEN_UNSUPPORTED_OPERATION: u32 = 4003;
}

/// A diagnostic's source location per spec.md §3: "file, line, column, byte
/// range". `byte_range` defaults to `0..0` at stages that only have an AST
/// `SourcePos` (line/column) to work from, such as the semantic analyzer —
/// it's populated wherever the reporting stage still has the offending
/// token in hand (the lexer and parser).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub id: u32,
    pub severity: Severity,
    pub location: SourcePos,
    pub byte_range: std::ops::Range<u32>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(id: u32, severity: Severity, location: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic {
            id,
            severity,
            location,
            byte_range: 0..0,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_byte_range(mut self, byte_range: std::ops::Range<u32>) -> Self {
        self.byte_range = byte_range;
        self
    }
}

/// Growable, ordered list of diagnostics with a sticky fatal flag.
#[derive(Debug, Default)]
pub struct DiagnosticList {
    entries: Vec<Diagnostic>,
    fatal: bool,
}

impl DiagnosticList {
    pub fn new() -> Self {
        DiagnosticList::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity.is_fatal() {
            self.fatal = true;
        }
        self.entries.push(diagnostic);
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Render every accumulated diagnostic in insertion order, in the format
    /// fixed by spec.md §6:
    ///
    /// ```text
    /// <file>:<line>:<col>: id: <id> <severity>: <message>
    ///    <source line>
    ///    <spaces>^
    /// note: <suggestion>
    /// ```
    pub fn print(&self, file: &Path, source: &str) {
        for diag in &self.entries {
            print_one(diag, file, source);
        }
    }
}

fn print_one(diag: &Diagnostic, file: &Path, source: &str) {
    println!(
        "{}:{}:{}: id: {} {}: {}",
        file.display(),
        diag.location.line,
        diag.location.column,
        diag.id,
        diag.severity.label(),
        diag.message
    );

    if let Some(line) = source_line(source, diag.location.line) {
        println!("   {}", line);
        let pad = diag.location.column.saturating_sub(1) as usize;
        println!("   {}^", " ".repeat(pad));
    }

    if let Some(suggestion) = &diag.suggestion {
        println!("note: {}", suggestion);
    }
}

/// Re-scan `source` for 1-based line `line_number`.
///
/// Diagnostics don't carry their own context line — the arena-owned source
/// text outlives the whole compilation, so it's re-fetched lazily at print
/// time instead of copied into every diagnostic up front.
fn source_line(source: &str, line_number: u32) -> Option<&str> {
    if line_number == 0 {
        return None;
    }
    source.lines().nth(line_number as usize - 1)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: id: {} {}: {}",
            self.location.line,
            self.location.column,
            self.id,
            self.severity.label(),
            self.message
        )
    }
}

/// Helper used by the driver to decide the final path display name.
pub fn default_output_path() -> PathBuf {
    PathBuf::from("out.wasm")
}
