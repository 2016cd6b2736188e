//! Pull-based lexer.
//!
//! Each call to [`Lexer::next_token`] advances an internal cursor and
//! returns the next token, producing [`TokenKind::Eof`] forever once the
//! source is exhausted. An unrecognized character yields an
//! [`TokenKind::Error`] token and records a lexical diagnostic, then lexing
//! continues from the next character (spec.md §4.2).

pub mod tokens;

use crate::diagnostics::{ids, Diagnostic, DiagnosticList, Severity, SourcePos};
use tokens::{keyword_kind, Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, skip: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(skip)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn current_pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if is_source_space(c) => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Pull the next token, reporting lexical diagnostics for any
    /// unrecognized input along the way.
    pub fn next_token(&mut self, diagnostics: &mut DiagnosticList) -> Token<'src> {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let pos = self.current_pos();

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, "", pos, start);
        };

        macro_rules! single {
            ($kind:expr) => {{
                self.advance();
                Token::new($kind, &self.source[start..self.pos], pos, start)
            }};
        }

        macro_rules! maybe_eq {
            ($plain:expr, $with_eq:expr) => {{
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new($with_eq, &self.source[start..self.pos], pos, start)
                } else {
                    Token::new($plain, &self.source[start..self.pos], pos, start)
                }
            }};
        }

        match c {
            '(' => single!(TokenKind::OpenParen),
            ')' => single!(TokenKind::CloseParen),
            '{' => single!(TokenKind::OpenBrace),
            '}' => single!(TokenKind::CloseBrace),
            ';' => single!(TokenKind::Semicolon),
            '+' => single!(TokenKind::Plus),
            '-' => single!(TokenKind::Minus),
            '*' => single!(TokenKind::Star),
            '/' => single!(TokenKind::Slash),
            '%' => single!(TokenKind::Percent),
            '~' => single!(TokenKind::Tilde),
            '?' => single!(TokenKind::Question),
            ':' => single!(TokenKind::Colon),
            '<' => maybe_eq!(TokenKind::Lt, TokenKind::LtEq),
            '>' => maybe_eq!(TokenKind::Gt, TokenKind::GtEq),
            '!' => maybe_eq!(TokenKind::Bang, TokenKind::BangEq),
            '=' => maybe_eq!(TokenKind::Eq, TokenKind::EqEq),

            '&' => {
                if self.peek_at(1) == Some('&') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::AmpAmp, &self.source[start..self.pos], pos, start)
                } else {
                    self.advance();
                    diagnostics.push(
                        Diagnostic::new(
                            ids::LEX_INVALID_CHARACTER,
                            Severity::Lexical,
                            pos,
                            "unexpected character '&'",
                        )
                        .with_suggestion("use '&&' for logical AND")
                        .with_byte_range(start as u32..self.pos as u32),
                    );
                    Token::new(TokenKind::Error, &self.source[start..self.pos], pos, start)
                }
            }
            '|' => {
                if self.peek_at(1) == Some('|') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::PipePipe, &self.source[start..self.pos], pos, start)
                } else {
                    self.advance();
                    diagnostics.push(
                        Diagnostic::new(
                            ids::LEX_INVALID_CHARACTER,
                            Severity::Lexical,
                            pos,
                            "unexpected character '|'",
                        )
                        .with_suggestion("use '||' for logical OR")
                        .with_byte_range(start as u32..self.pos as u32),
                    );
                    Token::new(TokenKind::Error, &self.source[start..self.pos], pos, start)
                }
            }

            c if is_identifier_start(c) => {
                while self.peek().is_some_and(is_identifier_char) {
                    self.advance();
                }
                let text = &self.source[start..self.pos];
                let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
                Token::new(kind, text, pos, start)
            }

            c if c.is_ascii_digit() => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
                Token::new(
                    TokenKind::IntegerLiteral,
                    &self.source[start..self.pos],
                    pos,
                    start,
                )
            }

            _ => {
                self.advance();
                diagnostics.push(
                    Diagnostic::new(
                        ids::LEX_INVALID_CHARACTER,
                        Severity::Lexical,
                        pos,
                        format!("unexpected character '{c}'"),
                    )
                    .with_suggestion("remove this character")
                    .with_byte_range(start as u32..self.pos as u32),
                );
                Token::new(TokenKind::Error, &self.source[start..self.pos], pos, start)
            }
        }
    }
}

fn is_source_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c' | '\x0b')
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> (Vec<TokenKind>, DiagnosticList) {
        let mut lexer = Lexer::new(source);
        let mut diagnostics = DiagnosticList::new();
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token(&mut diagnostics);
            let eof = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if eof {
                break;
            }
        }
        (kinds, diagnostics)
    }

    #[test]
    fn recognizes_keywords_and_identifiers() {
        let (kinds, diags) = lex_all("int main return x");
        assert!(!diags.has_fatal());
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Return,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doubled_operators_vs_suffixed_eq() {
        let (kinds, _) = lex_all("< <= > >= ! != = == && ||");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Bang,
                TokenKind::BangEq,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lone_ampersand_is_a_lexical_error_with_suggestion() {
        let (kinds, diags) = lex_all("&");
        assert_eq!(kinds, vec![TokenKind::Error, TokenKind::Eof]);
        assert!(diags.has_fatal());
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.id, ids::LEX_INVALID_CHARACTER);
        assert_eq!(diag.suggestion.as_deref(), Some("use '&&' for logical AND"));
    }

    #[test]
    fn line_comment_is_skipped_and_newline_resets_column() {
        let mut lexer = Lexer::new("// comment\nint");
        let mut diagnostics = DiagnosticList::new();
        let token = lexer.next_token(&mut diagnostics);
        assert_eq!(token.kind, TokenKind::Int);
        assert_eq!(token.pos.line, 2);
        assert_eq!(token.pos.column, 1);
    }

    #[test]
    fn unrecognized_character_continues_lexing() {
        let (kinds, diags) = lex_all("int @ main");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Error,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert!(diags.has_fatal());
    }

    #[test]
    fn token_positions_match_first_character() {
        let mut lexer = Lexer::new("  int");
        let mut diagnostics = DiagnosticList::new();
        let token = lexer.next_token(&mut diagnostics);
        assert_eq!(token.pos, SourcePos::new(1, 3));
    }

    #[test]
    fn token_byte_span_matches_its_text() {
        let mut lexer = Lexer::new("  int x");
        let mut diagnostics = DiagnosticList::new();
        let token = lexer.next_token(&mut diagnostics);
        assert_eq!(token.start_byte, 2);
        assert_eq!(token.end_byte(), 5);

        let next = lexer.next_token(&mut diagnostics);
        assert_eq!(next.start_byte, 6);
        assert_eq!(next.end_byte(), 7);
    }

    #[test]
    fn lexical_diagnostic_carries_the_offending_character_byte_range() {
        let (_, diags) = lex_all("int @ main");
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.byte_range, 4..5);
    }
}
