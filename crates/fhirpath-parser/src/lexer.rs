// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The lexer (L, §4.1): turns source text into a flat token stream.
//!
//! The lexer is lossless and does no semantic interpretation — string
//! and delimited-identifier escapes are kept raw (the parser unescapes
//! them when it builds a literal), and number/calendar-unit coalescing
//! into a quantity literal is a parser decision, not a lexer one. Line/
//! column tracking is off unless asked for, since most callers only need
//! byte offsets.
//!
//! A malformed token (unterminated string, bad `@` literal, stray
//! character) never aborts the whole scan: it is emitted as a
//! [`Token::Error`] alongside a pushed diagnostic, and scanning resumes
//! at the next byte. Recoverability lives here as much as in the parser.

use octofhir_fhirpath_ast::{Position, Span};
use octofhir_fhirpath_diagnostics::{Diagnostic, DiagnosticCode, Severity};

/// A lexical token. Keyword-spelled operators (`and`, `div`, `is`, ...)
/// are **not** distinguished from ordinary identifiers here — the parser
/// decides whether an identifier spells an operator by asking the
/// registry (`Registry::is_keyword_operator`), so extending the operator
/// set never requires a lexer change.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    /// Kept as lexed text so trailing zeros/precision survive.
    Decimal(String),
    /// Raw contents between the quotes, escapes not yet processed.
    String(String),
    Date(String),
    DateTime(String),
    Time(String),
    True,
    False,
    Identifier(String),
    /// `` `name` `` — raw contents between backticks, escapes not yet
    /// processed.
    DelimitedIdentifier(String),
    ThisVar,
    IndexVar,
    TotalVar,
    /// `%name`
    EnvironmentVar(String),
    /// `` %`name` ``
    EnvironmentVarDelimited(String),
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Pipe,
    Eq,
    Neq,
    Tilde,
    NotTilde,
    Lt,
    Le,
    Gt,
    Ge,
    /// A token the lexer could not make sense of; the diagnostic
    /// explaining why was already pushed to [`Lexer::diagnostics`].
    Error,
}

impl Token {
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(s) => Some(s),
            _ => None,
        }
    }
}

/// Options controlling lexer behavior (§6.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerOptions {
    /// Populate `line`/`column` on every [`Position`]. Off by default —
    /// most callers only need byte offsets, and tracking costs a pass
    /// over every byte for newlines.
    pub track_positions: bool,
    /// Retain whitespace/comment ranges in [`Lexer::trivia`] rather than
    /// silently discarding them.
    pub preserve_trivia: bool,
}

/// One spanned token in the output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// The lexer's complete output: the token stream, any skipped trivia
/// (only populated when asked for), and diagnostics for malformed
/// tokens.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<SpannedToken>,
    pub trivia: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scans a complete input string into a [`LexOutput`] in one pass.
pub fn lex(input: &str, options: LexerOptions) -> LexOutput {
    Lexer::new(input, options).run()
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    options: LexerOptions,
    out: LexOutput,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, options: LexerOptions) -> Self {
        Self { input, bytes: input.as_bytes(), pos: 0, line: 1, column: 1, options, out: LexOutput::default() }
    }

    fn position(&self, offset: usize) -> Position {
        if self.options.track_positions {
            Position { offset, line: self.line, column: self.column }
        } else {
            Position::at_offset(offset)
        }
    }

    fn advance_position_tracking(&mut self, start: usize, end: usize) {
        if !self.options.track_positions {
            return;
        }
        for &b in &self.bytes[start..end] {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn bump(&mut self, n: usize) {
        let start = self.pos;
        self.pos += n;
        self.advance_position_tracking(start, self.pos);
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    fn push_token(&mut self, token: Token, start: usize) {
        let span = Span { start: self.position(start), end: self.position(self.pos) };
        self.out.tokens.push(SpannedToken { token, span });
    }

    fn push_error(&mut self, code: DiagnosticCode, message: impl Into<String>, start: usize) {
        let span = Span { start: self.position(start), end: self.position(self.pos) };
        self.out.diagnostics.push(Diagnostic::with_message(code, message, Severity::Error, span));
        self.out.tokens.push(SpannedToken { token: Token::Error, span });
    }

    fn run(mut self) -> LexOutput {
        loop {
            let trivia_start = self.pos;
            self.skip_trivia();
            if trivia_start != self.pos && self.options.preserve_trivia {
                self.out.trivia.push(Span { start: self.position(trivia_start), end: self.position(self.pos) });
            }
            let Some(byte) = self.peek_byte() else { break };
            let start = self.pos;
            match byte {
                b'(' => { self.bump(1); self.push_token(Token::LeftParen, start); }
                b')' => { self.bump(1); self.push_token(Token::RightParen, start); }
                b'[' => { self.bump(1); self.push_token(Token::LeftBracket, start); }
                b']' => { self.bump(1); self.push_token(Token::RightBracket, start); }
                b'{' => { self.bump(1); self.push_token(Token::LeftBrace, start); }
                b'}' => { self.bump(1); self.push_token(Token::RightBrace, start); }
                b',' => { self.bump(1); self.push_token(Token::Comma, start); }
                b'.' => { self.bump(1); self.push_token(Token::Dot, start); }
                b'+' => { self.bump(1); self.push_token(Token::Plus, start); }
                b'-' => { self.bump(1); self.push_token(Token::Minus, start); }
                b'*' => { self.bump(1); self.push_token(Token::Star, start); }
                b'&' => { self.bump(1); self.push_token(Token::Ampersand, start); }
                b'|' => { self.bump(1); self.push_token(Token::Pipe, start); }
                b'/' => match self.peek_at(1) {
                    Some(b'/') => self.skip_line_comment(),
                    Some(b'*') => self.skip_block_comment(start),
                    _ => { self.bump(1); self.push_token(Token::Slash, start); }
                },
                b'=' => match self.peek_at(1) {
                    Some(b'=') => { self.bump(2); self.push_token(Token::Tilde, start); }
                    _ => { self.bump(1); self.push_token(Token::Eq, start); }
                },
                b'!' => match self.peek_at(1) {
                    Some(b'=') => { self.bump(2); self.push_token(Token::Neq, start); }
                    Some(b'~') => { self.bump(2); self.push_token(Token::NotTilde, start); }
                    _ => { self.bump(1); self.push_error(DiagnosticCode::UnrecognizedCharacter, "'!' must be followed by '=' or '~'", start); }
                },
                b'~' => { self.bump(1); self.push_token(Token::Tilde, start); }
                b'<' => match self.peek_at(1) {
                    Some(b'=') => { self.bump(2); self.push_token(Token::Le, start); }
                    _ => { self.bump(1); self.push_token(Token::Lt, start); }
                },
                b'>' => match self.peek_at(1) {
                    Some(b'=') => { self.bump(2); self.push_token(Token::Ge, start); }
                    _ => { self.bump(1); self.push_token(Token::Gt, start); }
                },
                b'\'' => self.lex_string(start),
                b'`' => self.lex_delimited_identifier(start),
                b'@' => self.lex_datetime(start),
                b'$' => self.lex_special_variable(start),
                b'%' => self.lex_environment_variable(start),
                b'0'..=b'9' => self.lex_number(start),
                b if is_id_start(b) => self.lex_identifier(start),
                other => {
                    self.bump(1);
                    self.push_error(DiagnosticCode::UnrecognizedCharacter, format!("unrecognized character '{}'", other as char), start);
                }
            }
        }
        self.out
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.bump(1),
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.skip_block_comment(start);
                }
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.bump(2);
        while !matches!(self.peek_byte(), None | Some(b'\n')) {
            self.bump(1);
        }
    }

    fn skip_block_comment(&mut self, start: usize) {
        self.bump(2);
        loop {
            match (self.peek_byte(), self.peek_at(1)) {
                (Some(b'*'), Some(b'/')) => { self.bump(2); return; }
                (Some(_), _) => self.bump(1),
                (None, _) => {
                    self.push_error(DiagnosticCode::UnclosedString, "unterminated block comment", start);
                    return;
                }
            }
        }
    }

    /// Scans a single-quoted string, leaving escape sequences untouched.
    fn lex_string(&mut self, start: usize) {
        self.bump(1);
        let content_start = self.pos;
        loop {
            match self.peek_byte() {
                Some(b'\'') => {
                    let content = self.slice(content_start, self.pos).to_string();
                    self.bump(1);
                    self.push_token(Token::String(content), start);
                    return;
                }
                Some(b'\\') => {
                    self.bump(1);
                    if self.peek_byte().is_some() {
                        self.bump(1);
                    }
                }
                Some(_) => self.bump(1),
                None => {
                    self.push_error(DiagnosticCode::UnclosedString, "unterminated string literal", start);
                    return;
                }
            }
        }
    }

    fn lex_delimited_identifier(&mut self, start: usize) {
        self.bump(1);
        let content_start = self.pos;
        loop {
            match self.peek_byte() {
                Some(b'`') => {
                    let content = self.slice(content_start, self.pos).to_string();
                    self.bump(1);
                    self.push_token(Token::DelimitedIdentifier(content), start);
                    return;
                }
                Some(b'\\') => {
                    self.bump(1);
                    if self.peek_byte().is_some() {
                        self.bump(1);
                    }
                }
                Some(_) => self.bump(1),
                None => {
                    self.push_error(DiagnosticCode::UnclosedDelimitedIdentifier, "unterminated delimited identifier", start);
                    return;
                }
            }
        }
    }

    fn lex_number(&mut self, start: usize) {
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.bump(1);
        }
        let is_decimal = self.peek_byte() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9'));
        if is_decimal {
            self.bump(1);
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.bump(1);
            }
            self.push_token(Token::Decimal(self.slice(start, self.pos).to_string()), start);
        } else {
            match self.slice(start, self.pos).parse::<i64>() {
                Ok(value) => self.push_token(Token::Integer(value), start),
                Err(_) => self.push_error(DiagnosticCode::InvalidNumber, "integer literal out of range", start),
            }
        }
    }

    fn lex_identifier(&mut self, start: usize) {
        self.bump(1);
        while matches!(self.peek_byte(), Some(b) if is_id_continue(b)) {
            self.bump(1);
        }
        let text = self.slice(start, self.pos);
        match text {
            "true" => self.push_token(Token::True, start),
            "false" => self.push_token(Token::False, start),
            _ => self.push_token(Token::Identifier(text.to_string()), start),
        }
    }

    /// `$this`, `$index`, `$total` — the only three legal spellings after
    /// a bare `$`.
    fn lex_special_variable(&mut self, start: usize) {
        self.bump(1);
        let word_start = self.pos;
        while matches!(self.peek_byte(), Some(b) if is_id_continue(b)) {
            self.bump(1);
        }
        match self.slice(word_start, self.pos) {
            "this" => self.push_token(Token::ThisVar, start),
            "index" => self.push_token(Token::IndexVar, start),
            "total" => self.push_token(Token::TotalVar, start),
            other => self.push_error(DiagnosticCode::UnrecognizedCharacter, format!("'${other}' is not a recognized special variable"), start),
        }
    }

    /// `%name` or `` %`delimited name` ``.
    fn lex_environment_variable(&mut self, start: usize) {
        self.bump(1);
        if self.peek_byte() == Some(b'`') {
            let backtick_start = self.pos;
            self.lex_delimited_identifier(backtick_start);
            if let Some(SpannedToken { token: Token::DelimitedIdentifier(name), .. }) = self.out.tokens.pop() {
                self.push_token(Token::EnvironmentVarDelimited(name), start);
            }
            return;
        }
        let word_start = self.pos;
        while matches!(self.peek_byte(), Some(b) if is_id_continue(b)) {
            self.bump(1);
        }
        if word_start == self.pos {
            self.push_error(DiagnosticCode::ExpectedIdentifier, "expected a name after '%'", start);
            return;
        }
        self.push_token(Token::EnvironmentVar(self.slice(word_start, self.pos).to_string()), start);
    }

    /// `@YYYY[-MM[-DD]]`, `@YYYY-MM-DDThh:mm:ss[.sss][Z|(+|-)hh:mm]`, or
    /// `@Thh:mm:ss[.sss]`.
    fn lex_datetime(&mut self, start: usize) {
        self.bump(1);
        if self.peek_byte() == Some(b'T') {
            self.bump(1);
            self.scan_time_part();
            self.push_token(Token::Time(self.slice(start, self.pos).to_string()), start);
            return;
        }
        if !self.scan_date_part() {
            self.push_error(DiagnosticCode::InvalidDateTimeLiteral, "expected a date after '@'", start);
            return;
        }
        if self.peek_byte() == Some(b'T') {
            self.bump(1);
            self.scan_time_part();
            self.push_token(Token::DateTime(self.slice(start, self.pos).to_string()), start);
        } else {
            self.push_token(Token::Date(self.slice(start, self.pos).to_string()), start);
        }
    }

    fn scan_digits(&mut self, max: usize) -> usize {
        let mut count = 0;
        while count < max && matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.bump(1);
            count += 1;
        }
        count
    }

    fn scan_date_part(&mut self) -> bool {
        if self.scan_digits(4) == 0 {
            return false;
        }
        if self.peek_byte() == Some(b'-') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.bump(1);
            self.scan_digits(2);
            if self.peek_byte() == Some(b'-') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                self.bump(1);
                self.scan_digits(2);
            }
        }
        true
    }

    fn scan_time_part(&mut self) {
        if self.scan_digits(2) == 0 {
            return;
        }
        if self.peek_byte() == Some(b':') {
            self.bump(1);
            self.scan_digits(2);
            if self.peek_byte() == Some(b':') {
                self.bump(1);
                self.scan_digits(2);
                if self.peek_byte() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                    self.bump(1);
                    self.scan_digits(9);
                }
            }
        }
        match self.peek_byte() {
            Some(b'Z') => self.bump(1),
            Some(b'+' | b'-') => {
                self.bump(1);
                self.scan_digits(2);
                if self.peek_byte() == Some(b':') {
                    self.bump(1);
                    self.scan_digits(2);
                }
            }
            _ => {}
        }
    }
}

fn is_id_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_id_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Decodes a raw FHIRPath string/delimited-identifier body's escape
/// sequences (§4.1 — deferred here so the lexer stays a byte scan).
/// Supports `\' \" \`` \\ \/ \r \n \t \f` and `\uXXXX`.
pub fn unescape(raw: &str, span: Span) -> Result<String, Diagnostic> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('`') => out.push('`'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Diagnostic::with_message(DiagnosticCode::InvalidEscape, format!("invalid \\u escape '{hex}'"), Severity::Error, span))?;
                out.push(code);
            }
            Some(other) => return Err(Diagnostic::with_message(DiagnosticCode::InvalidEscape, format!("invalid escape '\\{other}'"), Severity::Error, span)),
            None => return Err(Diagnostic::with_message(DiagnosticCode::InvalidEscape, "dangling '\\' at end of literal", Severity::Error, span)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input, LexerOptions::default()).tokens.into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_a_simple_path() {
        assert_eq!(tokens("Patient.name"), vec![Token::Identifier("Patient".into()), Token::Dot, Token::Identifier("name".into())]);
    }

    #[test]
    fn lexes_special_variables() {
        assert_eq!(tokens("$this $index $total"), vec![Token::ThisVar, Token::IndexVar, Token::TotalVar]);
    }

    #[test]
    fn lexes_environment_variable_and_delimited_form() {
        assert_eq!(tokens("%x"), vec![Token::EnvironmentVar("x".into())]);
        assert_eq!(tokens("%`vs-1`"), vec![Token::EnvironmentVarDelimited("vs-1".into())]);
    }

    #[test]
    fn lexes_datetime_literals() {
        assert_eq!(tokens("@2023-01-01"), vec![Token::Date("@2023-01-01".into())]);
        assert_eq!(tokens("@2023-01-01T12:00:00Z"), vec![Token::DateTime("@2023-01-01T12:00:00Z".into())]);
        assert_eq!(tokens("@T12:30"), vec![Token::Time("@T12:30".into())]);
    }

    #[test]
    fn keywords_stay_plain_identifiers_for_the_parser_to_classify() {
        assert_eq!(tokens("and or div is"), vec![
            Token::Identifier("and".into()),
            Token::Identifier("or".into()),
            Token::Identifier("div".into()),
            Token::Identifier("is".into()),
        ]);
    }

    #[test]
    fn unterminated_string_produces_error_token_and_diagnostic() {
        let out = lex("'abc", LexerOptions::default());
        assert_eq!(out.tokens.last().unwrap().token, Token::Error);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::UnclosedString);
    }

    #[test]
    fn unescape_handles_standard_sequences() {
        let span = Span::empty_at(0);
        assert_eq!(unescape(r"a\'b\nc", span).unwrap(), "a'b\nc");
        assert_eq!(unescape(r"A", span).unwrap(), "A");
    }

    #[test]
    fn position_tracking_is_off_by_default() {
        let out = lex("Patient\n.name", LexerOptions::default());
        assert_eq!(out.tokens[0].span.start.line, 0);
    }

    #[test]
    fn position_tracking_follows_newlines_when_enabled() {
        let out = lex("Patient\n.name", LexerOptions { track_positions: true, preserve_trivia: false });
        let dot = &out.tokens[1];
        assert_eq!(dot.span.start.line, 2);
        assert_eq!(dot.span.start.column, 1);
    }
}
