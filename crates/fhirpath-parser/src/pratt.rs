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

//! The parser (P, §4.2/§4.3): a precedence-climbing (Pratt) parser over
//! the lexer's token stream.
//!
//! Precedence, associativity, and which spellings count as binary
//! operators at all come from [`Registry::precedence`] /
//! [`Registry::associativity`] / [`Registry::is_binary_operator`] /
//! [`Registry::is_keyword_operator`] rather than a table hardcoded here —
//! registering a new operator in the registry is enough to make the
//! parser accept it, with no grammar change.

use crate::lexer::{self, SpannedToken, Token};
use crate::{ParseMode, ParserOptions};
use octofhir_fhirpath_ast::{CursorContext, Expression, LiteralValue, NodeId, Span, UnaryOperator, VariableRef};
use octofhir_fhirpath_ast::BinaryOperator;
use octofhir_fhirpath_core::{FhirPathError, Result as ParseResult};
use octofhir_fhirpath_diagnostics::{Diagnostic, DiagnosticCode, Severity};
use octofhir_fhirpath_registry::{Associativity, Registry};
use smallvec::SmallVec;

/// Calendar-duration unit keywords recognized right after a numeric
/// literal (§3.4). Normalized to the singular form in the resulting
/// [`octofhir_fhirpath_ast::QuantityLiteral`].
const CALENDAR_UNITS: &[(&str, &str)] = &[
    ("year", "year"),
    ("years", "year"),
    ("month", "month"),
    ("months", "month"),
    ("week", "week"),
    ("weeks", "week"),
    ("day", "day"),
    ("days", "day"),
    ("hour", "hour"),
    ("hours", "hour"),
    ("minute", "minute"),
    ("minutes", "minute"),
    ("second", "second"),
    ("seconds", "second"),
    ("millisecond", "millisecond"),
    ("milliseconds", "millisecond"),
];

/// Registry-driven Pratt parser over a pre-lexed token stream.
pub struct Parser<'r> {
    tokens: Vec<SpannedToken>,
    pos: usize,
    prev_end: usize,
    input_len: usize,
    registry: &'r Registry,
    options: ParserOptions,
    diagnostics: Vec<Diagnostic>,
    cursor_offset: Option<usize>,
    cursor_emitted: bool,
    next_node_id: u32,
}

impl<'r> Parser<'r> {
    pub fn new(input_len: usize, tokens: Vec<SpannedToken>, registry: &'r Registry, options: &ParserOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            prev_end: 0,
            input_len,
            registry,
            options: options.clone(),
            diagnostics: Vec::new(),
            cursor_offset: options.cursor_position,
            cursor_emitted: false,
            next_node_id: 1,
        }
    }

    /// Record a diagnostic the lexer produced before parsing started.
    pub fn note_lex_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.push_diagnostic(diagnostic);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse a whole input: one expression followed by end of input.
    pub fn parse_program(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_expression(0)?;
        if self.pos < self.tokens.len() {
            let span = self.tokens[self.pos].span;
            return self.fail(DiagnosticCode::UnexpectedToken, "unexpected trailing input after a complete expression", span);
        }
        Ok(self.attach_id(expr))
    }

    fn attach_id(&mut self, expr: Expression) -> Expression {
        if self.options.mode != ParseMode::Lsp {
            return expr;
        }
        self.assign_ids(expr)
    }

    /// Walk the freshly-built tree assigning stable ids, LSP mode only.
    fn assign_ids(&mut self, expr: Expression) -> Expression {
        use octofhir_fhirpath_ast::ExpressionKind as K;
        let id = self.next_node_id;
        self.next_node_id += 1;
        let kind = match expr.kind {
            K::Binary(b) => {
                let mut b = b;
                b.left = self.assign_ids(b.left);
                b.right = self.assign_ids(b.right);
                K::Binary(b)
            }
            K::Unary(u) => {
                let mut u = u;
                u.operand = self.assign_ids(u.operand);
                K::Unary(u)
            }
            K::Function(f) => {
                let mut f = f;
                f.callee = self.assign_ids(f.callee);
                f.arguments = f.arguments.into_iter().map(|a| self.assign_ids(a)).collect();
                K::Function(f)
            }
            K::Index(i) => {
                let mut i = i;
                i.target = self.assign_ids(i.target);
                i.index = self.assign_ids(i.index);
                K::Index(i)
            }
            K::MembershipTest(m) => {
                let mut m = m;
                m.target = self.assign_ids(m.target);
                K::MembershipTest(m)
            }
            K::TypeCast(c) => {
                let mut c = c;
                c.target = self.assign_ids(c.target);
                K::TypeCast(c)
            }
            K::Collection(items) => K::Collection(items.into_iter().map(|i| self.assign_ids(i)).collect()),
            other => other,
        };
        Expression::with_id(kind, expr.span, NodeId(id))
    }

    // -- token-stream plumbing -------------------------------------------------

    fn current(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn check(&self, token: &Token) -> bool {
        self.current().map(|t| &t.token) == Some(token)
    }

    fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos].clone();
        self.prev_end = tok.span.end.offset;
        self.pos += 1;
        tok
    }

    fn gap_end(&self) -> usize {
        self.current().map(|t| t.span.start.offset).unwrap_or(self.input_len)
    }

    /// If a cursor offset was requested and falls in the gap right before
    /// the next token, consume it (once) and return a cursor placeholder
    /// node tagged with `context`.
    fn maybe_cursor(&mut self, context: CursorContext) -> Option<Expression> {
        if self.cursor_emitted {
            return None;
        }
        let offset = self.cursor_offset?;
        let gap_end = self.gap_end();
        if offset >= self.prev_end && offset <= gap_end {
            self.cursor_emitted = true;
            Some(Expression::cursor(context, Span::empty_at(offset)))
        } else {
            None
        }
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() < self.options.max_errors {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Recoverable failure at an expression position. Simple mode returns
    /// `Err` immediately; LSP mode records a diagnostic, synchronizes to
    /// the next `, ) } ]` or end of input, and yields an `Error` node so
    /// the caller keeps going.
    fn fail(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) -> ParseResult<Expression> {
        let message = message.into();
        match self.options.mode {
            ParseMode::Simple => Err(FhirPathError::ParseError { span, message }),
            ParseMode::Lsp => {
                self.push_diagnostic(Diagnostic::with_message(code, message.clone(), Severity::Error, span));
                self.synchronize();
                Ok(Expression::error(message, span))
            }
        }
    }

    fn synchronize(&mut self) {
        while let Some(t) = self.current() {
            if matches!(t.token, Token::Comma | Token::RightParen | Token::RightBrace | Token::RightBracket) {
                return;
            }
            self.advance();
        }
    }

    /// Consume `expected`, or report its absence without synchronizing
    /// (the caller decides how to continue).
    fn expect_token(&mut self, expected: Token, what: &str) -> ParseResult<Span> {
        if let Some(t) = self.current() {
            if t.token == expected {
                let span = t.span;
                self.advance();
                return Ok(span);
            }
        }
        let span = self.current().map(|t| t.span).unwrap_or_else(|| Span::empty_at(self.input_len));
        let message = format!("expected {what}");
        match self.options.mode {
            ParseMode::Simple => Err(FhirPathError::ParseError { span, message }),
            ParseMode::Lsp => {
                self.push_diagnostic(Diagnostic::with_message(DiagnosticCode::ExpectedToken(what.to_string()), message, Severity::Error, span));
                Ok(span)
            }
        }
    }

    fn unescape_or_fail(&mut self, raw: &str, span: Span) -> ParseResult<String> {
        match lexer::unescape(raw, span) {
            Ok(value) => Ok(value),
            Err(diag) => match self.options.mode {
                ParseMode::Simple => Err(FhirPathError::ParseError { span, message: diag.message }),
                ParseMode::Lsp => {
                    self.push_diagnostic(diag);
                    Ok(raw.to_string())
                }
            },
        }
    }

    // -- expression grammar -----------------------------------------------------

    /// `expression := unary (binary-tail)*`, precedence-climbing over
    /// `min_prec` (§4.3.1).
    pub(crate) fn parse_expression(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            if let Some(cursor) = self.maybe_cursor(CursorContext::Operator) {
                return Ok(cursor);
            }
            let Some((symbol, op_span)) = self.peek_operator_symbol() else { break };
            let Some(prec) = self.registry.precedence(&symbol) else { break };
            if prec < min_prec {
                break;
            }
            self.advance();
            let assoc = self.registry.associativity(&symbol).unwrap_or(Associativity::Left);
            let next_min = if assoc == Associativity::Left { prec.saturating_add(1) } else { prec };
            left = match BinaryOperator::from_symbol(&symbol) {
                Some(BinaryOperator::Is) => {
                    if let Some(cursor) = self.maybe_cursor(CursorContext::Type) {
                        cursor
                    } else {
                        let (type_name, type_span) = self.parse_type_name()?;
                        Expression::membership_test(left, type_name, type_span)
                    }
                }
                Some(BinaryOperator::As) => {
                    if let Some(cursor) = self.maybe_cursor(CursorContext::Type) {
                        cursor
                    } else {
                        let (type_name, type_span) = self.parse_type_name()?;
                        Expression::type_cast(left, type_name, type_span)
                    }
                }
                Some(op) => {
                    let right = self.parse_expression(next_min)?;
                    Expression::binary(op, left, right)
                }
                None => return self.fail(DiagnosticCode::UnexpectedToken, format!("unknown operator '{symbol}'"), op_span),
            };
        }
        Ok(left)
    }

    /// The operator symbol the current token spells, if any — a symbolic
    /// token directly, or an identifier the registry recognizes as a
    /// keyword operator (`and`, `div`, `is`, ...).
    fn peek_operator_symbol(&self) -> Option<(String, Span)> {
        let tok = self.current()?;
        let symbol = match &tok.token {
            Token::Dot => ".",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Eq => "=",
            Token::Neq => "!=",
            Token::Tilde => "~",
            Token::NotTilde => "!~",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Identifier(word) if self.registry.is_keyword_operator(word) => word.as_str(),
            _ => return None,
        };
        Some((symbol.to_string(), tok.span))
    }

    /// `unary := ('+' | '-' | 'not') unary | postfix` (§4.3.1). `not`
    /// immediately followed by `(` is left to the primary/postfix rules
    /// instead, so `.not()`-style calls keep working.
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if let Some(cursor) = self.maybe_cursor(CursorContext::Identifier) {
            return Ok(cursor);
        }
        let prefix = self.current().map(|t| (t.token.clone(), t.span));
        match prefix {
            Some((Token::Plus, span)) => {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expression::unary(UnaryOperator::Plus, operand, span));
            }
            Some((Token::Minus, span)) => {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expression::unary(UnaryOperator::Minus, operand, span));
            }
            Some((Token::Identifier(word), span)) if word == "not" && !self.next_is_left_paren() => {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expression::unary(UnaryOperator::Not, operand, span));
            }
            _ => {}
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn next_is_left_paren(&self) -> bool {
        matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::LeftParen))
    }

    /// Postfix alternatives attached directly to a primary: indexer and
    /// function call. The dot operator itself is handled in the binary
    /// tail since it is a normal (highest-precedence) binary operator.
    fn parse_postfix(&mut self, mut expr: Expression) -> ParseResult<Expression> {
        loop {
            match self.current().map(|t| t.token.clone()) {
                Some(Token::LeftParen) if expr.is_callable_name() => {
                    expr = self.parse_call(expr)?;
                }
                Some(Token::LeftBracket) => {
                    expr = self.parse_index(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call(&mut self, callee: Expression) -> ParseResult<Expression> {
        self.advance(); // '('
        let mut arguments: SmallVec<[Expression; 4]> = SmallVec::new();
        let mut arg_index = 0usize;
        if !self.check(&Token::RightParen) {
            loop {
                if let Some(cursor) = self.maybe_cursor(CursorContext::Argument(arg_index)) {
                    arguments.push(cursor);
                } else {
                    arguments.push(self.parse_expression(0)?);
                }
                arg_index += 1;
                if self.check(&Token::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let close_span = self.expect_token(Token::RightParen, "')'")?;
        Ok(Expression::function(callee, arguments, close_span))
    }

    fn parse_index(&mut self, target: Expression) -> ParseResult<Expression> {
        self.advance(); // '['
        if let Some(cursor) = self.maybe_cursor(CursorContext::Index) {
            let _ = self.expect_token(Token::RightBracket, "']'")?;
            return Ok(cursor);
        }
        let index = self.parse_expression(0)?;
        let close_span = self.expect_token(Token::RightBracket, "']'")?;
        Ok(Expression::index(target, index, close_span))
    }

    /// A (possibly dotted) type name after `is`/`as`, e.g. `Patient` or
    /// `FHIR.Patient`.
    fn parse_type_name(&mut self) -> ParseResult<(String, Span)> {
        let first = self.current().map(|t| (t.token.clone(), t.span));
        let (mut name, mut span) = match first {
            Some((Token::Identifier(word), span)) => {
                self.advance();
                (word, span)
            }
            Some((Token::DelimitedIdentifier(raw), span)) => {
                self.advance();
                (self.unescape_or_fail(&raw, span)?, span)
            }
            _ => {
                let span = self.current().map(|t| t.span).unwrap_or_else(|| Span::empty_at(self.input_len));
                let expr = self.fail(DiagnosticCode::ExpectedType, "expected a type name", span)?;
                return Ok((String::new(), expr.span));
            }
        };
        while self.check(&Token::Dot) {
            let next_is_identifier = matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::Identifier(_)));
            if !next_is_identifier {
                break;
            }
            self.advance(); // '.'
            if let Some((Token::Identifier(part), part_span)) = self.current().map(|t| (t.token.clone(), t.span)) {
                self.advance();
                name.push('.');
                name.push_str(&part);
                span = span.hull(part_span);
            }
        }
        Ok((name, span))
    }

    /// `primary := literal | identifier | '(' expression ')' | '{' ... '}'`
    /// (§4.3.1/§4.3.2).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        if let Some(cursor) = self.maybe_cursor(CursorContext::Identifier) {
            return Ok(cursor);
        }
        let Some(tok) = self.current().cloned() else {
            return self.fail(DiagnosticCode::UnexpectedToken, "unexpected end of input, expected an expression", Span::empty_at(self.input_len));
        };
        let span = tok.span;
        match tok.token {
            Token::Integer(n) => {
                self.advance();
                self.maybe_quantity(span, n.to_string(), Expression::literal(LiteralValue::Integer(n), span))
            }
            Token::Decimal(text) => {
                self.advance();
                let literal = Expression::literal(LiteralValue::Decimal(text.clone()), span);
                self.maybe_quantity(span, text, literal)
            }
            Token::String(raw) => {
                self.advance();
                let value = self.unescape_or_fail(&raw, span)?;
                Ok(Expression::literal(LiteralValue::String(value), span))
            }
            Token::Date(text) => {
                self.advance();
                Ok(Expression::literal(LiteralValue::Date(text), span))
            }
            Token::DateTime(text) => {
                self.advance();
                Ok(Expression::literal(LiteralValue::DateTime(text), span))
            }
            Token::Time(text) => {
                self.advance();
                Ok(Expression::literal(LiteralValue::Time(text), span))
            }
            Token::True => {
                self.advance();
                Ok(Expression::literal(LiteralValue::Boolean(true), span))
            }
            Token::False => {
                self.advance();
                Ok(Expression::literal(LiteralValue::Boolean(false), span))
            }
            Token::ThisVar => {
                self.advance();
                Ok(Expression::variable(VariableRef::This, span))
            }
            Token::IndexVar => {
                self.advance();
                Ok(Expression::variable(VariableRef::Index, span))
            }
            Token::TotalVar => {
                self.advance();
                Ok(Expression::variable(VariableRef::Total, span))
            }
            Token::EnvironmentVar(name) => {
                self.advance();
                Ok(Expression::variable(VariableRef::Environment(name), span))
            }
            Token::EnvironmentVarDelimited(raw) => {
                self.advance();
                let name = self.unescape_or_fail(&raw, span)?;
                Ok(Expression::variable(VariableRef::Environment(name), span))
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(Self::build_name_node(name, span))
            }
            Token::DelimitedIdentifier(raw) => {
                self.advance();
                let name = self.unescape_or_fail(&raw, span)?;
                Ok(Expression::identifier(name, span))
            }
            Token::LeftParen => self.parse_parenthesized(span),
            Token::LeftBrace => self.parse_collection_literal(span),
            Token::Error => {
                self.advance();
                self.fail(DiagnosticCode::InvalidSyntax, "invalid token", span)
            }
            other => {
                self.fail(DiagnosticCode::UnexpectedToken, format!("unexpected token {other:?}"), span)
            }
        }
    }

    /// An uppercase-initial identifier may denote a type reference; a
    /// lowercase-initial one is always a plain path step (§9's
    /// `TypeOrIdentifier` note).
    fn build_name_node(name: String, span: Span) -> Expression {
        let starts_uppercase = name.chars().next().is_some_and(|c| c.is_uppercase());
        if starts_uppercase {
            Expression::type_or_identifier(name, span)
        } else {
            Expression::identifier(name, span)
        }
    }

    /// A `Number` token immediately followed by a string (UCUM unit) or a
    /// calendar-unit keyword coalesces into a `Quantity` literal — parser
    /// lookahead, not a lexer rule (§4.3.2).
    fn maybe_quantity(&mut self, literal_span: Span, value: String, literal: Expression) -> ParseResult<Expression> {
        match self.current().map(|t| t.token.clone()) {
            Some(Token::String(raw)) => {
                let unit_span = self.current().unwrap().span;
                self.advance();
                let unit = self.unescape_or_fail(&raw, unit_span)?;
                Ok(Expression::quantity(value, unit, false, literal_span.hull(unit_span)))
            }
            Some(Token::Identifier(word)) => {
                if let Some((_, normalized)) = CALENDAR_UNITS.iter().find(|(w, _)| *w == word) {
                    let unit_span = self.current().unwrap().span;
                    self.advance();
                    Ok(Expression::quantity(value, *normalized, true, literal_span.hull(unit_span)))
                } else {
                    Ok(literal)
                }
            }
            _ => Ok(literal),
        }
    }

    fn parse_parenthesized(&mut self, open_span: Span) -> ParseResult<Expression> {
        self.advance(); // '('
        if let Some(cursor) = self.maybe_cursor(CursorContext::Identifier) {
            return Ok(cursor);
        }
        let inner = self.parse_expression(0)?;
        let close_span = self.expect_token(Token::RightParen, "')'")?;
        let span = open_span.hull(close_span);
        Ok(Expression { kind: inner.kind, span, id: inner.id })
    }

    fn parse_collection_literal(&mut self, open_span: Span) -> ParseResult<Expression> {
        self.advance(); // '{'
        let mut elements = Vec::new();
        if !self.check(&Token::RightBrace) {
            loop {
                elements.push(self.parse_expression(0)?);
                if self.check(&Token::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let close_span = self.expect_token(Token::RightBrace, "'}'")?;
        Ok(Expression::collection(elements, open_span.hull(close_span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, LexerOptions};
    use octofhir_fhirpath_ast::ExpressionKind;

    fn parse_simple(input: &str) -> ParseResult<Expression> {
        let registry = Registry::with_builtins();
        let lex_out = lex(input, LexerOptions::default());
        let options = ParserOptions::simple();
        let mut parser = Parser::new(input.len(), lex_out.tokens, &registry, &options);
        parser.parse_program()
    }

    #[test]
    fn parses_dotted_path() {
        let expr = parse_simple("Patient.name.given").unwrap();
        match &expr.kind {
            ExpressionKind::Binary(b) => assert_eq!(b.op, BinaryOperator::Dot),
            other => panic!("expected Binary(Dot), got {other:?}"),
        }
    }

    #[test]
    fn respects_precedence_between_and_and_or() {
        // `a and b or c` parses as `(a and b) or c`.
        let expr = parse_simple("a and b or c").unwrap();
        match &expr.kind {
            ExpressionKind::Binary(b) => {
                assert_eq!(b.op, BinaryOperator::Or);
                match &b.left.kind {
                    ExpressionKind::Binary(inner) => assert_eq!(inner.op, BinaryOperator::And),
                    other => panic!("expected nested And, got {other:?}"),
                }
            }
            other => panic!("expected Binary(Or), got {other:?}"),
        }
    }

    #[test]
    fn function_call_only_attaches_to_identifier_nodes() {
        let expr = parse_simple("name.exists()").unwrap();
        match &expr.kind {
            ExpressionKind::Binary(b) => match &b.right.kind {
                ExpressionKind::Function(f) => assert!(f.arguments.is_empty()),
                other => panic!("expected Function, got {other:?}"),
            },
            other => panic!("expected Binary(Dot), got {other:?}"),
        }
    }

    #[test]
    fn is_and_as_parse_a_type_name_not_a_full_expression() {
        let expr = parse_simple("value is FHIR.Patient").unwrap();
        match &expr.kind {
            ExpressionKind::MembershipTest(m) => assert_eq!(m.type_name, "FHIR.Patient"),
            other => panic!("expected MembershipTest, got {other:?}"),
        }
    }

    #[test]
    fn quantity_literal_with_ucum_unit() {
        let expr = parse_simple("4 'mg'").unwrap();
        match &expr.kind {
            ExpressionKind::Quantity(q) => {
                assert_eq!(q.value, "4");
                assert_eq!(q.unit, "mg");
                assert!(!q.is_calendar_unit);
            }
            other => panic!("expected Quantity, got {other:?}"),
        }
    }

    #[test]
    fn quantity_literal_with_calendar_unit() {
        let expr = parse_simple("2 years").unwrap();
        match &expr.kind {
            ExpressionKind::Quantity(q) => {
                assert_eq!(q.unit, "year");
                assert!(q.is_calendar_unit);
            }
            other => panic!("expected Quantity, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_expression_keeps_its_kind_but_widens_its_span() {
        let expr = parse_simple("(1 + 2)").unwrap();
        assert_eq!(expr.span.start.offset, 0);
        assert_eq!(expr.span.end.offset, 7);
        assert!(matches!(expr.kind, ExpressionKind::Binary(_)));
    }

    #[test]
    fn simple_mode_fails_fast_on_unterminated_call() {
        assert!(parse_simple("foo(").is_err());
    }

    #[test]
    fn lsp_mode_recovers_and_produces_an_error_node() {
        let registry = Registry::with_builtins();
        let input = "foo(1, , 2)";
        let lex_out = lex(input, LexerOptions::default());
        let options = ParserOptions::lsp();
        let mut parser = Parser::new(input.len(), lex_out.tokens, &registry, &options);
        let expr = parser.parse_program().unwrap();
        assert!(matches!(expr.kind, ExpressionKind::Function(_)));
        assert!(!parser.into_diagnostics().is_empty());
    }

    #[test]
    fn cursor_after_dot_reports_identifier_context() {
        let registry = Registry::with_builtins();
        let input = "Patient.";
        let lex_out = lex(input, LexerOptions::default());
        let options = ParserOptions::lsp().with_cursor(input.len());
        let mut parser = Parser::new(input.len(), lex_out.tokens, &registry, &options);
        let expr = parser.parse_program().unwrap();
        match &expr.kind {
            ExpressionKind::Binary(b) => assert!(matches!(b.right.kind, ExpressionKind::Cursor(CursorContext::Identifier))),
            other => panic!("expected Binary(Dot) with a cursor rhs, got {other:?}"),
        }
    }

    #[test]
    fn not_keyword_as_prefix_when_not_immediately_called() {
        let expr = parse_simple("not true").unwrap();
        match &expr.kind {
            ExpressionKind::Unary(u) => assert_eq!(u.op, UnaryOperator::Not),
            other => panic!("expected Unary(Not), got {other:?}"),
        }
    }
}
