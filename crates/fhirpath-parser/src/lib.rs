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

//! The lexer (L) and registry-driven Pratt parser (P), §4.1–§4.3 of the
//! engine design.
//!
//! Parsing is synchronous and single-pass: no cross-expression AST cache
//! lives here (the only thing ever cached across expressions is the
//! registry itself, built once by the caller and passed in by
//! reference), and there is no async entry point — one call to [`parse`]
//! fully tokenizes and parses its input before returning.

mod lexer;
mod pratt;

pub use lexer::{lex, unescape, LexOutput, LexerOptions, SpannedToken, Token};
pub use octofhir_fhirpath_ast::{Expression, Span};
pub use octofhir_fhirpath_diagnostics::Diagnostic;

/// Parsing strategy (§6.1). `Simple` is for one-shot evaluation: the
/// first syntax error aborts with `Err`. `Lsp` is for editor tooling: it
/// collects every diagnostic it can, synchronizes past errors, and always
/// returns a (possibly partial) tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Simple,
    Lsp,
}

/// Parser configuration (§6.1).
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub mode: ParseMode,
    /// Retain whitespace/comment ranges rather than discarding them.
    /// Always `true` in [`ParserOptions::lsp`].
    pub preserve_trivia: bool,
    /// Whether to synchronize past a syntax error instead of aborting.
    /// Always `true` in [`ParserOptions::lsp`]; has no effect in
    /// `Simple` mode, which always aborts on the first error regardless.
    pub error_recovery: bool,
    /// Upper bound on the number of diagnostics collected. Additional
    /// diagnostics beyond this count are silently dropped rather than
    /// growing [`ParseOutput::diagnostics`] without bound.
    pub max_errors: usize,
    /// A byte offset into the source where a cursor placeholder should
    /// be inserted, for completion support (§4.3.4). `None` disables
    /// cursor handling entirely.
    pub cursor_position: Option<usize>,
}

impl ParserOptions {
    /// Fail-fast parsing for one-shot evaluation.
    pub fn simple() -> Self {
        Self { mode: ParseMode::Simple, preserve_trivia: false, error_recovery: false, max_errors: 1, cursor_position: None }
    }

    /// Error-tolerant parsing for editor tooling: collects diagnostics,
    /// keeps trivia, and always returns a tree.
    pub fn lsp() -> Self {
        Self { mode: ParseMode::Lsp, preserve_trivia: true, error_recovery: true, max_errors: 200, cursor_position: None }
    }

    /// Request a cursor placeholder at `offset` (see [`ParserOptions::cursor_position`]).
    pub fn with_cursor(mut self, offset: usize) -> Self {
        self.cursor_position = Some(offset);
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::simple()
    }
}

/// The complete result of a parse: the tree (possibly containing `Error`
/// nodes in LSP mode), any diagnostics collected along the way, and any
/// preserved trivia ranges.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub expression: Expression,
    pub diagnostics: Vec<Diagnostic>,
    pub trivia: Vec<Span>,
}

/// Tokenize and parse `input` against `registry`'s operator/keyword
/// metadata. The registry is read-only and may be shared across
/// concurrent calls (§5).
pub fn parse(input: &str, registry: &octofhir_fhirpath_registry::Registry, options: &ParserOptions) -> octofhir_fhirpath_core::Result<ParseOutput> {
    let lex_out = lexer::lex(input, LexerOptions { track_positions: false, preserve_trivia: options.preserve_trivia });
    let mut parser = pratt::Parser::new(input.len(), lex_out.tokens, registry, options);
    for diagnostic in lex_out.diagnostics {
        parser.note_lex_diagnostic(diagnostic);
    }
    let expression = parser.parse_program()?;
    Ok(ParseOutput { expression, diagnostics: parser.into_diagnostics(), trivia: lex_out.trivia })
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_ast::ExpressionKind;
    use octofhir_fhirpath_registry::Registry;

    #[test]
    fn parses_a_complete_path_expression() {
        let registry = Registry::with_builtins();
        let output = parse("Patient.name.where(use = 'official').given", &registry, &ParserOptions::simple()).unwrap();
        assert!(matches!(output.expression.kind, ExpressionKind::Binary(_)));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn simple_mode_surfaces_the_first_syntax_error() {
        let registry = Registry::with_builtins();
        let result = parse("Patient..name", &registry, &ParserOptions::simple());
        assert!(result.is_err());
    }

    #[test]
    fn lsp_mode_keeps_trivia_and_never_errors_out() {
        let registry = Registry::with_builtins();
        let options = ParserOptions::lsp();
        let output = parse("Patient . name // trailing comment\n", &registry, &options).unwrap();
        assert!(matches!(output.expression.kind, ExpressionKind::Binary(_)));
    }

    #[test]
    fn cursor_position_injects_a_placeholder_node() {
        let registry = Registry::with_builtins();
        let input = "Patient.";
        let options = ParserOptions::lsp().with_cursor(input.len());
        let output = parse(input, &registry, &options).unwrap();
        match output.expression.kind {
            ExpressionKind::Binary(b) => assert!(matches!(b.right.kind, ExpressionKind::Cursor(_))),
            other => panic!("expected Binary with a cursor rhs, got {other:?}"),
        }
    }
}
