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

//! Core diagnostic types.

use octofhir_fhirpath_ast::Span;
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Doesn't block anything; a stylistic nudge.
    Hint,
    /// Informational.
    #[default]
    Info,
    /// Might indicate a problem, but evaluation can proceed.
    Warning,
    /// Prevents successful parsing or evaluation.
    Error,
}

/// Enumerated diagnostic codes, grouped by origin (see §6.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// A token appeared where the grammar didn't expect one.
    UnexpectedToken,
    /// A specific token was expected but not found.
    ExpectedToken(String),
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A type name was expected (after `is`/`as`, or as a function's
    /// type-only argument).
    ExpectedType,
    /// A string literal was never closed.
    UnclosedString,
    /// A delimited identifier (`` `...` ``) was never closed.
    UnclosedDelimitedIdentifier,
    /// A numeric literal couldn't be lexed.
    InvalidNumber,
    /// A `@...` date/time/datetime literal couldn't be lexed.
    InvalidDateTimeLiteral,
    /// An unrecognized character was encountered.
    UnrecognizedCharacter,
    /// An invalid `\x` escape sequence inside a string literal.
    InvalidEscape,
    /// A function was called with the wrong number of arguments.
    WrongArgumentCount {
        /// The function name.
        function: String,
        /// Expected count, or a textual range such as `"1 or 2"`.
        expected: String,
        /// Actual count supplied.
        actual: usize,
    },
    /// An operator requiring a singleton input received more than one
    /// item.
    SingletonRequired,
    /// A string function received a non-string operand.
    StringOperationOnNonString,
    /// An operand had an invalid type for its operator/function.
    InvalidOperandType,
    /// The expression's syntax was otherwise invalid.
    InvalidSyntax,
    /// Reference to a function or operator that the registry doesn't
    /// know about.
    UnknownFunction(String),
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::ExpectedToken(tok) => write!(f, "expected '{tok}'"),
            Self::ExpectedIdentifier => write!(f, "expected an identifier"),
            Self::ExpectedType => write!(f, "expected a type name"),
            Self::UnclosedString => write!(f, "unterminated string literal"),
            Self::UnclosedDelimitedIdentifier => write!(f, "unterminated delimited identifier"),
            Self::InvalidNumber => write!(f, "invalid numeric literal"),
            Self::InvalidDateTimeLiteral => write!(f, "invalid date/time literal"),
            Self::UnrecognizedCharacter => write!(f, "unrecognized character"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::WrongArgumentCount { function, expected, actual } => {
                write!(f, "'{function}' expects {expected} argument(s), got {actual}")
            }
            Self::SingletonRequired => write!(f, "expected a single value, got a collection"),
            Self::StringOperationOnNonString => write!(f, "string operation applied to a non-string value"),
            Self::InvalidOperandType => write!(f, "invalid operand type"),
            Self::InvalidSyntax => write!(f, "invalid syntax"),
            Self::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
        }
    }
}

/// A single diagnostic: what went wrong, where, and how severe it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// The machine-readable code.
    pub code: DiagnosticCode,
    /// A human-readable message; may add detail beyond `code`'s default
    /// rendering.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Source range the diagnostic applies to.
    pub span: Span,
}

impl Diagnostic {
    /// Build an error-severity diagnostic at `span` whose message is the
    /// code's default rendering.
    pub fn error(code: DiagnosticCode, span: Span) -> Self {
        let message = code.to_string();
        Self { code, message, severity: Severity::Error, span }
    }

    /// Build a diagnostic with an explicit message, overriding the code's
    /// default rendering.
    pub fn with_message(code: DiagnosticCode, message: impl Into<String>, severity: Severity, span: Span) -> Self {
        Self { code, message: message.into(), severity, span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} at {}..{}: {}",
            self.severity, self.span.start.offset, self.span.end.offset, self.message
        )
    }
}
