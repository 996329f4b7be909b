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

//! Error types for FHIRPath parsing and evaluation.
//!
//! Per §7 of the spec, only a subset of failure modes ever reach this
//! type: parse errors, arity/type errors, and anything a custom function
//! or model provider chooses to raise. Quiet failures (missing property,
//! out-of-range index, unit mismatch) are represented as an empty
//! collection, never as an `Err`.

use octofhir_fhirpath_diagnostics::Span;
use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, FhirPathError>;

/// Errors that can escape a parse or an evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FhirPathError {
    /// A syntax error, raised immediately in simple parsing mode.
    #[error("parse error at {}..{}: {message}", span.start.offset, span.end.offset)]
    ParseError {
        /// Where the error occurred.
        span: Span,
        /// Human-readable description.
        message: String,
    },

    /// A singleton-required operator or function received more than one
    /// item.
    #[error("singleton required at {}..{}: {message}", span.start.offset, span.end.offset)]
    SingletonRequired {
        /// Where the error occurred.
        span: Span,
        /// Human-readable description.
        message: String,
    },

    /// Wrong number of arguments to a function.
    #[error("'{function}' expects {expected} argument(s), got {actual}")]
    InvalidArity {
        /// Function name.
        function: String,
        /// Expected count, or a textual range like `"1 or 2"`.
        expected: String,
        /// Actual count received.
        actual: usize,
        /// Where the call occurred.
        span: Span,
    },

    /// An operand's type was incompatible with the operator/function.
    #[error("invalid operand type at {}..{}: {message}", span.start.offset, span.end.offset)]
    InvalidOperandType {
        /// Where the error occurred.
        span: Span,
        /// Human-readable description.
        message: String,
    },

    /// Arithmetic on incommensurable quantity units, or `mod`/`div` with a
    /// non-numeric base.
    #[error("arithmetic error at {}..{}: {message}", span.start.offset, span.end.offset)]
    ArithmeticError {
        /// Where the error occurred.
        span: Span,
        /// Human-readable description.
        message: String,
    },

    /// Reference to a function the registry doesn't know about.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// The function name that was looked up.
        name: String,
        /// Where the call occurred.
        span: Span,
    },

    /// Reference to an operator the registry doesn't know about. Only
    /// reachable through extension misconfiguration — the parser can't
    /// produce a `Binary`/`Unary` node for a symbol the registry didn't
    /// recognize in the first place.
    #[error("unknown operator '{symbol}'")]
    UnknownOperator {
        /// The operator symbol.
        symbol: String,
    },

    /// A custom function or the model provider raised an error; it
    /// propagates unchanged (§7 "Propagated errors").
    #[error("{message}")]
    Propagated {
        /// The error message from the originating collaborator.
        message: String,
    },
}

impl FhirPathError {
    /// The source range associated with this error, if any (propagated
    /// errors and unknown-operator errors have none of their own).
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::ParseError { span, .. }
            | Self::SingletonRequired { span, .. }
            | Self::InvalidArity { span, .. }
            | Self::InvalidOperandType { span, .. }
            | Self::ArithmeticError { span, .. }
            | Self::UnknownFunction { span, .. } => Some(*span),
            Self::UnknownOperator { .. } | Self::Propagated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_accessor_covers_spanned_variants() {
        let span = Span::empty_at(3);
        let err = FhirPathError::SingletonRequired { span, message: "x".into() };
        assert_eq!(err.span(), Some(span));
        let err = FhirPathError::Propagated { message: "boom".into() };
        assert_eq!(err.span(), None);
    }
}
