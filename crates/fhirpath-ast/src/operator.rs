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

//! Operator symbol enums.
//!
//! These carry only identity, not precedence or associativity — that
//! metadata lives in the registry (`octofhir-fhirpath-registry`), which is
//! the single source of truth the parser and evaluator both query.

use std::fmt;

/// A binary operator symbol, spanning arithmetic, comparison, logical,
/// membership, type, and collection operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOperator {
    /// `.`
    Dot,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `div`
    Div,
    /// `mod`
    Mod,
    /// `&`
    Concat,
    /// `|`
    Union,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `~`
    Equivalent,
    /// `!~`
    NotEquivalent,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
    /// `implies`
    Implies,
    /// `in`
    In,
    /// `contains`
    Contains,
    /// `is` (symbolic form inside an expression, e.g. `a is Patient`)
    Is,
    /// `as`
    As,
}

impl BinaryOperator {
    /// The canonical textual symbol used as the registry key.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Concat => "&",
            Self::Union => "|",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Equivalent => "~",
            Self::NotEquivalent => "!~",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Implies => "implies",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Is => "is",
            Self::As => "as",
        }
    }

    /// True for operators spelled as a keyword rather than a symbol —
    /// these are only recognized as operators when the lexer's identifier
    /// token matches one of these words exactly.
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Div
                | Self::Mod
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Implies
                | Self::In
                | Self::Contains
                | Self::Is
                | Self::As
        )
    }

    /// Look up a binary operator by its textual symbol or keyword.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "." => Self::Dot,
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "div" => Self::Div,
            "mod" => Self::Mod,
            "&" => Self::Concat,
            "|" => Self::Union,
            "=" => Self::Equal,
            "!=" => Self::NotEqual,
            "~" => Self::Equivalent,
            "!~" => Self::NotEquivalent,
            "<" => Self::LessThan,
            ">" => Self::GreaterThan,
            "<=" => Self::LessOrEqual,
            ">=" => Self::GreaterOrEqual,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "implies" => Self::Implies,
            "in" => Self::In,
            "contains" => Self::Contains,
            "is" => Self::Is,
            "as" => Self::As,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A unary prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOperator {
    /// Unary `+`
    Plus,
    /// Unary `-`
    Minus,
    /// `not` (rarely used as a prefix keyword; FHIRPath more commonly
    /// calls `.not()` as a function, but the grammar in §4.3.1 allows a
    /// unary-op prefix position too).
    Not,
}

impl UnaryOperator {
    /// The canonical textual symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
