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

//! Expression AST node definitions.

use crate::operator::{BinaryOperator, UnaryOperator};
use crate::span::Span;
use smallvec::SmallVec;

/// Stable node identifier, assigned only in LSP mode (see `ParserOptions`
/// in `octofhir-fhirpath-parser`). `0` is never assigned to a real node,
/// so `NodeId(0)` doubles as "no id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// A parsed FHIRPath expression: a node kind plus the source range it was
/// parsed from.
///
/// Every node carries a `Span`. For `Binary`/`Unary`/`Function` nodes the
/// span is the hull of the children's spans (checked by the parser as it
/// builds each node — see the range-containment invariant in the spec).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    /// The node's kind and payload.
    pub kind: ExpressionKind,
    /// The source range this node was parsed from.
    pub span: Span,
    /// Stable id for LSP-mode consumers; `None` outside LSP mode.
    pub id: Option<NodeId>,
}

impl Expression {
    /// Construct a node with no id (simple-mode parsing).
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span, id: None }
    }

    /// Construct a node with a stable id (LSP-mode parsing).
    pub fn with_id(kind: ExpressionKind, span: Span, id: NodeId) -> Self {
        Self { kind, span, id: Some(id) }
    }

    /// True if this is an `Identifier` or `TypeOrIdentifier` node — the
    /// only node kinds that a trailing `(` may turn into a function call
    /// (see §4.3.2).
    pub fn is_callable_name(&self) -> bool {
        matches!(self.kind, ExpressionKind::Identifier(_) | ExpressionKind::TypeOrIdentifier(_))
    }

    /// The identifier/type name, if this node is one of the two name-like
    /// variants.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) | ExpressionKind::TypeOrIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

/// One case per FHIRPath syntactic category. A closed sum type rather
/// than class/interface polymorphism: the evaluator's dispatch is a
/// single exhaustive `match`, so adding a variant is a compile error
/// everywhere it isn't yet handled instead of a silently-missing virtual
/// method.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpressionKind {
    /// A literal value.
    Literal(LiteralValue),

    /// A lowercase-initial identifier — a path step or argument name.
    Identifier(String),

    /// An uppercase-initial identifier. Syntactically identical to
    /// `Identifier`, but may denote a type reference (`is`/`as`/`ofType`
    /// operand) or an ordinary path step (`Patient.name`); which one it is
    /// can only be decided once the evaluator sees the type in context
    /// (see the design note on `TypeOrIdentifier` ambiguity).
    TypeOrIdentifier(String),

    /// `$this` / `$index` / `$total` or an `%environment` variable.
    Variable(VariableRef),

    /// A binary operator application.
    Binary(Box<BinaryData>),

    /// A unary prefix operator application.
    Unary(Box<UnaryData>),

    /// A function or method call: `callee(args...)`. `callee` is always an
    /// `Identifier`/`TypeOrIdentifier` node (possibly itself the right
    /// side of a dot) — postfix `(` only attaches to those (§4.3.2).
    Function(Box<FunctionData>),

    /// `expression[index]`.
    Index(Box<IndexData>),

    /// `expression is TypeName` written as the `is` keyword operator in
    /// identifier form (as opposed to `BinaryOperator::Is`, which this
    /// desugars to at evaluation time).
    MembershipTest(Box<MembershipTestData>),

    /// `expression as TypeName`.
    TypeCast(Box<TypeCastData>),

    /// `{a, b, c}` — an inline collection literal.
    Collection(Vec<Expression>),

    /// A quantity literal: `4 'mg'` or `4 days`.
    Quantity(QuantityLiteral),

    /// A cursor placeholder, inserted only when the parser was given a
    /// cursor offset. Carries enough context for a completion provider to
    /// know what kind of token would go here.
    Cursor(CursorContext),

    /// Produced only in LSP error-recovery mode: a syntax error was
    /// skipped over while synchronizing to the next boundary token.
    Error(String),
}

/// `$this` / `$index` / `$total`, or a named `%environment` variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableRef {
    /// `$this` — the current iterator item.
    This,
    /// `$index` — the current iterator index.
    Index,
    /// `$total` — the running total inside `aggregate()`.
    Total,
    /// `%name` — an environment or user-defined variable. `name` excludes
    /// the `%` sigil; delimited names (`` %`a b` ``) have already had their
    /// backticks stripped by this point.
    Environment(String),
}

/// Binary operator node payload, boxed out of `ExpressionKind` to keep the
/// enum small.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryData {
    /// The operator.
    pub op: BinaryOperator,
    /// Left operand.
    pub left: Expression,
    /// Right operand.
    pub right: Expression,
}

/// Unary operator node payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnaryData {
    /// The operator.
    pub op: UnaryOperator,
    /// The operand.
    pub operand: Expression,
}

/// Function/method call node payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionData {
    /// The callee — an `Identifier`/`TypeOrIdentifier`, possibly the
    /// right-hand side of a preceding dot (so the callee alone does not
    /// carry the "focus"; that's threaded by the evaluator, not the AST).
    pub callee: Expression,
    /// Call arguments, in source order.
    pub arguments: SmallVec<[Expression; 4]>,
}

/// `expression[index]` node payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexData {
    /// The collection being indexed.
    pub target: Expression,
    /// The index expression (evaluated to a singleton integer).
    pub index: Expression,
}

/// `expression is TypeName` payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembershipTestData {
    /// The expression under test.
    pub target: Expression,
    /// The type name, e.g. `"FHIR.Patient"` or `"System.String"`.
    pub type_name: String,
}

/// `expression as TypeName` payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeCastData {
    /// The expression being cast.
    pub target: Expression,
    /// The target type name.
    pub type_name: String,
}

/// A quantity literal's raw payload. The numeric `value` is kept as the
/// lexed string (decimal precision is preserved until the model layer
/// parses it into a `Decimal`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityLiteral {
    /// The lexed numeric literal, e.g. `"4"` or `"98.6"`.
    pub value: String,
    /// The unit text, without surrounding quotes.
    pub unit: String,
    /// Whether `unit` is one of FHIRPath's calendar-duration keywords
    /// (`year`, `month`, `week`, `day`, `hour`, `minute`, `second`,
    /// `millisecond`, singular or plural) rather than a UCUM unit — see
    /// §3.4.
    pub is_calendar_unit: bool,
}

/// What kind of token the cursor was standing in for, so a completion
/// provider can offer the right kind of suggestions without re-deriving
/// the parse context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CursorContext {
    /// The cursor sits where a binary/postfix operator would go.
    Operator,
    /// The cursor sits where an identifier would go (e.g. right after a
    /// dot).
    Identifier,
    /// The cursor sits inside a function call's argument list, at the
    /// given zero-based argument position.
    Argument(usize),
    /// The cursor sits inside an indexer's `[...]`.
    Index,
    /// The cursor sits right after `is`/`as`, where a type name goes.
    Type,
}

/// Literal scalar values. Numbers are kept as their lexed string form so
/// that decimal literals don't lose trailing zeros or precision before
/// the model layer decides how to box them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralValue {
    /// `true` / `false`.
    Boolean(bool),
    /// An integer literal with no decimal point, e.g. `42`.
    Integer(i64),
    /// A decimal literal, kept as its lexed text, e.g. `"3.140"`.
    Decimal(String),
    /// A single-quoted string literal, already unescaped.
    String(String),
    /// `@YYYY[-MM[-DD]]`.
    Date(String),
    /// `@YYYY-MM-DDThh:mm:ss[.sss][(Z|(+|-)hh:mm)]`.
    DateTime(String),
    /// `@Thh:mm:ss[.sss]`.
    Time(String),
    /// `{}` — the empty-collection literal.
    Null,
}

impl Expression {
    /// Build a `Literal` node.
    pub fn literal(value: LiteralValue, span: Span) -> Self {
        Self::new(ExpressionKind::Literal(value), span)
    }

    /// Build an `Identifier` node.
    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExpressionKind::Identifier(name.into()), span)
    }

    /// Build a `TypeOrIdentifier` node.
    pub fn type_or_identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExpressionKind::TypeOrIdentifier(name.into()), span)
    }

    /// Build a `Variable` node.
    pub fn variable(var: VariableRef, span: Span) -> Self {
        Self::new(ExpressionKind::Variable(var), span)
    }

    /// Build a `Binary` node; the span is the hull of `left` and `right`.
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        let span = left.span.hull(right.span);
        Self::new(ExpressionKind::Binary(Box::new(BinaryData { op, left, right })), span)
    }

    /// Build a `Unary` node spanning from `op_span` through the operand.
    pub fn unary(op: UnaryOperator, operand: Expression, op_span: Span) -> Self {
        let span = op_span.hull(operand.span);
        Self::new(ExpressionKind::Unary(Box::new(UnaryData { op, operand })), span)
    }

    /// Build a `Function` node; `closing_paren` is the span of the `)`
    /// token so the hull extends through it even for zero-argument calls.
    pub fn function(callee: Expression, arguments: SmallVec<[Expression; 4]>, closing_paren: Span) -> Self {
        let span = callee.span.hull(closing_paren);
        Self::new(ExpressionKind::Function(Box::new(FunctionData { callee, arguments })), span)
    }

    /// Build an `Index` node; `closing_bracket` is the span of the `]`.
    pub fn index(target: Expression, index: Expression, closing_bracket: Span) -> Self {
        let span = target.span.hull(closing_bracket);
        Self::new(ExpressionKind::Index(Box::new(IndexData { target, index })), span)
    }

    /// Build a `MembershipTest` node.
    pub fn membership_test(target: Expression, type_name: impl Into<String>, type_span: Span) -> Self {
        let span = target.span.hull(type_span);
        Self::new(
            ExpressionKind::MembershipTest(Box::new(MembershipTestData { target, type_name: type_name.into() })),
            span,
        )
    }

    /// Build a `TypeCast` node.
    pub fn type_cast(target: Expression, type_name: impl Into<String>, type_span: Span) -> Self {
        let span = target.span.hull(type_span);
        Self::new(
            ExpressionKind::TypeCast(Box::new(TypeCastData { target, type_name: type_name.into() })),
            span,
        )
    }

    /// Build a `Collection` literal node.
    pub fn collection(elements: Vec<Expression>, span: Span) -> Self {
        Self::new(ExpressionKind::Collection(elements), span)
    }

    /// Build a `Quantity` literal node.
    pub fn quantity(value: impl Into<String>, unit: impl Into<String>, is_calendar_unit: bool, span: Span) -> Self {
        Self::new(
            ExpressionKind::Quantity(QuantityLiteral { value: value.into(), unit: unit.into(), is_calendar_unit }),
            span,
        )
    }

    /// Build a `Cursor` placeholder node.
    pub fn cursor(context: CursorContext, span: Span) -> Self {
        Self::new(ExpressionKind::Cursor(context), span)
    }

    /// Build an `Error` node, used only during LSP-mode error recovery.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ExpressionKind::Error(message.into()), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(a: usize, b: usize) -> Span {
        Span { start: crate::span::Position::at_offset(a), end: crate::span::Position::at_offset(b) }
    }

    #[test]
    fn binary_span_is_hull_of_children() {
        let left = Expression::identifier("a", span(0, 1));
        let right = Expression::identifier("b", span(4, 5));
        let node = Expression::binary(BinaryOperator::Equal, left, right);
        assert_eq!(node.span, span(0, 5));
    }

    #[test]
    fn callee_name_recognized_for_identifier_and_type_variants() {
        let id = Expression::identifier("where", span(0, 5));
        let ty = Expression::type_or_identifier("Patient", span(0, 7));
        let lit = Expression::literal(LiteralValue::Integer(1), span(0, 1));
        assert!(id.is_callable_name());
        assert!(ty.is_callable_name());
        assert!(!lit.is_callable_name());
    }

    #[test]
    fn operator_symbol_roundtrip() {
        for sym in ["+", "-", "*", "/", "div", "mod", "&", "|", "=", "!=", "~", "!~", "<", ">", "<=", ">=", "and", "or", "xor", "implies", "in", "contains", "is", "as"] {
            let op = BinaryOperator::from_symbol(sym).unwrap();
            assert_eq!(op.symbol(), sym);
        }
    }
}
