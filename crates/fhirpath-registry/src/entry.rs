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

//! Registry entry types: the metadata and evaluators the parser and
//! evaluator both consult (§3.6).

use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use octofhir_fhirpath_model::Collection;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_ast::Span;
use std::sync::Arc;

/// Tie-break direction when two operators of the same precedence meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` groups as `(a op b) op c`.
    Left,
    /// `a op b op c` groups as `a op (b op c)`.
    Right,
}

/// Whether an operator entry takes one or two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// Coarse grouping, used by `analyze`/documentation rather than by
/// evaluation — dispatch itself always goes through `evaluator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    Arithmetic,
    Equality,
    Comparison,
    Logical,
    Membership,
    TypeTest,
    Collection,
    Navigation,
}

/// A documentation-only typed overload: the operand/result type names an
/// operator is expected to accept, for `analyze`'s static pass. The
/// evaluator never consults this — each `evaluator` impl performs its own
/// dynamic type matching, the same way the teacher's operation catalog
/// does.
#[derive(Debug, Clone, Copy)]
pub struct OperatorSignature {
    pub left: &'static str,
    pub right: &'static str,
    pub result: &'static str,
}

/// A binary operator's evaluator. Operators never need to mutate the
/// runtime context — only `defineVariable` and the dot operator's special
/// evaluator-level handling do that (§4.5).
pub trait BinaryOperatorImpl: Send + Sync {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection>;
}

/// A unary operator's evaluator.
pub trait UnaryOperatorImpl: Send + Sync {
    fn evaluate(&self, operand: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection>;
}

/// The evaluator half of an [`OperatorEntry`], distinguished by arity. The
/// arity is therefore always derivable from the evaluator variant; the
/// `arity` field on `OperatorEntry` is kept anyway as an explicit, directly
/// queryable piece of metadata (§3.6 names it as its own field).
#[derive(Clone)]
pub enum OperatorEvaluator {
    Binary(Arc<dyn BinaryOperatorImpl>),
    Unary(Arc<dyn UnaryOperatorImpl>),
}

/// One operator's full metadata (§3.6, §4.2). The parser reads
/// `precedence`/`associativity`/`keyword`; the evaluator invokes
/// `evaluator`.
#[derive(Clone)]
pub struct OperatorEntry {
    pub symbol: &'static str,
    pub keyword: bool,
    pub category: OperatorCategory,
    pub precedence: u8,
    pub associativity: Associativity,
    pub arity: Arity,
    pub signatures: &'static [OperatorSignature],
    pub evaluator: OperatorEvaluator,
}

impl OperatorEntry {
    pub fn binary(
        symbol: &'static str,
        keyword: bool,
        category: OperatorCategory,
        precedence: u8,
        associativity: Associativity,
        signatures: &'static [OperatorSignature],
        evaluator: impl BinaryOperatorImpl + 'static,
    ) -> Self {
        Self {
            symbol,
            keyword,
            category,
            precedence,
            associativity,
            arity: Arity::Binary,
            signatures,
            evaluator: OperatorEvaluator::Binary(Arc::new(evaluator)),
        }
    }

    pub fn unary(
        symbol: &'static str,
        keyword: bool,
        category: OperatorCategory,
        precedence: u8,
        signatures: &'static [OperatorSignature],
        evaluator: impl UnaryOperatorImpl + 'static,
    ) -> Self {
        Self {
            symbol,
            keyword,
            category,
            precedence,
            associativity: Associativity::Right,
            arity: Arity::Unary,
            signatures,
            evaluator: OperatorEvaluator::Unary(Arc::new(evaluator)),
        }
    }
}

/// How a function argument is handed to its evaluator (§3.6, §4.6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Evaluated against the current focus/context before the function is
    /// invoked.
    Eager,
    /// Passed as an unevaluated AST node; the function drives the
    /// evaluator itself, typically once per iterator item.
    Lazy,
    /// Passed as a bare type name string, never evaluated (`ofType`,
    /// `is`, `as`).
    TypeOnly,
}

/// What shape an argument's value is expected to have once evaluated.
/// Purely descriptive — the evaluator builds an [`EvalArg`] from `mode`,
/// and each `FunctionImpl` is responsible for checking its own arguments'
/// shapes at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Any,
    Boolean,
    Integer,
    Decimal,
    String,
    Expression,
    TypeName,
}

/// One function argument's descriptor (§3.6).
#[derive(Debug, Clone, Copy)]
pub struct ArgumentDescriptor {
    pub name: &'static str,
    pub optional: bool,
    pub expected_type: ArgumentType,
    pub mode: EvaluationMode,
}

impl ArgumentDescriptor {
    pub const fn required(name: &'static str, expected_type: ArgumentType, mode: EvaluationMode) -> Self {
        Self { name, optional: false, expected_type, mode }
    }

    pub const fn optional(name: &'static str, expected_type: ArgumentType, mode: EvaluationMode) -> Self {
        Self { name, optional: true, expected_type, mode }
    }
}

/// A function's evaluator. Takes the already-prepared argument values
/// (shaped per each descriptor's `mode`), the focus collection the
/// function was called on, the runtime context (mutable so
/// `defineVariable` can replace the variable scope in place), and a
/// callback into the evaluator for lazy arguments that need per-iteration
/// dispatch.
pub trait FunctionImpl: Send + Sync {
    fn evaluate(
        &self,
        focus: &Collection,
        args: &[EvalArg<'_>],
        span: Span,
        ctx: &mut EvaluationContext,
        evaluator: &mut dyn LazyEvaluator,
    ) -> Result<Collection>;
}

/// One function's full metadata and evaluator (§3.6, §4.7).
#[derive(Clone)]
pub struct FunctionEntry {
    pub name: &'static str,
    pub arguments: &'static [ArgumentDescriptor],
    pub input_type_constraint: Option<&'static str>,
    pub propagates_empty_input: bool,
    pub evaluator: Arc<dyn FunctionImpl>,
}

impl FunctionEntry {
    pub fn new(
        name: &'static str,
        arguments: &'static [ArgumentDescriptor],
        propagates_empty_input: bool,
        evaluator: impl FunctionImpl + 'static,
    ) -> Self {
        Self { name, arguments, input_type_constraint: None, propagates_empty_input, evaluator: Arc::new(evaluator) }
    }

    /// `(minimum required, maximum, or `None` if unbounded)` argument
    /// count, derived from how many trailing descriptors are optional.
    pub fn arity_range(&self) -> (usize, Option<usize>) {
        let required = self.arguments.iter().filter(|a| !a.optional).count();
        (required, Some(self.arguments.len()))
    }
}
