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

//! `empty`, `count`, `exists`, `all`, `allTrue`/`anyTrue`/`allFalse`/
//! `anyFalse`, `subsetOf`/`supersetOf` (§4.7).

use super::{eager, invalid_operand};
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};

pub struct Empty;

impl FunctionImpl for Empty {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(super::boolean(focus.is_empty()))
    }
}

pub struct Count;

impl FunctionImpl for Count {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(Collection::singleton(BoxedValue::integer(focus.len() as i64)))
    }
}

/// `exists([criteria])`: with no argument, whether the focus is
/// non-empty; with a lazy boolean criteria, whether any item satisfies
/// it.
pub struct Exists;

impl FunctionImpl for Exists {
    fn evaluate(
        &self,
        focus: &Collection,
        args: &[EvalArg<'_>],
        span: Span,
        ctx: &mut EvaluationContext,
        eval: &mut dyn LazyEvaluator,
    ) -> Result<Collection> {
        let Some(EvalArg::Expr(criteria)) = args.first() else {
            return Ok(super::boolean(!focus.is_empty()));
        };
        for (index, item) in focus.iter().enumerate() {
            if matches_criteria(criteria, item, index, focus.len(), ctx, eval, span, "exists")? {
                return Ok(super::boolean(true));
            }
        }
        Ok(super::boolean(false))
    }
}

/// `all(criteria)`: vacuously `true` on an empty focus.
pub struct All;

impl FunctionImpl for All {
    fn evaluate(
        &self,
        focus: &Collection,
        args: &[EvalArg<'_>],
        span: Span,
        ctx: &mut EvaluationContext,
        eval: &mut dyn LazyEvaluator,
    ) -> Result<Collection> {
        let Some(EvalArg::Expr(criteria)) = args.first() else {
            return Err(invalid_operand(span, "'all' requires a criteria expression"));
        };
        for (index, item) in focus.iter().enumerate() {
            if !matches_criteria(criteria, item, index, focus.len(), ctx, eval, span, "all")? {
                return Ok(super::boolean(false));
            }
        }
        Ok(super::boolean(true))
    }
}

fn matches_criteria(
    criteria: &octofhir_fhirpath_ast::Expression,
    item: &BoxedValue,
    index: usize,
    total_len: usize,
    ctx: &mut EvaluationContext,
    eval: &mut dyn LazyEvaluator,
    span: Span,
    what: &str,
) -> Result<bool> {
    let item_focus = Collection::singleton(item.clone());
    let mut child_ctx = ctx.with_iterator(item_focus.clone(), index as i64, Some(Collection::singleton(BoxedValue::integer(total_len as i64))));
    let result = eval.evaluate_node(criteria, &item_focus, &mut child_ctx)?;
    let value = crate::operators::singleton(&result, span, what)?;
    Ok(value.and_then(BoxedValue::to_fhirpath_boolean).unwrap_or(false))
}

macro_rules! boolean_aggregate {
    ($name:ident, $what:expr, $init:expr, $fold:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(
                &self,
                focus: &Collection,
                _args: &[EvalArg<'_>],
                span: Span,
                _ctx: &mut EvaluationContext,
                _eval: &mut dyn LazyEvaluator,
            ) -> Result<Collection> {
                let mut acc = $init;
                for item in focus.iter() {
                    let b = item
                        .to_fhirpath_boolean()
                        .ok_or_else(|| invalid_operand(span, concat!($what, " requires a collection of booleans")))?;
                    acc = $fold(acc, b);
                }
                Ok(super::boolean(acc))
            }
        }
    };
}

boolean_aggregate!(AllTrue, "allTrue()", true, |acc: bool, b: bool| acc && b);
boolean_aggregate!(AnyTrue, "anyTrue()", false, |acc: bool, b: bool| acc || b);
boolean_aggregate!(AllFalse, "allFalse()", true, |acc: bool, b: bool| acc && !b);
boolean_aggregate!(AnyFalse, "anyFalse()", false, |acc: bool, b: bool| acc || !b);

pub struct SubsetOf;

impl FunctionImpl for SubsetOf {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let other = eager(args, 0);
        Ok(super::boolean(focus.subset_of(other, ctx.unit_converter)))
    }
}

pub struct SupersetOf;

impl FunctionImpl for SupersetOf {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let other = eager(args, 0);
        Ok(super::boolean(other.subset_of(focus, ctx.unit_converter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    #[test]
    fn empty_and_count() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let mut ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        struct NoopEvaluator;
        impl LazyEvaluator for NoopEvaluator {
            fn evaluate_node(&mut self, _n: &octofhir_fhirpath_ast::Expression, _f: &Collection, _c: &mut EvaluationContext) -> Result<Collection> {
                unreachable!()
            }
        }
        let mut evaluator = NoopEvaluator;
        let focus = Collection::from_values([BoxedValue::integer(1), BoxedValue::integer(2)]);
        assert_eq!(Empty.evaluate(&focus, &[], Span::empty_at(0), &mut ctx, &mut evaluator).unwrap().as_singleton().unwrap().as_boolean(), Some(false));
        assert_eq!(Count.evaluate(&focus, &[], Span::empty_at(0), &mut ctx, &mut evaluator).unwrap().as_singleton().unwrap().as_integer(), Some(2));
    }
}
