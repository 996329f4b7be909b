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

//! `where`, `select`, `repeat`, `aggregate` (§4.6.2, §4.7): the lazy,
//! per-item iteration functions. Each drives [`LazyEvaluator`] once per
//! `$this` binding rather than receiving a pre-evaluated argument.

use super::invalid_arity;
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::{Expression, ExpressionKind, Span};
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};

use super::invalid_operand;

fn criteria_expr<'a>(args: &'a [EvalArg<'_>], what: &str, span: Span) -> Result<&'a Expression> {
    args.first().and_then(EvalArg::as_expr).ok_or_else(|| invalid_arity(what, 1, args.len(), span))
}

/// `where(criteria)`: keep the items for which `criteria` evaluates to
/// a boolean-convertible `true` with `$this` bound to that item.
pub struct Where;

impl FunctionImpl for Where {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let criteria = criteria_expr(args, "where()", span)?;
        let mut kept = Vec::new();
        for (index, item) in focus.iter().enumerate() {
            let this = Collection::singleton(item.clone());
            let mut child_ctx = ctx.with_iterator(this.clone(), index as i64, None);
            let result = eval.evaluate_node(criteria, &this, &mut child_ctx)?;
            let truthy = match crate::operators::singleton(&result, span, "where()")? {
                Some(value) => value.to_fhirpath_boolean().ok_or_else(|| invalid_operand(span, "where() criteria must be boolean-convertible"))?,
                None => false,
            };
            if truthy {
                kept.push(item.clone());
            }
        }
        Ok(Collection::from_values(kept))
    }
}

/// `select(projection)`: evaluate `projection` with `$this` bound to
/// each item, flattening the per-item results into one collection
/// (§4.6.2 — this is the one place a nested collection is flattened
/// rather than nested).
pub struct Select;

impl FunctionImpl for Select {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let projection = criteria_expr(args, "select()", span)?;
        let mut out = Vec::new();
        for (index, item) in focus.iter().enumerate() {
            let this = Collection::singleton(item.clone());
            let mut child_ctx = ctx.with_iterator(this.clone(), index as i64, None);
            let result = eval.evaluate_node(projection, &this, &mut child_ctx)?;
            out.extend(result.into_iter_owned());
        }
        Ok(Collection::from_values(out))
    }
}

/// `repeat(projection)`: apply `projection` to the current frontier,
/// then to its own result, until a round produces nothing new.
/// Deduplicated by deep equality; the result is in discovery order and
/// never includes the original input (§4.6.2).
pub struct Repeat;

impl FunctionImpl for Repeat {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let projection = criteria_expr(args, "repeat()", span)?;
        let mut seen: Vec<BoxedValue> = Vec::new();
        let mut frontier: Vec<BoxedValue> = focus.iter().cloned().collect();
        loop {
            let mut next = Vec::new();
            for (index, item) in frontier.iter().enumerate() {
                let this = Collection::singleton(item.clone());
                let mut child_ctx = ctx.with_iterator(this.clone(), index as i64, None);
                let result = eval.evaluate_node(projection, &this, &mut child_ctx)?;
                next.extend(result.into_iter_owned());
            }
            if next.is_empty() {
                break;
            }
            let mut fresh = Vec::new();
            for candidate in next {
                if !seen.iter().any(|s| s.deep_eq(&candidate, ctx.unit_converter)) {
                    seen.push(candidate.clone());
                    fresh.push(candidate);
                }
            }
            if fresh.is_empty() {
                break;
            }
            frontier = fresh;
        }
        Ok(Collection::from_values(seen))
    }
}

/// `aggregate(expr [, init])`: a left fold over the focus with `$this`
/// bound to the current item and `$total` bound to the running
/// accumulator (initially `init`, or empty when omitted) — distinct
/// from the `$total`-as-collection-length binding some other lambda
/// functions use; here `$total` genuinely carries the accumulator
/// `expr` last produced.
pub struct Aggregate;

impl FunctionImpl for Aggregate {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let expr = criteria_expr(args, "aggregate()", span)?;
        let mut accumulator = match args.get(1).and_then(EvalArg::as_expr) {
            Some(init) => eval.evaluate_node(init, focus, ctx)?,
            None => Collection::empty(),
        };
        for (index, item) in focus.iter().enumerate() {
            let this = Collection::singleton(item.clone());
            let mut child_ctx = ctx.with_iterator(this.clone(), index as i64, Some(accumulator.clone()));
            accumulator = eval.evaluate_node(expr, &this, &mut child_ctx)?;
        }
        Ok(accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    /// Evaluates `$this` itself, ignoring the expression tree — enough
    /// to drive `where`/`select`/`repeat` without a real parser.
    struct EchoThis;
    impl LazyEvaluator for EchoThis {
        fn evaluate_node(&mut self, _node: &Expression, focus: &Collection, _ctx: &mut EvaluationContext) -> Result<Collection> {
            Ok(focus.clone())
        }
    }

    #[test]
    fn select_flattens_per_item_results() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let mut ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let mut eval = EchoThis;
        let focus = Collection::from_values(vec![BoxedValue::integer(1), BoxedValue::integer(2)]);
        let dummy = Expression::new(ExpressionKind::Variable(octofhir_fhirpath_ast::VariableRef::This), Span::empty_at(0));
        let result = Select.evaluate(&focus, &[EvalArg::Expr(&dummy)], Span::empty_at(0), &mut ctx, &mut eval).unwrap();
        assert_eq!(result.len(), 2);
    }
}
