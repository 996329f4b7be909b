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

//! `trace`, `iif`, `defineVariable`, `ofType`, `type`, `hasValue`, `not`
//! (§4.6.2, §4.7). `iif` and `defineVariable` are lazy — their
//! `then`/`else`/`value` arguments are unevaluated expressions driven
//! through [`LazyEvaluator`] rather than pre-evaluated collections.

use super::{eager, invalid_arity, invalid_operand};
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};

/// `trace(name [, projection])`: logs the focus (or, if given, the
/// per-item projection) at `info` level tagged with `name`, then passes
/// the original focus through untouched — tracing must never change
/// what the rest of the pipeline sees.
pub struct Trace;

impl FunctionImpl for Trace {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let name = eager(args, 0).as_singleton().and_then(BoxedValue::as_str).ok_or_else(|| invalid_operand(span, "trace() requires a string name"))?;
        if let Some(EvalArg::Expr(projection)) = args.get(1) {
            let mut projected_all = Vec::new();
            for (index, item) in focus.iter().enumerate() {
                let this = Collection::singleton(item.clone());
                let mut child_ctx = ctx.with_iterator(this.clone(), index as i64, None);
                let projected = eval.evaluate_node(projection, &this, &mut child_ctx)?;
                log::info!(target: "fhirpath::trace", "{name}: {projected:?}");
                projected_all.extend(projected.into_iter_owned());
            }
            ctx.push_trace(name, projected_all.into_iter().collect());
        } else {
            log::info!(target: "fhirpath::trace", "{name}: {focus:?}");
            ctx.push_trace(name, focus.clone());
        }
        Ok(focus.clone())
    }
}

/// `iif(condition, then [, otherwise])`: lazy in both branches so the
/// one not taken is never evaluated — essential for guards like
/// `iif(denom = 0, 0, numer / denom)`.
pub struct Iif;

impl FunctionImpl for Iif {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let condition_expr = args.first().and_then(EvalArg::as_expr).ok_or_else(|| invalid_arity("iif()", "2 or 3", args.len(), span))?;
        let condition = eval.evaluate_node(condition_expr, focus, ctx)?;
        let truthy = match crate::operators::singleton(&condition, span, "iif()")? {
            Some(value) => value.to_fhirpath_boolean().ok_or_else(|| invalid_operand(span, "iif() condition must be boolean-convertible"))?,
            None => false,
        };
        let branch = if truthy { args.get(1) } else { args.get(2) };
        match branch.and_then(EvalArg::as_expr) {
            Some(expr) => eval.evaluate_node(expr, focus, ctx),
            None => Ok(Collection::empty()),
        }
    }
}

/// `defineVariable(name [, value])`: mutates `ctx` by layering a new
/// variable scope (§4.5) — the one function besides the dot operator
/// allowed to do so. With no `value` argument, binds `name` to the
/// current focus.
pub struct DefineVariable;

impl FunctionImpl for DefineVariable {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let name = eager(args, 0).as_singleton().and_then(BoxedValue::as_str).ok_or_else(|| invalid_operand(span, "defineVariable() requires a string name"))?.to_string();
        let value = match args.get(1).and_then(EvalArg::as_expr) {
            Some(expr) => eval.evaluate_node(expr, focus, ctx)?,
            None => focus.clone(),
        };
        ctx.define_variable(name, value);
        Ok(focus.clone())
    }
}

/// `ofType(type)`: the type-only argument form (§4.6.1) delegates
/// straight to the shared filter in `type_ops`.
pub struct OfType;

impl FunctionImpl for OfType {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let type_name = args.first().and_then(EvalArg::as_type_name).ok_or_else(|| invalid_arity("ofType()", 1, args.len(), span))?;
        Ok(crate::operators::type_ops::evaluate_of_type(focus, type_name, ctx))
    }
}

/// `type()`: the fully qualified `Namespace.Name` of the singleton
/// focus's runtime type tag.
pub struct TypeOf;

impl FunctionImpl for TypeOf {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(value) = crate::operators::singleton(focus, span, "type()")? else { return Ok(Collection::empty()) };
        match value.type_info() {
            Some(info) => Ok(Collection::singleton(BoxedValue::string(info.qualified_name()))),
            None => Ok(Collection::empty()),
        }
    }
}

/// `hasValue()`: true when the focus is a single primitive with an
/// actual value (as opposed to an element carrying only extensions).
pub struct HasValue;

impl FunctionImpl for HasValue {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let has_value = match focus.as_singleton() {
            Some(value) => !matches!(value.raw(), octofhir_fhirpath_model::RawValue::Object(_)),
            None => false,
        };
        Ok(super::boolean(has_value))
    }
}

/// `not()`: the function-call form of unary `not` (§4.3.1 permits both
/// spellings).
pub struct Not;

impl FunctionImpl for Not {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        use crate::entry::UnaryOperatorImpl;
        crate::operators::logical::Not.evaluate(focus, span, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    struct NoopEvaluator;
    impl LazyEvaluator for NoopEvaluator {
        fn evaluate_node(&mut self, _n: &octofhir_fhirpath_ast::Expression, _f: &Collection, _c: &mut EvaluationContext) -> Result<Collection> {
            unreachable!()
        }
    }

    #[test]
    fn has_value_is_false_for_an_object_node() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let mut ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let mut eval = NoopEvaluator;
        let patient = serde_json::json!({"resourceType": "Patient"});
        let focus = Collection::singleton(BoxedValue::object(std::sync::Arc::new(patient), Some("Patient")));
        let result = HasValue.evaluate(&focus, &[], Span::empty_at(0), &mut ctx, &mut eval).unwrap();
        assert_eq!(result.as_singleton().and_then(BoxedValue::as_boolean), Some(false));
    }

    #[test]
    fn has_value_is_true_for_a_primitive() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let mut ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let mut eval = NoopEvaluator;
        let focus = Collection::singleton(BoxedValue::string("Doe"));
        let result = HasValue.evaluate(&focus, &[], Span::empty_at(0), &mut ctx, &mut eval).unwrap();
        assert_eq!(result.as_singleton().and_then(BoxedValue::as_boolean), Some(true));
    }
}
