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

//! `first`, `last`, `tail`, `skip`, `take`, `single` (§4.7).

use super::{eager, invalid_operand};
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::Collection;

macro_rules! zero_arg {
    ($name:ident, $method:ident) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(
                &self,
                focus: &Collection,
                _args: &[EvalArg<'_>],
                _span: Span,
                _ctx: &mut EvaluationContext,
                _eval: &mut dyn LazyEvaluator,
            ) -> Result<Collection> {
                Ok(focus.$method())
            }
        }
    };
}

zero_arg!(First, first);
zero_arg!(Last, last);
zero_arg!(Tail, tail);

fn arg_as_usize(args: &[EvalArg<'_>], span: Span, what: &str) -> Result<usize> {
    let value = eager(args, 0);
    let n = crate::operators::singleton(value, span, what)?
        .and_then(crate::operators::as_integer)
        .ok_or_else(|| invalid_operand(span, format!("'{what}' requires an integer argument")))?;
    Ok(n.max(0) as usize)
}

pub struct Skip;

impl FunctionImpl for Skip {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.skip(arg_as_usize(args, span, "skip")?))
    }
}

pub struct Take;

impl FunctionImpl for Take {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.take(arg_as_usize(args, span, "take")?))
    }
}

/// `single()`: the sole item, empty on an empty focus, an error on more
/// than one (§4.4's singleton rule applied explicitly as a function).
pub struct Single;

impl FunctionImpl for Single {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        match crate::operators::singleton(focus, span, "single()")? {
            Some(value) => Ok(Collection::singleton(value.clone())),
            None => Ok(Collection::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::BoxedValue;

    #[test]
    fn skip_and_take() {
        let focus = Collection::from_values((1..=5).map(BoxedValue::integer));
        assert_eq!(focus.skip(2).len(), 3);
        assert_eq!(focus.take(2).len(), 2);
    }
}
