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

//! `union`, `combine`, `distinct`, `isDistinct`, `intersect`, `exclude`
//! (§4.7, §4.6.2's dedup-vs-not distinction).

use super::eager;
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::Collection;

/// `union(other)`: same dedup contract as the `|` operator.
pub struct Union;

impl FunctionImpl for Union {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.union(eager(args, 0), ctx.unit_converter))
    }
}

/// `combine(other)`: concatenation without deduplication.
pub struct Combine;

impl FunctionImpl for Combine {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.combine(eager(args, 0)))
    }
}

pub struct Distinct;

impl FunctionImpl for Distinct {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.distinct(ctx.unit_converter))
    }
}

pub struct IsDistinct;

impl FunctionImpl for IsDistinct {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(super::boolean(focus.is_distinct(ctx.unit_converter)))
    }
}

pub struct Intersect;

impl FunctionImpl for Intersect {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.intersect(eager(args, 0), ctx.unit_converter))
    }
}

/// `exclude(other)`: does **not** deduplicate, mirroring `combine()`
/// rather than `union()` (the open-question resolution recorded in
/// `Collection::exclude`'s own doc comment).
pub struct Exclude;

impl FunctionImpl for Exclude {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(focus.exclude(eager(args, 0), ctx.unit_converter))
    }
}
