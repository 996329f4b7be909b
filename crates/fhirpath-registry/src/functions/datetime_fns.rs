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

//! `now`, `today`, `timeOfDay` (§4.7). Unlike most functions these
//! ignore the focus entirely — they're evaluated for their side-channel
//! read of the system clock, same as the teacher's `System.now()`/
//! `System.today()` built-ins.

use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};

pub struct Now;

impl FunctionImpl for Now {
    fn evaluate(&self, _focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(Collection::singleton(BoxedValue::date_time(chrono::Local::now().fixed_offset())))
    }
}

pub struct Today;

impl FunctionImpl for Today {
    fn evaluate(&self, _focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(Collection::singleton(BoxedValue::date(chrono::Local::now().date_naive())))
    }
}

pub struct TimeOfDay;

impl FunctionImpl for TimeOfDay {
    fn evaluate(&self, _focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(Collection::singleton(BoxedValue::time(chrono::Local::now().time())))
    }
}
