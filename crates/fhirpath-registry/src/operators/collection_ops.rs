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

//! `|` (union) and the placeholder entry for `.` (dot).

use crate::context::EvaluationContext;
use crate::entry::BinaryOperatorImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::{FhirPathError, Result};
use octofhir_fhirpath_model::Collection;

/// `|`: deduplicated concatenation (§4.6.2).
pub struct Union;

impl BinaryOperatorImpl for Union {
    fn evaluate(&self, left: &Collection, right: &Collection, _span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        Ok(left.union(right, ctx.unit_converter))
    }
}

/// `.` needs a registry entry purely so the parser can read its
/// precedence/associativity (§4.2's registry-consistency guarantee); the
/// evaluator never dispatches through this entry — `Binary(Dot)` is
/// special-cased directly in the tree walker (§4.6) because it must
/// thread the runtime context, which an ordinary `BinaryOperatorImpl`
/// cannot do.
pub struct DotPlaceholder;

impl BinaryOperatorImpl for DotPlaceholder {
    fn evaluate(&self, _left: &Collection, _right: &Collection, _span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        Err(FhirPathError::UnknownOperator { symbol: ".".to_string() })
    }
}
