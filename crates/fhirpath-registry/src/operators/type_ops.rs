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

//! `is` / `as` / `ofType` (§6.4). These three all reduce to the same
//! question — "does this value's type match the given name?" — answered
//! through [`ModelProvider::of_type`], so the logic lives here as free
//! functions shared by the `MembershipTest`/`TypeCast` AST dispatch (the
//! evaluator crate) and the `ofType()` function (`functions/utility.rs`).
//!
//! The identifier forms `is Patient` / `as Patient` never reach
//! [`BinaryOperatorImpl`] — the parser emits dedicated `MembershipTest`/
//! `TypeCast` AST nodes carrying a bare type name, not a sub-expression, so
//! there is nothing for a generic binary operator to evaluate against. The
//! [`IsPlaceholder`]/[`AsPlaceholder`] entries below exist only so the
//! registry's precedence table stays complete for the parser.

use crate::context::EvaluationContext;
use crate::entry::BinaryOperatorImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{resource_type_of, BoxedValue, Collection, RawValue, TypeInfo};

use super::{invalid_operand, singleton};

/// Resolve the best `TypeInfo` we have for a value without a model
/// provider's element-type knowledge: its own tag if present, else a
/// `resourceType` match for an object node.
fn resolve_type(value: &BoxedValue) -> Option<TypeInfo> {
    if let Some(info) = value.type_info() {
        return Some(info.clone());
    }
    if let RawValue::Object(node) = value.raw() {
        if let Some(resource_type) = resource_type_of(node) {
            return Some(TypeInfo::fhir(resource_type, true));
        }
    }
    None
}

/// `is`: does the singleton `operand` match `type_name`? Empty input
/// yields empty, never `false` (§6.4).
pub fn evaluate_is(operand: &Collection, type_name: &str, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
    let Some(value) = singleton(operand, span, "is")? else { return Ok(Collection::empty()) };
    let matched = resolve_type(value).is_some_and(|actual| ctx.model_provider.of_type(&actual, type_name).is_some());
    Ok(Collection::singleton(BoxedValue::boolean(matched)))
}

/// `as`: the singleton `operand` if it matches `type_name`, else empty.
pub fn evaluate_as(operand: &Collection, type_name: &str, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
    let Some(value) = singleton(operand, span, "as")? else { return Ok(Collection::empty()) };
    let matched = resolve_type(value).is_some_and(|actual| ctx.model_provider.of_type(&actual, type_name).is_some());
    if matched {
        Ok(Collection::singleton(value.clone()))
    } else {
        Ok(Collection::empty())
    }
}

/// `ofType(type)`: filter a whole collection down to the items matching
/// `type_name`, preserving order (§6.4, distinct from `is`/`as` which
/// require a singleton).
pub fn evaluate_of_type(focus: &Collection, type_name: &str, ctx: &EvaluationContext) -> Collection {
    focus
        .iter()
        .filter(|value| resolve_type(value).is_some_and(|actual| ctx.model_provider.of_type(&actual, type_name).is_some()))
        .cloned()
        .collect()
}

/// Registry-only placeholder; see the module doc comment.
pub struct IsPlaceholder;

impl BinaryOperatorImpl for IsPlaceholder {
    fn evaluate(&self, _left: &Collection, _right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        Err(invalid_operand(span, "'is' is dispatched through MembershipTest, not the binary operator table"))
    }
}

/// Registry-only placeholder; see the module doc comment.
pub struct AsPlaceholder;

impl BinaryOperatorImpl for AsPlaceholder {
    fn evaluate(&self, _left: &Collection, _right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        Err(invalid_operand(span, "'as' is dispatched through TypeCast, not the binary operator table"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};
    use std::sync::Arc;

    #[test]
    fn is_matches_by_resource_type_without_a_model_provider() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let patient = serde_json::json!({"resourceType": "Patient", "id": "1"});
        let value = Collection::singleton(BoxedValue::object(Arc::new(patient), Some("Patient")));
        let result = evaluate_is(&value, "Patient", Span::empty_at(0), &ctx).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(true));
    }

    #[test]
    fn as_returns_empty_on_mismatch() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let value = Collection::singleton(BoxedValue::integer(5));
        let result = evaluate_as(&value, "String", Span::empty_at(0), &ctx).unwrap();
        assert!(result.is_empty());
    }
}
