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

//! `children()` and `descendants()` (§4.6.2): generic tree navigation
//! over the source JSON document, independent of any particular path
//! expression. `resourceType` and FHIR's `_name` primitive-element
//! siblings are not themselves children — the sibling is folded into the
//! primitive value it annotates instead.

use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection, ModelProvider, TypeInfo};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::sync::Arc;

fn parse_primitive_string(s: &str, type_name: Option<&str>) -> BoxedValue {
    match type_name {
        Some("date") => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map(BoxedValue::date).unwrap_or_else(|_| BoxedValue::string(s)),
        Some("dateTime" | "instant") => chrono::DateTime::parse_from_rfc3339(s).map(BoxedValue::date_time).unwrap_or_else(|_| BoxedValue::string(s)),
        Some("time") => chrono::NaiveTime::parse_from_str(s, "%H:%M:%S").map(BoxedValue::time).unwrap_or_else(|_| BoxedValue::string(s)),
        _ => BoxedValue::string(s),
    }
}

fn scalar_from_json(value: &JsonValue, type_name: Option<&str>) -> Option<BoxedValue> {
    match value {
        JsonValue::Bool(b) => Some(BoxedValue::boolean(*b)),
        JsonValue::Number(n) => n.as_i64().map(BoxedValue::integer).or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()).map(BoxedValue::decimal)),
        JsonValue::String(s) => Some(parse_primitive_string(s, type_name)),
        _ => None,
    }
}

fn json_to_boxed(value: &JsonValue, element_type: Option<&TypeInfo>, primitive_sibling: Option<&JsonValue>) -> BoxedValue {
    let boxed = match value {
        JsonValue::Object(_) => BoxedValue::object(Arc::new(value.clone()), element_type.map(|t| t.name.as_str())),
        _ => scalar_from_json(value, element_type.map(|t| t.name.as_str())).unwrap_or_else(|| BoxedValue::object(Arc::new(value.clone()), None)),
    };
    match primitive_sibling {
        Some(sibling) => boxed.with_primitive_element(Arc::new(sibling.clone())),
        None => boxed,
    }
}

/// The immediate element values of a single object-valued item: arrays
/// flatten into one child per element, `resourceType` and `_`-prefixed
/// sibling keys are skipped as navigable children in their own right.
fn child_values(item: &BoxedValue, provider: &dyn ModelProvider) -> Vec<BoxedValue> {
    let Some(JsonValue::Object(map)) = item.as_object() else { return Vec::new() };
    let parent_type = item.type_info().map(|t| t.name.as_str());
    let mut children = Vec::new();
    for (key, value) in map {
        if key == "resourceType" || key.starts_with('_') {
            continue;
        }
        let element_type = parent_type.and_then(|pt| provider.get_element_type(pt, key));
        let sibling_key = format!("_{key}");
        let sibling = map.get(&sibling_key);
        match value {
            JsonValue::Array(items) => {
                let sibling_items = sibling.and_then(JsonValue::as_array);
                for (i, item) in items.iter().enumerate() {
                    let sibling = sibling_items.and_then(|arr| arr.get(i));
                    children.push(json_to_boxed(item, element_type.as_ref(), sibling));
                }
            }
            _ => children.push(json_to_boxed(value, element_type.as_ref(), sibling)),
        }
    }
    children
}

pub struct Children;

impl FunctionImpl for Children {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let mut out = Vec::new();
        for item in focus.iter() {
            out.extend(child_values(item, ctx.model_provider));
        }
        Ok(Collection::from_values(out))
    }
}

/// `descendants()`: breadth-first `repeat(children())`, deduplicated by
/// deep equality, in discovery order, never including the input itself
/// (§4.6.2).
pub struct Descendants;

impl FunctionImpl for Descendants {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let mut seen: Vec<BoxedValue> = Vec::new();
        let mut frontier: Vec<BoxedValue> = focus.iter().cloned().collect();
        loop {
            let mut next = Vec::new();
            for item in &frontier {
                next.extend(child_values(item, ctx.model_provider));
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

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::EmptyModelProvider;
    use serde_json::json;

    #[test]
    fn children_skips_resource_type_and_flattens_arrays() {
        let provider = EmptyModelProvider;
        let patient = json!({
            "resourceType": "Patient",
            "active": true,
            "name": [{"family": "Doe"}, {"family": "Roe"}],
        });
        let item = BoxedValue::object(Arc::new(patient), Some("Patient"));
        let kids = child_values(&item, &provider);
        assert_eq!(kids.len(), 3);
    }
}
