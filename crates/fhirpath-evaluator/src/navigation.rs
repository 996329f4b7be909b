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

//! Property navigation for `Identifier`/`TypeOrIdentifier` path steps
//! (§4.6): for each object in the current focus, collect the named
//! property, flattening arrays and skipping `null`/`resourceType`/
//! underscore-prefixed primitive-element siblings. Siblings are threaded
//! onto the produced value as metadata rather than surfaced as a step of
//! their own.
//!
//! A non-object item (already a scalar) simply contributes nothing for a
//! named step — scalars have no properties.

use chrono::{DateTime, NaiveDate, NaiveTime};
use octofhir_fhirpath_model::{BoxedValue, ModelProvider, TypeInfo};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::sync::Arc;

fn parse_primitive_string(s: &str, type_name: Option<&str>) -> BoxedValue {
    match type_name {
        Some("date") => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(BoxedValue::date).unwrap_or_else(|_| BoxedValue::string(s)),
        Some("dateTime" | "instant") => DateTime::parse_from_rfc3339(s).map(BoxedValue::date_time).unwrap_or_else(|_| BoxedValue::string(s)),
        Some("time") => NaiveTime::parse_from_str(s, "%H:%M:%S").map(BoxedValue::time).unwrap_or_else(|_| BoxedValue::string(s)),
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

/// Resolve `name` against a single object-valued item, producing zero or
/// more values (arrays flatten to one value per element). Non-object
/// items (already-scalar focus) contribute nothing — there is no
/// property to step into.
pub(crate) fn property_values(item: &BoxedValue, name: &str, provider: &dyn ModelProvider) -> Vec<BoxedValue> {
    let Some(JsonValue::Object(map)) = item.as_object() else { return Vec::new() };
    let Some(value) = map.get(name) else { return Vec::new() };
    let parent_type = item.type_info().map(|t| t.name.as_str());
    let element_type = parent_type.and_then(|pt| provider.get_element_type(pt, name));
    let sibling_key = format!("_{name}");
    let sibling = map.get(&sibling_key);
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => {
            let sibling_items = sibling.and_then(JsonValue::as_array);
            items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| {
                    let sibling = sibling_items.and_then(|arr| arr.get(i));
                    json_to_boxed(v, element_type.as_ref(), sibling)
                })
                .collect()
        }
        _ => vec![json_to_boxed(value, element_type.as_ref(), sibling)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::EmptyModelProvider;
    use serde_json::json;

    #[test]
    fn navigates_a_scalar_property() {
        let provider = EmptyModelProvider;
        let patient = json!({"resourceType": "Patient", "active": true});
        let item = BoxedValue::object(Arc::new(patient), Some("Patient"));
        let values = property_values(&item, "active", &provider);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_boolean(), Some(true));
    }

    #[test]
    fn flattens_array_valued_properties_and_skips_nulls() {
        let provider = EmptyModelProvider;
        let patient = json!({
            "resourceType": "Patient",
            "name": [{"family": "Doe"}, null, {"family": "Roe"}],
        });
        let item = BoxedValue::object(Arc::new(patient), Some("Patient"));
        let values = property_values(&item, "name", &provider);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn missing_property_yields_no_values() {
        let provider = EmptyModelProvider;
        let patient = json!({"resourceType": "Patient"});
        let item = BoxedValue::object(Arc::new(patient), Some("Patient"));
        assert!(property_values(&item, "birthDate", &provider).is_empty());
    }

    #[test]
    fn scalar_focus_has_no_properties() {
        let provider = EmptyModelProvider;
        let item = BoxedValue::string("Doe");
        assert!(property_values(&item, "family", &provider).is_empty());
    }
}
