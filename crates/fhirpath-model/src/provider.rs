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

//! The model provider: an external oracle for element types and subtype
//! relationships (§6.4). The core only ever calls through this trait; it
//! never bakes in knowledge of any particular FHIR release.

use crate::types::TypeInfo;
use serde_json::Value as JsonValue;

/// External collaborator answering "does type X have element Y, and what
/// is its type?" and "is A a subtype of B?".
///
/// All three methods are synchronous oracle lookups, matching this
/// engine's synchronous evaluator (§5) — an embedder that needs to hit a
/// network-backed package registry is expected to pre-fetch or cache
/// behind this trait rather than make the core evaluator async.
pub trait ModelProvider: Send + Sync {
    /// Look up a type by name (e.g. `"Patient"`, `"HumanName"`).
    fn get_type(&self, type_name: &str) -> Option<TypeInfo>;

    /// Look up the declared type of `parent_type`'s `element_name`
    /// element (e.g. `get_element_type("Patient", "name")` ->
    /// `HumanName`, possibly a collection).
    fn get_element_type(&self, parent_type: &str, element_name: &str) -> Option<TypeInfo>;

    /// Determine whether `actual_type` is, or (for choice/union types)
    /// contains, `target_type`, returning the matching subtype's
    /// `TypeInfo` if so. Used by `ofType`/`is`/`as`.
    fn of_type(&self, actual_type: &TypeInfo, target_type: &str) -> Option<TypeInfo>;
}

/// The fallback used when no model provider is configured. Per §6.4:
/// primitive types are checked by the value's own runtime tag, and object
/// types are checked by exact `resourceType` match — no element-type
/// lookups or inheritance are available.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyModelProvider;

impl ModelProvider for EmptyModelProvider {
    fn get_type(&self, _type_name: &str) -> Option<TypeInfo> {
        None
    }

    fn get_element_type(&self, _parent_type: &str, _element_name: &str) -> Option<TypeInfo> {
        None
    }

    fn of_type(&self, actual_type: &TypeInfo, target_type: &str) -> Option<TypeInfo> {
        actual_type.matches_name(target_type).then(|| actual_type.clone())
    }
}

/// Resolve an object node's FHIR type without a model provider: the
/// `resourceType` string field, if present.
pub fn resource_type_of(node: &JsonValue) -> Option<&str> {
    node.get("resourceType").and_then(JsonValue::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_provider_of_type_falls_back_to_name_match() {
        let provider = EmptyModelProvider;
        let actual = TypeInfo::fhir("Patient", true);
        assert!(provider.of_type(&actual, "Patient").is_some());
        assert!(provider.of_type(&actual, "Observation").is_none());
    }
}
