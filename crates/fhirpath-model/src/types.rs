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

//! Type tags attached to boxed values.

use std::fmt;

/// A type tag: a namespaced type name plus whether the value it's
/// attached to is known to be a singleton.
///
/// Two namespaces matter in FHIRPath: `System` (the primitive types the
/// language itself defines — `Boolean`, `String`, `Integer`, `Decimal`,
/// `Date`, `DateTime`, `Time`, `Quantity`) and `FHIR` (resource and
/// datatype names from the model, e.g. `Patient`, `HumanName`). A bare
/// type name like `Patient` in source text is resolved against the model
/// provider to pick a namespace; without one, §6.4 falls back to
/// primitive-tag / `resourceType` checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeInfo {
    /// `"System"` or `"FHIR"` (or another model-provided namespace).
    pub namespace: String,
    /// The bare type name, e.g. `"Patient"` or `"String"`.
    pub name: String,
    /// Whether the value carrying this tag is known to be a singleton.
    pub singleton: bool,
}

impl TypeInfo {
    /// Build a `System.<name>` type tag.
    pub fn system(name: impl Into<String>, singleton: bool) -> Self {
        Self { namespace: "System".to_string(), name: name.into(), singleton }
    }

    /// Build a `FHIR.<name>` type tag.
    pub fn fhir(name: impl Into<String>, singleton: bool) -> Self {
        Self { namespace: "FHIR".to_string(), name: name.into(), singleton }
    }

    /// The fully qualified `Namespace.Name` form FHIRPath's `type()`
    /// function returns.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Whether `name` (optionally namespace-qualified, e.g. `"FHIR.Patient"`
    /// or just `"Patient"`) matches this type tag, ignoring namespace when
    /// the query omits one.
    pub fn matches_name(&self, name: &str) -> bool {
        if let Some((ns, bare)) = name.split_once('.') {
            ns.eq_ignore_ascii_case(&self.namespace) && bare == self.name
        } else {
            name == self.name
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_name_ignores_namespace_when_unqualified() {
        let ty = TypeInfo::fhir("Patient", true);
        assert!(ty.matches_name("Patient"));
        assert!(ty.matches_name("FHIR.Patient"));
        assert!(!ty.matches_name("System.Patient"));
        assert!(!ty.matches_name("Observation"));
    }
}
