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

//! Boxed values: a raw datum paired with an optional type tag and an
//! optional FHIR "primitive element" sibling.

use crate::quantity::{Quantity, UnitConverter};
use crate::types::TypeInfo;
use crate::value::RawValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A single FHIRPath value: a raw datum, an optional type tag, and an
/// optional primitive-element sibling (the `_name` companion FHIR JSON
/// uses to attach extensions/ids to primitive values, threaded through
/// projection so it survives `select()`).
#[derive(Debug, Clone)]
pub struct BoxedValue {
    raw: RawValue,
    type_info: Option<TypeInfo>,
    primitive_element: Option<Arc<JsonValue>>,
}

impl BoxedValue {
    /// Box a raw value with no type tag or metadata.
    pub fn new(raw: RawValue) -> Self {
        Self { raw, type_info: None, primitive_element: None }
    }

    /// Box a raw value with a type tag.
    pub fn with_type(raw: RawValue, type_info: TypeInfo) -> Self {
        Self { raw, type_info: Some(type_info), primitive_element: None }
    }

    /// Attach (or replace) the primitive-element sibling.
    pub fn with_primitive_element(mut self, element: Arc<JsonValue>) -> Self {
        self.primitive_element = Some(element);
        self
    }

    /// Attach (or replace) the type tag.
    pub fn with_type_tag(mut self, type_info: TypeInfo) -> Self {
        self.type_info = Some(type_info);
        self
    }

    /// The raw datum.
    pub fn raw(&self) -> &RawValue {
        &self.raw
    }

    /// The type tag, if any.
    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    /// The FHIR primitive-element sibling, if any.
    pub fn primitive_element(&self) -> Option<&Arc<JsonValue>> {
        self.primitive_element.as_ref()
    }

    /// Convenience constructors for each scalar kind.
    pub fn boolean(b: bool) -> Self {
        Self::with_type(RawValue::Boolean(b), TypeInfo::system("Boolean", true))
    }

    /// See [`Self::boolean`].
    pub fn integer(i: i64) -> Self {
        Self::with_type(RawValue::Integer(i), TypeInfo::system("Integer", true))
    }

    /// See [`Self::boolean`].
    pub fn decimal(d: Decimal) -> Self {
        Self::with_type(RawValue::Decimal(d), TypeInfo::system("Decimal", true))
    }

    /// See [`Self::boolean`].
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::with_type(RawValue::String(s.into()), TypeInfo::system("String", true))
    }

    /// See [`Self::boolean`].
    pub fn date(d: NaiveDate) -> Self {
        Self::with_type(RawValue::Date(d), TypeInfo::system("Date", true))
    }

    /// See [`Self::boolean`].
    pub fn date_time(dt: DateTime<FixedOffset>) -> Self {
        Self::with_type(RawValue::DateTime(dt), TypeInfo::system("DateTime", true))
    }

    /// See [`Self::boolean`].
    pub fn time(t: NaiveTime) -> Self {
        Self::with_type(RawValue::Time(t), TypeInfo::system("Time", true))
    }

    /// See [`Self::boolean`].
    pub fn quantity(q: Quantity) -> Self {
        Self::with_type(RawValue::Quantity(Arc::new(q)), TypeInfo::system("Quantity", true))
    }

    /// Box a source-data node (object or array element) with an optional
    /// FHIR type name resolved by the model provider.
    pub fn object(value: Arc<JsonValue>, type_name: Option<&str>) -> Self {
        let type_info = type_name.map(|name| TypeInfo::fhir(name, true));
        Self { raw: RawValue::Object(value), type_info, primitive_element: None }
    }

    /// Universal unboxing: recover the scalar this value wraps. `Object`
    /// values unbox to themselves — there's no further scalar to recover.
    pub fn unbox(&self) -> &RawValue {
        &self.raw
    }

    /// Unwrap to a `bool` if this is a boxed boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match &self.raw {
            RawValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Unwrap to an `i64` if this is a boxed integer.
    pub fn as_integer(&self) -> Option<i64> {
        match &self.raw {
            RawValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Unwrap to a `&str` if this is a boxed string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.raw {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Unwrap to a `&Quantity` if this is a boxed quantity.
    pub fn as_quantity(&self) -> Option<&Quantity> {
        match &self.raw {
            RawValue::Quantity(q) => Some(q),
            _ => None,
        }
    }

    /// Unwrap to the underlying JSON node if this boxes an object.
    pub fn as_object(&self) -> Option<&JsonValue> {
        match &self.raw {
            RawValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// FHIRPath's lenient boolean coercion (§4.4): `true/t/yes/y/1/1.0`
    /// and their case variants convert to `true`; `false/f/no/n/0/0.0` to
    /// `false`. Used by `iif`'s condition and anywhere a non-Boolean
    /// singleton is accepted as a truth value.
    pub fn to_fhirpath_boolean(&self) -> Option<bool> {
        match &self.raw {
            RawValue::Boolean(b) => Some(*b),
            RawValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
                "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
                _ => None,
            },
            RawValue::Integer(1) => Some(true),
            RawValue::Integer(0) => Some(false),
            RawValue::Decimal(d) if *d == Decimal::ONE => Some(true),
            RawValue::Decimal(d) if d.is_zero() => Some(false),
            _ => None,
        }
    }

    /// Deep structural equality, per §4.4: boxed values compare by
    /// unboxed content, with the one cross-kind exception FHIRPath allows
    /// (`Integer` vs. `Decimal`, handled inside `RawValue::eq`). Quantity
    /// equality additionally needs the unit converter to decide
    /// commensurability.
    pub fn deep_eq(&self, other: &Self, converter: &dyn UnitConverter) -> bool {
        match (&self.raw, &other.raw) {
            (RawValue::Quantity(a), RawValue::Quantity(b)) => a.value_eq(b, converter),
            _ => self.raw == other.raw,
        }
    }

    /// FHIRPath equivalence (`~`): case-insensitive and whitespace-
    /// normalized for strings, least-precision rounding for decimals,
    /// otherwise identical to deep equality.
    pub fn equivalent(&self, other: &Self, converter: &dyn UnitConverter) -> bool {
        match (&self.raw, &other.raw) {
            (RawValue::String(a), RawValue::String(b)) => normalize_whitespace_casefold(a) == normalize_whitespace_casefold(b),
            (RawValue::Decimal(a), RawValue::Decimal(b)) => decimals_equivalent(*a, *b),
            (RawValue::Integer(a), RawValue::Decimal(b)) | (RawValue::Decimal(b), RawValue::Integer(a)) => {
                decimals_equivalent(Decimal::from(*a), *b)
            }
            (RawValue::Quantity(a), RawValue::Quantity(b)) => a.value_eq(b, converter),
            _ => self.raw == other.raw,
        }
    }
}

fn normalize_whitespace_casefold(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Round both decimals to the lesser of the two's scale before comparing,
/// so `1.10 ~ 1.1` is true but `1.10 ~ 1.11` is not.
fn decimals_equivalent(a: Decimal, b: Decimal) -> bool {
    let scale = a.scale().min(b.scale());
    a.round_dp(scale) == b.round_dp(scale)
}

impl PartialEq for BoxedValue {
    /// Structural equality that ignores the unit converter — suitable for
    /// `HashSet`/dedup contexts where quantity unit conversion doesn't
    /// apply (identical units only). Full FHIRPath equality (`=`) goes
    /// through [`BoxedValue::deep_eq`] with a real converter.
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::IdentityUnitConverter;

    #[test]
    fn boolean_coercion_accepts_documented_spellings() {
        assert_eq!(BoxedValue::string("YES").to_fhirpath_boolean(), Some(true));
        assert_eq!(BoxedValue::string("n").to_fhirpath_boolean(), Some(false));
        assert_eq!(BoxedValue::string("maybe").to_fhirpath_boolean(), None);
    }

    #[test]
    fn equivalence_is_whitespace_and_case_insensitive() {
        let a = BoxedValue::string("  Hello   World ");
        let b = BoxedValue::string("hello world");
        assert!(a.equivalent(&b, &IdentityUnitConverter));
    }

    #[test]
    fn equivalence_rounds_decimals_to_least_precision() {
        let a = BoxedValue::decimal("1.10".parse().unwrap());
        let b = BoxedValue::decimal("1.1".parse().unwrap());
        assert!(a.equivalent(&b, &IdentityUnitConverter));
        let c = BoxedValue::decimal("1.11".parse().unwrap());
        assert!(!a.equivalent(&c, &IdentityUnitConverter));
    }
}
