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

//! Concrete operator evaluators, one small struct per operator (§4.7).

pub mod arithmetic;
pub mod collection_ops;
pub mod comparison;
pub mod logical;
pub mod type_ops;

use octofhir_fhirpath_model::{BoxedValue, Collection, RawValue};
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::{FhirPathError, Result};
use rust_decimal::Decimal;

/// Enforce the singleton rule for an operand (§4.4): `Ok(None)` for
/// empty, `Ok(Some(value))` for exactly one item, `Err` with a source
/// range for more than one.
pub(crate) fn singleton<'a>(collection: &'a Collection, span: Span, what: &str) -> Result<Option<&'a BoxedValue>> {
    collection.require_singleton().map_err(|()| FhirPathError::SingletonRequired {
        span,
        message: format!("{what} requires a single value, got a collection of {} items", collection.len()),
    })
}

/// Shorthand for the common case: both operands must be present
/// singletons, or the whole operator returns empty (§4.4 empty
/// propagation).
pub(crate) fn singleton_pair<'a>(
    left: &'a Collection,
    right: &'a Collection,
    span: Span,
    what: &str,
) -> Result<Option<(&'a BoxedValue, &'a BoxedValue)>> {
    let left = singleton(left, span, what)?;
    let right = singleton(right, span, what)?;
    Ok(match (left, right) {
        (Some(l), Some(r)) => Some((l, r)),
        _ => None,
    })
}

/// A numeric operand coerced to `Decimal`, accepting `Integer`,
/// `Decimal`, and unitless `Quantity` values.
pub(crate) fn as_decimal(value: &BoxedValue) -> Option<Decimal> {
    match value.raw() {
        RawValue::Integer(i) => Some(Decimal::from(*i)),
        RawValue::Decimal(d) => Some(*d),
        RawValue::Quantity(q) if q.unit.is_none() => Some(q.value),
        _ => None,
    }
}

/// Whether `value` is an `Integer` specifically (arithmetic that must
/// preserve integer-ness, like `div`/`mod`, checks this rather than
/// `as_decimal`).
pub(crate) fn as_integer(value: &BoxedValue) -> Option<i64> {
    match value.raw() {
        RawValue::Integer(i) => Some(*i),
        _ => None,
    }
}

pub(crate) fn invalid_operand(span: Span, message: impl Into<String>) -> FhirPathError {
    FhirPathError::InvalidOperandType { span, message: message.into() }
}

pub(crate) fn arithmetic_error(span: Span, message: impl Into<String>) -> FhirPathError {
    FhirPathError::ArithmeticError { span, message: message.into() }
}

/// Wrap a `Decimal` result into the integer boxed value when both
/// operands were integers and the result has no fractional part,
/// otherwise as a decimal — FHIRPath's `+`/`-`/`*` stay `Integer` when
/// both operands are `Integer`.
pub(crate) fn numeric_result(value: Decimal, both_integer: bool) -> BoxedValue {
    if both_integer && value.fract().is_zero() {
        if let Ok(i) = i64::try_from(value) {
            return BoxedValue::integer(i);
        }
    }
    BoxedValue::decimal(value)
}
