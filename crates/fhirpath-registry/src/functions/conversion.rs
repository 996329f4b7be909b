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

//! `toBoolean`/`toInteger`/`toDecimal`/`toString`/`toDate`/`toDateTime`/
//! `toTime`/`toQuantity` and their `convertsToX()` predicates (§4.7).
//! A conversion that can't be performed returns empty, never an error
//! (§4.6.4).

use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection, Quantity, RawValue};
use rust_decimal::Decimal;
use std::str::FromStr;

fn focus_item(focus: &Collection) -> Option<&BoxedValue> {
    focus.as_singleton()
}

pub fn parse_quantity_literal(text: &str) -> Option<Quantity> {
    let text = text.trim();
    let (number, unit) = match text.split_once('\'') {
        Some((n, rest)) => (n.trim(), rest.trim_end_matches('\'').trim()),
        None => {
            let mut parts = text.splitn(2, char::is_whitespace);
            let number = parts.next().unwrap_or_default();
            let unit = parts.next().unwrap_or_default().trim();
            (number, unit)
        }
    };
    let value = Decimal::from_str(number).ok()?;
    if unit.is_empty() {
        Some(Quantity::unitless(value))
    } else if octofhir_fhirpath_model::is_calendar_unit(unit) {
        Some(Quantity::calendar(value, unit))
    } else {
        Some(Quantity::new(value, Some(unit.to_string())))
    }
}

fn to_boolean(value: &BoxedValue) -> Option<bool> {
    value.to_fhirpath_boolean()
}

fn to_integer(value: &BoxedValue) -> Option<i64> {
    match value.raw() {
        RawValue::Integer(i) => Some(*i),
        RawValue::Decimal(d) if d.fract().is_zero() => i64::try_from(*d).ok(),
        RawValue::String(s) => s.trim().parse().ok(),
        RawValue::Boolean(b) => Some(if *b { 1 } else { 0 }),
        _ => None,
    }
}

fn to_decimal(value: &BoxedValue) -> Option<Decimal> {
    match value.raw() {
        RawValue::Integer(i) => Some(Decimal::from(*i)),
        RawValue::Decimal(d) => Some(*d),
        RawValue::String(s) => Decimal::from_str(s.trim()).ok(),
        RawValue::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        _ => None,
    }
}

fn to_quantity(value: &BoxedValue) -> Option<Quantity> {
    match value.raw() {
        RawValue::Quantity(q) => Some((**q).clone()),
        RawValue::Integer(i) => Some(Quantity::unitless(Decimal::from(*i))),
        RawValue::Decimal(d) => Some(Quantity::unitless(*d)),
        RawValue::Boolean(b) => Some(Quantity::unitless(if *b { Decimal::ONE } else { Decimal::ZERO })),
        RawValue::String(s) => parse_quantity_literal(s),
        _ => None,
    }
}

fn to_date(value: &BoxedValue) -> Option<chrono::NaiveDate> {
    match value.raw() {
        RawValue::Date(d) => Some(*d),
        RawValue::DateTime(dt) => Some(dt.date_naive()),
        RawValue::String(s) => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn to_date_time(value: &BoxedValue) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    match value.raw() {
        RawValue::DateTime(dt) => Some(*dt),
        RawValue::Date(d) => {
            let naive = d.and_hms_opt(0, 0, 0)?;
            Some(chrono::DateTime::from_naive_utc_and_offset(naive, chrono::FixedOffset::east_opt(0)?))
        }
        RawValue::String(s) => chrono::DateTime::parse_from_rfc3339(s.trim()).ok(),
        _ => None,
    }
}

fn to_time(value: &BoxedValue) -> Option<chrono::NaiveTime> {
    match value.raw() {
        RawValue::Time(t) => Some(*t),
        RawValue::String(s) => chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M:%S").ok(),
        _ => None,
    }
}

macro_rules! conversion_fn {
    ($name:ident, $convert:expr, $wrap:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                match focus_item(focus).and_then($convert) {
                    Some(converted) => Ok(Collection::singleton($wrap(converted))),
                    None => Ok(Collection::empty()),
                }
            }
        }
    };
}

macro_rules! converts_to_fn {
    ($name:ident, $convert:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                Ok(super::boolean(focus_item(focus).and_then($convert).is_some()))
            }
        }
    };
}

conversion_fn!(ToBoolean, to_boolean, BoxedValue::boolean);
conversion_fn!(ToInteger, to_integer, BoxedValue::integer);
conversion_fn!(ToDecimal, to_decimal, BoxedValue::decimal);
conversion_fn!(ToQuantity, to_quantity, BoxedValue::quantity);
conversion_fn!(ToDate, to_date, BoxedValue::date);
conversion_fn!(ToDateTime, to_date_time, BoxedValue::date_time);
conversion_fn!(ToTime, to_time, BoxedValue::time);

converts_to_fn!(ConvertsToBoolean, to_boolean);
converts_to_fn!(ConvertsToInteger, to_integer);
converts_to_fn!(ConvertsToDecimal, to_decimal);
converts_to_fn!(ConvertsToQuantity, to_quantity);
converts_to_fn!(ConvertsToDate, to_date);
converts_to_fn!(ConvertsToDateTime, to_date_time);
converts_to_fn!(ConvertsToTime, to_time);

/// `toString()`: every scalar kind has a textual rendering, so this one
/// (unlike the others) never returns empty for a non-empty singleton.
pub struct ToString;

impl FunctionImpl for ToString {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        match focus_item(focus) {
            Some(value) => Ok(Collection::singleton(BoxedValue::string(value.raw().to_display_string()))),
            None => Ok(Collection::empty()),
        }
    }
}

pub struct ConvertsToString;

impl FunctionImpl for ConvertsToString {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        Ok(super::boolean(focus_item(focus).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_literal_parses_quoted_unit() {
        let q = parse_quantity_literal("5.4 'mg'").unwrap();
        assert_eq!(q.unit.as_deref(), Some("mg"));
    }

    #[test]
    fn quantity_literal_parses_calendar_unit() {
        let q = parse_quantity_literal("4 years").unwrap();
        assert!(q.is_calendar_unit);
    }

    #[test]
    fn to_integer_truncation_rejects_fractional_decimal() {
        assert_eq!(to_integer(&BoxedValue::decimal(Decimal::from_str("1.5").unwrap())), None);
        assert_eq!(to_integer(&BoxedValue::decimal(Decimal::from_str("2.0").unwrap())), Some(2));
    }
}
