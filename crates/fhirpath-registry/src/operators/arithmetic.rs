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

//! Arithmetic operators: `+ - * / div mod &` and unary `+ -`.

use super::{arithmetic_error, as_decimal, as_integer, invalid_operand, numeric_result, singleton, singleton_pair};
use crate::context::EvaluationContext;
use crate::entry::{BinaryOperatorImpl, UnaryOperatorImpl};
use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveTime};
use octofhir_fhirpath_model::{BoxedValue, Collection, Quantity, RawValue};
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use rust_decimal::Decimal;

/// Normalize a calendar-unit spelling the way [`Quantity`]'s own internal
/// helper does, duplicated here because that helper is private to the
/// quantity module.
fn canonical_unit(unit: &str) -> &str {
    match unit {
        "years" => "year",
        "months" => "month",
        "weeks" => "week",
        "days" => "day",
        "hours" => "hour",
        "minutes" => "minute",
        "seconds" => "second",
        "milliseconds" => "millisecond",
        other => other,
    }
}

fn calendar_magnitude(quantity: &Quantity, span: Span) -> Result<(&str, i64)> {
    let unit = quantity
        .unit
        .as_deref()
        .ok_or_else(|| invalid_operand(span, "date/time arithmetic requires a calendar-unit quantity"))?;
    let magnitude = i64::try_from(quantity.value)
        .map_err(|_| invalid_operand(span, "date/time arithmetic requires a whole-number quantity"))?;
    Ok((canonical_unit(unit), magnitude))
}

fn shift_date(date: NaiveDate, quantity: &Quantity, span: Span, negate: bool) -> Result<NaiveDate> {
    let (unit, magnitude) = calendar_magnitude(quantity, span)?;
    let signed = if negate { -magnitude } else { magnitude };
    match unit {
        "year" => shift_months(date, signed * 12, span),
        "month" => shift_months(date, signed, span),
        "week" => Ok(date + Duration::days(signed * 7)),
        "day" => Ok(date + Duration::days(signed)),
        other => Err(invalid_operand(span, format!("'{other}' is not a valid unit for Date arithmetic"))),
    }
}

fn shift_months(date: NaiveDate, months: i64, span: Span) -> Result<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new((-months) as u32))
    };
    shifted.ok_or_else(|| arithmetic_error(span, "date arithmetic overflowed the representable range"))
}

fn shift_date_time(dt: DateTime<FixedOffset>, quantity: &Quantity, span: Span, negate: bool) -> Result<DateTime<FixedOffset>> {
    let (unit, magnitude) = calendar_magnitude(quantity, span)?;
    let signed = if negate { -magnitude } else { magnitude };
    match unit {
        "year" | "month" => {
            let months = if unit == "year" { signed * 12 } else { signed };
            let offset = *dt.offset();
            let shifted_date = shift_months(dt.date_naive(), months, span)?;
            let shifted_local = shifted_date.and_time(dt.naive_local().time());
            let naive_utc = shifted_local - Duration::seconds(offset.local_minus_utc() as i64);
            Ok(DateTime::from_naive_utc_and_offset(naive_utc, offset))
        }
        "week" => Ok(dt + Duration::days(signed * 7)),
        "day" => Ok(dt + Duration::days(signed)),
        "hour" => Ok(dt + Duration::hours(signed)),
        "minute" => Ok(dt + Duration::minutes(signed)),
        "second" => Ok(dt + Duration::seconds(signed)),
        "millisecond" => Ok(dt + Duration::milliseconds(signed)),
        other => Err(invalid_operand(span, format!("'{other}' is not a valid unit for DateTime arithmetic"))),
    }
}

fn shift_time(time: NaiveTime, quantity: &Quantity, span: Span, negate: bool) -> Result<NaiveTime> {
    let (unit, magnitude) = calendar_magnitude(quantity, span)?;
    let signed = if negate { -magnitude } else { magnitude };
    let duration = match unit {
        "hour" => Duration::hours(signed),
        "minute" => Duration::minutes(signed),
        "second" => Duration::seconds(signed),
        "millisecond" => Duration::milliseconds(signed),
        other => return Err(invalid_operand(span, format!("'{other}' is not a valid unit for Time arithmetic"))),
    };
    Ok(time.overflowing_add_signed(duration).0)
}

/// `self - other` for two values of the same date/time kind: a
/// calendar-duration `Quantity`, in days for `Date` and seconds for
/// `DateTime`/`Time` (§9 open question: cross-unit comparisons, e.g. the
/// resulting days against a `years` quantity, stay incommensurable —
/// this engine doesn't attempt leap-year-aware unit conversion).
fn date_difference(a: NaiveDate, b: NaiveDate) -> Quantity {
    Quantity::calendar(Decimal::from(a.signed_duration_since(b).num_days()), "day")
}

fn date_time_difference(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> Quantity {
    let millis = a.signed_duration_since(b).num_milliseconds();
    Quantity::calendar(Decimal::new(millis, 3), "second")
}

fn time_difference(a: NaiveTime, b: NaiveTime) -> Quantity {
    let millis = a.signed_duration_since(b).num_milliseconds();
    Quantity::calendar(Decimal::new(millis, 3), "second")
}

fn both_sides<'a>(left: &'a BoxedValue, right: &'a BoxedValue) -> (Option<i64>, Option<i64>) {
    (as_integer(left), as_integer(right))
}

/// `+`: numeric addition, quantity addition (unit-aware), string
/// concatenation, date/dateTime/time plus a calendar-duration quantity.
pub struct Add;

impl BinaryOperatorImpl for Add {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "+")? else { return Ok(Collection::empty()) };
        match (l.raw(), r.raw()) {
            (RawValue::String(a), RawValue::String(b)) => Ok(Collection::singleton(BoxedValue::string(format!("{a}{b}")))),
            (RawValue::Quantity(a), RawValue::Quantity(b)) => a
                .add(b, ctx.unit_converter)
                .map(|q| Collection::singleton(BoxedValue::quantity(q)))
                .map_err(|message| arithmetic_error(span, message)),
            (RawValue::Date(d), RawValue::Quantity(q)) => Ok(Collection::singleton(BoxedValue::date(shift_date(*d, q, span, false)?))),
            (RawValue::DateTime(dt), RawValue::Quantity(q)) => Ok(Collection::singleton(BoxedValue::date_time(shift_date_time(*dt, q, span, false)?))),
            (RawValue::Time(t), RawValue::Quantity(q)) => Ok(Collection::singleton(BoxedValue::time(shift_time(*t, q, span, false)?))),
            _ => {
                let (ints, _) = both_sides(l, r);
                let both_integer = ints.0.is_some() && as_integer(r).is_some();
                match (as_decimal(l), as_decimal(r)) {
                    (Some(a), Some(b)) => Ok(Collection::singleton(numeric_result(a + b, both_integer))),
                    _ => Err(invalid_operand(span, "'+' requires two numbers, two strings, or two quantities")),
                }
            }
        }
    }
}

/// `-`: numeric subtraction, unit-aware quantity subtraction.
pub struct Subtract;

impl BinaryOperatorImpl for Subtract {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "-")? else { return Ok(Collection::empty()) };
        match (l.raw(), r.raw()) {
            (RawValue::Quantity(a), RawValue::Quantity(b)) => {
                return a
                    .subtract(b, ctx.unit_converter)
                    .map(|q| Collection::singleton(BoxedValue::quantity(q)))
                    .map_err(|message| arithmetic_error(span, message));
            }
            (RawValue::Date(d), RawValue::Quantity(q)) => return Ok(Collection::singleton(BoxedValue::date(shift_date(*d, q, span, true)?))),
            (RawValue::DateTime(dt), RawValue::Quantity(q)) => {
                return Ok(Collection::singleton(BoxedValue::date_time(shift_date_time(*dt, q, span, true)?)))
            }
            (RawValue::Time(t), RawValue::Quantity(q)) => return Ok(Collection::singleton(BoxedValue::time(shift_time(*t, q, span, true)?))),
            (RawValue::Date(a), RawValue::Date(b)) => return Ok(Collection::singleton(BoxedValue::quantity(date_difference(*a, *b)))),
            (RawValue::DateTime(a), RawValue::DateTime(b)) => return Ok(Collection::singleton(BoxedValue::quantity(date_time_difference(*a, *b)))),
            (RawValue::Time(a), RawValue::Time(b)) => return Ok(Collection::singleton(BoxedValue::quantity(time_difference(*a, *b)))),
            _ => {}
        }
        let both_integer = as_integer(l).is_some() && as_integer(r).is_some();
        match (as_decimal(l), as_decimal(r)) {
            (Some(a), Some(b)) => Ok(Collection::singleton(numeric_result(a - b, both_integer))),
            _ => Err(invalid_operand(span, "'-' requires two numbers or two quantities")),
        }
    }
}

/// `*`: numeric multiplication, quantity multiplication.
pub struct Multiply;

impl BinaryOperatorImpl for Multiply {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "*")? else { return Ok(Collection::empty()) };
        if let (RawValue::Quantity(a), RawValue::Quantity(b)) = (l.raw(), r.raw()) {
            return Ok(Collection::singleton(BoxedValue::quantity(a.multiply(b))));
        }
        let both_integer = as_integer(l).is_some() && as_integer(r).is_some();
        match (as_decimal(l), as_decimal(r)) {
            (Some(a), Some(b)) => Ok(Collection::singleton(numeric_result(a * b, both_integer))),
            _ => Err(invalid_operand(span, "'*' requires two numbers or two quantities")),
        }
    }
}

/// `/`: true division. Division by zero returns empty, not an error (§7).
pub struct Divide;

impl BinaryOperatorImpl for Divide {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "/")? else { return Ok(Collection::empty()) };
        if let (RawValue::Quantity(a), RawValue::Quantity(b)) = (l.raw(), r.raw()) {
            return Ok(a.divide(b).map(|q| Collection::singleton(BoxedValue::quantity(q))).unwrap_or_default());
        }
        match (as_decimal(l), as_decimal(r)) {
            (Some(_), Some(b)) if b.is_zero() => Ok(Collection::empty()),
            (Some(a), Some(b)) => Ok(Collection::singleton(BoxedValue::decimal(a / b))),
            _ => Err(invalid_operand(span, "'/' requires two numbers or two quantities")),
        }
    }
}

/// `div`: integer division, truncating toward zero.
pub struct Div;

impl BinaryOperatorImpl for Div {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "div")? else { return Ok(Collection::empty()) };
        match (as_decimal(l), as_decimal(r)) {
            (Some(_), Some(b)) if b.is_zero() => Ok(Collection::empty()),
            (Some(a), Some(b)) => Ok(Collection::singleton(BoxedValue::integer(
                i64::try_from(a / b).unwrap_or_default(),
            ))),
            _ => Err(invalid_operand(span, "'div' requires two numeric operands")),
        }
    }
}

/// `mod`: remainder. A non-numeric base raises — the one case where
/// FHIRPath's arithmetic errors rather than returns empty (§7).
pub struct Mod;

impl BinaryOperatorImpl for Mod {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some((l, r)) = singleton_pair(left, right, span, "mod")? else { return Ok(Collection::empty()) };
        let a = as_decimal(l).ok_or_else(|| invalid_operand(span, "'mod' requires a numeric left operand"))?;
        let Some(b) = as_decimal(r) else { return Ok(Collection::empty()) };
        if b.is_zero() {
            return Ok(Collection::empty());
        }
        let both_integer = as_integer(l).is_some() && as_integer(r).is_some();
        Ok(Collection::singleton(numeric_result(a % b, both_integer)))
    }
}

/// `&`: string concatenation that treats an empty operand as the empty
/// string rather than propagating empty.
pub struct Concat;

impl BinaryOperatorImpl for Concat {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let l = singleton(left, span, "&")?;
        let r = singleton(right, span, "&")?;
        let render = |v: Option<&BoxedValue>| v.map(|v| v.raw().to_display_string()).unwrap_or_default();
        Ok(Collection::singleton(BoxedValue::string(format!("{}{}", render(l), render(r)))))
    }
}

/// Unary `+`: identity on a numeric singleton.
pub struct UnaryPlus;

impl UnaryOperatorImpl for UnaryPlus {
    fn evaluate(&self, operand: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some(value) = singleton(operand, span, "unary +")? else { return Ok(Collection::empty()) };
        if as_decimal(value).is_some() || matches!(value.raw(), RawValue::Quantity(_)) {
            Ok(Collection::singleton(value.clone()))
        } else {
            Err(invalid_operand(span, "unary '+' requires a numeric operand"))
        }
    }
}

/// Unary `-`: numeric/quantity negation.
pub struct UnaryMinus;

impl UnaryOperatorImpl for UnaryMinus {
    fn evaluate(&self, operand: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let Some(value) = singleton(operand, span, "unary -")? else { return Ok(Collection::empty()) };
        match value.raw() {
            RawValue::Integer(i) => Ok(Collection::singleton(BoxedValue::integer(-i))),
            RawValue::Decimal(d) => Ok(Collection::singleton(BoxedValue::decimal(-*d))),
            RawValue::Quantity(q) => {
                Ok(Collection::singleton(BoxedValue::quantity(Quantity { value: -q.value, ..(**q).clone() })))
            }
            _ => Err(invalid_operand(span, "unary '-' requires a numeric operand")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    fn ctx() -> (EmptyModelProvider, IdentityUnitConverter) {
        (EmptyModelProvider, IdentityUnitConverter)
    }

    fn span() -> Span {
        Span::empty_at(0)
    }

    #[test]
    fn add_propagates_empty() {
        let (mp, uc) = ctx();
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let result = Add.evaluate(&Collection::empty(), &Collection::singleton(BoxedValue::integer(1)), span(), &ctx).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn add_keeps_integer_result_integer() {
        let (mp, uc) = ctx();
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let result = Add
            .evaluate(
                &Collection::singleton(BoxedValue::integer(2)),
                &Collection::singleton(BoxedValue::integer(3)),
                span(),
                &ctx,
            )
            .unwrap();
        assert_eq!(result.as_singleton().unwrap().as_integer(), Some(5));
    }

    #[test]
    fn concat_treats_empty_as_empty_string() {
        let (mp, uc) = ctx();
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let result = Concat
            .evaluate(&Collection::singleton(BoxedValue::string("a")), &Collection::empty(), span(), &ctx)
            .unwrap();
        assert_eq!(result.as_singleton().unwrap().as_str(), Some("a"));
    }
}
