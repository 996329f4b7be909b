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

//! Turning the lexed text of `@...` date/time literals into boxed
//! values. The lexer only validates the character-level shape (digits
//! where digits belong); this module carries the actual calendar
//! arithmetic and fills in the pieces a partial-precision literal
//! (`@2023`, `@2023-06`) omits: month/day default to `1`, time-of-day
//! defaults to midnight, and an offset-less `dateTime` defaults to UTC.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::{FhirPathError, Result};
use octofhir_fhirpath_model::BoxedValue;

fn invalid(span: Span, text: &str, what: &str) -> FhirPathError {
    FhirPathError::InvalidOperandType { span, message: format!("'{text}' is not a valid {what} literal") }
}

struct DateParts {
    year: i32,
    month: u32,
    day: u32,
}

fn parse_date_parts(text: &str) -> Option<DateParts> {
    let mut parts = text.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(d) => d.parse().ok()?,
        None => 1,
    };
    Some(DateParts { year, month, day })
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let (main, fraction) = match text.split_once('.') {
        Some((m, f)) => (m, Some(f)),
        None => (text, None),
    };
    let mut parts = main.split(':');
    let hour: u32 = match parts.next() {
        Some(h) if !h.is_empty() => h.parse().ok()?,
        _ => 0,
    };
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    let nanos: u32 = match fraction {
        Some(f) => {
            let mut digits = f.to_string();
            while digits.len() < 9 {
                digits.push('0');
            }
            digits.truncate(9);
            digits.parse().ok()?
        }
        None => 0,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

/// `@YYYY[-MM[-DD]]`.
pub(crate) fn boxed_date(text: &str, span: Span) -> Result<BoxedValue> {
    let body = text.strip_prefix('@').unwrap_or(text);
    let parts = parse_date_parts(body).ok_or_else(|| invalid(span, text, "date"))?;
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day).ok_or_else(|| invalid(span, text, "date"))?;
    Ok(BoxedValue::date(date))
}

/// `@Thh:mm:ss[.sss]`.
pub(crate) fn boxed_time(text: &str, span: Span) -> Result<BoxedValue> {
    let body = text.strip_prefix("@T").unwrap_or(text);
    let time = parse_time_of_day(body).ok_or_else(|| invalid(span, text, "time"))?;
    Ok(BoxedValue::time(time))
}

/// `@YYYY-MM-DDThh:mm:ss[.sss][Z|(+|-)hh:mm]`. An offset-less literal
/// defaults to UTC.
pub(crate) fn boxed_date_time(text: &str, span: Span) -> Result<BoxedValue> {
    let body = text.strip_prefix('@').unwrap_or(text);
    let (date_part, rest) = body.split_once('T').ok_or_else(|| invalid(span, text, "datetime"))?;
    let parts = parse_date_parts(date_part).ok_or_else(|| invalid(span, text, "datetime"))?;
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day).ok_or_else(|| invalid(span, text, "datetime"))?;

    let (time_text, offset) = if let Some(stripped) = rest.strip_suffix('Z') {
        (stripped, FixedOffset::east_opt(0).unwrap())
    } else if let Some(plus_pos) = rest.rfind('+') {
        (&rest[..plus_pos], parse_offset(&rest[plus_pos..], span, text)?)
    } else if let Some(minus_pos) = rest.rfind('-') {
        (&rest[..minus_pos], parse_offset(&rest[minus_pos..], span, text)?)
    } else {
        (rest, FixedOffset::east_opt(0).unwrap())
    };
    let time = parse_time_of_day(time_text).ok_or_else(|| invalid(span, text, "datetime"))?;
    let naive = date.and_time(time);
    let dt = offset.from_local_datetime(&naive).single().ok_or_else(|| invalid(span, text, "datetime"))?;
    Ok(BoxedValue::date_time(dt))
}

fn parse_offset(text: &str, span: Span, original: &str) -> Result<FixedOffset> {
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let digits = &text[1..];
    let mut parts = digits.split(':');
    let hours: i32 = parts.next().and_then(|h| h.parse().ok()).ok_or_else(|| invalid(span, original, "datetime"))?;
    let minutes: i32 = match parts.next() {
        Some(m) => m.parse().map_err(|_| invalid(span, original, "datetime"))?,
        None => 0,
    };
    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds).ok_or_else(|| invalid(span, original, "datetime"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_date_defaults_month_and_day() {
        let value = boxed_date("@2023", Span::empty_at(0)).unwrap();
        assert_eq!(value.as_object(), None);
        assert!(matches!(value.raw(), octofhir_fhirpath_model::RawValue::Date(d) if d.to_string() == "2023-01-01"));
    }

    #[test]
    fn datetime_with_zulu_offset() {
        let value = boxed_date_time("@2023-06-15T10:30:00Z", Span::empty_at(0)).unwrap();
        assert!(matches!(value.raw(), octofhir_fhirpath_model::RawValue::DateTime(_)));
    }

    #[test]
    fn datetime_with_explicit_offset() {
        let value = boxed_date_time("@2023-06-15T10:30:00+02:00", Span::empty_at(0)).unwrap();
        assert!(matches!(value.raw(), octofhir_fhirpath_model::RawValue::DateTime(_)));
    }

    #[test]
    fn bare_time_literal() {
        let value = boxed_time("@T12:30", Span::empty_at(0)).unwrap();
        assert!(matches!(value.raw(), octofhir_fhirpath_model::RawValue::Time(_)));
    }
}
