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

//! The raw scalar values a boxed value can hold.

use crate::quantity::Quantity;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// A single unboxed FHIRPath datum.
///
/// `Object` holds a source-data node (a FHIR resource or any nested JSON
/// object/array the expression is navigating) — it is not itself a
/// collection; property access on an `Object` is how the evaluator
/// produces one.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// `true`/`false`.
    Boolean(bool),
    /// A 64-bit signed integer.
    Integer(i64),
    /// An arbitrary-precision decimal.
    Decimal(Decimal),
    /// A string.
    String(Arc<str>),
    /// A date with no time component.
    Date(NaiveDate),
    /// A date and time with a fixed UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// A time with no date component.
    Time(NaiveTime),
    /// A quantity.
    Quantity(Arc<Quantity>),
    /// A node from the source document: a FHIR object, array element, or
    /// nested structure, represented as JSON for model-agnosticism.
    Object(Arc<JsonValue>),
}

impl RawValue {
    /// The `System.*` primitive type name for this value, or `None` for
    /// `Object` (whose type is model-provider-dependent).
    pub fn primitive_type_name(&self) -> Option<&'static str> {
        match self {
            Self::Boolean(_) => Some("Boolean"),
            Self::Integer(_) => Some("Integer"),
            Self::Decimal(_) => Some("Decimal"),
            Self::String(_) => Some("String"),
            Self::Date(_) => Some("Date"),
            Self::DateTime(_) => Some("DateTime"),
            Self::Time(_) => Some("Time"),
            Self::Quantity(_) => Some("Quantity"),
            Self::Object(_) => None,
        }
    }

    /// Render as the textual form FHIRPath's `toString()` / string
    /// concatenation use.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::String(s) => s.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::Time(t) => t.format("%H:%M:%S").to_string(),
            Self::Quantity(q) => q.to_string(),
            Self::Object(obj) => obj.to_string(),
        }
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Integer(a), Self::Decimal(b)) | (Self::Decimal(b), Self::Integer(a)) => Decimal::from(*a) == *b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Quantity(a), Self::Quantity(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}
