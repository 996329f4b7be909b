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

//! Quantity values and the algebra over them.
//!
//! A `Quantity` short-circuits on equal units; otherwise it asks a
//! `UnitConverter` (an external, injected helper — §1's UCUM collaborator)
//! whether the units are commensurable and, if so, what the conversion
//! factor is. Calendar units (`year`, `month`, `week`, `day`, `hour`,
//! `minute`, `second`, `millisecond`) are a distinct case: FHIRPath treats
//! them as never commensurable with UCUM units, since a month has no fixed
//! length.

use rust_decimal::Decimal;
use std::fmt;

/// The calendar-duration keywords FHIRPath recognizes as a quantity unit
/// without surrounding quotes (`4 years`, not `4 'years'`).
pub const CALENDAR_UNITS: &[&str] = &[
    "year", "years", "month", "months", "week", "weeks", "day", "days",
    "hour", "hours", "minute", "minutes", "second", "seconds",
    "millisecond", "milliseconds",
];

/// True if `unit` is one of FHIRPath's calendar-duration keywords.
pub fn is_calendar_unit(unit: &str) -> bool {
    CALENDAR_UNITS.contains(&unit)
}

/// Normalize a calendar-unit keyword to its singular UCUM-adjacent form
/// (`"years"` and `"year"` both become `"year"`), used for calendar-unit
/// comparisons where two singular/plural spellings should be treated
/// identically.
fn canonical_calendar_unit(unit: &str) -> &str {
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

/// Whether two quantities' units can be compared or combined at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commensurability {
    /// Units are identical (including both being absent) — no conversion
    /// needed.
    Identical,
    /// Units differ but a conversion factor exists.
    Convertible(DecimalFactor),
    /// Units cannot be compared or combined.
    Incommensurable,
}

/// A conversion factor paired with an additive offset (needed for
/// temperature-like units); `value_in_target = value_in_source * factor +
/// offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalFactor {
    /// Multiplicative factor.
    pub factor: f64,
    /// Additive offset, applied after multiplying.
    pub offset: f64,
}

/// External unit-commensurability oracle (the UCUM helper §3.4 and §1
/// describe as out of core scope). The quantity algebra only needs two
/// answers from it: are these two UCUM unit strings commensurable, and if
/// so, what's the conversion factor.
pub trait UnitConverter: Send + Sync {
    /// Determine the commensurability of `from` and `to`, which are
    /// assumed to already not be calendar units and not textually
    /// identical.
    fn commensurability(&self, from: &str, to: &str) -> Commensurability;
}

/// A `UnitConverter` that only ever reports identical units as
/// commensurable — used when no UCUM helper is configured. This keeps the
/// quantity algebra total (never panics) at the cost of treating e.g.
/// `1 'cm'` and `1 'm'` as incommensurable.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityUnitConverter;

impl UnitConverter for IdentityUnitConverter {
    fn commensurability(&self, _from: &str, _to: &str) -> Commensurability {
        Commensurability::Incommensurable
    }
}

/// A `UnitConverter` backed by the real `octofhir-ucum` crate, used
/// whenever the `ucum` feature is enabled (the default).
#[cfg(feature = "ucum")]
#[derive(Debug, Default, Clone, Copy)]
pub struct UcumUnitConverter;

#[cfg(feature = "ucum")]
impl UnitConverter for UcumUnitConverter {
    fn commensurability(&self, from: &str, to: &str) -> Commensurability {
        match (octofhir_ucum::analyse(from), octofhir_ucum::analyse(to)) {
            (Ok(a), Ok(b)) if a.dimension == b.dimension => {
                Commensurability::Convertible(DecimalFactor {
                    factor: a.factor / b.factor,
                    offset: a.offset - b.offset,
                })
            }
            _ => Commensurability::Incommensurable,
        }
    }
}

/// The default unit converter: UCUM-backed when the `ucum` feature is
/// enabled, identity-only otherwise.
pub fn default_unit_converter() -> Box<dyn UnitConverter> {
    #[cfg(feature = "ucum")]
    {
        Box::new(UcumUnitConverter)
    }
    #[cfg(not(feature = "ucum"))]
    {
        Box::new(IdentityUnitConverter)
    }
}

/// A `(value, unit)` pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    /// The numeric value.
    pub value: Decimal,
    /// The unit string, or `None` for a unitless quantity.
    pub unit: Option<String>,
    /// Whether `unit` is a FHIRPath calendar keyword rather than a UCUM
    /// unit.
    pub is_calendar_unit: bool,
}

impl Quantity {
    /// A quantity with a UCUM (or otherwise non-calendar) unit.
    pub fn new(value: Decimal, unit: Option<String>) -> Self {
        let is_calendar_unit = unit.as_deref().is_some_and(is_calendar_unit);
        Self { value, unit, is_calendar_unit }
    }

    /// A unitless quantity (`4` used where a `Quantity` is expected).
    pub fn unitless(value: Decimal) -> Self {
        Self { value, unit: None, is_calendar_unit: false }
    }

    /// A calendar-duration quantity, e.g. `4 years`.
    pub fn calendar(value: Decimal, unit: impl Into<String>) -> Self {
        Self { value, unit: Some(unit.into()), is_calendar_unit: true }
    }

    fn commensurability(&self, other: &Quantity, converter: &dyn UnitConverter) -> Commensurability {
        match (&self.unit, &other.unit) {
            (None, None) => Commensurability::Identical,
            (Some(a), Some(b)) if a == b => Commensurability::Identical,
            (Some(_), Some(_)) if self.is_calendar_unit != other.is_calendar_unit => {
                Commensurability::Incommensurable
            }
            (Some(a), Some(b)) if self.is_calendar_unit && other.is_calendar_unit => {
                if canonical_calendar_unit(a) == canonical_calendar_unit(b) {
                    Commensurability::Identical
                } else {
                    Commensurability::Incommensurable
                }
            }
            (Some(a), Some(b)) => converter.commensurability(a, b),
            _ => Commensurability::Incommensurable,
        }
    }

    /// Convert `other`'s value into `self`'s unit, returning `None` when
    /// incommensurable.
    fn aligned_value(&self, other: &Quantity, converter: &dyn UnitConverter) -> Option<Decimal> {
        match self.commensurability(other, converter) {
            Commensurability::Identical => Some(other.value),
            Commensurability::Convertible(DecimalFactor { factor, offset }) => {
                let from: f64 = other.value.try_into().ok()?;
                let converted = from * factor + offset;
                Decimal::try_from(converted).ok()
            }
            Commensurability::Incommensurable => None,
        }
    }

    /// Three-way comparison, or `None` if the units are incommensurable
    /// (callers turn that into an empty result, per §4.4).
    pub fn partial_cmp(&self, other: &Quantity, converter: &dyn UnitConverter) -> Option<std::cmp::Ordering> {
        self.aligned_value(other, converter).map(|aligned| self.value.cmp(&aligned))
    }

    /// Value equality, treating incommensurable units as unequal (not an
    /// error — equality never raises).
    pub fn value_eq(&self, other: &Quantity, converter: &dyn UnitConverter) -> bool {
        self.aligned_value(other, converter).is_some_and(|aligned| self.value == aligned)
    }

    /// `self + other`, erroring when units are incommensurable.
    pub fn add(&self, other: &Quantity, converter: &dyn UnitConverter) -> Result<Quantity, String> {
        let aligned = self
            .aligned_value(other, converter)
            .ok_or_else(|| incompatible_units_message(self, other))?;
        Ok(Quantity { value: self.value + aligned, unit: self.unit.clone(), is_calendar_unit: self.is_calendar_unit })
    }

    /// `self - other`, erroring when units are incommensurable.
    pub fn subtract(&self, other: &Quantity, converter: &dyn UnitConverter) -> Result<Quantity, String> {
        let aligned = self
            .aligned_value(other, converter)
            .ok_or_else(|| incompatible_units_message(self, other))?;
        Ok(Quantity { value: self.value - aligned, unit: self.unit.clone(), is_calendar_unit: self.is_calendar_unit })
    }

    /// `self * other`. Multiplication always succeeds dimensionally in
    /// FHIRPath's limited algebra; the resulting unit is only kept when
    /// one side is unitless.
    pub fn multiply(&self, other: &Quantity) -> Quantity {
        let unit = match (&self.unit, &other.unit) {
            (Some(u), None) | (None, Some(u)) => Some(u.clone()),
            (None, None) => None,
            (Some(u), Some(_)) => Some(u.clone()),
        };
        Quantity { value: self.value * other.value, unit, is_calendar_unit: self.is_calendar_unit || other.is_calendar_unit }
    }

    /// `self / other`.
    pub fn divide(&self, other: &Quantity) -> Option<Quantity> {
        if other.value.is_zero() {
            return None;
        }
        let unit = match (&self.unit, &other.unit) {
            (Some(u), None) => Some(u.clone()),
            (None, Some(_)) | (None, None) => None,
            (Some(u), Some(_)) => Some(u.clone()),
        };
        Some(Quantity { value: self.value / other.value, unit, is_calendar_unit: self.is_calendar_unit })
    }
}

fn incompatible_units_message(a: &Quantity, b: &Quantity) -> String {
    format!(
        "incompatible units: '{}' and '{}'",
        a.unit.as_deref().unwrap_or(""),
        b.unit.as_deref().unwrap_or("")
    )
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} '{}'", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn identical_units_short_circuit() {
        let a = Quantity::new(Decimal::from_str("1").unwrap(), Some("mg".into()));
        let b = Quantity::new(Decimal::from_str("2").unwrap(), Some("mg".into()));
        let sum = a.add(&b, &IdentityUnitConverter).unwrap();
        assert_eq!(sum.value, Decimal::from_str("3").unwrap());
    }

    #[test]
    fn incommensurable_arithmetic_errors() {
        let a = Quantity::new(Decimal::from_str("1").unwrap(), Some("mg".into()));
        let b = Quantity::new(Decimal::from_str("2").unwrap(), Some("mmol".into()));
        assert!(a.add(&b, &IdentityUnitConverter).is_err());
    }

    #[test]
    fn incommensurable_comparison_is_none_not_error() {
        let a = Quantity::new(Decimal::from_str("1").unwrap(), Some("mg".into()));
        let b = Quantity::new(Decimal::from_str("2").unwrap(), Some("mmol".into()));
        assert_eq!(a.partial_cmp(&b, &IdentityUnitConverter), None);
    }

    #[test]
    fn calendar_units_never_match_ucum_units() {
        let a = Quantity::calendar(Decimal::from_str("1").unwrap(), "year");
        let b = Quantity::new(Decimal::from_str("365").unwrap(), Some("d".into()));
        assert_eq!(a.commensurability(&b, &IdentityUnitConverter), Commensurability::Incommensurable);
    }

    #[test]
    fn calendar_unit_singular_plural_are_identical() {
        let a = Quantity::calendar(Decimal::from_str("1").unwrap(), "year");
        let b = Quantity::calendar(Decimal::from_str("1").unwrap(), "years");
        assert!(a.value_eq(&b, &IdentityUnitConverter));
    }
}
