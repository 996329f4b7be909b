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

//! Equality, equivalence, relational, and membership operators: `= != ~
//! !~ < > <= >= in contains`.

use super::{as_decimal, invalid_operand, singleton_pair};
use crate::context::EvaluationContext;
use crate::entry::BinaryOperatorImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection, RawValue};
use std::cmp::Ordering;

/// `=`: whole-collection deep equality (§4.4). Unlike the arithmetic
/// operators, equality does *not* require singleton operands — it
/// compares collections of any length elementwise, and both-empty yields
/// empty rather than `true` (§8.2 scenario 4).
pub struct Equal;

impl BinaryOperatorImpl for Equal {
    fn evaluate(&self, left: &Collection, right: &Collection, _span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        if left.is_empty() || right.is_empty() {
            return Ok(Collection::empty());
        }
        Ok(Collection::singleton(BoxedValue::boolean(left.deep_eq(right, ctx.unit_converter))))
    }
}

/// `!=`: negation of `=`, same empty-propagation.
pub struct NotEqual;

impl BinaryOperatorImpl for NotEqual {
    fn evaluate(&self, left: &Collection, right: &Collection, _span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        if left.is_empty() || right.is_empty() {
            return Ok(Collection::empty());
        }
        Ok(Collection::singleton(BoxedValue::boolean(!left.deep_eq(right, ctx.unit_converter))))
    }
}

/// `~`: equivalence. `empty ~ empty = true`; exactly one side empty is
/// `false` (not empty) — the one operator where emptiness itself is a
/// comparable value (§8.2 scenario 4).
pub struct Equivalent;

impl BinaryOperatorImpl for Equivalent {
    fn evaluate(&self, left: &Collection, right: &Collection, _span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        let result = match (left.is_empty(), right.is_empty()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            (false, false) => left.equivalent(right, ctx.unit_converter),
        };
        Ok(Collection::singleton(BoxedValue::boolean(result)))
    }
}

/// `!~`: negation of `~`.
pub struct NotEquivalent;

impl BinaryOperatorImpl for NotEquivalent {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        let equivalent = Equivalent.evaluate(left, right, span, ctx)?;
        let value = equivalent.as_singleton().and_then(BoxedValue::as_boolean).unwrap_or(false);
        Ok(Collection::singleton(BoxedValue::boolean(!value)))
    }
}

fn compare(l: &BoxedValue, r: &BoxedValue, span: Span, ctx: &EvaluationContext) -> Result<Option<Ordering>> {
    match (l.raw(), r.raw()) {
        (RawValue::String(a), RawValue::String(b)) => Ok(Some(a.cmp(b))),
        (RawValue::Date(a), RawValue::Date(b)) => Ok(Some(a.cmp(b))),
        (RawValue::DateTime(a), RawValue::DateTime(b)) => Ok(Some(a.cmp(b))),
        (RawValue::Time(a), RawValue::Time(b)) => Ok(Some(a.cmp(b))),
        (RawValue::Boolean(a), RawValue::Boolean(b)) => Ok(Some(a.cmp(b))),
        (RawValue::Quantity(a), RawValue::Quantity(b)) => Ok(a.partial_cmp(b, ctx.unit_converter)),
        _ => match (as_decimal(l), as_decimal(r)) {
            (Some(a), Some(b)) => Ok(Some(a.cmp(&b))),
            _ => Err(invalid_operand(span, "relational operators require two comparable operands of the same kind")),
        },
    }
}

macro_rules! relational_operator {
    ($name:ident, $accept:expr) => {
        pub struct $name;

        impl BinaryOperatorImpl for $name {
            fn evaluate(
                &self,
                left: &Collection,
                right: &Collection,
                span: Span,
                ctx: &EvaluationContext,
            ) -> Result<Collection> {
                let what = stringify!($name);
                let Some((l, r)) = singleton_pair(left, right, span, what)? else { return Ok(Collection::empty()) };
                match compare(l, r, span, ctx)? {
                    Some(ordering) => Ok(Collection::singleton(BoxedValue::boolean($accept(ordering)))),
                    None => Ok(Collection::empty()),
                }
            }
        }
    };
}

relational_operator!(LessThan, |o: Ordering| o == Ordering::Less);
relational_operator!(GreaterThan, |o: Ordering| o == Ordering::Greater);
relational_operator!(LessOrEqual, |o: Ordering| o != Ordering::Greater);
relational_operator!(GreaterOrEqual, |o: Ordering| o != Ordering::Less);

/// `in`: `x in y` — membership of a singleton `x` within collection `y`
/// (§8.2 scenario 7). An empty left operand yields empty; a non-empty
/// left operand always yields a boolean, even against an empty right
/// operand (membership in nothing is `false`, not unknown).
pub struct In;

impl BinaryOperatorImpl for In {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        if left.is_empty() {
            return Ok(Collection::empty());
        }
        let item = super::singleton(left, span, "in")?.expect("checked non-empty above");
        let found = right.iter().any(|candidate| candidate.deep_eq(item, ctx.unit_converter));
        Ok(Collection::singleton(BoxedValue::boolean(found)))
    }
}

/// `contains`: `y contains x`, the mirror image of `in`.
pub struct Contains;

impl BinaryOperatorImpl for Contains {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, ctx: &EvaluationContext) -> Result<Collection> {
        In.evaluate(right, left, span, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    fn ctx() -> (EmptyModelProvider, IdentityUnitConverter) {
        (EmptyModelProvider, IdentityUnitConverter)
    }

    #[test]
    fn both_empty_equality_is_empty_but_equivalence_is_true() {
        let (mp, uc) = ctx();
        let c = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let eq = Equal.evaluate(&Collection::empty(), &Collection::empty(), Span::empty_at(0), &c).unwrap();
        assert!(eq.is_empty());
        let eqv = Equivalent.evaluate(&Collection::empty(), &Collection::empty(), Span::empty_at(0), &c).unwrap();
        assert_eq!(eqv.as_singleton().unwrap().as_boolean(), Some(true));
    }

    #[test]
    fn in_against_empty_is_false_not_empty() {
        let (mp, uc) = ctx();
        let c = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let result = In
            .evaluate(&Collection::singleton(BoxedValue::integer(3)), &Collection::empty(), Span::empty_at(0), &c)
            .unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(false));
    }
}
