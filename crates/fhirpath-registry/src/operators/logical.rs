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

//! Three-valued boolean logic: `and or xor implies` and unary `not`
//! (§4.6.3). Operands coerce through [`BoxedValue::to_fhirpath_boolean`];
//! an empty operand stands for "unknown", not "false".

use super::{invalid_operand, singleton};
use crate::context::EvaluationContext;
use crate::entry::{BinaryOperatorImpl, UnaryOperatorImpl};
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};

fn tri_state(collection: &Collection, span: Span, what: &str) -> Result<Option<bool>> {
    match singleton(collection, span, what)? {
        Some(value) => value.to_fhirpath_boolean().map(Some).ok_or_else(|| invalid_operand(span, format!("'{what}' requires a boolean-convertible operand"))),
        None => Ok(None),
    }
}

fn to_collection(result: Option<bool>) -> Collection {
    result.map(BoxedValue::boolean).map(Collection::singleton).unwrap_or_default()
}

pub struct And;

impl BinaryOperatorImpl for And {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let l = tri_state(left, span, "and")?;
        let r = tri_state(right, span, "and")?;
        let result = match (l, r) {
            (Some(true), Some(true)) => Some(true),
            (Some(false), _) | (_, Some(false)) => Some(false),
            _ => None,
        };
        Ok(to_collection(result))
    }
}

pub struct Or;

impl BinaryOperatorImpl for Or {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let l = tri_state(left, span, "or")?;
        let r = tri_state(right, span, "or")?;
        let result = match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        };
        Ok(to_collection(result))
    }
}

pub struct Xor;

impl BinaryOperatorImpl for Xor {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let l = tri_state(left, span, "xor")?;
        let r = tri_state(right, span, "xor")?;
        let result = match (l, r) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        };
        Ok(to_collection(result))
    }
}

/// `implies`: `false implies _ = true`; `true implies r = r`; `empty
/// implies true = true`; `empty implies (false | empty) = empty`.
pub struct Implies;

impl BinaryOperatorImpl for Implies {
    fn evaluate(&self, left: &Collection, right: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        let l = tri_state(left, span, "implies")?;
        let r = tri_state(right, span, "implies")?;
        let result = match l {
            Some(false) => Some(true),
            Some(true) => r,
            None => {
                if r == Some(true) {
                    Some(true)
                } else {
                    None
                }
            }
        };
        Ok(to_collection(result))
    }
}

/// Unary `not` (most commonly surfaced as the `.not()` function, but the
/// grammar also permits it as a prefix operator, §4.3.1).
pub struct Not;

impl UnaryOperatorImpl for Not {
    fn evaluate(&self, operand: &Collection, span: Span, _ctx: &EvaluationContext) -> Result<Collection> {
        Ok(to_collection(tri_state(operand, span, "not")?.map(|b| !b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};

    fn eval_and(l: Option<bool>, r: Option<bool>) -> Option<bool> {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let lc = l.map(BoxedValue::boolean).map(Collection::singleton).unwrap_or_default();
        let rc = r.map(BoxedValue::boolean).map(Collection::singleton).unwrap_or_default();
        And.evaluate(&lc, &rc, Span::empty_at(0), &ctx).unwrap().as_singleton().and_then(BoxedValue::as_boolean)
    }

    #[test]
    fn three_valued_and_table() {
        assert_eq!(eval_and(Some(true), None), None);
        assert_eq!(eval_and(Some(false), None), Some(false));
        assert_eq!(eval_and(None, None), None);
    }

    #[test]
    fn implies_table() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        let empty = Collection::empty();
        let t = Collection::singleton(BoxedValue::boolean(true));
        let f = Collection::singleton(BoxedValue::boolean(false));
        assert_eq!(
            Implies.evaluate(&empty, &t, Span::empty_at(0), &ctx).unwrap().as_singleton().and_then(BoxedValue::as_boolean),
            Some(true)
        );
        assert_eq!(
            Implies.evaluate(&f, &empty, Span::empty_at(0), &ctx).unwrap().as_singleton().and_then(BoxedValue::as_boolean),
            Some(true)
        );
    }
}
