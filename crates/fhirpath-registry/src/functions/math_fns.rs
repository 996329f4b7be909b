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

//! `abs`, `ceiling`, `floor`, `round`, `truncate`, `sqrt`, `exp`, `ln`,
//! `log`, `power` (§4.7). Transcendental functions round-trip through
//! `f64`, matching the precision the rest of the engine's quantity math
//! already accepts for unit conversion factors.

use super::{eager, invalid_operand, optional_eager};
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};
use rust_decimal::Decimal;

fn focus_decimal(focus: &Collection, span: Span, what: &str) -> Result<Option<Decimal>> {
    match crate::operators::singleton(focus, span, what)? {
        Some(value) => crate::operators::as_decimal(value).map(Some).ok_or_else(|| invalid_operand(span, format!("'{what}' requires a numeric input"))),
        None => Ok(None),
    }
}

fn was_integer(focus: &Collection) -> bool {
    focus.as_singleton().is_some_and(|v| crate::operators::as_integer(v).is_some())
}

fn result_value(d: Decimal, integral: bool) -> BoxedValue {
    if integral && d.fract().is_zero() {
        if let Ok(i) = i64::try_from(d) {
            return BoxedValue::integer(i);
        }
    }
    BoxedValue::decimal(d)
}

macro_rules! decimal_fn {
    ($name:ident, $what:expr, $op:expr, $preserve_integer:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                match focus_decimal(focus, span, $what)? {
                    Some(d) => Ok(Collection::singleton(result_value($op(d), $preserve_integer && was_integer(focus)))),
                    None => Ok(Collection::empty()),
                }
            }
        }
    };
}

decimal_fn!(Abs, "abs()", |d: Decimal| d.abs(), true);
decimal_fn!(Ceiling, "ceiling()", |d: Decimal| d.ceil(), false);
decimal_fn!(Floor, "floor()", |d: Decimal| d.floor(), false);
decimal_fn!(Truncate, "truncate()", |d: Decimal| d.trunc(), false);

/// Route a decimal through `f64` for a transcendental function that
/// `rust_decimal` doesn't implement natively; returns empty (not an
/// error) when the math is undefined, e.g. `(-1).sqrt()`.
fn via_f64(d: Decimal, f: impl Fn(f64) -> f64) -> Option<Decimal> {
    let input: f64 = d.try_into().ok()?;
    let output = f(input);
    if output.is_finite() {
        Decimal::try_from(output).ok()
    } else {
        None
    }
}

macro_rules! transcendental_fn {
    ($name:ident, $what:expr, $op:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                match focus_decimal(focus, span, $what)? {
                    Some(d) => Ok(via_f64(d, $op).map(BoxedValue::decimal).map(Collection::singleton).unwrap_or_default()),
                    None => Ok(Collection::empty()),
                }
            }
        }
    };
}

transcendental_fn!(Sqrt, "sqrt()", f64::sqrt);
transcendental_fn!(Exp, "exp()", f64::exp);
transcendental_fn!(Ln, "ln()", f64::ln);

/// `log(base)`: logarithm of the focus to the given base.
pub struct Log;

impl FunctionImpl for Log {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(d) = focus_decimal(focus, span, "log()")? else { return Ok(Collection::empty()) };
        let base = eager(args, 0);
        let Some(base) = crate::operators::singleton(base, span, "log()")?.and_then(crate::operators::as_decimal) else {
            return Ok(Collection::empty());
        };
        Ok(via_f64(d, |x| x.log(base.try_into().unwrap_or(f64::NAN))).map(BoxedValue::decimal).map(Collection::singleton).unwrap_or_default())
    }
}

/// `power(exponent)`: stays `Integer` when the focus, exponent, and
/// result are all integral.
pub struct Power;

impl FunctionImpl for Power {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(base) = focus_decimal(focus, span, "power()")? else { return Ok(Collection::empty()) };
        let exponent_arg = eager(args, 0);
        let Some(exponent) = crate::operators::singleton(exponent_arg, span, "power()")?.and_then(crate::operators::as_decimal) else {
            return Ok(Collection::empty());
        };
        let both_integer = was_integer(focus) && optional_eager(args, 0).map(was_integer).unwrap_or(false);
        match via_f64(base, |b| b.powf(exponent.try_into().unwrap_or(f64::NAN))) {
            Some(d) => Ok(Collection::singleton(result_value(d, both_integer))),
            None => Ok(Collection::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{EmptyModelProvider, IdentityUnitConverter};
    use std::str::FromStr;

    #[test]
    fn abs_preserves_integer() {
        let (mp, uc) = (EmptyModelProvider, IdentityUnitConverter);
        let mut ctx = EvaluationContext::new(Collection::empty(), &mp, &uc);
        struct NoopEvaluator;
        impl LazyEvaluator for NoopEvaluator {
            fn evaluate_node(&mut self, _n: &octofhir_fhirpath_ast::Expression, _f: &Collection, _c: &mut EvaluationContext) -> Result<Collection> {
                unreachable!()
            }
        }
        let mut evaluator = NoopEvaluator;
        let focus = Collection::singleton(BoxedValue::integer(-5));
        let result = Abs.evaluate(&focus, &[], Span::empty_at(0), &mut ctx, &mut evaluator).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_integer(), Some(5));
    }

    #[test]
    fn sqrt_of_negative_is_empty() {
        let d = Decimal::from_str("-4").unwrap();
        assert_eq!(via_f64(d, f64::sqrt), None);
    }
}
