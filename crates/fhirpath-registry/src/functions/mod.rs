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

//! Concrete function evaluators, grouped by family (§4.7).

pub mod combining;
pub mod conversion;
pub mod datetime_fns;
pub mod existence;
pub mod iteration;
pub mod math_fns;
pub mod string_fns;
pub mod subsetting;
pub mod tree;
pub mod utility;

use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::{FhirPathError, Result};
use octofhir_fhirpath_model::Collection;

use crate::context::EvalArg;

/// Pull the evaluated value out of an `Eager` argument slot; functions
/// only ever call this on descriptors they declared as `Eager`, so a
/// mismatch here is an internal registry bug, not user input.
pub(crate) fn eager<'a>(args: &'a [EvalArg<'_>], index: usize) -> &'a Collection {
    args[index].as_value().expect("argument declared Eager must carry a Value")
}

pub(crate) fn optional_eager<'a>(args: &'a [EvalArg<'_>], index: usize) -> Option<&'a Collection> {
    args.get(index).map(|arg| arg.as_value().expect("argument declared Eager must carry a Value"))
}

pub(crate) fn invalid_arity(function: &str, expected: impl Into<String>, actual: usize, span: Span) -> FhirPathError {
    FhirPathError::InvalidArity { function: function.to_string(), expected: expected.into(), actual, span }
}

pub(crate) fn invalid_operand(span: Span, message: impl Into<String>) -> FhirPathError {
    FhirPathError::InvalidOperandType { span, message: message.into() }
}

pub(crate) fn boolean(b: bool) -> Collection {
    Collection::singleton(octofhir_fhirpath_model::BoxedValue::boolean(b))
}
