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

//! FHIRPath implementation in Rust.
//!
//! This crate is a thin facade (§6) over the component crates that do
//! the actual work — it composes `parse`/`evaluate`/`compile`/`analyze`/
//! `inspect` out of [`octofhir_fhirpath_parser`], [`octofhir_fhirpath_registry`],
//! and [`octofhir_fhirpath_evaluator`] rather than reimplementing
//! anything.

pub use octofhir_fhirpath_ast as ast;
pub use octofhir_fhirpath_core as core;
pub use octofhir_fhirpath_diagnostics as diagnostics;
pub use octofhir_fhirpath_evaluator as evaluator;
pub use octofhir_fhirpath_model as model;
pub use octofhir_fhirpath_parser as parser;
pub use octofhir_fhirpath_registry as registry;

mod analyzer;
mod compiled;
mod inspect;

pub use analyzer::{analyze, AnalysisNote, AnalysisReport};
pub use compiled::{compile, CompiledExpression};
pub use inspect::{inspect, InspectReport};

use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{Collection, ModelProvider, UnitConverter};
use octofhir_fhirpath_parser::{ParseOutput, ParserOptions};
use octofhir_fhirpath_registry::Registry;

/// Tokenize and parse `source` against `registry` (§6.1). A thin
/// re-export of [`octofhir_fhirpath_parser::parse`] — the facade adds no
/// behavior of its own here.
pub fn parse(source: &str, registry: &Registry, options: &ParserOptions) -> Result<ParseOutput> {
    octofhir_fhirpath_parser::parse(source, registry, options)
}

/// Parse and evaluate `source` in one call (§6.2): `evaluate(expression,
/// root_value?, context?)`. Parses in simple (fail-fast) mode; for
/// repeated evaluation of the same expression against many inputs,
/// prefer [`compile`] so the parse happens once.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    source: &str,
    registry: &Registry,
    root: Collection,
    model_provider: &dyn ModelProvider,
    unit_converter: &dyn UnitConverter,
    variables: impl IntoIterator<Item = (String, Collection)>,
) -> Result<Collection> {
    let parsed = parse(source, registry, &ParserOptions::simple())?;
    evaluate_parsed(&parsed.expression, registry, root, model_provider, unit_converter, variables)
}

/// Evaluate an already-parsed tree, skipping the parse step entirely —
/// the primitive [`evaluate`] and [`CompiledExpression::execute`] both
/// build on.
pub fn evaluate_parsed(
    expression: &Expression,
    registry: &Registry,
    root: Collection,
    model_provider: &dyn ModelProvider,
    unit_converter: &dyn UnitConverter,
    variables: impl IntoIterator<Item = (String, Collection)>,
) -> Result<Collection> {
    octofhir_fhirpath_evaluator::evaluate(expression, root, registry, model_provider, unit_converter, variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{BoxedValue, EmptyModelProvider, IdentityUnitConverter};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn top_level_evaluate_runs_a_simple_path() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let patient = json!({"resourceType": "Patient", "active": true});
        let root = Collection::singleton(BoxedValue::object(Arc::new(patient), Some("Patient")));
        let result = evaluate("Patient.active", &registry, root, &provider, &converter, []).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(true));
    }
}
