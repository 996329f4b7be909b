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

//! The tree-walking evaluator (E), §4.5–§4.6 of the engine design: walks a
//! parsed [`Expression`] against a [`Registry`] and a root value,
//! implementing the [`LazyEvaluator`] callback the registry's lambda
//! functions drive back through for per-item dispatch.
//!
//! Evaluation is synchronous throughout — nothing here does I/O, so there
//! is no async entry point and no connection pooling to configure; a
//! [`ModelProvider`] is just a synchronous trait object the caller
//! supplies.

mod engine;
mod literals;
mod navigation;

pub use engine::TreeWalker;
pub use octofhir_fhirpath_registry::{EvaluationContext, LazyEvaluator};

use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{Collection, ModelProvider, UnitConverter};
use octofhir_fhirpath_registry::Registry;

/// Evaluate `expression` against `root`, with `variables` seeded into the
/// top-level scope before the walk begins (§6.2's `evaluate(expression,
/// root_value?, context?)` contract — `context` here is `variables` plus
/// the collaborators threaded in separately).
pub fn evaluate(
    expression: &Expression,
    root: Collection,
    registry: &Registry,
    model_provider: &dyn ModelProvider,
    unit_converter: &dyn UnitConverter,
    variables: impl IntoIterator<Item = (String, Collection)>,
) -> Result<Collection> {
    let mut ctx = EvaluationContext::new(root.clone(), model_provider, unit_converter);
    for (name, value) in variables {
        ctx.define_variable(name, value);
    }
    let mut walker = TreeWalker::new(registry);
    walker.evaluate_node(expression, &root, &mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{BoxedValue, EmptyModelProvider, IdentityUnitConverter};
    use octofhir_fhirpath_parser::{parse, ParserOptions};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn top_level_evaluate_seeds_variables_and_walks_the_tree() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let root = Collection::singleton(BoxedValue::object(Arc::new(json!({"resourceType": "Patient"})), Some("Patient")));
        let parsed = parse("%greeting", &registry, &ParserOptions::simple()).unwrap();
        let result = evaluate(
            &parsed.expression,
            root,
            &registry,
            &provider,
            &converter,
            [("greeting".to_string(), Collection::singleton(BoxedValue::string("hello")))],
        )
        .unwrap();
        assert_eq!(result.as_singleton().unwrap().as_str(), Some("hello"));
    }
}
