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

//! `compile` (§6): parse once, bind every operator symbol and function
//! name to a registry entry up front, and reuse the result across many
//! `execute` calls against different inputs — the hot-loop case the
//! one-shot [`crate::evaluate`] isn't suited for.
//!
//! Binding eagerly turns an unknown function/operator into a compile-time
//! error instead of one discovered mid-evaluation on whichever call
//! happens to reach it first.

use octofhir_fhirpath_ast::{walk, Expression, ExpressionKind, Visitor};
use octofhir_fhirpath_core::{FhirPathError, Result};
use octofhir_fhirpath_model::{Collection, ModelProvider, UnitConverter};
use octofhir_fhirpath_parser::ParserOptions;
use octofhir_fhirpath_registry::Registry;

struct BindingCheck<'r> {
    registry: &'r Registry,
    error: Option<FhirPathError>,
}

impl<'r> Visitor for BindingCheck<'r> {
    fn visit(&mut self, node: &Expression) -> bool {
        if self.error.is_some() {
            return false;
        }
        match &node.kind {
            ExpressionKind::Binary(data) => {
                if self.registry.operator(data.op.symbol()).is_none() {
                    self.error = Some(FhirPathError::UnknownOperator { symbol: data.op.symbol().to_string() });
                }
            }
            ExpressionKind::Unary(data) => {
                if self.registry.operator(data.op.symbol()).is_none() {
                    self.error = Some(FhirPathError::UnknownOperator { symbol: data.op.symbol().to_string() });
                }
            }
            ExpressionKind::Function(data) => {
                if let Some(name) = data.callee.as_name() {
                    if self.registry.function(name).is_none() {
                        self.error = Some(FhirPathError::UnknownFunction { name: name.to_string(), span: node.span });
                    }
                }
            }
            _ => {}
        }
        self.error.is_none()
    }
}

/// A parsed expression whose operator/function bindings have already
/// been validated against `registry` (§6 "pre-resolves registry
/// lookups"). Evaluation semantics are identical to [`crate::evaluate`];
/// the only difference is that the parse and the binding check happen
/// once, not on every call to [`Self::execute`].
pub struct CompiledExpression<'r> {
    expression: Expression,
    registry: &'r Registry,
}

impl<'r> CompiledExpression<'r> {
    /// The parsed tree this expression wraps, for tooling that wants to
    /// inspect it without re-parsing (e.g. a caller building its own
    /// static analysis on top of [`crate::analyze`]).
    pub fn ast(&self) -> &Expression {
        &self.expression
    }

    /// Run the compiled expression against `root`.
    pub fn execute(
        &self,
        root: Collection,
        model_provider: &dyn ModelProvider,
        unit_converter: &dyn UnitConverter,
        variables: impl IntoIterator<Item = (String, Collection)>,
    ) -> Result<Collection> {
        crate::evaluate_parsed(&self.expression, self.registry, root, model_provider, unit_converter, variables)
    }
}

/// Parse `source` and validate every operator/function reference against
/// `registry`, producing a [`CompiledExpression`] ready for repeated
/// [`CompiledExpression::execute`] calls.
pub fn compile<'r>(source: &str, registry: &'r Registry) -> Result<CompiledExpression<'r>> {
    let parsed = octofhir_fhirpath_parser::parse(source, registry, &ParserOptions::simple())?;
    let mut check = BindingCheck { registry, error: None };
    walk(&mut check, &parsed.expression);
    if let Some(error) = check.error {
        return Err(error);
    }
    Ok(CompiledExpression { expression: parsed.expression, registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{BoxedValue, EmptyModelProvider, IdentityUnitConverter};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn compiled_expression_executes_repeatedly_against_different_roots() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let compiled = compile("Patient.active", &registry).unwrap();

        let active = Collection::singleton(BoxedValue::object(Arc::new(json!({"resourceType": "Patient", "active": true})), Some("Patient")));
        let inactive = Collection::singleton(BoxedValue::object(Arc::new(json!({"resourceType": "Patient", "active": false})), Some("Patient")));

        assert_eq!(compiled.execute(active, &provider, &converter, []).unwrap().as_singleton().unwrap().as_boolean(), Some(true));
        assert_eq!(compiled.execute(inactive, &provider, &converter, []).unwrap().as_singleton().unwrap().as_boolean(), Some(false));
    }

    #[test]
    fn compile_rejects_an_unknown_function_up_front() {
        let registry = Registry::with_builtins();
        let err = compile("Patient.totallyMadeUpFunction()", &registry).unwrap_err();
        assert!(matches!(err, FhirPathError::UnknownFunction { .. }));
    }
}
