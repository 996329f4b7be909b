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

//! `inspect` (§6.3): evaluate an expression while recording everything a
//! debugger-style caller would want — the AST, timing, diagnostics, and
//! every `trace()` capture along the way. Errors are recorded, not
//! swallowed (§7 "`inspect` records but re-exposes errors").

use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_diagnostics::{Diagnostic, Severity};
use octofhir_fhirpath_model::{Collection, ModelProvider, UnitConverter};
use octofhir_fhirpath_parser::ParserOptions;
use octofhir_fhirpath_registry::{EvaluationContext, LazyEvaluator, Registry, TraceEvent};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Everything [`inspect`] collected about one evaluation.
pub struct InspectReport {
    /// The evaluation's outcome; an `Err` here means evaluation itself
    /// failed, distinct from `parse_errors` (which, in simple mode, would
    /// have already prevented evaluation from happening at all).
    pub result: Result<Collection>,
    /// How long the tree walk took, not counting parsing.
    pub execution_time: Duration,
    /// The parsed tree that was evaluated.
    pub ast: Expression,
    /// Parse-time diagnostics at `Severity::Error` or above.
    pub parse_errors: Vec<Diagnostic>,
    /// Parse-time diagnostics below `Severity::Error`.
    pub parse_warnings: Vec<Diagnostic>,
    /// Every `trace()` capture made during the walk, in call order.
    pub traces: Vec<TraceEvent>,
}

/// Parse and evaluate `source`, capturing diagnostics, timing, and
/// `trace()` output. Parses in LSP mode so a syntax error still yields a
/// best-effort tree and a recorded diagnostic rather than aborting the
/// whole inspection.
#[allow(clippy::too_many_arguments)]
pub fn inspect(
    source: &str,
    registry: &Registry,
    root: Collection,
    model_provider: &dyn ModelProvider,
    unit_converter: &dyn UnitConverter,
    variables: impl IntoIterator<Item = (String, Collection)>,
) -> InspectReport {
    let parsed = match octofhir_fhirpath_parser::parse(source, registry, &ParserOptions::lsp()) {
        Ok(output) => output,
        Err(error) => {
            let span = error.span().unwrap_or_default();
            return InspectReport {
                result: Err(error.clone()),
                execution_time: Duration::ZERO,
                ast: Expression::error(error.to_string(), span),
                parse_errors: vec![Diagnostic::with_message(
                    octofhir_fhirpath_diagnostics::DiagnosticCode::InvalidSyntax,
                    error.to_string(),
                    Severity::Error,
                    span,
                )],
                parse_warnings: Vec::new(),
                traces: Vec::new(),
            };
        }
    };

    let (parse_errors, parse_warnings): (Vec<_>, Vec<_>) = parsed.diagnostics.into_iter().partition(|d| d.severity >= Severity::Error);

    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = EvaluationContext::new(root.clone(), model_provider, unit_converter);
    ctx.trace_sink = Some(Rc::clone(&sink));
    for (name, value) in variables {
        ctx.define_variable(name, value);
    }

    let mut walker = octofhir_fhirpath_evaluator::TreeWalker::new(registry);
    let started = std::time::Instant::now();
    let result = walker.evaluate_node(&parsed.expression, &root, &mut ctx);
    let execution_time = started.elapsed();

    let traces = Rc::try_unwrap(sink).map(RefCell::into_inner).unwrap_or_default();
    InspectReport { result, execution_time, ast: parsed.expression, parse_errors, parse_warnings, traces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::{BoxedValue, EmptyModelProvider, IdentityUnitConverter};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn inspect_records_trace_calls_and_the_final_result() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let patient = json!({"resourceType": "Patient", "active": true});
        let root = Collection::singleton(BoxedValue::object(Arc::new(patient), Some("Patient")));

        let report = inspect("active.trace('flag')", &registry, root, &provider, &converter, []);
        let result = report.result.unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(true));
        assert_eq!(report.traces.len(), 1);
        assert_eq!(report.traces[0].name, "flag");
        assert!(report.parse_errors.is_empty());
    }

    #[test]
    fn inspect_reports_a_parse_error_without_panicking() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let report = inspect("Patient..name", &registry, Collection::empty(), &provider, &converter, []);
        assert!(report.result.is_err() || !report.parse_errors.is_empty());
    }
}
