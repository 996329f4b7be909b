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

//! `analyze` (§6): a minimal static pass over a parsed expression that
//! reports, for each path-step node, the element type the model provider
//! resolves — enough to exercise the model-provider boundary without the
//! full completion/hover/symbol surface a language server would need.
//!
//! Type inference here is purely local: each `Identifier`/
//! `TypeOrIdentifier` node is resolved against whatever type its
//! immediate parent step produced, starting from `start_type`. It does
//! not attempt choice-type narrowing, union types, or flow-sensitive
//! refinement from `where`/`ofType` guards — a caller wanting that
//! builds it on top of [`crate::compile`]'s AST, the same way this pass
//! does.

use octofhir_fhirpath_ast::{walk, BinaryOperator, Expression, ExpressionKind, Span, Visitor};
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{ModelProvider, TypeInfo};
use octofhir_fhirpath_parser::ParserOptions;
use octofhir_fhirpath_registry::Registry;

/// One resolved (or unresolved) path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisNote {
    /// The property/type name this node names.
    pub name: String,
    /// Where it appears in the source.
    pub span: Span,
    /// The element type the model provider resolved it to, qualified
    /// (e.g. `"FHIR.HumanName"`) — `None` when no provider is configured
    /// or the provider doesn't know the parent/element pair.
    pub resolved_type: Option<String>,
}

/// The result of [`analyze`]: one note per path step encountered, in
/// source order.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub notes: Vec<AnalysisNote>,
}

/// Walks the tree threading a "current type" down through `.` chains,
/// resolving each `Identifier`/`TypeOrIdentifier` against it. Only the
/// left-leaning spine of `Binary(Dot)` nodes is tracked precisely;
/// anything else (function results, unions, indices) resets to unknown
/// for whatever follows it, matching this pass's "enough to exercise the
/// boundary" scope.
struct TypeWalker<'m> {
    provider: &'m dyn ModelProvider,
    current: Option<TypeInfo>,
    notes: Vec<AnalysisNote>,
}

impl<'m> TypeWalker<'m> {
    fn resolve_step(&mut self, name: &str, span: Span) {
        let resolved = self.current.as_ref().and_then(|t| self.provider.get_element_type(&t.name, name));
        self.notes.push(AnalysisNote { name: name.to_string(), span, resolved_type: resolved.as_ref().map(TypeInfo::qualified_name) });
        self.current = resolved.or_else(|| self.provider.get_type(name));
    }
}

impl<'m> Visitor for TypeWalker<'m> {
    fn visit(&mut self, node: &Expression) -> bool {
        match &node.kind {
            ExpressionKind::Binary(data) if data.op == BinaryOperator::Dot => {
                walk(self, &data.left);
                walk(self, &data.right);
                false
            }
            ExpressionKind::Identifier(name) | ExpressionKind::TypeOrIdentifier(name) => {
                self.resolve_step(name, node.span);
                true
            }
            _ => {
                self.current = None;
                true
            }
        }
    }
}

/// Parse `source` and report the resolved element type of every path
/// step, seeding the walk from `start_type` (e.g. `"Patient"`) when the
/// caller knows what the expression is meant to run against.
pub fn analyze(source: &str, registry: &Registry, model_provider: &dyn ModelProvider, start_type: Option<&str>) -> Result<AnalysisReport> {
    let parsed = octofhir_fhirpath_parser::parse(source, registry, &ParserOptions::simple())?;
    let mut walker = TypeWalker { provider: model_provider, current: start_type.and_then(|t| model_provider.get_type(t)), notes: Vec::new() };
    walk(&mut walker, &parsed.expression);
    Ok(AnalysisReport { notes: walker.notes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::EmptyModelProvider;

    #[test]
    fn without_a_model_provider_every_step_is_unresolved() {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let report = analyze("Patient.name.family", &registry, &provider, Some("Patient")).unwrap();
        assert_eq!(report.notes.len(), 2);
        assert!(report.notes.iter().all(|note| note.resolved_type.is_none()));
        assert_eq!(report.notes[0].name, "name");
        assert_eq!(report.notes[1].name, "family");
    }
}
