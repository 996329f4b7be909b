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

//! The tree-walking evaluator (§4.5, §4.6): one exhaustive match per
//! [`ExpressionKind`], driven against a registry and a runtime context.
//!
//! Three node kinds are intercepted before any generic registry dispatch:
//! `.` needs to thread the same mutable context through both sides so a
//! `defineVariable` on the left is visible on the right; `is`/`as` never
//! reach a `Binary` node at all (the parser already desugars them into
//! `MembershipTest`/`TypeCast`) and go straight to the registry's type
//! operators. Every other operator and every function call flows through
//! [`Registry::operator`]/[`Registry::function`] uniformly.

use crate::literals;
use crate::navigation;
use octofhir_fhirpath_ast::{
    BinaryData, BinaryOperator, Expression, ExpressionKind, FunctionData, IndexData, LiteralValue, MembershipTestData, QuantityLiteral, Span,
    TypeCastData, UnaryData, VariableRef,
};
use octofhir_fhirpath_core::{FhirPathError, Result};
use octofhir_fhirpath_model::{BoxedValue, Collection, Quantity};
use octofhir_fhirpath_registry::operators::type_ops;
use octofhir_fhirpath_registry::{
    BinaryOperatorImpl, EvalArg, EvaluationContext, EvaluationMode, FunctionImpl, LazyEvaluator, OperatorEvaluator, Registry, UnaryOperatorImpl,
};
use rust_decimal::Decimal;

/// Evaluates a parsed expression tree against a registry and a runtime
/// context. Holds nothing but a registry reference — all mutable state
/// (variables, `$this`/`$index`/`$total`) lives on the [`EvaluationContext`]
/// threaded through every call.
pub struct TreeWalker<'r> {
    registry: &'r Registry,
}

impl<'r> TreeWalker<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    fn evaluate_literal(&self, value: &LiteralValue, span: Span) -> Result<Collection> {
        let boxed = match value {
            LiteralValue::Boolean(b) => BoxedValue::boolean(*b),
            LiteralValue::Integer(i) => BoxedValue::integer(*i),
            LiteralValue::Decimal(text) => {
                let decimal: Decimal = text
                    .parse()
                    .map_err(|_| FhirPathError::InvalidOperandType { span, message: format!("'{text}' is not a valid decimal literal") })?;
                BoxedValue::decimal(decimal)
            }
            LiteralValue::String(s) => BoxedValue::string(s.clone()),
            LiteralValue::Date(text) => literals::boxed_date(text, span)?,
            LiteralValue::DateTime(text) => literals::boxed_date_time(text, span)?,
            LiteralValue::Time(text) => literals::boxed_time(text, span)?,
            LiteralValue::Null => return Ok(Collection::empty()),
        };
        Ok(Collection::singleton(boxed))
    }

    fn evaluate_quantity(&self, literal: &QuantityLiteral, span: Span) -> Result<Collection> {
        let value: Decimal = literal
            .value
            .parse()
            .map_err(|_| FhirPathError::InvalidOperandType { span, message: format!("'{}' is not a valid quantity value", literal.value) })?;
        let quantity =
            if literal.is_calendar_unit { Quantity::calendar(value, literal.unit.clone()) } else { Quantity::new(value, Some(literal.unit.clone())) };
        Ok(Collection::singleton(BoxedValue::quantity(quantity)))
    }

    /// `$this`/`$index`/`$total`/`%name` (§4.5). Outside a lambda body,
    /// `$this` falls back to the current focus; `%context`/`%resource`/
    /// `%rootResource` fall back to the evaluation's original root when no
    /// caller-supplied variable shadows them — the conventional seed names
    /// a top-level `evaluate()` call is expected to use.
    fn evaluate_variable(&self, var: &VariableRef, focus: &Collection, ctx: &EvaluationContext) -> Collection {
        match var {
            VariableRef::This => ctx.this.clone().unwrap_or_else(|| focus.clone()),
            VariableRef::Index => match ctx.index {
                Some(i) => Collection::singleton(BoxedValue::integer(i)),
                None => Collection::empty(),
            },
            VariableRef::Total => ctx.total.clone().unwrap_or_default(),
            VariableRef::Environment(name) => match ctx.variables.get(name) {
                Some(value) => value,
                None => match name.as_str() {
                    "context" | "resource" | "rootResource" => ctx.root.clone(),
                    _ => Collection::empty(),
                },
            },
        }
    }

    fn evaluate_binary(&mut self, data: &BinaryData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        if data.op == BinaryOperator::Dot {
            let left = self.evaluate_node(&data.left, focus, ctx)?;
            return self.evaluate_node(&data.right, &left, ctx);
        }
        // `is`/`as` never reach here: the parser desugars them into
        // `MembershipTest`/`TypeCast` nodes (see `pratt::parse_expression`).
        debug_assert!(!matches!(data.op, BinaryOperator::Is | BinaryOperator::As));

        let left = self.evaluate_node(&data.left, focus, ctx)?;
        let right = self.evaluate_node(&data.right, focus, ctx)?;
        let symbol = data.op.symbol();
        let entry = self.registry.operator(symbol).ok_or_else(|| FhirPathError::UnknownOperator { symbol: symbol.to_string() })?;
        match &entry.evaluator {
            OperatorEvaluator::Binary(implementation) => implementation.evaluate(&left, &right, span, ctx),
            OperatorEvaluator::Unary(_) => Err(FhirPathError::UnknownOperator { symbol: symbol.to_string() }),
        }
    }

    fn evaluate_unary(&mut self, data: &UnaryData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let operand = self.evaluate_node(&data.operand, focus, ctx)?;
        let symbol = data.op.symbol();
        let entry = self.registry.operator(symbol).ok_or_else(|| FhirPathError::UnknownOperator { symbol: symbol.to_string() })?;
        match &entry.evaluator {
            OperatorEvaluator::Unary(implementation) => implementation.evaluate(&operand, span, ctx),
            OperatorEvaluator::Binary(_) => Err(FhirPathError::UnknownOperator { symbol: symbol.to_string() }),
        }
    }

    fn evaluate_index(&mut self, data: &IndexData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let target = self.evaluate_node(&data.target, focus, ctx)?;
        let index_result = self.evaluate_node(&data.index, focus, ctx)?;
        let index_value = match index_result.require_singleton() {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(Collection::empty()),
            Err(()) => return Err(FhirPathError::SingletonRequired { span, message: "index expression must evaluate to a single value".into() }),
        };
        let Some(index) = index_value.as_integer() else {
            return Err(FhirPathError::InvalidOperandType { span, message: "index expression must evaluate to an Integer".into() });
        };
        Ok(target.get(index))
    }

    fn evaluate_function(&mut self, data: &FunctionData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let Some(name) = data.callee.as_name() else {
            return Err(FhirPathError::InvalidOperandType { span, message: "function call target must be a plain name".into() });
        };
        // The callee may itself be `x.someFunction(...)`'s right-hand
        // identifier; by the time we're here the dot operator has already
        // threaded the left side's result in as `focus`, so `name` alone
        // (not `data.callee`) is all this call needs.
        let entry = self.registry.function(name).ok_or_else(|| FhirPathError::UnknownFunction { name: name.to_string(), span })?;

        let (min_arity, max_arity) = entry.arity_range();
        let actual = data.arguments.len();
        if actual < min_arity || max_arity.is_some_and(|max| actual > max) {
            let expected = match max_arity {
                Some(max) if max == min_arity => min_arity.to_string(),
                Some(max) => format!("{min_arity}..{max}"),
                None => format!("at least {min_arity}"),
            };
            return Err(FhirPathError::InvalidArity { function: name.to_string(), expected, actual, span });
        }

        let mut args = Vec::with_capacity(actual);
        for (descriptor, argument) in entry.arguments.iter().zip(data.arguments.iter()) {
            let arg = match descriptor.mode {
                EvaluationMode::Eager => EvalArg::Value(self.evaluate_node(argument, focus, ctx)?),
                EvaluationMode::Lazy => EvalArg::Expr(argument),
                EvaluationMode::TypeOnly => {
                    let Some(type_name) = argument.as_name() else {
                        return Err(FhirPathError::InvalidOperandType {
                            span: argument.span,
                            message: format!("'{}' expects a bare type name argument", descriptor.name),
                        });
                    };
                    EvalArg::TypeName(type_name.to_string())
                }
            };
            args.push(arg);
        }

        if entry.propagates_empty_input && focus.is_empty() {
            return Ok(Collection::empty());
        }

        entry.evaluator.evaluate(focus, &args, span, ctx, self)
    }

    fn evaluate_collection(&mut self, elements: &[Expression], focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let mut out = Collection::empty();
        for element in elements {
            let value = self.evaluate_node(element, focus, ctx)?;
            out = out.combine(&value);
        }
        Ok(out)
    }

    fn evaluate_membership_test(&mut self, data: &MembershipTestData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let target = self.evaluate_node(&data.target, focus, ctx)?;
        type_ops::evaluate_is(&target, &data.type_name, span, ctx)
    }

    fn evaluate_type_cast(&mut self, data: &TypeCastData, span: Span, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        let target = self.evaluate_node(&data.target, focus, ctx)?;
        type_ops::evaluate_as(&target, &data.type_name, span, ctx)
    }
}

impl<'r> LazyEvaluator for TreeWalker<'r> {
    fn evaluate_node(&mut self, node: &Expression, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection> {
        match &node.kind {
            ExpressionKind::Literal(value) => self.evaluate_literal(value, node.span),
            ExpressionKind::Identifier(name) | ExpressionKind::TypeOrIdentifier(name) => {
                Ok(focus.iter().flat_map(|item| navigation::property_values(item, name, ctx.model_provider)).collect())
            }
            ExpressionKind::Variable(var) => Ok(self.evaluate_variable(var, focus, ctx)),
            ExpressionKind::Binary(data) => self.evaluate_binary(data, node.span, focus, ctx),
            ExpressionKind::Unary(data) => self.evaluate_unary(data, node.span, focus, ctx),
            ExpressionKind::Function(data) => self.evaluate_function(data, node.span, focus, ctx),
            ExpressionKind::Index(data) => self.evaluate_index(data, node.span, focus, ctx),
            ExpressionKind::MembershipTest(data) => self.evaluate_membership_test(data, node.span, focus, ctx),
            ExpressionKind::TypeCast(data) => self.evaluate_type_cast(data, node.span, focus, ctx),
            ExpressionKind::Collection(elements) => self.evaluate_collection(elements, focus, ctx),
            ExpressionKind::Quantity(literal) => self.evaluate_quantity(literal, node.span),
            // No completion provider sits behind the evaluator; a cursor
            // placeholder that somehow reaches runtime evaluation simply
            // contributes nothing.
            ExpressionKind::Cursor(_) => Ok(Collection::empty()),
            ExpressionKind::Error(message) => Err(FhirPathError::ParseError { span: node.span, message: message.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_model::EmptyModelProvider;
    use octofhir_fhirpath_model::IdentityUnitConverter;
    use octofhir_fhirpath_parser::{parse, ParserOptions};
    use serde_json::json;
    use std::sync::Arc;

    fn root_collection(root: serde_json::Value) -> Collection {
        let type_name = octofhir_fhirpath_model::resource_type_of(&root).map(str::to_string);
        Collection::singleton(BoxedValue::object(Arc::new(root), type_name.as_deref()))
    }

    fn run(source: &str, root: serde_json::Value) -> Result<Collection> {
        let registry = Registry::with_builtins();
        let provider = EmptyModelProvider;
        let converter = IdentityUnitConverter;
        let parsed = parse(source, &registry, &ParserOptions::simple()).expect("parse");
        let focus = root_collection(root);
        let mut ctx = EvaluationContext::new(focus.clone(), &provider, &converter);
        let mut walker = TreeWalker::new(&registry);
        walker.evaluate_node(&parsed.expression, &focus, &mut ctx)
    }

    #[test]
    fn navigates_a_simple_path() {
        let result = run("Patient.active", json!({"resourceType": "Patient", "active": true})).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(true));
    }

    #[test]
    fn where_clause_filters_and_binds_this() {
        let result = run(
            "Patient.name.where(use = 'official').family",
            json!({
                "resourceType": "Patient",
                "name": [
                    {"use": "official", "family": "Smith"},
                    {"use": "nickname", "family": "Smitty"},
                ],
            }),
        )
        .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.as_singleton().unwrap().as_str(), Some("Smith"));
    }

    #[test]
    fn define_variable_propagates_down_a_dot_chain() {
        let result = run("Patient.defineVariable('n', name.family).n", json!({"resourceType": "Patient", "name": [{"family": "Doe"}]})).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_str(), Some("Doe"));
    }

    #[test]
    fn collection_literal_does_not_flatten_like_select() {
        let result = run("{1, 2}.count()", json!({"resourceType": "Patient"})).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_integer(), Some(2));
    }

    #[test]
    fn iif_with_missing_else_branch_yields_empty_on_false() {
        let result = run("iif(false, 1)", json!({"resourceType": "Patient"})).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn indexing_out_of_range_yields_empty_not_an_error() {
        let result = run("Patient.name[5]", json!({"resourceType": "Patient", "name": [{"family": "Doe"}]})).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn three_valued_logic_flows_through_generic_binary_dispatch() {
        let result = run("true and false", json!({"resourceType": "Patient"})).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(false));
    }

    #[test]
    fn partial_date_literal_defaults_month_and_day() {
        let result = run("@2023 = @2023-01-01", json!({"resourceType": "Patient"})).unwrap();
        assert_eq!(result.as_singleton().unwrap().as_boolean(), Some(true));
    }
}
