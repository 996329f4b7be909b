//! Shared fixtures for the integration tests: a registry, a
//! model-provider-free evaluation environment, and a couple of JSON
//! roots the scenario/property tests evaluate expressions against.

#![allow(dead_code)]

use octofhir_fhirpath::model::{BoxedValue, Collection, EmptyModelProvider, IdentityUnitConverter};
use octofhir_fhirpath::registry::Registry;
use octofhir_fhirpath_ast::{Expression, ExpressionKind, LiteralValue, VariableRef};
use octofhir_fhirpath_core::Result;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub fn registry() -> Registry {
    Registry::with_builtins()
}

pub fn root_from(resource_type: &str, json: JsonValue) -> Collection {
    Collection::singleton(BoxedValue::object(Arc::new(json), Some(resource_type)))
}

/// Evaluate `expression` against `root` with no variables and no model
/// provider (an empty provider resolves nothing, which is fine for
/// expressions that only navigate JSON directly).
pub fn eval(expression: &str, root: Collection) -> Result<Collection> {
    let registry = registry();
    let provider = EmptyModelProvider;
    let converter = IdentityUnitConverter;
    octofhir_fhirpath::evaluate(expression, &registry, root, &provider, &converter, [])
}

pub fn strings(collection: &Collection) -> Vec<String> {
    collection.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
}

pub fn booleans(collection: &Collection) -> Vec<bool> {
    collection.iter().filter_map(BoxedValue::as_boolean).collect()
}

pub fn integers(collection: &Collection) -> Vec<i64> {
    collection.iter().filter_map(BoxedValue::as_integer).collect()
}

/// Render an AST node back to FHIRPath source text, narrowly enough to
/// round-trip the hand-picked corpus the property tests feed it — not a
/// general unparser (no attempt at preserving original decimal trailing
/// zeros or string-escaping edge cases).
pub fn print_expr(expr: &Expression) -> String {
    match &expr.kind {
        ExpressionKind::Literal(value) => print_literal(value),
        ExpressionKind::Identifier(name) | ExpressionKind::TypeOrIdentifier(name) => name.clone(),
        ExpressionKind::Variable(var) => print_variable(var),
        ExpressionKind::Binary(data) => {
            format!("({} {} {})", print_expr(&data.left), data.op.symbol(), print_expr(&data.right))
        }
        ExpressionKind::Unary(data) => format!("{}{}", data.op.symbol(), print_expr(&data.operand)),
        ExpressionKind::Function(data) => {
            let args: Vec<String> = data.arguments.iter().map(print_expr).collect();
            format!("{}({})", print_expr(&data.callee), args.join(", "))
        }
        ExpressionKind::Index(data) => format!("{}[{}]", print_expr(&data.target), print_expr(&data.index)),
        ExpressionKind::MembershipTest(data) => format!("{} is {}", print_expr(&data.target), data.type_name),
        ExpressionKind::TypeCast(data) => format!("{} as {}", print_expr(&data.target), data.type_name),
        ExpressionKind::Collection(items) => {
            let items: Vec<String> = items.iter().map(print_expr).collect();
            format!("{{{}}}", items.join(", "))
        }
        ExpressionKind::Quantity(q) => format!("{} '{}'", q.value, q.unit),
        ExpressionKind::Cursor(_) | ExpressionKind::Error(_) => {
            panic!("print_expr: no source form for {:?} — keep the round-trip corpus to valid expressions", expr.kind)
        }
    }
}

fn print_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Integer(i) => i.to_string(),
        LiteralValue::Decimal(text) => text.clone(),
        LiteralValue::String(text) => format!("'{text}'"),
        LiteralValue::Date(text) => format!("@{text}"),
        LiteralValue::DateTime(text) => format!("@{text}"),
        LiteralValue::Time(text) => format!("@{text}"),
        LiteralValue::Null => "{}".to_string(),
    }
}

fn print_variable(var: &VariableRef) -> String {
    match var {
        VariableRef::This => "$this".to_string(),
        VariableRef::Index => "$index".to_string(),
        VariableRef::Total => "$total".to_string(),
        VariableRef::Environment(name) => format!("%{name}"),
    }
}

/// Compare two parsed trees ignoring `Span`/`NodeId` — what a round-trip
/// property actually cares about is shape, not source positions.
pub fn structurally_equal(a: &Expression, b: &Expression) -> bool {
    use ExpressionKind::*;
    match (&a.kind, &b.kind) {
        (Literal(x), Literal(y)) => x == y,
        (Identifier(x), Identifier(y)) => x == y,
        (TypeOrIdentifier(x), TypeOrIdentifier(y)) => x == y,
        (Variable(x), Variable(y)) => x == y,
        (Binary(x), Binary(y)) => x.op == y.op && structurally_equal(&x.left, &y.left) && structurally_equal(&x.right, &y.right),
        (Unary(x), Unary(y)) => x.op == y.op && structurally_equal(&x.operand, &y.operand),
        (Function(x), Function(y)) => {
            structurally_equal(&x.callee, &y.callee)
                && x.arguments.len() == y.arguments.len()
                && x.arguments.iter().zip(y.arguments.iter()).all(|(l, r)| structurally_equal(l, r))
        }
        (Index(x), Index(y)) => structurally_equal(&x.target, &y.target) && structurally_equal(&x.index, &y.index),
        (MembershipTest(x), MembershipTest(y)) => x.type_name == y.type_name && structurally_equal(&x.target, &y.target),
        (TypeCast(x), TypeCast(y)) => x.type_name == y.type_name && structurally_equal(&x.target, &y.target),
        (Collection(x), Collection(y)) => x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| structurally_equal(l, r)),
        (Quantity(x), Quantity(y)) => x == y,
        _ => false,
    }
}

pub fn patient_with_two_names() -> JsonValue {
    serde_json::json!({
        "resourceType": "Patient",
        "name": [
            {"use": "official", "family": "Shepard", "given": ["John", "James"]},
            {"use": "nickname", "given": ["Johnny"]}
        ]
    })
}
