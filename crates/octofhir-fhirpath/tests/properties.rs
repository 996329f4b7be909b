//! The universal properties every expression (not just a handful of
//! fixtures) is expected to satisfy: round-tripping through the printer,
//! span containment, operator precedence, empty propagation, union
//! idempotence, variable-scope visibility, and registry self-consistency.

mod common;

use common::*;
use octofhir_fhirpath_ast::ExpressionKind;
use octofhir_fhirpath_parser::ParserOptions;
use serde_json::json;

/// A hand-picked corpus wide enough to hit every `ExpressionKind`
/// variant the printer knows how to render, narrow enough to avoid
/// literal-formatting ambiguities (e.g. decimal trailing zeros) that
/// would make an exact source round-trip fragile.
const ROUND_TRIP_CORPUS: &[&str] = &[
    "1",
    "1.5",
    "true",
    "'hello'",
    "@2024-01-01",
    "{}",
    "Patient",
    "name",
    "name.given",
    "name.where(use = 'official')",
    "2 + 3 * 4",
    "-age",
    "name[0]",
    "value is Quantity",
    "value as Quantity",
    "1 | 2 | 3",
    "4 'mg'",
    "$this",
    "$index",
    "%x",
    "iif(true, 1, 2)",
];

#[test]
fn parse_print_round_trip_reproduces_a_structurally_equal_tree() {
    let registry = registry();
    for source in ROUND_TRIP_CORPUS {
        let parsed = octofhir_fhirpath_parser::parse(source, &registry, &ParserOptions::simple())
            .unwrap_or_else(|e| panic!("{source:?} failed to parse: {e}"));
        let printed = print_expr(&parsed.expression);
        let reparsed = octofhir_fhirpath_parser::parse(&printed, &registry, &ParserOptions::simple())
            .unwrap_or_else(|e| panic!("printed form {printed:?} of {source:?} failed to reparse: {e}"));
        assert!(
            structurally_equal(&parsed.expression, &reparsed.expression),
            "{source:?} -> {printed:?} did not round-trip: {:#?} vs {:#?}",
            parsed.expression,
            reparsed.expression
        );
    }
}

#[test]
fn every_node_span_contains_its_childrens_spans() {
    let registry = registry();
    for source in ROUND_TRIP_CORPUS {
        let parsed = octofhir_fhirpath_parser::parse(source, &registry, &ParserOptions::simple()).unwrap();
        assert_span_contains_children(&parsed.expression);
    }
}

fn assert_span_contains_children(expr: &octofhir_fhirpath_ast::Expression) {
    let mut children = Vec::new();
    match &expr.kind {
        ExpressionKind::Binary(data) => {
            children.push(&data.left);
            children.push(&data.right);
        }
        ExpressionKind::Unary(data) => children.push(&data.operand),
        ExpressionKind::Function(data) => {
            children.push(&data.callee);
            children.extend(data.arguments.iter());
        }
        ExpressionKind::Index(data) => {
            children.push(&data.target);
            children.push(&data.index);
        }
        ExpressionKind::MembershipTest(data) => children.push(&data.target),
        ExpressionKind::TypeCast(data) => children.push(&data.target),
        ExpressionKind::Collection(items) => children.extend(items.iter()),
        _ => {}
    }
    for child in &children {
        assert!(
            expr.span.start.offset <= child.span.start.offset,
            "{:?} starts after child {:?}",
            expr.span,
            child.span
        );
        assert!(
            expr.span.end.offset >= child.span.end.offset,
            "{:?} ends before child {:?}",
            expr.span,
            child.span
        );
        assert_span_contains_children(child);
    }
}

#[test]
fn higher_precedence_operators_bind_tighter_in_mixed_chains() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(integers(&eval("2 + 3 * 4", root.clone()).unwrap()), vec![14]);
    assert_eq!(integers(&eval("2 * 3 + 4", root.clone()).unwrap()), vec![10]);
    assert_eq!(integers(&eval("(2 + 3) * 4", root).unwrap()), vec![20]);
}

#[test]
fn empty_propagates_through_singleton_operators() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    for op in ["+", "-", "*", "/", "<", ">", "<=", ">="] {
        let left = eval(&format!("{{}} {op} 1"), root.clone()).unwrap();
        assert!(left.is_empty(), "{{}} {op} 1 should be empty, got {left:?}");
        let right = eval(&format!("1 {op} {{}}"), root.clone()).unwrap();
        assert!(right.is_empty(), "1 {op} {{}} should be empty, got {right:?}");
    }
}

#[test]
fn union_is_idempotent_and_absorbs_the_empty_collection() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(integers(&eval("(1 | 2 | 3) | (1 | 2 | 3)", root.clone()).unwrap()), vec![1, 2, 3]);
    assert_eq!(integers(&eval("(1 | 2 | 3) | {}", root).unwrap()), vec![1, 2, 3]);
}

#[test]
fn a_variable_defined_at_one_step_is_visible_at_every_later_step() {
    let cases = [
        (json!({"resourceType": "Bundle", "a": {"b": 1}}), "a.defineVariable('x', 1).b.select(%x)", 1i64),
        (json!({"resourceType": "Bundle", "a": {"b": 2}}), "a.defineVariable('x', 7).b.select(%x)", 7i64),
    ];
    for (json, expression, expected) in cases {
        let root = root_from("Bundle", json);
        assert_eq!(integers(&eval(expression, root).unwrap()), vec![expected]);
    }
}

#[test]
fn every_binary_operator_symbol_has_a_precedence_and_associativity() {
    let registry = registry();
    let symbols = [
        ".", "+", "-", "*", "/", "div", "mod", "&", "|", "=", "!=", "~", "!~", "<", ">", "<=", ">=", "and", "or", "xor", "implies", "in",
        "contains", "is", "as",
    ];
    for symbol in symbols {
        assert!(registry.is_binary_operator(symbol), "{symbol:?} is not registered as a binary operator");
        assert!(registry.precedence(symbol).is_some(), "{symbol:?} has no precedence");
        assert!(registry.associativity(symbol).is_some(), "{symbol:?} has no associativity");
    }
}
