//! End-to-end scenarios exercising one engine behavior each: path
//! flattening, filtering, operator precedence, equality vs equivalence,
//! union vs combine, `defineVariable` scoping, `in`, `ofType`, `iif`,
//! and date arithmetic.

mod common;

use common::*;
use octofhir_fhirpath_core::FhirPathError;
use serde_json::json;

#[test]
fn name_given_flattens_across_repeating_name_entries() {
    let root = root_from(
        "Patient",
        json!({"resourceType": "Patient", "name": [{"given": ["John", "James"]}, {"given": ["Johnny"]}]}),
    );
    let result = eval("name.given", root).unwrap();
    assert_eq!(strings(&result), vec!["John", "James", "Johnny"]);
}

#[test]
fn where_clause_filters_to_the_official_name_only() {
    let root = root_from("Patient", patient_with_two_names());
    let result = eval("name.where(use = 'official').given", root).unwrap();
    assert_eq!(strings(&result), vec!["John", "James"]);
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(integers(&eval("2 + 3 * 4", root.clone()).unwrap()), vec![14]);
    assert_eq!(integers(&eval("(2 + 3) * 4", root).unwrap()), vec![20]);
}

#[test]
fn an_unregistered_operator_is_a_parse_error_not_silently_ignored() {
    let registry = registry();
    let err = octofhir_fhirpath_parser::parse("2 ** 3", &registry, &octofhir_fhirpath_parser::ParserOptions::simple()).unwrap_err();
    assert!(matches!(err, FhirPathError::ParseError { .. }));
}

#[test]
fn equals_is_strict_while_equivalent_normalizes_case_and_treats_empty_as_equal() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(booleans(&eval("'abc' ~ 'ABC'", root.clone()).unwrap()), vec![true]);
    assert_eq!(booleans(&eval("'abc' = 'ABC'", root.clone()).unwrap()), vec![false]);
    assert_eq!(booleans(&eval("{} ~ {}", root.clone()).unwrap()), vec![true]);
    assert!(eval("{} = {}", root).unwrap().is_empty());
}

#[test]
fn union_dedupes_while_combine_keeps_duplicates() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(integers(&eval("(1 | 2 | 3) | (2 | 3 | 4)", root.clone()).unwrap()), vec![1, 2, 3, 4]);
    assert_eq!(integers(&eval("(1|2|3).combine(2|3)", root).unwrap()), vec![1, 2, 3, 2, 3]);
}

#[test]
fn a_defined_variable_is_visible_inside_a_later_select() {
    let root = root_from("Bundle", json!({"resourceType": "Bundle", "a": {"b": 10}}));
    let result = eval("a.defineVariable('x', 10).b.select(%x)", root).unwrap();
    assert_eq!(integers(&result), vec![10]);
}

#[test]
fn in_treats_an_empty_operand_on_either_side_as_its_own_case() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(booleans(&eval("'5' in ('5' | '6')", root.clone()).unwrap()), vec![true]);
    assert_eq!(booleans(&eval("3 in ({})", root.clone()).unwrap()), vec![false]);
    assert!(eval("{} in (1)", root).unwrap().is_empty());
}

#[test]
fn of_type_filters_a_polymorphic_value_by_runtime_type() {
    // A model-provider-free run resolves a value's type from its own
    // runtime tag, so a quantity literal stands in for a `value[x]`
    // choice element the way a real schema would report it as typed.
    let root = root_from("Observation", json!({"resourceType": "Observation", "status": "final"}));
    let as_quantity = eval("(98.6 'F').ofType(Quantity)", root.clone()).unwrap();
    assert_eq!(as_quantity.len(), 1);
    let as_boolean = eval("(98.6 'F').ofType(Boolean)", root).unwrap();
    assert!(as_boolean.is_empty());
}

#[test]
fn iif_picks_the_branch_matching_the_condition_and_empty_means_no_match() {
    let root = root_from("Patient", json!({"resourceType": "Patient"}));
    assert_eq!(integers(&eval("iif(true, 1, 2)", root.clone()).unwrap()), vec![1]);
    assert!(eval("iif({}, 1)", root.clone()).unwrap().is_empty());
    assert!(eval("iif(false, 1)", root).unwrap().is_empty());
}

#[test]
fn today_minus_a_distant_birth_date_exceeds_an_eighteen_year_threshold() {
    // Date subtraction always yields a day-unit calendar quantity (§ date
    // arithmetic), so the 18-year threshold is expressed in days here
    // rather than as `18 years` — the two calendar units don't convert
    // into each other, only a day-to-day comparison is commensurable.
    let root = root_from("Patient", json!({"resourceType": "Patient", "birthDate": "2000-01-01"}));
    let result = eval("(today() - birthDate) >= 6574 days", root).unwrap();
    assert_eq!(booleans(&result), vec![true]);
}
