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

//! Wires every operator and function this engine ships with into a
//! fresh [`Registry`] (§4.7). Precedence numbers follow the documented
//! table, low binds loosest: `implies` < `or`/`xor` < `and` < `in`/
//! `contains` < equality < relational < `is`/`as` < `|` < additive <
//! multiplicative < unary < `.`.

use crate::entry::{ArgumentDescriptor, ArgumentType, Associativity, EvaluationMode, FunctionEntry, OperatorCategory, OperatorEntry};
use crate::operators::{arithmetic, collection_ops, comparison, logical, type_ops};
use crate::registry::Registry;
use crate::functions::{combining, conversion, datetime_fns, existence, iteration, math_fns, string_fns, subsetting, tree, utility};

const IMPLIES: u8 = 1;
const OR_XOR: u8 = 2;
const AND: u8 = 3;
const MEMBERSHIP: u8 = 4;
const EQUALITY: u8 = 5;
const RELATIONAL: u8 = 6;
const TYPE_TEST: u8 = 7;
const UNION: u8 = 8;
const ADDITIVE: u8 = 9;
const MULTIPLICATIVE: u8 = 10;
const UNARY: u8 = 11;
const DOT: u8 = 12;

pub fn populate(registry: &mut Registry) {
    populate_operators(registry);
    populate_functions(registry);
}

fn populate_operators(registry: &mut Registry) {
    use Associativity::Left;

    registry.register_operator(OperatorEntry::binary(".", false, OperatorCategory::Navigation, DOT, Left, &[], collection_ops::DotPlaceholder));
    registry.register_operator(OperatorEntry::binary("|", false, OperatorCategory::Collection, UNION, Left, &[], collection_ops::Union));

    registry.register_operator(OperatorEntry::binary("+", false, OperatorCategory::Arithmetic, ADDITIVE, Left, &[], arithmetic::Add));
    registry.register_operator(OperatorEntry::binary("-", false, OperatorCategory::Arithmetic, ADDITIVE, Left, &[], arithmetic::Subtract));
    registry.register_operator(OperatorEntry::binary("&", false, OperatorCategory::Arithmetic, ADDITIVE, Left, &[], arithmetic::Concat));
    registry.register_operator(OperatorEntry::binary("*", false, OperatorCategory::Arithmetic, MULTIPLICATIVE, Left, &[], arithmetic::Multiply));
    registry.register_operator(OperatorEntry::binary("/", false, OperatorCategory::Arithmetic, MULTIPLICATIVE, Left, &[], arithmetic::Divide));
    registry.register_operator(OperatorEntry::binary("div", true, OperatorCategory::Arithmetic, MULTIPLICATIVE, Left, &[], arithmetic::Div));
    registry.register_operator(OperatorEntry::binary("mod", true, OperatorCategory::Arithmetic, MULTIPLICATIVE, Left, &[], arithmetic::Mod));

    registry.register_operator(OperatorEntry::unary("+", false, OperatorCategory::Arithmetic, UNARY, &[], arithmetic::UnaryPlus));
    registry.register_operator(OperatorEntry::unary("-", false, OperatorCategory::Arithmetic, UNARY, &[], arithmetic::UnaryMinus));

    registry.register_operator(OperatorEntry::binary("=", false, OperatorCategory::Equality, EQUALITY, Left, &[], comparison::Equal));
    registry.register_operator(OperatorEntry::binary("!=", false, OperatorCategory::Equality, EQUALITY, Left, &[], comparison::NotEqual));
    registry.register_operator(OperatorEntry::binary("~", false, OperatorCategory::Equality, EQUALITY, Left, &[], comparison::Equivalent));
    registry.register_operator(OperatorEntry::binary("!~", false, OperatorCategory::Equality, EQUALITY, Left, &[], comparison::NotEquivalent));

    registry.register_operator(OperatorEntry::binary("<", false, OperatorCategory::Comparison, RELATIONAL, Left, &[], comparison::LessThan));
    registry.register_operator(OperatorEntry::binary(">", false, OperatorCategory::Comparison, RELATIONAL, Left, &[], comparison::GreaterThan));
    registry.register_operator(OperatorEntry::binary("<=", false, OperatorCategory::Comparison, RELATIONAL, Left, &[], comparison::LessOrEqual));
    registry.register_operator(OperatorEntry::binary(">=", false, OperatorCategory::Comparison, RELATIONAL, Left, &[], comparison::GreaterOrEqual));

    registry.register_operator(OperatorEntry::binary("in", true, OperatorCategory::Membership, MEMBERSHIP, Left, &[], comparison::In));
    registry.register_operator(OperatorEntry::binary("contains", true, OperatorCategory::Membership, MEMBERSHIP, Left, &[], comparison::Contains));

    registry.register_operator(OperatorEntry::binary("and", true, OperatorCategory::Logical, AND, Left, &[], logical::And));
    registry.register_operator(OperatorEntry::binary("or", true, OperatorCategory::Logical, OR_XOR, Left, &[], logical::Or));
    registry.register_operator(OperatorEntry::binary("xor", true, OperatorCategory::Logical, OR_XOR, Left, &[], logical::Xor));
    registry.register_operator(OperatorEntry::binary("implies", true, OperatorCategory::Logical, IMPLIES, Left, &[], logical::Implies));
    registry.register_operator(OperatorEntry::unary("not", true, OperatorCategory::Logical, UNARY, &[], logical::Not));

    registry.register_operator(OperatorEntry::binary("is", true, OperatorCategory::TypeTest, TYPE_TEST, Left, &[], type_ops::IsPlaceholder));
    registry.register_operator(OperatorEntry::binary("as", true, OperatorCategory::TypeTest, TYPE_TEST, Left, &[], type_ops::AsPlaceholder));
}

fn populate_functions(registry: &mut Registry) {
    use ArgumentType::*;
    use EvaluationMode::*;

    macro_rules! register {
        ($name:expr, $args:expr, $propagates_empty:expr, $impl:expr) => {
            registry.register_function(FunctionEntry::new($name, $args, $propagates_empty, $impl)).expect("builtin function name collision");
        };
    }

    // Existence & filtering.
    register!("empty", &[], false, existence::Empty);
    register!("count", &[], false, existence::Count);
    register!("exists", &[ArgumentDescriptor::optional("criteria", Expression, Lazy)], false, existence::Exists);
    register!("all", &[ArgumentDescriptor::required("criteria", Expression, Lazy)], false, existence::All);
    register!("allTrue", &[], false, existence::AllTrue);
    register!("anyTrue", &[], false, existence::AnyTrue);
    register!("allFalse", &[], false, existence::AllFalse);
    register!("anyFalse", &[], false, existence::AnyFalse);
    register!("subsetOf", &[ArgumentDescriptor::required("other", Any, Eager)], false, existence::SubsetOf);
    register!("supersetOf", &[ArgumentDescriptor::required("other", Any, Eager)], false, existence::SupersetOf);

    // Subsetting.
    register!("first", &[], true, subsetting::First);
    register!("last", &[], true, subsetting::Last);
    register!("tail", &[], true, subsetting::Tail);
    register!("skip", &[ArgumentDescriptor::required("num", Integer, Eager)], true, subsetting::Skip);
    register!("take", &[ArgumentDescriptor::required("num", Integer, Eager)], true, subsetting::Take);
    register!("single", &[], true, subsetting::Single);

    // Combining.
    register!("union", &[ArgumentDescriptor::required("other", Any, Eager)], false, combining::Union);
    register!("combine", &[ArgumentDescriptor::required("other", Any, Eager)], false, combining::Combine);
    register!("distinct", &[], true, combining::Distinct);
    register!("isDistinct", &[], false, combining::IsDistinct);
    register!("intersect", &[ArgumentDescriptor::required("other", Any, Eager)], false, combining::Intersect);
    register!("exclude", &[ArgumentDescriptor::required("other", Any, Eager)], false, combining::Exclude);

    // Conversion.
    register!("toBoolean", &[], true, conversion::ToBoolean);
    register!("toInteger", &[], true, conversion::ToInteger);
    register!("toDecimal", &[], true, conversion::ToDecimal);
    register!("toString", &[], true, conversion::ToString);
    register!("toQuantity", &[], true, conversion::ToQuantity);
    register!("toDate", &[], true, conversion::ToDate);
    register!("toDateTime", &[], true, conversion::ToDateTime);
    register!("toTime", &[], true, conversion::ToTime);
    register!("convertsToBoolean", &[], true, conversion::ConvertsToBoolean);
    register!("convertsToInteger", &[], true, conversion::ConvertsToInteger);
    register!("convertsToDecimal", &[], true, conversion::ConvertsToDecimal);
    register!("convertsToString", &[], true, conversion::ConvertsToString);
    register!("convertsToQuantity", &[], true, conversion::ConvertsToQuantity);
    register!("convertsToDate", &[], true, conversion::ConvertsToDate);
    register!("convertsToDateTime", &[], true, conversion::ConvertsToDateTime);
    register!("convertsToTime", &[], true, conversion::ConvertsToTime);

    // Math.
    register!("abs", &[], true, math_fns::Abs);
    register!("ceiling", &[], true, math_fns::Ceiling);
    register!("floor", &[], true, math_fns::Floor);
    register!("truncate", &[], true, math_fns::Truncate);
    register!("sqrt", &[], true, math_fns::Sqrt);
    register!("exp", &[], true, math_fns::Exp);
    register!("ln", &[], true, math_fns::Ln);
    register!("log", &[ArgumentDescriptor::required("base", Decimal, Eager)], true, math_fns::Log);
    register!("power", &[ArgumentDescriptor::required("exponent", Decimal, Eager)], true, math_fns::Power);

    // Date/time.
    register!("now", &[], false, datetime_fns::Now);
    register!("today", &[], false, datetime_fns::Today);
    register!("timeOfDay", &[], false, datetime_fns::TimeOfDay);

    // Strings.
    register!("length", &[], true, string_fns::Length);
    register!("substring", &[ArgumentDescriptor::required("start", Integer, Eager), ArgumentDescriptor::optional("length", Integer, Eager)], true, string_fns::Substring);
    register!("startsWith", &[ArgumentDescriptor::required("prefix", String, Eager)], true, string_fns::StartsWith);
    register!("endsWith", &[ArgumentDescriptor::required("suffix", String, Eager)], true, string_fns::EndsWith);
    register!("contains", &[ArgumentDescriptor::required("substring", String, Eager)], true, string_fns::ContainsString);
    register!("upper", &[], true, string_fns::Upper);
    register!("lower", &[], true, string_fns::Lower);
    register!("replace", &[ArgumentDescriptor::required("pattern", String, Eager), ArgumentDescriptor::required("substitution", String, Eager)], true, string_fns::Replace);
    register!("matches", &[ArgumentDescriptor::required("regex", String, Eager)], true, string_fns::Matches);
    register!("matchesFull", &[ArgumentDescriptor::required("regex", String, Eager)], true, string_fns::MatchesFull);
    register!("replaceMatches", &[ArgumentDescriptor::required("regex", String, Eager), ArgumentDescriptor::required("substitution", String, Eager)], true, string_fns::ReplaceMatches);
    register!("split", &[ArgumentDescriptor::required("separator", String, Eager)], true, string_fns::Split);
    register!("join", &[ArgumentDescriptor::optional("separator", String, Eager)], false, string_fns::Join);
    register!("trim", &[], true, string_fns::Trim);
    register!("toChars", &[], true, string_fns::ToChars);
    register!("indexOf", &[ArgumentDescriptor::required("substring", String, Eager)], true, string_fns::IndexOf);

    // Tree navigation.
    register!("children", &[], false, tree::Children);
    register!("descendants", &[], false, tree::Descendants);

    // Utility & iteration.
    register!("trace", &[ArgumentDescriptor::required("name", String, Eager), ArgumentDescriptor::optional("projection", Expression, Lazy)], false, utility::Trace);
    register!("iif", &[ArgumentDescriptor::required("condition", Expression, Lazy), ArgumentDescriptor::required("then", Expression, Lazy), ArgumentDescriptor::optional("otherwise", Expression, Lazy)], false, utility::Iif);
    register!("defineVariable", &[ArgumentDescriptor::required("name", String, Eager), ArgumentDescriptor::optional("value", Expression, Lazy)], false, utility::DefineVariable);
    register!("ofType", &[ArgumentDescriptor::required("type", TypeName, TypeOnly)], false, utility::OfType);
    register!("type", &[], true, utility::TypeOf);
    register!("hasValue", &[], false, utility::HasValue);
    register!("not", &[], true, utility::Not);

    register!("where", &[ArgumentDescriptor::required("criteria", Expression, Lazy)], false, iteration::Where);
    register!("select", &[ArgumentDescriptor::required("projection", Expression, Lazy)], false, iteration::Select);
    register!("repeat", &[ArgumentDescriptor::required("projection", Expression, Lazy)], false, iteration::Repeat);
    register!("aggregate", &[ArgumentDescriptor::required("expr", Expression, Lazy), ArgumentDescriptor::optional("init", Expression, Lazy)], false, iteration::Aggregate);
}
