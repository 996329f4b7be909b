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

//! String functions: `length`, `substring`, `startsWith`, `endsWith`,
//! `contains`, `upper`, `lower`, `replace`, `matches`, `matchesFull`,
//! `replaceMatches`, `split`, `join`, `trim`, `toChars`, `indexOf`
//! (§4.7). A non-String focus or argument yields empty, not an error —
//! these are navigation-path helpers, not strict operators.

use super::{eager, invalid_operand, optional_eager};
use crate::context::{EvalArg, EvaluationContext, LazyEvaluator};
use crate::entry::FunctionImpl;
use octofhir_fhirpath_ast::Span;
use octofhir_fhirpath_core::Result;
use octofhir_fhirpath_model::{BoxedValue, Collection};
use regex::Regex;

fn focus_str(focus: &Collection) -> Option<&str> {
    focus.as_singleton().and_then(BoxedValue::as_str)
}

fn arg_str<'a>(args: &'a [EvalArg<'_>], index: usize) -> Option<&'a str> {
    eager(args, index).as_singleton().and_then(BoxedValue::as_str)
}

pub struct Length;

impl FunctionImpl for Length {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        match focus_str(focus) {
            Some(s) => Ok(Collection::singleton(BoxedValue::integer(s.chars().count() as i64))),
            None => Ok(Collection::empty()),
        }
    }
}

/// `substring(start [, length])`: a negative or out-of-range `start`
/// yields empty (§4.6.4's "out-of-range index" rule extended to
/// strings).
pub struct Substring;

impl FunctionImpl for Substring {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let chars: Vec<char> = s.chars().collect();
        let Some(start) = crate::operators::singleton(eager(args, 0), span, "substring()")?.and_then(crate::operators::as_integer) else {
            return Ok(Collection::empty());
        };
        if start < 0 || start as usize >= chars.len() {
            return Ok(Collection::empty());
        }
        let start = start as usize;
        let end = match optional_eager(args, 1) {
            Some(len_arg) => match crate::operators::singleton(len_arg, span, "substring()")?.and_then(crate::operators::as_integer) {
                Some(len) => (start + len.max(0) as usize).min(chars.len()),
                None => return Ok(Collection::empty()),
            },
            None => chars.len(),
        };
        Ok(Collection::singleton(BoxedValue::string(chars[start..end].iter().collect::<String>())))
    }
}

macro_rules! string_predicate {
    ($name:ident, $what:expr, $op:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
                let Some(needle) = arg_str(args, 0) else {
                    return Err(invalid_operand(span, concat!($what, " requires a string argument")));
                };
                Ok(super::boolean($op(s, needle)))
            }
        }
    };
}

string_predicate!(StartsWith, "startsWith()", |s: &str, n: &str| s.starts_with(n));
string_predicate!(EndsWith, "endsWith()", |s: &str, n: &str| s.ends_with(n));
string_predicate!(ContainsString, "contains()", |s: &str, n: &str| s.contains(n));

macro_rules! string_transform {
    ($name:ident, $op:expr) => {
        pub struct $name;

        impl FunctionImpl for $name {
            fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
                match focus_str(focus) {
                    Some(s) => Ok(Collection::singleton(BoxedValue::string($op(s)))),
                    None => Ok(Collection::empty()),
                }
            }
        }
    };
}

string_transform!(Upper, |s: &str| s.to_uppercase());
string_transform!(Lower, |s: &str| s.to_lowercase());
string_transform!(Trim, |s: &str| s.trim().to_string());

pub struct Replace;

impl FunctionImpl for Replace {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let pattern = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "replace() requires string arguments"))?;
        let replacement = arg_str(args, 1).ok_or_else(|| invalid_operand(span, "replace() requires string arguments"))?;
        Ok(Collection::singleton(BoxedValue::string(s.replace(pattern, replacement))))
    }
}

fn compiled(pattern: &str, span: Span) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| invalid_operand(span, format!("invalid regular expression: {e}")))
}

/// `matches(regex)`: whether the pattern is found anywhere in the
/// string.
pub struct Matches;

impl FunctionImpl for Matches {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let pattern = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "matches() requires a string argument"))?;
        Ok(super::boolean(compiled(pattern, span)?.is_match(s)))
    }
}

/// `matchesFull(regex)`: the pattern must match the entire string.
pub struct MatchesFull;

impl FunctionImpl for MatchesFull {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let pattern = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "matchesFull() requires a string argument"))?;
        let anchored = format!("^(?:{pattern})$");
        Ok(super::boolean(compiled(&anchored, span)?.is_match(s)))
    }
}

pub struct ReplaceMatches;

impl FunctionImpl for ReplaceMatches {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let pattern = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "replaceMatches() requires string arguments"))?;
        let replacement = arg_str(args, 1).ok_or_else(|| invalid_operand(span, "replaceMatches() requires string arguments"))?;
        let regex = compiled(pattern, span)?;
        Ok(Collection::singleton(BoxedValue::string(regex.replace_all(s, replacement).into_owned())))
    }
}

/// `split(separator)`: empty separator splits into individual
/// characters, matching the behavior most FHIRPath implementations
/// settle on for that edge case.
pub struct Split;

impl FunctionImpl for Split {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let separator = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "split() requires a string argument"))?;
        let parts: Vec<BoxedValue> = if separator.is_empty() {
            s.chars().map(|c| BoxedValue::string(c.to_string())).collect()
        } else {
            s.split(separator).map(BoxedValue::string).collect()
        };
        Ok(Collection::from_values(parts))
    }
}

/// `join(separator)`: concatenate a collection of strings.
pub struct Join;

impl FunctionImpl for Join {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let separator = arg_str(args, 0).unwrap_or("");
        let mut rendered = Vec::with_capacity(focus.len());
        for item in focus.iter() {
            let text = item.as_str().ok_or_else(|| invalid_operand(span, "join() requires a collection of strings"))?;
            rendered.push(text.to_string());
        }
        Ok(Collection::singleton(BoxedValue::string(rendered.join(separator))))
    }
}

/// `toChars()`: explode into a collection of single-character strings.
pub struct ToChars;

impl FunctionImpl for ToChars {
    fn evaluate(&self, focus: &Collection, _args: &[EvalArg<'_>], _span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        match focus_str(focus) {
            Some(s) => Ok(Collection::from_values(s.chars().map(|c| BoxedValue::string(c.to_string())))),
            None => Ok(Collection::empty()),
        }
    }
}

/// `indexOf(substring)`: 0-based character index, `-1` when not found
/// (per the FHIRPath convention of returning `-1` rather than empty, so
/// callers can distinguish "not found" from "not applicable").
pub struct IndexOf;

impl FunctionImpl for IndexOf {
    fn evaluate(&self, focus: &Collection, args: &[EvalArg<'_>], span: Span, _ctx: &mut EvaluationContext, _eval: &mut dyn LazyEvaluator) -> Result<Collection> {
        let Some(s) = focus_str(focus) else { return Ok(Collection::empty()) };
        let needle = arg_str(args, 0).ok_or_else(|| invalid_operand(span, "indexOf() requires a string argument"))?;
        let index = match s.find(needle) {
            Some(byte_offset) => s[..byte_offset].chars().count() as i64,
            None => -1,
        };
        Ok(Collection::singleton(BoxedValue::integer(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_empty_separator_yields_characters() {
        let s = "ab";
        let parts: Vec<String> = s.chars().map(|c| c.to_string()).collect();
        assert_eq!(parts, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn matches_full_anchors_the_pattern() {
        let regex = compiled("^(?:[0-9]+)$", Span::empty_at(0)).unwrap();
        assert!(regex.is_match("1234"));
        assert!(!regex.is_match("12a4"));
    }
}
