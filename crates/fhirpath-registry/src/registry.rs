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

//! The registry (R, §4.2): a process-wide, append-only catalog of
//! operators and functions. Built once, then shared freely across
//! concurrent evaluations (§5 — it is read-only after construction).

use crate::entry::{Associativity, FunctionEntry, OperatorEntry};
use rustc_hash::FxHashMap;

/// The operator/function catalog. The parser queries `precedence`/
/// `associativity`/`is_binary_operator`/`is_keyword_operator`; the
/// evaluator queries `operator`/`function`.
pub struct Registry {
    operators: FxHashMap<&'static str, OperatorEntry>,
    functions: FxHashMap<String, FunctionEntry>,
}

impl Registry {
    /// An empty registry with no operators or functions — for tests that
    /// want to register a minimal hand-picked set.
    pub fn empty() -> Self {
        Self { operators: FxHashMap::default(), functions: FxHashMap::default() }
    }

    /// The full built-in registry: every operator and function this
    /// engine ships with (§4.7).
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        crate::builtins::populate(&mut registry);
        registry
    }

    /// `precedence(symbol)` (§4.2). `None` for a symbol the registry
    /// doesn't recognize as an operator.
    pub fn precedence(&self, symbol: &str) -> Option<u8> {
        self.operators.get(symbol).map(|entry| entry.precedence)
    }

    /// `associativity(symbol)` (§4.2).
    pub fn associativity(&self, symbol: &str) -> Option<Associativity> {
        self.operators.get(symbol).map(|entry| entry.associativity)
    }

    /// Whether `symbol` names a registered binary operator.
    pub fn is_binary_operator(&self, symbol: &str) -> bool {
        matches!(self.operators.get(symbol), Some(entry) if entry.arity == crate::entry::Arity::Binary)
    }

    /// Whether `word` is a keyword-spelled operator (`and`, `div`, `is`,
    /// ...) as opposed to a symbolic one.
    pub fn is_keyword_operator(&self, word: &str) -> bool {
        matches!(self.operators.get(word), Some(entry) if entry.keyword)
    }

    /// Look up an operator entry by symbol.
    pub fn operator(&self, symbol: &str) -> Option<&OperatorEntry> {
        self.operators.get(symbol)
    }

    /// Look up a function entry by name.
    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Whether a new function can be registered under `name` — false if a
    /// function (built-in or previously-registered extension) already
    /// claims it (§4.2 "extension safety").
    pub fn can_register(&self, name: &str) -> bool {
        !self.functions.contains_key(name)
    }

    /// Register an operator, overwriting any existing entry for the same
    /// symbol. Operators are part of the closed grammar (§4.3.1 fixes the
    /// postfix/binary-tail shapes), so unlike functions there is no
    /// extension-safety check here — this is only ever called from
    /// `builtins::populate` and by tests constructing a bespoke registry.
    pub fn register_operator(&mut self, entry: OperatorEntry) {
        self.operators.insert(entry.symbol, entry);
    }

    /// Register a function, failing if the name is already taken (§4.2).
    pub fn register_function(&mut self, entry: FunctionEntry) -> Result<(), String> {
        if !self.can_register(entry.name) {
            return Err(format!("function '{}' is already registered", entry.name));
        }
        self.functions.insert(entry.name.to_string(), entry);
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_consistency_every_binary_operator_has_precedence_and_associativity() {
        let registry = Registry::with_builtins();
        for symbol in [
            ".", "+", "-", "*", "/", "div", "mod", "&", "|", "=", "!=", "~", "!~", "<", ">", "<=", ">=", "and", "or",
            "xor", "implies", "in", "contains", "is", "as",
        ] {
            assert!(registry.is_binary_operator(symbol), "{symbol} should be registered as binary");
            assert!(registry.precedence(symbol).is_some());
            assert!(registry.associativity(symbol).is_some());
        }
    }

    #[test]
    fn precedence_ordering_matches_the_documented_table() {
        let registry = Registry::with_builtins();
        let p = |s: &str| registry.precedence(s).unwrap();
        assert!(p("implies") < p("or"));
        assert!(p("or") < p("and"));
        assert!(p("and") < p("in"));
        assert!(p("in") < p("="));
        assert!(p("=") < p("<"));
        assert!(p("<") < p("is"));
        assert!(p("is") < p("|"));
        assert!(p("|") < p("+"));
        assert!(p("+") < p("*"));
        assert!(p("*") < p("."));
    }

    #[test]
    fn can_register_rejects_builtin_names() {
        let registry = Registry::with_builtins();
        assert!(!registry.can_register("where"));
        assert!(registry.can_register("myCustomFunction"));
    }
}
