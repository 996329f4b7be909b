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

//! The runtime context (§3.5, §4.5): variable scoping, iterator bindings,
//! and the model-provider/unit-converter handles threaded through every
//! node evaluation.

use octofhir_fhirpath_model::{Collection, ModelProvider, UnitConverter};
use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_core::Result;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// One `trace()` capture (§6.3): the name it was tagged with, the values
/// it saw, when, and how deep the evaluation was nested at the time.
/// Collected only when a caller (`inspect`) installs a sink on the
/// context; ordinary evaluation never allocates these.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub name: String,
    pub values: Collection,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub depth: usize,
}

/// A layered, immutable-by-default variable map. `defineVariable` never
/// mutates an existing scope — it produces a new child layer, so that two
/// evaluations sharing a parent scope (e.g. siblings under `where`) never
/// observe each other's definitions (§9 "shared variable scope across
/// dot").
#[derive(Clone, Default)]
pub struct VariableScope {
    local: Rc<FxHashMap<String, Collection>>,
    parent: Option<Rc<VariableScope>>,
}

impl VariableScope {
    /// The empty root scope.
    pub fn root() -> Self {
        Self { local: Rc::new(FxHashMap::default()), parent: None }
    }

    /// Look up a variable, walking up through parent scopes.
    pub fn get(&self, name: &str) -> Option<Collection> {
        if let Some(value) = self.local.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Layer a new variable on top of this scope, returning the child.
    /// `self` is left untouched — existing clones of it (e.g. a sibling
    /// branch that started evaluating before this definition happened)
    /// keep seeing the old scope.
    pub fn with_variable(&self, name: impl Into<String>, value: Collection) -> Self {
        let mut local = FxHashMap::default();
        local.insert(name.into(), value);
        Self { local: Rc::new(local), parent: Some(Rc::new(self.clone())) }
    }
}

/// The runtime context threaded through every node evaluation (§3.5).
///
/// Cheap to clone: the variable scope is `Rc`-backed and the provider/
/// converter handles are borrows, so every scope-changing operation
/// (`with_variable`, `with_iterator`) can return a fresh value without
/// deep-copying anything.
#[derive(Clone)]
pub struct EvaluationContext<'a> {
    /// The original root input the evaluation started from.
    pub root: Collection,
    /// The name → collection variable map, shared by reference down a dot
    /// chain (§4.5's critical contract).
    pub variables: VariableScope,
    /// The injected model-provider collaborator (§6.4).
    pub model_provider: &'a dyn ModelProvider,
    /// The injected UCUM unit-commensurability collaborator (§3.4).
    pub unit_converter: &'a dyn UnitConverter,
    /// `$this` inside a lambda body (`where`/`select`/`all`/...).
    pub this: Option<Collection>,
    /// `$index` inside a lambda body.
    pub index: Option<i64>,
    /// `$total` inside `aggregate()`.
    pub total: Option<Collection>,
    /// Byte offset for a partial parse under IDE completion; carried on
    /// the context so `inspect` can report which node it fell inside
    /// without re-deriving it from the AST.
    pub cursor_offset: Option<usize>,
    /// How many lambda-iterator layers deep the current evaluation is
    /// (`where`/`select`/... each add one via [`Self::with_iterator`]).
    /// Reported on each [`TraceEvent`] so `inspect` can show nesting.
    pub depth: usize,
    /// Where `trace()` calls get recorded, if anyone's watching. `None`
    /// in ordinary evaluation — only `inspect` installs one.
    pub trace_sink: Option<Rc<RefCell<Vec<TraceEvent>>>>,
}

impl<'a> EvaluationContext<'a> {
    /// A fresh top-level context: no variables, no iterator bindings.
    pub fn new(root: Collection, model_provider: &'a dyn ModelProvider, unit_converter: &'a dyn UnitConverter) -> Self {
        Self {
            root,
            variables: VariableScope::root(),
            model_provider,
            unit_converter,
            this: None,
            index: None,
            total: None,
            cursor_offset: None,
            depth: 0,
            trace_sink: None,
        }
    }

    /// Layer `name` on top of the current variable scope — the effect of
    /// `defineVariable`.
    pub fn define_variable(&mut self, name: impl Into<String>, value: Collection) {
        self.variables = self.variables.with_variable(name, value);
    }

    /// A child context with `$this`/`$index`/`$total` bound for one
    /// iteration of a lambda body. Shares the same variable scope.
    pub fn with_iterator(&self, this: Collection, index: i64, total: Option<Collection>) -> Self {
        let mut child = self.clone();
        child.this = Some(this);
        child.index = Some(index);
        child.total = total;
        child.depth = self.depth + 1;
        child
    }

    /// Record a `trace()` capture if a sink is installed; a no-op
    /// otherwise so ordinary evaluation pays nothing for it.
    pub fn push_trace(&self, name: impl Into<String>, values: Collection) {
        if let Some(sink) = &self.trace_sink {
            sink.borrow_mut().push(TraceEvent { name: name.into(), values, timestamp: chrono::Utc::now(), depth: self.depth });
        }
    }
}

/// An argument already shaped according to its descriptor's
/// [`crate::entry::EvaluationMode`] (§4.6.1): a pre-evaluated value, an
/// unevaluated expression for lazy dispatch, or a bare type name.
pub enum EvalArg<'a> {
    Value(Collection),
    Expr(&'a Expression),
    TypeName(String),
}

impl<'a> EvalArg<'a> {
    pub fn as_value(&self) -> Option<&Collection> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expression> {
        match self {
            Self::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_type_name(&self) -> Option<&str> {
        match self {
            Self::TypeName(name) => Some(name),
            _ => None,
        }
    }
}

/// The callback interface a lazy function drives to evaluate its
/// unevaluated argument expressions — usually once per iterator item.
/// Implemented by `fhirpath-evaluator`'s tree walker; this crate never
/// depends on that one, avoiding a cycle (§9 "lazy argument evaluation is
/// data, not syntax").
pub trait LazyEvaluator {
    fn evaluate_node(&mut self, node: &Expression, focus: &Collection, ctx: &mut EvaluationContext) -> Result<Collection>;
}
