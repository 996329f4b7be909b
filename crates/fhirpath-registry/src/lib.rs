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

//! The operation registry (R) and operations library (O), §4.2 and §4.7
//! of the engine design: a process-wide, read-only catalog mapping every
//! operator symbol and function name to its precedence metadata and
//! evaluator, plus the runtime context threaded through evaluation.
//!
//! This crate never depends on `fhirpath-parser` or `fhirpath-evaluator`
//! — the parser consults [`Registry::precedence`]/[`Registry::associativity`]
//! as data rather than hardcoding a grammar, and lazy functions drive the
//! evaluator back through the [`LazyEvaluator`] callback trait rather than
//! this crate depending on the tree walker directly.

mod builtins;
mod context;
mod entry;
pub mod functions;
pub mod operators;
mod registry;

pub use context::{EvalArg, EvaluationContext, LazyEvaluator, TraceEvent, VariableScope};
pub use entry::{
    ArgumentDescriptor, ArgumentType, Arity, Associativity, BinaryOperatorImpl, EvaluationMode, FunctionEntry, FunctionImpl, OperatorCategory,
    OperatorEntry, OperatorEvaluator, OperatorSignature, UnaryOperatorImpl,
};
pub use registry::Registry;
