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

//! A small command-line front end for the engine: evaluate an expression
//! against a JSON resource, print the parsed tree, or run the type
//! analyzer. There is no REPL, TUI, or server mode here — those need a
//! real `ModelProvider` backed by package data and an async I/O story
//! this crate deliberately doesn't carry (see DESIGN.md).

use clap::{Parser, Subcommand};
use octofhir_fhirpath::model::{BoxedValue, Collection, EmptyModelProvider, IdentityUnitConverter, RawValue};
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as JsonValue;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "octofhir-fhirpath", version, about = "Evaluate, parse, and analyze FHIRPath expressions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Suppress informational stderr output.
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an expression against a JSON resource.
    Evaluate {
        expression: String,
        /// Path to a JSON file, or a literal JSON string. Reads stdin if omitted.
        #[arg(long)]
        input: Option<String>,
        /// Repeatable `name=value` variable bindings; `value` is parsed as
        /// JSON when possible, otherwise treated as a string.
        #[arg(long = "var", value_name = "name=value")]
        variables: Vec<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Parse an expression and print its AST.
    Parse {
        expression: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Resolve element types along an expression's path steps.
    Analyze {
        expression: String,
        /// The resource type to seed the walk with, e.g. "Patient".
        #[arg(long)]
        start_type: Option<String>,
    },
    /// Evaluate while recording every `trace()` call, execution time, and
    /// the AST, for debugging an expression rather than just running it.
    Inspect {
        expression: String,
        #[arg(long)]
        input: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let registry = octofhir_fhirpath::registry::Registry::with_builtins();

    let outcome = match cli.command {
        Command::Evaluate { expression, input, variables, pretty } => run_evaluate(&expression, input.as_deref(), &variables, pretty, &registry, cli.quiet),
        Command::Parse { expression, pretty } => run_parse(&expression, pretty, &registry),
        Command::Analyze { expression, start_type } => run_analyze(&expression, start_type.as_deref(), &registry),
        Command::Inspect { expression, input } => run_inspect(&expression, input.as_deref(), &registry, cli.quiet),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_evaluate(expression: &str, input: Option<&str>, variables: &[String], pretty: bool, registry: &octofhir_fhirpath::registry::Registry, quiet: bool) -> Result<(), String> {
    let resource_json = load_resource(input, quiet)?;
    let resource_type = resource_json.get("resourceType").and_then(JsonValue::as_str).map(str::to_string);
    let root = Collection::singleton(BoxedValue::object(Arc::new(resource_json), resource_type.as_deref()));

    let bound_variables = variables.iter().map(|spec| parse_variable(spec)).collect::<Result<Vec<_>, _>>()?;

    let provider = EmptyModelProvider;
    let converter = IdentityUnitConverter;
    let started = Instant::now();
    let result = octofhir_fhirpath::evaluate(expression, registry, root, &provider, &converter, bound_variables);
    let elapsed = started.elapsed();
    log::debug!("evaluated {expression:?} in {elapsed:?}");

    match result {
        Ok(collection) => {
            let values: Vec<JsonValue> = collection.iter().map(render_value).collect();
            print_json(&JsonValue::Array(values), pretty);
            Ok(())
        }
        Err(error) => Err(error.to_string()),
    }
}

fn run_parse(expression: &str, pretty: bool, registry: &octofhir_fhirpath::registry::Registry) -> Result<(), String> {
    let parsed = octofhir_fhirpath::parse(expression, registry, &octofhir_fhirpath::parser::ParserOptions::simple()).map_err(|error| error.to_string())?;
    print_json(&serde_json::json!({ "ast": format!("{:#?}", parsed.expression) }), pretty);
    Ok(())
}

fn run_analyze(expression: &str, start_type: Option<&str>, registry: &octofhir_fhirpath::registry::Registry) -> Result<(), String> {
    let provider = EmptyModelProvider;
    let report = octofhir_fhirpath::analyze(expression, registry, &provider, start_type).map_err(|error| error.to_string())?;
    let notes: Vec<JsonValue> = report
        .notes
        .into_iter()
        .map(|note| serde_json::json!({ "name": note.name, "resolved_type": note.resolved_type }))
        .collect();
    print_json(&JsonValue::Array(notes), true);
    Ok(())
}

fn run_inspect(expression: &str, input: Option<&str>, registry: &octofhir_fhirpath::registry::Registry, quiet: bool) -> Result<(), String> {
    let resource_json = load_resource(input, quiet)?;
    let resource_type = resource_json.get("resourceType").and_then(JsonValue::as_str).map(str::to_string);
    let root = Collection::singleton(BoxedValue::object(Arc::new(resource_json), resource_type.as_deref()));

    let provider = EmptyModelProvider;
    let converter = IdentityUnitConverter;
    let report = octofhir_fhirpath::inspect(expression, registry, root, &provider, &converter, []);

    let traces: Vec<JsonValue> = report
        .traces
        .iter()
        .map(|event| {
            serde_json::json!({
                "name": event.name,
                "values": event.values.iter().map(render_value).collect::<Vec<_>>(),
                "timestamp": event.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "depth": event.depth,
            })
        })
        .collect();

    let output = serde_json::json!({
        "result": report.result.as_ref().map(|c| c.iter().map(render_value).collect::<Vec<_>>()).map_err(ToString::to_string).unwrap_or_default(),
        "error": report.result.as_ref().err().map(ToString::to_string),
        "execution_time_us": report.execution_time.as_micros(),
        "ast": format!("{:#?}", report.ast),
        "parse_errors": report.parse_errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "parse_warnings": report.parse_warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "traces": traces,
    });
    print_json(&output, true);
    Ok(())
}

fn load_resource(input: Option<&str>, quiet: bool) -> Result<JsonValue, String> {
    let raw = match input {
        Some(text) if text.trim_start().starts_with(['{', '[']) => text.to_string(),
        Some(path) => fs::read_to_string(path).map_err(|e| format!("reading '{path}': {e}"))?,
        None => {
            if !quiet {
                eprintln!("reading resource from stdin...");
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(|e| format!("reading stdin: {e}"))?;
            buffer
        }
    };
    if raw.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }
    serde_json::from_str(&raw).map_err(|e| format!("parsing resource JSON: {e}"))
}

fn parse_variable(spec: &str) -> Result<(String, Collection), String> {
    let (name, value) = spec.split_once('=').ok_or_else(|| format!("invalid variable '{spec}', expected name=value"))?;
    let boxed = match serde_json::from_str::<JsonValue>(value) {
        Ok(JsonValue::Bool(b)) => BoxedValue::boolean(b),
        Ok(JsonValue::String(s)) => BoxedValue::string(s),
        Ok(JsonValue::Number(n)) if n.is_i64() => BoxedValue::integer(n.as_i64().unwrap()),
        Ok(json @ (JsonValue::Number(_) | JsonValue::Object(_) | JsonValue::Array(_) | JsonValue::Null)) => BoxedValue::object(Arc::new(json), None),
        Err(_) => BoxedValue::string(value),
    };
    Ok((name.to_string(), Collection::singleton(boxed)))
}

/// Render one evaluated value as JSON. Scalars print as their natural
/// JSON type; `Object` values pass the source data through unchanged.
fn render_value(value: &BoxedValue) -> JsonValue {
    match value.raw() {
        RawValue::Boolean(b) => JsonValue::Bool(*b),
        RawValue::Integer(i) => JsonValue::Number((*i).into()),
        RawValue::Decimal(d) => serde_json::Number::from_f64(d.to_f64().unwrap_or_default()).map(JsonValue::Number).unwrap_or(JsonValue::Null),
        RawValue::Object(object) => object.as_ref().clone(),
        other => JsonValue::String(other.to_string()),
    }
}

fn print_json(value: &JsonValue, pretty: bool) {
    let text = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    println!("{}", text.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")));
}
