//! Structured output coercion.
//!
//! Providers are asked for schema-conforming JSON, but in practice return
//! prose wrappers, code fences, near-miss label variants, or nothing usable.
//! This module turns whatever came back into a contract-satisfying object:
//! extract a JSON candidate, normalize it for the recognized shape, validate
//! against the contract. Callers drive the retry and fall back to
//! [`last_resort`] when both passes fail.

mod contract;
mod errors;
mod extract;
mod shape;

pub use contract::{FieldContract, FieldType, SchemaContract};
pub use errors::CoerceError;
pub use extract::extract_json_object;
pub use shape::{Shape, evaluation_from_text};

use serde_json::Value;
use tracing::debug;

/// One coercion pass over raw model text.
///
/// Returns the validated object, or `None` when no candidate in the text
/// satisfies the contract. A prose-only reply fails this pass so the caller
/// can reprompt; salvage heuristics belong to [`attempt_lenient`].
pub fn attempt(text: &str, schema: &SchemaContract) -> Option<Value> {
    let shape = Shape::detect(schema);

    if let Some(candidate) = extract_json_object(text) {
        let normalized = shape.normalize(candidate);
        match schema.validate(&normalized) {
            Ok(()) => return Some(normalized),
            Err(err) => debug!(schema = %schema.name, %err, "extracted object failed validation"),
        }
    }
    None
}

/// The retry-pass coercion: [`attempt`], then prose salvage.
///
/// Once the corrective reprompt has been spent there is no further chance to
/// ask again, so an evaluation reply that still carries no JSON may be
/// reconstructed from its labeled prose.
pub fn attempt_lenient(text: &str, schema: &SchemaContract) -> Option<Value> {
    if let Some(value) = attempt(text, schema) {
        return Some(value);
    }
    let shape = Shape::detect(schema);
    if shape == Shape::Evaluation {
        if let Some(candidate) = evaluation_from_text(text) {
            let normalized = shape.normalize(candidate);
            if schema.validate(&normalized).is_ok() {
                debug!(schema = %schema.name, "evaluation reconstructed from labeled prose");
                return Some(normalized);
            }
        }
    }
    None
}

/// Build the corrective reprompt sent when the first pass fails.
///
/// Restates the task, spells out the required keys and their accepted forms,
/// and shows a minimal literal example.
pub fn retry_prompt(task: &str, schema: &SchemaContract) -> String {
    let mut prompt = String::new();
    prompt.push_str(task);
    prompt.push_str("\n\nYour previous reply was not valid JSON for this task. ");
    prompt.push_str("Respond with a single JSON object and nothing else. ");
    prompt.push_str("No prose, no markdown, no code fences.\n\nRequired keys:\n");
    for field in &schema.fields {
        if !field.required {
            continue;
        }
        prompt.push_str("- \"");
        prompt.push_str(&field.name);
        prompt.push_str("\": ");
        prompt.push_str(match field.field_type {
            FieldType::String => "a string",
            FieldType::Boolean => "a boolean",
            FieldType::Integer => "an integer",
            FieldType::Number => "a number",
            FieldType::Array => "an array",
            FieldType::Object => "an object",
        });
        if let Some(allowed) = &field.allowed {
            prompt.push_str(", one of ");
            prompt.push_str(&allowed.join(", "));
        }
        prompt.push('\n');
    }
    prompt.push_str("\nExample of the exact format:\n");
    prompt.push_str(&schema.example().to_string());
    prompt
}

/// The shape's hardcoded default, when one exists.
pub fn last_resort(schema: &SchemaContract) -> Option<Value> {
    Shape::detect(schema).last_resort()
}
