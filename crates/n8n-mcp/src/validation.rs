//! Tool argument validation against the advertised input schema.
//!
//! Runs before any handler: a call whose arguments violate the schema never reaches n8n.

use rmcp::model::Tool;
use serde_json::{Value, json};

/// A rejected set of arguments: a one-line message plus a structured violation list.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentErrors {
    pub message: String,
    pub data: Value,
}

/// Check `args` against `tool.input_schema`.
///
/// Reports missing required parameters and JSON Schema constraint violations (types, ranges).
/// Extra, undeclared arguments are ignored.
///
/// # Errors
///
/// Returns [`ArgumentErrors`] describing every violation found.
pub fn validate_tool_arguments(tool: &Tool, args: &Value) -> Result<(), ArgumentErrors> {
    let schema = Value::Object((*tool.input_schema).clone());
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();

    let Some(args_obj) = args.as_object() else {
        return Err(ArgumentErrors {
            message: "Invalid params: arguments must be a JSON object".to_string(),
            data: json!({
                "type": "validation-errors",
                "violations": [{ "type": "not-an-object" }],
            }),
        });
    };

    let mut violations: Vec<Value> = Vec::new();

    for r in &required {
        if !args_obj.contains_key(*r) {
            violations.push(json!({
                "type": "missing-required-parameter",
                "parameter": r,
            }));
        }
    }

    if let Ok(compiled) = jsonschema::validator_for(&schema) {
        for e in compiled.iter_errors(args) {
            // Already reported above with a nicer shape.
            if matches!(
                e.kind(),
                jsonschema::error::ValidationErrorKind::Required { .. }
            ) {
                continue;
            }
            violations.push(json!({
                "type": "constraint-violation",
                "message": e.to_string(),
                "instancePath": e.instance_path().to_string(),
            }));
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    let message = if let Some(p) = violations
        .iter()
        .find(|v| v.get("type").and_then(Value::as_str) == Some("missing-required-parameter"))
        .and_then(|v| v.get("parameter"))
        .and_then(Value::as_str)
    {
        format!("Invalid params: missing required parameter '{p}'")
    } else {
        format!(
            "Invalid params: validation failed with {} error(s)",
            violations.len()
        )
    };

    Err(ArgumentErrors {
        message,
        data: json!({
            "type": "validation-errors",
            "violations": violations,
        }),
    })
}
