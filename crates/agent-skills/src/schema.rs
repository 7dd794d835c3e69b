// src/schema.rs
//! Argument validation against a tool's input schema
//!
//! Covers the subset of JSON Schema the skills emit: `type`, `enum`,
//! `maxLength`, `minimum`, `maximum` on top-level properties, plus the
//! `required` list. Properties not declared in the schema are ignored.

use serde_json::{Map, Value};

/// Validate `args` against `schema` and return the normalized argument object.
///
/// `null` arguments are treated as an empty object.
pub fn validate(schema: &Value, args: Value) -> Result<Value, String> {
    let object = match args {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => return Err(format!("expected an object, got {}", type_name(&other))),
    };

    if let Some(required) = schema["required"].as_array() {
        for name in required.iter().filter_map(Value::as_str) {
            match object.get(name) {
                None | Some(Value::Null) => {
                    return Err(format!("missing required field '{}'", name));
                }
                _ => {}
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (name, spec) in properties {
            match object.get(name) {
                None | Some(Value::Null) => continue,
                Some(value) => check_property(name, spec, value)?,
            }
        }
    }

    Ok(Value::Object(object))
}

fn check_property(name: &str, spec: &Value, value: &Value) -> Result<(), String> {
    if let Some(expected) = spec["type"].as_str() {
        if !matches_type(expected, value) {
            return Err(format!(
                "field '{}' must be of type {}, got {}",
                name,
                expected,
                type_name(value)
            ));
        }
    }

    if let Some(allowed) = spec["enum"].as_array() {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(format!(
                "field '{}' must be one of [{}]",
                name,
                options.join(", ")
            ));
        }
    }

    if let (Some(max), Some(text)) = (spec["maxLength"].as_u64(), value.as_str()) {
        let len = text.chars().count() as u64;
        if len > max {
            return Err(format!(
                "field '{}' is {} characters long (max {})",
                name, len, max
            ));
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = spec["minimum"].as_f64() {
            if number < min {
                return Err(format!("field '{}' must be >= {}", name, min));
            }
        }
        if let Some(max) = spec["maximum"].as_f64() {
            if number > max {
                return Err(format!("field '{}' must be <= {}", name, max));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
