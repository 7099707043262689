//! # Type Coercion and Default Filling
//!
//! Metadata arriving from forms and spreadsheets is loosely typed: numbers
//! as strings, booleans as `"true"`, empty strings for nulls. Before a
//! document is evaluated it is rewritten in place against the schema:
//!
//! - scalar values whose JSON type does not match the schema `type` are
//!   converted when a lossless conversion exists (`"42"` → `42`,
//!   `1` → `true`, `null` → `""` ...);
//! - absent object properties whose schema carries a `default` are filled.
//!
//! The walk follows `properties`, `items`, `prefixItems`, `allOf` and local
//! `$ref`s (`#/...`). Combinators whose branch is only known after
//! evaluation (`anyOf`, `oneOf`, `if`) are not entered.

use serde_json::{Map, Number, Value};

/// Bound on `$ref` chains and nesting.
const MAX_DEPTH: usize = 64;

/// Which rewrites to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Coercion {
    pub coerce_types: bool,
    pub use_defaults: bool,
}

impl Coercion {
    pub fn is_noop(&self) -> bool {
        !self.coerce_types && !self.use_defaults
    }
}

/// Rewrite `instance` against `schema`, resolving local `$ref`s in `root`.
pub(crate) fn apply(root: &Value, schema: &Value, instance: &mut Value, opts: Coercion) {
    if opts.is_noop() {
        return;
    }
    walk(root, schema, instance, opts, 0);
}

fn walk(root: &Value, schema: &Value, instance: &mut Value, opts: Coercion, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    let Value::Object(schema) = schema else {
        return;
    };

    if let Some(target) = schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| resolve_local_ref(root, r))
    {
        walk(root, target, instance, opts, depth + 1);
    }

    if let Some(Value::Array(branches)) = schema.get("allOf") {
        for branch in branches {
            walk(root, branch, instance, opts, depth + 1);
        }
    }

    if opts.coerce_types {
        if let Some(expected) = schema.get("type") {
            coerce_scalar(expected, instance);
        }
    }

    match instance {
        Value::Object(map) => walk_properties(root, schema, map, opts, depth),
        Value::Array(items) => walk_items(root, schema, items, opts, depth),
        _ => {}
    }
}

fn walk_properties(
    root: &Value,
    schema: &Map<String, Value>,
    map: &mut Map<String, Value>,
    opts: Coercion,
    depth: usize,
) {
    let Some(Value::Object(properties)) = schema.get("properties") else {
        return;
    };
    for (name, property) in properties {
        if opts.use_defaults && !map.contains_key(name) {
            if let Some(default) = property.get("default") {
                map.insert(name.clone(), default.clone());
            }
        }
        if let Some(child) = map.get_mut(name) {
            walk(root, property, child, opts, depth + 1);
        }
    }
}

fn walk_items(
    root: &Value,
    schema: &Map<String, Value>,
    items: &mut [Value],
    opts: Coercion,
    depth: usize,
) {
    // Tuple form: draft 2020-12 `prefixItems`, or an `items` array in older drafts.
    let tuple = match (schema.get("prefixItems"), schema.get("items")) {
        (Some(Value::Array(prefix)), _) | (None, Some(Value::Array(prefix))) => Some(prefix),
        _ => None,
    };

    let mut start = 0;
    if let Some(prefix) = tuple {
        for (item, item_schema) in items.iter_mut().zip(prefix) {
            walk(root, item_schema, item, opts, depth + 1);
        }
        start = prefix.len();
    }

    if let Some(item_schema) = schema.get("items").filter(|s| !s.is_array()) {
        for item in items.iter_mut().skip(start) {
            walk(root, item_schema, item, opts, depth + 1);
        }
    }
}

fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    root.pointer(pointer)
}

/// Convert a scalar to the first listed type it can losslessly become.
fn coerce_scalar(expected: &Value, instance: &mut Value) {
    let types: Vec<&str> = match expected {
        Value::String(t) => vec![t.as_str()],
        Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };
    if types.iter().any(|t| has_type(instance, t)) {
        return;
    }
    if let Some(coerced) = types.iter().find_map(|t| coerce_to(instance, t)) {
        *instance = coerced;
    }
}

fn has_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => is_integer(value),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

fn coerce_to(value: &Value, target: &str) -> Option<Value> {
    match (target, value) {
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("string", Value::Null) => Some(Value::String(String::new())),

        ("number", Value::String(s)) => parse_number(s),
        ("integer", Value::String(s)) => parse_number(s).filter(is_integer),
        ("number" | "integer", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("number" | "integer", Value::Null) => Some(Value::from(0)),

        ("boolean", Value::String(s)) if s == "true" => Some(Value::Bool(true)),
        ("boolean", Value::String(s)) if s == "false" => Some(Value::Bool(false)),
        ("boolean", Value::Number(n)) if n.as_f64() == Some(1.0) => Some(Value::Bool(true)),
        ("boolean", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Bool(false)),
        ("boolean", Value::Null) => Some(Value::Bool(false)),

        ("null", Value::String(s)) if s.is_empty() => Some(Value::Null),
        ("null", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),
        ("null", Value::Bool(false)) => Some(Value::Null),

        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::from(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
