//! `%{field}` interpolation against event fields

use serde_json::{Map, Value};

const OPEN: &str = "%{";
const CLOSE: char = '}';

/// Read access to the fields a template may reference.
pub trait FieldLookup {
    fn lookup(&self, path: &str) -> Option<&Value>;
}

/// Top-level key lookup, no path resolution.
impl FieldLookup for Map<String, Value> {
    fn lookup(&self, path: &str) -> Option<&Value> {
        self.get(path)
    }
}

/// Substitute every `%{field}` in `template` with the field's string form.
///
/// Placeholders whose field is absent (or null) are left in the output
/// verbatim. An opening `%{` with no closing brace is copied as-is.
pub fn interpolate<F>(template: &str, fields: &F) -> String
where
    F: FieldLookup + ?Sized,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = after[..end].trim();
        match fields.lookup(name).and_then(natural_string) {
            Some(resolved) => out.push_str(&resolved),
            None => out.push_str(&rest[start..start + OPEN.len() + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Whether `s` contains at least one complete `%{...}` placeholder.
pub fn has_placeholder(s: &str) -> bool {
    s.find(OPEN)
        .is_some_and(|start| s[start + OPEN.len()..].contains(CLOSE))
}

/// Resolve a configured value against `fields`.
///
/// With `sprintf` disabled this is the identity. Otherwise strings are
/// interpolated, objects and arrays are walked recursively (keys are never
/// touched), and other scalars pass through.
pub fn resolve_value<F>(value: &Value, fields: &F, sprintf: bool) -> Value
where
    F: FieldLookup + ?Sized,
{
    if !sprintf {
        return value.clone();
    }
    match value {
        Value::String(s) => Value::String(interpolate(s, fields)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, fields, true)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_value(v, fields, true))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The string a field value contributes to an interpolated template.
fn natural_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(natural_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => serde_json::to_string(value).ok(),
    }
}
