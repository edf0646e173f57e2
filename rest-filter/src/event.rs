//! Event — a mutable JSON record with path-addressed fields and a tag list

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template::FieldLookup;

const TAGS_FIELD: &str = "tags";

/// A single pipeline event.
///
/// Fields are addressed either in bracket form (`[rest][0][id]`) or dotted
/// form (`rest.0.id`). Numeric segments index into arrays when reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; only objects are events.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path);
        let (first, rest) = segments.split_first()?;
        let mut current = self.fields.get(first.as_str())?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment.as_str())?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at `path`, replacing whatever was there. Missing or
    /// non-object intermediate segments become empty objects.
    pub fn set(&mut self, path: &str, value: Value) {
        let segments = parse_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut map = &mut self.fields;
        for segment in parents {
            let entry = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            map = next;
        }
        map.insert(last.clone(), value);
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments = parse_path(path);
        let (last, parents) = segments.split_last()?;

        let mut map = &mut self.fields;
        for segment in parents {
            match map.get_mut(segment.as_str()) {
                Some(Value::Object(next)) => map = next,
                _ => return None,
            }
        }
        map.remove(last.as_str())
    }

    /// Append `tag` to the `tags` field unless it is already present.
    pub fn tag(&mut self, tag: &str) {
        let entry = self
            .fields
            .entry(TAGS_FIELD.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));

        match entry {
            Value::Array(tags) => {
                if !tags.iter().any(|t| t.as_str() == Some(tag)) {
                    tags.push(Value::String(tag.to_string()));
                }
            }
            null @ Value::Null => {
                *null = Value::Array(vec![Value::String(tag.to_string())]);
            }
            // A scalar `tags` value is promoted to a list
            other => {
                let previous = other.take();
                let mut tags = vec![previous];
                if tags[0].as_str() != Some(tag) {
                    tags.push(Value::String(tag.to_string()));
                }
                *other = Value::Array(tags);
            }
        }
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.fields.get(TAGS_FIELD) {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(tag)) => vec![tag.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl FieldLookup for Event {
    fn lookup(&self, path: &str) -> Option<&Value> {
        self.get(path)
    }
}

/// Split a field reference into its segments.
pub(crate) fn parse_path(path: &str) -> Vec<String> {
    let path = path.trim();
    if path.starts_with('[') {
        if let Some(segments) = parse_bracketed(path) {
            return segments;
        }
    }
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bracketed(path: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        if close > 0 {
            segments.push(inner[..close].to_string());
        }
        rest = &inner[close + 1..];
    }
    Some(segments)
}
