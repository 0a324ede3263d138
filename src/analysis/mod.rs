//! Structural JSON Inspection
//!
//! Shape-level operations over parsed JSON values: a depth-bounded structure
//! analysis, key transforms, required-field validation and summaries. Every
//! operation borrows its input and returns a freshly built value.

#[cfg(test)]
mod tests;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value, json};
use std::io;

/// Depth at which object children stop being expanded.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Maximum number of characters kept when rendering a scalar.
pub const SCALAR_PREVIEW_CHARS: usize = 100;

/// Number of array elements sampled by `analyze_structure` and `summarize`.
pub const SAMPLE_ITEMS: usize = 3;

/// Number of keys listed by `summarize`.
pub const SUMMARY_KEYS: usize = 10;

/// Runtime type name of a JSON value.
///
/// Numbers are split into `integer` and `float` so that summaries can tell
/// them apart.
#[inline]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Byte length of `value` serialized with `", "`/`": "` separators and every
/// non-ASCII character escaped as `\uXXXX`.
#[inline]
pub fn serialized_size(value: &Value) -> usize {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    // Serializing a `Value` cannot fail: all map keys are strings.
    match value.serialize(&mut serializer) {
        Ok(()) => buf.len(),
        Err(_) => 0,
    }
}

/// Single-line output with a space after each separator and ASCII-only
/// string contents.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    #[inline]
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    #[inline]
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    #[inline]
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0_u16; 2];
        let mut plain_start = 0;
        for (offset, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[plain_start..offset])?;
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{:04x}", unit)?;
            }
            plain_start = offset + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[plain_start..])
    }
}

fn scalar_preview(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    rendered.chars().take(SCALAR_PREVIEW_CHARS).collect()
}

/// Describe the shape of `value`, expanding object children while the
/// current depth is below `max_depth`.
///
/// Array samples always descend one level without consulting `max_depth`;
/// only the object branch enforces the bound.
#[inline]
pub fn analyze_structure(value: &Value, max_depth: usize) -> Value {
    let mut analysis = describe(value, 0, max_depth);
    if let Value::Object(map) = &mut analysis {
        map.insert("total_size".to_string(), json!(serialized_size(value)));
    }
    analysis
}

fn describe(value: &Value, depth: usize, max_depth: usize) -> Value {
    match value {
        Value::Object(map) => {
            let children: Map<String, Value> = if depth < max_depth {
                map.iter()
                    .map(|(k, v)| (k.clone(), describe(v, depth + 1, max_depth)))
                    .collect()
            } else {
                Map::new()
            };
            json!({
                "type": "object",
                "keys": map.keys().collect::<Vec<_>>(),
                "key_count": map.len(),
                "depth": depth,
                "children": children,
            })
        }
        Value::Array(items) => {
            let samples: Vec<Value> = items
                .iter()
                .take(SAMPLE_ITEMS)
                .map(|item| describe(item, depth + 1, max_depth))
                .collect();
            json!({
                "type": "array",
                "length": items.len(),
                "depth": depth,
                "sample_items": samples,
            })
        }
        scalar => json!({
            "type": type_name(scalar),
            "value": scalar_preview(scalar),
            "depth": depth,
        }),
    }
}

/// Key transform applied by [`transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    UppercaseKeys,
    Flatten,
    /// Any unrecognised transform name; returns the input unchanged.
    Identity,
}

impl TransformKind {
    /// Parse a transform name. Unknown names fall back to `Identity`.
    #[inline]
    pub fn parse(name: &str) -> Self {
        match name {
            "uppercase_keys" => Self::UppercaseKeys,
            "flatten" => Self::Flatten,
            _ => Self::Identity,
        }
    }
}

/// Apply `kind` to `value`. Only top-level objects are transformed; any other
/// input is returned as an identical copy.
#[inline]
pub fn transform(value: &Value, kind: TransformKind) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    match kind {
        TransformKind::UppercaseKeys => Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_uppercase(), v.clone()))
                .collect(),
        ),
        TransformKind::Flatten => {
            let mut flat = Map::new();
            flatten_into(map, None, &mut flat);
            Value::Object(flat)
        }
        TransformKind::Identity => value.clone(),
    }
}

fn flatten_into(map: &Map<String, Value>, prefix: Option<&str>, out: &mut Map<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub data_type: String,
}

/// Check that every name in `required_fields` is a top-level key of `value`.
///
/// Non-object input is always reported as valid.
#[inline]
pub fn validate(value: &Value, required_fields: &[String]) -> ValidationReport {
    let errors: Vec<String> = match value {
        Value::Object(map) => required_fields
            .iter()
            .filter(|field| !map.contains_key(field.as_str()))
            .map(|field| format!("required field missing: {}", field))
            .collect(),
        _ => Vec::new(),
    };

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings: Vec::new(),
        data_type: type_name(value).to_string(),
    }
}

/// Top-level shape statistics of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub data_type: String,
    pub size: usize,
    #[serde(flatten)]
    pub shape: SummaryShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryShape {
    Object {
        key_count: usize,
        keys: Vec<String>,
        has_nested_objects: bool,
    },
    Array {
        length: usize,
        item_types: Vec<String>,
        sample_items: Vec<Value>,
    },
    Scalar {},
}

#[inline]
pub fn summarize(value: &Value) -> Summary {
    let shape = match value {
        Value::Object(map) => SummaryShape::Object {
            key_count: map.len(),
            keys: map.keys().take(SUMMARY_KEYS).cloned().collect(),
            has_nested_objects: map.values().any(|v| v.is_object() || v.is_array()),
        },
        Value::Array(items) => SummaryShape::Array {
            length: items.len(),
            item_types: items
                .iter()
                .map(type_name)
                .unique()
                .map(str::to_string)
                .collect(),
            sample_items: items.iter().take(SAMPLE_ITEMS).cloned().collect(),
        },
        _ => SummaryShape::Scalar {},
    };

    Summary {
        data_type: type_name(value).to_string(),
        size: serialized_size(value),
        shape,
    }
}
