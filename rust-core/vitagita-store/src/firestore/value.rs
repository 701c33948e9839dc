// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON <-> Firestore typed-value codec.
//
// Firestore's REST surface wraps every field in a single-key object naming
// its type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Documents
// in this crate are plain JSON objects, so every read and write passes
// through this module.

use serde_json::{Map, Number, Value};

use crate::error::{Result, StoreError};
use crate::Document;

/// Encode a plain JSON value as a Firestore typed value.
///
/// Integers that fit in `i64` become `integerValue` (a decimal string, as the
/// REST API expects); everything else numeric becomes `doubleValue`.
pub fn encode_value(value: &Value) -> Value {
    let mut typed = Map::with_capacity(1);
    match value {
        Value::Null => {
            typed.insert("nullValue".into(), Value::Null);
        }
        Value::Bool(b) => {
            typed.insert("booleanValue".into(), Value::Bool(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                typed.insert("integerValue".into(), Value::String(i.to_string()));
            }
            None => {
                let f = n.as_f64().map_or(Value::Null, |f| {
                    Number::from_f64(f).map_or(Value::Null, Value::Number)
                });
                typed.insert("doubleValue".into(), f);
            }
        },
        Value::String(s) => {
            typed.insert("stringValue".into(), Value::String(s.clone()));
        }
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect();
            let mut array = Map::with_capacity(1);
            array.insert("values".into(), Value::Array(values));
            typed.insert("arrayValue".into(), Value::Object(array));
        }
        Value::Object(fields) => {
            let mut map = Map::with_capacity(1);
            map.insert("fields".into(), Value::Object(encode_fields(fields)));
            typed.insert("mapValue".into(), Value::Object(map));
        }
    }
    Value::Object(typed)
}

/// Encode every field of a document.
pub fn encode_fields(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Decode a Firestore typed value back into plain JSON.
///
/// Timestamps, references and bytes decode to their string forms; geo points
/// decode to `{"latitude", "longitude"}` objects. Non-finite doubles decode
/// to `null` since JSON cannot carry them.
pub fn decode_value(typed: &Value) -> Result<Value> {
    let (kind, inner) = typed
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| StoreError::CorruptedData(format!("untyped value: {typed}")))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| corrupted(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| corrupted(kind, inner)),
        "doubleValue" => decode_double(inner).ok_or_else(|| corrupted(kind, inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| corrupted(kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                Some(other) => return Err(corrupted(kind, other)),
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(other) => return Err(corrupted(kind, other)),
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::CorruptedData(format!(
            "unsupported value type '{other}'"
        ))),
    }
}

/// Decode the `fields` object of a Firestore document.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document> {
    fields
        .iter()
        .map(|(name, typed)| Ok((name.clone(), decode_value(typed)?)))
        .collect()
}

/// Quote a top-level field name for use in an update mask.
///
/// Simple identifiers pass through; anything else is wrapped in backticks
/// with backticks and backslashes escaped.
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if simple {
        return name.to_string();
    }
    let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}

fn decode_integer(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(s) => s.parse::<i64>().ok().map(|i| Value::Number(i.into())),
        Value::Number(n) => n.as_i64().map(|i| Value::Number(i.into())),
        _ => None,
    }
}

fn decode_double(inner: &Value) -> Option<Value> {
    match inner {
        Value::Number(n) => Some(Value::Number(n.clone())),
        // "NaN", "Infinity" and "-Infinity" arrive as strings.
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .map(|f| Number::from_f64(f).map_or(Value::Null, Value::Number)),
        _ => None,
    }
}

fn corrupted(kind: &str, inner: &Value) -> StoreError {
    StoreError::CorruptedData(format!("malformed {kind}: {inner}"))
}
