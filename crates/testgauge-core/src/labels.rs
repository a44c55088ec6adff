//! Extra label parsing.
//!
//! Extra labels arrive as a string-encoded mapping, usually from an
//! environment variable. Both JSON (`{"k":"v"}`) and the single-quoted form
//! (`{'k':'v'}`) are accepted. Parsing never fails: anything that is not a
//! flat mapping of scalars yields an empty mapping.

use std::collections::BTreeMap;

use serde_json::Value;

/// Label set. Ordered so rendering is deterministic.
pub type Labels = BTreeMap<String, String>;

/// Parse an encoded label mapping.
///
/// Scalar values (numbers, booleans) are stringified. `null`, arrays, nested
/// objects, or a non-object document discard the whole mapping.
pub fn parse_extra_labels(raw: &str) -> Labels {
    let raw = raw.trim();
    if raw.is_empty() {
        return Labels::new();
    }

    let normalized = raw.replace('\'', "\"");
    let value: Value = match serde_json::from_str(&normalized) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "extra labels are not a valid mapping; ignoring");
            return Labels::new();
        }
    };

    let Value::Object(map) = value else {
        tracing::warn!("extra labels must be a mapping; ignoring");
        return Labels::new();
    };

    let mut out = Labels::new();
    for (k, v) in map {
        let v = match v {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                tracing::warn!(label = %k, "extra label value must be a scalar; ignoring all extra labels");
                return Labels::new();
            }
        };
        out.insert(k, v);
    }
    out
}
