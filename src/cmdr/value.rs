//! Tagged values and type-directed coercion.
//!
//! Every parsed argument ends up as a [`Value`]. Coercion is a pure function
//! from a raw token (or an already-typed value handed in programmatically)
//! and an allowed [`TypeMask`] to a tagged value, trying conversions in a
//! fixed priority order so that numeric-looking tokens are never accidentally
//! treated as strings.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CmdrError, Result};
use crate::registry::CommandFn;
use crate::types::TypeMask;

/// Closed sum of every value kind the engine can produce or accept.
///
/// `Str`, `Int`, `Num`, `Bool`, `Null`, `Array` and `Args` can originate from
/// argv tokens; the remaining variants exist for programmatic invocation
/// where callers pass pre-typed values instead of strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Array(Vec<Value>),
    Object(serde_json::Map<String, serde_json::Value>),
    Map(BTreeMap<String, Value>),
    Set(BTreeSet<String>),
    Buffer(Vec<u8>),
    Func(CommandFn),
    /// Raw tokens collected by an args collector after a literal `--`.
    Args(Vec<String>),
}

impl Value {
    /// Lowercase kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Buffer(_) => "buffer",
            Value::Func(_) => "function",
            Value::Args(_) => "args",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: both `Int` and `Num` values answer.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_args(&self) -> Option<&[String]> {
        match self {
            Value::Args(v) => Some(v),
            _ => None,
        }
    }

    /// True for `Bool(true)`.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// JSON snapshot for structured output. Non-serializable kinds render as
    /// placeholders (`Func`) or their obvious encodings (`Buffer` as bytes).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::json!(b),
            Value::Int(i) => serde_json::json!(i),
            Value::Num(n) => serde_json::json!(n),
            Value::Str(s) => serde_json::json!(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(map.clone()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Set(items) => serde_json::json!(items.iter().collect::<Vec<_>>()),
            Value::Buffer(bytes) => serde_json::json!(bytes),
            Value::Func(_) => serde_json::json!("<function>"),
            Value::Args(tokens) => serde_json::json!(tokens),
        }
    }

    fn preview(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Num(n) => n.to_string(),
            other => format!("<{}>", other.kind()),
        }
    }
}

/// Coerce `value` against `mask`, returning the first conversion that
/// succeeds in priority order: null literal, integer, number, boolean,
/// string, map, set, buffer, array, object, function.
///
/// String-to-array coercion splits on bare commas only; there is no quoting
/// or escape support. `Value::Null` input passes through unchanged
/// regardless of the mask (absent values are not coerced).
pub fn coerce(value: Value, mask: TypeMask) -> Result<Value> {
    if matches!(value, Value::Null) {
        return Ok(Value::Null);
    }

    if mask.contains(TypeMask::NULL) && value.as_str() == Some("null") {
        return Ok(Value::Null);
    }

    if mask.contains(TypeMask::INTEGER) {
        match &value {
            Value::Int(_) => return Ok(value),
            Value::Num(n) => {
                if let Some(i) = exact_i64(*n) {
                    return Ok(Value::Int(i));
                }
            }
            Value::Str(s) if !s.is_empty() => {
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                // "3.0" style tokens still count as integers
                if let Ok(f) = s.parse::<f64>() {
                    if let Some(i) = exact_i64(f) {
                        return Ok(Value::Int(i));
                    }
                }
            }
            _ => {}
        }
    }

    if mask.contains(TypeMask::NUMBER) {
        match &value {
            Value::Num(_) => return Ok(value),
            Value::Int(i) => return Ok(Value::Num(*i as f64)),
            Value::Str(s) if !s.is_empty() => {
                if let Ok(f) = s.parse::<f64>() {
                    if f.is_finite() {
                        return Ok(Value::Num(f));
                    }
                }
            }
            _ => {}
        }
    }

    if mask.contains(TypeMask::BOOLEAN) {
        match &value {
            Value::Bool(_) => return Ok(value),
            Value::Str(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => return Ok(Value::Bool(true)),
                "false" | "0" | "no" | "n" => return Ok(Value::Bool(false)),
                _ => {}
            },
            Value::Int(1) => return Ok(Value::Bool(true)),
            Value::Int(0) => return Ok(Value::Bool(false)),
            Value::Num(n) if *n == 1.0 => return Ok(Value::Bool(true)),
            Value::Num(n) if *n == 0.0 => return Ok(Value::Bool(false)),
            _ => {}
        }
    }

    if mask.contains(TypeMask::STRING) {
        if let Value::Str(s) = &value {
            return Ok(Value::Str(strip_quotes(s)));
        }
    }

    if mask.contains(TypeMask::MAP) && matches!(value, Value::Map(_)) {
        return Ok(value);
    }
    if mask.contains(TypeMask::SET) && matches!(value, Value::Set(_)) {
        return Ok(value);
    }
    if mask.contains(TypeMask::BUFFER) && matches!(value, Value::Buffer(_)) {
        return Ok(value);
    }

    if mask.contains(TypeMask::ARRAY) {
        match &value {
            Value::Array(_) => return Ok(value),
            Value::Str(s) => {
                let items = s.split(',').map(|p| Value::Str(p.to_string())).collect();
                return Ok(Value::Array(items));
            }
            _ => {}
        }
    }

    if mask.contains(TypeMask::OBJECT) && matches!(value, Value::Object(_)) {
        return Ok(value);
    }
    if mask.contains(TypeMask::FUNCTION) && matches!(value, Value::Func(_)) {
        return Ok(value);
    }

    Err(CmdrError::TypeMismatch {
        kind: value.kind(),
        value: value.preview(),
        mask,
    })
}

/// An integral float that converts to `i64` without loss. `i64::MAX as f64`
/// rounds up to 2^63, so the upper bound is exclusive.
fn exact_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Strip exactly one layer of surrounding double quotes.
fn strip_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
