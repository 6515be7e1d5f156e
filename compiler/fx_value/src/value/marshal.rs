//! Serialized rendering of values, the fallback when `repr` has no form.

use super::Value;

/// Type tag reported alongside a marshalled value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarshalType {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Bytes,
    List,
    Json,
}

impl MarshalType {
    /// Stable lowercase name of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            MarshalType::Null => "null",
            MarshalType::Boolean => "boolean",
            MarshalType::Integer => "integer",
            MarshalType::Double => "double",
            MarshalType::String => "string",
            MarshalType::Bytes => "bytes",
            MarshalType::List => "list",
            MarshalType::Json => "json",
        }
    }
}

impl Value {
    /// Append the serialized form of this value to `out`.
    ///
    /// Returns the type tag describing the serialized payload, or `None`
    /// when the value cannot be serialized. Every variant of this model has
    /// a serialized form; `bytes` are written as lowercase hex.
    pub fn marshal(&self, out: &mut String) -> Option<MarshalType> {
        let tag = match self {
            Value::Null => MarshalType::Null,
            Value::Bool(_) => {
                self.repr(out);
                MarshalType::Boolean
            }
            Value::Integer(_) => {
                self.repr(out);
                MarshalType::Integer
            }
            Value::Double(_) => {
                self.repr(out);
                MarshalType::Double
            }
            Value::String(s) => {
                out.push_str(s);
                MarshalType::String
            }
            Value::Bytes(b) => {
                write_hex(b, out);
                MarshalType::Bytes
            }
            Value::List(_) => {
                self.write_json(out);
                MarshalType::List
            }
            Value::Dict(_) => {
                self.write_json(out);
                MarshalType::Json
            }
        };
        Some(tag)
    }
}

pub(super) fn write_hex(bytes: &[u8], out: &mut String) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    out.reserve(bytes.len().saturating_mul(2));
    for b in bytes {
        out.push(char::from(DIGITS[usize::from(b >> 4)]));
        out.push(char::from(DIGITS[usize::from(b & 0x0f)]));
    }
}
