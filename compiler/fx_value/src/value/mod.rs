//! Runtime values for filterx expressions.
//!
//! # Arc Enforcement
//!
//! All heap allocations go through factory methods on `Value`. `Heap<T>`
//! has a module-private constructor, so external code cannot build a heap
//! variant directly:
//!
//! ```text
//! let s = Value::string("hello");                 // OK
//! let list = Value::list(vec![Value::Null]);      // OK
//! let s = Value::String(Heap::new(..));           // ERROR: Heap::new is pub(super)
//! ```
//!
//! # Thread Safety
//!
//! Heap types use `Arc` internally, so values can be shared between worker
//! threads evaluating the same compiled expression tree.

mod heap;
mod marshal;

use std::collections::BTreeMap;
use std::fmt;

pub use heap::Heap;
pub use marshal::MarshalType;

/// Runtime value produced by evaluating an expression.
#[derive(Clone, PartialEq)]
pub enum Value {
    // Primitives (inline, no heap allocation)
    /// The null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Double precision floating point value.
    Double(f64),

    // Heap Types (use Heap<T> for enforced Arc usage)
    /// UTF-8 string value.
    String(Heap<String>),
    /// Raw byte sequence.
    Bytes(Heap<Vec<u8>>),
    /// Ordered list of values.
    List(Heap<Vec<Value>>),
    /// Dictionary with string keys, iterated in key order.
    Dict(Heap<BTreeMap<String, Value>>),
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Heap::new(s.into()))
    }

    /// Create a bytes value.
    #[inline]
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(Heap::new(b.into()))
    }

    /// Create a list value.
    ///
    /// ```text
    /// let needles = Value::list(vec![Value::string("abc"), Value::string("xyz")]);
    /// ```
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Create a dictionary value.
    #[inline]
    pub fn dict(entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(Heap::new(entries))
    }
}

// Value Methods

impl Value {
    /// Check if this value is truthy.
    ///
    /// Containers and strings are truthy when non-empty, numbers when
    /// non-zero, `null` never.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Double(d) => *d != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
        }
    }

    /// Borrow the string payload, if this is a string value.
    ///
    /// The returned slice is only valid while this reference is held.
    #[inline]
    pub fn extract_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to convert to a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the elements of a list value.
    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value supports the list capability.
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Number of elements, for list values.
    #[inline]
    pub fn list_len(&self) -> Option<usize> {
        self.as_list().map(<[Value]>::len)
    }

    /// Take a new reference to the element at `index` of a list value.
    pub fn get_index(&self, index: usize) -> Option<Value> {
        self.as_list().and_then(|items| items.get(index)).cloned()
    }

    /// Declared type name, used in diagnostics and trace events.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// Append the textual representation of this value to `out`.
    ///
    /// Returns `false` for values without a textual form (`bytes`); callers
    /// fall back to `marshal` in that case.
    pub fn repr(&self, out: &mut String) -> bool {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Double(d) => out.push_str(&format_double(*d)),
            Value::String(s) => out.push_str(s),
            Value::Bytes(_) => return false,
            Value::List(_) | Value::Dict(_) => self.write_json(out),
        }
        true
    }

    /// JSON-like rendering used for containers by both `repr` and `marshal`.
    fn write_json(&self, out: &mut String) {
        match self {
            Value::String(s) => write_json_string(s, out),
            Value::Bytes(b) => {
                out.push('"');
                marshal::write_hex(b, out);
                out.push('"');
            }
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Dict(map) => {
                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(key, out);
                    out.push(':');
                    item.write_json(out);
                }
                out.push('}');
            }
            Value::Null | Value::Bool(_) | Value::Integer(_) | Value::Double(_) => {
                self.repr(out);
            }
        }
    }
}

/// Render a double so that integral values keep a fractional part.
fn format_double(d: f64) -> String {
    if d.is_finite() {
        format!("{d:?}")
    } else if d.is_nan() {
        "nan".to_string()
    } else if d.is_sign_negative() {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

// Trait Implementations

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Double(d) => write!(f, "Double({d:?})"),
            Value::String(s) => write!(f, "String({:?})", &***s),
            Value::Bytes(b) => write!(f, "Bytes({:?})", &***b),
            Value::List(items) => write!(f, "List({:?})", &***items),
            Value::Dict(map) => write!(f, "Dict({:?})", &**map),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if !self.repr(&mut out) {
            out.clear();
            self.marshal(&mut out);
        }
        f.write_str(&out)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
