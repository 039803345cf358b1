//! The dynamically-typed in-memory value representation (§1, §3, §9).
//!
//! Neither a strongly-typed Rust struct per wire type nor a bare `serde_json::Value` fits
//! here: the whole point of this crate is that a codec is *derived from an ABI document
//! at runtime*, so the host-side value it produces and consumes has to carry exactly the
//! categories the wire format distinguishes, no more and no less - in particular `bytes`
//! and `string` are distinct wire types (§4.D) but collapse to the same JSON representation
//! (a plain JSON string), which is exactly the ambiguity `json_bridge` resolves by consulting
//! the resolved type at each nesting level. `Value` keeps `Bytes` and `String` apart so the
//! codec itself never has to guess.

use indexmap::IndexMap;

/// A value flowing into or out of the wire codec.
///
/// Maps are order-preserving (`IndexMap`) so that a struct decoded from bytes keeps its
/// field declaration order for debugging and re-encoding, even though the round-trip law
/// (§8) compares maps ignoring order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Signed integers up to 128 bits, covering every `int{8,16,32,64,128}` and `varint32`.
    Int(i128),
    /// Unsigned integers up to 128 bits, covering every `uint{8,16,32,64,128}` and `varuint32`.
    Uint(u128),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => i128::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Value::Uint(n) => Some(*n),
            Value::Int(n) => u128::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::Uint(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self { Value::Bytes(b) => Some(b), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::String(s) => Some(s), _ => None }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self { Value::Array(a) => Some(a), _ => None }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self { Value::Map(m) => Some(m), _ => None }
    }

    pub fn into_map(self) -> Option<IndexMap<String, Value>> {
        match self { Value::Map(m) => Some(m), _ => None }
    }

    /// The §4.D variant-tag-inference category a bare scalar belongs to: `bool`,
    /// `int`, `float`, `bytes`, `string`, or `map` (struct alternatives). `Array` has
    /// no category of its own since the core's built-in variant tests never vary on it.
    pub fn category(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Uint(_) => "int",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i128> for Value { fn from(v: i128) -> Self { Value::Int(v) } }
impl From<u128> for Value { fn from(v: u128) -> Self { Value::Uint(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<Vec<u8>> for Value { fn from(v: Vec<u8>) -> Self { Value::Bytes(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }

macro_rules! impl_from_int {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self { Value::$variant(v as _) }
        })*
    }
}

impl_from_int!(i8 => Int, i16 => Int, i32 => Int, i64 => Int);
impl_from_int!(u8 => Uint, u16 => Uint, u32 => Uint, u64 => Uint);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(Value::Bool(true).category(), "bool");
        assert_eq!(Value::from(42i32).category(), "int");
        assert_eq!(Value::Bytes(vec![1, 2]).category(), "bytes");
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut m = IndexMap::new();
        m.insert("b".to_string(), Value::from(1i32));
        m.insert("a".to_string(), Value::from(2i32));
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
