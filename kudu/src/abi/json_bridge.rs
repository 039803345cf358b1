//! Type-directed JSON <-> [`Value`] conversion (not part of the core wire contract - see
//! module docs on [`crate::value::Value`] for why `Value` and `serde_json::Value` are kept
//! distinct). This bridge exists for CLI-style tools (`kuduconv`) that need to accept and
//! print plain JSON text, the same role `antelope/src/abi/abi.rs`'s `encode_variant`/
//! `decode_variant` play by working directly against `serde_json::Value` - the difference
//! here is that conversion consults the *resolved* type at every step, so a `bytes` or
//! `raw(N)` field is read from (and printed as) a hex string while a `string` field of the
//! exact same JSON shape is not.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::abi::resolver::{resolve, Kind, ResolvedType};
use crate::abi::typeexpr::Modifier;
use crate::abi::view::ABIView;
use crate::error::EncodeError;
use crate::value::Value;

fn is_bytes_like(r: &ResolvedType) -> bool {
    r.kind == Kind::Raw || (r.kind == Kind::Std && r.base_name == "bytes")
}

/// Convert a JSON value into the [`Value`] shape `pack` expects for `type_name`, using the
/// resolved type at each level of nesting to disambiguate the hex-string-vs-plain-string
/// question a schema-agnostic conversion couldn't otherwise answer.
pub fn json_to_value(view: &ABIView, type_name: &str, json: &Json) -> Result<Value, EncodeError> {
    let resolved = resolve(view, type_name)?;
    json_to_value_resolved(view, &resolved, json)
}

fn json_to_value_resolved(view: &ABIView, r: &ResolvedType, json: &Json) -> Result<Value, EncodeError> {
    match r.modifiers.first() {
        Some(Modifier::Array) => {
            let inner = r.peeled_one_level();
            let arr = json.as_array().ok_or_else(|| type_err(r, json))?;
            let mut out = Vec::with_capacity(arr.len());
            for elem in arr {
                out.push(json_to_value_resolved(view, &inner, elem)?);
            }
            Ok(Value::Array(out))
        }
        Some(Modifier::Optional) | Some(Modifier::Extension) => {
            let inner = r.peeled_one_level();
            if json.is_null() {
                Ok(Value::Null)
            } else {
                json_to_value_resolved(view, &inner, json)
            }
        }
        None => match r.kind {
            Kind::Raw => {
                let s = json.as_str().ok_or_else(|| type_err(r, json))?;
                let bytes = hex::decode(s).map_err(|_| type_err(r, json))?;
                Ok(Value::Bytes(bytes))
            }
            Kind::Std if r.base_name == "bytes" => {
                let s = json.as_str().ok_or_else(|| type_err(r, json))?;
                let bytes = hex::decode(s).map_err(|_| type_err(r, json))?;
                Ok(Value::Bytes(bytes))
            }
            Kind::Std if r.base_name == "bool" => {
                Ok(Value::Bool(json.as_bool().ok_or_else(|| type_err(r, json))?))
            }
            Kind::Std if r.base_name == "float32" || r.base_name == "float64" => {
                Ok(Value::Float(json.as_f64().ok_or_else(|| type_err(r, json))?))
            }
            Kind::Std if r.base_name == "string" => {
                Ok(Value::String(json.as_str().ok_or_else(|| type_err(r, json))?.to_string()))
            }
            Kind::Std if r.base_name.starts_with("uint") || r.base_name == "varuint32" => {
                json_number_to_uint(json).ok_or_else(|| type_err(r, json)).map(Value::Uint)
            }
            Kind::Std => {
                json_number_to_int(json).ok_or_else(|| type_err(r, json)).map(Value::Int)
            }
            Kind::Struct => {
                let obj = json.as_object().ok_or_else(|| type_err(r, json))?;
                json_to_struct_value(view, &r.base_name, obj)
            }
            Kind::Variant => {
                let obj = json.as_object().ok_or_else(|| type_err(r, json))?;
                json_to_variant_value(view, &r.base_name, obj, json)
            }
        },
    }
}

/// Walk a struct's base chain the same way `codec::pack_struct` does, converting each
/// field's JSON value using that field's own resolved type.
fn json_to_struct_value(
    view: &ABIView,
    name: &str,
    obj: &serde_json::Map<String, Json>,
) -> Result<Value, EncodeError> {
    let def = view.struct_map.get(name).ok_or_else(|| EncodeError::UnknownType { name: name.to_string() })?;
    let mut out = IndexMap::new();

    if let Some(base) = &def.base {
        if !base.is_empty() {
            if let Value::Map(base_fields) = json_to_struct_value(view, base, obj)? {
                out.extend(base_fields);
            }
        }
    }

    for field in &def.fields {
        match obj.get(&field.name) {
            Some(j) => {
                let converted = json_to_value(view, &field.type_expr, j)?;
                out.insert(field.name.clone(), converted);
            }
            None => {
                out.insert(field.name.clone(), Value::Null);
            }
        }
    }
    Ok(Value::Map(out))
}

/// Accepts either `{"type": name, "value": v}` or a mapping with a merged `"type"` key,
/// matching the shapes `codec::pack_variant` understands.
fn json_to_variant_value(
    view: &ABIView,
    name: &str,
    obj: &serde_json::Map<String, Json>,
    original: &Json,
) -> Result<Value, EncodeError> {
    let def = view.variant_map.get(name).ok_or_else(|| EncodeError::UnknownType { name: name.to_string() })?;
    let type_name = match obj.get("type").and_then(|v| v.as_str()) {
        Some(t) => t,
        None => {
            let variant_resolved = resolve(view, name)?;
            return Err(type_err(&variant_resolved, original));
        }
    };

    if !def.members.iter().any(|m| m == type_name) {
        return Err(EncodeError::NoMatchingVariant { variant: name.to_string(), path: name.to_string() });
    }

    let mut map = IndexMap::new();
    map.insert("type".to_string(), Value::String(type_name.to_string()));

    if let Some(payload) = obj.get("value") {
        map.insert("value".to_string(), json_to_value(view, type_name, payload)?);
    } else {
        let member_resolved = resolve(view, type_name)?;
        if member_resolved.kind == Kind::Struct {
            if let Value::Map(fields) = json_to_struct_value(view, &member_resolved.base_name, obj)? {
                map.extend(fields);
            }
        }
    }
    Ok(Value::Map(map))
}

fn json_number_to_uint(json: &Json) -> Option<u128> {
    if let Some(n) = json.as_u64() {
        return Some(n as u128);
    }
    json.as_str().and_then(|s| s.parse().ok())
}

fn json_number_to_int(json: &Json) -> Option<i128> {
    if let Some(n) = json.as_i64() {
        return Some(n as i128);
    }
    json.as_str().and_then(|s| s.parse().ok())
}

fn type_err(r: &ResolvedType, json: &Json) -> EncodeError {
    EncodeError::Type { type_name: r.original.clone(), got: json_category(json), path: r.original.clone() }
}

fn json_category(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "int",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "map",
    }
}

/// The inverse of [`json_to_value`]: render a decoded [`Value`] as JSON, emitting bytes-like
/// categories (`bytes`, `raw(N)`) as lowercase hex text instead of a JSON array of numbers.
pub fn value_to_json(view: &ABIView, type_name: &str, value: &Value) -> Result<Json, EncodeError> {
    let resolved = resolve(view, type_name)?;
    value_to_json_resolved(view, &resolved, value)
}

fn value_to_json_resolved(view: &ABIView, r: &ResolvedType, value: &Value) -> Result<Json, EncodeError> {
    if value.is_null() {
        return Ok(Json::Null);
    }
    if is_bytes_like(r) {
        if let Some(b) = value.as_bytes() {
            return Ok(Json::String(hex::encode(b)));
        }
    }
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => serde_json::Number::from_i128(*n).map(Json::Number).unwrap_or_else(|| Json::String(n.to_string())),
        Value::Uint(n) => serde_json::Number::from_u128(*n).map(Json::Number).unwrap_or_else(|| Json::String(n.to_string())),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Bytes(b) => Json::String(hex::encode(b)),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(a) => {
            let inner = r.peeled_one_level();
            let mut out = Vec::with_capacity(a.len());
            for v in a {
                out.push(value_to_json_resolved(view, &inner, v)?);
            }
            Json::Array(out)
        }
        Value::Map(m) => match r.kind {
            Kind::Struct => struct_value_to_json(view, &r.base_name, m)?,
            Kind::Variant => {
                // `codec::unpack_variant`'s merged-mapping shape: every key but `type` is one
                // of the tagged member struct's own fields, merged at the top level.
                let member_name = m.get("type").and_then(|t| t.as_str()).unwrap_or_default();
                let mut obj = match struct_value_to_json(view, member_name, m)? {
                    Json::Object(o) => o,
                    _ => serde_json::Map::new(),
                };
                obj.insert("type".to_string(), Json::String(member_name.to_string()));
                Json::Object(obj)
            }
            _ => {
                let mut obj = serde_json::Map::new();
                for (k, v) in m {
                    obj.insert(k.clone(), value_to_json_resolved(view, r, v)?);
                }
                Json::Object(obj)
            }
        },
    })
}

fn struct_value_to_json(view: &ABIView, name: &str, m: &IndexMap<String, Value>) -> Result<Json, EncodeError> {
    let def = view.struct_map.get(name).ok_or_else(|| EncodeError::UnknownType { name: name.to_string() })?;
    let mut obj = serde_json::Map::new();

    if let Some(base) = &def.base {
        if !base.is_empty() {
            if let Json::Object(base_obj) = struct_value_to_json(view, base, m)? {
                obj.extend(base_obj);
            }
        }
    }

    for field in &def.fields {
        if let Some(v) = m.get(&field.name) {
            let field_resolved = resolve(view, &field.type_expr)?;
            obj.insert(field.name.clone(), value_to_json_resolved(view, &field_resolved, v)?);
        }
    }
    Ok(Json::Object(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::document::AbiDocument;

    fn view() -> ABIView {
        let json = r#"{"version":"v","types":[],"structs":[]}"#;
        ABIView::from_document(&AbiDocument::parse_contract_abi(json).unwrap()).unwrap()
    }

    #[test]
    fn bytes_round_trips_through_hex_string() {
        let v = view();
        let json: Json = serde_json::from_str(r#""deadbeef""#).unwrap();
        let value = json_to_value(&v, "bytes", &json).unwrap();
        assert_eq!(value, Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(value_to_json(&v, "bytes", &value).unwrap(), json);
    }

    #[test]
    fn sha256_raw_alias_round_trips_through_hex_string() {
        let v = view();
        let hex = "00".repeat(32);
        let json = Json::String(hex.clone());
        let value = json_to_value(&v, "sha256", &json).unwrap();
        assert_eq!(value.as_bytes().unwrap().len(), 32);
        assert_eq!(value_to_json(&v, "sha256", &value).unwrap(), json);
    }

    #[test]
    fn plain_string_is_not_hex_decoded() {
        let v = view();
        let json = Json::String("hello world".to_string());
        let value = json_to_value(&v, "string", &json).unwrap();
        assert_eq!(value, Value::String("hello world".to_string()));
    }
}
