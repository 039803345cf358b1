//! 4.D Wire Codec: the byte-exact contract. Operates on a `ResolvedType` (produced by the
//! Resolver) and a dynamically-typed [`Value`], walking the type graph exactly the way
//! `antelope/src/abi/abi.rs`'s `encode_variant_`/`decode_variant_`/`encode_struct`/
//! `decode_struct` do, generalized from `serde_json::Value` to [`Value`] so that `bytes` and
//! `string` stop colliding on the wire-independent side, and the struct `ScopeExit`-guarded
//! extension-trailing logic is re-expressed as a plain loop with an explicit
//! "already saw an absent extension field" flag.
//!
//! Numeric widths are handled via `bytemuck`'s pod reinterpretation, the same approach as
//! `antelope/src/binaryserializable.rs`'s `impl_pod_serialization!` macro; like that macro,
//! this assumes a little-endian host (no byte-swapping is performed for big-endian targets).

use indexmap::IndexMap;

use crate::abi::resolver::{resolve, Kind, ResolvedType};
use crate::abi::typeexpr::Modifier;
use crate::abi::view::ABIView;
use crate::bytestream::ByteStream;
use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

// -----------------------------------------------------------------------------
//     top-level entry points
// -----------------------------------------------------------------------------

pub fn pack(view: &ABIView, type_name: &str, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let resolved = resolve(view, type_name)?;
    let mut stream = ByteStream::new();
    pack_resolved(view, &resolved, value, type_name, &mut stream)?;
    Ok(stream.into_bytes())
}

pub fn unpack(view: &ABIView, type_name: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
    let resolved = resolve(view, type_name).map_err(|source| DecodeError::Resolve { source })?;
    let mut stream = ByteStream::from(bytes.to_vec());
    let value = unpack_resolved(view, &resolved, type_name, &mut stream)?;
    let leftover = stream.leftover().len();
    if leftover != 0 {
        return Err(DecodeError::TrailingBytes { count: leftover });
    }
    Ok(value)
}

// -----------------------------------------------------------------------------
//     modifier walk
// -----------------------------------------------------------------------------

pub fn pack_resolved(
    view: &ABIView,
    r: &ResolvedType,
    value: &Value,
    path: &str,
    stream: &mut ByteStream,
) -> Result<(), EncodeError> {
    match r.modifiers.first() {
        Some(Modifier::Array) => {
            let inner = r.peeled_one_level();
            let arr = value
                .as_array()
                .ok_or_else(|| type_err("array", value, path))?;
            stream.write_var_u32(arr.len() as u32);
            for (i, elem) in arr.iter().enumerate() {
                pack_resolved(view, &inner, elem, &format!("{path}[{i}]"), stream)?;
            }
            Ok(())
        }
        Some(Modifier::Optional) => {
            let inner = r.peeled_one_level();
            if value.is_null() {
                stream.write_byte(0);
            } else {
                stream.write_byte(1);
                pack_resolved(view, &inner, value, path, stream)?;
            }
            Ok(())
        }
        // `$` only has wire meaning at the outermost position of a struct field; reaching it
        // here means a caller packed a bare extension type directly, which we treat as
        // equivalent to packing the unwrapped type (there's no flag byte for it outside a
        // struct).
        Some(Modifier::Extension) => {
            let inner = r.peeled_one_level();
            pack_resolved(view, &inner, value, path, stream)
        }
        None => match r.kind {
            Kind::Std => pack_std(&r.base_name, value, path, stream),
            Kind::Raw => pack_raw(r.args.unwrap_or(0), value, path, stream),
            Kind::Struct => pack_struct(view, &r.base_name, value, path, stream),
            Kind::Variant => pack_variant(view, &r.base_name, value, path, stream),
        },
    }
}

pub fn unpack_resolved(
    view: &ABIView,
    r: &ResolvedType,
    path: &str,
    stream: &mut ByteStream,
) -> Result<Value, DecodeError> {
    match r.modifiers.first() {
        Some(Modifier::Array) => {
            let inner = r.peeled_one_level();
            let count = stream.read_var_u32()? as usize;
            let mut items = Vec::with_capacity(count);
            for i in 0..count {
                items.push(unpack_resolved(view, &inner, &format!("{path}[{i}]"), stream)?);
            }
            Ok(Value::Array(items))
        }
        Some(Modifier::Optional) => {
            let inner = r.peeled_one_level();
            match stream.read_byte()? {
                0 => Ok(Value::Null),
                1 => unpack_resolved(view, &inner, path, stream),
                byte => Err(DecodeError::InvalidFlag { byte, path: path.to_string() }),
            }
        }
        Some(Modifier::Extension) => {
            let inner = r.peeled_one_level();
            unpack_resolved(view, &inner, path, stream)
        }
        None => match r.kind {
            Kind::Std => unpack_std(&r.base_name, path, stream),
            Kind::Raw => unpack_raw(r.args.unwrap_or(0), path, stream),
            Kind::Struct => unpack_struct(view, &r.base_name, path, stream),
            Kind::Variant => unpack_variant(view, &r.base_name, path, stream),
        },
    }
}

fn type_err(type_name: &str, value: &Value, path: &str) -> EncodeError {
    EncodeError::Type { type_name: type_name.to_string(), got: value.category(), path: path.to_string() }
}

// -----------------------------------------------------------------------------
//     scalars
// -----------------------------------------------------------------------------

fn int_range(width: u32) -> (i128, i128) {
    if width == 128 {
        (i128::MIN, i128::MAX)
    } else {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    }
}

fn uint_max(width: u32) -> u128 {
    if width == 128 { u128::MAX } else { (1u128 << width) - 1 }
}

fn le_bytes_of_uint(width: u32, val: u128) -> Vec<u8> {
    match width {
        8 => vec![val as u8],
        16 => bytemuck::bytes_of(&(val as u16)).to_vec(),
        32 => bytemuck::bytes_of(&(val as u32)).to_vec(),
        64 => bytemuck::bytes_of(&(val as u64)).to_vec(),
        128 => bytemuck::bytes_of(&val).to_vec(),
        _ => unreachable!("unsupported integer width {width}"),
    }
}

fn le_bytes_of_int(width: u32, val: i128) -> Vec<u8> {
    match width {
        8 => vec![(val as i8) as u8],
        16 => bytemuck::bytes_of(&(val as i16)).to_vec(),
        32 => bytemuck::bytes_of(&(val as i32)).to_vec(),
        64 => bytemuck::bytes_of(&(val as i64)).to_vec(),
        128 => bytemuck::bytes_of(&val).to_vec(),
        _ => unreachable!("unsupported integer width {width}"),
    }
}

fn uint_from_le_bytes(width: u32, bytes: &[u8]) -> u128 {
    match width {
        8 => bytes[0] as u128,
        16 => bytemuck::pod_read_unaligned::<u16>(bytes) as u128,
        32 => bytemuck::pod_read_unaligned::<u32>(bytes) as u128,
        64 => bytemuck::pod_read_unaligned::<u64>(bytes) as u128,
        128 => bytemuck::pod_read_unaligned::<u128>(bytes),
        _ => unreachable!("unsupported integer width {width}"),
    }
}

fn int_from_le_bytes(width: u32, bytes: &[u8]) -> i128 {
    match width {
        8 => (bytes[0] as i8) as i128,
        16 => bytemuck::pod_read_unaligned::<i16>(bytes) as i128,
        32 => bytemuck::pod_read_unaligned::<i32>(bytes) as i128,
        64 => bytemuck::pod_read_unaligned::<i64>(bytes) as i128,
        128 => bytemuck::pod_read_unaligned::<i128>(bytes),
        _ => unreachable!("unsupported integer width {width}"),
    }
}

fn pack_uint(value: &Value, width: u32, path: &str, stream: &mut ByteStream) -> Result<(), EncodeError> {
    let raw = value.as_i128().ok_or_else(|| type_err(&format!("uint{width}"), value, path))?;
    if raw < 0 || raw as u128 > uint_max(width) {
        return Err(EncodeError::Range {
            type_name: format!("uint{width}"),
            value: raw.to_string(),
            path: path.to_string(),
        });
    }
    stream.write_bytes(&le_bytes_of_uint(width, raw as u128));
    Ok(())
}

fn pack_int(value: &Value, width: u32, path: &str, stream: &mut ByteStream) -> Result<(), EncodeError> {
    let raw = value.as_i128().ok_or_else(|| type_err(&format!("int{width}"), value, path))?;
    let (min, max) = int_range(width);
    if raw < min || raw > max {
        return Err(EncodeError::Range {
            type_name: format!("int{width}"),
            value: raw.to_string(),
            path: path.to_string(),
        });
    }
    stream.write_bytes(&le_bytes_of_int(width, raw));
    Ok(())
}

fn unpack_uint(width: u32, path: &str, stream: &mut ByteStream) -> Result<Value, DecodeError> {
    let _ = path;
    let bytes = stream.read_bytes((width / 8) as usize)?;
    Ok(Value::Uint(uint_from_le_bytes(width, bytes)))
}

fn unpack_int(width: u32, path: &str, stream: &mut ByteStream) -> Result<Value, DecodeError> {
    let _ = path;
    let bytes = stream.read_bytes((width / 8) as usize)?;
    Ok(Value::Int(int_from_le_bytes(width, bytes)))
}

fn pack_std(name: &str, value: &Value, path: &str, stream: &mut ByteStream) -> Result<(), EncodeError> {
    match name {
        "bool" => {
            let b = value.as_bool().ok_or_else(|| type_err("bool", value, path))?;
            stream.write_byte(b as u8);
            Ok(())
        }
        "uint8" => pack_uint(value, 8, path, stream),
        "uint16" => pack_uint(value, 16, path, stream),
        "uint32" => pack_uint(value, 32, path, stream),
        "uint64" => pack_uint(value, 64, path, stream),
        "uint128" => pack_uint(value, 128, path, stream),
        "int8" => pack_int(value, 8, path, stream),
        "int16" => pack_int(value, 16, path, stream),
        "int32" => pack_int(value, 32, path, stream),
        "int64" => pack_int(value, 64, path, stream),
        "int128" => pack_int(value, 128, path, stream),
        "varuint32" => {
            let raw = value.as_i128().ok_or_else(|| type_err("varuint32", value, path))?;
            if raw < 0 || raw > u32::MAX as i128 {
                return Err(EncodeError::Range { type_name: "varuint32".into(), value: raw.to_string(), path: path.to_string() });
            }
            stream.write_var_u32(raw as u32);
            Ok(())
        }
        "varint32" => {
            let raw = value.as_i128().ok_or_else(|| type_err("varint32", value, path))?;
            if raw < i32::MIN as i128 || raw > i32::MAX as i128 {
                return Err(EncodeError::Range { type_name: "varint32".into(), value: raw.to_string(), path: path.to_string() });
            }
            stream.write_var_i32(raw as i32);
            Ok(())
        }
        "float32" => {
            let f = value.as_f64().ok_or_else(|| type_err("float32", value, path))?;
            stream.write_bytes(&(f as f32).to_le_bytes());
            Ok(())
        }
        "float64" => {
            let f = value.as_f64().ok_or_else(|| type_err("float64", value, path))?;
            stream.write_bytes(&f.to_le_bytes());
            Ok(())
        }
        "bytes" => {
            let b = value.as_bytes().ok_or_else(|| type_err("bytes", value, path))?;
            stream.write_var_u32(b.len() as u32);
            stream.write_bytes(b);
            Ok(())
        }
        "string" => {
            let s = value.as_str().ok_or_else(|| type_err("string", value, path))?;
            stream.write_var_u32(s.len() as u32);
            stream.write_bytes(s.as_bytes());
            Ok(())
        }
        other => Err(EncodeError::UnknownType { name: other.to_string() }),
    }
}

fn unpack_std(name: &str, path: &str, stream: &mut ByteStream) -> Result<Value, DecodeError> {
    match name {
        "bool" => match stream.read_byte()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            byte => Err(DecodeError::InvalidFlag { byte, path: path.to_string() }),
        },
        "uint8" => unpack_uint(8, path, stream),
        "uint16" => unpack_uint(16, path, stream),
        "uint32" => unpack_uint(32, path, stream),
        "uint64" => unpack_uint(64, path, stream),
        "uint128" => unpack_uint(128, path, stream),
        "int8" => unpack_int(8, path, stream),
        "int16" => unpack_int(16, path, stream),
        "int32" => unpack_int(32, path, stream),
        "int64" => unpack_int(64, path, stream),
        "int128" => unpack_int(128, path, stream),
        "varuint32" => Ok(Value::Uint(stream.read_var_u32()? as u128)),
        "varint32" => Ok(Value::Int(stream.read_var_i32()? as i128)),
        "float32" => {
            let bytes = stream.read_bytes(4)?;
            Ok(Value::Float(f32::from_le_bytes(bytes.try_into().unwrap()) as f64))
        }
        "float64" => {
            let bytes = stream.read_bytes(8)?;
            Ok(Value::Float(f64::from_le_bytes(bytes.try_into().unwrap())))
        }
        "bytes" => {
            let len = stream.read_var_u32()? as usize;
            Ok(Value::Bytes(stream.read_bytes(len)?.to_vec()))
        }
        "string" => {
            let len = stream.read_var_u32()? as usize;
            let bytes = stream.read_bytes(len)?;
            let s = std::str::from_utf8(bytes)
                .map_err(|_| DecodeError::InvalidUtf8 { path: path.to_string() })?;
            Ok(Value::String(s.to_string()))
        }
        other => Err(DecodeError::UnknownType { name: other.to_string() }),
    }
}

fn pack_raw(n: usize, value: &Value, path: &str, stream: &mut ByteStream) -> Result<(), EncodeError> {
    let bytes = value.as_bytes().ok_or_else(|| type_err(&format!("raw({n})"), value, path))?;
    if bytes.len() != n {
        return Err(EncodeError::Range {
            type_name: format!("raw({n})"),
            value: format!("{} byte(s)", bytes.len()),
            path: path.to_string(),
        });
    }
    stream.write_bytes(bytes);
    Ok(())
}

fn unpack_raw(n: usize, _path: &str, stream: &mut ByteStream) -> Result<Value, DecodeError> {
    Ok(Value::Bytes(stream.read_bytes(n)?.to_vec()))
}

// -----------------------------------------------------------------------------
//     structs: base chain + extension trailing rule (I3)
// -----------------------------------------------------------------------------

const NULL: Value = Value::Null;

fn field_value<'a>(map: &'a IndexMap<String, Value>, name: &str) -> &'a Value {
    map.get(name).unwrap_or(&NULL)
}

fn pack_struct(
    view: &ABIView,
    name: &str,
    value: &Value,
    path: &str,
    stream: &mut ByteStream,
) -> Result<(), EncodeError> {
    let def = view
        .struct_map
        .get(name)
        .unwrap_or_else(|| panic!("resolver produced Kind::Struct for unknown struct {name:?}"));
    let map = value.as_map().ok_or_else(|| type_err(name, value, path))?;

    if let Some(base) = &def.base {
        if !base.is_empty() {
            pack_struct(view, base, value, path, stream)?;
        }
    }

    let mut in_extension_gap = false;
    for field in &def.fields {
        let resolved = resolve(view, &field.type_expr)?;
        let is_ext = resolved.is_extension();
        let field_path = format!("{path}.{}", field.name);
        let v = field_value(map, &field.name);

        if is_ext {
            if v.is_null() {
                in_extension_gap = true;
                continue;
            }
            if in_extension_gap {
                // I3: once one extension field is absent, all later ones must be too.
                continue;
            }
            pack_resolved(view, &resolved.peeled_one_level(), v, &field_path, stream)?;
        } else {
            if v.is_null() {
                return Err(EncodeError::Type {
                    type_name: field.type_expr.clone(),
                    got: "null",
                    path: field_path,
                });
            }
            pack_resolved(view, &resolved, v, &field_path, stream)?;
        }
    }
    Ok(())
}

fn unpack_struct(
    view: &ABIView,
    name: &str,
    path: &str,
    stream: &mut ByteStream,
) -> Result<Value, DecodeError> {
    let def = view
        .struct_map
        .get(name)
        .unwrap_or_else(|| panic!("resolver produced Kind::Struct for unknown struct {name:?}"));

    let mut out = IndexMap::new();

    if let Some(base) = &def.base {
        if !base.is_empty() {
            if let Value::Map(base_fields) = unpack_struct(view, base, path, stream)? {
                out.extend(base_fields);
            }
        }
    }

    let mut encountered_absent_extension = false;
    for field in &def.fields {
        let resolved = resolve(view, &field.type_expr).map_err(|source| DecodeError::Resolve { source })?;
        let field_path = format!("{path}.{}", field.name);

        let value = if resolved.is_extension() {
            if encountered_absent_extension || stream.leftover().is_empty() {
                encountered_absent_extension = true;
                Value::Null
            } else {
                unpack_resolved(view, &resolved.peeled_one_level(), &field_path, stream)?
            }
        } else {
            unpack_resolved(view, &resolved, &field_path, stream)?
        };
        out.insert(field.name.clone(), value);
    }

    Ok(Value::Map(out))
}

// -----------------------------------------------------------------------------
//     variants: varuint32 tag + payload, mapping-only name attachment (§4.D, §9)
// -----------------------------------------------------------------------------

fn pack_variant(
    view: &ABIView,
    name: &str,
    value: &Value,
    path: &str,
    stream: &mut ByteStream,
) -> Result<(), EncodeError> {
    let def = view
        .variant_map
        .get(name)
        .unwrap_or_else(|| panic!("resolver produced Kind::Variant for unknown variant {name:?}"));

    let (tag, payload): (u32, &Value) = if let Some(map) = value.as_map() {
        if let Some(Value::String(type_name)) = map.get("type") {
            let idx = def
                .members
                .iter()
                .position(|m| m == type_name)
                .ok_or_else(|| EncodeError::NoMatchingVariant { variant: name.to_string(), path: path.to_string() })?;
            if let Some(v) = map.get("value") {
                (idx as u32, v)
            } else {
                // merged-mapping shape: payload is every key except "type".
                (idx as u32, value)
            }
        } else {
            return Err(type_err(name, value, path));
        }
    } else {
        // bare scalar: infer the alternative by dynamic category.
        let category = value.category();
        let mut candidates = Vec::new();
        for (i, member) in def.members.iter().enumerate() {
            let resolved = resolve(view, member)?;
            if scalar_category_matches(&resolved, category) {
                candidates.push(i);
            }
        }
        match candidates.as_slice() {
            [] => return Err(EncodeError::NoMatchingVariant { variant: name.to_string(), path: path.to_string() }),
            [only] => (*only as u32, value),
            _ => {
                return Err(EncodeError::AmbiguousVariant {
                    variant: name.to_string(),
                    category: category.to_string(),
                    path: path.to_string(),
                })
            }
        }
    };

    stream.write_var_u32(tag);
    let member_expr = &def.members[tag as usize];
    let resolved = resolve(view, member_expr)?;

    if let Some(map) = payload.as_map() {
        if resolved.kind == Kind::Struct && map.contains_key("type") {
            // strip the merged "type" tag before handing the mapping to the struct packer.
            let mut stripped = map.clone();
            stripped.shift_remove("type");
            return pack_resolved(view, &resolved, &Value::Map(stripped), path, stream);
        }
    }
    pack_resolved(view, &resolved, payload, path, stream)
}

fn scalar_category_matches(r: &ResolvedType, category: &str) -> bool {
    if !r.modifiers.is_empty() {
        return category == "array" && r.is_array();
    }
    match (r.kind, r.base_name.as_str(), category) {
        (Kind::Std, "bool", "bool") => true,
        (Kind::Std, n, "int") if n.starts_with("int") || n.starts_with("uint") || n.starts_with("varint") || n.starts_with("varuint") => true,
        (Kind::Std, n, "float") if n.starts_with("float") => true,
        (Kind::Std, "bytes", "bytes") | (Kind::Raw, _, "bytes") => true,
        (Kind::Std, "string", "string") => true,
        (Kind::Struct, _, "map") => true,
        _ => false,
    }
}

fn unpack_variant(
    view: &ABIView,
    name: &str,
    path: &str,
    stream: &mut ByteStream,
) -> Result<Value, DecodeError> {
    let def = view
        .variant_map
        .get(name)
        .unwrap_or_else(|| panic!("resolver produced Kind::Variant for unknown variant {name:?}"));

    let tag = stream.read_var_u32()?;
    let member_expr = def.members.get(tag as usize).ok_or_else(|| DecodeError::InvalidTag {
        variant: name.to_string(),
        tag,
        num_members: def.members.len(),
    })?.clone();

    let resolved = resolve(view, &member_expr).map_err(|source| DecodeError::Resolve { source })?;
    let decoded = unpack_resolved(view, &resolved, path, stream)?;

    Ok(match decoded {
        Value::Map(mut m) => {
            m.insert("type".to_string(), Value::String(member_expr));
            Value::Map(m)
        }
        scalar => scalar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::document::AbiDocument;

    fn view(json: &str) -> ABIView {
        ABIView::from_document(&AbiDocument::parse_contract_abi(json).unwrap()).unwrap()
    }

    fn mapv(pairs: &[(&str, Value)]) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        Value::Map(m)
    }

    #[test]
    fn pack_uint32_is_little_endian() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let bytes = pack(&v, "uint32", &Value::from(305419896u32)).unwrap();
        assert_eq!(hex::encode(bytes), "78563412");
    }

    #[test]
    fn pack_varuint32_known_vector() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let bytes = pack(&v, "varuint32", &Value::from(300i32)).unwrap();
        assert_eq!(hex::encode(bytes), "ac02");
    }

    #[test]
    fn pack_varint32_known_vector() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let bytes = pack(&v, "varint32", &Value::from(-1i32)).unwrap();
        assert_eq!(hex::encode(bytes), "01");
    }

    #[test]
    fn pack_string_length_prefixed() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let bytes = pack(&v, "string", &Value::from("hi")).unwrap();
        assert_eq!(hex::encode(bytes), "026869");
    }

    #[test]
    fn uint_out_of_range_is_rejected() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let err = pack(&v, "uint8", &Value::from(300i32)).unwrap_err();
        assert!(matches!(err, EncodeError::Range { .. }));
    }

    #[test]
    fn asset_struct_round_trips() {
        // `asset` is a built-in struct (§3): { amount: int64, symbol: symbol }.
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let value = mapv(&[
            ("amount", Value::from(10000i64)),
            ("symbol", Value::Uint(1397703940i128 as u128)),
        ]);
        let bytes = pack(&v, "asset", &value).unwrap();
        let decoded = unpack(&v, "asset", &bytes).unwrap();
        let m = decoded.into_map().unwrap();
        assert_eq!(m.get("amount").unwrap().as_i128(), Some(10000));
    }

    #[test]
    fn optional_string_round_trips_both_states() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let present = pack(&v, "string?", &Value::from("hi")).unwrap();
        assert_eq!(unpack(&v, "string?", &present).unwrap(), Value::String("hi".to_string()));

        let absent = pack(&v, "string?", &Value::Null).unwrap();
        assert_eq!(absent, vec![0u8]);
        assert_eq!(unpack(&v, "string?", &absent).unwrap(), Value::Null);
    }

    #[test]
    fn array_of_uint32_round_trips() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let value = Value::Array(vec![Value::from(1u32), Value::from(2u32), Value::from(3u32)]);
        let bytes = pack(&v, "uint32[]", &value).unwrap();
        assert_eq!(unpack(&v, "uint32[]", &bytes).unwrap(), value);
    }

    #[test]
    fn struct_extension_trailing_rule_allows_omitting_tail() {
        let json = r#"{"version":"v","types":[],"structs":[
            {"name":"foo","fields":[
                {"name":"a","type":"uint32"},
                {"name":"b","type":"string$"},
                {"name":"c","type":"uint8$"}
            ]}
        ]}"#;
        let v = view(json);

        let value = mapv(&[("a", Value::from(1u32))]);
        let bytes = pack(&v, "foo", &value).unwrap();
        assert_eq!(bytes.len(), 4); // only `a`, both extension fields omitted entirely

        let decoded = unpack(&v, "foo", &bytes).unwrap().into_map().unwrap();
        assert_eq!(decoded.get("a").unwrap().as_i128(), Some(1));
        assert!(decoded.get("b").unwrap().is_null());
        assert!(decoded.get("c").unwrap().is_null());
    }

    #[test]
    fn struct_extension_field_present_is_packed() {
        let json = r#"{"version":"v","types":[],"structs":[
            {"name":"foo","fields":[
                {"name":"a","type":"uint32"},
                {"name":"b","type":"string$"}
            ]}
        ]}"#;
        let v = view(json);

        let value = mapv(&[("a", Value::from(1u32)), ("b", Value::from("x"))]);
        let bytes = pack(&v, "foo", &value).unwrap();
        let decoded = unpack(&v, "foo", &bytes).unwrap().into_map().unwrap();
        assert_eq!(decoded.get("b").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn variant_round_trips_with_explicit_type_value_shape() {
        let json = r#"{"version":"v","types":[],"structs":[],"variants":[
            {"name":"either","types":["uint32","string"]}
        ]}"#;
        let v = view(json);

        let value = mapv(&[
            ("type", Value::from("string")),
            ("value", Value::from("hi")),
        ]);
        let bytes = pack(&v, "either", &value).unwrap();
        assert_eq!(bytes[0], 1); // tag 1 == "string"

        let decoded = unpack(&v, "either", &bytes).unwrap();
        assert_eq!(decoded, Value::String("hi".to_string()));
    }

    #[test]
    fn variant_infers_tag_from_bare_scalar_category() {
        let json = r#"{"version":"v","types":[],"structs":[],"variants":[
            {"name":"either","types":["uint32","string"]}
        ]}"#;
        let v = view(json);

        let bytes = pack(&v, "either", &Value::from("hi")).unwrap();
        assert_eq!(bytes[0], 1);
    }

    #[test]
    fn variant_rejects_ambiguous_bare_scalar() {
        let json = r#"{"version":"v","types":[],"structs":[],"variants":[
            {"name":"either","types":["uint32","uint64"]}
        ]}"#;
        let v = view(json);

        let err = pack(&v, "either", &Value::from(5i32)).unwrap_err();
        assert!(matches!(err, EncodeError::AmbiguousVariant { .. }));
    }

    #[test]
    fn unpack_rejects_trailing_bytes() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let mut bytes = pack(&v, "uint32", &Value::from(1u32)).unwrap();
        bytes.push(0xff);
        let err = unpack(&v, "uint32", &bytes).unwrap_err();
        assert!(matches!(err, DecodeError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn unpack_rejects_invalid_optional_flag() {
        let v = view(r#"{"version":"v","types":[],"structs":[]}"#);
        let err = unpack(&v, "uint32?", &[2u8]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFlag { byte: 2, .. }));
    }
}
