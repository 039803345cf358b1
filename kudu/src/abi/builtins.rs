//! Built-in scalar, alias, and struct tables injected into every `ABIView` (§3).
//!
//! Grounded 1:1 on `original_source/src/jitabi/protocol.py`'s `STD_TYPES`,
//! `DEFAULT_ALIASES`, and `DEFAULT_STRUCTS`.

use crate::abi::document::{AliasDef, FieldDef, StructDef};

/// The built-in scalar type names (§3). Anything not in this list, not `raw`, and not a
/// struct or variant name is unresolvable.
pub const STD_TYPES: &[&str] = &[
    "bool",
    "uint8", "uint16", "uint32", "uint64", "uint128",
    "int8", "int16", "int32", "int64", "int128",
    "varuint32", "varint32",
    "float32", "float64",
    "bytes", "string",
];

pub fn is_std_type(name: &str) -> bool {
    STD_TYPES.contains(&name)
}

/// Always-injected aliases (§3), in declaration order so their contribution to the
/// content hash (I5) is deterministic.
pub fn default_aliases() -> Vec<AliasDef> {
    [
        ("float128", "raw(16)"),
        ("name", "uint64"),
        ("account_name", "uint64"),
        ("symbol", "uint64"),
        ("symbol_code", "uint64"),
        ("rd160", "raw(20)"),
        ("checksum160", "raw(20)"),
        ("sha256", "raw(32)"),
        ("checksum256", "raw(32)"),
        ("checksum512", "raw(64)"),
        ("time_point", "uint64"),
        ("time_point_sec", "uint32"),
        ("block_timestamp_type", "uint32"),
        ("public_key", "raw(34)"),
        ("signature", "raw(66)"),
    ]
    .into_iter()
    .map(|(new_type_name, target)| AliasDef {
        new_type_name: new_type_name.to_string(),
        target: target.to_string(),
    })
    .collect()
}

/// Always-injected structs (§3).
pub fn default_structs() -> Vec<StructDef> {
    vec![
        StructDef {
            name: "asset".to_string(),
            base: None,
            fields: vec![
                FieldDef { name: "amount".to_string(), type_expr: "int64".to_string() },
                FieldDef { name: "symbol".to_string(), type_expr: "symbol".to_string() },
            ],
        },
        StructDef {
            name: "extended_asset".to_string(),
            base: None,
            fields: vec![
                FieldDef { name: "quantity".to_string(), type_expr: "asset".to_string() },
                FieldDef { name: "contract".to_string(), type_expr: "name".to_string() },
            ],
        },
    ]
}
