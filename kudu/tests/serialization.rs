//! End-to-end coverage of the full pipeline: parse an ABI document, build a `Context`,
//! specialize it into an `Artifact`, and pack/unpack values through it, exercising the
//! on-disk cache along the way.

use indexmap::IndexMap;

use kudu::abi::{json_to_value, value_to_json, AbiDocument};
use kudu::config::BuildParams;
use kudu::{ABIView, Context, Value};

const TOKEN_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "types": [],
    "structs": [
        {
            "name": "transfer",
            "base": "",
            "fields": [
                {"name": "from", "type": "name"},
                {"name": "to", "type": "name"},
                {"name": "quantity", "type": "asset"},
                {"name": "memo", "type": "string"}
            ]
        },
        {
            "name": "account",
            "base": "",
            "fields": [
                {"name": "balance", "type": "asset"}
            ]
        }
    ],
    "variants": [
        {"name": "any_event", "types": ["transfer", "account"]}
    ]
}"#;

#[test]
fn context_builds_and_reuses_an_artifact_for_a_real_contract_abi() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();

    let (key1, artifact1) = ctx.module_for_abi("eosio.token", TOKEN_ABI, false, BuildParams::default()).unwrap();
    let (key2, artifact2) = ctx.module_for_abi("eosio.token", TOKEN_ABI, false, BuildParams::default()).unwrap();
    assert_eq!(key1, key2);
    assert!(std::sync::Arc::ptr_eq(&artifact1, &artifact2));
    assert!(artifact1.dispatchable_names().contains(&"transfer"));
}

#[test]
fn transfer_struct_round_trips_through_pack_and_unpack() {
    let doc = AbiDocument::parse_contract_abi(TOKEN_ABI).unwrap();
    let view = ABIView::from_document(&doc).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();
    let (_key, artifact) = ctx.module_for_abi("eosio.token", &doc, false, BuildParams::default()).unwrap();

    let mut fields = IndexMap::new();
    fields.insert("from".to_string(), Value::Uint(1));
    fields.insert("to".to_string(), Value::Uint(2));
    fields.insert(
        "quantity".to_string(),
        Value::Map(IndexMap::from([
            ("amount".to_string(), Value::Int(10_000)),
            ("symbol".to_string(), Value::Uint(1398362412)),
        ])),
    );
    fields.insert("memo".to_string(), Value::String("hi".to_string()));
    let value = Value::Map(fields);

    let bytes = artifact.pack(&view, "transfer", &value).unwrap();
    let decoded = artifact.unpack(&view, "transfer", &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn variant_tagged_with_struct_member_round_trips() {
    let doc = AbiDocument::parse_contract_abi(TOKEN_ABI).unwrap();
    let view = ABIView::from_document(&doc).unwrap();
    let artifact = kudu::Artifact::build(&view, BuildParams::default()).unwrap();

    let mut payload = IndexMap::new();
    payload.insert("type".to_string(), Value::String("account".to_string()));
    payload.insert(
        "balance".to_string(),
        Value::Map(IndexMap::from([
            ("amount".to_string(), Value::Int(500)),
            ("symbol".to_string(), Value::Uint(1398362412)),
        ])),
    );
    let value = Value::Map(payload);

    let bytes = artifact.pack(&view, "any_event", &value).unwrap();
    let decoded = artifact.unpack(&view, "any_event", &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn json_bridge_round_trips_bytes_and_struct_fields() {
    let doc = AbiDocument::parse_contract_abi(TOKEN_ABI).unwrap();
    let view = ABIView::from_document(&doc).unwrap();

    let json: serde_json::Value = serde_json::json!({
        "from": 1,
        "to": 2,
        "quantity": {"amount": 10000, "symbol": 1398362412},
        "memo": "hello"
    });
    let value = json_to_value(&view, "transfer", &json).unwrap();
    let back = value_to_json(&view, "transfer", &value).unwrap();
    assert_eq!(back, json);
}

#[test]
fn cache_survives_process_restart_for_the_same_abi() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();
        ctx.module_for_abi("eosio.token", TOKEN_ABI, false, BuildParams::default()).unwrap();
    }

    let mut readonly = Context::new(Some(dir.path().to_path_buf()), true).unwrap();
    let (_key, artifact) = readonly.module_for_abi("eosio.token", TOKEN_ABI, false, BuildParams::default()).unwrap();
    assert!(artifact.dispatchable_names().contains(&"account"));
}
