//! `ABIView`: the immutable, resolved bundle every downstream component consumes (§3, §9
//! "Protocol-oriented ABI view"). Construction merges the built-in tables (§3) with a parsed
//! `AbiDocument`, rejecting duplicate names the way `antelope/src/abi/abi.rs`'s `set_abi` does
//! with `ensure!`, and computes the I5 content hash.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::abi::builtins::{default_aliases, default_structs, STD_TYPES};
use crate::abi::document::{AbiDocument, StructDef, VariantDef};
use crate::abi::typeexpr::is_trailing_extension;
use crate::error::ResolverError;

#[derive(Debug, Clone)]
pub struct ABIView {
    pub alias_map: IndexMap<String, String>,
    pub struct_map: IndexMap<String, StructDef>,
    pub variant_map: IndexMap<String, VariantDef>,
    content_hash: [u8; 32],
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl ABIView {
    pub fn from_document(doc: &AbiDocument) -> Result<Self, ResolverError> {
        let mut alias_map = IndexMap::new();
        let mut struct_map = IndexMap::new();
        let mut variant_map = IndexMap::new();

        for alias in default_aliases().into_iter().chain(doc.aliases.iter().map(|a| {
            crate::abi::document::AliasDef {
                new_type_name: a.new_type_name.clone(),
                target: a.target.clone(),
            }
        })) {
            if alias_map.insert(alias.new_type_name.clone(), alias.target).is_some() {
                return Err(ResolverError::DuplicateName { kind: "alias", name: alias.new_type_name });
            }
        }

        for s in default_structs().into_iter().chain(doc.structs.iter().cloned()) {
            let mut seen_extension = false;
            for f in &s.fields {
                let is_extension = is_trailing_extension(&f.type_expr);
                if seen_extension && !is_extension {
                    return Err(ResolverError::NonTrailingExtensionField {
                        struct_name: s.name.clone(),
                        field_name: f.name.clone(),
                    });
                }
                seen_extension |= is_extension;
            }
            if struct_map.insert(s.name.clone(), s.clone()).is_some() {
                return Err(ResolverError::DuplicateName { kind: "struct", name: s.name });
            }
        }

        for v in doc.variants.iter().cloned() {
            if v.members.is_empty() {
                return Err(ResolverError::EmptyVariant { name: v.name });
            }
            if variant_map.insert(v.name.clone(), v.clone()).is_some() {
                return Err(ResolverError::DuplicateName { kind: "variant", name: v.name });
            }
        }

        let content_hash = compute_content_hash(&struct_map, &variant_map, &alias_map);

        Ok(Self { alias_map, struct_map, variant_map, content_hash })
    }

    /// I5 content hash: depends only on the ordered triple `(structs, variants, aliases)`.
    pub fn content_hash(&self) -> [u8; 32] {
        self.content_hash
    }

    pub fn is_std_type(&self, name: &str) -> bool {
        STD_TYPES.contains(&name)
    }

    /// Every name known to this view: used to build the "known names" diagnostic of
    /// `UnknownType` (§7).
    pub fn valid_names(&self) -> Vec<String> {
        let mut names: Vec<String> = STD_TYPES.iter().map(|s| s.to_string()).collect();
        names.extend(self.alias_map.keys().cloned());
        names.extend(self.struct_map.keys().cloned());
        names.extend(self.variant_map.keys().cloned());
        names
    }
}

fn compute_content_hash(
    struct_map: &IndexMap<String, StructDef>,
    variant_map: &IndexMap<String, VariantDef>,
    alias_map: &IndexMap<String, String>,
) -> [u8; 32] {
    let mut hasher = Sha256::new();

    hasher.update((struct_map.len() as u64).to_le_bytes());
    for (name, s) in struct_map {
        hash_str(&mut hasher, name);
        hash_str(&mut hasher, s.base.as_deref().unwrap_or(""));
        hasher.update((s.fields.len() as u64).to_le_bytes());
        for f in &s.fields {
            hash_str(&mut hasher, &f.name);
            hash_str(&mut hasher, &f.type_expr);
        }
    }

    hasher.update((variant_map.len() as u64).to_le_bytes());
    for (name, v) in variant_map {
        hash_str(&mut hasher, name);
        hasher.update((v.members.len() as u64).to_le_bytes());
        for m in &v.members {
            hash_str(&mut hasher, m);
        }
    }

    hasher.update((alias_map.len() as u64).to_le_bytes());
    for (name, target) in alias_map {
        hash_str(&mut hasher, name);
        hash_str(&mut hasher, target);
    }

    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::document::FieldDef;

    #[test]
    fn whitespace_does_not_affect_content_hash() {
        let compact = r#"{"version":"eosio::abi/1.2","types":[],"structs":[{"name":"foo","fields":[{"name":"a","type":"uint32"}]}]}"#;
        let spaced = "{\n  \"version\": \"eosio::abi/1.2\",\n  \"types\": [],\n  \"structs\": [\n    { \"name\": \"foo\", \"fields\": [ { \"name\": \"a\", \"type\": \"uint32\" } ] }\n  ]\n}";
        let a = ABIView::from_document(&AbiDocument::parse_contract_abi(compact).unwrap()).unwrap();
        let b = ABIView::from_document(&AbiDocument::parse_contract_abi(spaced).unwrap()).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn different_field_type_changes_hash() {
        let a = r#"{"version":"v","types":[],"structs":[{"name":"foo","fields":[{"name":"a","type":"uint32"}]}]}"#;
        let b = r#"{"version":"v","types":[],"structs":[{"name":"foo","fields":[{"name":"a","type":"uint64"}]}]}"#;
        let va = ABIView::from_document(&AbiDocument::parse_contract_abi(a).unwrap()).unwrap();
        let vb = ABIView::from_document(&AbiDocument::parse_contract_abi(b).unwrap()).unwrap();
        assert_ne!(va.content_hash(), vb.content_hash());
    }

    #[test]
    fn duplicate_struct_name_rejected() {
        let json = r#"{"version":"v","types":[],"structs":[
            {"name":"asset","fields":[{"name":"x","type":"uint32"}]}
        ]}"#;
        let doc = AbiDocument::parse_contract_abi(json).unwrap();
        assert!(ABIView::from_document(&doc).is_err());
    }

    #[test]
    fn non_trailing_extension_field_rejected_even_when_built_by_hand() {
        // bypasses `AbiDocument::parse_contract_abi`'s own I3 check entirely, to make sure
        // `from_document` enforces it independently of the parser.
        let doc = AbiDocument {
            structs: vec![StructDef {
                name: "bad".to_string(),
                base: None,
                fields: vec![
                    FieldDef { name: "a".to_string(), type_expr: "uint32$".to_string() },
                    FieldDef { name: "b".to_string(), type_expr: "uint32".to_string() },
                ],
            }],
            ..Default::default()
        };
        let err = ABIView::from_document(&doc).unwrap_err();
        assert!(matches!(err, ResolverError::NonTrailingExtensionField { .. }));
    }

    #[test]
    fn empty_variant_rejected_even_when_built_by_hand() {
        let doc = AbiDocument {
            variants: vec![VariantDef { name: "empty".to_string(), members: vec![] }],
            ..Default::default()
        };
        let err = ABIView::from_document(&doc).unwrap_err();
        assert!(matches!(err, ResolverError::EmptyVariant { .. }));
    }
}
