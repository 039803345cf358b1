//! 4.C Type Resolver: a pure function of `ABIView`, never performing I/O. Grounded on
//! `antelope/src/abi/abi.rs`'s `resolve_type` (alias-following loop) and
//! `original_source/src/jitabi/protocol.py`'s `TypeModifier`, generalized with an explicit
//! `visited` set (§9 "Alias table as a graph with forced cycle detection" - the Python
//! source's recursive approach only works because its built-in alias set happens to be
//! acyclic).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abi::typeexpr::{parse_raw, peel_modifiers, Modifier};
use crate::abi::view::ABIView;
use crate::error::ResolverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Std,
    Struct,
    Variant,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedType {
    pub original: String,
    pub base_name: String,
    /// `raw(N)`'s byte length, when `kind == Raw`.
    pub args: Option<usize>,
    /// Outer -> inner, accumulated across every alias substitution on the path to `base_name`.
    pub modifiers: Vec<Modifier>,
    pub kind: Kind,
    pub is_alias: bool,
}

impl ResolvedType {
    pub fn is_array(&self) -> bool {
        matches!(self.modifiers.first(), Some(Modifier::Array))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.modifiers.first(), Some(Modifier::Optional))
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.modifiers.first(), Some(Modifier::Extension))
    }

    /// This type with its outermost modifier stripped (the type of one element / the
    /// payload behind an optional or extension flag).
    pub fn peeled_one_level(&self) -> ResolvedType {
        ResolvedType {
            original: self.original.clone(),
            base_name: self.base_name.clone(),
            args: self.args,
            modifiers: self.modifiers[1..].to_vec(),
            kind: self.kind,
            is_alias: self.is_alias,
        }
    }
}

pub fn resolve(view: &ABIView, type_expr: &str) -> Result<ResolvedType, ResolverError> {
    let original = type_expr.to_string();
    let peeled = peel_modifiers(type_expr)?;

    let mut remainder = peeled.base.to_string();
    let mut modifiers = peeled.modifiers;
    let mut visited = vec![remainder.clone()];
    let mut is_alias = false;

    loop {
        if let Some(n) = parse_raw(&remainder) {
            return Ok(ResolvedType {
                original,
                base_name: "raw".to_string(),
                args: Some(n),
                modifiers,
                kind: Kind::Raw,
                is_alias,
            });
        }

        if let Some(target) = view.alias_map.get(&remainder) {
            is_alias = true;
            let peeled_target = peel_modifiers(target)?;
            modifiers.extend(peeled_target.modifiers);
            remainder = peeled_target.base.to_string();

            if visited.contains(&remainder) {
                visited.push(remainder.clone());
                let chain = visited.join(" -> ");
                warn!("alias cycle resolving {original:?}: {chain}");
                return Err(ResolverError::AliasCycle { name: original, chain });
            }
            visited.push(remainder.clone());
            continue;
        }

        if view.is_std_type(&remainder) {
            debug!("resolved {original:?} to std type {remainder:?}");
            return Ok(ResolvedType {
                original,
                base_name: remainder,
                args: None,
                modifiers,
                kind: Kind::Std,
                is_alias,
            });
        }

        if view.struct_map.contains_key(&remainder) {
            debug!("resolved {original:?} to struct {remainder:?}");
            return Ok(ResolvedType {
                original,
                base_name: remainder,
                args: None,
                modifiers,
                kind: Kind::Struct,
                is_alias,
            });
        }

        if view.variant_map.contains_key(&remainder) {
            debug!("resolved {original:?} to variant {remainder:?}");
            return Ok(ResolvedType {
                original,
                base_name: remainder,
                args: None,
                modifiers,
                kind: Kind::Variant,
                is_alias,
            });
        }

        warn!("unknown type {remainder:?} while resolving {original:?}");
        return Err(ResolverError::UnknownType {
            name: remainder,
            known: view.valid_names().join(", "),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::document::AbiDocument;

    fn view_with(extra_aliases: &str, extra_structs: &str) -> ABIView {
        let json = format!(
            r#"{{"version":"v","types":[{extra_aliases}],"structs":[{extra_structs}]}}"#
        );
        ABIView::from_document(&AbiDocument::parse_contract_abi(&json).unwrap()).unwrap()
    }

    #[test]
    fn resolves_builtin_alias_to_raw() {
        let view = view_with("", "");
        let r = resolve(&view, "sha256").unwrap();
        assert_eq!(r.kind, Kind::Raw);
        assert_eq!(r.args, Some(32));
        assert!(r.is_alias);
    }

    #[test]
    fn resolves_struct_and_array_modifier() {
        let view = view_with("", "");
        let r = resolve(&view, "asset[]").unwrap();
        assert_eq!(r.kind, Kind::Struct);
        assert_eq!(r.base_name, "asset");
        assert!(r.is_array());
    }

    #[test]
    fn detects_alias_cycle() {
        let view = view_with(
            r#"{"new_type_name":"a","type":"b"},{"new_type_name":"b","type":"a"}"#,
            "",
        );
        let err = resolve(&view, "a").unwrap_err();
        assert!(matches!(err, ResolverError::AliasCycle { .. }));
    }

    #[test]
    fn unknown_type_reports_known_names() {
        let view = view_with("", "");
        let err = resolve(&view, "not_a_type").unwrap_err();
        match err {
            ResolverError::UnknownType { name, known } => {
                assert_eq!(name, "not_a_type");
                assert!(known.contains("uint32"));
            }
            _ => panic!("expected UnknownType"),
        }
    }

    #[test]
    fn resolver_is_idempotent() {
        let view = view_with("", "");
        let r1 = resolve(&view, "symbol?").unwrap();
        let r2 = resolve(&view, &r1.original).unwrap();
        assert_eq!(r1, r2);
    }
}
