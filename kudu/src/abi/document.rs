//! 4.B ABI Parser: both document shapes (contract ABI and streaming ABI) are decoded into
//! one common `AbiDocument` record before anything downstream sees them (§9 "Protocol-oriented
//! ABI view"). Grounded on `antelope-abi/src/abidefinition.rs`'s `ABIDefinition`, generalized
//! to also carry the streaming shape and to validate every identifier it accepts (§4.A).

use serde::{Deserialize, Serialize};

use crate::abi::typeexpr::is_trailing_extension;
use crate::abi::validator::{valid_ident, valid_type_expr};
use crate::error::ParseError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default, rename = "types")]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub target: String,
}

// Supplemental sections (§3.B): carried through for round-trip fidelity, not consumed
// by the Resolver, Codec, or the ABI content hash (I5).

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RicardianClause {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error_code: u64,
    pub error_msg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

/// Permissive enough to parse either the contract-ABI or the streaming-ABI table record
/// shape: every field but `name` defaults to empty, so whichever of the two the source
/// document uses, the fields it omits simply come back empty rather than failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: String,
    pub result_type: String,
}

/// The common record both ABI document shapes are normalized into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbiDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "types")]
    pub aliases: Vec<AliasDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub variants: Vec<VariantDef>,

    #[serde(default)]
    pub ricardian_clauses: Vec<RicardianClause>,
    #[serde(default)]
    pub error_messages: Vec<ErrorMessage>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
    #[serde(default)]
    pub abi_extensions: serde_json::Value,
}

impl AbiDocument {
    fn validate_names(&self) -> Result<(), ParseError> {
        for a in &self.aliases {
            valid_ident(&a.new_type_name)?;
            valid_type_expr(&a.target)?;
        }
        for s in &self.structs {
            valid_ident(&s.name)?;
            if let Some(base) = &s.base {
                if !base.is_empty() {
                    valid_ident(base)?;
                }
            }
            let mut seen_extension = false;
            for f in &s.fields {
                valid_ident(&f.name)?;
                valid_type_expr(&f.type_expr)?;
                let is_extension = is_trailing_extension(&f.type_expr);
                if seen_extension && !is_extension {
                    return Err(ParseError::NonTrailingExtensionField {
                        struct_name: s.name.clone(),
                        field_name: f.name.clone(),
                    });
                }
                seen_extension |= is_extension;
            }
        }
        for v in &self.variants {
            valid_ident(&v.name)?;
            if v.members.is_empty() {
                return Err(ParseError::EmptyVariant { name: v.name.clone() });
            }
            for m in &v.members {
                valid_type_expr(m)?;
            }
        }
        Ok(())
    }

    /// Parse the "contract ABI" shape: `{ version, types[], structs[], variants[]?,
    /// actions[]?, tables[]?, ricardian_clauses[]?, error_messages[]?, action_results[]?,
    /// abi_extensions[]? }`.
    pub fn parse_contract_abi(json: &str) -> Result<Self, ParseError> {
        let doc: AbiDocument =
            serde_json::from_str(json).map_err(|source| ParseError::MalformedAbi { source })?;
        doc.validate_names()?;
        Ok(doc)
    }

    /// Parse the "streaming ABI" shape: `{ version, structs[], types[], variants[]?,
    /// tables[]? }`. JSON object key order never affects `serde`'s field matching, and the
    /// `Table` record above already tolerates the streaming shape's leaner table records, so
    /// the same underlying deserialization handles both; this entry point exists so callers
    /// name the shape they have, matching the two-parsers-one-ABIView design (§9).
    pub fn parse_streaming_abi(json: &str) -> Result<Self, ParseError> {
        Self::parse_contract_abi(json)
    }
}
