//! Type-expression lexing: peeling trailing modifiers and recognizing `raw(N)` (§3, §4.C step 1-2).
//!
//! Grounded on `antelope-abi/src/typenameref.rs`'s `TypeNameRef` (`is_array`/`is_optional`/
//! `fundamental_type`), generalized to strip a whole run of modifiers at once instead of one
//! at a time, and to reject fixed-size array syntax (`T[N]`) rather than silently accepting it.

use serde::{Deserialize, Serialize};

use crate::error::ValidatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Array,
    Optional,
    Extension,
}

/// The result of peeling all trailing modifiers off a type expression.
///
/// `modifiers` is ordered outer -> inner: the first entry is the wrapper applied last when
/// encoding a value (e.g. for `"uint32[]?"`, `modifiers == [Optional, Array]` and `base ==
/// "uint32"`: an optional array of uint32, matching the usual ABI reading of a trailing `?`
/// as describing the type expression as a whole).
#[derive(Debug, Clone)]
pub struct PeeledType<'a> {
    pub base: &'a str,
    pub modifiers: Vec<Modifier>,
}

/// Split off the digit run inside a trailing `[N]` (fixed-size array, explicitly unsupported).
fn trailing_fixed_array_len(s: &str) -> Option<&str> {
    if !s.ends_with(']') {
        return None;
    }
    let open = s.rfind('[')?;
    let digits = &s[open + 1..s.len() - 1];
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

pub fn peel_modifiers(expr: &str) -> Result<PeeledType<'_>, ValidatorError> {
    let mut remainder = expr;
    let mut modifiers = Vec::new();

    loop {
        if let Some(rest) = remainder.strip_suffix("[]") {
            modifiers.push(Modifier::Array);
            remainder = rest;
            continue;
        }
        if let Some(rest) = remainder.strip_suffix('?') {
            modifiers.push(Modifier::Optional);
            remainder = rest;
            continue;
        }
        if let Some(rest) = remainder.strip_suffix('$') {
            modifiers.push(Modifier::Extension);
            remainder = rest;
            continue;
        }
        if trailing_fixed_array_len(remainder).is_some() {
            return Err(ValidatorError::FixedSizeArray { expr: expr.to_string() });
        }
        break;
    }

    Ok(PeeledType { base: remainder, modifiers })
}

/// Whether a type expression's outermost modifier is the trailing binary-extension marker
/// `$` (I3). A type expression that fails to parse is reported by `valid_type_expr` instead,
/// so it is treated as "not an extension" here.
pub fn is_trailing_extension(type_expr: &str) -> bool {
    match peel_modifiers(type_expr) {
        Ok(peeled) => matches!(peeled.modifiers.first(), Some(Modifier::Extension)),
        Err(_) => false,
    }
}

/// Recognize the synthetic `raw(N)` type expression, returning `N`.
pub fn parse_raw(base: &str) -> Option<usize> {
    let inner = base.strip_prefix("raw(")?.strip_suffix(')')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}
