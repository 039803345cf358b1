//! 4.A Name/Type Validator: two pure, total predicates gating every name the Parser
//! hands downstream (the injection barrier mentioned in §4.A).
//!
//! Grounded on `original_source/src/jitabi/sanitize.py`'s `_ID_PATTERN`/`_TYPE_PATTERN`
//! and `check_ident`/`check_type`. The corpus has no direct precedent for hand-scanning a
//! regex-shaped grammar instead of depending on the `regex` crate (only the CLI/dune tooling
//! crates pull in `regex`, never the core ABI crates), so these are small hand-written
//! character scanners instead - consistent with the core ABI crates never depending on
//! `regex` for anything.

use crate::abi::typeexpr::peel_modifiers;
use crate::error::ValidatorError;

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn valid_ident(s: &str) -> Result<(), ValidatorError> {
    let bytes = s.as_bytes();
    let ok = matches!(bytes.first(), Some(&b) if is_ident_start(b))
        && bytes[1..].iter().all(|&b| is_ident_cont(b));
    if ok {
        Ok(())
    } else {
        Err(ValidatorError::InvalidName { name: s.to_string() })
    }
}

/// An identifier, or the synthetic `raw(N)` form, optionally followed by any sequence of
/// the trailing modifier tokens `[]`, `?`, `$`. Fixed-size array syntax is rejected.
pub fn valid_type_expr(s: &str) -> Result<(), ValidatorError> {
    let peeled = peel_modifiers(s)?;

    if crate::abi::typeexpr::parse_raw(peeled.base).is_some() {
        return Ok(());
    }
    valid_ident(peeled.base).map_err(|_| ValidatorError::InvalidTypeExpr { expr: s.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents() {
        assert!(valid_ident("name").is_ok());
        assert!(valid_ident("_private").is_ok());
        assert!(valid_ident("a1_b2").is_ok());
        assert!(valid_ident("1abc").is_err());
        assert!(valid_ident("").is_err());
        assert!(valid_ident("has space").is_err());
    }

    #[test]
    fn type_exprs() {
        assert!(valid_type_expr("uint32").is_ok());
        assert!(valid_type_expr("uint32[]").is_ok());
        assert!(valid_type_expr("uint32?").is_ok());
        assert!(valid_type_expr("uint32$").is_ok());
        assert!(valid_type_expr("uint32[]?").is_ok());
        assert!(valid_type_expr("raw(20)").is_ok());
        assert!(valid_type_expr("raw(20)[]").is_ok());
        assert!(valid_type_expr("uint32[4]").is_err());
        assert!(valid_type_expr("9bad").is_err());
    }
}
