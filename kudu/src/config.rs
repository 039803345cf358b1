//! Cache-root and build-parameter defaults (§1.B, §6).
//!
//! The only environment input recognized anywhere in this crate is the cache-root
//! override; everything else is a constructor argument, matching the host library's
//! own preference for explicit arguments over ambient environment state (its one use
//! of `env::var` is `kudune/src/main.rs` reading `HOME` to locate a directory, the same
//! pattern followed here).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the environment variable that overrides the default cache root.
pub const CACHE_DIR_ENV_VAR: &str = "KUDU_ABI_CACHE_DIR";

/// Default cache root: `~/.jitabi`, matching the pipeline this system specializes.
pub fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV_VAR) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".jitabi")
}

/// Build parameters (§6): recognized options that participate in the cache fingerprint.
///
/// Closed over exactly `{with_pack, with_unpack, debug}` per the "open question" decision
/// in `DESIGN.md` — this backend has no `inlined` flag to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildParams {
    pub with_pack: bool,
    pub with_unpack: bool,
    pub debug: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self { with_pack: true, with_unpack: true, debug: false }
    }
}

impl BuildParams {
    /// Canonical byte encoding used as the third fingerprint component (§4.F).
    /// A fixed three-bit field so that JSON whitespace or key order can never
    /// affect the hash, even though `params.json` itself is written as JSON.
    pub fn canonical_bytes(&self) -> [u8; 1] {
        let mut bits = 0u8;
        if self.with_pack { bits |= 0b001; }
        if self.with_unpack { bits |= 0b010; }
        if self.debug { bits |= 0b100; }
        [bits]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_distinguish_params() {
        let a = BuildParams { with_pack: true, with_unpack: true, debug: false };
        let b = BuildParams { with_pack: true, with_unpack: true, debug: true };
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn default_cache_dir_respects_env_override() {
        std::env::set_var(CACHE_DIR_ENV_VAR, "/tmp/kudu-test-cache-override");
        assert_eq!(default_cache_dir(), PathBuf::from("/tmp/kudu-test-cache-override"));
        std::env::remove_var(CACHE_DIR_ENV_VAR);
    }
}
