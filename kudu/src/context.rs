//! 4.G Context Façade: the one entry point most callers need, composing
//! Parse → Resolve → Specialize → Cache behind a single [`module_for_abi`].
//!
//! [`module_for_abi`]: Context::module_for_abi
//!
//! Grounded on `original_source/src/jitabi/__init__.py`'s `JITContext` (`_full_mod_name`,
//! `hash_abi_for_cache`, `module_for_abi`), generalized from "compile a C extension" to
//! "build an interpretive `Artifact`" and from a single global cache instance to an owned
//! `Cache` so a process can run more than one `Context` against different roots (e.g. one
//! readonly, one not, in tests).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::abi::document::AbiDocument;
use crate::abi::view::ABIView;
use crate::cache::{fingerprint, Cache, CacheKey};
use crate::config::{default_cache_dir, BuildParams};
use crate::error::ContextError;
use crate::specializer::Artifact;

/// Either an already-parsed ABI document or its source JSON text, so callers that already
/// have an `ABIView` don't pay a re-parse (§4.G "Cross-implementation reuse").
pub enum AbiSource<'a> {
    Json(&'a str),
    Document(&'a AbiDocument),
    View(ABIView),
}

impl<'a> AbiSource<'a> {
    fn into_view(self) -> Result<ABIView, ContextError> {
        match self {
            AbiSource::Json(text) => {
                let doc = AbiDocument::parse_contract_abi(text)?;
                Ok(ABIView::from_document(&doc)?)
            }
            AbiSource::Document(doc) => Ok(ABIView::from_document(doc)?),
            AbiSource::View(view) => Ok(view),
        }
    }
}

impl<'a> From<&'a str> for AbiSource<'a> {
    fn from(text: &'a str) -> Self {
        AbiSource::Json(text)
    }
}

impl<'a> From<&'a AbiDocument> for AbiSource<'a> {
    fn from(doc: &'a AbiDocument) -> Self {
        AbiSource::Document(doc)
    }
}

impl From<ABIView> for AbiSource<'static> {
    fn from(view: ABIView) -> Self {
        AbiSource::View(view)
    }
}

pub struct Context {
    cache: Cache,
    versions: HashMap<String, u32>,
}

impl Context {
    pub fn new(cache_root: Option<PathBuf>, readonly: bool) -> Result<Self, ContextError> {
        let root = cache_root.unwrap_or_else(default_cache_dir);
        let cache = Cache::new(root, readonly)?;
        info!("initialized Context with cache at {}", cache.root().display());
        Ok(Self { cache, versions: HashMap::new() })
    }

    pub fn is_readonly(&self) -> bool {
        self.cache.is_readonly()
    }

    fn full_logical_name(&mut self, name: &str) -> String {
        let sanitized = name.replace('.', "_");
        let version = *self.versions.entry(sanitized.clone()).or_insert(0);
        format!("{sanitized}_{version}")
    }

    fn bump_version(&mut self, name: &str) {
        let sanitized = name.replace('.', "_");
        *self.versions.entry(sanitized).or_insert(0) += 1;
    }

    /// Return a specialized [`Artifact`] for `abi`, building (and persisting) it if this is
    /// the first time this process has seen this `(logical_name, fingerprint, params)` triple.
    ///
    /// `force_reload` bumps this logical name's version, forcing a fresh fingerprint lookup
    /// (and, on a cache miss, a fresh build) even if an artifact is already cached on disk
    /// (§4.F "Logical-name versioning").
    pub fn module_for_abi<'a>(
        &mut self,
        name: &str,
        abi: impl Into<AbiSource<'a>>,
        force_reload: bool,
        params: BuildParams,
    ) -> Result<(CacheKey, Arc<Artifact>), ContextError> {
        let view = abi.into().into_view()?;

        if force_reload {
            self.bump_version(name);
        }
        let logical_name = self.full_logical_name(name);
        let fp = fingerprint(&view, params);
        let key = CacheKey { logical_name: logical_name.clone(), fingerprint: fp, params };

        debug!("requesting module for {}/{}", key.logical_name, key.fingerprint);

        if !force_reload {
            if let Some(artifact) = self.cache.get_artifact(&key) {
                debug!("using cached artifact for {}/{}", key.logical_name, key.fingerprint);
                return Ok((key, artifact));
            }
        }

        if self.cache.is_readonly() {
            return Err(crate::error::CacheError::CacheMiss { logical_name: key.logical_name.clone() }.into());
        }

        info!("building new artifact for {}/{}", key.logical_name, key.fingerprint);
        let artifact = Artifact::build(&view, params)?;
        self.cache.set_artifact(&key, artifact)?;
        let artifact = self.cache.get_artifact(&key).expect("just inserted");

        Ok((key, artifact))
    }

    pub fn module_dir(&self, key: &CacheKey) -> PathBuf {
        self.cache.module_dir(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABI: &str = r#"{"version":"v","types":[],"structs":[
        {"name":"transfer","fields":[{"name":"amount","type":"uint64"}]}
    ]}"#;

    #[test]
    fn module_for_abi_builds_then_reuses_cached_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();

        let (key1, artifact1) = ctx.module_for_abi("mycontract", ABI, false, BuildParams::default()).unwrap();
        let (key2, artifact2) = ctx.module_for_abi("mycontract", ABI, false, BuildParams::default()).unwrap();

        assert_eq!(key1, key2);
        assert!(Arc::ptr_eq(&artifact1, &artifact2));
    }

    #[test]
    fn force_reload_bumps_logical_name_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();

        let (key1, _) = ctx.module_for_abi("mycontract", ABI, false, BuildParams::default()).unwrap();
        let (key2, _) = ctx.module_for_abi("mycontract", ABI, true, BuildParams::default()).unwrap();

        assert_ne!(key1.logical_name, key2.logical_name);
        assert_eq!(key1.fingerprint, key2.fingerprint);
    }

    #[test]
    fn readonly_context_reports_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut ctx = Context::new(Some(dir.path().to_path_buf()), false).unwrap();
            ctx.module_for_abi("mycontract", ABI, false, BuildParams::default()).unwrap();
        }

        let mut readonly = Context::new(Some(dir.path().to_path_buf()), true).unwrap();
        // same process never saw "othercontract" before, and this context can't build it
        let err = readonly.module_for_abi("othercontract", ABI, false, BuildParams::default());
        assert!(err.is_err());
    }
}
