//! 4.F Artifact Cache: content-addressed, on-disk, multi-process-safe storage for
//! specialized [`Artifact`]s.
//!
//! Grounded on `original_source/src/jitabi/cache.py`'s `Cache` (in-memory mirror over a
//! `<root>/<module_name>/<src_hash>/` layout, warm-start from disk, `get_module`/`set_abi_source`
//! style operations), generalized from "C source + compiled `.so`" to "nothing + a bincode
//! artifact dump" for the interpretive backend, and from single-process-trusting to
//! cross-process-safe via `fd-lock` (§4.F "Locking").

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::abi::view::ABIView;
use crate::config::BuildParams;
use crate::error::CacheError;
use crate::specializer::{pipeline_version_digest, Artifact};

/// Identifies one cached artifact: the (versioned) logical name, its fingerprint, and the
/// parameters it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub logical_name: String,
    pub fingerprint: String,
    pub params: BuildParams,
}

impl std::hash::Hash for BuildParams {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical_bytes().hash(state)
    }
}

/// The 256-bit fingerprint (§4.F): pipeline version digest, ABI content hash (I5), and the
/// canonical build-parameter bytes, concatenated in that order and hashed once.
pub fn fingerprint(view: &ABIView, params: BuildParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pipeline_version_digest());
    hasher.update(view.content_hash());
    hasher.update(params.canonical_bytes());
    hex::encode(hasher.finalize())
}

pub struct Cache {
    root: PathBuf,
    readonly: bool,
    artifacts: HashMap<CacheKey, std::sync::Arc<Artifact>>,
}

impl Cache {
    pub fn new(root: PathBuf, readonly: bool) -> Result<Self, CacheError> {
        fs::create_dir_all(&root).map_err(|source| CacheError::Io { path: root.display().to_string(), source })?;
        let mut cache = Self { root, readonly, artifacts: HashMap::new() };
        cache.warm_from_disk();
        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Iterate every `<root>/<logical_name>/<fingerprint>/` directory and parse its
    /// `params.json`, just to surface warnings for entries that won't be loadable later.
    /// Deliberately does *not* read or deserialize `artifact.bin`: `get_artifact` derives a
    /// key's directory directly from the key itself (§4.F "Warm-start" calls for lazily
    /// registering on-disk artifacts, not eagerly loading them), so this pass only validates
    /// that a `.bin` file is present. Malformed entries are skipped with a warning - never
    /// deleted.
    fn warm_from_disk(&mut self) {
        let Ok(logical_dirs) = fs::read_dir(&self.root) else { return };
        for logical_dir in logical_dirs.flatten() {
            if !logical_dir.path().is_dir() {
                continue;
            }
            let logical_name = logical_dir.file_name().to_string_lossy().into_owned();

            let Ok(fingerprint_dirs) = fs::read_dir(logical_dir.path()) else { continue };
            for fp_dir in fingerprint_dirs.flatten() {
                let dir = fp_dir.path();
                if !dir.is_dir() {
                    continue;
                }
                let fingerprint = fp_dir.file_name().to_string_lossy().into_owned();

                if let Err(e) = read_params(&dir) {
                    warn!("skipping cache entry {logical_name}/{fingerprint}: {e}");
                    continue;
                }

                if !has_artifact_file(&dir) {
                    warn!("skipping cache entry {logical_name}/{fingerprint}: no artifact file");
                }
            }
        }
    }

    pub fn module_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(&key.logical_name).join(&key.fingerprint)
    }

    /// Run `f` while holding an advisory lock on `dir`'s `.lock` file: `shared = false` takes
    /// an exclusive (writer) lock, `shared = true` a shared (reader) lock. Modeled as a scoped
    /// call rather than a returned guard (the `with self._cache.dir_lock(...):` pattern of the
    /// Python source) since `fd_lock`'s guard borrows the `RwLock` it came from, and that
    /// `RwLock` would otherwise need to outlive the call in a way the borrow checker can't see
    /// through a plain return value.
    pub fn dir_lock<T>(&self, dir: &Path, shared: bool, f: impl FnOnce() -> T) -> Result<T, CacheError> {
        fs::create_dir_all(dir).map_err(|source| CacheError::Io { path: dir.display().to_string(), source })?;
        let lock_path = dir.join(".lock");
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .read(true)
            .open(&lock_path)
            .map_err(|source| CacheError::Io { path: lock_path.display().to_string(), source })?;
        let mut lock = RwLock::new(file);
        if shared {
            let _guard: RwLockReadGuard<'_, fs::File> = lock
                .read()
                .map_err(|source| CacheError::Io { path: lock_path.display().to_string(), source })?;
            Ok(f())
        } else {
            let _guard: RwLockWriteGuard<'_, fs::File> = lock
                .write()
                .map_err(|source| CacheError::Io { path: lock_path.display().to_string(), source })?;
            Ok(f())
        }
    }

    /// In-memory hit first; on a miss, attempt a disk load under a shared lock (§4.F
    /// "Locking", §5's reader/writer ordering). Only the first load per process per key pays
    /// the deserialization cost - after that it's served from `self.artifacts`. A directory
    /// that doesn't exist yet is a plain cache miss and never taken to lock, so a reader never
    /// creates an empty directory for a key nobody has built.
    pub fn get_artifact(&mut self, key: &CacheKey) -> Option<std::sync::Arc<Artifact>> {
        if let Some(artifact) = self.artifacts.get(key) {
            return Some(artifact.clone());
        }

        let dir = self.module_dir(key);
        if !dir.is_dir() {
            return None;
        }

        let load = self.dir_lock(&dir, true, || read_artifact_file(&dir));
        let artifact = match load {
            Ok(Ok(Some(artifact))) => artifact,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                warn!("failed to load cache entry {}/{}: {e}", key.logical_name, key.fingerprint);
                return None;
            }
            Err(e) => {
                warn!("failed to lock cache entry {}/{}: {e}", key.logical_name, key.fingerprint);
                return None;
            }
        };

        let artifact = std::sync::Arc::new(artifact);
        self.artifacts.insert(key.clone(), artifact.clone());
        Some(artifact)
    }

    /// Persist `artifact` under `key`'s directory via a temp-dir-then-atomic-rename write, so
    /// a crash mid-write never leaves a partially written artifact visible to another process
    /// (§5, §8 "Concurrent build safety").
    pub fn set_artifact(&mut self, key: &CacheKey, artifact: Artifact) -> Result<(), CacheError> {
        if self.readonly {
            return Err(CacheError::Readonly { logical_name: key.logical_name.clone() });
        }

        let dir = self.module_dir(key);
        let root = self.root.clone();
        let write_result: Result<(), CacheError> = self.dir_lock(&dir, false, || {
            let tmp_dir = root.join(format!(".tmp-{}-{}", key.logical_name, key.fingerprint));
            fs::create_dir_all(&tmp_dir).map_err(|source| CacheError::Io { path: tmp_dir.display().to_string(), source })?;

            let params_path = tmp_dir.join("params.json");
            let params_json = serde_json::to_string(&key.params).expect("BuildParams always serializes");
            fs::write(&params_path, params_json).map_err(|source| CacheError::Io { path: params_path.display().to_string(), source })?;

            let artifact_path = tmp_dir.join(format!("{}.bin", key.logical_name));
            let bytes = bincode::serialize(&artifact).map_err(|source| CacheError::Serde { path: artifact_path.display().to_string(), source })?;
            fs::write(&artifact_path, &bytes).map_err(|source| CacheError::Io { path: artifact_path.display().to_string(), source })?;

            fs::create_dir_all(&dir).map_err(|source| CacheError::Io { path: dir.display().to_string(), source })?;
            for entry in fs::read_dir(&tmp_dir).map_err(|source| CacheError::Io { path: tmp_dir.display().to_string(), source })? {
                let entry = entry.map_err(|source| CacheError::Io { path: tmp_dir.display().to_string(), source })?;
                let dest = dir.join(entry.file_name());
                fs::rename(entry.path(), &dest).map_err(|source| CacheError::Io { path: dest.display().to_string(), source })?;
            }
            let _ = fs::remove_dir(&tmp_dir);
            Ok(())
        })?;
        write_result?;

        self.artifacts.insert(key.clone(), std::sync::Arc::new(artifact));
        Ok(())
    }
}

fn read_params(dir: &Path) -> Result<BuildParams, String> {
    let path = dir.join("params.json");
    let mut text = String::new();
    fs::File::open(&path)
        .map_err(|e| e.to_string())?
        .read_to_string(&mut text)
        .map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

fn has_artifact_file(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else { return false };
    entries
        .flatten()
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("bin"))
}

fn read_artifact_file(dir: &Path) -> Result<Option<Artifact>, String> {
    let entries = fs::read_dir(dir).map_err(|e| e.to_string())?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("bin") {
            let mut bytes = Vec::new();
            fs::File::open(&path).map_err(|e| e.to_string())?.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
            let artifact = bincode::deserialize(&bytes).map_err(|e| e.to_string())?;
            return Ok(Some(artifact));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::document::AbiDocument;

    fn view() -> ABIView {
        let json = r#"{"version":"v","types":[],"structs":[]}"#;
        ABIView::from_document(&AbiDocument::parse_contract_abi(json).unwrap()).unwrap()
    }

    #[test]
    fn fingerprint_stable_across_whitespace_only_differences() {
        let v = view();
        let a = fingerprint(&v, BuildParams::default());
        let b = fingerprint(&v, BuildParams::default());
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_with_build_params() {
        let v = view();
        let a = fingerprint(&v, BuildParams::default());
        let b = fingerprint(&v, BuildParams { debug: true, ..Default::default() });
        assert_ne!(a, b);
    }

    #[test]
    fn set_and_get_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::new(dir.path().to_path_buf(), false).unwrap();
        let v = view();
        let params = BuildParams::default();
        let key = CacheKey { logical_name: "mycontract_0".to_string(), fingerprint: fingerprint(&v, params), params };
        let artifact = Artifact::build(&v, params).unwrap();
        cache.set_artifact(&key, artifact).unwrap();
        assert!(cache.get_artifact(&key).is_some());

        // reopening from disk should lazily load the same entry on first access
        let mut reopened = Cache::new(dir.path().to_path_buf(), true).unwrap();
        assert!(reopened.get_artifact(&key).is_some());
    }

    #[test]
    fn get_artifact_lazily_loads_an_entry_written_after_this_process_started() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = Cache::new(dir.path().to_path_buf(), false).unwrap();
        let v = view();
        let params = BuildParams::default();
        let key = CacheKey { logical_name: "sibling_0".to_string(), fingerprint: fingerprint(&v, params), params };
        let artifact = Artifact::build(&v, params).unwrap();
        writer.set_artifact(&key, artifact).unwrap();

        // `reader` never saw the entry above: it opened before the write happened, so
        // warm-start found nothing. It should still find the artifact lazily on first access.
        let mut reader = Cache::new(dir.path().to_path_buf(), true).unwrap();
        assert!(reader.artifacts.is_empty());
        assert!(reader.get_artifact(&key).is_some());
        assert!(reader.artifacts.contains_key(&key));
    }

    #[test]
    fn readonly_cache_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::new(dir.path().to_path_buf(), true).unwrap();
        let v = view();
        let params = BuildParams::default();
        let key = CacheKey { logical_name: "foo_0".to_string(), fingerprint: fingerprint(&v, params), params };
        let artifact = Artifact::build(&v, params).unwrap();
        assert!(matches!(cache.set_artifact(&key, artifact), Err(CacheError::Readonly { .. })));
    }

    #[test]
    fn warm_start_skips_malformed_entries_without_deleting_them() {
        let dir = tempfile::tempdir().unwrap();
        let malformed = dir.path().join("broken_0").join("deadbeef");
        fs::create_dir_all(&malformed).unwrap();
        fs::write(malformed.join("params.json"), "not json").unwrap();

        let cache = Cache::new(dir.path().to_path_buf(), false).unwrap();
        assert!(cache.artifacts.is_empty());
        assert!(malformed.join("params.json").exists());
    }
}
