//! Backing stores for the geometry cache.
//!
//! A store keeps opaque payload bytes plus a small metadata record per
//! digest. It knows nothing about sizes or eviction; [`super::GeometryCache`]
//! owns that bookkeeping and serializes every call into the store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::digest::ContentDigest;

const PAYLOAD_EXTENSION: &str = "bin";
const META_EXTENSION: &str = "json";

/// Per-entry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub digest: ContentDigest,
    /// Name the file was first uploaded under.
    pub file_name: String,
    /// Size of the original file, counted against the cache budget.
    pub byte_size: u64,
    /// Unix milliseconds of the last put or hit.
    pub last_access: u64,
}

/// A persistent key-value store addressed by content digest.
pub trait CacheStore: Send + Sync {
    /// Payload bytes, or `None` if absent.
    fn get(&self, digest: &ContentDigest) -> io::Result<Option<Vec<u8>>>;

    /// Insert or replace an entry.
    fn put(&self, meta: &EntryMeta, payload: &[u8]) -> io::Result<()>;

    /// Remove an entry. Removing a missing entry is not an error.
    fn delete(&self, digest: &ContentDigest) -> io::Result<()>;

    /// Record a new last-access time.
    fn touch(&self, digest: &ContentDigest, last_access: u64) -> io::Result<()>;

    /// Metadata for every entry, least recently used first.
    fn list(&self) -> io::Result<Vec<EntryMeta>>;
}

/// Volatile store for tests and single-process sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<ContentDigest, (EntryMeta, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, digest: &ContentDigest) -> io::Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(digest).map(|(_, payload)| payload.clone()))
    }

    fn put(&self, meta: &EntryMeta, payload: &[u8]) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(meta.digest, (meta.clone(), payload.to_vec()));
        Ok(())
    }

    fn delete(&self, digest: &ContentDigest) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(digest);
        Ok(())
    }

    fn touch(&self, digest: &ContentDigest, last_access: u64) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((meta, _)) = entries.get_mut(digest) {
            meta.last_access = last_access;
        }
        Ok(())
    }

    fn list(&self) -> io::Result<Vec<EntryMeta>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut metas: Vec<EntryMeta> = entries.values().map(|(meta, _)| meta.clone()).collect();
        metas.sort_by_key(|m| m.last_access);
        Ok(metas)
    }
}

/// One directory, two files per entry: `<digest>.bin` holds the payload and
/// `<digest>.json` the metadata.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(path = %root.display(), "Opened cache directory");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, digest: &ContentDigest) -> PathBuf {
        self.root
            .join(format!("{}.{}", digest.to_hex(), PAYLOAD_EXTENSION))
    }

    fn meta_path(&self, digest: &ContentDigest) -> PathBuf {
        self.root.join(format!("{}.{}", digest.to_hex(), META_EXTENSION))
    }

    fn write_meta(&self, meta: &EntryMeta) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(meta).map_err(io::Error::other)?;
        write_atomic(&self.meta_path(&meta.digest), &json)
    }

    fn read_meta(path: &Path) -> io::Result<EntryMeta> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl CacheStore for DirStore {
    fn get(&self, digest: &ContentDigest) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.payload_path(digest)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, meta: &EntryMeta, payload: &[u8]) -> io::Result<()> {
        write_atomic(&self.payload_path(&meta.digest), payload)?;
        self.write_meta(meta)
    }

    fn delete(&self, digest: &ContentDigest) -> io::Result<()> {
        for path in [self.meta_path(digest), self.payload_path(digest)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn touch(&self, digest: &ContentDigest, last_access: u64) -> io::Result<()> {
        let path = self.meta_path(digest);
        let mut meta = match Self::read_meta(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        meta.last_access = last_access;
        self.write_meta(&meta)
    }

    fn list(&self) -> io::Result<Vec<EntryMeta>> {
        let mut metas = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if extension == Some(PAYLOAD_EXTENSION) {
                // A put interrupted before its metadata landed
                if !path.with_extension(META_EXTENSION).exists() {
                    warn!(path = %path.display(), "Cache payload without metadata; dropping");
                    let _ = fs::remove_file(&path);
                }
                continue;
            }
            if extension != Some(META_EXTENSION) {
                continue;
            }
            match Self::read_meta(&path) {
                Ok(meta) if self.payload_path(&meta.digest).exists() => metas.push(meta),
                Ok(meta) => {
                    warn!(digest = %meta.digest.short(), "Cache metadata without payload; dropping");
                    let _ = fs::remove_file(&path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable cache metadata");
                }
            }
        }
        metas.sort_by_key(|m| m.last_access);
        Ok(metas)
    }
}

/// Write through a temporary file so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
