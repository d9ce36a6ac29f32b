//! Content-addressed geometry cache with a byte budget.
//!
//! Parsing and measuring a large mesh is the slowest part of a quote, and
//! customers re-upload the same file under different names all the time.
//! [`GeometryCache`] keys parsed meshes and their [`GeometryAnalysis`] by the
//! SHA-256 of the raw file bytes and evicts least-recently-used entries when
//! the summed file sizes would exceed the configured capacity.
//!
//! The cache is an explicit value with a lifetime: open it at session start,
//! share it through an `Arc`, and [`GeometryCache::close`] it at the end.
//! Every mutation happens under one lock, so size accounting and recency
//! order stay consistent under concurrent use.
//!
//! # Example
//!
//! ```
//! use mesh_quote::cache::{CacheConfig, ContentDigest, GeometryCache};
//! use mesh_quote::{geometry, shapes};
//!
//! let cache = GeometryCache::in_memory(CacheConfig::default());
//! let mesh = shapes::cube(10.0);
//! let analysis = geometry::analyze(&mesh).unwrap();
//! let digest = ContentDigest::of(b"file bytes");
//!
//! cache.put(digest, "part.stl", 10, &mesh, &analysis).unwrap();
//! let entry = cache.get(&digest).unwrap().unwrap();
//! assert_eq!(entry.mesh, mesh);
//! ```

pub mod digest;
pub mod store;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::GeometryAnalysis;
use crate::tracing_ext::{log_cache_eviction, log_cache_lookup};
use crate::types::Mesh;

pub use digest::ContentDigest;
pub use store::{CacheStore, DirStore, EntryMeta, MemoryStore};

/// Default byte budget (256 MiB).
pub const DEFAULT_CAPACITY_BYTES: u64 = 256 * 1024 * 1024;

/// Payload files start with this magic and a little-endian format version.
const PAYLOAD_MAGIC: &[u8; 4] = b"MQGC";
const PAYLOAD_VERSION: u32 = 1;

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on the summed `byte_size` of all entries.
    pub capacity_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(capacity_bytes: u64) -> Self {
        Self { capacity_bytes }
    }
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub digest: ContentDigest,
    pub file_name: String,
    pub byte_size: u64,
    pub mesh: Mesh,
    pub analysis: GeometryAnalysis,
    /// Unix milliseconds, refreshed by this lookup.
    pub last_access: u64,
}

/// Occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub total_size: u64,
    /// Last access of the least recently used entry.
    pub oldest_timestamp: Option<u64>,
    pub capacity: u64,
}

#[derive(Deserialize)]
struct Payload {
    mesh: Mesh,
    analysis: GeometryAnalysis,
}

// Same layout as `Payload`, borrowed for encoding
#[derive(Serialize)]
struct PayloadRef<'a> {
    mesh: &'a Mesh,
    analysis: &'a GeometryAnalysis,
}

struct CacheState {
    // Most recently used first; unbounded because the budget is in bytes
    index: LruCache<ContentDigest, EntryMeta>,
    total_size: u64,
    clock: u64,
}

impl CacheState {
    /// Strictly increasing Unix milliseconds.
    fn next_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.clock = now.max(self.clock + 1);
        self.clock
    }
}

/// LRU geometry cache over a [`CacheStore`].
pub struct GeometryCache {
    store: Box<dyn CacheStore>,
    capacity: u64,
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for GeometryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("GeometryCache")
            .field("count", &stats.count)
            .field("total_size", &stats.total_size)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl GeometryCache {
    /// Open a cache over `store`, rebuilding the recency index from it.
    ///
    /// If the store already holds more than the capacity, the oldest entries
    /// are evicted immediately.
    pub fn open(store: impl CacheStore + 'static, config: CacheConfig) -> QuoteResult<Self> {
        let metas = store
            .list()
            .map_err(|e| QuoteError::cache_io("open", e))?;

        let mut state = CacheState {
            index: LruCache::unbounded(),
            total_size: 0,
            clock: 0,
        };
        // list() is oldest first, so the newest ends up most recent
        for meta in metas {
            state.total_size += meta.byte_size;
            state.clock = state.clock.max(meta.last_access);
            if let Some(old) = state.index.put(meta.digest, meta) {
                state.total_size -= old.byte_size;
            }
        }

        let cache = Self {
            store: Box::new(store),
            capacity: config.capacity_bytes,
            state: Mutex::new(state),
        };

        {
            let mut state = cache.lock();
            let capacity = cache.capacity;
            cache.evict_until(&mut state, |total| total <= capacity)?;
            info!(
                entries = state.index.len(),
                total_size = state.total_size,
                capacity = cache.capacity,
                "Geometry cache opened"
            );
        }

        Ok(cache)
    }

    /// A cache that lives only in this process.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            capacity: config.capacity_bytes,
            state: Mutex::new(CacheState {
                index: LruCache::unbounded(),
                total_size: 0,
                clock: 0,
            }),
        }
    }

    /// A cache persisted in `dir`.
    pub fn open_dir(dir: impl AsRef<Path>, config: CacheConfig) -> QuoteResult<Self> {
        let store = DirStore::open(dir.as_ref()).map_err(|e| QuoteError::cache_io("open", e))?;
        Self::open(store, config)
    }

    /// Configured byte budget.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a digest.
    ///
    /// A miss is `Ok(None)`. A hit becomes the most recently used entry.
    /// Errors mean the backing store failed or holds a corrupt payload.
    pub fn get(&self, digest: &ContentDigest) -> QuoteResult<Option<CacheEntry>> {
        let mut state = self.lock();

        let Some(meta) = state.index.peek(digest).cloned() else {
            log_cache_lookup(&digest.short(), false);
            return Ok(None);
        };

        let bytes = match self.store.get(digest) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(digest = %digest.short(), "Cache entry vanished from store");
                Self::forget(&mut state, digest);
                return Ok(None);
            }
            Err(e) => return Err(QuoteError::cache_io("read", e)),
        };

        let payload = match decode_payload(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(digest = %digest.short(), error = %e, "Dropping corrupt cache entry");
                Self::forget(&mut state, digest);
                let _ = self.store.delete(digest);
                return Err(QuoteError::cache_io("decode", e));
            }
        };

        let last_access = state.next_timestamp();
        self.store
            .touch(digest, last_access)
            .map_err(|e| QuoteError::cache_io("touch", e))?;
        if let Some(entry) = state.index.get_mut(digest) {
            entry.last_access = last_access;
        }

        log_cache_lookup(&digest.short(), true);
        Ok(Some(CacheEntry {
            digest: *digest,
            file_name: meta.file_name,
            byte_size: meta.byte_size,
            mesh: payload.mesh,
            analysis: payload.analysis,
            last_access,
        }))
    }

    /// Store a parsed mesh and its analysis.
    ///
    /// Evicts least-recently-used entries until the new one fits. Returns
    /// `false` without storing when `byte_size` alone exceeds the capacity.
    /// Re-putting a digest replaces the existing entry.
    pub fn put(
        &self,
        digest: ContentDigest,
        file_name: &str,
        byte_size: u64,
        mesh: &Mesh,
        analysis: &GeometryAnalysis,
    ) -> QuoteResult<bool> {
        if byte_size > self.capacity {
            warn!(
                digest = %digest.short(),
                byte_size,
                capacity = self.capacity,
                "Entry larger than cache capacity; not cached"
            );
            return Ok(false);
        }

        let payload = encode_payload(mesh, analysis)?;
        let mut state = self.lock();

        if let Some(old) = state.index.pop(&digest) {
            state.total_size -= old.byte_size;
        }

        let capacity = self.capacity;
        self.evict_until(&mut state, |total| total + byte_size <= capacity)?;

        let meta = EntryMeta {
            digest,
            file_name: file_name.to_string(),
            byte_size,
            last_access: state.next_timestamp(),
        };
        self.store
            .put(&meta, &payload)
            .map_err(|e| QuoteError::cache_io("write", e))?;
        state.index.put(digest, meta);
        state.total_size += byte_size;

        debug!(
            digest = %digest.short(),
            file_name,
            byte_size,
            total_size = state.total_size,
            "Cached geometry"
        );
        Ok(true)
    }

    /// Remove one entry. Returns whether it was present.
    pub fn remove(&self, digest: &ContentDigest) -> QuoteResult<bool> {
        let mut state = self.lock();
        let present = Self::forget(&mut state, digest);
        self.store
            .delete(digest)
            .map_err(|e| QuoteError::cache_io("delete", e))?;
        Ok(present)
    }

    /// Remove every entry.
    pub fn clear(&self) -> QuoteResult<()> {
        let mut state = self.lock();
        while let Some((digest, _)) = state.index.pop_lru() {
            self.store
                .delete(&digest)
                .map_err(|e| QuoteError::cache_io("clear", e))?;
        }
        state.total_size = 0;
        info!("Geometry cache cleared");
        Ok(())
    }

    /// Whether a digest is cached, without touching its recency.
    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.lock().index.contains(digest)
    }

    /// Entry metadata, most recently used first.
    pub fn entries(&self) -> Vec<EntryMeta> {
        self.lock().index.iter().map(|(_, meta)| meta.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            count: state.index.len(),
            total_size: state.total_size,
            oldest_timestamp: state.index.peek_lru().map(|(_, meta)| meta.last_access),
            capacity: self.capacity,
        }
    }

    /// Tear the cache down. Persistent stores keep their entries.
    pub fn close(self) {
        let stats = self.stats();
        info!(
            entries = stats.count,
            total_size = stats.total_size,
            "Geometry cache closed"
        );
    }

    /// Drop an entry from the index only.
    fn forget(state: &mut CacheState, digest: &ContentDigest) -> bool {
        match state.index.pop(digest) {
            Some(meta) => {
                state.total_size -= meta.byte_size;
                true
            }
            None => false,
        }
    }

    /// Evict least-recently-used entries until `fits(total_size)` holds.
    fn evict_until(&self, state: &mut CacheState, fits: impl Fn(u64) -> bool) -> QuoteResult<()> {
        while !fits(state.total_size) {
            let Some((digest, meta)) = state.index.pop_lru() else {
                break;
            };
            state.total_size -= meta.byte_size;
            self.store
                .delete(&digest)
                .map_err(|e| QuoteError::cache_io("evict", e))?;
            log_cache_eviction(&digest.short(), meta.byte_size, state.total_size);
        }
        Ok(())
    }
}

fn encode_payload(mesh: &Mesh, analysis: &GeometryAnalysis) -> QuoteResult<Vec<u8>> {
    let payload = PayloadRef { mesh, analysis };
    let mut bytes = Vec::with_capacity(8 + mesh.vertex_count() * 56 + mesh.face_count() * 12);
    bytes.extend_from_slice(PAYLOAD_MAGIC);
    bytes.extend_from_slice(&PAYLOAD_VERSION.to_le_bytes());
    bincode::serialize_into(&mut bytes, &payload).map_err(|e| {
        QuoteError::cache_io("encode", std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    Ok(bytes)
}

fn decode_payload(bytes: &[u8]) -> std::io::Result<Payload> {
    let invalid = |msg: String| std::io::Error::new(std::io::ErrorKind::InvalidData, msg);

    let (magic, rest) = bytes
        .split_first_chunk::<4>()
        .ok_or_else(|| invalid("payload shorter than header".into()))?;
    if magic != PAYLOAD_MAGIC {
        return Err(invalid("bad payload magic".into()));
    }
    let (version, body) = rest
        .split_first_chunk::<4>()
        .ok_or_else(|| invalid("payload shorter than header".into()))?;
    let version = u32::from_le_bytes(*version);
    if version != PAYLOAD_VERSION {
        return Err(invalid(format!("unsupported payload version {}", version)));
    }
    bincode::deserialize(body).map_err(|e| invalid(e.to_string()))
}
