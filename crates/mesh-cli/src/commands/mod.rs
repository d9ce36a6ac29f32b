//! Subcommand implementations.

pub mod analyze;
pub mod cache;
pub mod dfm;
pub mod materials;
pub mod quote;
pub mod sample;

use std::path::Path;

use anyhow::{Context, Result};
use mesh_quote::cache::{CacheConfig, GeometryCache};
use mesh_quote::cost::Catalog;
use mesh_quote::pipeline::{LoadedPart, load_part_file};
use mesh_quote::stl::IngestOptions;

/// Open the on-disk cache when a directory was given.
pub fn open_cache(dir: Option<&Path>) -> Result<Option<GeometryCache>> {
    dir.map(|dir| {
        GeometryCache::open_dir(dir, CacheConfig::default())
            .with_context(|| format!("Failed to open geometry cache at {:?}", dir))
    })
    .transpose()
}

/// Load and measure a part from disk.
pub fn load(input: &Path, cache: Option<&GeometryCache>) -> Result<LoadedPart> {
    load_part_file(input, cache, &IngestOptions::default(), None)
        .with_context(|| format!("Failed to load part from {:?}", input))
}

/// The built-in catalog, or one read from `path`.
pub fn catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("Failed to load catalog from {:?}", path)),
        None => Ok(Catalog::standard()),
    }
}
