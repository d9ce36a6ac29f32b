//! End-to-end entry points: bytes in, analysis and price out.
//!
//! [`load_part`] turns uploaded file bytes into a [`Mesh`] plus its
//! [`GeometryAnalysis`], consulting the geometry cache first when one is
//! supplied. [`analyze_dfm`] and [`estimate_price`] take it from there, and
//! [`quote_part`] chains all three.
//!
//! The cache is an optimization only. Any cache failure is logged and the
//! part is parsed and analyzed from scratch.
//!
//! # Example
//!
//! ```
//! use mesh_quote::pipeline::{QuoteRequest, quote_part};
//! use mesh_quote::cost::Catalog;
//! use mesh_quote::{shapes, stl};
//!
//! let bytes = stl::to_binary_bytes(&shapes::cube(20.0));
//! let quote = quote_part(&bytes, "bracket.stl", None, &QuoteRequest::default(), &Catalog::standard())
//!     .unwrap();
//!
//! assert!(quote.dfm.manufacturability_score > 90.0);
//! println!("{} {:.2} per unit", quote.estimate.currency, quote.estimate.per_unit.total);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{ContentDigest, GeometryCache};
use crate::cost::{self, Catalog, PriceEstimate, QuoteConfig};
use crate::dfm::{self, DfmAnalysisResult, DfmConfig};
use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{self, GeometryAnalysis};
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::stl::{self, IngestOptions, MeshFormat};
use crate::tracing_ext::{OperationTimer, log_mesh_stats};
use crate::types::Mesh;

/// A parsed and measured part.
#[derive(Debug, Clone)]
pub struct LoadedPart {
    pub digest: ContentDigest,
    pub file_name: String,
    /// Size of the uploaded file.
    pub byte_size: u64,
    pub mesh: Arc<Mesh>,
    pub analysis: GeometryAnalysis,
    /// Whether the mesh came from the geometry cache.
    pub from_cache: bool,
}

impl LoadedPart {
    /// Serializable summary without the mesh itself.
    pub fn summary(&self) -> PartSummary {
        PartSummary {
            digest: self.digest,
            file_name: self.file_name.clone(),
            byte_size: self.byte_size,
            triangle_count: self.mesh.face_count(),
            from_cache: self.from_cache,
            analysis: self.analysis.clone(),
        }
    }
}

/// What the rest of the platform stores about a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSummary {
    pub digest: ContentDigest,
    pub file_name: String,
    pub byte_size: u64,
    pub triangle_count: usize,
    pub from_cache: bool,
    pub analysis: GeometryAnalysis,
}

/// Settings for a full [`quote_part`] run.
#[derive(Debug, Clone, Default)]
pub struct QuoteRequest {
    pub ingest: IngestOptions,
    pub dfm: DfmConfig,
    pub quote: QuoteConfig,
}

impl QuoteRequest {
    pub fn new(quote: QuoteConfig) -> Self {
        Self {
            quote,
            ..Default::default()
        }
    }
}

/// Result of [`quote_part`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartQuote {
    pub part: PartSummary,
    pub dfm: DfmAnalysisResult,
    pub estimate: PriceEstimate,
}

/// Parse and measure a part, using the cache when available.
///
/// `digest` may be supplied when the caller already hashed the bytes;
/// otherwise it is computed here. Format and size are checked before the
/// cache is consulted, so a cached entry never bypasses the upload rules.
pub fn load_part(
    bytes: &[u8],
    file_name: &str,
    digest: Option<ContentDigest>,
    cache: Option<&GeometryCache>,
    options: &IngestOptions,
    progress: Option<&ProgressCallback>,
) -> QuoteResult<LoadedPart> {
    let _timer = OperationTimer::new("load_part");

    MeshFormat::from_file_name(file_name)?;
    let byte_size = bytes.len() as u64;
    if byte_size > options.max_bytes {
        return Err(QuoteError::SizeLimit {
            size: byte_size,
            limit: options.max_bytes,
        });
    }

    let reporter = ProgressReporter::new(progress);
    let digest = digest.unwrap_or_else(|| ContentDigest::of(bytes));

    if let Some(cache) = cache {
        match cache.get(&digest) {
            Ok(Some(entry)) => {
                info!(
                    digest = %digest.short(),
                    file_name,
                    cached_as = %entry.file_name,
                    "Loaded part from cache"
                );
                reporter.report(1.0, "Loaded from cache");
                return Ok(LoadedPart {
                    digest,
                    file_name: file_name.to_string(),
                    byte_size,
                    mesh: Arc::new(entry.mesh),
                    analysis: entry.analysis,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(digest = %digest.short(), error = %e, "Cache lookup failed; parsing instead");
            }
        }
    }

    let parse = reporter.stage(0.0, 0.7);
    let mesh = stl::decode(bytes, options, &parse)?;
    log_mesh_stats(&mesh, file_name);

    let measure = reporter.stage(0.7, 0.2);
    let analysis = geometry::analyze(&mesh)?;
    measure.finish("Measured");

    if let Some(cache) = cache {
        let store = reporter.stage(0.9, 0.1);
        if let Err(e) = cache.put(digest, file_name, byte_size, &mesh, &analysis) {
            warn!(digest = %digest.short(), error = %e, "Cache store failed; continuing");
        }
        store.finish("Cached");
    }
    reporter.report(1.0, "Loaded");

    Ok(LoadedPart {
        digest,
        file_name: file_name.to_string(),
        byte_size,
        mesh: Arc::new(mesh),
        analysis,
        from_cache: false,
    })
}

/// Read a part from disk and load it.
pub fn load_part_file(
    path: impl AsRef<std::path::Path>,
    cache: Option<&GeometryCache>,
    options: &IngestOptions,
    progress: Option<&ProgressCallback>,
) -> QuoteResult<LoadedPart> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| QuoteError::UnsupportedFormat { extension: None })?;
    if let Ok(meta) = std::fs::metadata(path)
        && meta.len() > options.max_bytes
    {
        return Err(QuoteError::SizeLimit {
            size: meta.len(),
            limit: options.max_bytes,
        });
    }
    let bytes = std::fs::read(path).map_err(|e| QuoteError::io_read(path, e))?;
    load_part(&bytes, file_name, None, cache, options, progress)
}

/// Manufacturability assessment of a loaded mesh.
pub fn analyze_dfm(
    mesh: &Mesh,
    analysis: &GeometryAnalysis,
    config: &DfmConfig,
) -> QuoteResult<DfmAnalysisResult> {
    dfm::analyze(mesh, analysis, config)
}

/// Price a part; `dfm` may be omitted at the cost of confidence.
pub fn estimate_price(
    analysis: &GeometryAnalysis,
    dfm: Option<&DfmAnalysisResult>,
    quote: &QuoteConfig,
    catalog: &Catalog,
) -> QuoteResult<PriceEstimate> {
    cost::estimate(analysis, dfm, quote, catalog)
}

/// Load, assess and price a part in one call.
///
/// Quote and DFM settings are validated before any parsing happens.
pub fn quote_part(
    bytes: &[u8],
    file_name: &str,
    cache: Option<&GeometryCache>,
    request: &QuoteRequest,
    catalog: &Catalog,
) -> QuoteResult<PartQuote> {
    request.dfm.validate()?;
    request.quote.validate()?;
    catalog.material(&request.quote.material)?;
    catalog.finish(&request.quote.finish)?;

    let part = load_part(bytes, file_name, None, cache, &request.ingest, None)?;
    let dfm = analyze_dfm(&part.mesh, &part.analysis, &request.dfm)?;
    let estimate = estimate_price(&part.analysis, Some(&dfm), &request.quote, catalog)?;

    info!(
        file_name,
        from_cache = part.from_cache,
        total = format!("{:.2}", estimate.batch.total),
        "Quote complete"
    );

    Ok(PartQuote {
        part: part.summary(),
        dfm,
        estimate,
    })
}
