//! Tracing helpers shared by the pipeline stages.
//!
//! The library only emits events; installing a subscriber is left to the
//! application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_quote=debug for per-stage detail,
//! // RUST_LOG=mesh_quote::timing=info for stage timings only.
//! ```
//!
//! # Targets
//!
//! - `mesh_quote::timing`: stage durations from [`OperationTimer`]
//! - `mesh_quote::mesh_state`: mesh summaries
//! - `mesh_quote::cache`: cache hits, misses and evictions

use std::time::Instant;
use tracing::{Span, debug, info};

use crate::types::Mesh;

/// Logs the duration of a pipeline stage when dropped.
///
/// ```rust,ignore
/// let _timer = OperationTimer::new("geometry_analysis");
/// // ... work ...
/// // "Operation completed" with elapsed_ms is logged here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start timing an operation.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("quote_operation", operation = name);
        debug!(target: "mesh_quote::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Start timing an operation on a mesh, recording its size on the span.
    pub fn for_mesh(name: &'static str, mesh: &Mesh) -> Self {
        let span = tracing::info_span!(
            "quote_operation",
            operation = name,
            faces = mesh.face_count(),
            vertices = mesh.vertex_count()
        );
        debug!(
            target: "mesh_quote::timing",
            operation = name,
            faces = mesh.face_count(),
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// The span opened for this operation.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_quote::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log a mesh summary at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let (min, max) = mesh.bounds();
    let dims = max - min;

    debug!(
        target: "mesh_quote::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        has_normals = mesh.has_normals(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log a cache lookup outcome.
pub fn log_cache_lookup(digest: &str, hit: bool) {
    if hit {
        info!(target: "mesh_quote::cache", digest = digest, "Cache hit");
    } else {
        debug!(target: "mesh_quote::cache", digest = digest, "Cache miss");
    }
}

/// Log an eviction.
pub fn log_cache_eviction(digest: &str, byte_size: u64, total_size: u64) {
    debug!(
        target: "mesh_quote::cache",
        digest = digest,
        byte_size = byte_size,
        total_size = total_size,
        "Evicted cache entry"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
    }

    #[test]
    fn test_logging_helpers_do_not_panic() {
        let mesh = shapes::cube(10.0);
        let _timer = OperationTimer::for_mesh("test_mesh_operation", &mesh);
        log_mesh_stats(&mesh, "test");
        log_cache_lookup("abc", true);
        log_cache_lookup("abc", false);
        log_cache_eviction("abc", 10, 0);
    }
}
