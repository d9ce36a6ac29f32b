//! Coarse surface classification from sampled face normals.

use serde::{Deserialize, Serialize};

use crate::dfm::thickness::sample_stride;
use crate::types::Mesh;

/// |n_z| at or above this counts as a flat face.
const FLAT_NZ: f64 = 0.95;

/// |n_z| at or below this counts as a vertical wall.
const VERTICAL_NZ: f64 = 0.05;

/// Area-weighted fractions of the sampled surface by orientation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub sampled_faces: usize,
    /// Facing up, reachable from a single top setup.
    pub upward_flat: f64,
    /// Facing down, needs a flipped setup.
    pub downward_flat: f64,
    pub vertical: f64,
    /// Everything else: drafts, fillets and freeform surfaces.
    pub inclined: f64,
}

impl FeatureSummary {
    /// Whether the surface is dominated by sculpted (non-prismatic) faces.
    pub fn is_freeform(&self) -> bool {
        self.inclined > 0.3
    }
}

/// Classify at most `max_samples` faces.
pub(crate) fn detect_features(mesh: &Mesh, max_samples: usize) -> FeatureSummary {
    let stride = sample_stride(mesh.face_count(), max_samples);

    let mut summary = FeatureSummary::default();
    let mut total_area = 0.0;

    for face_idx in (0..mesh.face_count()).step_by(stride) {
        let (Some(normal), Some(tri)) = (mesh.face_normal(face_idx), mesh.triangle(face_idx))
        else {
            continue;
        };
        let area = tri.area();
        summary.sampled_faces += 1;
        total_area += area;

        let nz = normal.z;
        if nz >= FLAT_NZ {
            summary.upward_flat += area;
        } else if nz <= -FLAT_NZ {
            summary.downward_flat += area;
        } else if nz.abs() <= VERTICAL_NZ {
            summary.vertical += area;
        } else {
            summary.inclined += area;
        }
    }

    if total_area > 0.0 {
        summary.upward_flat /= total_area;
        summary.downward_flat /= total_area;
        summary.vertical /= total_area;
        summary.inclined /= total_area;
    }

    summary
}
