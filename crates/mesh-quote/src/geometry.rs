//! Geometric measurements of a part.
//!
//! [`analyze`] derives volume, surface area, bounding box and a complexity
//! score from a [`Mesh`]. The result is a plain record: it is recomputed when
//! the mesh changes and never mutated.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuoteError, QuoteResult};
use crate::types::Mesh;

/// Surface-to-volume ratio (1/mm) that earns the full ratio contribution.
pub const REFERENCE_SURFACE_TO_VOLUME: f64 = 10.0;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
    /// `max - min`.
    pub size: Vector3<f64>,
    /// Midpoint of `min` and `max`.
    pub center: Point3<f64>,
}

impl BoundingBox {
    /// Build from two corners.
    pub fn from_corners(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min,
            max,
            size: max - min,
            center: nalgebra::center(&min, &max),
        }
    }

    /// Smallest side length.
    pub fn min_dimension(&self) -> f64 {
        self.size.x.min(self.size.y).min(self.size.z)
    }

    /// Largest side length.
    pub fn max_dimension(&self) -> f64 {
        self.size.x.max(self.size.y).max(self.size.z)
    }

    /// Volume of the box (mm³), the raw-stock envelope of the part.
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }
}

/// Coarse complexity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    /// Bucket a 0-100 score: <25 low, <50 medium, <75 high, else very-high.
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            ComplexityLevel::Low
        } else if score < 50.0 {
            ComplexityLevel::Medium
        } else if score < 75.0 {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        }
    }

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very-high",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometric measurements of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryAnalysis {
    /// Enclosed volume (mm³), never negative.
    pub volume: f64,
    /// Total surface area (mm²).
    pub surface_area: f64,
    pub triangle_count: usize,
    pub bounding_box: BoundingBox,
    pub complexity: ComplexityLevel,
    /// 0-100.
    pub complexity_score: f64,
    /// Surface area / volume (1/mm), 0 when the volume is 0.
    pub surface_to_volume_ratio: f64,
}

/// Measure a mesh.
///
/// Fails with `InvalidMesh` when the mesh carries no vertex data.
pub fn analyze(mesh: &Mesh) -> QuoteResult<GeometryAnalysis> {
    if mesh.vertex_count() == 0 || mesh.face_count() == 0 {
        return Err(QuoteError::invalid_mesh("mesh has no vertex data"));
    }

    let volume = mesh.volume();
    let surface_area = mesh.surface_area();
    let (min, max) = mesh.bounds();
    let bounding_box = BoundingBox::from_corners(min, max);
    let triangle_count = mesh.face_count();

    let surface_to_volume_ratio = if volume > 0.0 {
        surface_area / volume
    } else {
        0.0
    };

    let complexity_score = complexity_score(triangle_count, surface_to_volume_ratio);
    let complexity = ComplexityLevel::from_score(complexity_score);

    debug!(
        volume,
        surface_area,
        triangles = triangle_count,
        score = complexity_score,
        %complexity,
        "Geometry analyzed"
    );

    Ok(GeometryAnalysis {
        volume,
        surface_area,
        triangle_count,
        bounding_box,
        complexity,
        complexity_score,
        surface_to_volume_ratio,
    })
}

/// Combine triangle count and surface-to-volume ratio into a 0-100 score.
pub fn complexity_score(triangle_count: usize, surface_to_volume_ratio: f64) -> f64 {
    let ratio = if surface_to_volume_ratio.is_finite() {
        surface_to_volume_ratio.max(0.0)
    } else {
        0.0
    };
    let ratio_points = 50.0 * (ratio / REFERENCE_SURFACE_TO_VOLUME).min(1.0);
    (triangle_points(triangle_count) + ratio_points).clamp(0.0, 100.0)
}

/// Saturating, piecewise-linear contribution of the triangle count (0-50).
fn triangle_points(triangle_count: usize) -> f64 {
    let n = triangle_count as f64;
    if n <= 1_000.0 {
        10.0 * n / 1_000.0
    } else if n <= 10_000.0 {
        10.0 + 15.0 * (n - 1_000.0) / 9_000.0
    } else if n <= 100_000.0 {
        25.0 + 25.0 * (n - 10_000.0) / 90_000.0
    } else {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_cube_measurements() {
        let analysis = analyze(&shapes::cube(10.0)).unwrap();
        assert_relative_eq!(analysis.volume, 1000.0, max_relative = 1e-3);
        assert_relative_eq!(analysis.surface_area, 600.0, max_relative = 1e-3);
        assert_eq!(analysis.complexity, ComplexityLevel::Low);
        assert_eq!(analysis.triangle_count, 12);
        assert_relative_eq!(analysis.surface_to_volume_ratio, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_bounding_box() {
        let analysis = analyze(&shapes::cuboid(10.0, 20.0, 30.0)).unwrap();
        let bbox = analysis.bounding_box;
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(10.0, 20.0, 30.0));
        assert_eq!(bbox.size, Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(bbox.center, Point3::new(5.0, 10.0, 15.0));
        assert_eq!(bbox.min_dimension(), 10.0);
        assert_eq!(bbox.max_dimension(), 30.0);
        assert_relative_eq!(bbox.volume(), 6000.0);
    }

    #[test]
    fn test_sphere_within_tessellation_error() {
        let analysis = analyze(&shapes::uv_sphere(5.0, 32, 32)).unwrap();
        let volume = 4.0 / 3.0 * PI * 125.0;
        let area = 4.0 * PI * 25.0;
        assert_relative_eq!(analysis.volume, volume, max_relative = 0.02);
        assert_relative_eq!(analysis.surface_area, area, max_relative = 0.02);
    }

    #[test]
    fn test_cylinder_volume() {
        let analysis = analyze(&shapes::cylinder(5.0, 10.0, 64)).unwrap();
        assert_relative_eq!(analysis.volume, PI * 25.0 * 10.0, max_relative = 0.01);
    }

    #[test]
    fn test_inverted_mesh_volume_is_positive() {
        let mesh = shapes::cube(10.0).inverted();
        assert!(mesh.signed_volume() < 0.0);
        let analysis = analyze(&mesh).unwrap();
        assert_relative_eq!(analysis.volume, 1000.0, max_relative = 1e-3);
    }

    #[test]
    fn test_thin_plate_has_higher_ratio_than_cube() {
        let plate = analyze(&shapes::cuboid(100.0, 100.0, 1.0)).unwrap();
        let cube = analyze(&shapes::cube(100.0)).unwrap();
        assert!(plate.surface_to_volume_ratio > cube.surface_to_volume_ratio);
        assert!(plate.complexity_score > cube.complexity_score);
    }

    #[test]
    fn test_zero_volume_ratio_is_zero() {
        let mesh = Mesh::from_soup(vec![
            crate::Vertex::from_coords(0.0, 0.0, 0.0),
            crate::Vertex::from_coords(1.0, 0.0, 0.0),
            crate::Vertex::from_coords(0.0, 1.0, 0.0),
        ])
        .unwrap();
        let analysis = analyze(&mesh).unwrap();
        assert_eq!(analysis.volume, 0.0);
        assert_eq!(analysis.surface_to_volume_ratio, 0.0);
    }

    #[test]
    fn test_triangle_points_are_piecewise_and_saturating() {
        assert_eq!(triangle_points(0), 0.0);
        assert_relative_eq!(triangle_points(1_000), 10.0);
        assert_relative_eq!(triangle_points(10_000), 25.0);
        assert_relative_eq!(triangle_points(100_000), 50.0);
        assert_eq!(triangle_points(5_000_000), 50.0);
        assert!(triangle_points(5_000) > triangle_points(4_000));
    }

    #[test]
    fn test_complexity_score_bounds() {
        assert_eq!(complexity_score(10_000_000, 1e9), 100.0);
        assert_eq!(complexity_score(0, f64::NAN), 0.0);
        assert_relative_eq!(complexity_score(0, 5.0), 25.0);
    }

    #[test]
    fn test_complexity_buckets() {
        assert_eq!(ComplexityLevel::from_score(0.0), ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_score(24.9), ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_score(25.0), ComplexityLevel::Medium);
        assert_eq!(ComplexityLevel::from_score(50.0), ComplexityLevel::High);
        assert_eq!(ComplexityLevel::from_score(75.0), ComplexityLevel::VeryHigh);
        assert_eq!(ComplexityLevel::VeryHigh.to_string(), "very-high");
    }
}
