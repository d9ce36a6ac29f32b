//! Design-for-manufacturing checks for CNC machining.
//!
//! [`analyze`] combines three bounded scans of a mesh:
//!
//! - [`overhang`]: downward-facing surfaces a top-down tool cannot reach
//! - [`thickness`]: ray-cast wall thickness over a capped face sample
//! - [`features`]: orientation mix of the surface, for recommendations
//!
//! and condenses them into a 0-100 manufacturability score with guidance
//! text. [`tags::face_tags`] turns a result into per-triangle tags for
//! display.
//!
//! # Example
//!
//! ```
//! use mesh_quote::{dfm, geometry, shapes};
//!
//! let mesh = shapes::cube(20.0);
//! let analysis = geometry::analyze(&mesh).unwrap();
//! let result = dfm::analyze(&mesh, &analysis, &dfm::DfmConfig::default()).unwrap();
//!
//! assert!(result.overhang_zones.is_empty());
//! assert_eq!(result.manufacturability_score, 100.0);
//! ```

pub mod features;
pub mod overhang;
pub mod tags;
pub mod thickness;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::GeometryAnalysis;
use crate::tracing_ext::OperationTimer;
use crate::types::Mesh;

pub use features::FeatureSummary;
pub use overhang::{OverhangSeverity, OverhangZone};
pub use tags::{FaceTag, face_tags};
pub use thickness::{ThicknessSource, WallThicknessReport};

/// Overhang share of the surface (percent) above which support is required.
pub const SUPPORT_THRESHOLD_PERCENT: f64 = 5.0;

/// Thresholds and switches for [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfmConfig {
    /// Overhang threshold, degrees between face normal and vertical.
    pub overhang_angle_deg: f64,
    /// Thinnest acceptable wall (mm).
    pub min_wall_thickness: f64,
    /// Run ray-cast wall thickness estimation.
    pub check_wall_thickness: bool,
    /// Run surface classification.
    pub detect_features: bool,
    /// Upper bound on faces ray cast from.
    pub max_thickness_samples: usize,
    /// Upper bound on faces classified.
    pub max_feature_samples: usize,
    /// Rays stop after this distance (mm); 0 means unlimited.
    pub max_ray_distance: f64,
}

impl Default for DfmConfig {
    fn default() -> Self {
        Self {
            overhang_angle_deg: 45.0,
            min_wall_thickness: 2.0,
            check_wall_thickness: true,
            detect_features: true,
            max_thickness_samples: 500,
            max_feature_samples: 2000,
            max_ray_distance: 1000.0,
        }
    }
}

impl DfmConfig {
    /// Overhangs only; skips both sampled scans.
    pub fn fast() -> Self {
        Self {
            check_wall_thickness: false,
            detect_features: false,
            ..Default::default()
        }
    }

    /// Default config with a custom minimum wall thickness.
    pub fn with_min_wall_thickness(min_wall_thickness: f64) -> Self {
        Self {
            min_wall_thickness,
            ..Default::default()
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> QuoteResult<()> {
        if !(0.0..90.0).contains(&self.overhang_angle_deg) {
            return Err(QuoteError::invalid_config(format!(
                "overhang_angle_deg must be in [0, 90), got {}",
                self.overhang_angle_deg
            )));
        }
        if !(self.min_wall_thickness.is_finite() && self.min_wall_thickness > 0.0) {
            return Err(QuoteError::invalid_config(format!(
                "min_wall_thickness must be positive, got {}",
                self.min_wall_thickness
            )));
        }
        if self.max_thickness_samples == 0 || self.max_feature_samples == 0 {
            return Err(QuoteError::invalid_config("sample caps must be at least 1"));
        }
        if self.max_ray_distance.is_nan() || self.max_ray_distance < 0.0 {
            return Err(QuoteError::invalid_config(format!(
                "max_ray_distance must be non-negative, got {}",
                self.max_ray_distance
            )));
        }
        Ok(())
    }
}

/// Manufacturability assessment of one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfmAnalysisResult {
    /// At most one zone holding every overhanging face.
    pub overhang_zones: Vec<OverhangZone>,
    /// Overhang area as a percentage (0-100) of total surface area.
    pub overhang_percentage: f64,
    pub requires_support: bool,
    pub requires_5_axis: bool,
    /// Thinnest wall estimate (mm); `None` when thickness checking is off.
    pub min_wall_thickness: Option<f64>,
    pub wall_thickness: Option<WallThicknessReport>,
    pub features: Option<FeatureSummary>,
    /// 0-100, higher is easier to make.
    pub manufacturability_score: f64,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

impl DfmAnalysisResult {
    /// Whether any zone is severe.
    pub fn has_severe_overhang(&self) -> bool {
        self.overhang_zones
            .iter()
            .any(|z| z.severity == OverhangSeverity::Severe)
    }
}

/// Assess a mesh for CNC machining.
///
/// `analysis` must describe the same mesh. Ray-cast misses never fail the
/// call; they fall back to a bounding-box estimate.
pub fn analyze(
    mesh: &Mesh,
    analysis: &GeometryAnalysis,
    config: &DfmConfig,
) -> QuoteResult<DfmAnalysisResult> {
    config.validate()?;
    if mesh.face_count() == 0 {
        return Err(QuoteError::invalid_mesh("mesh has no faces"));
    }

    let _timer = OperationTimer::for_mesh("dfm_analysis", mesh);

    let scan = overhang::detect_overhangs(mesh, config.overhang_angle_deg);
    let overhang_percentage = if analysis.surface_area > 0.0 {
        (scan.overhang_area / analysis.surface_area * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let requires_support = overhang_percentage > SUPPORT_THRESHOLD_PERCENT;
    let requires_5_axis = scan
        .zones
        .iter()
        .any(|z| z.severity == OverhangSeverity::Severe);

    let wall_thickness = config.check_wall_thickness.then(|| {
        thickness::estimate_thickness(
            mesh,
            &analysis.bounding_box,
            config.min_wall_thickness,
            config.max_thickness_samples,
            config.max_ray_distance,
        )
    });
    let min_wall_thickness = wall_thickness.as_ref().map(|r| r.min);

    let features = config
        .detect_features
        .then(|| features::detect_features(mesh, config.max_feature_samples));

    let manufacturability_score =
        manufacturability_score(overhang_percentage, min_wall_thickness, config);

    let mut result = DfmAnalysisResult {
        overhang_zones: scan.zones,
        overhang_percentage,
        requires_support,
        requires_5_axis,
        min_wall_thickness,
        wall_thickness,
        features,
        manufacturability_score,
        recommendations: Vec::new(),
        warnings: Vec::new(),
    };
    add_guidance(&mut result, config);

    info!(
        overhang_percent = format!("{:.1}", result.overhang_percentage),
        requires_support,
        requires_5_axis,
        min_wall = ?result.min_wall_thickness,
        score = result.manufacturability_score,
        "DFM analysis complete"
    );

    Ok(result)
}

/// Score starting at 100 with overhang and thin-wall deductions.
///
/// `min_wall_thickness` is `None` when thickness checking is disabled.
pub fn manufacturability_score(
    overhang_percentage: f64,
    min_wall_thickness: Option<f64>,
    config: &DfmConfig,
) -> f64 {
    let mut score: f64 = 100.0;

    if overhang_percentage > 20.0 {
        score -= 40.0;
    } else if overhang_percentage > 10.0 {
        score -= 25.0;
    } else if overhang_percentage > 5.0 {
        score -= 10.0;
    }

    if let Some(min) = min_wall_thickness
        && min < config.min_wall_thickness
    {
        score -= 20.0;
    }

    score.clamp(0.0, 100.0)
}

fn add_guidance(result: &mut DfmAnalysisResult, config: &DfmConfig) {
    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();

    if result.requires_5_axis {
        warnings.push(
            "Severe overhangs (75° or steeper from vertical) need 5-axis machining".to_string(),
        );
        recommendations.push(
            "Redesign undercuts so they open toward a machinable direction, or budget for 5-axis work"
                .to_string(),
        );
    } else if result.requires_support {
        recommendations.push(format!(
            "Overhangs cover {:.1}% of the surface; plan for an extra setup or a 4-axis fixture",
            result.overhang_percentage
        ));
    }

    if result.overhang_percentage > 20.0 {
        warnings.push(format!(
            "Overhangs cover {:.1}% of the surface, well above the 20% guideline",
            result.overhang_percentage
        ));
    }

    if let Some(report) = &result.wall_thickness {
        if report.is_thin(config.min_wall_thickness) {
            warnings.push(format!(
                "Minimum wall thickness {:.2} mm is below {:.2} mm",
                report.min, config.min_wall_thickness
            ));
            recommendations.push(format!(
                "Thicken walls to at least {:.2} mm to avoid chatter and deflection",
                config.min_wall_thickness
            ));
        }
        if report.source == ThicknessSource::BoundingBoxHeuristic {
            warnings.push(
                "Wall thickness was estimated from the bounding box; the mesh may be open or inside out"
                    .to_string(),
            );
        }
    }

    if let Some(features) = &result.features {
        if features.is_freeform() {
            recommendations
                .push("Sculpted surfaces dominate; expect ball-end finishing passes".to_string());
        }
        if features.downward_flat > 0.0 && features.upward_flat > 0.0 {
            recommendations
                .push("Top and bottom faces both need machining; allow for a flip setup".to_string());
        }
    }

    result.recommendations = recommendations;
    result.warnings = warnings;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use crate::shapes;
    use crate::types::Vertex;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn run(mesh: &Mesh, config: &DfmConfig) -> DfmAnalysisResult {
        let analysis = geometry::analyze(mesh).unwrap();
        analyze(mesh, &analysis, config).unwrap()
    }

    /// Flat square facing up, as two triangles.
    fn upward_plate() -> Mesh {
        let up = Vector3::new(0.0, 0.0, 1.0);
        let v = |x: f64, y: f64| Vertex::with_normal(Point3::new(x, y, 0.0), up);
        Mesh::from_soup(vec![
            v(0.0, 0.0),
            v(10.0, 0.0),
            v(10.0, 10.0),
            v(0.0, 0.0),
            v(10.0, 10.0),
            v(0.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_config_presets() {
        let fast = DfmConfig::fast();
        assert!(!fast.check_wall_thickness);
        assert!(!fast.detect_features);
        assert_eq!(fast.overhang_angle_deg, 45.0);

        let custom = DfmConfig::with_min_wall_thickness(1.5);
        assert_eq!(custom.min_wall_thickness, 1.5);
        assert!(custom.check_wall_thickness);
    }

    #[test]
    fn test_config_validation() {
        assert!(DfmConfig::default().validate().is_ok());
        let bad = DfmConfig {
            overhang_angle_deg: 95.0,
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().code(), crate::ErrorCode::InvalidConfig);
        let bad = DfmConfig {
            min_wall_thickness: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_upward_plate_has_no_overhangs() {
        let result = run(&upward_plate(), &DfmConfig::default());
        assert!(result.overhang_zones.is_empty());
        assert_eq!(result.overhang_percentage, 0.0);
        assert!(!result.requires_support);
        assert!(!result.requires_5_axis);
    }

    #[test]
    fn test_cube_scores_full_marks() {
        let result = run(&shapes::cube(20.0), &DfmConfig::default());
        assert_eq!(result.manufacturability_score, 100.0);
        assert!(result.warnings.is_empty());
        let report = result.wall_thickness.unwrap();
        assert_eq!(report.source, ThicknessSource::RayCast);
        assert_relative_eq!(result.min_wall_thickness.unwrap(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_thin_plate_loses_twenty_points() {
        let result = run(&shapes::cuboid(100.0, 100.0, 1.0), &DfmConfig::default());
        assert_eq!(result.manufacturability_score, 80.0);
        assert!(result.warnings.iter().any(|w| w.contains("wall thickness")));
    }

    #[test]
    fn test_fast_config_skips_sampled_scans() {
        let result = run(&shapes::cuboid(100.0, 100.0, 1.0), &DfmConfig::fast());
        assert!(result.wall_thickness.is_none());
        assert!(result.min_wall_thickness.is_none());
        assert!(result.features.is_none());
        assert_eq!(result.manufacturability_score, 100.0);
    }

    #[test]
    fn test_sphere_needs_support() {
        let result = run(&shapes::uv_sphere(10.0, 32, 32), &DfmConfig::fast());
        assert_eq!(result.overhang_zones.len(), 1);
        assert!(result.overhang_percentage > SUPPORT_THRESHOLD_PERCENT);
        assert!(result.requires_support);
        assert!(result.manufacturability_score < 100.0);
    }

    #[test]
    fn test_score_deductions() {
        let config = DfmConfig::default();
        assert_eq!(manufacturability_score(0.0, None, &config), 100.0);
        assert_eq!(manufacturability_score(5.0, None, &config), 100.0);
        assert_eq!(manufacturability_score(5.1, None, &config), 90.0);
        assert_eq!(manufacturability_score(15.0, None, &config), 75.0);
        assert_eq!(manufacturability_score(25.0, None, &config), 60.0);
        assert_eq!(manufacturability_score(25.0, Some(1.0), &config), 40.0);
        assert_eq!(manufacturability_score(0.0, Some(2.0), &config), 100.0);
    }

    #[test]
    fn test_requires_5_axis_follows_severe_zone() {
        // Steep underside: normal 80° from vertical
        let a = 80f64.to_radians();
        let n = Vector3::new(a.sin(), 0.0, -a.cos());
        let mesh = Mesh::from_soup(vec![
            Vertex::with_normal(Point3::new(0.0, 0.0, 0.0), n),
            Vertex::with_normal(Point3::new(0.0, 10.0, 0.0), n),
            Vertex::with_normal(Point3::new(10.0 * a.cos(), 0.0, 10.0 * a.sin()), n),
        ])
        .unwrap();
        let result = run(&mesh, &DfmConfig::fast());
        assert!(result.requires_5_axis);
        assert!(result.has_severe_overhang());
        assert_relative_eq!(result.overhang_percentage, 100.0, epsilon = 1e-9);
        assert_eq!(result.manufacturability_score, 60.0);
    }
}
