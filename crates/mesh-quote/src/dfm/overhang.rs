//! Overhang detection.
//!
//! A face overhangs when its normal points downward and the angle between
//! the normal and the vertical axis exceeds the configured threshold. Flat
//! downward faces sit on the fixture and are not overhangs; the steeper the
//! underside, the harder it is to reach from above.

use serde::{Deserialize, Serialize};

use crate::types::Mesh;

/// Vertical normal components above this are not considered downward.
const DOWNWARD_EPSILON: f64 = 1e-6;

/// How hard an overhang zone is to machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverhangSeverity {
    /// Mean angle below 60°.
    Mild,
    /// Mean angle below 75°.
    Moderate,
    /// Mean angle of 75° or more.
    Severe,
}

impl OverhangSeverity {
    /// Classify a mean angle in degrees.
    pub fn from_angle(angle_deg: f64) -> Self {
        if angle_deg < 60.0 {
            OverhangSeverity::Mild
        } else if angle_deg < 75.0 {
            OverhangSeverity::Moderate
        } else {
            OverhangSeverity::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverhangSeverity::Mild => "mild",
            OverhangSeverity::Moderate => "moderate",
            OverhangSeverity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for OverhangSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of overhanging faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverhangZone {
    /// Member face indices, ascending.
    pub faces: Vec<u32>,
    /// Total surface area of the member faces (mm²).
    pub area: f64,
    /// Area projected onto the XY plane (mm²).
    pub projected_area: f64,
    /// Area-unweighted mean angle from vertical (degrees).
    pub average_angle: f64,
    /// Steepest member angle (degrees).
    pub max_angle: f64,
    pub severity: OverhangSeverity,
}

/// Result of an overhang scan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OverhangScan {
    pub zones: Vec<OverhangZone>,
    pub overhang_area: f64,
}

/// Angle in degrees between a unit normal and the vertical axis, for
/// downward-facing normals only.
pub fn overhang_angle(normal_z: f64) -> Option<f64> {
    if normal_z < -DOWNWARD_EPSILON {
        Some(normal_z.abs().min(1.0).acos().to_degrees())
    } else {
        None
    }
}

/// Scan every face for overhangs.
///
/// All qualifying faces are merged into a single zone; disjoint regions are
/// not separated.
pub(crate) fn detect_overhangs(mesh: &Mesh, threshold_deg: f64) -> OverhangScan {
    let mut faces = Vec::new();
    let mut area = 0.0;
    let mut projected_area = 0.0;
    let mut angle_sum = 0.0;
    let mut max_angle: f64 = 0.0;

    for face_idx in 0..mesh.face_count() {
        let Some(normal) = mesh.face_normal(face_idx) else {
            continue;
        };
        let Some(angle) = overhang_angle(normal.z) else {
            continue;
        };
        if angle <= threshold_deg {
            continue;
        }
        let Some(tri) = mesh.triangle(face_idx) else {
            continue;
        };

        let face_area = tri.area();
        faces.push(face_idx as u32);
        area += face_area;
        projected_area += face_area * normal.z.abs();
        angle_sum += angle;
        max_angle = max_angle.max(angle);
    }

    if faces.is_empty() {
        return OverhangScan {
            zones: Vec::new(),
            overhang_area: 0.0,
        };
    }

    let average_angle = angle_sum / faces.len() as f64;
    let zone = OverhangZone {
        faces,
        area,
        projected_area,
        average_angle,
        max_angle,
        severity: OverhangSeverity::from_angle(average_angle),
    };

    OverhangScan {
        zones: vec![zone],
        overhang_area: area,
    }
}
