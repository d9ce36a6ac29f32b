//! Per-triangle defect tags for visualization layers.

use serde::{Deserialize, Serialize};

use crate::dfm::DfmAnalysisResult;
use crate::dfm::overhang::OverhangSeverity;

/// What, if anything, is wrong with one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "severity")]
pub enum FaceTag {
    Clear,
    Overhang(OverhangSeverity),
    ThinWall,
}

/// Tag every face of a mesh with `face_count` faces.
///
/// Thin-wall tags take precedence over overhang tags. Indices outside
/// `0..face_count` are ignored.
pub fn face_tags(result: &DfmAnalysisResult, face_count: usize) -> Vec<FaceTag> {
    let mut tags = vec![FaceTag::Clear; face_count];

    for zone in &result.overhang_zones {
        for &face in &zone.faces {
            if let Some(tag) = tags.get_mut(face as usize) {
                *tag = FaceTag::Overhang(zone.severity);
            }
        }
    }

    if let Some(report) = &result.wall_thickness {
        for &face in &report.thin_faces {
            if let Some(tag) = tags.get_mut(face as usize) {
                *tag = FaceTag::ThinWall;
            }
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfm::overhang::OverhangZone;
    use crate::dfm::thickness::{ThicknessSource, WallThicknessReport};

    fn result_with(zone_faces: Vec<u32>, thin_faces: Vec<u32>) -> DfmAnalysisResult {
        DfmAnalysisResult {
            overhang_zones: vec![OverhangZone {
                faces: zone_faces,
                area: 1.0,
                projected_area: 0.5,
                average_angle: 80.0,
                max_angle: 85.0,
                severity: OverhangSeverity::Severe,
            }],
            overhang_percentage: 10.0,
            requires_support: true,
            requires_5_axis: true,
            min_wall_thickness: Some(0.5),
            wall_thickness: Some(WallThicknessReport {
                min: 0.5,
                average: 0.5,
                samples_tested: 4,
                hits: 4,
                thin_faces,
                source: ThicknessSource::RayCast,
            }),
            features: None,
            manufacturability_score: 50.0,
            recommendations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_thin_wall_wins() {
        let tags = face_tags(&result_with(vec![1, 2], vec![2, 3]), 5);
        assert_eq!(
            tags,
            vec![
                FaceTag::Clear,
                FaceTag::Overhang(OverhangSeverity::Severe),
                FaceTag::ThinWall,
                FaceTag::ThinWall,
                FaceTag::Clear,
            ]
        );
    }

    #[test]
    fn test_out_of_range_faces_are_ignored() {
        let tags = face_tags(&result_with(vec![7], vec![9]), 2);
        assert_eq!(tags, vec![FaceTag::Clear; 2]);
    }

    #[test]
    fn test_tag_serialization() {
        let json = serde_json::to_string(&FaceTag::Overhang(OverhangSeverity::Mild)).unwrap();
        assert_eq!(json, r#"{"kind":"overhang","severity":"mild"}"#);
    }
}
