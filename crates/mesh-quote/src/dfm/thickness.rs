//! Wall thickness estimation by ray casting.
//!
//! A bounded sample of faces is tested: from each sampled face centroid a ray
//! is cast inward (against the outward face normal) and the distance to the
//! far side of the wall is taken as the local thickness. A BVH over all
//! triangles keeps each ray logarithmic in the face count, and the sample cap
//! keeps the total cost independent of mesh size.
//!
//! When no ray finds the far side (open or inside-out meshes), thickness is
//! estimated from the bounding box instead.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geometry::BoundingBox;
use crate::types::{Mesh, Triangle};

/// Tolerance for ray-triangle and ray-box tests.
const EPSILON: f64 = 1e-9;

/// Distance a ray origin is pushed below its own face.
const RAY_OFFSET: f64 = 1e-6;

/// Largest/smallest bounding-box ratio above which a part counts as slender.
const SLENDER_RATIO: f64 = 10.0;

/// Where a thickness figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThicknessSource {
    /// Measured by ray casting.
    RayCast,
    /// No ray hit the far side; derived from the bounding box.
    BoundingBoxHeuristic,
}

/// Outcome of wall thickness estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallThicknessReport {
    /// Thinnest wall found (mm).
    pub min: f64,
    /// Mean over all hits (mm).
    pub average: f64,
    /// Faces a ray was cast from.
    pub samples_tested: usize,
    /// Rays that reached the far side of the wall.
    pub hits: usize,
    /// Sampled faces thinner than the configured minimum, ascending.
    pub thin_faces: Vec<u32>,
    pub source: ThicknessSource,
}

impl WallThicknessReport {
    /// Whether the thinnest wall is below `min_thickness`.
    pub fn is_thin(&self, min_thickness: f64) -> bool {
        self.min < min_thickness
    }
}

impl std::fmt::Display for WallThicknessReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Wall Thickness:")?;
        writeln!(f, "  Samples tested: {}", self.samples_tested)?;
        writeln!(f, "  Hits: {}", self.hits)?;
        writeln!(f, "  Min thickness: {:.3}", self.min)?;
        writeln!(f, "  Avg thickness: {:.3}", self.average)?;
        writeln!(f, "  Thin faces: {}", self.thin_faces.len())?;
        if self.source == ThicknessSource::BoundingBoxHeuristic {
            writeln!(f, "  (estimated from bounding box)")?;
        }
        Ok(())
    }
}

/// Sampling stride so that at most `max_samples` faces are tested.
pub fn sample_stride(face_count: usize, max_samples: usize) -> usize {
    face_count.div_ceil(max_samples.max(1)).max(1)
}

/// Thickness guess for meshes where ray casting finds nothing.
///
/// The smallest bounding-box dimension, halved for slender parts.
pub fn heuristic_thickness(bbox: &BoundingBox) -> f64 {
    let smallest = bbox.min_dimension();
    let largest = bbox.max_dimension();
    if smallest > 0.0 && largest / smallest > SLENDER_RATIO {
        smallest / 2.0
    } else {
        smallest
    }
}

/// Estimate wall thickness of a closed mesh.
pub(crate) fn estimate_thickness(
    mesh: &Mesh,
    bbox: &BoundingBox,
    min_thickness: f64,
    max_samples: usize,
    max_ray_distance: f64,
) -> WallThicknessReport {
    let face_count = mesh.face_count();
    let stride = sample_stride(face_count, max_samples);

    info!(
        faces = face_count,
        stride,
        min_thickness,
        "Starting wall thickness estimation"
    );

    let triangles: Vec<Triangle> = mesh.triangles().collect();
    let normals: Vec<Option<Vector3<f64>>> =
        (0..face_count).map(|i| mesh.face_normal(i)).collect();

    let mut indices: Vec<usize> = (0..triangles.len()).collect();
    let bvh = BvhNode::build(&triangles, &mut indices);

    let max_dist = if max_ray_distance > 0.0 {
        max_ray_distance
    } else {
        f64::MAX
    };

    let samples: Vec<usize> = (0..face_count).step_by(stride).collect();
    let samples_tested = samples.len();

    let measured: Vec<(u32, f64)> = match &bvh {
        Some(bvh) => samples
            .par_iter()
            .filter_map(|&face_idx| {
                let normal = normals[face_idx]?;
                let direction = -normal;
                let origin = triangles[face_idx].centroid() + direction * RAY_OFFSET;
                let query = RayQuery {
                    origin,
                    direction,
                    dir_inv: inverse_direction(&direction),
                    skip_face: face_idx,
                };
                bvh.trace(&query, &triangles, &normals, max_dist)
                    .map(|(t, _hit_face)| (face_idx as u32, t + RAY_OFFSET))
            })
            .collect(),
        None => Vec::new(),
    };

    if measured.is_empty() {
        let estimate = heuristic_thickness(bbox);
        warn!(
            samples = samples_tested,
            estimate, "No ray reached the far wall; using bounding-box estimate"
        );
        return WallThicknessReport {
            min: estimate,
            average: estimate,
            samples_tested,
            hits: 0,
            thin_faces: Vec::new(),
            source: ThicknessSource::BoundingBoxHeuristic,
        };
    }

    let hits = measured.len();
    let min = measured
        .iter()
        .map(|&(_, t)| t)
        .fold(f64::INFINITY, f64::min);
    let average = measured.iter().map(|&(_, t)| t).sum::<f64>() / hits as f64;
    let thin_faces: Vec<u32> = measured
        .iter()
        .filter(|&&(_, t)| t < min_thickness)
        .map(|&(face, _)| face)
        .collect();

    debug!(hits, min, average, thin = thin_faces.len(), "Wall thickness measured");

    WallThicknessReport {
        min,
        average,
        samples_tested,
        hits,
        thin_faces,
        source: ThicknessSource::RayCast,
    }
}

fn inverse_direction(direction: &Vector3<f64>) -> Vector3<f64> {
    let inv = |d: f64| {
        if d.abs() > EPSILON {
            1.0 / d
        } else if d >= 0.0 {
            f64::MAX
        } else {
            f64::MIN
        }
    };
    Vector3::new(inv(direction.x), inv(direction.y), inv(direction.z))
}

struct RayQuery {
    origin: Point3<f64>,
    direction: Vector3<f64>,
    dir_inv: Vector3<f64>,
    skip_face: usize,
}

/// Axis-aligned bounding box for spatial acceleration.
#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    fn from_triangle(tri: &Triangle) -> Self {
        let min = Point3::new(
            tri.v0.x.min(tri.v1.x).min(tri.v2.x),
            tri.v0.y.min(tri.v1.y).min(tri.v2.y),
            tri.v0.z.min(tri.v1.z).min(tri.v2.z),
        );
        let max = Point3::new(
            tri.v0.x.max(tri.v1.x).max(tri.v2.x),
            tri.v0.y.max(tri.v1.y).max(tri.v2.y),
            tri.v0.z.max(tri.v1.z).max(tri.v2.z),
        );
        Self { min, max }
    }

    fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow by epsilon so flat boxes still register hits.
    fn expand(&self, epsilon: f64) -> Self {
        let pad = Vector3::repeat(epsilon);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Slab test. Returns the entry distance, or None on a miss.
    fn ray_entry(&self, origin: &Point3<f64>, dir_inv: &Vector3<f64>) -> Option<f64> {
        let t1 = (self.min.x - origin.x) * dir_inv.x;
        let t2 = (self.max.x - origin.x) * dir_inv.x;
        let t3 = (self.min.y - origin.y) * dir_inv.y;
        let t4 = (self.max.y - origin.y) * dir_inv.y;
        let t5 = (self.min.z - origin.z) * dir_inv.z;
        let t6 = (self.max.z - origin.z) * dir_inv.z;

        let t_min = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let t_max = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

/// Median-split BVH over triangle indices.
#[derive(Debug)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        face_idx: usize,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn build(triangles: &[Triangle], indices: &mut [usize]) -> Option<Self> {
        match indices.len() {
            0 => return None,
            1 => {
                let idx = indices[0];
                return Some(BvhNode::Leaf {
                    aabb: Aabb::from_triangle(&triangles[idx]).expand(EPSILON),
                    face_idx: idx,
                });
            }
            _ => {}
        }

        let combined = indices
            .iter()
            .skip(1)
            .fold(Aabb::from_triangle(&triangles[indices[0]]), |acc, &idx| {
                acc.merge(&Aabb::from_triangle(&triangles[idx]))
            })
            .expand(EPSILON);

        // Split along the longest extent
        let extent = combined.max - combined.min;
        let axis = extent.imax();

        indices.sort_by(|&a, &b| {
            let ca = triangles[a].centroid()[axis];
            let cb = triangles[b].centroid()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = indices.len() / 2;
        let (left_indices, right_indices) = indices.split_at_mut(mid);

        let left = BvhNode::build(triangles, left_indices);
        let right = BvhNode::build(triangles, right_indices);

        match (left, right) {
            (Some(l), Some(r)) => Some(BvhNode::Internal {
                aabb: combined,
                left: Box::new(l),
                right: Box::new(r),
            }),
            (Some(n), None) | (None, Some(n)) => Some(n),
            (None, None) => None,
        }
    }

    fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// Closest accepted hit as (distance, face).
    ///
    /// Only faces whose outward normal points along the ray are accepted:
    /// those are the far side of the wall the ray started in.
    fn trace(
        &self,
        ray: &RayQuery,
        triangles: &[Triangle],
        normals: &[Option<Vector3<f64>>],
        max_dist: f64,
    ) -> Option<(f64, usize)> {
        match self.aabb().ray_entry(&ray.origin, &ray.dir_inv) {
            Some(t_near) if t_near <= max_dist => {}
            _ => return None,
        }

        match self {
            BvhNode::Leaf { face_idx, .. } => {
                if *face_idx == ray.skip_face {
                    return None;
                }
                let facing_away = normals[*face_idx]
                    .is_some_and(|n| n.dot(&ray.direction) > 0.0);
                if !facing_away {
                    return None;
                }
                if let Some(t) = ray_triangle_intersect(&ray.origin, &ray.direction, &triangles[*face_idx])
                    && t <= max_dist
                {
                    return Some((t, *face_idx));
                }
                None
            }
            BvhNode::Internal { left, right, .. } => {
                let hit_left = left.trace(ray, triangles, normals, max_dist);
                let bound = hit_left.map(|(t, _)| t).unwrap_or(max_dist);
                let hit_right = right.trace(ray, triangles, normals, bound);

                match (hit_left, hit_right) {
                    (Some(l), Some(r)) => Some(if l.0 <= r.0 { l } else { r }),
                    (Some(h), None) | (None, Some(h)) => Some(h),
                    (None, None) => None,
                }
            }
        }
    }
}

/// Möller–Trumbore ray-triangle intersection.
/// Returns the distance along the ray if the triangle is hit in front of it.
fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    tri: &Triangle,
) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);

    if t > EPSILON { Some(t) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use approx::assert_relative_eq;

    fn bbox_of(mesh: &Mesh) -> BoundingBox {
        let (min, max) = mesh.bounds();
        BoundingBox::from_corners(min, max)
    }

    fn estimate(mesh: &Mesh, min_thickness: f64) -> WallThicknessReport {
        estimate_thickness(mesh, &bbox_of(mesh), min_thickness, 500, 1000.0)
    }

    #[test]
    fn test_sample_stride() {
        assert_eq!(sample_stride(12, 500), 1);
        assert_eq!(sample_stride(500, 500), 1);
        assert_eq!(sample_stride(501, 500), 2);
        assert_eq!(sample_stride(100_000, 500), 200);
        assert_eq!(sample_stride(0, 500), 1);
        assert_eq!(sample_stride(10, 0), 10);
    }

    #[test]
    fn test_sample_cap_is_respected() {
        let mesh = shapes::uv_sphere(5.0, 64, 64);
        let report = estimate_thickness(&mesh, &bbox_of(&mesh), 1.0, 100, 1000.0);
        assert!(report.samples_tested <= 100);
        assert!(report.samples_tested > 0);
    }

    #[test]
    fn test_ray_triangle_hit() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let origin = Point3::new(0.25, 0.25, 1.0);
        let t = ray_triangle_intersect(&origin, &Vector3::new(0.0, 0.0, -1.0), &tri);
        assert_relative_eq!(t.unwrap(), 1.0, epsilon = 1e-12);
        assert!(ray_triangle_intersect(&origin, &Vector3::new(0.0, 0.0, 1.0), &tri).is_none());
    }

    #[test]
    fn test_cube_thickness_is_edge_length() {
        let report = estimate(&shapes::cube(10.0), 2.0);
        assert_eq!(report.source, ThicknessSource::RayCast);
        assert_eq!(report.samples_tested, 12);
        assert_eq!(report.hits, 12);
        assert_relative_eq!(report.min, 10.0, epsilon = 1e-4);
        assert_relative_eq!(report.average, 10.0, epsilon = 1e-4);
        assert!(report.thin_faces.is_empty());
    }

    #[test]
    fn test_thin_plate_is_flagged() {
        let report = estimate(&shapes::cuboid(100.0, 100.0, 1.0), 2.0);
        assert_eq!(report.source, ThicknessSource::RayCast);
        assert_relative_eq!(report.min, 1.0, epsilon = 1e-4);
        // Top and bottom faces, two triangles each
        assert_eq!(report.thin_faces, vec![0, 1, 2, 3]);
        assert!(report.is_thin(2.0));
    }

    #[test]
    fn test_inverted_mesh_falls_back_to_heuristic() {
        let mesh = shapes::cuboid(40.0, 20.0, 10.0).inverted();
        let report = estimate(&mesh, 2.0);
        assert_eq!(report.source, ThicknessSource::BoundingBoxHeuristic);
        assert_eq!(report.hits, 0);
        assert_relative_eq!(report.min, 10.0);
    }

    #[test]
    fn test_open_mesh_falls_back_to_heuristic() {
        let mesh = Mesh::from_soup(vec![
            crate::Vertex::from_coords(0.0, 0.0, 0.0),
            crate::Vertex::from_coords(10.0, 0.0, 0.0),
            crate::Vertex::from_coords(0.0, 10.0, 0.0),
        ])
        .unwrap();
        let report = estimate(&mesh, 2.0);
        assert_eq!(report.source, ThicknessSource::BoundingBoxHeuristic);
        assert_eq!(report.min, 0.0);
    }

    #[test]
    fn test_heuristic_halves_slender_parts() {
        let slender = BoundingBox::from_corners(Point3::origin(), Point3::new(200.0, 10.0, 5.0));
        assert_relative_eq!(heuristic_thickness(&slender), 2.5);
        let stocky = BoundingBox::from_corners(Point3::origin(), Point3::new(20.0, 10.0, 5.0));
        assert_relative_eq!(heuristic_thickness(&stocky), 5.0);
    }

    #[test]
    fn test_max_ray_distance_limits_hits() {
        let mesh = shapes::cube(10.0);
        let report = estimate_thickness(&mesh, &bbox_of(&mesh), 2.0, 500, 5.0);
        assert_eq!(report.source, ThicknessSource::BoundingBoxHeuristic);
    }
}
