//! Core mesh data types.
//!
//! A [`Mesh`] is built once by ingestion (or by [`crate::shapes`]) and is never
//! mutated afterwards. Stages that need a different mesh, such as
//! [`Mesh::inverted`], return a new value.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};

/// Squared length below which a normal is considered absent.
const NORMAL_EPSILON_SQ: f64 = 1e-12;

/// A mesh vertex: position in millimeters plus an optional unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// 3D position (mm).
    pub position: Point3<f64>,

    /// Unit normal, taken from the file's facet normal when present.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with position and normal.
    ///
    /// Zero-length or non-finite normals are dropped so that later stages fall
    /// back to the winding normal.
    #[inline]
    pub fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        let len_sq = normal.norm_squared();
        let normal = if len_sq.is_finite() && len_sq > NORMAL_EPSILON_SQ {
            Some(normal / len_sq.sqrt())
        } else {
            None
        };
        Self { position, normal }
    }
}

/// An immutable triangle mesh with indexed vertices and faces.
///
/// Ingested STL data is an unindexed triangle soup: every face owns three
/// consecutive vertices. Indexed meshes (for example from [`crate::shapes`])
/// share vertices between faces. All downstream stages only use the face list,
/// so both forms behave identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshData")]
pub struct Mesh {
    vertices: Vec<Vertex>,
    faces: Vec<[u32; 3]>,
}

/// Wire form of [`Mesh`]; deserialized data is re-validated before use.
#[derive(Deserialize)]
struct MeshData {
    vertices: Vec<Vertex>,
    faces: Vec<[u32; 3]>,
}

impl TryFrom<MeshData> for Mesh {
    type Error = QuoteError;

    fn try_from(data: MeshData) -> QuoteResult<Self> {
        Mesh::from_indexed(data.vertices, data.faces)
    }
}

impl Mesh {
    /// Build a mesh from a triangle soup (three vertices per face).
    pub fn from_soup(vertices: Vec<Vertex>) -> QuoteResult<Self> {
        if vertices.is_empty() {
            return Err(QuoteError::empty_mesh("triangle soup has no vertices"));
        }
        if vertices.len() % 3 != 0 {
            return Err(QuoteError::invalid_mesh(format!(
                "triangle soup has {} vertices, which is not a multiple of 3",
                vertices.len()
            )));
        }
        let face_count = vertices.len() / 3;
        if face_count > u32::MAX as usize / 3 {
            return Err(QuoteError::invalid_mesh("too many triangles for 32-bit indices"));
        }
        let faces = (0..face_count as u32)
            .map(|f| [3 * f, 3 * f + 1, 3 * f + 2])
            .collect();
        Ok(Self { vertices, faces })
    }

    /// Build a mesh from shared vertices and index triples.
    pub fn from_indexed(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> QuoteResult<Self> {
        if faces.is_empty() {
            return Err(QuoteError::empty_mesh("mesh has no faces"));
        }
        if vertices.is_empty() {
            return Err(QuoteError::invalid_mesh("faces reference an empty vertex buffer"));
        }
        let vertex_count = vertices.len();
        for (face_index, face) in faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(QuoteError::invalid_mesh(format!(
                    "face {} references vertex {}, but mesh only has {} vertices",
                    face_index, bad, vertex_count
                )));
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Vertex data.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle faces as indices into the vertex array.
    #[inline]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether any vertex carries a normal.
    pub fn has_normals(&self) -> bool {
        self.vertices.iter().any(|v| v.normal.is_some())
    }

    /// Compute the axis-aligned bounding box as (min_corner, max_corner).
    ///
    /// A mesh without vertices (only reachable through deserialization)
    /// reports a degenerate box at the origin.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let Some(first) = self.vertices.first() else {
            return (Point3::origin(), Point3::origin());
        };
        let mut min = first.position;
        let mut max = first.position;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        (min, max)
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Unit normal of a face.
    ///
    /// Averages the (up to three) vertex normals and normalizes the sum. When
    /// no vertex normal is present, or they cancel out, the winding normal is
    /// used instead. Returns `None` for degenerate faces without normals.
    pub fn face_normal(&self, face_idx: usize) -> Option<Vector3<f64>> {
        let face = self.faces.get(face_idx)?;
        let mut sum = Vector3::zeros();
        let mut count = 0;
        for &i in face {
            if let Some(n) = self.vertices[i as usize].normal {
                sum += n;
                count += 1;
            }
        }
        if count > 0 && sum.norm_squared() > NORMAL_EPSILON_SQ {
            return Some(sum.normalize());
        }
        self.triangle(face_idx).and_then(|tri| tri.normal())
    }

    /// Return a copy with reversed winding and negated normals.
    pub fn inverted(&self) -> Mesh {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                position: v.position,
                normal: v.normal.map(|n| -n),
            })
            .collect();
        let faces = self.faces.iter().map(|&[a, b, c]| [a, c, b]).collect();
        Mesh { vertices, faces }
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Uses the divergence theorem: the signed volume is the sum of signed tetrahedra
    /// volumes formed by each face and the origin. For a closed mesh with outward-facing
    /// normals (CCW winding when viewed from outside), this returns a positive value.
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;

        for &[i0, i1, i2] in &self.faces {
            let v0 = &self.vertices[i0 as usize].position;
            let v1 = &self.vertices[i1 as usize].position;
            let v2 = &self.vertices[i2 as usize].position;

            // v0 · (v1 × v2), divided by 6 once at the end
            volume += v0.coords.dot(&v1.coords.cross(&v2.coords));
        }

        volume / 6.0
    }

    /// Compute the absolute volume of the mesh.
    ///
    /// Inward-facing (flipped) meshes report the same positive volume.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}

/// A triangle with concrete vertex positions.
///
/// Utility type for geometric calculations. Winding is counter-clockwise
/// when viewed from the front (normal points toward viewer).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    /// The direction follows the right-hand rule with CCW winding.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns None for degenerate triangles (zero area).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON * f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid (center of mass).
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }
}
