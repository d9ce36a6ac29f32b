//! Reference shapes with known volume and surface area.
//!
//! Used as fixtures and by the CLI `sample` command. All shapes are closed,
//! indexed and wound counter-clockwise when viewed from outside.

use std::f64::consts::PI;

use crate::types::{Mesh, Vertex};

/// Axis-aligned box spanning `[0, sx] × [0, sy] × [0, sz]`.
pub fn cuboid(sx: f64, sy: f64, sz: f64) -> Mesh {
    let vertices = vec![
        Vertex::from_coords(0.0, 0.0, 0.0), // 0
        Vertex::from_coords(sx, 0.0, 0.0),  // 1
        Vertex::from_coords(sx, sy, 0.0),   // 2
        Vertex::from_coords(0.0, sy, 0.0),  // 3
        Vertex::from_coords(0.0, 0.0, sz),  // 4
        Vertex::from_coords(sx, 0.0, sz),   // 5
        Vertex::from_coords(sx, sy, sz),    // 6
        Vertex::from_coords(0.0, sy, sz),   // 7
    ];

    let faces = vec![
        // Bottom face (z=0)
        [0, 2, 1],
        [0, 3, 2],
        // Top face (z=sz)
        [4, 5, 6],
        [4, 6, 7],
        // Front face (y=0)
        [0, 1, 5],
        [0, 5, 4],
        // Back face (y=sy)
        [3, 7, 6],
        [3, 6, 2],
        // Left face (x=0)
        [0, 4, 7],
        [0, 7, 3],
        // Right face (x=sx)
        [1, 2, 6],
        [1, 6, 5],
    ];

    build(vertices, faces)
}

/// Cube with the given edge length.
pub fn cube(size: f64) -> Mesh {
    cuboid(size, size, size)
}

/// Latitude/longitude sphere centered at the origin.
///
/// `segments` subdivides longitude, `rings` latitude. Pole rows keep one
/// vertex per segment so the indexing stays regular; the degenerate pole
/// triangles are not emitted.
pub fn uv_sphere(radius: f64, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let row = segments + 1;

    let mut vertices = Vec::with_capacity((row * (rings + 1)) as usize);
    for i in 0..=rings {
        let phi = PI * i as f64 / rings as f64;
        for j in 0..=segments {
            let theta = 2.0 * PI * j as f64 / segments as f64;
            vertices.push(Vertex::from_coords(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ));
        }
    }

    let mut faces = Vec::with_capacity((2 * segments * rings) as usize);
    for i in 0..rings {
        for j in 0..segments {
            let a = i * row + j;
            let b = a + row;
            let c = b + 1;
            let d = a + 1;
            if i != 0 {
                faces.push([a, b, d]);
            }
            if i != rings - 1 {
                faces.push([b, c, d]);
            }
        }
    }

    build(vertices, faces)
}

/// Closed cylinder standing on the XY plane, axis along +Z.
pub fn cylinder(radius: f64, height: f64, segments: u32) -> Mesh {
    let n = segments.max(3);

    let mut vertices = Vec::with_capacity(2 * n as usize + 2);
    for z in [0.0, height] {
        for i in 0..n {
            let theta = 2.0 * PI * i as f64 / n as f64;
            vertices.push(Vertex::from_coords(
                radius * theta.cos(),
                radius * theta.sin(),
                z,
            ));
        }
    }
    let bottom_center = 2 * n;
    let top_center = 2 * n + 1;
    vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    vertices.push(Vertex::from_coords(0.0, 0.0, height));

    let mut faces = Vec::with_capacity(4 * n as usize);
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push([i, j, n + j]);
        faces.push([i, n + j, n + i]);
        faces.push([bottom_center, j, i]);
        faces.push([top_center, n + i, n + j]);
    }

    build(vertices, faces)
}

/// Names accepted by [`by_name`].
pub const SHAPE_NAMES: &[&str] = &["cube", "plate", "sphere", "cylinder"];

/// Look up a reference shape by name, scaled by `size` (mm).
///
/// `plate` is a `size × size × size/100` slab, `sphere` and `cylinder` use
/// `size` as diameter.
pub fn by_name(name: &str, size: f64) -> Option<Mesh> {
    match name {
        "cube" => Some(cube(size)),
        "plate" => Some(cuboid(size, size, size / 100.0)),
        "sphere" => Some(uv_sphere(size / 2.0, 32, 32)),
        "cylinder" => Some(cylinder(size / 2.0, size, 64)),
        _ => None,
    }
}

fn build(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Mesh {
    match Mesh::from_indexed(vertices, faces) {
        Ok(mesh) => mesh,
        // Generated indices are always in range and non-empty.
        Err(e) => unreachable!("reference shape construction failed: {}", e),
    }
}
