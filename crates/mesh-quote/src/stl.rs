//! STL (Stereolithography) decoding and encoding.
//!
//! Both variants of the format are normalized into one [`Mesh`]: an
//! unindexed triangle soup whose vertices carry the facet normal.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (ignored, often contains file info)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector (often zero)
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (usually 0)
//! end
//! ```
//!
//! # ASCII Format
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//! endsolid name
//! ```

use std::cell::Cell;
use std::io::{Read, Write};

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use crate::error::{QuoteError, QuoteResult};
use crate::progress::StageProgress;
use crate::types::{Mesh, Vertex};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Default upload cap (50 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
}

impl MeshFormat {
    /// Detect format from a file name's extension.
    pub fn from_file_name(file_name: &str) -> QuoteResult<Self> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("stl") => Ok(MeshFormat::Stl),
            _ => Err(QuoteError::UnsupportedFormat { extension }),
        }
    }
}

/// The two encodings of STL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlEncoding {
    Binary,
    Ascii,
}

impl StlEncoding {
    /// Sniff the encoding from file contents.
    ///
    /// Binary files whose header happens to start with `solid` are common, so
    /// a matching binary record count wins over the ASCII keyword.
    pub fn detect(bytes: &[u8]) -> Self {
        if binary_size_matches(bytes) {
            return StlEncoding::Binary;
        }
        let head = &bytes[..bytes.len().min(1024)];
        let text = String::from_utf8_lossy(head);
        let trimmed = text.trim_start();
        let starts_with_solid = trimmed
            .get(..5)
            .is_some_and(|s| s.eq_ignore_ascii_case("solid"));
        if starts_with_solid && (text.contains("facet") || text.contains("endsolid")) {
            StlEncoding::Ascii
        } else {
            StlEncoding::Binary
        }
    }
}

/// Options for [`decode`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Inputs larger than this are rejected before parsing.
    pub max_bytes: u64,
    /// Declared encoding; `None` auto-detects.
    pub encoding: Option<StlEncoding>,
    /// Triangles between progress reports.
    pub progress_interval: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            encoding: None,
            progress_interval: 4096,
        }
    }
}

impl IngestOptions {
    /// Options with a custom size cap.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }
}

fn binary_size_matches(bytes: &[u8]) -> bool {
    match declared_face_count(bytes) {
        Some(count) => bytes.len() as u64 == expected_binary_len(count),
        None => false,
    }
}

fn declared_face_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn expected_binary_len(face_count: u32) -> u64 {
    (HEADER_SIZE + 4) as u64 + face_count as u64 * TRIANGLE_SIZE as u64
}

/// Decode STL bytes into a mesh.
///
/// Fails with `SizeLimit` before touching the data if it is over the cap,
/// `Format` for corrupt or truncated content, and `EmptyMesh` when no
/// facets are present.
pub fn decode(bytes: &[u8], options: &IngestOptions, progress: &StageProgress) -> QuoteResult<Mesh> {
    let size = bytes.len() as u64;
    if size > options.max_bytes {
        return Err(QuoteError::SizeLimit {
            size,
            limit: options.max_bytes,
        });
    }

    let encoding = options.encoding.unwrap_or_else(|| StlEncoding::detect(bytes));
    info!(bytes = size, ?encoding, "Decoding STL");

    let consumed = Cell::new(0usize);
    let mut reader = CountingReader {
        inner: bytes,
        consumed: &consumed,
    };
    let triangles = match encoding {
        StlEncoding::Binary => {
            check_binary_layout(bytes)?;
            stl_io::BinaryStlReader::create_triangle_iterator(&mut reader)
        }
        StlEncoding::Ascii => stl_io::AsciiStlReader::create_triangle_iterator(&mut reader),
    }
    .map_err(|e| QuoteError::format(format!("invalid STL header: {}", e)))?;

    let interval = options.progress_interval.max(1);
    let mut vertices = Vec::new();
    for (i, triangle) in triangles.enumerate() {
        let triangle =
            triangle.map_err(|e| QuoteError::format(format!("facet {}: {}", i, e)))?;
        let normal = Vector3::from(<[f32; 3]>::from(triangle.normal).map(f64::from));
        for v in &triangle.vertices {
            vertices.push(finite_vertex(<[f32; 3]>::from(*v).map(f64::from), normal, i)?);
        }
        if (i + 1) % interval == 0 {
            progress.report_count(consumed.get().min(bytes.len()), bytes.len(), "parsing STL");
        }
    }

    if vertices.is_empty() {
        return Err(QuoteError::empty_mesh("STL contains no facets"));
    }

    let mesh = Mesh::from_soup(vertices)?;
    progress.finish("parsed");
    debug!(faces = mesh.face_count(), "Decoded STL");
    Ok(mesh)
}

/// Tracks how far the STL reader has got through the input.
struct CountingReader<'a, R> {
    inner: R,
    consumed: &'a Cell<usize>,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed.set(self.consumed.get() + n);
        Ok(n)
    }
}

/// Reject binary data too short for its declared record count.
fn check_binary_layout(bytes: &[u8]) -> QuoteResult<()> {
    let face_count = declared_face_count(bytes).ok_or_else(|| {
        QuoteError::format(format!(
            "binary STL needs at least {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        ))
    })?;

    let expected = expected_binary_len(face_count);
    let actual = bytes.len() as u64;
    if actual < expected {
        let complete = (actual - (HEADER_SIZE + 4) as u64) / TRIANGLE_SIZE as u64;
        return Err(QuoteError::format(format!(
            "binary STL declares {} triangles but only {} are present",
            face_count, complete
        )));
    }
    if actual > expected {
        warn!(
            extra_bytes = actual - expected,
            "Ignoring trailing bytes after binary STL records"
        );
    }
    Ok(())
}

fn finite_vertex(position: [f64; 3], normal: Vector3<f64>, facet: usize) -> QuoteResult<Vertex> {
    if position.iter().any(|c| !c.is_finite()) {
        return Err(QuoteError::format(format!(
            "facet {} has a non-finite vertex coordinate",
            facet
        )));
    }
    Ok(Vertex::with_normal(Point3::from(position), normal))
}

/// Encode a mesh as binary STL.
pub fn write_binary_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    let triangles: Vec<stl_io::Triangle> = (0..mesh.face_count())
        .filter_map(|f| {
            let tri = mesh.triangle(f)?;
            let n = mesh.face_normal(f).unwrap_or_else(Vector3::zeros);
            Some(stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([tri.v0.x as f32, tri.v0.y as f32, tri.v0.z as f32]),
                    stl_io::Vertex::new([tri.v1.x as f32, tri.v1.y as f32, tri.v1.z as f32]),
                    stl_io::Vertex::new([tri.v2.x as f32, tri.v2.y as f32, tri.v2.z as f32]),
                ],
            })
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Encode a mesh as ASCII STL.
pub fn write_ascii_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "solid {}", name)?;
    for (f, tri) in mesh.triangles().enumerate() {
        let n = mesh.face_normal(f).unwrap_or_else(Vector3::zeros);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in [tri.v0, tri.v1, tri.v2] {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)?;
    Ok(())
}

/// Encode a mesh as binary STL into a fresh buffer.
pub fn to_binary_bytes(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + mesh.face_count() * TRIANGLE_SIZE);
    // Writing into a Vec cannot fail.
    let _ = write_binary_stl(mesh, &mut out);
    out
}

/// Encode a mesh as ASCII STL into a fresh buffer.
pub fn to_ascii_bytes(mesh: &Mesh, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = write_ascii_stl(mesh, name, &mut out);
    out
}
