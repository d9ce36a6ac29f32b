//! Geometry analysis, manufacturability checks and cost estimation for CNC
//! machined parts.
//!
//! This crate takes an uploaded triangle mesh and answers three questions
//! for an instant-quote workflow: how big and how complex is the part, how
//! hard is it to machine, and what will it cost.
//!
//! # Features
//!
//! - **Ingestion**: Binary and ASCII STL, with a size cap and progress callbacks
//! - **Geometry**: Volume, surface area, bounding box and a complexity score
//! - **DFM**: Overhang detection, ray-cast wall thickness, surface classification
//! - **Costing**: Material, machining, setup and finishing from a rate catalog
//! - **Caching**: Content-addressed LRU cache of parsed meshes with a byte budget
//!
//! # Units and Scale
//!
//! **This library assumes millimeter (mm) units.**
//!
//! - Densities are in g/cm³ and prices in USD/kg
//! - Finish costs are per cm² of surface
//! - Wall thickness defaults to a 2mm minimum
//! - Ray casting max distance defaults to 1000mm (1 meter)
//!
//! # Coordinate System
//!
//! Right-handed, with Z up. The tool approaches from +Z, so faces whose
//! normals point down are the ones that can overhang. Face winding is
//! counter-clockwise when viewed from outside.
//!
//! # Quick Start
//!
//! ```
//! use mesh_quote::cost::{self, Catalog, QuoteConfig};
//! use mesh_quote::{dfm, geometry, shapes};
//!
//! let mesh = shapes::cuboid(40.0, 20.0, 10.0);
//! let analysis = geometry::analyze(&mesh).unwrap();
//! let assessment = dfm::analyze(&mesh, &analysis, &dfm::DfmConfig::default()).unwrap();
//!
//! let config = QuoteConfig::new("aluminum-6061", "anodized", 25);
//! let estimate = cost::estimate(&analysis, Some(&assessment), &config, &Catalog::standard()).unwrap();
//!
//! println!("{} mm³, score {:.0}", analysis.volume, assessment.manufacturability_score);
//! println!("{:.2} {} per unit", estimate.per_unit.total, estimate.currency);
//! ```
//!
//! # Loading uploads with a cache
//!
//! ```no_run
//! use std::sync::Arc;
//! use mesh_quote::cache::{CacheConfig, GeometryCache};
//! use mesh_quote::pipeline::load_part;
//! use mesh_quote::stl::IngestOptions;
//!
//! let cache = Arc::new(GeometryCache::open_dir("/var/cache/parts", CacheConfig::default()).unwrap());
//! let bytes = std::fs::read("bracket.stl").unwrap();
//!
//! let part = load_part(&bytes, "bracket.stl", None, Some(&cache), &IngestOptions::default(), None)
//!     .unwrap();
//! println!("{} triangles, cached: {}", part.mesh.face_count(), part.from_cache);
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `QuoteResult<T>`, which is `Result<T, QuoteError>`.
//! Every error carries a `PART-XXXX` code and a recovery suggestion.
//!
//! ```
//! use mesh_quote::{ErrorCode, QuoteError, stl};
//! use mesh_quote::progress::ProgressReporter;
//!
//! let reporter = ProgressReporter::silent();
//! match stl::decode(b"solid empty\nendsolid empty\n", &Default::default(), &reporter.stage(0.0, 1.0)) {
//!     Ok(_) => unreachable!(),
//!     Err(e) => {
//!         assert_eq!(e.code(), ErrorCode::EmptyMesh);
//!         println!("{}: {}", e.code(), e.recovery_suggestion());
//!     }
//! }
//! ```

mod error;
pub mod tracing_ext;
mod types;

pub mod cache;
pub mod cost;
pub mod dfm;
pub mod geometry;
pub mod pipeline;
pub mod progress;
pub mod shapes;
pub mod stl;
pub mod worker;

// Re-export core types at crate root
pub use error::{ErrorCode, QuoteError, QuoteResult, RecoverySuggestion};
pub use geometry::{BoundingBox, ComplexityLevel, GeometryAnalysis};
pub use types::{Mesh, Triangle, Vertex};
