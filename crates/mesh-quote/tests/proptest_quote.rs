//! Property-based tests for analysis, pricing and the geometry cache.
//!
//! Run with: cargo test -p mesh-quote -- proptest

use mesh_quote::cache::{CacheConfig, ContentDigest, GeometryCache};
use mesh_quote::cost::{self, Catalog, QuoteConfig, ToleranceClass};
use mesh_quote::dfm::{self, DfmConfig};
use mesh_quote::{Mesh, Vertex, geometry, shapes};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Box dimensions between 0.5 and 200 mm.
fn arb_dims() -> impl Strategy<Value = (f64, f64, f64)> {
    (0.5..200.0f64, 0.5..200.0f64, 0.5..200.0f64)
}

/// A random triangle soup with coordinates in ±100 mm.
fn arb_soup() -> impl Strategy<Value = Mesh> {
    prop::collection::vec(prop::array::uniform3(-100.0..100.0f64), 1..40).prop_map(|tris| {
        let vertices = tris
            .iter()
            .flat_map(|[a, b, c]| {
                [
                    Vertex::from_coords(*a, *b, *c),
                    Vertex::from_coords(*b, *c, *a),
                    Vertex::from_coords(*c, *a, *b),
                ]
            })
            .collect();
        Mesh::from_soup(vertices).unwrap()
    })
}

fn arb_tolerance() -> impl Strategy<Value = ToleranceClass> {
    prop_oneof![
        Just(ToleranceClass::Standard),
        Just(ToleranceClass::Precision),
        Just(ToleranceClass::Tight),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, size: u64 },
    Get { key: u8 },
    Remove { key: u8 },
}

fn arb_cache_op() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (0u8..16, 1u64..400).prop_map(|(key, size)| CacheOp::Put { key, size }),
        3 => (0u8..16).prop_map(|key| CacheOp::Get { key }),
        1 => (0u8..16).prop_map(|key| CacheOp::Remove { key }),
    ]
}

// =============================================================================
// Geometry
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_volume_ignores_winding(mesh in arb_soup()) {
        let forward = geometry::analyze(&mesh).unwrap();
        let backward = geometry::analyze(&mesh.inverted()).unwrap();

        prop_assert!(forward.volume >= 0.0);
        prop_assert!((forward.volume - backward.volume).abs() <= 1e-6 + 1e-9 * forward.volume);
        prop_assert!((forward.surface_area - backward.surface_area).abs() <= 1e-6 + 1e-9 * forward.surface_area);
    }

    #[test]
    fn proptest_cuboid_measurements((x, y, z) in arb_dims()) {
        let analysis = geometry::analyze(&shapes::cuboid(x, y, z)).unwrap();
        let volume = x * y * z;
        let area = 2.0 * (x * y + y * z + x * z);

        prop_assert!((analysis.volume - volume).abs() <= 1e-9 * volume);
        prop_assert!((analysis.surface_area - area).abs() <= 1e-9 * area);
        prop_assert!((0.0..=100.0).contains(&analysis.complexity_score));
    }

    // =========================================================================
    // DFM and cost
    // =========================================================================

    #[test]
    fn proptest_dfm_outputs_are_bounded(mesh in arb_soup(), angle in 1.0..89.0f64) {
        let analysis = geometry::analyze(&mesh).unwrap();
        let config = DfmConfig { overhang_angle_deg: angle, ..DfmConfig::default() };
        let result = dfm::analyze(&mesh, &analysis, &config).unwrap();

        prop_assert!((0.0..=100.0).contains(&result.manufacturability_score));
        prop_assert!((0.0..=100.0).contains(&result.overhang_percentage));
        prop_assert!(result.overhang_zones.len() <= 1);
        if result.requires_5_axis {
            prop_assert!(!result.overhang_zones.is_empty());
        }
        if let Some(min) = result.min_wall_thickness {
            prop_assert!(min >= 0.0);
        }
    }

    #[test]
    fn proptest_batch_total_grows_with_quantity(
        (x, y, z) in arb_dims(),
        quantity in 1u32..500,
        tolerance in arb_tolerance(),
    ) {
        let analysis = geometry::analyze(&shapes::cuboid(x, y, z)).unwrap();
        let catalog = Catalog::standard();
        let base = QuoteConfig::new("steel-1018", "anodized", quantity).with_tolerance(tolerance);
        let more = QuoteConfig::new("steel-1018", "anodized", quantity + 1).with_tolerance(tolerance);

        let a = cost::estimate(&analysis, None, &base, &catalog).unwrap();
        let b = cost::estimate(&analysis, None, &more, &catalog).unwrap();

        prop_assert!(b.batch.total > a.batch.total);
        prop_assert!(b.per_unit.setup < a.per_unit.setup);
        prop_assert!(a.lead_time.min_days <= a.lead_time.max_days);
        prop_assert!(a.per_unit.total > 0.0);
    }

    // =========================================================================
    // Cache
    // =========================================================================

    #[test]
    fn proptest_cache_never_exceeds_budget(
        capacity in 100u64..1000,
        ops in prop::collection::vec(arb_cache_op(), 1..60),
    ) {
        let cache = GeometryCache::in_memory(CacheConfig::with_capacity(capacity));
        let mesh = shapes::cube(1.0);
        let analysis = geometry::analyze(&mesh).unwrap();

        for op in ops {
            match op {
                CacheOp::Put { key, size } => {
                    let stored = cache
                        .put(ContentDigest::of(&[key]), "p.stl", size, &mesh, &analysis)
                        .unwrap();
                    prop_assert_eq!(stored, size <= capacity);
                    if stored {
                        prop_assert!(cache.contains(&ContentDigest::of(&[key])));
                    }
                }
                CacheOp::Get { key } => {
                    let present = cache.contains(&ContentDigest::of(&[key]));
                    let hit = cache.get(&ContentDigest::of(&[key])).unwrap();
                    prop_assert_eq!(hit.is_some(), present);
                }
                CacheOp::Remove { key } => {
                    cache.remove(&ContentDigest::of(&[key])).unwrap();
                }
            }

            let stats = cache.stats();
            prop_assert!(stats.total_size <= capacity);
            let summed: u64 = cache.entries().iter().map(|e| e.byte_size).sum();
            prop_assert_eq!(summed, stats.total_size);
        }
    }

    #[test]
    fn proptest_eviction_is_oldest_first(sizes in prop::collection::vec(10u64..100, 2..20)) {
        let capacity = 250;
        let cache = GeometryCache::in_memory(CacheConfig::with_capacity(capacity));
        let mesh = shapes::cube(1.0);
        let analysis = geometry::analyze(&mesh).unwrap();

        for (i, size) in sizes.iter().enumerate() {
            cache.put(ContentDigest::of(&i.to_le_bytes()), "p.stl", *size, &mesh, &analysis).unwrap();
        }

        // Survivors are exactly the newest suffix that fits
        let mut expected = Vec::new();
        let mut total = 0;
        for (i, size) in sizes.iter().enumerate().rev() {
            if total + size > capacity {
                break;
            }
            total += size;
            expected.push(ContentDigest::of(&i.to_le_bytes()));
        }

        let survivors: Vec<ContentDigest> = cache.entries().into_iter().map(|e| e.digest).collect();
        prop_assert_eq!(survivors, expected);
    }
}
