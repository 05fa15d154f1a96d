// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Property-Based Tests (proptest) for multipac-geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for multipac-geometry using proptest.
//!
//! Covers: hit distances against analytic geometry, the segment-length
//! cutoff, intersection determinism, scalar/batch agreement.

use multipac_geometry::intersect::{ray_survey, segment_hits, DEFAULT_EPS};
use multipac_geometry::mesh::TriMesh;
use proptest::prelude::*;

/// One large triangle in the z = `height` plane covering x ≥ −100,
/// y ≥ −100, x + y ≤ 0.
fn plate_at(height: f64) -> TriMesh {
    TriMesh::new(
        vec![[-100.0, -100.0, height]],
        vec![[100.0, -100.0, height]],
        vec![[-100.0, 100.0, height]],
    )
    .expect("plate mesh")
}

// ── Segment Hits ─────────────────────────────────────────────────────

proptest! {
    /// A vertical segment piercing the plate hits it at exactly the plate
    /// height, one cell, one hit.
    #[test]
    fn vertical_segment_hits_plate_at_height(
        x in -40.0f64..40.0,
        y in -90.0f64..-50.0,
        z0 in -20.0f64..0.5,
        height in 1.0f64..50.0,
    ) {
        let mesh = plate_at(height);
        let start = [x, y, z0];
        let end = [x, y, height + 5.0];
        let hits = segment_hits(&mesh, start, end, DEFAULT_EPS);
        prop_assert_eq!(hits.len(), 1);
        prop_assert_eq!(hits[0].cell, 0);
        prop_assert!(
            (hits[0].distance - (height - z0)).abs() < 1e-9,
            "distance {} vs {}", hits[0].distance, height - z0
        );
        prop_assert!((hits[0].point[2] - height).abs() < 1e-9);
    }

    /// A segment ending below the plate never reports the crossing the
    /// full ray would make.
    #[test]
    fn segment_length_bounds_the_search(
        x in -40.0f64..40.0,
        y in -90.0f64..-50.0,
        height in 1.0f64..50.0,
        gap in 0.1f64..0.9,
    ) {
        let mesh = plate_at(height);
        let start = [x, y, -1.0];
        let end = [x, y, height - gap];
        prop_assert!(segment_hits(&mesh, start, end, DEFAULT_EPS).is_empty());
    }

    /// Repeating a query bit-for-bit repeats its hits.
    #[test]
    fn intersection_is_deterministic(
        x in -40.0f64..40.0,
        y in -90.0f64..-50.0,
        height in 1.0f64..50.0,
    ) {
        let mesh = plate_at(height);
        let start = [x, y, -2.0];
        let end = [x, y, height + 3.0];
        let a = segment_hits(&mesh, start, end, DEFAULT_EPS);
        let b = segment_hits(&mesh, start, end, DEFAULT_EPS);
        prop_assert_eq!(a.len(), b.len());
        for (ha, hb) in a.iter().zip(b.iter()) {
            prop_assert_eq!(ha.cell, hb.cell);
            prop_assert_eq!(ha.distance.to_bits(), hb.distance.to_bits());
            prop_assert_eq!(ha.point[2].to_bits(), hb.point[2].to_bits());
        }
    }
}

// ── Batch Survey ─────────────────────────────────────────────────────

proptest! {
    /// The batch survey agrees with the scalar path on whether and where a
    /// vertical ray meets the plate; head-on incidence reads angle 0.
    #[test]
    fn batch_survey_matches_scalar_hits(
        x in -40.0f64..40.0,
        y in -90.0f64..-50.0,
        z0 in -20.0f64..0.5,
        height in 1.0f64..50.0,
    ) {
        let mut mesh = plate_at(height);
        mesh.compute_cell_normals();
        let start = [x, y, z0];
        let up = [0.0, 0.0, 1.0];

        let scalar = segment_hits(&mesh, start, [x, y, height + 5.0], DEFAULT_EPS);
        let survey = ray_survey(&mesh, &[start], &[up], DEFAULT_EPS).unwrap();

        prop_assert!(survey.collisions[[0, 0]]);
        prop_assert_eq!(scalar.len(), 1);
        prop_assert!(
            (survey.distances[[0, 0]] - scalar[0].distance).abs() < 1e-9,
            "batch {} vs scalar {}", survey.distances[[0, 0]], scalar[0].distance
        );
        prop_assert!(survey.angles[[0, 0]].abs() < 1e-12);
    }
}
