// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Ray/Triangle Intersection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Möller–Trumbore intersection kernels.
//!
//! Two entry points share one kernel: `segment_hits` tests a finite segment
//! against every cell (trajectory collision search), `ray_survey` tests a
//! batch of half-infinite rays and fills dense boolean/distance/angle
//! matrices (histogramming over whole populations).

use multipac_types::error::{MultipacError, MultipacResult};
use ndarray::Array2;

use crate::mesh::TriMesh;
use crate::vec3::{add, cross, dot, norm, scale, sub};

/// Determinant cutoff for parallel-ray rejection, and the minimum travel
/// distance accepted as a hit.
pub const DEFAULT_EPS: f64 = 1e-6;

/// One segment/cell intersection. `distance` is metric when the query
/// direction is a unit vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub cell: usize,
    pub distance: f64,
    pub point: [f64; 3],
}

/// Barycentric-filtered line parameter of one ray against one cell.
fn moller_trumbore(
    origin: [f64; 3],
    direction: [f64; 3],
    v0: [f64; 3],
    v1: [f64; 3],
    v2: [f64; 3],
    eps: f64,
) -> Option<f64> {
    let e1 = sub(v1, v0);
    let e2 = sub(v2, v0);
    let pvec = cross(direction, e2);
    let det = dot(e1, pvec);
    if det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = sub(origin, v0);
    let u = dot(tvec, pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = cross(tvec, e1);
    let v = dot(direction, qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = dot(e2, qvec) * inv_det;
    if t < eps {
        return None;
    }
    Some(t)
}

/// Intersect the segment `start → end` with every mesh cell.
///
/// Hits come back in cell order, not distance order; callers that keep only
/// the first hit therefore keep the lowest cell index. A segment shorter
/// than `eps` yields no hits.
pub fn segment_hits(mesh: &TriMesh, start: [f64; 3], end: [f64; 3], eps: f64) -> Vec<SegmentHit> {
    let span = sub(end, start);
    let length = norm(span);
    if length <= eps {
        return Vec::new();
    }
    let direction = scale(span, 1.0 / length);

    let mut hits = Vec::new();
    for cell in 0..mesh.n_cells() {
        if let Some(t) = moller_trumbore(
            start,
            direction,
            mesh.v0()[cell],
            mesh.v1()[cell],
            mesh.v2()[cell],
            eps,
        ) {
            if t <= length {
                hits.push(SegmentHit {
                    cell,
                    distance: t,
                    point: add(start, scale(direction, t)),
                });
            }
        }
    }
    hits
}

/// Unsigned angle between a surface normal and an incident direction:
/// `|atan(|n×d| / n·d)|`, in `[0, π/2]` for well-formed geometry.
///
/// A zero normal (degenerate cell) propagates NaN instead of failing.
pub fn impact_angle(normal: [f64; 3], direction: [f64; 3]) -> f64 {
    let opposite = norm(cross(normal, direction));
    let adjacent = dot(normal, direction);
    (opposite / adjacent).atan().abs()
}

/// Dense result of a batched ray/mesh intersection pass.
///
/// All three matrices are `n_rays × n_cells`; `distances` and `angles` hold
/// NaN wherever `collisions` is false.
#[derive(Debug, Clone)]
pub struct RaySurvey {
    pub collisions: Array2<bool>,
    pub distances: Array2<f64>,
    pub angles: Array2<f64>,
}

/// Test every ray against every cell. Rays are half-infinite (`t ≥ eps`,
/// no far cutoff); pass unit directions to obtain metric distances.
pub fn ray_survey(
    mesh: &TriMesh,
    origins: &[[f64; 3]],
    directions: &[[f64; 3]],
    eps: f64,
) -> MultipacResult<RaySurvey> {
    if origins.len() != directions.len() {
        return Err(MultipacError::ShapeMismatch {
            left: origins.len(),
            right: directions.len(),
            message: "ray origins and directions differ in count".to_string(),
        });
    }
    let normals = mesh.cell_normals().ok_or_else(|| {
        MultipacError::ConfigError(
            "cell normals must be computed before a ray survey".to_string(),
        )
    })?;

    let n_rays = origins.len();
    let n_cells = mesh.n_cells();
    let mut collisions = Array2::from_elem((n_rays, n_cells), false);
    let mut distances = Array2::from_elem((n_rays, n_cells), f64::NAN);
    let mut angles = Array2::from_elem((n_rays, n_cells), f64::NAN);

    for (i, (&origin, &direction)) in origins.iter().zip(directions.iter()).enumerate() {
        for cell in 0..n_cells {
            if let Some(t) = moller_trumbore(
                origin,
                direction,
                mesh.v0()[cell],
                mesh.v1()[cell],
                mesh.v2()[cell],
                eps,
            ) {
                collisions[[i, cell]] = true;
                distances[[i, cell]] = t;
                angles[[i, cell]] = impact_angle(normals[cell], direction);
            }
        }
    }

    Ok(RaySurvey {
        collisions,
        distances,
        angles,
    })
}
