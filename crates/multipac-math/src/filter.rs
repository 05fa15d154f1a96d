// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Moving-Average Filter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Centered uniform filter with nearest-edge padding, matching the
//! semantics of scipy's `uniform_filter1d(mode="nearest")` that the
//! growth-fit smoothing stage was tuned against.

use multipac_types::error::{MultipacError, MultipacResult};

/// Apply a centered moving average of width `size`.
///
/// For even sizes the window extends one sample further to the left, and
/// out-of-range indices clamp to the nearest edge sample.
pub fn uniform_filter1d(values: &[f64], size: usize) -> MultipacResult<Vec<f64>> {
    if size == 0 {
        return Err(MultipacError::ConfigError(
            "uniform_filter1d window size must be >= 1".to_string(),
        ));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let n = values.len() as isize;
    let offset = (size / 2) as isize;
    let inv = 1.0 / size as f64;

    let mut out = Vec::with_capacity(values.len());
    for i in 0..n {
        let mut acc = 0.0;
        for k in 0..size as isize {
            let idx = (i - offset + k).clamp(0, n - 1) as usize;
            acc += values[idx];
        }
        out.push(acc * inv);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_size_one_is_identity() {
        let v = [3.0, -1.0, 4.0, 1.5];
        let out = uniform_filter1d(&v, 1).unwrap();
        assert_eq!(out, v.to_vec());
    }

    #[test]
    fn test_filter_constant_array_unchanged() {
        let v = [5.5; 17];
        let out = uniform_filter1d(&v, 6).unwrap();
        for x in out {
            assert!((x - 5.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_filter_odd_window_interior_preserves_linear() {
        // Symmetric window over a linear ramp averages back to the center.
        let v: Vec<f64> = (0..20).map(|i| 2.0 * i as f64).collect();
        let out = uniform_filter1d(&v, 5).unwrap();
        for i in 2..18 {
            assert!((out[i] - v[i]).abs() < 1e-12, "i = {i}: {} vs {}", out[i], v[i]);
        }
    }

    #[test]
    fn test_filter_even_window_leans_left() {
        // size 2 averages self with the left neighbour (scipy origin rule).
        let v = [0.0, 10.0, 20.0, 30.0];
        let out = uniform_filter1d(&v, 2).unwrap();
        assert!((out[0] - 0.0).abs() < 1e-12);
        assert!((out[1] - 5.0).abs() < 1e-12);
        assert!((out[2] - 15.0).abs() < 1e-12);
        assert!((out[3] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_filter_zero_size_rejected() {
        assert!(uniform_filter1d(&[1.0], 0).is_err());
    }

    #[test]
    fn test_filter_empty_input() {
        assert!(uniform_filter1d(&[], 3).unwrap().is_empty());
    }
}
