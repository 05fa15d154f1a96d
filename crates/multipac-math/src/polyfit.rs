// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Polynomial Least Squares
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Least-squares polynomial fitting via Vandermonde normal equations.
//! Intended for very low degrees over a handful of samples (momentum
//! extrapolation fits a degree-2 polynomial through 3 points).

use multipac_types::error::{MultipacError, MultipacResult};
use ndarray::{Array1, Array2};

use crate::linalg::solve;

/// Fit a polynomial of the given degree to `(x, y)` samples.
///
/// Returns coefficients in ascending power order: `c[0] + c[1]·x + ...`.
/// A degree that is not strictly below the sample count is rejected; the
/// normal equations would be singular and the fit meaningless.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> MultipacResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(MultipacError::ShapeMismatch {
            left: x.len(),
            right: y.len(),
            message: "polyfit abscissae and ordinates differ in length".to_string(),
        });
    }
    if degree + 1 > x.len() {
        return Err(MultipacError::ConfigError(format!(
            "Polynomial degree {degree} requires at least {} samples, got {}",
            degree + 1,
            x.len()
        )));
    }

    let n_coeffs = degree + 1;
    let mut ata = Array2::zeros((n_coeffs, n_coeffs));
    let mut atb = Array1::zeros(n_coeffs);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        // Powers xi^0 .. xi^(2*degree) feed the normal equations.
        let mut pow_i = 1.0;
        for i in 0..n_coeffs {
            let mut pow_ij = pow_i;
            for j in 0..n_coeffs {
                ata[[i, j]] += pow_ij;
                pow_ij *= xi;
            }
            atb[i] += yi * pow_i;
            pow_i *= xi;
        }
    }

    let coeffs = solve(&mut ata, &mut atb)?;
    Ok(coeffs.to_vec())
}

/// Evaluate an ascending-order coefficient vector at `x` (Horner scheme).
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}
