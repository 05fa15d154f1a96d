// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Dense Linear Solves
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Partial-pivot Gaussian elimination for the small normal-equation
//! systems arising in polynomial and growth-rate fits.

use multipac_types::error::{MultipacError, MultipacResult};
use ndarray::{Array1, Array2};

/// Solve `A x = b` for a small square system.
///
/// `A` and `b` are destroyed during elimination. Systems here are tiny
/// (2x2, 3x3), so no blocking or iterative refinement is attempted.
pub fn solve(a: &mut Array2<f64>, b: &mut Array1<f64>) -> MultipacResult<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(MultipacError::ShapeMismatch {
            left: n,
            right: b.len(),
            message: "solve expects a square matrix and a matching rhs".to_string(),
        });
    }

    for col in 0..n {
        // Partial pivoting
        let mut pivot_row = col;
        let mut pivot_mag = a[[col, col]].abs();
        for row in (col + 1)..n {
            let mag = a[[row, col]].abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = row;
            }
        }
        if !pivot_mag.is_finite() || pivot_mag == 0.0 {
            return Err(MultipacError::LinAlg(format!(
                "Singular or non-finite pivot in column {col}"
            )));
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            a[[row, col]] = 0.0;
            for k in (col + 1)..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[[row, k]] * x[k];
        }
        x[row] = acc / a[[row, row]];
    }
    Ok(x)
}
