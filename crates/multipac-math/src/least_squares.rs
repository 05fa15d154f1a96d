// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Bounded Least Squares
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Damped Gauss–Newton least squares with box constraints.
//!
//! Small-problem solver (a handful of parameters, hundreds of residuals):
//! finite-difference Jacobian, Tikhonov-regularized normal equations,
//! backtracking line search, per-parameter bound clamping, and a hard
//! budget on objective evaluations. Non-convergence is reported through
//! the `converged` flag, never as an error, so batch callers can absorb
//! it into NaN sentinels.

use multipac_types::error::{MultipacError, MultipacResult};
use ndarray::{Array1, Array2};

use crate::linalg::solve;

#[derive(Debug, Clone)]
pub struct LeastSquaresConfig {
    /// Hard budget on objective evaluations.
    pub max_evaluations: usize,
    /// RMS residual below which the fit counts as converged.
    pub tolerance: f64,
    /// Relative per-parameter step below which the fit counts as converged.
    pub step_tolerance: f64,
    /// Initial fraction of the Gauss–Newton step.
    pub damping: f64,
    /// Relative finite-difference perturbation.
    pub fd_step: f64,
    /// Normal-equation regularization.
    pub tikhonov: f64,
}

impl Default for LeastSquaresConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 5000,
            tolerance: 1e-12,
            step_tolerance: 1e-10,
            damping: 0.8,
            fd_step: 1e-8,
            tikhonov: 1e-12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeastSquaresResult {
    pub params: Vec<f64>,
    pub converged: bool,
    pub evaluations: usize,
    pub residual: f64,
    pub residual_history: Vec<f64>,
}

fn validate_config(config: &LeastSquaresConfig) -> MultipacResult<()> {
    if config.max_evaluations == 0 {
        return Err(MultipacError::ConfigError(
            "least_squares.max_evaluations must be >= 1".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(MultipacError::ConfigError(
            "least_squares.tolerance must be finite and > 0".to_string(),
        ));
    }
    if !config.step_tolerance.is_finite() || config.step_tolerance <= 0.0 {
        return Err(MultipacError::ConfigError(
            "least_squares.step_tolerance must be finite and > 0".to_string(),
        ));
    }
    if !config.damping.is_finite() || !(0.0..=1.0).contains(&config.damping) || config.damping == 0.0
    {
        return Err(MultipacError::ConfigError(
            "least_squares.damping must be finite and in (0, 1]".to_string(),
        ));
    }
    if !config.fd_step.is_finite() || config.fd_step <= 0.0 {
        return Err(MultipacError::ConfigError(
            "least_squares.fd_step must be finite and > 0".to_string(),
        ));
    }
    if !config.tikhonov.is_finite() || config.tikhonov <= 0.0 {
        return Err(MultipacError::ConfigError(
            "least_squares.tikhonov must be finite and > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_problem(initial: &[f64], lower: &[f64], upper: &[f64]) -> MultipacResult<()> {
    if initial.is_empty() {
        return Err(MultipacError::ConfigError(
            "least_squares needs at least one parameter".to_string(),
        ));
    }
    if lower.len() != initial.len() || upper.len() != initial.len() {
        return Err(MultipacError::ShapeMismatch {
            left: initial.len(),
            right: lower.len().min(upper.len()),
            message: "parameter bounds must match the parameter count".to_string(),
        });
    }
    for j in 0..initial.len() {
        if lower[j] > upper[j] {
            return Err(MultipacError::ConfigError(format!(
                "Bound {j} is empty: [{}, {}]",
                lower[j], upper[j]
            )));
        }
        if initial[j] < lower[j] || initial[j] > upper[j] {
            return Err(MultipacError::ConfigError(format!(
                "Initial guess {} for parameter {j} lies outside [{}, {}]",
                initial[j], lower[j], upper[j]
            )));
        }
    }
    Ok(())
}

fn rms(residuals: &[f64]) -> f64 {
    (residuals.iter().map(|v| v * v).sum::<f64>() / residuals.len() as f64).sqrt()
}

/// Minimize `‖objective(x)‖₂` over the box `[lower, upper]`.
///
/// The objective maps parameters to a residual vector of fixed length.
/// Infinite or NaN residuals abort the iteration with `converged = false`
/// and the best parameters seen so far; they are not an error.
pub fn fit_bounded<F>(
    objective: F,
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &LeastSquaresConfig,
) -> MultipacResult<LeastSquaresResult>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    validate_config(config)?;
    validate_problem(initial, lower, upper)?;

    let n_params = initial.len();
    let mut x = initial.to_vec();
    let mut evaluations = 0usize;

    let mut residual_vec = objective(&x);
    evaluations += 1;
    let n_res = residual_vec.len();
    if n_res == 0 {
        return Err(MultipacError::InsufficientData(
            "objective produced an empty residual vector".to_string(),
        ));
    }

    let mut residual = rms(&residual_vec);
    let mut residual_history = Vec::new();
    let mut converged = false;
    let mut damping = config.damping;
    let mut small_step = false;

    loop {
        residual_history.push(residual);
        if !residual.is_finite() {
            break;
        }
        if residual < config.tolerance || small_step {
            converged = true;
            break;
        }
        if evaluations + n_params >= config.max_evaluations {
            break;
        }

        // Finite-difference Jacobian, perturbing away from the active bound.
        let mut jac = Array2::zeros((n_res, n_params));
        let mut degenerate = false;
        for j in 0..n_params {
            let mut h = config.fd_step * (1.0 + x[j].abs());
            if x[j] + h > upper[j] {
                h = -h;
            }
            let mut x_pert = x.clone();
            x_pert[j] = (x_pert[j] + h).clamp(lower[j], upper[j]);
            let h_actual = x_pert[j] - x[j];
            if h_actual == 0.0 {
                // Bound interval narrower than the step; column stays zero.
                continue;
            }
            let r_pert = objective(&x_pert);
            evaluations += 1;
            if r_pert.len() != n_res {
                return Err(MultipacError::ShapeMismatch {
                    left: n_res,
                    right: r_pert.len(),
                    message: "objective changed residual length between calls".to_string(),
                });
            }
            for i in 0..n_res {
                let d = (r_pert[i] - residual_vec[i]) / h_actual;
                if !d.is_finite() {
                    degenerate = true;
                }
                jac[[i, j]] = d;
            }
        }
        if degenerate {
            break;
        }

        // (JᵀJ + λI) δ = −Jᵀr
        let mut ata = Array2::zeros((n_params, n_params));
        let mut atb = Array1::zeros(n_params);
        for i in 0..n_res {
            for j in 0..n_params {
                atb[j] += jac[[i, j]] * residual_vec[i];
                for k in 0..n_params {
                    ata[[j, k]] += jac[[i, j]] * jac[[i, k]];
                }
            }
        }
        for j in 0..n_params {
            ata[[j, j]] += config.tikhonov;
        }
        let delta = match solve(&mut ata, &mut atb) {
            Ok(d) => d.mapv(|v| -v),
            Err(_) => break,
        };

        let mut accepted = false;
        let mut local_damping = damping;
        for _ in 0..8 {
            if evaluations >= config.max_evaluations {
                break;
            }
            let mut x_trial = x.clone();
            for j in 0..n_params {
                x_trial[j] = (x_trial[j] + local_damping * delta[j]).clamp(lower[j], upper[j]);
            }
            let r_trial = objective(&x_trial);
            evaluations += 1;
            if r_trial.len() != n_res {
                return Err(MultipacError::ShapeMismatch {
                    left: n_res,
                    right: r_trial.len(),
                    message: "objective changed residual length between calls".to_string(),
                });
            }
            let residual_trial = rms(&r_trial);
            if residual_trial.is_finite() && residual_trial <= residual {
                small_step = x_trial
                    .iter()
                    .zip(x.iter())
                    .all(|(a, b)| (a - b).abs() <= config.step_tolerance * (1.0 + b.abs()));
                x = x_trial;
                residual_vec = r_trial;
                residual = residual_trial;
                damping = (local_damping * 1.2).min(1.0);
                accepted = true;
                break;
            }
            local_damping *= 0.5;
        }

        if !accepted {
            // Under budget this is a stationary point, not a failure.
            converged = evaluations < config.max_evaluations;
            break;
        }
    }

    Ok(LeastSquaresResult {
        params: x,
        converged,
        evaluations,
        residual,
        residual_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_objective<'a>(t: &'a [f64], y: &'a [f64]) -> impl Fn(&[f64]) -> Vec<f64> + 'a {
        move |p: &[f64]| {
            t.iter()
                .zip(y.iter())
                .map(|(&ti, &yi)| p[0] + p[1] * ti - yi)
                .collect()
        }
    }

    #[test]
    fn test_fit_recovers_line() {
        let t: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 2.5 - 0.7 * ti).collect();
        let cfg = LeastSquaresConfig::default();
        let result = fit_bounded(
            linear_objective(&t, &y),
            &[0.0, 0.0],
            &[-100.0, -100.0],
            &[100.0, 100.0],
            &cfg,
        )
        .unwrap();
        assert!(result.converged, "history: {:?}", result.residual_history);
        assert!((result.params[0] - 2.5).abs() < 1e-6, "a = {}", result.params[0]);
        assert!((result.params[1] + 0.7).abs() < 1e-6, "b = {}", result.params[1]);
    }

    #[test]
    fn test_fit_log_space_growth_curve() {
        // log N(t) = log(50) + 0.3 t, fitted through (log N0, alpha).
        let t: Vec<f64> = (0..200).map(|i| 30.0 * i as f64 / 199.0).collect();
        let log_n: Vec<f64> = t.iter().map(|&ti| 50.0_f64.ln() + 0.3 * ti).collect();
        let cfg = LeastSquaresConfig::default();
        let result = fit_bounded(
            linear_objective(&t, &log_n),
            &[1e-10_f64.ln(), -9.0],
            &[1e-10_f64.ln(), -10.0],
            &[f64::INFINITY, 10.0],
            &cfg,
        )
        .unwrap();
        assert!(result.converged);
        let n0 = result.params[0].exp();
        assert!((n0 - 50.0).abs() / 50.0 < 0.05, "N0 = {n0}");
        assert!((result.params[1] - 0.3).abs() / 0.3 < 0.01, "alpha = {}", result.params[1]);
    }

    #[test]
    fn test_fit_respects_bounds() {
        let t: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 5.0 * ti).collect();
        let cfg = LeastSquaresConfig::default();
        // True slope 5 is outside the box; solution must stay clamped.
        let result = fit_bounded(
            linear_objective(&t, &y),
            &[0.0, 0.0],
            &[-1.0, -2.0],
            &[1.0, 2.0],
            &cfg,
        )
        .unwrap();
        assert!(result.params[1] <= 2.0 + 1e-12);
        assert!(result.params[1] >= -2.0 - 1e-12);
    }

    #[test]
    fn test_fit_budget_exhaustion_is_not_an_error() {
        let t: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = t.iter().map(|&ti| (0.4 * ti).exp()).collect();
        let cfg = LeastSquaresConfig {
            max_evaluations: 2,
            ..Default::default()
        };
        let objective = move |p: &[f64]| -> Vec<f64> {
            t.iter()
                .zip(y.iter())
                .map(|(&ti, &yi)| p[0] * (p[1] * ti).exp() - yi)
                .collect()
        };
        let result =
            fit_bounded(objective, &[1.0, 0.0], &[0.0, -5.0], &[1e6, 5.0], &cfg).unwrap();
        assert!(!result.converged);
        assert!(result.evaluations <= 2);
    }

    #[test]
    fn test_fit_non_finite_residuals_flagged() {
        let objective = |_p: &[f64]| vec![f64::INFINITY, f64::INFINITY];
        let cfg = LeastSquaresConfig::default();
        let result = fit_bounded(objective, &[0.5], &[0.0], &[1.0], &cfg).unwrap();
        assert!(!result.converged);
        assert!(!result.residual.is_finite());
    }

    #[test]
    fn test_fit_rejects_initial_outside_bounds() {
        let objective = |p: &[f64]| vec![p[0]];
        let cfg = LeastSquaresConfig::default();
        let err = fit_bounded(objective, &[2.0], &[0.0], &[1.0], &cfg)
            .expect_err("out-of-bounds start must be rejected");
        match err {
            MultipacError::ConfigError(msg) => assert!(msg.contains("outside")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fit_rejects_zero_damping() {
        let objective = |p: &[f64]| vec![p[0]];
        let cfg = LeastSquaresConfig {
            damping: 0.0,
            ..Default::default()
        };
        assert!(fit_bounded(objective, &[0.5], &[0.0], &[1.0], &cfg).is_err());
    }
}
