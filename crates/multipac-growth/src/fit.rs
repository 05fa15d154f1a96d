// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Growth Fit
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bounded log-space fit of the exponential discharge model.
//!
//! The population tail over the last `fitting_window_ns` is fitted as
//! `ln N(t) = ln N0 + α·t`. Zeros and other degenerate data surface as
//! NaN parameters rather than errors so sweep drivers can fit hundreds
//! of curves without unwinding.

use log::{info, warn};
use multipac_math::filter::uniform_filter1d;
use multipac_math::least_squares::{fit_bounded, LeastSquaresConfig};
use multipac_types::error::{MultipacError, MultipacResult};

use crate::model::ExpGrowth;

#[derive(Debug, Clone)]
pub struct GrowthFitConfig {
    /// Smooth log populations with a one-RF-period running mean before
    /// fitting.
    pub running_mean: bool,
    /// Return a NaN fit without optimizing when the final population
    /// sample sits below `skip_threshold` (no discharge happened).
    pub skip_obvious: bool,
    pub skip_threshold: f64,
    /// Start the optimizer from a decaying model; the bounds let it cross
    /// into growth freely.
    pub initial_alpha: f64,
    pub alpha_bounds: (f64, f64),
    /// Lower bound on N0.
    pub n0_floor: f64,
    pub max_evaluations: usize,
    /// Running-mean windows narrower than this draw a warning.
    pub min_window_samples: usize,
}

impl Default for GrowthFitConfig {
    fn default() -> Self {
        Self {
            running_mean: true,
            skip_obvious: true,
            skip_threshold: 10.0,
            initial_alpha: -9.0,
            alpha_bounds: (-10.0, 10.0),
            n0_floor: 1e-10,
            max_evaluations: 5000,
            min_window_samples: 5,
        }
    }
}

impl GrowthFitConfig {
    pub fn validate(&self) -> MultipacResult<()> {
        if !self.skip_threshold.is_finite() || self.skip_threshold < 0.0 {
            return Err(MultipacError::ConfigError(
                "growth_fit.skip_threshold must be finite and >= 0".to_string(),
            ));
        }
        let (lo, hi) = self.alpha_bounds;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(MultipacError::ConfigError(
                "growth_fit.alpha_bounds must be finite with lower < upper".to_string(),
            ));
        }
        if !self.initial_alpha.is_finite() || self.initial_alpha < lo || self.initial_alpha > hi {
            return Err(MultipacError::ConfigError(format!(
                "growth_fit.initial_alpha {} lies outside [{lo}, {hi}]",
                self.initial_alpha
            )));
        }
        if !self.n0_floor.is_finite() || self.n0_floor <= 0.0 {
            return Err(MultipacError::ConfigError(
                "growth_fit.n0_floor must be finite and > 0".to_string(),
            ));
        }
        if self.max_evaluations == 0 {
            return Err(MultipacError::ConfigError(
                "growth_fit.max_evaluations must be >= 1".to_string(),
            ));
        }
        if self.min_window_samples == 0 {
            return Err(MultipacError::ConfigError(
                "growth_fit.min_window_samples must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one population fit.
#[derive(Debug, Clone)]
pub struct GrowthFit {
    /// NaN parameters when the fit was skipped or did not converge.
    pub model: ExpGrowth,
    /// Start of the fit window (ns); NaN when skipped.
    pub t_start: f64,
    /// Modelled population, same length as the input, NaN outside the fit
    /// window. Inside the window it is evaluated even from NaN parameters
    /// so the output shape is always defined.
    pub modelled: Vec<f64>,
    /// Inclusive sample range the fit used; `None` when skipped.
    pub window: Option<(usize, usize)>,
    pub converged: bool,
    pub evaluations: usize,
}

impl GrowthFit {
    /// All-NaN stand-in for a population that was never fitted, sized to
    /// match a curve of `len` samples.
    pub fn no_fit(len: usize) -> Self {
        Self {
            model: ExpGrowth::NAN,
            t_start: f64::NAN,
            modelled: vec![f64::NAN; len],
            window: None,
            converged: false,
            evaluations: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.model.alpha
    }
}

/// Fit the trailing window of a population curve. The window start is
/// clamped to t = 0 when the requested span exceeds the simulated time.
pub fn fit_growth(
    time: &[f64],
    population: &[f64],
    fitting_window_ns: f64,
    rf_period_ns: f64,
    config: &GrowthFitConfig,
) -> MultipacResult<GrowthFit> {
    fit_with_floor(time, population, fitting_window_ns, rf_period_ns, 0.0, config)
}

/// SPARK3D variant: its transients ring for several RF periods, so the
/// window start is kept clear of the first five.
pub fn fit_growth_spark(
    time: &[f64],
    population: &[f64],
    fitting_window_ns: f64,
    rf_period_ns: f64,
    config: &GrowthFitConfig,
) -> MultipacResult<GrowthFit> {
    fit_with_floor(
        time,
        population,
        fitting_window_ns,
        rf_period_ns,
        5.0 * rf_period_ns,
        config,
    )
}

fn fit_with_floor(
    time: &[f64],
    population: &[f64],
    fitting_window_ns: f64,
    rf_period_ns: f64,
    floor_ns: f64,
    config: &GrowthFitConfig,
) -> MultipacResult<GrowthFit> {
    config.validate()?;
    if time.len() != population.len() {
        return Err(MultipacError::ShapeMismatch {
            left: time.len(),
            right: population.len(),
            message: "time and population must pair one-to-one".to_string(),
        });
    }
    if time.is_empty() {
        return Err(MultipacError::InsufficientData(
            "population curve is empty".to_string(),
        ));
    }
    if !fitting_window_ns.is_finite() || fitting_window_ns <= 0.0 {
        return Err(MultipacError::ConfigError(
            "fitting window must be finite and > 0 ns".to_string(),
        ));
    }
    if !rf_period_ns.is_finite() || rf_period_ns <= 0.0 {
        return Err(MultipacError::ConfigError(
            "RF period must be finite and > 0 ns".to_string(),
        ));
    }

    let final_population = population[population.len() - 1];
    if config.skip_obvious && final_population < config.skip_threshold {
        info!(
            "Final population {final_population} is below {}; skipping the fit",
            config.skip_threshold
        );
        return Ok(GrowthFit::no_fit(time.len()));
    }

    let idx_end = match population.iter().rposition(|&n| n != 0.0) {
        Some(i) => i,
        None => {
            return Err(MultipacError::InsufficientData(
                "population is zero everywhere; nothing to fit".to_string(),
            ))
        }
    };

    let mut t_start = time[idx_end] - fitting_window_ns;
    if t_start < floor_ns {
        warn!(
            "Fitting window of {fitting_window_ns} ns exceeds the usable span; \
             clamping start to {floor_ns} ns"
        );
        t_start = floor_ns;
    }
    let idx_start = nearest_index(time, t_start);
    if idx_start >= idx_end {
        return Err(MultipacError::InsufficientData(format!(
            "fit window [{idx_start}, {idx_end}] holds fewer than two samples"
        )));
    }

    let window_time = &time[idx_start..=idx_end];
    // Interior zeros turn into -inf here; the optimizer reports them as
    // non-convergence and the result degrades to NaN parameters.
    let mut log_pop: Vec<f64> = population[idx_start..=idx_end]
        .iter()
        .map(|&n| n.ln())
        .collect();

    if config.running_mean {
        let size = nearest_index(time, rf_period_ns).max(1);
        if size < config.min_window_samples {
            warn!(
                "Running-mean window of {size} samples is below {}; smoothing may be unstable",
                config.min_window_samples
            );
        }
        log_pop = uniform_filter1d(&log_pop, size)?;
    }

    let n0_guess = log_pop[0].exp().max(config.n0_floor);
    let ln_floor = config.n0_floor.ln();
    let initial = [n0_guess.ln(), config.initial_alpha];
    let lower = [ln_floor, config.alpha_bounds.0];
    let upper = [f64::INFINITY, config.alpha_bounds.1];

    let objective = |p: &[f64]| -> Vec<f64> {
        window_time
            .iter()
            .zip(log_pop.iter())
            .map(|(&t, &y)| p[0] + p[1] * t - y)
            .collect()
    };
    let ls_config = LeastSquaresConfig {
        max_evaluations: config.max_evaluations,
        ..Default::default()
    };
    let result = fit_bounded(objective, &initial, &lower, &upper, &ls_config)?;

    let model = if result.converged {
        ExpGrowth {
            n0: result.params[0].exp(),
            alpha: result.params[1],
        }
    } else {
        ExpGrowth::NAN
    };

    let mut modelled = vec![f64::NAN; time.len()];
    for i in idx_start..=idx_end {
        modelled[i] = model.evaluate(time[i]);
    }

    Ok(GrowthFit {
        model,
        t_start,
        modelled,
        window: Some((idx_start, idx_end)),
        converged: result.converged,
        evaluations: result.evaluations,
    })
}

/// First index whose time sample lies nearest to `target`.
fn nearest_index(time: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &t) in time.iter().enumerate() {
        let d = (t - target).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}
