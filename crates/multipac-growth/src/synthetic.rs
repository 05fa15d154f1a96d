//! Synthetic population curves for tests and benches.
//!
//! Produces the shape a particle-in-cell code exports during a discharge:
//! an exponential envelope with RF-phase ripple and multiplicative shot
//! noise.

use multipac_types::error::{MultipacError, MultipacResult};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::TAU;

use crate::model::ExpGrowth;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub model: ExpGrowth,
    /// RF frequency (GHz) driving the ripple.
    pub freq_ghz: f64,
    /// Relative ripple depth in [0, 1].
    pub modulation: f64,
    /// Multiplicative noise sigma; 0 disables noise.
    pub noise_frac: f64,
    pub n_samples: usize,
    pub t_max_ns: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            model: ExpGrowth {
                n0: 50.0,
                alpha: 0.3,
            },
            freq_ghz: 1.0,
            modulation: 0.2,
            noise_frac: 0.05,
            n_samples: 200,
            t_max_ns: 30.0,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> MultipacResult<()> {
        if self.n_samples < 2 {
            return Err(MultipacError::ConfigError(
                "synthetic.n_samples must be >= 2".to_string(),
            ));
        }
        if !self.t_max_ns.is_finite() || self.t_max_ns <= 0.0 {
            return Err(MultipacError::ConfigError(
                "synthetic.t_max_ns must be finite and > 0".to_string(),
            ));
        }
        if !self.freq_ghz.is_finite() || self.freq_ghz <= 0.0 {
            return Err(MultipacError::ConfigError(
                "synthetic.freq_ghz must be finite and > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.modulation) {
            return Err(MultipacError::ConfigError(
                "synthetic.modulation must lie in [0, 1]".to_string(),
            ));
        }
        if !self.noise_frac.is_finite() || self.noise_frac < 0.0 {
            return Err(MultipacError::ConfigError(
                "synthetic.noise_frac must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate `(time, population)` with the caller's RNG; populations are
/// clamped at zero after noise.
pub fn population_curve_with_rng<R: Rng + ?Sized>(
    config: &SyntheticConfig,
    rng: &mut R,
) -> MultipacResult<(Vec<f64>, Vec<f64>)> {
    config.validate()?;
    let n = config.n_samples;
    let mut time = Vec::with_capacity(n);
    let mut population = Vec::with_capacity(n);
    for i in 0..n {
        let t = config.t_max_ns * i as f64 / (n - 1) as f64;
        let envelope = config.model.evaluate(t);
        let ripple = 1.0 + config.modulation * (TAU * config.freq_ghz * t).sin();
        let noise: f64 = if config.noise_frac > 0.0 {
            let z: f64 = rng.sample(StandardNormal);
            1.0 + config.noise_frac * z
        } else {
            1.0
        };
        time.push(t);
        population.push((envelope * ripple * noise).max(0.0));
    }
    Ok((time, population))
}

/// Convenience wrapper over the thread-local RNG.
pub fn population_curve(config: &SyntheticConfig) -> MultipacResult<(Vec<f64>, Vec<f64>)> {
    population_curve_with_rng(config, &mut rand::thread_rng())
}
