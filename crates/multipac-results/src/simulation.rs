// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Simulation Result
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One solver run: its population-vs-time curve and, once fitted, the
//! exponential growth rate of the discharge.

use std::collections::BTreeMap;
use std::fmt;

use multipac_growth::fit::{fit_growth, fit_growth_spark, GrowthFit, GrowthFitConfig};
use multipac_types::config::Tool;
use multipac_types::error::{MultipacError, MultipacResult};

/// Population curve of a single simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub id: u64,
    /// Accelerating field the run was driven at (MV/m).
    pub e_acc: f64,
    /// RMS input power (W), when the export carries it.
    pub p_rms: Option<f64>,
    /// Time grid (ns).
    pub time: Vec<f64>,
    /// Particle count at each time sample.
    pub population: Vec<f64>,
    /// Growth fit, populated by [`fit_alpha`](Self::fit_alpha).
    pub fit: Option<GrowthFit>,
    /// Solver parameter block (CST `Parameters.txt`); empty for SPARK3D.
    pub parameters: BTreeMap<String, String>,
}

impl SimulationResult {
    /// Pair a time grid with its population curve. `trim_trailing` drops
    /// the decayed tail, which SPARK3D pads with zeros after breakdown.
    pub fn new(
        id: u64,
        e_acc: f64,
        p_rms: Option<f64>,
        time: Vec<f64>,
        population: Vec<f64>,
        trim_trailing: bool,
    ) -> MultipacResult<Self> {
        if time.len() != population.len() {
            return Err(MultipacError::ShapeMismatch {
                left: time.len(),
                right: population.len(),
                message: format!("simulation {id}: time and population must pair one-to-one"),
            });
        }
        let mut result = Self {
            id,
            e_acc,
            p_rms,
            time,
            population,
            fit: None,
            parameters: BTreeMap::new(),
        };
        if trim_trailing {
            result.trim_trailing();
        }
        Ok(result)
    }

    /// Truncate both arrays at the first zero-population sample.
    fn trim_trailing(&mut self) {
        if let Some(first_zero) = self.population.iter().position(|&n| n == 0.0) {
            self.population.truncate(first_zero);
            self.time.truncate(first_zero);
        }
    }

    pub fn n_samples(&self) -> usize {
        self.time.len()
    }

    /// Fitted growth rate (1/ns); NaN until [`fit_alpha`](Self::fit_alpha)
    /// has run and converged.
    pub fn alpha(&self) -> f64 {
        self.fit.as_ref().map_or(f64::NAN, GrowthFit::alpha)
    }

    /// Fit the trailing window of the population curve. CST curves are
    /// fitted from t = 0; SPARK3D transients ring longer, so their window
    /// start is kept clear of the first five RF periods.
    pub fn fit_alpha(
        &mut self,
        tool: Tool,
        fitting_window_ns: f64,
        rf_period_ns: f64,
        config: &GrowthFitConfig,
    ) -> MultipacResult<()> {
        let fit = match tool {
            Tool::Cst => fit_growth(
                &self.time,
                &self.population,
                fitting_window_ns,
                rf_period_ns,
                config,
            )?,
            Tool::Spark3d => fit_growth_spark(
                &self.time,
                &self.population,
                fitting_window_ns,
                rf_period_ns,
                config,
            )?,
        };
        self.fit = Some(fit);
        Ok(())
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulation {}: e_acc {:.3} MV/m, {} samples, alpha {:.4} 1/ns",
            self.id,
            self.e_acc,
            self.n_samples(),
            self.alpha()
        )
    }
}
