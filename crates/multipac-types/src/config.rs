// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Study Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{MultipacError, MultipacResult};

/// Simulation tool that produced the exports under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Cst,
    Spark3d,
}

/// Top-level description of one multipactor study: which tool produced the
/// data, the RF drive it was run at, and how the growth fit is windowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    pub study_name: String,
    pub tool: Tool,
    /// RF drive frequency (GHz).
    pub freq_ghz: f64,
    /// Growth-fit window length, in RF periods.
    #[serde(default = "default_fitting_periods")]
    pub fitting_periods: f64,
    /// Accelerating field of each simulation in the sweep (MV/m).
    #[serde(rename = "e_acc")]
    pub e_acc_mv_per_m: Vec<f64>,
    /// Smooth log-population with a one-period running mean before fitting.
    #[serde(default = "default_running_mean")]
    pub running_mean: bool,
}

fn default_fitting_periods() -> f64 {
    10.0
}
fn default_running_mean() -> bool {
    true
}

impl StudyConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> MultipacResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// RF period (ns).
    pub fn rf_period_ns(&self) -> f64 {
        1.0 / self.freq_ghz
    }

    /// Fit window length (ns).
    pub fn fitting_range_ns(&self) -> f64 {
        self.fitting_periods * self.rf_period_ns()
    }

    pub fn validate(&self) -> MultipacResult<()> {
        if !(self.freq_ghz.is_finite() && self.freq_ghz > 0.0) {
            return Err(MultipacError::ConfigError(format!(
                "freq_ghz must be finite and positive, got {}",
                self.freq_ghz
            )));
        }
        if !(self.fitting_periods.is_finite() && self.fitting_periods > 0.0) {
            return Err(MultipacError::ConfigError(format!(
                "fitting_periods must be finite and positive, got {}",
                self.fitting_periods
            )));
        }
        if self.e_acc_mv_per_m.is_empty() {
            return Err(MultipacError::ConfigError(
                "e_acc must list at least one accelerating field".into(),
            ));
        }
        if self.e_acc_mv_per_m.iter().any(|e| !e.is_finite()) {
            return Err(MultipacError::ConfigError(
                "e_acc values must all be finite".into(),
            ));
        }
        Ok(())
    }
}
