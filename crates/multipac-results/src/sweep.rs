//! A field sweep: many runs of the same geometry at different accelerating
//! fields, iterated in ascending field order for susceptibility charts.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use multipac_growth::fit::{GrowthFit, GrowthFitConfig};
use multipac_types::config::StudyConfig;
use multipac_types::error::{MultipacError, MultipacResult};

use crate::simulation::SimulationResult;

/// Simulation runs keyed by id, ordered by ascending accelerating field.
#[derive(Debug, Clone, Default)]
pub struct SimulationSweep {
    results: Vec<SimulationResult>,
    /// Position of each id inside `results`.
    by_id: BTreeMap<u64, usize>,
}

impl SimulationSweep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Insert a run at its field-ordered position. Ids must be unique
    /// across the sweep.
    pub fn add(&mut self, result: SimulationResult) -> MultipacResult<()> {
        if self.by_id.contains_key(&result.id) {
            return Err(MultipacError::ConfigError(format!(
                "duplicate simulation id {} in sweep",
                result.id
            )));
        }
        let at = self
            .results
            .partition_point(|member| member.e_acc <= result.e_acc);
        self.results.insert(at, result);
        for (index, member) in self.results.iter().enumerate().skip(at) {
            self.by_id.insert(member.id, index);
        }
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&SimulationResult> {
        self.by_id.get(&id).map(|&index| &self.results[index])
    }

    /// Members in ascending accelerating-field order.
    pub fn iter(&self) -> impl Iterator<Item = &SimulationResult> {
        self.results.iter()
    }

    /// Fit every member with the study's window and smoothing settings.
    /// Runs too short or too empty to fit are absorbed into all-NaN fits so
    /// the rest of the sweep still gets its growth rates.
    pub fn fit_all(
        &mut self,
        study: &StudyConfig,
        config: &GrowthFitConfig,
    ) -> MultipacResult<()> {
        let mut effective = config.clone();
        effective.running_mean = study.running_mean;
        let window = study.fitting_range_ns();
        let period = study.rf_period_ns();
        for result in &mut self.results {
            match result.fit_alpha(study.tool, window, period, &effective) {
                Ok(()) => {}
                Err(MultipacError::InsufficientData(message)) => {
                    warn!("Simulation {}: {message}; recording an empty fit", result.id);
                    result.fit = Some(GrowthFit::no_fit(result.time.len()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// (e_acc, alpha) pairs in ascending field order. Unfitted and
    /// unconverged members contribute NaN.
    pub fn alpha_curve(&self) -> (Vec<f64>, Vec<f64>) {
        let fields = self.results.iter().map(|r| r.e_acc).collect();
        let alphas = self.results.iter().map(|r| r.alpha()).collect();
        (fields, alphas)
    }
}

impl fmt::Display for SimulationSweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.results.first(), self.results.last()) {
            (Some(lo), Some(hi)) => write!(
                f,
                "{} simulations, e_acc {:.3} to {:.3} MV/m",
                self.len(),
                lo.e_acc,
                hi.e_acc
            ),
            _ => write!(f, "empty sweep"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multipac_types::config::Tool;

    fn run(id: u64, e_acc: f64) -> SimulationResult {
        let time: Vec<f64> = (0..200).map(|i| i as f64 * 30.0 / 199.0).collect();
        let population = time.iter().map(|&t| 50.0 * (0.3 * t).exp()).collect();
        SimulationResult::new(id, e_acc, None, time, population, false).unwrap()
    }

    fn swell_study() -> StudyConfig {
        StudyConfig {
            study_name: "swell-120".to_string(),
            tool: Tool::Cst,
            freq_ghz: 1.0,
            fitting_periods: 30.0,
            e_acc_mv_per_m: vec![1.0, 2.0, 4.0],
            running_mean: true,
        }
    }

    #[test]
    fn test_iteration_ascends_by_field() {
        let mut sweep = SimulationSweep::new();
        sweep.add(run(1, 4.0)).unwrap();
        sweep.add(run(2, 1.0)).unwrap();
        sweep.add(run(3, 2.0)).unwrap();
        let ids: Vec<u64> = sweep.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        // Lookup still tracks the reordered positions.
        assert!((sweep.get(1).unwrap().e_acc - 4.0).abs() < 1e-12);
        assert!((sweep.get(3).unwrap().e_acc - 2.0).abs() < 1e-12);
        assert!(sweep.get(9).is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut sweep = SimulationSweep::new();
        sweep.add(run(7, 1.0)).unwrap();
        let err = sweep.add(run(7, 2.0)).expect_err("duplicate id must fail");
        match err {
            MultipacError::ConfigError(message) => {
                assert!(message.contains("duplicate simulation id 7"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sweep.len(), 1);
    }

    #[test]
    fn test_fit_all_absorbs_unfittable_members() {
        let mut sweep = SimulationSweep::new();
        sweep.add(run(1, 2.0)).unwrap();
        // All-zero curve: with the skip heuristic off, fitting it reports
        // insufficient data, which fit_all converts to a NaN fit.
        sweep
            .add(
                SimulationResult::new(2, 1.0, None, vec![0.0, 1.0, 2.0], vec![0.0; 3], false)
                    .unwrap(),
            )
            .unwrap();
        let config = GrowthFitConfig {
            skip_obvious: false,
            ..GrowthFitConfig::default()
        };
        sweep.fit_all(&swell_study(), &config).unwrap();

        let empty = sweep.get(2).unwrap();
        assert!(empty.alpha().is_nan());
        assert_eq!(empty.fit.as_ref().unwrap().modelled.len(), 3);
        let fitted = sweep.get(1).unwrap();
        assert!((fitted.alpha() - 0.3).abs() / 0.3 < 0.01, "{}", fitted.alpha());
    }

    #[test]
    fn test_alpha_curve_pairs_fields_with_rates() {
        let mut sweep = SimulationSweep::new();
        sweep.add(run(1, 4.0)).unwrap();
        sweep.add(run(2, 1.0)).unwrap();
        sweep
            .fit_all(&swell_study(), &GrowthFitConfig::default())
            .unwrap();
        let (fields, alphas) = sweep.alpha_curve();
        assert_eq!(fields, vec![1.0, 4.0]);
        assert_eq!(alphas.len(), 2);
        assert!(alphas.iter().all(|a| (a - 0.3).abs() / 0.3 < 0.01));
    }
}
