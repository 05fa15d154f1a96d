//! The fitted discharge model.

use std::fmt;

/// Exponential population model `N(t) = N0 · exp(α·t)` with time in ns
/// and `α` in 1/ns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpGrowth {
    pub n0: f64,
    pub alpha: f64,
}

impl ExpGrowth {
    /// Sentinel for "no fit": both parameters NaN, as downstream array
    /// consumers expect.
    pub const NAN: Self = Self {
        n0: f64::NAN,
        alpha: f64::NAN,
    };

    pub fn evaluate(&self, t: f64) -> f64 {
        self.n0 * (self.alpha * t).exp()
    }

    /// Log-space form the optimizer works in: `ln N0 + α·t`.
    pub fn log_evaluate(&self, t: f64) -> f64 {
        self.n0.ln() + self.alpha * t
    }

    pub fn is_nan(&self) -> bool {
        self.n0.is_nan() || self.alpha.is_nan()
    }

    /// Time for the population to double; negative α gives a negative
    /// value (halving time), zero α gives infinity.
    pub fn doubling_time(&self) -> f64 {
        std::f64::consts::LN_2 / self.alpha
    }
}

impl fmt::Display for ExpGrowth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N0 = {:.4e}, alpha = {:.4} 1/ns", self.n0, self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_at_origin_is_n0() {
        let model = ExpGrowth {
            n0: 50.0,
            alpha: 0.3,
        };
        assert!((model.evaluate(0.0) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_doubling_time_doubles_population() {
        let model = ExpGrowth {
            n0: 7.0,
            alpha: 0.25,
        };
        let t2 = model.doubling_time();
        assert!((model.evaluate(t2) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_form_matches_linear_space() {
        let model = ExpGrowth {
            n0: 3.0,
            alpha: -0.1,
        };
        for t in [0.0, 1.5, 12.0] {
            assert!((model.log_evaluate(t) - model.evaluate(t).ln()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_nan_sentinel() {
        assert!(ExpGrowth::NAN.is_nan());
        assert!(ExpGrowth::NAN.evaluate(1.0).is_nan());
    }
}
