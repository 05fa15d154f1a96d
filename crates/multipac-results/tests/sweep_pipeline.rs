// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Sweep Pipeline Tests for multipac-results
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Study-level pipeline: export file plus study JSON on disk in, fitted
//! susceptibility curve out.

use std::fmt::Write as _;

use multipac_growth::fit::GrowthFitConfig;
use multipac_results::spark3d::load_spark3d_csv;
use multipac_types::config::StudyConfig;

const N_SAMPLES: usize = 200;
const T_MAX_NS: f64 = 30.0;

fn time_ns(i: usize) -> f64 {
    i as f64 * T_MAX_NS / (N_SAMPLES - 1) as f64
}

/// Column 1 multipacts, column 2 decays linearly and dies at 8 ns.
fn write_swell_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let mut body = String::new();
    for i in 0..N_SAMPLES {
        let t = time_ns(i);
        let growing = 50.0 * (0.3 * t).exp();
        let dying = (8.0 - t).max(0.0);
        writeln!(body, "{},{},{}", t * 1e-9, growing, dying).unwrap();
    }
    let path = dir.join("swell.csv");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_csv_study_yields_susceptibility_curve() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_swell_csv(dir.path());

    let study_path = dir.path().join("study.json");
    std::fs::write(
        &study_path,
        r#"{
            "study_name": "swell-120",
            "tool": "spark3d",
            "freq_ghz": 1.0,
            "fitting_periods": 30.0,
            "e_acc": [1.0, 2.0],
            "running_mean": false
        }"#,
    )
    .unwrap();
    let study = StudyConfig::from_file(study_path.to_str().unwrap()).unwrap();

    let mut sweep = load_spark3d_csv(&csv, &study.e_acc_mv_per_m).unwrap();
    assert_eq!(sweep.len(), 2);

    // The dying column is trimmed at its first zero sample.
    let expected_len = (0..N_SAMPLES)
        .take_while(|&i| 8.0 - time_ns(i) > 0.0)
        .count();
    let decayed = sweep.get(2).unwrap();
    assert_eq!(decayed.n_samples(), expected_len);

    sweep.fit_all(&study, &GrowthFitConfig::default()).unwrap();

    // SPARK3D fits start after the first five RF periods.
    let fitted = sweep.get(1).unwrap().fit.as_ref().unwrap();
    assert!((fitted.t_start - 5.0).abs() < 1e-12, "t_start = {}", fitted.t_start);

    let (fields, alphas) = sweep.alpha_curve();
    assert_eq!(fields, vec![1.0, 2.0]);
    assert!((alphas[0] - 0.3).abs() / 0.3 < 0.01, "alpha = {}", alphas[0]);
    // Below the skip threshold at the end: no discharge, no fit.
    assert!(alphas[1].is_nan());

    assert!(format!("{sweep}").contains("2 simulations"));
}
