//! SPARK3D export loaders. Two dialects exist: a whitespace TXT with one
//! row per (simulation, time) pair, and a comma CSV with one population
//! column per simulation. Both carry time in seconds; everything downstream
//! runs in ns.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use multipac_types::constants::S_TO_NS;
use multipac_types::error::{MultipacError, MultipacResult};

use crate::simulation::SimulationResult;
use crate::sweep::SimulationSweep;

#[derive(Default)]
struct SimGroup {
    power: Vec<f64>,
    time: Vec<f64>,
    population: Vec<f64>,
}

/// Load the TXT dialect: rows of `sim_index  power_W  time_s  population`,
/// grouped by simulation index. The k-th simulation (ascending index order)
/// pairs with `e_acc_mv_per_m[k]`; RMS power is taken from the group's
/// first row.
pub fn load_spark3d_txt(path: &Path, e_acc_mv_per_m: &[f64]) -> MultipacResult<SimulationSweep> {
    let display = path.display().to_string();
    let mut groups: BTreeMap<u64, SimGroup> = BTreeMap::new();

    for (line_no, line) in data_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(MultipacError::FormatError {
                path: display.clone(),
                line: line_no,
                message: format!("expected 4 fields, got {}", fields.len()),
            });
        }
        let raw_index = parse_float(fields[0], &display, line_no)?;
        if raw_index.fract() != 0.0 || raw_index < 1.0 {
            return Err(MultipacError::FormatError {
                path: display.clone(),
                line: line_no,
                message: format!("simulation index {raw_index:?} is not a positive integer"),
            });
        }
        let group = groups.entry(raw_index as u64).or_default();
        group.power.push(parse_float(fields[1], &display, line_no)?);
        group
            .time
            .push(parse_float(fields[2], &display, line_no)? * S_TO_NS);
        group
            .population
            .push(parse_float(fields[3], &display, line_no)?);
    }

    if groups.is_empty() {
        return Err(MultipacError::InsufficientData(format!(
            "no data rows in {display}"
        )));
    }
    if groups.len() != e_acc_mv_per_m.len() {
        return Err(MultipacError::ShapeMismatch {
            left: groups.len(),
            right: e_acc_mv_per_m.len(),
            message: "one accelerating field per exported simulation".to_string(),
        });
    }

    let mut sweep = SimulationSweep::new();
    for ((id, group), &e_acc) in groups.into_iter().zip(e_acc_mv_per_m) {
        let p_rms = group.power.first().copied();
        sweep.add(SimulationResult::new(
            id,
            e_acc,
            p_rms,
            group.time,
            group.population,
            false,
        )?)?;
    }
    Ok(sweep)
}

/// Load the CSV dialect: first column time (s), then one population column
/// per simulation, in the same order as `e_acc_mv_per_m`. Columns become
/// results with ids 1..=n. This export pads decayed runs with zeros, so the
/// tails are trimmed.
pub fn load_spark3d_csv(path: &Path, e_acc_mv_per_m: &[f64]) -> MultipacResult<SimulationSweep> {
    let display = path.display().to_string();
    let expected = e_acc_mv_per_m.len() + 1;
    let mut time = Vec::new();
    let mut populations: Vec<Vec<f64>> = vec![Vec::new(); e_acc_mv_per_m.len()];

    for (line_no, line) in data_lines(path)? {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != expected {
            return Err(MultipacError::FormatError {
                path: display.clone(),
                line: line_no,
                message: format!(
                    "expected {expected} columns (time plus one population per simulation), \
                     got {}",
                    fields.len()
                ),
            });
        }
        time.push(parse_float(fields[0], &display, line_no)? * S_TO_NS);
        for (column, population) in populations.iter_mut().enumerate() {
            population.push(parse_float(fields[column + 1], &display, line_no)?);
        }
    }

    if time.is_empty() {
        return Err(MultipacError::InsufficientData(format!(
            "no data rows in {display}"
        )));
    }

    let mut sweep = SimulationSweep::new();
    for (column, (population, &e_acc)) in
        populations.into_iter().zip(e_acc_mv_per_m).enumerate()
    {
        sweep.add(SimulationResult::new(
            column as u64 + 1,
            e_acc,
            None,
            time.clone(),
            population,
            true,
        )?)?;
    }
    Ok(sweep)
}

/// Non-blank, non-comment lines of `path`, with 1-based file line numbers.
fn data_lines(path: &Path) -> MultipacResult<Vec<(usize, String)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((index + 1, line));
    }
    Ok(lines)
}

fn parse_float(field: &str, path: &str, line_no: usize) -> MultipacResult<f64> {
    field.parse::<f64>().map_err(|e| MultipacError::FormatError {
        path: path.to_string(),
        line: line_no,
        message: format!("{field:?} is not a float: {e}"),
    })
}
