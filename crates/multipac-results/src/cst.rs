// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — CST Sweep Loader
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Loader for CST parameter-sweep folders. Each run lives in a sub-folder
//! named `mmdd-xxxxxxx` (export date, then the run id) holding at least
//! `E_acc in MV per m.txt`, `Parameters.txt` and, somewhere below it,
//! `Particle vs. Time.txt`. Exports nest result files in sub-folders like
//! `ParticleInfo [PIC]`, so the scan is recursive and keyed by file stem.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{info, warn};
use multipac_types::error::{MultipacError, MultipacResult};

use crate::simulation::SimulationResult;
use crate::sweep::SimulationSweep;

const E_ACC_STEM: &str = "E_acc in MV per m";
const PARAMETERS_STEM: &str = "Parameters";
const POPULATION_STEM: &str = "Particle vs. Time";

#[derive(Debug, Clone, Default)]
pub struct CstLoaderOptions {
    /// Stem of an extra per-run scalar file holding RMS input power (W).
    /// When set, the file is mandatory in every run folder.
    pub p_rms_stem: Option<String>,
}

/// Load every `mmdd-xxxxxxx` run folder under `root` into a sweep.
/// Sub-folders that do not match the naming scheme are skipped with a
/// warning; a root without any run folder yields an empty sweep.
pub fn load_cst_sweep(
    root: &Path,
    options: &CstLoaderOptions,
) -> MultipacResult<SimulationSweep> {
    let mut run_dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            run_dirs.push(path);
        }
    }
    run_dirs.sort();

    let mut sweep = SimulationSweep::new();
    for dir in run_dirs {
        let name = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let id = match run_id_from_name(&name) {
            Some(id) => id,
            None => {
                warn!("Skipping {}: not an mmdd-xxxxxxx run folder", dir.display());
                continue;
            }
        };
        sweep.add(load_run_folder(&dir, id, options)?)?;
    }
    info!("Loaded CST sweep from {}: {sweep}", root.display());
    Ok(sweep)
}

/// Run id from a folder name: the integer after the dash, provided the
/// date part before it is numeric.
fn run_id_from_name(name: &str) -> Option<u64> {
    let (date, run) = name.split_once('-')?;
    if date.is_empty() || !date.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    run.parse().ok()
}

fn load_run_folder(
    folder: &Path,
    id: u64,
    options: &CstLoaderOptions,
) -> MultipacResult<SimulationResult> {
    let files = files_by_stem(folder)?;
    let e_acc = read_scalar(required(&files, E_ACC_STEM, folder)?)?;
    let parameters = read_parameters(required(&files, PARAMETERS_STEM, folder)?)?;
    let (time, population) = read_two_columns(required(&files, POPULATION_STEM, folder)?)?;
    let p_rms = match &options.p_rms_stem {
        Some(stem) => Some(read_scalar(required(&files, stem, folder)?)?),
        None => None,
    };

    let mut result = SimulationResult::new(id, e_acc, p_rms, time, population, false)?;
    result.parameters = parameters;
    Ok(result)
}

/// Every `.txt` file under `folder`, recursively, keyed by its stem.
/// Hidden entries are skipped; on duplicate stems the lexically last path
/// wins.
fn files_by_stem(folder: &Path) -> MultipacResult<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    collect_txt_files(folder, &mut files)?;
    Ok(files)
}

fn collect_txt_files(
    folder: &Path,
    out: &mut BTreeMap<String, PathBuf>,
) -> MultipacResult<()> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        entries.push(entry?.path());
    }
    entries.sort();
    for path in entries {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            if let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) {
                out.insert(stem, path);
            }
        }
    }
    Ok(())
}

fn required<'a>(
    files: &'a BTreeMap<String, PathBuf>,
    stem: &str,
    folder: &Path,
) -> MultipacResult<&'a Path> {
    files
        .get(stem)
        .map(PathBuf::as_path)
        .ok_or_else(|| MultipacError::MissingFile {
            file: format!("{stem}.txt"),
            folder: folder.display().to_string(),
        })
}

/// One float, alone in the file.
fn read_scalar(path: &Path) -> MultipacResult<f64> {
    let contents = std::fs::read_to_string(path)?;
    let value = contents.trim();
    value.parse::<f64>().map_err(|e| MultipacError::FormatError {
        path: path.display().to_string(),
        line: 1,
        message: format!("{value:?} is not a float: {e}"),
    })
}

/// Tab- or space-separated time (ns) and population columns. CST already
/// exports the project time unit, so no conversion happens here.
fn read_two_columns(path: &Path) -> MultipacResult<(Vec<f64>, Vec<f64>)> {
    let display = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let mut time = Vec::new();
    let mut population = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(MultipacError::FormatError {
                path: display.clone(),
                line: index + 1,
                message: format!("expected 2 fields, got {}", fields.len()),
            });
        }
        for (field, out) in fields.iter().zip([&mut time, &mut population]) {
            out.push(field.parse::<f64>().map_err(|e| {
                MultipacError::FormatError {
                    path: display.clone(),
                    line: index + 1,
                    message: format!("{field:?} is not a float: {e}"),
                }
            })?);
        }
    }
    Ok((time, population))
}

/// `key=value` lines into a map; blank and `#` lines are skipped.
fn read_parameters(path: &Path) -> MultipacResult<BTreeMap<String, String>> {
    let display = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let mut parameters = BTreeMap::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.split_once('=') {
            Some((key, value)) => {
                parameters.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                return Err(MultipacError::FormatError {
                    path: display.clone(),
                    line: index + 1,
                    message: format!("expected key=value, got {trimmed:?}"),
                });
            }
        }
    }
    Ok(parameters)
}
