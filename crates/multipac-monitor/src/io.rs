//! Discovery and line-level reading of particle-monitor export files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use multipac_types::constants::MONITOR_HEADER_LINES;
use multipac_types::error::MultipacResult;

use crate::record::MonitorRecord;

/// Every export file under `folder`, recursively, in sorted path order.
/// Hidden entries and editor swap files are skipped.
pub fn monitor_files_in(folder: &Path) -> MultipacResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(folder, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(folder: &Path, out: &mut Vec<PathBuf>) -> MultipacResult<()> {
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if !name.ends_with(".swp") {
            out.push(path);
        }
    }
    Ok(())
}

/// Parse one export file: a fixed-size header block, then one record per
/// non-blank line. Line numbers in errors are 1-based over the whole file,
/// header included.
pub fn read_monitor_file(
    path: &Path,
    delimiter: Option<char>,
) -> MultipacResult<Vec<MonitorRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let display = path.display().to_string();
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index < MONITOR_HEADER_LINES || line.trim().is_empty() {
            continue;
        }
        records.push(MonitorRecord::parse(&line, &display, index + 1, delimiter)?);
    }
    Ok(records)
}
