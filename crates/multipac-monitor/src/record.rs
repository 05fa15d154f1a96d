// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Monitor Records
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One line of a particle-monitor export: the kinematic state of one
//! particle at one time step. Twelve fields in fixed order, raw tool units
//! (position in m, time in the scaled-seconds convention).

use multipac_types::error::{MultipacError, MultipacResult};

/// Field order of a monitor line.
const FIELD_COUNT: usize = 12;

/// Raw per-time-step record, untouched by unit conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorRecord {
    pub pos: [f64; 3],
    pub mom: [f64; 3],
    pub mass: f64,
    pub charge: f64,
    pub macro_charge: f64,
    pub time: f64,
    pub particle_id: u64,
    pub source_id: u32,
}

impl MonitorRecord {
    /// Parse one data line. `delimiter = None` splits on any whitespace,
    /// which covers the tab- and space-separated dialects seen in exports.
    pub fn parse(
        line: &str,
        path: &str,
        line_no: usize,
        delimiter: Option<char>,
    ) -> MultipacResult<Self> {
        let fields: Vec<&str> = match delimiter {
            Some(d) => line.split(d).map(str::trim).filter(|f| !f.is_empty()).collect(),
            None => line.split_whitespace().collect(),
        };
        if fields.len() != FIELD_COUNT {
            return Err(MultipacError::FormatError {
                path: path.to_string(),
                line: line_no,
                message: format!("expected {FIELD_COUNT} fields, got {}", fields.len()),
            });
        }

        let float = |idx: usize| -> MultipacResult<f64> {
            fields[idx]
                .parse::<f64>()
                .map_err(|e| MultipacError::FormatError {
                    path: path.to_string(),
                    line: line_no,
                    message: format!("field {idx} ({:?}) is not a float: {e}", fields[idx]),
                })
        };

        let pos = [float(0)?, float(1)?, float(2)?];
        let mom = [float(3)?, float(4)?, float(5)?];
        let mass = float(6)?;
        let charge = float(7)?;
        let macro_charge = float(8)?;
        let time = float(9)?;
        let particle_id =
            fields[10]
                .parse::<u64>()
                .map_err(|e| MultipacError::FormatError {
                    path: path.to_string(),
                    line: line_no,
                    message: format!("particle ID {:?} is not an integer: {e}", fields[10]),
                })?;
        let source_id =
            fields[11]
                .parse::<u32>()
                .map_err(|e| MultipacError::FormatError {
                    path: path.to_string(),
                    line: line_no,
                    message: format!("source ID {:?} is not an integer: {e}", fields[11]),
                })?;

        Ok(Self {
            pos,
            mom,
            mass,
            charge,
            macro_charge,
            time,
            particle_id,
            source_id,
        })
    }
}
