// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Particle Assembly
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-particle trajectory state.
//!
//! Records for one particle arrive scattered across many per-time-step
//! export files, in no particular order. `ParticleBuilder` accumulates them
//! verbatim; `finalize` runs exactly once and produces a `Particle` with
//! verified invariants, chronologically sorted series and detector units
//! (mm, ns). After that the particle is read-mostly: only the collision
//! detector and the extrapolator fill their dedicated fields.

use log::{info, warn};
use multipac_geometry::intersect::{impact_angle, segment_hits};
use multipac_geometry::mesh::TriMesh;
use multipac_geometry::vec3::{add, dot, scale};
use multipac_math::polyfit::{polyfit, polyval};
use multipac_types::constants::{CLIGHT, CLIGHT_MM_PER_NS, POS_M_TO_MM, Q_ELEM, RAW_TIME_TO_NS};
use multipac_types::error::{MultipacError, MultipacResult};

use crate::record::MonitorRecord;

/// Knobs for the beyond-last-sample extrapolation.
#[derive(Debug, Clone)]
pub struct ExtrapolationConfig {
    /// Future samples to generate, the last sample included.
    pub n_points: usize,
    /// Horizon as a multiple of the particle's last observed time step.
    pub horizon_steps: f64,
    /// Trailing samples feeding the momentum polynomial fit.
    pub fit_samples: usize,
    /// Degree of that polynomial.
    pub fit_degree: usize,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            n_points: 2,
            horizon_steps: 10.0,
            fit_samples: 3,
            fit_degree: 2,
        }
    }
}

impl ExtrapolationConfig {
    pub fn validate(&self) -> MultipacResult<()> {
        if self.n_points < 2 {
            return Err(MultipacError::ConfigError(
                "extrapolation.n_points must be >= 2".to_string(),
            ));
        }
        if !self.horizon_steps.is_finite() || self.horizon_steps <= 0.0 {
            return Err(MultipacError::ConfigError(
                "extrapolation.horizon_steps must be finite and > 0".to_string(),
            ));
        }
        if self.fit_degree >= self.fit_samples {
            return Err(MultipacError::ConfigError(format!(
                "extrapolation.fit_degree {} needs more than {} trailing samples",
                self.fit_degree, self.fit_samples
            )));
        }
        Ok(())
    }
}

/// Extrapolated future state. Momentum falls back to NaN fill when too few
/// samples exist for the polynomial fit; positions are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Extrapolation {
    pub times: Vec<f64>,
    pub pos: Vec<[f64; 3]>,
    pub mom: Vec<[f64; 3]>,
}

/// Where a trajectory met the structure wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub cell: usize,
    pub point: [f64; 3],
    /// Filled by `compute_collision_angle`; may be NaN over degenerate cells.
    pub angle: Option<f64>,
}

/// Accumulation phase: appends raw records, no validation, no conversion.
#[derive(Debug, Clone)]
pub struct ParticleBuilder {
    particle_id: u64,
    source_id: u32,
    masses: Vec<f64>,
    charges: Vec<f64>,
    pos: Vec<[f64; 3]>,
    mom: Vec<[f64; 3]>,
    macro_charge: Vec<f64>,
    time: Vec<f64>,
}

impl ParticleBuilder {
    pub fn new(first: MonitorRecord) -> Self {
        let mut builder = Self {
            particle_id: first.particle_id,
            source_id: first.source_id,
            masses: Vec::new(),
            charges: Vec::new(),
            pos: Vec::new(),
            mom: Vec::new(),
            macro_charge: Vec::new(),
            time: Vec::new(),
        };
        builder.push(first);
        builder
    }

    /// Append one time step. Grouping by particle ID is the caller's job;
    /// records for foreign IDs would be caught as mass/charge drift at
    /// finalize time at the latest.
    pub fn push(&mut self, record: MonitorRecord) {
        self.masses.push(record.mass);
        self.charges.push(record.charge);
        self.pos.push(record.pos);
        self.mom.push(record.mom);
        self.macro_charge.push(record.macro_charge);
        self.time.push(record.time);
    }

    pub fn particle_id(&self) -> u64 {
        self.particle_id
    }

    pub fn n_steps(&self) -> usize {
        self.time.len()
    }

    /// One-shot transition to the read-mostly `Particle`: verify mass and
    /// charge constancy, convert units (m → mm, scaled-seconds → ns) and
    /// sort every series by ascending time when records arrived shuffled.
    pub fn finalize(self) -> MultipacResult<Particle> {
        let mass = constant_scalar(&self.masses, self.particle_id, "mass")?;
        let charge = constant_scalar(&self.charges, self.particle_id, "charge")?;

        let mut pos: Vec<[f64; 3]> = self.pos.iter().map(|&p| scale(p, POS_M_TO_MM)).collect();
        let mut mom = self.mom;
        let mut macro_charge = self.macro_charge;
        let mut time: Vec<f64> = self.time.iter().map(|&t| t * RAW_TIME_TO_NS).collect();

        if !time.windows(2).all(|w| w[0] <= w[1]) {
            let mut order: Vec<usize> = (0..time.len()).collect();
            order.sort_by(|&a, &b| {
                time[a]
                    .partial_cmp(&time[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            pos = order.iter().map(|&i| pos[i]).collect();
            mom = order.iter().map(|&i| mom[i]).collect();
            macro_charge = order.iter().map(|&i| macro_charge[i]).collect();
            time = order.iter().map(|&i| time[i]).collect();
        }

        Ok(Particle {
            particle_id: self.particle_id,
            source_id: self.source_id,
            mass,
            mass_ev: mass * CLIGHT * CLIGHT / Q_ELEM,
            charge,
            pos,
            mom,
            macro_charge,
            time,
            extrapolation: None,
            collision: None,
            alive_at_end: false,
        })
    }
}

fn constant_scalar(values: &[f64], particle_id: u64, label: &str) -> MultipacResult<f64> {
    let first = values[0];
    for &v in values.iter().skip(1) {
        if v != first {
            return Err(MultipacError::DataIntegrity {
                particle_id,
                message: format!("{label} varies across time steps: {first} vs {v}"),
            });
        }
    }
    Ok(first)
}

/// Finalized trajectory of one simulated particle.
///
/// Series fields are parallel and non-empty (a builder always starts from
/// a first record); `time` ascends. Positions in mm, time in ns, momentum
/// adimensional.
#[derive(Debug, Clone)]
pub struct Particle {
    pub particle_id: u64,
    pub source_id: u32,
    pub mass: f64,
    /// Rest mass expressed in eV (m·c²/q).
    pub mass_ev: f64,
    pub charge: f64,
    pub pos: Vec<[f64; 3]>,
    pub mom: Vec<[f64; 3]>,
    pub macro_charge: Vec<f64>,
    pub time: Vec<f64>,
    pub extrapolation: Option<Extrapolation>,
    pub collision: Option<Collision>,
    pub alive_at_end: bool,
}

impl Particle {
    pub fn n_steps(&self) -> usize {
        self.time.len()
    }

    pub fn last_time(&self) -> f64 {
        self.time[self.time.len() - 1]
    }

    pub fn last_pos(&self) -> [f64; 3] {
        self.pos[self.pos.len() - 1]
    }

    pub fn last_mom(&self) -> [f64; 3] {
        self.mom[self.mom.len() - 1]
    }

    pub fn is_seed(&self) -> bool {
        self.source_id == 0
    }

    pub fn collided(&self) -> bool {
        self.collision.is_some()
    }

    /// Kinetic energy (eV) at the first recorded sample.
    pub fn emission_energy(&self) -> f64 {
        kinetic_energy_ev(self.mom[0], self.mass_ev)
    }

    /// Kinetic energy (eV) carried into the wall, taken from the last
    /// recorded momentum sample.
    // TODO: evaluate the momentum extrapolation at the collision point's
    // travel time instead of reusing the final recorded sample.
    pub fn collision_energy(&self) -> f64 {
        kinetic_energy_ev(self.last_mom(), self.mass_ev)
    }

    /// Project the trajectory a few steps past its last sample.
    ///
    /// Positions follow a constant-velocity model from the last momentum;
    /// momentum gets a per-axis polynomial fit over the trailing samples
    /// when enough exist, NaN fill otherwise. A single-sample trajectory
    /// is left untouched.
    pub fn extrapolate_beyond_last_step(
        &mut self,
        config: &ExtrapolationConfig,
    ) -> MultipacResult<()> {
        config.validate()?;
        let n = self.time.len();
        if n <= 1 {
            return Ok(());
        }

        let t_last = self.time[n - 1];
        let dt = t_last - self.time[n - 2];
        let times = linspace(t_last, t_last + config.horizon_steps * dt, config.n_points);

        let velocity = scale(self.mom[n - 1], CLIGHT_MM_PER_NS);
        let pos: Vec<[f64; 3]> = times
            .iter()
            .map(|&t| add(self.pos[n - 1], scale(velocity, t - t_last)))
            .collect();

        let mom = if n >= config.fit_samples {
            let t_fit = &self.time[n - config.fit_samples..];
            let mut per_axis = [Vec::new(), Vec::new(), Vec::new()];
            for (axis, values) in per_axis.iter_mut().enumerate() {
                let m_fit: Vec<f64> = self.mom[n - config.fit_samples..]
                    .iter()
                    .map(|m| m[axis])
                    .collect();
                let coeffs = polyfit(t_fit, &m_fit, config.fit_degree)?;
                *values = times.iter().map(|&t| polyval(&coeffs, t)).collect();
            }
            (0..times.len())
                .map(|i| [per_axis[0][i], per_axis[1][i], per_axis[2][i]])
                .collect()
        } else {
            vec![[f64::NAN; 3]; times.len()]
        };

        self.extrapolation = Some(Extrapolation { times, pos, mom });
        Ok(())
    }

    /// Locate the wall impact of a dead particle.
    ///
    /// Primary segment: last recorded position to last extrapolated
    /// position. Fallback: the final recorded flight segment. Of several
    /// candidate cells only the first (lowest index) is kept; surviving
    /// particles and single-sample trajectories are skipped outright.
    pub fn find_collision(&mut self, mesh: &TriMesh, eps: f64) {
        if self.alive_at_end || self.pos.len() <= 1 {
            return;
        }

        let last = self.last_pos();
        let mut hits = match &self.extrapolation {
            Some(extr) => segment_hits(mesh, last, extr.pos[extr.pos.len() - 1], eps),
            None => Vec::new(),
        };
        if hits.is_empty() {
            hits = segment_hits(mesh, self.pos[self.pos.len() - 2], last, eps);
        }

        match hits.first() {
            Some(hit) => {
                if hits.len() > 1 {
                    warn!(
                        "Particle {}: {} intersected cells, keeping first cell {}",
                        self.particle_id,
                        hits.len(),
                        hit.cell
                    );
                }
                self.collision = Some(Collision {
                    cell: hit.cell,
                    point: hit.point,
                    angle: None,
                });
            }
            None => info!(
                "Particle {}: no wall impact on extrapolated or recorded segment",
                self.particle_id
            ),
        }
    }

    /// Angle between the final momentum and the impacted cell's normal.
    /// No-op for particles without a recorded collision.
    pub fn compute_collision_angle(&mut self, mesh: &TriMesh) -> MultipacResult<()> {
        if self.collision.is_none() {
            return Ok(());
        }
        let normals = mesh.cell_normals().ok_or_else(|| {
            MultipacError::ConfigError(
                "cell normals must be computed before collision angles".to_string(),
            )
        })?;
        let direction = self.last_mom();
        if let Some(collision) = self.collision.as_mut() {
            collision.angle = Some(impact_angle(normals[collision.cell], direction));
        }
        Ok(())
    }
}

fn kinetic_energy_ev(mom: [f64; 3], mass_ev: f64) -> f64 {
    0.5 * dot(mom, mom) * mass_ev
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}
