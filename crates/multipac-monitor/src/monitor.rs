// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Population Collection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Assembles a folder of per-time-step exports into a keyed particle
//! collection and drives the per-particle analyses over it.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::info;
use multipac_geometry::intersect::{ray_survey, RaySurvey};
use multipac_geometry::mesh::TriMesh;
use multipac_geometry::vec3::normalize;
use multipac_types::constants::ALIVE_TIME_TOL_NS;
use multipac_types::error::{MultipacError, MultipacResult};

use crate::io::{monitor_files_in, read_monitor_file};
use crate::particle::{ExtrapolationConfig, Particle, ParticleBuilder};

/// Source-ID projection over a collection. Seed particles carry source 0,
/// everything else counts as emitted (secondary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    All,
    Seed,
    Emitted,
}

impl Subset {
    fn admits(&self, particle: &Particle) -> bool {
        match self {
            Subset::All => true,
            Subset::Seed => particle.is_seed(),
            Subset::Emitted => !particle.is_seed(),
        }
    }
}

/// Ingestion knobs for `ParticleMonitor::from_folder`.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Field separator inside the export files; `None` splits on any
    /// whitespace run.
    pub delimiter: Option<char>,
    pub extrapolation: ExtrapolationConfig,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            extrapolation: ExtrapolationConfig::default(),
        }
    }
}

/// All particles of one simulation run, keyed by particle ID.
///
/// `max_time` spans the whole run and is fixed at assembly; particles whose
/// series reach it (within `ALIVE_TIME_TOL_NS`) are flagged alive and the
/// collision detector leaves them alone.
#[derive(Debug, Clone)]
pub struct ParticleMonitor {
    particles: BTreeMap<u64, Particle>,
    max_time: Option<f64>,
}

impl ParticleMonitor {
    /// Read every export file under `folder`, group records by particle ID,
    /// finalize each particle and extrapolate its trajectory.
    ///
    /// An empty folder yields an empty collection, not an error; the
    /// undefined global maximum time surfaces later through `max_time`.
    pub fn from_folder(folder: &Path, options: &MonitorOptions) -> MultipacResult<Self> {
        options.extrapolation.validate()?;
        let files = monitor_files_in(folder)?;

        let mut builders: BTreeMap<u64, ParticleBuilder> = BTreeMap::new();
        for file in &files {
            for record in read_monitor_file(file, options.delimiter)? {
                match builders.entry(record.particle_id) {
                    Entry::Occupied(mut entry) => entry.get_mut().push(record),
                    Entry::Vacant(entry) => {
                        entry.insert(ParticleBuilder::new(record));
                    }
                }
            }
        }

        let mut particles = BTreeMap::new();
        let mut max_time: Option<f64> = None;
        for (id, builder) in builders {
            let mut particle = builder.finalize()?;
            particle.extrapolate_beyond_last_step(&options.extrapolation)?;
            max_time = Some(match max_time {
                Some(t) => t.max(particle.last_time()),
                None => particle.last_time(),
            });
            particles.insert(id, particle);
        }

        if let Some(t_end) = max_time {
            for particle in particles.values_mut() {
                particle.alive_at_end = (t_end - particle.last_time()).abs() < ALIVE_TIME_TOL_NS;
            }
        }

        let monitor = Self {
            particles,
            max_time,
        };
        info!(
            "Assembled {} from {} export files under {}",
            monitor,
            files.len(),
            folder.display()
        );
        Ok(monitor)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, particle_id: u64) -> Option<&Particle> {
        self.particles.get(&particle_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    /// Latest time sample over the whole run. Undefined on an empty
    /// collection, reported as `InsufficientData` rather than a poison
    /// value.
    pub fn max_time(&self) -> MultipacResult<f64> {
        self.max_time.ok_or_else(|| {
            MultipacError::InsufficientData(
                "empty collection has no global maximum time".to_string(),
            )
        })
    }

    pub fn subset(&self, subset: Subset) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.values().filter(move |p| subset.admits(p))
    }

    pub fn population(&self, subset: Subset) -> usize {
        self.subset(subset).count()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values().filter(|p| p.alive_at_end)
    }

    pub fn collided(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values().filter(|p| p.collided())
    }

    /// Run the per-particle collision search and angle computation over the
    /// whole collection. Normals are checked once up front so a bad call
    /// fails before any particle is touched.
    pub fn detect_collisions(&mut self, mesh: &TriMesh, eps: f64) -> MultipacResult<()> {
        if mesh.cell_normals().is_none() {
            return Err(MultipacError::ConfigError(
                "cell normals must be computed before collision detection".to_string(),
            ));
        }
        for particle in self.particles.values_mut() {
            particle.find_collision(mesh, eps);
            particle.compute_collision_angle(mesh)?;
        }
        Ok(())
    }

    pub fn emission_energies(&self, subset: Subset) -> Vec<f64> {
        self.subset(subset).map(|p| p.emission_energy()).collect()
    }

    /// Impact energies of the collided members of `subset`.
    pub fn collision_energies(&self, subset: Subset) -> Vec<f64> {
        self.subset(subset)
            .filter(|p| p.collided())
            .map(|p| p.collision_energy())
            .collect()
    }

    /// Impact angles of the collided members of `subset`, in the order the
    /// particle IDs iterate.
    pub fn collision_angles(&self, subset: Subset) -> Vec<f64> {
        self.subset(subset)
            .filter_map(|p| p.collision.as_ref())
            .filter_map(|c| c.angle)
            .collect()
    }

    /// Last recorded position of every member of `subset`, in ID order.
    pub fn last_positions(&self, subset: Subset) -> Vec<[f64; 3]> {
        self.subset(subset).map(|p| p.last_pos()).collect()
    }

    /// Normalized last recorded momenta of `subset`; a zero momentum gives
    /// a NaN direction.
    pub fn last_directions(&self, subset: Subset) -> Vec<[f64; 3]> {
        self.subset(subset).map(|p| normalize(p.last_mom())).collect()
    }

    /// Batch every particle's last known state against the mesh: rays start
    /// at the last recorded positions and follow the last momenta
    /// (normalized). Intended for impact histogramming, where survivors are
    /// usually dropped via `include_alive = false`.
    pub fn last_known_survey(
        &self,
        subset: Subset,
        include_alive: bool,
        mesh: &TriMesh,
        eps: f64,
    ) -> MultipacResult<RaySurvey> {
        let mut origins = Vec::new();
        let mut directions = Vec::new();
        for particle in self.subset(subset) {
            if !include_alive && particle.alive_at_end {
                continue;
            }
            origins.push(particle.last_pos());
            directions.push(normalize(particle.last_mom()));
        }
        ray_survey(mesh, &origins, &directions, eps)
    }
}

impl fmt::Display for ParticleMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} particles ({} seed, {} emitted, {} alive, {} collided)",
            self.len(),
            self.population(Subset::Seed),
            self.population(Subset::Emitted),
            self.alive().count(),
            self.collided().count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MonitorRecord;

    fn seeded_monitor() -> ParticleMonitor {
        // Hand-assembled: two particles, one surviving to 2 ns, one lost
        // after 1 ns.
        let mut particles = BTreeMap::new();
        for (id, source, last_raw) in [(1u64, 0u32, 2e-18), (2, 1, 1e-18)] {
            let mut builder = ParticleBuilder::new(MonitorRecord {
                pos: [0.0, 0.0, 0.0],
                mom: [0.0, 0.0, 1.0],
                mass: 9.1093837015e-31,
                charge: -1.6021766e-19,
                macro_charge: -2.5e-17,
                time: 0.0,
                particle_id: id,
                source_id: source,
            });
            builder.push(MonitorRecord {
                pos: [0.0, 0.0, 1.0e-3],
                mom: [0.0, 0.0, 1.0],
                mass: 9.1093837015e-31,
                charge: -1.6021766e-19,
                macro_charge: -2.5e-17,
                time: last_raw,
                particle_id: id,
                source_id: source,
            });
            let mut particle = builder.finalize().unwrap();
            particle
                .extrapolate_beyond_last_step(&ExtrapolationConfig::default())
                .unwrap();
            particles.insert(id, particle);
        }
        let mut monitor = ParticleMonitor {
            particles,
            max_time: Some(2.0),
        };
        for particle in monitor.particles.values_mut() {
            particle.alive_at_end = (2.0 - particle.last_time()).abs() < ALIVE_TIME_TOL_NS;
        }
        monitor
    }

    #[test]
    fn test_subset_projections() {
        let monitor = seeded_monitor();
        assert_eq!(monitor.population(Subset::All), 2);
        assert_eq!(monitor.population(Subset::Seed), 1);
        assert_eq!(monitor.population(Subset::Emitted), 1);
        assert_eq!(monitor.alive().count(), 1);
        assert_eq!(monitor.alive().next().unwrap().particle_id, 1);
    }

    #[test]
    fn test_empty_collection_max_time_is_guarded() {
        let monitor = ParticleMonitor {
            particles: BTreeMap::new(),
            max_time: None,
        };
        assert!(matches!(
            monitor.max_time(),
            Err(MultipacError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_detect_collisions_requires_normals() {
        let mut monitor = seeded_monitor();
        let mesh = TriMesh::new(
            vec![[-50.0, -50.0, 5.0]],
            vec![[100.0, -50.0, 5.0]],
            vec![[-50.0, 100.0, 5.0]],
        )
        .unwrap();
        let err = monitor
            .detect_collisions(&mesh, 1e-6)
            .expect_err("missing normals must be fatal");
        assert!(matches!(err, MultipacError::ConfigError(_)));
    }

    #[test]
    fn test_detect_collisions_fills_dead_particle_only() {
        let mut monitor = seeded_monitor();
        let mut mesh = TriMesh::new(
            vec![[-50.0, -50.0, 5.0]],
            vec![[100.0, -50.0, 5.0]],
            vec![[-50.0, 100.0, 5.0]],
        )
        .unwrap();
        mesh.compute_cell_normals();
        monitor.detect_collisions(&mesh, 1e-6).unwrap();

        // Particle 2 died at 1 ns and its extrapolation crosses the plate.
        assert!(monitor.get(2).unwrap().collided());
        assert!(!monitor.get(1).unwrap().collided());
        assert_eq!(monitor.collided().count(), 1);
        let angles = monitor.collision_angles(Subset::All);
        assert_eq!(angles.len(), 1);
        assert!(angles[0].abs() < 1e-9);
        assert_eq!(monitor.collision_energies(Subset::Seed).len(), 0);
        assert_eq!(monitor.collision_energies(Subset::Emitted).len(), 1);
    }

    #[test]
    fn test_last_state_projections() {
        let monitor = seeded_monitor();
        let positions = monitor.last_positions(Subset::All);
        assert_eq!(positions.len(), 2);
        assert!((positions[0][2] - 1.0).abs() < 1e-12);
        assert_eq!(monitor.last_positions(Subset::Seed).len(), 1);

        let directions = monitor.last_directions(Subset::Emitted);
        assert_eq!(directions.len(), 1);
        assert!((directions[0][2] - 1.0).abs() < 1e-12, "unit momentum");
    }

    #[test]
    fn test_display_summary() {
        let monitor = seeded_monitor();
        let text = format!("{monitor}");
        assert!(text.contains("2 particles"), "summary: {text}");
        assert!(text.contains("1 seed"), "summary: {text}");
    }

    #[test]
    fn test_last_known_survey_shapes() {
        let monitor = seeded_monitor();
        let mut mesh = TriMesh::new(
            vec![[-50.0, -50.0, 5.0], [-50.0, -50.0, 9.0]],
            vec![[100.0, -50.0, 5.0], [100.0, -50.0, 9.0]],
            vec![[-50.0, 100.0, 5.0], [-50.0, 100.0, 9.0]],
        )
        .unwrap();
        mesh.compute_cell_normals();
        let survey = monitor
            .last_known_survey(Subset::All, true, &mesh, 1e-6)
            .unwrap();
        assert_eq!(survey.collisions.dim(), (2, 2));
        // Both particles aim straight up and pierce both plates.
        assert!(survey.collisions.iter().all(|&hit| hit));
        assert!((survey.distances[[0, 0]] - 4.0).abs() < 1e-9);
        assert!((survey.distances[[0, 1]] - 8.0).abs() < 1e-9);

        // Dropping survivors leaves only the particle lost at 1 ns.
        let lost_only = monitor
            .last_known_survey(Subset::All, false, &mesh, 1e-6)
            .unwrap();
        assert_eq!(lost_only.collisions.dim(), (1, 2));
    }
}
