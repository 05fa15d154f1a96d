// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Multipac Results
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Population curves exported by the field solvers, one `SimulationResult`
//! per run, collected into sweeps ordered by accelerating field.

pub mod cst;
pub mod simulation;
pub mod spark3d;
pub mod sweep;
