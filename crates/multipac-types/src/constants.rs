// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light (m/s).
pub const CLIGHT: f64 = 299_792_458.0;

/// Speed of light (mm/ns). Multiplies adimensional momentum into velocity.
pub const CLIGHT_MM_PER_NS: f64 = CLIGHT * 1e-6;

/// Elementary charge (C).
pub const Q_ELEM: f64 = 1.6021766e-19;

/// Monitor position columns are in metres; trajectories are kept in mm.
pub const POS_M_TO_MM: f64 = 1e3;

/// CST particle-monitor time columns are in seconds scaled by 1e-18 when the
/// project time unit is ns. Empirical, tool-version specific; not a physical
/// constant.
pub const RAW_TIME_TO_NS: f64 = 1e18;

/// SPARK3D exports time in seconds.
pub const S_TO_NS: f64 = 1e9;

/// Discarded header lines atop every particle-monitor export file.
pub const MONITOR_HEADER_LINES: usize = 6;

/// Absolute tolerance (ns) when matching a particle's last sample against
/// the collection's end time.
pub const ALIVE_TIME_TOL_NS: f64 = 1e-6;
