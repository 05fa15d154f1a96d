// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Growth Fitting
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Exponential growth analysis of electron population curves.
//!
//! A multipactor discharge shows up as `N(t) = N0 · exp(α·t)` over the
//! final RF periods of a simulation; `α > 0` means the configuration
//! breeds electrons. The fit runs in log space over a configurable
//! trailing window, with optional running-mean smoothing.

pub mod fit;
pub mod model;
pub mod synthetic;
