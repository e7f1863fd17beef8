// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Kramers Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time-domain solver for the 2-D Klein-Kramers equation with the
//! dynamic truncated-grid scheme: RK4 phase-space integration, active
//! cell tracking, geometric boundary extrapolation and BGK-style
//! collision moments.

pub mod extrapolate;
pub mod mask;
pub mod moments;
pub mod observe;
pub mod potential;
pub mod rk4;
pub mod solver;
