// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reduced-unit defaults shared by `Default` impls, tests and benches.
//! All runs use the reduced system ħ = m = k_B = 1 unless a config
//! overrides it.

/// Minimum edge halo: the 2nd-order stencil plus the 2-back geometric
/// extrapolation both read two cells outward.
pub const MIN_EDGE: usize = 2;

/// Default time resolution (well inside the explicit-scheme stability
/// region for h = 0.2 grids).
pub const DEFAULT_TIME_STEP: f64 = 0.01;

/// Default grid spacing in both x and p.
pub const DEFAULT_GRID_STEP: f64 = 0.2;

/// Zero-point cutoff on probability density.
pub const DEFAULT_TOL_H: f64 = 1e-10;

/// Leaking threshold on boundary-ring density.
pub const DEFAULT_TOL_L: f64 = 1e-8;

/// Zero-point cutoff on the density first difference.
pub const DEFAULT_TOL_HD: f64 = 1e-10;

/// Leaking threshold on the boundary-ring first difference.
pub const DEFAULT_TOL_LD: f64 = 1e-8;

/// Extrapolation reduction exponent for the small-neighbour fallback.
pub const DEFAULT_EX_REDUCE: f64 = 0.0;

/// Cap on expansion sweeps within a single time step.
pub const DEFAULT_EX_LIMIT: usize = 4;
