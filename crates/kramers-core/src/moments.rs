// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Momentum Moments
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-row momentum moments ρ, u, T_loc and the local Maxwellian
//! feeding the BGK collision term.
//!
//! The drift integrand uses raw p and divides by m·ρ:
//! u = (1/(m ρ)) ∫ p f dp. The f_eq > 1/(h_x h_p) clip is a numerical
//! guardrail against tail blow-ups, not a physical constraint.

use std::f64::consts::PI;

use kramers_types::config::{CollisionParams, PhysicsParams};
use kramers_types::state::{PhaseGrid, RowMoments};

/// Collision-operator variant, branched once per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    /// Relaxation toward the reference Maxwellian: u = 0, T = T_bath.
    Linearized,
    /// Drifting Maxwellian at the bath temperature.
    Isothermal,
    /// Full Fokker-Planck moments: drift and local temperature.
    FullFokkerPlanck,
}

impl CollisionMode {
    /// Linearized takes precedence over isothermal; both unset selects
    /// the full moment set.
    pub fn from_config(c: &CollisionParams) -> Self {
        if c.linearized {
            CollisionMode::Linearized
        } else if c.isothermal {
            CollisionMode::Isothermal
        } else {
            CollisionMode::FullFokkerPlanck
        }
    }
}

/// Local Maxwellian ρ √(1/(2π m k_B T)) exp(−(p − m u)²/(2 m k_B T)).
#[inline]
pub fn maxwellian(density: f64, velocity: f64, temperature: f64, m: f64, kb: f64, p: f64) -> f64 {
    let mkt = m * kb * temperature;
    let dp = p - m * velocity;
    density * (1.0 / (2.0 * PI * mkt)).sqrt() * (-dp * dp / (2.0 * mkt)).exp()
}

#[inline]
fn clip(feq: f64, cap: f64) -> f64 {
    if feq > cap || !feq.is_finite() {
        0.0
    } else {
        feq
    }
}

/// Recompute the moments and f_eq of one x-row over `j_lo..=j_hi`,
/// restricted to live cells when a mask is given. Rows with ρ ≤ 0 hold
/// zeros and a zero f_eq. `clip_oversized` applies the 1/(h_x h_p)
/// guardrail inline; the neighbour-smoothing variant defers it.
#[allow(clippy::too_many_arguments)]
pub fn update_row(
    grid: &PhaseGrid,
    physics: &PhysicsParams,
    mode: CollisionMode,
    f: &[f64],
    i: usize,
    j_lo: usize,
    j_hi: usize,
    mask: Option<&[bool]>,
    moments: &mut RowMoments,
    feq: &mut [f64],
    clip_oversized: bool,
) {
    let live = |c: usize| mask.map_or(true, |m| m[c]);
    let hp = grid.hp;
    let m = physics.m;
    let kb = physics.kb;
    let cap = if clip_oversized {
        1.0 / grid.cell_area()
    } else {
        f64::INFINITY
    };

    let mut density = 0.0;
    for j in j_lo..=j_hi {
        let c = grid.idx(i, j);
        if live(c) {
            density += f[c] * hp;
        }
    }
    if density <= 0.0 {
        moments.clear_row(i);
        for j in j_lo..=j_hi {
            let c = grid.idx(i, j);
            if live(c) {
                feq[c] = 0.0;
            }
        }
        return;
    }

    let (velocity, temperature) = match mode {
        CollisionMode::Linearized => (0.0, physics.temp),
        CollisionMode::Isothermal => {
            let mut u = 0.0;
            for j in j_lo..=j_hi {
                let c = grid.idx(i, j);
                if live(c) {
                    u += grid.p[j] * f[c] * hp;
                }
            }
            (u / (m * density), physics.temp)
        }
        CollisionMode::FullFokkerPlanck => {
            let mut u = 0.0;
            for j in j_lo..=j_hi {
                let c = grid.idx(i, j);
                if live(c) {
                    u += grid.p[j] * f[c] * hp;
                }
            }
            u /= m * density;
            let mut t_loc = 0.0;
            for j in j_lo..=j_hi {
                let c = grid.idx(i, j);
                if live(c) {
                    t_loc += (grid.p[j] - m * u).powi(2) * f[c] * hp;
                }
            }
            (u, t_loc / (m * kb * density))
        }
    };

    for j in j_lo..=j_hi {
        let c = grid.idx(i, j);
        if live(c) {
            feq[c] = clip(maxwellian(density, velocity, temperature, m, kb, grid.p[j]), cap);
        }
    }

    moments.density[i] = density;
    moments.velocity[i] = velocity;
    moments.temperature[i] = temperature;
}

/// Row-loop driver over an inclusive row range.
#[allow(clippy::too_many_arguments)]
pub fn update_rows(
    grid: &PhaseGrid,
    physics: &PhysicsParams,
    mode: CollisionMode,
    f: &[f64],
    rows: std::ops::RangeInclusive<usize>,
    j_lo: usize,
    j_hi: usize,
    mask: Option<&[bool]>,
    moments: &mut RowMoments,
    feq: &mut [f64],
    clip_oversized: bool,
) {
    for i in rows {
        update_row(
            grid,
            physics,
            mode,
            f,
            i,
            j_lo,
            j_hi,
            mask,
            moments,
            feq,
            clip_oversized,
        );
    }
}

/// Re-evaluate f_eq at individual cells from the cached row moments.
/// Used when the expansion loop adds cells mid-step: the row integrals
/// are not recomputed, only the Maxwellian at the new momenta.
pub fn refresh_cells(
    grid: &PhaseGrid,
    physics: &PhysicsParams,
    moments: &RowMoments,
    cells: &[usize],
    feq: &mut [f64],
) {
    let cap = 1.0 / grid.cell_area();
    for &c in cells {
        let (i, j) = grid.cell(c);
        let density = moments.density[i];
        feq[c] = if density > 0.0 {
            clip(
                maxwellian(
                    density,
                    moments.velocity[i],
                    moments.temperature[i],
                    physics.m,
                    physics.kb,
                    grid.p[j],
                ),
                cap,
            )
        } else {
            0.0
        };
    }
}

/// Optional radical removal: replace oversized or non-finite f_eq
/// values by the average over live 4-neighbours, then clip. In-place,
/// sequential, so an already-repaired neighbour feeds the next cell.
#[allow(clippy::too_many_arguments)]
pub fn smooth_oversized(
    grid: &PhaseGrid,
    mask: Option<&[bool]>,
    rows: std::ops::RangeInclusive<usize>,
    j_lo: usize,
    j_hi: usize,
    feq: &mut [f64],
) {
    let live = |c: usize| mask.map_or(true, |m| m[c]);
    let cap = 1.0 / grid.cell_area();
    let np = grid.np;
    for i in rows {
        for j in j_lo..=j_hi {
            let c = grid.idx(i, j);
            if !live(c) {
                continue;
            }
            let v = feq[c];
            if v > cap || !v.is_finite() {
                let neighbours = [c - np, c + np, c - 1, c + 1];
                let count = neighbours.iter().filter(|&&n| live(n)).count();
                let avg = if count == 0 {
                    0.0
                } else {
                    neighbours
                        .iter()
                        .filter(|&&n| live(n))
                        .map(|&n| feq[n])
                        .sum::<f64>()
                        / count as f64
                };
                feq[c] = clip(avg, cap);
            }
        }
    }
}
