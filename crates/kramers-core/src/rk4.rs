// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — RK4 Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// ─────────────────────────────────────────────────────────────────────
//! 4-stage Runge-Kutta update of the discretized Klein-Kramers
//! operator
//!
//!   L[f] = −(p/m) ∂f/∂x + V′(x) ∂f/∂p + γ (f_eq − f)
//!
//! with central ±1 differences. f_eq is frozen across the four stages;
//! moments are never re-evaluated mid-step.
//!
//! One stage kernel, three iteration domains: the edge-trimmed full
//! interior, the bounding box filtered by the live mask, and an
//! explicit cell list for the expansion revisit set.

use rayon::prelude::*;

use crate::mask::Bounds;
use crate::potential::PotentialModel;
use kramers_types::config::PhysicsParams;
use kramers_types::state::PhaseGrid;

/// Precomputed stage constants c_x = Δt/(2 h_x m), c_p = Δt/(2 h_p),
/// c_γ = Δt·γ.
#[derive(Debug, Clone, Copy)]
pub struct StepCoeffs {
    pub cx: f64,
    pub cp: f64,
    pub cgamma: f64,
}

impl StepCoeffs {
    pub fn new(time_step: f64, grid: &PhaseGrid, physics: &PhysicsParams) -> Self {
        StepCoeffs {
            cx: time_step / (2.0 * grid.hx * physics.m),
            cp: time_step / (2.0 * grid.hp),
            cgamma: time_step * physics.gamma,
        }
    }
}

/// Stage increment buffers K1..K4, one value per grid cell.
#[derive(Debug, Clone)]
pub struct StageBuffers {
    pub k1: Vec<f64>,
    pub k2: Vec<f64>,
    pub k3: Vec<f64>,
    pub k4: Vec<f64>,
}

impl StageBuffers {
    pub fn new(len: usize) -> Self {
        StageBuffers {
            k1: vec![0.0; len],
            k2: vec![0.0; len],
            k3: vec![0.0; len],
            k4: vec![0.0; len],
        }
    }
}

/// Iteration scope of one stage sweep.
#[derive(Debug, Clone, Copy)]
pub enum StageDomain<'a> {
    /// Edge-trimmed interior (full-grid mode).
    Interior,
    /// Bounding box intersected with the live mask.
    Active { bounds: Bounds, mask: &'a [bool] },
    /// Explicit cell list (expansion revisit set).
    Cells(&'a [usize]),
}

/// Stage operator at one cell: the upwind-free central-difference
/// evaluation of L applied to f + α·k_prev.
#[inline]
#[allow(clippy::too_many_arguments)]
fn stage_rhs(
    grid: &PhaseGrid,
    pot: &PotentialModel,
    coeffs: StepCoeffs,
    feq: &[f64],
    f: &[f64],
    k_prev: &[f64],
    alpha: f64,
    i: usize,
    j: usize,
) -> f64 {
    let np = grid.np;
    let c = i * np + j;
    let up = |d: usize| f[d] + alpha * k_prev[d];
    -coeffs.cx * grid.p[j] * (up(c + np) - up(c - np))
        + coeffs.cp * pot.dv_dx(grid.x[i]) * (up(c + 1) - up(c - 1))
        + coeffs.cgamma * (feq[c] - up(c))
}

/// One stage sweep: write the stage increment into `k_out` and fold it
/// into the accumulator `ff` with the Butcher weight.
#[allow(clippy::too_many_arguments)]
fn stage(
    grid: &PhaseGrid,
    pot: &PotentialModel,
    coeffs: StepCoeffs,
    feq: &[f64],
    f: &[f64],
    k_prev: &[f64],
    alpha: f64,
    weight: f64,
    first: bool,
    k_out: &mut [f64],
    ff: &mut [f64],
    domain: &StageDomain,
) {
    if let StageDomain::Cells(cells) = domain {
        for &c in *cells {
            let (i, j) = grid.cell(c);
            let k = stage_rhs(grid, pot, coeffs, feq, f, k_prev, alpha, i, j);
            if first {
                ff[c] = f[c] + weight * k;
            } else {
                ff[c] += weight * k;
            }
            k_out[c] = k;
        }
        return;
    }

    let np = grid.np;
    k_out
        .par_chunks_mut(np)
        .zip(ff.par_chunks_mut(np))
        .enumerate()
        .for_each(|(i, (k_row, ff_row))| {
            let cols = match domain {
                StageDomain::Interior => {
                    if i < grid.edge || i >= grid.nx - grid.edge {
                        return;
                    }
                    grid.interior_cols()
                }
                StageDomain::Active { bounds, .. } => {
                    if i < bounds.i_lo || i > bounds.i_hi {
                        return;
                    }
                    bounds.j_lo..bounds.j_hi + 1
                }
                StageDomain::Cells(_) => return,
            };
            for j in cols {
                if let StageDomain::Active { mask, .. } = domain {
                    if !mask[i * np + j] {
                        continue;
                    }
                }
                let k = stage_rhs(grid, pot, coeffs, feq, f, k_prev, alpha, i, j);
                if first {
                    ff_row[j] = f[i * np + j] + weight * k;
                } else {
                    ff_row[j] += weight * k;
                }
                k_row[j] = k;
            }
        });
}

/// Full RK4 update over the given domain:
/// FF = F + K1/6 + K2/3 + K3/3 + K4/6 with K_{s+1} evaluated on
/// F + α_s K_s, α = (0, ½, ½, 1).
#[allow(clippy::too_many_arguments)]
pub fn rk4_step(
    grid: &PhaseGrid,
    pot: &PotentialModel,
    coeffs: StepCoeffs,
    feq: &[f64],
    f: &[f64],
    stages: &mut StageBuffers,
    ff: &mut [f64],
    domain: &StageDomain,
) {
    stage(
        grid, pot, coeffs, feq, f, f, 0.0, 1.0 / 6.0, true, &mut stages.k1, ff, domain,
    );
    stage(
        grid, pot, coeffs, feq, f, &stages.k1, 0.5, 1.0 / 3.0, false, &mut stages.k2, ff, domain,
    );
    stage(
        grid, pot, coeffs, feq, f, &stages.k2, 0.5, 1.0 / 3.0, false, &mut stages.k3, ff, domain,
    );
    stage(
        grid, pot, coeffs, feq, f, &stages.k3, 1.0, 1.0 / 6.0, false, &mut stages.k4, ff, domain,
    );
}
