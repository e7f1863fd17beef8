// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Boundary Extrapolation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geometric extrapolation of the distribution into freshly included
//! cells when probability mass diffuses past the current support.
//!
//! A frontier cell seeds its zero-valued 4-neighbours; each target is
//! filled direction-wise from the two nearest live values as f₁²/f₂
//! (exact for an exponential tail), with a damped fallback to the
//! smallest neighbour when the average overshoots it.

use crate::mask::{masked_gradient_sq, ActiveRegion};
use kramers_types::state::PhaseGrid;

/// Offsets of the Manhattan-distance ≤ 4 diamond around a cell, the
/// neighbourhood an extrapolated value can influence through the four
/// RK4 stages.
pub fn diamond_offsets() -> Vec<(isize, isize)> {
    let mut offsets = Vec::new();
    for d in 1..=4isize {
        for n1 in -d..=d {
            let n2 = d - n1.abs();
            if n2 != 0 {
                offsets.push((n1, n2));
                offsets.push((n1, -n2));
            } else {
                offsets.push((n1, 0));
            }
        }
    }
    offsets
}

/// Frontier TBL: boundary-ring cells whose last accepted density or
/// masked first difference exceeds the leaking thresholds, restricted
/// to the expandable interior. Ascending order (the ring is ordered).
pub fn collect_leaking(
    grid: &PhaseGrid,
    region: &ActiveRegion,
    f: &[f64],
    pf: &[f64],
    tol_l: f64,
    tol_ld_sq: f64,
) -> Vec<usize> {
    region
        .boundary()
        .iter()
        .copied()
        .filter(|&c| {
            let (i, j) = grid.cell(c);
            let b1 = pf[c] >= tol_l;
            let b2 = masked_gradient_sq(grid, region.mask(), f, i, j) >= tol_ld_sq;
            (b1 || b2) && grid.expandable(i, j)
        })
        .collect()
}

/// Zero-valued 4-neighbours of the frontier inside the expandable
/// interior, deduplicated, with the frontier itself removed.
/// `tbl` must be sorted ascending.
pub fn expansion_targets(grid: &PhaseGrid, tbl: &[usize], f: &[f64]) -> Vec<usize> {
    let np = grid.np;
    let mut targets = Vec::new();
    for &c in tbl {
        let (i, j) = grid.cell(c);
        if i > grid.edge + 1 && f[c - np] == 0.0 {
            targets.push(c - np);
        }
        if i + 1 < grid.nx - grid.edge - 1 && f[c + np] == 0.0 {
            targets.push(c + np);
        }
        if j > grid.edge + 1 && f[c - 1] == 0.0 {
            targets.push(c - 1);
        }
        if j + 1 < grid.np - grid.edge - 1 && f[c + 1] == 0.0 {
            targets.push(c + 1);
        }
    }
    targets.sort_unstable();
    targets.dedup();
    targets.retain(|c| tbl.binary_search(c).is_err());
    targets
}

/// Direction-wise geometric extrapolation of one ring of targets.
///
/// For each direction with two non-zero cells the candidate is
/// exp(2·ln f₁ − ln f₂); non-finite candidates (including negative
/// arguments to the log) are discarded. If the averaged candidate
/// exceeds the magnitude of the smallest contributing neighbour, the
/// value falls back to that neighbour damped by exp(−ExReduce·h).
/// `None` marks a target with no usable direction.
pub fn extrapolate_values(
    grid: &PhaseGrid,
    f: &[f64],
    targets: &[usize],
    ex_reduce: f64,
) -> Vec<Option<f64>> {
    let np = grid.np as isize;
    let dirs: [(isize, f64); 4] = [
        (-np, grid.hx),
        (np, grid.hx),
        (-1, grid.hp),
        (1, grid.hp),
    ];

    targets
        .iter()
        .map(|&c| {
            let mut sum = 0.0;
            let mut count = 0usize;
            let mut val_min = f64::MAX;
            let mut val_min_abs = f64::MAX;
            let mut h_min = grid.hx;

            for (off, h) in dirs {
                let c1 = (c as isize + off) as usize;
                let c2 = (c as isize + 2 * off) as usize;
                if f[c1] != 0.0 {
                    if f[c1].abs() < val_min_abs && f[c2] != 0.0 {
                        val_min_abs = f[c1].abs();
                        val_min = f[c1];
                        h_min = h;
                    }
                    if f[c2] != 0.0 {
                        let val = (2.0 * f[c1].ln() - f[c2].ln()).exp();
                        if val.is_finite() {
                            sum += val;
                            count += 1;
                        }
                    }
                }
            }

            if count == 0 {
                None
            } else {
                let avg = sum / count as f64;
                if avg.abs() > val_min_abs {
                    Some(val_min * (-ex_reduce * h_min).exp())
                } else {
                    Some(avg)
                }
            }
        })
        .collect()
}

/// The cell set the RK4 revisit must cover after a commit: the new
/// cells plus every live cell within the influence diamond.
pub fn revisit_set(grid: &PhaseGrid, region: &ActiveRegion, committed: &[usize]) -> Vec<usize> {
    let offsets = diamond_offsets();
    let mut out = Vec::new();
    for &c in committed {
        out.push(c);
        let (i, j) = grid.cell(c);
        for &(n1, n2) in &offsets {
            let ii = i as isize + n1;
            let jj = j as isize + n2;
            if ii < 0 || jj < 0 || ii >= grid.nx as isize || jj >= grid.np as isize {
                continue;
            }
            let idx = grid.idx(ii as usize, jj as usize);
            if region.is_live(idx) {
                out.push(idx);
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Frontier for the next expansion sweep: committed cells whose
/// tentative density or masked first difference already exceeds the
/// zero-point cutoffs again.
pub fn frontier_from_new_cells(
    grid: &PhaseGrid,
    region: &ActiveRegion,
    ff: &[f64],
    committed: &[usize],
    tol_h: f64,
    tol_hd_sq: f64,
) -> Vec<usize> {
    committed
        .iter()
        .copied()
        .filter(|&c| {
            let (i, j) = grid.cell(c);
            let b1 = ff[c] >= tol_h;
            let b2 = masked_gradient_sq(grid, region.mask(), ff, i, j) >= tol_hd_sq;
            (b1 || b2) && grid.expandable(i, j)
        })
        .collect()
}

/// a \ b over ascending index lists.
pub fn sorted_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|c| b.binary_search(c).is_err())
        .collect()
}

/// dst ∪ src, keeping dst sorted and unique.
pub fn merge_sorted(dst: &mut Vec<usize>, src: &[usize]) {
    dst.extend_from_slice(src);
    dst.sort_unstable();
    dst.dedup();
}
