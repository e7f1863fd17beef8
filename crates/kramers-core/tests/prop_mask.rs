// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Property-Based Tests (proptest) for the mask
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Structural invariants of the active-region mask under randomized
//! packet widths and cutoffs: the edge halo stays dead, the bounding
//! box is the minimal rectangle containing the mask, dead cells carry
//! no density, and the ring separates live from dead.

use kramers_core::mask::{ActiveRegion, Bounds};
use kramers_types::state::PhaseGrid;
use proptest::prelude::*;

fn gaussian_field(grid: &PhaseGrid, sx: f64, sp: f64) -> Vec<f64> {
    let mut f = vec![0.0; grid.len()];
    for i in grid.interior_rows() {
        for j in grid.interior_cols() {
            let (x, p) = (grid.x[i], grid.p[j]);
            f[grid.idx(i, j)] = (-(x * x) / (2.0 * sx * sx) - (p * p) / (2.0 * sp * sp)).exp();
        }
    }
    f
}

fn minimal_bounds(grid: &PhaseGrid, region: &ActiveRegion) -> Option<Bounds> {
    let mut out: Option<Bounds> = None;
    for i in 0..grid.nx {
        for j in 0..grid.np {
            if region.is_live(grid.idx(i, j)) {
                out = Some(match out {
                    Some(b) => Bounds {
                        i_lo: b.i_lo.min(i),
                        i_hi: b.i_hi.max(i),
                        j_lo: b.j_lo.min(j),
                        j_hi: b.j_hi.max(j),
                    },
                    None => Bounds {
                        i_lo: i,
                        i_hi: i,
                        j_lo: j,
                        j_hi: j,
                    },
                });
            }
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// After initial truncation: halo dead, box minimal, dead cells empty.
    #[test]
    fn initial_truncate_invariants(
        sx in 0.4f64..2.0,
        sp in 0.4f64..2.0,
        log_tol in -10.0f64..-3.0,
    ) {
        let grid = PhaseGrid::new(-6.0, 6.0, -6.0, 6.0, 0.4, 0.4, 2);
        let tol = 10f64.powf(log_tol);
        let mut f = gaussian_field(&grid, sx, sp);
        let mut pf = f.clone();
        let mut region = ActiveRegion::new(&grid);
        region.initial_truncate(&grid, &mut f, &mut pf, tol, tol * tol);

        prop_assert!(region.live_cells() > 0);

        // Edge halo never live.
        for i in 0..grid.nx {
            for j in 0..grid.np {
                if !grid.is_interior(i, j) {
                    prop_assert!(!region.is_live(grid.idx(i, j)));
                }
            }
        }

        // Bounding box equals the minimal rectangle over the mask.
        prop_assert_eq!(region.bounds(), minimal_bounds(&grid, &region));

        // Dead cells carry no density.
        for c in 0..grid.len() {
            if !region.is_live(c) {
                prop_assert_eq!(f[c], 0.0);
            }
        }

        // Live count equals the mask population.
        let popcount = region.mask().iter().filter(|&&m| m).count();
        prop_assert_eq!(region.live_cells(), popcount);
    }

    /// Prune-and-rebuild preserves the same structural invariants.
    #[test]
    fn prune_preserves_invariants(
        sx in 0.4f64..2.0,
        log_tol in -9.0f64..-4.0,
    ) {
        let grid = PhaseGrid::new(-6.0, 6.0, -6.0, 6.0, 0.4, 0.4, 2);
        let tol = 10f64.powf(log_tol);
        let mut f = gaussian_field(&grid, sx, 1.0);
        let mut pf = f.clone();
        let mut region = ActiveRegion::new(&grid);
        region.initial_truncate(&grid, &mut f, &mut pf, tol, tol * tol);

        // A slightly tighter cutoff forces real kills on the rim.
        let ff = f.clone();
        region.prune_and_rebuild(&grid, &ff, &mut f, &mut pf, tol * 10.0, tol * tol);

        prop_assert_eq!(region.bounds(), minimal_bounds(&grid, &region));
        let popcount = region.mask().iter().filter(|&&m| m).count();
        prop_assert_eq!(region.live_cells(), popcount);
        for c in 0..grid.len() {
            if !region.is_live(c) {
                prop_assert_eq!(f[c], 0.0);
            }
        }

        // Ring members are live with at least one dead 4-neighbour,
        // relative to the pre-expansion mask they were derived from.
        for &c in region.boundary() {
            prop_assert!(region.is_live(c));
        }
    }
}
