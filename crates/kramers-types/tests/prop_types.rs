// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Property-Based Tests (proptest) for kramers-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for kramers-types using proptest.
//!
//! Covers: PhaseGrid construction invariants, linear index mapping,
//! RowMoments shapes, configuration serialization roundtrip.

use kramers_types::config::KineticsConfig;
use kramers_types::state::{PhaseGrid, RowMoments};
use proptest::prelude::*;

// ── PhaseGrid Construction Invariants ────────────────────────────────

proptest! {
    /// Cell counts match the rounded span over step, plus one.
    #[test]
    fn grid_cell_counts(
        nx_cells in 8usize..200,
        np_cells in 8usize..200,
        h in 0.05f64..1.0,
    ) {
        let grid = PhaseGrid::new(
            0.0, nx_cells as f64 * h,
            0.0, np_cells as f64 * h,
            h, h, 2,
        );
        prop_assert_eq!(grid.nx, nx_cells + 1);
        prop_assert_eq!(grid.np, np_cells + 1);
        prop_assert_eq!(grid.x.len(), grid.nx);
        prop_assert_eq!(grid.p.len(), grid.np);
    }

    /// Axis boundary values are exact.
    #[test]
    fn grid_boundary_values(
        x_lo in -20.0f64..0.0,
        p_lo in -20.0f64..0.0,
        cells in 10usize..100,
    ) {
        let h = 0.25;
        let x_hi = x_lo + cells as f64 * h;
        let p_hi = p_lo + cells as f64 * h;
        let grid = PhaseGrid::new(x_lo, x_hi, p_lo, p_hi, h, h, 2);

        prop_assert!((grid.x[0] - x_lo).abs() < 1e-10);
        prop_assert!((grid.x[grid.nx - 1] - x_hi).abs() < 1e-10);
        prop_assert!((grid.p[0] - p_lo).abs() < 1e-10);
        prop_assert!((grid.p[grid.np - 1] - p_hi).abs() < 1e-10);
    }

    /// Axes are strictly monotone with uniform spacing.
    #[test]
    fn grid_axes_uniform(cells in 4usize..120) {
        let grid = PhaseGrid::new(-3.0, -3.0 + cells as f64 * 0.1, 0.0, 4.0, 0.1, 0.5, 2);
        for i in 1..grid.nx {
            let delta = grid.x[i] - grid.x[i - 1];
            prop_assert!(delta > 0.0);
            prop_assert!((delta - grid.hx).abs() < 1e-10,
                "Non-uniform x spacing at {}: delta={}, hx={}", i, delta, grid.hx);
        }
    }

    /// Linear index mapping is a bijection over the grid.
    #[test]
    fn grid_index_bijection(
        nx_cells in 6usize..60,
        np_cells in 6usize..60,
    ) {
        let grid = PhaseGrid::new(
            0.0, nx_cells as f64, 0.0, np_cells as f64, 1.0, 1.0, 2,
        );
        for i in 0..grid.nx {
            for j in 0..grid.np {
                let idx = grid.idx(i, j);
                prop_assert!(idx < grid.len());
                prop_assert_eq!(grid.cell(idx), (i, j));
            }
        }
    }

    /// The edge halo is never interior, and expandable cells are interior.
    #[test]
    fn grid_halo_exclusion(
        cells in 12usize..80,
        edge in 2usize..4,
    ) {
        let grid = PhaseGrid::new(0.0, cells as f64, 0.0, cells as f64, 1.0, 1.0, edge);
        for i in 0..grid.nx {
            for j in 0..grid.np {
                let in_halo = i < edge || i >= grid.nx - edge
                    || j < edge || j >= grid.np - edge;
                if in_halo {
                    prop_assert!(!grid.is_interior(i, j));
                }
                if grid.expandable(i, j) {
                    prop_assert!(grid.is_interior(i, j));
                }
            }
        }
    }
}

// ── RowMoments & Config ──────────────────────────────────────────────

proptest! {
    /// Moment profiles are zero-initialized at the requested length.
    #[test]
    fn row_moments_zero_init(nx in 4usize..256) {
        let m = RowMoments::new(nx);
        prop_assert_eq!(m.density.len(), nx);
        prop_assert_eq!(m.velocity.len(), nx);
        prop_assert_eq!(m.temperature.len(), nx);
        for &v in m.density.iter() {
            prop_assert_eq!(v, 0.0);
        }
    }

    /// Any scaling of the default box by whole cells stays valid and
    /// roundtrips through JSON.
    #[test]
    fn config_roundtrip_with_scaled_box(cells in 20usize..120) {
        let mut cfg = KineticsConfig::default();
        cfg.grid.xi1 = -(cells as f64) * 0.1;
        cfg.grid.xf1 = cells as f64 * 0.1;
        cfg.grid.h1 = 0.2;
        cfg.output.trans_x0 = 0.0;
        prop_assert!(cfg.validate().is_ok());

        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: KineticsConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(cfg2.create_grid().nx, cfg.create_grid().nx);
    }
}
