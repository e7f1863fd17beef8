// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EX_LIMIT, DEFAULT_EX_REDUCE, DEFAULT_GRID_STEP, DEFAULT_TIME_STEP, DEFAULT_TOL_H,
    DEFAULT_TOL_HD, DEFAULT_TOL_L, DEFAULT_TOL_LD, MIN_EDGE,
};
use crate::error::{KineticsError, KineticsResult};
use crate::state::PhaseGrid;

/// Analytic potential family, selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotentialKind {
    /// Quartic double well 0.007 x⁴ − 0.01 x².
    #[serde(rename = "DW1")]
    DoubleWell1,
    /// Free particle, V ≡ 0.
    #[serde(rename = "DW2")]
    Free,
    /// Metastable cubic well with flat product region.
    #[serde(rename = "MSW-1")]
    MetastableWell,
}

/// Top-level solver parameter record.
/// Maps 1:1 to the JSON parameter files; external option names that are
/// not idiomatic Rust are carried via serde renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineticsConfig {
    pub run_name: String,
    pub potential: PotentialKind,
    pub grid: GridParams,
    pub physics: PhysicsParams,
    pub packet: PacketParams,
    pub truncation: TruncationParams,
    pub collision: CollisionParams,
    pub output: OutputParams,
    pub schedule: ScheduleParams,
}

/// Domain rectangle [xi1, xf1] × [xi2, xf2], steps h1/h2, edge halo,
/// time resolution k and total time Tf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    pub xi1: f64,
    pub xf1: f64,
    pub xi2: f64,
    pub xf2: f64,
    pub h1: f64,
    pub h2: f64,
    pub edge: usize,
    #[serde(rename = "k")]
    pub time_step: f64,
    #[serde(rename = "Tf")]
    pub t_final: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsParams {
    pub hb: f64,
    pub m: f64,
    pub kb: f64,
    pub temp: f64,
    pub gamma: f64,
}

/// Initial Gaussian packet: centres (x01, x02) and widths (a1, a2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketParams {
    pub x01: f64,
    pub x02: f64,
    pub a1: f64,
    pub a2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncationParams {
    #[serde(rename = "isFullGrid")]
    pub full_grid: bool,
    #[serde(rename = "TolH")]
    pub tol_h: f64,
    #[serde(rename = "TolL")]
    pub tol_l: f64,
    #[serde(rename = "TolHd")]
    pub tol_hd: f64,
    #[serde(rename = "TolLd")]
    pub tol_ld: f64,
    #[serde(rename = "ExReduce")]
    pub ex_reduce: f64,
    #[serde(rename = "ExLimit")]
    pub ex_limit: usize,
    /// Average oversized f_eq cells over their live neighbours instead of
    /// clipping to zero. Off by default.
    #[serde(default)]
    pub feq_neighbor_smoothing: bool,
}

/// Collision-term selection. Linearized takes precedence over isothermal;
/// both false selects the full Fokker–Planck moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionParams {
    #[serde(rename = "isIsothermal")]
    pub isothermal: bool,
    #[serde(rename = "isLinearizedCollision")]
    pub linearized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputParams {
    #[serde(rename = "isTrans")]
    pub trans: bool,
    #[serde(rename = "isAcf")]
    pub acf: bool,
    pub trans_x0: f64,
    #[serde(rename = "isPrintEdge")]
    pub print_edge: bool,
    #[serde(rename = "isPrintLocalDensity")]
    pub print_local_density: bool,
    #[serde(rename = "isPrintDriftVelocity")]
    pub print_drift_velocity: bool,
    #[serde(rename = "isPrintLocalTemperature")]
    pub print_local_temperature: bool,
    #[serde(rename = "isPrintWavefunc")]
    pub print_wavefunc: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub period: usize,
    /// Accepted for parameter-file compatibility; this solver never sorts.
    pub sortperiod: usize,
    pub printperiod: usize,
    pub printwavefuncperiod: usize,
    pub quiet: bool,
    pub timing: bool,
}

impl Default for KineticsConfig {
    fn default() -> Self {
        KineticsConfig {
            run_name: "kramers-tg".to_string(),
            potential: PotentialKind::Free,
            grid: GridParams {
                xi1: -10.0,
                xf1: 10.0,
                xi2: -10.0,
                xf2: 10.0,
                h1: DEFAULT_GRID_STEP,
                h2: DEFAULT_GRID_STEP,
                edge: MIN_EDGE,
                time_step: DEFAULT_TIME_STEP,
                t_final: 10.0,
            },
            physics: PhysicsParams {
                hb: 1.0,
                m: 1.0,
                kb: 1.0,
                temp: 1.0,
                gamma: 1.0,
            },
            packet: PacketParams {
                x01: 0.0,
                x02: 0.0,
                a1: 0.5,
                a2: 0.5,
            },
            truncation: TruncationParams {
                full_grid: false,
                tol_h: DEFAULT_TOL_H,
                tol_l: DEFAULT_TOL_L,
                tol_hd: DEFAULT_TOL_HD,
                tol_ld: DEFAULT_TOL_LD,
                ex_reduce: DEFAULT_EX_REDUCE,
                ex_limit: DEFAULT_EX_LIMIT,
                feq_neighbor_smoothing: false,
            },
            collision: CollisionParams {
                isothermal: false,
                linearized: false,
            },
            output: OutputParams {
                trans: true,
                acf: false,
                trans_x0: 0.0,
                print_edge: false,
                print_local_density: false,
                print_drift_velocity: false,
                print_local_temperature: false,
                print_wavefunc: false,
            },
            schedule: ScheduleParams {
                period: 10,
                sortperiod: 100,
                printperiod: 100,
                printwavefuncperiod: 1000,
                quiet: false,
                timing: false,
            },
        }
    }
}

impl KineticsConfig {
    /// Load from a JSON parameter file.
    pub fn from_file(path: &str) -> KineticsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent parameters before any buffer is allocated.
    pub fn validate(&self) -> KineticsResult<()> {
        let g = &self.grid;
        if !(g.h1 > 0.0 && g.h1.is_finite()) || !(g.h2 > 0.0 && g.h2.is_finite()) {
            return Err(KineticsError::Config(
                "grid steps h1, h2 must be finite and > 0".to_string(),
            ));
        }
        if g.xf1 <= g.xi1 || g.xf2 <= g.xi2 {
            return Err(KineticsError::Config(
                "domain rectangle must satisfy xf1 > xi1 and xf2 > xi2".to_string(),
            ));
        }
        for (span, h, name) in [(g.xf1 - g.xi1, g.h1, "x"), (g.xf2 - g.xi2, g.h2, "p")] {
            let cells = span / h;
            if (cells - cells.round()).abs() > 1e-6 {
                return Err(KineticsError::Config(format!(
                    "{name} extent is not an integer number of cells: {span} / {h}"
                )));
            }
        }
        if g.edge < MIN_EDGE {
            return Err(KineticsError::Config(format!(
                "edge halo must be >= {MIN_EDGE} for the stencil and 2-back extrapolation"
            )));
        }
        let nx = ((g.xf1 - g.xi1) / g.h1).round() as usize + 1;
        let np = ((g.xf2 - g.xi2) / g.h2).round() as usize + 1;
        if nx <= 2 * g.edge + 2 || np <= 2 * g.edge + 2 {
            return Err(KineticsError::Config(format!(
                "grid {nx}x{np} leaves no interior inside the edge halo"
            )));
        }
        if !(g.time_step > 0.0 && g.time_step.is_finite()) {
            return Err(KineticsError::Config(
                "time step k must be finite and > 0".to_string(),
            ));
        }
        if g.t_final < g.time_step {
            return Err(KineticsError::Config(
                "total time Tf must cover at least one step".to_string(),
            ));
        }

        let ph = &self.physics;
        for (v, name) in [
            (ph.hb, "hb"),
            (ph.m, "m"),
            (ph.kb, "kb"),
            (ph.temp, "temp"),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return Err(KineticsError::Config(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !(ph.gamma >= 0.0 && ph.gamma.is_finite()) {
            return Err(KineticsError::Config(
                "gamma must be finite and >= 0".to_string(),
            ));
        }

        if !(self.packet.a1 > 0.0) || !(self.packet.a2 > 0.0) {
            return Err(KineticsError::Config(
                "packet widths a1, a2 must be > 0".to_string(),
            ));
        }

        let t = &self.truncation;
        for (v, name) in [
            (t.tol_h, "TolH"),
            (t.tol_l, "TolL"),
            (t.tol_hd, "TolHd"),
            (t.tol_ld, "TolLd"),
            (t.ex_reduce, "ExReduce"),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(KineticsError::Config(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }

        if self.output.trans_x0 < g.xi1 || self.output.trans_x0 > g.xf1 {
            return Err(KineticsError::Config(
                "trans_x0 must lie inside [xi1, xf1]".to_string(),
            ));
        }

        let s = &self.schedule;
        if s.period == 0 || s.printperiod == 0 || s.printwavefuncperiod == 0 {
            return Err(KineticsError::Config(
                "report periods must be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the phase-space grid from the validated dimensions.
    pub fn create_grid(&self) -> PhaseGrid {
        PhaseGrid::new(
            self.grid.xi1,
            self.grid.xf1,
            self.grid.xi2,
            self.grid.xf2,
            self.grid.h1,
            self.grid.h2,
            self.grid.edge,
        )
    }

    /// Number of time steps covered by Tf.
    pub fn step_count(&self) -> usize {
        (self.grid.t_final / self.grid.time_step) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Build a path relative to the repository root. CARGO_MANIFEST_DIR
    /// points to crates/kramers-types/ at compile time, so go up two
    /// levels.
    fn root_path(relative: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(relative)
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_load_free_particle_config() {
        let cfg = KineticsConfig::from_file(&root_path("freeparticle.json")).unwrap();
        assert_eq!(cfg.run_name, "free-particle");
        assert_eq!(cfg.potential, PotentialKind::Free);
        assert!(cfg.truncation.full_grid);
        assert!(cfg.collision.isothermal);
        assert!((cfg.grid.time_step - 0.01).abs() < 1e-15);
        assert_eq!(cfg.create_grid().nx, 101);
    }

    #[test]
    fn test_load_double_well_config() {
        let cfg = KineticsConfig::from_file(&root_path("doublewell.json")).unwrap();
        assert_eq!(cfg.run_name, "double-well");
        assert_eq!(cfg.potential, PotentialKind::DoubleWell1);
        assert!(!cfg.truncation.full_grid);
        assert!((cfg.physics.temp - 0.05).abs() < 1e-15);
        assert_eq!(cfg.truncation.ex_limit, 4);
        // The smoothing flag is absent from the file and defaults off.
        assert!(!cfg.truncation.feq_neighbor_smoothing);
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = KineticsConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.step_count(), 1000);
    }

    #[test]
    fn test_create_grid_dimensions() {
        let cfg = KineticsConfig::default();
        let grid = cfg.create_grid();
        assert_eq!(grid.nx, 101);
        assert_eq!(grid.np, 101);
        assert!((grid.hx - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = KineticsConfig::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2: KineticsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.run_name, cfg2.run_name);
        assert_eq!(cfg.potential, cfg2.potential);
        assert_eq!(cfg.truncation.ex_limit, cfg2.truncation.ex_limit);
        assert!((cfg.grid.time_step - cfg2.grid.time_step).abs() < 1e-15);
    }

    #[test]
    fn test_external_option_names() {
        let cfg = KineticsConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        for name in [
            "\"Tf\"",
            "\"isFullGrid\"",
            "\"TolH\"",
            "\"TolLd\"",
            "\"ExReduce\"",
            "\"ExLimit\"",
            "\"isIsothermal\"",
            "\"isLinearizedCollision\"",
            "\"isTrans\"",
            "\"isAcf\"",
            "\"isPrintWavefunc\"",
            "\"DW2\"",
        ] {
            assert!(json.contains(name), "serialized config missing {name}");
        }
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let mut cfg = KineticsConfig::default();
        cfg.truncation.tol_h = -1e-10;
        match cfg.validate() {
            Err(KineticsError::Config(msg)) => assert!(msg.contains("TolH")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_integer_cell_count() {
        let mut cfg = KineticsConfig::default();
        cfg.grid.h1 = 0.3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_thin_edge() {
        let mut cfg = KineticsConfig::default();
        cfg.grid.edge = 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_halo_swallowing_grid() {
        let mut cfg = KineticsConfig::default();
        cfg.grid.xi1 = -1.0;
        cfg.grid.xf1 = 1.0;
        cfg.grid.h1 = 0.5;
        cfg.output.trans_x0 = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_trans_surface_outside_box() {
        let mut cfg = KineticsConfig::default();
        cfg.output.trans_x0 = 11.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_potential_tags() {
        for (tag, kind) in [
            ("\"DW1\"", PotentialKind::DoubleWell1),
            ("\"DW2\"", PotentialKind::Free),
            ("\"MSW-1\"", PotentialKind::MetastableWell),
        ] {
            let parsed: PotentialKind = serde_json::from_str(tag).unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
