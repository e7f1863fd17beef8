// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Observable Dumps
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Append-mode `.dat` emission of the configured observables, one block
//! per period. Layouts:
//!
//! - `wave.dat`:   `<tt> <count>` then `<i> <j> <f>` rows
//! - `edge.dat`:   `<tt> <t> <count>` then `<i> <j> <x> <p>` rows
//! - `density.dat`, `driftvelocity.dat`, `localtemperature.dat`:
//!   `<tt> <t> <rows>` then `<x> <value>` rows

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::solver::KramersSolver;
use kramers_types::config::KineticsConfig;
use kramers_types::error::KineticsResult;

enum Profile {
    Density,
    DriftVelocity,
    LocalTemperature,
}

/// Lazily opened, append-mode writers for the enabled dump channels.
/// `sink()` disables them all, for tests and library embedding.
pub struct ObservableWriters {
    wave: Option<BufWriter<File>>,
    edge: Option<BufWriter<File>>,
    density: Option<BufWriter<File>>,
    velocity: Option<BufWriter<File>>,
    temperature: Option<BufWriter<File>>,
}

fn open_append(dir: &Path, name: &str) -> KineticsResult<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(name))?;
    Ok(BufWriter::new(file))
}

impl ObservableWriters {
    /// No-op writer set.
    pub fn sink() -> Self {
        ObservableWriters {
            wave: None,
            edge: None,
            density: None,
            velocity: None,
            temperature: None,
        }
    }

    /// Open the channels enabled by the config inside `dir`.
    pub fn create_in(dir: &Path, config: &KineticsConfig) -> KineticsResult<Self> {
        let out = &config.output;
        Ok(ObservableWriters {
            wave: if out.print_wavefunc {
                Some(open_append(dir, "wave.dat")?)
            } else {
                None
            },
            edge: if out.print_edge && !config.truncation.full_grid {
                Some(open_append(dir, "edge.dat")?)
            } else {
                None
            },
            density: if out.print_local_density {
                Some(open_append(dir, "density.dat")?)
            } else {
                None
            },
            velocity: if out.print_drift_velocity {
                Some(open_append(dir, "driftvelocity.dat")?)
            } else {
                None
            },
            temperature: if out.print_local_temperature {
                Some(open_append(dir, "localtemperature.dat")?)
            } else {
                None
            },
        })
    }

    /// Emit the dumps due at the start of step `tt`.
    pub fn dump_step(&mut self, solver: &KramersSolver, tt: usize) -> KineticsResult<()> {
        let sched = &solver.config().schedule;
        if let Some(w) = self.wave.as_mut() {
            if tt % sched.printwavefuncperiod == 0 {
                write_wave(w, solver, tt)?;
            }
        }
        if tt % sched.printperiod == 0 {
            if let Some(w) = self.edge.as_mut() {
                write_edge(w, solver, tt)?;
            }
            if let Some(w) = self.density.as_mut() {
                write_profile(w, solver, tt, Profile::Density)?;
            }
            if let Some(w) = self.velocity.as_mut() {
                write_profile(w, solver, tt, Profile::DriftVelocity)?;
            }
            if let Some(w) = self.temperature.as_mut() {
                write_profile(w, solver, tt, Profile::LocalTemperature)?;
            }
        }
        Ok(())
    }
}

fn write_wave(w: &mut BufWriter<File>, solver: &KramersSolver, tt: usize) -> KineticsResult<()> {
    let grid = solver.grid();
    let f = solver.field();
    match solver.region() {
        Some(region) => {
            writeln!(w, "{} {}", tt, region.live_cells())?;
            if let Some(b) = region.bounds() {
                for i in b.rows() {
                    for j in b.cols() {
                        let c = grid.idx(i, j);
                        if region.is_live(c) {
                            writeln!(w, "{} {} {:.8e}", i, j, f[c])?;
                        }
                    }
                }
            }
        }
        None => {
            writeln!(w, "{} {}", tt, grid.len())?;
            for i in 0..grid.nx {
                for j in 0..grid.np {
                    writeln!(w, "{} {} {:.8e}", i, j, f[grid.idx(i, j)])?;
                }
            }
        }
    }
    w.flush()?;
    Ok(())
}

fn write_edge(w: &mut BufWriter<File>, solver: &KramersSolver, tt: usize) -> KineticsResult<()> {
    let Some(region) = solver.region() else {
        return Ok(());
    };
    let grid = solver.grid();
    let t = tt as f64 * solver.config().grid.time_step;
    writeln!(w, "{} {:.6} {}", tt, t, region.boundary().len())?;
    for &c in region.boundary() {
        let (i, j) = grid.cell(c);
        writeln!(w, "{} {} {:.6} {:.6}", i, j, grid.x[i], grid.p[j])?;
    }
    w.flush()?;
    Ok(())
}

fn write_profile(
    w: &mut BufWriter<File>,
    solver: &KramersSolver,
    tt: usize,
    which: Profile,
) -> KineticsResult<()> {
    let grid = solver.grid();
    let t = tt as f64 * solver.config().grid.time_step;
    let values = match which {
        Profile::Density => &solver.moments().density,
        Profile::DriftVelocity => &solver.moments().velocity,
        Profile::LocalTemperature => &solver.moments().temperature,
    };
    let rows: Vec<usize> = match solver.region().and_then(|r| r.bounds()) {
        Some(b) => b.rows().collect(),
        None => (0..grid.nx).collect(),
    };
    writeln!(w, "{} {:.6} {}", tt, t, rows.len())?;
    for i in rows {
        writeln!(w, "{:.4} {:.16e}", grid.x[i], values[i])?;
    }
    w.flush()?;
    Ok(())
}
