// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Klein-Kramers Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// ─────────────────────────────────────────────────────────────────────
//! Time propagation of f(x, p, t) under the Klein-Kramers operator.
//!
//! Per step: frontier scan and expansion sweeps (adaptive mode), moment
//! update, RK4 advance, renormalization, observable extraction, prune
//! and support rebuild. All buffers are owned here; their lifetime is
//! the solver's.
//!
//! Reductions (norm, transmittance, correlation) run serially in a
//! fixed cell order, so a truncated run whose support covers the whole
//! interior reproduces the full-grid trajectory bit for bit.

use std::time::Instant;

use ndarray::Array1;

use crate::extrapolate;
use crate::mask::ActiveRegion;
use crate::moments::{self, CollisionMode};
use crate::observe::ObservableWriters;
use crate::potential::PotentialModel;
use crate::rk4::{self, StageBuffers, StageDomain, StepCoeffs};
use kramers_types::config::KineticsConfig;
use kramers_types::error::{KineticsError, KineticsResult};
use kramers_types::state::{PhaseGrid, RowMoments, RunSummary, StepDiagnostics};

pub struct KramersSolver {
    config: KineticsConfig,
    grid: PhaseGrid,
    potential: PotentialModel,
    mode: CollisionMode,
    coeffs: StepCoeffs,
    /// Current distribution F.
    f: Vec<f64>,
    /// Tentative next step FF, before renormalization.
    ff: Vec<f64>,
    /// Last accepted step PF, feeding truncation and observables.
    pf: Vec<f64>,
    /// Local Maxwellian, frozen across the four RK4 stages.
    feq: Vec<f64>,
    stages: StageBuffers,
    moments: RowMoments,
    /// Live-cell tracking; `None` in full-grid mode.
    region: Option<ActiveRegion>,
    /// Row index of the dividing surface x = trans_x0.
    idx_trans: usize,
    /// Reduced density at t = 0, for the autocorrelation.
    f0_profile: Vec<f64>,
    corr0: f64,
    trans_series: Vec<f64>,
    corr_series: Vec<f64>,
    max_norm_drift: f64,
    touched_edge: bool,
    step_index: usize,
}

impl KramersSolver {
    pub fn new(config: KineticsConfig) -> KineticsResult<Self> {
        config.validate()?;
        let grid = config.create_grid();
        let potential = PotentialModel::new(config.potential, &config.physics, &config.packet);
        let mode = CollisionMode::from_config(&config.collision);
        let coeffs = StepCoeffs::new(config.grid.time_step, &grid, &config.physics);
        let n = grid.len();

        let mut f = vec![0.0; n];
        for i in grid.interior_rows() {
            for j in grid.interior_cols() {
                f[grid.idx(i, j)] = potential.initial_density(grid.x[i], grid.p[j]);
            }
        }
        let mut norm = 0.0;
        for i in grid.interior_rows() {
            for j in grid.interior_cols() {
                norm += f[grid.idx(i, j)];
            }
        }
        norm *= grid.cell_area();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(KineticsError::NormCollapsed { step: 0, norm });
        }
        log::info!("[{}] potential: {}", config.run_name, potential.name());
        log::info!(
            "[{}] grid ({}, {}), initial norm = {:.16e}",
            config.run_name,
            grid.nx,
            grid.np,
            norm
        );
        let inv = 1.0 / norm;
        for i in grid.interior_rows() {
            for j in grid.interior_cols() {
                f[grid.idx(i, j)] *= inv;
            }
        }
        let mut pf = f.clone();

        // Autocorrelation baseline, taken before any truncation.
        let (f0_profile, corr0) = if config.output.acf {
            let mut f0 = vec![0.0; grid.nx];
            for i in grid.interior_rows() {
                let mut density = 0.0;
                for j in grid.interior_cols() {
                    density += pf[grid.idx(i, j)];
                }
                f0[i] = density * grid.hp;
            }
            let mut c0 = 0.0;
            for i in grid.interior_rows() {
                c0 += f0[i] * f0[i];
            }
            c0 *= grid.hx;
            log::info!("[{}] corr_0 = {:.16e}", config.run_name, c0);
            (f0, c0)
        } else {
            (Vec::new(), 1.0)
        };

        let region = if !config.truncation.full_grid {
            let mut r = ActiveRegion::new(&grid);
            r.initial_truncate(
                &grid,
                &mut f,
                &mut pf,
                config.truncation.tol_h,
                config.truncation.tol_hd * config.truncation.tol_hd,
            );
            log::info!(
                "[{}] initial active set: {} cells, ring {}",
                config.run_name,
                r.live_cells(),
                r.boundary().len()
            );
            Some(r)
        } else {
            None
        };

        let mut moments = RowMoments::new(grid.nx);
        let mut feq = vec![0.0; n];
        match &region {
            Some(r) => {
                if let Some(b) = r.bounds() {
                    moments::update_rows(
                        &grid,
                        &config.physics,
                        mode,
                        &f,
                        b.rows(),
                        b.j_lo,
                        b.j_hi,
                        Some(r.mask()),
                        &mut moments,
                        &mut feq,
                        true,
                    );
                }
            }
            None => moments::update_rows(
                &grid,
                &config.physics,
                mode,
                &f,
                0..=grid.nx - 1,
                0,
                grid.np - 1,
                None,
                &mut moments,
                &mut feq,
                true,
            ),
        }

        let idx_trans = ((config.output.trans_x0 - config.grid.xi1) / config.grid.h1).round()
            as usize;
        let trans_series = if config.output.trans {
            vec![0.0]
        } else {
            Vec::new()
        };
        let corr_series = if config.output.acf {
            vec![1.0]
        } else {
            Vec::new()
        };

        Ok(KramersSolver {
            config,
            grid,
            potential,
            mode,
            coeffs,
            f,
            ff: vec![0.0; n],
            pf,
            feq,
            stages: StageBuffers::new(n),
            moments,
            region,
            idx_trans,
            f0_profile,
            corr0,
            trans_series,
            corr_series,
            max_norm_drift: 0.0,
            touched_edge: false,
            step_index: 0,
        })
    }

    /// Advance one time step.
    pub fn step(&mut self) -> KineticsResult<StepDiagnostics> {
        let t0 = Instant::now();
        let tt = self.step_index;

        let mut region = self.region.take();
        let outcome = match region.as_mut() {
            Some(r) => self.step_truncated(tt, r),
            None => self.step_full(tt),
        };
        self.region = region;
        let (norm, ex_iterations) = outcome?;

        self.step_index += 1;
        let (live_cells, boundary_cells, touches_edge) = match &self.region {
            Some(r) => (r.live_cells(), r.boundary().len(), r.touches_edge()),
            None => (
                (self.grid.nx - 2 * self.grid.edge) * (self.grid.np - 2 * self.grid.edge),
                0,
                false,
            ),
        };

        Ok(StepDiagnostics {
            step: tt,
            time: (tt + 1) as f64 * self.config.grid.time_step,
            norm,
            live_cells,
            boundary_cells,
            ex_iterations,
            touches_edge,
            elapsed_ms: t0.elapsed().as_secs_f64() * 1e3,
        })
    }

    fn step_truncated(
        &mut self,
        tt: usize,
        region: &mut ActiveRegion,
    ) -> KineticsResult<(f64, usize)> {
        let tr = self.config.truncation.clone();
        let tol_hd_sq = tr.tol_hd * tr.tol_hd;
        let tol_ld_sq = tr.tol_ld * tr.tol_ld;

        // Frontier: ring cells already leaking through the thresholds.
        let mut tbl = extrapolate::collect_leaking(
            &self.grid,
            region,
            &self.f,
            &self.pf,
            tr.tol_l,
            tol_ld_sq,
        );
        let mut tbl_p = tbl.clone();
        let mut first = true;
        let mut extrapolated = false;
        let mut ex_count = 0usize;

        while !tbl.is_empty() && ex_count < tr.ex_limit {
            extrapolated = true;
            tbl.sort_unstable();
            tbl.dedup();

            let mut targets = extrapolate::expansion_targets(&self.grid, &tbl, &self.f);
            let mut committed: Vec<usize> = Vec::new();
            if !targets.is_empty() {
                let values =
                    extrapolate::extrapolate_values(&self.grid, &self.f, &targets, tr.ex_reduce);
                for (&c, v) in targets.iter().zip(&values) {
                    if let Some(v) = *v {
                        self.f[c] = v;
                        committed.push(c);
                    }
                }
                if committed.is_empty() {
                    targets.clear();
                }
            }

            if first {
                // The first sweep carries the step's main update over
                // the whole active set, extrapolated cells included.
                region.absorb_with_halo(&self.grid, &committed);
                self.update_active_moments(region);
                self.rk4_active(region);
                first = false;
            } else if targets.is_empty() {
                tbl.clear();
            } else {
                // Incremental sweep: only the influence diamond of the
                // new cells is revisited, with f_eq re-evaluated from
                // the cached row moments.
                region.absorb_with_halo(&self.grid, &committed);
                let revisit = extrapolate::revisit_set(&self.grid, region, &committed);
                moments::refresh_cells(
                    &self.grid,
                    &self.config.physics,
                    &self.moments,
                    &revisit,
                    &mut self.feq,
                );
                self.rk4_cells(&revisit);
            }

            if !targets.is_empty() {
                let fresh = extrapolate::frontier_from_new_cells(
                    &self.grid,
                    region,
                    &self.ff,
                    &committed,
                    tr.tol_h,
                    tol_hd_sq,
                );
                // Each ring is handled once: drop cells already seen.
                tbl = extrapolate::sorted_difference(&fresh, &tbl_p);
                extrapolate::merge_sorted(&mut tbl_p, &tbl);
                ex_count += 1;
                if ex_count == tr.ex_limit && !tbl.is_empty() {
                    log::info!(
                        "[{}] step {tt}: expansion capped at ExLimit = {} with {} frontier cells left",
                        self.config.run_name,
                        tr.ex_limit,
                        tbl.len()
                    );
                    tbl.clear();
                }
            }
        }

        if !extrapolated {
            self.update_active_moments(region);
            self.rk4_active(region);
        }

        let Some(b) = region.bounds() else {
            return Err(KineticsError::NormCollapsed {
                step: tt,
                norm: 0.0,
            });
        };
        let mut norm = 0.0;
        for i in b.rows() {
            for j in b.cols() {
                let c = self.grid.idx(i, j);
                if region.is_live(c) {
                    norm += self.ff[c];
                }
            }
        }
        norm *= self.grid.cell_area();
        if (tt + 1) % self.config.schedule.period == 0 {
            log::info!(
                "[{}] normalization factor = {:.16e}",
                self.config.run_name,
                norm
            );
        }
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(KineticsError::NormCollapsed { step: tt, norm });
        }
        self.max_norm_drift = self.max_norm_drift.max((1.0 - norm).abs());
        let inv = 1.0 / norm;
        for i in b.rows() {
            for j in b.cols() {
                let c = self.grid.idx(i, j);
                if region.is_live(c) {
                    let val = inv * self.ff[c];
                    self.ff[c] = val;
                    self.f[c] = val;
                    self.pf[c] = val;
                }
            }
        }

        self.record_observables(tt, Some(region));

        region.prune_and_rebuild(
            &self.grid,
            &self.ff,
            &mut self.f,
            &mut self.pf,
            tr.tol_h,
            tol_hd_sq,
        );
        if region.touches_edge() && !self.touched_edge {
            log::warn!(
                "[{}] active region reached the edge halo at step {tt}; support beyond the box is lost",
                self.config.run_name
            );
        }
        self.touched_edge |= region.touches_edge();

        Ok((norm, ex_count))
    }

    fn step_full(&mut self, tt: usize) -> KineticsResult<(f64, usize)> {
        let clip = !self.config.truncation.feq_neighbor_smoothing;
        moments::update_rows(
            &self.grid,
            &self.config.physics,
            self.mode,
            &self.f,
            0..=self.grid.nx - 1,
            0,
            self.grid.np - 1,
            None,
            &mut self.moments,
            &mut self.feq,
            clip,
        );
        if !clip {
            moments::smooth_oversized(
                &self.grid,
                None,
                self.grid.edge..=self.grid.nx - self.grid.edge - 1,
                self.grid.edge,
                self.grid.np - self.grid.edge - 1,
                &mut self.feq,
            );
        }
        rk4::rk4_step(
            &self.grid,
            &self.potential,
            self.coeffs,
            &self.feq,
            &self.f,
            &mut self.stages,
            &mut self.ff,
            &StageDomain::Interior,
        );

        let mut norm = 0.0;
        for i in self.grid.interior_rows() {
            for j in self.grid.interior_cols() {
                norm += self.ff[self.grid.idx(i, j)];
            }
        }
        norm *= self.grid.cell_area();
        if (tt + 1) % self.config.schedule.period == 0 {
            log::info!(
                "[{}] normalization factor = {:.16e}",
                self.config.run_name,
                norm
            );
        }
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(KineticsError::NormCollapsed { step: tt, norm });
        }
        self.max_norm_drift = self.max_norm_drift.max((1.0 - norm).abs());
        let inv = 1.0 / norm;
        for i in self.grid.interior_rows() {
            for j in self.grid.interior_cols() {
                let c = self.grid.idx(i, j);
                let val = inv * self.ff[c];
                self.ff[c] = val;
                self.f[c] = val;
                self.pf[c] = val;
            }
        }

        self.record_observables(tt, None);
        Ok((norm, 0))
    }

    fn update_active_moments(&mut self, region: &ActiveRegion) {
        let Some(b) = region.bounds() else {
            return;
        };
        let clip = !self.config.truncation.feq_neighbor_smoothing;
        moments::update_rows(
            &self.grid,
            &self.config.physics,
            self.mode,
            &self.f,
            b.rows(),
            b.j_lo,
            b.j_hi,
            Some(region.mask()),
            &mut self.moments,
            &mut self.feq,
            clip,
        );
        if !clip {
            moments::smooth_oversized(
                &self.grid,
                Some(region.mask()),
                b.rows(),
                b.j_lo,
                b.j_hi,
                &mut self.feq,
            );
        }
    }

    fn rk4_active(&mut self, region: &ActiveRegion) {
        let Some(bounds) = region.bounds() else {
            return;
        };
        let domain = StageDomain::Active {
            bounds,
            mask: region.mask(),
        };
        rk4::rk4_step(
            &self.grid,
            &self.potential,
            self.coeffs,
            &self.feq,
            &self.f,
            &mut self.stages,
            &mut self.ff,
            &domain,
        );
    }

    fn rk4_cells(&mut self, cells: &[usize]) {
        let domain = StageDomain::Cells(cells);
        rk4::rk4_step(
            &self.grid,
            &self.potential,
            self.coeffs,
            &self.feq,
            &self.f,
            &mut self.stages,
            &mut self.ff,
            &domain,
        );
    }

    fn record_observables(&mut self, tt: usize, region: Option<&ActiveRegion>) {
        if (tt + 1) % self.config.schedule.period != 0 {
            return;
        }
        let time = (tt + 1) as f64 * self.config.grid.time_step;

        if self.config.output.trans {
            let mut pftrans = 0.0;
            match region {
                Some(r) => {
                    if let Some(b) = r.bounds() {
                        for i in self.idx_trans..=b.i_hi {
                            for j in b.cols() {
                                pftrans += self.pf[self.grid.idx(i, j)];
                            }
                        }
                    }
                }
                None => {
                    for i in self.idx_trans..self.grid.nx - self.grid.edge {
                        for j in self.grid.interior_cols() {
                            pftrans += self.pf[self.grid.idx(i, j)];
                        }
                    }
                }
            }
            pftrans *= self.grid.cell_area();
            self.trans_series.push(pftrans);
            log::info!(
                "[{}] time {:.6}, Trans = {:.16e}",
                self.config.run_name,
                time,
                pftrans
            );
        }

        if self.config.output.acf {
            let mut corr = 0.0;
            for i in self.grid.interior_rows() {
                let mut ft = 0.0;
                for j in self.grid.interior_cols() {
                    ft += self.pf[self.grid.idx(i, j)];
                }
                corr += ft * self.grid.hp * self.f0_profile[i];
            }
            corr *= self.grid.hx;
            let normalized = corr / self.corr0;
            self.corr_series.push(normalized);
            log::info!(
                "[{}] time {:.6}, Corr = {:.16e}",
                self.config.run_name,
                time,
                normalized
            );
        }
    }

    /// Propagate to Tf, emitting configured observable dumps.
    pub fn run(&mut self, writers: &mut ObservableWriters) -> KineticsResult<RunSummary> {
        let n_steps = self.config.step_count();
        let sched = self.config.schedule.clone();
        log::info!(
            "[{}] time iteration: {} steps of k = {}",
            self.config.run_name,
            n_steps,
            self.config.grid.time_step
        );
        for tt in 0..n_steps {
            writers.dump_step(self, tt)?;
            let diag = self.step()?;
            if sched.timing && !sched.quiet {
                log::debug!(
                    "[{}] step {} elapsed {:.6} s",
                    self.config.run_name,
                    tt + 1,
                    diag.elapsed_ms / 1e3
                );
            }
            if !sched.quiet && (tt + 1) % sched.period == 0 {
                log::info!(
                    "[{}] step {}: {:.3} ms",
                    self.config.run_name,
                    tt + 1,
                    diag.elapsed_ms
                );
                if self.region.is_some() {
                    log::info!(
                        "[{}] active {} cells, ring {}, fill {:.4}, ExCount {}/{}",
                        self.config.run_name,
                        diag.live_cells,
                        diag.boundary_cells,
                        diag.live_cells as f64 / self.grid.len() as f64,
                        diag.ex_iterations,
                        self.config.truncation.ex_limit
                    );
                }
            }
        }
        Ok(RunSummary {
            steps: n_steps,
            final_time: n_steps as f64 * self.config.grid.time_step,
            transmittance: self.trans_series.clone(),
            correlation: self.corr_series.clone(),
            max_norm_drift: self.max_norm_drift,
            touched_edge: self.touched_edge,
        })
    }

    pub fn config(&self) -> &KineticsConfig {
        &self.config
    }

    pub fn grid(&self) -> &PhaseGrid {
        &self.grid
    }

    /// Current distribution F.
    pub fn field(&self) -> &[f64] {
        &self.f
    }

    /// Last accepted step PF.
    pub fn previous_field(&self) -> &[f64] {
        &self.pf
    }

    pub fn moments(&self) -> &RowMoments {
        &self.moments
    }

    pub fn region(&self) -> Option<&ActiveRegion> {
        self.region.as_ref()
    }

    pub fn transmittance(&self) -> &[f64] {
        &self.trans_series
    }

    pub fn correlation(&self) -> &[f64] {
        &self.corr_series
    }

    pub fn max_norm_drift(&self) -> f64 {
        self.max_norm_drift
    }

    pub fn steps_taken(&self) -> usize {
        self.step_index
    }

    pub fn time(&self) -> f64 {
        self.step_index as f64 * self.config.grid.time_step
    }

    /// Reduced density ∫ f dp per x-row, from the last accepted step.
    pub fn density_profile(&self) -> Array1<f64> {
        let mut out = Array1::zeros(self.grid.nx);
        for i in self.grid.interior_rows() {
            let mut density = 0.0;
            for j in self.grid.interior_cols() {
                density += self.pf[self.grid.idx(i, j)];
            }
            out[i] = density * self.grid.hp;
        }
        out
    }
}
