// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — CLI Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use kramers_core::observe::ObservableWriters;
use kramers_core::solver::KramersSolver;
use kramers_types::config::KineticsConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Klein-Kramers truncated-grid propagator")]
struct Args {
    /// JSON parameter file
    config: PathBuf,

    /// Output directory for the .dat observable dumps
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Suppress step-level chatter regardless of the config
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = KineticsConfig::from_file(&args.config.to_string_lossy())?;
    if args.quiet {
        config.schedule.quiet = true;
    }

    env_logger::Builder::from_default_env()
        .filter_level(if config.schedule.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        })
        .init();

    fs::create_dir_all(&args.out)?;
    let mut writers = ObservableWriters::create_in(&args.out, &config)?;
    let mut solver = KramersSolver::new(config)?;

    let summary = solver.run(&mut writers)?;

    log::info!(
        "[{}] done: {} steps to t = {}",
        solver.config().run_name,
        summary.steps,
        summary.final_time
    );
    log::info!(
        "[{}] max |1 - Z| before renormalization = {:.3e}",
        solver.config().run_name,
        summary.max_norm_drift
    );
    if summary.touched_edge {
        log::warn!(
            "[{}] the active region reached the edge halo during the run; \
             transmittance and tails past the box are unreliable",
            solver.config().run_name
        );
    }
    if let Some(trans) = summary.transmittance.last() {
        log::info!(
            "[{}] final transmittance = {:.8e}",
            solver.config().run_name,
            trans
        );
    }
    if let Some(corr) = summary.correlation.last() {
        log::info!(
            "[{}] final density correlation = {:.8e}",
            solver.config().run_name,
            corr
        );
    }

    Ok(())
}
