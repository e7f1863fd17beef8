// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KineticsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Distribution norm collapsed at step {step}: Z = {norm:e}")]
    NormCollapsed { step: usize, norm: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type KineticsResult<T> = Result<T, KineticsError>;
