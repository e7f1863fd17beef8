// ─────────────────────────────────────────────────────────────────────
// SCPN Kramers TG — Potential Models
// © 1998–2026 Miroslav Šotek. All rights reserved.
// ─────────────────────────────────────────────────────────────────────
//! Analytic potential families and the initial Gaussian packet.
//!
//! The potential is one-dimensional in this model: V = V(x), the
//! momentum coordinate never enters. Selected at runtime from the
//! config tag; the stepper sees only `v` / `dv_dx` / `initial_density`.

use std::f64::consts::PI;

use kramers_types::config::{PacketParams, PhysicsParams, PotentialKind};

/// Quartic coefficient of the DW1 double well.
const DW1_QUARTIC: f64 = 0.007;
/// Quadratic coefficient of the DW1 double well.
const DW1_QUADRATIC: f64 = 0.01;

/// MSW-1 crossover abscissa; beyond it the product plateau takes over.
const MSW_CUTOVER: f64 = 1.12556;
/// MSW-1 plateau depth.
const MSW_PLATEAU: f64 = -0.015;
/// MSW-1 well-side coefficients: V = x²(a − b·x).
const MSW_A: f64 = 0.1;
const MSW_B: f64 = 0.09936666666667;

/// Runtime potential capability: scalar potential, its x-derivative
/// and the initial phase-space density.
#[derive(Debug, Clone)]
pub struct PotentialModel {
    kind: PotentialKind,
    hb: f64,
    x01: f64,
    x02: f64,
    a1: f64,
    a2: f64,
}

impl PotentialModel {
    pub fn new(kind: PotentialKind, physics: &PhysicsParams, packet: &PacketParams) -> Self {
        PotentialModel {
            kind,
            hb: physics.hb,
            x01: packet.x01,
            x02: packet.x02,
            a1: packet.a1,
            a2: packet.a2,
        }
    }

    pub fn kind(&self) -> PotentialKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            PotentialKind::DoubleWell1 => "DoubleWell-1",
            PotentialKind::Free => "DoubleWell-2",
            PotentialKind::MetastableWell => "MSW-1",
        }
    }

    /// Scalar potential V(x).
    #[inline]
    pub fn v(&self, x: f64) -> f64 {
        match self.kind {
            PotentialKind::DoubleWell1 => DW1_QUARTIC * x * x * x * x - DW1_QUADRATIC * x * x,
            PotentialKind::Free => 0.0,
            PotentialKind::MetastableWell => {
                if x > MSW_CUTOVER {
                    MSW_PLATEAU
                } else {
                    x * x * (MSW_A - MSW_B * x)
                }
            }
        }
    }

    /// dV/dx.
    #[inline]
    pub fn dv_dx(&self, x: f64) -> f64 {
        match self.kind {
            PotentialKind::DoubleWell1 => 4.0 * DW1_QUARTIC * x * x * x - 2.0 * DW1_QUADRATIC * x,
            PotentialKind::Free => 0.0,
            PotentialKind::MetastableWell => {
                if x > MSW_CUTOVER {
                    0.0
                } else {
                    x * (2.0 * MSW_A - 3.0 * MSW_B * x)
                }
            }
        }
    }

    /// Initial Gaussian product packet
    /// f₀(x, p) = 1/(π ħ) · exp(−2 a₁ (x − x₀₁)²) · exp(−(p − x₀₂)² / (2 ħ² a₂)).
    #[inline]
    pub fn initial_density(&self, x: f64, p: f64) -> f64 {
        let dx = x - self.x01;
        let dp = p - self.x02;
        (1.0 / (PI * self.hb))
            * (-2.0 * self.a1 * dx * dx).exp()
            * (-dp * dp / (2.0 * self.hb * self.hb * self.a2)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(kind: PotentialKind) -> PotentialModel {
        let physics = PhysicsParams {
            hb: 1.0,
            m: 1.0,
            kb: 1.0,
            temp: 1.0,
            gamma: 1.0,
        };
        let packet = PacketParams {
            x01: -1.0,
            x02: 0.5,
            a1: 0.5,
            a2: 0.5,
        };
        PotentialModel::new(kind, &physics, &packet)
    }

    fn check_derivative(pot: &PotentialModel, x: f64) {
        let h = 1e-6;
        let fd = (pot.v(x + h) - pot.v(x - h)) / (2.0 * h);
        let an = pot.dv_dx(x);
        assert!(
            (fd - an).abs() < 1e-6,
            "dV/dx mismatch at x={x}: fd={fd}, analytic={an}"
        );
    }

    #[test]
    fn test_dw1_derivative_consistent() {
        let pot = model(PotentialKind::DoubleWell1);
        for x in [-2.0, -0.7, 0.0, 0.3, 1.5] {
            check_derivative(&pot, x);
        }
    }

    #[test]
    fn test_msw_derivative_consistent_away_from_cutover() {
        let pot = model(PotentialKind::MetastableWell);
        for x in [-1.0, 0.0, 0.5, 1.0, 2.0, 3.0] {
            check_derivative(&pot, x);
        }
    }

    #[test]
    fn test_msw_continuous_at_cutover() {
        let pot = model(PotentialKind::MetastableWell);
        let below = pot.v(MSW_CUTOVER - 1e-9);
        let above = pot.v(MSW_CUTOVER + 1e-9);
        assert!(
            (below - above).abs() < 1e-4,
            "MSW-1 potential jumps at cutover: {below} vs {above}"
        );
    }

    #[test]
    fn test_free_potential_is_zero() {
        let pot = model(PotentialKind::Free);
        for x in [-5.0, 0.0, 7.3] {
            assert_eq!(pot.v(x), 0.0);
            assert_eq!(pot.dv_dx(x), 0.0);
        }
    }

    #[test]
    fn test_packet_peaks_at_centre() {
        let pot = model(PotentialKind::Free);
        let peak = pot.initial_density(-1.0, 0.5);
        assert!(peak > 0.0);
        assert!(pot.initial_density(0.0, 0.5) < peak);
        assert!(pot.initial_density(-1.0, 1.5) < peak);
        assert!((peak - 1.0 / PI).abs() < 1e-12);
    }
}
