// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Nonlinear Interaction Metrics
// ─────────────────────────────────────────────────────────────────────
//! Interaction metrics over the three minimal dimensions. Independent of
//! the classifier; pure functions of one snapshot.

use pharmakon_types::{InteractionMetrics, MinimalState};

pub fn compute_interactions(state: &MinimalState) -> InteractionMetrics {
    let (s, h, b) = (state.s(), state.h(), state.b());
    InteractionMetrics {
        bias_meaningless: if s < 0.3 { 1.0 - s } else { 0.0 },
        energy_stress: 1.0 - h,
        delusional_defense: if b > 0.7 { b * s } else { 0.0 },
        stability: s * h * (1.0 - b),
        arrogance_risk: s * b,
    }
}
