// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Score Types
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Raw scores of the three triangle positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleScores {
    /// Epistemic Arrogance.
    pub position_1: f64,
    /// Meta-Awareness Trap.
    pub position_2: f64,
    /// Integrated Competence.
    pub position_3: f64,
}

impl TriangleScores {
    /// Scores paired with their positions, in declaration order (1, 2, 3).
    pub fn ranked(&self) -> [(Position, f64); 3] {
        [
            (Position::EpistemicArrogance, self.position_1),
            (Position::MetaAwarenessTrap, self.position_2),
            (Position::IntegratedCompetence, self.position_3),
        ]
    }

    /// Highest-scoring position. Ties go to the lower-numbered position.
    pub fn winner(&self) -> Position {
        let mut best = (Position::EpistemicArrogance, self.position_1);
        for (position, score) in self.ranked().into_iter().skip(1) {
            // strict: an equal later score never displaces an earlier one
            if score > best.1 {
                best = (position, score);
            }
        }
        best.0
    }

    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        self.ranked()
            .into_iter()
            .map(|(p, s)| (p.label(), s))
            .collect()
    }
}

/// Nonlinear interaction metrics of a minimal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InteractionMetrics {
    /// `1 - S` when S < 0.3: no self left to be biased.
    #[serde(rename = "Bias_Meaningless")]
    pub bias_meaningless: f64,
    #[serde(rename = "Energy_Stress")]
    pub energy_stress: f64,
    /// `B * S` when B > 0.7: the self defends a false model.
    #[serde(rename = "Delusional_Defense")]
    pub delusional_defense: f64,
    pub stability: f64,
    #[serde(rename = "Arrogance_Risk")]
    pub arrogance_risk: f64,
}

impl InteractionMetrics {
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("Bias_Meaningless", self.bias_meaningless),
            ("Energy_Stress", self.energy_stress),
            ("Delusional_Defense", self.delusional_defense),
            ("Stability", self.stability),
            ("Arrogance_Risk", self.arrogance_risk),
        ])
    }
}

/// Boolean pattern flags over a detailed state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    #[serde(rename = "Bias_Cascade")]
    pub bias_cascade: bool,
    #[serde(rename = "Narrative_Collapse")]
    pub narrative_collapse: bool,
    #[serde(rename = "Moral_Rigidity")]
    pub moral_rigidity: bool,
}

impl FlagSet {
    pub fn any(&self) -> bool {
        self.bias_cascade || self.narrative_collapse || self.moral_rigidity
    }

    pub fn as_map(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("Bias_Cascade", self.bias_cascade),
            ("Narrative_Collapse", self.narrative_collapse),
            ("Moral_Rigidity", self.moral_rigidity),
        ])
    }
}
