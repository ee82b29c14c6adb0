// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Pattern Flags
// ─────────────────────────────────────────────────────────────────────
//! Boolean pattern detection over a detailed state.
//!
//! All comparisons are strict (`>`). `Moral_Rigidity` compares
//! Protagonist against a fixed 0.7, not against a configurable threshold.
//! The `ego_osc` and `overthink` thresholds are carried but unused.

use pharmakon_types::{DetailedState, FlagSet, FlagThresholds, PharmakonResult, Variable};

use crate::scorer::CompositeScorer;

/// Protagonist level above which dogma turns into moral rigidity.
const PROTAGONIST_RIGIDITY: f64 = 0.7;

/// `1 - (0.4·Coherence + 0.3·Continuity + 0.3·Arc)`, with absent values
/// at 0.7 / 0.7 / 0.5.
pub fn narrative_risk(state: &DetailedState) -> f64 {
    1.0 - (0.4 * state.value_or(Variable::Coherence, 0.7)
        + 0.3 * state.value_or(Variable::Continuity, 0.7)
        + 0.3 * state.value_or(Variable::Arc, 0.5))
}

/// Flag detector with fixed thresholds.
#[derive(Debug, Clone)]
pub struct FlagDetector {
    scorer: CompositeScorer,
    thresholds: FlagThresholds,
}

impl FlagDetector {
    pub fn new(scorer: CompositeScorer, thresholds: FlagThresholds) -> PharmakonResult<Self> {
        thresholds.validate()?;
        Ok(Self { scorer, thresholds })
    }

    pub fn with_defaults(scorer: CompositeScorer) -> Self {
        Self {
            scorer,
            thresholds: FlagThresholds::default(),
        }
    }

    pub fn thresholds(&self) -> &FlagThresholds {
        &self.thresholds
    }

    pub fn detect(&self, state: &DetailedState) -> PharmakonResult<FlagSet> {
        detect_flags(&self.scorer, state, &self.thresholds)
    }
}

/// Evaluate all flags for one snapshot.
pub fn detect_flags(
    scorer: &CompositeScorer,
    state: &DetailedState,
    thresholds: &FlagThresholds,
) -> PharmakonResult<FlagSet> {
    let bias_cluster = scorer.bias_cascade(state)?;
    let delusionality = state.value_or(Variable::Delusionality, 0.0);
    let dogma = state.value_or(Variable::DogmaFixation, 0.0);
    let protagonist = state.value_or(Variable::Protagonist, 0.6);

    Ok(FlagSet {
        bias_cascade: bias_cluster > thresholds.bias_cluster
            && delusionality > thresholds.delusionality,
        narrative_collapse: narrative_risk(state) > thresholds.narrative_collapse,
        moral_rigidity: dogma > thresholds.dogma && protagonist > PROTAGONIST_RIGIDITY,
    })
}
