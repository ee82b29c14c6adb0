// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Debiasing Recommendations
// ─────────────────────────────────────────────────────────────────────
//! Static, ordered intervention blocks per triangle position, plus one
//! cross-cutting warning when the bias cascade composite exceeds 0.6.
//!
//! Positions outside the triangle get no intervention lines. A label
//! that is not an exact position label is matched by fragment
//! (`Position_1`, `Epistemic Arrogance`, ...); one that names no triangle
//! position gets none either.

use serde::{Deserialize, Serialize};

use pharmakon_types::{DetailedState, PharmakonResult, Position};

use crate::scorer::CompositeScorer;

/// Bias cascade level above which the structured-program warning is added.
pub const BIAS_CASCADE_WARNING: f64 = 0.6;

const ARROGANCE_BLOCK: &[&str] = &[
    "1. Scientific Method Training",
    "   - Focus on base rates and cause-absent evidence",
    "   - Evidence: d ≈ 1.0, lasts 6+ months",
    "   - Target: Build awareness of biases",
    "2. Cognitive Debiasing Training",
    "   - Mnemonics and Bayesian tools",
    "   - Awareness of cognitive pitfalls",
    "   - Evidence: Significant error reduction (p < .001)",
];

const TRAP_BLOCK: &[&str] = &[
    "1. Metacognitive Monitoring Practice",
    "   - Ongoing self-correction exercises",
    "   - Real-life applicability training",
    "   - Evidence: Sustained improvement with practice",
    "2. Reduce Recursive Overthinking",
    "   - Structured problem-solving frameworks",
    "   - Set limits on rumination cycles",
];

const COMPETENCE_BLOCK: &[&str] = &[
    "1. Maintenance Practice",
    "   - Regular bias calibration exercises",
    "   - Position 3 is unstable - practice prevents regression",
    "2. Monitor Ego Oscillation",
    "   - Maintain stable self-coherence",
    "   - Regular reality-testing check-ins",
];

/// Label fragments that select a triangle block, in emission order.
const LABEL_FRAGMENTS: [(Position, &str, &str); 3] = [
    (Position::EpistemicArrogance, "Position_1", "Epistemic Arrogance"),
    (Position::MetaAwarenessTrap, "Position_2", "Meta Awareness"),
    (Position::IntegratedCompetence, "Position_3", "Integrated Competence"),
];

const CASCADE_WARNING: &str =
    "WARNING: High bias cascade detected - Consider structured debiasing program";

/// Intervention lines for one position plus the optional warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub interventions: Vec<String>,
    pub warning: Option<String>,
}

impl Recommendations {
    /// All lines in emission order: interventions, then the warning.
    pub fn lines(&self) -> Vec<&str> {
        self.interventions
            .iter()
            .map(String::as_str)
            .chain(self.warning.as_deref())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.interventions.is_empty() && self.warning.is_none()
    }
}

/// Fixed intervention block for a position (empty outside the triangle).
pub fn interventions_for(position: Position) -> &'static [&'static str] {
    match position {
        Position::EpistemicArrogance => ARROGANCE_BLOCK,
        Position::MetaAwarenessTrap => TRAP_BLOCK,
        Position::IntegratedCompetence => COMPETENCE_BLOCK,
        _ => &[],
    }
}

/// Recommendation engine over a shared composite scorer.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    scorer: CompositeScorer,
}

impl RecommendationEngine {
    pub fn new(scorer: CompositeScorer) -> Self {
        Self { scorer }
    }

    pub fn recommend(
        &self,
        position: Position,
        state: &DetailedState,
    ) -> PharmakonResult<Recommendations> {
        self.build(interventions_for(position), state)
    }

    /// Recommend by label (underscore or spaced form). Other labels are
    /// matched by fragment, and every triangle block whose fragment
    /// appears is emitted. An unmatched label yields no interventions;
    /// the warning still applies.
    pub fn recommend_label(
        &self,
        label: &str,
        state: &DetailedState,
    ) -> PharmakonResult<Recommendations> {
        if let Some(position) = Position::from_label(label) {
            return self.build(interventions_for(position), state);
        }
        let block: Vec<&str> = LABEL_FRAGMENTS
            .iter()
            .filter(|&&(_, prefix, phrase)| label.contains(prefix) || label.contains(phrase))
            .flat_map(|&(position, _, _)| interventions_for(position).iter().copied())
            .collect();
        if block.is_empty() {
            log::debug!("no recommendation block for label {label:?}");
        }
        self.build(&block, state)
    }

    fn build(&self, block: &[&str], state: &DetailedState) -> PharmakonResult<Recommendations> {
        let bias_cascade = self.scorer.bias_cascade(state)?;
        Ok(Recommendations {
            interventions: block.iter().map(|line| line.to_string()).collect(),
            warning: (bias_cascade > BIAS_CASCADE_WARNING).then(|| CASCADE_WARNING.to_string()),
        })
    }
}
