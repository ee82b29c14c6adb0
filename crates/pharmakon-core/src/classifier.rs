// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Epistemic Position Classifier
// ─────────────────────────────────────────────────────────────────────
//! Three classifier variants.
//!
//! - **Minimal** (S, H, B) and **Refined** (S, H_somatic, H_cognitive, B):
//!   ordered threshold rules, first match wins. Special cases (dissolution,
//!   collapse, delusion, stress) are checked before the three triangle
//!   positions; Position 1 is tested before Position 3, and Position 3
//!   before Position 2.
//! - **Triangle** (detailed state): three linear position scores, argmax
//!   wins. On an exact tie the lower-numbered position wins (1, then 2,
//!   then 3).

use pharmakon_types::{
    Classification, DetailedState, MinimalState, PharmakonResult, Position, RefinedState,
    TriangleClassification, TriangleScores, Variable,
};

use crate::scorer::CompositeScorer;

fn classified(position: Position, description: impl Into<String>) -> Classification {
    Classification {
        position,
        description: description.into(),
    }
}

/// Classify a minimal (S, H, B) state.
pub fn classify_minimal(state: &MinimalState) -> Classification {
    let (s, h, b) = (state.s(), state.h(), state.b());

    if s < 0.2 {
        return classified(
            Position::EgoDissolution,
            "S -> 0: identity dissolved. Bias (B) is meaningless with no self to be biased.",
        );
    }
    if h < 0.2 {
        return classified(
            Position::EnergyCollapse,
            "H -> 0: energy depleted. Arrogance and competence both collapse under stress.",
        );
    }
    if b > 0.8 {
        return classified(
            Position::DelusionalDefense,
            "B -> 1: severe bias. The self (S) now defends a false model of reality.",
        );
    }
    if s > 0.7 && h > 0.6 && b > 0.6 {
        return classified(
            Position::EpistemicArrogance,
            "Strong identity (S) + high energy (H) + high bias (B). Confident but wrong.",
        );
    }
    if s > 0.7 && h > 0.6 && b < 0.4 {
        return classified(
            Position::IntegratedCompetence,
            "Strong identity (S) + high energy (H) + low bias (B). Calibrated awareness.",
        );
    }
    if s > 0.5 && b > 0.4 && b < 0.7 {
        return classified(
            Position::MetaAwarenessTrap,
            "Strong identity (S) + moderate bias (B). Aware of biases but struggling to manage them.",
        );
    }
    classified(
        Position::Transitional,
        format!("Mixed profile: S={s:.2}, H={h:.2}, B={b:.2}. Position unclear, possibly in transition."),
    )
}

/// Classify a refined (S, H_somatic, H_cognitive, B) state.
///
/// Every rule after the two collapse checks reads the amplified bias,
/// recomputed here from the current fields.
pub fn classify_refined(state: &RefinedState) -> Classification {
    let s = state.s();
    let h_somatic = state.h_somatic();
    let h_cognitive = state.h_cognitive();
    let b = state.bias_amplification();
    let mismatch = state.energy_mismatch();

    if s < 0.2 {
        return classified(
            Position::EgoDissolution,
            "S -> 0: identity dissolved. Bias is meaningless with no self to be biased.",
        );
    }
    if h_cognitive < 0.2 {
        return classified(
            Position::CognitiveCollapse,
            format!(
                "H_cognitive -> 0: executive function collapsed. Bias amplified to {b:.2}. \
                 Physical arousal ({h_somatic:.2}) outpacing cognition."
            ),
        );
    }
    if mismatch > 0.4 {
        return classified(
            Position::StressAmplification,
            format!(
                "H_somatic ({h_somatic:.2}) >> H_cognitive ({h_cognitive:.2}): physical arousal \
                 outpaces cognition. Bias amplified to {b:.2}."
            ),
        );
    }
    if s > 0.7 && (h_somatic > 0.6 || h_cognitive > 0.6) && b > 0.6 {
        return classified(
            Position::EpistemicArrogance,
            format!("Strong identity + high energy + high amplified bias ({b:.2}). Confident but wrong."),
        );
    }
    if s > 0.7 && (h_somatic - h_cognitive).abs() < 0.2 && b < 0.4 {
        return classified(
            Position::IntegratedCompetence,
            format!("Strong identity + balanced energies + low bias ({b:.2}). Calibrated awareness."),
        );
    }
    if s > 0.5 && b > 0.4 && b < 0.7 {
        return classified(
            Position::MetaAwarenessTrap,
            format!("Strong identity + moderate amplified bias ({b:.2}). Aware but struggling."),
        );
    }
    classified(
        Position::Transitional,
        format!(
            "Mixed profile: S={s:.2}, H_somatic={h_somatic:.2}, H_cognitive={h_cognitive:.2}, \
             B_amplified={b:.2}."
        ),
    )
}

/// Raw triangle scores for a detailed state.
///
/// Absent inputs fall back to: Dunning_Kruger 0.3, Overconfidence 0.3,
/// Meta_Cognition 0.5, Lucidity 1.0, Recursive_Overthinking 0.0,
/// Ego_Oscillation 0.0.
pub fn triangle_scores(
    scorer: &CompositeScorer,
    state: &DetailedState,
) -> PharmakonResult<TriangleScores> {
    let dk = state.value_or(Variable::DunningKruger, 0.3);
    let oc = state.value_or(Variable::Overconfidence, 0.3);
    let mc = state.value_or(Variable::MetaCognition, 0.5);
    let lu = state.value_or(Variable::Lucidity, 1.0);
    let ro = state.value_or(Variable::RecursiveOverthinking, 0.0);
    let eo = state.value_or(Variable::EgoOscillation, 0.0);
    let bias_cascade = scorer.bias_cascade(state)?;

    Ok(TriangleScores {
        // high DK + overconfidence, low meta-cognition, low lucidity
        position_1: 0.4 * (dk + oc) / 2.0 + 0.3 * (1.0 - mc) + 0.3 * (1.0 - lu),
        // aware, lucid, ruminating, struggling with the cascade
        position_2: 0.3 * mc + 0.3 * lu + 0.2 * ro + 0.2 * bias_cascade,
        // aware, lucid, calm, stable self
        position_3: 0.3 * mc + 0.3 * lu + 0.2 * (1.0 - ro) + 0.2 * (1.0 - eo),
    })
}

/// Classify a detailed state onto the epistemic triangle.
pub fn classify_triangle(
    scorer: &CompositeScorer,
    state: &DetailedState,
) -> PharmakonResult<TriangleClassification> {
    let scores = triangle_scores(scorer, state)?;
    Ok(TriangleClassification {
        position: scores.winner(),
        scores,
    })
}
