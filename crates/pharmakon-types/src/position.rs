// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Epistemic Positions
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::score::TriangleScores;

/// Every label produced by the minimal, refined and triangle classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Ego_Dissolution")]
    EgoDissolution,
    #[serde(rename = "Energy_Collapse")]
    EnergyCollapse,
    #[serde(rename = "Delusional_Defense")]
    DelusionalDefense,
    #[serde(rename = "Cognitive_Collapse")]
    CognitiveCollapse,
    #[serde(rename = "Stress_Amplification")]
    StressAmplification,
    #[serde(rename = "Position_1_Epistemic_Arrogance")]
    EpistemicArrogance,
    #[serde(rename = "Position_2_Meta_Awareness_Trap")]
    MetaAwarenessTrap,
    #[serde(rename = "Position_3_Integrated_Competence")]
    IntegratedCompetence,
    #[serde(rename = "Transitional_State")]
    Transitional,
}

impl Position {
    pub const ALL: [Position; 9] = [
        Position::EgoDissolution,
        Position::EnergyCollapse,
        Position::DelusionalDefense,
        Position::CognitiveCollapse,
        Position::StressAmplification,
        Position::EpistemicArrogance,
        Position::MetaAwarenessTrap,
        Position::IntegratedCompetence,
        Position::Transitional,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Position::EgoDissolution => "Ego_Dissolution",
            Position::EnergyCollapse => "Energy_Collapse",
            Position::DelusionalDefense => "Delusional_Defense",
            Position::CognitiveCollapse => "Cognitive_Collapse",
            Position::StressAmplification => "Stress_Amplification",
            Position::EpistemicArrogance => "Position_1_Epistemic_Arrogance",
            Position::MetaAwarenessTrap => "Position_2_Meta_Awareness_Trap",
            Position::IntegratedCompetence => "Position_3_Integrated_Competence",
            Position::Transitional => "Transitional_State",
        }
    }

    /// Label with underscores replaced by spaces.
    pub fn display_name(self) -> String {
        self.label().replace('_', " ")
    }

    /// Parse either the underscore label or its display name.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalised = label.trim().replace(' ', "_");
        Self::ALL.into_iter().find(|p| p.label() == normalised)
    }

    /// 1, 2 or 3 for the triangle positions, `None` for special cases.
    pub fn triangle_index(self) -> Option<u8> {
        match self {
            Position::EpistemicArrogance => Some(1),
            Position::MetaAwarenessTrap => Some(2),
            Position::IntegratedCompetence => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of the minimal or refined classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub position: Position,
    /// One-line rationale naming the variables that decided the branch.
    pub description: String,
}

/// Result of the triangle classifier over a detailed state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleClassification {
    pub position: Position,
    pub scores: TriangleScores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_unique() {
        let labels: std::collections::HashSet<_> =
            Position::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), Position::ALL.len());
    }

    #[test]
    fn test_from_label_both_forms() {
        assert_eq!(
            Position::from_label("Position_2_Meta_Awareness_Trap"),
            Some(Position::MetaAwarenessTrap)
        );
        assert_eq!(
            Position::from_label("Position 3 Integrated Competence"),
            Some(Position::IntegratedCompetence)
        );
        assert_eq!(Position::from_label("Position_4_Enlightenment"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            Position::EpistemicArrogance.display_name(),
            "Position 1 Epistemic Arrogance"
        );
    }

    #[test]
    fn test_triangle_index() {
        assert_eq!(Position::IntegratedCompetence.triangle_index(), Some(3));
        assert_eq!(Position::EgoDissolution.triangle_index(), None);
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Position::StressAmplification).unwrap();
        assert_eq!(json, "\"Stress_Amplification\"");
    }
}
