// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Detailed State Schema
// ─────────────────────────────────────────────────────────────────────
//! Closed schema of the detailed slider variables.
//!
//! Each variable belongs to one of five slider groups (or stands alone)
//! and carries a slider default. The default is what a freshly built
//! slider group reports; individual consumers (composites, classifier,
//! flags) still apply their own fallback when a variable is absent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic group a detailed variable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliderGroup {
    Body,
    Affect,
    Cognitive,
    Bias,
    Narrative,
    Standalone,
}

pub const VARIABLE_COUNT: usize = 31;

/// A known detailed-state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    // Body
    SympatheticSurge,
    MotorRigidity,
    ThermalOverload,
    Cortisol,
    HeartRate,
    // Affect
    Fear,
    Joy,
    Love,
    Gratitude,
    Contentment,
    Hope,
    Sadness,
    Anger,
    // Cognitive
    RecursiveOverthinking,
    MetaphoricFusion,
    Lucidity,
    EgoOscillation,
    MetaCognition,
    // Bias
    Confirmation,
    DunningKruger,
    Overconfidence,
    Negativity,
    Hindsight,
    Availability,
    // Narrative
    Coherence,
    Continuity,
    Arc,
    Protagonist,
    Meaning,
    // Standalone
    DogmaFixation,
    Delusionality,
}

/// (variable, canonical name, group, slider default)
const SCHEMA: [(Variable, &str, SliderGroup, f64); VARIABLE_COUNT] = [
    (Variable::SympatheticSurge, "Sympathetic_Surge", SliderGroup::Body, 0.0),
    (Variable::MotorRigidity, "Motor_Rigidity", SliderGroup::Body, 0.0),
    (Variable::ThermalOverload, "Thermal_Overload", SliderGroup::Body, 0.0),
    (Variable::Cortisol, "Cortisol", SliderGroup::Body, 0.0),
    (Variable::HeartRate, "Heart_Rate", SliderGroup::Body, 0.5),
    (Variable::Fear, "Fear", SliderGroup::Affect, 0.0),
    (Variable::Joy, "Joy", SliderGroup::Affect, 0.0),
    (Variable::Love, "Love", SliderGroup::Affect, 0.0),
    (Variable::Gratitude, "Gratitude", SliderGroup::Affect, 0.0),
    (Variable::Contentment, "Contentment", SliderGroup::Affect, 0.0),
    (Variable::Hope, "Hope", SliderGroup::Affect, 0.0),
    (Variable::Sadness, "Sadness", SliderGroup::Affect, 0.0),
    (Variable::Anger, "Anger", SliderGroup::Affect, 0.0),
    (Variable::RecursiveOverthinking, "Recursive_Overthinking", SliderGroup::Cognitive, 0.0),
    (Variable::MetaphoricFusion, "Metaphoric_Fusion", SliderGroup::Cognitive, 0.0),
    (Variable::Lucidity, "Lucidity", SliderGroup::Cognitive, 1.0),
    (Variable::EgoOscillation, "Ego_Oscillation", SliderGroup::Cognitive, 0.0),
    (Variable::MetaCognition, "Meta_Cognition", SliderGroup::Cognitive, 0.5),
    (Variable::Confirmation, "Confirmation", SliderGroup::Bias, 0.4),
    (Variable::DunningKruger, "Dunning_Kruger", SliderGroup::Bias, 0.3),
    (Variable::Overconfidence, "Overconfidence", SliderGroup::Bias, 0.3),
    (Variable::Negativity, "Negativity", SliderGroup::Bias, 0.4),
    (Variable::Hindsight, "Hindsight", SliderGroup::Bias, 0.4),
    (Variable::Availability, "Availability", SliderGroup::Bias, 0.5),
    (Variable::Coherence, "Coherence", SliderGroup::Narrative, 0.7),
    (Variable::Continuity, "Continuity", SliderGroup::Narrative, 0.7),
    (Variable::Arc, "Arc", SliderGroup::Narrative, 0.5),
    (Variable::Protagonist, "Protagonist", SliderGroup::Narrative, 0.6),
    (Variable::Meaning, "Meaning", SliderGroup::Narrative, 0.5),
    (Variable::DogmaFixation, "Dogma_Fixation", SliderGroup::Standalone, 0.0),
    (Variable::Delusionality, "Delusionality", SliderGroup::Standalone, 0.0),
];

impl Variable {
    /// Every known variable, in schema order.
    pub const ALL: [Variable; VARIABLE_COUNT] = {
        let mut all = [Variable::SympatheticSurge; VARIABLE_COUNT];
        let mut i = 0;
        while i < VARIABLE_COUNT {
            all[i] = SCHEMA[i].0;
            i += 1;
        }
        all
    };

    /// Position in the schema (and in `DetailedState` storage).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical name, e.g. `"Dunning_Kruger"`.
    pub fn name(self) -> &'static str {
        SCHEMA[self.index()].1
    }

    pub fn group(self) -> SliderGroup {
        SCHEMA[self.index()].2
    }

    /// Value a default-constructed slider group reports.
    pub fn slider_default(self) -> f64 {
        SCHEMA[self.index()].3
    }

    /// Look up a variable by canonical name (exact, case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        SCHEMA
            .iter()
            .find(|(_, n, _, _)| *n == name)
            .map(|(v, _, _, _)| *v)
    }

    /// All variables of one group, in schema order.
    pub fn in_group(group: SliderGroup) -> impl Iterator<Item = Variable> {
        Self::ALL.into_iter().filter(move |v| v.group() == group)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown detailed variable: {s}"))
    }
}
