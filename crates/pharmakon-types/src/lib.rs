// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! State representations, positions, configuration and the error
//! hierarchy shared by the Pharmakon scoring and dynamics crates.

pub mod config;
pub mod error;
pub mod persistence;
pub mod position;
pub mod score;
pub mod state;
pub mod variable;

pub use config::{
    FlagThresholds, IntegrationMethod, PharmakonConfig, SolverConfig, WeightTable, WeightVector,
};
pub use error::{PharmakonError, PharmakonResult};
pub use position::{Classification, Position, TriangleClassification};
pub use score::{clamp_score, FlagSet, InteractionMetrics, TriangleScores};
pub use state::{DetailedState, MinimalState, RefinedState};
pub use variable::{SliderGroup, Variable, VARIABLE_COUNT};
