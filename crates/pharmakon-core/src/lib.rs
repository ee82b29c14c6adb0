// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Scoring & Classification
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Composite scoring, epistemic position classification, interaction
//! metrics, pattern flags and debiasing recommendations.
//!
//! Data flows one way:
//!
//! ```text
//! raw state ─► CompositeScorer ─► { triangle classifier, flags } ─► recommendations
//! minimal / refined state ─► { minimal / refined classifier, interaction metrics }
//! ```
//!
//! # Invariants
//!
//! 1. **Weights are immutable after load**: a `CompositeScorer` holds an
//!    `Arc<WeightTable>` and never mutates it, so scorers can be cloned
//!    into any number of threads without locking.
//!
//! 2. **Total over well-formed input**: classifiers, metrics and flags
//!    never fail for in-range values. The only error path is a missing
//!    composite in a custom weight table.
//!
//! 3. **First match wins**: the minimal and refined classifiers evaluate
//!    their rules in a fixed order; the triangle classifier breaks exact
//!    ties toward the lower-numbered position.

pub mod analyzer;
pub mod classifier;
pub mod flags;
pub mod interactions;
pub mod recommend;
pub mod scorer;

pub use analyzer::{DetailedAnalyzer, DetailedAssessment};
pub use classifier::{classify_minimal, classify_refined, classify_triangle, triangle_scores};
pub use flags::{detect_flags, narrative_risk, FlagDetector};
pub use interactions::compute_interactions;
pub use recommend::{RecommendationEngine, Recommendations};
pub use scorer::CompositeScorer;
