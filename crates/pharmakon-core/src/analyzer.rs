// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Detailed State Analyzer
// ─────────────────────────────────────────────────────────────────────
//! One-call assessment of a detailed snapshot: composites, triangle
//! position, flags and recommendations, all against the same weights.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pharmakon_types::{
    DetailedState, FlagSet, FlagThresholds, PharmakonConfig, PharmakonResult,
    TriangleClassification, WeightTable,
};

use crate::classifier::classify_triangle;
use crate::flags::FlagDetector;
use crate::recommend::{RecommendationEngine, Recommendations};
use crate::scorer::CompositeScorer;

/// Everything the kernel derives from one detailed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAssessment {
    pub composites: BTreeMap<String, f64>,
    pub triangle: TriangleClassification,
    pub flags: FlagSet,
    pub recommendations: Recommendations,
}

/// Bundles scorer, flag detector and recommendation engine over one
/// shared weight table.
#[derive(Debug, Clone)]
pub struct DetailedAnalyzer {
    scorer: CompositeScorer,
    flags: FlagDetector,
    recommendations: RecommendationEngine,
}

impl DetailedAnalyzer {
    pub fn new(weights: Arc<WeightTable>, thresholds: FlagThresholds) -> PharmakonResult<Self> {
        weights.validate()?;
        let scorer = CompositeScorer::new(weights);
        Ok(Self {
            flags: FlagDetector::new(scorer.clone(), thresholds)?,
            recommendations: RecommendationEngine::new(scorer.clone()),
            scorer,
        })
    }

    pub fn from_config(config: &PharmakonConfig) -> PharmakonResult<Self> {
        Self::new(Arc::new(config.weights.clone()), config.flags)
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    pub fn assess(&self, state: &DetailedState) -> PharmakonResult<DetailedAssessment> {
        let triangle = classify_triangle(&self.scorer, state)?;
        let flags = self.flags.detect(state)?;
        let recommendations = self.recommendations.recommend(triangle.position, state)?;
        Ok(DetailedAssessment {
            composites: self.scorer.compute_all(state),
            triangle,
            flags,
            recommendations,
        })
    }
}

impl Default for DetailedAnalyzer {
    fn default() -> Self {
        let scorer = CompositeScorer::with_defaults();
        Self {
            flags: FlagDetector::with_defaults(scorer.clone()),
            recommendations: RecommendationEngine::new(scorer.clone()),
            scorer,
        }
    }
}
