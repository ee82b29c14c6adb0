// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Composite Scorer
// ─────────────────────────────────────────────────────────────────────
//! Weighted composites over a detailed state.
//!
//! `composite = Σ state[k] · w_k` over the entries of one weight vector.
//! Absent state variables contribute 0.0. Nothing is cached: every call
//! reads the snapshot it is given.

use std::collections::BTreeMap;
use std::sync::Arc;

use pharmakon_types::config::{BIAS_CASCADE, POSITIVE, STRESS};
use pharmakon_types::{DetailedState, PharmakonError, PharmakonResult, WeightTable};

/// Composite scorer over a shared, read-only weight table.
///
/// Cloning shares the table; safe to use from several threads at once.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: Arc<WeightTable>,
}

impl CompositeScorer {
    pub fn new(weights: Arc<WeightTable>) -> Self {
        Self { weights }
    }

    /// Scorer over the built-in stress / positive / bias_cascade table.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(WeightTable::default()))
    }

    /// Weighted sum of `state` against composite `name`.
    pub fn compute(&self, name: &str, state: &DetailedState) -> PharmakonResult<f64> {
        let vector = self
            .weights
            .get(name)
            .ok_or_else(|| PharmakonError::UnknownComposite(name.to_string()))?;
        Ok(vector
            .iter()
            .map(|(var, w)| state.get_named(var).unwrap_or(0.0) * w)
            .sum())
    }

    pub fn stress(&self, state: &DetailedState) -> PharmakonResult<f64> {
        self.compute(STRESS, state)
    }

    pub fn positive(&self, state: &DetailedState) -> PharmakonResult<f64> {
        self.compute(POSITIVE, state)
    }

    pub fn bias_cascade(&self, state: &DetailedState) -> PharmakonResult<f64> {
        self.compute(BIAS_CASCADE, state)
    }

    /// Every composite in the table.
    pub fn compute_all(&self, state: &DetailedState) -> BTreeMap<String, f64> {
        self.weights
            .names()
            .filter_map(|name| {
                self.compute(name, state)
                    .ok()
                    .map(|score| (name.to_string(), score))
            })
            .collect()
    }

    /// Read-only access to the weight table.
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmakon_types::Variable;

    #[test]
    fn test_unknown_composite() {
        let scorer = CompositeScorer::with_defaults();
        let err = scorer.compute("serenity", &DetailedState::new()).unwrap_err();
        assert_eq!(err, PharmakonError::UnknownComposite("serenity".into()));
    }

    #[test]
    fn test_empty_state_scores_zero() {
        let scorer = CompositeScorer::with_defaults();
        let empty = DetailedState::new();
        for name in ["stress", "positive", "bias_cascade"] {
            assert_eq!(scorer.compute(name, &empty).unwrap(), 0.0, "{name}");
        }
    }

    #[test]
    fn test_missing_keys_contribute_zero() {
        let scorer = CompositeScorer::with_defaults();
        let state = DetailedState::new().with(Variable::Fear, 1.0);
        assert!((scorer.stress(&state).unwrap() - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_stress_formula() {
        let scorer = CompositeScorer::with_defaults();
        let state = DetailedState::new()
            .with(Variable::Fear, 0.8)
            .with(Variable::Anger, 0.5)
            .with(Variable::Cortisol, 0.6)
            .with(Variable::SympatheticSurge, 0.9);
        // 0.3*0.8 + 0.2*0.5 + 0.25*0.6 + 0.25*0.9 = 0.715
        assert!((scorer.stress(&state).unwrap() - 0.715).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_state_equals_value() {
        // weights sum to 1, so a state at v everywhere scores ≈ v
        let scorer = CompositeScorer::with_defaults();
        let mut state = DetailedState::new();
        for v in Variable::ALL {
            state.set(v, 0.6);
        }
        for score in scorer.compute_all(&state).values() {
            assert!((score - 0.6).abs() < 1e-3 * 0.6 + 1e-12);
        }
    }

    #[test]
    fn test_linear_in_weight() {
        let one = WeightTable::from_json(r#"{"x": {"Fear": 1.0}}"#).unwrap();
        let mixed = WeightTable::from_json(r#"{"x": {"Fear": 0.5, "Joy": 0.5}}"#).unwrap();
        let state = DetailedState::new().with(Variable::Fear, 0.8);
        let a = CompositeScorer::new(Arc::new(one)).compute("x", &state).unwrap();
        let b = CompositeScorer::new(Arc::new(mixed)).compute("x", &state).unwrap();
        assert!((a - 0.8).abs() < 1e-12);
        assert!((b - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_extra_variables_are_scored() {
        let table = WeightTable::from_json(r#"{"awe": {"Awe": 0.5, "Joy": 0.5}}"#).unwrap();
        let scorer = CompositeScorer::new(Arc::new(table));
        let state = DetailedState::new().with_named("Awe", 1.0);
        assert!((scorer.compute("awe", &state).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_compute_all_covers_table() {
        let scorer = CompositeScorer::with_defaults();
        let all = scorer.compute_all(&DetailedState::baseline());
        assert_eq!(all.len(), 3);
        // baseline bias: 0.35*0.4 + 0.3*0.3 + 0.25*0.3 + 0.1*0.4 = 0.345
        assert!((all["bias_cascade"] - 0.345).abs() < 1e-12);
    }

    #[test]
    fn test_clones_share_table() {
        let scorer = CompositeScorer::with_defaults();
        let clone = scorer.clone();
        assert!(std::ptr::eq(scorer.weights(), clone.weights()));
    }
}
