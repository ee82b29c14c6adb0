// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - State Representations
// ─────────────────────────────────────────────────────────────────────
//! Three state shapes:
//!
//! - `MinimalState` (S, H, B) and `RefinedState` (S, H_somatic,
//!   H_cognitive, B): fixed records, every field silently clamped to
//!   [0, 1] on construction. NaN clamps to 1, ±Inf to the nearest bound.
//! - `DetailedState`: the slider schema of `Variable` plus an extension
//!   slot for unknown names. Values are NOT clamped; callers keep them
//!   in [0, 1].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::clamp_score;
use crate::variable::{Variable, VARIABLE_COUNT};

/// Clamp to [0, 1] as `max(0, min(1, x))` does: NaN goes to 1.
#[inline]
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        log::warn!("NaN state field, clamping to 1.0");
        return 1.0;
    }
    clamp_score(value, 0.0, 1.0)
}

/// Three orthogonal dimensions: Self/identity, energy, bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimalState {
    s: f64,
    h: f64,
    b: f64,
}

impl MinimalState {
    pub fn new(s: f64, h: f64, b: f64) -> Self {
        Self {
            s: unit(s),
            h: unit(h),
            b: unit(b),
        }
    }

    /// Self/identity: 0 = ego dissolution, 1 = rigidly defended self.
    pub fn s(&self) -> f64 {
        self.s
    }

    /// Energy/body: 0 = depleted, 1 = abundant.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Bias/knowing: 0 = accurate, 1 = delusional.
    pub fn b(&self) -> f64 {
        self.b
    }
}

impl Default for MinimalState {
    fn default() -> Self {
        Self::new(0.5, 0.8, 0.4)
    }
}

/// Minimal state with energy split into somatic and cognitive capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedState {
    s: f64,
    h_somatic: f64,
    h_cognitive: f64,
    b: f64,
}

impl RefinedState {
    pub fn new(s: f64, h_somatic: f64, h_cognitive: f64, b: f64) -> Self {
        Self {
            s: unit(s),
            h_somatic: unit(h_somatic),
            h_cognitive: unit(h_cognitive),
            b: unit(b),
        }
    }

    pub fn s(&self) -> f64 {
        self.s
    }

    pub fn h_somatic(&self) -> f64 {
        self.h_somatic
    }

    pub fn h_cognitive(&self) -> f64 {
        self.h_cognitive
    }

    /// Baseline bias, before amplification.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// `max(0, H_somatic - H_cognitive)`.
    pub fn energy_mismatch(&self) -> f64 {
        (self.h_somatic - self.h_cognitive).max(0.0)
    }

    /// Effective bias.
    ///
    /// With H_cognitive < 0.3 the baseline is scaled by the
    /// somatic/cognitive ratio (denominator floored at 0.1) and by
    /// identity vulnerability `1 - S`, capped at 1.0. Otherwise the
    /// baseline passes through. Always derived from the current fields.
    pub fn bias_amplification(&self) -> f64 {
        if self.h_cognitive < 0.3 {
            let factor = (self.h_somatic / self.h_cognitive.max(0.1)) * (1.0 - self.s);
            return (self.b * factor).min(1.0);
        }
        self.b
    }
}

impl Default for RefinedState {
    fn default() -> Self {
        Self::new(0.5, 0.8, 0.6, 0.4)
    }
}

/// Open detailed state: known slider variables plus unknown extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct DetailedState {
    known: [Option<f64>; VARIABLE_COUNT],
    extra: BTreeMap<String, f64>,
}

impl DetailedState {
    /// Empty state: every variable absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known variable present at its slider default.
    pub fn baseline() -> Self {
        let mut state = Self::new();
        for v in Variable::ALL {
            state.set(v, v.slider_default());
        }
        state
    }

    /// Build from parallel key/value slices (e.g. an ODE state vector).
    pub fn from_pairs(keys: &[String], values: &[f64]) -> Self {
        let mut state = Self::new();
        for (k, &v) in keys.iter().zip(values) {
            state.set_named(k, v);
        }
        state
    }

    pub fn with(mut self, var: Variable, value: f64) -> Self {
        self.set(var, value);
        self
    }

    pub fn with_named(mut self, name: &str, value: f64) -> Self {
        self.set_named(name, value);
        self
    }

    pub fn set(&mut self, var: Variable, value: f64) {
        self.known[var.index()] = Some(value);
    }

    /// Known names go to their slot, anything else to the extension map.
    pub fn set_named(&mut self, name: &str, value: f64) {
        match Variable::from_name(name) {
            Some(var) => self.set(var, value),
            None => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    pub fn remove(&mut self, var: Variable) -> Option<f64> {
        self.known[var.index()].take()
    }

    /// Remove by name: a schema variable or an extension key.
    pub fn remove_named(&mut self, name: &str) -> Option<f64> {
        match Variable::from_name(name) {
            Some(var) => self.remove(var),
            None => self.extra.remove(name),
        }
    }

    pub fn get(&self, var: Variable) -> Option<f64> {
        self.known[var.index()]
    }

    pub fn get_named(&self, name: &str) -> Option<f64> {
        match Variable::from_name(name) {
            Some(var) => self.get(var),
            None => self.extra.get(name).copied(),
        }
    }

    /// Value if present, else the caller's fallback.
    #[inline]
    pub fn value_or(&self, var: Variable, default: f64) -> f64 {
        self.get(var).unwrap_or(default)
    }

    /// Value if present, else the variable's slider default.
    pub fn value(&self, var: Variable) -> f64 {
        self.value_or(var, var.slider_default())
    }

    pub fn contains(&self, var: Variable) -> bool {
        self.get(var).is_some()
    }

    pub fn contains_named(&self, name: &str) -> bool {
        self.get_named(name).is_some()
    }

    pub fn extra(&self) -> &BTreeMap<String, f64> {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.known.iter().filter(|v| v.is_some()).count() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present entries: known variables in schema order, then extras.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        Variable::ALL
            .into_iter()
            .filter_map(|var| self.get(var).map(|v| (var.name(), v)))
            .chain(self.extra.iter().map(|(k, &v)| (k.as_str(), v)))
    }

    /// Names of present entries in lexicographic order.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.iter().map(|(k, _)| k.to_string()).collect();
        keys.sort();
        keys
    }

    /// Values for `keys`, in that order. `None` if any key is absent.
    pub fn values_for(&self, keys: &[String]) -> Option<Vec<f64>> {
        keys.iter().map(|k| self.get_named(k)).collect()
    }
}

impl From<BTreeMap<String, f64>> for DetailedState {
    fn from(map: BTreeMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<DetailedState> for BTreeMap<String, f64> {
    fn from(state: DetailedState) -> Self {
        state.iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl FromIterator<(String, f64)> for DetailedState {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (k, v) in iter {
            state.set_named(&k, v);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_clamps_silently() {
        let state = MinimalState::new(1.4, -0.2, 0.5);
        assert_eq!(state.s(), 1.0);
        assert_eq!(state.h(), 0.0);
        assert_eq!(state.b(), 0.5);
    }

    #[test]
    fn test_minimal_nan_clamps_to_one() {
        let state = MinimalState::new(f64::NAN, f64::INFINITY, 0.3);
        assert_eq!(state.s(), 1.0);
        assert_eq!(state.h(), 1.0);
        let state = MinimalState::new(0.2, f64::NEG_INFINITY, f64::NAN);
        assert_eq!((state.h(), state.b()), (0.0, 1.0));
    }

    #[test]
    fn test_refined_nan_clamps_to_one() {
        let state = RefinedState::new(f64::NAN, 0.5, f64::NAN, -2.0);
        assert_eq!(state.s(), 1.0);
        assert_eq!(state.h_cognitive(), 1.0);
        assert_eq!(state.b(), 0.0);
    }

    #[test]
    fn test_remove_named_handles_extension_keys() {
        let mut state = DetailedState::new()
            .with(Variable::Fear, 0.4)
            .with_named("Awe", 0.3);
        assert_eq!(state.remove_named("Awe"), Some(0.3));
        assert!(!state.contains_named("Awe"));
        assert_eq!(state.remove_named("Awe"), None);
        assert_eq!(state.remove_named("Fear"), Some(0.4));
        assert!(state.is_empty());
    }

    #[test]
    fn test_minimal_default() {
        let state = MinimalState::default();
        assert_eq!((state.s(), state.h(), state.b()), (0.5, 0.8, 0.4));
    }

    #[test]
    fn test_refined_clamps() {
        let state = RefinedState::new(0.5, 2.0, -1.0, 0.4);
        assert_eq!(state.h_somatic(), 1.0);
        assert_eq!(state.h_cognitive(), 0.0);
    }

    #[test]
    fn test_energy_mismatch_never_negative() {
        assert!((RefinedState::new(0.5, 0.9, 0.3, 0.4).energy_mismatch() - 0.6).abs() < 1e-12);
        assert_eq!(RefinedState::new(0.5, 0.3, 0.9, 0.4).energy_mismatch(), 0.0);
    }

    #[test]
    fn test_bias_amplification_threshold_is_strict() {
        // H_cognitive == 0.3 is not below 0.3: baseline passes through
        let state = RefinedState::new(0.8, 0.9, 0.3, 0.4);
        assert_eq!(state.bias_amplification(), 0.4);
    }

    #[test]
    fn test_bias_amplification_low_cognition() {
        // 0.5 * (0.6 / 0.2) * (1 - 0.7) = 0.45
        let state = RefinedState::new(0.7, 0.6, 0.2, 0.5);
        assert!((state.bias_amplification() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_bias_amplification_floor_and_cap() {
        // H_cognitive floored at 0.1: 0.5 * (1.0 / 0.1) * (1 - 0.3) = 3.5 → 1.0
        let state = RefinedState::new(0.3, 1.0, 0.0, 0.5);
        assert_eq!(state.bias_amplification(), 1.0);
    }

    #[test]
    fn test_bias_amplification_tracks_current_s() {
        let low_s = RefinedState::new(0.2, 0.8, 0.2, 0.3);
        let high_s = RefinedState::new(0.9, 0.8, 0.2, 0.3);
        assert!(low_s.bias_amplification() > high_s.bias_amplification());
    }

    #[test]
    fn test_detailed_empty_and_baseline() {
        assert!(DetailedState::new().is_empty());
        let base = DetailedState::baseline();
        assert_eq!(base.len(), VARIABLE_COUNT);
        assert_eq!(base.get(Variable::Lucidity), Some(1.0));
    }

    #[test]
    fn test_detailed_not_clamped() {
        let state = DetailedState::new().with(Variable::Fear, 1.7);
        assert_eq!(state.get(Variable::Fear), Some(1.7));
    }

    #[test]
    fn test_detailed_extra_slot() {
        let state = DetailedState::new()
            .with_named("Fear", 0.8)
            .with_named("Awe", 0.4);
        assert_eq!(state.get(Variable::Fear), Some(0.8));
        assert_eq!(state.get_named("Awe"), Some(0.4));
        assert_eq!(state.extra().len(), 1);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_value_defaults() {
        let state = DetailedState::new();
        assert_eq!(state.value(Variable::MetaCognition), 0.5);
        assert_eq!(state.value_or(Variable::MetaCognition, 0.0), 0.0);
    }

    #[test]
    fn test_sorted_keys_lexicographic() {
        let state = DetailedState::new()
            .with(Variable::Joy, 0.1)
            .with(Variable::Fear, 0.8)
            .with_named("Awe", 0.2)
            .with(Variable::Lucidity, 0.9);
        assert_eq!(state.sorted_keys(), vec!["Awe", "Fear", "Joy", "Lucidity"]);
    }

    #[test]
    fn test_pairs_round_trip() {
        let state = DetailedState::new()
            .with(Variable::Fear, 0.8)
            .with(Variable::Confirmation, 0.7);
        let keys = state.sorted_keys();
        let values = state.values_for(&keys).unwrap();
        assert_eq!(DetailedState::from_pairs(&keys, &values), state);
        assert!(state.values_for(&["Joy".to_string()]).is_none());
    }

    #[test]
    fn test_serde_flat_map() {
        let state = DetailedState::new()
            .with(Variable::DunningKruger, 0.6)
            .with_named("Awe", 0.1);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["Dunning_Kruger"], 0.6);
        assert_eq!(json["Awe"], 0.1);
        let back: DetailedState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
