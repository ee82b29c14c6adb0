// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Coupling Rules
// ─────────────────────────────────────────────────────────────────────
//! Declarative right-hand side of the detailed-state dynamics.
//!
//! Each rule names the variables that must be present for it to fire
//! and the derivatives it contributes:
//!
//!   d(Fear)/dt            = -0.1 · Fear
//!   d(Joy)/dt             = 0.05 · positive - 0.02 · Joy
//!   d(Ego_Oscillation)/dt = 0.1 · Recursive_Overthinking - 0.05 · Lucidity
//!   d(Meta_Cognition)/dt  = 0.1 · awareness
//!   d(Confirmation)/dt    = -0.05 · awareness
//!
//! with `awareness = Meta_Cognition · (1 - bias_cascade)`. Variables no
//! rule targets are held constant.

use pharmakon_core::CompositeScorer;
use pharmakon_types::{DetailedState, PharmakonResult, Variable, VARIABLE_COUNT};

use crate::integrator::OdeSystem;

/// Derivative contributions of one rule.
pub type Contributions = Vec<(Variable, f64)>;

/// One precondition → derivative entry of the coupling table.
pub struct CouplingRule {
    pub name: &'static str,
    /// All of these must be present in the state for the rule to fire.
    pub requires: &'static [Variable],
    pub derive: fn(&DetailedState, &CompositeScorer) -> PharmakonResult<Contributions>,
}

impl CouplingRule {
    pub fn applies_to(&self, state: &DetailedState) -> bool {
        self.requires.iter().all(|&v| state.contains(v))
    }
}

fn fear_decay(state: &DetailedState, _: &CompositeScorer) -> PharmakonResult<Contributions> {
    let fear = state.value_or(Variable::Fear, 0.0);
    Ok(vec![(Variable::Fear, -0.1 * fear)])
}

fn joy_integration(
    state: &DetailedState,
    scorer: &CompositeScorer,
) -> PharmakonResult<Contributions> {
    let positive = scorer.positive(state)?;
    let joy = state.value_or(Variable::Joy, 0.0);
    Ok(vec![(Variable::Joy, 0.05 * positive - 0.02 * joy)])
}

fn ego_damping(state: &DetailedState, _: &CompositeScorer) -> PharmakonResult<Contributions> {
    let overthinking = state.value_or(Variable::RecursiveOverthinking, 0.0);
    let lucidity = state.value_or(Variable::Lucidity, 0.0);
    Ok(vec![(
        Variable::EgoOscillation,
        0.1 * overthinking - 0.05 * lucidity,
    )])
}

fn metacognitive_debiasing(
    state: &DetailedState,
    scorer: &CompositeScorer,
) -> PharmakonResult<Contributions> {
    let meta = state.value_or(Variable::MetaCognition, 0.0);
    let awareness = meta * (1.0 - scorer.bias_cascade(state)?);
    Ok(vec![
        (Variable::MetaCognition, 0.1 * awareness),
        (Variable::Confirmation, -0.05 * awareness),
    ])
}

/// The fixed coupling table, in evaluation order.
pub static COUPLING_RULES: [CouplingRule; 4] = [
    CouplingRule {
        name: "fear_decay",
        requires: &[Variable::Fear],
        derive: fear_decay,
    },
    CouplingRule {
        name: "joy_integration",
        requires: &[Variable::Joy],
        derive: joy_integration,
    },
    CouplingRule {
        name: "ego_damping",
        requires: &[Variable::EgoOscillation, Variable::Lucidity],
        derive: ego_damping,
    },
    CouplingRule {
        name: "metacognitive_debiasing",
        requires: &[Variable::MetaCognition, Variable::Confirmation],
        derive: metacognitive_debiasing,
    },
];

/// Derivatives of every variable of `state` under the coupling table.
///
/// Keyed by name, for inspecting the rules without a solver.
pub fn state_derivatives(
    state: &DetailedState,
    scorer: &CompositeScorer,
) -> PharmakonResult<DetailedState> {
    let mut out = DetailedState::new();
    for (name, _) in state.iter() {
        out.set_named(name, 0.0);
    }
    for rule in COUPLING_RULES.iter().filter(|r| r.applies_to(state)) {
        for (var, d) in (rule.derive)(state, scorer)? {
            out.set(var, d);
        }
    }
    Ok(out)
}

/// The coupling table bound to one fixed variable ordering.
///
/// The ordering and the set of active rules are fixed at construction
/// and hold for the whole run.
pub struct CouplingSystem {
    keys: Vec<String>,
    slots: [Option<usize>; VARIABLE_COUNT],
    active: Vec<&'static CouplingRule>,
    scorer: CompositeScorer,
}

impl CouplingSystem {
    /// Bind the table to `initial`, ordering variables lexicographically.
    pub fn new(initial: &DetailedState, scorer: CompositeScorer) -> Self {
        let keys = initial.sorted_keys();
        let mut slots = [None; VARIABLE_COUNT];
        for (i, key) in keys.iter().enumerate() {
            if let Some(var) = Variable::from_name(key) {
                slots[var.index()] = Some(i);
            }
        }
        let active = COUPLING_RULES
            .iter()
            .filter(|r| r.applies_to(initial))
            .collect();
        Self {
            keys,
            slots,
            active,
            scorer,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.active.iter().map(|r| r.name)
    }
}

impl OdeSystem for CouplingSystem {
    fn dimension(&self) -> usize {
        self.keys.len()
    }

    /// `y` and `dy` follow the order of `keys`. Time does not enter.
    fn derivatives(&self, _t: f64, y: &[f64], dy: &mut [f64]) -> PharmakonResult<()> {
        dy.iter_mut().for_each(|d| *d = 0.0);
        if self.active.is_empty() {
            return Ok(());
        }
        let state = DetailedState::from_pairs(&self.keys, y);
        for rule in &self.active {
            for (var, d) in (rule.derive)(&state, &self.scorer)? {
                if let Some(i) = self.slots[var.index()] {
                    dy[i] = d;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> CompositeScorer {
        CompositeScorer::with_defaults()
    }

    #[test]
    fn test_fear_alone_decays() {
        let state = DetailedState::new().with(Variable::Fear, 0.8);
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert!((d.get(Variable::Fear).unwrap() + 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_unmatched_variables_held_constant() {
        let state = DetailedState::new()
            .with(Variable::Anger, 0.5)
            .with(Variable::Cortisol, 0.9)
            .with_named("Awe", 0.3);
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert_eq!(d.len(), 3);
        assert!(d.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_joy_uses_positive_composite() {
        let state = DetailedState::new()
            .with(Variable::Joy, 0.5)
            .with(Variable::Love, 1.0);
        // positive = 0.3*0.5 + 0.2*1.0 = 0.35 → 0.05*0.35 - 0.02*0.5 = 0.0075
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert!((d.get(Variable::Joy).unwrap() - 0.0075).abs() < 1e-12);
        assert_eq!(d.get(Variable::Love), Some(0.0));
    }

    #[test]
    fn test_ego_rule_needs_lucidity() {
        let without = DetailedState::new()
            .with(Variable::EgoOscillation, 0.5)
            .with(Variable::RecursiveOverthinking, 0.8);
        let d = state_derivatives(&without, &scorer()).unwrap();
        assert_eq!(d.get(Variable::EgoOscillation), Some(0.0));

        let with = without.with(Variable::Lucidity, 0.4);
        // 0.1*0.8 - 0.05*0.4 = 0.06
        let d = state_derivatives(&with, &scorer()).unwrap();
        assert!((d.get(Variable::EgoOscillation).unwrap() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_ego_rule_overthinking_defaults_to_zero() {
        let state = DetailedState::new()
            .with(Variable::EgoOscillation, 0.5)
            .with(Variable::Lucidity, 1.0);
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert!((d.get(Variable::EgoOscillation).unwrap() + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_metacognitive_pair() {
        let state = DetailedState::new()
            .with(Variable::MetaCognition, 0.6)
            .with(Variable::Confirmation, 0.4);
        // bias_cascade = 0.35*0.4 = 0.14, awareness = 0.6*0.86 = 0.516
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert!((d.get(Variable::MetaCognition).unwrap() - 0.0516).abs() < 1e-12);
        assert!((d.get(Variable::Confirmation).unwrap() + 0.0258).abs() < 1e-12);
    }

    #[test]
    fn test_metacognitive_rule_needs_both() {
        let state = DetailedState::new().with(Variable::MetaCognition, 0.6);
        let d = state_derivatives(&state, &scorer()).unwrap();
        assert_eq!(d.get(Variable::MetaCognition), Some(0.0));
    }

    #[test]
    fn test_system_orders_keys_and_binds_rules() {
        let state = DetailedState::new()
            .with(Variable::Joy, 0.2)
            .with(Variable::Fear, 0.8)
            .with(Variable::Anger, 0.1);
        let system = CouplingSystem::new(&state, scorer());
        assert_eq!(system.keys(), ["Anger", "Fear", "Joy"]);
        let rules: Vec<_> = system.active_rules().collect();
        assert_eq!(rules, ["fear_decay", "joy_integration"]);

        let y = state.values_for(system.keys()).unwrap();
        let mut dy = vec![1.0; 3];
        system.derivatives(0.0, &y, &mut dy).unwrap();
        assert_eq!(dy[0], 0.0);
        assert!((dy[1] + 0.08).abs() < 1e-12);
        // positive = 0.3*0.2 → 0.05*0.06 - 0.02*0.2 = -0.001
        assert!((dy[2] + 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_system_agrees_with_keyed_derivatives() {
        let state = DetailedState::baseline()
            .with(Variable::Fear, 0.7)
            .with(Variable::Joy, 0.3)
            .with(Variable::RecursiveOverthinking, 0.6);
        let system = CouplingSystem::new(&state, scorer());
        let y = state.values_for(system.keys()).unwrap();
        let mut dy = vec![0.0; y.len()];
        system.derivatives(0.0, &y, &mut dy).unwrap();
        let keyed = state_derivatives(&state, &scorer()).unwrap();
        for (i, key) in system.keys().iter().enumerate() {
            assert_eq!(Some(dy[i]), keyed.get_named(key), "{key}");
        }
    }
}
