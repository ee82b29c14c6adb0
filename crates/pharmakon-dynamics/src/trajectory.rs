// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Trajectory Simulator
// ─────────────────────────────────────────────────────────────────────
//! Evolves a detailed state over a time span under the coupling rules
//! and returns it sampled at evenly spaced times.

use serde::{Deserialize, Serialize};

use pharmakon_core::CompositeScorer;
use pharmakon_types::{
    DetailedState, IntegrationMethod, PharmakonError, PharmakonResult, SolverConfig,
};

use crate::integrator::integrate;
use crate::rules::CouplingSystem;

/// `n` evenly spaced points from `t0` to `t1`, both ends included.
pub fn linspace(t0: f64, t1: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t0],
        _ => {
            let step = (t1 - t0) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| t0 + step * i as f64).collect();
            out[n - 1] = t1;
            out
        }
    }
}

/// Sampled evolution of a detailed state.
///
/// `states[i][j]` is the value of `keys[j]` at `times[i]`. Keys are in
/// lexicographic order and fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    keys: Vec<String>,
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
    method: IntegrationMethod,
    n_steps: usize,
    n_rejected: usize,
    n_fev: usize,
}

impl Trajectory {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn n_rejected(&self) -> usize {
        self.n_rejected
    }

    pub fn n_fev(&self) -> usize {
        self.n_fev
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.keys.binary_search_by(|k| k.as_str().cmp(name)).ok()
    }

    /// Time series of one variable.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.index_of(name)?;
        Some(self.states.iter().map(|row| row[j]).collect())
    }

    /// Sample `i` rebuilt as a keyed state.
    pub fn state_at(&self, i: usize) -> Option<DetailedState> {
        self.states
            .get(i)
            .map(|row| DetailedState::from_pairs(&self.keys, row))
    }

    pub fn final_state(&self) -> Option<DetailedState> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }
}

/// Coupled-ODE simulator over a shared composite scorer.
#[derive(Debug, Clone, Default)]
pub struct TrajectorySimulator {
    scorer: CompositeScorer,
    solver: SolverConfig,
}

impl TrajectorySimulator {
    pub fn new(scorer: CompositeScorer, solver: SolverConfig) -> PharmakonResult<Self> {
        solver.validate()?;
        Ok(Self { scorer, solver })
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    /// Simulate with the configured method.
    pub fn simulate(
        &self,
        initial: &DetailedState,
        t_span: (f64, f64),
        n_points: usize,
    ) -> PharmakonResult<Trajectory> {
        self.simulate_with(initial, t_span, n_points, self.solver.method)
    }

    /// Simulate with an explicit method, overriding the configured one.
    pub fn simulate_with(
        &self,
        initial: &DetailedState,
        t_span: (f64, f64),
        n_points: usize,
        method: IntegrationMethod,
    ) -> PharmakonResult<Trajectory> {
        let (t0, t1) = t_span;
        if n_points == 0 {
            return Err(PharmakonError::Validation(
                "n_points must be at least 1".to_string(),
            ));
        }
        if !(t0.is_finite() && t1.is_finite()) {
            return Err(PharmakonError::Validation(format!(
                "time span must be finite, got ({t0}, {t1})"
            )));
        }
        if t1 < t0 {
            return Err(PharmakonError::Validation(format!(
                "time span must not run backwards, got ({t0}, {t1})"
            )));
        }
        if let Some((name, v)) = initial.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PharmakonError::Validation(format!(
                "initial value of {name} is not finite: {v}"
            )));
        }

        let system = CouplingSystem::new(initial, self.scorer.clone());
        let keys = system.keys().to_vec();
        let y0 = initial.values_for(&keys).ok_or_else(|| {
            PharmakonError::Validation("initial state lost a key while ordering".to_string())
        })?;
        let times = linspace(t0, t1, n_points);
        let config = SolverConfig {
            method,
            ..self.solver
        };

        let solution = integrate(&system, t0, &times, &y0, &config)?;
        log::debug!(
            "trajectory: {} variables, {} samples over [{t0}, {t1}], {method}: {} steps, {} rejected, {} evaluations",
            keys.len(),
            n_points,
            solution.n_steps,
            solution.n_rejected,
            solution.n_fev
        );

        Ok(Trajectory {
            keys,
            times: solution.t,
            states: solution.y,
            method,
            n_steps: solution.n_steps,
            n_rejected: solution.n_rejected,
            n_fev: solution.n_fev,
        })
    }
}
