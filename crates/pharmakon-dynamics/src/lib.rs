// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - State Dynamics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Coupled-ODE evolution of the detailed state: a declarative coupling
//! table, explicit Runge-Kutta integrators, and a trajectory simulator
//! that samples the result at evenly spaced times.

pub mod integrator;
pub mod rules;
pub mod trajectory;

pub use integrator::{integrate, OdeSystem, Solution, RK4_DEFAULT_STEP};
pub use rules::{state_derivatives, CouplingRule, CouplingSystem, COUPLING_RULES};
pub use trajectory::{linspace, Trajectory, TrajectorySimulator};
