// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Runge-Kutta Integrators
// ─────────────────────────────────────────────────────────────────────
//! Explicit Runge-Kutta solvers for non-stiff systems:
//!
//! - `Rk45`: Dormand-Prince 5(4), adaptive, first-same-as-last
//! - `Rk23`: Bogacki-Shampine 3(2), adaptive
//! - `Rk4`: classical fourth order, fixed step
//!
//! Adaptive step control uses the RMS norm of the local error scaled by
//! `atol + max(|y|, |y_new|)·rtol`. Steps are shortened so the solver
//! lands exactly on every requested sample time; no dense output.
//!
//! Stage buffers are allocated once per run.

use serde::{Deserialize, Serialize};

use pharmakon_types::{IntegrationMethod, PharmakonError, PharmakonResult, SolverConfig};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Step used by `Rk4` when `first_step` is unset.
pub const RK4_DEFAULT_STEP: f64 = 0.01;

/// First-order system `dy/dt = f(t, y)`.
pub trait OdeSystem {
    fn dimension(&self) -> usize;

    fn derivatives(&self, t: f64, y: &[f64], dy: &mut [f64]) -> PharmakonResult<()>;
}

/// Sampled solution plus solver counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub t: Vec<f64>,
    /// One row per sample time.
    pub y: Vec<Vec<f64>>,
    /// Accepted steps.
    pub n_steps: usize,
    /// Rejected adaptive steps.
    pub n_rejected: usize,
    /// Right-hand side evaluations.
    pub n_fev: usize,
}

impl Solution {
    fn with_capacity(samples: usize) -> Self {
        Self {
            t: Vec::with_capacity(samples),
            y: Vec::with_capacity(samples),
            ..Self::default()
        }
    }

    fn push(&mut self, t: f64, y: &[f64]) {
        self.t.push(t);
        self.y.push(y.to_vec());
    }

    fn attempts(&self) -> usize {
        self.n_steps + self.n_rejected
    }
}

/// Butcher tableau of an embedded explicit pair.
struct Tableau {
    c: &'static [f64],
    a: &'static [&'static [f64]],
    b: &'static [f64],
    /// Error weights over the stages plus the end-point derivative.
    e: &'static [f64],
    error_estimator_order: i32,
}

impl Tableau {
    fn stages(&self) -> usize {
        self.b.len()
    }
}

static DORMAND_PRINCE: Tableau = Tableau {
    c: &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0],
    a: &[
        &[],
        &[1.0 / 5.0],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
        ],
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
    e: &[
        -71.0 / 57600.0,
        0.0,
        71.0 / 16695.0,
        -71.0 / 1920.0,
        17253.0 / 339200.0,
        -22.0 / 525.0,
        1.0 / 40.0,
    ],
    error_estimator_order: 4,
};

static BOGACKI_SHAMPINE: Tableau = Tableau {
    c: &[0.0, 1.0 / 2.0, 3.0 / 4.0],
    a: &[&[], &[1.0 / 2.0], &[0.0, 3.0 / 4.0]],
    b: &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0],
    e: &[5.0 / 72.0, -1.0 / 12.0, -1.0 / 9.0, 1.0 / 8.0],
    error_estimator_order: 2,
};

fn rms(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    (values.map(|v| v * v).sum::<f64>() / n as f64).sqrt()
}

/// Distance from `t` to the next representable f64 above |t|.
fn spacing(t: f64) -> f64 {
    let a = t.abs();
    f64::from_bits(a.to_bits() + 1) - a
}

fn integration_failure(message: String) -> PharmakonError {
    log::error!("{message}");
    PharmakonError::Integration(message)
}

/// Embedded-pair stepper with pre-allocated stage storage.
struct AdaptiveStepper {
    tableau: &'static Tableau,
    rtol: f64,
    atol: f64,
    max_steps: usize,
    /// `k[0..stages]` are the stage slopes, `k[stages]` the end-point slope.
    k: Vec<Vec<f64>>,
    y_stage: Vec<f64>,
    y_new: Vec<f64>,
}

impl AdaptiveStepper {
    fn new(tableau: &'static Tableau, n: usize, config: &SolverConfig) -> Self {
        Self {
            tableau,
            rtol: config.rtol,
            atol: config.atol,
            max_steps: config.max_steps,
            k: vec![vec![0.0; n]; tableau.stages() + 1],
            y_stage: vec![0.0; n],
            y_new: vec![0.0; n],
        }
    }

    fn error_exponent(&self) -> f64 {
        -1.0 / (self.tableau.error_estimator_order as f64 + 1.0)
    }

    /// Starting step from the local scale of `y0` and its slopes.
    fn initial_step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t0: f64,
        y0: &[f64],
        f0: &[f64],
        interval: f64,
        out: &mut Solution,
    ) -> PharmakonResult<f64> {
        if interval <= 0.0 {
            return Ok(0.0);
        }
        let n = y0.len();
        let scale: Vec<f64> = y0.iter().map(|v| self.atol + v.abs() * self.rtol).collect();
        let d0 = rms(y0.iter().zip(&scale).map(|(v, s)| v / s), n);
        let d1 = rms(f0.iter().zip(&scale).map(|(v, s)| v / s), n);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        let h0 = h0.min(interval);

        for i in 0..n {
            self.y_stage[i] = y0[i] + h0 * f0[i];
        }
        system.derivatives(t0 + h0, &self.y_stage, &mut self.k[1])?;
        out.n_fev += 1;
        let d2 = rms(
            (0..n).map(|i| (self.k[1][i] - f0[i]) / scale[i]),
            n,
        ) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / (self.tableau.error_estimator_order as f64 + 1.0))
        };
        Ok((100.0 * h0).min(h1).min(interval))
    }

    /// Take one accepted step from `t` toward `t_limit`, retrying with
    /// smaller steps on rejection. On success `y` and `f` hold the new
    /// state and slope; returns the new time and the proposed next step.
    #[allow(clippy::too_many_arguments)]
    fn step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &mut Vec<f64>,
        f: &mut Vec<f64>,
        h_abs: f64,
        t_limit: f64,
        out: &mut Solution,
    ) -> PharmakonResult<(f64, f64)> {
        let tab = self.tableau;
        let stages = tab.stages();
        let n = y.len();
        let exponent = self.error_exponent();
        let min_step = 10.0 * spacing(t);
        let mut h_abs = h_abs;
        let mut rejected = false;

        loop {
            if out.attempts() >= self.max_steps {
                return Err(integration_failure(format!(
                    "maximum number of steps ({}) exceeded at t={t}",
                    self.max_steps
                )));
            }
            if h_abs < min_step {
                return Err(integration_failure(format!(
                    "required step size is less than spacing between numbers at t={t}"
                )));
            }

            let (h, t_new) = if t + h_abs >= t_limit {
                (t_limit - t, t_limit)
            } else {
                (h_abs, t + h_abs)
            };

            self.k[0].copy_from_slice(f);
            for s in 1..stages {
                for i in 0..n {
                    let acc: f64 = tab.a[s]
                        .iter()
                        .enumerate()
                        .map(|(j, a)| a * self.k[j][i])
                        .sum();
                    self.y_stage[i] = y[i] + h * acc;
                }
                system.derivatives(t + tab.c[s] * h, &self.y_stage, &mut self.k[s])?;
            }
            for i in 0..n {
                let acc: f64 = tab
                    .b
                    .iter()
                    .enumerate()
                    .map(|(j, b)| b * self.k[j][i])
                    .sum();
                self.y_new[i] = y[i] + h * acc;
            }
            system.derivatives(t_new, &self.y_new, &mut self.k[stages])?;
            out.n_fev += stages;

            let error_norm = rms(
                (0..n).map(|i| {
                    let err: f64 = tab
                        .e
                        .iter()
                        .enumerate()
                        .map(|(j, e)| e * self.k[j][i])
                        .sum::<f64>()
                        * h;
                    err / (self.atol + y[i].abs().max(self.y_new[i].abs()) * self.rtol)
                }),
                n,
            );

            if error_norm < 1.0 {
                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * error_norm.powf(exponent)).min(MAX_FACTOR)
                };
                if rejected {
                    factor = factor.min(1.0);
                }
                out.n_steps += 1;
                std::mem::swap(y, &mut self.y_new);
                std::mem::swap(f, &mut self.k[stages]);
                return Ok((t_new, h * factor));
            }

            // NaN error norms land here too and shrink by MIN_FACTOR.
            let factor = if error_norm.is_finite() {
                (SAFETY * error_norm.powf(exponent)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            h_abs = h * factor;
            rejected = true;
            out.n_rejected += 1;
        }
    }

    fn run<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t0: f64,
        t_eval: &[f64],
        y0: &[f64],
        first_step: Option<f64>,
        out: &mut Solution,
    ) -> PharmakonResult<()> {
        let mut t = t0;
        let mut y = y0.to_vec();
        let mut f = vec![0.0; y.len()];
        system.derivatives(t, &y, &mut f)?;
        out.n_fev += 1;

        let t_end = t_eval.last().copied().unwrap_or(t0);
        let mut h_abs = match first_step {
            Some(h) => h,
            None => self.initial_step(system, t, &y, &f, t_end - t0, out)?,
        };

        for &target in t_eval {
            while t < target {
                let (t_new, h_next) = self.step(system, t, &mut y, &mut f, h_abs, target, out)?;
                t = t_new;
                h_abs = h_next;
            }
            out.push(target, &y);
        }
        Ok(())
    }
}

/// Classical RK4 with a fixed step, shortened to land on each sample.
fn run_fixed<S: OdeSystem + ?Sized>(
    system: &S,
    t0: f64,
    t_eval: &[f64],
    y0: &[f64],
    config: &SolverConfig,
    out: &mut Solution,
) -> PharmakonResult<()> {
    let h = config.first_step.unwrap_or(RK4_DEFAULT_STEP);
    let n = y0.len();
    let mut t = t0;
    let mut y = y0.to_vec();
    let mut k1 = vec![0.0; n];
    let mut k2 = vec![0.0; n];
    let mut k3 = vec![0.0; n];
    let mut k4 = vec![0.0; n];
    let mut tmp = vec![0.0; n];

    for &target in t_eval {
        while t < target {
            if out.n_steps >= config.max_steps {
                return Err(integration_failure(format!(
                    "maximum number of steps ({}) exceeded at t={t}",
                    config.max_steps
                )));
            }
            let (dt, t_new) = if t + h >= target {
                (target - t, target)
            } else {
                (h, t + h)
            };
            let half = 0.5 * dt;

            system.derivatives(t, &y, &mut k1)?;
            for i in 0..n {
                tmp[i] = y[i] + half * k1[i];
            }
            system.derivatives(t + half, &tmp, &mut k2)?;
            for i in 0..n {
                tmp[i] = y[i] + half * k2[i];
            }
            system.derivatives(t + half, &tmp, &mut k3)?;
            for i in 0..n {
                tmp[i] = y[i] + dt * k3[i];
            }
            system.derivatives(t_new, &tmp, &mut k4)?;

            for i in 0..n {
                y[i] += dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
            }
            if y.iter().any(|v| !v.is_finite()) {
                return Err(integration_failure(format!(
                    "non-finite state at t={t_new}"
                )));
            }
            t = t_new;
            out.n_steps += 1;
            out.n_fev += 4;
        }
        out.push(target, &y);
    }
    Ok(())
}

/// Integrate `system` from `(t0, y0)` and sample at each `t_eval` time.
///
/// `t_eval` must be non-decreasing and start at or after `t0`.
pub fn integrate<S: OdeSystem + ?Sized>(
    system: &S,
    t0: f64,
    t_eval: &[f64],
    y0: &[f64],
    config: &SolverConfig,
) -> PharmakonResult<Solution> {
    config.validate()?;
    if system.dimension() != y0.len() {
        return Err(PharmakonError::Validation(format!(
            "initial state has {} values, system expects {}",
            y0.len(),
            system.dimension()
        )));
    }
    if !t0.is_finite() || t_eval.iter().any(|t| !t.is_finite()) {
        return Err(PharmakonError::Validation(
            "integration times must be finite".to_string(),
        ));
    }
    if t_eval.windows(2).any(|w| w[1] < w[0]) {
        return Err(PharmakonError::Validation(
            "sample times must be non-decreasing".to_string(),
        ));
    }
    if t_eval.first().is_some_and(|&t| t < t0) {
        return Err(PharmakonError::Validation(format!(
            "first sample time precedes t0={t0}"
        )));
    }

    let mut out = Solution::with_capacity(t_eval.len());
    if y0.is_empty() {
        for &t in t_eval {
            out.push(t, y0);
        }
        return Ok(out);
    }

    match config.method {
        IntegrationMethod::Rk45 => AdaptiveStepper::new(&DORMAND_PRINCE, y0.len(), config).run(
            system,
            t0,
            t_eval,
            y0,
            config.first_step,
            &mut out,
        )?,
        IntegrationMethod::Rk23 => AdaptiveStepper::new(&BOGACKI_SHAMPINE, y0.len(), config)
            .run(system, t0, t_eval, y0, config.first_step, &mut out)?,
        IntegrationMethod::Rk4 => run_fixed(system, t0, t_eval, y0, config, &mut out)?,
    }
    Ok(out)
}
