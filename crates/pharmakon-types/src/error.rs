// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Pharmakon kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PharmakonError {
    /// A composite name with no weight vector in the table.
    #[error("unknown composite: {0}")]
    UnknownComposite(String),

    /// A weight vector whose weights do not sum to 1.0 within tolerance.
    #[error("weights for {composite} sum to {sum}, expected 1.0")]
    WeightSum { composite: String, sum: f64 },

    /// Configuration error (thresholds, solver settings, JSON).
    #[error("config error: {0}")]
    Config(String),

    /// The ODE solver failed to reach the end of the time span.
    #[error("ODE integration failed: {0}")]
    Integration(String),

    /// Invalid call arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// State file could not be read, written or parsed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type PharmakonResult<T> = Result<T, PharmakonError>;
