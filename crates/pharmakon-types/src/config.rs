// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Configuration
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PharmakonError, PharmakonResult};

/// Allowed deviation of a weight vector's sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

pub const STRESS: &str = "stress";
pub const POSITIVE: &str = "positive";
pub const BIAS_CASCADE: &str = "bias_cascade";

/// Variable name → non-negative weight.
pub type WeightVector = BTreeMap<String, f64>;

/// Named composite weight vectors.
///
/// Built once (defaults or file), validated, then shared read-only.
/// Deserializing runs the same validation as [`WeightTable::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, WeightVector>",
    into = "BTreeMap<String, WeightVector>"
)]
pub struct WeightTable {
    composites: BTreeMap<String, WeightVector>,
}

impl TryFrom<BTreeMap<String, WeightVector>> for WeightTable {
    type Error = PharmakonError;

    fn try_from(composites: BTreeMap<String, WeightVector>) -> PharmakonResult<Self> {
        Self::new(composites)
    }
}

impl From<WeightTable> for BTreeMap<String, WeightVector> {
    fn from(table: WeightTable) -> Self {
        table.composites
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let table = [
            (
                STRESS,
                &[
                    ("Fear", 0.30),
                    ("Anger", 0.20),
                    ("Cortisol", 0.25),
                    ("Sympathetic_Surge", 0.25),
                ][..],
            ),
            (
                POSITIVE,
                &[
                    ("Joy", 0.30),
                    ("Love", 0.20),
                    ("Gratitude", 0.20),
                    ("Contentment", 0.15),
                    ("Hope", 0.15),
                ][..],
            ),
            (
                BIAS_CASCADE,
                &[
                    ("Confirmation", 0.35),
                    ("Dunning_Kruger", 0.30),
                    ("Overconfidence", 0.25),
                    ("Hindsight", 0.10),
                ][..],
            ),
        ];
        let composites = table
            .iter()
            .map(|(name, weights)| {
                let vector: WeightVector =
                    weights.iter().map(|(k, w)| (k.to_string(), *w)).collect();
                (name.to_string(), vector)
            })
            .collect();
        Self { composites }
    }
}

impl WeightTable {
    /// Build and validate a table from explicit vectors.
    pub fn new(composites: BTreeMap<String, WeightVector>) -> PharmakonResult<Self> {
        let table = Self { composites };
        table.validate()?;
        Ok(table)
    }

    /// Every weight finite and non-negative, every vector summing to
    /// 1.0 within `WEIGHT_SUM_TOLERANCE`.
    pub fn validate(&self) -> PharmakonResult<()> {
        for (name, vector) in &self.composites {
            for (var, &w) in vector {
                if !w.is_finite() || w < 0.0 {
                    return Err(PharmakonError::Config(format!(
                        "weight {name}.{var} must be finite and >= 0, got {w}"
                    )));
                }
            }
            let sum: f64 = vector.values().sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(PharmakonError::WeightSum {
                    composite: name.clone(),
                    sum,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document `{composite: {variable: weight}}`.
    pub fn from_json(json: &str) -> PharmakonResult<Self> {
        let composites: BTreeMap<String, WeightVector> = serde_json::from_str(json)
            .map_err(|e| PharmakonError::Config(format!("JSON parse error: {e}")))?;
        Self::new(composites)
    }

    /// Load from a weight file. The file must exist.
    pub fn load(path: &Path) -> PharmakonResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PharmakonError::Config(format!("cannot read weights {}: {e}", path.display()))
        })?;
        let table = Self::from_json(&json)?;
        log::info!(
            "loaded {} composite weight vectors from {}",
            table.composites.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load from `path` if it exists, otherwise the built-in defaults.
    /// An existing but invalid file is an error, never a silent fallback.
    pub fn load_or_default(path: &Path) -> PharmakonResult<Self> {
        if path.exists() {
            return Self::load(path);
        }
        log::debug!(
            "no weight file at {}, using built-in composite weights",
            path.display()
        );
        Ok(Self::default())
    }

    pub fn get(&self, name: &str) -> Option<&WeightVector> {
        self.composites.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.composites.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.composites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composites.is_empty()
    }
}

/// Thresholds for the detailed-state pattern flags.
///
/// `ego_osc` and `overthink` are reserved: accepted and validated but
/// consulted by no flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Bias cascade composite must exceed this.
    pub bias_cluster: f64,
    /// Delusionality must exceed this (together with `bias_cluster`).
    pub delusionality: f64,
    pub ego_osc: f64,
    pub overthink: f64,
    /// Dogma_Fixation must exceed this for moral rigidity.
    pub dogma: f64,
    /// Narrative risk must exceed this.
    pub narrative_collapse: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            bias_cluster: 0.6,
            delusionality: 0.4,
            ego_osc: 0.6,
            overthink: 0.7,
            dogma: 0.7,
            narrative_collapse: 0.7,
        }
    }
}

impl FlagThresholds {
    pub fn validate(&self) -> PharmakonResult<()> {
        let named = [
            ("bias_cluster", self.bias_cluster),
            ("delusionality", self.delusionality),
            ("ego_osc", self.ego_osc),
            ("overthink", self.overthink),
            ("dogma", self.dogma),
            ("narrative_collapse", self.narrative_collapse),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(PharmakonError::Config(format!(
                    "{name} threshold must be in [0, 1], got {value}"
                )));
            }
        }

        let defaults = Self::default();
        if self.ego_osc != defaults.ego_osc || self.overthink != defaults.overthink {
            log::warn!(
                "ego_osc={} / overthink={} thresholds are reserved and have no effect on any flag",
                self.ego_osc,
                self.overthink
            );
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> PharmakonResult<Self> {
        let thresholds: Self = serde_json::from_str(json)
            .map_err(|e| PharmakonError::Config(format!("JSON parse error: {e}")))?;
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// Numerical method for trajectory integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Dormand-Prince 5(4), adaptive.
    #[default]
    #[serde(rename = "RK45")]
    Rk45,
    /// Bogacki-Shampine 3(2), adaptive.
    #[serde(rename = "RK23")]
    Rk23,
    /// Classical fourth order, fixed step.
    #[serde(rename = "RK4")]
    Rk4,
}

impl IntegrationMethod {
    pub fn name(self) -> &'static str {
        match self {
            IntegrationMethod::Rk45 => "RK45",
            IntegrationMethod::Rk23 => "RK23",
            IntegrationMethod::Rk4 => "RK4",
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegrationMethod {
    type Err = PharmakonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RK45" => Ok(IntegrationMethod::Rk45),
            "RK23" => Ok(IntegrationMethod::Rk23),
            "RK4" => Ok(IntegrationMethod::Rk4),
            other => Err(PharmakonError::Config(format!(
                "unsupported integration method {other:?} (expected RK45, RK23 or RK4)"
            ))),
        }
    }
}

/// Solver settings for the trajectory simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub method: IntegrationMethod,
    /// Relative tolerance (adaptive methods).
    pub rtol: f64,
    /// Absolute tolerance (adaptive methods).
    pub atol: f64,
    /// Hard cap on attempted steps before the run is declared failed.
    pub max_steps: usize,
    /// Initial step for adaptive methods, fixed step for RK4.
    /// `None` selects one automatically (0.01 for RK4).
    pub first_step: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::Rk45,
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 100_000,
            first_step: None,
        }
    }
}

impl SolverConfig {
    pub fn with_method(method: IntegrationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PharmakonResult<()> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(PharmakonError::Config(format!(
                "rtol must be > 0, got {}",
                self.rtol
            )));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(PharmakonError::Config(format!(
                "atol must be > 0, got {}",
                self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(PharmakonError::Config("max_steps must be > 0".to_string()));
        }
        if let Some(h) = self.first_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(PharmakonError::Config(format!(
                    "first_step must be > 0, got {h}"
                )));
            }
        }
        Ok(())
    }
}

/// Full kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PharmakonConfig {
    pub weights: WeightTable,
    pub flags: FlagThresholds,
    pub solver: SolverConfig,
}

impl PharmakonConfig {
    pub fn validate(&self) -> PharmakonResult<()> {
        self.weights.validate()?;
        self.flags.validate()?;
        self.solver.validate()
    }

    /// Load from JSON string. Missing sections take their defaults.
    pub fn from_json(json: &str) -> PharmakonResult<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| PharmakonError::Config(format!("JSON parse error: {e}")))?;
        let weights = match raw.weights {
            Some(composites) => WeightTable::new(composites)?,
            None => WeightTable::default(),
        };
        let config = Self {
            weights,
            flags: raw.flags,
            solver: raw.solver,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Unvalidated weights, so a bad table reports `WeightSum` rather than
/// a parse error.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    weights: Option<BTreeMap<String, WeightVector>>,
    flags: FlagThresholds,
    solver: SolverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let table = WeightTable::default();
        assert_eq!(table.len(), 3);
        for name in table.names() {
            let sum: f64 = table.get(name).unwrap().values().sum();
            assert!((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE, "{name} sums to {sum}");
        }
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_default_bias_cascade_entries() {
        let table = WeightTable::default();
        let bc = table.get(BIAS_CASCADE).unwrap();
        assert_eq!(bc["Confirmation"], 0.35);
        assert_eq!(bc["Hindsight"], 0.10);
    }

    #[test]
    fn test_weight_sum_rejected() {
        let err = WeightTable::from_json(r#"{"stress": {"Fear": 0.5, "Anger": 0.4}}"#)
            .unwrap_err();
        match err {
            PharmakonError::WeightSum { composite, sum } => {
                assert_eq!(composite, "stress");
                assert!((sum - 0.9).abs() < 1e-12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_weight_sum_within_tolerance_accepted() {
        let table = WeightTable::from_json(r#"{"x": {"A": 0.5, "B": 0.5005}}"#).unwrap();
        assert!(table.get("x").is_some());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = WeightTable::from_json(r#"{"x": {"A": 1.5, "B": -0.5}}"#).unwrap_err();
        assert!(matches!(err, PharmakonError::Config(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(WeightTable::from_json("{not json").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let table = WeightTable::load_or_default(Path::new("/nonexistent/weights.json")).unwrap();
        assert_eq!(table, WeightTable::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, r#"{"calm": {"Joy": 0.6, "Hope": 0.4}}"#).unwrap();
        let table = WeightTable::load_or_default(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("calm").unwrap()["Hope"], 0.4);
    }

    #[test]
    fn test_invalid_file_is_not_silently_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, r#"{"calm": {"Joy": 0.2}}"#).unwrap();
        assert!(WeightTable::load_or_default(&path).is_err());
    }

    #[test]
    fn test_flag_thresholds_default_valid() {
        assert!(FlagThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_flag_thresholds_partial_json() {
        let t = FlagThresholds::from_json(r#"{"dogma": 0.5}"#).unwrap();
        assert_eq!(t.dogma, 0.5);
        assert_eq!(t.narrative_collapse, 0.7);
    }

    #[test]
    fn test_flag_thresholds_out_of_range() {
        let t = FlagThresholds {
            bias_cluster: 1.2,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_reserved_thresholds_still_validate() {
        let t = FlagThresholds {
            ego_osc: 0.1,
            overthink: 0.2,
            ..Default::default()
        };
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("rk45".parse::<IntegrationMethod>().unwrap(), IntegrationMethod::Rk45);
        assert_eq!("RK23".parse::<IntegrationMethod>().unwrap(), IntegrationMethod::Rk23);
        assert_eq!(" RK4 ".parse::<IntegrationMethod>().unwrap(), IntegrationMethod::Rk4);
        assert!("LSODA".parse::<IntegrationMethod>().is_err());
        assert_eq!(IntegrationMethod::default(), IntegrationMethod::Rk45);
    }

    #[test]
    fn test_solver_validate() {
        assert!(SolverConfig::default().validate().is_ok());
        let bad = SolverConfig {
            rtol: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad_step = SolverConfig {
            first_step: Some(-0.1),
            ..Default::default()
        };
        assert!(bad_step.validate().is_err());
    }

    #[test]
    fn test_full_config_from_json() {
        let json = r#"{
            "weights": {"bias_cascade": {"Confirmation": 1.0}},
            "solver": {"method": "RK23", "rtol": 1e-6}
        }"#;
        let config = PharmakonConfig::from_json(json).unwrap();
        assert_eq!(config.solver.method, IntegrationMethod::Rk23);
        assert_eq!(config.solver.atol, 1e-6);
        assert_eq!(config.flags, FlagThresholds::default());
        assert_eq!(config.weights.len(), 1);
    }

    #[test]
    fn test_full_config_rejects_bad_weights() {
        let json = r#"{"weights": {"stress": {"Fear": 0.3}}}"#;
        assert!(matches!(
            PharmakonConfig::from_json(json),
            Err(PharmakonError::WeightSum { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates_weights() {
        let bad = r#"{"bias_cascade": {"Confirmation": 5.0}}"#;
        assert!(serde_json::from_str::<WeightTable>(bad).is_err());
        let negative = r#"{"x": {"A": 1.5, "B": -0.5}}"#;
        assert!(serde_json::from_str::<WeightTable>(negative).is_err());

        let config = r#"{"weights": {"bias_cascade": {"Confirmation": 5.0}}}"#;
        assert!(serde_json::from_str::<PharmakonConfig>(config).is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_table() {
        let json = serde_json::to_string(&WeightTable::default()).unwrap();
        let back: WeightTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WeightTable::default());
    }
}
