// ─────────────────────────────────────────────────────────────────────
// Pharmakon Kernel - Minimal State Persistence
// ─────────────────────────────────────────────────────────────────────
//! Minimal state on disk: `{"S": .., "H": .., "B": .., "version": "0.1"}`.
//!
//! Loading goes through `MinimalState::new`, so out-of-range values in a
//! hand-edited file are clamped rather than rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PharmakonError, PharmakonResult};
use crate::state::MinimalState;

pub const STATE_FORMAT_VERSION: &str = "0.1";

#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    #[serde(rename = "S")]
    s: f64,
    #[serde(rename = "H")]
    h: f64,
    #[serde(rename = "B")]
    b: f64,
    #[serde(default = "default_version")]
    version: String,
}

fn default_version() -> String {
    STATE_FORMAT_VERSION.to_string()
}

pub fn to_json(state: &MinimalState) -> PharmakonResult<String> {
    let record = StateRecord {
        s: state.s(),
        h: state.h(),
        b: state.b(),
        version: default_version(),
    };
    serde_json::to_string_pretty(&record)
        .map_err(|e| PharmakonError::Persistence(format!("serialise state: {e}")))
}

pub fn from_json(json: &str) -> PharmakonResult<MinimalState> {
    let record: StateRecord = serde_json::from_str(json)
        .map_err(|e| PharmakonError::Persistence(format!("JSON parse error: {e}")))?;
    if record.version != STATE_FORMAT_VERSION {
        log::warn!(
            "state file version {} differs from {STATE_FORMAT_VERSION}, reading S/H/B anyway",
            record.version
        );
    }
    Ok(MinimalState::new(record.s, record.h, record.b))
}

pub fn save_state(state: &MinimalState, path: &Path) -> PharmakonResult<()> {
    let json = to_json(state)?;
    std::fs::write(path, json)
        .map_err(|e| PharmakonError::Persistence(format!("write {}: {e}", path.display())))
}

pub fn load_state(path: &Path) -> PharmakonResult<MinimalState> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| PharmakonError::Persistence(format!("read {}: {e}", path.display())))?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        // values with long binary expansions
        let state = MinimalState::new(0.1 + 0.2, 1.0 / 3.0, 0.7071067811865476);
        save_state(&state, &path).unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.s().to_bits(), state.s().to_bits());
        assert_eq!(loaded.h().to_bits(), state.h().to_bits());
        assert_eq!(loaded.b().to_bits(), state.b().to_bits());
    }

    #[test]
    fn test_version_tag_written() {
        let json = to_json(&MinimalState::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "0.1");
        assert_eq!(value["S"], 0.5);
    }

    #[test]
    fn test_load_clamps() {
        let state = from_json(r#"{"S": 1.3, "H": -0.5, "B": 0.4, "version": "0.1"}"#).unwrap();
        assert_eq!(state.s(), 1.0);
        assert_eq!(state.h(), 0.0);
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = from_json(r#"{"S": 0.3, "H": 0.5}"#).unwrap_err();
        assert!(matches!(err, PharmakonError::Persistence(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_state(Path::new("/nonexistent/state.json")).unwrap_err();
        assert!(matches!(err, PharmakonError::Persistence(_)));
    }
}
