//! Batch-select configuration.
//!
//! Defaults match the behavior tuned for touch screens; hosts can override
//! any field from JSON.

use serde::{Deserialize, Serialize};
use tbs_core::OverlapPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSelectConfig {
    /// When `false` the engine ignores all touch input.
    pub enabled: bool,
    /// Maximum gap between two taps that arm multi-select, in ms (exclusive).
    pub double_tap_window_ms: u64,
    /// Maximum per-axis distance between the two taps, in surface pixels (exclusive).
    pub double_tap_tolerance: f64,
    /// Inactivity delay before a rectangle update is recomputed, in ms.
    pub debounce_ms: u64,
    /// A release after at most this many moves counts as a tap.
    pub click_move_limit: u32,
    pub overlap: OverlapPolicy,
}

impl Default for BatchSelectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            double_tap_window_ms: 300,
            double_tap_tolerance: 20.0,
            debounce_ms: 80,
            click_move_limit: 1,
            overlap: OverlapPolicy::default(),
        }
    }
}

impl BatchSelectConfig {
    /// # Errors
    ///
    /// Returns a message when the JSON does not describe a config.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Error parsing batch-select config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = BatchSelectConfig::from_json(r#"{ "debounce_ms": 40 }"#).unwrap();
        assert_eq!(cfg.debounce_ms, 40);
        assert_eq!(cfg.double_tap_window_ms, 300);
        assert_eq!(cfg.overlap, OverlapPolicy::default());
        assert!(cfg.enabled);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = BatchSelectConfig::from_json("{ nope").unwrap_err();
        assert!(err.starts_with("Error parsing"), "got: {err}");
    }
}
