//! Detector configuration, loaded from a JSON file. Every key is optional.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Seconds between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    pub db_path: String,
    /// Upper bound on how long a single store call may wait on a lock.
    pub busy_timeout_ms: u64,

    // ── Feature extraction ───────────────────────────────────────
    pub min_history: usize,
    pub window: usize,

    // ── Training ─────────────────────────────────────────────────
    pub min_training_rows: usize,
    pub seed: u64,
    pub validation_fraction: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub hidden_1: usize,
    pub hidden_2: usize,

    // ── Scoring ──────────────────────────────────────────────────
    pub red_threshold: f64,
    pub inclusion_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interval_secs:       10,
            db_path:             "powerwatch.db".to_string(),
            busy_timeout_ms:     5_000,
            min_history:         3,
            window:              6,
            min_training_rows:   10,
            seed:                42,
            validation_fraction: 0.2,
            epochs:              20,
            batch_size:          32,
            learning_rate:       0.001,
            hidden_1:            64,
            hidden_2:            32,
            red_threshold:       6_000.0,
            inclusion_threshold: 3_000.0,
        }
    }
}

impl DetectorConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: DetectorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Small network, few epochs. Keeps test runs fast.
    pub fn default_test() -> Self {
        Self {
            interval_secs: 0,
            db_path: ":memory:".to_string(),
            epochs: 5,
            hidden_1: 8,
            hidden_2: 4,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn validate(&self) -> DetectorResult<()> {
        let mut problems = Vec::new();
        if self.window == 0 {
            problems.push("window must be at least 1");
        }
        if self.min_history == 0 {
            problems.push("min_history must be at least 1");
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            problems.push("validation_fraction must lie in (0, 1)");
        }
        if self.batch_size == 0 {
            problems.push("batch_size must be at least 1");
        }
        if self.hidden_1 == 0 || self.hidden_2 == 0 {
            problems.push("hidden layer widths must be at least 1");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            problems.push("learning_rate must be positive");
        }
        if self.red_threshold < self.inclusion_threshold {
            problems.push("red_threshold must not be below inclusion_threshold");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DetectorError::InvalidConfig(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{"interval_secs": 60}"#).unwrap();
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.window, 6);
        assert_eq!(config.red_threshold, 6_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_fraction_and_zero_batch() {
        let config = DetectorConfig {
            validation_fraction: 1.5,
            batch_size: 0,
            ..DetectorConfig::default()
        };
        match config.validate() {
            Err(DetectorError::InvalidConfig(msg)) => {
                assert!(msg.contains("validation_fraction"));
                assert!(msg.contains("batch_size"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }
}
