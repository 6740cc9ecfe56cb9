//! Pass/fail thresholds for percent columns.
//!
//! A percent value is [`Verdict::Good`] when it reaches its column's
//! threshold. Columns are matched by their normalized name (trimmed,
//! lower-cased, whitespace runs collapsed), so `"Vehicle   Returned  Cleaner"`
//! and `"vehicle returned cleaner"` share a threshold.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datatype::safe_number;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Threshold for percent columns without a dedicated entry; only perfect
/// scores pass.
pub const DEFAULT_THRESHOLD: f64 = 100.0;

const BUILT_IN: [(&str, f64); 4] = [
    ("vehicle returned cleaner", 50.0),
    ("paperwork <7 minutes", 75.0),
    ("advisor provided video", 75.0),
    ("escorted to vehicle", 75.0),
];

pub fn normalize_column_name(name: &str) -> String {
    WHITESPACE.replace_all(name.trim(), " ").to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    Bad,
}

/// Inputs for drawing a percent gauge: the raw value decides the verdict,
/// the clamped one the fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentGauge {
    pub value: f64,
    pub clamped: f64,
    pub threshold: f64,
    pub verdict: Verdict,
}

/// Threshold overrides as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub default: f64,
    pub columns: HashMap<String, f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { default: DEFAULT_THRESHOLD, columns: HashMap::new() }
    }
}

#[derive(Debug, Clone)]
pub struct PresentationRules {
    default_threshold: f64,
    thresholds: HashMap<String, f64>,
}

impl Default for PresentationRules {
    fn default() -> Self {
        Self::from_config(&ThresholdConfig::default())
    }
}

impl PresentationRules {
    /// Built-in table with the configured entries layered on top.
    pub fn from_config(config: &ThresholdConfig) -> Self {
        let mut thresholds: HashMap<String, f64> =
            BUILT_IN.iter().map(|(name, t)| (name.to_string(), *t)).collect();
        for (name, threshold) in &config.columns {
            thresholds.insert(normalize_column_name(name), *threshold);
        }
        Self { default_threshold: config.default, thresholds }
    }

    pub fn threshold_for(&self, column: &str) -> f64 {
        self.thresholds
            .get(&normalize_column_name(column))
            .copied()
            .unwrap_or(self.default_threshold)
    }

    pub fn classify(&self, column: &str, value: f64) -> Verdict {
        if value >= self.threshold_for(column) { Verdict::Good } else { Verdict::Bad }
    }

    /// Gauge for a percent cell; `None` when the cell is not numeric.
    pub fn gauge(&self, column: &str, cell: &Value) -> Option<PercentGauge> {
        let value = safe_number(cell)?;
        let threshold = self.threshold_for(column);
        Some(PercentGauge {
            value,
            clamped: value.clamp(0.0, 100.0),
            threshold,
            verdict: if value >= threshold { Verdict::Good } else { Verdict::Bad },
        })
    }
}
