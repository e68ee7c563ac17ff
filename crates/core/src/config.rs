//! Engine-wide analysis configuration.
//!
//! Loaded once at startup (defaults, optionally overridden by a JSON
//! document) and validated before any analysis runs. A malformed table is
//! a startup failure, never a per-request one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::ViewCatalog;
use crate::error::CoreError;
use crate::threshold_validation::{validate_non_negative, validate_ordered, validate_unit_range};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Lowest plausible skin temperature in °C at room ambient.
pub const DEFAULT_SKIN_MIN_C: f64 = 26.0;

/// Highest plausible skin temperature in °C.
pub const DEFAULT_SKIN_MAX_C: f64 = 38.0;

/// Minimum share of grid cells that must be foreground for segmentation.
pub const DEFAULT_MIN_FOREGROUND_FRACTION: f64 = 0.05;

/// Radius of the square open/close kernel (2 => 5x5).
pub const DEFAULT_MASK_CLEANUP_RADIUS: usize = 2;

/// Asymmetry worsening during recovery above this (°C) is flagged.
pub const DEFAULT_RECOVERY_CONCERN_THRESHOLD: f64 = 0.2;

/// Baseline asymmetry above this (°C) is called out in the visual summary.
pub const DEFAULT_SUMMARY_HEAT_THRESHOLD: f64 = 0.5;

/// A per-cell rise from pre-workout to recovery above this (°C) is reported
/// as a lingering hotspot.
pub const DEFAULT_LINGERING_HOTSPOT_THRESHOLD: f64 = 1.5;

/// Earlier asymmetry below this magnitude (°C) is treated as a zero baseline
/// when computing relative shifts.
pub const DEFAULT_BASELINE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// TemperatureRange
// ---------------------------------------------------------------------------

/// Inclusive physiological plausibility range. Cells outside it are artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SKIN_MIN_C,
            max: DEFAULT_SKIN_MAX_C,
        }
    }
}

impl TemperatureRange {
    /// NaN never falls in range.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }
}

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub skin_range: TemperatureRange,
    pub min_foreground_fraction: f64,
    pub mask_cleanup_radius: usize,
    pub recovery_concern_threshold: f64,
    pub summary_heat_threshold: f64,
    pub lingering_hotspot_threshold: f64,
    pub baseline_epsilon: f64,
    /// Views analysed per session, in report order.
    pub views: Vec<ViewCatalog>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            skin_range: TemperatureRange::default(),
            min_foreground_fraction: DEFAULT_MIN_FOREGROUND_FRACTION,
            mask_cleanup_radius: DEFAULT_MASK_CLEANUP_RADIUS,
            recovery_concern_threshold: DEFAULT_RECOVERY_CONCERN_THRESHOLD,
            summary_heat_threshold: DEFAULT_SUMMARY_HEAT_THRESHOLD,
            lingering_hotspot_threshold: DEFAULT_LINGERING_HOTSPOT_THRESHOLD,
            baseline_epsilon: DEFAULT_BASELINE_EPSILON,
            views: vec![ViewCatalog::leg_front(), ViewCatalog::leg_back()],
        }
    }
}

impl AnalysisConfig {
    /// Parse a JSON document (missing fields take defaults) and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::ConfigurationInvalid(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn view(&self, name: &str) -> Option<&ViewCatalog> {
        self.views.iter().find(|v| v.view == name)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_ordered(self.skin_range.min, self.skin_range.max, "skin_range")?;
        validate_unit_range(self.min_foreground_fraction, "min_foreground_fraction")?;
        validate_non_negative(self.recovery_concern_threshold, "recovery_concern_threshold")?;
        validate_non_negative(self.summary_heat_threshold, "summary_heat_threshold")?;
        validate_non_negative(
            self.lingering_hotspot_threshold,
            "lingering_hotspot_threshold",
        )?;
        validate_non_negative(self.baseline_epsilon, "baseline_epsilon")?;

        if self.views.is_empty() {
            return Err(CoreError::ConfigurationInvalid(
                "at least one view catalog is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for catalog in &self.views {
            if !seen.insert(catalog.view.as_str()) {
                return Err(CoreError::ConfigurationInvalid(format!(
                    "duplicate view catalog '{}'",
                    catalog.view
                )));
            }
            catalog.validate()?;
        }
        Ok(())
    }
}
