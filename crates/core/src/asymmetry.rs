//! Bilateral asymmetry statistics for one segmented capture.

use serde::Serialize;

use crate::catalog::{AsymmetryClass, ClassificationThresholds};
use crate::config::TemperatureRange;
use crate::error::CoreError;
use crate::field::{mean, Capture};
use crate::segmentation::{CellMask, Segmentation};
use crate::types::{Phase, Side, Timestamp};

/// Per-region left/right means. Only regions measurable on both sides appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub name: String,
    pub left_mean: f64,
    pub right_mean: f64,
    pub abs_diff: f64,
}

impl RegionStats {
    pub fn left_minus_right(&self) -> f64 {
        self.left_mean - self.right_mean
    }
}

/// A named region and the value that made it the peak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRegion {
    pub name: String,
    pub value: f64,
}

/// Asymmetry summary of a single capture.
///
/// Produced once by [`compute_snapshot`] and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsymmetrySnapshot {
    pub view: String,
    pub phase: Phase,
    /// Measurable regions, in catalog order.
    pub regions: Vec<RegionStats>,
    /// Regions with an empty left or right side after artifact exclusion.
    pub skipped_regions: Vec<String>,
    /// Mean of the per-region absolute differences.
    pub overall: f64,
    pub hotter_side: Side,
    pub peak: PeakRegion,
    pub classification: AsymmetryClass,
    /// Mean of every foreground cell, assigned or not.
    pub skin_mean: f64,
    pub ambient_c: Option<f64>,
    pub captured_at: Option<Timestamp>,
}

impl AsymmetrySnapshot {
    pub fn region(&self, name: &str) -> Option<&RegionStats> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Skin mean relative to ambient, when ambient is known.
    pub fn relative_skin_temp(&self) -> Option<f64> {
        self.ambient_c.map(|ambient| self.skin_mean - ambient)
    }
}

/// Compute the asymmetry snapshot of `capture` from its segmentation.
///
/// Fails with [`CoreError::InsufficientSignal`] when no region pair is
/// measurable on both sides.
pub fn compute_snapshot(
    capture: &Capture,
    segmentation: &Segmentation,
    thresholds: &ClassificationThresholds,
    range: &TemperatureRange,
) -> Result<AsymmetrySnapshot, CoreError> {
    let field = &capture.field;
    let side_mean = |mask: &CellMask| {
        mean(
            mask.iter()
                .map(|&i| field.cells()[i])
                .filter(|&t| range.contains(t)),
        )
    };

    let mut regions = Vec::with_capacity(segmentation.regions.len());
    let mut skipped_regions = Vec::new();
    for mask in &segmentation.regions {
        match (side_mean(&mask.left), side_mean(&mask.right)) {
            (Some(left_mean), Some(right_mean)) => regions.push(RegionStats {
                name: mask.name.clone(),
                left_mean,
                right_mean,
                abs_diff: (left_mean - right_mean).abs(),
            }),
            _ => skipped_regions.push(mask.name.clone()),
        }
    }

    let peak = peak_by(&regions, |r| r.abs_diff).ok_or(CoreError::InsufficientSignal {
        foreground_fraction: segmentation.foreground_fraction,
        required: 0.0,
    })?;

    let overall = regions.iter().map(|r| r.abs_diff).sum::<f64>() / regions.len() as f64;

    // Net signed contribution: positive means the left side runs hotter.
    let net: f64 = regions
        .iter()
        .map(|r| r.abs_diff * r.left_minus_right().signum())
        .sum();

    let skin_mean = mean(
        segmentation
            .regions
            .iter()
            .flat_map(|m| m.left.iter().chain(&m.right))
            .chain(&segmentation.unassigned)
            .map(|&i| field.cells()[i])
            .filter(|&t| range.contains(t)),
    )
    .unwrap_or(overall);

    Ok(AsymmetrySnapshot {
        view: capture.view.clone(),
        phase: capture.phase,
        regions,
        skipped_regions,
        overall,
        hotter_side: Side::from_signed(net),
        peak,
        classification: thresholds.classify(overall),
        skin_mean,
        ambient_c: field.ambient_c,
        captured_at: field.captured_at,
    })
}

/// Argmax over `items` by `key`; the first declared item wins ties.
pub(crate) fn peak_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<PeakRegion>
where
    T: Named,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = key(item);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((item, value));
        }
    }
    best.map(|(item, value)| PeakRegion {
        name: item.name().to_string(),
        value,
    })
}

pub(crate) trait Named {
    fn name(&self) -> &str;
}

impl Named for RegionStats {
    fn name(&self) -> &str {
        &self.name
    }
}
