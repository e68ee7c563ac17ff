//! Temporal deltas between two asymmetry snapshots of the same view.

use serde::Serialize;

use crate::asymmetry::{peak_by, AsymmetrySnapshot, Named, PeakRegion};
use crate::error::CoreError;
use crate::types::{Availability, Phase, PhaseSet, Side, UnavailableReason};

/// Change in overall asymmetry relative to the earlier snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RelativeShift {
    /// Signed percentage of the earlier overall asymmetry.
    Percent(f64),
    /// Earlier overall asymmetry was (near) zero; signed absolute change in °C.
    BaselineNearZero(f64),
}

/// Per-region change in absolute difference, later minus earlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionChange {
    pub name: String,
    pub change: f64,
}

impl Named for RegionChange {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaMetrics {
    pub view: String,
    pub from: Phase,
    pub to: Phase,
    pub earlier_overall: f64,
    pub later_overall: f64,
    /// `later.overall - earlier.overall`; positive means more asymmetric.
    pub asymmetry_change: f64,
    pub hotter_side: Side,
    /// Regions measurable in both snapshots, in catalog order.
    pub region_changes: Vec<RegionChange>,
    /// Region with the largest increase; `None` when no region is shared.
    pub peak_change: Option<PeakRegion>,
    pub relative_shift: RelativeShift,
}

/// A delta, or the reason it could not be computed.
pub type TemporalDelta = Availability<DeltaMetrics>;

/// Compute the delta from `earlier` to `later`.
///
/// `baseline_epsilon` is the magnitude below which the earlier overall
/// asymmetry counts as zero for the relative shift.
pub fn compute_delta(
    earlier: &AsymmetrySnapshot,
    later: &AsymmetrySnapshot,
    baseline_epsilon: f64,
) -> Result<DeltaMetrics, CoreError> {
    if earlier.view != later.view {
        return Err(CoreError::Internal(format!(
            "cannot compare snapshots of different views ({} vs {})",
            earlier.view, later.view
        )));
    }

    let asymmetry_change = later.overall - earlier.overall;

    let region_changes: Vec<RegionChange> = later
        .regions
        .iter()
        .filter_map(|l| {
            earlier.region(&l.name).map(|e| RegionChange {
                name: l.name.clone(),
                change: l.abs_diff - e.abs_diff,
            })
        })
        .collect();
    let peak_change = peak_by(&region_changes, |c| c.change);

    let relative_shift = if earlier.overall.abs() <= baseline_epsilon {
        RelativeShift::BaselineNearZero(asymmetry_change)
    } else {
        RelativeShift::Percent(asymmetry_change / earlier.overall * 100.0)
    };

    Ok(DeltaMetrics {
        view: later.view.clone(),
        from: earlier.phase,
        to: later.phase,
        earlier_overall: earlier.overall,
        later_overall: later.overall,
        asymmetry_change,
        hotter_side: later.hotter_side,
        region_changes,
        peak_change,
        relative_shift,
    })
}

/// Delta between two phases of a view, contained as unavailable when
/// either snapshot is missing.
pub fn delta_between(
    snapshots: &PhaseSet<Availability<AsymmetrySnapshot>>,
    from: Phase,
    to: Phase,
    baseline_epsilon: f64,
) -> TemporalDelta {
    match (snapshots.get(from), snapshots.get(to)) {
        (Availability::Available(earlier), Availability::Available(later)) => {
            compute_delta(earlier, later, baseline_epsilon).into()
        }
        (Availability::Unavailable(_), _) => {
            Availability::Unavailable(UnavailableReason::MissingInput { phase: from })
        }
        (_, Availability::Unavailable(_)) => {
            Availability::Unavailable(UnavailableReason::MissingInput { phase: to })
        }
    }
}
