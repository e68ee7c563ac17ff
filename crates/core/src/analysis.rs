//! Per-view analysis: snapshot each phase, derive the two temporal deltas,
//! classify the recommendation, and assemble a [`ViewAnalysis`].
//!
//! Everything here is synchronous and pure so the aggregator can run it on
//! a blocking worker thread.

use serde::Serialize;

use crate::asymmetry::{compute_snapshot, AsymmetrySnapshot};
use crate::catalog::ViewCatalog;
use crate::config::AnalysisConfig;
use crate::error::CoreError;
use crate::field::{mean_rise, peak_rise, Capture};
use crate::recommendation::{recommend, Recommendation};
use crate::segmentation::segment;
use crate::temporal::{delta_between, TemporalDelta};
use crate::types::{Availability, Phase, PhaseSet};

/// Per-cell rise statistics over the raw grids, independent of segmentation.
///
/// Each value is `None` when either grid is unavailable or the two differ in
/// shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LocalizedRise {
    /// Largest per-cell rise from pre to post.
    pub peak_intensity: Option<f64>,
    /// Mean per-cell rise from pre to post.
    pub acute_response: Option<f64>,
    /// Largest per-cell rise from pre to recovery.
    pub lingering: Option<f64>,
}

impl LocalizedRise {
    pub fn from_captures(
        captures: &PhaseSet<Result<Capture, CoreError>>,
        config: &AnalysisConfig,
    ) -> Self {
        let range = &config.skin_range;
        let (pre_post, pre_recovery) = match &captures.pre {
            Ok(pre) => (
                captures.post.as_ref().ok().map(|post| (&pre.field, &post.field)),
                captures
                    .recovery
                    .as_ref()
                    .ok()
                    .map(|recovery| (&pre.field, &recovery.field)),
            ),
            Err(_) => (None, None),
        };
        Self {
            peak_intensity: pre_post.and_then(|(a, b)| peak_rise(a, b, range)),
            acute_response: pre_post.and_then(|(a, b)| mean_rise(a, b, range)),
            lingering: pre_recovery.and_then(|(a, b)| peak_rise(a, b, range)),
        }
    }
}

/// Final per-view record. Built once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewAnalysis {
    pub view: String,
    /// Opaque image references for the display layer, passed through unchanged.
    pub images: PhaseSet<String>,
    pub snapshots: PhaseSet<Availability<AsymmetrySnapshot>>,
    /// Pre→post delta.
    pub inflammation_trend: TemporalDelta,
    /// Post→recovery delta.
    pub recovery_delta: TemporalDelta,
    pub recommendation: Recommendation,
    pub rise: LocalizedRise,
    /// Whether some cell is still warmer than baseline by more than the
    /// lingering hotspot threshold at recovery.
    pub lingering_hotspot: Option<bool>,
}

impl ViewAnalysis {
    pub fn baseline(&self) -> Option<&AsymmetrySnapshot> {
        self.snapshots.pre.as_available()
    }

    /// Phases whose snapshot could not be produced.
    pub fn unavailable_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|&p| !self.snapshots.get(p).is_available())
            .collect()
    }
}

/// Segment `capture` and compute its asymmetry snapshot.
pub fn snapshot_capture(
    capture: &Capture,
    catalog: &ViewCatalog,
    config: &AnalysisConfig,
) -> Result<AsymmetrySnapshot, CoreError> {
    let segmentation = segment(&capture.field, catalog, config)?;
    compute_snapshot(
        capture,
        &segmentation,
        &catalog.thresholds,
        &config.skin_range,
    )
}

/// Assemble a view from already-computed snapshots.
///
/// Returns `None` when every phase is unavailable: such a view is a total
/// failure and is left out of the report.
pub fn assemble_view(
    view: &str,
    images: PhaseSet<String>,
    snapshots: PhaseSet<Availability<AsymmetrySnapshot>>,
    rise: LocalizedRise,
    config: &AnalysisConfig,
) -> Option<ViewAnalysis> {
    if Phase::ALL
        .iter()
        .all(|&p| !snapshots.get(p).is_available())
    {
        return None;
    }

    let inflammation_trend = delta_between(&snapshots, Phase::Pre, Phase::Post, config.baseline_epsilon);
    let recovery_delta = delta_between(
        &snapshots,
        Phase::Post,
        Phase::Recovery,
        config.baseline_epsilon,
    );
    let baseline_overall = snapshots.pre.as_available().map(|s| s.overall);
    let recommendation = recommend(
        &recovery_delta,
        baseline_overall,
        config.recovery_concern_threshold,
    );

    Some(ViewAnalysis {
        view: view.to_string(),
        images,
        snapshots,
        inflammation_trend,
        recovery_delta,
        recommendation,
        rise,
        lingering_hotspot: rise
            .lingering
            .map(|max| max > config.lingering_hotspot_threshold),
    })
}

/// Analyse one view from its three (possibly failed) capture loads.
///
/// Phase-local failures become unavailable markers; they never abort the
/// sibling phases.
pub fn analyze_view(
    catalog: &ViewCatalog,
    captures: PhaseSet<Result<Capture, CoreError>>,
    images: PhaseSet<String>,
    config: &AnalysisConfig,
) -> Option<ViewAnalysis> {
    let snapshots = PhaseSet {
        pre: snapshot_phase(&captures.pre, catalog, config),
        post: snapshot_phase(&captures.post, catalog, config),
        recovery: snapshot_phase(&captures.recovery, catalog, config),
    };

    let rise = LocalizedRise::from_captures(&captures, config);

    assemble_view(&catalog.view, images, snapshots, rise, config)
}

fn snapshot_phase(
    capture: &Result<Capture, CoreError>,
    catalog: &ViewCatalog,
    config: &AnalysisConfig,
) -> Availability<AsymmetrySnapshot> {
    match capture {
        Ok(capture) => snapshot_capture(capture, catalog, config).into(),
        Err(err) => Err::<AsymmetrySnapshot, _>(err.clone()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::TemperatureField;
    use crate::recommendation::RecommendationCategory;
    use crate::segmentation::tests::{raw_config, two_legs};
    use crate::temporal::tests::with_overall;
    use crate::types::UnavailableReason;

    const EPS: f64 = 1e-9;

    fn images() -> PhaseSet<String> {
        PhaseSet {
            pre: "/images/001/PREWORKOUT_LEG_FRONT.png".to_string(),
            post: "/images/001/POSTWORKOUT_LEG_FRONT.png".to_string(),
            recovery: "/images/001/RECOVERY48HR_LEG_FRONT.png".to_string(),
        }
    }

    fn capture(phase: Phase, field: TemperatureField) -> Result<Capture, CoreError> {
        Ok(Capture {
            view: "LEG_FRONT".to_string(),
            phase,
            field,
        })
    }

    fn not_found(phase: Phase) -> Result<Capture, CoreError> {
        Err(CoreError::CaptureNotFound {
            session_id: "001".to_string(),
            view: "LEG_FRONT".to_string(),
            phase,
        })
    }

    /// Uniform left-leg offset: every region differs by `offset`.
    fn legs_with_offset(offset: f64) -> TemperatureField {
        two_legs(move |_| 31.0 + offset, |_| 31.0)
    }

    #[test]
    fn end_to_end_pre_post_recovery() {
        // Thresholds pinned: concern 0.2°C, classification 0.3 / 0.8.
        let config = raw_config();
        assert_eq!(config.recovery_concern_threshold, 0.2);

        let snapshots = PhaseSet {
            pre: Availability::Available(with_overall(Phase::Pre, 0.2)),
            post: Availability::Available(with_overall(Phase::Post, 0.9)),
            recovery: Availability::Available(with_overall(Phase::Recovery, 0.3)),
        };
        let view =
            assemble_view("LEG_FRONT", images(), snapshots, LocalizedRise::default(), &config)
                .unwrap();

        let trend = view.inflammation_trend.as_available().unwrap();
        assert!((trend.asymmetry_change - 0.7).abs() < EPS);
        let recovery = view.recovery_delta.as_available().unwrap();
        assert!((recovery.asymmetry_change + 0.6).abs() < EPS);

        assert_eq!(
            view.recommendation.category,
            RecommendationCategory::PartialRecovery
        );
        assert_eq!(
            view.recommendation.text,
            "Partial recovery; monitor next session."
        );
    }

    #[test]
    fn analyze_view_from_fields() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let captures = PhaseSet {
            pre: capture(Phase::Pre, legs_with_offset(0.2)),
            post: capture(Phase::Post, legs_with_offset(0.9)),
            recovery: capture(Phase::Recovery, legs_with_offset(0.1)),
        };
        let view = analyze_view(&catalog, captures, images(), &config).unwrap();

        let baseline = view.baseline().unwrap();
        assert!((baseline.overall - 0.2).abs() < EPS);
        assert!((view.rise.peak_intensity.unwrap() - 0.7).abs() < EPS);
        // Only the left leg warms up: half the plausible cells rise 0.7.
        assert!((view.rise.acute_response.unwrap() - 0.35).abs() < EPS);
        assert!(view.rise.lingering.unwrap().abs() < EPS);
        assert_eq!(view.lingering_hotspot, Some(false));
        assert_eq!(
            view.recommendation.category,
            RecommendationCategory::RecoveryNominal
        );
        assert!(view.unavailable_phases().is_empty());
    }

    #[test]
    fn missing_recovery_keeps_baseline_and_trend() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let captures = PhaseSet {
            pre: capture(Phase::Pre, legs_with_offset(0.2)),
            post: capture(Phase::Post, legs_with_offset(0.9)),
            recovery: not_found(Phase::Recovery),
        };
        let view = analyze_view(&catalog, captures, images(), &config).unwrap();

        assert!(view.baseline().is_some());
        assert!(view.inflammation_trend.is_available());
        assert!(!view.recovery_delta.is_available());
        assert_eq!(
            view.snapshots.recovery.unavailable_reason(),
            Some(&UnavailableReason::CaptureNotFound)
        );
        assert_eq!(
            view.recommendation.category,
            RecommendationCategory::InsufficientData
        );
        assert_eq!(view.unavailable_phases(), vec![Phase::Recovery]);
    }

    #[test]
    fn insufficient_signal_phase_is_contained() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let cold = TemperatureField::from_fn(40, 20, |_, _| 21.0).unwrap();
        let captures = PhaseSet {
            pre: capture(Phase::Pre, legs_with_offset(0.2)),
            post: capture(Phase::Post, cold),
            recovery: capture(Phase::Recovery, legs_with_offset(0.1)),
        };
        let view = analyze_view(&catalog, captures, images(), &config).unwrap();

        assert!(matches!(
            view.snapshots.post.unavailable_reason(),
            Some(UnavailableReason::InsufficientSignal { .. })
        ));
        assert!(!view.inflammation_trend.is_available());
        assert!(!view.recovery_delta.is_available());
        assert_eq!(view.rise.peak_intensity, None);
        assert_eq!(view.rise.acute_response, None);
        assert!(view.rise.lingering.is_some());
    }

    #[test]
    fn lingering_hotspot_above_threshold_is_flagged() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let captures = PhaseSet {
            pre: capture(Phase::Pre, legs_with_offset(0.0)),
            post: capture(Phase::Post, legs_with_offset(2.5)),
            recovery: capture(Phase::Recovery, legs_with_offset(2.0)),
        };
        let view = analyze_view(&catalog, captures, images(), &config).unwrap();

        assert!((view.rise.lingering.unwrap() - 2.0).abs() < EPS);
        assert_eq!(view.lingering_hotspot, Some(true));
    }

    #[test]
    fn lingering_hotspot_needs_baseline_and_recovery() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let captures = PhaseSet {
            pre: not_found(Phase::Pre),
            post: capture(Phase::Post, legs_with_offset(0.9)),
            recovery: capture(Phase::Recovery, legs_with_offset(2.0)),
        };
        let view = analyze_view(&catalog, captures, images(), &config).unwrap();

        assert_eq!(view.rise, LocalizedRise::default());
        assert_eq!(view.lingering_hotspot, None);
    }

    #[test]
    fn all_phases_missing_excludes_view() {
        let config = raw_config();
        let catalog = config.view("LEG_FRONT").unwrap().clone();
        let captures = PhaseSet {
            pre: not_found(Phase::Pre),
            post: not_found(Phase::Post),
            recovery: not_found(Phase::Recovery),
        };
        assert!(analyze_view(&catalog, captures, images(), &config).is_none());
    }
}
