//! Rule-based recovery recommendation.
//!
//! Pure function of the post→recovery delta (plus the pre-workout baseline
//! asymmetry it is compared against). Rules are evaluated in order and the
//! first match wins:
//!
//! 1. delta unavailable                                  → insufficient data
//! 2. asymmetry_change > 0 and > concern threshold       → continued inflammation
//! 3. asymmetry_change <= 0 and recovery <= baseline     → recovery nominal
//! 4. otherwise                                          → partial recovery

use serde::{Deserialize, Serialize};

use crate::temporal::TemporalDelta;
use crate::types::Availability;

pub const TEXT_INSUFFICIENT_DATA: &str = "Insufficient recovery data; repeat capture after 48h.";
pub const TEXT_CONTINUED_INFLAMMATION: &str =
    "Continued inflammation: asymmetry worsened during recovery. Rest and seek medical follow-up.";
pub const TEXT_RECOVERY_NOMINAL: &str = "Recovery nominal.";
pub const TEXT_PARTIAL_RECOVERY: &str = "Partial recovery; monitor next session.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    InsufficientData,
    ContinuedInflammation,
    RecoveryNominal,
    PartialRecovery,
}

impl RecommendationCategory {
    pub fn text(self) -> &'static str {
        match self {
            RecommendationCategory::InsufficientData => TEXT_INSUFFICIENT_DATA,
            RecommendationCategory::ContinuedInflammation => TEXT_CONTINUED_INFLAMMATION,
            RecommendationCategory::RecoveryNominal => TEXT_RECOVERY_NOMINAL,
            RecommendationCategory::PartialRecovery => TEXT_PARTIAL_RECOVERY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub text: &'static str,
    /// The asymmetry change that selected the rule; `None` for rule 1.
    pub trigger: Option<f64>,
}

impl Recommendation {
    fn new(category: RecommendationCategory, trigger: Option<f64>) -> Self {
        Self {
            category,
            text: category.text(),
            trigger,
        }
    }
}

/// Classify the post→recovery delta.
///
/// `baseline_overall` is the pre-workout overall asymmetry; when it is
/// unknown rule 3 cannot match.
pub fn recommend(
    recovery_delta: &TemporalDelta,
    baseline_overall: Option<f64>,
    concern_threshold: f64,
) -> Recommendation {
    let delta = match recovery_delta {
        Availability::Available(delta) => delta,
        Availability::Unavailable(_) => {
            return Recommendation::new(RecommendationCategory::InsufficientData, None)
        }
    };

    let change = delta.asymmetry_change;
    let category = if change > 0.0 && change > concern_threshold {
        RecommendationCategory::ContinuedInflammation
    } else if change <= 0.0 && baseline_overall.is_some_and(|b| delta.later_overall <= b) {
        RecommendationCategory::RecoveryNominal
    } else {
        RecommendationCategory::PartialRecovery
    };
    Recommendation::new(category, Some(change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::compute_delta;
    use crate::temporal::tests::with_overall;
    use crate::types::{Phase, UnavailableReason};

    /// Concern threshold pinned for these tests (matches the default).
    const CONCERN: f64 = 0.2;

    fn recovery_delta(post: f64, recovery: f64) -> TemporalDelta {
        let post = with_overall(Phase::Post, post);
        let recovery = with_overall(Phase::Recovery, recovery);
        Availability::Available(compute_delta(&post, &recovery, 1e-9).unwrap())
    }

    #[test]
    fn rule_1_unavailable_delta() {
        let delta: TemporalDelta = Availability::Unavailable(UnavailableReason::MissingInput {
            phase: Phase::Recovery,
        });
        let rec = recommend(&delta, Some(0.2), CONCERN);
        assert_eq!(rec.category, RecommendationCategory::InsufficientData);
        assert_eq!(rec.text, "Insufficient recovery data; repeat capture after 48h.");
        assert_eq!(rec.trigger, None);
    }

    #[test]
    fn rule_2_worsening_above_concern() {
        let rec = recommend(&recovery_delta(0.5, 0.9), Some(0.2), CONCERN);
        assert_eq!(rec.category, RecommendationCategory::ContinuedInflammation);
        assert!((rec.trigger.unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn worsening_exactly_at_concern_is_partial_recovery() {
        // Quarter-degree values keep the change exact: 0.5 - 0.25 == 0.25.
        let delta = recovery_delta(0.25, 0.5);
        assert_eq!(delta.as_available().unwrap().asymmetry_change, 0.25);

        let rec = recommend(&delta, Some(0.2), 0.25);
        assert_eq!(rec.category, RecommendationCategory::PartialRecovery);
    }

    #[test]
    fn worsening_within_concern_is_partial_recovery() {
        let rec = recommend(&recovery_delta(0.5, 0.6), Some(0.2), CONCERN);
        assert_eq!(rec.category, RecommendationCategory::PartialRecovery);
    }

    #[test]
    fn rule_3_recovered_to_baseline() {
        let rec = recommend(&recovery_delta(0.9, 0.2), Some(0.25), CONCERN);
        assert_eq!(rec.category, RecommendationCategory::RecoveryNominal);
        assert_eq!(rec.text, "Recovery nominal.");
    }

    #[test]
    fn rule_4_improved_but_above_baseline() {
        // pre 0.2, post 0.9, recovery 0.3: improving by 0.6 but 0.3 > 0.2.
        let rec = recommend(&recovery_delta(0.9, 0.3), Some(0.2), CONCERN);
        assert_eq!(rec.category, RecommendationCategory::PartialRecovery);
        assert_eq!(rec.text, "Partial recovery; monitor next session.");
        assert!((rec.trigger.unwrap() + 0.6).abs() < 1e-9);
    }

    #[test]
    fn unknown_baseline_never_reports_nominal() {
        let rec = recommend(&recovery_delta(0.9, 0.1), None, CONCERN);
        assert_eq!(rec.category, RecommendationCategory::PartialRecovery);
    }
}
