//! Shared vocabulary types: capture phases, body sides, and the
//! availability wrapper used to carry contained failures through the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The time point at which a capture was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pre,
    Post,
    Recovery,
}

impl Phase {
    /// All phases in capture order.
    pub const ALL: [Phase; 3] = [Phase::Pre, Phase::Post, Phase::Recovery];

    /// File-name prefix used by the capture store for this phase.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Phase::Pre => "PREWORKOUT",
            Phase::Post => "POSTWORKOUT",
            Phase::Recovery => "RECOVERY48HR",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
            Phase::Recovery => "recovery",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSet<T> {
    pub pre: T,
    pub post: T,
    pub recovery: T,
}

impl<T> PhaseSet<T> {
    pub fn get(&self, phase: Phase) -> &T {
        match phase {
            Phase::Pre => &self.pre,
            Phase::Post => &self.post,
            Phase::Recovery => &self.recovery,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Phase, T) -> U) -> PhaseSet<U> {
        PhaseSet {
            pre: f(Phase::Pre, self.pre),
            post: f(Phase::Post, self.post),
            recovery: f(Phase::Recovery, self.recovery),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which body side carries more heat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Balanced,
}

impl Side {
    /// Side implied by the sign of a left-minus-right quantity.
    /// Exact zero is `Balanced`.
    pub fn from_signed(left_minus_right: f64) -> Self {
        if left_minus_right > 0.0 {
            Side::Left
        } else if left_minus_right < 0.0 {
            Side::Right
        } else {
            Side::Balanced
        }
    }

    pub fn mirrored(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Balanced => Side::Balanced,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
            Side::Balanced => "Balanced",
        }
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Why a phase-level value could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnavailableReason {
    CaptureNotFound,
    CaptureCorrupt { detail: String },
    InsufficientSignal { foreground_fraction: f64 },
    /// A value this one depends on is itself unavailable.
    MissingInput { phase: Phase },
    Failed { detail: String },
}

impl UnavailableReason {
    /// Translate a phase-local error into its unavailable marker.
    pub fn from_error(err: &CoreError) -> Self {
        match err {
            CoreError::CaptureNotFound { .. } => UnavailableReason::CaptureNotFound,
            CoreError::CaptureCorrupt { reason, .. } => UnavailableReason::CaptureCorrupt {
                detail: reason.clone(),
            },
            CoreError::InsufficientSignal {
                foreground_fraction,
                ..
            } => UnavailableReason::InsufficientSignal {
                foreground_fraction: *foreground_fraction,
            },
            other => UnavailableReason::Failed {
                detail: other.to_string(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            UnavailableReason::CaptureNotFound => "capture missing".to_string(),
            UnavailableReason::CaptureCorrupt { detail } => format!("capture corrupt ({detail})"),
            UnavailableReason::InsufficientSignal {
                foreground_fraction,
            } => format!(
                "insufficient skin signal ({:.1}% foreground)",
                foreground_fraction * 100.0
            ),
            UnavailableReason::MissingInput { phase } => format!("{phase} data unavailable"),
            UnavailableReason::Failed { detail } => format!("analysis failed ({detail})"),
        }
    }
}

/// A value that is either present or explicitly marked unavailable.
///
/// Absence is always carried with its reason so downstream stages can
/// propagate it instead of null-checking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable(UnavailableReason),
}

impl<T> Availability<T> {
    pub fn as_available(&self) -> Option<&T> {
        match self {
            Availability::Available(v) => Some(v),
            Availability::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn unavailable_reason(&self) -> Option<&UnavailableReason> {
        match self {
            Availability::Available(_) => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }
}

impl<T> From<Result<T, CoreError>> for Availability<T> {
    fn from(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(v) => Availability::Available(v),
            Err(err) => Availability::Unavailable(UnavailableReason::from_error(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_from_signed_zero_is_balanced() {
        assert_eq!(Side::from_signed(0.0), Side::Balanced);
        assert_eq!(Side::from_signed(0.01), Side::Left);
        assert_eq!(Side::from_signed(-0.01), Side::Right);
    }

    #[test]
    fn phase_prefixes_match_capture_naming() {
        assert_eq!(Phase::Pre.file_prefix(), "PREWORKOUT");
        assert_eq!(Phase::Post.file_prefix(), "POSTWORKOUT");
        assert_eq!(Phase::Recovery.file_prefix(), "RECOVERY48HR");
    }

    #[test]
    fn availability_from_insufficient_signal() {
        let result: Result<(), CoreError> = Err(CoreError::InsufficientSignal {
            foreground_fraction: 0.01,
            required: 0.05,
        });
        let availability = Availability::from(result);
        assert_eq!(
            availability.unavailable_reason(),
            Some(&UnavailableReason::InsufficientSignal {
                foreground_fraction: 0.01
            })
        );
    }

    #[test]
    fn availability_serializes_with_status_tag() {
        let available: Availability<u32> = Availability::Available(3);
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["value"], 3);

        let missing: Availability<u32> = Availability::Unavailable(UnavailableReason::CaptureNotFound);
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["value"]["reason"], "capture_not_found");
    }
}
