//! Region pair catalogs and per-view classification thresholds.
//!
//! A catalog is immutable configuration passed explicitly into the
//! segmenter and asymmetry computer. Declaration order matters: it is the
//! tie-break order for peak-region selection and the assignment priority
//! for cells that fall inside more than one region.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::{validate_ordered, validate_unit_range};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Front view of both legs.
pub const VIEW_LEG_FRONT: &str = "LEG_FRONT";

/// Back view of both legs.
pub const VIEW_LEG_BACK: &str = "LEG_BACK";

/// Default upper bound (exclusive) of the "normal" band, in °C.
pub const DEFAULT_MILD_THRESHOLD: f64 = 0.3;

/// Default upper bound (inclusive) of the "mild asymmetry" band, in °C.
pub const DEFAULT_SIGNIFICANT_THRESHOLD: f64 = 0.8;

// ---------------------------------------------------------------------------
// Spans and regions
// ---------------------------------------------------------------------------

/// A half-open normalized interval `[start, end)`.
///
/// An `end` of `1.0` is treated as inclusive so the far edge is covered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSpan {
    pub start: f64,
    pub end: f64,
}

impl NormalizedSpan {
    pub const FULL: NormalizedSpan = NormalizedSpan {
        start: 0.0,
        end: 1.0,
    };

    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.start && (v < self.end || (self.end >= 1.0 && v <= self.end))
    }

    fn validate(&self, name: &str) -> Result<(), CoreError> {
        validate_unit_range(self.start, name)?;
        validate_unit_range(self.end, name)?;
        validate_ordered(self.start, self.end, name)
    }
}

/// A named bilateral anatomical region.
///
/// `rows` is measured top-to-bottom over the foreground bounding box;
/// `lateral` is the distance from the body midline, normalized by the
/// foreground extent on that side (0 = midline, 1 = outer edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPair {
    pub name: String,
    pub rows: NormalizedSpan,
    #[serde(default = "full_span")]
    pub lateral: NormalizedSpan,
}

fn full_span() -> NormalizedSpan {
    NormalizedSpan::FULL
}

impl RegionPair {
    pub fn new(name: impl Into<String>, rows: NormalizedSpan) -> Self {
        Self {
            name: name.into(),
            rows,
            lateral: NormalizedSpan::FULL,
        }
    }

    pub fn with_lateral(mut self, lateral: NormalizedSpan) -> Self {
        self.lateral = lateral;
        self
    }

    pub fn contains(&self, row_fraction: f64, lateral_fraction: f64) -> bool {
        self.rows.contains(row_fraction) && self.lateral.contains(lateral_fraction)
    }
}

// ---------------------------------------------------------------------------
// Classification thresholds
// ---------------------------------------------------------------------------

/// Severity label for an overall mean asymmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsymmetryClass {
    Normal,
    Mild,
    Significant,
}

impl AsymmetryClass {
    pub fn label(self) -> &'static str {
        match self {
            AsymmetryClass::Normal => "normal",
            AsymmetryClass::Mild => "mild asymmetry",
            AsymmetryClass::Significant => "significant asymmetry",
        }
    }
}

/// Threshold table for [`AsymmetryClass`].
///
/// - `Normal`: value < mild
/// - `Mild`: mild <= value <= significant
/// - `Significant`: value > significant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationThresholds {
    pub mild: f64,
    pub significant: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            mild: DEFAULT_MILD_THRESHOLD,
            significant: DEFAULT_SIGNIFICANT_THRESHOLD,
        }
    }
}

impl ClassificationThresholds {
    pub fn classify(&self, overall: f64) -> AsymmetryClass {
        if overall < self.mild {
            AsymmetryClass::Normal
        } else if overall <= self.significant {
            AsymmetryClass::Mild
        } else {
            AsymmetryClass::Significant
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.mild.is_nan() || self.mild <= 0.0 {
            return Err(CoreError::ConfigurationInvalid(format!(
                "mild threshold must be > 0, got {}",
                self.mild
            )));
        }
        validate_ordered(self.mild, self.significant, "classification thresholds")
    }
}

// ---------------------------------------------------------------------------
// View catalog
// ---------------------------------------------------------------------------

/// Region pairs and thresholds for one body view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewCatalog {
    pub view: String,
    pub regions: Vec<RegionPair>,
    #[serde(default)]
    pub thresholds: ClassificationThresholds,
}

impl ViewCatalog {
    /// Default anterior leg catalog: quadriceps, knee, shin.
    pub fn leg_front() -> Self {
        Self {
            view: VIEW_LEG_FRONT.to_string(),
            regions: vec![
                RegionPair::new("quadriceps", NormalizedSpan::new(0.0, 0.45)),
                RegionPair::new("knee", NormalizedSpan::new(0.45, 0.6)),
                RegionPair::new("shin", NormalizedSpan::new(0.6, 1.0)),
            ],
            thresholds: ClassificationThresholds::default(),
        }
    }

    /// Default posterior leg catalog: hamstrings, popliteal fossa, calf.
    pub fn leg_back() -> Self {
        Self {
            view: VIEW_LEG_BACK.to_string(),
            regions: vec![
                RegionPair::new("hamstrings", NormalizedSpan::new(0.0, 0.45)),
                RegionPair::new("popliteal", NormalizedSpan::new(0.45, 0.6)),
                RegionPair::new("calf", NormalizedSpan::new(0.6, 1.0)),
            ],
            thresholds: ClassificationThresholds::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.view.trim().is_empty() {
            return Err(CoreError::ConfigurationInvalid(
                "view name must not be empty".to_string(),
            ));
        }
        if self.regions.is_empty() {
            return Err(CoreError::ConfigurationInvalid(format!(
                "view {} must declare at least one region pair",
                self.view
            )));
        }
        for (i, region) in self.regions.iter().enumerate() {
            if region.name.trim().is_empty() {
                return Err(CoreError::ConfigurationInvalid(format!(
                    "region at index {i} of view {} must have a name",
                    self.view
                )));
            }
            if self.regions[..i].iter().any(|r| r.name == region.name) {
                return Err(CoreError::ConfigurationInvalid(format!(
                    "duplicate region '{}' in view {}",
                    region.name, self.view
                )));
            }
            region.rows.validate(&format!("{}.{}.rows", self.view, region.name))?;
            region
                .lateral
                .validate(&format!("{}.{}.lateral", self.view, region.name))?;
        }
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- classify -------------------------------------------------------------

    #[test]
    fn classify_normal_below_mild() {
        let t = ClassificationThresholds::default();
        assert_eq!(t.classify(0.29), AsymmetryClass::Normal);
    }

    #[test]
    fn classify_mild_at_lower_bound() {
        let t = ClassificationThresholds::default();
        assert_eq!(t.classify(0.3), AsymmetryClass::Mild);
    }

    #[test]
    fn classify_mild_at_upper_bound() {
        let t = ClassificationThresholds::default();
        assert_eq!(t.classify(0.8), AsymmetryClass::Mild);
    }

    #[test]
    fn classify_significant_above_upper_bound() {
        let t = ClassificationThresholds::default();
        assert_eq!(t.classify(0.81), AsymmetryClass::Significant);
    }

    #[test]
    fn classify_uses_injected_thresholds() {
        let t = ClassificationThresholds {
            mild: 0.1,
            significant: 0.2,
        };
        assert_eq!(t.classify(0.25), AsymmetryClass::Significant);
    }

    // -- spans ----------------------------------------------------------------

    #[test]
    fn span_is_half_open() {
        let span = NormalizedSpan::new(0.0, 0.45);
        assert!(span.contains(0.0));
        assert!(!span.contains(0.45));
    }

    #[test]
    fn span_ending_at_one_includes_edge() {
        assert!(NormalizedSpan::new(0.6, 1.0).contains(1.0));
    }

    // -- validation -----------------------------------------------------------

    #[test]
    fn default_catalogs_are_valid() {
        assert!(ViewCatalog::leg_front().validate().is_ok());
        assert!(ViewCatalog::leg_back().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut catalog = ViewCatalog::leg_front();
        catalog.thresholds = ClassificationThresholds {
            mild: 0.8,
            significant: 0.3,
        };
        assert_matches!(catalog.validate(), Err(CoreError::ConfigurationInvalid(_)));
    }

    #[test]
    fn rejects_duplicate_region_names() {
        let mut catalog = ViewCatalog::leg_front();
        catalog
            .regions
            .push(RegionPair::new("knee", NormalizedSpan::new(0.5, 0.7)));
        assert_matches!(catalog.validate(), Err(CoreError::ConfigurationInvalid(_)));
    }

    #[test]
    fn rejects_empty_region_list() {
        let mut catalog = ViewCatalog::leg_back();
        catalog.regions.clear();
        assert_matches!(catalog.validate(), Err(CoreError::ConfigurationInvalid(_)));
    }

    #[test]
    fn rejects_span_outside_unit_interval() {
        let mut catalog = ViewCatalog::leg_front();
        catalog.regions[0].rows = NormalizedSpan::new(-0.1, 0.4);
        assert_matches!(catalog.validate(), Err(CoreError::ConfigurationInvalid(_)));
    }
}
