//! Display rendering of a [`Report`].
//!
//! The engine works in typed values; this module is the boundary where
//! numbers become formatted strings with units and signs. Optional blocks
//! are omitted from the serialized document when their data is unavailable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analysis::ViewAnalysis;
use crate::asymmetry::{AsymmetrySnapshot, PeakRegion};
use crate::report::Report;
use crate::temporal::{DeltaMetrics, RelativeShift};
use crate::types::Side;

const UNAVAILABLE: &str = "Unavailable";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub session_id: String,
    pub analyses: IndexMap<String, ViewDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    pub visual_summary: String,
    pub images: ImageRefs,
    pub asymmetry_report: AsymmetryReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_stats: Option<AmbientStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflammation_trend: Option<InflammationTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_delta: Option<RecoveryDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_status: Option<RecoveryStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRefs {
    pub pre: String,
    pub post: String,
    pub recovery: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryReport {
    pub baseline_asymmetry: String,
    pub hotter_side: String,
    pub peak_region: String,
    pub peak_value: String,
    pub classification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientStats {
    pub background_temp: String,
    pub relative_skin_temp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflammationTrend {
    pub asymmetry_change: String,
    pub hotter_side: String,
    pub peak_asymmetry_node: String,
    pub relative_temp_shift: String,
    pub acute_response: String,
    pub peak_intensity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryDelta {
    pub asymmetry_recovery: String,
    pub hotter_side: String,
    pub peak_recovery_node: String,
    pub relative_temp_recovery: String,
    pub lingering_hotspots: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStatus {
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a report for the display layer.
///
/// `summary_heat_threshold` is the baseline asymmetry (°C) above which the
/// visual summary calls out a heat concentration.
pub fn render_report(report: &Report, summary_heat_threshold: f64) -> ReportDocument {
    ReportDocument {
        session_id: report.session_id.clone(),
        analyses: report
            .analyses
            .iter()
            .map(|(view, analysis)| (view.clone(), render_view(analysis, summary_heat_threshold)))
            .collect(),
    }
}

pub fn render_view(analysis: &ViewAnalysis, summary_heat_threshold: f64) -> ViewDocument {
    let baseline = analysis.baseline();
    let recovery = analysis.recovery_delta.as_available();

    ViewDocument {
        visual_summary: visual_summary(analysis, summary_heat_threshold),
        images: ImageRefs {
            pre: analysis.images.pre.clone(),
            post: analysis.images.post.clone(),
            recovery: analysis.images.recovery.clone(),
        },
        asymmetry_report: asymmetry_report(analysis),
        ambient_stats: baseline.and_then(ambient_stats),
        inflammation_trend: analysis
            .inflammation_trend
            .as_available()
            .map(|delta| InflammationTrend {
                asymmetry_change: signed_celsius(delta.asymmetry_change),
                hotter_side: delta.hotter_side.label().to_string(),
                peak_asymmetry_node: peak_node(delta.peak_change.as_ref()),
                relative_temp_shift: relative_shift(&delta.relative_shift),
                acute_response: analysis
                    .rise
                    .acute_response
                    .map(|rise| format!("{} mean rise", signed_celsius(rise)))
                    .unwrap_or_else(|| UNAVAILABLE.to_string()),
                peak_intensity: analysis
                    .rise
                    .peak_intensity
                    .map(|rise| format!("{} max localized rise", signed_celsius(rise)))
                    .unwrap_or_else(|| UNAVAILABLE.to_string()),
            }),
        recovery_delta: recovery.map(|delta| recovery_block(delta, analysis)),
        recovery_status: recovery.map(|_| RecoveryStatus {
            recommendation: analysis.recommendation.text.to_string(),
        }),
    }
}

fn asymmetry_report(analysis: &ViewAnalysis) -> AsymmetryReport {
    match analysis.baseline() {
        Some(snap) => AsymmetryReport {
            baseline_asymmetry: format!("{} deviation", celsius(snap.overall)),
            hotter_side: snap.hotter_side.label().to_string(),
            peak_region: snap.peak.name.clone(),
            peak_value: celsius(snap.peak.value),
            classification: snap.classification.label().to_string(),
        },
        None => {
            let reason = analysis
                .snapshots
                .pre
                .unavailable_reason()
                .map(|r| r.describe())
                .unwrap_or_default();
            AsymmetryReport {
                baseline_asymmetry: format!("{UNAVAILABLE} ({reason})"),
                hotter_side: UNAVAILABLE.to_string(),
                peak_region: UNAVAILABLE.to_string(),
                peak_value: UNAVAILABLE.to_string(),
                classification: UNAVAILABLE.to_string(),
            }
        }
    }
}

fn ambient_stats(snap: &AsymmetrySnapshot) -> Option<AmbientStats> {
    let ambient = snap.ambient_c?;
    let relative = snap.relative_skin_temp()?;
    Some(AmbientStats {
        background_temp: celsius(ambient),
        relative_skin_temp: format!("{} vs ambient", signed_celsius(relative)),
    })
}

fn recovery_block(delta: &DeltaMetrics, analysis: &ViewAnalysis) -> RecoveryDelta {
    RecoveryDelta {
        asymmetry_recovery: signed_celsius(delta.asymmetry_change),
        hotter_side: delta.hotter_side.label().to_string(),
        peak_recovery_node: peak_node(delta.peak_change.as_ref()),
        relative_temp_recovery: relative_shift(&delta.relative_shift),
        lingering_hotspots: lingering_hotspots(analysis),
    }
}

fn lingering_hotspots(analysis: &ViewAnalysis) -> String {
    match (analysis.lingering_hotspot, analysis.rise.lingering) {
        (Some(present), Some(max)) => format!(
            "{} ({} max rise vs baseline)",
            if present { "Present" } else { "Resolved" },
            signed_celsius(max)
        ),
        _ => UNAVAILABLE.to_string(),
    }
}

fn visual_summary(analysis: &ViewAnalysis, summary_heat_threshold: f64) -> String {
    let mut summary = match analysis.baseline() {
        Some(snap) => {
            let mut s = format!(
                "Initial thermographic scan of {} shows a mean skin temperature of {}. ",
                analysis.view,
                celsius(snap.skin_mean)
            );
            if snap.overall <= summary_heat_threshold {
                s.push_str("Heat distribution is relatively uniform across both limbs.");
            } else {
                match snap.hotter_side {
                    side @ (Side::Left | Side::Right) => s.push_str(&format!(
                        "Significant baseline heat concentration detected in the {} side.",
                        side.label().to_lowercase()
                    )),
                    // Regional differences cancel out; the limbs are still not uniform.
                    Side::Balanced => s.push_str(
                        "Significant baseline asymmetry detected with opposing regional hot spots.",
                    ),
                }
            }
            s
        }
        None => format!(
            "Baseline scan of {} could not be analysed.",
            analysis.view
        ),
    };

    let missing: Vec<String> = analysis
        .unavailable_phases()
        .into_iter()
        .filter_map(|phase| {
            analysis
                .snapshots
                .get(phase)
                .unavailable_reason()
                .map(|reason| format!("{phase}: {}", reason.describe()))
        })
        .collect();
    if !missing.is_empty() {
        summary.push_str(&format!(" Unavailable phases: {}.", missing.join("; ")));
    }

    if !analysis.recovery_delta.is_available() {
        summary.push(' ');
        summary.push_str(analysis.recommendation.text);
    }
    summary
}

fn peak_node(peak: Option<&PeakRegion>) -> String {
    match peak {
        Some(peak) => format!("{} ({})", peak.name, signed_celsius(peak.value)),
        None => UNAVAILABLE.to_string(),
    }
}

fn relative_shift(shift: &RelativeShift) -> String {
    match *shift {
        RelativeShift::Percent(p) => format!("{:+.1}%", normalize_zero(p)),
        RelativeShift::BaselineNearZero(abs) => {
            format!("{} (baseline near zero)", signed_celsius(abs))
        }
    }
}

fn celsius(v: f64) -> String {
    format!("{:.2}°C", normalize_zero(v))
}

fn signed_celsius(v: f64) -> String {
    format!("{:+.2}°C", normalize_zero(v))
}

/// Values that round to zero print without a minus sign.
fn normalize_zero(v: f64) -> f64 {
    if v.abs() < 0.005 {
        0.0
    } else {
        v
    }
}
