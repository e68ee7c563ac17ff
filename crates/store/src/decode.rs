//! Decoding of stored capture files.
//!
//! Grids are CSV: one line per row, comma-separated cells. A cell may carry
//! a trailing `℃` or `°C` unit. Empty or unparseable cells decode to NaN,
//! which the engine treats as an artifact.

use serde::Deserialize;
use thermoscan_core::config::TemperatureRange;
use thermoscan_core::error::CoreError;
use thermoscan_core::field::{Capture, TemperatureField};
use thermoscan_core::types::{Phase, Timestamp};

/// Optional per-capture sidecar document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CaptureMetadata {
    #[serde(default)]
    pub ambient_c: Option<f64>,
    #[serde(default)]
    pub captured_at: Option<Timestamp>,
}

/// Parse a single cell, stripping any unit suffix.
pub fn parse_cell(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let value = trimmed
        .strip_suffix('℃')
        .or_else(|| trimmed.strip_suffix("°C"))
        .unwrap_or(trimmed)
        .trim();
    value.parse().unwrap_or(f64::NAN)
}

/// Parse CSV text into grid rows. Blank lines are skipped.
pub fn parse_grid(text: &str) -> Vec<Vec<f64>> {
    text.lines()
        .map(|line| line.trim_start_matches('\u{feff}'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(parse_cell).collect())
        .collect()
}

pub fn parse_metadata(json: &str) -> Result<CaptureMetadata, serde_json::Error> {
    serde_json::from_str(json)
}

/// Decode a capture from its CSV text and optional sidecar JSON.
///
/// Ragged rows, zero dimensions, an all-artifact grid or a malformed
/// sidecar all fail with `CaptureCorrupt`.
pub fn decode_capture(
    view: &str,
    phase: Phase,
    csv: &str,
    metadata: Option<&str>,
    range: &TemperatureRange,
) -> Result<Capture, CoreError> {
    let corrupt = |reason: String| CoreError::CaptureCorrupt {
        view: view.to_string(),
        phase,
        reason,
    };

    let mut field =
        TemperatureField::from_rows(parse_grid(csv)).map_err(|e| corrupt(e.to_string()))?;
    field.sanity_check(range).map_err(|e| corrupt(e.to_string()))?;

    if let Some(json) = metadata {
        let meta = parse_metadata(json).map_err(|e| corrupt(format!("metadata sidecar: {e}")))?;
        field.ambient_c = meta.ambient_c;
        field.captured_at = meta.captured_at;
    }

    Ok(Capture {
        view: view.to_string(),
        phase,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const RANGE: TemperatureRange = TemperatureRange {
        min: 26.0,
        max: 38.0,
    };

    #[test]
    fn cells_with_units_are_parsed() {
        assert_eq!(parse_cell("31.5℃"), 31.5);
        assert_eq!(parse_cell(" 30.25 °C "), 30.25);
        assert_eq!(parse_cell("29"), 29.0);
    }

    #[test]
    fn unparseable_cells_become_artifacts() {
        assert!(parse_cell("").is_nan());
        assert!(parse_cell("n/a").is_nan());
    }

    #[test]
    fn decode_reads_grid_and_sidecar() {
        let csv = "22.0,31.0℃,31.2℃\n22.0,30.8℃,31.1℃\n\n";
        let meta = r#"{"ambient_c": 21.5, "captured_at": "2024-03-01T09:30:00Z"}"#;
        let capture = decode_capture("LEG_FRONT", Phase::Pre, csv, Some(meta), &RANGE).unwrap();

        assert_eq!(capture.field.width(), 3);
        assert_eq!(capture.field.height(), 2);
        assert_eq!(capture.field.get(1, 2), 31.1);
        assert_eq!(capture.field.ambient_c, Some(21.5));
        assert!(capture.field.captured_at.is_some());
        assert_eq!(capture.phase, Phase::Pre);
    }

    #[test]
    fn missing_sidecar_leaves_ambient_unknown() {
        let capture = decode_capture("LEG_FRONT", Phase::Post, "31.0,31.0", None, &RANGE).unwrap();
        assert_eq!(capture.field.ambient_c, None);
    }

    #[test]
    fn ragged_rows_are_corrupt() {
        let result = decode_capture("LEG_FRONT", Phase::Pre, "31,31\n31", None, &RANGE);
        assert_matches!(result, Err(CoreError::CaptureCorrupt { phase: Phase::Pre, .. }));
    }

    #[test]
    fn empty_file_is_corrupt() {
        let result = decode_capture("LEG_FRONT", Phase::Pre, "\n\n", None, &RANGE);
        assert_matches!(result, Err(CoreError::CaptureCorrupt { .. }));
    }

    #[test]
    fn all_artifact_grid_is_corrupt() {
        let result = decode_capture("LEG_FRONT", Phase::Pre, "20,21\n19,x", None, &RANGE);
        assert_matches!(result, Err(CoreError::CaptureCorrupt { .. }));
    }

    #[test]
    fn malformed_sidecar_is_corrupt() {
        let result = decode_capture("LEG_FRONT", Phase::Pre, "31,31", Some("{not json"), &RANGE);
        assert_matches!(
            result,
            Err(CoreError::CaptureCorrupt { reason, .. }) if reason.starts_with("metadata sidecar")
        );
    }
}
