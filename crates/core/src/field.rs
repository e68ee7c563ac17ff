//! Decoded temperature fields and phase-tagged captures.

use serde::Serialize;

use crate::config::TemperatureRange;
use crate::types::{Phase, Timestamp};

/// Why a decoded grid failed basic sanity checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("grid has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("no cell lies within the plausible skin range")]
    AllArtifact,
}

/// A row-major grid of temperatures in °C.
///
/// Artifact cells (NaN or outside the plausible range) are kept in the grid
/// but excluded from every statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureField {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    pub ambient_c: Option<f64>,
    pub captured_at: Option<Timestamp>,
}

impl TemperatureField {
    /// Build a field from grid rows. Every row must have the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, FieldError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(FieldError::Empty);
        }
        let mut cells = Vec::with_capacity(width * height);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(FieldError::Ragged {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            cells.extend(values);
        }
        Ok(Self {
            width,
            height,
            cells,
            ambient_c: None,
            captured_at: None,
        })
    }

    /// Build a field by evaluating `f(row, col)` for every cell.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::Empty);
        }
        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                cells.push(f(row, col));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
            ambient_c: None,
            captured_at: None,
        })
    }

    pub fn with_ambient(mut self, ambient_c: f64) -> Self {
        self.ambient_c = Some(ambient_c);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.width + col]
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Reject grids with no plausible cell at all.
    pub fn sanity_check(&self, range: &TemperatureRange) -> Result<(), FieldError> {
        if self.cells.is_empty() {
            return Err(FieldError::Empty);
        }
        if !self.cells.iter().any(|&t| range.contains(t)) {
            return Err(FieldError::AllArtifact);
        }
        Ok(())
    }

    /// Mean of all plausible cells, or `None` when there are none.
    pub fn skin_mean(&self, range: &TemperatureRange) -> Option<f64> {
        mean(self.cells.iter().copied().filter(|&t| range.contains(t)))
    }

    /// Left/right mirror image. Metadata is preserved.
    pub fn mirrored(&self) -> Self {
        let mut cells = Vec::with_capacity(self.cells.len());
        for row in self.cells.chunks(self.width) {
            cells.extend(row.iter().rev());
        }
        Self {
            cells,
            ..self.clone()
        }
    }
}

/// Per-cell rises from `earlier` to `later`, over cells plausible in both.
///
/// `None` when the grids differ in shape.
fn cell_rises<'a>(
    earlier: &'a TemperatureField,
    later: &'a TemperatureField,
    range: &TemperatureRange,
) -> Option<impl Iterator<Item = f64> + 'a> {
    if earlier.width != later.width || earlier.height != later.height {
        return None;
    }
    let range = *range;
    Some(
        earlier
            .cells
            .iter()
            .zip(&later.cells)
            .filter(move |&(&a, &b)| range.contains(a) && range.contains(b))
            .map(|(&a, &b)| b - a),
    )
}

/// Largest per-cell rise from `earlier` to `later`, over cells plausible in both.
///
/// `None` when the grids differ in shape or share no plausible cell.
pub fn peak_rise(
    earlier: &TemperatureField,
    later: &TemperatureField,
    range: &TemperatureRange,
) -> Option<f64> {
    cell_rises(earlier, later, range)?
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))))
}

/// Mean per-cell rise from `earlier` to `later`. Same cell set as [`peak_rise`].
pub fn mean_rise(
    earlier: &TemperatureField,
    later: &TemperatureField,
    range: &TemperatureRange,
) -> Option<f64> {
    mean(cell_rises(earlier, later, range)?)
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// One temperature field tagged with its view and phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capture {
    pub view: String,
    pub phase: Phase,
    pub field: TemperatureField,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn from_rows_rejects_empty_grid() {
        assert_matches!(TemperatureField::from_rows(vec![]), Err(FieldError::Empty));
        assert_matches!(
            TemperatureField::from_rows(vec![vec![]]),
            Err(FieldError::Empty)
        );
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = TemperatureField::from_rows(vec![vec![30.0, 31.0], vec![30.0]]).unwrap_err();
        assert_eq!(
            err,
            FieldError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn sanity_check_flags_all_artifact_grid() {
        let field = TemperatureField::from_rows(vec![vec![20.0, f64::NAN], vec![45.0, 21.0]]).unwrap();
        assert_matches!(
            field.sanity_check(&TemperatureRange::default()),
            Err(FieldError::AllArtifact)
        );
    }

    #[test]
    fn skin_mean_ignores_artifacts() {
        let field = TemperatureField::from_rows(vec![vec![30.0, f64::NAN], vec![32.0, 21.0]]).unwrap();
        assert_eq!(field.skin_mean(&TemperatureRange::default()), Some(31.0));
    }

    #[test]
    fn mirrored_reverses_columns() {
        let field = TemperatureField::from_rows(vec![vec![1.0, 2.0, 3.0]])
            .unwrap()
            .with_ambient(22.0);
        let mirror = field.mirrored();
        assert_eq!(mirror.cells(), &[3.0, 2.0, 1.0]);
        assert_eq!(mirror.ambient_c, Some(22.0));
    }

    #[test]
    fn peak_rise_over_shared_plausible_cells() {
        let pre = TemperatureField::from_rows(vec![vec![30.0, 31.0, 20.0]]).unwrap();
        let post = TemperatureField::from_rows(vec![vec![32.5, 31.5, 37.0]]).unwrap();
        let rise = peak_rise(&pre, &post, &TemperatureRange::default()).unwrap();
        assert!((rise - 2.5).abs() < 1e-9);
    }

    #[test]
    fn peak_rise_requires_matching_shapes() {
        let pre = TemperatureField::from_rows(vec![vec![30.0, 31.0]]).unwrap();
        let post = TemperatureField::from_rows(vec![vec![30.0], vec![31.0]]).unwrap();
        assert_eq!(peak_rise(&pre, &post, &TemperatureRange::default()), None);
        assert_eq!(mean_rise(&pre, &post, &TemperatureRange::default()), None);
    }

    #[test]
    fn mean_rise_skips_artifact_cells() {
        // The third cell is background before the workout and is ignored.
        let pre = TemperatureField::from_rows(vec![vec![30.0, 31.0, 20.0]]).unwrap();
        let post = TemperatureField::from_rows(vec![vec![32.5, 30.5, 37.0]]).unwrap();
        let rise = mean_rise(&pre, &post, &TemperatureRange::default()).unwrap();
        assert!((rise - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rises_need_a_shared_plausible_cell() {
        let pre = TemperatureField::from_rows(vec![vec![20.0, 31.0]]).unwrap();
        let post = TemperatureField::from_rows(vec![vec![31.0, 45.0]]).unwrap();
        let range = TemperatureRange::default();
        assert_eq!(peak_rise(&pre, &post, &range), None);
        assert_eq!(mean_rise(&pre, &post, &range), None);
    }
}
