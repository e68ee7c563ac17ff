//! Bilateral segmentation of a temperature field.
//!
//! Foreground is every cell in the plausible skin range, optionally cleaned
//! by a morphological open/close. The body midline is the vertical split
//! that best balances foreground mass between the two halves; region pairs
//! are then laid out relative to that midline and the foreground bounding box.

use serde::Serialize;

use crate::catalog::ViewCatalog;
use crate::config::AnalysisConfig;
use crate::error::CoreError;
use crate::field::TemperatureField;

/// Cell indices (row-major) covered by one side of a region pair.
pub type CellMask = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMask {
    pub name: String,
    pub left: CellMask,
    pub right: CellMask,
}

/// Output of [`segment`]. Regions are in catalog declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    /// Split position in column units: cell `c` is left when `c + 0.5 < midline`.
    pub midline: f64,
    pub regions: Vec<RegionMask>,
    /// Foreground cells not covered by any region (or lying on the midline).
    pub unassigned: CellMask,
    pub foreground_count: usize,
    pub foreground_fraction: f64,
}

impl Segmentation {
    pub fn region(&self, name: &str) -> Option<&RegionMask> {
        self.regions.iter().find(|r| r.name == name)
    }
}

/// Partition `field` into the region pairs of `catalog`.
///
/// Fails with [`CoreError::InsufficientSignal`] when the cleaned foreground
/// covers less than `config.min_foreground_fraction` of the grid (or nothing).
pub fn segment(
    field: &TemperatureField,
    catalog: &ViewCatalog,
    config: &AnalysisConfig,
) -> Result<Segmentation, CoreError> {
    let (width, height) = (field.width(), field.height());

    let plausible: Vec<bool> = field
        .cells()
        .iter()
        .map(|&t| config.skin_range.contains(t))
        .collect();

    let foreground = if config.mask_cleanup_radius > 0 {
        let r = config.mask_cleanup_radius;
        let opened = dilate(&erode(&plausible, width, height, r), width, height, r);
        let closed = erode(&dilate(&opened, width, height, r), width, height, r);
        // Closing may bridge artifact cells; they still carry no statistic.
        closed
            .iter()
            .zip(&plausible)
            .map(|(&c, &p)| c && p)
            .collect()
    } else {
        plausible
    };

    let foreground_count = foreground.iter().filter(|&&f| f).count();
    let foreground_fraction = foreground_count as f64 / field.len() as f64;
    if foreground_count == 0 || foreground_fraction < config.min_foreground_fraction {
        return Err(CoreError::InsufficientSignal {
            foreground_fraction,
            required: config.min_foreground_fraction,
        });
    }

    let mut column_counts = vec![0usize; width];
    let (mut top, mut bottom) = (height, 0);
    let (mut min_col, mut max_col) = (width, 0);
    for (idx, _) in foreground.iter().enumerate().filter(|&(_, &f)| f) {
        let (row, col) = (idx / width, idx % width);
        column_counts[col] += 1;
        top = top.min(row);
        bottom = bottom.max(row);
        min_col = min_col.min(col);
        max_col = max_col.max(col);
    }

    let midline = balanced_midline(&column_counts);
    let left_extent = midline - min_col as f64;
    let right_extent = (max_col + 1) as f64 - midline;
    let box_height = (bottom - top + 1) as f64;

    let mut regions: Vec<RegionMask> = catalog
        .regions
        .iter()
        .map(|r| RegionMask {
            name: r.name.clone(),
            left: Vec::new(),
            right: Vec::new(),
        })
        .collect();
    let mut unassigned = Vec::new();

    for (idx, _) in foreground.iter().enumerate().filter(|&(_, &f)| f) {
        let (row, col) = (idx / width, idx % width);
        let center = col as f64 + 0.5;
        let row_fraction = ((row - top) as f64 + 0.5) / box_height;

        let (is_left, lateral) = if center < midline {
            (true, (midline - center) / left_extent)
        } else if center > midline {
            (false, (center - midline) / right_extent)
        } else {
            unassigned.push(idx);
            continue;
        };

        match catalog
            .regions
            .iter()
            .position(|r| r.contains(row_fraction, lateral))
        {
            Some(i) if is_left => regions[i].left.push(idx),
            Some(i) => regions[i].right.push(idx),
            None => unassigned.push(idx),
        }
    }

    Ok(Segmentation {
        midline,
        regions,
        unassigned,
        foreground_count,
        foreground_fraction,
    })
}

/// Find the vertical split minimising |left mass - right mass|.
///
/// Candidate splits lie on every column boundary and every column centre
/// (cells on a centre split belong to neither half). Ties form a contiguous
/// run because the imbalance is monotone; the run's midpoint is returned,
/// which keeps the result exact under left/right mirroring.
fn balanced_midline(column_counts: &[usize]) -> f64 {
    let width = column_counts.len();
    let mut prefix = Vec::with_capacity(width + 1);
    prefix.push(0usize);
    for &count in column_counts {
        prefix.push(prefix[prefix.len() - 1] + count);
    }
    let total = prefix[width];

    // Split position k/2 for k in 0..=2*width.
    let mut best = usize::MAX;
    let (mut first, mut last) = (0usize, 0usize);
    for k in 0..=2 * width {
        let left = prefix[k / 2];
        let right = total - prefix[(k + 1) / 2];
        let imbalance = left.abs_diff(right);
        if imbalance < best {
            best = imbalance;
            first = k;
            last = k;
        } else if imbalance == best {
            last = k;
        }
    }
    (first + last) as f64 / 4.0
}

fn erode(mask: &[bool], width: usize, height: usize, radius: usize) -> Vec<bool> {
    morph(mask, width, height, radius, true)
}

fn dilate(mask: &[bool], width: usize, height: usize, radius: usize) -> Vec<bool> {
    morph(mask, width, height, radius, false)
}

/// Square-kernel erosion (`all`) or dilation (`any`); out-of-bounds
/// neighbours are ignored.
fn morph(mask: &[bool], width: usize, height: usize, radius: usize, all: bool) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    for row in 0..height {
        let rows = row.saturating_sub(radius)..=(row + radius).min(height - 1);
        for col in 0..width {
            let cols = col.saturating_sub(radius)..=(col + radius).min(width - 1);
            let mut neighbours = rows
                .clone()
                .flat_map(|r| cols.clone().map(move |c| mask[r * width + c]));
            out[row * width + col] = if all {
                neighbours.all(|v| v)
            } else {
                neighbours.any(|v| v)
            };
        }
    }
    out
}
