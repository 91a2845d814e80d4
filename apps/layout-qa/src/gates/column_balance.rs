//! Column Balance gate — flags pages where one of the two columns collapsed.
//!
//! Bottom reach alone is misleading (one line at the foot of a column looks
//! "95% used"), so each column is measured by the vertical coverage of its
//! text blocks.
//!
//! # Rule
//! Blocks wider than `1.10 × column_width` are spanning elements (headings)
//! and count for neither column. With `full`/`sparse` the better/worse covered
//! column, a page is flagged iff all hold:
//! - `full ≥ min_full_coverage` (0.65) and `full_blocks ≥ min_full_blocks` (4)
//! - `sparse ≤ max_sparse_coverage` (0.40) and `full − sparse ≥ min_coverage_diff` (0.25)
//! - the sparse column holds no image

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::ContentSource;
use crate::gates::{
    require_non_negative, require_unit_ratio, round3, scan_pages, GateKind, IgnoreSet, Violation,
    ViolationDetail, MIN_BLOCK_AREA,
};
use crate::layout::{coverage_ratio, Column, CoverageInterval, LayoutConfig, PageGeometry};

/// Blocks wider than this multiple of the column width span both columns.
pub const SPANNING_FACTOR: f64 = 1.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBalanceThresholds {
    pub min_full_coverage: f64,
    pub max_sparse_coverage: f64,
    pub min_coverage_diff: f64,
    pub min_full_blocks: usize,
}

impl Default for ColumnBalanceThresholds {
    fn default() -> Self {
        Self {
            min_full_coverage: 0.65,
            max_sparse_coverage: 0.40,
            min_coverage_diff: 0.25,
            min_full_blocks: 4,
        }
    }
}

impl ColumnBalanceThresholds {
    pub fn validate(&self) -> Result<(), QaError> {
        require_unit_ratio("--min-full-coverage", self.min_full_coverage)?;
        require_non_negative("--max-sparse-coverage", self.max_sparse_coverage)?;
        require_non_negative("--min-coverage-diff", self.min_coverage_diff)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement
// ────────────────────────────────────────────────────────────────────────────

/// Text and image statistics for one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub blocks: usize,
    /// Vertical coverage ratio of the column's text blocks within the body.
    pub coverage: f64,
    /// Lowest text bottom edge, normalised to the body (0 = top).
    pub bottom: f64,
    /// Summed text block area over the column area.
    pub area_ratio: f64,
    pub has_image: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeasure {
    pub left: ColumnStats,
    pub right: ColumnStats,
}

impl ColumnMeasure {
    pub fn get(&self, column: Column) -> &ColumnStats {
        match column {
            Column::Left => &self.left,
            Column::Right => &self.right,
        }
    }

    fn get_mut(&mut self, column: Column) -> &mut ColumnStats {
        match column {
            Column::Left => &mut self.left,
            Column::Right => &mut self.right,
        }
    }
}

/// Measures both columns of one page.
pub fn measure<S>(source: &S, geometry: &PageGeometry) -> Result<ColumnMeasure, QaError>
where
    S: ContentSource + ?Sized,
{
    let page = geometry.page_number;
    let body = geometry.body_rect;
    let body_h = geometry.body_height();
    let max_block_width = geometry.column_width * SPANNING_FACTOR;

    let mut measure = ColumnMeasure::default();
    let mut intervals: [Vec<CoverageInterval>; 2] = [Vec::new(), Vec::new()];
    let mut y_max = [body.y0, body.y0];
    let mut area = [0.0_f64, 0.0_f64];

    for block in source.text_blocks(page)? {
        let bbox = block.bbox;
        if bbox.area() < MIN_BLOCK_AREA || !body.overlaps_vertically(&bbox) {
            continue;
        }
        if bbox.width() > max_block_width {
            continue;
        }
        let Some(column) = geometry.column_at(bbox.center_x()) else {
            continue;
        };
        let idx = column as usize;
        measure.get_mut(column).blocks += 1;
        intervals[idx].push(geometry.clip_to_body(&bbox).into());
        y_max[idx] = y_max[idx].max(bbox.y1.min(body.y1));
        area[idx] += bbox.area();
    }

    for image in source.images(page)? {
        if !body.overlaps_vertically(&image.bbox) {
            continue;
        }
        for column in Column::BOTH {
            if geometry.column_rect(column).overlaps_horizontally(&image.bbox) {
                measure.get_mut(column).has_image = true;
            }
        }
    }

    let column_area = (geometry.column_width * body_h).max(1.0);
    for column in Column::BOTH {
        let idx = column as usize;
        let stats = measure.get_mut(column);
        stats.coverage = coverage_ratio(&intervals[idx], body_h);
        stats.bottom = geometry.normalized_y(y_max[idx]).clamp(0.0, 1.0);
        stats.area_ratio = (area[idx] / column_area).clamp(0.0, 1.0);
    }
    Ok(measure)
}

/// Applies the imbalance rule to a measurement. Returns the sparse column when flagged.
pub fn is_imbalanced(m: &ColumnMeasure, t: &ColumnBalanceThresholds) -> Option<Column> {
    let full = if m.left.coverage >= m.right.coverage {
        Column::Left
    } else {
        Column::Right
    };
    let sparse = full.other();
    let (f, s) = (m.get(full), m.get(sparse));

    let flagged = f.coverage >= t.min_full_coverage
        && f.blocks >= t.min_full_blocks
        && s.coverage <= t.max_sparse_coverage
        && (f.coverage - s.coverage) >= t.min_coverage_diff
        && !s.has_image;
    flagged.then_some(sparse)
}

pub fn check_page<S>(
    source: &S,
    geometry: &PageGeometry,
    thresholds: &ColumnBalanceThresholds,
) -> Result<Option<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    let m = measure(source, geometry)?;
    debug!(
        page = geometry.page_number,
        left_cov = m.left.coverage,
        right_cov = m.right.coverage,
        left_blocks = m.left.blocks,
        right_blocks = m.right.blocks,
        "column coverage measured"
    );

    let Some(sparse) = is_imbalanced(&m, thresholds) else {
        return Ok(None);
    };
    let full_side = sparse.other();
    Ok(Some(Violation {
        page: geometry.page_number,
        gate: GateKind::ColumnBalance,
        detail: ViolationDetail::ColumnBalance {
            full_side,
            left_coverage: round3(m.left.coverage),
            right_coverage: round3(m.right.coverage),
            left_blocks: m.left.blocks,
            right_blocks: m.right.blocks,
        },
        reason: format!(
            "left_cov={:.3} right_cov={:.3} left_blocks={} right_blocks={} full_side={:?}",
            m.left.coverage, m.right.coverage, m.left.blocks, m.right.blocks, full_side
        )
        .to_lowercase(),
    }))
}

pub fn run<S>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    thresholds: &ColumnBalanceThresholds,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    thresholds.validate()?;
    scan_pages(source, config, ignore, |g| {
        Ok(check_page(source, g, thresholds)?.into_iter().collect())
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
