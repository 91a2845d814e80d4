//! Page Geometry Model — body and column rectangles for one page.
//!
//! Coordinates use a top-left origin with y growing downward, in points.
//! Facing pages mirror their margins: odd pages are right-hand pages with the
//! inner (spine) margin on the left, even pages the other way round.

use serde::{Deserialize, Serialize};

use crate::layout::tokens::LayoutConfig;

/// Minimum body extent used when margins exceed the page.
const MIN_BODY_EXTENT: f64 = 1.0;

// ────────────────────────────────────────────────────────────────────────────
// Rect
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle `[x0, y0, x1, y1]`. Serialised as a 4-element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

impl Rect {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width, never negative.
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    /// Height, never negative.
    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    /// True when `other` shares some vertical extent with `self` (touching edges do not count).
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        other.y1 > self.y0 && other.y0 < self.y1
    }

    /// True when `other` shares some horizontal extent with `self` (touching edges do not count).
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        other.x1 > self.x0 && other.x0 < self.x1
    }

    /// Inclusive x-range membership.
    pub fn contains_x(&self, x: f64) -> bool {
        self.x0 <= x && x <= self.x1
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Columns
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
}

impl Column {
    pub const BOTH: [Column; 2] = [Column::Left, Column::Right];

    /// Short label used in failure listings.
    pub fn label(&self) -> &'static str {
        match self {
            Column::Left => "L",
            Column::Right => "R",
        }
    }

    pub fn other(&self) -> Column {
        match self {
            Column::Left => Column::Right,
            Column::Right => Column::Left,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PageGeometry
// ────────────────────────────────────────────────────────────────────────────

/// Derived geometry of one page. Cheap to recompute; never cached across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_number: u32,
    pub page_width: f64,
    pub page_height: f64,
    /// Even pages are the left-hand page of a spread.
    pub is_left_page: bool,
    pub body_rect: Rect,
    pub left_column_rect: Rect,
    pub right_column_rect: Rect,
    /// Gap actually used between the columns (configured gap clamped to half the body width).
    pub column_gap: f64,
    pub column_width: f64,
}

impl PageGeometry {
    /// Computes body and column rectangles for `page_number` (1-based).
    ///
    /// Misconfigured margins never fail: the body clamps to a 1pt minimum in
    /// each dimension (best effort).
    pub fn compute(
        page_number: u32,
        page_width: f64,
        page_height: f64,
        config: &LayoutConfig,
    ) -> Self {
        let is_left_page = page_number % 2 == 0;
        let (left_margin, right_margin) = if is_left_page {
            (config.margin_outer, config.margin_inner)
        } else {
            (config.margin_inner, config.margin_outer)
        };

        let body_x0 = left_margin;
        let body_y0 = config.margin_top;
        let body_w = (page_width - right_margin - body_x0).max(MIN_BODY_EXTENT);
        let body_h = (page_height - config.margin_bottom - body_y0).max(MIN_BODY_EXTENT);
        let body_rect = Rect::new(body_x0, body_y0, body_x0 + body_w, body_y0 + body_h);

        let column_gap = config.column_gap.min(body_w * 0.5).max(0.0);
        let column_width = ((body_w - column_gap) / 2.0).max(MIN_BODY_EXTENT);

        let left_column_rect =
            Rect::new(body_rect.x0, body_rect.y0, body_rect.x0 + column_width, body_rect.y1);
        let right_x0 = body_rect.x0 + column_width + column_gap;
        let right_column_rect =
            Rect::new(right_x0, body_rect.y0, body_rect.x1.max(right_x0), body_rect.y1);

        Self {
            page_number,
            page_width,
            page_height,
            is_left_page,
            body_rect,
            left_column_rect,
            right_column_rect,
            column_gap,
            column_width,
        }
    }

    pub fn body_height(&self) -> f64 {
        self.body_rect.height().max(MIN_BODY_EXTENT)
    }

    pub fn column_rect(&self, column: Column) -> Rect {
        match column {
            Column::Left => self.left_column_rect,
            Column::Right => self.right_column_rect,
        }
    }

    /// Column whose x-range holds `x` (inclusive). Gutter positions belong to neither.
    pub fn column_at(&self, x: f64) -> Option<Column> {
        if self.left_column_rect.contains_x(x) {
            Some(Column::Left)
        } else if self.right_column_rect.contains_x(x) {
            Some(Column::Right)
        } else {
            None
        }
    }

    /// Loose in-body test: vertical overlap with the body and horizontal centre inside it.
    /// Running headers, footers and marginalia fail it.
    pub fn in_body(&self, bbox: &Rect) -> bool {
        self.body_rect.overlaps_vertically(bbox) && self.body_rect.contains_x(bbox.center_x())
    }

    /// Clips `bbox`'s vertical extent to the body. May return an empty interval.
    pub fn clip_to_body(&self, bbox: &Rect) -> (f64, f64) {
        (bbox.y0.max(self.body_rect.y0), bbox.y1.min(self.body_rect.y1))
    }

    /// Position of `y` within the body, 0 at the top edge and 1 at the bottom.
    pub fn normalized_y(&self, y: f64) -> f64 {
        (y - self.body_rect.y0) / self.body_height()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
