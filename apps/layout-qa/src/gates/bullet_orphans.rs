//! Bullet-Orphan-Split gate — flags a list whose last item fell into the other column.
//!
//! # Rule
//! Bullet lines (text starting with `•`) inside the body's vertical span are
//! assigned to a column by their horizontal centre, and their vertical centre
//! is normalised to the body height. With both columns holding bullets, a page
//! is flagged iff one column has exactly 1 bullet line and the other ≥ 3, the
//! lone bullet sits at `≥ 0.65` and the other column's first bullet at `≤ 0.40`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::ContentSource;
use crate::gates::{
    require_unit_ratio, round3, scan_pages, GateKind, IgnoreSet, Violation, ViolationDetail, BULLET,
};
use crate::layout::{Column, LayoutConfig, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletThresholds {
    pub min_list_bullets: usize,
    pub min_singleton_bottom: f64,
    pub max_other_top: f64,
}

impl Default for BulletThresholds {
    fn default() -> Self {
        Self {
            min_list_bullets: 3,
            min_singleton_bottom: 0.65,
            max_other_top: 0.40,
        }
    }
}

impl BulletThresholds {
    pub fn validate(&self) -> Result<(), QaError> {
        if self.min_list_bullets < 2 {
            return Err(QaError::InvalidThreshold(format!(
                "--min-list-bullets must be >= 2, got {}",
                self.min_list_bullets
            )));
        }
        require_unit_ratio("--min-singleton-bottom", self.min_singleton_bottom)?;
        require_unit_ratio("--max-other-top", self.max_other_top)
    }
}

/// Normalised vertical centres of the bullet lines in each column, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulletPositions {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl BulletPositions {
    fn get(&self, column: Column) -> &[f64] {
        match column {
            Column::Left => &self.left,
            Column::Right => &self.right,
        }
    }
}

pub fn collect<S>(source: &S, geometry: &PageGeometry) -> Result<BulletPositions, QaError>
where
    S: ContentSource + ?Sized,
{
    let mut found = BulletPositions::default();
    for line in source.lines(geometry.page_number)? {
        if !line.text.trim_start().starts_with(BULLET) {
            continue;
        }
        if !geometry.body_rect.overlaps_vertically(&line.bbox) {
            continue;
        }
        let y = geometry.normalized_y(line.bbox.center_y());
        match geometry.column_at(line.bbox.center_x()) {
            Some(Column::Left) => found.left.push(y),
            Some(Column::Right) => found.right.push(y),
            None => {}
        }
    }
    found.left.sort_by(f64::total_cmp);
    found.right.sort_by(f64::total_cmp);
    Ok(found)
}

/// Shape of a list split across the column break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrphanSplit {
    pub singleton: Column,
    pub singleton_bottom: f64,
    pub other_top: f64,
}

/// Applies the split rule to one page's bullet positions.
pub fn classify(positions: &BulletPositions, t: &BulletThresholds) -> Option<OrphanSplit> {
    let (lc, rc) = (positions.left.len(), positions.right.len());
    if lc == 0 || rc == 0 || lc.min(rc) != 1 || lc.max(rc) < t.min_list_bullets {
        return None;
    }
    let singleton = if lc == 1 { Column::Left } else { Column::Right };
    let singleton_bottom = positions.get(singleton).last().copied()?;
    let other_top = positions.get(singleton.other()).first().copied()?;

    let split = singleton_bottom >= t.min_singleton_bottom && other_top <= t.max_other_top;
    split.then_some(OrphanSplit {
        singleton,
        singleton_bottom,
        other_top,
    })
}

pub fn check_page<S>(
    source: &S,
    geometry: &PageGeometry,
    thresholds: &BulletThresholds,
) -> Result<Option<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    let positions = collect(source, geometry)?;
    debug!(
        page = geometry.page_number,
        left = positions.left.len(),
        right = positions.right.len(),
        "bullet lines per column"
    );
    let Some(split) = classify(&positions, thresholds) else {
        return Ok(None);
    };
    let (left_bullets, right_bullets) = (positions.left.len(), positions.right.len());
    let (bottom, top) = (round3(split.singleton_bottom), round3(split.other_top));
    Ok(Some(Violation {
        page: geometry.page_number,
        gate: GateKind::BulletOrphanSplit,
        reason: format!(
            "left={left_bullets} right={right_bullets} singleton={} singleton_bottom={bottom} other_top={top}",
            split.singleton.label()
        ),
        detail: ViolationDetail::BulletOrphanSplit {
            left_bullets,
            right_bullets,
            singleton: split.singleton,
            singleton_bottom_ratio: bottom,
            other_top_ratio: top,
        },
    }))
}

pub fn run<S>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    thresholds: &BulletThresholds,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    thresholds.validate()?;
    scan_pages(source, config, ignore, |g| {
        Ok(check_page(source, g, thresholds)?.into_iter().collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dump::DumpWord;
    use crate::gates::fixtures::*;

    fn positions(left: &[f64], right: &[f64]) -> BulletPositions {
        BulletPositions {
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    /// A bullet line in `column` whose centre lies at normalised `y` (body [40,760]).
    fn bullet_line(column: Column, y: f64, block: u32) -> Vec<DumpWord> {
        let x0 = match column {
            Column::Left => 40.0,
            Column::Right => 320.0,
        };
        let y0 = 40.0 + y * 720.0 - 5.0;
        vec![
            word(x0, x0 + 6.0, y0, "•", block, 0, Some(10.0)),
            word(x0 + 12.0, x0 + 200.0, y0, "Meet de pols", block, 0, Some(10.0)),
        ]
    }

    #[test]
    fn test_split_list_flagged() {
        let mut p = page(1);
        p.words.extend(bullet_line(Column::Left, 0.80, 0));
        for (i, y) in [0.10, 0.15, 0.20, 0.25].into_iter().enumerate() {
            p.words.extend(bullet_line(Column::Right, y, i as u32 + 1));
        }
        let t = BulletThresholds::default();
        let v = run(&doc(vec![p]), &config(), &IgnoreSet::default(), &t).unwrap();
        assert_eq!(v.len(), 1);
        match &v[0].detail {
            ViolationDetail::BulletOrphanSplit {
                left_bullets,
                right_bullets,
                singleton,
                singleton_bottom_ratio,
                other_top_ratio,
            } => {
                assert_eq!((*left_bullets, *right_bullets), (1, 4));
                assert_eq!(*singleton, Column::Left);
                assert!((singleton_bottom_ratio - 0.80).abs() < 1e-3);
                assert!((other_top_ratio - 0.10).abs() < 1e-3);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_singleton_on_right() {
        let split =
            classify(&positions(&[0.05, 0.2, 0.3], &[0.9]), &BulletThresholds::default()).unwrap();
        assert_eq!(split.singleton, Column::Right);
        assert_eq!(split.other_top, 0.05);
    }

    #[test]
    fn test_singleton_high_in_column_not_flagged() {
        let t = BulletThresholds::default();
        assert!(classify(&positions(&[0.5], &[0.1, 0.2, 0.3]), &t).is_none());
    }

    #[test]
    fn test_other_list_starting_low_not_flagged() {
        let t = BulletThresholds::default();
        assert!(classify(&positions(&[0.8], &[0.5, 0.6, 0.7]), &t).is_none());
    }

    #[test]
    fn test_short_list_not_flagged() {
        assert!(classify(&positions(&[0.8], &[0.1, 0.2]), &BulletThresholds::default()).is_none());
    }

    #[test]
    fn test_single_column_list_not_flagged() {
        let t = BulletThresholds::default();
        assert!(classify(&positions(&[], &[0.1, 0.2, 0.3]), &t).is_none());
        assert!(classify(&positions(&[0.9], &[]), &BulletThresholds::default()).is_none());
    }

    #[test]
    fn test_custom_thresholds() {
        let p = positions(&[0.6], &[0.1, 0.2, 0.3]);
        assert!(classify(&p, &BulletThresholds::default()).is_none());
        let loose = BulletThresholds {
            min_singleton_bottom: 0.55,
            ..Default::default()
        };
        assert_eq!(classify(&p, &loose).unwrap().singleton, Column::Left);
        let long_lists = BulletThresholds {
            min_list_bullets: 4,
            min_singleton_bottom: 0.55,
            ..Default::default()
        };
        assert!(classify(&p, &long_lists).is_none());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let t = BulletThresholds {
            max_other_top: 1.5,
            ..Default::default()
        };
        assert!(matches!(t.validate(), Err(QaError::InvalidThreshold(_))));
        let t = BulletThresholds {
            min_list_bullets: 1,
            ..Default::default()
        };
        assert!(matches!(t.validate(), Err(QaError::InvalidThreshold(_))));
    }

    #[test]
    fn test_bullets_outside_body_ignored() {
        let mut p = page(1);
        p.words.push(word(40.0, 46.0, 770.0, "•", 0, 0, None));
        let d = doc(vec![p]);
        let g = PageGeometry::compute(1, 600.0, 800.0, &config());
        assert_eq!(collect(&d, &g).unwrap(), BulletPositions::default());
    }
}
