//! Page Fill gate — flags pages whose content stops well above the body bottom.
//!
//! Catches content pushed onto the next page, leaving the current page half
//! empty. Intentionally short chapter endings are handled by the ignore set,
//! not here.
//!
//! # Rule
//! - `y_max` = lowest bottom edge of in-body text blocks (area ≥ 200pt²) and images,
//!   clipped to the body bottom; starts at the body top.
//! - `used_ratio = (y_max − body_y0) / body_height`
//! - Violation iff `used_ratio < min_used` (default 0.60).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::ContentSource;
use crate::gates::{
    require_non_negative, require_unit_ratio, round1, round3, scan_pages, GateKind, IgnoreSet,
    Violation, ViolationDetail, MIN_BLOCK_AREA,
};
use crate::layout::{LayoutConfig, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFillThresholds {
    pub min_used: f64,
    pub min_block_area: f64,
}

impl Default for PageFillThresholds {
    fn default() -> Self {
        Self {
            min_used: 0.60,
            min_block_area: MIN_BLOCK_AREA,
        }
    }
}

impl PageFillThresholds {
    pub fn validate(&self) -> Result<(), QaError> {
        require_unit_ratio("--min-used", self.min_used)?;
        require_non_negative("min block area", self.min_block_area)
    }
}

/// How far down the body a page's content reaches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFillMeasure {
    pub y_max: f64,
    pub used_ratio: f64,
}

/// Measures the used height of one page. A page with no qualifying content has `used_ratio == 0`.
pub fn measure<S>(
    source: &S,
    geometry: &PageGeometry,
    min_block_area: f64,
) -> Result<PageFillMeasure, QaError>
where
    S: ContentSource + ?Sized,
{
    let page = geometry.page_number;
    let body = geometry.body_rect;
    let mut y_max = body.y0;

    for block in source.text_blocks(page)? {
        if block.bbox.area() < min_block_area || !geometry.in_body(&block.bbox) {
            continue;
        }
        y_max = y_max.max(block.bbox.y1.min(body.y1));
    }
    for image in source.images(page)? {
        if !geometry.in_body(&image.bbox) {
            continue;
        }
        y_max = y_max.max(image.bbox.y1.min(body.y1));
    }

    let used_ratio = ((y_max - body.y0) / geometry.body_height()).clamp(0.0, 1.0);
    Ok(PageFillMeasure { y_max, used_ratio })
}

/// Checks one page.
pub fn check_page<S>(
    source: &S,
    geometry: &PageGeometry,
    thresholds: &PageFillThresholds,
) -> Result<Option<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    let m = measure(source, geometry, thresholds.min_block_area)?;
    debug!(page = geometry.page_number, used_ratio = m.used_ratio, "page fill measured");

    if m.used_ratio >= thresholds.min_used {
        return Ok(None);
    }
    let body = geometry.body_rect;
    Ok(Some(Violation {
        page: geometry.page_number,
        gate: GateKind::PageFill,
        detail: ViolationDetail::PageFill {
            used_ratio: round3(m.used_ratio),
            y_max: round1(m.y_max),
            body_y0: round1(body.y0),
            body_y1: round1(body.y1),
        },
        reason: format!(
            "used={:.3} (y_max={:.1} in body [{:.1}..{:.1}])",
            m.used_ratio, m.y_max, body.y0, body.y1
        ),
    }))
}

/// Runs the gate over every non-ignored page.
pub fn run<S>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    thresholds: &PageFillThresholds,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::fixtures::*;
    use crate::gates::{IgnorePolicy, TitlePattern};

    fn no_ignore() -> IgnoreSet {
        IgnoreSet::default()
    }

    fn run_default(d: &crate::extract::LayoutDump) -> Vec<Violation> {
        run(d, &config(), &no_ignore(), &PageFillThresholds::default()).unwrap()
    }

    #[test]
    fn test_half_filled_page_flagged() {
        // body height 720; block bottom at 400 → (400−40)/720 = 0.5
        let mut p = page(1);
        p.blocks.push(block(40.0, 40.0, 280.0, 400.0, "Tekst"));
        let v = run_default(&doc(vec![p]));
        assert_eq!(v.len(), 1);
        match &v[0].detail {
            ViolationDetail::PageFill { used_ratio, .. } => {
                assert!((used_ratio - 0.5).abs() < 1e-3)
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_full_page_passes() {
        let mut p = page(1);
        p.blocks.push(block(40.0, 40.0, 280.0, 700.0, "Tekst"));
        assert!(run_default(&doc(vec![p])).is_empty());
    }

    #[test]
    fn test_empty_page_has_zero_ratio_and_is_flagged() {
        let d = doc(vec![page(1)]);
        let g = PageGeometry::compute(1, 600.0, 800.0, &config());
        let m = measure(&d, &g, MIN_BLOCK_AREA).unwrap();
        assert_eq!(m.used_ratio, 0.0);
        assert_eq!(run_default(&d).len(), 1);
    }

    #[test]
    fn test_empty_page_in_ignore_set_not_flagged() {
        let d = doc(vec![page(1), page(2)]);
        let ignore = IgnoreSet::build(
            &IgnorePolicy {
                first: 1,
                ..Default::default()
            },
            2,
            &[],
            &TitlePattern::numbered(),
        );
        let v = run(&d, &config(), &ignore, &PageFillThresholds::default()).unwrap();
        assert_eq!(v.iter().map(|v| v.page).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_image_counts_towards_used_height() {
        let mut p = page(1);
        p.blocks.push(block(40.0, 40.0, 280.0, 200.0, "Tekst"));
        p.images.push(image(310.0, 300.0, 560.0, 720.0));
        assert!(run_default(&doc(vec![p])).is_empty());
    }

    #[test]
    fn test_footer_and_noise_ignored() {
        let mut p = page(1);
        p.blocks.push(block(40.0, 40.0, 280.0, 300.0, "Tekst"));
        // running footer below body
        p.blocks.push(block(280.0, 770.0, 320.0, 790.0, "12"));
        // tiny mark inside the body: 10×10 = 100pt² < 200
        p.blocks.push(block(100.0, 740.0, 110.0, 750.0, "."));
        // whitespace-only block
        p.blocks.push(block(40.0, 600.0, 280.0, 750.0, "   "));
        assert_eq!(run_default(&doc(vec![p])).len(), 1);
    }

    #[test]
    fn test_content_clipped_to_body_bottom() {
        let mut p = page(1);
        p.blocks.push(block(40.0, 600.0, 280.0, 790.0, "Tekst"));
        let d = doc(vec![p]);
        let g = PageGeometry::compute(1, 600.0, 800.0, &config());
        let m = measure(&d, &g, MIN_BLOCK_AREA).unwrap();
        assert_eq!(m.y_max, 760.0);
        assert_eq!(m.used_ratio, 1.0);
    }

    #[test]
    fn test_invalid_min_used_rejected() {
        let t = PageFillThresholds {
            min_used: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            run(&doc(vec![]), &config(), &no_ignore(), &t),
            Err(QaError::InvalidThreshold(_))
        ));
    }
}
