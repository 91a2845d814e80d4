//! Per-page layout metrics for trend tracking (`report-layout`).
//!
//! Same measurements as the page-fill and column-balance gates, written for
//! every page as pretty JSON plus a one-row-per-page TSV. Never fails on
//! violations; the gate flags are informational.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::QaError;
use crate::extract::ContentSource;
use crate::gates::column_balance::{self, ColumnBalanceThresholds};
use crate::gates::page_fill::{self, PageFillThresholds};
use crate::gates::{page_geometry, round1, round3, IgnoreSet};
use crate::layout::{Column, LayoutConfig, Rect};

/// Image rectangles kept per page.
const MAX_IMAGE_RECTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub left_blocks: usize,
    pub right_blocks: usize,
    pub left_bottom: f64,
    pub right_bottom: f64,
    pub left_coverage: f64,
    pub right_coverage: f64,
    pub left_area_ratio: f64,
    pub right_area_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub count: usize,
    /// Lowest in-body image edge over the page height.
    pub ymax_ratio: f64,
    pub has_left: bool,
    pub has_right: bool,
    pub rects: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFlags {
    pub ignored: bool,
    pub pagefill_ok: bool,
    pub colbalance_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub page: u32,
    pub width_pt: f64,
    pub height_pt: f64,
    pub used_ratio: f64,
    pub text: TextStats,
    pub images: ImageStats,
    pub gates: GateFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub ignored_pages: Vec<u32>,
    pub min_used: f64,
    pub colbalance: ColumnBalanceThresholds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub pagefill_fail_pages: Vec<u32>,
    pub colbalance_fail_pages: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub pdf: String,
    pub pages_total: u32,
    pub settings: ReportSettings,
    pub summary: ReportSummary,
    pub pages: Vec<PageReport>,
}

/// Measures every page with a positive size.
pub fn build<S>(
    source: &S,
    pdf: &Path,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    fill: &PageFillThresholds,
    balance: &ColumnBalanceThresholds,
) -> Result<LayoutReport, QaError>
where
    S: ContentSource + ?Sized,
{
    fill.validate()?;
    balance.validate()?;

    let mut pages = Vec::new();
    let mut summary = ReportSummary::default();

    for page in 1..=source.page_count() {
        let Some(g) = page_geometry(source, page, config)? else {
            continue;
        };
        let fill_m = page_fill::measure(source, &g, fill.min_block_area)?;
        let cols = column_balance::measure(source, &g)?;

        let mut rects = Vec::new();
        let mut img_ymax = 0.0_f64;
        for image in source.images(page)? {
            rects.push(image.bbox);
            if g.body_rect.overlaps_vertically(&image.bbox) {
                img_ymax = img_ymax.max(image.bbox.y1.min(g.body_rect.y1));
            }
        }

        let ignored = ignore.contains(page);
        let gates = GateFlags {
            ignored,
            pagefill_ok: ignored || fill_m.used_ratio >= fill.min_used,
            colbalance_ok: ignored || column_balance::is_imbalanced(&cols, balance).is_none(),
        };
        if !gates.pagefill_ok {
            summary.pagefill_fail_pages.push(page);
        }
        if !gates.colbalance_ok {
            summary.colbalance_fail_pages.push(page);
        }

        let (l, r) = (cols.get(Column::Left), cols.get(Column::Right));
        pages.push(PageReport {
            page,
            width_pt: round1(g.page_width),
            height_pt: round1(g.page_height),
            used_ratio: round3(fill_m.used_ratio),
            text: TextStats {
                left_blocks: l.blocks,
                right_blocks: r.blocks,
                left_bottom: round3(l.bottom),
                right_bottom: round3(r.bottom),
                left_coverage: round3(l.coverage),
                right_coverage: round3(r.coverage),
                left_area_ratio: round3(l.area_ratio),
                right_area_ratio: round3(r.area_ratio),
            },
            images: ImageStats {
                count: rects.len(),
                ymax_ratio: round3(img_ymax / g.page_height),
                has_left: l.has_image,
                has_right: r.has_image,
                rects: rects.into_iter().take(MAX_IMAGE_RECTS).collect(),
            },
            gates,
        });
    }

    Ok(LayoutReport {
        pdf: pdf.display().to_string(),
        pages_total: source.page_count(),
        settings: ReportSettings {
            ignored_pages: ignore.pages().collect(),
            min_used: fill.min_used,
            colbalance: *balance,
        },
        summary,
        pages,
    })
}

const TSV_HEADER: [&str; 15] = [
    "page",
    "used_ratio",
    "text_left_blocks",
    "text_right_blocks",
    "text_left_bottom",
    "text_right_bottom",
    "text_left_coverage",
    "text_right_coverage",
    "text_left_area_ratio",
    "text_right_area_ratio",
    "images_count",
    "images_has_right",
    "pagefill_ok",
    "colbalance_ok",
    "ignored",
];

/// One TSV row, in `TSV_HEADER` order. Flags are written as 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TsvRow {
    page: u32,
    used_ratio: f64,
    text_left_blocks: usize,
    text_right_blocks: usize,
    text_left_bottom: f64,
    text_right_bottom: f64,
    text_left_coverage: f64,
    text_right_coverage: f64,
    text_left_area_ratio: f64,
    text_right_area_ratio: f64,
    images_count: usize,
    images_has_right: u8,
    pagefill_ok: u8,
    colbalance_ok: u8,
    ignored: u8,
}

impl From<&PageReport> for TsvRow {
    fn from(p: &PageReport) -> Self {
        Self {
            page: p.page,
            used_ratio: p.used_ratio,
            text_left_blocks: p.text.left_blocks,
            text_right_blocks: p.text.right_blocks,
            text_left_bottom: p.text.left_bottom,
            text_right_bottom: p.text.right_bottom,
            text_left_coverage: p.text.left_coverage,
            text_right_coverage: p.text.right_coverage,
            text_left_area_ratio: p.text.left_area_ratio,
            text_right_area_ratio: p.text.right_area_ratio,
            images_count: p.images.count,
            images_has_right: u8::from(p.images.has_right),
            pagefill_ok: u8::from(p.gates.pagefill_ok),
            colbalance_ok: u8::from(p.gates.colbalance_ok),
            ignored: u8::from(p.gates.ignored),
        }
    }
}

fn tsv_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(b'\t').has_headers(false);
    builder
}

/// Writes the header row and one row per page.
pub fn write_tsv<W: Write>(
    report: &LayoutReport,
    tsv: &mut csv::Writer<W>,
) -> Result<(), QaError> {
    tsv.write_record(TSV_HEADER)?;
    for p in &report.pages {
        tsv.serialize(TsvRow::from(p))?;
    }
    tsv.flush()?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), QaError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

/// Writes the pretty JSON and TSV files, creating parent directories.
pub fn write(report: &LayoutReport, json_path: &Path, tsv_path: &Path) -> Result<(), QaError> {
    create_parent(json_path)?;
    create_parent(tsv_path)?;

    let mut json = BufWriter::new(fs::File::create(json_path)?);
    serde_json::to_writer_pretty(&mut json, report).map_err(std::io::Error::from)?;
    json.write_all(b"\n")?;
    json.flush()?;

    let mut tsv = tsv_builder().from_path(tsv_path)?;
    write_tsv(report, &mut tsv)?;
    info!(
        json = %json_path.display(),
        tsv = %tsv_path.display(),
        pages = report.pages.len(),
        "layout report written"
    );
    Ok(())
}
