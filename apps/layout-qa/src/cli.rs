use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::gates::bullet_orphans::BulletThresholds;
use crate::gates::column_balance::ColumnBalanceThresholds;
use crate::gates::ignore::DEFAULT_CHAPTER_PATTERN;
use crate::gates::page_fill::PageFillThresholds;
use crate::gates::{IgnorePolicy, MIN_BLOCK_AREA};

/// Extension the extraction step gives the layout dump next to the PDF.
pub const DUMP_EXTENSION: &str = "layout.json";

#[derive(Parser, Debug)]
#[command(name = "layout-qa", version, about = "Layout QA gates for two-column book PDFs")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Document and page selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Rendered PDF, or a layout dump (`*.json`) directly.
    pub pdf: PathBuf,
    /// Layout dump produced by the extraction step [default: <pdf>.layout.json]
    #[arg(long)]
    pub content: Option<PathBuf>,
    /// Layout tokens CSS [default: $LAYOUT_TOKENS or templates/prince-af-two-column.tokens.css]
    #[arg(long)]
    pub tokens: Option<PathBuf>,
    /// Ignore the page before every top-level bookmark (short chapter endings)
    #[arg(long)]
    pub ignore_before_level1: bool,
    /// Ignore every page before the first numbered chapter bookmark
    #[arg(long)]
    pub ignore_before_first_chapter: bool,
    /// Regex a top-level bookmark title must match to count as a chapter
    #[arg(long, default_value = DEFAULT_CHAPTER_PATTERN)]
    pub chapter_pattern: String,
}

impl Target {
    pub fn is_dump(&self) -> bool {
        self.pdf.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }

    /// Where the layout dump lives: `--content`, the positional path itself,
    /// or `<pdf>.layout.json`.
    pub fn content_path(&self) -> PathBuf {
        if let Some(content) = &self.content {
            return content.clone();
        }
        if self.is_dump() {
            return self.pdf.clone();
        }
        self.pdf.with_extension(DUMP_EXTENSION)
    }

    pub fn policy(&self, first: u32, last: u32) -> IgnorePolicy {
        IgnorePolicy {
            first,
            last,
            before_level1: self.ignore_before_level1,
            before_first_chapter: self.ignore_before_first_chapter,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fail when a page's content ends well above the body bottom
    PageFill {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 2)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        #[command(flatten)]
        fill: FillArgs,
    },
    /// Fail when one column collapsed while the other is full
    ColumnBalance {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 2)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        #[command(flatten)]
        balance: BalanceArgs,
    },
    /// Fail on justified lines with extreme inter-word gaps
    JustifyGaps {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 2)]
        ignore_first: u32,
        #[arg(long, default_value_t = 1)]
        ignore_last: u32,
        #[arg(long, default_value_t = 18.0)]
        max_gap_pt: f64,
        /// Limit for the first line of praktijk/verdieping boxes
        #[arg(long, default_value_t = 12.0)]
        box_max_gap_pt: f64,
        #[arg(long, default_value_t = 0.85)]
        min_span_ratio: f64,
    },
    /// Fail on words hyphenated across heading-sized lines
    HeadingHyphenation {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        /// Heading threshold: body size + delta
        #[arg(long, default_value_t = 1.5)]
        delta_pt: f64,
    },
    /// Fail when a list's lone item was split off into the other column
    BulletOrphans {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        #[command(flatten)]
        bullets: BulletArgs,
    },
    /// Report line-break hyphenations the language patterns do not allow
    Hyphenation {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        /// Hyphenation pattern file (.dic) [default: $HYPHEN_DICT]
        #[arg(long)]
        dict: Option<PathBuf>,
        /// Exit with 2 when invalid breaks are found
        #[arg(long)]
        fatal: bool,
    },
    /// Write per-page layout metrics as JSON and TSV
    ReportLayout {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 2)]
        ignore_first: u32,
        #[arg(long, default_value_t = 0)]
        ignore_last: u32,
        #[arg(long)]
        out_json: PathBuf,
        #[arg(long)]
        out_tsv: PathBuf,
        #[command(flatten)]
        fill: FillArgs,
        #[command(flatten)]
        balance: BalanceArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct FillArgs {
    /// Minimum used body height ratio
    #[arg(long, default_value_t = 0.60)]
    pub min_used: f64,
}

impl From<FillArgs> for PageFillThresholds {
    fn from(a: FillArgs) -> Self {
        PageFillThresholds {
            min_used: a.min_used,
            min_block_area: MIN_BLOCK_AREA,
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct BalanceArgs {
    #[arg(long, default_value_t = 0.65)]
    pub min_full_coverage: f64,
    #[arg(long, default_value_t = 0.40)]
    pub max_sparse_coverage: f64,
    #[arg(long, default_value_t = 0.25)]
    pub min_coverage_diff: f64,
    #[arg(long, default_value_t = 4)]
    pub min_full_blocks: usize,
}

impl From<BalanceArgs> for ColumnBalanceThresholds {
    fn from(a: BalanceArgs) -> Self {
        ColumnBalanceThresholds {
            min_full_coverage: a.min_full_coverage,
            max_sparse_coverage: a.max_sparse_coverage,
            min_coverage_diff: a.min_coverage_diff,
            min_full_blocks: a.min_full_blocks,
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct BulletArgs {
    /// Bullet lines the fuller column needs to count as a list
    #[arg(long, default_value_t = 3)]
    pub min_list_bullets: usize,
    /// Lowest normalised position of the lone bullet
    #[arg(long, default_value_t = 0.65)]
    pub min_singleton_bottom: f64,
    /// Highest normalised position of the other column's first bullet
    #[arg(long, default_value_t = 0.40)]
    pub max_other_top: f64,
}

impl From<BulletArgs> for BulletThresholds {
    fn from(a: BulletArgs) -> Self {
        BulletThresholds {
            min_list_bullets: a.min_list_bullets,
            min_singleton_bottom: a.min_singleton_bottom,
            max_other_top: a.max_other_top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_per_gate_ignore_defaults() {
        let cli = Cli::try_parse_from(["layout-qa", "justify-gaps", "boek.pdf"]).unwrap();
        match cli.command {
            Command::JustifyGaps {
                ignore_first,
                ignore_last,
                max_gap_pt,
                ..
            } => assert_eq!((ignore_first, ignore_last, max_gap_pt), (2, 1, 18.0)),
            other => panic!("unexpected command {other:?}"),
        }
        let cli = Cli::try_parse_from(["layout-qa", "bullet-orphans", "boek.pdf"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::BulletOrphans {
                ignore_first: 0,
                ignore_last: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_content_path_resolution() {
        let cli =
            Cli::try_parse_from(["layout-qa", "page-fill", "out/boek.pdf", "--json"]).unwrap();
        assert!(cli.json);
        let Command::PageFill { target, .. } = cli.command else {
            panic!("expected page-fill");
        };
        assert_eq!(target.content_path(), PathBuf::from("out/boek.layout.json"));
        assert_eq!(target.chapter_pattern, DEFAULT_CHAPTER_PATTERN);

        let cli = Cli::try_parse_from(["layout-qa", "page-fill", "dump.json"]).unwrap();
        let Command::PageFill { target, .. } = cli.command else {
            panic!("expected page-fill");
        };
        assert!(target.is_dump());
        assert_eq!(target.content_path(), PathBuf::from("dump.json"));

        let args = ["layout-qa", "page-fill", "boek.pdf", "--content", "x/d.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::PageFill { target, .. } = cli.command else {
            panic!("expected page-fill");
        };
        assert_eq!(target.content_path(), PathBuf::from("x/d.json"));
    }

    #[test]
    fn test_bullet_orphan_thresholds() {
        let cli = Cli::try_parse_from(["layout-qa", "bullet-orphans", "b.pdf"]).unwrap();
        let Command::BulletOrphans { bullets, .. } = cli.command else {
            panic!("expected bullet-orphans");
        };
        assert_eq!(BulletThresholds::from(bullets), BulletThresholds::default());

        let args = [
            "layout-qa",
            "bullet-orphans",
            "b.pdf",
            "--max-other-top",
            "0.3",
            "--min-singleton-bottom",
            "0.7",
            "--min-list-bullets",
            "4",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::BulletOrphans { bullets, .. } = cli.command else {
            panic!("expected bullet-orphans");
        };
        let t = BulletThresholds::from(bullets);
        assert_eq!(t.max_other_top, 0.3);
        assert_eq!(t.min_singleton_bottom, 0.7);
        assert_eq!(t.min_list_bullets, 4);
    }

    #[test]
    fn test_report_layout_requires_outputs() {
        assert!(Cli::try_parse_from(["layout-qa", "report-layout", "boek.pdf"]).is_err());
    }
}
