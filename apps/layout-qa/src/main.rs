mod cli;
mod config;
mod errors;
mod extract;
mod gates;
mod hyphenation;
mod layout;
mod report;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, Target};
use crate::config::Config;
use crate::errors::QaError;
use crate::extract::{ContentSource, LayoutDump};
use crate::gates::bullet_orphans::{self, BulletThresholds};
use crate::gates::column_balance::{self, ColumnBalanceThresholds};
use crate::gates::heading_hyphenation::{self, HeadingThresholds};
use crate::gates::justify_gaps::{self, JustifyThresholds};
use crate::gates::page_fill::{self, PageFillThresholds};
use crate::gates::{GateKind, IgnoreSet, TitlePattern, Violation};
use crate::hyphenation::HyphenDictionary;
use crate::layout::LayoutConfig;
use crate::report::{GateReport, LayoutReport, LayoutReportWritten, Outcome};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help / --version are not usage errors
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return ExitCode::from(1);
        }
    };

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli, &config) {
        Ok(outcome) => {
            let rendered = report::render(
                &outcome,
                cli.json,
                &mut io::stdout().lock(),
                &mut io::stderr().lock(),
            );
            if let Err(e) = rendered {
                eprintln!("❌ failed to write output: {e}");
                return ExitCode::from(1);
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            let code = e.downcast_ref::<QaError>().map_or(1, QaError::exit_code);
            eprintln!("❌ {e:#}");
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<Outcome> {
    info!("layout-qa v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::PageFill {
            target,
            ignore_first,
            ignore_last,
            fill,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let thresholds = PageFillThresholds::from(*fill);
            let violations = page_fill::run(&doc.dump, &doc.layout, &doc.ignore, &thresholds)?;
            let rule = format!("used_ratio >= {:.2} of body height", thresholds.min_used);
            Ok(doc.outcome(GateKind::PageFill, rule, violations))
        }
        Command::ColumnBalance {
            target,
            ignore_first,
            ignore_last,
            balance,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let t = ColumnBalanceThresholds::from(*balance);
            let violations = column_balance::run(&doc.dump, &doc.layout, &doc.ignore, &t)?;
            let rule = format!(
                "full_cov >= {:.2} with >= {} blocks, sparse_cov <= {:.2}, diff >= {:.2}, sparse column without images",
                t.min_full_coverage, t.min_full_blocks, t.max_sparse_coverage, t.min_coverage_diff
            );
            Ok(doc.outcome(GateKind::ColumnBalance, rule, violations))
        }
        Command::JustifyGaps {
            target,
            ignore_first,
            ignore_last,
            max_gap_pt,
            box_max_gap_pt,
            min_span_ratio,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let t = JustifyThresholds {
                max_gap_pt: *max_gap_pt,
                box_max_gap_pt: *box_max_gap_pt,
                min_span_ratio: *min_span_ratio,
            };
            let violations = justify_gaps::run(&doc.dump, &doc.layout, &doc.ignore, &t)?;
            let rule = format!(
                "line span >= {:.2} of column width, max inter-word gap > {:.1}pt ({:.1}pt in boxes)",
                t.min_span_ratio, t.max_gap_pt, t.box_max_gap_pt
            );
            Ok(doc.outcome(GateKind::JustifyGap, rule, violations))
        }
        Command::HeadingHyphenation {
            target,
            ignore_first,
            ignore_last,
            delta_pt,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let t = HeadingThresholds { delta_pt: *delta_pt };
            let violations = heading_hyphenation::run(&doc.dump, &doc.layout, &doc.ignore, &t)?;
            let rule = format!(
                "heading lines >= body({:.2}pt)+{:.2}pt={:.2}pt must not end in a hyphenated word",
                doc.layout.body_size,
                t.delta_pt,
                t.heading_size(doc.layout.body_size)
            );
            Ok(doc.outcome(GateKind::HeadingHyphenation, rule, violations))
        }
        Command::BulletOrphans {
            target,
            ignore_first,
            ignore_last,
            bullets,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let t = BulletThresholds::from(*bullets);
            let violations = bullet_orphans::run(&doc.dump, &doc.layout, &doc.ignore, &t)?;
            let rule = format!(
                "one column has exactly 1 bullet line (at >= {:.2}) and the other >= {} (first at <= {:.2})",
                t.min_singleton_bottom, t.min_list_bullets, t.max_other_top
            );
            Ok(doc.outcome(GateKind::BulletOrphanSplit, rule, violations))
        }
        Command::Hyphenation {
            target,
            ignore_first,
            ignore_last,
            dict,
            fatal,
        } => {
            require_pdf(target)?;
            let dict_path = dict
                .clone()
                .or_else(|| config.hyphen_dict.clone())
                .ok_or_else(|| {
                    QaError::DictionaryUnavailable(
                        "no pattern file; pass --dict or set HYPHEN_DICT".into(),
                    )
                })?;
            let dictionary = HyphenDictionary::load(&dict_path)?;

            let content = target.content_path();
            let report = if content.exists() {
                let dump = LayoutDump::load(&content)?;
                let ignore = build_ignore(target, *ignore_first, *ignore_last, &dump)?;
                hyphenation::scan_source(&dump, &dictionary, &ignore, &target.pdf)?
            } else if target.is_dump() {
                return Err(QaError::ContentUnavailable(content).into());
            } else {
                info!(pdf = %target.pdf.display(), "no layout dump, reading PDF text");
                let policy = target.policy(*ignore_first, *ignore_last);
                hyphenation::scan_pdf_text(&target.pdf, &dictionary, &policy)?
            };
            Ok(Outcome::Hyphenation { report, fatal: *fatal })
        }
        Command::ReportLayout {
            target,
            ignore_first,
            ignore_last,
            out_json,
            out_tsv,
            fill,
            balance,
        } => {
            let doc = GateRun::open(target, *ignore_first, *ignore_last, config)?;
            let metrics: LayoutReport = report::layout::build(
                &doc.dump,
                &doc.pdf,
                &doc.layout,
                &doc.ignore,
                &PageFillThresholds::from(*fill),
                &ColumnBalanceThresholds::from(*balance),
            )?;
            report::layout::write(&metrics, out_json, out_tsv)
                .with_context(|| format!("writing layout report for {}", doc.pdf.display()))?;
            Ok(Outcome::LayoutReport(LayoutReportWritten {
                pdf: metrics.pdf,
                json: out_json.clone(),
                tsv: out_tsv.clone(),
                summary: metrics.summary,
            }))
        }
    }
}

/// Everything a layout gate needs for one document.
struct GateRun {
    pdf: PathBuf,
    dump: LayoutDump,
    layout: LayoutConfig,
    ignore: IgnoreSet,
}

impl GateRun {
    fn open(target: &Target, ignore_first: u32, ignore_last: u32, config: &Config) -> Result<Self> {
        require_pdf(target)?;
        let tokens = target.tokens.as_deref().unwrap_or(&config.tokens_path);
        let layout = LayoutConfig::load(tokens)?;
        let dump = LayoutDump::load(&target.content_path())?;
        let ignore = build_ignore(target, ignore_first, ignore_last, &dump)?;

        info!(
            pdf = %target.pdf.display(),
            pages = dump.page_count(),
            ignored = ignore.len(),
            "document loaded"
        );
        Ok(Self {
            pdf: target.pdf.clone(),
            dump,
            layout,
            ignore,
        })
    }

    fn outcome(&self, gate: GateKind, rule: String, violations: Vec<Violation>) -> Outcome {
        info!(gate = %gate, violations = violations.len(), "gate finished");
        Outcome::Gate(GateReport::new(
            gate,
            self.pdf.display().to_string(),
            self.dump.page_count(),
            self.ignore.pages().collect(),
            rule,
            violations,
        ))
    }
}

fn require_pdf(target: &Target) -> Result<(), QaError> {
    if !target.is_dump() && !Path::new(&target.pdf).exists() {
        return Err(QaError::PdfNotFound(target.pdf.clone()));
    }
    Ok(())
}

fn build_ignore(
    target: &Target,
    first: u32,
    last: u32,
    dump: &LayoutDump,
) -> Result<IgnoreSet, QaError> {
    let matcher = TitlePattern::new(&target.chapter_pattern)?;
    Ok(IgnoreSet::build(
        &target.policy(first, last),
        dump.page_count(),
        &dump.bookmarks(),
        &matcher,
    ))
}
