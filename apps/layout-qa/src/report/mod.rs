// Reporting glue: turns a run's outcome into output lines and a process exit code.
// Exit codes: 0 = pass, 2 = violations, 1 = usage error (mapped from QaError in main).

pub mod layout;

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::gates::{GateKind, Violation};
use crate::hyphenation::HyphenationReport;

pub use layout::{LayoutReport, ReportSummary};

/// Violations listed in a failure summary before truncating.
pub const MAX_SAMPLES: usize = 30;

pub const EXIT_PASS: u8 = 0;
pub const EXIT_VIOLATIONS: u8 = 2;

/// Result of one layout gate over a document.
#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
    pub gate: GateKind,
    pub pdf: String,
    pub pages: u32,
    pub ignored_pages: Vec<u32>,
    /// Human summary of the thresholds in force.
    pub rule: String,
    pub violation_count: usize,
    pub violations: Vec<Violation>,
}

impl GateReport {
    pub fn new(
        gate: GateKind,
        pdf: String,
        pages: u32,
        ignored_pages: Vec<u32>,
        rule: String,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            gate,
            pdf,
            pages,
            ignored_pages,
            rule,
            violation_count: violations.len(),
            violations,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutReportWritten {
    pub pdf: String,
    pub json: PathBuf,
    pub tsv: PathBuf,
    pub summary: ReportSummary,
}

/// Everything a subcommand can end with, short of a usage error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Gate(GateReport),
    Hyphenation {
        #[serde(flatten)]
        report: HyphenationReport,
        fatal: bool,
    },
    LayoutReport(LayoutReportWritten),
}

impl Outcome {
    pub fn passed(&self) -> bool {
        match self {
            Outcome::Gate(r) => r.violations.is_empty(),
            Outcome::Hyphenation { report, fatal } => !(*fatal && report.invalid_count > 0),
            Outcome::LayoutReport(_) => true,
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            EXIT_PASS
        } else {
            EXIT_VIOLATIONS
        }
    }
}

#[derive(Serialize)]
struct JsonOut<'a> {
    ok: bool,
    data: &'a Outcome,
}

pub fn gate_title(gate: GateKind) -> &'static str {
    match gate {
        GateKind::PageFill => "Page fill gate",
        GateKind::ColumnBalance => "Column balance gate",
        GateKind::JustifyGap => "Justify gap gate",
        GateKind::HeadingHyphenation => "Heading hyphenation gate",
        GateKind::BulletOrphanSplit => "Bullet orphan split gate",
        GateKind::HyphenationValidity => "Hyphenation validity check",
    }
}

/// Writes the outcome. Passing output goes to `out`; failure summaries go to `err`.
/// With `json`, a single `{ "ok", "data" }` object is written to `out` either way.
pub fn render(
    outcome: &Outcome,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    if json {
        let body = JsonOut {
            ok: outcome.passed(),
            data: outcome,
        };
        serde_json::to_writer(&mut *out, &body).map_err(io::Error::from)?;
        return writeln!(out);
    }

    match outcome {
        Outcome::Gate(r) if r.violations.is_empty() => {
            writeln!(
                out,
                "✅ {} passed ({} pages, {} ignored)",
                gate_title(r.gate),
                r.pages,
                r.ignored_pages.len()
            )?;
            writeln!(out, "   pdf: {}", r.pdf)?;
            writeln!(out, "   rule: {}", r.rule)
        }
        Outcome::Gate(r) => {
            writeln!(
                err,
                "❌ {} failed: {} violation(s)",
                gate_title(r.gate),
                r.violation_count
            )?;
            writeln!(err, "   pdf: {}", r.pdf)?;
            writeln!(err, "   rule: {}", r.rule)?;
            write_samples(err, &r.violations)
        }
        Outcome::Hyphenation { report, fatal } => {
            let failing = *fatal && report.invalid_count > 0;
            let w: &mut dyn Write = if failing { err } else { out };
            if failing {
                writeln!(w, "❌ {} failed", gate_title(GateKind::HyphenationValidity))?;
            }
            writeln!(w, "PDF: {}", report.pdf)?;
            writeln!(w, "pages: {}", report.pages)?;
            writeln!(w, "hyphenated line-breaks found: {}", report.hyphenated_linebreaks)?;
            writeln!(w, "invalid by dictionary patterns: {}", report.invalid_count)?;
            for b in &report.invalid {
                writeln!(
                    w,
                    "- p{}: {}- | {} => {} (allowed: {})",
                    b.page, b.left, b.right, b.full, b.allowed
                )?;
            }
            Ok(())
        }
        Outcome::LayoutReport(r) => {
            writeln!(out, "✅ Layout report written")?;
            writeln!(out, "   pdf: {}", r.pdf)?;
            writeln!(out, "   json: {}", r.json.display())?;
            writeln!(out, "   tsv: {}", r.tsv.display())?;
            writeln!(
                out,
                "   page-fill fails: {}  column-balance fails: {}",
                r.summary.pagefill_fail_pages.len(),
                r.summary.colbalance_fail_pages.len()
            )
        }
    }
}

fn write_samples(w: &mut impl Write, violations: &[Violation]) -> io::Result<()> {
    for v in violations.iter().take(MAX_SAMPLES) {
        writeln!(w, "   - page {}: {}", v.page, v.reason)?;
    }
    if violations.len() > MAX_SAMPLES {
        writeln!(w, "   ... {} more", violations.len() - MAX_SAMPLES)?;
    }
    Ok(())
}
