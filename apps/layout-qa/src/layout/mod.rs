// Layout model of the two-column print template.
// Tokens → LayoutConfig → per-page PageGeometry, plus the shared coverage engine.

pub mod coverage;
pub mod geometry;
pub mod tokens;

// Re-export the public API consumed by the gates and the report.
pub use coverage::{coverage_ratio, CoverageInterval};
pub use geometry::{Column, PageGeometry, Rect};
pub use tokens::LayoutConfig;
