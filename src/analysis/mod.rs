//! Read-only analysis over source tiles: cross-reference, per-source summary, export.

pub mod crossref;
pub mod export;
pub mod summary;

// Re-export commonly used items
pub use crossref::{CrossReferenceResult, SharedValue, cross_reference};
pub use export::{write_cross_reference_csv, write_kind_csv, write_occurrences_csv};
pub use summary::{Analysis, AnalysisItem, summarize};
