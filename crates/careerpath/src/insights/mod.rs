//! Admin analytics: pure rollups, report assembly, and CSV export.

pub mod export;
pub mod rollups;
pub mod router;
pub mod service;

pub use export::{CsvDocument, ExportKind};
pub use router::insights_router;
pub use service::{ExportDocument, InsightsService, DEFAULT_PERFORMANCE_WINDOW_DAYS};
