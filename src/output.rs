//! Result types returned by report generation.

use crate::error::PdfExportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// The `.docx` file that was written.
    pub report_path: PathBuf,
    /// The PDF copy, when export was requested and succeeded.
    pub pdf_path: Option<PathBuf>,
    /// Why the PDF export failed. The report itself is still valid.
    pub pdf_error: Option<PdfExportError>,
    /// One entry per placeholder, in configuration order.
    pub entries: Vec<EntryResult>,
    pub stats: ReportStats,
}

impl ReportOutput {
    /// True when PDF export was requested but did not produce a file.
    pub fn pdf_failed(&self) -> bool {
        self.pdf_error.is_some()
    }
}

/// Where a placeholder was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResult {
    pub marker: String,
    pub label: String,
    /// 0-based index among the document's paragraphs.
    pub paragraph_index: usize,
    pub image_width: u32,
    pub image_height: u32,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub entries_bound: usize,
    pub paragraphs: usize,
    /// True when the template file did not exist and a minimal one was generated.
    pub template_generated: bool,
    pub temp_files_removed: usize,
    pub bind_duration_ms: u64,
    pub save_duration_ms: u64,
    pub pdf_duration_ms: u64,
    pub total_duration_ms: u64,
}
