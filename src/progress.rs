//! Progress-callback trait for report-generation events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events while graphs are captured and the report is assembled. The CLI
//! uses it to drive a terminal spinner; other front-ends can forward the
//! events wherever they like. All methods default to no-ops.
//!
//! # Example
//!
//! ```rust
//! use edgequake_graph2docx::{ReportConfig, ReportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captured: AtomicUsize,
//! }
//!
//! impl ReportProgressCallback for CountingCallback {
//!     fn on_capture_complete(&self, index: usize, total: usize, _w: u32, _h: u32) {
//!         self.captured.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("graph {index}/{total} captured");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { captured: AtomicUsize::new(0) });
//! let config = ReportConfig::builder()
//!     .progress_callback(cb as Arc<dyn ReportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called as a report run advances.
///
/// Implementations must be `Send + Sync` because the document stages run on
/// tokio's blocking pool.
pub trait ReportProgressCallback: Send + Sync {
    /// Called before graph `index` (1-based) of `total` is captured.
    fn on_capture_start(&self, index: usize, total: usize, label: &str) {
        let _ = (index, total, label);
    }

    /// Called once graph `index` has been captured (and cropped).
    fn on_capture_complete(&self, index: usize, total: usize, width: u32, height: u32) {
        let _ = (index, total, width, height);
    }

    /// Called when the template is ready (`generated` = no file existed).
    fn on_template_ready(&self, paragraphs: usize, generated: bool) {
        let _ = (paragraphs, generated);
    }

    /// Called after every placeholder was substituted.
    fn on_bound(&self, entries: usize) {
        let _ = entries;
    }

    /// Called after the `.docx` report was written.
    fn on_report_saved(&self, path: &Path) {
        let _ = path;
    }

    /// Called after PDF export, successful or not.
    fn on_pdf_finished(&self, pdf_path: Option<&Path>, error: Option<&str>) {
        let _ = (pdf_path, error);
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;
