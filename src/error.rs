//! Error types for the edgequake-graph2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`], **fatal for the run**: the report cannot be produced
//!   (selection cancelled, marker missing from the template, image cannot be
//!   embedded, template unreadable). Returned as `Err(ReportError)` from the
//!   capture and `generate_report*` functions. None of them crash the
//!   process; the caller may retry the whole operation.
//!
//! * [`PdfExportError`], **non-fatal**: the `.docx` report was written but
//!   the optional PDF conversion failed. Stored inside
//!   [`crate::output::ReportOutput`] and logged, never propagated.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-graph2docx library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Selection errors ──────────────────────────────────────────────────
    /// The overlay was closed without a drag, or the drag had zero area.
    #[error("Region selection cancelled: no area was selected")]
    SelectionCancelled,

    /// A rectangle does not fit inside the image it should be cut from.
    #[error(
        "Region {x},{y} {width}x{height} lies outside the {image_width}x{image_height} screenshot"
    )]
    RegionOutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// The interactive selector was requested but is not compiled in.
    #[error(
        "Interactive region selection is not available in this build.\n\
Rebuild with `--features overlay` or use fixed regions (--region X,Y,W,H)."
    )]
    OverlayUnavailable,

    /// The selection window failed to open or crashed.
    #[error("Selection overlay failed: {0}")]
    Overlay(String),

    // ── Capture errors ────────────────────────────────────────────────────
    /// Reading pixels from the display failed.
    #[error("Screen capture failed: {detail}")]
    CaptureFailed { detail: String },

    /// No visible window title matched the requested text.
    #[error("No visible window whose title contains '{title}'")]
    WindowNotFound { title: String },

    /// A captured image could not be written to its temp file.
    #[error("Failed to stage captured image for '{marker}': {detail}")]
    StagingFailed { marker: String, detail: String },

    // ── Binding errors ────────────────────────────────────────────────────
    /// A configured placeholder does not occur in any paragraph.
    #[error("Placeholder '{marker}' was not found in the document template.\nAdd it to a paragraph of the template and retry.")]
    MarkerNotFound { marker: String },

    /// The image for a placeholder is missing or cannot be decoded.
    #[error("Cannot insert image '{path}' for placeholder '{marker}': {detail}")]
    ImageInsertFailure {
        marker: String,
        path: PathBuf,
        detail: String,
    },

    /// Two markers overlap, so which paragraph each one matches is ambiguous.
    #[error("Placeholder '{inner}' is contained in placeholder '{outer}'; markers must not overlap")]
    OverlappingMarkers { inner: String, outer: String },

    // ── Document I/O errors ───────────────────────────────────────────────
    /// The template could not be read or parsed.
    #[error("Failed to load template '{path}': {detail}")]
    TemplateLoad { path: PathBuf, detail: String },

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialised to the DOCX container.
    #[error("Failed to encode document '{path}': {detail}")]
    DocumentEncode { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A JSON configuration file could not be read or parsed.
    #[error("Failed to read configuration file '{path}': {detail}")]
    ConfigFile { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// True for failures the user resolves by retrying the interaction
    /// (re-selecting a region, fixing the template) rather than the setup.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReportError::SelectionCancelled
                | ReportError::MarkerNotFound { .. }
                | ReportError::ImageInsertFailure { .. }
                | ReportError::WindowNotFound { .. }
                | ReportError::RegionOutOfBounds { .. }
        )
    }
}

/// A non-fatal error from the optional PDF export step.
///
/// Stored in [`crate::output::ReportOutput::pdf_error`]; the `.docx` report
/// is already on disk when this happens.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PdfExportError {
    /// The converter executable could not be started.
    #[error("PDF converter '{program}' could not be started: {detail}")]
    ConverterNotFound { program: String, detail: String },

    /// The converter ran but exited unsuccessfully.
    #[error("PDF converter exited with status {status}: {stderr}")]
    ConverterFailed { status: String, stderr: String },

    /// The converter did not finish in time and was killed.
    #[error("PDF conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The converter reported success but produced no file.
    #[error("PDF converter produced no output at '{path}'")]
    MissingOutput { path: PathBuf },
}
