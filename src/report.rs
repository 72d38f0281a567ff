//! Report generation entry points.
//!
//! Capture happens first, on the caller's thread (see
//! [`crate::pipeline::stage::capture_entries`]). The staged entries are then
//! handed to [`generate_report`], which owns them from that point on: their
//! temp files are deleted before it returns, on success and on error alike.

use crate::config::ReportConfig;
use crate::error::{PdfExportError, ReportError};
use crate::output::{EntryResult, ReportOutput, ReportStats};
use crate::pipeline::bind::{bind, PlaceholderEntry};
use crate::pipeline::stage::StagedEntry;
use crate::pipeline::{docx, pdf, template};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the blocking document stage hands back.
struct DocumentStage {
    template_generated: bool,
    paragraphs: usize,
    entries: Vec<EntryResult>,
    bind_duration_ms: u64,
    save_duration_ms: u64,
}

/// Build the report from already-staged captures.
///
/// Loads (or generates) the template, binds every entry in order, saves the
/// report atomically and, when configured, exports a PDF copy.
///
/// # Errors
/// Returns `Err(ReportError)` for fatal errors only; no report file is
/// written in that case:
/// - template unreadable
/// - a marker missing from the template, or an image that cannot be embedded
/// - the report cannot be written
///
/// A failed PDF export is not an error; see [`ReportOutput::pdf_error`].
pub async fn generate_report(
    config: &ReportConfig,
    staged: Vec<StagedEntry>,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    let output_path = config.output.clone();
    info!(
        "Generating report {} ({} entries)",
        output_path.display(),
        staged.len()
    );

    let entries: Vec<PlaceholderEntry> = staged.iter().map(|s| s.entry().clone()).collect();
    let timestamp = config.timestamp_now();

    // ── Step 1: template → bind → save (blocking I/O) ────────────────────
    let stage_config = config.clone();
    let stage_output = output_path.clone();
    let document_result = tokio::task::spawn_blocking(move || {
        run_document_stage(&stage_config, &entries, &timestamp, &stage_output)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("document task failed: {e}")));

    // ── Step 2: remove temp images, whatever happened above ──────────────
    let temp_files_removed = close_staged(staged);

    let stage = document_result??;

    // ── Step 3: optional PDF ─────────────────────────────────────────────
    let pdf_start = Instant::now();
    let (pdf_path, pdf_error) = if config.export_pdf {
        match pdf::export_pdf(&output_path, &config.pdf_converter, config.pdf_timeout_secs).await
        {
            Ok(path) => (Some(path), None),
            Err(e) => {
                warn!("PDF export failed (report kept): {}", e);
                (None, Some(e))
            }
        }
    } else {
        (None, None)
    };
    let pdf_duration_ms = pdf_start.elapsed().as_millis() as u64;

    if config.export_pdf {
        if let Some(ref cb) = config.progress_callback {
            let detail = pdf_error.as_ref().map(PdfExportError::to_string);
            cb.on_pdf_finished(pdf_path.as_deref(), detail.as_deref());
        }
    }

    let stats = ReportStats {
        entries_bound: stage.entries.len(),
        paragraphs: stage.paragraphs,
        template_generated: stage.template_generated,
        temp_files_removed,
        bind_duration_ms: stage.bind_duration_ms,
        save_duration_ms: stage.save_duration_ms,
        pdf_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Report complete: {} entries, {}ms total",
        stats.entries_bound, stats.total_duration_ms
    );

    Ok(ReportOutput {
        report_path: output_path,
        pdf_path,
        pdf_error,
        entries: stage.entries,
        stats,
    })
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_report_sync(
    config: &ReportConfig,
    staged: Vec<StagedEntry>,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(config, staged))
}

fn run_document_stage(
    config: &ReportConfig,
    entries: &[PlaceholderEntry],
    timestamp: &str,
    output: &std::path::Path,
) -> Result<DocumentStage, ReportError> {
    let template = template::load_or_generate(config)?;
    let paragraphs = template.document.paragraph_count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_template_ready(paragraphs, template.generated);
    }

    let bind_start = Instant::now();
    let bound = bind(
        &template.document,
        entries,
        timestamp,
        config.image_width_inches,
    )?;
    let bind_duration_ms = bind_start.elapsed().as_millis() as u64;
    debug!("Bound {} entries in {}ms", bound.entries.len(), bind_duration_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_bound(bound.entries.len());
    }

    let save_start = Instant::now();
    docx::save_docx(bound.document, output)?;
    let save_duration_ms = save_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_report_saved(output);
    }

    Ok(DocumentStage {
        template_generated: template.generated,
        paragraphs,
        entries: bound.entries,
        bind_duration_ms,
        save_duration_ms,
    })
}

/// Delete every staged file; failures are logged, never fatal.
fn close_staged(staged: Vec<StagedEntry>) -> usize {
    let mut removed = 0;
    for entry in staged {
        let path: PathBuf = entry.path().to_path_buf();
        match entry.close() {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove temp image {}: {}", path.display(), e),
        }
    }
    debug!("Removed {} temp images", removed);
    removed
}
