//! Optional PDF export through a headless LibreOffice.
//!
//! The converter runs as a subprocess with a timeout; the child is killed
//! when the timeout elapses. Every failure is returned as a
//! [`PdfExportError`], which the caller stores instead of propagating.

use crate::error::PdfExportError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Where the converter writes the PDF for `report`.
pub fn pdf_path_for(report: &Path) -> PathBuf {
    report.with_extension("pdf")
}

/// Convert `report` to PDF next to it.
///
/// Runs `<program> --headless --convert-to pdf --outdir <dir> <report>`.
pub async fn export_pdf(
    report: &Path,
    program: &str,
    timeout_secs: u64,
) -> Result<PathBuf, PdfExportError> {
    let outdir = match report.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let target = pdf_path_for(report);

    debug!(
        "Running {} --headless --convert-to pdf --outdir {} {}",
        program,
        outdir.display(),
        report.display()
    );

    let child = Command::new(program)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(&outdir)
        .arg(report)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PdfExportError::ConverterNotFound {
            program: program.to_string(),
            detail: e.to_string(),
        })?;

    let output = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| PdfExportError::Timeout {
        secs: timeout_secs,
    })?
    .map_err(|e| PdfExportError::ConverterFailed {
        status: "unknown".into(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(PdfExportError::ConverterFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if !target.exists() {
        return Err(PdfExportError::MissingOutput { path: target });
    }

    info!("Exported PDF: {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_path_replaces_extension() {
        assert_eq!(
            pdf_path_for(Path::new("out/Report.docx")),
            PathBuf::from("out/Report.pdf")
        );
    }

    #[tokio::test]
    async fn missing_converter_is_reported() {
        let err = export_pdf(
            Path::new("report.docx"),
            "graph2docx-no-such-converter",
            5,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PdfExportError::ConverterNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_converter_is_reported() {
        // `false` ignores its arguments and exits 1
        let err = export_pdf(Path::new("report.docx"), "false", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfExportError::ConverterFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn succeeding_converter_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("r.docx");
        let err = export_pdf(&report, "true", 5).await.unwrap_err();
        assert!(matches!(err, PdfExportError::MissingOutput { .. }));
    }
}
