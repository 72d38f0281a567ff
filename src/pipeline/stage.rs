//! Staging: captured pixels → uniquely named temporary PNG files.
//!
//! A [`StagedEntry`] owns its file through [`tempfile::TempPath`], so the file
//! is removed when the entry is dropped, whichever way the run ends.

use super::bind::PlaceholderEntry;
use super::capture::{capture_source, ScreenCapturer};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::progress::{NoopProgressCallback, ReportProgressCallback};
use image::{ImageFormat, RgbaImage};
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use tracing::{debug, info};

/// A placeholder entry whose image lives in a temp file owned by this value.
#[derive(Debug)]
pub struct StagedEntry {
    entry: PlaceholderEntry,
    file: TempPath,
}

impl StagedEntry {
    pub fn entry(&self) -> &PlaceholderEntry {
        &self.entry
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Set the display width recorded in the entry.
    pub fn with_width(mut self, inches: Option<f32>) -> Self {
        self.entry.width_inches = inches;
        self
    }

    /// Delete the temp file now, reporting failures instead of ignoring them.
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}

/// Encode `image` as PNG into a fresh temp file.
pub fn stage_image(
    marker: &str,
    label: &str,
    image: &RgbaImage,
) -> Result<StagedEntry, ReportError> {
    let staging_failed = |detail: String| ReportError::StagingFailed {
        marker: marker.to_string(),
        detail,
    };

    let file = tempfile::Builder::new()
        .prefix("graph2docx-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| staging_failed(e.to_string()))?;

    let file = file.into_temp_path();
    image
        .save_with_format(&file, ImageFormat::Png)
        .map_err(|e| staging_failed(e.to_string()))?;

    debug!(
        "Staged {}x{} image for '{}' at {}",
        image.width(),
        image.height(),
        marker,
        file.display()
    );

    Ok(StagedEntry {
        entry: PlaceholderEntry::new(marker, file.to_path_buf(), label),
        file,
    })
}

/// Capture and stage every configured slot, in order.
///
/// Runs on the calling thread: the interactive overlay needs the main thread
/// on most platforms. A failure drops the entries staged so far, which
/// deletes their files.
pub fn capture_entries(
    config: &ReportConfig,
    capturer: &dyn ScreenCapturer,
    selector: &dyn crate::selector::RegionSelector,
) -> Result<Vec<StagedEntry>, ReportError> {
    let noop = NoopProgressCallback;
    let cb: &dyn ReportProgressCallback = match &config.progress_callback {
        Some(cb) => cb.as_ref(),
        None => &noop,
    };

    let total = config.slots.len();
    let mut staged = Vec::with_capacity(total);

    for (i, slot) in config.slots.iter().enumerate() {
        let index = i + 1;
        cb.on_capture_start(index, total, &slot.label);

        if config.capture_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.capture_delay_ms));
        }

        let image = capture_source(&slot.source, capturer, selector)?;
        cb.on_capture_complete(index, total, image.width(), image.height());
        info!(
            "Captured '{}' ({}/{}): {}x{}",
            slot.label,
            index,
            total,
            image.width(),
            image.height()
        );

        staged.push(stage_image(&slot.marker, &slot.label, &image)?.with_width(slot.width_inches));
    }

    Ok(staged)
}
