//! Screen capture backends.
//!
//! [`ScreenCapturer`] is the seam between the report pipeline and the
//! display. [`XcapCapturer`] (feature `capture`) reads live pixels through
//! `xcap`; [`ImageFileCapturer`] serves a saved screenshot as "the screen",
//! which is what headless runs and the test-suite use.

use crate::config::CaptureSource;
use crate::error::ReportError;
use crate::geometry::CaptureRect;
use crate::selector::RegionSelector;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of screen pixels.
pub trait ScreenCapturer: Send + Sync {
    /// The whole primary display.
    fn capture_screen(&self) -> Result<RgbaImage, ReportError>;

    /// A fixed rectangle in screen coordinates.
    fn capture_region(&self, rect: CaptureRect) -> Result<RgbaImage, ReportError> {
        rect.crop(&self.capture_screen()?)
    }

    /// The first visible window whose title contains `title` (any case).
    fn capture_window(&self, title: &str) -> Result<RgbaImage, ReportError>;
}

/// Produce the pixels for one slot.
///
/// `Interactive` captures the full screen and hands it to `selector`; the
/// other sources never open the overlay.
pub fn capture_source(
    source: &CaptureSource,
    capturer: &dyn ScreenCapturer,
    selector: &dyn RegionSelector,
) -> Result<RgbaImage, ReportError> {
    match source {
        CaptureSource::Interactive => {
            let screen = capturer.capture_screen()?;
            let rect = selector.select(&screen)?;
            debug!("Selected region {}", rect);
            rect.crop(&screen)
        }
        CaptureSource::Region {
            x,
            y,
            width,
            height,
        } => capturer.capture_region(CaptureRect::new(*x, *y, *width, *height)),
        CaptureSource::Window { title } => capturer.capture_window(title),
    }
}

// ── Saved screenshot ─────────────────────────────────────────────────────

/// Serves an image file as the screen.
///
/// Window capture is not possible on a still image; it fails with
/// [`ReportError::WindowNotFound`].
#[derive(Debug, Clone)]
pub struct ImageFileCapturer {
    path: PathBuf,
}

impl ImageFileCapturer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScreenCapturer for ImageFileCapturer {
    fn capture_screen(&self) -> Result<RgbaImage, ReportError> {
        let image = image::open(&self.path).map_err(|e| ReportError::CaptureFailed {
            detail: format!("cannot read screenshot '{}': {e}", self.path.display()),
        })?;
        Ok(image.to_rgba8())
    }

    fn capture_window(&self, title: &str) -> Result<RgbaImage, ReportError> {
        Err(ReportError::WindowNotFound {
            title: title.to_string(),
        })
    }
}

/// Index of the monitor whose area holds the origin of `rect`.
///
/// A region starting outside every monitor is out of bounds; the reported
/// image size is the extent of the whole desktop.
#[cfg_attr(not(feature = "capture"), allow(dead_code))]
fn monitor_containing(rect: CaptureRect, monitors: &[CaptureRect]) -> Result<usize, ReportError> {
    let (x, y) = (i64::from(rect.x), i64::from(rect.y));
    if let Some(index) = monitors.iter().position(|m| {
        x >= i64::from(m.x) && y >= i64::from(m.y) && x < m.right() && y < m.bottom()
    }) {
        return Ok(index);
    }

    let left = monitors.iter().map(|m| i64::from(m.x)).min().unwrap_or(0);
    let top = monitors.iter().map(|m| i64::from(m.y)).min().unwrap_or(0);
    let right = monitors.iter().map(CaptureRect::right).max().unwrap_or(0);
    let bottom = monitors.iter().map(CaptureRect::bottom).max().unwrap_or(0);
    Err(ReportError::RegionOutOfBounds {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        image_width: u32::try_from(right - left).unwrap_or(u32::MAX),
        image_height: u32::try_from(bottom - top).unwrap_or(u32::MAX),
    })
}

// ── Live display ─────────────────────────────────────────────────────────

/// Live capture through `xcap`.
#[cfg(feature = "capture")]
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapCapturer;

#[cfg(feature = "capture")]
impl XcapCapturer {
    fn monitors() -> Result<Vec<xcap::Monitor>, ReportError> {
        let monitors = xcap::Monitor::all().map_err(capture_failed)?;
        if monitors.is_empty() {
            return Err(ReportError::CaptureFailed {
                detail: "no monitors found".into(),
            });
        }
        Ok(monitors)
    }

    fn primary() -> Result<xcap::Monitor, ReportError> {
        let mut monitors = Self::monitors()?;
        let index = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);
        Ok(monitors.swap_remove(index))
    }
}

#[cfg(feature = "capture")]
fn capture_failed(e: xcap::XCapError) -> ReportError {
    ReportError::CaptureFailed {
        detail: e.to_string(),
    }
}

#[cfg(feature = "capture")]
impl ScreenCapturer for XcapCapturer {
    fn capture_screen(&self) -> Result<RgbaImage, ReportError> {
        let monitor = Self::primary()?;
        let image = monitor.capture_image().map_err(capture_failed)?;
        debug!("Captured screen {}x{}", image.width(), image.height());
        Ok(image)
    }

    fn capture_region(&self, rect: CaptureRect) -> Result<RgbaImage, ReportError> {
        let monitors = Self::monitors()?;
        let mut bounds = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            bounds.push(CaptureRect::new(
                monitor.x().map_err(capture_failed)?,
                monitor.y().map_err(capture_failed)?,
                monitor.width().map_err(capture_failed)?,
                monitor.height().map_err(capture_failed)?,
            ));
        }

        let index = monitor_containing(rect, &bounds)?;
        let origin = bounds[index];
        let image = monitors[index].capture_image().map_err(capture_failed)?;
        rect.translate(-origin.x, -origin.y).crop(&image)
    }

    fn capture_window(&self, title: &str) -> Result<RgbaImage, ReportError> {
        let needle = title.to_lowercase();
        let windows = xcap::Window::all().map_err(capture_failed)?;

        for window in windows {
            if window.is_minimized().unwrap_or(true) {
                continue;
            }
            let Ok(window_title) = window.title() else {
                continue;
            };
            if window_title.to_lowercase().contains(&needle) {
                debug!("Capturing window '{}'", window_title);
                return window.capture_image().map_err(capture_failed);
            }
        }

        Err(ReportError::WindowNotFound {
            title: title.to_string(),
        })
    }
}
