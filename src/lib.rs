//! # edgequake-graph2docx
//!
//! Capture graphs from the screen and bind them into a Word report template.
//!
//! ## Why this crate?
//!
//! Lab and simulation reports are often assembled by hand: screenshot a plot,
//! paste it into Word, type the date next to it, repeat. This crate turns
//! that into one step. Each graph is captured (interactively, from a fixed
//! region, or from a named window), and the template's placeholder markers
//! are replaced with a bold `"{label}: {timestamp}"` line plus the picture.
//!
//! ## Pipeline Overview
//!
//! ```text
//! screen
//!  │
//!  ├─ 1. Capture   full screen / region / window (xcap or a saved PNG)
//!  ├─ 2. Select    click-drag-release overlay for interactive slots
//!  ├─ 3. Stage     crop → temp PNG, deleted on drop
//!  ├─ 4. Template  load .docx, or generate a minimal one
//!  ├─ 5. Bind      marker → bold label + time stamp + inline picture
//!  ├─ 6. Save      atomic .docx write (spawn_blocking)
//!  └─ 7. PDF       optional soffice conversion, non-fatal
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_graph2docx::{
//!     capture_entries, generate_report, CaptureSource, GraphSlot, ImageFileCapturer,
//!     OverlaySelector, ReportConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::builder()
//!         .template("template.docx")
//!         .output("Simulation_Report_Final.docx")
//!         .slot(GraphSlot::new("[GRAPH_1]", "Graph", CaptureSource::region(100, 100, 600, 400)))
//!         .build()?;
//!
//!     let capturer = ImageFileCapturer::new("screen.png");
//!     let staged = capture_entries(&config, &capturer, &OverlaySelector)?;
//!     let output = generate_report(&config, staged).await?;
//!     println!("report: {}", output.report_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `graph2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `overlay` | on      | Full-screen region-selection window (eframe) |
//! | `capture` | off     | Live screen/window capture through xcap (needs libxcb on Linux) |
//!
//! Library-only use without a display:
//! ```toml
//! edgequake-graph2docx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod output;
#[cfg(feature = "overlay")]
mod overlay;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod selector;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    resolve_report_path, CaptureSource, GraphSlot, ReportConfig, ReportConfigBuilder,
    DEFAULT_REPORT_NAME,
};
pub use document::{Document, Paragraph};
pub use error::{PdfExportError, ReportError};
pub use geometry::CaptureRect;
pub use output::{EntryResult, ReportOutput, ReportStats};
pub use pipeline::bind::{bind, PlaceholderEntry};
#[cfg(feature = "capture")]
pub use pipeline::capture::XcapCapturer;
pub use pipeline::capture::{ImageFileCapturer, ScreenCapturer};
pub use pipeline::stage::{capture_entries, stage_image, StagedEntry};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback};
pub use report::{generate_report, generate_report_sync};
pub use selector::{open_selector, OverlaySelector, RegionSelector, ScriptedSelector};
