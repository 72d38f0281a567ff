//! Configuration types for capture and report generation.
//!
//! Every knob of a run lives in [`ReportConfig`], built via its
//! [`ReportConfigBuilder`] or loaded from a JSON file. The configuration is
//! passed explicitly into the capture and report-generation calls; there is
//! no module-level state (fixed regions, file names) anywhere in the crate.

use crate::error::ReportError;
use crate::geometry::CaptureRect;
use crate::pipeline::bind::validate_markers;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name used when the user gives none.
pub const DEFAULT_REPORT_NAME: &str = "Simulation_Report_Final.docx";

/// Heading of generated templates.
pub const DEFAULT_TITLE: &str = "STANDARD SIMULATION TEST REPORT";

/// `strftime` pattern for the time stamp written next to each graph.
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

const MAX_IMAGE_WIDTH_INCHES: f32 = 22.0;

/// Configuration for one capture-and-report run.
///
/// # Example
/// ```rust
/// use edgequake_graph2docx::{CaptureSource, GraphSlot, ReportConfig};
///
/// let config = ReportConfig::builder()
///     .output("weekly.docx")
///     .slot(GraphSlot::new("[GRAPH_1]", "Throughput", CaptureSource::region(100, 100, 600, 400)))
///     .slot(GraphSlot::new("[GRAPH_2]", "Latency", CaptureSource::Interactive))
///     .image_width_inches(5.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.slots.len(), 2);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title paragraph of generated templates. Default: [`DEFAULT_TITLE`].
    pub title: String,

    /// Template `.docx`. If None, a minimal template is generated in memory.
    /// If the path does not exist, a minimal template is generated there.
    pub template: Option<PathBuf>,

    /// Write the generated template to `template` when that file is missing,
    /// so the user can customise it for the next run. Default: true.
    pub save_generated_template: bool,

    /// Final report path. Default: [`DEFAULT_REPORT_NAME`].
    pub output: PathBuf,

    /// Graphs to capture, in substitution order.
    pub slots: Vec<GraphSlot>,

    /// `strftime` format of the time stamp. Default: [`DEFAULT_DATE_FORMAT`].
    pub date_format: String,

    /// Fixed time stamp text; overrides `date_format` (reproducible reports).
    pub timestamp: Option<String>,

    /// Display width of embedded graphs in inches. Default: 6.0.
    pub image_width_inches: f32,

    /// Pause before each capture so the target window can be focused. Default: 1000.
    pub capture_delay_ms: u64,

    /// Also produce `<output>.pdf`. Default: false.
    pub export_pdf: bool,

    /// Converter executable (LibreOffice). Default: `soffice`.
    pub pdf_converter: String,

    /// Converter timeout in seconds. Default: 120.
    pub pdf_timeout_secs: u64,

    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            template: None,
            save_generated_template: true,
            output: PathBuf::from(DEFAULT_REPORT_NAME),
            slots: vec![GraphSlot::interactive(1, 1)],
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            timestamp: None,
            image_width_inches: 6.0,
            capture_delay_ms: 1000,
            export_pdf: false,
            pdf_converter: "soffice".to_string(),
            pdf_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("title", &self.title)
            .field("template", &self.template)
            .field("save_generated_template", &self.save_generated_template)
            .field("output", &self.output)
            .field("slots", &self.slots)
            .field("date_format", &self.date_format)
            .field("timestamp", &self.timestamp)
            .field("image_width_inches", &self.image_width_inches)
            .field("capture_delay_ms", &self.capture_delay_ms)
            .field("export_pdf", &self.export_pdf)
            .field("pdf_converter", &self.pdf_converter)
            .field("pdf_timeout_secs", &self.pdf_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReportProgressCallback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let config: ReportConfig =
            serde_json::from_str(&raw).map_err(|e| ReportError::ConfigFile {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Turn an existing configuration back into a builder (e.g. to layer
    /// CLI overrides on top of a config file).
    pub fn into_builder(self) -> ReportConfigBuilder {
        ReportConfigBuilder { config: self }
    }

    /// Check the invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.slots.is_empty() {
            return Err(ReportError::InvalidConfig(
                "at least one graph slot is required".into(),
            ));
        }
        validate_markers(self.slots.iter().map(|s| s.marker.as_str()))
            .map_err(|e| ReportError::InvalidConfig(e.to_string()))?;
        for slot in &self.slots {
            if let CaptureSource::Region { width, height, .. } = slot.source {
                if width == 0 || height == 0 {
                    return Err(ReportError::InvalidConfig(format!(
                        "region for '{}' has zero size",
                        slot.marker
                    )));
                }
            }
        }
        let widths = std::iter::once(self.image_width_inches)
            .chain(self.slots.iter().filter_map(|s| s.width_inches));
        for w in widths {
            if !(w > 0.0 && w <= MAX_IMAGE_WIDTH_INCHES) {
                return Err(ReportError::InvalidConfig(format!(
                    "image width must be in (0, {MAX_IMAGE_WIDTH_INCHES}] inches, got {w}"
                )));
            }
        }
        if self.timestamp.is_none() && !is_valid_date_format(&self.date_format) {
            return Err(ReportError::InvalidConfig(format!(
                "invalid date format '{}'",
                self.date_format
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ReportError::InvalidConfig("output path is empty".into()));
        }
        if self.pdf_timeout_secs == 0 {
            return Err(ReportError::InvalidConfig(
                "pdf_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The time stamp written next to every graph of this run.
    pub fn timestamp_now(&self) -> String {
        match &self.timestamp {
            Some(ts) => ts.clone(),
            None => chrono::Local::now().format(&self.date_format).to_string(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template = Some(path.into());
        self
    }

    pub fn save_generated_template(mut self, v: bool) -> Self {
        self.config.save_generated_template = v;
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    /// Append a slot. The first call replaces the default slot.
    pub fn slot(mut self, slot: GraphSlot) -> Self {
        if self.config.slots == ReportConfig::default().slots {
            self.config.slots.clear();
        }
        self.config.slots.push(slot);
        self
    }

    pub fn slots(mut self, slots: Vec<GraphSlot>) -> Self {
        self.config.slots = slots;
        self
    }

    /// `n` interactively selected graphs, markers `[GRAPH_1]` … `[GRAPH_n]`.
    pub fn interactive_graphs(mut self, n: usize) -> Self {
        self.config.slots = (1..=n).map(|i| GraphSlot::interactive(i, n)).collect();
        self
    }

    pub fn date_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.date_format = fmt.into();
        self
    }

    pub fn timestamp(mut self, ts: impl Into<String>) -> Self {
        self.config.timestamp = Some(ts.into());
        self
    }

    pub fn image_width_inches(mut self, inches: f32) -> Self {
        self.config.image_width_inches = inches;
        self
    }

    pub fn capture_delay_ms(mut self, ms: u64) -> Self {
        self.config.capture_delay_ms = ms;
        self
    }

    pub fn export_pdf(mut self, v: bool) -> Self {
        self.config.export_pdf = v;
        self
    }

    pub fn pdf_converter(mut self, program: impl Into<String>) -> Self {
        self.config.pdf_converter = program.into();
        self
    }

    pub fn pdf_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pdf_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Slots ────────────────────────────────────────────────────────────────

/// One graph to capture and where it goes in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSlot {
    /// Placeholder text in the template, e.g. `[GRAPH_1]`.
    pub marker: String,
    /// Written before the time stamp: `"{label}: {timestamp}"`.
    pub label: String,
    #[serde(default)]
    pub source: CaptureSource,
    /// Display width for this slot; `None` uses `image_width_inches`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_inches: Option<f32>,
}

impl GraphSlot {
    pub fn new(marker: impl Into<String>, label: impl Into<String>, source: CaptureSource) -> Self {
        Self {
            marker: marker.into(),
            label: label.into(),
            source,
            width_inches: None,
        }
    }

    /// Override the display width of this slot's picture.
    pub fn with_width(mut self, inches: f32) -> Self {
        self.width_inches = Some(inches);
        self
    }

    /// Slot `i` of `n` interactively selected graphs.
    pub fn interactive(i: usize, n: usize) -> Self {
        let label = if n == 1 {
            "Graph".to_string()
        } else {
            format!("Graph {i}")
        };
        Self::new(format!("[GRAPH_{i}]"), label, CaptureSource::Interactive)
    }
}

/// How the pixels of a slot are obtained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CaptureSource {
    /// Full screen, then the user drags a rectangle on the overlay. (default)
    #[default]
    Interactive,
    /// A fixed rectangle in screen coordinates.
    Region {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// The first visible window whose title contains this text.
    Window { title: String },
}

impl CaptureSource {
    pub fn region(x: i32, y: i32, width: u32, height: u32) -> Self {
        CaptureSource::Region {
            x,
            y,
            width,
            height,
        }
    }

    /// The fixed rectangle, for `Region` sources.
    pub fn rect(&self) -> Option<CaptureRect> {
        match *self {
            CaptureSource::Region {
                x,
                y,
                width,
                height,
            } => Some(CaptureRect::new(x, y, width, height)),
            _ => None,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

static RE_INVALID_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"|?*\x00-\x1f]"#).unwrap());

/// Turn a user-typed report name into a `.docx` path.
///
/// * `None` or blank → [`DEFAULT_REPORT_NAME`]
/// * characters that are invalid in file names are dropped from the file part
/// * `.docx` is appended unless already present (any case)
pub fn resolve_report_path(input: Option<&str>) -> PathBuf {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return PathBuf::from(DEFAULT_REPORT_NAME);
    };

    let path = Path::new(raw);
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = RE_INVALID_FILE_CHARS.replace_all(&file, "").trim().to_string();

    if file.is_empty() || file.eq_ignore_ascii_case(".docx") {
        return path.with_file_name(DEFAULT_REPORT_NAME);
    }
    let file = if file.to_lowercase().ends_with(".docx") {
        file
    } else {
        format!("{file}.docx")
    };
    path.with_file_name(file)
}

fn is_valid_date_format(fmt: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        config.validate().expect("default config validates");
        assert_eq!(config.slots.len(), 1);
        assert_eq!(config.slots[0].marker, "[GRAPH_1]");
        assert_eq!(config.output, PathBuf::from(DEFAULT_REPORT_NAME));
    }

    #[test]
    fn interactive_graphs_numbers_markers() {
        let config = ReportConfig::builder().interactive_graphs(3).build().unwrap();
        let markers: Vec<&str> = config.slots.iter().map(|s| s.marker.as_str()).collect();
        assert_eq!(markers, vec!["[GRAPH_1]", "[GRAPH_2]", "[GRAPH_3]"]);
        assert_eq!(config.slots[2].label, "Graph 3");
    }

    #[test]
    fn first_slot_replaces_default() {
        let config = ReportConfig::builder()
            .slot(GraphSlot::new("[A]", "A", CaptureSource::region(0, 0, 10, 10)))
            .build()
            .unwrap();
        assert_eq!(config.slots.len(), 1);
        assert_eq!(config.slots[0].marker, "[A]");
    }

    #[test]
    fn overlapping_markers_fail_validation() {
        let err = ReportConfig::builder()
            .slots(vec![
                GraphSlot::new("GRAPH_1", "a", CaptureSource::Interactive),
                GraphSlot::new("GRAPH_10", "b", CaptureSource::Interactive),
            ])
            .build()
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn empty_slots_and_zero_regions_fail() {
        assert!(ReportConfig::builder().slots(vec![]).build().is_err());
        assert!(ReportConfig::builder()
            .slot(GraphSlot::new("[A]", "A", CaptureSource::region(0, 0, 0, 10)))
            .build()
            .is_err());
    }

    #[test]
    fn slot_width_is_validated() {
        let ok = ReportConfig::builder()
            .slot(GraphSlot::new("[DATE]", "Test date", CaptureSource::region(800, 50, 200, 50)).with_width(2.0))
            .build();
        assert!(ok.is_ok());
        let bad = ReportConfig::builder()
            .slot(GraphSlot::new("[DATE]", "Test date", CaptureSource::Interactive).with_width(0.0))
            .build();
        assert!(matches!(bad.unwrap_err(), ReportError::InvalidConfig(_)));
    }

    #[test]
    fn bad_date_format_fails() {
        assert!(ReportConfig::builder().date_format("%Q").build().is_err());
        // a fixed timestamp makes the format irrelevant
        assert!(ReportConfig::builder()
            .date_format("%Q")
            .timestamp("today")
            .build()
            .is_ok());
    }

    #[test]
    fn timestamp_override() {
        let config = ReportConfig::builder().timestamp("01-01-2024 00:00:00").build().unwrap();
        assert_eq!(config.timestamp_now(), "01-01-2024 00:00:00");

        let now = ReportConfig::builder().date_format("%Y").build().unwrap().timestamp_now();
        assert_eq!(now.len(), 4);
    }

    #[test]
    fn report_name_resolution() {
        assert_eq!(resolve_report_path(None), PathBuf::from(DEFAULT_REPORT_NAME));
        assert_eq!(resolve_report_path(Some("   ")), PathBuf::from(DEFAULT_REPORT_NAME));
        assert_eq!(resolve_report_path(Some("week 12")), PathBuf::from("week 12.docx"));
        assert_eq!(resolve_report_path(Some("Final.DOCX")), PathBuf::from("Final.DOCX"));
        assert_eq!(resolve_report_path(Some("a?b*c")), PathBuf::from("abc.docx"));
        assert_eq!(
            resolve_report_path(Some("reports/run1")),
            PathBuf::from("reports/run1.docx")
        );
    }

    #[test]
    fn json_round_trip_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(
            &path,
            r#"{
                "output": "lab.docx",
                "export_pdf": true,
                "slots": [
                    {"marker": "[GRAPH_1]", "label": "Pressure", "source": {"mode": "region", "x": 100, "y": 100, "width": 600, "height": 400}},
                    {"marker": "[GRAPH_2]", "label": "Scope", "source": {"mode": "window", "title": "Oscilloscope"}},
                    {"marker": "[GRAPH_3]", "label": "Free", "width_inches": 2.0}
                ]
            }"#,
        )
        .unwrap();

        let config = ReportConfig::from_json_file(&path).expect("parse");
        assert_eq!(config.output, PathBuf::from("lab.docx"));
        assert!(config.export_pdf);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(
            config.slots[0].source.rect(),
            Some(CaptureRect::new(100, 100, 600, 400))
        );
        assert_eq!(
            config.slots[1].source,
            CaptureSource::Window {
                title: "Oscilloscope".into()
            }
        );
        assert_eq!(config.slots[2].source, CaptureSource::Interactive);
        assert_eq!(config.slots[2].width_inches, Some(2.0));
        assert_eq!(config.slots[0].width_inches, None);
    }

    #[test]
    fn json_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ReportConfig::from_json_file(&path).unwrap_err(),
            ReportError::ConfigFile { .. }
        ));
    }

    #[test]
    fn zero_pdf_timeout_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, r#"{"export_pdf": true, "pdf_timeout_secs": 0}"#).unwrap();
        assert!(matches!(
            ReportConfig::from_json_file(&path).unwrap_err(),
            ReportError::InvalidConfig(_)
        ));

        // the builder clamps instead
        let config = ReportConfig::builder().pdf_timeout_secs(0).build().unwrap();
        assert_eq!(config.pdf_timeout_secs, 1);
        assert!(format!("{config:?}").contains("pdf_timeout_secs: 1"));
    }
}
