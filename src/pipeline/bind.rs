//! Placeholder binding: replace marker strings with captured content.
//!
//! For every [`PlaceholderEntry`], in the order the entries were configured,
//! paragraphs are scanned in document order and the first paragraph whose
//! text contains the marker receives the substitution:
//!
//! 1. the marker is removed from the paragraph text,
//! 2. a bold run `"{label}: {timestamp}"` is appended,
//! 3. the entry's image is appended as an inline picture at a fixed width.
//!
//! Binding is a pure function over a [`Document`]: the input is cloned, the
//! clone is modified and returned, nothing touches the disk. Any failure
//! aborts the whole pass so a half-bound document never reaches the saver.

use crate::document::{Document, InlineImage};
use crate::error::ReportError;
use crate::output::EntryResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// One insertion: which marker to replace, which image to embed, and the
/// label written in front of the time stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub marker: String,
    pub image_path: PathBuf,
    pub label: String,
    /// Overrides the width passed to [`bind`] for this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_inches: Option<f32>,
}

impl PlaceholderEntry {
    pub fn new(
        marker: impl Into<String>,
        image_path: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            image_path: image_path.into(),
            label: label.into(),
            width_inches: None,
        }
    }

    pub fn with_width(mut self, inches: Option<f32>) -> Self {
        self.width_inches = inches;
        self
    }
}

/// A successfully bound document plus where each entry landed.
#[derive(Debug, Clone)]
pub struct Bound {
    pub document: Document,
    pub entries: Vec<EntryResult>,
}

/// Reject marker sets whose matches would be ambiguous.
///
/// Markers must be non-empty and free of control characters, and no marker
/// may contain another (`[GRAPH_1]` vs `[GRAPH_10]` is fine, `GRAPH_1` vs
/// `GRAPH_10` is not).
pub fn validate_markers<'a>(
    markers: impl IntoIterator<Item = &'a str>,
) -> Result<(), ReportError> {
    let markers: Vec<&str> = markers.into_iter().collect();
    for (i, inner) in markers.iter().enumerate() {
        if inner.is_empty() {
            return Err(ReportError::InvalidConfig(
                "placeholder markers must not be empty".into(),
            ));
        }
        if inner.chars().any(char::is_control) {
            return Err(ReportError::InvalidConfig(format!(
                "placeholder marker {inner:?} contains a control character"
            )));
        }
        for (j, outer) in markers.iter().enumerate() {
            if i != j && outer.contains(inner) {
                return Err(ReportError::OverlappingMarkers {
                    inner: (*inner).to_string(),
                    outer: (*outer).to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Substitute every entry into a copy of `document`.
///
/// # Errors
/// * [`ReportError::OverlappingMarkers`] / [`ReportError::InvalidConfig`] for
///   an ambiguous marker set
/// * [`ReportError::MarkerNotFound`] when a marker occurs in no paragraph
/// * [`ReportError::ImageInsertFailure`] when an image is missing or
///   cannot be decoded
pub fn bind(
    document: &Document,
    entries: &[PlaceholderEntry],
    timestamp: &str,
    image_width_inches: f32,
) -> Result<Bound, ReportError> {
    validate_markers(entries.iter().map(|e| e.marker.as_str()))?;

    let mut document = document.clone();
    let mut results = Vec::with_capacity(entries.len());

    for entry in entries {
        let (index, paragraph) = document
            .paragraphs_mut()
            .enumerate()
            .find(|(_, p)| p.text().contains(&entry.marker))
            .ok_or_else(|| ReportError::MarkerNotFound {
                marker: entry.marker.clone(),
            })?;

        let width = entry.width_inches.unwrap_or(image_width_inches);
        let image = InlineImage::from_file(&entry.image_path, width).map_err(
            |detail| ReportError::ImageInsertFailure {
                marker: entry.marker.clone(),
                path: entry.image_path.clone(),
                detail,
            },
        )?;
        let (pixel_width, pixel_height) = (image.pixel_width, image.pixel_height);

        paragraph.remove_marker(&entry.marker);
        paragraph.push_text(format!("{}: {}", entry.label, timestamp), true);
        paragraph.push_image(image);

        debug!(
            "Bound '{}' into paragraph {} ({}x{} px)",
            entry.marker, index, pixel_width, pixel_height
        );

        results.push(EntryResult {
            marker: entry.marker.clone(),
            label: entry.label.clone(),
            paragraph_index: index,
            image_width: pixel_width,
            image_height: pixel_height,
        });
    }

    Ok(Bound {
        document,
        entries: results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Paragraph, Run, TextRun, EMU_PER_INCH};
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn substitutes_marker_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "g.png", 300, 150);
        let doc = Document::from_paragraphs([
            Paragraph::new("Heading"),
            Paragraph::new("Intro [MARK] end"),
        ]);

        let bound = bind(
            &doc,
            &[PlaceholderEntry::new("[MARK]", &img, "Graph")],
            "2024-05-01 10:00:00",
            6.0,
        )
        .expect("bind");

        let p = bound.document.paragraphs().nth(1).unwrap();
        assert_eq!(p.runs().len(), 3);
        assert_eq!(
            p.runs()[1],
            Run::Text(TextRun {
                text: "Graph: 2024-05-01 10:00:00".into(),
                bold: true
            })
        );
        match &p.runs()[2] {
            Run::Image(i) => {
                assert_eq!(i.width_emu, 6 * EMU_PER_INCH);
                assert_eq!(i.height_emu, 3 * EMU_PER_INCH);
            }
            other => panic!("expected image run, got {other:?}"),
        }
        // text of the paragraph is the marker-free original plus the label run
        assert!(p.text().starts_with("Intro  end"));
        assert_eq!(bound.entries[0].paragraph_index, 1);

        // input document untouched
        assert!(doc.contains("[MARK]"));
    }

    #[test]
    fn first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "g.png", 10, 10);
        let doc = Document::from_paragraphs([Paragraph::new("[M] a"), Paragraph::new("[M] b")]);

        let bound = bind(&doc, &[PlaceholderEntry::new("[M]", &img, "L")], "t", 1.0).unwrap();
        let texts: Vec<String> = bound.document.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts[0], " aL: t");
        assert_eq!(texts[1], "[M] b");
    }

    #[test]
    fn missing_marker_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "g.png", 10, 10);
        let doc = Document::from_paragraphs([Paragraph::new("no markers")]);

        let err = bind(
            &doc,
            &[PlaceholderEntry::new("[MISSING]", &img, "L")],
            "t",
            6.0,
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::MarkerNotFound { ref marker } if marker == "[MISSING]"));
    }

    #[test]
    fn missing_image_is_its_own_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::from_paragraphs([Paragraph::new("[G]")]);
        let err = bind(
            &doc,
            &[PlaceholderEntry::new("[G]", dir.path().join("nope.png"), "L")],
            "t",
            6.0,
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::ImageInsertFailure { .. }));
    }

    #[test]
    fn entries_follow_configuration_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 20, 10);
        let b = write_png(dir.path(), "b.png", 10, 20);
        // [B] comes first in the document, [A] first in the configuration
        let doc = Document::from_paragraphs([Paragraph::new("[B]"), Paragraph::new("[A]")]);

        let bound = bind(
            &doc,
            &[
                PlaceholderEntry::new("[A]", &a, "First"),
                PlaceholderEntry::new("[B]", &b, "Second"),
            ],
            "now",
            2.0,
        )
        .unwrap();

        assert_eq!(bound.entries[0].marker, "[A]");
        assert_eq!(bound.entries[0].paragraph_index, 1);
        assert_eq!(bound.entries[1].paragraph_index, 0);
        assert!(!bound.document.contains("[A]"));
        assert!(!bound.document.contains("[B]"));
        assert!(bound.document.contains("First: now"));
        assert!(bound.document.contains("Second: now"));
    }

    #[test]
    fn entry_width_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_png(dir.path(), "d.png", 200, 50);
        let doc = Document::from_paragraphs([Paragraph::new("[DATE]")]);

        let bound = bind(
            &doc,
            &[PlaceholderEntry::new("[DATE]", &img, "Test date").with_width(Some(2.0))],
            "t",
            6.0,
        )
        .unwrap();
        match &bound.document.paragraphs().next().unwrap().runs()[1] {
            Run::Image(i) => {
                assert_eq!(i.width_emu, 2 * EMU_PER_INCH);
                assert_eq!(i.height_emu, EMU_PER_INCH / 2);
            }
            other => panic!("expected image run, got {other:?}"),
        };
    }

    #[test]
    fn overlapping_markers_rejected() {
        assert!(validate_markers(["[GRAPH_1]", "[GRAPH_10]"]).is_ok());
        let err = validate_markers(["GRAPH_1", "GRAPH_10"]).unwrap_err();
        assert!(matches!(
            err,
            ReportError::OverlappingMarkers { ref inner, ref outer }
                if inner == "GRAPH_1" && outer == "GRAPH_10"
        ));
        assert!(matches!(
            validate_markers(["[X]", "[X]"]).unwrap_err(),
            ReportError::OverlappingMarkers { .. }
        ));
        assert!(matches!(
            validate_markers([""]).unwrap_err(),
            ReportError::InvalidConfig(_)
        ));
        assert!(matches!(
            validate_markers(["[A\tB]"]).unwrap_err(),
            ReportError::InvalidConfig(_)
        ));
    }
}
