//! In-memory document model the binder works on.
//!
//! A [`Document`] is an ordered list of [`Block`]s. Paragraphs are exposed as
//! runs of text and inline images; every other body element (tables, section
//! breaks, ...) is an opaque block that is carried through to the saved file
//! untouched. Paragraphs loaded from a `.docx` keep their original XML form;
//! binder edits are mirrored onto it, so everything the model does not
//! represent survives the save.

use crate::pipeline::docx::{push_native_run, remove_marker_native};
use image::GenericImageView;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// DOCX drawing unit: English Metric Units per inch.
pub const EMU_PER_INCH: u32 = 914_400;

/// A document: ordered blocks plus, when loaded from disk, the original
/// package (styles, numbering, headers) used as the base when saving.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    pub(crate) package: Option<Box<docx_rs::Docx>>,
}

/// One top-level body element.
#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    /// Anything that is not a paragraph; preserved as-is.
    Opaque(OpaqueBlock),
}

#[derive(Debug, Clone)]
pub struct OpaqueBlock(pub(crate) Box<docx_rs::DocumentChild>);

/// A paragraph: optional style id and a sequence of runs.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    style: Option<String>,
    runs: Vec<Run>,
    pub(crate) native: Option<Box<docx_rs::Paragraph>>,
    modified: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text(TextRun),
    Image(InlineImage),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

/// A PNG picture placed inline in a paragraph.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub png: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub width_emu: u32,
    pub height_emu: u32,
    pub source: PathBuf,
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("png", &format_args!("<{} bytes>", self.png.len()))
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("width_emu", &self.width_emu)
            .field("height_emu", &self.height_emu)
            .field("source", &self.source)
            .finish()
    }
}

impl InlineImage {
    /// Decode the image at `path`, re-encode it as PNG and size it to
    /// `width_inches` with the aspect ratio preserved.
    ///
    /// Errors are returned as display strings; the binder attaches the
    /// placeholder they belong to.
    pub fn from_file(path: &Path, width_inches: f32) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
        let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
        let (pixel_width, pixel_height) = img.dimensions();
        if pixel_width == 0 || pixel_height == 0 {
            return Err("image has no pixels".into());
        }

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| e.to_string())?;

        let width_emu = (f64::from(width_inches) * f64::from(EMU_PER_INCH)).round() as u32;
        let height_emu =
            (f64::from(width_emu) * f64::from(pixel_height) / f64::from(pixel_width)).round() as u32;

        Ok(Self {
            png,
            pixel_width,
            pixel_height,
            width_emu,
            height_emu,
            source: path.to_path_buf(),
        })
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paragraphs(paragraphs: impl IntoIterator<Item = Paragraph>) -> Self {
        Self {
            blocks: paragraphs.into_iter().map(Block::Paragraph).collect(),
            package: None,
        }
    }

    pub(crate) fn from_parts(blocks: Vec<Block>, package: Option<Box<docx_rs::Docx>>) -> Self {
        Self { blocks, package }
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn into_parts(self) -> (Vec<Block>, Option<Box<docx_rs::Docx>>) {
        (self.blocks, self.package)
    }

    /// Paragraphs in document order, skipping opaque blocks.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Opaque(_) => None,
        })
    }

    pub(crate) fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Opaque(_) => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Concatenated paragraph texts, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when some paragraph contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.paragraphs().any(|p| p.text().contains(needle))
    }
}

impl Paragraph {
    /// A plain paragraph with a single text run (no run for empty text).
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![Run::Text(TextRun { text, bold: false })]
        };
        Self {
            runs,
            ..Self::default()
        }
    }

    pub(crate) fn from_native(
        style: Option<String>,
        runs: Vec<Run>,
        native: docx_rs::Paragraph,
    ) -> Self {
        Self {
            style,
            runs,
            native: Some(Box::new(native)),
            modified: false,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// True once the binder changed this paragraph.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Concatenated text of all text runs.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter_map(|r| match r {
                Run::Text(t) => Some(t.text.as_str()),
                Run::Image(_) => None,
            })
            .collect()
    }

    pub fn push_text(&mut self, text: impl Into<String>, bold: bool) {
        self.push_run(Run::Text(TextRun {
            text: text.into(),
            bold,
        }));
    }

    pub fn push_image(&mut self, image: InlineImage) {
        self.push_run(Run::Image(image));
    }

    fn push_run(&mut self, run: Run) {
        if let Some(native) = self.native.as_deref_mut() {
            push_native_run(native, run.clone());
        }
        self.runs.push(run);
        self.modified = true;
    }

    /// Remove every occurrence of `marker` from the paragraph text.
    ///
    /// Occurrences inside a single run are cut out of that run, keeping the
    /// other runs intact. When an occurrence spans runs, the model collapses
    /// into one text run; a loaded paragraph's native runs are trimmed in
    /// place instead. Returns `false` when the marker is absent.
    pub fn remove_marker(&mut self, marker: &str) -> bool {
        if marker.is_empty() || !self.text().contains(marker) {
            return false;
        }
        if let Some(native) = self.native.as_deref_mut() {
            remove_marker_native(native, marker);
        }

        for run in &mut self.runs {
            if let Run::Text(t) = run {
                if t.text.contains(marker) {
                    t.text = t.text.replace(marker, "");
                }
            }
        }

        if self.text().contains(marker) {
            let bold = self.runs.iter().find_map(|r| match r {
                Run::Text(t) => Some(t.bold),
                Run::Image(_) => None,
            });
            let text = self.text().replace(marker, "");
            let images = self
                .runs
                .drain(..)
                .filter(|r| matches!(r, Run::Image(_)));
            let mut runs = vec![Run::Text(TextRun {
                text,
                bold: bold.unwrap_or(false),
            })];
            runs.extend(images);
            self.runs = runs;
        }

        self.runs
            .retain(|r| !matches!(r, Run::Text(t) if t.text.is_empty()));
        self.modified = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn split(parts: &[(&str, bool)]) -> Paragraph {
        let mut p = Paragraph::default();
        for (text, bold) in parts {
            p.runs.push(Run::Text(TextRun {
                text: (*text).to_string(),
                bold: *bold,
            }));
        }
        p
    }

    #[test]
    fn remove_marker_inside_single_run() {
        let mut p = Paragraph::new("Intro [MARK] end");
        assert!(p.remove_marker("[MARK]"));
        assert_eq!(p.text(), "Intro  end");
        assert!(p.is_modified());
    }

    #[test]
    fn remove_marker_keeps_other_runs() {
        let mut p = split(&[("Title ", true), ("[MARK]", false), (" tail", false)]);
        assert!(p.remove_marker("[MARK]"));
        assert_eq!(p.text(), "Title  tail");
        // the bold run survives untouched
        assert_eq!(
            p.runs()[0],
            Run::Text(TextRun {
                text: "Title ".into(),
                bold: true
            })
        );
        assert_eq!(p.runs().len(), 2);
    }

    #[test]
    fn remove_marker_spanning_runs_collapses() {
        let mut p = split(&[("a [MA", false), ("RK] b", false)]);
        assert!(p.remove_marker("[MARK]"));
        assert_eq!(p.text(), "a  b");
        assert_eq!(p.runs().len(), 1);
    }

    #[test]
    fn remove_marker_absent() {
        let mut p = Paragraph::new("nothing here");
        assert!(!p.remove_marker("[MARK]"));
        assert!(!p.is_modified());
        assert!(!p.remove_marker(""));
    }

    #[test]
    fn document_text_and_contains() {
        let doc = Document::from_paragraphs([Paragraph::new("one"), Paragraph::new("two [X]")]);
        assert_eq!(doc.text(), "one\ntwo [X]");
        assert!(doc.contains("[X]"));
        assert_eq!(doc.paragraph_count(), 2);
    }

    #[test]
    fn inline_image_scales_to_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.png");
        RgbaImage::from_pixel(600, 400, Rgba([0, 128, 0, 255]))
            .save(&path)
            .unwrap();

        let img = InlineImage::from_file(&path, 6.0).expect("decodable");
        assert_eq!((img.pixel_width, img.pixel_height), (600, 400));
        assert_eq!(img.width_emu, 6 * EMU_PER_INCH);
        assert_eq!(img.height_emu, 4 * EMU_PER_INCH);
        assert!(img.png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn inline_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(InlineImage::from_file(&path, 6.0).is_err());
        assert!(InlineImage::from_file(&dir.path().join("missing.png"), 6.0).is_err());
    }
}
