//! DOCX reading and writing through `docx-rs`.
//!
//! ## Why keep the native paragraphs?
//!
//! The model in [`crate::document`] only understands text, bold and inline
//! pictures. A real template carries much more (fonts, hyperlinks, fields,
//! tracked changes, tables). Every loaded paragraph therefore keeps its
//! `docx_rs::Paragraph` and every non-paragraph body element is kept as an
//! opaque block. Edits to a loaded paragraph are applied to the native nodes
//! directly: the marker is cut out of the `w:t` text nodes it occupies and new
//! runs are appended, so every other child and run property is written back
//! as read.
//!
//! The output is written atomically: temp file next to the target, then
//! rename, so a failed encode never leaves a truncated report behind.

use crate::document::{Block, Document, OpaqueBlock, Paragraph, Run, TextRun};
use crate::error::ReportError;
use docx_rs::{InsertChild, ParagraphChild, RunChild};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Paragraph style ids used by generated documents.
pub const STYLE_TITLE: &str = "Title";
pub const STYLE_HEADING3: &str = "Heading3";

/// Read a `.docx` file into the document model.
pub fn load_docx(path: &Path) -> Result<Document, ReportError> {
    let bytes = std::fs::read(path).map_err(|e| ReportError::TemplateLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ReportError::TemplateLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let blocks: Vec<Block> = docx
        .document
        .children
        .iter()
        .map(|child| match child {
            docx_rs::DocumentChild::Paragraph(p) => Block::Paragraph(paragraph_from_native(p)),
            other => Block::Opaque(OpaqueBlock(Box::new(other.clone()))),
        })
        .collect();

    debug!("Loaded '{}': {} body blocks", path.display(), blocks.len());
    Ok(Document::from_parts(blocks, Some(Box::new(docx))))
}

/// Write the document to `path` as `.docx`, creating parent directories.
pub fn save_docx(document: Document, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let docx = to_native(document);

    let tmp_path = path.with_extension("docx.tmp");
    let file = File::create(&tmp_path).map_err(|e| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Err(e) = docx.build().pack(file) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ReportError::DocumentEncode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    info!("Saved document: {}", path.display());
    Ok(())
}

/// Package used for documents that were not loaded from disk.
fn base_package() -> docx_rs::Docx {
    use docx_rs::{Style, StyleType};

    docx_rs::Docx::new()
        .add_style(
            Style::new(STYLE_TITLE, StyleType::Paragraph)
                .name("Title")
                .size(56)
                .bold(),
        )
        .add_style(
            Style::new(STYLE_HEADING3, StyleType::Paragraph)
                .name("Heading 3")
                .size(24)
                .bold(),
        )
}

fn to_native(document: Document) -> docx_rs::Docx {
    let (blocks, package) = document.into_parts();
    let mut docx = package.map(|p| *p).unwrap_or_else(base_package);

    docx.document.children = blocks
        .into_iter()
        .map(|block| match block {
            Block::Paragraph(p) => docx_rs::DocumentChild::Paragraph(Box::new(paragraph_to_native(p))),
            Block::Opaque(OpaqueBlock(child)) => *child,
        })
        .collect();
    docx
}

fn paragraph_from_native(p: &docx_rs::Paragraph) -> Paragraph {
    let style = p.property.style.as_ref().map(|s| s.val.clone());
    Paragraph::from_native(style, paragraph_runs(p), p.clone())
}

/// Text runs of a native paragraph in reading order.
///
/// Runs nested in hyperlinks and tracked insertions are paragraph text;
/// deleted and moved-away runs are not.
pub(crate) fn paragraph_runs(p: &docx_rs::Paragraph) -> Vec<Run> {
    let mut native = Vec::new();
    collect_runs(&p.children, &mut native);

    native
        .into_iter()
        .filter_map(|run| {
            let text: String = run
                .children
                .iter()
                .filter_map(|rc| match rc {
                    RunChild::Text(t) => Some(t.text.as_str()),
                    RunChild::Tab(_) => Some("\t"),
                    RunChild::Break(_) => Some("\n"),
                    _ => None,
                })
                .collect();
            (!text.is_empty()).then(|| {
                Run::Text(TextRun {
                    text,
                    bold: is_bold(&run.run_property),
                })
            })
        })
        .collect()
}

fn collect_runs<'a>(children: &'a [ParagraphChild], out: &mut Vec<&'a docx_rs::Run>) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => out.push(run.as_ref()),
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, out),
            ParagraphChild::Insert(ins) => {
                for c in &ins.children {
                    if let InsertChild::Run(run) = c {
                        out.push(run.as_ref());
                    }
                }
            }
            _ => {}
        }
    }
}

/// `<w:b/>` and `<w:b w:val="1"/>` are bold, `<w:b w:val="0"/>` is not.
fn is_bold(props: &docx_rs::RunProperty) -> bool {
    props
        .bold
        .as_ref()
        .is_some_and(|b| *b != docx_rs::Bold::new().disable())
}

/// A piece of paragraph text: an editable `w:t` node, or a tab/break that
/// only contributes a character.
enum Segment<'a> {
    Text(&'a mut String),
    Fixed(&'static str),
}

impl Segment<'_> {
    fn as_str(&self) -> &str {
        match self {
            Segment::Text(t) => t.as_str(),
            Segment::Fixed(c) => c,
        }
    }
}

fn collect_segments<'a>(children: &'a mut [ParagraphChild], out: &mut Vec<Segment<'a>>) {
    for child in children.iter_mut() {
        match child {
            ParagraphChild::Run(run) => run_segments(run, out),
            ParagraphChild::Hyperlink(link) => collect_segments(&mut link.children, out),
            ParagraphChild::Insert(ins) => {
                for c in ins.children.iter_mut() {
                    if let InsertChild::Run(run) = c {
                        run_segments(run, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn run_segments<'a>(run: &'a mut docx_rs::Run, out: &mut Vec<Segment<'a>>) {
    for rc in run.children.iter_mut() {
        match rc {
            RunChild::Text(t) => out.push(Segment::Text(&mut t.text)),
            RunChild::Tab(_) => out.push(Segment::Fixed("\t")),
            RunChild::Break(_) => out.push(Segment::Fixed("\n")),
            _ => {}
        }
    }
}

/// Cut every occurrence of `marker` out of the paragraph's text nodes.
///
/// Each node keeps its run and run properties; an occurrence that spans
/// several runs is trimmed from each of them. Markers never contain control
/// characters, so an occurrence never covers a tab or break.
pub(crate) fn remove_marker_native(p: &mut docx_rs::Paragraph, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }

    let mut segments = Vec::new();
    collect_segments(&mut p.children, &mut segments);

    let mut removed = false;
    loop {
        let joined: String = segments.iter().map(Segment::as_str).collect();
        let Some(start) = joined.find(marker) else {
            break;
        };
        let end = start + marker.len();

        let mut offset = 0;
        for segment in segments.iter_mut() {
            let len = segment.as_str().len();
            let (from, to) = (start.max(offset), end.min(offset + len));
            if from < to {
                if let Segment::Text(text) = segment {
                    text.replace_range(from - offset..to - offset, "");
                }
            }
            offset += len;
        }
        removed = true;
    }
    removed
}

/// Append a model run to a native paragraph.
pub(crate) fn push_native_run(p: &mut docx_rs::Paragraph, run: Run) {
    p.children
        .push(ParagraphChild::Run(Box::new(run_to_native(run))));
}

fn paragraph_to_native(mut p: Paragraph) -> docx_rs::Paragraph {
    if let Some(native) = p.native.take() {
        return *native;
    }

    let mut out = match p.style() {
        Some(s) => docx_rs::Paragraph::new().style(s),
        None => docx_rs::Paragraph::new(),
    };
    for run in p.runs() {
        out = out.add_run(run_to_native(run.clone()));
    }
    out
}

fn run_to_native(run: Run) -> docx_rs::Run {
    match run {
        Run::Text(t) => {
            let r = docx_rs::Run::new().add_text(t.text);
            if t.bold {
                r.bold()
            } else {
                r
            }
        }
        Run::Image(img) => docx_rs::Run::new()
            .add_image(docx_rs::Pic::new(&img.png).size(img.width_emu, img.height_emu)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.docx");

        let doc = Document::from_paragraphs([
            Paragraph::new("REPORT").with_style(STYLE_TITLE),
            Paragraph::new("Intro [GRAPH_1] end"),
        ]);
        save_docx(doc, &path).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("docx.tmp").exists());

        let loaded = load_docx(&path).expect("load");
        let texts: Vec<String> = loaded.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["REPORT".to_string(), "Intro [GRAPH_1] end".to_string()]);
        assert_eq!(loaded.paragraphs().next().unwrap().style(), Some(STYLE_TITLE));
        assert!(loaded.paragraphs().all(|p| !p.is_modified()));
    }

    fn linked_paragraph() -> docx_rs::Paragraph {
        use docx_rs::{Hyperlink, HyperlinkType};

        docx_rs::Paragraph::new()
            .add_run(docx_rs::Run::new().add_text("See "))
            .add_hyperlink(
                Hyperlink::new("https://example.com/dash", HyperlinkType::External)
                    .add_run(docx_rs::Run::new().add_text("the dashboard [G")),
            )
            .add_run(docx_rs::Run::new().add_text("] end").italic())
    }

    #[test]
    fn hyperlink_text_is_paragraph_text() {
        let runs = paragraph_runs(&linked_paragraph());
        let text: String = runs
            .iter()
            .map(|r| match r {
                Run::Text(t) => t.text.as_str(),
                Run::Image(_) => "",
            })
            .collect();
        assert_eq!(text, "See the dashboard [G] end");
    }

    #[test]
    fn marker_across_runs_keeps_link_and_formatting() {
        let mut native = linked_paragraph();
        assert!(remove_marker_native(&mut native, "[G]"));
        assert!(!remove_marker_native(&mut native, "[G]"));

        assert_eq!(native.children.len(), 3);
        match &native.children[1] {
            ParagraphChild::Hyperlink(link) => match &link.children[0] {
                ParagraphChild::Run(run) => {
                    assert!(matches!(&run.children[0], RunChild::Text(t) if t.text == "the dashboard "));
                }
                other => panic!("expected run in link, got {other:?}"),
            },
            other => panic!("expected hyperlink, got {other:?}"),
        }
        match &native.children[2] {
            ParagraphChild::Run(run) => {
                assert!(run.run_property.italic.is_some());
                assert!(matches!(&run.children[0], RunChild::Text(t) if t.text == " end"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn tracked_insertion_is_searched() {
        let mut native = docx_rs::Paragraph::new()
            .add_run(docx_rs::Run::new().add_text("before "))
            .add_insert(docx_rs::Insert::new(docx_rs::Run::new().add_text("[INS]")));
        assert!(remove_marker_native(&mut native, "[INS]"));
        assert!(matches!(&native.children[1], ParagraphChild::Insert(_)));
        let text: String = paragraph_runs(&native)
            .into_iter()
            .filter_map(|r| match r {
                Run::Text(t) => Some(t.text),
                Run::Image(_) => None,
            })
            .collect();
        assert_eq!(text, "before ");
    }

    #[test]
    fn disabled_bold_is_not_bold() {
        let native = docx_rs::Paragraph::new()
            .add_run(docx_rs::Run::new().add_text("off").disable_bold())
            .add_run(docx_rs::Run::new().add_text("on").bold());
        let runs = paragraph_runs(&native);
        assert_eq!(
            runs,
            vec![
                Run::Text(TextRun { text: "off".into(), bold: false }),
                Run::Text(TextRun { text: "on".into(), bold: true }),
            ]
        );
    }

    #[test]
    fn edited_loaded_paragraph_is_written_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.docx");
        let file = File::create(&path).unwrap();
        docx_rs::Docx::new()
            .add_paragraph(linked_paragraph())
            .build()
            .pack(file)
            .unwrap();

        let mut doc = load_docx(&path).unwrap();
        let p = doc.paragraphs_mut().next().unwrap();
        assert!(p.remove_marker("[G]"));
        p.push_text("Graph: now", true);

        let out = dir.path().join("out.docx");
        save_docx(doc, &out).unwrap();
        let reloaded = load_docx(&out).unwrap();
        assert_eq!(
            reloaded.paragraphs().next().unwrap().text(),
            "See the dashboard  endGraph: now"
        );
    }

    #[test]
    fn load_rejects_non_docx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain text").unwrap();
        let err = load_docx(&path).unwrap_err();
        assert!(matches!(err, ReportError::TemplateLoad { .. }));
    }

    #[test]
    fn load_missing_file() {
        let err = load_docx(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, ReportError::TemplateLoad { .. }));
    }
}
