//! Template resolution: load the configured `.docx` or generate a minimal one.

use super::docx::{load_docx, save_docx, STYLE_HEADING3, STYLE_TITLE};
use crate::config::{GraphSlot, ReportConfig};
use crate::document::{Document, Paragraph};
use crate::error::ReportError;
use tracing::{info, warn};

/// A template ready for binding.
#[derive(Debug, Clone)]
pub struct Template {
    pub document: Document,
    /// True when no template file existed and `document` was generated.
    pub generated: bool,
}

/// Title, then for every slot a `"{label}:"` heading and a paragraph that
/// holds only the marker.
pub fn minimal_template(title: &str, slots: &[GraphSlot]) -> Document {
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::new(title).with_style(STYLE_TITLE));
    for slot in slots {
        doc.push_paragraph(Paragraph::new(format!("{}:", slot.label)).with_style(STYLE_HEADING3));
        doc.push_paragraph(Paragraph::new(slot.marker.clone()));
    }
    doc
}

/// Resolve the template for `config`.
///
/// * no template path → generated in memory
/// * path does not exist → generated, and written there when
///   `save_generated_template` is set (a failed write is only logged)
/// * path exists → loaded; unreadable files are fatal
pub fn load_or_generate(config: &ReportConfig) -> Result<Template, ReportError> {
    let Some(path) = config.template.as_deref() else {
        return Ok(Template {
            document: minimal_template(&config.title, &config.slots),
            generated: true,
        });
    };

    if path.exists() {
        let document = load_docx(path)?;
        info!(
            "Loaded template {} ({} paragraphs)",
            path.display(),
            document.paragraph_count()
        );
        return Ok(Template {
            document,
            generated: false,
        });
    }

    info!("Template {} not found, generating a minimal one", path.display());
    let document = minimal_template(&config.title, &config.slots);
    if config.save_generated_template {
        match save_docx(document.clone(), path) {
            Ok(()) => info!("Saved generated template to {}", path.display()),
            Err(e) => warn!("Could not save generated template: {}", e),
        }
    }

    Ok(Template {
        document,
        generated: true,
    })
}
