//! Decide whether a slide must be translated item by item.
//!
//! Batched responses are reassembled by substring matching, which only works
//! for plain paragraphs. Indentation, bullets and mixed run styling go through
//! the single-item rewrite instead.

use crate::document::Slide;
use crate::formatting::{extract_paragraph, ParagraphFormat};
use crate::types::{ItemKind, TextItem};
use std::collections::HashSet;

/// Whether any text region among `items` carries complex formatting.
pub fn slide_is_complex(slide: &dyn Slide, items: &[TextItem]) -> bool {
    items
        .iter()
        .filter(|item| item.kind == ItemKind::TextContainer)
        .any(|item| match slide.text_paragraphs(&item.handle) {
            Some(paragraphs) => {
                let formats: Vec<ParagraphFormat> =
                    paragraphs.iter().map(|p| extract_paragraph(&**p)).collect();
                formats_are_complex(&formats)
            }
            None => false,
        })
}

/// Whether any paragraph is indented, bulleted, or mixes run styles.
pub fn formats_are_complex(formats: &[ParagraphFormat]) -> bool {
    formats.iter().any(|format| {
        if format.level > 0 {
            log::debug!("Found indented paragraph with level {}", format.level);
            return true;
        }
        if format.has_bullet_element {
            log::debug!("Found bullet formatting");
            return true;
        }
        if has_mixed_styles(format) {
            log::debug!("Found multiple formatting styles");
            return true;
        }
        false
    })
}

fn has_mixed_styles(format: &ParagraphFormat) -> bool {
    if format.runs.len() <= 1 {
        return false;
    }
    let colors: HashSet<_> = format.runs.iter().filter_map(|r| r.color.as_ref()).collect();
    let italics: HashSet<_> = format.runs.iter().map(|r| r.italic).collect();
    colors.len() > 1 || italics.len() > 1
}
