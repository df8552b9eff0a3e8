//! Domain types for a translation pass.

use crate::document::ElementHandle;
use serde::{Deserialize, Serialize};

/// What kind of element a collected text item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// A table cell.
    TableCell,
    /// A shape's paragraph-structured text region.
    TextContainer,
    /// A shape's flat text property.
    DirectText,
}

/// A piece of translatable slide text and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub kind: ItemKind,

    /// Locator for diagnostics, e.g. `1.0.table.2.1`. Unique within one collection pass.
    pub path: String,

    /// Trimmed source text.
    pub text: String,

    /// Reference back into the document for rewriting.
    pub handle: ElementHandle,
}

impl TextItem {
    pub fn new(
        kind: ItemKind,
        path: impl Into<String>,
        text: impl Into<String>,
        handle: ElementHandle,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            text: text.into(),
            handle,
        }
    }
}

/// Aggregated counts for one translated file or slide subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Number of text items whose content changed.
    pub translated_count: usize,

    /// Number of slides whose notes were translated.
    pub translated_notes_count: usize,

    /// Number of top-level shapes on the processed slides.
    pub total_shapes: usize,

    /// Validation errors; a non-empty list means the request was skipped.
    pub errors: Vec<String>,
}

impl TranslationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one slide's outcome into the totals.
    pub fn record_slide(&mut self, outcome: &SlideOutcome, shape_count: usize) {
        self.translated_count += outcome.translated_count;
        if outcome.notes_translated {
            self.translated_notes_count += 1;
        }
        self.total_shapes += shape_count;
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What happened on a single slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub translated_count: usize,
    pub notes_translated: bool,
}
