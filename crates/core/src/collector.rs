//! Collect translatable text items from a slide.

use crate::document::{ElementHandle, Shape, ShapePath, Slide};
use crate::filter::TextFilter;
use crate::types::{ItemKind, TextItem};

/// Everything translatable on one slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideTexts {
    /// Items in shape-tree order.
    pub items: Vec<TextItem>,
    /// Trimmed notes text, empty when the slide has no notes.
    pub notes: String,
}

/// Walk the slide's shape tree and collect every text that should be translated.
pub fn collect_slide(slide: &dyn Slide, filter: &TextFilter) -> SlideTexts {
    let mut items = Vec::new();
    for (index, shape) in slide.shapes().iter().enumerate() {
        collect_shape(shape, ShapePath::root(index), filter, &mut items);
    }

    let notes = slide
        .notes_text()
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    SlideTexts { items, notes }
}

fn collect_shape(shape: &Shape, path: ShapePath, filter: &TextFilter, items: &mut Vec<TextItem>) {
    match shape {
        Shape::Group(children) => {
            for (index, child) in children.iter().enumerate() {
                collect_shape(child, path.child(index), filter, items);
            }
        }
        Shape::Table(rows) => {
            for (row, cells) in rows.iter().enumerate() {
                for (column, text) in cells.iter().enumerate() {
                    let text = text.trim();
                    if filter.should_skip(text) {
                        continue;
                    }
                    items.push(TextItem::new(
                        ItemKind::TableCell,
                        format!("{}.table.{}.{}", path, row, column),
                        text,
                        ElementHandle::Cell {
                            shape: path.clone(),
                            row,
                            column,
                        },
                    ));
                }
            }
        }
        Shape::TextRegion(text) => {
            let text = text.trim();
            if !filter.should_skip(text) {
                items.push(TextItem::new(
                    ItemKind::TextContainer,
                    format!("{}.text_frame", path),
                    text,
                    ElementHandle::TextBody(path),
                ));
            }
        }
        Shape::FlatText(text) => {
            let text = text.trim();
            if !filter.should_skip(text) {
                items.push(TextItem::new(
                    ItemKind::DirectText,
                    format!("{}.text", path),
                    text,
                    ElementHandle::Shape(path),
                ));
            }
        }
        Shape::Other => {}
    }
}
