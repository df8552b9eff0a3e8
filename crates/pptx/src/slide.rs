//! Slide and notes parts.

use crate::package::{Package, Relationships, NOTES_SLIDE_REL};
use crate::text::{body_text, ParagraphView, TextBodyView};
use crate::xml::{Element, XmlDocument};
use pptrans_core::document::{
    ElementHandle, ParagraphRef, Shape, ShapePath, Slide, TextRegion,
};
use pptrans_core::{Error, Result};
use std::collections::BTreeMap;

/// Shape elements that can appear in a shape tree or group, in any order.
const SHAPE_ELEMENTS: [&str; 7] = [
    "sp",
    "grpSp",
    "graphicFrame",
    "cxnSp",
    "pic",
    "contentPart",
    "AlternateContent",
];

const SHAPE_TREE: [&str; 2] = ["cSld", "spTree"];
const TABLE: [&str; 3] = ["graphic", "graphicData", "tbl"];

fn is_shape(element: &Element) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

fn shapes_of(container: &Element) -> impl Iterator<Item = &Element> {
    container.elements().filter(|e| is_shape(e))
}

fn shapes_of_mut(container: &mut Element) -> impl Iterator<Item = &mut Element> {
    container.elements_mut().filter(|e| is_shape(e))
}

fn to_shape(element: &Element) -> Shape {
    match element.local_name() {
        "grpSp" => Shape::Group(shapes_of(element).map(to_shape).collect()),
        "graphicFrame" => match element.descend(&TABLE) {
            Some(table) => Shape::Table(
                table
                    .children_named("tr")
                    .map(|row| {
                        row.children_named("tc")
                            .map(|cell| cell.child("txBody").map(body_text).unwrap_or_default())
                            .collect()
                    })
                    .collect(),
            ),
            None => Shape::Other,
        },
        "sp" => match element.child("txBody") {
            Some(body) => Shape::TextRegion(body_text(body)),
            None => Shape::Other,
        },
        _ => Shape::Other,
    }
}

fn shape_ref<'a>(tree: &'a Element, path: &ShapePath) -> Option<&'a Element> {
    path.indices()
        .iter()
        .try_fold(tree, |container, &index| shapes_of(container).nth(index))
}

fn shape_mut<'a>(tree: &'a mut Element, path: &ShapePath) -> Option<&'a mut Element> {
    let mut current = tree;
    for &index in path.indices() {
        let container = current;
        current = shapes_of_mut(container).nth(index)?;
    }
    Some(current)
}

/// Text body of a table cell, created when the cell has none.
fn cell_body_mut(frame: &mut Element, row: usize, column: usize) -> Option<&mut Element> {
    let cell = frame
        .descend_mut(&TABLE)?
        .nth_child_mut("tr", row)?
        .nth_child_mut("tc", column)?;
    let body = cell.ensure_child("txBody");
    if body.count_children("p") == 0 {
        body.ensure_child("bodyPr");
        body.ensure_child("lstStyle");
        body.ensure_child("p");
    }
    Some(body)
}

/// Whether `shape` is the body placeholder of a notes page.
fn is_notes_body(shape: &Element) -> bool {
    shape.local_name() == "sp"
        && shape
            .descend(&["nvSpPr", "nvPr", "ph"])
            .and_then(|ph| ph.attr("type"))
            == Some("body")
}

/// A notes page with its relationships.
#[derive(Debug, Clone)]
struct NotesPage {
    part: String,
    xml: XmlDocument,
    rels: Relationships,
}

impl NotesPage {
    fn body(&self) -> Option<&Element> {
        shapes_of(self.xml.root.descend(&SHAPE_TREE)?)
            .find(|shape| is_notes_body(shape))?
            .child("txBody")
    }

    fn body_mut(&mut self) -> Option<TextBodyView<'_>> {
        let tree = self.xml.root.descend_mut(&SHAPE_TREE)?;
        let body = shapes_of_mut(tree)
            .find(|shape| is_notes_body(shape))?
            .child_mut("txBody")?;
        Some(TextBodyView::new(body, &mut self.rels))
    }
}

/// One slide part, its relationships and its notes page.
#[derive(Debug, Clone)]
pub struct PptxSlide {
    part: String,
    xml: XmlDocument,
    rels: Relationships,
    notes: Option<NotesPage>,
}

impl PptxSlide {
    pub fn load(package: &Package, part: &str) -> Result<Self> {
        let xml = package.xml_part(part)?;
        let rels = package.relationships(part)?;

        let notes = match rels.part_of_type(NOTES_SLIDE_REL) {
            Some(notes_part) if package.part(&notes_part).is_some() => Some(NotesPage {
                xml: package.xml_part(&notes_part)?,
                rels: package.relationships(&notes_part)?,
                part: notes_part,
            }),
            Some(notes_part) => {
                log::warn!("{} points at missing notes part {}", part, notes_part);
                None
            }
            None => None,
        };

        Ok(Self {
            part: part.to_string(),
            xml,
            rels,
            notes,
        })
    }

    pub fn part_name(&self) -> &str {
        &self.part
    }

    /// Serialize the slide, its notes and any changed relationships into `parts`.
    pub fn write_parts(&self, parts: &mut BTreeMap<String, Vec<u8>>) -> Result<()> {
        parts.insert(self.part.clone(), self.xml.to_bytes()?);
        if self.rels.is_dirty() {
            parts.insert(self.rels.part_name(), self.rels.to_bytes()?);
        }
        if let Some(notes) = &self.notes {
            parts.insert(notes.part.clone(), notes.xml.to_bytes()?);
            if notes.rels.is_dirty() {
                parts.insert(notes.rels.part_name(), notes.rels.to_bytes()?);
            }
        }
        Ok(())
    }

    fn shape_element_mut(&mut self, path: &ShapePath) -> Option<&mut Element> {
        shape_mut(self.xml.root.descend_mut(&SHAPE_TREE)?, path)
    }
}

impl Slide for PptxSlide {
    fn shapes(&self) -> Vec<Shape> {
        match self.xml.root.descend(&SHAPE_TREE) {
            Some(tree) => shapes_of(tree).map(to_shape).collect(),
            None => Vec::new(),
        }
    }

    fn notes_text(&self) -> Option<String> {
        self.notes.as_ref()?.body().map(body_text)
    }

    fn set_notes_text(&mut self, text: &str) -> Result<()> {
        let mut body = self
            .notes
            .as_mut()
            .and_then(NotesPage::body_mut)
            .ok_or_else(|| Error::PackageError(format!("{} has no notes text", self.part)))?;
        body.set_text(text);
        Ok(())
    }

    fn text_paragraphs(&self, handle: &ElementHandle) -> Option<Vec<Box<dyn ParagraphRef + '_>>> {
        let tree = self.xml.root.descend(&SHAPE_TREE)?;
        let body = match handle {
            ElementHandle::TextBody(path) => shape_ref(tree, path)?.child("txBody")?,
            ElementHandle::Cell { shape, row, column } => shape_ref(tree, shape)?
                .descend(&TABLE)?
                .children_named("tr")
                .nth(*row)?
                .children_named("tc")
                .nth(*column)?
                .child("txBody")?,
            ElementHandle::Shape(_) => return None,
        };
        let rels = &self.rels;
        Some(
            body.children_named("p")
                .map(|p| Box::new(ParagraphView::new(p, rels)) as Box<dyn ParagraphRef + '_>)
                .collect(),
        )
    }

    fn text_region_mut(&mut self, handle: &ElementHandle) -> Option<Box<dyn TextRegion + '_>> {
        let tree = self.xml.root.descend_mut(&SHAPE_TREE)?;
        let body = match handle {
            ElementHandle::TextBody(path) => shape_mut(tree, path)?.child_mut("txBody")?,
            ElementHandle::Cell { shape, row, column } => {
                cell_body_mut(shape_mut(tree, shape)?, *row, *column)?
            }
            ElementHandle::Shape(_) => return None,
        };
        Some(Box::new(TextBodyView::new(body, &mut self.rels)))
    }

    fn set_flat_text(&mut self, handle: &ElementHandle, text: &str) -> Result<()> {
        let path = match handle {
            ElementHandle::Shape(path) | ElementHandle::TextBody(path) => path,
            ElementHandle::Cell { shape, .. } => shape,
        };
        let part = self.part.clone();
        let shape = self
            .shape_element_mut(path)
            .ok_or_else(|| Error::FormattingError(format!("no shape at {} in {}", path, part)))?;
        if shape.local_name() != "sp" {
            return Err(Error::FormattingError(format!(
                "shape at {} in {} cannot hold text",
                path, part
            )));
        }

        let body = shape.ensure_child("txBody");
        if !body.has_child("bodyPr") {
            body.insert_child(Element::new("a:bodyPr"));
            body.insert_child(Element::new("a:lstStyle"));
        }
        let mut scratch = Relationships::empty(&part);
        TextBodyView::new(body, &mut scratch).set_text(text);
        Ok(())
    }
}
