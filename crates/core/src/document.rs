//! Document model interface.
//!
//! The translation core never owns presentation storage. A backend (such as
//! the PPTX package reader) implements these traits and hands out short-lived
//! views into its own elements; the core reads formatting through the `*Ref`
//! traits and rewrites text through the `*Mut` traits.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Index path of a shape inside a slide's shape tree, e.g. `0.2.1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShapePath(Vec<usize>);

impl ShapePath {
    /// Path of a top-level shape.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of the `index`-th child of this (group) shape.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// The indices from the slide root down to the shape.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for ShapePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

/// Reference to an element whose text can be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementHandle {
    /// A cell of a table shape.
    Cell {
        shape: ShapePath,
        row: usize,
        column: usize,
    },
    /// The paragraph-structured text body of a shape.
    TextBody(ShapePath),
    /// A shape that only exposes a flat text property.
    Shape(ShapePath),
}

/// A shape as exposed to the text collector, resolved once per pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A grouping shape and its children, in z-order.
    Group(Vec<Shape>),
    /// A table; each row lists the text of its cells.
    Table(Vec<Vec<String>>),
    /// A shape with a paragraph-structured text region.
    TextRegion(String),
    /// A shape with a flat text property only.
    FlatText(String),
    /// Anything without text (pictures, connectors, charts).
    Other,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distributed,
}

/// Paragraph spacing, either absolute or as a multiple of the line height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Spacing {
    Points(f64),
    Lines(f64),
}

/// An explicit 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6-hex-digit string such as `FF0000`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        })
    }

    /// Upper-case 6-hex-digit representation.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A run's font color as stored by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontColor {
    /// Explicit RGB value.
    Rgb(RgbColor),
    /// Reference into the document theme palette (e.g. `accent1`).
    Theme(String),
    /// Some other color kind the core does not carry over (presets, system colors).
    Other,
}

/// Low-level structural attributes of a paragraph (margins, bullet elements).
///
/// Child and attribute names are local names without any namespace prefix.
pub trait PropertyBag {
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
    fn has_child(&self, name: &str) -> bool;
    fn child_attribute(&self, child: &str, name: &str) -> Option<String>;
    fn remove_children(&mut self, name: &str);
    fn add_child(&mut self, name: &str, attributes: &[(&str, &str)]);
}

/// Read access to a text run.
pub trait RunRef {
    fn text(&self) -> String;
    fn font_name(&self) -> Option<String>;
    /// Font size in points.
    fn font_size(&self) -> Option<f64>;
    fn bold(&self) -> Option<bool>;
    fn italic(&self) -> Option<bool>;
    fn color(&self) -> Option<FontColor>;
    /// Target address of the run's click hyperlink.
    fn hyperlink(&self) -> Option<String>;
}

/// Write access to a text run.
pub trait RunMut: RunRef {
    fn set_text(&mut self, text: &str);
    fn set_font_name(&mut self, name: &str);
    fn set_font_size(&mut self, points: f64);
    fn set_bold(&mut self, bold: bool);
    fn set_italic(&mut self, italic: bool);
    fn set_color(&mut self, color: &FontColor) -> Result<()>;
    fn set_hyperlink(&mut self, url: &str) -> Result<()>;
}

/// Read access to a paragraph.
pub trait ParagraphRef {
    /// Outline (indent) level, 0 for top level.
    fn level(&self) -> u8;
    fn alignment(&self) -> Option<Alignment>;
    fn space_before(&self) -> Option<Spacing>;
    fn space_after(&self) -> Option<Spacing>;
    fn line_spacing(&self) -> Option<Spacing>;

    /// The structural attribute bag, or `None` when the backend has no such access.
    fn properties(&self) -> Option<&dyn PropertyBag>;

    fn run_count(&self) -> usize;
    fn run(&self, index: usize) -> Option<Box<dyn RunRef + '_>>;

    /// Concatenated text of all runs.
    fn text(&self) -> String {
        (0..self.run_count())
            .filter_map(|i| self.run(i))
            .map(|run| run.text())
            .collect()
    }
}

/// Write access to a paragraph.
pub trait ParagraphMut: ParagraphRef {
    fn set_level(&mut self, level: u8);
    fn set_alignment(&mut self, alignment: Alignment);
    fn set_space_before(&mut self, spacing: Spacing);
    fn set_space_after(&mut self, spacing: Spacing);
    fn set_line_spacing(&mut self, spacing: Spacing);

    /// The structural attribute bag, created on demand where supported.
    fn properties_mut(&mut self) -> Option<&mut dyn PropertyBag>;

    /// Remove every run, keeping paragraph-level properties.
    fn clear(&mut self);

    /// Append an empty run and return it.
    fn add_run(&mut self) -> Box<dyn RunMut + '_>;
}

/// A paragraph-structured text container.
pub trait TextRegion {
    fn paragraph_count(&self) -> usize;
    fn paragraph(&self, index: usize) -> Option<Box<dyn ParagraphRef + '_>>;
    fn paragraph_mut(&mut self, index: usize) -> Option<Box<dyn ParagraphMut + '_>>;

    /// Append an empty paragraph and return its index.
    fn add_paragraph(&mut self) -> usize;
    fn remove_paragraph(&mut self, index: usize);

    /// Reduce the region to a single empty paragraph.
    fn clear(&mut self);

    /// Paragraph texts joined by `\n`.
    fn text(&self) -> String;

    /// Replace all content with plain, unformatted text (one paragraph per line).
    fn set_text(&mut self, text: &str);

    /// Whether any run carries a hyperlink.
    fn has_hyperlinks(&self) -> bool {
        (0..self.paragraph_count())
            .filter_map(|i| self.paragraph(i))
            .any(|p| {
                (0..p.run_count())
                    .filter_map(|r| p.run(r))
                    .any(|run| run.hyperlink().is_some())
            })
    }
}

impl<T: TextRegion + ?Sized> TextRegion for &mut T {
    fn paragraph_count(&self) -> usize {
        (**self).paragraph_count()
    }

    fn paragraph(&self, index: usize) -> Option<Box<dyn ParagraphRef + '_>> {
        (**self).paragraph(index)
    }

    fn paragraph_mut(&mut self, index: usize) -> Option<Box<dyn ParagraphMut + '_>> {
        (**self).paragraph_mut(index)
    }

    fn add_paragraph(&mut self) -> usize {
        (**self).add_paragraph()
    }

    fn remove_paragraph(&mut self, index: usize) {
        (**self).remove_paragraph(index)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn text(&self) -> String {
        (**self).text()
    }

    fn set_text(&mut self, text: &str) {
        (**self).set_text(text)
    }

    fn has_hyperlinks(&self) -> bool {
        (**self).has_hyperlinks()
    }
}

/// One slide of a presentation.
pub trait Slide {
    /// The slide's top-level shapes in z-order.
    fn shapes(&self) -> Vec<Shape>;

    /// Text of the slide's notes page, if the slide has one.
    fn notes_text(&self) -> Option<String>;
    fn set_notes_text(&mut self, text: &str) -> Result<()>;

    /// Read-only paragraphs of the text region addressed by `handle`.
    fn text_paragraphs(&self, handle: &ElementHandle) -> Option<Vec<Box<dyn ParagraphRef + '_>>>;

    /// Paragraph-structured text region addressed by `handle`, if it has one.
    fn text_region_mut(&mut self, handle: &ElementHandle) -> Option<Box<dyn TextRegion + '_>>;

    /// Replace the flat text of the addressed element.
    fn set_flat_text(&mut self, handle: &ElementHandle, text: &str) -> Result<()>;
}

/// A loaded presentation document.
pub trait Presentation {
    fn slide_count(&self) -> usize;
    fn slide(&self, index: usize) -> Option<&dyn Slide>;
    fn slide_mut(&mut self, index: usize) -> Option<&mut dyn Slide>;
    fn save(&self, path: &Path) -> Result<()>;
}

/// Opens presentation files from disk.
pub trait PresentationLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Presentation>>;
}
