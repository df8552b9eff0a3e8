//! DrawingML text bodies (`txBody`, `a:p`, `a:r`) exposed through the core text traits.

use crate::package::Relationships;
use crate::xml::{Element, Node};
use pptrans_core::document::{
    Alignment, FontColor, ParagraphMut, ParagraphRef, PropertyBag, RgbColor, RunMut, RunRef,
    Spacing, TextRegion,
};
use pptrans_core::{Error, Result};
use std::ops::{Deref, DerefMut};

/// Stands in for `a:br` in paragraph text.
pub const LINE_BREAK: char = '\u{b}';

const FILL_ELEMENTS: [&str; 6] = [
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
];

/// Text of one `a:p`: runs and fields in order, line breaks as [`LINE_BREAK`].
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Paragraph texts of a text body joined by `\n`.
pub fn body_text(body: &Element) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value {
        "l" => Some(Alignment::Left),
        "ctr" => Some(Alignment::Center),
        "r" => Some(Alignment::Right),
        "just" => Some(Alignment::Justify),
        "dist" => Some(Alignment::Distributed),
        _ => None,
    }
}

fn alignment_value(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "l",
        Alignment::Center => "ctr",
        Alignment::Right => "r",
        Alignment::Justify => "just",
        Alignment::Distributed => "dist",
    }
}

/// `spcPts` is in hundredths of a point, `spcPct` in thousandths of a percent.
fn read_spacing(container: &Element) -> Option<Spacing> {
    if let Some(points) = container.child("spcPts") {
        let value: f64 = points.attr("val")?.parse().ok()?;
        return Some(Spacing::Points(value / 100.0));
    }
    let percent = container.child("spcPct")?;
    let value: f64 = percent.attr("val")?.parse().ok()?;
    Some(Spacing::Lines(value / 100_000.0))
}

fn write_spacing(container: &mut Element, spacing: Spacing) {
    container.remove_children("spcPts");
    container.remove_children("spcPct");
    let (local, value) = match spacing {
        Spacing::Points(points) => ("spcPts", points * 100.0),
        Spacing::Lines(lines) => ("spcPct", lines * 100_000.0),
    };
    let child = Element::new(container.qualify(local))
        .with_attr("val", &(value.round() as i64).to_string());
    container.insert_child(child);
}

fn read_color(fill: &Element) -> Option<FontColor> {
    let color = fill.elements().next()?;
    let value = color.attr("val");
    Some(match color.local_name() {
        "srgbClr" => value
            .and_then(RgbColor::from_hex)
            .map(FontColor::Rgb)
            .unwrap_or(FontColor::Other),
        "schemeClr" => value
            .map(|v| FontColor::Theme(v.to_string()))
            .unwrap_or(FontColor::Other),
        _ => FontColor::Other,
    })
}

/// View of an `a:r` element.
pub struct RunView<E, R> {
    run: E,
    rels: R,
}

impl<E, R> RunView<E, R> {
    pub fn new(run: E, rels: R) -> Self {
        Self { run, rels }
    }
}

impl<E: Deref<Target = Element>, R> RunView<E, R> {
    fn properties(&self) -> Option<&Element> {
        self.run.child("rPr")
    }
}

impl<E: Deref<Target = Element>, R: Deref<Target = Relationships>> RunRef for RunView<E, R> {
    fn text(&self) -> String {
        self.run.child("t").map(Element::text).unwrap_or_default()
    }

    fn font_name(&self) -> Option<String> {
        let latin = self.properties()?.child("latin")?;
        latin.attr("typeface").map(str::to_string)
    }

    fn font_size(&self) -> Option<f64> {
        let size: f64 = self.properties()?.attr("sz")?.parse().ok()?;
        Some(size / 100.0)
    }

    fn bold(&self) -> Option<bool> {
        parse_bool(self.properties()?.attr("b")?)
    }

    fn italic(&self) -> Option<bool> {
        parse_bool(self.properties()?.attr("i")?)
    }

    fn color(&self) -> Option<FontColor> {
        read_color(self.properties()?.child("solidFill")?)
    }

    fn hyperlink(&self) -> Option<String> {
        let link = self.properties()?.child("hlinkClick")?;
        let id = link.attr_local("id")?;
        // Internal targets (slide jumps, custom shows) are not web links.
        self.rels
            .get(id)
            .filter(|rel| rel.external)
            .map(|rel| rel.target.clone())
    }
}

impl<E: DerefMut<Target = Element>, R: DerefMut<Target = Relationships>> RunMut
    for RunView<E, R>
{
    fn set_text(&mut self, text: &str) {
        self.run.ensure_child("t").set_text(text);
    }

    fn set_font_name(&mut self, name: &str) {
        self.run
            .ensure_child("rPr")
            .ensure_child("latin")
            .set_attr("typeface", name);
    }

    fn set_font_size(&mut self, points: f64) {
        let size = (points * 100.0).round() as i64;
        self.run.ensure_child("rPr").set_attr("sz", &size.to_string());
    }

    fn set_bold(&mut self, bold: bool) {
        self.run
            .ensure_child("rPr")
            .set_attr("b", if bold { "1" } else { "0" });
    }

    fn set_italic(&mut self, italic: bool) {
        self.run
            .ensure_child("rPr")
            .set_attr("i", if italic { "1" } else { "0" });
    }

    fn set_color(&mut self, color: &FontColor) -> Result<()> {
        let (local, value) = match color {
            FontColor::Rgb(rgb) => ("srgbClr", rgb.to_hex()),
            FontColor::Theme(reference) => ("schemeClr", reference.clone()),
            FontColor::Other => {
                return Err(Error::FormattingError(
                    "only RGB and theme colors can be written".to_string(),
                ))
            }
        };

        let properties = self.run.ensure_child("rPr");
        for fill in FILL_ELEMENTS {
            properties.remove_children(fill);
        }
        let fill = properties.ensure_child("solidFill");
        let color = Element::new(fill.qualify(local)).with_attr("val", &value);
        fill.insert_child(color);
        Ok(())
    }

    fn set_hyperlink(&mut self, url: &str) -> Result<()> {
        let id = self.rels.add_external_hyperlink(url);
        self.run
            .ensure_child("rPr")
            .ensure_child("hlinkClick")
            .set_attr("r:id", &id);
        Ok(())
    }
}

/// View of an `a:p` element.
pub struct ParagraphView<E, R> {
    paragraph: E,
    rels: R,
}

impl<E, R> ParagraphView<E, R> {
    pub fn new(paragraph: E, rels: R) -> Self {
        Self { paragraph, rels }
    }
}

impl<E: Deref<Target = Element>, R> ParagraphView<E, R> {
    fn properties_element(&self) -> Option<&Element> {
        self.paragraph.child("pPr")
    }
}

impl<E: Deref<Target = Element>, R: Deref<Target = Relationships>> ParagraphRef
    for ParagraphView<E, R>
{
    fn level(&self) -> u8 {
        self.properties_element()
            .and_then(|p| p.attr("lvl"))
            .and_then(|lvl| lvl.parse().ok())
            .unwrap_or(0)
    }

    fn alignment(&self) -> Option<Alignment> {
        parse_alignment(self.properties_element()?.attr("algn")?)
    }

    fn space_before(&self) -> Option<Spacing> {
        read_spacing(self.properties_element()?.child("spcBef")?)
    }

    fn space_after(&self) -> Option<Spacing> {
        read_spacing(self.properties_element()?.child("spcAft")?)
    }

    fn line_spacing(&self) -> Option<Spacing> {
        read_spacing(self.properties_element()?.child("lnSpc")?)
    }

    fn properties(&self) -> Option<&dyn PropertyBag> {
        self.properties_element().map(|p| p as &dyn PropertyBag)
    }

    fn run_count(&self) -> usize {
        self.paragraph.count_children("r")
    }

    fn run(&self, index: usize) -> Option<Box<dyn RunRef + '_>> {
        let run = self.paragraph.children_named("r").nth(index)?;
        Some(Box::new(RunView::new(run, &*self.rels)))
    }

    fn text(&self) -> String {
        paragraph_text(&self.paragraph)
    }
}

impl<E: DerefMut<Target = Element>, R: DerefMut<Target = Relationships>> ParagraphMut
    for ParagraphView<E, R>
{
    fn set_level(&mut self, level: u8) {
        let properties = self.paragraph.ensure_child("pPr");
        if level == 0 {
            properties.remove_attr("lvl");
        } else {
            properties.set_attr("lvl", &level.to_string());
        }
    }

    fn set_alignment(&mut self, alignment: Alignment) {
        self.paragraph
            .ensure_child("pPr")
            .set_attr("algn", alignment_value(alignment));
    }

    fn set_space_before(&mut self, spacing: Spacing) {
        write_spacing(self.paragraph.ensure_child("pPr").ensure_child("spcBef"), spacing);
    }

    fn set_space_after(&mut self, spacing: Spacing) {
        write_spacing(self.paragraph.ensure_child("pPr").ensure_child("spcAft"), spacing);
    }

    fn set_line_spacing(&mut self, spacing: Spacing) {
        write_spacing(self.paragraph.ensure_child("pPr").ensure_child("lnSpc"), spacing);
    }

    fn properties_mut(&mut self) -> Option<&mut dyn PropertyBag> {
        Some(self.paragraph.ensure_child("pPr") as &mut dyn PropertyBag)
    }

    fn clear(&mut self) {
        for local in ["r", "br", "fld"] {
            self.paragraph.remove_children(local);
        }
    }

    fn add_run(&mut self) -> Box<dyn RunMut + '_> {
        Box::new(AddedRun::new(&mut *self.paragraph, &mut *self.rels))
    }
}

/// Run appended to a paragraph. Text containing [`LINE_BREAK`] is written as
/// several `a:r` separated by `a:br`, and formatting goes to each of them.
pub struct AddedRun<'a> {
    paragraph: &'a mut Element,
    rels: &'a mut Relationships,
    /// Index of the first `a:r` among the paragraph's children.
    start: usize,
    /// Children written so far, breaks included.
    len: usize,
}

impl<'a> AddedRun<'a> {
    fn new(paragraph: &'a mut Element, rels: &'a mut Relationships) -> Self {
        let mut run = Element::new(paragraph.qualify("r"));
        run.insert_child(Element::new(paragraph.qualify("t")));
        let start = paragraph.insert_at_schema_position(run);
        Self {
            paragraph,
            rels,
            start,
            len: 1,
        }
    }

    fn nodes(&self) -> &[Node] {
        &self.paragraph.children[self.start..self.start + self.len]
    }

    fn first(&self) -> Option<RunView<&Element, &Relationships>> {
        match self.nodes().first()? {
            Node::Element(run) => Some(RunView::new(run, &*self.rels)),
            _ => None,
        }
    }

    fn push(&mut self, element: Element) {
        let index = self.start + self.len;
        self.paragraph.children.insert(index, Node::Element(element));
        self.len += 1;
    }

    fn each_run(&mut self, mut apply: impl FnMut(&mut dyn RunMut)) {
        let rels = &mut *self.rels;
        let end = self.start + self.len;
        for node in &mut self.paragraph.children[self.start..end] {
            if let Node::Element(run) = node {
                if run.local_name() == "r" {
                    apply(&mut RunView::new(run, &mut *rels));
                }
            }
        }
    }
}

impl RunRef for AddedRun<'_> {
    fn text(&self) -> String {
        let mut text = String::new();
        for node in self.nodes() {
            if let Node::Element(child) = node {
                match child.local_name() {
                    "r" => {
                        if let Some(t) = child.child("t") {
                            text.push_str(&t.text());
                        }
                    }
                    "br" => text.push(LINE_BREAK),
                    _ => {}
                }
            }
        }
        text
    }

    fn font_name(&self) -> Option<String> {
        self.first()?.font_name()
    }

    fn font_size(&self) -> Option<f64> {
        self.first()?.font_size()
    }

    fn bold(&self) -> Option<bool> {
        self.first()?.bold()
    }

    fn italic(&self) -> Option<bool> {
        self.first()?.italic()
    }

    fn color(&self) -> Option<FontColor> {
        self.first()?.color()
    }

    fn hyperlink(&self) -> Option<String> {
        self.first()?.hyperlink()
    }
}

impl RunMut for AddedRun<'_> {
    fn set_text(&mut self, text: &str) {
        // Keep only the first run; it is the template for the lines after it.
        self.paragraph
            .children
            .drain(self.start + 1..self.start + self.len);
        self.len = 1;

        let mut lines = text.split(LINE_BREAK);
        let Some(Node::Element(first)) = self.paragraph.children.get_mut(self.start) else {
            return;
        };
        first
            .ensure_child("t")
            .set_text(lines.next().unwrap_or_default());
        let template = first.clone();

        for line in lines {
            let br = Element::new(self.paragraph.qualify("br"));
            self.push(br);
            if !line.is_empty() {
                let mut run = template.clone();
                run.ensure_child("t").set_text(line);
                self.push(run);
            }
        }
    }

    fn set_font_name(&mut self, name: &str) {
        self.each_run(|run| run.set_font_name(name));
    }

    fn set_font_size(&mut self, points: f64) {
        self.each_run(|run| run.set_font_size(points));
    }

    fn set_bold(&mut self, bold: bool) {
        self.each_run(|run| run.set_bold(bold));
    }

    fn set_italic(&mut self, italic: bool) {
        self.each_run(|run| run.set_italic(italic));
    }

    fn set_color(&mut self, color: &FontColor) -> Result<()> {
        let mut result = Ok(());
        self.each_run(|run| {
            if let Err(e) = run.set_color(color) {
                result = Err(e);
            }
        });
        result
    }

    fn set_hyperlink(&mut self, url: &str) -> Result<()> {
        let mut result = Ok(());
        self.each_run(|run| {
            if let Err(e) = run.set_hyperlink(url) {
                result = Err(e);
            }
        });
        result
    }
}

/// A `txBody` element (shape, table cell or notes placeholder) as a [`TextRegion`].
pub struct TextBodyView<'a> {
    body: &'a mut Element,
    rels: &'a mut Relationships,
}

impl<'a> TextBodyView<'a> {
    pub fn new(body: &'a mut Element, rels: &'a mut Relationships) -> Self {
        Self { body, rels }
    }

    /// Children of `txBody` live in the DrawingML namespace even under `p:txBody`.
    fn drawing_name(&self, local: &str) -> String {
        let prefix = self
            .body
            .child("bodyPr")
            .and_then(Element::prefix)
            .unwrap_or("a");
        format!("{}:{}", prefix, local)
    }

    fn write_plain_line(&mut self, index: usize, line: &str) {
        let run_name = self.drawing_name("r");
        let text_name = self.drawing_name("t");
        let break_name = self.drawing_name("br");
        let Some(paragraph) = self.body.nth_child_mut("p", index) else {
            return;
        };
        for (i, piece) in line.split(LINE_BREAK).enumerate() {
            if i > 0 {
                paragraph.insert_child(Element::new(break_name.as_str()));
            }
            if !piece.is_empty() {
                let mut text = Element::new(text_name.as_str());
                text.set_text(piece);
                let mut run = Element::new(run_name.as_str());
                run.insert_child(text);
                paragraph.insert_child(run);
            }
        }
    }
}

impl TextRegion for TextBodyView<'_> {
    fn paragraph_count(&self) -> usize {
        self.body.count_children("p")
    }

    fn paragraph(&self, index: usize) -> Option<Box<dyn ParagraphRef + '_>> {
        let paragraph = self.body.children_named("p").nth(index)?;
        Some(Box::new(ParagraphView::new(paragraph, &*self.rels)))
    }

    fn paragraph_mut(&mut self, index: usize) -> Option<Box<dyn ParagraphMut + '_>> {
        let rels = &mut *self.rels;
        let paragraph = self.body.nth_child_mut("p", index)?;
        Some(Box::new(ParagraphView::new(paragraph, rels)))
    }

    fn add_paragraph(&mut self) -> usize {
        let paragraph = Element::new(self.drawing_name("p"));
        self.body.insert_child(paragraph);
        self.body.count_children("p") - 1
    }

    fn remove_paragraph(&mut self, index: usize) {
        self.body.remove_nth_child("p", index);
    }

    fn clear(&mut self) {
        while self.body.count_children("p") > 1 {
            let last = self.body.count_children("p") - 1;
            self.body.remove_nth_child("p", last);
        }
        if self.body.count_children("p") == 0 {
            self.add_paragraph();
        } else if let Some(mut first) = self.paragraph_mut(0) {
            first.clear();
        }
    }

    fn text(&self) -> String {
        body_text(self.body)
    }

    fn set_text(&mut self, text: &str) {
        self.clear();
        for (i, line) in text.split('\n').enumerate() {
            let index = if i == 0 { 0 } else { self.add_paragraph() };
            self.write_plain_line(index, line);
        }
    }
}
