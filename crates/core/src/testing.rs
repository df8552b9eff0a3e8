//! In-memory document model and scripted translation service for tests.

use crate::document::{
    Alignment, ElementHandle, FontColor, ParagraphMut, ParagraphRef, Presentation,
    PresentationLoader, PropertyBag, RgbColor, RunMut, RunRef, Shape, ShapePath, Slide, Spacing,
    TextRegion,
};
use crate::engine::service::{ServiceRequest, TranslationService};
use crate::engine::{prompts, response};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemProps {
    attributes: BTreeMap<String, String>,
    children: Vec<(String, Vec<(String, String)>)>,
}

impl MemProps {
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn push_child(&mut self, name: &str, attributes: &[(&str, &str)]) -> &mut Self {
        self.add_child(name, attributes);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.children.iter().any(|(child, _)| child == name)
    }

    pub fn child_attr(&self, child: &str, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|(c, _)| c == child)
            .and_then(|(_, attrs)| attrs.iter().find(|(k, _)| k == name))
            .map(|(_, v)| v.as_str())
    }
}

impl PropertyBag for MemProps {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.set(name, value);
    }

    fn has_child(&self, name: &str) -> bool {
        self.has(name)
    }

    fn child_attribute(&self, child: &str, name: &str) -> Option<String> {
        self.child_attr(child, name).map(str::to_string)
    }

    fn remove_children(&mut self, name: &str) {
        self.children.retain(|(child, _)| child != name);
    }

    fn add_child(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.children.push((
            name.to_string(),
            attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemRun {
    pub text: String,
    pub font: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<FontColor>,
    pub link: Option<String>,
}

impl MemRun {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn font(mut self, name: &str) -> Self {
        self.font = Some(name.to_string());
        self
    }

    pub fn size(mut self, points: f64) -> Self {
        self.size = Some(points);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn rgb(mut self, rgb: RgbColor) -> Self {
        self.color = Some(FontColor::Rgb(rgb));
        self
    }

    pub fn theme(mut self, reference: &str) -> Self {
        self.color = Some(FontColor::Theme(reference.to_string()));
        self
    }

    pub fn link(mut self, url: &str) -> Self {
        self.link = Some(url.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemParagraph {
    pub level: u8,
    pub alignment: Option<Alignment>,
    pub space_before: Option<Spacing>,
    pub space_after: Option<Spacing>,
    pub line_spacing: Option<Spacing>,
    /// `None` reads as "no attribute bag access".
    pub props: Option<MemProps>,
    pub runs: Vec<MemRun>,
}

impl MemParagraph {
    pub fn new(runs: Vec<MemRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn props_mut(&mut self) -> &mut MemProps {
        self.props.get_or_insert_with(MemProps::default)
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Run view over a shared or exclusive borrow.
pub struct MemRunView<R>(pub R);

impl<R: Deref<Target = MemRun>> RunRef for MemRunView<R> {
    fn text(&self) -> String {
        self.0.text.clone()
    }

    fn font_name(&self) -> Option<String> {
        self.0.font.clone()
    }

    fn font_size(&self) -> Option<f64> {
        self.0.size
    }

    fn bold(&self) -> Option<bool> {
        self.0.bold
    }

    fn italic(&self) -> Option<bool> {
        self.0.italic
    }

    fn color(&self) -> Option<FontColor> {
        self.0.color.clone()
    }

    fn hyperlink(&self) -> Option<String> {
        self.0.link.clone()
    }
}

impl<R: DerefMut<Target = MemRun>> RunMut for MemRunView<R> {
    fn set_text(&mut self, text: &str) {
        self.0.text = text.to_string();
    }

    fn set_font_name(&mut self, name: &str) {
        self.0.font = Some(name.to_string());
    }

    fn set_font_size(&mut self, points: f64) {
        self.0.size = Some(points);
    }

    fn set_bold(&mut self, bold: bool) {
        self.0.bold = Some(bold);
    }

    fn set_italic(&mut self, italic: bool) {
        self.0.italic = Some(italic);
    }

    fn set_color(&mut self, color: &FontColor) -> Result<()> {
        self.0.color = Some(color.clone());
        Ok(())
    }

    fn set_hyperlink(&mut self, url: &str) -> Result<()> {
        self.0.link = Some(url.to_string());
        Ok(())
    }
}

/// Paragraph view over a shared or exclusive borrow.
pub struct MemParagraphView<P>(pub P);

impl<P: Deref<Target = MemParagraph>> ParagraphRef for MemParagraphView<P> {
    fn level(&self) -> u8 {
        self.0.level
    }

    fn alignment(&self) -> Option<Alignment> {
        self.0.alignment
    }

    fn space_before(&self) -> Option<Spacing> {
        self.0.space_before
    }

    fn space_after(&self) -> Option<Spacing> {
        self.0.space_after
    }

    fn line_spacing(&self) -> Option<Spacing> {
        self.0.line_spacing
    }

    fn properties(&self) -> Option<&dyn PropertyBag> {
        self.0.props.as_ref().map(|p| p as &dyn PropertyBag)
    }

    fn run_count(&self) -> usize {
        self.0.runs.len()
    }

    fn run(&self, index: usize) -> Option<Box<dyn RunRef + '_>> {
        self.0
            .runs
            .get(index)
            .map(|r| Box::new(MemRunView(r)) as Box<dyn RunRef + '_>)
    }
}

impl<P: DerefMut<Target = MemParagraph>> ParagraphMut for MemParagraphView<P> {
    fn set_level(&mut self, level: u8) {
        self.0.level = level;
    }

    fn set_alignment(&mut self, alignment: Alignment) {
        self.0.alignment = Some(alignment);
    }

    fn set_space_before(&mut self, spacing: Spacing) {
        self.0.space_before = Some(spacing);
    }

    fn set_space_after(&mut self, spacing: Spacing) {
        self.0.space_after = Some(spacing);
    }

    fn set_line_spacing(&mut self, spacing: Spacing) {
        self.0.line_spacing = Some(spacing);
    }

    fn properties_mut(&mut self) -> Option<&mut dyn PropertyBag> {
        Some(self.0.props_mut() as &mut dyn PropertyBag)
    }

    fn clear(&mut self) {
        self.0.runs.clear();
    }

    fn add_run(&mut self) -> Box<dyn RunMut + '_> {
        self.0.runs.push(MemRun::default());
        let run = self.0.runs.last_mut().unwrap();
        Box::new(MemRunView(run))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemRegion {
    pub paragraphs: Vec<MemParagraph>,
    /// Refuse mutable paragraph access, to exercise the plain-text recovery.
    pub locked: bool,
}

impl MemRegion {
    pub fn new(paragraphs: Vec<MemParagraph>) -> Self {
        Self {
            paragraphs,
            locked: false,
        }
    }

    /// One unformatted paragraph per line.
    pub fn plain(text: &str) -> Self {
        Self::new(
            text.split('\n')
                .map(|line| MemParagraph::new(vec![MemRun::new(line)]))
                .collect(),
        )
    }
}

impl TextRegion for MemRegion {
    fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    fn paragraph(&self, index: usize) -> Option<Box<dyn ParagraphRef + '_>> {
        self.paragraphs
            .get(index)
            .map(|p| Box::new(MemParagraphView(p)) as Box<dyn ParagraphRef + '_>)
    }

    fn paragraph_mut(&mut self, index: usize) -> Option<Box<dyn ParagraphMut + '_>> {
        if self.locked {
            return None;
        }
        self.paragraphs
            .get_mut(index)
            .map(|p| Box::new(MemParagraphView(p)) as Box<dyn ParagraphMut + '_>)
    }

    fn add_paragraph(&mut self) -> usize {
        self.paragraphs.push(MemParagraph::default());
        self.paragraphs.len() - 1
    }

    fn remove_paragraph(&mut self, index: usize) {
        if index < self.paragraphs.len() {
            self.paragraphs.remove(index);
        }
    }

    fn clear(&mut self) {
        let first = self
            .paragraphs
            .first()
            .map(|p| MemParagraph {
                runs: Vec::new(),
                ..p.clone()
            })
            .unwrap_or_default();
        self.paragraphs = vec![first];
    }

    fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(MemParagraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn set_text(&mut self, text: &str) {
        self.paragraphs = Self::plain(text).paragraphs;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemShape {
    Group(Vec<MemShape>),
    Table(Vec<Vec<MemRegion>>),
    Text(MemRegion),
    Flat(String),
    Picture,
}

impl MemShape {
    pub fn text(text: &str) -> Self {
        MemShape::Text(MemRegion::plain(text))
    }

    pub fn table(rows: &[&[&str]]) -> Self {
        MemShape::Table(
            rows.iter()
                .map(|row| row.iter().map(|cell| MemRegion::plain(cell)).collect())
                .collect(),
        )
    }

    fn to_shape(&self) -> Shape {
        match self {
            MemShape::Group(children) => {
                Shape::Group(children.iter().map(Self::to_shape).collect())
            }
            MemShape::Table(rows) => Shape::Table(
                rows.iter()
                    .map(|row| row.iter().map(|cell| cell.text()).collect())
                    .collect(),
            ),
            MemShape::Text(region) => Shape::TextRegion(region.text()),
            MemShape::Flat(text) => Shape::FlatText(text.clone()),
            MemShape::Picture => Shape::Other,
        }
    }

    pub fn region(&self) -> Option<&MemRegion> {
        match self {
            MemShape::Text(region) => Some(region),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemSlide {
    pub shapes: Vec<MemShape>,
    pub notes: Option<String>,
}

impl MemSlide {
    pub fn new(shapes: Vec<MemShape>) -> Self {
        Self {
            shapes,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    fn shape(&self, path: &ShapePath) -> Option<&MemShape> {
        let (first, rest) = path.indices().split_first()?;
        rest.iter().try_fold(self.shapes.get(*first)?, |shape, &index| match shape {
            MemShape::Group(children) => children.get(index),
            _ => None,
        })
    }

    fn shape_mut(&mut self, path: &ShapePath) -> Option<&mut MemShape> {
        let (first, rest) = path.indices().split_first()?;
        let mut shape = self.shapes.get_mut(*first)?;
        for &index in rest {
            let current = shape;
            shape = match current {
                MemShape::Group(children) => children.get_mut(index)?,
                _ => return None,
            };
        }
        Some(shape)
    }
}

impl Slide for MemSlide {
    fn shapes(&self) -> Vec<Shape> {
        self.shapes.iter().map(MemShape::to_shape).collect()
    }

    fn notes_text(&self) -> Option<String> {
        self.notes.clone()
    }

    fn set_notes_text(&mut self, text: &str) -> Result<()> {
        match &mut self.notes {
            Some(notes) => {
                *notes = text.to_string();
                Ok(())
            }
            None => Err(Error::PackageError("slide has no notes".to_string())),
        }
    }

    fn text_paragraphs(&self, handle: &ElementHandle) -> Option<Vec<Box<dyn ParagraphRef + '_>>> {
        let region = match handle {
            ElementHandle::Cell { shape, row, column } => match self.shape(shape)? {
                MemShape::Table(rows) => rows.get(*row)?.get(*column)?,
                _ => return None,
            },
            ElementHandle::TextBody(path) => self.shape(path)?.region()?,
            ElementHandle::Shape(_) => return None,
        };
        Some(
            region
                .paragraphs
                .iter()
                .map(|p| Box::new(MemParagraphView(p)) as Box<dyn ParagraphRef + '_>)
                .collect(),
        )
    }

    fn text_region_mut(&mut self, handle: &ElementHandle) -> Option<Box<dyn TextRegion + '_>> {
        let region = match handle {
            ElementHandle::Cell { shape, row, column } => match self.shape_mut(shape)? {
                MemShape::Table(rows) => rows.get_mut(*row)?.get_mut(*column)?,
                _ => return None,
            },
            ElementHandle::TextBody(path) => match self.shape_mut(path)? {
                MemShape::Text(region) => region,
                _ => return None,
            },
            ElementHandle::Shape(_) => return None,
        };
        Some(Box::new(region))
    }

    fn set_flat_text(&mut self, handle: &ElementHandle, text: &str) -> Result<()> {
        let path = match handle {
            ElementHandle::Shape(path) => path,
            other => {
                return Err(Error::FormattingError(format!(
                    "{:?} has no flat text",
                    other
                )))
            }
        };
        match self.shape_mut(path) {
            Some(MemShape::Flat(existing)) => {
                *existing = text.to_string();
                Ok(())
            }
            _ => Err(Error::FormattingError(format!("no flat text at {}", path))),
        }
    }
}

/// Shared "file system" of in-memory decks, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    files: Arc<Mutex<HashMap<PathBuf, Vec<MemSlide>>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, slides: Vec<MemSlide>) {
        self.files.lock().unwrap().insert(path.into(), slides);
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<MemSlide>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

impl PresentationLoader for MemStore {
    fn load(&self, path: &Path) -> Result<Box<dyn Presentation>> {
        let slides = self.get(path).ok_or_else(|| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })?;
        Ok(Box::new(MemDeck {
            slides,
            store: self.clone(),
        }))
    }
}

struct MemDeck {
    slides: Vec<MemSlide>,
    store: MemStore,
}

impl Presentation for MemDeck {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide(&self, index: usize) -> Option<&dyn Slide> {
        self.slides.get(index).map(|s| s as &dyn Slide)
    }

    fn slide_mut(&mut self, index: usize) -> Option<&mut dyn Slide> {
        self.slides.get_mut(index).map(|s| s as &mut dyn Slide)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.store.insert(path, self.slides.clone());
        Ok(())
    }
}

type Reply = dyn Fn(&ServiceRequest) -> Result<String> + Send + Sync;

/// Translation service stub that records every request.
#[derive(Clone)]
pub struct ScriptedService {
    reply: Arc<Reply>,
    calls: Arc<Mutex<Vec<ServiceRequest>>>,
}

impl ScriptedService {
    pub fn new(reply: impl Fn(&ServiceRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Arc::new(reply),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every prompt with the source texts unchanged.
    pub fn echo() -> Self {
        Self::mapping(|text| text.to_string())
    }

    /// Answers single prompts with `f(text)` and batch prompts with `[n] f(text_n)` lines.
    pub fn mapping(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::new(move |request| {
            let sources = source_texts(request);
            if request.system == prompts::BATCH_SYSTEM {
                Ok(sources
                    .iter()
                    .enumerate()
                    .map(|(i, text)| format!("[{}] {}", i + 1, f(text)))
                    .collect::<Vec<_>>()
                    .join("\n"))
            } else {
                Ok(sources.first().map(|text| f(text)).unwrap_or_default())
            }
        })
    }

    /// Returns the given responses in order, then fails.
    pub fn replies(responses: &[&str]) -> Self {
        let queue = Mutex::new(
            responses
                .iter()
                .map(|s| s.to_string())
                .collect::<std::collections::VecDeque<_>>(),
        );
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::ServiceError("no scripted reply left".to_string()))
        })
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(Error::ServiceError("service unavailable".to_string())))
    }

    pub fn calls(&self) -> Vec<ServiceRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TranslationService for ScriptedService {
    fn invoke(&self, request: &ServiceRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        (self.reply)(request)
    }
}

/// Source texts carried by a request built from the engine's prompt templates.
pub fn source_texts(request: &ServiceRequest) -> Vec<String> {
    let message = request.user_message.as_str();
    if request.system == prompts::BATCH_SYSTEM {
        match message.rfind("\n\n[1] ") {
            Some(pos) => response::parse_numbered(&message[pos + 2..]),
            None => Vec::new(),
        }
    } else {
        message
            .split_once(prompts::TEXT_LABEL)
            .map(|(_, text)| vec![text.to_string()])
            .unwrap_or_default()
    }
}
