//! Owned XML element tree for editing package parts.
//!
//! Parts are read into a tree that keeps element order, qualified names and
//! attribute order, so that a part written back without changes carries the
//! same content as the original.

use pptrans_core::document::PropertyBag;
use pptrans_core::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt;

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data.
    Text(String),
    CData(String),
    /// Raw comment content.
    Comment(String),
}

/// An XML element with a qualified name such as `a:p`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// The `<?xml ...?>` declaration of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Order of known children inside DrawingML text elements.
///
/// Runs, line breaks and fields share one slot inside a paragraph.
fn child_order(parent: &str) -> &'static [&'static str] {
    match parent {
        "sp" => &["nvSpPr", "spPr", "style", "txBody", "extLst"],
        "txBody" => &["bodyPr", "lstStyle", "p"],
        "p" => &["pPr", "r", "endParaRPr"],
        "r" => &["rPr", "t"],
        "tc" => &["txBody", "tcPr", "extLst"],
        "pPr" => &[
            "lnSpc", "spcBef", "spcAft", "buClrTx", "buClr", "buSzTx", "buSzPct", "buSzPts",
            "buFontTx", "buFont", "buNone", "buAutoNum", "buChar", "buBlip", "tabLst", "defRPr",
            "extLst",
        ],
        "rPr" | "endParaRPr" | "defRPr" => &[
            "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill",
            "effectLst", "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin",
            "ea", "cs", "sym", "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
        ],
        _ => &[],
    }
}

fn rank(order: &[&str], local: &str) -> Option<usize> {
    let local = match local {
        "br" | "fld" => "r",
        other => other,
    };
    order.iter().position(|name| *name == local)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// `local` qualified with this element's own prefix.
    pub fn qualify(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Attribute by exact (qualified) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute by local name, ignoring any prefix.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == local)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.local_name() == local)
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    pub fn nth_child_mut(&mut self, local: &str, n: usize) -> Option<&mut Element> {
        self.elements_mut().filter(|e| e.local_name() == local).nth(n)
    }

    pub fn count_children(&self, local: &str) -> usize {
        self.children_named(local).count()
    }

    pub fn has_child(&self, local: &str) -> bool {
        self.child(local).is_some()
    }

    /// Follow a chain of child local names.
    pub fn descend(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |element, local| element.child(local))
    }

    pub fn descend_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for local in path {
            let element = current;
            current = element.child_mut(local)?;
        }
        Some(current)
    }

    /// The first child named `local`, created in schema order when missing.
    pub fn ensure_child(&mut self, local: &str) -> &mut Element {
        let index = match self.position_of(local) {
            Some(index) => index,
            None => self.insert_at_schema_position(Element::new(self.qualify(local))),
        };
        self.element_at(index)
    }

    /// Insert `child` in schema order (after existing siblings of the same kind).
    pub fn insert_child(&mut self, child: Element) -> &mut Element {
        let index = self.insert_at_schema_position(child);
        self.element_at(index)
    }

    pub fn remove_children(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, Node::Element(e) if e.local_name() == local));
        before - self.children.len()
    }

    pub fn remove_nth_child(&mut self, local: &str, n: usize) -> Option<Element> {
        let index = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Element(e) if e.local_name() == local))
            .map(|(index, _)| index)
            .nth(n)?;
        match self.children.remove(index) {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated character data directly inside this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    fn position_of(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.local_name() == local))
    }

    /// Insert `child` where the schema orders it and return its index.
    pub(crate) fn insert_at_schema_position(&mut self, child: Element) -> usize {
        let order = child_order(self.local_name());
        let index = rank(order, child.local_name())
            .and_then(|new_rank| {
                self.children.iter().position(|node| match node {
                    Node::Element(e) => rank(order, e.local_name()).is_some_and(|r| r > new_rank),
                    _ => false,
                })
            })
            .unwrap_or(self.children.len());
        self.children.insert(index, Node::Element(child));
        index
    }

    fn element_at(&mut self, index: usize) -> &mut Element {
        match &mut self.children[index] {
            Node::Element(element) => element,
            _ => unreachable!("child {} of <{}> is not an element", index, self.name),
        }
    }
}

impl PropertyBag for Element {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attr(name).map(str::to_string)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.set_attr(name, value);
    }

    fn has_child(&self, name: &str) -> bool {
        Element::has_child(self, name)
    }

    fn child_attribute(&self, child: &str, name: &str) -> Option<String> {
        self.child(child)?.attr(name).map(str::to_string)
    }

    fn remove_children(&mut self, name: &str) {
        Element::remove_children(self, name);
    }

    fn add_child(&mut self, name: &str, attributes: &[(&str, &str)]) {
        let mut child = Element::new(self.qualify(name));
        for (key, value) in attributes {
            child.set_attr(key, value);
        }
        self.insert_child(child);
    }
}

fn xml_error(context: &str, e: impl fmt::Display) -> Error {
    Error::XmlError(format!("{}: {}", context, e))
}

fn lossy(bytes: Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(Declaration::default()),
            root,
        }
    }

    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut declaration = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| xml_error(&format!("at byte {}", reader.buffer_position()), e))?;
            match event {
                Event::Decl(ref decl) => declaration = Some(read_declaration(decl)?),
                Event::Start(ref start) => stack.push(read_element(start)?),
                Event::Empty(ref start) => {
                    let element = read_element(start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape().map_err(|e| xml_error("text", e))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(ref data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(String::from_utf8_lossy(data).into_owned()));
                    }
                }
                Event::Comment(ref comment) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(comment).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let root = root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))?;
        Ok(Self { declaration, root })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| xml_error("declaration", e))?;
            writer
                .write_event(Event::Text(BytesText::from_escaped("\r\n")))
                .map_err(|e| xml_error("declaration", e))?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration> {
    let version = decl.version().map_err(|e| xml_error("declaration", e))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| xml_error("declaration", e))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| xml_error("declaration", e))?;
    Ok(Declaration {
        version: lossy(version),
        encoding: encoding.map(lossy),
        standalone: standalone.map(lossy),
    })
}

fn read_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error("attribute", e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| xml_error("attribute", e))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

/// Drop characters XML 1.0 cannot carry.
fn sanitize(text: &str) -> Cow<'_, str> {
    let legal = |c: char| matches!(c, '\t' | '\n' | '\r') || c >= ' ';
    if text.chars().all(legal) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| legal(c)).collect())
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| xml_error(&element.name, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| xml_error(&element.name, e))?;
    for child in &element.children {
        let event = match child {
            Node::Element(child) => {
                write_element(writer, child)?;
                continue;
            }
            Node::Text(text) => Event::Text(BytesText::new(&sanitize(text)).into_owned()),
            Node::CData(data) => Event::CData(BytesCData::new(data.as_str())),
            Node::Comment(comment) => Event::Comment(BytesText::from_escaped(comment.as_str())),
        };
        writer
            .write_event(event)
            .map_err(|e| xml_error(&element.name, e))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| xml_error(&element.name, e))
}
