//! OPC package access: ZIP parts, relationships and slide order.

use crate::xml::{Element, XmlDocument};
use pptrans_core::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const SLIDE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const NOTES_SLIDE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const HYPERLINK_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// All parts of a package, kept in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn from_parts(parts: Vec<(String, Vec<u8>)>) -> Self {
        Self { parts }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every file entry of a ZIP archive into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push((name, data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Parse a part as XML.
    pub fn xml_part(&self, name: &str) -> Result<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::PackageError(format!("missing part '{}'", name)))?;
        XmlDocument::parse(data).map_err(|e| Error::XmlError(format!("{}: {}", name, e)))
    }

    /// Relationships of `source_part`; empty when the part has none.
    pub fn relationships(&self, source_part: &str) -> Result<Relationships> {
        let rels_part = rels_part_for(source_part);
        match self.part(&rels_part) {
            Some(data) => Relationships::parse(source_part, data),
            None => Ok(Relationships::empty(source_part)),
        }
    }

    /// Slide part names in presentation order.
    ///
    /// The order comes from the slide id list of the presentation part; if it
    /// is missing, slide relationships are ordered by the number in their id
    /// or target.
    pub fn slide_parts(&self) -> Result<Vec<String>> {
        let presentation = self.xml_part(PRESENTATION_PART)?;
        let rels = self.relationships(PRESENTATION_PART)?;

        let listed: Vec<String> = presentation
            .root
            .child("sldIdLst")
            .map(|list| {
                list.children_named("sldId")
                    .filter_map(|id| id.attr("r:id"))
                    .filter_map(|rid| rels.target_part(rid))
                    .collect()
            })
            .unwrap_or_default();
        if !listed.is_empty() {
            return Ok(listed);
        }

        log::debug!("No slide id list, ordering slides by relationship");
        let mut slides: Vec<(String, Option<usize>)> = rels
            .entries
            .iter()
            .filter(|rel| rel.rel_type == SLIDE_REL)
            .map(|rel| {
                let order =
                    extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target(PRESENTATION_PART, &rel.target), order)
            })
            .collect();
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Write the package, replacing parts found in `overrides` and appending new ones.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        overrides: &BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let existing = self.parts.iter().map(|(name, data)| {
            (name.as_str(), overrides.get(name).unwrap_or(data).as_slice())
        });
        let added = overrides
            .iter()
            .filter(|(name, _)| self.part(name).is_none())
            .map(|(name, data)| (name.as_str(), data.as_slice()));

        for (name, data) in existing.chain(added) {
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }
        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(())
    }

    pub fn save(&self, path: &Path, overrides: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file), overrides)
    }
}

/// One package relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    source_part: String,
    entries: Vec<Relationship>,
    dirty: bool,
}

impl Relationships {
    pub fn empty(source_part: &str) -> Self {
        Self {
            source_part: source_part.to_string(),
            entries: Vec::new(),
            dirty: false,
        }
    }

    pub fn parse(source_part: &str, data: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(data)?;
        let entries = doc
            .root
            .children_named("Relationship")
            .map(|rel| Relationship {
                id: rel.attr("Id").unwrap_or_default().to_string(),
                rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                target: rel.attr("Target").unwrap_or_default().to_string(),
                external: rel.attr("TargetMode") == Some("External"),
            })
            .collect();
        Ok(Self {
            source_part: source_part.to_string(),
            entries,
            dirty: false,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// Raw target of relationship `id` (a URL for external links).
    pub fn target(&self, id: &str) -> Option<&str> {
        self.get(id).map(|rel| rel.target.as_str())
    }

    /// Package part name an internal relationship points to.
    pub fn target_part(&self, id: &str) -> Option<String> {
        self.get(id)
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    /// Part name of the first internal relationship of `rel_type`.
    pub fn part_of_type(&self, rel_type: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|rel| rel.rel_type == rel_type && !rel.external)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    /// Id of an external hyperlink to `url`, adding the relationship if needed.
    pub fn add_external_hyperlink(&mut self, url: &str) -> String {
        if let Some(rel) = self
            .entries
            .iter()
            .find(|rel| rel.external && rel.rel_type == HYPERLINK_REL && rel.target == url)
        {
            return rel.id.clone();
        }

        let next = self
            .entries
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: HYPERLINK_REL.to_string(),
            target: url.to_string(),
            external: true,
        });
        self.dirty = true;
        id
    }

    /// Whether relationships were added since loading.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn part_name(&self) -> String {
        rels_part_for(&self.source_part)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = Element::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.entries {
            let mut element = Element::new("Relationship")
                .with_attr("Id", &rel.id)
                .with_attr("Type", &rel.rel_type)
                .with_attr("Target", &rel.target);
            if rel.external {
                element.set_attr("TargetMode", "External");
            }
            root.insert_child(element);
        }
        XmlDocument::new(root).to_bytes()
    }
}

/// Name of the relationships part belonging to `part`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
