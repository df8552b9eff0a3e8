//! PPTX (Office Open XML) backend for slide translation.
//!
//! A .pptx file is a ZIP archive of XML parts. Slides, their notes pages and
//! relationships are parsed into editable trees; on save the touched parts
//! are serialized and every other entry is copied through unchanged.

pub mod package;
pub mod slide;
pub mod text;
pub mod xml;

#[cfg(test)]
pub(crate) mod fixture;

pub use package::Package;
pub use slide::PptxSlide;

use pptrans_core::document::{Presentation, PresentationLoader, Slide};
use pptrans_core::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// An opened .pptx file.
#[derive(Debug, Clone)]
pub struct PptxPresentation {
    package: Package,
    slides: Vec<PptxSlide>,
}

impl PptxPresentation {
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening PPTX: {}", path.display());
        Self::from_package(Package::open(path)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let slides = package
            .slide_parts()?
            .iter()
            .map(|part| PptxSlide::load(&package, part))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Loaded {} slides", slides.len());
        Ok(Self { package, slides })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }
}

impl Presentation for PptxPresentation {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide(&self, index: usize) -> Option<&dyn Slide> {
        self.slides.get(index).map(|slide| slide as &dyn Slide)
    }

    fn slide_mut(&mut self, index: usize) -> Option<&mut dyn Slide> {
        self.slides
            .get_mut(index)
            .map(|slide| slide as &mut dyn Slide)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut parts = BTreeMap::new();
        for slide in &self.slides {
            slide.write_parts(&mut parts)?;
        }
        log::debug!("Writing {} updated parts to {}", parts.len(), path.display());
        self.package.save(path, &parts)
    }
}

/// [`PresentationLoader`] for .pptx files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxLoader;

impl PresentationLoader for PptxLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Presentation>> {
        Ok(Box::new(PptxPresentation::open(path)?))
    }
}
