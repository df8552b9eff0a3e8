//! Formatting-preserving translation of presentation text.
//!
//! The core works against the traits in [`document`]; a backend such as the
//! PPTX package reader supplies the storage. [`TranslationEngine`] talks to a
//! [`TranslationService`], [`SlideTranslator`] picks a strategy per slide and
//! [`PresentationTranslator`] drives whole files.

pub mod collector;
pub mod complexity;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod pool;
pub mod strategy;
pub mod translator;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{MismatchPolicy, TranslatorConfig};
pub use document::{Presentation, PresentationLoader, Slide, TextRegion};
pub use engine::{ServiceRequest, TranslationEngine, TranslationService};
pub use error::{Error, Result};
pub use filter::TextFilter;
pub use pool::{translate_batch_files, BatchJob, BatchOutcome};
pub use strategy::SlideTranslator;
pub use translator::PresentationTranslator;
pub use types::{ItemKind, SlideOutcome, TextItem, TranslationResult};
