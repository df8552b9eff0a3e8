//! Whole-presentation translation.

use crate::collector::collect_slide;
use crate::document::{Presentation, PresentationLoader};
use crate::engine::TranslationEngine;
use crate::strategy::SlideTranslator;
use crate::types::TranslationResult;
use crate::{Error, Result};
use std::path::Path;

/// Shown by [`PresentationTranslator::get_slide_preview`] for slides without text.
pub const EMPTY_PREVIEW: &str = "[No text content found]";

/// Loads presentations, translates them slide by slide and saves the result.
pub struct PresentationTranslator {
    loader: Box<dyn PresentationLoader>,
    engine: TranslationEngine,
}

impl PresentationTranslator {
    pub fn new(loader: Box<dyn PresentationLoader>, engine: TranslationEngine) -> Self {
        Self { loader, engine }
    }

    pub fn engine(&self) -> &TranslationEngine {
        &self.engine
    }

    /// Translate every slide of `input` and write the result to `output`.
    ///
    /// Only failures to read or write the document are returned as errors.
    pub fn translate_presentation(
        &self,
        input: &Path,
        output: &Path,
        language: &str,
    ) -> Result<TranslationResult> {
        let mut deck = self.loader.load(input)?;
        let total = deck.slide_count();
        log::info!("Starting translation of {} slides", total);
        self.log_mode();

        let result = self.translate_slides(deck.as_mut(), 0..total, language);
        self.save(deck.as_ref(), output, &result)?;
        Ok(result)
    }

    /// Translate only the given 1-based slide numbers.
    ///
    /// Numbers are de-duplicated and processed in ascending order. If any
    /// number is out of range, nothing is translated or written and the
    /// result carries the error.
    pub fn translate_specific_slides(
        &self,
        input: &Path,
        output: &Path,
        language: &str,
        slide_numbers: &[usize],
    ) -> Result<TranslationResult> {
        let mut deck = self.loader.load(input)?;
        let total = deck.slide_count();

        let invalid: Vec<usize> = slide_numbers
            .iter()
            .copied()
            .filter(|&n| n < 1 || n > total)
            .collect();
        if !invalid.is_empty() {
            let message = format!(
                "Invalid slide numbers: {:?}. Valid range: 1-{}",
                invalid, total
            );
            log::error!("{}", message);
            let mut result = TranslationResult::new();
            result.errors.push(message);
            return Ok(result);
        }

        let mut numbers = slide_numbers.to_vec();
        numbers.sort_unstable();
        numbers.dedup();
        log::info!(
            "Starting translation of {} specific slides: {:?}",
            numbers.len(),
            numbers
        );
        self.log_mode();

        let indices = numbers.iter().map(|n| n - 1);
        let result = self.translate_slides(deck.as_mut(), indices, language);
        self.save(deck.as_ref(), output, &result)?;
        Ok(result)
    }

    pub fn get_slide_count(&self, input: &Path) -> Result<usize> {
        Ok(self.loader.load(input)?.slide_count())
    }

    /// Collected texts of one slide joined with `" | "`, notes last, cut to `max_chars`.
    pub fn get_slide_preview(
        &self,
        input: &Path,
        slide_number: usize,
        max_chars: usize,
    ) -> Result<String> {
        let deck = self.loader.load(input)?;
        let count = deck.slide_count();
        let slide = slide_number
            .checked_sub(1)
            .and_then(|index| deck.slide(index))
            .ok_or(Error::InvalidSlide {
                number: slide_number,
                count,
            })?;

        let texts = collect_slide(slide, self.engine.filter());
        let mut parts: Vec<String> = texts.items.into_iter().map(|item| item.text).collect();
        if !texts.notes.is_empty() {
            parts.push(format!("[Notes: {}]", texts.notes));
        }

        let preview = parts.join(" | ");
        if preview.is_empty() {
            return Ok(EMPTY_PREVIEW.to_string());
        }
        if preview.chars().count() > max_chars {
            let head: String = preview.chars().take(max_chars).collect();
            return Ok(format!("{}...", head));
        }
        Ok(preview)
    }

    fn translate_slides(
        &self,
        deck: &mut dyn Presentation,
        indices: impl Iterator<Item = usize>,
        language: &str,
    ) -> TranslationResult {
        let translator = SlideTranslator::new(&self.engine);
        let total = deck.slide_count();
        let mut result = TranslationResult::new();

        for index in indices {
            let Some(slide) = deck.slide_mut(index) else {
                continue;
            };
            log::info!("Processing slide {}/{}", index + 1, total);
            let outcome = translator.translate_slide(slide, language);
            result.record_slide(&outcome, slide.shapes().len());
            log::info!(
                "Slide {}: {} texts translated",
                index + 1,
                outcome.translated_count
            );
        }
        result
    }

    fn save(
        &self,
        deck: &dyn Presentation,
        output: &Path,
        result: &TranslationResult,
    ) -> Result<()> {
        deck.save(output)?;
        log::info!("Translation completed: {}", output.display());
        log::info!(
            "Summary: {} texts, {} notes",
            result.translated_count,
            result.translated_notes_count
        );
        Ok(())
    }

    fn log_mode(&self) {
        let mode = if self.engine.config().enable_polishing {
            "natural"
        } else {
            "literal"
        };
        log::info!("Translation mode: {}", mode);
    }
}
