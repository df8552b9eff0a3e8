//! Per-slide translation strategy.

use crate::collector::collect_slide;
use crate::complexity::slide_is_complex;
use crate::document::Slide;
use crate::engine::TranslationEngine;
use crate::formatting::FrameUpdater;
use crate::types::{ItemKind, SlideOutcome, TextItem};
use crate::{Error, Result};

/// Translates one slide at a time, choosing between item-by-item and batched requests.
pub struct SlideTranslator<'e> {
    engine: &'e TranslationEngine,
    updater: FrameUpdater,
}

impl<'e> SlideTranslator<'e> {
    pub fn new(engine: &'e TranslationEngine) -> Self {
        Self {
            engine,
            updater: FrameUpdater::new(engine.config().anchor_terms.clone()),
        }
    }

    /// Translate notes and every collected item of `slide` in place.
    pub fn translate_slide(&self, slide: &mut dyn Slide, language: &str) -> SlideOutcome {
        let texts = collect_slide(slide, self.engine.filter());

        let notes_translated = if texts.notes.is_empty() {
            false
        } else {
            self.translate_notes(slide, &texts.notes, language)
        };

        let items = &texts.items;
        let translated_count = if slide_is_complex(&*slide, items) {
            log::info!("Complex formatting detected, using individual translation");
            self.translate_individually(slide, items, language)
        } else if items.len() > self.engine.config().context_threshold {
            self.translate_with_context(slide, items, language)
        } else {
            self.translate_with_batch(slide, items, language)
        };

        SlideOutcome {
            translated_count,
            notes_translated,
        }
    }

    fn translate_notes(&self, slide: &mut dyn Slide, notes: &str, language: &str) -> bool {
        let translated = self.engine.translate_one(notes, language);
        if translated == notes {
            return false;
        }
        match slide.set_notes_text(&translated) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error writing slide notes: {}", e);
                false
            }
        }
    }

    fn translate_individually(
        &self,
        slide: &mut dyn Slide,
        items: &[TextItem],
        language: &str,
    ) -> usize {
        let mut translated_count = 0;
        for (i, item) in items.iter().enumerate() {
            log::debug!("Translating item {}/{} at {}", i + 1, items.len(), item.path);
            let translation = self.engine.translate_one(&item.text, language);
            if translation != item.text && self.apply_to_item(slide, item, &translation) {
                translated_count += 1;
            }
        }
        log::info!(
            "Individual translation completed: {}/{} items translated",
            translated_count,
            items.len()
        );
        translated_count
    }

    fn translate_with_context(
        &self,
        slide: &mut dyn Slide,
        items: &[TextItem],
        language: &str,
    ) -> usize {
        let translations = self.engine.translate_with_context(items, language);
        match self.apply_all(slide, items, &translations) {
            Ok(count) => count,
            Err(e) => {
                log::error!("Context translation failed: {}", e);
                self.translate_with_batch(slide, items, language)
            }
        }
    }

    fn translate_with_batch(
        &self,
        slide: &mut dyn Slide,
        items: &[TextItem],
        language: &str,
    ) -> usize {
        let batch_size = self.engine.config().batch_size.max(1);
        let mut translated_count = 0;

        for chunk in items.chunks(batch_size) {
            let texts: Vec<String> = chunk.iter().map(|item| item.text.clone()).collect();
            let translations = self.engine.translate_batch(&texts, language);
            match self.apply_all(slide, chunk, &translations) {
                Ok(count) => translated_count += count,
                Err(e) => {
                    log::error!("Batch translation failed: {}", e);
                    translated_count += self.translate_individually(slide, chunk, language);
                }
            }
        }
        translated_count
    }

    /// Apply aligned translations; items whose text did not change are left alone.
    fn apply_all(
        &self,
        slide: &mut dyn Slide,
        items: &[TextItem],
        translations: &[String],
    ) -> Result<usize> {
        if items.len() != translations.len() {
            return Err(Error::CountMismatch {
                expected: items.len(),
                actual: translations.len(),
            });
        }

        let mut translated_count = 0;
        for (item, translation) in items.iter().zip(translations) {
            if *translation != item.text && self.apply_to_item(slide, item, translation) {
                translated_count += 1;
            }
        }
        Ok(translated_count)
    }

    /// Write `translation` into the element behind `item`.
    pub fn apply_to_item(&self, slide: &mut dyn Slide, item: &TextItem, translation: &str) -> bool {
        let written = match item.kind {
            ItemKind::TableCell | ItemKind::TextContainer => {
                let region = slide.text_region_mut(&item.handle);
                match region {
                    Some(mut region) => {
                        self.updater.update(&mut *region, translation);
                        Ok(())
                    }
                    None => {
                        drop(region);
                        slide.set_flat_text(&item.handle, translation)
                    }
                }
            }
            ItemKind::DirectText => slide.set_flat_text(&item.handle, translation),
        };

        match written {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error applying translation to {}: {}", item.path, e);
                false
            }
        }
    }
}
