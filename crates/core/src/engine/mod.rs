//! Translation engine: prompts, service calls, batch parsing and fallbacks.

pub mod prompts;
pub mod response;
pub mod service;

pub use service::{ServiceRequest, TranslationService};

use crate::config::{MismatchPolicy, TranslatorConfig};
use crate::filter::TextFilter;
use crate::types::TextItem;
use crate::{Error, Result};

/// Translates texts through a [`TranslationService`].
///
/// Every public operation returns a usable result: service failures and
/// unparseable responses fall back to the source text.
pub struct TranslationEngine {
    service: Box<dyn TranslationService>,
    config: TranslatorConfig,
    filter: TextFilter,
}

impl TranslationEngine {
    /// Create an engine; fails on invalid configuration or skip patterns.
    pub fn new(service: Box<dyn TranslationService>, config: TranslatorConfig) -> Result<Self> {
        config.validate()?;
        let filter = TextFilter::with_patterns(&config.skip_patterns)?;
        log::debug!(
            "Translation engine: model={}, polishing={}, batch_size={}",
            config.model_id,
            config.enable_polishing,
            config.batch_size
        );
        Ok(Self {
            service,
            config,
            filter,
        })
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn filter(&self) -> &TextFilter {
        &self.filter
    }

    /// Translate one text, returning it unchanged when it is skipped or
    /// when no usable translation comes back.
    pub fn translate_one(&self, text: &str, language: &str) -> String {
        if self.filter.should_skip(text) {
            return text.to_string();
        }

        match self.request_single(text, language) {
            Ok(Some(translation)) => {
                log::debug!("Translated: '{}' -> '{}'", preview(text), preview(&translation));
                translation
            }
            Ok(None) => {
                log::warn!("Empty translation response, keeping original: {}", preview(text));
                text.to_string()
            }
            Err(e) => {
                log::error!("Translation error: {}", e);
                text.to_string()
            }
        }
    }

    fn request_single(&self, text: &str, language: &str) -> Result<Option<String>> {
        let message = prompts::single_message(
            self.config.language_name(language),
            self.config.enable_polishing,
            text,
        );
        let raw = self.invoke(prompts::SINGLE_SYSTEM, message)?;

        let cleaned = response::clean_response(&raw);
        let translation = response::strip_wrapping_quotes(&cleaned);
        Ok((!translation.is_empty()).then(|| translation.to_string()))
    }

    /// Translate several texts in one request.
    ///
    /// The result always has one entry per input, aligned by index. Skipped
    /// texts keep their source text.
    pub fn translate_batch(&self, texts: &[String], language: &str) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let pending: Vec<usize> = (0..texts.len())
            .filter(|&i| {
                let skip = self.filter.should_skip(&texts[i]);
                if skip {
                    log::debug!("Skipping text {}: {}", i, preview(&texts[i]));
                }
                !skip
            })
            .collect();
        if pending.is_empty() {
            return texts.to_vec();
        }

        let sources: Vec<&str> = pending.iter().map(|&i| texts[i].as_str()).collect();
        log::info!("Batch translating {} texts", sources.len());

        match self.request_batch(&sources, language) {
            Ok(units) => {
                let mut results = texts.to_vec();
                for (&index, unit) in pending.iter().zip(units) {
                    if !unit.is_empty() {
                        results[index] = unit;
                    }
                }
                results
            }
            Err(e) => {
                log::warn!("Batch translation failed ({}), translating individually", e);
                self.translate_individually(texts, language)
            }
        }
    }

    /// Context-aware translation of a slide's items. Currently the same as a batch.
    pub fn translate_with_context(&self, items: &[TextItem], language: &str) -> Vec<String> {
        if items.is_empty() {
            return Vec::new();
        }
        log::info!(
            "Context translation requested for {} texts, using batch translation",
            items.len()
        );
        let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
        self.translate_batch(&texts, language)
    }

    /// Translate every text with its own request.
    pub fn translate_individually(&self, texts: &[String], language: &str) -> Vec<String> {
        log::info!("Translating {} texts individually", texts.len());
        texts
            .iter()
            .map(|text| self.translate_one(text, language))
            .collect()
    }

    /// Send one numbered batch and return exactly one unit per source.
    fn request_batch(&self, sources: &[&str], language: &str) -> Result<Vec<String>> {
        let message = prompts::batch_message(
            self.config.language_name(language),
            self.config.enable_polishing,
            sources,
        );
        let raw = self.invoke(prompts::BATCH_SYSTEM, message)?;
        let expected = sources.len();

        let numbered = response::parse_numbered(&raw);
        if numbered.len() == expected {
            return Ok(numbered);
        }
        log::debug!(
            "Numbered parsing found {} of {} units, trying separator parsing",
            numbered.len(),
            expected
        );
        let separated = response::parse_separated(&raw);
        if separated.len() == expected {
            return Ok(separated);
        }

        let units = if numbered.is_empty() { separated } else { numbered };
        log::warn!(
            "Batch translation count mismatch: expected {}, got {}",
            expected,
            units.len()
        );
        match self.config.batch_mismatch {
            MismatchPolicy::Repair => Ok(response::repair(units, expected)),
            MismatchPolicy::Fallback => Err(Error::CountMismatch {
                expected,
                actual: units.len(),
            }),
        }
    }

    fn invoke(&self, system: &str, user_message: String) -> Result<String> {
        let request = ServiceRequest {
            model_id: self.config.model_id.clone(),
            system: system.to_string(),
            user_message,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        Ok(self.service.invoke(&request)?.trim().to_string())
    }
}

/// First 50 characters of `text`, for log lines.
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(50).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
