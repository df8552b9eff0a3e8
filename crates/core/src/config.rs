//! Translator configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What to do when a batch response cannot be split into the expected number of units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Translate every text of the chunk on its own.
    #[default]
    Fallback,
    /// Pad with empty units or truncate; empty units keep their source text.
    Repair,
}

/// Settings for the translation engine and slide strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Model identifier passed to the translation service.
    pub model_id: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Ask for natural phrasing instead of a literal translation.
    pub enable_polishing: bool,

    /// Maximum number of texts per batch request.
    pub batch_size: usize,

    /// Slides with more items than this use context translation.
    pub context_threshold: usize,

    /// Regular expressions for texts that are never translated, matched at the start of the text.
    pub skip_patterns: Vec<String>,

    /// Known translations of hyperlink anchor words, used to relocate links.
    pub anchor_terms: Vec<String>,

    pub batch_mismatch: MismatchPolicy,

    pub default_target_language: String,

    /// Language code to display name used in prompts.
    pub languages: BTreeMap<String, String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            enable_polishing: true,
            batch_size: 20,
            context_threshold: 5,
            skip_patterns: default_skip_patterns(),
            anchor_terms: default_anchor_terms(),
            batch_mismatch: MismatchPolicy::Fallback,
            default_target_language: "ko".to_string(),
            languages: default_languages(),
        }
    }
}

impl TranslatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::ConfigError("batch_size must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::ConfigError(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Set the model identifier.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set whether translations are polished.
    pub fn with_polishing(mut self, enable: bool) -> Self {
        self.enable_polishing = enable;
        self
    }

    /// Set the batch size (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the batch mismatch policy.
    pub fn with_batch_mismatch(mut self, policy: MismatchPolicy) -> Self {
        self.batch_mismatch = policy;
        self
    }

    /// Display name for a language code, or the code itself when unknown.
    pub fn language_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.languages.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn is_supported_language(&self, code: &str) -> bool {
        self.languages.contains_key(code)
    }
}

fn default_skip_patterns() -> Vec<String> {
    [
        r"^https?://\S+$",
        r"^www\.\S+$",
        r"^[\w.+-]+@[\w-]+\.[\w.-]+$",
        r"^[\d\s.,:;%$€£¥+\-/()]+$",
        r"^v?\d+(\.\d+){1,3}$",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_anchor_terms() -> Vec<String> {
    [
        "Boto3",
        "Code samples",
        "Starter Toolkit",
        "samples",
        "toolkit",
        "코드 샘플",
        "샘플",
        "툴킷",
        "스타터",
        "코드",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_languages() -> BTreeMap<String, String> {
    [
        ("ko", "Korean"),
        ("ja", "Japanese"),
        ("en", "English"),
        ("zh", "Chinese (Simplified)"),
        ("zh-TW", "Chinese (Traditional)"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("ar", "Arabic"),
        ("hi", "Hindi"),
    ]
    .iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}
