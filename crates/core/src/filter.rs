//! Skip heuristics for text that should never be sent for translation.
//!
//! Code blocks, JSON, source code, symbol-heavy strings and configured patterns
//! are kept verbatim.

use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// JSON key/value shapes such as `"key": "value"` or `{"key":`.
static JSON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""[^"]+"\s*:\s*"[^"]*""#,
        r#""[^"]+"\s*:\s*\{"#,
        r#""[^"]+"\s*:\s*\["#,
        r#"\{\s*"[^"]+"\s*:"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Programming-language syntax. Two or more hits mark the text as code.
static CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Python
        r"\bdef\s+\w+\s*\(",
        r"\bclass\s+\w+\s*[\(:]",
        r"\bimport\s+\w+",
        r"\bfrom\s+\w+\s+import",
        r"\bprint\s*\(",
        r"\b__\w+__\b",
        r"\bself\.\w+",
        // JavaScript / TypeScript
        r"\bfunction\s+\w+\s*\(",
        r"\bvar\s+\w+\s*=",
        r"\blet\s+\w+\s*=",
        r"\bconst\s+\w+\s*=",
        r"\bconsole\.\w+\s*\(",
        r"=>\s*\{",
        r"\$\{\w+\}",
        // Java / C# / C++
        r"\bpublic\s+\w+",
        r"\bprivate\s+\w+",
        r"\bprotected\s+\w+",
        r"\bstatic\s+\w+",
        r"\bvoid\s+\w+\s*\(",
        r"\bint\s+\w+\s*[=;]",
        r"\bString\s+\w+\s*[=;]",
        r"System\.out\.print",
        // Control flow
        r"\bif\s*\([^)]+\)\s*\{",
        r"\bfor\s*\([^)]+\)\s*\{",
        r"\bwhile\s*\([^)]+\)\s*\{",
        r"\btry\s*\{",
        r"\bcatch\s*\([^)]+\)\s*\{",
        r"\breturn\s+[^;]+;",
        r"\w+\s*=\s*new\s+\w+\s*\(",
        // Method calls, indexing, comments
        r"\w+\.\w+\s*\(",
        r"\w+\[\w*\]\s*=",
        r"(?m)//.*$",
        r"(?s)/\*.*?\*/",
        r"(?m)#.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Characters counted towards the special-character ratio.
const SPECIAL_CHARS: &str = "{}[]()\":,;=<>+-*/%&|!^~";

/// Ratio of special characters above which longer text is treated as code.
const SPECIAL_CHAR_RATIO: f64 = 0.25;

/// Minimum number of code pattern hits that mark text as code.
const CODE_MATCH_THRESHOLD: usize = 2;

/// Decides whether a text is translatable.
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    /// Configured skip patterns, anchored at the start of the text.
    skip_patterns: Vec<Regex>,
}

impl TextFilter {
    /// Create a filter with only the built-in heuristics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with additional skip patterns.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let skip_patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})", p))
                    .map_err(|e| Error::ConfigError(format!("Invalid skip pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { skip_patterns })
    }

    /// Whether `text` must be kept verbatim.
    pub fn should_skip(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }

        if text.starts_with("```") || text.ends_with("```") {
            return true;
        }

        if looks_like_json(text) {
            return true;
        }

        if looks_like_code(text) {
            return true;
        }

        if special_char_ratio(text) > SPECIAL_CHAR_RATIO {
            return true;
        }

        if self.skip_patterns.iter().any(|re| re.is_match(text)) {
            return true;
        }

        text.chars().count() <= 2 && !text.chars().any(char::is_alphabetic)
    }
}

fn looks_like_json(text: &str) -> bool {
    if (text.starts_with('{') && text.ends_with('}'))
        || (text.starts_with('[') && text.ends_with(']'))
    {
        return true;
    }
    JSON_PATTERNS.iter().any(|re| re.is_match(text))
}

fn looks_like_code(text: &str) -> bool {
    CODE_PATTERNS
        .iter()
        .filter(|re| re.is_match(text))
        .take(CODE_MATCH_THRESHOLD)
        .count()
        >= CODE_MATCH_THRESHOLD
}

/// Share of special characters, only for text longer than 10 characters.
fn special_char_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total <= 10 {
        return 0.0;
    }
    let special = text.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
    special as f64 / total as f64
}
