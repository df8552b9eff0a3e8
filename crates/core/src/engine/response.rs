//! Cleaning and parsing of translation service responses.

use regex::Regex;
use std::sync::LazyLock;

/// Marker splitting units in separator-style batch responses.
pub const SEPARATOR: &str = "---SEPARATOR---";

/// Phrases that mark a response as a non-translation.
const REFUSAL_PHRASES: [&str; 5] = [
    "I'd be happy to help",
    "I don't see any text",
    "Could you please provide",
    "appears to be a question",
    "Once you share it",
];

/// Lines echoing the prompt, matched case-insensitively.
const PROMPT_ECHOES: [&str; 6] = [
    "translate this exact text",
    "translate each text",
    "keep same order",
    "separate with",
    "format:",
    "---separator---",
];

/// Explanatory lines dropped from a unit, matched case-insensitively.
const EXPLANATION_PHRASES: [&str; 9] = [
    "alternative translations",
    "depending on context",
    "raw source",
    "if referring to",
    "the most common",
    "translation is",
    "---",
    "unprocessed",
    "original material",
];

static MARKDOWN_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").unwrap());

static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\d+\]\s*").unwrap());

static TRANSLATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Translation to [\w-]+:\s*").unwrap());

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+").unwrap());

static BULLET_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[•\-*]\s*").unwrap());

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());

static LANGUAGE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(Korean|Japanese|English|Chinese|Spanish|French|German|Italian|Portuguese|Russian|Arabic|Hindi|한국어|일본어|영어|중국어):\s*",
    )
    .unwrap()
});

/// Whether the response is the model talking about the request instead of translating it.
pub fn is_refusal(response: &str) -> bool {
    REFUSAL_PHRASES.iter().any(|p| response.contains(p))
}

/// Strip one pair of matching quotes wrapping the whole text.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

/// Clean a whole response: refusals become empty, markdown headers and
/// prompt-echo lines are removed.
pub fn clean_response(response: &str) -> String {
    let cleaned = response.trim();
    if is_refusal(cleaned) {
        return String::new();
    }

    let cleaned = MARKDOWN_HEADER.replace_all(cleaned, "");
    let lines: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lowered = line.to_lowercase();
            !PROMPT_ECHOES.iter().any(|p| lowered.contains(p))
        })
        .collect();

    if lines.is_empty() {
        cleaned.trim().to_string()
    } else {
        lines.join("\n")
    }
}

/// Reduce one batch unit to its translation.
///
/// Removes wrapping quotes, label, number and bullet prefixes, and markdown
/// emphasis, drops explanatory lines, keeps only the text after the last arrow
/// of an annotated line, and returns the first remaining line.
pub fn clean_part(part: &str) -> String {
    let mut cleaned = strip_wrapping_quotes(part.trim()).to_string();
    for prefix in [&*TRANSLATION_PREFIX, &*NUMBERED_LINE, &*NUMBER_PREFIX] {
        cleaned = prefix.replace(&cleaned, "").into_owned();
    }
    // Emphasis goes first so a leading `**` is not taken for a bullet.
    cleaned = BOLD.replace_all(&cleaned, "$1").into_owned();
    cleaned = ITALIC.replace_all(&cleaned, "$1").into_owned();
    cleaned = BULLET_PREFIX.replace(&cleaned, "").into_owned();

    let mut translation = "";
    for line in cleaned.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let lowered = line.to_lowercase();
        if EXPLANATION_PHRASES.iter().any(|p| lowered.contains(p)) {
            continue;
        }
        if let Some((_, after)) = line.rsplit_once('→') {
            translation = after.trim();
            break;
        }
        translation = line;
        break;
    }

    LANGUAGE_PREFIX.replace(translation, "").trim().to_string()
}

/// Parse a `[1] ... [2] ...` response.
///
/// A line starting with a bracketed index opens a unit; following lines are
/// appended with a space until the next index. Text before the first index
/// is ignored.
pub fn parse_numbered(response: &str) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();

    for line in response.trim().lines() {
        let line = line.trim();
        if let Some(m) = NUMBERED_LINE.find(line) {
            units.push(line[m.end()..].trim().to_string());
        } else if line.is_empty() {
            continue;
        } else if let Some(current) = units.last_mut() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }

    units
}

/// Parse a response whose units are separated by [`SEPARATOR`].
pub fn parse_separated(response: &str) -> Vec<String> {
    response
        .split(SEPARATOR)
        .filter(|part| !part.trim().is_empty())
        .map(|part| clean_part(&clean_response(part)))
        .collect()
}

/// Pad with empty units or truncate so that exactly `expected` units remain.
pub fn repair(mut units: Vec<String>, expected: usize) -> Vec<String> {
    if units.len() < expected {
        log::warn!(
            "Padding batch response from {} to {} units",
            units.len(),
            expected
        );
        units.resize(expected, String::new());
    } else if units.len() > expected {
        log::warn!(
            "Truncating batch response from {} to {} units",
            units.len(),
            expected
        );
        units.truncate(expected);
    }
    units
}
