//! Neutral paragraph and run formatting captured from a text region.

use crate::document::{Alignment, Spacing};
use serde::{Deserialize, Serialize};

/// Bullet marker of a paragraph. Absent (`None` at the use site) means "inherit from style".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletFormat {
    /// Explicitly no bullet.
    None,
    /// Character bullet, e.g. `•`.
    Char(String),
    /// Auto-numbered bullet with its numbering scheme and start value.
    AutoNum { scheme: String, start_at: u32 },
}

impl BulletFormat {
    /// Default numbering scheme for auto-numbered bullets.
    pub const DEFAULT_SCHEME: &'static str = "arabicPeriod";

    /// Default start value, omitted when written back.
    pub const DEFAULT_START_AT: u32 = 1;

    /// Generic character bullet used when the marker cannot be read.
    pub fn generic() -> Self {
        BulletFormat::Char("•".to_string())
    }

    /// Whether this marker actually renders a bullet or number.
    pub fn is_marker(&self) -> bool {
        !matches!(self, BulletFormat::None)
    }
}

/// A run's color as captured for reapplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 6-hex-digit RGB value.
    Rgb(String),
    /// Theme palette reference.
    Theme(String),
}

/// Formatting of one text run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    pub text: String,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
    pub hyperlink: Option<String>,
}

impl RunFormat {
    /// Create an unformatted run with the given text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn has_hyperlink(&self) -> bool {
        self.hyperlink.is_some()
    }
}

/// Formatting of one paragraph, including its runs in original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphFormat {
    pub level: u8,
    pub alignment: Option<Alignment>,
    pub space_before: Option<Spacing>,
    pub space_after: Option<Spacing>,
    pub line_spacing: Option<Spacing>,

    /// Raw left margin from the attribute bag.
    pub margin_left: Option<String>,

    /// Raw first-line indent from the attribute bag.
    pub indent: Option<String>,

    /// Raw alignment attribute, reapplied verbatim.
    pub alignment_override: Option<String>,

    pub bullet: Option<BulletFormat>,

    /// Whether a bullet element (font, char or auto-number) was present in the attribute bag.
    pub has_bullet_element: bool,

    pub runs: Vec<RunFormat>,
}

impl ParagraphFormat {
    /// Minimal format that only carries the outline level.
    pub fn with_level(level: u8) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn has_hyperlinks(&self) -> bool {
        self.runs.iter().any(RunFormat::has_hyperlink)
    }

    /// Formatting for text outside any hyperlink: the first non-link run, else the first run.
    pub fn default_run(&self) -> Option<&RunFormat> {
        self.runs
            .iter()
            .find(|r| !r.has_hyperlink())
            .or_else(|| self.runs.first())
    }
}
