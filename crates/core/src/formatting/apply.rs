//! Reapply captured formatting to rewritten paragraphs.

use super::model::{BulletFormat, Color, ParagraphFormat, RunFormat};
use crate::document::{FontColor, ParagraphMut, RgbColor, RunMut};

/// A piece of output text together with the run formatting it should carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    pub text: String,
    /// `None` writes the run without explicit formatting.
    pub format: Option<&'a RunFormat>,
    pub hyperlink: Option<&'a str>,
}

impl<'a> Segment<'a> {
    pub fn new(text: impl Into<String>, format: Option<&'a RunFormat>) -> Self {
        Self {
            text: text.into(),
            format,
            hyperlink: None,
        }
    }

    pub fn linked(text: impl Into<String>, format: &'a RunFormat, url: &'a str) -> Self {
        Self {
            text: text.into(),
            format: Some(format),
            hyperlink: Some(url),
        }
    }
}

/// Replace the paragraph's runs with `text`, reapplying `format` when given.
pub fn apply_paragraph_format(
    paragraph: &mut dyn ParagraphMut,
    format: Option<&ParagraphFormat>,
    text: &str,
) {
    paragraph.clear();

    let Some(format) = format else {
        emit_segments(paragraph, &[Segment::new(text, None)]);
        return;
    };

    apply_paragraph_properties(paragraph, format);
    let segments = match format.runs.as_slice() {
        [] => vec![Segment::new(text, None)],
        [single] => vec![Segment::new(text, Some(single))],
        runs => distribute_runs(text, runs),
    };
    emit_segments(paragraph, &segments);
}

/// Apply level, structural attributes, alignment, spacing and bullet.
pub fn apply_paragraph_properties(paragraph: &mut dyn ParagraphMut, format: &ParagraphFormat) {
    paragraph.set_level(format.level);

    if let Some(bag) = paragraph.properties_mut() {
        let attributes = [
            ("marL", &format.margin_left),
            ("indent", &format.indent),
            ("algn", &format.alignment_override),
        ];
        for (name, value) in attributes {
            if let Some(value) = value {
                bag.set_attribute(name, value);
            }
        }
    }

    if let Some(alignment) = format.alignment {
        paragraph.set_alignment(alignment);
    }
    if let Some(spacing) = format.space_before {
        paragraph.set_space_before(spacing);
    }
    if let Some(spacing) = format.space_after {
        paragraph.set_space_after(spacing);
    }
    if let Some(spacing) = format.line_spacing {
        paragraph.set_line_spacing(spacing);
    }

    if let Some(bullet) = &format.bullet {
        apply_bullet(paragraph, bullet);
    }
}

/// Replace the paragraph's bullet marker.
pub fn apply_bullet(paragraph: &mut dyn ParagraphMut, bullet: &BulletFormat) {
    let Some(bag) = paragraph.properties_mut() else {
        log::debug!("Paragraph has no attribute bag, bullet not applied");
        return;
    };

    for name in ["buNone", "buChar", "buAutoNum"] {
        bag.remove_children(name);
    }

    match bullet {
        BulletFormat::None => bag.add_child("buNone", &[]),
        BulletFormat::Char(marker) => bag.add_child("buChar", &[("char", marker.as_str())]),
        BulletFormat::AutoNum { scheme, start_at } => {
            let start = start_at.to_string();
            let mut attributes = vec![("type", scheme.as_str())];
            if *start_at != BulletFormat::DEFAULT_START_AT {
                attributes.push(("startAt", start.as_str()));
            }
            bag.add_child("buAutoNum", &attributes);
        }
    }
}

/// Split `text` across the captured runs by locating each run's original text.
///
/// Text before a matched run takes the first run's formatting; any tail after
/// the last match takes the last matched run's formatting. When no run text is
/// found, the whole text takes the first run's formatting.
pub fn distribute_runs<'a>(text: &str, runs: &'a [RunFormat]) -> Vec<Segment<'a>> {
    let Some(first) = runs.first() else {
        return vec![Segment::new(text, None)];
    };

    let mut segments = Vec::new();
    let mut remaining = text;
    let mut last_matched: Option<&RunFormat> = None;

    for run in runs {
        let original = run.text.trim();
        if original.is_empty() {
            continue;
        }
        let Some((before, after)) = remaining.split_once(original) else {
            continue;
        };

        if !before.is_empty() {
            segments.push(Segment::new(before, Some(first)));
        }
        segments.push(match run.hyperlink.as_deref() {
            Some(url) => Segment::linked(original, run, url),
            None => Segment::new(original, Some(run)),
        });
        remaining = after;
        last_matched = Some(run);
    }

    match last_matched {
        None => vec![Segment::new(text, Some(first))],
        Some(last) => {
            if !remaining.is_empty() {
                segments.push(Segment::new(remaining, Some(last)));
            }
            segments
        }
    }
}

/// Append one run per segment.
pub fn emit_segments(paragraph: &mut dyn ParagraphMut, segments: &[Segment<'_>]) {
    for segment in segments {
        let mut run = paragraph.add_run();
        run.set_text(&segment.text);
        if let Some(format) = segment.format {
            apply_run_format(&mut *run, format);
        }
        if let Some(url) = segment.hyperlink {
            match run.set_hyperlink(url) {
                Ok(()) => log::debug!("Applied hyperlink: '{}' -> {}", segment.text, url),
                Err(e) => log::debug!("Could not apply hyperlink {}: {}", url, e),
            }
        }
    }
}

/// Apply font attributes and color. Attributes the run cannot take are skipped.
pub fn apply_run_format(run: &mut dyn RunMut, format: &RunFormat) {
    if let Some(name) = &format.font_name {
        run.set_font_name(name);
    }
    if let Some(size) = format.font_size {
        run.set_font_size(size);
    }
    if let Some(bold) = format.bold {
        run.set_bold(bold);
    }
    if let Some(italic) = format.italic {
        run.set_italic(italic);
    }
    if let Some(color) = &format.color {
        apply_color(run, color);
    }
}

fn apply_color(run: &mut dyn RunMut, color: &Color) {
    let font_color = match color {
        Color::Rgb(hex) => match RgbColor::from_hex(hex) {
            Some(rgb) => FontColor::Rgb(rgb),
            None => {
                log::debug!("Ignoring malformed RGB color '{}'", hex);
                return;
            }
        },
        Color::Theme(reference) => FontColor::Theme(reference.clone()),
    };
    if let Err(e) = run.set_color(&font_color) {
        log::debug!("Could not apply color: {}", e);
    }
}
