//! Rewrite a whole text region with translated text.

use super::apply::{apply_paragraph_format, apply_paragraph_properties, emit_segments, Segment};
use super::extract::extract_paragraphs;
use super::model::{ParagraphFormat, RunFormat};
use crate::document::{ParagraphMut, TextRegion};
use crate::{Error, Result};

/// Rewrites text regions while keeping paragraph structure, run styling and hyperlinks.
#[derive(Debug, Clone, Default)]
pub struct FrameUpdater {
    /// Known translations of hyperlink anchor words.
    anchor_terms: Vec<String>,
}

impl FrameUpdater {
    pub fn new(anchor_terms: Vec<String>) -> Self {
        Self { anchor_terms }
    }

    /// Replace the content of `region` with `new_text`.
    ///
    /// Never fails: if the formatted rewrite cannot be completed the region
    /// is reset to the plain text.
    pub fn update(&self, region: &mut dyn TextRegion, new_text: &str) {
        if region.paragraph_count() == 0 {
            region.set_text(new_text);
            return;
        }

        if let Err(e) = self.try_update(region, new_text) {
            log::error!("Formatting error, writing plain text: {}", e);
            region.set_text(new_text);
        }
    }

    fn try_update(&self, region: &mut dyn TextRegion, new_text: &str) -> Result<()> {
        let formats = extract_paragraphs(region);

        if region.has_hyperlinks() {
            log::debug!("Hyperlinks detected, rebuilding paragraphs around anchors");
            return self.update_with_hyperlinks(region, new_text, &formats);
        }

        let lines: Vec<&str> = new_text.trim().split('\n').collect();
        let count = region.paragraph_count();

        if count == 1 && lines.len() == 1 {
            let mut paragraph = paragraph_mut(region, 0)?;
            apply_paragraph_format(&mut *paragraph, formats.first(), new_text.trim());
        } else if lines.len() == count {
            update_matching(region, &lines, &formats)?;
        } else {
            rebuild(region, &lines, &formats)?;
        }
        Ok(())
    }

    fn update_with_hyperlinks(
        &self,
        region: &mut dyn TextRegion,
        new_text: &str,
        formats: &[ParagraphFormat],
    ) -> Result<()> {
        let lines: Vec<&str> = new_text.trim().split('\n').collect();
        let original_count = region.paragraph_count();

        for (i, line) in lines.iter().enumerate() {
            let index = if i < original_count {
                i
            } else {
                region.add_paragraph()
            };
            let mut paragraph = paragraph_mut(region, index)?;
            paragraph.clear();

            match formats.get(i) {
                Some(format) => {
                    apply_paragraph_properties(&mut *paragraph, format);
                    let segments = self.hyperlink_segments(line.trim(), format);
                    emit_segments(&mut *paragraph, &segments);
                }
                None => emit_segments(&mut *paragraph, &[Segment::new(line.trim(), None)]),
            }
        }

        // Paragraphs the translation no longer covers would keep stale source text.
        for index in (lines.len()..original_count).rev() {
            region.remove_paragraph(index);
        }
        Ok(())
    }

    /// Split one translated line into runs, relocating the first hyperlink found.
    pub fn hyperlink_segments<'a>(
        &self,
        line: &str,
        format: &'a ParagraphFormat,
    ) -> Vec<Segment<'a>> {
        if !format.has_hyperlinks() {
            return vec![Segment::new(line, format.runs.first())];
        }

        let default = format.default_run();
        let mut segments = Vec::new();
        let mut remaining = line;

        for link_run in format.runs.iter().filter(|r| r.has_hyperlink()) {
            let Some(url) = link_run.hyperlink.as_deref() else {
                continue;
            };
            let Some(anchor) = self.find_anchor(remaining, link_run) else {
                continue;
            };
            let Some((before, after)) = remaining.split_once(anchor.as_str()) else {
                continue;
            };

            if !before.is_empty() {
                segments.push(Segment::new(before, default));
            }
            segments.push(Segment::linked(anchor, link_run, url));
            remaining = after;
            break;
        }

        if !remaining.is_empty() {
            segments.push(Segment::new(remaining, default));
        }
        segments
    }

    /// Choose the substring of `line` that should carry the link of `link_run`.
    ///
    /// Tries the original anchor text, then known anchor translations matched
    /// against the words of the line, then the first word longer than two characters.
    pub fn find_anchor(&self, line: &str, link_run: &RunFormat) -> Option<String> {
        let original = link_run.text.trim();
        if !original.is_empty() && line.contains(original) {
            return Some(original.to_string());
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        for term in &self.anchor_terms {
            let term = term.to_lowercase();
            for word in &words {
                let lowered = word.to_lowercase();
                if lowered.contains(&term) || term.contains(&lowered) {
                    return Some(word.to_string());
                }
            }
        }

        words
            .into_iter()
            .find(|w| w.chars().count() > 2)
            .map(str::to_string)
    }
}

fn paragraph_mut<'r>(
    region: &'r mut dyn TextRegion,
    index: usize,
) -> Result<Box<dyn ParagraphMut + 'r>> {
    region
        .paragraph_mut(index)
        .ok_or_else(|| Error::FormattingError(format!("paragraph {} is not accessible", index)))
}

/// One translated line per existing paragraph.
fn update_matching(
    region: &mut dyn TextRegion,
    lines: &[&str],
    formats: &[ParagraphFormat],
) -> Result<()> {
    for (i, line) in lines.iter().enumerate() {
        let mut paragraph = paragraph_mut(region, i)?;
        if line.trim().is_empty() {
            paragraph.clear();
            continue;
        }
        apply_paragraph_format(&mut *paragraph, formats.get(i), line.trim());
    }
    Ok(())
}

/// Clear the region and write one paragraph per line, reusing the first
/// paragraph's format for lines beyond the original count.
fn rebuild(region: &mut dyn TextRegion, lines: &[&str], formats: &[ParagraphFormat]) -> Result<()> {
    region.clear();

    for (i, line) in lines.iter().enumerate() {
        let index = if i == 0 { 0 } else { region.add_paragraph() };
        let format = formats.get(i).or_else(|| formats.first());
        let mut paragraph = paragraph_mut(region, index)?;
        apply_paragraph_format(&mut *paragraph, format, line.trim());
    }
    Ok(())
}
