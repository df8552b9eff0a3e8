//! Capture paragraph and run formatting from a text region.

use super::model::{BulletFormat, Color, ParagraphFormat, RunFormat};
use crate::document::{FontColor, ParagraphRef, PropertyBag, RunRef, TextRegion};

/// Bullet elements in the order they are looked up.
const BULLET_ELEMENTS: [&str; 3] = ["buNone", "buChar", "buAutoNum"];

/// Elements whose presence marks a paragraph as bulleted.
const BULLET_MARKER_ELEMENTS: [&str; 3] = ["buFont", "buChar", "buAutoNum"];

/// Capture one `ParagraphFormat` per paragraph of `region`.
///
/// Never mutates the region. A paragraph that cannot be read yields a
/// level-only format.
pub fn extract_paragraphs(region: &dyn TextRegion) -> Vec<ParagraphFormat> {
    (0..region.paragraph_count())
        .map(|i| match region.paragraph(i) {
            Some(paragraph) => extract_paragraph(&*paragraph),
            None => {
                log::debug!("Paragraph {} unreadable, keeping level only", i);
                ParagraphFormat::with_level(0)
            }
        })
        .collect()
}

/// Capture the formatting of a single paragraph.
pub fn extract_paragraph(paragraph: &dyn ParagraphRef) -> ParagraphFormat {
    let level = paragraph.level();
    let mut format = ParagraphFormat {
        level,
        alignment: paragraph.alignment(),
        space_before: paragraph.space_before(),
        space_after: paragraph.space_after(),
        line_spacing: paragraph.line_spacing(),
        ..Default::default()
    };

    match paragraph.properties() {
        Some(bag) => read_properties(bag, &mut format),
        None => {
            // No structural access: assume indented paragraphs are bulleted.
            if level > 0 {
                format.bullet = Some(BulletFormat::generic());
            }
        }
    }

    for index in 0..paragraph.run_count() {
        let Some(run) = paragraph.run(index) else {
            continue;
        };
        if run.text().trim().is_empty() {
            continue;
        }
        format.runs.push(extract_run(&*run));
    }

    format
}

fn read_properties(bag: &dyn PropertyBag, format: &mut ParagraphFormat) {
    format.margin_left = bag.attribute("marL");
    format.indent = bag.attribute("indent");
    format.alignment_override = bag.attribute("algn");
    format.bullet = read_bullet(bag, format.level);
    format.has_bullet_element = BULLET_MARKER_ELEMENTS.iter().any(|name| bag.has_child(name));
}

fn read_bullet(bag: &dyn PropertyBag, level: u8) -> Option<BulletFormat> {
    for name in BULLET_ELEMENTS {
        if !bag.has_child(name) {
            continue;
        }
        return Some(match name {
            "buNone" => BulletFormat::None,
            "buChar" => BulletFormat::Char(
                bag.child_attribute(name, "char")
                    .unwrap_or_else(|| "•".to_string()),
            ),
            _ => BulletFormat::AutoNum {
                scheme: bag
                    .child_attribute(name, "type")
                    .unwrap_or_else(|| BulletFormat::DEFAULT_SCHEME.to_string()),
                start_at: bag
                    .child_attribute(name, "startAt")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(BulletFormat::DEFAULT_START_AT),
            },
        });
    }

    if level > 0 {
        Some(BulletFormat::generic())
    } else {
        None
    }
}

/// Capture text, font attributes, color and hyperlink of a run.
pub fn extract_run(run: &dyn RunRef) -> RunFormat {
    RunFormat {
        text: run.text(),
        font_name: run.font_name(),
        font_size: run.font_size(),
        bold: run.bold(),
        italic: run.italic(),
        color: match run.color() {
            Some(FontColor::Rgb(rgb)) => Some(Color::Rgb(rgb.to_hex())),
            Some(FontColor::Theme(reference)) => Some(Color::Theme(reference)),
            Some(FontColor::Other) | None => None,
        },
        hyperlink: run.hyperlink(),
    }
}
