//! Formatting model: capture paragraph/run formatting and rebuild text
//! regions from translated text.

pub mod apply;
pub mod extract;
pub mod frame;
pub mod model;

pub use apply::{apply_paragraph_format, distribute_runs, Segment};
pub use extract::{extract_paragraph, extract_paragraphs};
pub use frame::FrameUpdater;
pub use model::{BulletFormat, Color, ParagraphFormat, RunFormat};
