//! Prompt templates for single and numbered-batch translation.

/// System instruction for single-text requests.
pub const SINGLE_SYSTEM: &str = "You are a translator. Provide ONLY the translation. \
No explanations, alternatives, context notes, arrows, or additional text.";

/// System instruction for numbered-batch requests.
pub const BATCH_SYSTEM: &str = "You are a translator. Translate each numbered text exactly as provided. \
Respond ONLY with translations in the same numbered format. \
Do not add explanations, alternatives, or additional content.";

/// Separates the instruction from the source text in single requests.
pub const TEXT_LABEL: &str = "\n\nText: ";

fn style_rule(polishing: bool) -> &'static str {
    if polishing {
        "Use natural, fluent phrasing suitable for presentation slides."
    } else {
        "Translate literally and stay close to the source wording."
    }
}

/// Instruction for translating one text into `language` (a display name).
pub fn single_prompt(language: &str, polishing: bool) -> String {
    format!(
        "Translate to {}. {}\n\
         CRITICAL: Provide ONLY the translation. No explanations, alternatives, context notes, or additional text.",
        language,
        style_rule(polishing)
    )
}

/// Instruction for translating a numbered list of texts into `language`.
pub fn batch_prompt(language: &str, polishing: bool) -> String {
    format!(
        "Translate each numbered text to {}. {}\n\
         CRITICAL RULES:\n\
         - Provide ONLY the translation, no explanations\n\
         - No alternative translations or context notes\n\
         - No markdown formatting (**bold**, *italic*)\n\
         - No arrows (→) or additional text\n\
         - Keep the same numbered format: [1] translation [2] translation [3] translation\n\
         - Do not skip any numbers\n\
         \n\
         Example:\n\
         [1] 첫 번째 번역\n\
         [2] 두 번째 번역\n\
         [3] 세 번째 번역",
        language,
        style_rule(polishing)
    )
}

/// Full user message for a single text.
pub fn single_message(language: &str, polishing: bool, text: &str) -> String {
    format!("{}{}{}", single_prompt(language, polishing), TEXT_LABEL, text)
}

/// Full user message for a batch of texts.
pub fn batch_message(language: &str, polishing: bool, texts: &[&str]) -> String {
    format!("{}\n\n{}", batch_prompt(language, polishing), numbered_list(texts))
}

/// `[1] first\n[2] second\n...`
pub fn numbered_list(texts: &[&str]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}\n", i + 1, text))
        .collect()
}
