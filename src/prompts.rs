//! Instruction prompts sent alongside the image.
//!
//! The prompt is fixed apart from the content type, so the only thing a
//! caller can influence is which kind of LaTeX the model is asked for.
//! Keeping the wording here lets tests inspect it without a live model.

use crate::content::ContentType;

/// Build the instruction prompt for `content_type`.
///
/// The model is told to skip the document preamble, but the post-processor
/// strips it anyway because many vision models ignore that request.
pub fn instruction_prompt(content_type: ContentType) -> String {
    format!(
        r#"Analyze the content in the provided image and generate LaTeX code for the specified type: {content_type}.
- Ensure the output is in valid LaTeX syntax.
- Remove document preambles (e.g., \documentclass, \usepackage, \begin{{document}}, \end{{document}}).
- Include only the relevant LaTeX environments (e.g., \begin{{table}}, \begin{{equation}}).
- Do not include explanations or additional text outside the LaTeX code block."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_content_type() {
        for ct in ContentType::ALL {
            let p = instruction_prompt(ct);
            assert!(p.contains(&format!("specified type: {ct}.")), "got: {p}");
        }
    }

    #[test]
    fn prompt_braces_are_literal() {
        let p = instruction_prompt(ContentType::Table);
        assert!(p.contains(r"\begin{document}"));
        assert!(p.contains(r"\begin{equation}"));
        assert!(!p.contains("{{"));
    }
}
