//! Post-processing: pull a LaTeX fragment out of raw model output.
//!
//! Vision models rarely answer with bare LaTeX. Typical responses wrap the
//! code in a ```` ```latex ```` fence, add a sentence of explanation, or emit
//! a full compilable document with `\documentclass` and friends. This module
//! reduces any of those shapes to the fragment the caller asked for.
//!
//! ## Stages
//!
//! 1. Locate the working text: the first fenced LaTeX block, otherwise the
//!    content-type fallback (first `table`/`equation` environment, or the
//!    whole answer for `text`).
//! 2. Strip preamble lines and `document` environment markers.
//! 3. Trim.
//!
//! Exactly one pass runs per response; the output is never fed back in.

use crate::content::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Message reported when nothing resembling LaTeX was found.
pub const NO_CONTENT_MESSAGE: &str = "No valid LaTeX content found.";

/// Outcome of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Cleaned fragment. May be empty when the model returned an empty fence.
    Latex(String),
    /// Neither a fence nor the content-type environment was present.
    NotFound,
}

impl Extraction {
    pub fn into_option(self) -> Option<String> {
        match self {
            Extraction::Latex(s) => Some(s),
            Extraction::NotFound => None,
        }
    }
}

/// Extract and clean the LaTeX fragment from a raw model answer.
pub fn extract(raw: &str, content_type: ContentType) -> Extraction {
    match locate(raw, content_type) {
        Some(working) => Extraction::Latex(strip_preamble(working)),
        None => Extraction::NotFound,
    }
}

// ── Stage 1: locate the working text ────────────────────────────────────────

static RE_LATEX_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```latex(.*?)```").unwrap());

static RE_TABLE_ENV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{table\}.*?\\end\{table\}").unwrap());

static RE_EQUATION_ENV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{equation\}.*?\\end\{equation\}").unwrap());

fn locate(raw: &str, content_type: ContentType) -> Option<&str> {
    if let Some(caps) = RE_LATEX_FENCE.captures(raw) {
        return caps.get(1).map(|m| m.as_str().trim());
    }

    let found = match content_type {
        ContentType::Table => RE_TABLE_ENV.find(raw).map(|m| m.as_str()),
        ContentType::Equation => RE_EQUATION_ENV.find(raw).map(|m| m.as_str()),
        ContentType::Text => Some(raw),
    };
    found.map(str::trim)
}

// ── Stage 2: strip preamble ─────────────────────────────────────────────────

static RE_DOCUMENTCLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\documentclass.*?\n").unwrap());

static RE_USEPACKAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\usepackage.*?\n").unwrap());

const BEGIN_DOCUMENT: &str = r"\begin{document}";
const END_DOCUMENT: &str = r"\end{document}";

fn strip_preamble(working: &str) -> String {
    let s = RE_DOCUMENTCLASS.replace_all(working, "");
    let s = RE_USEPACKAGE.replace_all(&s, "");
    let s = s.replace(BEGIN_DOCUMENT, "").replace(END_DOCUMENT, "");
    s.trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\\begin{table}\n\\begin{tabular}{cc}\na & b \\\\\n\\end{tabular}\n\\end{table}";

    fn latex(s: &str) -> Extraction {
        Extraction::Latex(s.to_string())
    }

    #[test]
    fn fenced_block_wins_for_every_type() {
        let raw = "Here you go:\n```latex\n  E = mc^2\n```\nHope this helps!";
        for ct in ContentType::ALL {
            assert_eq!(extract(raw, ct), latex("E = mc^2"), "type {ct}");
        }
    }

    #[test]
    fn first_fence_is_used() {
        let raw = "```latex\nfirst\n```\n```latex\nsecond\n```";
        assert_eq!(extract(raw, ContentType::Text), latex("first"));
    }

    #[test]
    fn fenced_preamble_is_removed() {
        let raw = "```latex\n\\documentclass{article}\n\\usepackage{amsmath}\n\\usepackage{booktabs}\n\\begin{document}\nx + y\n\\end{document}\n```";
        assert_eq!(extract(raw, ContentType::Equation), latex("x + y"));
    }

    #[test]
    fn empty_fence_is_empty_latex_not_missing() {
        let raw = "```latex```";
        assert_eq!(extract(raw, ContentType::Table), latex(""));
    }

    #[test]
    fn table_fallback_without_fence() {
        let raw = format!("Sure! The table is:\n\n{TABLE}\n\nLet me know.");
        assert_eq!(extract(&raw, ContentType::Table), latex(TABLE));
    }

    #[test]
    fn table_fallback_is_non_greedy() {
        let raw = "\\begin{table}A\\end{table} junk \\begin{table}B\\end{table}";
        assert_eq!(
            extract(raw, ContentType::Table),
            latex("\\begin{table}A\\end{table}")
        );
    }

    #[test]
    fn equation_fallback_without_fence() {
        let raw = "The equation:\n\\begin{equation}\n  a^2 + b^2 = c^2\n\\end{equation}\nDone.";
        assert_eq!(
            extract(raw, ContentType::Equation),
            latex("\\begin{equation}\n  a^2 + b^2 = c^2\n\\end{equation}")
        );
    }

    #[test]
    fn text_fallback_takes_everything() {
        let raw = "\\documentclass{article}\n\\begin{document}\n\\section{Intro}\nHello.\n\\end{document}\n";
        assert_eq!(
            extract(raw, ContentType::Text),
            latex("\\section{Intro}\nHello.")
        );
    }

    #[test]
    fn missing_environment_is_not_found() {
        let raw = "I could not read the image, sorry.";
        assert_eq!(extract(raw, ContentType::Table), Extraction::NotFound);
        assert_eq!(extract(raw, ContentType::Equation), Extraction::NotFound);
        assert_eq!(extract(raw, ContentType::Equation).into_option(), None);
    }

    #[test]
    fn wrong_environment_is_not_found() {
        assert_eq!(extract(TABLE, ContentType::Equation), Extraction::NotFound);
    }

    #[test]
    fn usepackage_without_trailing_newline_survives() {
        // Only complete lines are preamble; a dangling directive is left alone.
        let raw = "```latex\nx\n\\usepackage{amsmath}```";
        assert_eq!(
            extract(raw, ContentType::Text),
            latex("x\n\\usepackage{amsmath}")
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let inputs = [
            ("```latex\n\\usepackage{a}\nfoo\n```", ContentType::Text),
            ("noise {TABLE} noise", ContentType::Table),
            ("\\begin{equation}x\\end{equation}", ContentType::Equation),
            ("plain words\n\n", ContentType::Text),
        ];
        for (raw, ct) in inputs {
            let raw = raw.replace("{TABLE}", TABLE);
            let Extraction::Latex(once) = extract(&raw, ct) else {
                panic!("expected latex for {raw:?}");
            };
            assert_eq!(extract(&once, ct), Extraction::Latex(once.clone()));
        }
    }
}
