use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ReferencesSpan;
use crate::config::LinkingConfig;

const REFERENCE_HEADERS: &[&str] = &[
    "references",
    "literature cited",
    "bibliography",
    "works cited",
];

const SECTION_HEADERS: &[&str] = &[
    "abstract",
    "introduction",
    "background",
    "related work",
    "methods",
    "methodology",
    "materials and methods",
    "experimental setup",
    "results",
    "findings",
    "discussion",
    "conclusion",
    "summary",
    "acknowledgements",
    "references",
    "bibliography",
    "literature cited",
];

pub(crate) fn default_reference_headers() -> Vec<String> {
    REFERENCE_HEADERS.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn default_section_headers() -> Vec<String> {
    SECTION_HEADERS.iter().map(|s| s.to_string()).collect()
}

/// Build a case-insensitive regex matching a line whose whole trimmed content is
/// one of `phrases`. Words inside a phrase may be separated by any horizontal
/// whitespace. With `numbered`, an optional `2.` / `IV.` style prefix is allowed.
///
/// Capture group 1 is the phrase as written in the text.
pub(crate) fn header_line_regex(phrases: &[String], numbered: bool) -> Result<Regex, regex::Error> {
    let alternatives: Vec<String> = phrases
        .iter()
        .map(|p| {
            p.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[^\S\n]+")
        })
        .filter(|p| !p.is_empty())
        .collect();

    if alternatives.is_empty() {
        // Never matches
        return Regex::new(r"\z.");
    }

    let prefix = if numbered {
        r"(?:(?:\d{1,2}(?:\.\d{1,2})*\.?|[IVX]{1,4}\.)[^\S\n]*|[IVX]{1,4}[^\S\n]+)?"
    } else {
        ""
    };

    Regex::new(&format!(
        r"(?im)^[^\S\n]*{}({})[^\S\n]*$",
        prefix,
        alternatives.join("|")
    ))
}

static REFERENCE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| header_line_regex(&default_reference_headers(), false).unwrap());

static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| header_line_regex(&default_section_headers(), true).unwrap());

/// Locate the references section in the document text.
///
/// Finds the first line that consists solely of a references header
/// (References, Literature Cited, Bibliography, Works Cited) and returns the
/// trimmed text after it, plus the byte offset right after the header.
/// Returns `None` when no such line exists.
pub fn locate_references(full_text: &str) -> Option<ReferencesSpan> {
    locate_references_with_config(full_text, &LinkingConfig::default())
}

/// Config-aware version of [`locate_references`].
pub(crate) fn locate_references_with_config(
    full_text: &str,
    config: &LinkingConfig,
) -> Option<ReferencesSpan> {
    let header_re = config
        .reference_header_re
        .as_ref()
        .unwrap_or(&REFERENCE_HEADER_RE);

    let min_start = (full_text.len() as f64 * config.header_min_fraction) as usize;

    let Some(m) = header_re
        .find_iter(full_text)
        .find(|m| m.start() >= min_start)
    else {
        tracing::warn!("no references or bibliography header found");
        return None;
    };

    let start_offset = m.end();
    tracing::info!(
        header = m.as_str().trim(),
        offset = start_offset,
        "found references section header"
    );

    Some(ReferencesSpan {
        text: full_text[start_offset..].trim().to_string(),
        start_offset,
    })
}

/// A titled section of the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Lowercased header phrase, internal whitespace collapsed.
    pub title: String,
    /// Trimmed text between this header and the next one.
    pub text: String,
    /// Byte offset of the header line.
    pub start_char: usize,
}

/// Split the document into sections at standard header lines
/// (Introduction, Methods, Results, ...), optionally numbered.
pub fn detect_sections(text_with_newlines: &str) -> Vec<Section> {
    detect_sections_with_config(text_with_newlines, &LinkingConfig::default())
}

/// Config-aware version of [`detect_sections`].
pub(crate) fn detect_sections_with_config(
    text_with_newlines: &str,
    config: &LinkingConfig,
) -> Vec<Section> {
    let header_re = config
        .section_header_re
        .as_ref()
        .unwrap_or(&SECTION_HEADER_RE);

    let headers: Vec<_> = header_re.captures_iter(text_with_newlines).collect();
    if headers.is_empty() {
        tracing::warn!("no standard section headers detected");
        return Vec::new();
    }
    tracing::info!(count = headers.len(), "detected section headers");

    let mut sections = Vec::with_capacity(headers.len());
    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text_with_newlines.len());

        sections.push(Section {
            title: title
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            text: text_with_newlines[whole.end()..end].trim().to_string(),
            start_char: whole.start(),
        });
    }
    sections
}
