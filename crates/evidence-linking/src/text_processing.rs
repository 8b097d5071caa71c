use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::config::LinkingConfig;
use crate::{ConsolidatedText, DocumentText};

/// Common compound-word suffixes that should keep the hyphen.
pub(crate) static COMPOUND_SUFFIXES: &[&str] = &[
    "centered",
    "based",
    "driven",
    "aware",
    "oriented",
    "specific",
    "related",
    "dependent",
    "independent",
    "like",
    "free",
    "friendly",
    "rich",
    "poor",
    "scale",
    "level",
    "order",
    "class",
    "type",
    "style",
    "wise",
    "fold",
    "shot",
    "step",
    "time",
    "world",
    "source",
    "domain",
    "task",
    "modal",
    "intensive",
    "efficient",
    "agnostic",
    "invariant",
    "sensitive",
    "grained",
    "agent",
    "site",
    // Trial and clinical reporting
    "blind",
    "controlled",
    "derived",
    "group",
    "induced",
    "matched",
    "month",
    "term",
    "treated",
    "up",
    "week",
    "year",
    "adjusted",
    "arm",
    "dose",
    "response",
    "risk",
];

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Drop lines that hold nothing but a page number.
pub fn strip_page_numbers(text: &str) -> String {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*\d{1,4}[^\S\n]*(?:\n|\z)").unwrap());
    RE.replace_all(text, "").into_owned()
}

/// Join words hyphenated across a line break while preserving compound words.
///
/// - `"hyphen-\nated"` → `"hyphenated"`
/// - `"placebo-\ncontrolled"` → `"placebo-controlled"`
pub fn fix_line_break_hyphenation(text: &str) -> String {
    fix_line_break_hyphenation_with_config(text, &LinkingConfig::default())
}

/// Config-aware version of [`fix_line_break_hyphenation`].
pub(crate) fn fix_line_break_hyphenation_with_config(
    text: &str,
    config: &LinkingConfig,
) -> String {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\w)-[^\S\n]*\n[^\S\n]*(\w)(\w*)").unwrap());

    let defaults: Vec<String> = COMPOUND_SUFFIXES.iter().map(|s| s.to_string()).collect();
    let suffixes: HashSet<String> = config
        .compound_suffixes
        .resolve(&defaults)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after_word = format!("{}{}", &caps[2], &caps[3]);

        // Digit before the hyphen: ranges and identifiers ("COVID-19", "5-\n10")
        if before.chars().last().is_some_and(|c| c.is_ascii_digit()) {
            return format!("{}-{}", before, after_word);
        }

        if suffixes.contains(&after_word.to_lowercase()) {
            return format!("{}-{}", before, after_word);
        }

        format!("{}{}", before, after_word)
    })
    .into_owned()
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Consolidate per-page text into one document string.
///
/// Pages are joined in index order, ligatures expanded, page-number lines
/// dropped and line-break hyphenation repaired.
pub fn consolidate(pages: &DocumentText) -> ConsolidatedText {
    consolidate_with_config(pages, &LinkingConfig::default())
}

/// Config-aware version of [`consolidate`].
pub(crate) fn consolidate_with_config(
    pages: &DocumentText,
    config: &LinkingConfig,
) -> ConsolidatedText {
    let joined = pages.iter().map(|(_, t)| t).collect::<Vec<_>>().join("\n");
    let text = expand_ligatures(&joined);
    let text = strip_page_numbers(&text);
    let with_newlines = fix_line_break_hyphenation_with_config(&text, config);
    let flat = collapse_whitespace(&with_newlines);

    tracing::debug!(
        pages = pages.len(),
        chars = with_newlines.len(),
        "consolidated document text"
    );

    ConsolidatedText {
        with_newlines,
        flat,
    }
}
