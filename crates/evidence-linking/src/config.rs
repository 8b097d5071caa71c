use regex::Regex;
use serde::{Deserialize, Serialize};

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ListOverride::Default)
    }
}

/// How the references text is cut into candidate entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    /// Split on one or more blank lines.
    #[default]
    BlankLines,
    /// Split before line-leading `[n]` / `n.` markers when at least three are
    /// present, otherwise fall back to blank lines.
    Markers,
}

/// What happens when two entries derive the same citation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later entry replaces the earlier one.
    #[default]
    Overwrite,
    /// The later entry gets a `-b`, `-c`, ... suffix.
    Suffix,
}

/// How a claim is matched back to a page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProvenanceStrategy {
    /// Exact containment of the normalized claim prefix; first page wins.
    #[default]
    NormalizedSubstring,
    /// Best partial-ratio score across pages, accepted above `threshold` (0-100).
    FuzzyPartial { threshold: f64 },
}

/// Configuration for the evidence-linking engine.
///
/// `Default` reproduces the built-in heuristics. Use [`LinkingConfigBuilder`]
/// to construct with string patterns.
#[derive(Debug, Clone)]
pub struct LinkingConfig {
    // ── section.rs ──
    /// Header phrases that open the references section.
    pub(crate) reference_headers: ListOverride<String>,
    /// Compiled from `reference_headers` when it isn't the default.
    pub(crate) reference_header_re: Option<Regex>,
    /// Header lines starting before this fraction of the document are ignored (0.0–1.0).
    pub(crate) header_min_fraction: f64,
    /// Headers recognised by section detection.
    pub(crate) section_headers: ListOverride<String>,
    pub(crate) section_header_re: Option<Regex>,

    // ── bibliography.rs ──
    /// Entries whose trimmed length is at most this many chars are dropped.
    pub(crate) min_entry_chars: usize,
    pub(crate) segmentation: SegmentationStrategy,
    pub(crate) collision_policy: CollisionPolicy,
    /// Regex with `name` and `year` groups used to derive citation keys.
    pub(crate) citation_key_re: Option<Regex>,

    // ── citations.rs ──
    /// Regex matching in-text citation mentions.
    pub(crate) mention_re: Option<Regex>,
    /// Partial-ratio score (0–100) a mention must exceed to be linked.
    pub(crate) link_threshold: f64,

    // ── provenance.rs ──
    pub(crate) provenance_strategy: ProvenanceStrategy,
    /// Number of leading claim chars used for the lookup.
    pub(crate) snippet_chars: usize,

    // ── evaluation.rs ──
    pub(crate) claim_match_threshold: f64,

    // ── text_processing.rs ──
    /// Compound-word suffixes that should preserve the hyphen.
    pub(crate) compound_suffixes: ListOverride<String>,
}

pub(crate) const DEFAULT_MIN_ENTRY_CHARS: usize = 20;
pub(crate) const DEFAULT_LINK_THRESHOLD: f64 = 90.0;
pub(crate) const DEFAULT_FUZZY_PROVENANCE_THRESHOLD: f64 = 90.0;
pub(crate) const DEFAULT_SNIPPET_CHARS: usize = 100;
pub(crate) const DEFAULT_CLAIM_MATCH_THRESHOLD: f64 = 95.0;

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            reference_headers: ListOverride::Default,
            reference_header_re: None,
            header_min_fraction: 0.0,
            section_headers: ListOverride::Default,
            section_header_re: None,
            min_entry_chars: DEFAULT_MIN_ENTRY_CHARS,
            segmentation: SegmentationStrategy::default(),
            collision_policy: CollisionPolicy::default(),
            citation_key_re: None,
            mention_re: None,
            link_threshold: DEFAULT_LINK_THRESHOLD,
            provenance_strategy: ProvenanceStrategy::default(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            claim_match_threshold: DEFAULT_CLAIM_MATCH_THRESHOLD,
            compound_suffixes: ListOverride::Default,
        }
    }
}

impl LinkingConfig {
    pub fn link_threshold(&self) -> f64 {
        self.link_threshold
    }

    pub fn provenance_strategy(&self) -> ProvenanceStrategy {
        self.provenance_strategy
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    pub fn segmentation(&self) -> SegmentationStrategy {
        self.segmentation
    }
}

/// Builder for [`LinkingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct LinkingConfigBuilder {
    reference_headers: ListOverride<String>,
    header_min_fraction: Option<f64>,
    section_headers: ListOverride<String>,
    min_entry_chars: Option<usize>,
    segmentation: Option<SegmentationStrategy>,
    collision_policy: Option<CollisionPolicy>,
    citation_key_re: Option<String>,
    mention_re: Option<String>,
    link_threshold: Option<f64>,
    provenance_strategy: Option<ProvenanceStrategy>,
    snippet_chars: Option<usize>,
    claim_match_threshold: Option<f64>,
    compound_suffixes: ListOverride<String>,
}

fn push_extend(list: &mut ListOverride<String>, value: String) {
    match list {
        ListOverride::Extend(v) => v.push(value),
        _ => *list = ListOverride::Extend(vec![value]),
    }
}

impl LinkingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Section headers ──

    pub fn set_reference_headers(mut self, headers: Vec<String>) -> Self {
        self.reference_headers = ListOverride::Replace(headers);
        self
    }

    pub fn add_reference_header(mut self, header: String) -> Self {
        push_extend(&mut self.reference_headers, header);
        self
    }

    pub fn header_min_fraction(mut self, fraction: f64) -> Self {
        self.header_min_fraction = Some(fraction);
        self
    }

    pub fn set_section_headers(mut self, headers: Vec<String>) -> Self {
        self.section_headers = ListOverride::Replace(headers);
        self
    }

    pub fn add_section_header(mut self, header: String) -> Self {
        push_extend(&mut self.section_headers, header);
        self
    }

    // ── Bibliography ──

    pub fn min_entry_chars(mut self, n: usize) -> Self {
        self.min_entry_chars = Some(n);
        self
    }

    pub fn segmentation(mut self, strategy: SegmentationStrategy) -> Self {
        self.segmentation = Some(strategy);
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = Some(policy);
        self
    }

    /// Custom key pattern. Must define `name` and `year` capture groups.
    pub fn citation_key_regex(mut self, pattern: &str) -> Self {
        self.citation_key_re = Some(pattern.to_string());
        self
    }

    // ── Citations ──

    pub fn mention_regex(mut self, pattern: &str) -> Self {
        self.mention_re = Some(pattern.to_string());
        self
    }

    pub fn link_threshold(mut self, threshold: f64) -> Self {
        self.link_threshold = Some(threshold);
        self
    }

    // ── Provenance ──

    pub fn provenance_strategy(mut self, strategy: ProvenanceStrategy) -> Self {
        self.provenance_strategy = Some(strategy);
        self
    }

    pub fn snippet_chars(mut self, n: usize) -> Self {
        self.snippet_chars = Some(n);
        self
    }

    // ── Evaluation ──

    pub fn claim_match_threshold(mut self, threshold: f64) -> Self {
        self.claim_match_threshold = Some(threshold);
        self
    }

    // ── Compound suffixes ──

    pub fn set_compound_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compound_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_compound_suffix(mut self, suffix: String) -> Self {
        push_extend(&mut self.compound_suffixes, suffix);
        self
    }

    /// Compile all string patterns into regexes and produce a [`LinkingConfig`].
    pub fn build(self) -> Result<LinkingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let reference_header_re = if self.reference_headers.is_default() {
            None
        } else {
            let phrases = self
                .reference_headers
                .resolve(&crate::section::default_reference_headers());
            Some(crate::section::header_line_regex(&phrases, false)?)
        };

        let section_header_re = if self.section_headers.is_default() {
            None
        } else {
            let phrases = self
                .section_headers
                .resolve(&crate::section::default_section_headers());
            Some(crate::section::header_line_regex(&phrases, true)?)
        };

        Ok(LinkingConfig {
            reference_headers: self.reference_headers,
            reference_header_re,
            header_min_fraction: self.header_min_fraction.unwrap_or(0.0).clamp(0.0, 1.0),
            section_headers: self.section_headers,
            section_header_re,
            min_entry_chars: self.min_entry_chars.unwrap_or(DEFAULT_MIN_ENTRY_CHARS),
            segmentation: self.segmentation.unwrap_or_default(),
            collision_policy: self.collision_policy.unwrap_or_default(),
            citation_key_re: compile(self.citation_key_re)?,
            mention_re: compile(self.mention_re)?,
            link_threshold: self.link_threshold.unwrap_or(DEFAULT_LINK_THRESHOLD),
            provenance_strategy: self.provenance_strategy.unwrap_or_default(),
            snippet_chars: self.snippet_chars.unwrap_or(DEFAULT_SNIPPET_CHARS),
            claim_match_threshold: self
                .claim_match_threshold
                .unwrap_or(DEFAULT_CLAIM_MATCH_THRESHOLD),
            compound_suffixes: self.compound_suffixes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LinkingConfig::default();
        assert_eq!(config.min_entry_chars, 20);
        assert_eq!(config.snippet_chars, 100);
        assert!((config.link_threshold - 90.0).abs() < f64::EPSILON);
        assert_eq!(config.collision_policy, CollisionPolicy::Overwrite);
        assert_eq!(config.segmentation, SegmentationStrategy::BlankLines);
        assert_eq!(
            config.provenance_strategy,
            ProvenanceStrategy::NormalizedSubstring
        );
    }

    #[test]
    fn test_builder_basic() {
        let config = LinkingConfigBuilder::new()
            .min_entry_chars(10)
            .link_threshold(80.0)
            .header_min_fraction(0.5)
            .collision_policy(CollisionPolicy::Suffix)
            .build()
            .unwrap();
        assert_eq!(config.min_entry_chars, 10);
        assert!((config.link_threshold - 80.0).abs() < f64::EPSILON);
        assert!((config.header_min_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.collision_policy, CollisionPolicy::Suffix);
    }

    #[test]
    fn test_builder_clamps_fraction() {
        let config = LinkingConfigBuilder::new()
            .header_min_fraction(4.0)
            .build()
            .unwrap();
        assert!((config.header_min_fraction - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_custom_headers_compile() {
        let config = LinkingConfigBuilder::new()
            .add_reference_header("literatur".to_string())
            .build()
            .unwrap();
        assert!(config.reference_header_re.is_some());
        assert!(config.section_header_re.is_none());
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = LinkingConfigBuilder::new().mention_regex(r"[invalid").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
