use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bibliography;
pub mod citations;
pub mod config;
pub mod config_file;
pub mod evaluation;
pub mod linker;
pub mod matching;
pub mod normalize;
pub mod provenance;
pub mod section;
pub mod text_processing;

pub use bibliography::parse_bibliography;
pub use citations::link_citations;
pub use config::{
    CollisionPolicy, LinkingConfig, LinkingConfigBuilder, ListOverride, ProvenanceStrategy,
    SegmentationStrategy,
};
pub use evaluation::{ClaimMetrics, claim_metrics};
pub use linker::{DocumentAnalysis, EvidenceLinker};
pub use normalize::normalize;
pub use provenance::{ClaimProvenance, find_provenance, resolve_claim};
pub use section::{Section, detect_sections, locate_references};
pub use text_processing::consolidate;

/// Page number reported when a claim cannot be attributed to any page.
pub const PAGE_NOT_FOUND: i32 = -1;

#[derive(Error, Debug)]
pub enum LinkingError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),
    #[error("malformed document text: {0}")]
    DocumentText(#[from] serde_json::Error),
    #[error("invalid page index {0:?}")]
    PageIndex(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw per-page text supplied by the document source, keyed by zero-based page index.
///
/// Serializes as an array of `{page_index, text}` records in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    pages: BTreeMap<usize, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageRecord {
    page_index: usize,
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PagesShape {
    List(Vec<PageRecord>),
    Map(BTreeMap<String, String>),
}

impl DocumentText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(page_index, text)` pairs. A repeated index keeps the last text.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(|(i, t)| (i, t.into())).collect(),
        }
    }

    /// Parse either the `[{page_index, text}, ...]` list shape or an object
    /// keyed by decimal page index.
    pub fn from_json_str(json: &str) -> Result<Self, LinkingError> {
        Self::from_shape(serde_json::from_str::<PagesShape>(json)?)
    }

    fn from_shape(shape: PagesShape) -> Result<Self, LinkingError> {
        match shape {
            PagesShape::List(records) => Ok(Self::from_pages(
                records.into_iter().map(|r| (r.page_index, r.text)),
            )),
            PagesShape::Map(map) => {
                let mut pages = BTreeMap::new();
                for (key, text) in map {
                    let index = key
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| LinkingError::PageIndex(key.clone()))?;
                    pages.insert(index, text);
                }
                Ok(Self { pages })
            }
        }
    }

    pub fn insert(&mut self, page_index: usize, text: impl Into<String>) {
        self.pages.insert(page_index, text.into());
    }

    pub fn page(&self, page_index: usize) -> Option<&str> {
        self.pages.get(&page_index).map(String::as_str)
    }

    /// Pages in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages.iter().map(|(i, t)| (*i, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Serialize for DocumentText {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<PageRecord> = self
            .pages
            .iter()
            .map(|(i, t)| PageRecord {
                page_index: *i,
                text: t.clone(),
            })
            .collect();
        records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentText {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let shape = PagesShape::deserialize(deserializer)?;
        Self::from_shape(shape).map_err(serde::de::Error::custom)
    }
}

/// Document text derived once from [`DocumentText`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedText {
    /// Line structure preserved; section offsets index into this string.
    pub with_newlines: String,
    /// Every whitespace run collapsed to a single space.
    pub flat: String,
}

/// The references section and the byte offset where it starts in `with_newlines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencesSpan {
    pub text: String,
    pub start_offset: usize,
}

/// One parsed reference-list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyEntry {
    pub citation_key: String,
    pub full_citation: String,
}

impl BibliographyEntry {
    pub fn new(citation_key: impl Into<String>, full_citation: impl Into<String>) -> Self {
        Self {
            citation_key: citation_key.into(),
            full_citation: full_citation.into(),
        }
    }
}

/// Citation key -> entry.
pub type Bibliography = BTreeMap<String, BibliographyEntry>;

/// Citation key -> distinct in-text mention strings. Never holds an empty set.
pub type CitationLinks = BTreeMap<String, BTreeSet<String>>;
