use serde::{Deserialize, Serialize};

use crate::config::LinkingConfig;
use crate::evaluation::{self, ClaimMetrics};
use crate::provenance::{self, ClaimProvenance};
use crate::section::{self, Section};
use crate::{
    Bibliography, CitationLinks, ConsolidatedText, DocumentText, ReferencesSpan, bibliography,
    citations, text_processing,
};

/// A configurable evidence-linking pipeline.
///
/// Holds a [`LinkingConfig`] and exposes each step as a method.
/// The default constructor uses built-in defaults; use [`EvidenceLinker::with_config`]
/// to supply custom patterns and thresholds.
#[derive(Debug, Clone, Default)]
pub struct EvidenceLinker {
    config: LinkingConfig,
}

/// Everything the linker derives from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub references_found: bool,
    /// Byte offset of the references section in the consolidated text.
    pub references_offset: Option<usize>,
    pub bibliography: Bibliography,
    pub citation_links: CitationLinks,
}

impl EvidenceLinker {
    /// Create a linker with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a linker with a custom configuration.
    pub fn with_config(config: LinkingConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &LinkingConfig {
        &self.config
    }

    pub fn consolidate(&self, pages: &DocumentText) -> ConsolidatedText {
        text_processing::consolidate_with_config(pages, &self.config)
    }

    pub fn locate_references(&self, full_text: &str) -> Option<ReferencesSpan> {
        section::locate_references_with_config(full_text, &self.config)
    }

    pub fn detect_sections(&self, text_with_newlines: &str) -> Vec<Section> {
        section::detect_sections_with_config(text_with_newlines, &self.config)
    }

    pub fn parse_bibliography(&self, references_text: &str) -> Bibliography {
        bibliography::parse_bibliography_with_config(references_text, &self.config)
    }

    pub fn link_citations(&self, body_text: &str, bibliography: &Bibliography) -> CitationLinks {
        citations::link_citations_with_config(body_text, bibliography, &self.config)
    }

    pub fn find_provenance(&self, claim_text: &str, pages: &DocumentText) -> i32 {
        self.resolve_claim(claim_text, pages).page_number
    }

    pub fn resolve_claim(&self, claim_text: &str, pages: &DocumentText) -> ClaimProvenance {
        provenance::resolve_claim_with_config(claim_text, pages, &self.config)
    }

    /// Resolve every claim; output order follows input order.
    pub fn resolve_claims<S: AsRef<str>>(
        &self,
        claims: &[S],
        pages: &DocumentText,
    ) -> Vec<ClaimProvenance> {
        let resolved: Vec<_> = claims
            .iter()
            .map(|c| self.resolve_claim(c.as_ref(), pages))
            .collect();
        let found = resolved.iter().filter(|p| p.is_found()).count();
        tracing::info!(claims = claims.len(), found, "resolved claim provenance");
        resolved
    }

    pub fn claim_metrics<S: AsRef<str>, G: AsRef<str>>(
        &self,
        extracted: &[S],
        gold: &[G],
    ) -> ClaimMetrics {
        evaluation::claim_metrics_with_config(extracted, gold, &self.config)
    }

    /// Run the bibliography pipeline on already-consolidated text.
    ///
    /// The body is everything before the references section, or the whole
    /// text when no references header exists (the bibliography is then empty).
    pub fn analyze_text(&self, text: &ConsolidatedText) -> DocumentAnalysis {
        let full_text = text.with_newlines.as_str();

        let Some(span) = self.locate_references(full_text) else {
            tracing::warn!("bibliography unavailable, continuing without citation links");
            return DocumentAnalysis::default();
        };

        let bibliography = self.parse_bibliography(&span.text);
        let body = &full_text[..span.start_offset];
        let citation_links = self.link_citations(body, &bibliography);

        DocumentAnalysis {
            references_found: true,
            references_offset: Some(span.start_offset),
            bibliography,
            citation_links,
        }
    }

    /// Consolidate the pages, then run [`analyze_text`](Self::analyze_text).
    pub fn analyze(&self, pages: &DocumentText) -> DocumentAnalysis {
        let text = self.consolidate(pages);
        self.analyze_text(&text)
    }
}
