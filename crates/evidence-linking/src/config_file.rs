use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::LinkingError;
use crate::config::{
    CollisionPolicy, DEFAULT_FUZZY_PROVENANCE_THRESHOLD, LinkingConfig, LinkingConfigBuilder,
    ProvenanceStrategy, SegmentationStrategy,
};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub section: Option<SectionConfig>,
    pub bibliography: Option<BibliographyConfig>,
    pub citations: Option<CitationsConfig>,
    pub provenance: Option<ProvenanceConfig>,
    pub evaluation: Option<EvaluationConfig>,
    pub text: Option<TextConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Replaces the built-in references header vocabulary.
    pub reference_headers: Option<Vec<String>>,
    /// Appended to the vocabulary (after any replacement).
    pub extra_reference_headers: Option<Vec<String>>,
    pub header_min_fraction: Option<f64>,
    pub section_headers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibliographyConfig {
    pub min_entry_chars: Option<usize>,
    pub segmentation: Option<SegmentationStrategy>,
    pub collision_policy: Option<CollisionPolicy>,
    pub citation_key_regex: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationsConfig {
    pub mention_regex: Option<String>,
    pub link_threshold: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceStrategyName {
    NormalizedSubstring,
    FuzzyPartial,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceConfig {
    pub strategy: Option<ProvenanceStrategyName>,
    pub fuzzy_threshold: Option<f64>,
    pub snippet_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub claim_match_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub compound_suffixes: Option<Vec<String>>,
    pub extra_compound_suffixes: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/evidence-linker/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("evidence-linker").join("config.toml"))
}

/// Load config by cascading CWD `.evidence-linker.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".evidence-linker.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(LinkingError::Io(_)) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Read and parse a config file, surfacing I/O and TOML errors.
pub fn read_config(path: &Path) -> Result<ConfigFile, LinkingError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn pick<T>(overlay: Option<T>, base: Option<T>) -> Option<T> {
    overlay.or(base)
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bs = base.section.unwrap_or_default();
    let os = overlay.section.unwrap_or_default();
    let bb = base.bibliography.unwrap_or_default();
    let ob = overlay.bibliography.unwrap_or_default();
    let bc = base.citations.unwrap_or_default();
    let oc = overlay.citations.unwrap_or_default();
    let bp = base.provenance.unwrap_or_default();
    let op = overlay.provenance.unwrap_or_default();
    let be = base.evaluation.unwrap_or_default();
    let oe = overlay.evaluation.unwrap_or_default();
    let bt = base.text.unwrap_or_default();
    let ot = overlay.text.unwrap_or_default();

    ConfigFile {
        section: Some(SectionConfig {
            reference_headers: pick(os.reference_headers, bs.reference_headers),
            extra_reference_headers: pick(os.extra_reference_headers, bs.extra_reference_headers),
            header_min_fraction: pick(os.header_min_fraction, bs.header_min_fraction),
            section_headers: pick(os.section_headers, bs.section_headers),
        }),
        bibliography: Some(BibliographyConfig {
            min_entry_chars: pick(ob.min_entry_chars, bb.min_entry_chars),
            segmentation: pick(ob.segmentation, bb.segmentation),
            collision_policy: pick(ob.collision_policy, bb.collision_policy),
            citation_key_regex: pick(ob.citation_key_regex, bb.citation_key_regex),
        }),
        citations: Some(CitationsConfig {
            mention_regex: pick(oc.mention_regex, bc.mention_regex),
            link_threshold: pick(oc.link_threshold, bc.link_threshold),
        }),
        provenance: Some(ProvenanceConfig {
            strategy: pick(op.strategy, bp.strategy),
            fuzzy_threshold: pick(op.fuzzy_threshold, bp.fuzzy_threshold),
            snippet_chars: pick(op.snippet_chars, bp.snippet_chars),
        }),
        evaluation: Some(EvaluationConfig {
            claim_match_threshold: pick(oe.claim_match_threshold, be.claim_match_threshold),
        }),
        text: Some(TextConfig {
            compound_suffixes: pick(ot.compound_suffixes, bt.compound_suffixes),
            extra_compound_suffixes: pick(ot.extra_compound_suffixes, bt.extra_compound_suffixes),
        }),
    }
}

impl ConfigFile {
    /// Apply every set value onto a fresh [`LinkingConfigBuilder`].
    pub fn to_builder(&self) -> LinkingConfigBuilder {
        let mut builder = LinkingConfigBuilder::new();

        if let Some(section) = &self.section {
            if let Some(headers) = &section.reference_headers {
                builder = builder.set_reference_headers(headers.clone());
            }
            for header in section.extra_reference_headers.iter().flatten() {
                builder = builder.add_reference_header(header.clone());
            }
            if let Some(fraction) = section.header_min_fraction {
                builder = builder.header_min_fraction(fraction);
            }
            if let Some(headers) = &section.section_headers {
                builder = builder.set_section_headers(headers.clone());
            }
        }

        if let Some(bib) = &self.bibliography {
            if let Some(n) = bib.min_entry_chars {
                builder = builder.min_entry_chars(n);
            }
            if let Some(strategy) = bib.segmentation {
                builder = builder.segmentation(strategy);
            }
            if let Some(policy) = bib.collision_policy {
                builder = builder.collision_policy(policy);
            }
            if let Some(pattern) = &bib.citation_key_regex {
                builder = builder.citation_key_regex(pattern);
            }
        }

        if let Some(citations) = &self.citations {
            if let Some(pattern) = &citations.mention_regex {
                builder = builder.mention_regex(pattern);
            }
            if let Some(threshold) = citations.link_threshold {
                builder = builder.link_threshold(threshold);
            }
        }

        if let Some(prov) = &self.provenance {
            match prov.strategy {
                Some(ProvenanceStrategyName::FuzzyPartial) => {
                    builder = builder.provenance_strategy(ProvenanceStrategy::FuzzyPartial {
                        threshold: prov
                            .fuzzy_threshold
                            .unwrap_or(DEFAULT_FUZZY_PROVENANCE_THRESHOLD),
                    });
                }
                Some(ProvenanceStrategyName::NormalizedSubstring) => {
                    builder = builder.provenance_strategy(ProvenanceStrategy::NormalizedSubstring);
                }
                None => {}
            }
            if let Some(n) = prov.snippet_chars {
                builder = builder.snippet_chars(n);
            }
        }

        if let Some(threshold) = self.evaluation.as_ref().and_then(|e| e.claim_match_threshold) {
            builder = builder.claim_match_threshold(threshold);
        }

        if let Some(text) = &self.text {
            if let Some(suffixes) = &text.compound_suffixes {
                builder = builder.set_compound_suffixes(suffixes.clone());
            }
            for suffix in text.extra_compound_suffixes.iter().flatten() {
                builder = builder.add_compound_suffix(suffix.clone());
            }
        }

        builder
    }

    /// Build a [`LinkingConfig`], compiling any custom patterns.
    pub fn build_config(&self) -> Result<LinkingConfig, LinkingError> {
        Ok(self.to_builder().build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[section]
extra_reference_headers = ["sources"]
header_min_fraction = 0.25

[bibliography]
segmentation = "markers"
collision_policy = "suffix"

[citations]
link_threshold = 85.0

[provenance]
strategy = "fuzzy_partial"
fuzzy_threshold = 92.5
"#;

    #[test]
    fn test_parse_sample() {
        let config: ConfigFile = toml::from_str(SAMPLE).unwrap();
        let bib = config.bibliography.as_ref().unwrap();
        assert_eq!(bib.segmentation, Some(SegmentationStrategy::Markers));
        assert_eq!(bib.collision_policy, Some(CollisionPolicy::Suffix));

        let built = config.build_config().unwrap();
        assert_eq!(built.collision_policy(), CollisionPolicy::Suffix);
        assert_eq!(built.segmentation(), SegmentationStrategy::Markers);
        assert!((built.link_threshold() - 85.0).abs() < f64::EPSILON);
        assert_eq!(
            built.provenance_strategy(),
            ProvenanceStrategy::FuzzyPartial { threshold: 92.5 }
        );
        assert!(built.reference_header_re.is_some());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
        let built = config.build_config().unwrap();
        assert_eq!(built.collision_policy(), CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_invalid_regex_surfaces() {
        let config: ConfigFile = toml::from_str("[citations]\nmention_regex = \"[oops\"\n").unwrap();
        assert!(matches!(config.build_config(), Err(LinkingError::Pattern(_))));
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base: ConfigFile = toml::from_str(
            "[citations]\nlink_threshold = 80.0\n[bibliography]\nmin_entry_chars = 10\n",
        )
        .unwrap();
        let overlay: ConfigFile = toml::from_str("[citations]\nlink_threshold = 95.0\n").unwrap();
        let merged = merge(base, overlay);
        assert_eq!(merged.citations.unwrap().link_threshold, Some(95.0));
        assert_eq!(merged.bibliography.unwrap().min_entry_chars, Some(10));
    }

    #[test]
    fn test_read_config_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = read_config(file.path()).unwrap();
        assert_eq!(
            config.provenance.unwrap().strategy,
            Some(ProvenanceStrategyName::FuzzyPartial)
        );
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_from_path(&missing).is_none());
        assert!(matches!(read_config(&missing), Err(LinkingError::Io(_))));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[citations\nlink_threshold = ").unwrap();
        assert!(load_from_path(&bad).is_none());
        assert!(matches!(read_config(&bad), Err(LinkingError::ConfigFile(_))));
    }
}
