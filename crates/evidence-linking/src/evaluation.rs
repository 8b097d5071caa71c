use serde::{Deserialize, Serialize};

use crate::config::LinkingConfig;
use crate::matching::partial_ratio;

/// Precision/recall of extracted claims against a gold standard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Score extracted claims against gold-standard claims.
///
/// An extracted claim is a true positive when it partially matches (score > 95,
/// case-insensitive) a gold claim not already matched; each gold claim is
/// matched at most once.
pub fn claim_metrics<S: AsRef<str>, G: AsRef<str>>(extracted: &[S], gold: &[G]) -> ClaimMetrics {
    claim_metrics_with_config(extracted, gold, &LinkingConfig::default())
}

pub(crate) fn claim_metrics_with_config<S: AsRef<str>, G: AsRef<str>>(
    extracted: &[S],
    gold: &[G],
    config: &LinkingConfig,
) -> ClaimMetrics {
    if gold.is_empty() {
        return ClaimMetrics {
            false_positives: extracted.len(),
            ..Default::default()
        };
    }

    let gold_lower: Vec<String> = gold.iter().map(|g| g.as_ref().to_lowercase()).collect();
    let mut matched = vec![false; gold_lower.len()];
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;

    for claim in extracted {
        let claim = claim.as_ref().to_lowercase();
        let hit = gold_lower.iter().enumerate().position(|(i, g)| {
            !matched[i] && partial_ratio(&claim, g) > config.claim_match_threshold
        });
        match hit {
            Some(i) => {
                matched[i] = true;
                true_positives += 1;
            }
            None => false_positives += 1,
        }
    }

    let false_negatives = matched.iter().filter(|m| !**m).count();

    let precision = ratio_or_zero(true_positives, true_positives + false_positives);
    let recall = ratio_or_zero(true_positives, true_positives + false_negatives);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    tracing::info!(
        tp = true_positives,
        fp = false_positives,
        fn_ = false_negatives,
        "claim evaluation complete"
    );

    ClaimMetrics {
        precision,
        recall,
        f1_score,
        true_positives,
        false_positives,
        false_negatives,
    }
}

fn ratio_or_zero(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
