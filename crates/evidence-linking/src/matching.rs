/// Similarity of two strings on a 0–100 scale (normalized Indel distance).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best alignment of the shorter string inside the longer one, on a 0–100 scale.
///
/// The shorter string is scored with [`ratio`] against every window of the
/// same length in the longer string, plus the shrinking windows that hang
/// off either end. Returns 0 when either string is empty.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (needle, haystack) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let m = needle.len();
    let n = haystack.len();

    let score = |window: &[char]| -> f64 {
        rapidfuzz::fuzz::ratio(needle.iter().copied(), window.iter().copied()) * 100.0
    };

    let mut best = 0.0_f64;

    for window in haystack.windows(m) {
        best = best.max(score(window));
        if best >= 100.0 {
            return 100.0;
        }
    }

    for k in 1..m.min(n) {
        best = best.max(score(&haystack[..k]));
        best = best.max(score(&haystack[n - k..]));
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert!((ratio("smith", "smith") - 100.0).abs() < 1e-9);
        assert!(ratio("abc", "xyz") < 1.0);
        assert!((ratio("", "") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_substring_is_perfect() {
        assert!((partial_ratio("smith", "smith 2022") - 100.0).abs() < 1e-9);
        assert!((partial_ratio("jones et al. 2021", "jones") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_near_match() {
        // One substituted char out of ten
        let score = partial_ratio("experiment", "the experimant was run");
        assert!(score > 85.0 && score < 100.0, "score was {score}");
    }

    #[test]
    fn test_partial_ratio_unrelated() {
        assert!(partial_ratio("miller", "smith 2022") < 60.0);
        assert!(partial_ratio("smith", "jones et al. 2021") < 90.0);
    }

    #[test]
    fn test_partial_ratio_empty() {
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert_eq!(partial_ratio("anything", ""), 0.0);
    }

    #[test]
    fn test_partial_ratio_symmetric() {
        let a = "beta results";
        let b = "alpha results were strong; beta results were weak";
        assert!((partial_ratio(a, b) - partial_ratio(b, a)).abs() < 1e-9);
    }
}
