/// String closeness in `[0, 1]`; `1.0` means identical.
///
/// Scorers only measure. Deciding what counts as a match is up to the caller.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Case-insensitive Jaro-Winkler similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityScorer for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        strsim::jaro_winkler(&a.to_lowercase(), &b.to_lowercase())
    }
}
