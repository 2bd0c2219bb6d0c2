//! Classifier scoring configuration

use serde::Deserialize;

/// Scoring weights and thresholds for the query classifier.
///
/// Defaults were tuned against Norwegian product queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Score added per keyword substring match
    pub keyword_weight: f64,
    /// Score added per regex pattern match
    pub pattern_weight: f64,
    /// Queries with fewer words than this get the short-query bonus
    pub short_query_words: usize,
    /// Bonus toward `simple` for short queries
    pub short_query_bonus: f64,
    /// Queries with more words than this get the long-query bonus
    pub long_query_words: usize,
    /// Bonus toward `complex` for long queries
    pub long_query_bonus: f64,
    /// Bonus toward `simple` for brand/model-number tokens such as `PG-540`
    pub model_number_bonus: f64,
    /// Approximate maximum attainable score, used to normalize confidence
    pub max_expected_score: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 1.0,
            pattern_weight: 2.0,
            short_query_words: 4,
            short_query_bonus: 1.5,
            long_query_words: 15,
            long_query_bonus: 2.0,
            model_number_bonus: 3.0,
            max_expected_score: 6.0,
        }
    }
}
