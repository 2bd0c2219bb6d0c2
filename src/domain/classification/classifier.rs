//! Keyword and pattern based query classifier

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::config::ClassifierConfig;
use super::types::{QueryClassification, QueryType, Strategy};

/// Uppercase letter run followed by digits and an optional short suffix,
/// e.g. `PG-540`, `PG-540XL`, `T2991`, `TN2420`
static MODEL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}-?\d{2,}[A-Z]{0,3}\b").expect("valid regex"));

static FRESHNESS_INTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(nyeste|siste|nylig|nye|latest|newest|20\d{2})\b").expect("valid regex")
});

const PRICE_INTENT: &[&str] = &[
    "pris", "kost", "kjøp", "billig", "tilbud", "rabatt", "price", "buy", "cost", "cheap",
];

const IMAGERY: &[&str] = &[
    "bilde", "foto", "image", "picture", "photo", "screenshot",
];

struct TypeRules {
    query_type: QueryType,
    /// Matched anywhere, so stems like `anbefal` cover their inflections
    keywords: &'static [&'static str],
    /// Matched only as complete words (`best` must not hit `bestille`)
    whole_words: &'static [&'static str],
    patterns: Vec<Regex>,
}

static RULES: Lazy<Vec<TypeRules>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid regex"))
            .collect()
    };

    vec![
        TypeRules {
            query_type: QueryType::Simple,
            keywords: &[
                "pris", "koster", "kjøp", "billig", "tilbud", "lager", "price", "cost", "buy",
                "cheap",
            ],
            whole_words: &[],
            patterns: compile(&[
                r"\b(hva|hvor mye) koster\b",
                r"\bpris(en|er|ene)?\b",
                r"\bpå lager\b",
                r"\bhvor (kan jeg )?(kjøpe|få tak i)\b",
            ]),
        },
        TypeRules {
            query_type: QueryType::Complex,
            keywords: &[
                "hvorfor", "forklar", "hvordan", "analyse", "feilsøk", "problem",
                "fungerer ikke", "explain", "why", "how does",
            ],
            whole_words: &[],
            patterns: compile(&[
                r"\bhvordan (kan|skal|gjør|fungerer|virker)\b",
                r"\bhvorfor (er|blir|fungerer|virker|får)\b",
                r"\bforklar\w*\b",
            ]),
        },
        TypeRules {
            query_type: QueryType::Compatibility,
            keywords: &[
                "passer", "kompatib", "fungerer med", "virker med", "støtte", "compatible",
                "works with", "fits",
            ],
            whole_words: &[],
            patterns: compile(&[
                r"\b(passer|fungerer|virker)\b.*\b(med|til|i)\b",
                r"\bkompatib\w*\b",
                r"\bworks? with\b",
            ]),
        },
        TypeRules {
            query_type: QueryType::Comparison,
            keywords: &[
                "sammenlign", "forskjell", "versus", " vs ", "bedre enn", "hvilken", "compare",
                "difference", "which",
            ],
            whole_words: &[],
            patterns: compile(&[
                r"\bhvilken\b.*\b(best|beste|bedre)\b",
                r"\b(vs\.?|versus)\b",
                r"\bsammenlign\w*\b",
                r"\bforskjell(en|ene)?\b",
            ]),
        },
        TypeRules {
            query_type: QueryType::Recommendation,
            keywords: &[
                "anbefal", "foreslå", "bør jeg", "tips", "recommend", "suggest", "should i",
            ],
            whole_words: &["best", "beste"],
            patterns: compile(&[
                r"\banbefal\w*\b",
                r"\b(beste|best)\b.*\bfor\b",
                r"\bbør jeg\b",
            ]),
        },
    ]
});

/// Per-type score with the signals that produced it
#[derive(Debug, Clone)]
struct TypeScore {
    query_type: QueryType,
    score: f64,
    signals: Vec<String>,
}

/// Classifies product queries into a type and processing strategy.
///
/// Pure and deterministic: the same input always yields the same
/// classification.
#[derive(Debug, Clone, Default)]
pub struct QueryClassifier {
    config: ClassifierConfig,
}

impl QueryClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, query: &str, has_image: bool) -> QueryClassification {
        let trimmed = query.trim();
        let lowered = trimmed.to_lowercase();
        let requires_image = has_image || mentions_imagery(&lowered);

        if trimmed.is_empty() {
            let strategy = promote_for_image(Strategy::SearchOnly, has_image);

            return QueryClassification {
                query_type: QueryType::Simple,
                strategy,
                confidence: 0.0,
                reasoning: "Empty query, defaulting to simple".to_string(),
                requires_image,
            };
        }

        let scores = self.score(trimmed, &lowered);
        let winner = pick_winner(&scores);

        let strategy = promote_for_image(select_strategy(winner.query_type, &lowered), has_image);
        let confidence = self.normalize(winner.score);

        let reasoning = if winner.signals.is_empty() {
            format!("No signals matched, defaulting to {}", winner.query_type)
        } else {
            format!(
                "Classified as {} (score {:.2}): {}",
                winner.query_type,
                winner.score,
                winner.signals.join(", ")
            )
        };

        QueryClassification {
            query_type: winner.query_type,
            strategy,
            confidence,
            reasoning,
            requires_image,
        }
    }

    fn score(&self, original: &str, lowered: &str) -> Vec<TypeScore> {
        let mut scores: Vec<TypeScore> = RULES
            .iter()
            .map(|rules| {
                let mut score = 0.0;
                let mut signals = Vec::new();

                for keyword in rules.keywords {
                    if lowered.contains(keyword) {
                        score += self.config.keyword_weight;
                        signals.push(format!("keyword '{}'", keyword.trim()));
                    }
                }

                for word in rules.whole_words {
                    if lowered.unicode_words().any(|w| w == *word) {
                        score += self.config.keyword_weight;
                        signals.push(format!("keyword '{}'", word));
                    }
                }

                for pattern in &rules.patterns {
                    if pattern.is_match(lowered) {
                        score += self.config.pattern_weight;
                        signals.push(format!("pattern /{}/", pattern.as_str()));
                    }
                }

                TypeScore {
                    query_type: rules.query_type,
                    score,
                    signals,
                }
            })
            .collect();

        let word_count = original.unicode_words().count();

        if word_count < self.config.short_query_words {
            add_bonus(
                &mut scores,
                QueryType::Simple,
                self.config.short_query_bonus,
                format!("short query ({} words)", word_count),
            );
        }

        if word_count > self.config.long_query_words {
            add_bonus(
                &mut scores,
                QueryType::Complex,
                self.config.long_query_bonus,
                format!("long query ({} words)", word_count),
            );
        }

        if let Some(token) = MODEL_NUMBER.find(original) {
            add_bonus(
                &mut scores,
                QueryType::Simple,
                self.config.model_number_bonus,
                format!("model number '{}'", token.as_str()),
            );
        }

        scores
    }

    fn normalize(&self, score: f64) -> f64 {
        if self.config.max_expected_score <= 0.0 {
            return 0.0;
        }

        (score / self.config.max_expected_score).clamp(0.0, 1.0)
    }
}

fn add_bonus(scores: &mut [TypeScore], query_type: QueryType, bonus: f64, signal: String) {
    if let Some(entry) = scores.iter_mut().find(|s| s.query_type == query_type) {
        entry.score += bonus;
        entry.signals.push(signal);
    }
}

/// Highest score wins; ties keep the type declared first
fn pick_winner(scores: &[TypeScore]) -> TypeScore {
    let mut winner = TypeScore {
        query_type: QueryType::Simple,
        score: 0.0,
        signals: Vec::new(),
    };

    for query_type in QueryType::ALL {
        let Some(entry) = scores.iter().find(|s| s.query_type == query_type) else {
            continue;
        };

        if entry.score > winner.score {
            winner = entry.clone();
        }
    }

    winner
}

fn select_strategy(query_type: QueryType, lowered: &str) -> Strategy {
    match query_type {
        QueryType::Simple => Strategy::SearchOnly,
        QueryType::Compatibility | QueryType::Comparison | QueryType::Recommendation => {
            Strategy::UnifiedReasoning
        }
        QueryType::Complex => {
            if has_price_intent(lowered) {
                Strategy::UnifiedReasoning
            } else if FRESHNESS_INTENT.is_match(lowered) {
                Strategy::SearchThenReason
            } else {
                Strategy::ReasoningOnly
            }
        }
    }
}

/// Text search cannot look at an attached image
fn promote_for_image(strategy: Strategy, has_image: bool) -> Strategy {
    match strategy {
        Strategy::SearchOnly if has_image => Strategy::UnifiedReasoning,
        other => other,
    }
}

fn has_price_intent(lowered: &str) -> bool {
    PRICE_INTENT.iter().any(|k| lowered.contains(k))
}

fn mentions_imagery(lowered: &str) -> bool {
    IMAGERY.iter().any(|k| lowered.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(query: &str) -> QueryClassification {
        QueryClassifier::default().classify(query, false)
    }

    #[test]
    fn test_brand_model_token_is_simple_search() {
        let result = classify("Canon PG-540");
        assert_eq!(result.query_type, QueryType::Simple);
        assert_eq!(result.strategy, Strategy::SearchOnly);
        assert!((result.confidence - 0.75).abs() < 1e-9);
        assert!(result.reasoning.contains("PG-540"));
    }

    #[test]
    fn test_model_number_with_letter_suffix() {
        for (query, token) in [("Canon PG-540XL", "PG-540XL"), ("Brother TN-2420XL", "TN-2420XL")] {
            let result = classify(query);
            assert_eq!(result.query_type, QueryType::Simple, "{}", query);
            assert_eq!(result.strategy, Strategy::SearchOnly, "{}", query);
            assert!((result.confidence - 0.75).abs() < 1e-9, "{}", query);
            assert!(result.reasoning.contains(token), "{}", query);
        }
    }

    #[test]
    fn test_model_with_price_saturates_confidence() {
        let result = classify("Canon PG-540 pris");
        assert_eq!(result.query_type, QueryType::Simple);
        assert_eq!(result.strategy, Strategy::SearchOnly);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_which_is_best_goes_to_unified_reasoning() {
        let result = classify("Hvilken blekkpatron er best for Canon Pixma?");
        assert_eq!(result.strategy, Strategy::UnifiedReasoning);
        // comparison and recommendation tie; comparison is declared first
        assert_eq!(result.query_type, QueryType::Comparison);

        let short = classify("hvilken er best");
        assert_eq!(short.query_type, QueryType::Comparison);
        assert_eq!(short.strategy, Strategy::UnifiedReasoning);
    }

    #[test]
    fn test_best_only_counts_as_a_whole_word() {
        let order = classify("Jeg vil bestille HP 305 blekk");
        assert_ne!(order.query_type, QueryType::Recommendation);
        assert_eq!(order.strategy, Strategy::SearchOnly);
        assert!(!order.reasoning.contains("'best'"));

        let advice = classify("Hva er beste blekk for Epson?");
        assert_eq!(advice.query_type, QueryType::Recommendation);
        assert!(advice.reasoning.contains("keyword 'beste'"));
    }

    #[test]
    fn test_compatibility_query() {
        let result = classify("Passer denne patronen til HP DeskJet 2630?");
        assert_eq!(result.query_type, QueryType::Compatibility);
        assert_eq!(result.strategy, Strategy::UnifiedReasoning);
    }

    #[test]
    fn test_complex_query_uses_reasoning_only() {
        let result = classify(
            "Hvorfor blir utskriftene fra skriveren min stripete når jeg bruker uoriginale patroner?",
        );
        assert_eq!(result.query_type, QueryType::Complex);
        assert_eq!(result.strategy, Strategy::ReasoningOnly);
    }

    #[test]
    fn test_complex_query_with_price_intent_uses_unified() {
        let result = classify("Forklar hvorfor prisen på blekk er så høy");
        assert_eq!(result.query_type, QueryType::Complex);
        assert_eq!(result.strategy, Strategy::UnifiedReasoning);
    }

    #[test]
    fn test_complex_query_with_freshness_searches_first() {
        let result = classify("Forklar hvordan den nyeste Epson EcoTank teknologien fungerer");
        assert_eq!(result.query_type, QueryType::Complex);
        assert_eq!(result.strategy, Strategy::SearchThenReason);
    }

    #[test]
    fn test_long_query_leans_complex() {
        let query = "jeg har en gammel skriver hjemme og lurer litt på om det er lurt å \
                     bytte den ut nå eller vente enda et år til";
        let result = classify(query);
        assert_eq!(result.query_type, QueryType::Complex);
    }

    #[test]
    fn test_empty_query() {
        let result = classify("   ");
        assert_eq!(result.query_type, QueryType::Simple);
        assert_eq!(result.strategy, Strategy::SearchOnly);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.requires_image);
    }

    #[test]
    fn test_empty_query_with_image_goes_unified() {
        let result = QueryClassifier::default().classify("", true);
        assert_eq!(result.query_type, QueryType::Simple);
        assert_eq!(result.strategy, Strategy::UnifiedReasoning);
        assert_eq!(result.confidence, 0.0);
        assert!(result.requires_image);
    }

    #[test]
    fn test_imagery_mention_requires_image() {
        let result = classify("Hva slags patron er det på bildet?");
        assert!(result.requires_image);
    }

    #[test]
    fn test_no_signals_defaults_to_simple() {
        let result = classify("lorem ipsum dolor sit amet");
        assert_eq!(result.query_type, QueryType::Simple);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = QueryClassifier::default();
        let queries = [
            "Canon PG-540",
            "Hvilken blekkpatron er best for Canon Pixma?",
            "Passer denne patronen til HP DeskJet 2630?",
            "Forklar hvorfor prisen på blekk er så høy",
        ];

        for query in queries {
            let first = classifier.classify(query, false);
            for _ in 0..5 {
                assert_eq!(classifier.classify(query, false), first);
            }
        }
    }

    #[test]
    fn test_confidence_is_always_clamped() {
        let config = ClassifierConfig {
            max_expected_score: 1.0,
            ..Default::default()
        };
        let classifier = QueryClassifier::new(config);
        let queries = [
            "",
            "Canon PG-540 pris på lager hva koster billig tilbud",
            "hvilken er best vs sammenlign forskjellen anbefal",
            "x",
        ];

        for query in queries {
            let result = classifier.classify(query, true);
            assert!((0.0..=1.0).contains(&result.confidence), "{}", query);
        }
    }
}
