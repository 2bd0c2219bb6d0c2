use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMode;

/// Inferred kind of product query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Simple,
    Complex,
    Compatibility,
    Comparison,
    Recommendation,
}

impl QueryType {
    /// Declared priority order; ties resolve to the earliest entry
    pub const ALL: [QueryType; 5] = [
        Self::Simple,
        Self::Complex,
        Self::Compatibility,
        Self::Comparison,
        Self::Recommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
            Self::Compatibility => "compatibility",
            Self::Comparison => "comparison",
            Self::Recommendation => "recommendation",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Combination and order of backend calls used to answer a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    SearchOnly,
    ReasoningOnly,
    SearchThenReason,
    UnifiedReasoning,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchOnly => "search-only",
            Self::ReasoningOnly => "reasoning-only",
            Self::SearchThenReason => "search-then-reason",
            Self::UnifiedReasoning => "unified-reasoning",
        }
    }

    /// Adjusts the strategy for the requested mode.
    ///
    /// `Think` never answers from raw search results alone.
    pub fn for_mode(self, mode: ChatMode) -> Self {
        match (self, mode) {
            (Self::SearchOnly, ChatMode::Think) => Self::SearchThenReason,
            (strategy, _) => strategy,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryClassification {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub strategy: Strategy,
    pub confidence: f64,
    pub reasoning: String,
    pub requires_image: bool,
}
