//! Query classification - maps a query to a type and processing strategy

mod classifier;
mod config;
mod types;

pub use classifier::QueryClassifier;
pub use config::ClassifierConfig;
pub use types::{QueryClassification, QueryType, Strategy};
