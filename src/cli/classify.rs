//! Classify command - prints the routing decision for one query

use clap::Args;
use serde::Serialize;

use crate::config::AppConfig;
use crate::domain::{ChatMode, QueryClassification, QueryClassifier, Strategy};
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Query text
    pub query: String,

    /// Treat the query as if an image were attached
    #[arg(long)]
    pub image: bool,

    /// Use `Think` mode when resolving the strategy
    #[arg(long)]
    pub think: bool,
}

#[derive(Serialize)]
struct ClassifyOutput {
    #[serde(flatten)]
    classification: QueryClassification,
    mode: ChatMode,
    /// Strategy after the mode adjustment
    effective_strategy: Strategy,
}

pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let output = classify(&QueryClassifier::new(config.classifier), &args);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn classify(classifier: &QueryClassifier, args: &ClassifyArgs) -> ClassifyOutput {
    let mode = if args.think {
        ChatMode::Think
    } else {
        ChatMode::DeepSearch
    };
    let classification = classifier.classify(&args.query, args.image);
    let effective_strategy = classification.strategy.for_mode(mode);

    ClassifyOutput {
        classification,
        mode,
        effective_strategy,
    }
}
