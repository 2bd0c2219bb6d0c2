//! CLI module
//!
//! - `serve`: run the HTTP API
//! - `classify`: print the routing decision for a query without calling
//!   any backend

pub mod classify;
pub mod serve;

use clap::{Parser, Subcommand};

/// Product query router - classifies product questions and routes them to
/// search and reasoning backends
#[derive(Parser)]
#[command(name = "product-query-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Classify a query and print the result as JSON
    Classify(classify::ClassifyArgs),
}
