//! Query orchestration - strategy dispatch over cache and providers

#[allow(clippy::module_inception)]
mod orchestrator;
mod prompts;

pub use orchestrator::{OrchestratorResponse, QueryOrchestrator};
pub use prompts::PromptConfig;
