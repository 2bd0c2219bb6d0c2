//! Prompt text and assembly for backend calls

use serde::Deserialize;

use crate::domain::ChatMode;

/// Prompt templates; all text is configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub search_system: String,
    pub reasoning_system: String,
    /// Appended to the reasoning system prompt in `Think` mode
    pub think_addendum: String,
    pub unified_system: String,
    pub vision_instruction: String,
    /// Substituted for the image analysis when vision fails
    pub image_fallback: String,
    /// Used as the question when only an image was sent
    pub image_only_question: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            search_system: "Du er en produktsøkeassistent for en norsk nettbutikk. \
                Finn konkrete produkter, priser og tilgjengelighet. Svar kort på norsk."
                .to_string(),
            reasoning_system: "Du er en produktekspert. Resonner grundig over spørsmålet \
                og svar strukturert på norsk."
                .to_string(),
            think_addendum: "Vurder alternativer og begrunn anbefalingen steg for steg."
                .to_string(),
            unified_system: "Du er en produktekspert med tilgang til nettsøk. Søk etter \
                oppdatert informasjon og gi et begrunnet svar på norsk."
                .to_string(),
            vision_instruction: "Beskriv produktet på bildet: type, merke, modellnummer og \
                annen synlig tekst. Svar kort."
                .to_string(),
            image_fallback: "[Bildet kunne ikke analyseres]".to_string(),
            image_only_question: "Hvilket produkt er dette, og hvor kan jeg kjøpe det?"
                .to_string(),
        }
    }
}

impl PromptConfig {
    pub fn reasoning_system_for(&self, mode: ChatMode) -> String {
        match mode {
            ChatMode::Think => format!("{} {}", self.reasoning_system, self.think_addendum),
            ChatMode::DeepSearch => self.reasoning_system.clone(),
        }
    }

    /// The user's question, or the image-only question when blank
    pub fn question<'a>(&'a self, message: &'a str) -> &'a str {
        let message = message.trim();
        if message.is_empty() {
            &self.image_only_question
        } else {
            message
        }
    }

    /// Question with the image analysis folded in
    pub fn with_image_context(&self, message: &str, image_analysis: Option<&str>) -> String {
        let question = self.question(message);

        match image_analysis {
            Some(analysis) => format!("{}\n\nBildeanalyse:\n{}", question, analysis),
            None => question.to_string(),
        }
    }

    /// Reasoning prompt over fresh search results
    pub fn with_search_results(
        &self,
        message: &str,
        search_results: &str,
        image_analysis: Option<&str>,
    ) -> String {
        format!(
            "{}\n\nSøkeresultater:\n{}",
            self.with_image_context(message, image_analysis),
            search_results
        )
    }
}
